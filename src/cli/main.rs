#![warn(clippy::all, clippy::pedantic)]
use std::error::Error;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use beltflow::{solve, Problem};

/// Check whether a belt network can sustain its requested supply rate.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Problem description JSON; reads stdin when omitted
    input: Option<PathBuf>,

    /// Write the result JSON here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;

    let problem: Problem<f64> = match &args.input {
        Some(path) => serde_json::from_reader(File::open(path)?)?,
        None => serde_json::from_reader(io::stdin().lock())?,
    };

    let outcome = solve(&problem)?;

    let mut rendered = serde_json::to_string_pretty(&outcome)?;
    rendered.push('\n');
    match &args.output {
        Some(path) => std::fs::write(path, rendered)?,
        None => io::stdout().lock().write_all(rendered.as_bytes())?,
    }
    Ok(())
}

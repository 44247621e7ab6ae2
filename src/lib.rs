#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications,
    rust_2018_idioms
)]
#![forbid(unsafe_code)]

mod algo;
mod error;
mod node;
mod outcome;
mod problem;
mod rate;
mod solver;
mod transform;

pub use crate::algo::dinic::BlockingFlow;
pub use crate::algo::residual::{ArcHandle, ResidualGraph};
pub use crate::algo::MaxFlow;
pub use crate::error::Error;
pub use crate::node::NodeTag;
pub use crate::outcome::{Deficit, EdgeFlow, Outcome, TightEdge};
pub use crate::problem::{EdgeSpec, Problem, RawEdgeSpec, RawProblem, DEFAULT_TOLERANCE};
pub use crate::rate::Rate;
pub use crate::solver::{check, FeasibilitySolver};

/// Check whether `problem` can sustain its declared supply rate, using the
/// blocking-flow engine.
pub fn solve<R: Rate>(problem: &Problem<R>) -> Result<Outcome<R>, Error> {
    let mut solver = FeasibilitySolver::new(BlockingFlow::default());
    solver.solve(problem)
}

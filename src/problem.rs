use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use crate::error::Error;
use crate::rate::Rate;

/// Tolerance used for every saturation and balance comparison unless the
/// input overrides it.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

fn default_tolerance<R: Rate>() -> R {
    R::from(DEFAULT_TOLERANCE).unwrap_or_else(R::epsilon)
}

/// A belt segment as it appears in the input, prior to validation.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RawEdgeSpec<R> {
    pub from: String,
    pub to: String,
    pub lo: R,
    pub hi: R,
    #[serde(default)]
    pub name: Option<String>,
}

/// A belt segment with validated throughput bounds.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeSpec<R> {
    from: String,
    to: String,
    lo: R,
    hi: R,
    name: String,
}

impl<R: Rate> EdgeSpec<R> {
    pub fn new(
        from: String,
        to: String,
        lo: R,
        hi: R,
        name: String,
        eps: R,
    ) -> Result<Self, Error> {
        if hi + eps < lo {
            return Err(Error::BoundsInverted(name));
        }
        Ok(Self {
            from,
            to,
            lo,
            hi,
            name,
        })
    }

    pub fn tail(&self) -> &str {
        &self.from
    }

    pub fn head(&self) -> &str {
        &self.to
    }

    pub fn lo(&self) -> R {
        self.lo
    }

    pub fn hi(&self) -> R {
        self.hi
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// An immutable feasibility problem: belt segments with rate bounds, node
/// throughput caps and a single supply requirement to be delivered at the
/// sink.
#[derive(Clone, Debug, Deserialize)]
#[serde(
    try_from = "RawProblem<R>",
    bound(deserialize = "R: Rate + Deserialize<'de>")
)]
pub struct Problem<R> {
    nodes: BTreeSet<String>,
    edges: Vec<EdgeSpec<R>>,
    node_caps: BTreeMap<String, R>,
    source: String,
    supply: R,
    sink: String,
    eps: R,
}

/// The problem document as read from the input.
#[derive(Clone, Debug, Deserialize)]
pub struct RawProblem<R> {
    #[serde(default)]
    pub nodes: Vec<String>,
    #[serde(default)]
    pub edges: Vec<RawEdgeSpec<R>>,
    #[serde(default)]
    pub node_caps: BTreeMap<String, R>,
    pub sources: BTreeMap<String, R>,
    pub sink: String,
    #[serde(default)]
    pub tolerance: Option<R>,
}

impl<R: Rate> TryFrom<RawProblem<R>> for Problem<R> {
    type Error = Error;

    fn try_from(raw: RawProblem<R>) -> Result<Self, Self::Error> {
        let eps = raw.tolerance.unwrap_or_else(default_tolerance);

        let mut edges = Vec::with_capacity(raw.edges.len());
        for (i, edge) in raw.edges.into_iter().enumerate() {
            let name = edge.name.unwrap_or_else(|| format!("e{i}"));
            edges.push(EdgeSpec::new(
                edge.from, edge.to, edge.lo, edge.hi, name, eps,
            )?);
        }

        for (node, cap) in &raw.node_caps {
            if *cap < -eps {
                return Err(Error::NegativeCapacity(node.clone()));
            }
        }

        if raw.sources.len() != 1 {
            return Err(Error::SourceCount(raw.sources.len()));
        }
        let (source, supply) = raw
            .sources
            .into_iter()
            .next()
            .expect("the source map has exactly one entry");

        let mut nodes: BTreeSet<String> = raw.nodes.into_iter().collect();
        for edge in &edges {
            nodes.insert(edge.tail().to_owned());
            nodes.insert(edge.head().to_owned());
        }
        for node in raw.node_caps.keys() {
            nodes.insert(node.clone());
        }
        nodes.insert(source.clone());
        nodes.insert(raw.sink.clone());

        // Caps on the declared source and sink are ignored per contract.
        let mut node_caps = raw.node_caps;
        node_caps.remove(&source);
        node_caps.remove(&raw.sink);

        Ok(Self {
            nodes,
            edges,
            node_caps,
            source,
            supply,
            sink: raw.sink,
            eps,
        })
    }
}

impl<R: Rate> Problem<R> {
    pub fn nodes(&self) -> &BTreeSet<String> {
        &self.nodes
    }

    pub fn edges(&self) -> &[EdgeSpec<R>] {
        &self.edges
    }

    pub fn node_caps(&self) -> &BTreeMap<String, R> {
        &self.node_caps
    }

    pub fn cap_of(&self, node: &str) -> Option<R> {
        self.node_caps.get(node).copied()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn supply(&self) -> R {
        self.supply
    }

    pub fn sink(&self) -> &str {
        &self.sink
    }

    pub fn eps(&self) -> R {
        self.eps
    }
}

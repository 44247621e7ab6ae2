use serde::{Deserialize, Serialize};

/// Flow assigned to one original edge.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct EdgeFlow<R> {
    pub from: String,
    pub to: String,
    pub flow: R,
}

/// A saturated edge crossing the reported cut, with its share of the unmet
/// demand.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TightEdge<R> {
    pub from: String,
    pub to: String,
    pub flow_needed: R,
}

/// The constraints behind an infeasibility verdict.
///
/// The unmet demand is split equally across the tight edges; the split is a
/// presentation heuristic, not a unique allocation of blame.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Deficit<R> {
    pub demand_balance: R,
    pub tight_nodes: Vec<String>,
    pub tight_edges: Vec<TightEdge<R>>,
}

/// Result of a solve: either a feasible per-edge assignment or a minimum-cut
/// certificate of infeasibility. Both are successful outcomes.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome<R> {
    Ok {
        max_flow_per_min: R,
        flows: Vec<EdgeFlow<R>>,
    },
    Infeasible {
        cut_reachable: Vec<String>,
        deficit: Deficit<R>,
    },
}

impl<R> Outcome<R> {
    pub fn is_feasible(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }
}

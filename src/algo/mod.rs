use std::fmt::Debug;

use petgraph::graph::NodeIndex;

pub mod dinic;
pub mod residual;

use crate::algo::residual::ResidualGraph;
use crate::rate::Rate;

/// The maximum flow algorithm.
pub trait MaxFlow {
    type Flow: Rate;
    type Error: Debug;

    /// Run the algorithm over the residual graph and return the total flow
    /// pushed from `source` to `sink`.
    fn max_flow<N>(
        &mut self,
        store: &mut ResidualGraph<N, Self::Flow>,
        source: NodeIndex,
        sink: NodeIndex,
    ) -> Result<Self::Flow, Self::Error>;
}

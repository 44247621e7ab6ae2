use std::collections::VecDeque;

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::rate::Rate;

/// Arena of nodes and paired forward/reverse arcs with mutable residual
/// capacity.
///
/// A forward arc and its reverse are created adjacently, so either can be
/// recovered from the other by flipping the low bit of its index. At all
/// times the residual capacities of a pair sum to the forward arc's original
/// capacity. Arcs are append-only and live for the whole run.
#[derive(Debug)]
pub struct ResidualGraph<N, R> {
    graph: DiGraph<N, R>,
    eps: R,
}

/// Stable handle to a forward arc, usable for flow readout after a run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ArcHandle(EdgeIndex);

fn mate(arc: EdgeIndex) -> EdgeIndex {
    EdgeIndex::new(arc.index() ^ 1)
}

impl<N, R: Rate> ResidualGraph<N, R> {
    pub fn new(eps: R) -> Self {
        Self {
            graph: DiGraph::new(),
            eps,
        }
    }

    pub fn eps(&self) -> R {
        self.eps
    }

    pub fn add_node(&mut self, weight: N) -> NodeIndex {
        self.graph.add_node(weight)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn node(&self, ix: NodeIndex) -> &N {
        self.graph.node_weight(ix).expect("node is in the arena")
    }

    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    /// Create a forward/reverse arc pair and return a handle to the forward
    /// arc. Capacities within tolerance of zero are floored at zero; anything
    /// below `-eps` is a caller error.
    pub fn add_arc(&mut self, from: NodeIndex, to: NodeIndex, cap: R) -> ArcHandle {
        debug_assert!(cap >= -self.eps, "negative capacity not allowed");
        let forward = self.graph.add_edge(from, to, cap.max(R::zero()));
        let reverse = self.graph.add_edge(to, from, R::zero());
        debug_assert_eq!(mate(forward), reverse);
        ArcHandle(forward)
    }

    /// Remaining capacity on the forward arc.
    pub fn residual(&self, handle: ArcHandle) -> R {
        self.graph[handle.0]
    }

    /// Flow pushed through the arc so far: the reverse arc starts empty and
    /// only grows by pushed flow.
    pub fn flow_used(&self, handle: ArcHandle) -> R {
        self.graph[mate(handle.0)]
    }

    pub fn endpoints(&self, handle: ArcHandle) -> (NodeIndex, NodeIndex) {
        self.graph
            .edge_endpoints(handle.0)
            .expect("arc is in the arena")
    }

    /// Nodes reachable from `start` over arcs with residual capacity above
    /// tolerance, as a dense bitmap indexed by node.
    pub fn reachable_from(&self, start: NodeIndex) -> Vec<bool> {
        let mut seen = vec![false; self.graph.node_count()];
        let mut queue = VecDeque::new();
        seen[start.index()] = true;
        queue.push_back(start);
        while let Some(v) = queue.pop_front() {
            for edge in self.graph.edges(v) {
                let to = edge.target();
                if *edge.weight() > self.eps && !seen[to.index()] {
                    seen[to.index()] = true;
                    queue.push_back(to);
                }
            }
        }
        seen
    }

    pub(crate) fn arcs(&self) -> impl Iterator<Item = (EdgeIndex, NodeIndex, NodeIndex)> + '_ {
        self.graph
            .edge_references()
            .map(|edge| (edge.id(), edge.source(), edge.target()))
    }

    pub(crate) fn residual_at(&self, arc: EdgeIndex) -> R {
        self.graph[arc]
    }

    pub(crate) fn source_of(&self, arc: EdgeIndex) -> NodeIndex {
        self.graph
            .edge_endpoints(arc)
            .expect("arc is in the arena")
            .0
    }

    pub(crate) fn target_of(&self, arc: EdgeIndex) -> NodeIndex {
        self.graph
            .edge_endpoints(arc)
            .expect("arc is in the arena")
            .1
    }

    /// Move `amount` of flow across an arc: forward capacity shrinks and the
    /// paired reverse capacity grows by the same amount.
    pub(crate) fn push(&mut self, arc: EdgeIndex, amount: R) {
        self.graph[arc] -= amount;
        self.graph[mate(arc)] += amount;
    }
}

#[cfg(test)]
mod tests {
    use super::ResidualGraph;

    #[test]
    fn pushed_flow_shows_up_on_the_reverse_arc() {
        let mut store: ResidualGraph<(), f64> = ResidualGraph::new(1e-9);
        let a = store.add_node(());
        let b = store.add_node(());
        let handle = store.add_arc(a, b, 10.0);

        assert!((store.residual(handle) - 10.0).abs() < 1e-12);
        assert!(store.flow_used(handle).abs() < 1e-12);

        let (arc, _, _) = store.arcs().next().unwrap();
        store.push(arc, 4.0);
        assert!((store.residual(handle) - 6.0).abs() < 1e-12);
        assert!((store.flow_used(handle) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn capacities_within_tolerance_are_floored() {
        let mut store: ResidualGraph<(), f64> = ResidualGraph::new(1e-9);
        let a = store.add_node(());
        let b = store.add_node(());
        let handle = store.add_arc(a, b, -1e-12);
        assert_eq!(store.residual(handle), 0.0);
    }

    #[test]
    fn reachability_ignores_saturated_arcs() {
        let mut store: ResidualGraph<(), f64> = ResidualGraph::new(1e-9);
        let a = store.add_node(());
        let b = store.add_node(());
        let c = store.add_node(());
        store.add_arc(a, b, 5.0);
        store.add_arc(b, c, 1e-12);

        let seen = store.reachable_from(a);
        assert!(seen[a.index()]);
        assert!(seen[b.index()]);
        assert!(!seen[c.index()]);
    }
}

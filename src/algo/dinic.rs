use std::collections::VecDeque;
use std::convert::Infallible;
use std::marker::PhantomData;

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::algo::residual::ResidualGraph;
use crate::algo::MaxFlow;
use crate::rate::Rate;

/// Blocking-flow maximum flow (Dinic's algorithm) over a [`ResidualGraph`].
#[derive(Clone, Debug, Default)]
pub struct BlockingFlow<R>(PhantomData<R>);

impl<R: Rate> MaxFlow for BlockingFlow<R> {
    type Flow = R;
    type Error = Infallible;

    fn max_flow<N>(
        &mut self,
        store: &mut ResidualGraph<N, R>,
        source: NodeIndex,
        sink: NodeIndex,
    ) -> Result<R, Self::Error> {
        Ok(max_flow(store, source, sink))
    }
}

/// Computes the maximum flow from `source` to `sink`, alternating
/// breadth-first level assignment with depth-first blocking-flow searches
/// until the level phase no longer reaches the sink.
pub fn max_flow<N, R: Rate>(
    store: &mut ResidualGraph<N, R>,
    source: NodeIndex,
    sink: NodeIndex,
) -> R {
    Search::new(store, source, sink).run()
}

struct Search<'g, N, R> {
    store: &'g mut ResidualGraph<N, R>,
    // Outgoing arcs per node, snapshotted once. The arena is append-only, so
    // random access by index stays valid for the whole run.
    adj: Vec<Vec<EdgeIndex>>,
    level: Vec<i32>,
    cursor: Vec<usize>,
    source: NodeIndex,
    sink: NodeIndex,
}

impl<'g, N, R: Rate> Search<'g, N, R> {
    fn new(store: &'g mut ResidualGraph<N, R>, source: NodeIndex, sink: NodeIndex) -> Self {
        let n = store.node_count();
        let mut adj = vec![Vec::new(); n];
        for (arc, from, _) in store.arcs() {
            adj[from.index()].push(arc);
        }
        Search {
            store,
            adj,
            level: vec![-1; n],
            cursor: vec![0; n],
            source,
            sink,
        }
    }

    fn run(&mut self) -> R {
        let mut total = R::zero();
        while self.assign_levels() {
            for cursor in &mut self.cursor {
                *cursor = 0;
            }
            total += self.blocking_flow();
        }
        log::debug!("max flow {total} after the sink fell out of the level graph");
        total
    }

    /// Level phase: label every node with its breadth-first distance from the
    /// source over arcs with residual capacity above tolerance. An unreached
    /// sink ends the whole run; that is the normal termination condition.
    fn assign_levels(&mut self) -> bool {
        let eps = self.store.eps();
        for level in &mut self.level {
            *level = -1;
        }
        let mut queue = VecDeque::new();
        self.level[self.source.index()] = 0;
        queue.push_back(self.source);
        while let Some(v) = queue.pop_front() {
            for &arc in &self.adj[v.index()] {
                let to = self.store.target_of(arc);
                if self.store.residual_at(arc) > eps && self.level[to.index()] < 0 {
                    self.level[to.index()] = self.level[v.index()] + 1;
                    queue.push_back(to);
                }
            }
        }
        self.level[self.sink.index()] >= 0
    }

    /// Blocking-flow phase: walk admissible arcs with an explicit path stack,
    /// augmenting whenever the sink is reached. Each node keeps a cursor into
    /// its arc list so arcs ruled out earlier in the phase are never
    /// rescanned.
    fn blocking_flow(&mut self) -> R {
        let mut total = R::zero();
        let mut path: Vec<EdgeIndex> = Vec::new();
        let mut at = self.source;
        loop {
            if at == self.sink {
                total += self.augment(&mut path);
                at = match path.last() {
                    Some(&arc) => self.store.target_of(arc),
                    None => self.source,
                };
                continue;
            }
            match self.admissible_arc(at) {
                Some(arc) => {
                    path.push(arc);
                    at = self.store.target_of(arc);
                }
                None if at == self.source => break,
                None => {
                    // dead end: retreat and skip the arc that led here
                    let arc = path.pop().expect("path reaches back to the source");
                    let tail = self.store.source_of(arc);
                    self.cursor[tail.index()] += 1;
                    at = tail;
                }
            }
        }
        total
    }

    /// Next arc out of `at` with residual capacity above tolerance that steps
    /// exactly one level down, advancing the node's cursor past rejects.
    fn admissible_arc(&mut self, at: NodeIndex) -> Option<EdgeIndex> {
        let eps = self.store.eps();
        let arcs = &self.adj[at.index()];
        while self.cursor[at.index()] < arcs.len() {
            let arc = arcs[self.cursor[at.index()]];
            let to = self.store.target_of(arc);
            if self.store.residual_at(arc) > eps
                && self.level[to.index()] == self.level[at.index()] + 1
            {
                return Some(arc);
            }
            self.cursor[at.index()] += 1;
        }
        None
    }

    /// Push the bottleneck amount along `path`, then cut the path back to
    /// just before the first arc that became saturated.
    fn augment(&mut self, path: &mut Vec<EdgeIndex>) -> R {
        let eps = self.store.eps();
        let pushed = path
            .iter()
            .map(|&arc| self.store.residual_at(arc))
            .fold(R::infinity(), |low, cap| low.min(cap));
        for &arc in path.iter() {
            self.store.push(arc, pushed);
        }
        log::trace!("augmented {pushed} along {} arcs", path.len());
        let cut = path
            .iter()
            .position(|&arc| self.store.residual_at(arc) <= eps)
            .expect("an augmenting path saturates at least one arc");
        path.truncate(cut);
        pushed
    }
}

#[cfg(test)]
mod tests {
    use petgraph::graph::NodeIndex;

    use super::max_flow;
    use crate::algo::residual::{ArcHandle, ResidualGraph};

    fn arena(n: usize) -> (ResidualGraph<(), f64>, Vec<NodeIndex>) {
        let mut store = ResidualGraph::new(1e-9);
        let nodes = (0..n).map(|_| store.add_node(())).collect();
        (store, nodes)
    }

    #[test]
    fn flow_is_limited_by_the_chain_bottleneck() {
        let (mut store, n) = arena(3);
        let first = store.add_arc(n[0], n[1], 10.0);
        let second = store.add_arc(n[1], n[2], 5.0);

        let total = max_flow(&mut store, n[0], n[2]);
        assert!((total - 5.0).abs() < 1e-9);
        assert!((store.flow_used(first) - 5.0).abs() < 1e-9);
        assert!((store.flow_used(second) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn parallel_routes_add_up() {
        let (mut store, n) = arena(4);
        store.add_arc(n[0], n[1], 5.0);
        store.add_arc(n[1], n[3], 5.0);
        store.add_arc(n[0], n[2], 10.0);
        store.add_arc(n[2], n[3], 10.0);

        assert!((max_flow(&mut store, n[0], n[3]) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn takes_the_longer_route_in_a_second_phase() {
        // s -> a -> t saturates in the first level graph; the remaining
        // s -> b -> c -> t route is one arc longer and needs a fresh phase.
        let (mut store, n) = arena(5);
        let (s, a, b, c, t) = (n[0], n[1], n[2], n[3], n[4]);
        store.add_arc(s, a, 10.0);
        store.add_arc(s, b, 5.0);
        store.add_arc(a, t, 10.0);
        store.add_arc(b, c, 10.0);
        store.add_arc(c, a, 5.0);
        store.add_arc(c, t, 10.0);

        assert!((max_flow(&mut store, s, t) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn unreachable_sink_yields_zero_flow() {
        let (mut store, n) = arena(3);
        store.add_arc(n[0], n[1], 10.0);

        assert_eq!(max_flow(&mut store, n[0], n[2]), 0.0);
    }

    #[test]
    fn residual_pairs_keep_their_total_capacity() {
        let (mut store, n) = arena(3);
        let handles: Vec<ArcHandle> = vec![
            store.add_arc(n[0], n[1], 7.0),
            store.add_arc(n[1], n[2], 3.0),
        ];
        let caps = [7.0, 3.0];

        max_flow(&mut store, n[0], n[2]);
        for (handle, cap) in handles.into_iter().zip(caps) {
            let paired = store.residual(handle) + store.flow_used(handle);
            assert!((paired - cap).abs() < 1e-9);
        }
    }
}

use std::collections::BTreeMap;

use itertools::Itertools;
use petgraph::graph::NodeIndex;

use crate::algo::residual::{ArcHandle, ResidualGraph};
use crate::node::NodeTag;
use crate::problem::Problem;
use crate::rate::Rate;

/// Which end of an original edge a node name is resolved for: edges leave a
/// split node on its outbound side and enter on its inbound side.
#[derive(Clone, Copy, Debug)]
enum End {
    Tail,
    Head,
}

#[derive(Clone, Copy, Debug)]
enum Slot {
    Single(NodeIndex),
    Split {
        inbound: NodeIndex,
        outbound: NodeIndex,
    },
}

/// Binding of an original edge to the arc realizing it in the store.
#[derive(Clone, Debug)]
pub(crate) struct EdgeBinding<R> {
    pub from: String,
    pub to: String,
    pub lo: R,
    pub hi: R,
    pub handle: ArcHandle,
    pub tail: NodeIndex,
    pub head: NodeIndex,
}

/// Binding of a node throughput cap to its inbound→outbound arc.
#[derive(Clone, Debug)]
pub(crate) struct CapBinding {
    pub node: String,
    pub handle: ArcHandle,
    pub inbound: NodeIndex,
    pub outbound: NodeIndex,
}

/// The lower-bounded problem rewritten as a plain max-flow instance.
pub(crate) struct Transformed<R> {
    pub store: ResidualGraph<NodeTag<String>, R>,
    pub super_source: NodeIndex,
    pub super_sink: NodeIndex,
    /// Total super-source outflow a feasible assignment must saturate.
    pub required: R,
    pub edges: Vec<EdgeBinding<R>>,
    pub caps: Vec<CapBinding>,
}

/// Rewrites the problem via node splitting and the circulation trick: every
/// bounded edge becomes a capacity `hi - lo` arc with the lower bound moved
/// into node balances, the supply requirement becomes an implicit sink→source
/// arc visible only through the balances, and a super-source/super-sink pair
/// absorbs whatever the balances left over.
pub(crate) fn build<R: Rate>(problem: &Problem<R>) -> Transformed<R> {
    let eps = problem.eps();
    let mut store = ResidualGraph::new(eps);

    let mut slots: BTreeMap<&str, Slot> = BTreeMap::new();
    for name in problem.nodes() {
        let slot = if problem.cap_of(name).is_some() {
            Slot::Split {
                inbound: store.add_node(NodeTag::Inbound(name.clone())),
                outbound: store.add_node(NodeTag::Outbound(name.clone())),
            }
        } else {
            Slot::Single(store.add_node(NodeTag::Single(name.clone())))
        };
        slots.insert(name, slot);
    }

    let resolve = |name: &str, end: End| match slots[name] {
        Slot::Single(ix) => ix,
        Slot::Split { inbound, outbound } => match end {
            End::Tail => outbound,
            End::Head => inbound,
        },
    };

    // an in/out pair is joined by an arc carrying the throughput cap
    let mut caps = Vec::with_capacity(problem.node_caps().len());
    for (name, cap) in problem.node_caps() {
        let Slot::Split { inbound, outbound } = slots[name.as_str()] else {
            unreachable!("capped nodes are always split");
        };
        let handle = store.add_arc(inbound, outbound, *cap);
        caps.push(CapBinding {
            node: name.clone(),
            handle,
            inbound,
            outbound,
        });
    }

    let super_source = store.add_node(NodeTag::SuperSource);
    let super_sink = store.add_node(NodeTag::SuperSink);

    // lower bounds move into per-node balances; each edge keeps hi - lo
    let mut balance = vec![R::zero(); store.node_count()];
    let ordered = problem
        .edges()
        .iter()
        .sorted_by(|a, b| (a.tail(), a.head(), a.name()).cmp(&(b.tail(), b.head(), b.name())));
    let mut edges = Vec::with_capacity(problem.edges().len());
    for spec in ordered {
        let tail = resolve(spec.tail(), End::Tail);
        let head = resolve(spec.head(), End::Head);
        let handle = store.add_arc(tail, head, spec.hi() - spec.lo());
        balance[tail.index()] -= spec.lo();
        balance[head.index()] += spec.lo();
        edges.push(EdgeBinding {
            from: spec.tail().to_owned(),
            to: spec.head().to_owned(),
            lo: spec.lo(),
            hi: spec.hi(),
            handle,
            tail,
            head,
        });
    }

    // the supply requirement is an implicit sink→source arc of exactly the
    // supply amount, visible only through the balances
    let source_tail = resolve(problem.source(), End::Tail);
    let sink_head = resolve(problem.sink(), End::Head);
    balance[sink_head.index()] -= problem.supply();
    balance[source_tail.index()] += problem.supply();

    let mut required = R::zero();
    for (i, &b) in balance.iter().enumerate() {
        let node = NodeIndex::new(i);
        if b > eps {
            store.add_arc(super_source, node, b);
            required += b;
        } else if b < -eps {
            store.add_arc(node, super_sink, -b);
        }
    }

    log::debug!(
        "transformed {} nodes / {} edges into a {}-node arena, required flow {required}",
        problem.nodes().len(),
        problem.edges().len(),
        store.node_count(),
    );

    Transformed {
        store,
        super_source,
        super_sink,
        required,
        edges,
        caps,
    }
}

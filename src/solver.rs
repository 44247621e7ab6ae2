use std::collections::{BTreeMap, BTreeSet};
use std::marker::PhantomData;

use itertools::Itertools;

use crate::algo::MaxFlow;
use crate::error::Error;
use crate::outcome::{Deficit, EdgeFlow, Outcome, TightEdge};
use crate::problem::Problem;
use crate::rate::Rate;
use crate::transform::{self, Transformed};

/// Runs the lower-bound transform, a max-flow engine and certificate
/// extraction as one synchronous call. Every solve owns its arena; nothing
/// is shared between invocations.
#[derive(Clone, Debug)]
pub struct FeasibilitySolver<R, Algo> {
    algo: Algo,
    _phantom: PhantomData<R>,
}

impl<R, Algo> FeasibilitySolver<R, Algo> {
    pub fn new(algo: Algo) -> Self {
        Self {
            algo,
            _phantom: PhantomData,
        }
    }
}

impl<R, Algo> FeasibilitySolver<R, Algo>
where
    R: Rate,
    Algo: MaxFlow<Flow = R>,
{
    pub fn solve(&mut self, problem: &Problem<R>) -> Result<Outcome<R>, Error> {
        let mut transformed = transform::build(problem);
        let pushed = self
            .algo
            .max_flow(
                &mut transformed.store,
                transformed.super_source,
                transformed.super_sink,
            )
            .map_err(|e| Error::AlgoSpecific(format!("{e:?}")))?;

        log::info!("----------------------------------");
        log::info!("  required flow = {}", transformed.required);
        log::info!("  achieved flow = {pushed}");

        if pushed >= transformed.required - problem.eps() {
            Ok(assignment(problem, &transformed))
        } else {
            Ok(certificate(problem, &transformed, pushed))
        }
    }
}

/// Success path: per-edge flow is the lower bound plus whatever was pushed
/// through the realizing arc, clamped to absorb tolerance noise.
fn assignment<R: Rate>(problem: &Problem<R>, transformed: &Transformed<R>) -> Outcome<R> {
    let eps = problem.eps();
    let flows: Vec<EdgeFlow<R>> = transformed
        .edges
        .iter()
        .map(|binding| {
            let used = transformed.store.flow_used(binding.handle);
            let flow = (binding.lo + used).max(binding.lo).min(binding.hi + eps);
            EdgeFlow {
                from: binding.from.clone(),
                to: binding.to.clone(),
                flow,
            }
        })
        .collect();

    let sunk = flows
        .iter()
        .filter(|flow| flow.to == problem.sink())
        .map(|flow| flow.flow)
        .sum();

    Outcome::Ok {
        max_flow_per_min: sunk,
        flows,
    }
}

/// Infeasibility path: the super-source-reachable residual set is the source
/// side of a minimum cut; saturated constraints straddling it explain the
/// shortfall, and the unmet demand is split equally across the tight edges.
fn certificate<R: Rate>(
    problem: &Problem<R>,
    transformed: &Transformed<R>,
    pushed: R,
) -> Outcome<R> {
    let eps = problem.eps();
    let store = &transformed.store;
    let reachable = store.reachable_from(transformed.super_source);

    let cut: BTreeSet<String> = store
        .node_indices()
        .filter(|ix| reachable[ix.index()])
        .filter_map(|ix| store.node(ix).base().cloned())
        .collect();

    let mut tight_edges = Vec::new();
    let mut seen = BTreeSet::new();
    for binding in &transformed.edges {
        let straddles = reachable[binding.tail.index()] && !reachable[binding.head.index()];
        if straddles
            && store.residual(binding.handle) <= eps
            && seen.insert((binding.from.clone(), binding.to.clone()))
        {
            tight_edges.push(TightEdge {
                from: binding.from.clone(),
                to: binding.to.clone(),
                flow_needed: R::zero(),
            });
        }
    }

    let tight_nodes: Vec<String> = transformed
        .caps
        .iter()
        .filter(|cap| {
            reachable[cap.inbound.index()]
                && !reachable[cap.outbound.index()]
                && store.residual(cap.handle) <= eps
        })
        .map(|cap| cap.node.clone())
        .collect();

    let deficit = (transformed.required - pushed).max(R::zero());
    if !tight_edges.is_empty() && deficit > eps {
        let share = deficit
            / R::from(tight_edges.len()).expect("tight edge count is representable as a rate");
        for edge in &mut tight_edges {
            edge.flow_needed = share;
        }
    }

    Outcome::Infeasible {
        cut_reachable: cut.into_iter().collect(),
        deficit: Deficit {
            demand_balance: deficit,
            tight_nodes,
            tight_edges,
        },
    }
}

/// Validate a feasible outcome against the problem's invariants: per-edge
/// bounds, conservation at interior nodes, node throughput caps and the
/// sunk-flow total. Panics on violation; infeasible outcomes pass through
/// untouched.
pub fn check<R: Rate>(problem: &Problem<R>, outcome: &Outcome<R>) {
    let Outcome::Ok {
        max_flow_per_min,
        flows,
    } = outcome
    else {
        return;
    };
    let eps = problem.eps();
    // sums over many edges accumulate more round-off than one comparison
    let slack = eps * R::from(flows.len().max(1)).expect("edge count is representable as a rate");

    let ordered = problem
        .edges()
        .iter()
        .sorted_by(|a, b| (a.tail(), a.head(), a.name()).cmp(&(b.tail(), b.head(), b.name())));
    for (spec, flow) in ordered.zip(flows) {
        assert!(
            flow.flow >= spec.lo() - eps && flow.flow <= spec.hi() + eps,
            "flow on {}→{} escapes its bounds",
            flow.from,
            flow.to,
        );
    }

    let mut inflow: BTreeMap<&str, R> = BTreeMap::new();
    let mut outflow: BTreeMap<&str, R> = BTreeMap::new();
    for flow in flows {
        *outflow.entry(flow.from.as_str()).or_default() += flow.flow;
        *inflow.entry(flow.to.as_str()).or_default() += flow.flow;
    }

    for node in problem.nodes() {
        let node = node.as_str();
        if node == problem.source() || node == problem.sink() {
            continue;
        }
        let input = inflow.get(node).copied().unwrap_or_else(R::zero);
        let output = outflow.get(node).copied().unwrap_or_else(R::zero);
        assert!(
            (input - output).abs() <= slack,
            "conservation violated at {node}"
        );
        if let Some(cap) = problem.cap_of(node) {
            assert!(input <= cap + slack, "throughput cap exceeded at {node}");
        }
    }

    let sunk: R = flows
        .iter()
        .filter(|flow| flow.to == problem.sink())
        .map(|flow| flow.flow)
        .sum();
    assert!(
        (sunk - *max_flow_per_min).abs() <= slack,
        "reported total drifts from the sunk flow"
    );
    log::debug!("checked {} flows, {sunk} sunk", flows.len());
}

use std::collections::BTreeMap;

use beltflow::{check, solve, Outcome, Problem};

/// A 1500/min supply squeezed through belts that can only move 1300/min
/// past node `a`.
const CONGESTED: &str = r#"{
    "nodes": ["s", "a", "b", "c", "sink"],
    "edges": [
        {"from": "s", "to": "a", "lo": 0, "hi": 1500},
        {"from": "a", "to": "b", "lo": 0, "hi": 800},
        {"from": "b", "to": "sink", "lo": 200, "hi": 800},
        {"from": "a", "to": "c", "lo": 0, "hi": 500},
        {"from": "c", "to": "sink", "lo": 0, "hi": 500}
    ],
    "node_caps": {"a": 1500, "b": 800, "c": 500},
    "sources": {"s": 1500},
    "sink": "sink",
    "tolerance": 1e-9
}"#;

/// The same network after widening the branch belts and hub caps enough to
/// carry the full supply.
const UPGRADED: &str = r#"{
    "nodes": ["s", "a", "b", "c", "sink"],
    "edges": [
        {"from": "s", "to": "a", "lo": 0, "hi": 1500},
        {"from": "a", "to": "b", "lo": 0, "hi": 900},
        {"from": "b", "to": "sink", "lo": 200, "hi": 1200},
        {"from": "a", "to": "c", "lo": 0, "hi": 600},
        {"from": "c", "to": "sink", "lo": 0, "hi": 800}
    ],
    "node_caps": {"a": 1500, "b": 900, "c": 1500},
    "sources": {"s": 1500},
    "sink": "sink",
    "tolerance": 1e-9
}"#;

fn solve_document(input: &str) -> Outcome<f64> {
    let problem: Problem<f64> = serde_json::from_str(input).expect("document parses");
    solve(&problem).expect("document validates")
}

#[test]
fn congested_network_yields_a_cut_certificate() {
    let Outcome::Infeasible {
        cut_reachable,
        deficit,
    } = solve_document(CONGESTED)
    else {
        panic!("expected an infeasible outcome");
    };

    assert_eq!(cut_reachable, ["a", "s"]);
    assert!((deficit.demand_balance - 200.0).abs() < 1e-6);
    assert!(deficit.tight_nodes.is_empty());

    let labels: Vec<(&str, &str)> = deficit
        .tight_edges
        .iter()
        .map(|edge| (edge.from.as_str(), edge.to.as_str()))
        .collect();
    assert_eq!(labels, [("a", "b"), ("a", "c")]);
    for edge in &deficit.tight_edges {
        assert!((edge.flow_needed - 100.0).abs() < 1e-6);
    }
}

#[test]
fn tight_edge_shares_sum_to_the_deficit() {
    let Outcome::Infeasible { deficit, .. } = solve_document(CONGESTED) else {
        panic!("expected an infeasible outcome");
    };
    let total: f64 = deficit.tight_edges.iter().map(|edge| edge.flow_needed).sum();
    assert!((total - deficit.demand_balance).abs() < 1e-6);
}

#[test]
fn upgraded_network_is_feasible() {
    let outcome = solve_document(UPGRADED);
    let Outcome::Ok {
        max_flow_per_min,
        ref flows,
    } = outcome
    else {
        panic!("expected a feasible outcome");
    };

    assert!((max_flow_per_min - 1500.0).abs() < 1e-6);
    let by_pair: BTreeMap<(&str, &str), f64> = flows
        .iter()
        .map(|flow| ((flow.from.as_str(), flow.to.as_str()), flow.flow))
        .collect();
    let expected = [
        (("a", "b"), 900.0),
        (("a", "c"), 600.0),
        (("b", "sink"), 900.0),
        (("c", "sink"), 600.0),
        (("s", "a"), 1500.0),
    ];
    assert_eq!(by_pair.len(), expected.len());
    for (pair, want) in expected {
        assert!(
            (by_pair[&pair] - want).abs() < 1e-6,
            "unexpected flow on {pair:?}"
        );
    }
}

#[test]
fn feasible_assignment_survives_the_invariant_check() {
    let problem: Problem<f64> = serde_json::from_str(UPGRADED).unwrap();
    let outcome = solve(&problem).unwrap();
    assert!(outcome.is_feasible());
    check(&problem, &outcome);
}

#[test]
fn repeated_solves_render_identically() {
    let problem: Problem<f64> = serde_json::from_str(CONGESTED).unwrap();
    let first = serde_json::to_string(&solve(&problem).unwrap()).unwrap();
    let second = serde_json::to_string(&solve(&problem).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn certificate_matches_the_wire_format() {
    let rendered = serde_json::to_value(solve_document(CONGESTED)).unwrap();
    let expected: serde_json::Value = serde_json::from_str(
        r#"{
            "status": "infeasible",
            "cut_reachable": ["a", "s"],
            "deficit": {
                "demand_balance": 200.0,
                "tight_nodes": [],
                "tight_edges": [
                    {"from": "a", "to": "b", "flow_needed": 100.0},
                    {"from": "a", "to": "c", "flow_needed": 100.0}
                ]
            }
        }"#,
    )
    .unwrap();
    assert_eq!(rendered, expected);
}

#[test]
fn lower_bounds_alone_can_exceed_the_supply() {
    // The belt must move at least 5/min but the source only offers 3/min;
    // the surplus has nowhere to go, so the sink side of the cut is empty.
    let problem: Problem<f64> = serde_json::from_str(
        r#"{
            "edges": [{"from": "s", "to": "t", "lo": 5, "hi": 10}],
            "sources": {"s": 3},
            "sink": "t"
        }"#,
    )
    .unwrap();
    let Outcome::Infeasible { deficit, .. } = solve(&problem).unwrap() else {
        panic!("expected an infeasible outcome");
    };
    assert!((deficit.demand_balance - 2.0).abs() < 1e-9);
}

//! Timestep driver behaviour: delays, inner passes, thresholds, persistence
//! and the convergence modes.

use trellis_core::models::{CountMode, CountScope};
use trellis_core::*;
use trellis_engine::{Graph, Reasoner, Timesteps};

fn node(id: &str) -> Component {
    Component::node(id)
}

fn single_node_graph() -> Graph {
    let mut graph = Graph::new();
    graph.add_node("A");
    graph
}

fn copy_rule(name: &str, from: &str, to: &str, delta: u64) -> Rule {
    Rule::builder(name, to)
        .head("x")
        .delta(delta)
        .clause(Clause::node(from, "x"))
        .build()
        .unwrap()
}

fn reasoner_with(config: ReasonerConfig, graph: Graph, rules: Vec<Rule>, facts: Vec<Fact>) -> Reasoner {
    let mut reasoner = Reasoner::new(config);
    reasoner.load_graph(graph);
    for rule in rules {
        reasoner.add_rule(rule);
    }
    for fact in facts {
        reasoner.add_fact(fact);
    }
    reasoner
}

fn holds(reasoner: &Reasoner, time: u64, id: &str, label: &str) -> bool {
    reasoner
        .interpretation()
        .satisfies_at(time, &node(id), Label::new(label), &Bound::TRUE)
}

// ─── Termination ─────────────────────────────────────────────────────────────

#[test]
fn cyclic_rules_reach_a_fixpoint() {
    let mut reasoner = reasoner_with(
        ReasonerConfig::default(),
        single_node_graph(),
        vec![copy_rule("p_to_q", "p", "q", 0), copy_rule("q_to_p", "q", "p", 0)],
        vec![Fact::node("A", "p").build().unwrap()],
    );
    let summary = reasoner.reason(Timesteps::UntilConvergence).unwrap();
    assert!(summary.converged);
    assert_eq!(summary.last_time, Some(2));
    assert!(holds(&reasoner, 0, "A", "q"));
    assert!(!holds(&reasoner, 1, "A", "q"));
}

#[test]
fn persistent_cycle_converges_one_step_after_settling() {
    let mut reasoner = reasoner_with(
        ReasonerConfig {
            persistent: true,
            ..ReasonerConfig::default()
        },
        single_node_graph(),
        vec![copy_rule("p_to_q", "p", "q", 0), copy_rule("q_to_p", "q", "p", 0)],
        vec![Fact::node("A", "p").build().unwrap()],
    );
    let summary = reasoner.reason(Timesteps::UntilConvergence).unwrap();
    assert_eq!(summary.last_time, Some(1));
    assert!(holds(&reasoner, 1, "A", "q"));
}

#[test]
fn convergence_waits_for_pending_facts() {
    let mut reasoner = reasoner_with(
        ReasonerConfig::default(),
        single_node_graph(),
        vec![copy_rule("copy", "p", "q", 0)],
        vec![Fact::node("A", "p").at(5).build().unwrap()],
    );
    let summary = reasoner.reason(Timesteps::UntilConvergence).unwrap();
    assert!(summary.last_time.unwrap() >= 5);
    assert!(holds(&reasoner, 5, "A", "q"));
    assert!(!holds(&reasoner, 4, "A", "q"));
}

// ─── Delay ───────────────────────────────────────────────────────────────────

#[test]
fn delayed_rule_reads_exactly_delta_back() {
    let mut reasoner = reasoner_with(
        ReasonerConfig::default(),
        single_node_graph(),
        vec![copy_rule("later", "p", "q", 2)],
        vec![Fact::node("A", "p").at(0).build().unwrap()],
    );
    reasoner.reason(Timesteps::Fixed(3)).unwrap();
    assert!(!holds(&reasoner, 0, "A", "q"));
    assert!(!holds(&reasoner, 1, "A", "q"));
    assert!(holds(&reasoner, 2, "A", "q"));
    assert!(!holds(&reasoner, 3, "A", "q"));

    let entry = reasoner
        .rule_trace()
        .entries()
        .iter()
        .find(|e| e.cause == "later")
        .unwrap();
    assert_eq!((entry.time, entry.cause_time), (2, 0));
}

#[test]
fn immediate_rules_chain_within_one_timestep() {
    let mut reasoner = reasoner_with(
        ReasonerConfig::default(),
        single_node_graph(),
        vec![copy_rule("a_to_b", "a", "b", 0), copy_rule("b_to_c", "b", "c", 0)],
        vec![Fact::node("A", "a").build().unwrap()],
    );
    let summary = reasoner.reason(Timesteps::Fixed(0)).unwrap();
    assert!(holds(&reasoner, 0, "A", "c"));
    assert_eq!(summary.passes, 3);
    let passes: Vec<u64> = reasoner.rule_trace().entries().iter().map(|e| e.pass).collect();
    assert_eq!(passes, vec![0, 0, 1]);
}

#[test]
fn delta_interpretation_stops_passes_early() {
    let mut reasoner = reasoner_with(
        ReasonerConfig {
            convergence: ConvergenceConfig::delta_interpretation(10),
            ..ReasonerConfig::default()
        },
        single_node_graph(),
        vec![copy_rule("a_to_b", "a", "b", 0), copy_rule("b_to_c", "b", "c", 0)],
        vec![Fact::node("A", "a").build().unwrap()],
    );
    let summary = reasoner.reason(Timesteps::Fixed(0)).unwrap();
    assert_eq!(summary.passes, 1);
    assert!(holds(&reasoner, 0, "A", "b"));
    assert!(!holds(&reasoner, 0, "A", "c"));
}

#[test]
fn delta_bound_accepts_small_movements() {
    let run = |convergence: ConvergenceConfig| {
        let mut reasoner = reasoner_with(
            ReasonerConfig {
                convergence,
                ..ReasonerConfig::default()
            },
            single_node_graph(),
            vec![copy_rule("copy", "p", "q", 0)],
            vec![Fact::node("A", "p").bound(0.3, 1.0).build().unwrap()],
        );
        reasoner.reason(Timesteps::UntilConvergence).unwrap()
    };
    let loose = run(ConvergenceConfig::delta_bound(0.5));
    assert!(loose.converged);
    assert_eq!(loose.last_time, Some(0));

    let strict = run(ConvergenceConfig::perfect());
    assert_eq!(strict.last_time, Some(2));
}

// ─── Persistence ─────────────────────────────────────────────────────────────

#[test]
fn non_persistent_bounds_reset_each_timestep() {
    let facts = vec![Fact::node("A", "p").at(0).build().unwrap()];
    let rules = vec![copy_rule("copy", "p", "q", 0)];

    let mut fresh = reasoner_with(ReasonerConfig::default(), single_node_graph(), rules.clone(), facts.clone());
    fresh.reason(Timesteps::Fixed(2)).unwrap();
    let p = Label::new("p");
    assert_eq!(fresh.interpretation().bound_at(2, &node("A"), p), Some(Bound::UNKNOWN));

    let mut kept = reasoner_with(
        ReasonerConfig {
            persistent: true,
            ..ReasonerConfig::default()
        },
        single_node_graph(),
        rules,
        facts,
    );
    kept.reason(Timesteps::Fixed(2)).unwrap();
    assert_eq!(kept.interpretation().bound_at(2, &node("A"), p), Some(Bound::TRUE));
}

#[test]
fn static_facts_carry_forward() {
    let mut reasoner = reasoner_with(
        ReasonerConfig::default(),
        single_node_graph(),
        vec![copy_rule("copy", "p", "q", 0)],
        vec![Fact::node("A", "p").at(1).set_static(true).build().unwrap()],
    );
    reasoner.reason(Timesteps::Fixed(5)).unwrap();
    assert!(!holds(&reasoner, 0, "A", "p"));
    for t in 1..=5 {
        assert!(holds(&reasoner, t, "A", "p"), "t={t}");
        assert!(holds(&reasoner, t, "A", "q"), "t={t}");
    }
    let fact_entries = reasoner
        .rule_trace()
        .entries()
        .iter()
        .filter(|e| e.label == Label::new("p"))
        .count();
    assert_eq!(fact_entries, 1);
}

#[test]
fn fact_window_opens_late() {
    let mut reasoner = reasoner_with(
        ReasonerConfig::default(),
        single_node_graph(),
        vec![copy_rule("copy", "p", "q", 0)],
        vec![Fact::node("A", "p").during(2, 3).build().unwrap()],
    );
    reasoner.reason(Timesteps::Fixed(4)).unwrap();
    let hits: Vec<bool> = (0..=4).map(|t| holds(&reasoner, t, "A", "p")).collect();
    assert_eq!(hits, vec![false, false, true, true, false]);
}

// ─── Thresholds ──────────────────────────────────────────────────────────────

fn fan_graph() -> Graph {
    let mut graph = Graph::new();
    for leaf in ["n1", "n2", "n3", "n4", "n5"] {
        graph.add_edge_with("hub", leaf, [("link", Bound::TRUE)]);
    }
    for leaf in ["m1", "m2"] {
        graph.add_edge_with("hub2", leaf, [("link", Bound::TRUE)]);
    }
    for leaf in ["k1", "k2", "k3"] {
        graph.add_edge_with("lonely", leaf, [("link", Bound::TRUE)]);
    }
    graph
}

fn neighbour_rule(name: &str, threshold: Threshold) -> Rule {
    Rule::builder(name, name)
        .head("x")
        .clause(Clause::edge("link", "x", "y"))
        .clause_with_threshold(Clause::node("flagged", "y"), threshold)
        .build()
        .unwrap()
}

#[test]
fn existential_fires_on_a_single_neighbour() {
    let mut reasoner = reasoner_with(
        ReasonerConfig::default(),
        fan_graph(),
        vec![neighbour_rule("alert", Threshold::default())],
        vec![
            Fact::node("n3", "flagged").build().unwrap(),
            Fact::node("m1", "flagged").build().unwrap(),
        ],
    );
    reasoner.reason(Timesteps::Fixed(0)).unwrap();
    assert!(holds(&reasoner, 0, "hub", "alert"));
    assert!(holds(&reasoner, 0, "hub2", "alert"));
    assert!(!holds(&reasoner, 0, "lonely", "alert"));
}

#[test]
fn percent_threshold_counts_per_head() {
    let half = Threshold::new(Quantifier::GreaterEqual, CountMode::Percent, CountScope::Total, 50.0);
    let mut reasoner = reasoner_with(
        ReasonerConfig::default(),
        fan_graph(),
        vec![neighbour_rule("majority", half)],
        vec![
            Fact::node("n3", "flagged").build().unwrap(),
            Fact::node("m1", "flagged").build().unwrap(),
        ],
    );
    reasoner.reason(Timesteps::Fixed(0)).unwrap();
    assert!(!holds(&reasoner, 0, "hub", "majority"));
    assert!(holds(&reasoner, 0, "hub2", "majority"));
}

#[test]
fn percent_threshold_holds_at_an_exact_boundary() {
    let mut graph = Graph::new();
    let leaves: Vec<String> = (0..10).map(|i| format!("leaf{i}")).collect();
    for leaf in &leaves {
        graph.add_edge_with("center", leaf, [("link", Bound::TRUE)]);
    }
    let seventy = Threshold::new(Quantifier::GreaterEqual, CountMode::Percent, CountScope::Total, 70.0);
    let mut reasoner = reasoner_with(
        ReasonerConfig::default(),
        graph,
        vec![neighbour_rule("seventy", seventy)],
        leaves[..7]
            .iter()
            .map(|leaf| Fact::node(leaf, "flagged").build().unwrap())
            .collect(),
    );
    reasoner.reason(Timesteps::Fixed(0)).unwrap();
    assert!(holds(&reasoner, 0, "center", "seventy"));
}

#[test]
fn available_scope_ignores_neighbours_without_the_label() {
    let all_available = Threshold::new(Quantifier::GreaterEqual, CountMode::Percent, CountScope::Available, 100.0);
    let all_total = Threshold::forall();
    let mut reasoner = reasoner_with(
        ReasonerConfig::default(),
        fan_graph(),
        vec![
            neighbour_rule("available_ok", all_available),
            neighbour_rule("total_ok", all_total),
        ],
        vec![Fact::node("k1", "flagged").build().unwrap()],
    );
    reasoner.reason(Timesteps::Fixed(0)).unwrap();
    assert!(holds(&reasoner, 0, "lonely", "available_ok"));
    assert!(!holds(&reasoner, 0, "lonely", "total_ok"));
}

#[test]
fn at_most_threshold_fires_without_matches() {
    let none = Threshold::new(Quantifier::Equal, CountMode::Number, CountScope::Total, 0.0);
    let mut reasoner = reasoner_with(
        ReasonerConfig::default(),
        fan_graph(),
        vec![neighbour_rule("quiet", none)],
        vec![Fact::node("n1", "flagged").build().unwrap()],
    );
    reasoner.reason(Timesteps::Fixed(0)).unwrap();
    assert!(!holds(&reasoner, 0, "hub", "quiet"));
    assert!(holds(&reasoner, 0, "hub2", "quiet"));
    assert!(holds(&reasoner, 0, "lonely", "quiet"));
}

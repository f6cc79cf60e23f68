//! Facade behaviour: readiness errors, bulk loading, continuing a run,
//! the fact channel, resets, custom functions, queries and trace export.

use std::thread;

use trellis_core::*;
use trellis_engine::{CauseKind, Graph, Reasoner, Timesteps};

fn node(id: &str) -> Component {
    Component::node(id)
}

fn line_graph(ids: &[&str]) -> Graph {
    let mut graph = Graph::new();
    for pair in ids.windows(2) {
        graph.add_edge_with(pair[0], pair[1], [("link", Bound::TRUE)]);
    }
    graph
}

fn copy_rule(from: &str, to: &str) -> Rule {
    Rule::builder(&format!("{from}_to_{to}"), to)
        .head("x")
        .clause(Clause::node(from, "x"))
        .build()
        .unwrap()
}

fn ready_reasoner() -> Reasoner {
    let mut reasoner = Reasoner::new(ReasonerConfig::default());
    reasoner.load_graph(line_graph(&["A", "B", "C"]));
    reasoner.add_rule(copy_rule("p", "q"));
    reasoner.add_fact(Fact::node("A", "p").build().unwrap());
    reasoner
}

fn holds(reasoner: &Reasoner, time: u64, id: &str, label: &str) -> bool {
    reasoner
        .interpretation()
        .satisfies_at(time, &node(id), Label::new(label), &Bound::TRUE)
}

// ─── Readiness ───────────────────────────────────────────────────────────────

#[test]
fn reasoning_requires_a_graph() {
    let mut reasoner = Reasoner::new(ReasonerConfig::default());
    reasoner.add_rule(copy_rule("p", "q"));
    let err = reasoner.reason(Timesteps::Fixed(0)).unwrap_err();
    assert!(matches!(err, TrellisError::MissingGraph));
}

#[test]
fn reasoning_requires_rules() {
    let mut reasoner = Reasoner::new(ReasonerConfig::default());
    reasoner.load_graph(line_graph(&["A", "B"]));
    let err = reasoner.reason(Timesteps::Fixed(0)).unwrap_err();
    assert!(matches!(err, TrellisError::MissingRules));
}

#[test]
fn unregistered_functions_are_rejected_before_reasoning() {
    let mut reasoner = ready_reasoner();
    reasoner.add_rule(
        Rule::builder("scored", "score")
            .head("x")
            .clause(Clause::node("p", "x"))
            .annotation_function("weighted_vote")
            .build()
            .unwrap(),
    );
    let err = reasoner.reason(Timesteps::Fixed(0)).unwrap_err();
    assert!(matches!(err, TrellisError::UnknownAnnotationFunction { ref name, .. } if name == "weighted_vote"));
    assert!(reasoner.interpretation().is_empty());

    reasoner.reset_rules();
    reasoner.add_rule(
        Rule::builder("routed", "flag")
            .head_term(HeadTerm::function("route", "x"))
            .clause(Clause::node("p", "x"))
            .build()
            .unwrap(),
    );
    let err = reasoner.reason(Timesteps::Fixed(0)).unwrap_err();
    assert!(matches!(err, TrellisError::UnknownHeadFunction { ref name, .. } if name == "route"));
}

// ─── Bulk loading ────────────────────────────────────────────────────────────

fn builders() -> Vec<RuleBuilder> {
    vec![
        Rule::builder("good", "q").head("x").clause(Clause::node("p", "x")),
        Rule::builder("empty_body", "q").head("x"),
        Rule::builder("also_good", "r").head("x").clause(Clause::node("q", "x")),
    ]
}

#[test]
fn bulk_rules_report_rejects() {
    let mut reasoner = Reasoner::new(ReasonerConfig::default());
    let report = reasoner.add_rules_bulk(builders(), false).unwrap();
    assert_eq!(report.accepted, 2);
    assert!(!report.is_clean());
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].0, 1);
    assert!(matches!(report.rejected[0].1, TrellisError::InvalidRule { .. }));
    assert_eq!(reasoner.rules().len(), 2);
}

#[test]
fn bulk_rules_raise_on_first_error() {
    let mut reasoner = Reasoner::new(ReasonerConfig::default());
    assert!(reasoner.add_rules_bulk(builders(), true).is_err());
    assert!(reasoner.rules().is_empty());
}

#[test]
fn bulk_facts_validate_bounds() {
    let mut reasoner = Reasoner::new(ReasonerConfig::default());
    let report = reasoner
        .add_facts_bulk(
            vec![
                Fact::node("A", "p"),
                Fact::node("A", "p").bound(0.7, 0.2),
                Fact::node("B", "p").bound(0.0, 1.5),
            ],
            false,
        )
        .unwrap();
    assert_eq!(report.accepted, 1);
    assert!(matches!(report.rejected[0].1, TrellisError::BoundOrder { .. }));
    assert!(matches!(report.rejected[1].1, TrellisError::BoundOutOfRange { .. }));
    assert_eq!(reasoner.facts().len(), 1);
}

// ─── Continuing a run ────────────────────────────────────────────────────────

#[test]
fn reason_again_continues_from_the_last_timestep() {
    let mut reasoner = ready_reasoner();
    reasoner.reason(Timesteps::Fixed(1)).unwrap();
    assert_eq!(reasoner.last_time(), Some(1));
    let passes_before = reasoner.total_passes();

    let summary = reasoner
        .reason_again(
            Timesteps::Fixed(2),
            vec![
                Fact::node("B", "p").at(3).build().unwrap(),
                Fact::node("C", "p").at(0).build().unwrap(),
            ],
        )
        .unwrap();
    assert_eq!(summary.timesteps, 2);
    assert_eq!(summary.last_time, Some(3));
    assert_eq!(reasoner.interpretation().timesteps(), 4);
    assert!(reasoner.total_passes() > passes_before);

    assert!(holds(&reasoner, 0, "A", "q"));
    assert!(!holds(&reasoner, 2, "B", "q"));
    assert!(holds(&reasoner, 3, "B", "q"));
    // The fact for C ended before the resume point.
    assert!(!holds(&reasoner, 3, "C", "q"));
    assert_eq!(reasoner.facts().len(), 2);
}

#[test]
fn reason_again_without_a_previous_run_starts_fresh() {
    let mut reasoner = ready_reasoner();
    let summary = reasoner
        .reason_again(Timesteps::Fixed(1), vec![Fact::node("B", "p").build().unwrap()])
        .unwrap();
    assert_eq!(summary.last_time, Some(1));
    assert!(holds(&reasoner, 0, "A", "q"));
    assert!(holds(&reasoner, 0, "B", "q"));
}

#[test]
fn reason_again_with_zero_steps_is_a_no_op() {
    let mut reasoner = ready_reasoner();
    reasoner.reason(Timesteps::Fixed(1)).unwrap();
    let summary = reasoner.reason_again(Timesteps::Fixed(0), Vec::new()).unwrap();
    assert_eq!(summary.timesteps, 0);
    assert_eq!(summary.last_time, Some(1));
    assert_eq!(reasoner.interpretation().timesteps(), 2);
}

// ─── Fact channel ────────────────────────────────────────────────────────────

#[test]
fn facts_sent_from_another_thread_are_applied() {
    let mut reasoner = ready_reasoner();
    let sender = reasoner.fact_sender();
    thread::spawn(move || {
        sender
            .send(Fact::node("C", "p").build().unwrap())
            .unwrap();
    })
    .join()
    .unwrap();

    reasoner.reason(Timesteps::Fixed(0)).unwrap();
    assert!(holds(&reasoner, 0, "C", "q"));
}

// ─── Resets ──────────────────────────────────────────────────────────────────

#[test]
fn reset_keeps_config_and_functions() {
    let mut reasoner = Reasoner::new(ReasonerConfig {
        persistent: true,
        ..ReasonerConfig::default()
    });
    reasoner.load_graph(line_graph(&["A", "B"]));
    reasoner.add_rule(copy_rule("p", "q"));
    reasoner.add_annotation_function("product", |_, _| (0.0, 1.0));
    reasoner.add_inconsistent_predicate("p", "not_p");
    reasoner.reason(Timesteps::Fixed(0)).unwrap();

    reasoner.reset();
    assert!(reasoner.config().persistent);
    assert!(reasoner.functions().has_annotation("product"));
    assert!(reasoner.graph().is_none());
    assert!(reasoner.rules().is_empty());
    assert!(reasoner.inconsistent_predicates().is_empty());
    assert!(reasoner.interpretation().is_empty());
    assert_eq!(reasoner.last_time(), None);
}

#[test]
fn partial_resets() {
    let mut reasoner = ready_reasoner();
    reasoner.reason(Timesteps::Fixed(0)).unwrap();

    reasoner.reset_facts();
    assert!(reasoner.facts().is_empty());
    reasoner.reason(Timesteps::Fixed(0)).unwrap();
    assert!(!holds(&reasoner, 0, "A", "q"));

    reasoner.reset_graph();
    assert!(reasoner.interpretation().is_empty());
    assert!(matches!(
        reasoner.reason(Timesteps::Fixed(0)),
        Err(TrellisError::MissingGraph)
    ));

    reasoner.load_graph(line_graph(&["A", "B"]));
    reasoner.reset_rules();
    assert!(matches!(
        reasoner.reason(Timesteps::Fixed(0)),
        Err(TrellisError::MissingRules)
    ));
}

// ─── Custom functions and ground rules ───────────────────────────────────────

#[test]
fn head_function_targets_missing_nodes_are_skipped() {
    let mut reasoner = Reasoner::new(ReasonerConfig::default());
    reasoner.load_graph(line_graph(&["A", "B", "C"]));
    reasoner.add_head_function("buddy", |nodes: &[NodeId]| {
        nodes
            .iter()
            .filter_map(|n| match n.as_str() {
                "A" => Some(NodeId::new("B")),
                "C" => Some(NodeId::new("Zed")),
                _ => None,
            })
            .collect()
    });
    reasoner.add_rule(
        Rule::builder("warn_buddy", "warned")
            .head_term(HeadTerm::function("buddy", "x"))
            .clause(Clause::node("risky", "x"))
            .build()
            .unwrap(),
    );
    reasoner.add_fact(Fact::node("A", "risky").build().unwrap());
    reasoner.add_fact(Fact::node("C", "risky").build().unwrap());
    reasoner.reason(Timesteps::Fixed(0)).unwrap();

    let warned = Label::new("warned");
    assert!(holds(&reasoner, 0, "B", "warned"));
    assert!(!reasoner.interpretation().snapshot(0).unwrap().has_label(&node("A"), warned));
    assert!(!reasoner.interpretation().snapshot(0).unwrap().contains(&node("Zed")));
}

fn pinned_rule_run(allow_ground_rules: bool) -> Reasoner {
    let mut reasoner = Reasoner::new(ReasonerConfig {
        allow_ground_rules,
        ..ReasonerConfig::default()
    });
    reasoner.load_graph(line_graph(&["A", "B"]));
    reasoner.add_rule(
        Rule::builder("pin", "flag")
            .head("A")
            .clause(Clause::node("seed", "A"))
            .build()
            .unwrap(),
    );
    reasoner.add_fact(Fact::node("B", "seed").build().unwrap());
    reasoner.reason(Timesteps::Fixed(0)).unwrap();
    reasoner
}

#[test]
fn ground_rules_pin_node_names() {
    let pinned = pinned_rule_run(true);
    assert!(!holds(&pinned, 0, "A", "flag"));
    assert!(!holds(&pinned, 0, "B", "flag"));

    let free = pinned_rule_run(false);
    assert!(holds(&free, 0, "B", "flag"));
}

#[test]
fn ground_rules_pin_numeric_node_ids() {
    let mut reasoner = Reasoner::new(ReasonerConfig {
        allow_ground_rules: true,
        ..ReasonerConfig::default()
    });
    reasoner.load_graph(line_graph(&["1", "2", "3"]));
    reasoner.add_rule(
        Rule::builder("after_one", "next")
            .head("y")
            .clause(Clause::edge("link", "1", "y"))
            .build()
            .unwrap(),
    );
    reasoner.reason(Timesteps::Fixed(0)).unwrap();
    assert!(holds(&reasoner, 0, "2", "next"));
    assert!(!holds(&reasoner, 0, "3", "next"));
}

#[test]
fn comparison_clause_compares_lower_bounds() {
    let mut reasoner = Reasoner::new(ReasonerConfig::default());
    reasoner.load_graph(line_graph(&["A", "B"]));
    reasoner.add_rule(
        Rule::builder("outranks", "leader")
            .head("x")
            .clause(Clause::comparison("score", "x", Comparator::Greater, "score", "y"))
            .build()
            .unwrap(),
    );
    reasoner.add_fact(Fact::node("A", "score").bound(0.8, 1.0).build().unwrap());
    reasoner.add_fact(Fact::node("B", "score").bound(0.3, 1.0).build().unwrap());
    reasoner.reason(Timesteps::Fixed(0)).unwrap();

    assert!(holds(&reasoner, 0, "A", "leader"));
    assert!(!holds(&reasoner, 0, "B", "leader"));
}

// ─── Parallel grounding ──────────────────────────────────────────────────────

fn spread_run(parallel: bool) -> Reasoner {
    let mut graph = Graph::new();
    let ids = ["n0", "n1", "n2", "n3", "n4", "n5", "n6", "n7"];
    for (i, a) in ids.iter().enumerate() {
        for b in ids.iter().skip(i + 1).step_by(3) {
            graph.add_edge_with(a, b, [("knows", Bound::TRUE)]);
        }
    }
    let mut reasoner = Reasoner::new(ReasonerConfig {
        parallel_computing: parallel,
        atom_trace: true,
        ..ReasonerConfig::default()
    });
    reasoner.load_graph(graph);
    reasoner.add_rule(
        Rule::builder("spread", "informed")
            .head("y")
            .delta(1)
            .clause(Clause::node("informed", "x"))
            .clause(Clause::edge("knows", "x", "y"))
            .build()
            .unwrap(),
    );
    reasoner.add_rule(copy_rule("informed", "aware"));
    reasoner.add_fact(Fact::node("n0", "informed").during(0, 5).build().unwrap());
    reasoner.reason(Timesteps::Fixed(5)).unwrap();
    reasoner
}

#[test]
fn parallel_grounding_matches_sequential() {
    let sequential = spread_run(false);
    let parallel = spread_run(true);
    assert_eq!(sequential.interpretation().to_map(), parallel.interpretation().to_map());
    assert_eq!(sequential.rule_trace().rows(), parallel.rule_trace().rows());
    assert!(!sequential.rule_trace().is_empty());
}

// ─── Queries and export ──────────────────────────────────────────────────────

#[test]
fn queries_over_the_interpretation() {
    let mut reasoner = ready_reasoner();
    reasoner.reason(Timesteps::Fixed(1)).unwrap();
    let interpretation = reasoner.interpretation();

    let map = interpretation.to_map();
    assert_eq!(map.len(), 2);
    assert_eq!(map[&0][&node("A")][&Label::new("q")], Bound::TRUE);

    let changed = interpretation.changed_atoms(1);
    assert!(changed
        .iter()
        .any(|c| c.component == node("A") && c.label == Label::new("q") && c.current == Bound::UNKNOWN));

    let rows = interpretation.filter_nodes(&["q"], &Bound::TRUE);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].time, 0);
    assert_eq!(rows[0].component, node("A"));
    assert_eq!(rows[0].bounds, vec![(Label::new("q"), Some(Bound::TRUE))]);

    let links = interpretation.filter_edges(&["link"], &Bound::TRUE);
    assert_eq!(links.len(), 4);

    assert!(!interpretation.query(&node("A"), Label::new("q"), &Bound::TRUE));
}

#[test]
fn trace_export_pads_clause_columns() {
    let mut reasoner = Reasoner::new(ReasonerConfig {
        atom_trace: true,
        ..ReasonerConfig::default()
    });
    reasoner.load_graph(line_graph(&["A", "B"]));
    reasoner.add_rule(copy_rule("p", "q"));
    reasoner.add_rule(
        Rule::builder("pass_on", "r")
            .head("y")
            .clause(Clause::node("q", "x"))
            .clause(Clause::edge("link", "x", "y"))
            .build()
            .unwrap(),
    );
    reasoner.add_fact(Fact::node("A", "p").named("seed").build().unwrap());
    reasoner.reason(Timesteps::Fixed(0)).unwrap();

    let trace = reasoner.rule_trace();
    let columns = trace.columns();
    assert_eq!(columns.last().map(String::as_str), Some("Clause-2"));

    let rows = trace.node_rows();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].cause, "seed");
    assert_eq!(rows[0].cause_kind, CauseKind::Fact);
    assert_eq!(rows[0].clauses, vec![String::new(), String::new()]);

    let copied = &rows[1];
    assert_eq!(copied.label, "q");
    assert_eq!(copied.clauses[0], "[A]");
    assert_eq!(copied.clauses[1], "");

    let passed = &rows[2];
    assert_eq!(passed.component, "B");
    assert_eq!(passed.clauses, vec!["[A]".to_string(), "[(A, B)]".to_string()]);
    assert!(trace.edge_rows().is_empty());

    let json = trace.to_json().unwrap();
    assert!(json.contains("\"cause\": \"seed\""));
    assert!(json.contains("\"clauses\""));
}

//! Integration tests for the relationship layout
//!
//! Runs whole simulations over generated-looking graphs and checks the
//! settled result rather than individual ticks.

use chronomap::core::config::ChronoConfig;
use chronomap::core::types::Vec2;
use chronomap::simulation::forces::ForceConfig;
use chronomap::simulation::layout::{GraphLayout, LayoutSeed, Simulation};
use chronomap::snapshot::fallback::seed_snapshot;
use chronomap::snapshot::model::{GraphLink, GraphNode, RelationshipGraph};

fn graph(nodes: &[(&str, &str)], links: &[(&str, &str)]) -> RelationshipGraph {
    RelationshipGraph {
        nodes: nodes
            .iter()
            .map(|(id, group)| GraphNode {
                id: (*id).into(),
                group: (*group).into(),
                radius: None,
                details: None,
            })
            .collect(),
        links: links
            .iter()
            .map(|(s, t)| GraphLink {
                source: (*s).into(),
                target: (*t).into(),
                label: None,
                kind: None,
            })
            .collect(),
        description: String::new(),
    }
}

fn settle(graph: &RelationshipGraph, seed: LayoutSeed) -> (GraphLayout, Vec<Vec2>) {
    let layout = GraphLayout::from_graph(graph);
    let config = ChronoConfig::default().force_config();
    let frame = Simulation::new(&layout, config, 600.0, 400.0, seed)
        .settle()
        .expect("non-empty graph yields frames");
    (layout, frame.positions)
}

#[test]
fn test_seed_graph_settles_finite_and_centered() {
    let (_, positions) = settle(&seed_snapshot().relationships, LayoutSeed::Phyllotaxis);
    assert!(positions.iter().all(Vec2::is_finite));

    let n = positions.len() as f64;
    let mean = positions.iter().fold(Vec2::ZERO, |acc, p| acc + *p) * (1.0 / n);
    assert!(mean.distance(&Vec2::new(300.0, 200.0)) < 1.0);
}

#[test]
fn test_links_pull_together_from_random_start() {
    // Two linked pairs scattered across the canvas
    let g = graph(
        &[("Caesar", "person"), ("Rome", "nation"), ("Cleopatra", "person"), ("Egypt", "nation")],
        &[("Caesar", "Rome"), ("Cleopatra", "Egypt")],
    );
    let (layout, positions) = settle(&g, LayoutSeed::Random(42));

    let at = |id: &str| positions[layout.index_of(id).unwrap()];
    let linked = at("Caesar").distance(&at("Rome"));
    let unlinked = at("Caesar").distance(&at("Egypt"));

    assert!(linked < 200.0, "linked pair should settle near the rest length, got {}", linked);
    assert!(linked < unlinked + 80.0);
}

#[test]
fn test_settled_links_shorter_than_random_start() {
    let ids: Vec<String> = (0..10).map(|i| format!("n{}", i)).collect();
    let nodes: Vec<(&str, &str)> = ids.iter().map(|id| (id.as_str(), "nation")).collect();
    let links: Vec<(&str, &str)> = (0..10).map(|i| (ids[i].as_str(), ids[(i + 1) % 10].as_str())).collect();
    let layout = GraphLayout::from_graph(&graph(&nodes, &links));
    let config = ChronoConfig::default().force_config();
    let mut sim = Simulation::new(&layout, config, 600.0, 400.0, LayoutSeed::Random(7));

    let mean_link = |positions: &[Vec2]| {
        let edges = layout.edges();
        let total: f64 = edges
            .iter()
            .map(|&(a, b)| positions[a].distance(&positions[b]))
            .sum();
        total / edges.len() as f64
    };

    let start = sim.state().positions.clone();
    let initial = mean_link(&start);
    let settled = sim.settle().expect("non-empty graph yields frames");
    assert!(mean_link(&settled.positions) < initial);
}

#[test]
fn test_no_overlap_after_settling() {
    let g = graph(
        &[("a", "person"), ("b", "person"), ("c", "nation"), ("d", "organization"), ("e", "nation")],
        &[("a", "c"), ("b", "c"), ("d", "e"), ("c", "e")],
    );
    let (_, positions) = settle(&g, LayoutSeed::Phyllotaxis);
    for i in 0..positions.len() {
        for j in (i + 1)..positions.len() {
            assert!(positions[i].distance(&positions[j]) > 5.0);
        }
    }
}

#[test]
fn test_dangling_links_do_not_break_layout() {
    let g = graph(
        &[("Augustus", "person"), ("Rome", "nation")],
        &[("Augustus", "Rome"), ("Augustus", "Atlantis"), ("Mu", "Lemuria")],
    );
    let (layout, positions) = settle(&g, LayoutSeed::Phyllotaxis);
    assert_eq!(layout.edges().len(), 1);
    assert_eq!(layout.skipped_links(), 2);
    assert_eq!(positions.len(), 2);
    assert!(positions.iter().all(Vec2::is_finite));
}

#[test]
fn test_iteration_budget_is_respected() {
    let layout = GraphLayout::from_graph(&seed_snapshot().relationships);
    let config = ForceConfig {
        max_iterations: 25,
        convergence_tolerance: 0.0,
        ..ForceConfig::default()
    };
    let frames = Simulation::new(&layout, config, 600.0, 400.0, LayoutSeed::Phyllotaxis).count();
    assert_eq!(frames, 25);
}

#[test]
fn test_single_node_graph() {
    let g = graph(&[("Alone", "person")], &[]);
    let (_, positions) = settle(&g, LayoutSeed::Random(1));
    assert_eq!(positions.len(), 1);
    assert!(positions[0].distance(&Vec2::new(300.0, 200.0)) < 1e-6);
}

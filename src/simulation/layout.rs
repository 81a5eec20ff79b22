//! Relationship graph indexing and the finite layout iterator

use std::f64::consts::PI;

use ahash::AHashMap;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::types::Vec2;
use crate::simulation::forces::{step, ForceConfig, ForceModel, LayoutState};
use crate::snapshot::model::RelationshipGraph;

/// Spacing of the phyllotaxis spiral
const INITIAL_RADIUS: f64 = 10.0;

/// How nodes are placed before the first tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutSeed {
    /// Golden-angle spiral around the canvas center
    #[default]
    Phyllotaxis,
    /// Uniform over the canvas, reproducible per seed
    Random(u64),
}

/// Node ids and resolved link endpoints of one relationship graph
#[derive(Debug, Clone, PartialEq)]
pub struct GraphLayout {
    ids: Vec<String>,
    groups: Vec<String>,
    index: AHashMap<String, usize>,
    edges: Vec<(usize, usize)>,
    skipped_links: usize,
}

impl GraphLayout {
    /// Index the graph; links naming an unknown node are skipped
    pub fn from_graph(graph: &RelationshipGraph) -> Self {
        let mut ids = Vec::with_capacity(graph.nodes.len());
        let mut groups = Vec::with_capacity(graph.nodes.len());
        let mut index = AHashMap::with_capacity(graph.nodes.len());

        for node in &graph.nodes {
            if index.contains_key(&node.id) {
                continue;
            }
            index.insert(node.id.clone(), ids.len());
            ids.push(node.id.clone());
            groups.push(node.group.clone());
        }

        let mut edges = Vec::with_capacity(graph.links.len());
        let mut skipped_links = 0;
        for link in &graph.links {
            match (index.get(&link.source), index.get(&link.target)) {
                (Some(&s), Some(&t)) => edges.push((s, t)),
                _ => {
                    tracing::debug!("Skipping dangling link {} -> {}", link.source, link.target);
                    skipped_links += 1;
                }
            }
        }

        Self {
            ids,
            groups,
            index,
            edges,
            skipped_links,
        }
    }

    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn group(&self, idx: usize) -> Option<&str> {
        self.groups.get(idx).map(String::as_str)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Links whose endpoints both exist
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    pub fn skipped_links(&self) -> usize {
        self.skipped_links
    }

    /// Segment endpoints of every drawable link in `frame`
    pub fn edge_segments(&self, frame: &LayoutFrame) -> Vec<(Vec2, Vec2)> {
        self.edges
            .iter()
            .filter_map(|&(s, t)| Some((*frame.positions.get(s)?, *frame.positions.get(t)?)))
            .collect()
    }

    pub fn initial_positions(&self, seed: LayoutSeed, width: f64, height: f64) -> Vec<Vec2> {
        let center = Vec2::new(width / 2.0, height / 2.0);
        match seed {
            LayoutSeed::Phyllotaxis => {
                let golden = PI * (3.0 - 5f64.sqrt());
                (0..self.ids.len())
                    .map(|i| {
                        let r = INITIAL_RADIUS * (0.5 + i as f64).sqrt();
                        let angle = i as f64 * golden;
                        center + Vec2::new(r * angle.cos(), r * angle.sin())
                    })
                    .collect()
            }
            LayoutSeed::Random(seed) => {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                (0..self.ids.len())
                    .map(|_| Vec2::new(rng.gen_range(0.0..width.max(1.0)), rng.gen_range(0.0..height.max(1.0))))
                    .collect()
            }
        }
    }
}

/// One published layout step
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutFrame {
    pub positions: Vec<Vec2>,
    pub iteration: usize,
    pub alpha: f64,
    pub max_displacement: f64,
}

impl LayoutFrame {
    fn from_state(state: &LayoutState) -> Self {
        Self {
            positions: state.positions.clone(),
            iteration: state.iteration,
            alpha: state.alpha,
            max_displacement: state.max_displacement,
        }
    }
}

/// Finite, restartable stream of layout frames
///
/// Ends when alpha cools below `alpha_min`, when the largest per-tick
/// displacement drops under `convergence_tolerance`, or when
/// `max_iterations` ticks have run.
#[derive(Debug, Clone)]
pub struct Simulation {
    model: ForceModel,
    initial: LayoutState,
    state: LayoutState,
    finished: bool,
}

impl Simulation {
    pub fn new(layout: &GraphLayout, config: ForceConfig, width: f64, height: f64, seed: LayoutSeed) -> Self {
        let center = Vec2::new(width / 2.0, height / 2.0);
        let model = ForceModel::new(config, layout.node_count(), layout.edges(), center);
        let initial = LayoutState::at_rest(layout.initial_positions(seed, width, height), config.alpha_start);
        Self {
            model,
            state: initial.clone(),
            initial,
            finished: layout.node_count() == 0,
        }
    }

    pub fn state(&self) -> &LayoutState {
        &self.state
    }

    pub fn model(&self) -> &ForceModel {
        &self.model
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Rewind to the initial placement
    pub fn restart(&mut self) {
        self.state = self.initial.clone();
        self.finished = self.state.is_empty();
    }

    /// Run to completion and return the final frame
    pub fn settle(&mut self) -> Option<LayoutFrame> {
        self.by_ref().last()
    }

    fn converged(&self) -> bool {
        let config = self.model.config();
        self.state.alpha < config.alpha_min
            || self.state.max_displacement < config.convergence_tolerance
            || self.state.iteration >= config.max_iterations
    }
}

impl Iterator for Simulation {
    type Item = LayoutFrame;

    fn next(&mut self) -> Option<LayoutFrame> {
        if self.finished {
            return None;
        }
        self.state = step(&self.state, &self.model);
        if self.converged() {
            self.finished = true;
            tracing::debug!(
                "Layout settled after {} ticks (alpha {:.4})",
                self.state.iteration,
                self.state.alpha
            );
        }
        Some(LayoutFrame::from_state(&self.state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::fallback::seed_snapshot;
    use crate::snapshot::model::{GraphLink, GraphNode};

    fn node(id: &str, group: &str) -> GraphNode {
        GraphNode {
            id: id.into(),
            group: group.into(),
            radius: None,
            details: None,
        }
    }

    fn link(source: &str, target: &str) -> GraphLink {
        GraphLink {
            source: source.into(),
            target: target.into(),
            label: None,
            kind: None,
        }
    }

    #[test]
    fn test_dangling_links_are_skipped() {
        let graph = RelationshipGraph {
            nodes: vec![node("Rome", "nation"), node("Han", "nation")],
            links: vec![link("Rome", "Han"), link("Rome", "Atlantis")],
            description: String::new(),
        };
        let layout = GraphLayout::from_graph(&graph);
        assert_eq!(layout.edges(), &[(0, 1)]);
        assert_eq!(layout.skipped_links(), 1);
    }

    #[test]
    fn test_phyllotaxis_is_deterministic_and_distinct() {
        let layout = GraphLayout::from_graph(&seed_snapshot().relationships);
        let a = layout.initial_positions(LayoutSeed::Phyllotaxis, 400.0, 300.0);
        let b = layout.initial_positions(LayoutSeed::Phyllotaxis, 400.0, 300.0);
        assert_eq!(a, b);
        for i in 0..a.len() {
            for j in (i + 1)..a.len() {
                assert!(a[i].distance(&a[j]) > 1.0);
            }
        }
    }

    #[test]
    fn test_random_seed_reproducible() {
        let layout = GraphLayout::from_graph(&seed_snapshot().relationships);
        let a = layout.initial_positions(LayoutSeed::Random(7), 400.0, 300.0);
        let b = layout.initial_positions(LayoutSeed::Random(7), 400.0, 300.0);
        assert_eq!(a, b);
        assert!(a.iter().all(|p| (0.0..400.0).contains(&p.x) && (0.0..300.0).contains(&p.y)));
    }

    #[test]
    fn test_simulation_is_finite() {
        let layout = GraphLayout::from_graph(&seed_snapshot().relationships);
        let config = ForceConfig::default();
        let frames: Vec<_> = Simulation::new(&layout, config, 400.0, 300.0, LayoutSeed::Phyllotaxis).collect();
        assert!(!frames.is_empty());
        assert!(frames.len() <= config.max_iterations);
        assert!(frames.iter().all(|f| f.positions.iter().all(Vec2::is_finite)));
    }

    #[test]
    fn test_restart_replays_identically() {
        let layout = GraphLayout::from_graph(&seed_snapshot().relationships);
        let mut sim = Simulation::new(&layout, ForceConfig::default(), 400.0, 300.0, LayoutSeed::Phyllotaxis);
        let first = sim.settle();
        assert!(sim.is_finished());
        sim.restart();
        assert!(!sim.is_finished());
        assert_eq!(sim.settle(), first);
    }

    #[test]
    fn test_empty_graph_yields_nothing() {
        let layout = GraphLayout::from_graph(&RelationshipGraph::default());
        let mut sim = Simulation::new(&layout, ForceConfig::default(), 400.0, 300.0, LayoutSeed::Phyllotaxis);
        assert!(sim.next().is_none());
    }
}

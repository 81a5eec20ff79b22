//! Force model for the relationship graph
//!
//! Velocity-Verlet relaxation in the style of d3-force: every tick cools
//! alpha, accumulates link, many-body and centering contributions into
//! node velocities, then applies velocity decay and moves each node.
//! `step` is pure; the same state and model always give the same result.

use crate::core::types::Vec2;

// =============================================================================
// FORCE CONFIG
// =============================================================================

/// Tuning for the relationship layout
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceConfig {
    /// Rest length of every link spring
    pub link_distance: f64,

    /// Many-body strength; negative values repel
    pub charge_strength: f64,

    /// Distance below which repulsion stops growing
    pub charge_distance_min: f64,

    /// Pairs further apart than this ignore each other
    pub charge_distance_max: f64,

    /// Fraction of the centroid offset removed each tick
    pub center_strength: f64,

    /// Fraction of velocity removed each tick
    pub velocity_decay: f64,

    /// Starting temperature of a run
    pub alpha_start: f64,

    /// Alpha converges toward this value
    pub alpha_target: f64,

    /// A run ends once alpha drops below this value
    pub alpha_min: f64,

    /// Hard cap on ticks per run
    pub max_iterations: usize,

    /// Largest per-tick displacement that counts as settled
    pub convergence_tolerance: f64,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            link_distance: 80.0,
            charge_strength: -200.0,
            charge_distance_min: 1.0,
            charge_distance_max: f64::INFINITY,
            center_strength: 1.0,
            velocity_decay: 0.4,
            alpha_start: 1.0,
            alpha_target: 0.0,
            alpha_min: 0.001,
            max_iterations: 300,
            convergence_tolerance: 0.01,
        }
    }
}

impl ForceConfig {
    /// Per-tick cooling rate that takes alpha from `alpha_start` to
    /// `alpha_min` in `max_iterations` ticks
    pub fn alpha_decay(&self) -> f64 {
        if self.max_iterations == 0 || self.alpha_start <= 0.0 || self.alpha_min <= 0.0 {
            return 1.0;
        }
        let ratio = (self.alpha_min / self.alpha_start).min(1.0);
        1.0 - ratio.powf(1.0 / self.max_iterations as f64)
    }
}

// =============================================================================
// LAYOUT STATE
// =============================================================================

/// Positions and velocities of every node at one instant
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutState {
    pub positions: Vec<Vec2>,
    pub velocities: Vec<Vec2>,
    pub alpha: f64,
    /// Ticks applied since the run started
    pub iteration: usize,
    /// Largest node displacement during the last tick
    pub max_displacement: f64,
}

impl LayoutState {
    pub fn at_rest(positions: Vec<Vec2>, alpha: f64) -> Self {
        let velocities = vec![Vec2::ZERO; positions.len()];
        Self {
            positions,
            velocities,
            alpha,
            iteration: 0,
            max_displacement: f64::INFINITY,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn is_finite(&self) -> bool {
        self.positions.iter().all(Vec2::is_finite) && self.velocities.iter().all(Vec2::is_finite)
    }
}

// =============================================================================
// FORCE MODEL
// =============================================================================

/// A spring between two node indices, with d3's degree-based weights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    pub source: usize,
    pub target: usize,
    /// 1 / min(degree(source), degree(target))
    pub strength: f64,
    /// Share of the correction applied to the target end
    pub bias: f64,
}

/// Everything `step` needs besides the state itself
#[derive(Debug, Clone, PartialEq)]
pub struct ForceModel {
    config: ForceConfig,
    springs: Vec<Spring>,
    center: Vec2,
}

impl ForceModel {
    /// Build springs for `edges` over `node_count` nodes
    ///
    /// Edges with an out-of-range endpoint are skipped.
    pub fn new(config: ForceConfig, node_count: usize, edges: &[(usize, usize)], center: Vec2) -> Self {
        let valid: Vec<(usize, usize)> = edges
            .iter()
            .copied()
            .filter(|&(s, t)| s < node_count && t < node_count)
            .collect();

        let mut degree = vec![0usize; node_count];
        for &(s, t) in &valid {
            degree[s] += 1;
            degree[t] += 1;
        }

        let springs = valid
            .into_iter()
            .map(|(source, target)| {
                let (ds, dt) = (degree[source] as f64, degree[target] as f64);
                Spring {
                    source,
                    target,
                    strength: 1.0 / ds.min(dt),
                    bias: ds / (ds + dt),
                }
            })
            .collect();

        Self { config, springs, center }
    }

    pub fn config(&self) -> &ForceConfig {
        &self.config
    }

    pub fn springs(&self) -> &[Spring] {
        &self.springs
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }
}

/// Advance the layout by one tick
pub fn step(state: &LayoutState, model: &ForceModel) -> LayoutState {
    let config = &model.config;
    let mut next = state.clone();
    next.iteration += 1;
    next.alpha += (config.alpha_target - next.alpha) * config.alpha_decay();

    let salt = next.iteration as u64;
    for i in 0..next.positions.len() {
        if !next.positions[i].is_finite() || !next.velocities[i].is_finite() {
            reset_node(&mut next, model, salt, i);
        }
    }

    apply_links(&mut next, model, salt);
    apply_charge(&mut next, config, salt);
    apply_center(&mut next, model);

    let retain = 1.0 - config.velocity_decay;
    let mut max_displacement: f64 = 0.0;
    for i in 0..next.positions.len() {
        next.velocities[i] = next.velocities[i] * retain;
        next.positions[i] += next.velocities[i];

        if !next.positions[i].is_finite() || !next.velocities[i].is_finite() {
            reset_node(&mut next, model, salt, i);
            continue;
        }
        max_displacement = max_displacement.max(next.velocities[i].length());
    }
    next.max_displacement = max_displacement;
    next
}

fn reset_node(state: &mut LayoutState, model: &ForceModel, salt: u64, i: usize) {
    tracing::warn!("Layout node {} left the finite plane, resetting", i);
    state.positions[i] = model.center + Vec2::new(jiggle(salt, i, 0), jiggle(salt, i, 1));
    state.velocities[i] = Vec2::ZERO;
}

fn apply_links(state: &mut LayoutState, model: &ForceModel, salt: u64) {
    let distance = model.config.link_distance;
    for (k, spring) in model.springs.iter().enumerate() {
        let (s, t) = (spring.source, spring.target);
        let mut x = state.positions[t].x + state.velocities[t].x - state.positions[s].x - state.velocities[s].x;
        let mut y = state.positions[t].y + state.velocities[t].y - state.positions[s].y - state.velocities[s].y;
        if x == 0.0 {
            x = jiggle(salt, k, 2);
        }
        if y == 0.0 {
            y = jiggle(salt, k, 3);
        }
        let len = (x * x + y * y).sqrt();
        let l = (len - distance) / len * state.alpha * spring.strength;
        let (x, y) = (x * l, y * l);

        state.velocities[t] -= Vec2::new(x * spring.bias, y * spring.bias);
        let rest = 1.0 - spring.bias;
        state.velocities[s] += Vec2::new(x * rest, y * rest);
    }
}

fn apply_charge(state: &mut LayoutState, config: &ForceConfig, salt: u64) {
    let n = state.positions.len();
    let min2 = config.charge_distance_min * config.charge_distance_min;
    let max2 = config.charge_distance_max * config.charge_distance_max;
    let weight = config.charge_strength * state.alpha;

    for i in 0..n {
        let mut push = Vec2::ZERO;
        for j in 0..n {
            if i == j {
                continue;
            }
            let mut x = state.positions[j].x - state.positions[i].x;
            let mut y = state.positions[j].y - state.positions[i].y;
            let mut l = x * x + y * y;
            if l >= max2 {
                continue;
            }
            // Coincident nodes: separate them deterministically
            if x == 0.0 {
                x = jiggle(salt, i * n + j, 4);
                l += x * x;
            }
            if y == 0.0 {
                y = jiggle(salt, i * n + j, 5);
                l += y * y;
            }
            if l < min2 {
                l = (min2 * l).sqrt();
            }
            let w = weight / l;
            push += Vec2::new(x * w, y * w);
        }
        state.velocities[i] += push;
    }
}

fn apply_center(state: &mut LayoutState, model: &ForceModel) {
    let n = state.positions.len();
    if n == 0 {
        return;
    }
    let mut sum = Vec2::ZERO;
    for p in &state.positions {
        sum += *p;
    }
    let mean = sum * (1.0 / n as f64);
    let shift = (mean - model.center) * model.config.center_strength;
    for p in &mut state.positions {
        *p -= shift;
    }
}

/// Tiny deterministic offset in (-0.5e-6, 0.5e-6)
fn jiggle(salt: u64, index: usize, lane: u64) -> f64 {
    // splitmix64
    let mut z = salt
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add((index as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9))
        .wrapping_add(lane.wrapping_mul(0x94D0_49BB_1331_11EB));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    let unit = (z >> 11) as f64 / (1u64 << 53) as f64;
    let offset = (unit - 0.5) * 1e-6;
    if offset == 0.0 {
        1e-7
    } else {
        offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_nodes(a: Vec2, b: Vec2) -> LayoutState {
        LayoutState::at_rest(vec![a, b], 1.0)
    }

    #[test]
    fn test_alpha_decay_reaches_min_in_budget() {
        let config = ForceConfig::default();
        let decay = config.alpha_decay();
        let mut alpha = config.alpha_start;
        for _ in 0..config.max_iterations {
            alpha += (config.alpha_target - alpha) * decay;
        }
        assert!((alpha - config.alpha_min).abs() < 1e-9);
    }

    #[test]
    fn test_degree_biased_springs() {
        // Star: 0 is linked to 1, 2, 3
        let model = ForceModel::new(ForceConfig::default(), 4, &[(0, 1), (0, 2), (0, 3)], Vec2::ZERO);
        let spring = model.springs()[0];
        assert_eq!(spring.strength, 1.0);
        assert!((spring.bias - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_out_of_range_edges_skipped() {
        let model = ForceModel::new(ForceConfig::default(), 2, &[(0, 1), (1, 7)], Vec2::ZERO);
        assert_eq!(model.springs().len(), 1);
    }

    #[test]
    fn test_repulsion_separates_unlinked_nodes() {
        let model = ForceModel::new(ForceConfig::default(), 2, &[], Vec2::ZERO);
        let state = two_nodes(Vec2::new(-5.0, 0.0), Vec2::new(5.0, 0.0));
        let next = step(&state, &model);
        assert!(next.positions[1].x - next.positions[0].x > 10.0);
    }

    #[test]
    fn test_spring_pulls_distant_pair_together() {
        let model = ForceModel::new(ForceConfig::default(), 2, &[(0, 1)], Vec2::ZERO);
        let state = two_nodes(Vec2::new(-200.0, 0.0), Vec2::new(200.0, 0.0));
        let next = step(&state, &model);
        assert!(next.positions[1].x - next.positions[0].x < 400.0);
    }

    #[test]
    fn test_centering_keeps_centroid_on_center() {
        let center = Vec2::new(300.0, 200.0);
        let model = ForceModel::new(ForceConfig::default(), 3, &[(0, 1)], center);
        let state = LayoutState::at_rest(
            vec![Vec2::new(0.0, 0.0), Vec2::new(40.0, 10.0), Vec2::new(-20.0, 30.0)],
            1.0,
        );
        let mut s = state;
        for _ in 0..50 {
            s = step(&s, &model);
        }
        let mean = (s.positions[0] + s.positions[1] + s.positions[2]) * (1.0 / 3.0);
        assert!(mean.distance(&center) < 1.0);
    }

    #[test]
    fn test_coincident_nodes_stay_finite_and_separate() {
        let model = ForceModel::new(ForceConfig::default(), 2, &[(0, 1)], Vec2::ZERO);
        let mut s = two_nodes(Vec2::ZERO, Vec2::ZERO);
        for _ in 0..20 {
            s = step(&s, &model);
            assert!(s.is_finite());
        }
        assert!(s.positions[0].distance(&s.positions[1]) > 1.0);
    }

    #[test]
    fn test_step_is_deterministic() {
        let model = ForceModel::new(ForceConfig::default(), 3, &[(0, 1), (1, 2)], Vec2::ZERO);
        let state = LayoutState::at_rest(vec![Vec2::ZERO; 3], 1.0);
        assert_eq!(step(&state, &model), step(&state, &model));
    }

    #[test]
    fn test_non_finite_input_is_reset() {
        let model = ForceModel::new(ForceConfig::default(), 2, &[], Vec2::new(50.0, 50.0));
        let state = two_nodes(Vec2::new(f64::NAN, 0.0), Vec2::new(10.0, 10.0));
        let next = step(&state, &model);
        assert!(next.positions.iter().all(Vec2::is_finite));
    }
}

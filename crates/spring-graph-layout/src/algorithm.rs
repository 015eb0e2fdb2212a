//! Force-directed layout with Barnes-Hut repulsion.
//!
//! The algorithm is a small state machine
//! (`Uninitialized → Initialized → Stepping → Done`). Each step runs three
//! strictly ordered passes over a snapshot of the graph and positions:
//! repulsion (through the rebuilt quadtree), attraction (over edges), then a
//! single atomic commit of every displacement, clamped by the cooling
//! temperature and kept inside the canvas border. Structural changes to the
//! graph between steps are picked up by the next snapshot; changes during a
//! step are invisible to it.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use spring_graph_core::{BarnesHutQuadTree, ForceObject, Point, Rectangle, MIN_DISTANCE};

use crate::config::LayoutConfig;
use crate::error::{LayoutError, LayoutResult};
use crate::graph::LayoutGraph;
use crate::model::LayoutModel;

/// Phase of the layout state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutPhase {
    /// Constructed but constants not derived yet.
    Uninitialized,
    /// Constants derived, initial placement done, not yet stepping.
    Initialized,
    /// Actively stepping.
    Stepping,
    /// Converged or iteration cap reached; `step()` is no longer valid.
    Done,
}

impl LayoutPhase {
    fn name(&self) -> &'static str {
        match self {
            LayoutPhase::Uninitialized => "Uninitialized",
            LayoutPhase::Initialized => "Initialized",
            LayoutPhase::Stepping => "Stepping",
            LayoutPhase::Done => "Done",
        }
    }
}

/// Fruchterman-Reingold layout with Barnes-Hut approximated repulsion.
pub struct SpringLayout<G: LayoutGraph> {
    graph: G,
    model: Arc<LayoutModel<G::NodeKey>>,
    config: LayoutConfig,
    phase: LayoutPhase,
    iteration: usize,
    temperature: f64,
    attraction_constant: f64,
    repulsion_constant: f64,
    tree: BarnesHutQuadTree<G::NodeKey>,
    rng: StdRng,
    /// Scratch force accumulators, zeroed at the start of each step.
    displacements: HashMap<G::NodeKey, Point>,
}

impl<G: LayoutGraph> SpringLayout<G> {
    /// Create a layout over `graph` with a fresh position model.
    ///
    /// Fails fast on invalid configuration or an empty graph; nothing is
    /// defaulted silently.
    pub fn new(graph: G, config: LayoutConfig) -> LayoutResult<Self> {
        config.validate()?;
        if graph.node_count() == 0 {
            return Err(LayoutError::EmptyGraph);
        }
        let bounds = Rectangle::new(0.0, 0.0, config.width, config.height);
        let rng = StdRng::seed_from_u64(config.random_seed);
        Ok(Self {
            graph,
            model: Arc::new(LayoutModel::new(bounds)),
            tree: BarnesHutQuadTree::new(bounds, config.theta),
            config,
            phase: LayoutPhase::Uninitialized,
            iteration: 0,
            temperature: 0.0,
            attraction_constant: 0.0,
            repulsion_constant: 0.0,
            rng,
            displacements: HashMap::new(),
        })
    }

    /// The shared position store. Clone the `Arc` and hand it to readers.
    pub fn model(&self) -> Arc<LayoutModel<G::NodeKey>> {
        Arc::clone(&self.model)
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn phase(&self) -> LayoutPhase {
        self.phase
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Derive the force constants from graph size and canvas dimensions and
    /// scatter any unplaced node. Valid once, from `Uninitialized`.
    pub fn initialize(&mut self) -> LayoutResult<()> {
        self.require_phase("initialize", LayoutPhase::Uninitialized)?;

        let n = self.graph.node_count();
        if n == 0 {
            return Err(LayoutError::EmptyGraph);
        }
        let force_constant = (self.config.width * self.config.height / n as f64).sqrt();
        self.attraction_constant = self.config.attraction_multiplier * force_constant;
        self.repulsion_constant = self.config.repulsion_multiplier * force_constant;
        self.temperature = self.config.width / 10.0;

        let nodes = self.graph.nodes();
        self.model.positions_or_scatter(&nodes, &mut self.rng);

        debug!(
            nodes = n,
            force_constant,
            attraction = self.attraction_constant,
            repulsion = self.repulsion_constant,
            temperature = self.temperature,
            "layout initialized"
        );
        self.phase = LayoutPhase::Initialized;
        Ok(())
    }

    /// Enter the stepping phase.
    pub fn start(&mut self) -> LayoutResult<()> {
        self.require_phase("start", LayoutPhase::Initialized)?;
        self.phase = LayoutPhase::Stepping;
        Ok(())
    }

    /// Convenience: `initialize()` + `start()`.
    pub fn initialize_and_start(&mut self) -> LayoutResult<()> {
        self.initialize()?;
        self.start()
    }

    /// True once the iteration cap is exceeded or the temperature has
    /// cooled below the canvas resolution. Latches: stays true forever.
    pub fn done(&self) -> bool {
        self.phase == LayoutPhase::Done
            || self.iteration > self.config.max_iterations
            || (self.phase != LayoutPhase::Uninitialized
                && self.temperature < 1.0 / self.config.width.max(self.config.height))
    }

    /// Run one simulation step. Valid only from `Stepping`.
    pub fn step(&mut self) -> LayoutResult<()> {
        self.require_phase("step", LayoutPhase::Stepping)?;

        self.iteration += 1;

        // Snapshot the node/edge sets and positions up front; the three
        // passes below must all see the same pre-step world.
        let nodes = self.graph.nodes();
        let edges = self.graph.edges();
        let positions = self.model.positions_or_scatter(&nodes, &mut self.rng);

        self.repulsion_pass(&positions)?;
        self.attraction_pass(&positions, &edges)?;
        let moved = self.commit_pass(&positions)?;

        // Linear cooling toward zero.
        self.temperature *= 1.0 - self.iteration as f64 / self.config.max_iterations as f64;

        debug!(
            iteration = self.iteration,
            temperature = self.temperature,
            moved,
            "step complete"
        );

        if self.done() {
            info!(iteration = self.iteration, "layout converged");
            self.phase = LayoutPhase::Done;
        }
        Ok(())
    }

    /// Approximate long-range repulsion for every node, accumulated into the
    /// zeroed scratch map.
    fn repulsion_pass(&mut self, positions: &[(G::NodeKey, Point)]) -> LayoutResult<()> {
        self.displacements.clear();
        self.tree.rebuild(positions.iter().copied());

        for &(node, position) in positions {
            let mut body = ForceObject::new(node, position);
            self.tree.calculate_force(&mut body, self.repulsion_constant);
            Self::ensure_finite(&body.force, node, "repulsion")?;
            self.displacements.insert(node, body.force);
        }
        Ok(())
    }

    /// Spring attraction along every edge: `force = d² / attraction`.
    /// An edge with both endpoints locked is skipped entirely; with one
    /// locked endpoint, only the free side accumulates.
    fn attraction_pass(
        &mut self,
        positions: &[(G::NodeKey, Point)],
        edges: &[(G::NodeKey, G::NodeKey)],
    ) -> LayoutResult<()> {
        let position_of: HashMap<G::NodeKey, Point> = positions.iter().copied().collect();

        for &(u, v) in edges {
            if u == v {
                continue;
            }
            // Endpoints can be missing when an edge snapshot races a node
            // removal; the edge simply does not pull this step.
            let (Some(&pu), Some(&pv)) = (position_of.get(&u), position_of.get(&v)) else {
                continue;
            };
            let u_locked = self.model.is_locked(&u);
            let v_locked = self.model.is_locked(&v);
            if u_locked && v_locked {
                continue;
            }

            let dx = pu.x - pv.x;
            let dy = pu.y - pv.y;
            let dist = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
            let force = dist * dist / self.attraction_constant;
            let fx = (dx / dist) * force;
            let fy = (dy / dist) * force;

            if !u_locked {
                let d = self.displacements.entry(u).or_insert(Point::ZERO);
                *d = Point::new(d.x - fx, d.y - fy);
                let checked = *d;
                Self::ensure_finite(&checked, u, "attraction")?;
            }
            if !v_locked {
                let d = self.displacements.entry(v).or_insert(Point::ZERO);
                *d = Point::new(d.x + fx, d.y + fy);
                let checked = *d;
                Self::ensure_finite(&checked, v, "attraction")?;
            }
        }
        Ok(())
    }

    /// Apply the accumulated displacements: clamp magnitude to the current
    /// temperature, keep every node inside the border margin (jittering with
    /// a seeded per-node offset when it would exit), and commit the whole
    /// step atomically. Returns how many nodes moved.
    fn commit_pass(&self, positions: &[(G::NodeKey, Point)]) -> LayoutResult<usize> {
        let width = self.config.width;
        let height = self.config.height;
        let border = width.min(height) / 50.0;

        let mut updates = Vec::with_capacity(positions.len());
        for &(node, position) in positions {
            if self.model.is_locked(&node) {
                continue;
            }
            let disp = self
                .displacements
                .get(&node)
                .copied()
                .unwrap_or(Point::ZERO);
            Self::ensure_finite(&disp, node, "commit")?;

            let len = disp.length();
            let (mut x, mut y) = if len > 0.0 {
                let scale = len.min(self.temperature) / len;
                (position.x + disp.x * scale, position.y + disp.y * scale)
            } else {
                (position.x, position.y)
            };

            // Nodes never escape the drawable area: jitter back inside the
            // border instead of sticking to it.
            let (jx, jy) = self.jitter_pair(node);
            if x < border {
                x = border + jx * border * 2.0;
            } else if x > width - border {
                x = width - border - jx * border * 2.0;
            }
            if y < border {
                y = border + jy * border * 2.0;
            } else if y > height - border {
                y = height - border - jy * border * 2.0;
            }

            let next = Point::new(x, y);
            Self::ensure_finite(&next, node, "commit")?;
            updates.push((node, next));
        }

        self.model.commit(&updates);
        Ok(updates.len())
    }

    /// Border jitter for `node` at the current iteration. Derived from the
    /// seed, the node key and the iteration alone, never from the shared rng
    /// stream, so two runs whose force history differs (exact vs approximate
    /// repulsion, say) still jitter a crossing node identically.
    fn jitter_pair(&self, node: G::NodeKey) -> (f64, f64) {
        let mut hasher = DefaultHasher::new();
        self.config.random_seed.hash(&mut hasher);
        self.iteration.hash(&mut hasher);
        node.hash(&mut hasher);
        let mut rng = StdRng::seed_from_u64(hasher.finish());
        (rng.random::<f64>(), rng.random::<f64>())
    }

    fn ensure_finite(point: &Point, node: G::NodeKey, pass: &'static str) -> LayoutResult<()> {
        if point.is_finite() {
            Ok(())
        } else {
            Err(LayoutError::NonFiniteForce {
                node: format!("{node:?}"),
                pass,
            })
        }
    }

    fn require_phase(&self, operation: &'static str, required: LayoutPhase) -> LayoutResult<()> {
        if self.phase == required {
            Ok(())
        } else {
            Err(LayoutError::InvalidPhase {
                operation,
                required: required.name(),
                actual: self.phase.name(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petgraph::stable_graph::{NodeIndex, StableUnGraph};

    fn triangle() -> StableUnGraph<&'static str, ()> {
        let mut g = StableUnGraph::default();
        let a = g.add_node("a");
        let b = g.add_node("b");
        let c = g.add_node("c");
        g.add_edge(a, b, ());
        g.add_edge(b, c, ());
        g.add_edge(c, a, ());
        g
    }

    fn config() -> LayoutConfig {
        LayoutConfig {
            width: 500.0,
            height: 500.0,
            max_iterations: 100,
            random_seed: 11,
            ..LayoutConfig::default()
        }
    }

    #[test]
    fn test_empty_graph_rejected() {
        let g: StableUnGraph<(), ()> = StableUnGraph::default();
        assert!(matches!(
            SpringLayout::new(g, config()),
            Err(LayoutError::EmptyGraph)
        ));
    }

    #[test]
    fn test_step_requires_stepping_phase() {
        let mut layout = SpringLayout::new(triangle(), config()).unwrap();
        assert!(matches!(
            layout.step(),
            Err(LayoutError::InvalidPhase { .. })
        ));
        layout.initialize().unwrap();
        assert!(matches!(
            layout.step(),
            Err(LayoutError::InvalidPhase { .. })
        ));
        layout.start().unwrap();
        layout.step().unwrap();
    }

    #[test]
    fn test_initialize_only_once() {
        let mut layout = SpringLayout::new(triangle(), config()).unwrap();
        layout.initialize().unwrap();
        assert!(layout.initialize().is_err());
    }

    #[test]
    fn test_done_latches_at_iteration_cap() {
        let mut layout = SpringLayout::new(
            triangle(),
            LayoutConfig {
                max_iterations: 5,
                ..config()
            },
        )
        .unwrap();
        layout.initialize_and_start().unwrap();
        while !layout.done() {
            layout.step().unwrap();
        }
        assert!(layout.done());
        assert_eq!(layout.phase(), LayoutPhase::Done);
        // Stays done; further steps are phase errors, not resurrections.
        assert!(layout.step().is_err());
        assert!(layout.done());
    }

    #[test]
    fn test_positions_stay_in_bounds() {
        let mut layout = SpringLayout::new(triangle(), config()).unwrap();
        layout.initialize_and_start().unwrap();
        let model = layout.model();
        for _ in 0..40 {
            layout.step().unwrap();
            for (_, p) in model.positions_snapshot() {
                assert!(p.x >= 0.0 && p.x <= 500.0, "x out of bounds: {p:?}");
                assert!(p.y >= 0.0 && p.y <= 500.0, "y out of bounds: {p:?}");
            }
        }
    }

    #[test]
    fn test_locked_node_is_bit_identical() {
        let g = triangle();
        let locked: NodeIndex = g.nodes()[0];
        let mut layout = SpringLayout::new(g, config()).unwrap();
        layout.initialize().unwrap();
        let model = layout.model();
        let pinned = Point::new(123.25, 77.5);
        model.set(locked, pinned);
        model.lock(locked, true);
        layout.start().unwrap();
        for _ in 0..25 {
            layout.step().unwrap();
            let current = model.get(&locked).unwrap();
            assert_eq!(current.x.to_bits(), pinned.x.to_bits());
            assert_eq!(current.y.to_bits(), pinned.y.to_bits());
        }
    }

    #[test]
    fn test_non_finite_position_aborts_step() {
        let mut layout = SpringLayout::new(triangle(), config()).unwrap();
        layout.initialize_and_start().unwrap();
        let model = layout.model();
        let poisoned = NodeIndex::new(0);
        let healthy = NodeIndex::new(1);
        let before = model.get(&healthy).unwrap();

        model.set(poisoned, Point::new(f64::NAN, 0.0));
        assert!(matches!(
            layout.step(),
            Err(LayoutError::NonFiniteForce {
                pass: "repulsion",
                ..
            })
        ));
        // The aborted step committed nothing.
        assert_eq!(model.get(&healthy), Some(before));
    }

    #[test]
    fn test_border_jitter_ignores_rng_history() {
        // `b` has consumed scatter draws from its shared rng stream, `a` has
        // not; the jitter for a given node and iteration must not care.
        let a = SpringLayout::new(triangle(), config()).unwrap();
        let mut b = SpringLayout::new(triangle(), config()).unwrap();
        b.initialize_and_start().unwrap();

        let node = NodeIndex::new(0);
        assert_eq!(a.jitter_pair(node), b.jitter_pair(node));
    }

    #[test]
    fn test_same_seed_same_layout() {
        let run = || {
            let mut layout = SpringLayout::new(triangle(), config()).unwrap();
            layout.initialize_and_start().unwrap();
            for _ in 0..20 {
                layout.step().unwrap();
            }
            let model = layout.model();
            let mut out: Vec<(usize, (u64, u64))> = model
                .positions_snapshot()
                .into_iter()
                .map(|(k, p)| (k.index(), (p.x.to_bits(), p.y.to_bits())))
                .collect();
            out.sort();
            out
        };
        assert_eq!(run(), run());
    }
}

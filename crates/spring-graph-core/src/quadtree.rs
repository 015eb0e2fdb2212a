//! Barnes-Hut quadtree for O(n log n) repulsion approximation.
//!
//! Cells live in a flat arena (`Vec`) and reference their children by index,
//! so a rebuild reuses one allocation instead of churning a pointer tree.
//! Each internal cell carries the exact mass-weighted aggregate of everything
//! below it; a traversal may substitute that aggregate for the whole subtree
//! once the ratio of the cell's diagonal to its distance drops below `theta`.
//!
//! The tree is rebuilt from scratch every layout iteration. Insertion is
//! O(log n) amortized for spread-out points and O(n) for pathologically
//! clustered ones; no rebalancing is attempted.

use crate::force::{ForceObject, PointMass};
use crate::geometry::{Point, Rectangle};

/// Index of a cell within the tree arena.
pub type CellId = usize;

/// Splitting stops below this depth; a degenerate cell absorbs extra bodies
/// into its leaf aggregate instead of subdividing forever.
const MAX_DEPTH: usize = 32;

/// Payload of a single quadtree cell.
#[derive(Debug, Clone)]
enum Body<T> {
    /// No body below this cell.
    Empty,
    /// Exactly one inserted body.
    Leaf(ForceObject<T>),
    /// Aggregate of every body below, plus four quadrant children
    /// in NW, NE, SE, SW order.
    Internal {
        aggregate: PointMass,
        children: [CellId; 4],
    },
}

#[derive(Debug, Clone)]
struct Cell<T> {
    area: Rectangle,
    body: Body<T>,
}

/// A Barnes-Hut quadtree over bodies keyed by `T`.
#[derive(Debug, Clone)]
pub struct BarnesHutQuadTree<T> {
    cells: Vec<Cell<T>>,
    bounds: Rectangle,
    theta: f64,
    count: usize,
}

impl<T: Copy + PartialEq> BarnesHutQuadTree<T> {
    /// Create an empty tree covering `bounds`.
    ///
    /// `theta` is the accuracy/performance knob: `0.0` degenerates to exact
    /// O(n²) pairwise repulsion, `0.5` is the conventional default.
    pub fn new(bounds: Rectangle, theta: f64) -> Self {
        Self {
            cells: vec![Cell {
                area: bounds,
                body: Body::Empty,
            }],
            bounds,
            theta,
            count: 0,
        }
    }

    pub fn bounds(&self) -> Rectangle {
        self.bounds
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    /// Number of bodies currently inserted.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Drop every body, keeping the arena allocation and the bounds.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.cells.push(Cell {
            area: self.bounds,
            body: Body::Empty,
        });
        self.count = 0;
    }

    /// Full rebuild from a position snapshot: clear, then insert every body
    /// with unit mass.
    pub fn rebuild<I>(&mut self, positions: I)
    where
        I: IntoIterator<Item = (T, Point)>,
    {
        self.clear();
        for (element, position) in positions {
            self.insert(ForceObject::new(element, position));
        }
    }

    /// Insert one body. Positions outside the tree bounds are clamped onto
    /// the boundary so the quadrant scan always finds a home for them.
    pub fn insert(&mut self, mut obj: ForceObject<T>) {
        obj.position = self.clamp_to_bounds(obj.position);
        self.insert_at(0, obj, 0);
        self.count += 1;
    }

    /// Accumulate the approximate repulsive force of the whole tree on
    /// `target`. A tree whose sole occupant is the target contributes
    /// nothing.
    pub fn calculate_force(&self, target: &mut ForceObject<T>, constant: f64) {
        if self.count == 0 {
            return;
        }
        self.apply_forces_at(0, target, constant);
    }

    /// The root aggregate: total mass and exact centroid of every inserted
    /// body, independent of tree shape.
    pub fn root_aggregate(&self) -> Option<PointMass> {
        match &self.cells[0].body {
            Body::Empty => None,
            Body::Leaf(leaf) => Some(leaf.point_mass()),
            Body::Internal { aggregate, .. } => Some(*aggregate),
        }
    }

    fn clamp_to_bounds(&self, p: Point) -> Point {
        Point::new(
            p.x.clamp(self.bounds.x, self.bounds.max_x()),
            p.y.clamp(self.bounds.y, self.bounds.max_y()),
        )
    }

    fn insert_at(&mut self, id: CellId, obj: ForceObject<T>, depth: usize) {
        let area = self.cells[id].area;
        match std::mem::replace(&mut self.cells[id].body, Body::Empty) {
            Body::Empty => {
                self.cells[id].body = Body::Leaf(obj);
            }
            Body::Leaf(mut existing) => {
                if depth >= MAX_DEPTH {
                    // Degenerate cell: coincident (or near-coincident) bodies
                    // would split forever, so fold the newcomer into the
                    // leaf's mass instead.
                    let merged = PointMass::combine(&existing.point_mass(), &obj.point_mass());
                    existing.position = merged.position;
                    existing.mass = merged.mass;
                    self.cells[id].body = Body::Leaf(existing);
                    return;
                }
                let children = self.push_children(area);
                let aggregate = PointMass::combine(&existing.point_mass(), &obj.point_mass());
                self.cells[id].body = Body::Internal {
                    aggregate,
                    children,
                };
                self.insert_into_child(children, existing, depth);
                self.insert_into_child(children, obj, depth);
            }
            Body::Internal {
                mut aggregate,
                children,
            } => {
                aggregate.merge(&obj.point_mass());
                self.cells[id].body = Body::Internal {
                    aggregate,
                    children,
                };
                self.insert_into_child(children, obj, depth);
            }
        }
    }

    fn push_children(&mut self, area: Rectangle) -> [CellId; 4] {
        let base = self.cells.len();
        for quadrant in area.quadrants() {
            self.cells.push(Cell {
                area: quadrant,
                body: Body::Empty,
            });
        }
        [base, base + 1, base + 2, base + 3]
    }

    /// Route a body into the first child whose area contains its position.
    /// Boundary points match more than one quadrant; scan order decides.
    fn insert_into_child(&mut self, children: [CellId; 4], obj: ForceObject<T>, depth: usize) {
        for &child in &children {
            if self.cells[child].area.contains(&obj.position) {
                self.insert_at(child, obj, depth + 1);
                return;
            }
        }
        // Unreachable for clamped positions; rounding at the outer edge can
        // leave a point fractionally outside every quadrant, in which case
        // the last quadrant takes it.
        self.insert_at(children[3], obj, depth + 1);
    }

    fn apply_forces_at(&self, id: CellId, target: &mut ForceObject<T>, constant: f64) {
        match &self.cells[id].body {
            Body::Empty => {}
            Body::Leaf(leaf) => {
                // No self-force from the target's own leaf.
                if leaf.element != target.element {
                    target.add_force_from(&leaf.point_mass(), constant);
                }
            }
            Body::Internal {
                aggregate,
                children,
            } => {
                // Gate on the cell diagonal, the worst-case spread of the
                // bodies the aggregate stands for. Width alone under-recurses
                // on rectangular canvases, whose cells are not square.
                let size = self.cells[id].area.diagonal();
                let dist = aggregate.position.distance(&target.position);
                if dist > 0.0 && size / dist < self.theta {
                    // Barnes-Hut cutoff: the whole subtree acts as one mass
                    // at its centroid.
                    target.add_force_from(aggregate, constant);
                } else {
                    for &child in children {
                        self.apply_forces_at(child, target, constant);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_bounds() -> Rectangle {
        Rectangle::new(0.0, 0.0, 100.0, 100.0)
    }

    fn centroid_of(points: &[(u32, Point)]) -> PointMass {
        let mut it = points
            .iter()
            .map(|(_, p)| PointMass::new(*p, 1.0));
        let first = it.next().unwrap();
        it.fold(first, |acc, pm| PointMass::combine(&acc, &pm))
    }

    #[test]
    fn test_empty_tree_applies_nothing() {
        let tree: BarnesHutQuadTree<u32> = BarnesHutQuadTree::new(unit_bounds(), 0.5);
        let mut target = ForceObject::new(0u32, Point::new(50.0, 50.0));
        tree.calculate_force(&mut target, 10.0);
        assert_eq!(target.force, Point::ZERO);
        assert!(tree.root_aggregate().is_none());
    }

    #[test]
    fn test_single_occupant_no_self_force() {
        let mut tree = BarnesHutQuadTree::new(unit_bounds(), 0.5);
        tree.insert(ForceObject::new(7u32, Point::new(25.0, 25.0)));
        let mut target = ForceObject::new(7u32, Point::new(25.0, 25.0));
        tree.calculate_force(&mut target, 10.0);
        assert_eq!(target.force, Point::ZERO);
    }

    #[test]
    fn test_root_aggregate_exact_for_any_shape() {
        let points: Vec<(u32, Point)> = vec![
            (0, Point::new(10.0, 10.0)),
            (1, Point::new(90.0, 10.0)),
            (2, Point::new(12.0, 11.0)),
            (3, Point::new(11.0, 10.5)),
            (4, Point::new(55.0, 72.0)),
            (5, Point::new(99.0, 99.0)),
            (6, Point::new(0.0, 100.0)),
        ];
        let mut tree = BarnesHutQuadTree::new(unit_bounds(), 0.5);
        tree.rebuild(points.iter().copied());

        let root = tree.root_aggregate().unwrap();
        let expected = centroid_of(&points);
        assert_eq!(tree.len(), points.len());
        assert!((root.mass - points.len() as f64).abs() < 1e-9);
        assert!((root.position.x - expected.position.x).abs() < 1e-9);
        assert!((root.position.y - expected.position.y).abs() < 1e-9);
    }

    #[test]
    fn test_root_aggregate_insert_order_independent() {
        let mut points: Vec<(u32, Point)> = (0..20)
            .map(|i| {
                let f = i as f64;
                (i, Point::new((f * 37.0) % 100.0, (f * 61.0) % 100.0))
            })
            .collect();

        let mut forward = BarnesHutQuadTree::new(unit_bounds(), 0.5);
        forward.rebuild(points.iter().copied());
        points.reverse();
        let mut backward = BarnesHutQuadTree::new(unit_bounds(), 0.5);
        backward.rebuild(points.iter().copied());

        let a = forward.root_aggregate().unwrap();
        let b = backward.root_aggregate().unwrap();
        assert!((a.mass - b.mass).abs() < 1e-9);
        assert!((a.position.x - b.position.x).abs() < 1e-9);
        assert!((a.position.y - b.position.y).abs() < 1e-9);
    }

    #[test]
    fn test_theta_zero_matches_pairwise() {
        let points: Vec<(u32, Point)> = vec![
            (0, Point::new(20.0, 30.0)),
            (1, Point::new(80.0, 25.0)),
            (2, Point::new(40.0, 90.0)),
            (3, Point::new(60.0, 60.0)),
            (4, Point::new(10.0, 10.0)),
        ];
        let constant = 5.0;
        let mut tree = BarnesHutQuadTree::new(unit_bounds(), 0.0);
        tree.rebuild(points.iter().copied());

        for &(id, pos) in &points {
            let mut via_tree = ForceObject::new(id, pos);
            tree.calculate_force(&mut via_tree, constant);

            let mut pairwise = ForceObject::new(id, pos);
            for &(other_id, other_pos) in &points {
                if other_id != id {
                    pairwise.add_force_from(&PointMass::new(other_pos, 1.0), constant);
                }
            }

            assert!((via_tree.force.x - pairwise.force.x).abs() < 1e-9);
            assert!((via_tree.force.y - pairwise.force.y).abs() < 1e-9);
        }
    }

    #[test]
    fn test_approximation_close_to_exact_for_distant_cluster() {
        // A tight far-away cluster should be collapsed by theta=0.5 and
        // still land near the exact answer.
        let mut points: Vec<(u32, Point)> = vec![(0, Point::new(2.0, 50.0))];
        for i in 0..10 {
            let f = i as f64;
            points.push((i + 1, Point::new(95.0 + (f % 3.0), 48.0 + (f % 4.0))));
        }

        let mut exact = BarnesHutQuadTree::new(unit_bounds(), 0.0);
        exact.rebuild(points.iter().copied());
        let mut approx = BarnesHutQuadTree::new(unit_bounds(), 0.5);
        approx.rebuild(points.iter().copied());

        let mut fe = ForceObject::new(0u32, Point::new(2.0, 50.0));
        exact.calculate_force(&mut fe, 5.0);
        let mut fa = ForceObject::new(0u32, Point::new(2.0, 50.0));
        approx.calculate_force(&mut fa, 5.0);

        let scale = fe.force.length().max(1.0);
        assert!((fe.force.x - fa.force.x).abs() / scale < 1e-2);
        assert!((fe.force.y - fa.force.y).abs() / scale < 1e-2);
    }

    #[test]
    fn test_gate_uses_cell_diagonal_not_width() {
        // Centroid of the pair is (25, 25); the target at (100, 100) is
        // 106.07 away. The containing cell is 50 wide with a 70.7 diagonal,
        // so a width-based gate would aggregate (50/106 < 0.5) while the
        // diagonal gate must recurse (70.7/106 > 0.5) and stay exact.
        let pair = [
            (1u32, Point::new(10.0, 10.0)),
            (2u32, Point::new(40.0, 40.0)),
        ];
        let mut tree = BarnesHutQuadTree::new(unit_bounds(), 0.5);
        tree.rebuild(pair.iter().copied());

        let mut via_tree = ForceObject::new(0u32, Point::new(100.0, 100.0));
        tree.calculate_force(&mut via_tree, 5.0);

        let mut pairwise = ForceObject::new(0u32, Point::new(100.0, 100.0));
        for &(_, pos) in &pair {
            pairwise.add_force_from(&PointMass::new(pos, 1.0), 5.0);
        }

        assert_eq!(via_tree.force, pairwise.force);
    }

    #[test]
    fn test_coincident_bodies_do_not_recurse_forever() {
        let mut tree = BarnesHutQuadTree::new(unit_bounds(), 0.5);
        tree.insert(ForceObject::new(0u32, Point::new(50.0, 50.0)));
        tree.insert(ForceObject::new(1u32, Point::new(50.0, 50.0)));
        tree.insert(ForceObject::new(2u32, Point::new(50.0, 50.0)));
        let root = tree.root_aggregate().unwrap();
        assert!((root.mass - 3.0).abs() < 1e-9);

        let mut target = ForceObject::new(9u32, Point::new(10.0, 10.0));
        tree.calculate_force(&mut target, 3.0);
        assert!(target.force.is_finite());
    }

    #[test]
    fn test_clear_resets_to_empty_root() {
        let mut tree = BarnesHutQuadTree::new(unit_bounds(), 0.5);
        tree.rebuild((0..8u32).map(|i| (i, Point::new(i as f64 * 10.0, 50.0))));
        assert_eq!(tree.len(), 8);
        tree.clear();
        assert!(tree.is_empty());
        assert!(tree.root_aggregate().is_none());
        assert_eq!(tree.bounds(), unit_bounds());
    }

    #[test]
    fn test_out_of_bounds_insert_is_clamped() {
        let mut tree = BarnesHutQuadTree::new(unit_bounds(), 0.5);
        tree.insert(ForceObject::new(0u32, Point::new(-20.0, 400.0)));
        let root = tree.root_aggregate().unwrap();
        assert_eq!(root.position, Point::new(0.0, 100.0));
    }
}

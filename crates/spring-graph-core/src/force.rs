//! Point masses and accumulated-force bodies.
//!
//! `PointMass` is the combinable aggregate stored in internal quadtree cells:
//! combining two masses yields their mass-weighted centroid and carries no
//! element identity, so an aggregate can never be mistaken for a real body.
//! `ForceObject` is a real, tree-inserted body that accumulates a force
//! vector over the repulsion pass.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Distance floor substituted when two bodies (or a body and an aggregate)
/// coincide. A fixed floor keeps the force kernel deterministic, which the
/// exact-vs-approximate comparison relies on.
pub const MIN_DISTANCE: f64 = 1e-4;

/// A position with mass and nothing else. The unit of aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointMass {
    pub position: Point,
    pub mass: f64,
}

impl PointMass {
    pub fn new(position: Point, mass: f64) -> Self {
        Self { position, mass }
    }

    /// Combine two masses into their mass-weighted centroid.
    ///
    /// The result represents an aggregate: it sums the masses and places the
    /// combined position on the segment between the inputs, closer to the
    /// heavier one.
    pub fn combine(a: &PointMass, b: &PointMass) -> PointMass {
        let mass = a.mass + b.mass;
        let position = Point::new(
            (a.position.x * a.mass + b.position.x * b.mass) / mass,
            (a.position.y * a.mass + b.position.y * b.mass) / mass,
        );
        PointMass { position, mass }
    }

    /// Fold `other` into this aggregate in place.
    pub fn merge(&mut self, other: &PointMass) {
        *self = PointMass::combine(self, other);
    }
}

/// A body inserted into the quadtree: an element key, its position and mass,
/// and the force accumulated so far this pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceObject<T> {
    pub element: T,
    pub position: Point,
    pub mass: f64,
    pub force: Point,
}

impl<T> ForceObject<T> {
    /// New unit-mass body with a zeroed force accumulator.
    pub fn new(element: T, position: Point) -> Self {
        Self {
            element,
            position,
            mass: 1.0,
            force: Point::ZERO,
        }
    }

    pub fn with_mass(element: T, position: Point, mass: f64) -> Self {
        Self {
            element,
            position,
            mass,
            force: Point::ZERO,
        }
    }

    /// The body viewed as a bare point mass.
    pub fn point_mass(&self) -> PointMass {
        PointMass::new(self.position, self.mass)
    }

    /// Accumulate the repulsive contribution of `other` on this body.
    ///
    /// Fruchterman-Reingold shape, `constant² · m_self · m_other / d`,
    /// directed away from `other` and linear in the source mass so a
    /// Barnes-Hut aggregate substitutes exactly for the cluster it stands
    /// for. Coincident positions fall back to [`MIN_DISTANCE`].
    pub fn add_force_from(&mut self, other: &PointMass, constant: f64) {
        let dx = self.position.x - other.position.x;
        let dy = self.position.y - other.position.y;
        let dist = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
        let magnitude = (constant * constant) * self.mass * other.mass / dist;
        self.force = Point::new(
            self.force.x + (dx / dist) * magnitude,
            self.force.y + (dy / dist) * magnitude,
        );
    }
}

//! Core building blocks for force-directed graph layout.
//!
//! This crate holds the pieces with no opinion about graphs or scheduling:
//! geometry value types, point masses with force accumulation, and the
//! arena-backed Barnes-Hut quadtree that turns O(n²) pairwise repulsion into
//! O(n log n).
//!
//! The layout engine itself (force passes, cooling, the background relax
//! loop) lives in `spring-graph-layout`.

pub mod force;
pub mod geometry;
pub mod quadtree;

pub use force::{ForceObject, PointMass, MIN_DISTANCE};
pub use geometry::{Point, Rectangle};
pub use quadtree::{BarnesHutQuadTree, CellId};

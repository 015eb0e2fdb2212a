//! Shared, mutable position store.
//!
//! One `LayoutModel` is shared between the layout worker and any number of
//! readers (renderers, spatial indexes). Writers go through [`commit`],
//! which applies a whole step under a single write guard, so readers never
//! observe a half-committed step.
//!
//! [`commit`]: LayoutModel::commit

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::RwLock;

use rand::Rng;
use spring_graph_core::{Point, Rectangle};

struct ModelInner<K> {
    positions: HashMap<K, Point>,
    locked: HashSet<K>,
    locked_all: bool,
}

/// Mapping from node key to position, with per-node and global locking.
///
/// Last write wins; there is no versioning. A locked node's position is
/// never touched by the layout but can still be read and explicitly moved
/// by unlocking it first.
pub struct LayoutModel<K> {
    inner: RwLock<ModelInner<K>>,
    bounds: Rectangle,
}

impl<K: Copy + Eq + Hash + Debug> LayoutModel<K> {
    /// Create an empty model covering `bounds`.
    pub fn new(bounds: Rectangle) -> Self {
        Self {
            inner: RwLock::new(ModelInner {
                positions: HashMap::new(),
                locked: HashSet::new(),
                locked_all: false,
            }),
            bounds,
        }
    }

    /// The canvas this model lays out into.
    pub fn bounds(&self) -> Rectangle {
        self.bounds
    }

    /// Current position of a node, if it has one.
    pub fn get(&self, node: &K) -> Option<Point> {
        self.read().positions.get(node).copied()
    }

    /// Set a node's position. No-op while the model is globally locked or
    /// the node is individually locked.
    pub fn set(&self, node: K, point: Point) {
        let mut inner = self.write();
        if inner.locked_all || inner.locked.contains(&node) {
            return;
        }
        inner.positions.insert(node, point);
    }

    /// Pin or unpin a node. A pinned node is never moved by the layout.
    pub fn lock(&self, node: K, locked: bool) {
        let mut inner = self.write();
        if locked {
            inner.locked.insert(node);
        } else {
            inner.locked.remove(&node);
        }
    }

    pub fn is_locked(&self, node: &K) -> bool {
        self.read().locked.contains(node)
    }

    /// Globally freeze or unfreeze the model.
    pub fn lock_all(&self, locked: bool) {
        self.write().locked_all = locked;
    }

    pub fn is_locked_all(&self) -> bool {
        self.read().locked_all
    }

    /// Number of stored positions.
    pub fn len(&self) -> usize {
        self.read().positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().positions.is_empty()
    }

    /// Copy of all positions, for readers that rescan.
    pub fn positions_snapshot(&self) -> HashMap<K, Point> {
        self.read().positions.clone()
    }

    /// Positions of `nodes` in the given order, scattering any node that
    /// does not have a position yet. Used by the layout at the start of a
    /// step so structural additions picked up by the snapshot get a seeded
    /// random placement inside the bounds.
    pub fn positions_or_scatter<R: Rng>(&self, nodes: &[K], rng: &mut R) -> Vec<(K, Point)> {
        let mut inner = self.write();
        nodes
            .iter()
            .map(|&node| {
                let point = match inner.positions.get(&node) {
                    Some(p) => *p,
                    None => {
                        let p = Point::new(
                            self.bounds.x + rng.random::<f64>() * self.bounds.width,
                            self.bounds.y + rng.random::<f64>() * self.bounds.height,
                        );
                        inner.positions.insert(node, p);
                        p
                    }
                };
                (node, point)
            })
            .collect()
    }

    /// Apply a whole step's worth of moves under one write guard. Locked
    /// nodes are skipped; a globally locked model ignores the commit.
    pub fn commit(&self, updates: &[(K, Point)]) {
        let mut inner = self.write();
        if inner.locked_all {
            return;
        }
        for &(node, point) in updates {
            if !inner.locked.contains(&node) {
                inner.positions.insert(node, point);
            }
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, ModelInner<K>> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, ModelInner<K>> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

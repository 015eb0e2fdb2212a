//! Read-only graph access for the layout engine.
//!
//! The layout only ever needs the node set and edge endpoint pairs; it never
//! mutates the graph. Hosts keep whatever graph structure they like and
//! expose it through [`LayoutGraph`]. An implementation for petgraph's
//! `StableGraph` is provided since that is the usual substrate.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use petgraph::graph::IndexType;
use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::EdgeType;

/// Read-only view of a graph being laid out.
pub trait LayoutGraph {
    /// Node identity as seen by the layout. Positions and pins are keyed by
    /// this type.
    type NodeKey: Copy + Eq + Hash + Debug + Send + Sync + 'static;

    fn node_count(&self) -> usize;

    /// Snapshot of the current node set.
    fn nodes(&self) -> Vec<Self::NodeKey>;

    /// Snapshot of the current edge endpoint pairs. Self-loops are allowed
    /// here and skipped by the attraction pass.
    fn edges(&self) -> Vec<(Self::NodeKey, Self::NodeKey)>;
}

impl<N, E, Ty, Ix> LayoutGraph for StableGraph<N, E, Ty, Ix>
where
    Ty: EdgeType,
    // `IndexType` alone does not imply thread safety, which `NodeKey` needs
    // since keys cross into the relax worker. `u32`, the default, qualifies.
    Ix: IndexType + Send + Sync,
{
    type NodeKey = NodeIndex<Ix>;

    fn node_count(&self) -> usize {
        StableGraph::node_count(self)
    }

    fn nodes(&self) -> Vec<Self::NodeKey> {
        self.node_indices().collect()
    }

    fn edges(&self) -> Vec<(Self::NodeKey, Self::NodeKey)> {
        self.edge_indices()
            .filter_map(|e| self.edge_endpoints(e))
            .collect()
    }
}

impl<G: LayoutGraph> LayoutGraph for Arc<G> {
    type NodeKey = G::NodeKey;

    fn node_count(&self) -> usize {
        (**self).node_count()
    }

    fn nodes(&self) -> Vec<Self::NodeKey> {
        (**self).nodes()
    }

    fn edges(&self) -> Vec<(Self::NodeKey, Self::NodeKey)> {
        (**self).edges()
    }
}

/// A graph behind a lock can be mutated by the host while a layout runs;
/// each step snapshots the node and edge sets through a short read lock, so
/// structural changes land between steps, never inside one.
impl<G: LayoutGraph> LayoutGraph for RwLock<G> {
    type NodeKey = G::NodeKey;

    fn node_count(&self) -> usize {
        self.read().unwrap_or_else(|e| e.into_inner()).node_count()
    }

    fn nodes(&self) -> Vec<Self::NodeKey> {
        self.read().unwrap_or_else(|e| e.into_inner()).nodes()
    }

    fn edges(&self) -> Vec<(Self::NodeKey, Self::NodeKey)> {
        self.read().unwrap_or_else(|e| e.into_inner()).edges()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petgraph::stable_graph::StableUnGraph;

    #[test]
    fn test_stable_graph_snapshots() {
        let mut g: StableUnGraph<&str, ()> = StableUnGraph::default();
        let a = g.add_node("a");
        let b = g.add_node("b");
        let c = g.add_node("c");
        g.add_edge(a, b, ());
        g.add_edge(b, c, ());

        assert_eq!(LayoutGraph::node_count(&g), 3);
        assert_eq!(g.nodes().len(), 3);
        let edges = LayoutGraph::edges(&g);
        assert_eq!(edges.len(), 2);
        assert!(edges.contains(&(a, b)));
    }

    #[test]
    fn test_node_keys_cross_thread_boundaries() {
        fn assert_send_sync<T: Send + Sync>(_: &T) {}

        let mut g: StableUnGraph<(), ()> = StableUnGraph::default();
        g.add_node(());
        let keys = g.nodes();
        assert_send_sync(&keys);
        let handle = std::thread::spawn(move || keys.len());
        assert_eq!(handle.join().unwrap(), 1);
    }

    #[test]
    fn test_snapshot_reflects_removals() {
        let mut g: StableUnGraph<u32, ()> = StableUnGraph::default();
        let a = g.add_node(0);
        let b = g.add_node(1);
        g.add_edge(a, b, ());
        let _ = g.remove_node(b);

        assert_eq!(g.nodes(), vec![a]);
        assert!(LayoutGraph::edges(&g).is_empty());
    }
}

//! Force-directed graph layout with Barnes-Hut repulsion.
//!
//! This crate turns a read-only graph into animated 2D positions:
//!
//! ```text
//! LayoutModel positions ─▶ quadtree rebuild ─▶ repulsion pass
//!        ▲                                          │
//!        │                                          ▼
//!   commit pass ◀───────────────────────── attraction pass
//! ```
//!
//! The [`SpringLayout`] state machine runs one such cycle per [`step`],
//! cooling a displacement cap toward zero until the layout stabilizes. The
//! [`Relaxer`] drives the steps on a dedicated background thread with
//! cooperative cancellation, while renderers read the shared [`LayoutModel`]
//! concurrently.
//!
//! ```no_run
//! use petgraph::stable_graph::StableUnGraph;
//! use spring_graph_layout::{LayoutConfig, Relaxer, SpringLayout};
//!
//! let mut graph: StableUnGraph<&str, ()> = StableUnGraph::default();
//! let a = graph.add_node("a");
//! let b = graph.add_node("b");
//! graph.add_edge(a, b, ());
//!
//! let layout = SpringLayout::new(graph, LayoutConfig::default())?;
//! let relaxer = Relaxer::new(layout)?;
//! let model = relaxer.model(); // hand to the renderer
//! let handle = relaxer.spawn();
//! // ... later
//! let finished = handle.stop_and_join()?;
//! # Ok::<(), spring_graph_layout::LayoutError>(())
//! ```
//!
//! [`step`]: SpringLayout::step

pub mod algorithm;
pub mod config;
pub mod error;
pub mod graph;
pub mod model;
pub mod relax;

pub use algorithm::{LayoutPhase, SpringLayout};
pub use config::LayoutConfig;
pub use error::{LayoutError, LayoutResult};
pub use graph::LayoutGraph;
pub use model::LayoutModel;
pub use relax::{RelaxEvent, Relaxer, RelaxerHandle};

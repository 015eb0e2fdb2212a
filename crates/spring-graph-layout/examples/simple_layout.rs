//! Simple example demonstrating background force-directed layout.
//!
//! Run with: cargo run --example simple_layout

use std::time::Instant;

use petgraph::stable_graph::StableUnGraph;
use spring_graph_layout::{LayoutConfig, RelaxEvent, Relaxer, SpringLayout};

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Create a synthetic graph: a backbone path plus pseudo-random chords.
    let node_count = 500;
    let mut graph: StableUnGraph<usize, ()> = StableUnGraph::default();
    let nodes: Vec<_> = (0..node_count).map(|i| graph.add_node(i)).collect();
    for pair in nodes.windows(2) {
        graph.add_edge(pair[0], pair[1], ());
    }
    for i in 0..node_count {
        let source = (i * 17) % node_count;
        let target = (i * 31 + 7) % node_count;
        if source != target {
            graph.add_edge(nodes[source], nodes[target], ());
        }
    }

    println!(
        "Laying out {} nodes, {} edges...",
        graph.node_count(),
        graph.edge_count()
    );

    let config = LayoutConfig {
        width: 1000.0,
        height: 1000.0,
        max_iterations: 300,
        theta: 0.5,
        random_seed: 42,
        ..LayoutConfig::default()
    };

    let layout = SpringLayout::new(graph, config).expect("failed to create layout");
    let relaxer = Relaxer::new(layout).expect("failed to create relaxer");
    let events = relaxer.subscribe();
    let model = relaxer.model();
    let handle = relaxer.spawn();

    let start = Instant::now();
    for event in events.iter() {
        match event {
            RelaxEvent::Step { iteration } if iteration % 50 == 0 => {
                // A renderer would rescan here; we just report the extent.
                let snapshot = model.positions_snapshot();
                let (min_x, max_x, min_y, max_y) = snapshot.values().fold(
                    (f64::MAX, f64::MIN, f64::MAX, f64::MIN),
                    |(min_x, max_x, min_y, max_y), p| {
                        (
                            min_x.min(p.x),
                            max_x.max(p.x),
                            min_y.min(p.y),
                            max_y.max(p.y),
                        )
                    },
                );
                println!(
                    "iteration {}: bounds = ({:.1}, {:.1}) to ({:.1}, {:.1})",
                    iteration, min_x, min_y, max_x, max_y
                );
            }
            RelaxEvent::Active(false) => break,
            _ => {}
        }
    }

    let finished = handle.join().expect("relax worker failed");
    let elapsed = start.elapsed();
    println!(
        "Converged: {} after {} iterations in {:.2?} ({:.0} steps/s)",
        finished.done(),
        finished.iteration(),
        elapsed,
        finished.iteration() as f64 / elapsed.as_secs_f64()
    );
}

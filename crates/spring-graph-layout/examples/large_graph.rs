//! Large graph benchmark comparing exact and Barnes-Hut repulsion.
//!
//! Run with: cargo run --example large_graph --release

use std::time::Instant;

use petgraph::stable_graph::StableUnGraph;
use spring_graph_layout::{LayoutConfig, SpringLayout};

fn build_graph(node_count: usize, extra_edges: usize) -> StableUnGraph<usize, ()> {
    let mut graph = StableUnGraph::default();
    let nodes: Vec<_> = (0..node_count).map(|i| graph.add_node(i)).collect();
    // Backbone path plus pseudo-random chords.
    for pair in nodes.windows(2) {
        graph.add_edge(pair[0], pair[1], ());
    }
    for i in 0..extra_edges {
        let source = (i * 17) % node_count;
        let target = (i * 31 + 7) % node_count;
        if source != target {
            graph.add_edge(nodes[source], nodes[target], ());
        }
    }
    graph
}

fn run(theta: f64, iterations: usize) -> f64 {
    let graph = build_graph(5000, 5000);
    let config = LayoutConfig {
        width: 2000.0,
        height: 2000.0,
        max_iterations: iterations,
        theta,
        random_seed: 42,
        ..LayoutConfig::default()
    };
    let mut layout = SpringLayout::new(graph, config).expect("failed to create layout");
    layout.initialize_and_start().expect("failed to start layout");

    let start = Instant::now();
    while !layout.done() {
        layout.step().expect("layout step failed");
    }
    let elapsed = start.elapsed().as_secs_f64();
    layout.iteration() as f64 / elapsed
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    println!("=== Barnes-Hut layout benchmark: 5000 nodes, ~10000 edges ===");
    println!();

    for theta in [0.0, 0.5, 0.8] {
        println!("theta = {theta} ...");
        let steps_per_sec = run(theta, 50);
        let mode = if theta == 0.0 {
            "exact O(n^2)"
        } else {
            "Barnes-Hut"
        };
        println!("  {mode}: {steps_per_sec:.1} steps/s");
    }
}

//! In-memory graph with a per-edge toll overlay and the path machinery used
//! by the primal subproblems and the heuristics.

mod light_graph;

pub use light_graph::{LightEdge, LightGraph, Path};

/// Raised when a caller demands a path between two vertices and none exists
/// under the current edge masks. The price functions never fail; unreachable
/// vertices simply carry an infinite label.
#[derive(Debug, Clone, thiserror::Error)]
#[error("no path from {from} to {to}")]
pub struct PathUnreachable {
    pub from: usize,
    pub to: usize,
}

use std::sync::Arc;

use crate::graph::{LightGraph, Path, PathUnreachable};
use crate::problem::Problem;

/// Slight discount applied to the tolls seen by the followers, so that a
/// commodity indifferent between a tolled and a toll-free route takes the
/// tolled one.
const TOLL_PREFERENCE: f64 = 0.9999;

/// The followers' reaction: each commodity routes along a shortest path
/// under `cost + toll`.
pub struct FollowerSolver {
    prob: Arc<Problem>,
    graph: LightGraph,
}

impl FollowerSolver {
    pub fn new(prob: Arc<Problem>) -> Self {
        let graph = LightGraph::from_problem(&prob);
        FollowerSolver { prob, graph }
    }

    pub fn solve(&mut self, tolls: &[f64]) -> Result<Vec<Path>, PathUnreachable> {
        for (a1, &toll) in tolls.iter().enumerate() {
            let arc = self.prob.arcs[self.prob.arc_of_a1(a1)];
            self.graph.edge_mut(arc.src, arc.dst).toll = toll * TOLL_PREFERENCE;
        }
        self.prob
            .commodities
            .iter()
            .map(|c| self.graph.require_path(c.origin, c.destination))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{Arc as PArc, Commodity};

    fn parallel_routes() -> Arc<Problem> {
        Arc::new(Problem::new(
            3,
            vec![
                PArc { src: 0, dst: 1, cost: 2.0, tolled: true },
                PArc { src: 1, dst: 2, cost: 0.0, tolled: false },
                PArc { src: 0, dst: 2, cost: 6.0, tolled: false },
            ],
            vec![Commodity { origin: 0, destination: 2, demand: 1.0 }],
        ))
    }

    #[test]
    fn followers_avoid_expensive_tolls() {
        let mut solver = FollowerSolver::new(parallel_routes());
        assert_eq!(solver.solve(&[0.0]).unwrap(), vec![vec![0, 1, 2]]);
        assert_eq!(solver.solve(&[100.0]).unwrap(), vec![vec![0, 2]]);
    }

    /// At exact indifference the tolled route wins.
    #[test]
    fn ties_fall_on_the_tolled_route() {
        let mut solver = FollowerSolver::new(parallel_routes());
        // Toll 4 makes both routes cost 6; the discount tips the balance.
        assert_eq!(solver.solve(&[4.0]).unwrap(), vec![vec![0, 1, 2]]);
    }
}

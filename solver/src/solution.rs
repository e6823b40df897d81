use crate::graph::{LightGraph, Path};
use crate::problem::Problem;

/// A feasible point of the pricing problem: the followers' paths and the
/// leader's tolls.
#[derive(Debug, Clone, Default)]
pub struct Solution {
    pub paths: Vec<Path>,
    pub tolls: Vec<f64>,
}

impl Solution {
    /// Revenue: demand-weighted tolls collected along each path.
    pub fn objective(&self, prob: &Problem) -> f64 {
        self.paths
            .iter()
            .zip(&prob.commodities)
            .map(|(path, commodity)| {
                let collected: f64 = path
                    .windows(2)
                    .filter_map(|w| prob.arc_index(w[0], w[1]))
                    .filter_map(|a| prob.a1_of(a))
                    .map(|a1| self.tolls[a1])
                    .sum();
                commodity.demand * collected
            })
            .sum()
    }

    /// Checks the followers' rationality: every path connects its commodity
    /// and is a shortest path under `cost + toll`, within `tol`.
    pub fn is_feasible(&self, prob: &Problem, tol: f64) -> bool {
        if self.paths.len() != prob.num_commodities() {
            return false;
        }
        let mut graph = LightGraph::from_problem(prob);
        for (a1, &toll) in self.tolls.iter().enumerate() {
            let arc = prob.arcs[prob.arc_of_a1(a1)];
            graph.edge_mut(arc.src, arc.dst).toll = toll;
        }

        self.paths.iter().zip(&prob.commodities).all(|(path, c)| {
            let connects = path.first() == Some(&c.origin)
                && path.last() == Some(&c.destination)
                && path.windows(2).all(|w| graph.try_edge(w[0], w[1]).is_some());
            if !connects {
                return false;
            }
            let best = graph.price_from_src(c.origin)[c.destination];
            graph.get_path_cost(path, true) <= best + tol
        })
    }
}

use std::sync::Arc;

use tracing::trace;

use super::follower::FollowerSolver;
use crate::lp;
use crate::problem::Problem;
use crate::solution::Solution;

/// Turns a toll vector into a feasible solution: route the followers under
/// the given tolls, then re-optimize the tolls on the resulting paths with
/// the inverse LP. One shot per call; the result is not iterated on.
pub struct TollsHeuristic {
    prob: Arc<Problem>,
    follower: FollowerSolver,
}

impl TollsHeuristic {
    pub fn new(prob: Arc<Problem>) -> Self {
        TollsHeuristic {
            follower: FollowerSolver::new(prob.clone()),
            prob,
        }
    }

    /// `None` when a commodity is stranded or the inverse LP fails; the
    /// caller simply skips the heuristic in that case.
    pub fn solve(&mut self, tolls: &[f64]) -> Option<Solution> {
        let paths = match self.follower.solve(tolls) {
            Ok(paths) => paths,
            Err(err) => {
                trace!(%err, "heuristic skipped");
                return None;
            }
        };
        let tolls = lp::solve_inverse(&self.prob, &paths)?;
        Some(Solution { paths, tolls })
    }
}

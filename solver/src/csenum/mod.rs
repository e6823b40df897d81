//! Complementary-slackness enumeration: the default wiring of the
//! branch-and-bound engine. Branching splits on a slacked dual constraint
//! `(k, a)` with the arc on `k`'s current path: either the arc leaves the
//! path (primal) or the constraint becomes tight (dual).

mod context;
mod solver;

pub use context::{CsenumContext, TOLERANCE};
pub use solver::CsenumSolver;

use std::sync::Arc;

use crate::branchbound::BranchAndBound;
use crate::config::{Config, ConfigError};
use crate::problem::Problem;
use crate::solution::Solution;

/// The enumeration model: owns the engine with its default wiring and
/// exposes solution extraction and reporting.
pub struct Csenum {
    prob: Arc<Problem>,
    engine: BranchAndBound<CsenumContext>,
}

impl Csenum {
    pub fn new(prob: Arc<Problem>, config: Config) -> Result<Self, ConfigError> {
        let context = CsenumContext::new(prob.clone());
        Ok(Csenum {
            engine: BranchAndBound::new(context, config)?,
            prob,
        })
    }

    /// Returns whether an incumbent was found.
    pub fn solve(&mut self) -> bool {
        self.engine.solve()
    }

    pub fn engine(&self) -> &BranchAndBound<CsenumContext> {
        &self.engine
    }

    /// The incumbent as paths and tolls, if any.
    pub fn solution(&self) -> Option<Solution> {
        let node = self.engine.best_node()?;
        let paths = node
            .arcs
            .iter()
            .map(|arcs| {
                let mut path = vec![];
                for (i, &a) in arcs.iter().enumerate() {
                    let arc = self.prob.arcs[a];
                    if i == 0 {
                        path.push(arc.src);
                    }
                    path.push(arc.dst);
                }
                path
            })
            .collect();
        Some(Solution { paths, tolls: node.tolls.clone() })
    }

    pub fn report(&self) -> String {
        self.engine.report()
    }
}

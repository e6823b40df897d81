//! Primal heuristics: everything that turns a toll vector into a feasible
//! (paths, tolls) solution the engine can adopt as an incumbent.

mod follower;
mod tolls;

pub use follower::FollowerSolver;
pub use tolls::TollsHeuristic;

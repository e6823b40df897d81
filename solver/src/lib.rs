//! Solver for the network pricing problem: a leader sets tolls on a subset of
//! the arcs of a directed graph to maximize revenue, while each commodity
//! routes its demand along a shortest path under the tolled costs.
//!
//! The centerpiece is a branch-and-bound engine ([`branchbound`]) driving a
//! complementary-slackness enumeration ([`csenum`]): branching decisions
//! either forbid an arc in a commodity's shortest-path subproblem or force a
//! dual feasibility constraint to equality, and the bound at each node comes
//! from a per-commodity shortest-path primal paired with a shared dual LP.

pub mod branchbound;
pub mod config;
pub mod csenum;
pub mod graph;
pub mod heuristics;
pub mod lp;
pub mod prelude;
pub mod problem;
pub mod solution;

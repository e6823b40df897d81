//! Module that re-export most commonly used types and traits to ease import.

pub use crate::branchbound::{BranchAndBound, BranchDir, Candidate, Node, OptDir, Relaxation};
pub use crate::config::{Config, QueueDiscipline};
pub use crate::csenum::Csenum;
pub use crate::graph::LightGraph;
pub use crate::problem::{Commodity, Problem};
pub use crate::solution::Solution;

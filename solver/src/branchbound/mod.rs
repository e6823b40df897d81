//! Generic branch-and-bound machinery: search nodes, the lineage arena, the
//! queue disciplines, pseudocost history and the scheduler itself. The
//! LP-specific parts live behind the [`Relaxation`] trait and are provided by
//! [`crate::csenum`].

pub mod context;
pub mod history;
pub mod lineage;
pub mod node;
pub mod opt;
pub mod queue;
pub mod report;

pub use context::{BranchAndBound, Relaxation};
pub use history::ImprovementHistory;
pub use lineage::{LineageArena, LineageId};
pub use node::{BranchDir, Candidate, Node};
pub use opt::OptDir;
pub use queue::{make_queue, NodeQueue};

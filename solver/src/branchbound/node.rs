use super::lineage::LineageId;

/// A slacked dual-feasibility constraint: commodity `k`, arc `a`. Branching
/// on a candidate either forbids the arc in `k`'s shortest-path subproblem
/// or forces the constraint to equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Candidate {
    pub k: usize,
    pub a: usize,
}

/// Which side of the complementary-slackness disjunction a branch takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchDir {
    /// Forbid arc `a` for commodity `k` in the primal shortest path.
    Primal,
    /// Force the dual feasibility constraint for `(k, a)` to equality.
    Dual,
}

impl BranchDir {
    pub const BOTH: [BranchDir; 2] = [BranchDir::Primal, BranchDir::Dual];
}

/// One node of the search tree.
///
/// Invariant: `bound = dual_obj - sum_k demand_k * primal_objs[k]`, and
/// `candidates` holds exactly the `(k, a)` pairs with positive dual slack on
/// an arc of commodity `k`'s current path. A node with no candidates is a
/// feasible solution.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub id: i64,
    pub parent: i64,
    pub lineage: Option<LineageId>,

    pub bound: f64,
    pub dual_obj: f64,
    pub primal_objs: Vec<f64>,

    /// Arc indices of each commodity's current shortest path.
    pub arcs: Vec<Vec<usize>>,
    pub tolls: Vec<f64>,
    /// `slack_map[k][a]`: the dual constraint for `(k, a)` has slack above
    /// tolerance.
    pub slack_map: Vec<Vec<bool>>,
    pub candidates: Vec<Candidate>,
}

impl Node {
    /// The root node, awaiting its first bound update.
    pub fn root() -> Self {
        Node {
            id: 0,
            parent: -1,
            lineage: None,
            ..Default::default()
        }
    }

    /// A fresh child shell; the bound update fills in the rest.
    pub fn child(id: i64, parent: i64, lineage: LineageId) -> Self {
        Node {
            id,
            parent,
            lineage: Some(lineage),
            ..Default::default()
        }
    }

    pub fn is_solution(&self) -> bool {
        self.candidates.is_empty()
    }
}

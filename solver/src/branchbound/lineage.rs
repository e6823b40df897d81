use super::node::{BranchDir, Candidate};

/// Index of a lineage record in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineageId(u32);

#[derive(Debug, Clone, Copy)]
struct LineageRecord {
    parent: Option<LineageId>,
    candidate: Candidate,
    dir: BranchDir,
    depth: u32,
}

/// Append-only arena of branching decisions. Every node points at the record
/// of its last decision; walking parent indices yields the whole root-to-leaf
/// decision list. Siblings share their parent's chain, a parent is always
/// older than its children, and records live for the whole search.
#[derive(Debug, Clone, Default)]
pub struct LineageArena {
    records: Vec<LineageRecord>,
}

impl LineageArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        parent: Option<LineageId>,
        candidate: Candidate,
        dir: BranchDir,
    ) -> LineageId {
        let depth = self.depth_of(parent) as u32 + 1;
        let id = LineageId(self.records.len() as u32);
        self.records.push(LineageRecord { parent, candidate, dir, depth });
        id
    }

    /// Depth of a node holding this lineage link; the root (no link) is 0.
    pub fn depth_of(&self, id: Option<LineageId>) -> usize {
        match id {
            Some(LineageId(i)) => self.records[i as usize].depth as usize,
            None => 0,
        }
    }

    /// The root-to-leaf list of `(candidate, direction)` decisions.
    pub fn full_lineage(&self, id: Option<LineageId>) -> Vec<(Candidate, BranchDir)> {
        let mut out = Vec::with_capacity(self.depth_of(id));
        let mut curr = id;
        while let Some(LineageId(i)) = curr {
            let record = &self.records[i as usize];
            out.push((record.candidate, record.dir));
            curr = record.parent;
        }
        out.reverse();
        out
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

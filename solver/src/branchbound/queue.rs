use itertools::Itertools;

use super::node::Node;
use super::opt::OptDir;
use crate::config::QueueDiscipline;

/// The node container the engine draws from. Implementations never mutate
/// node contents, only decide ordering and lifetime.
pub trait NodeQueue {
    fn len(&self) -> usize;
    fn peek(&self) -> Option<&Node>;
    fn pop(&mut self) -> Option<Box<Node>>;
    /// Bulk insertion of the children produced by one branching step; the
    /// discipline decides where they land.
    fn append(&mut self, nodes: Vec<Box<Node>>);
    /// Drop every node whose bound is not strictly better than `bound`.
    fn prune(&mut self, bound: f64);
    /// The best bound over the held nodes, or the direction's identity when
    /// empty.
    fn best_bound(&self) -> f64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&mut self, node: Box<Node>) {
        self.append(vec![node]);
    }
}

pub fn make_queue(discipline: QueueDiscipline, dir: OptDir) -> Box<dyn NodeQueue> {
    match discipline {
        QueueDiscipline::BestFirst => Box::new(BestFirstQueue::new(dir)),
        QueueDiscipline::DepthFirst => Box::new(DepthFirstQueue::new(dir)),
        QueueDiscipline::Hybrid => Box::new(HybridQueue::new(dir)),
    }
}

/// Insert keeping `ordered` sorted worst-first (the best node sits at the
/// back, so popping it is O(1)). An incoming node with an equal bound lands
/// before the nodes already holding it, which pops earlier inserts first.
fn insert_by_bound(ordered: &mut Vec<Box<Node>>, dir: OptDir, node: Box<Node>) {
    let at = ordered.partition_point(|held| dir.is_better(node.bound, held.bound));
    ordered.insert(at, node);
}

fn drain_not_better(ordered: &mut Vec<Box<Node>>, dir: OptDir, bound: f64) {
    // Worst-first order: the nodes to drop form a prefix.
    let keep_from = ordered.partition_point(|held| !dir.is_better(held.bound, bound));
    ordered.drain(..keep_from);
}

/// Always expand the globally best bound.
pub struct BestFirstQueue {
    dir: OptDir,
    ordered: Vec<Box<Node>>,
}

impl BestFirstQueue {
    pub fn new(dir: OptDir) -> Self {
        BestFirstQueue { dir, ordered: vec![] }
    }
}

impl NodeQueue for BestFirstQueue {
    fn len(&self) -> usize {
        self.ordered.len()
    }

    fn peek(&self) -> Option<&Node> {
        self.ordered.last().map(|n| n.as_ref())
    }

    fn pop(&mut self) -> Option<Box<Node>> {
        self.ordered.pop()
    }

    fn append(&mut self, nodes: Vec<Box<Node>>) {
        for node in nodes {
            insert_by_bound(&mut self.ordered, self.dir, node);
        }
    }

    fn prune(&mut self, bound: f64) {
        drain_not_better(&mut self.ordered, self.dir, bound);
    }

    fn best_bound(&self) -> f64 {
        self.peek().map_or(self.dir.worst(), |n| n.bound)
    }
}

/// Plain stack: always expand the most recently produced node.
pub struct DepthFirstQueue {
    dir: OptDir,
    stack: Vec<Box<Node>>,
}

impl DepthFirstQueue {
    pub fn new(dir: OptDir) -> Self {
        DepthFirstQueue { dir, stack: vec![] }
    }
}

impl NodeQueue for DepthFirstQueue {
    fn len(&self) -> usize {
        self.stack.len()
    }

    fn peek(&self) -> Option<&Node> {
        self.stack.last().map(|n| n.as_ref())
    }

    fn pop(&mut self) -> Option<Box<Node>> {
        self.stack.pop()
    }

    fn append(&mut self, nodes: Vec<Box<Node>>) {
        self.stack.extend(nodes);
    }

    fn prune(&mut self, bound: f64) {
        let dir = self.dir;
        self.stack.retain(|n| dir.is_better(n.bound, bound));
    }

    fn best_bound(&self) -> f64 {
        self.stack
            .iter()
            .map(|n| n.bound)
            .fold(self.dir.worst(), |acc, b| self.dir.better_of(b, acc))
    }
}

/// Best-first store plus one "next" slot: the best child of the last
/// branching is expanded immediately (a depth dive), everything else falls
/// back to global best-first.
pub struct HybridQueue {
    dir: OptDir,
    next: Option<Box<Node>>,
    ordered: Vec<Box<Node>>,
}

impl HybridQueue {
    pub fn new(dir: OptDir) -> Self {
        HybridQueue { dir, next: None, ordered: vec![] }
    }
}

impl NodeQueue for HybridQueue {
    fn len(&self) -> usize {
        self.ordered.len() + usize::from(self.next.is_some())
    }

    fn peek(&self) -> Option<&Node> {
        self.next
            .as_deref()
            .or_else(|| self.ordered.last().map(|n| n.as_ref()))
    }

    fn pop(&mut self) -> Option<Box<Node>> {
        self.next.take().or_else(|| self.ordered.pop())
    }

    fn append(&mut self, nodes: Vec<Box<Node>>) {
        // The first best incoming child takes over the next slot; the
        // previous holder retreats into the ordered store.
        let Some(best) = nodes
            .iter()
            .position_min_by(|a, b| self.dir.cmp_bounds(a.bound, b.bound))
        else {
            return;
        };
        for (i, node) in nodes.into_iter().enumerate() {
            if i == best {
                if let Some(prev) = self.next.replace(node) {
                    insert_by_bound(&mut self.ordered, self.dir, prev);
                }
            } else {
                insert_by_bound(&mut self.ordered, self.dir, node);
            }
        }
    }

    fn prune(&mut self, bound: f64) {
        drain_not_better(&mut self.ordered, self.dir, bound);
        if let Some(next) = &self.next {
            if !self.dir.is_better(next.bound, bound) {
                self.next = None;
            }
        }
    }

    fn best_bound(&self) -> f64 {
        let held = self
            .ordered
            .last()
            .map_or(self.dir.worst(), |n| n.bound);
        let next = self.next.as_ref().map_or(self.dir.worst(), |n| n.bound);
        self.dir.better_of(held, next)
    }
}

use std::time::{Duration, Instant};

use tracing::debug;

use super::history::ImprovementHistory;
use super::lineage::LineageArena;
use super::node::{BranchDir, Candidate, Node};
use super::opt::OptDir;
use super::queue::{make_queue, NodeQueue};
use super::report::{ProgressLine, Reporter};
use crate::config::{Config, ConfigError};

/// The subsolver seam: everything the scheduler needs from the LP layer.
///
/// Implementations must leave their internal branching state exactly as they
/// found it on every exit path of [`Relaxation::update_bound`] and
/// [`Relaxation::evaluate_branch`], including the infeasible ones; between
/// nodes the state is rebuilt from scratch by [`Relaxation::enter_node`].
pub trait Relaxation {
    /// Solve the unrestricted relaxation and fill in the root node.
    /// Returns feasibility.
    fn update_root_bound(&mut self, node: &mut Node) -> bool;

    /// Apply one branching decision on top of `parent`'s state and fill in
    /// the child. The side not branched on reuses the parent's data.
    /// Returns feasibility.
    fn update_bound(
        &mut self,
        node: &mut Node,
        parent: &Node,
        candidate: Candidate,
        dir: BranchDir,
    ) -> bool;

    /// Strong-branching probe: the LP-bound improvement this branch would
    /// give over `node`, or `None` when the branch is infeasible.
    fn evaluate_branch(&mut self, node: &Node, candidate: Candidate, dir: BranchDir)
        -> Option<f64>;

    /// The engine is about to process `node`; `lineage` is its root-to-leaf
    /// decision list to replay.
    fn enter_node(&mut self, _node: &Node, _lineage: &[(Candidate, BranchDir)]) {}

    /// Build a candidate incumbent from the node's toll vector. The returned
    /// node must be a solution (empty candidate list) with its objective as
    /// the bound; the engine keeps it only if it improves the incumbent.
    fn run_heuristic(&mut self, _node: &Node) -> Option<Node> {
        None
    }
}

/// Reliability score of a branching choice: a pessimistic mix of the two
/// per-direction improvements, weighted toward the weaker one.
fn calculate_score(first: f64, second: f64) -> f64 {
    (5.0 * first.min(second) + first.max(second)) / 6.0
}

/// The branch-and-bound scheduler.
///
/// Pops nodes from the queue, replays their lineage into the relaxation,
/// selects a branching candidate by reliability pseudocost (strong-branching
/// the unreliable ones), opens both children, prunes against the incumbent,
/// and periodically lets the heuristic inject a better incumbent.
pub struct BranchAndBound<R> {
    relaxation: R,
    config: Config,
    dir: OptDir,

    queue: Box<dyn NodeQueue>,
    arena: LineageArena,
    history: ImprovementHistory,

    best_obj: f64,
    best_node: Option<Box<Node>>,

    node_count: i64,
    step_count: u64,
    branch_cat_count: [u64; 3],
    strong_eval: u64,
    strong_eval_time: Duration,
    heur_time: Duration,

    start_time: Option<Instant>,
    solve_time: f64,
    last_print_time: f64,
    reporter: Reporter,
}

impl<R: Relaxation> BranchAndBound<R> {
    pub fn new(relaxation: R, config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let dir = config.opt_direction;
        Ok(BranchAndBound {
            relaxation,
            dir,
            queue: make_queue(config.queue_discipline, dir),
            arena: LineageArena::new(),
            history: ImprovementHistory::new(),
            best_obj: dir.worst(),
            best_node: None,
            node_count: 0,
            step_count: 0,
            branch_cat_count: [0; 3],
            strong_eval: 0,
            strong_eval_time: Duration::ZERO,
            heur_time: Duration::ZERO,
            start_time: None,
            solve_time: 0.0,
            last_print_time: f64::NEG_INFINITY,
            reporter: Reporter,
            config,
        })
    }

    /// Run the search to exhaustion or to the time limit. Returns whether an
    /// incumbent was found.
    pub fn solve(&mut self) -> bool {
        self.start_time = Some(Instant::now());
        self.reporter.print_header();

        let mut root = Box::new(Node::root());
        self.node_count = 1;
        if self.relaxation.update_root_bound(&mut root) {
            if root.is_solution() {
                self.add_new_solution(&root);
            } else {
                self.queue.push(root);
            }
        } else {
            debug!("root relaxation is infeasible");
        }

        while let Some(node) = self.queue.pop() {
            if self.current_time() >= self.last_print_time + self.config.print_interval {
                self.print_progress(&node, false);
                self.last_print_time = self.current_time();
            }

            self.step(&node);

            if self.config.heuristic_freq > 0
                && self.step_count % u64::from(self.config.heuristic_freq) == 0
            {
                let heur_start = Instant::now();
                let incumbent = self.relaxation.run_heuristic(&node);
                self.heur_time += heur_start.elapsed();
                if let Some(solution) = incumbent {
                    debug_assert!(solution.is_solution());
                    self.add_new_solution(&solution);
                }
            }

            self.step_count += 1;

            if self.config.time_limit > 0.0 && self.current_time() >= self.config.time_limit {
                debug!(elapsed = self.current_time(), "time limit reached");
                break;
            }
        }

        self.solve_time = self.current_time();
        self.best_node.is_some()
    }

    /// Process one node: pick a branching candidate by reliability
    /// pseudocost, then open both children.
    fn step(&mut self, node: &Node) {
        let lineage = self.arena.full_lineage(node.lineage);
        self.relaxation.enter_node(node, &lineage);

        if node.candidates.is_empty() {
            self.add_new_solution(node);
            return;
        }

        let scores: Vec<f64> = node
            .candidates
            .iter()
            .map(|&c| self.pseudo_score(c))
            .collect();
        // Stable sort: equal scores keep the candidate list order, which is
        // the traversal order of arcs within paths across commodities.
        let mut order: Vec<usize> = (0..node.candidates.len()).collect();
        order.sort_by(|&i, &j| scores[j].total_cmp(&scores[i]));

        let mut best_candidate = node.candidates[order[0]];
        let mut best_score = scores[order[0]];
        let mut lookahead = 0;
        // Set when strong branching already recorded this candidate's
        // improvements; the branching stage must not record them twice.
        let mut updated = false;

        for &i in &order {
            let candidate = node.candidates[i];
            if self
                .history
                .is_reliable(candidate, self.config.reliable_threshold)
            {
                continue;
            }

            let probe_start = Instant::now();
            let down = self
                .relaxation
                .evaluate_branch(node, candidate, BranchDir::Primal);
            let up = self
                .relaxation
                .evaluate_branch(node, candidate, BranchDir::Dual);
            self.strong_eval_time += probe_start.elapsed();
            self.strong_eval += 1;

            if let Some(impr) = down {
                self.history.push(candidate, BranchDir::Primal, impr);
            }
            if let Some(impr) = up {
                self.history.push(candidate, BranchDir::Dual, impr);
            }

            // An infeasible side closes a subtree outright: commit to this
            // candidate no matter what the other side showed.
            let (down, up) = match (down, up) {
                (Some(down), Some(up)) => (down, up),
                _ => {
                    best_candidate = candidate;
                    updated = true;
                    break;
                }
            };

            let score = calculate_score(down, up);
            if score > best_score {
                best_score = score;
                best_candidate = candidate;
                lookahead = 0;
                updated = true;
            } else {
                lookahead += 1;
                if lookahead >= self.config.reliable_lookahead {
                    break;
                }
            }
        }

        let mut children: Vec<Box<Node>> = vec![];
        for dir in BranchDir::BOTH {
            let lineage_id = self.arena.push(node.lineage, best_candidate, dir);
            let mut child = Box::new(Node::child(self.node_count, node.id, lineage_id));
            self.node_count += 1;

            if !self
                .relaxation
                .update_bound(&mut child, node, best_candidate, dir)
            {
                continue;
            }

            if !updated {
                let improvement = (child.bound - node.bound).abs();
                self.history.push(best_candidate, dir, improvement);
            }

            // Not strictly better than the incumbent: nothing to gain below.
            if !self.dir.is_better(child.bound, self.best_obj) {
                continue;
            }

            if child.is_solution() {
                self.add_new_solution(&child);
                continue;
            }

            children.push(child);
        }

        self.branch_cat_count[children.len()] += 1;
        self.queue.append(children);
    }

    /// Install `node` as the incumbent if it strictly improves on it, and
    /// prune the queue against the new objective.
    fn add_new_solution(&mut self, node: &Node) {
        if self.dir.is_better(node.bound, self.best_obj) {
            self.best_obj = node.bound;
            self.best_node = Some(Box::new(node.clone()));
            self.queue.prune(self.best_obj);
            self.print_progress(node, true);
        }
    }

    fn pseudo_score(&self, candidate: Candidate) -> f64 {
        calculate_score(
            self.history.average(candidate, BranchDir::Primal),
            self.history.average(candidate, BranchDir::Dual),
        )
    }

    fn print_progress(&self, node: &Node, is_solution: bool) {
        self.reporter.print_line(&ProgressLine {
            is_solution,
            step: self.step_count,
            queued: self.queue.len(),
            depth: self.arena.depth_of(node.lineage),
            bound: node.bound,
            best_bound: self.best_bound(),
            best_obj: self.best_obj,
            gap_ratio: self.gap_ratio(),
            elapsed: self.current_time(),
            id: node.id,
            parent: node.parent,
            strong_eval: self.strong_eval,
            strong_eval_time: self.strong_eval_time.as_secs_f64(),
        });
    }

    fn current_time(&self) -> f64 {
        self.start_time.map_or(0.0, |t| t.elapsed().as_secs_f64())
    }

    pub fn relaxation(&self) -> &R {
        &self.relaxation
    }

    pub fn best_node(&self) -> Option<&Node> {
        self.best_node.as_deref()
    }

    pub fn best_obj(&self) -> f64 {
        self.best_obj
    }

    /// The tighter of the queue's best bound and the incumbent objective.
    pub fn best_bound(&self) -> f64 {
        self.dir.better_of(self.queue.best_bound(), self.best_obj)
    }

    pub fn gap_ratio(&self) -> f64 {
        let bound = self.best_bound();
        let obj = self.best_obj;
        if !bound.is_finite() || !obj.is_finite() {
            return f64::INFINITY;
        }
        (bound - obj).abs() / bound.min(obj)
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn node_count(&self) -> i64 {
        self.node_count
    }

    /// How many branchings kept 0, 1 or 2 children.
    pub fn branch_category_count(&self, children: usize) -> u64 {
        self.branch_cat_count[children]
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn strong_eval_count(&self) -> u64 {
        self.strong_eval
    }

    pub fn strong_eval_time(&self) -> f64 {
        self.strong_eval_time.as_secs_f64()
    }

    pub fn heur_time(&self) -> f64 {
        self.heur_time.as_secs_f64()
    }

    pub fn solve_time(&self) -> f64 {
        self.solve_time
    }

    pub fn report(&self) -> String {
        format!(
            "OBJ: {}\nBOUND: {}\nGAP: {:.4} %\nSTEPS: {}\nTIME: {:.3} s\nSTRONG EVAL: {} ({:.3} s)\nHEUR TIME: {:.3} s\n",
            self.best_obj,
            self.best_bound(),
            self.gap_ratio() * 100.0,
            self.step_count,
            if self.solve_time > 0.0 { self.solve_time } else { self.current_time() },
            self.strong_eval,
            self.strong_eval_time.as_secs_f64(),
            self.heur_time.as_secs_f64(),
        )
    }
}

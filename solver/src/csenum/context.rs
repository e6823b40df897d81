use std::sync::Arc;

use tracing::trace;

use super::solver::CsenumSolver;
use crate::branchbound::{BranchDir, Candidate, Node, Relaxation};
use crate::heuristics::TollsHeuristic;
use crate::problem::Problem;

/// Slack below this is treated as a tight constraint. The LP backend solves
/// to a tighter tolerance, so solver noise never spawns phantom candidates.
pub const TOLERANCE: f64 = 1e-4;

/// Default wiring of the subsolver seam: bounds come from the
/// [`CsenumSolver`] pair, candidates from the dual slack map, and incumbents
/// from the toll heuristic.
pub struct CsenumContext {
    prob: Arc<Problem>,
    solver: CsenumSolver,
    heuristic: TollsHeuristic,
}

impl CsenumContext {
    pub fn new(prob: Arc<Problem>) -> Self {
        CsenumContext {
            solver: CsenumSolver::new(prob.clone()),
            heuristic: TollsHeuristic::new(prob.clone()),
            prob,
        }
    }

    pub fn solver(&self) -> &CsenumSolver {
        &self.solver
    }

    fn compute_bound(&self, node: &mut Node) {
        node.bound = node.dual_obj
            - self
                .prob
                .commodities
                .iter()
                .zip(&node.primal_objs)
                .map(|(c, &obj)| c.demand * obj)
                .sum::<f64>();
    }

    /// Recompute `slack_map` from the given potentials and the node's tolls.
    /// Pure in `(lambda, tolls)`: calling it twice changes nothing.
    fn update_slack_map(&self, node: &mut Node, lambda: &[Vec<f64>]) {
        let (k_count, a_count) = (self.prob.num_commodities(), self.prob.num_arcs());
        node.slack_map = vec![vec![false; a_count]; k_count];
        for k in 0..k_count {
            for (a, arc) in self.prob.arcs.iter().enumerate() {
                let mut slack = arc.cost - lambda[k][arc.src] + lambda[k][arc.dst];
                if let Some(a1) = self.prob.a1_of(a) {
                    slack += node.tolls[a1];
                }
                node.slack_map[k][a] = slack.abs() > TOLERANCE;
            }
        }
    }

    /// Candidates are the slacked constraints sitting on an arc of the
    /// commodity's current path, in path order across commodities.
    fn update_candidate_list(&self, node: &mut Node) {
        node.candidates.clear();
        for (k, arcs) in node.arcs.iter().enumerate() {
            for &a in arcs {
                if node.slack_map[k][a] {
                    node.candidates.push(Candidate { k, a });
                }
            }
        }
    }
}

impl Relaxation for CsenumContext {
    fn update_root_bound(&mut self, node: &mut Node) -> bool {
        self.solver.clear_primal();
        self.solver.clear_dual();

        if !self.solver.solve_primals() || !self.solver.solve_dual() {
            return false;
        }

        let k_count = self.prob.num_commodities();
        node.primal_objs = (0..k_count).map(|k| self.solver.primal_cost(k)).collect();
        node.arcs = (0..k_count).map(|k| self.solver.primal_arcs(k)).collect();

        let Some(dual) = self.solver.dual() else { return false };
        node.dual_obj = dual.objective;
        node.tolls = dual.tolls.clone();
        let lambda = dual.lambda.clone();

        self.compute_bound(node);
        self.update_slack_map(node, &lambda);
        self.update_candidate_list(node);
        true
    }

    fn update_bound(
        &mut self,
        node: &mut Node,
        parent: &Node,
        candidate: Candidate,
        dir: BranchDir,
    ) -> bool {
        match dir {
            BranchDir::Primal => {
                let feasible = self
                    .solver
                    .with_primal(candidate, |s| s.solve_primal(candidate.k));
                if !feasible {
                    trace!(?candidate, "primal branch infeasible");
                    return false;
                }

                node.primal_objs = parent.primal_objs.clone();
                node.arcs = parent.arcs.clone();
                node.primal_objs[candidate.k] = self.solver.primal_cost(candidate.k);
                node.arcs[candidate.k] = self.solver.primal_arcs(candidate.k);

                // The dual side is untouched by a primal branch.
                node.dual_obj = parent.dual_obj;
                node.tolls = parent.tolls.clone();
                node.slack_map = parent.slack_map.clone();
            }
            BranchDir::Dual => {
                let feasible = self.solver.with_dual(candidate, |s| s.solve_dual());
                if !feasible {
                    trace!(?candidate, "dual branch infeasible");
                    return false;
                }

                // The primal side is untouched by a dual branch.
                node.primal_objs = parent.primal_objs.clone();
                node.arcs = parent.arcs.clone();

                let Some(dual) = self.solver.dual() else { return false };
                node.dual_obj = dual.objective;
                node.tolls = dual.tolls.clone();
                let lambda = dual.lambda.clone();
                self.update_slack_map(node, &lambda);
            }
        }

        self.compute_bound(node);
        self.update_candidate_list(node);
        true
    }

    fn evaluate_branch(
        &mut self,
        node: &Node,
        candidate: Candidate,
        dir: BranchDir,
    ) -> Option<f64> {
        match dir {
            BranchDir::Primal => {
                let demand = self.prob.commodities[candidate.k].demand;
                let parent_obj = node.primal_objs[candidate.k];
                self.solver.with_primal(candidate, |s| {
                    if s.solve_primal(candidate.k) {
                        Some((s.primal_cost(candidate.k) - parent_obj) * demand)
                    } else {
                        None
                    }
                })
            }
            BranchDir::Dual => {
                let parent_obj = node.dual_obj;
                self.solver.with_dual(candidate, |s| {
                    if s.solve_dual() {
                        s.dual().map(|d| parent_obj - d.objective)
                    } else {
                        None
                    }
                })
            }
        }
    }

    fn enter_node(&mut self, _node: &Node, lineage: &[(Candidate, BranchDir)]) {
        self.solver.clear_primal();
        self.solver.clear_dual();
        for &(candidate, dir) in lineage {
            match dir {
                BranchDir::Primal => self.solver.push_primal(candidate),
                BranchDir::Dual => self.solver.push_dual(candidate),
            }
        }
    }

    fn run_heuristic(&mut self, node: &Node) -> Option<Node> {
        let solution = self.heuristic.solve(&node.tolls)?;
        let objective = solution.objective(&self.prob);

        let arcs = solution
            .paths
            .iter()
            .map(|path| {
                path.windows(2)
                    .filter_map(|w| self.prob.arc_index(w[0], w[1]))
                    .collect()
            })
            .collect();

        // A synthetic solution node: no lineage, trivially candidate-free.
        Some(Node {
            id: -1,
            parent: -1,
            lineage: None,
            bound: objective,
            dual_obj: objective,
            primal_objs: vec![],
            arcs,
            tolls: solution.tolls,
            slack_map: vec![],
            candidates: vec![],
        })
    }
}

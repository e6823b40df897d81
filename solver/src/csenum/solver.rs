use std::sync::Arc;

use smallvec::SmallVec;

use crate::branchbound::Candidate;
use crate::graph::{LightGraph, Path};
use crate::lp::{self, DualSolution};
use crate::problem::Problem;

/// The subsolver pair behind the enumeration: one shortest-path replica per
/// commodity on the primal side, the shared dual LP on the other.
///
/// Branching state is a stack per side, and every `push_*` is undone by the
/// matching `pop_*`; between nodes the engine clears both stacks and replays
/// the node's lineage, so no state leaks across nodes. The primal replicas
/// keep their toll overlay at zero: primal objectives are transport costs
/// only.
pub struct CsenumSolver {
    prob: Arc<Problem>,
    primal_graphs: Vec<LightGraph>,
    primal_paths: Vec<Option<Path>>,
    primal_stack: SmallVec<[Candidate; 8]>,
    dual_stack: SmallVec<[Candidate; 8]>,
    dual: Option<DualSolution>,
}

impl CsenumSolver {
    pub fn new(prob: Arc<Problem>) -> Self {
        let k_count = prob.num_commodities();
        let primal_graphs = (0..k_count).map(|_| LightGraph::from_problem(&prob)).collect();
        CsenumSolver {
            prob,
            primal_graphs,
            primal_paths: vec![None; k_count],
            primal_stack: SmallVec::new(),
            dual_stack: SmallVec::new(),
            dual: None,
        }
    }

    /// Shortest path of commodity `k` under its current edge mask. Returns
    /// feasibility; the path is kept for the accessors below.
    pub fn solve_primal(&mut self, k: usize) -> bool {
        let commodity = self.prob.commodities[k];
        self.primal_paths[k] =
            self.primal_graphs[k].shortest_path(commodity.origin, commodity.destination);
        self.primal_paths[k].is_some()
    }

    /// Solves all commodities; true iff every one has a path.
    pub fn solve_primals(&mut self) -> bool {
        let mut feasible = true;
        for k in 0..self.prob.num_commodities() {
            feasible &= self.solve_primal(k);
        }
        feasible
    }

    /// Transport cost of `k`'s last computed path (the replica tolls are
    /// zero, so `include_tolls` is moot).
    pub fn primal_cost(&self, k: usize) -> f64 {
        match &self.primal_paths[k] {
            Some(path) => self.primal_graphs[k].get_path_cost(path, true),
            None => f64::INFINITY,
        }
    }

    /// Arc indices of `k`'s last computed path.
    pub fn primal_arcs(&self, k: usize) -> Vec<usize> {
        match &self.primal_paths[k] {
            Some(path) => path
                .windows(2)
                .filter_map(|w| self.prob.arc_index(w[0], w[1]))
                .collect(),
            None => vec![],
        }
    }

    /// Solve the dual LP with the current tight set. Returns feasibility;
    /// the solution is kept for [`CsenumSolver::dual`].
    pub fn solve_dual(&mut self) -> bool {
        self.dual = lp::solve_dual(&self.prob, &self.dual_stack);
        self.dual.is_some()
    }

    pub fn dual(&self) -> Option<&DualSolution> {
        self.dual.as_ref()
    }

    pub fn push_primal(&mut self, candidate: Candidate) {
        let arc = self.prob.arcs[candidate.a];
        self.primal_graphs[candidate.k].edge_mut(arc.src, arc.dst).enabled = false;
        self.primal_stack.push(candidate);
    }

    pub fn pop_primal(&mut self) {
        if let Some(candidate) = self.primal_stack.pop() {
            let arc = self.prob.arcs[candidate.a];
            self.primal_graphs[candidate.k].edge_mut(arc.src, arc.dst).enabled = true;
        }
    }

    pub fn clear_primal(&mut self) {
        while !self.primal_stack.is_empty() {
            self.pop_primal();
        }
    }

    pub fn push_dual(&mut self, candidate: Candidate) {
        self.dual_stack.push(candidate);
    }

    pub fn pop_dual(&mut self) {
        self.dual_stack.pop();
    }

    pub fn clear_dual(&mut self) {
        self.dual_stack.clear();
    }

    pub fn primal_stack(&self) -> &[Candidate] {
        &self.primal_stack
    }

    pub fn dual_stack(&self) -> &[Candidate] {
        &self.dual_stack
    }

    /// Run `f` with `candidate` pushed on the primal side; the pop happens
    /// on every exit path, feasible or not.
    pub fn with_primal<T>(&mut self, candidate: Candidate, f: impl FnOnce(&mut Self) -> T) -> T {
        self.push_primal(candidate);
        let result = f(self);
        self.pop_primal();
        result
    }

    /// Same scoping for the dual side.
    pub fn with_dual<T>(&mut self, candidate: Candidate, f: impl FnOnce(&mut Self) -> T) -> T {
        self.push_dual(candidate);
        let result = f(self);
        self.pop_dual();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{Arc as PArc, Commodity};

    fn two_route_problem() -> Arc<Problem> {
        // Tolled 0 -> 1 -> 3 against toll-free 0 -> 2 -> 3.
        let mut prob = Problem::new(
            4,
            vec![
                PArc { src: 0, dst: 1, cost: 1.0, tolled: true },
                PArc { src: 1, dst: 3, cost: 1.0, tolled: false },
                PArc { src: 0, dst: 2, cost: 3.0, tolled: false },
                PArc { src: 2, dst: 3, cost: 3.0, tolled: false },
            ],
            vec![Commodity { origin: 0, destination: 3, demand: 1.0 }],
        );
        prob.compute_caps();
        Arc::new(prob)
    }

    #[test]
    fn primal_branching_masks_one_replica() {
        let mut solver = CsenumSolver::new(two_route_problem());
        assert!(solver.solve_primal(0));
        assert_eq!(solver.primal_arcs(0), vec![0, 1]);
        assert_eq!(solver.primal_cost(0), 2.0);

        solver.push_primal(Candidate { k: 0, a: 0 });
        assert!(solver.solve_primal(0));
        assert_eq!(solver.primal_arcs(0), vec![2, 3]);
        assert_eq!(solver.primal_cost(0), 6.0);

        solver.pop_primal();
        assert!(solver.solve_primal(0));
        assert_eq!(solver.primal_arcs(0), vec![0, 1]);
    }

    #[test]
    fn scoped_branches_restore_the_stacks() {
        let mut solver = CsenumSolver::new(two_route_problem());
        let feasible = solver.with_primal(Candidate { k: 0, a: 0 }, |s| {
            assert_eq!(s.primal_stack().len(), 1);
            s.solve_primal(0)
        });
        assert!(feasible);
        assert!(solver.primal_stack().is_empty());

        // Masking both routes leaves the commodity stranded; the stack must
        // still unwind.
        solver.push_primal(Candidate { k: 0, a: 0 });
        let feasible = solver.with_primal(Candidate { k: 0, a: 2 }, |s| s.solve_primal(0));
        assert!(!feasible);
        assert_eq!(solver.primal_stack().len(), 1);
        solver.clear_primal();
        assert!(solver.primal_stack().is_empty());
        assert!(solver.solve_primal(0));
    }

    #[test]
    fn dual_replay_reproduces_the_objective() {
        let mut solver = CsenumSolver::new(two_route_problem());
        assert!(solver.solve_dual());
        let first = solver.dual().unwrap().objective;

        solver.push_dual(Candidate { k: 0, a: 1 });
        assert!(solver.solve_dual());
        solver.clear_dual();

        // Replaying the empty lineage gives the root objective back.
        assert!(solver.solve_dual());
        let replayed = solver.dual().unwrap().objective;
        assert!((first - replayed).abs() < 1e-6);
    }
}

//! The two linear programs of the enumeration, modeled with `good_lp` on the
//! Clarabel backend: the shared dual over all commodities, and the inverse
//! program the heuristic uses to re-optimize tolls on fixed paths.
//!
//! Both share the dual-feasibility matrix: for every commodity `k` and arc
//! `a`, `lambda[k][src] - lambda[k][dst] - tolled * t[a1] <= cost`, with
//! `t[a1]` capped by `big_n[a1]`. They differ only in the objective and in
//! which constraints are forced to equality. Models are rebuilt per solve;
//! the branching state that selects the tight constraints lives with the
//! caller.

pub mod dual;
pub mod inverse;

pub use dual::{solve_dual, DualSolution};
pub use inverse::solve_inverse;

use good_lp::{constraint, variable, variables, Expression, ProblemVariables, SolverModel, Variable};

use crate::problem::Problem;

/// Per-commodity vertex potentials plus one toll variable per tolled arc.
pub(crate) struct DualVars {
    pub vars: ProblemVariables,
    pub lambda: Vec<Vec<Variable>>,
    pub tolls: Vec<Variable>,
}

pub(crate) fn dual_vars(prob: &Problem) -> DualVars {
    let mut vars = variables!();
    let lambda = (0..prob.num_commodities())
        .map(|_| (0..prob.num_verts).map(|_| vars.add(variable())).collect())
        .collect();
    let tolls = prob
        .big_n
        .iter()
        .map(|&cap| vars.add(variable().min(0.0).max(cap)))
        .collect();
    DualVars { vars, lambda, tolls }
}

/// Adds the full dual-feasibility matrix, forcing the `(k, a)` pairs selected
/// by `is_tight` to equality.
pub(crate) fn with_dual_feasibility<M: SolverModel>(
    mut model: M,
    prob: &Problem,
    lambda: &[Vec<Variable>],
    tolls: &[Variable],
    mut is_tight: impl FnMut(usize, usize) -> bool,
) -> M {
    for (a, arc) in prob.arcs.iter().enumerate() {
        for k in 0..prob.num_commodities() {
            let mut lhs = Expression::from(0.0);
            lhs += lambda[k][arc.src];
            lhs -= lambda[k][arc.dst];
            if let Some(a1) = prob.a1_of(a) {
                lhs -= tolls[a1];
            }
            let constraint = if is_tight(k, a) {
                constraint!(lhs == arc.cost)
            } else {
                constraint!(lhs <= arc.cost)
            };
            model = model.with(constraint);
        }
    }
    model
}

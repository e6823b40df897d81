use good_lp::solvers::clarabel::clarabel;
use good_lp::{ResolutionError, Solution, SolverModel};
use hashbrown::HashSet;
use tracing::debug;

use super::{dual_vars, with_dual_feasibility};
use crate::branchbound::Candidate;
use crate::problem::Problem;

/// One optimal point of the shared dual LP.
#[derive(Debug, Clone)]
pub struct DualSolution {
    pub objective: f64,
    /// `lambda[k][v]`: vertex potential of commodity `k`.
    pub lambda: Vec<Vec<f64>>,
    /// `tolls[a1]`: toll on each tolled arc.
    pub tolls: Vec<f64>,
}

/// Maximize `sum_k demand_k * (lambda_k[origin] - lambda_k[destination])`
/// over the dual-feasibility polytope, with the constraints in `tight`
/// forced to equality. `None` means the branch is infeasible (an abnormal
/// solver status counts as infeasible too; it is only logged).
pub fn solve_dual(prob: &Problem, tight: &[Candidate]) -> Option<DualSolution> {
    let dv = dual_vars(prob);
    let mut objective = good_lp::Expression::from(0.0);
    for (k, commodity) in prob.commodities.iter().enumerate() {
        objective += commodity.demand * dv.lambda[k][commodity.origin];
        objective -= commodity.demand * dv.lambda[k][commodity.destination];
    }

    let tight: HashSet<Candidate> = tight.iter().copied().collect();
    let model = dv.vars.maximise(objective).using(clarabel);
    let model = with_dual_feasibility(model, prob, &dv.lambda, &dv.tolls, |k, a| {
        tight.contains(&Candidate { k, a })
    });

    let solution = match model.solve() {
        Ok(solution) => solution,
        Err(ResolutionError::Infeasible) => {
            debug!(tight = tight.len(), "dual LP infeasible");
            return None;
        }
        Err(err) => {
            debug!(?err, "dual LP ended abnormally, treating as infeasible");
            return None;
        }
    };

    let lambda: Vec<Vec<f64>> = dv
        .lambda
        .iter()
        .map(|row| row.iter().map(|&v| solution.value(v)).collect())
        .collect();
    let tolls: Vec<f64> = dv.tolls.iter().map(|&v| solution.value(v)).collect();
    let objective = prob
        .commodities
        .iter()
        .enumerate()
        .map(|(k, c)| c.demand * (lambda[k][c.origin] - lambda[k][c.destination]))
        .sum();

    Some(DualSolution { objective, lambda, tolls })
}

use good_lp::solvers::clarabel::clarabel;
use good_lp::{ResolutionError, Solution, SolverModel};
use hashbrown::HashSet;
use tracing::debug;

use super::{dual_vars, with_dual_feasibility};
use crate::graph::Path;
use crate::problem::Problem;

/// Given one fixed path per commodity, find the toll vector maximizing the
/// revenue collected on those paths while keeping each path shortest for its
/// commodity: dual feasibility everywhere, equality along the paths.
///
/// `None` when a path crosses an unknown arc or the LP fails.
pub fn solve_inverse(prob: &Problem, paths: &[Path]) -> Option<Vec<f64>> {
    let mut toll_coefs = vec![0.0; prob.num_tolled()];
    let mut tight: HashSet<(usize, usize)> = HashSet::new();
    for (k, path) in paths.iter().enumerate() {
        let demand = prob.commodities[k].demand;
        for w in path.windows(2) {
            let a = prob.arc_index(w[0], w[1])?;
            tight.insert((k, a));
            if let Some(a1) = prob.a1_of(a) {
                toll_coefs[a1] += demand;
            }
        }
    }

    let dv = dual_vars(prob);
    let mut objective = good_lp::Expression::from(0.0);
    for (a1, &coef) in toll_coefs.iter().enumerate() {
        objective += coef * dv.tolls[a1];
    }

    let model = dv.vars.maximise(objective).using(clarabel);
    let model = with_dual_feasibility(model, prob, &dv.lambda, &dv.tolls, |k, a| {
        tight.contains(&(k, a))
    });

    let solution = match model.solve() {
        Ok(solution) => solution,
        Err(ResolutionError::Infeasible) => {
            debug!("inverse LP infeasible");
            return None;
        }
        Err(err) => {
            debug!(?err, "inverse LP ended abnormally, treating as infeasible");
            return None;
        }
    };

    Some(dv.tolls.iter().map(|&v| solution.value(v)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{Arc, Commodity};

    /// With the tolled path fixed, the inverse LP charges the full margin to
    /// the toll-free alternative.
    #[test]
    fn inverse_charges_up_to_the_alternative()  {
        let mut prob = Problem::new(
            3,
            vec![
                Arc { src: 0, dst: 1, cost: 1.0, tolled: true },
                Arc { src: 1, dst: 2, cost: 1.0, tolled: false },
                Arc { src: 0, dst: 2, cost: 8.0, tolled: false },
            ],
            vec![Commodity { origin: 0, destination: 2, demand: 3.0 }],
        );
        prob.compute_caps();

        let tolls = solve_inverse(&prob, &[vec![0, 1, 2]]).unwrap();
        // Path cost 2 + toll must not exceed the detour cost 8.
        assert!((tolls[0] - 6.0).abs() < 1e-5);
    }

    /// A path through a missing arc cannot be priced.
    #[test]
    fn unknown_arcs_are_rejected() {
        let prob = Problem::new(
            2,
            vec![Arc { src: 0, dst: 1, cost: 1.0, tolled: true }],
            vec![Commodity { origin: 0, destination: 1, demand: 1.0 }],
        );
        assert!(solve_inverse(&prob, &[vec![1, 0]]).is_none());
    }
}

use std::sync::Arc as StdArc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use netpricing::config::{Config, QueueDiscipline};
use netpricing::csenum::Csenum;
use netpricing::problem::{Arc, Commodity};
use netpricing::prelude::*;

fn arc(src: usize, dst: usize, cost: f64, tolled: bool) -> Arc {
    Arc { src, dst, cost, tolled }
}

fn quiet_config() -> Config {
    // Long print interval: the tests should not flood stdout.
    Config { print_interval: 3600.0, ..Config::default() }
}

/// A single tolled arc with an explicit cap: the dual is tight at the root,
/// the incumbent is installed without a single branching step.
#[test]
fn trivial_root_solution() {
    let mut prob = Problem::new(
        2,
        vec![arc(0, 1, 0.0, true)],
        vec![Commodity { origin: 0, destination: 1, demand: 10.0 }],
    );
    prob.set_caps(vec![vec![5.0]], vec![5.0]);

    let mut model = Csenum::new(StdArc::new(prob), quiet_config()).unwrap();
    assert!(model.solve());

    let engine = model.engine();
    assert_eq!(engine.step_count(), 0);
    for children in 0..=2 {
        assert_eq!(engine.branch_category_count(children), 0);
    }
    assert!((engine.best_obj() - 50.0).abs() < 1e-3);
    assert!((engine.best_bound() - 50.0).abs() < 1e-3);

    let solution = model.solution().unwrap();
    assert!((solution.tolls[0] - 5.0).abs() < 1e-3);
    assert_eq!(solution.paths, vec![vec![0, 1]]);
}

/// A tolled two-arc chain against a toll-free direct arc: the dual revenue
/// bound is 10 and a short enumeration certifies it.
#[test]
fn chain_resolves_to_full_margin() {
    let mut prob = Problem::new(
        3,
        vec![
            arc(0, 1, 0.0, true),
            arc(1, 2, 0.0, true),
            arc(0, 2, 10.0, false),
        ],
        vec![Commodity { origin: 0, destination: 2, demand: 1.0 }],
    );
    prob.compute_caps();
    assert_eq!(prob.big_n, vec![10.0, 10.0]);
    let prob = StdArc::new(prob);

    let mut model = Csenum::new(prob.clone(), quiet_config()).unwrap();
    assert!(model.solve());

    let engine = model.engine();
    assert!((engine.best_obj() - 10.0).abs() < 1e-3);
    assert!(engine.gap_ratio() < 1e-4);
    // The ambiguity resolves within a handful of nodes.
    assert!(engine.step_count() <= 8);

    let solution = model.solution().unwrap();
    assert!(solution.is_feasible(&prob, 1e-3));
    assert!((solution.objective(&prob) - 10.0).abs() < 1e-3);
}

/// All three disciplines close the same small instance to the same value.
#[test]
fn queue_disciplines_agree() {
    let mut prob = Problem::new(
        4,
        vec![
            arc(0, 1, 1.0, true),
            arc(1, 3, 1.0, false),
            arc(0, 2, 2.0, true),
            arc(2, 3, 2.0, false),
            arc(0, 3, 9.0, false),
        ],
        vec![
            Commodity { origin: 0, destination: 3, demand: 2.0 },
            Commodity { origin: 1, destination: 3, demand: 1.0 },
        ],
    );
    prob.compute_caps();
    let prob = StdArc::new(prob);

    let mut objectives = vec![];
    for discipline in [
        QueueDiscipline::BestFirst,
        QueueDiscipline::DepthFirst,
        QueueDiscipline::Hybrid,
    ] {
        let config = Config { queue_discipline: discipline, ..quiet_config() };
        let mut model = Csenum::new(prob.clone(), config).unwrap();
        assert!(model.solve());
        let solution = model.solution().unwrap();
        assert!(solution.is_feasible(&prob, 1e-3));
        objectives.push(model.engine().best_obj());
    }
    assert!((objectives[0] - objectives[1]).abs() < 1e-3);
    assert!((objectives[1] - objectives[2]).abs() < 1e-3);
    assert!(objectives[0] > 1e-3);
}

/// The heuristic never beats the optimum: its output is a feasible point.
#[test]
fn heuristic_is_primal_bounded() {
    let mut prob = Problem::new(
        3,
        vec![
            arc(0, 1, 2.0, true),
            arc(1, 2, 0.0, false),
            arc(0, 2, 6.0, false),
        ],
        vec![Commodity { origin: 0, destination: 2, demand: 3.0 }],
    );
    prob.compute_caps();
    let prob = StdArc::new(prob);

    let mut model = Csenum::new(prob.clone(), quiet_config()).unwrap();
    assert!(model.solve());
    let optimum = model.engine().best_obj();
    assert!((optimum - 12.0).abs() < 1e-3);

    let mut heuristic = netpricing::heuristics::TollsHeuristic::new(prob.clone());
    for tolls in [vec![0.0], vec![1.0], vec![4.0], vec![100.0]] {
        if let Some(solution) = heuristic.solve(&tolls) {
            assert!(solution.is_feasible(&prob, 1e-3));
            assert!(solution.objective(&prob) <= optimum + 1e-3);
        }
    }
}

/// An n-vertex corridor with toll-free skip arcs: every third forward arc is
/// tolled, and each vertex can be bypassed at a higher cost.
fn corridor_problem(n: usize, seed: u64) -> Problem {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut arcs = vec![];
    for i in 0..n - 1 {
        arcs.push(arc(i, i + 1, rng.random_range(1.0..5.0), i % 3 == 0));
    }
    for i in 0..n - 2 {
        arcs.push(arc(i, i + 2, rng.random_range(4.0..9.0), false));
    }
    let commodities = vec![
        Commodity { origin: 0, destination: n - 1, demand: 2.0 },
        Commodity { origin: 2, destination: n - 3, demand: 1.0 },
        Commodity { origin: 1, destination: n - 2, demand: 1.5 },
    ];
    let mut prob = Problem::new(n, arcs, commodities);
    prob.validate().unwrap();
    prob.compute_caps();
    prob
}

/// Scenario: a hard time limit. The loop exits cleanly; whatever incumbent
/// exists is verifiably feasible.
#[test]
fn timeout_leaves_a_consistent_state() {
    let prob = StdArc::new(corridor_problem(50, 7));
    let config = Config { time_limit: 0.001, ..quiet_config() };
    let mut model = Csenum::new(prob.clone(), config).unwrap();

    let found = model.solve();
    assert_eq!(found, model.solution().is_some());
    if let Some(solution) = model.solution() {
        // Tight-slack classification can leave up to TOLERANCE per arc, so
        // the independent recheck gets a looser epsilon on long paths.
        assert!(solution.is_feasible(&prob, 1e-2));
        let engine = model.engine();
        // The overall bound always dominates the incumbent.
        assert!(engine.best_bound() >= engine.best_obj() - 1e-6);
        assert!(engine.gap_ratio() >= 0.0);
    }
}

/// Without a time limit the corridor closes, and the incumbent matches its
/// own recomputed revenue.
#[test]
fn corridor_closes_to_a_feasible_optimum() {
    let prob = StdArc::new(corridor_problem(10, 11));
    let mut model = Csenum::new(prob.clone(), quiet_config()).unwrap();
    assert!(model.solve());

    let engine = model.engine();
    let solution = model.solution().unwrap();
    assert!(solution.is_feasible(&prob, 1e-2));
    assert!((solution.objective(&prob) - engine.best_obj()).abs() < 1e-2);
    assert!(engine.best_bound() >= engine.best_obj() - 1e-6);
    // The revenue can never exceed the instance-wide margin bound.
    assert!(engine.best_obj() <= prob.objective_upper_bound() + 1e-3);
}

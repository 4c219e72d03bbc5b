//! Property-based tests over randomly generated instances.
//!
//! # Invariants tested
//!
//! - **Idempotence:** re-evaluating a repaired solution changes nothing.
//! - **Capacity:** load never exceeds capacity on a feasible route.
//! - **Range:** distance driven between replenishments stays within range.
//! - **Coverage:** annealing output serves every customer exactly once.
//! - **Determinism:** equal seeds give equal annealing and restart results.

use proptest::prelude::*;

use u_gvrp::annealing::{run_restarts, AnnealingConfig, AnnealingEngine, CancellationToken};
use u_gvrp::constructive::cheapest_insertion;
use u_gvrp::evaluation::{ObjectiveWeights, SolutionEvaluator};
use u_gvrp::models::{
    Customer, Depot, GvrpProblem, Station, StationKind, Stop, Vehicle, VehicleType,
};
use u_gvrp::resource::LinearResourceModel;

const KINDS: [StationKind; 4] = [
    StationKind::Standard,
    StationKind::Fast,
    StationKind::Super,
    StationKind::Fuel,
];

fn coord() -> impl Strategy<Value = (f64, f64)> {
    (-10i32..=10, -10i32..=10).prop_map(|(x, y)| (f64::from(x), f64::from(y)))
}

fn problem_strategy() -> impl Strategy<Value = GvrpProblem> {
    let customers = prop::collection::vec((coord(), 0i32..=5), 1..=6);
    let stations = prop::collection::vec((coord(), 0usize..4), 0..=3);
    let vehicles = prop::collection::vec((any::<bool>(), 5i32..=20, 15u32..=60), 1..=3);
    (customers, stations, vehicles).prop_map(|(customers, stations, vehicles)| {
        GvrpProblem::new(
            vec![Depot::new(0, 0.0, 0.0)],
            customers
                .into_iter()
                .enumerate()
                .map(|(i, ((x, y), demand))| Customer::new(i + 1, x, y, demand))
                .collect(),
            stations
                .into_iter()
                .enumerate()
                .map(|(i, ((x, y), kind))| Station::new(i, x, y, KINDS[kind]))
                .collect(),
            vehicles
                .into_iter()
                .enumerate()
                .map(|(i, (electric, capacity, range))| {
                    let vehicle_type = if electric {
                        VehicleType::Electric
                    } else {
                        VehicleType::Fossil
                    };
                    Vehicle::new(i, vehicle_type, capacity, f64::from(range))
                        .with_emission_rate(if electric { 0.0 } else { 0.2 })
                })
                .collect(),
        )
        .expect("generated instances are valid")
    })
}

/// Random customer-index plan: a vehicle slot (or unrouted) per customer.
fn plan_for(problem: &GvrpProblem, slots: &[usize]) -> Vec<Vec<usize>> {
    let mut plan = vec![Vec::new(); problem.num_vehicles()];
    for (ci, &slot) in slots.iter().take(problem.num_customers()).enumerate() {
        if slot < plan.len() {
            plan[slot].push(ci);
        }
    }
    plan
}

fn evaluator(problem: &GvrpProblem) -> SolutionEvaluator<'_> {
    SolutionEvaluator::new(problem, &LinearResourceModel, ObjectiveWeights::default())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Evaluating the repaired solution again yields the same stops and
    /// costs.
    #[test]
    fn evaluation_is_idempotent(
        problem in problem_strategy(),
        slots in prop::collection::vec(0usize..4, 6),
    ) {
        let ev = evaluator(&problem);
        let first = ev.evaluate_plan(&plan_for(&problem, &slots)).expect("known indices");
        let repaired = first.repaired_solution();
        let second = ev.evaluate(&repaired).expect("known ids");
        let third = ev.evaluate(&second.repaired_solution()).expect("known ids");

        prop_assert_eq!(&second.breakdown, &third.breakdown);
        prop_assert_eq!(second.repaired_solution(), third.repaired_solution());
        prop_assert!((first.breakdown.total_distance - second.breakdown.total_distance).abs() < 1e-9);
        prop_assert_eq!(first.feasible, second.feasible);
    }

    /// Feasible routes never carry more than the vehicle's capacity.
    #[test]
    fn prefix_load_within_capacity(
        problem in problem_strategy(),
        slots in prop::collection::vec(0usize..4, 6),
    ) {
        let eval = evaluator(&problem)
            .evaluate_plan(&plan_for(&problem, &slots))
            .expect("known indices");
        for route in eval.routes.iter().filter(|r| r.is_feasible()) {
            let capacity = problem.vehicle(route.vehicle_id).expect("known").capacity();
            for visit in &route.visits {
                prop_assert!(visit.load_after <= capacity);
            }
        }
    }

    /// On feasible routes, the distance driven since the depot or the last
    /// station never exceeds the vehicle's range.
    #[test]
    fn consumption_between_replenishments_within_range(
        problem in problem_strategy(),
        slots in prop::collection::vec(0usize..4, 6),
    ) {
        let eval = evaluator(&problem)
            .evaluate_plan(&plan_for(&problem, &slots))
            .expect("known indices");
        for route in eval.routes.iter().filter(|r| r.is_feasible() && !r.stops.is_empty()) {
            let vehicle_idx = problem.vehicle_index(route.vehicle_id).expect("known");
            let max_range = problem.vehicles()[vehicle_idx].max_range();
            let depot = problem.vehicle_depot_node(vehicle_idx);

            let mut node = depot;
            let mut since_refill = 0.0;
            let mut total = 0.0;
            for &stop in &route.stops {
                let next = problem.stop_node(stop).expect("known stop");
                let leg = problem.distance(node, next);
                since_refill += leg;
                total += leg;
                prop_assert!(since_refill <= max_range + 1e-9);
                if matches!(stop, Stop::Station(_)) {
                    since_refill = 0.0;
                }
                node = next;
            }
            let leg = problem.distance(node, depot);
            since_refill += leg;
            total += leg;
            prop_assert!(since_refill <= max_range + 1e-9);
            prop_assert!((total - route.distance).abs() < 1e-9);
        }
    }

    /// A feasible annealing result routes each customer exactly once.
    #[test]
    fn annealing_serves_each_customer_once(
        problem in problem_strategy(),
        seed in any::<u64>(),
    ) {
        let ev = evaluator(&problem);
        prop_assume!(cheapest_insertion(&problem, &ev.route_evaluator()).is_ok());

        let config = AnnealingConfig::default().with_max_iterations(200).with_seed(seed);
        let outcome = AnnealingEngine::new(&problem, ev, config)
            .expect("valid config")
            .solve(&CancellationToken::new())
            .expect("runs");
        prop_assert!(outcome.evaluation.feasible);

        let mut served: Vec<usize> = outcome
            .best
            .routes()
            .iter()
            .flat_map(|r| r.customer_ids())
            .collect();
        served.sort_unstable();
        let expected: Vec<usize> = problem.customers().iter().map(|c| c.id()).collect();
        prop_assert_eq!(served, expected);
        prop_assert!(outcome.best.unserved().is_empty());
    }

    /// Two runs with the same seed produce identical outcomes.
    #[test]
    fn annealing_is_deterministic(
        problem in problem_strategy(),
        seed in any::<u64>(),
        candidates in 1usize..=3,
    ) {
        let ev = evaluator(&problem);
        prop_assume!(cheapest_insertion(&problem, &ev.route_evaluator()).is_ok());

        let config = AnnealingConfig::default()
            .with_max_iterations(150)
            .with_seed(seed)
            .with_candidates_per_iteration(candidates);
        let run = || {
            AnnealingEngine::new(&problem, ev, config.clone())
                .expect("valid config")
                .solve(&CancellationToken::new())
                .expect("runs")
        };
        prop_assert_eq!(run(), run());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Parallel restarts pick the same winner regardless of scheduling.
    #[test]
    fn restarts_are_deterministic(
        problem in problem_strategy(),
        seeds in prop::collection::vec(any::<u64>(), 1..=4),
    ) {
        let ev = evaluator(&problem);
        prop_assume!(cheapest_insertion(&problem, &ev.route_evaluator()).is_ok());

        let config = AnnealingConfig::default().with_max_iterations(100);
        let token = CancellationToken::new();
        let a = run_restarts(&problem, &ev, &config, &seeds, &token).expect("runs");
        let b = run_restarts(&problem, &ev, &config, &seeds, &token).expect("runs");
        prop_assert_eq!(a, b);
    }
}

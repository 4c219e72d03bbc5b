//! Greedy cheapest feasible insertion.
//!
//! # Algorithm
//!
//! Repeatedly evaluates every (unrouted customer, route, position) triple
//! and commits the feasible insertion with the smallest increase in
//! evaluated route distance, repair stations included. Only routes already
//! in use are considered; when none accepts a customer, a route is opened on
//! the lowest-cost unused vehicle.
//!
//! Ties go to the lowest customer id, then the lowest vehicle id, then the
//! latest position, so the result is deterministic and equal-cost
//! customers keep their id order along the route.
//!
//! # Complexity
//!
//! O(n³ · m) route evaluations where n = customers, m = vehicles.

use tracing::{debug, instrument, Level};

use crate::error::GvrpError;
use crate::evaluation::RouteEvaluator;
use crate::models::{GvrpProblem, Route, Solution, Stop};

/// Deltas closer than this count as equal.
const TIE_EPS: f64 = 1e-9;

struct Insertion {
    customer: usize,
    vehicle: usize,
    position: usize,
    distance: f64,
    delta: f64,
}

/// Builds an initial solution by cheapest feasible insertion.
///
/// Returned routes carry the stations the evaluator inserted.
///
/// # Errors
///
/// [`GvrpError::CapacityExhausted`] with the remaining customer ids when no
/// vehicle can feasibly take any of them.
///
/// # Examples
///
/// ```
/// use u_gvrp::models::{Customer, Depot, GvrpProblem, Vehicle, VehicleType};
/// use u_gvrp::evaluation::{EvaluationMode, RouteEvaluator};
/// use u_gvrp::resource::LinearResourceModel;
/// use u_gvrp::constructive::cheapest_insertion;
///
/// let problem = GvrpProblem::new(
///     vec![Depot::new(0, 0.0, 0.0)],
///     vec![
///         Customer::new(1, 1.0, 0.0, 10),
///         Customer::new(2, 2.0, 0.0, 10),
///         Customer::new(3, 3.0, 0.0, 10),
///     ],
///     vec![],
///     vec![Vehicle::new(0, VehicleType::Fossil, 30, 100.0)],
/// )
/// .unwrap();
///
/// let evaluator = RouteEvaluator::new(&problem, &LinearResourceModel, EvaluationMode::Repair);
/// let solution = cheapest_insertion(&problem, &evaluator).unwrap();
/// assert_eq!(solution.num_served(), 3);
/// assert!(solution.unserved().is_empty());
/// ```
#[instrument(skip_all, level = Level::DEBUG)]
pub fn cheapest_insertion(
    problem: &GvrpProblem,
    evaluator: &RouteEvaluator<'_>,
) -> Result<Solution, GvrpError> {
    let plan = cheapest_insertion_plan(problem, evaluator)?;
    let mut solution = Solution::new();
    for (k, slot) in plan.iter().enumerate() {
        if slot.is_empty() {
            continue;
        }
        let vehicle_id = problem.vehicles()[k].id();
        let eval = evaluator.evaluate(vehicle_id, &customer_stops(problem, slot))?;
        solution.add_route(Route::with_stops(vehicle_id, eval.stops));
    }
    Ok(solution)
}

/// Cheapest insertion over customer indices, one slot per vehicle.
fn cheapest_insertion_plan(
    problem: &GvrpProblem,
    evaluator: &RouteEvaluator<'_>,
) -> Result<Vec<Vec<usize>>, GvrpError> {
    let vehicles = problem.vehicles();
    let mut plan: Vec<Vec<usize>> = vec![Vec::new(); vehicles.len()];
    let mut route_distance = vec![0.0; vehicles.len()];
    let mut unrouted: Vec<usize> = (0..problem.num_customers()).collect();

    debug!(
        customers = unrouted.len(),
        vehicles = vehicles.len(),
        "Start cheapest insertion"
    );

    while !unrouted.is_empty() {
        let used: Vec<usize> = (0..vehicles.len()).filter(|&k| !plan[k].is_empty()).collect();
        let unused: Vec<usize> = (0..vehicles.len()).filter(|&k| plan[k].is_empty()).collect();

        let mut best = best_insertion(problem, evaluator, &plan, &route_distance, &unrouted, &used)?;
        if best.is_none() {
            best = best_insertion(problem, evaluator, &plan, &route_distance, &unrouted, &unused)?;
            if let Some(b) = &best {
                debug!(vehicle = vehicles[b.vehicle].id(), "Opening route");
            }
        }

        let Some(ins) = best else {
            let customer_ids = unrouted
                .iter()
                .map(|&ci| problem.customers()[ci].id())
                .collect();
            return Err(GvrpError::CapacityExhausted {
                customer_ids,
                fleet_size: vehicles.len(),
            });
        };

        plan[ins.vehicle].insert(ins.position, ins.customer);
        route_distance[ins.vehicle] = ins.distance;
        unrouted.retain(|&c| c != ins.customer);
        debug!(
            customer = problem.customers()[ins.customer].id(),
            vehicle = vehicles[ins.vehicle].id(),
            position = ins.position,
            delta = ins.delta,
            "Inserted customer"
        );
    }
    Ok(plan)
}

fn best_insertion(
    problem: &GvrpProblem,
    evaluator: &RouteEvaluator<'_>,
    plan: &[Vec<usize>],
    route_distance: &[f64],
    unrouted: &[usize],
    routes: &[usize],
) -> Result<Option<Insertion>, GvrpError> {
    let mut best: Option<Insertion> = None;
    for &customer in unrouted {
        for &k in routes {
            let vehicle_id = problem.vehicles()[k].id();
            for position in 0..=plan[k].len() {
                let mut candidate = plan[k].clone();
                candidate.insert(position, customer);
                let eval = evaluator.evaluate(vehicle_id, &customer_stops(problem, &candidate))?;
                if !eval.is_feasible() {
                    continue;
                }
                let delta = eval.distance - route_distance[k];
                let wins = best.as_ref().is_none_or(|b| {
                    delta < b.delta - TIE_EPS
                        || (delta <= b.delta + TIE_EPS && b.customer == customer && b.vehicle == k)
                });
                if wins {
                    best = Some(Insertion {
                        customer,
                        vehicle: k,
                        position,
                        distance: eval.distance,
                        delta,
                    });
                }
            }
        }
    }
    Ok(best)
}

fn customer_stops(problem: &GvrpProblem, slot: &[usize]) -> Vec<Stop> {
    slot.iter()
        .map(|&ci| Stop::Customer(problem.customers()[ci].id()))
        .collect()
}

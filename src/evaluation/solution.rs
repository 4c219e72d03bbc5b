//! Solution-level aggregation, global checks, and the scalar objective.

use std::collections::HashMap;

use serde::Serialize;

use super::{EvaluationMode, ObjectiveWeights, RouteEvaluation, RouteEvaluator};
use crate::error::{EntityKind, GvrpError};
use crate::models::{GvrpProblem, Route, Solution, Stop, Violation, ViolationType};
use crate::resource::ResourceModel;

/// Default objective penalty per violation of an infeasible solution.
pub const DEFAULT_INFEASIBILITY_PENALTY: f64 = 1e6;

/// Cost components of a solution, always recomputed from its routes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub total_distance: f64,
    pub total_emissions: f64,
    /// Travel plus replenishment time, summed over vehicles.
    pub total_time: f64,
    pub travel_time: f64,
    pub replenish_time: f64,
    /// Longest single route time.
    pub makespan: f64,
    pub station_visits: usize,
    pub vehicles_used: usize,
}

impl CostBreakdown {
    fn add(&mut self, route: &RouteEvaluation) {
        self.total_distance += route.distance;
        self.total_emissions += route.emissions;
        self.travel_time += route.travel_time;
        self.replenish_time += route.replenish_time;
        self.total_time += route.total_time();
        self.makespan = self.makespan.max(route.total_time());
        self.station_visits += route.station_visits();
        if !route.stops.is_empty() {
            self.vehicles_used += 1;
        }
    }
}

/// Full evaluation of a solution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolutionEvaluation {
    /// Per-route results, in solution order.
    pub routes: Vec<RouteEvaluation>,
    pub unserved: Vec<usize>,
    pub breakdown: CostBreakdown,
    /// Weighted cost plus the infeasibility penalty, if any.
    pub objective: f64,
    pub feasible: bool,
    /// Route violations in route order, then global ones in customer order.
    pub violations: Vec<Violation>,
}

impl SolutionEvaluation {
    /// The solution as actually driven, repair stations included.
    pub fn repaired_solution(&self) -> Solution {
        let mut solution = Solution::new();
        for r in self.routes.iter().filter(|r| !r.stops.is_empty()) {
            solution.add_route(Route::with_stops(r.vehicle_id, r.stops.clone()));
        }
        for &c in &self.unserved {
            solution.add_unserved(c);
        }
        solution
    }
}

/// Scores complete solutions against the weighted objective.
///
/// # Examples
///
/// ```
/// use u_gvrp::models::{Customer, Depot, GvrpProblem, Route, Solution, Vehicle, VehicleType};
/// use u_gvrp::evaluation::{ObjectiveWeights, SolutionEvaluator};
/// use u_gvrp::resource::LinearResourceModel;
///
/// let problem = GvrpProblem::new(
///     vec![Depot::new(0, 0.0, 0.0)],
///     vec![Customer::new(1, 3.0, 4.0, 5)],
///     vec![],
///     vec![Vehicle::new(0, VehicleType::Fossil, 10, 100.0).with_emission_rate(0.5)],
/// )
/// .unwrap();
///
/// let evaluator = SolutionEvaluator::new(&problem, &LinearResourceModel, ObjectiveWeights::default());
/// let mut solution = Solution::new();
/// solution.add_route(Route::from_customers(0, &[1]));
///
/// let eval = evaluator.evaluate(&solution).unwrap();
/// assert!(eval.feasible);
/// // 10 distance + 5 emissions + 10 time
/// assert!((eval.objective - 25.0).abs() < 1e-10);
/// ```
#[derive(Clone, Copy)]
pub struct SolutionEvaluator<'a> {
    problem: &'a GvrpProblem,
    resources: &'a dyn ResourceModel,
    weights: ObjectiveWeights,
    mode: EvaluationMode,
    penalty: f64,
}

impl<'a> SolutionEvaluator<'a> {
    /// Creates an evaluator in repair mode with the default penalty.
    pub fn new(
        problem: &'a GvrpProblem,
        resources: &'a dyn ResourceModel,
        weights: ObjectiveWeights,
    ) -> Self {
        Self {
            problem,
            resources,
            weights,
            mode: EvaluationMode::Repair,
            penalty: DEFAULT_INFEASIBILITY_PENALTY,
        }
    }

    /// Sets repair or check-only route evaluation.
    pub fn with_mode(mut self, mode: EvaluationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the per-violation penalty. Non-finite or negative values keep
    /// the current penalty.
    pub fn with_infeasibility_penalty(mut self, penalty: f64) -> Self {
        if penalty.is_finite() && penalty >= 0.0 {
            self.penalty = penalty;
        }
        self
    }

    /// Problem being scored.
    pub fn problem(&self) -> &'a GvrpProblem {
        self.problem
    }

    /// Resource model used for every route.
    pub fn resources(&self) -> &'a dyn ResourceModel {
        self.resources
    }

    /// Objective weights.
    pub fn weights(&self) -> ObjectiveWeights {
        self.weights
    }

    /// Route evaluation mode.
    pub fn mode(&self) -> EvaluationMode {
        self.mode
    }

    /// Penalty added per violation.
    pub fn penalty(&self) -> f64 {
        self.penalty
    }

    /// Route evaluator sharing this evaluator's model and mode.
    pub fn route_evaluator(&self) -> RouteEvaluator<'a> {
        RouteEvaluator::new(self.problem, self.resources, self.mode)
    }

    /// Evaluates a solution.
    ///
    /// Checks that every customer is routed exactly once or listed as
    /// unserved, that no vehicle drives twice, and that every route is
    /// feasible. Unknown ids are errors.
    pub fn evaluate(&self, solution: &Solution) -> Result<SolutionEvaluation, GvrpError> {
        let routes = solution
            .routes()
            .iter()
            .map(|r| (r.vehicle_id(), r.stops()))
            .collect::<Vec<_>>();
        self.evaluate_routes(&routes, solution.unserved())
    }

    /// Evaluates an index plan: `plan[k]` lists customer indices driven, in
    /// order, by the `k`-th vehicle. Customers absent from the plan are
    /// unserved.
    pub fn evaluate_plan(&self, plan: &[Vec<usize>]) -> Result<SolutionEvaluation, GvrpError> {
        let vehicles = self.problem.vehicles();
        let customers = self.problem.customers();
        if plan.len() > vehicles.len() {
            return Err(GvrpError::InvalidConfig(format!(
                "plan has {} routes but the fleet has {} vehicles",
                plan.len(),
                vehicles.len()
            )));
        }
        let mut seen = vec![false; customers.len()];
        let mut stops = Vec::with_capacity(plan.len());
        for (k, slot) in plan.iter().enumerate() {
            let mut route = Vec::with_capacity(slot.len());
            for &ci in slot {
                let customer = customers.get(ci).ok_or(GvrpError::UnknownEntity {
                    kind: EntityKind::Customer,
                    id: ci,
                })?;
                seen[ci] = true;
                route.push(Stop::Customer(customer.id()));
            }
            stops.push((vehicles[k].id(), route));
        }
        let unserved: Vec<usize> = customers
            .iter()
            .zip(&seen)
            .filter(|(_, &s)| !s)
            .map(|(c, _)| c.id())
            .collect();
        let routes = stops
            .iter()
            .map(|(v, s)| (*v, s.as_slice()))
            .collect::<Vec<_>>();
        self.evaluate_routes(&routes, &unserved)
    }

    fn evaluate_routes(
        &self,
        routes: &[(usize, &[Stop])],
        unserved: &[usize],
    ) -> Result<SolutionEvaluation, GvrpError> {
        let evaluator = self.route_evaluator();
        let mut evaluations = Vec::with_capacity(routes.len());
        let mut violations = Vec::new();
        let mut breakdown = CostBreakdown::default();
        let mut drivers: HashMap<usize, usize> = HashMap::new();

        for &(vehicle_id, stops) in routes {
            let eval = evaluator.evaluate(vehicle_id, stops)?;
            *drivers.entry(vehicle_id).or_default() += 1;
            if drivers[&vehicle_id] == 2 {
                violations.push(Violation::new(ViolationType::DuplicateVehicle { vehicle_id }));
            }
            violations.extend(eval.violations.iter().cloned());
            breakdown.add(&eval);
            evaluations.push(eval);
        }

        let mut visits = vec![0usize; self.problem.num_customers()];
        for eval in &evaluations {
            for stop in &eval.stops {
                if let Stop::Customer(id) = *stop {
                    visits[self.problem.customer_index(id)?] += 1;
                }
            }
        }
        let mut marked = vec![false; visits.len()];
        for &id in unserved {
            marked[self.problem.customer_index(id)?] = true;
        }
        for (idx, customer) in self.problem.customers().iter().enumerate() {
            let customer_id = customer.id();
            let kind = match (visits[idx], marked[idx]) {
                (1, false) => continue,
                (1, true) => ViolationType::ServedAndUnserved { customer_id },
                (0, true) => ViolationType::UnservedCustomer { customer_id },
                (0, false) => ViolationType::MissingCustomer { customer_id },
                (n, _) => ViolationType::DuplicateCustomer {
                    customer_id,
                    visits: n,
                },
            };
            violations.push(Violation::new(kind));
        }

        let feasible = violations.is_empty();
        let mut objective = self.weights.cost(&breakdown);
        if !feasible {
            objective += self.penalty * violations.len() as f64;
        }
        let mut unserved = unserved.to_vec();
        unserved.sort_unstable();
        unserved.dedup();

        Ok(SolutionEvaluation {
            routes: evaluations,
            unserved,
            breakdown,
            objective,
            feasible,
            violations,
        })
    }
}

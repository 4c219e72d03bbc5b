//! Serializable summary of an evaluated solution.

use serde::Serialize;

use crate::evaluation::{CostBreakdown, RouteEvaluation, RouteSlack, SolutionEvaluation};
use crate::models::{Stop, Violation};

/// One driven route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteReport {
    pub vehicle_id: usize,
    /// Stops as driven, repair stations included.
    pub stops: Vec<Stop>,
    pub distance: f64,
    pub emissions: f64,
    /// Travel plus replenishment time.
    pub time: f64,
    pub slack: RouteSlack,
}

impl From<&RouteEvaluation> for RouteReport {
    fn from(route: &RouteEvaluation) -> Self {
        Self {
            vehicle_id: route.vehicle_id,
            stops: route.stops.clone(),
            distance: route.distance,
            emissions: route.emissions,
            time: route.total_time(),
            slack: route.slack,
        }
    }
}

/// Output record handed to external reporting.
///
/// Vehicles without customers are omitted.
///
/// # Examples
///
/// ```
/// use u_gvrp::models::{Customer, Depot, GvrpProblem, Route, Solution, Vehicle, VehicleType};
/// use u_gvrp::evaluation::{ObjectiveWeights, SolutionEvaluator};
/// use u_gvrp::resource::LinearResourceModel;
/// use u_gvrp::report::SolutionReport;
///
/// let problem = GvrpProblem::new(
///     vec![Depot::new(0, 0.0, 0.0)],
///     vec![Customer::new(1, 0.0, 2.0, 1)],
///     vec![],
///     vec![Vehicle::new(0, VehicleType::Fossil, 5, 10.0)],
/// )
/// .unwrap();
/// let mut solution = Solution::new();
/// solution.add_route(Route::from_customers(0, &[1]));
///
/// let eval = SolutionEvaluator::new(&problem, &LinearResourceModel, ObjectiveWeights::default())
///     .evaluate(&solution)
///     .unwrap();
/// let report = SolutionReport::from(&eval);
/// assert!(report.feasible);
/// assert_eq!(report.routes.len(), 1);
/// assert!((report.routes[0].slack.final_range - 6.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolutionReport {
    pub feasible: bool,
    pub objective: f64,
    pub breakdown: CostBreakdown,
    pub routes: Vec<RouteReport>,
    pub unserved: Vec<usize>,
    pub violations: Vec<Violation>,
}

impl From<&SolutionEvaluation> for SolutionReport {
    fn from(eval: &SolutionEvaluation) -> Self {
        Self {
            feasible: eval.feasible,
            objective: eval.objective,
            breakdown: eval.breakdown,
            routes: eval
                .routes
                .iter()
                .filter(|r| !r.stops.is_empty())
                .map(RouteReport::from)
                .collect(),
            unserved: eval.unserved.clone(),
            violations: eval.violations.clone(),
        }
    }
}

use serde::Serialize;
use tracing::{info, instrument, warn, Level};

use super::backend::{MilpBackend, MilpStatus, SolveBudget};
use super::formulation::Formulation;
use super::model::MilpModel;
use super::ExactConfig;
use crate::error::GvrpError;
use crate::evaluation::{EvaluationMode, SolutionEvaluation, SolutionEvaluator};
use crate::models::{GvrpProblem, Solution};
use crate::resource::LinearResourceModel;

/// How good an exact result is known to be.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExactStatus {
    /// Proven optimal.
    Optimal,
    /// Best known solution. `gap` is the relative distance to the best
    /// lower bound, when one is available.
    BestFound { gap: Option<f64> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExactOutcome {
    pub solution: Solution,
    /// Check-only evaluation of `solution` under the linear resource model.
    pub evaluation: SolutionEvaluation,
    pub status: ExactStatus,
}

/// Exact solver for small instances.
///
/// Builds a [`MilpModel`] of the instance, hands it to a [`MilpBackend`],
/// and decodes the arcs back into routes. Decoded routes are re-evaluated in
/// [`EvaluationMode::CheckOnly`] with [`LinearResourceModel`], which is the
/// cost model the formulation encodes.
///
/// # Examples
///
/// ```
/// use u_gvrp::models::{Customer, Depot, GvrpProblem, Vehicle, VehicleType};
/// use u_gvrp::exact::{ExactConfig, ExactSolver, ExactStatus, MicroLpBackend};
///
/// let problem = GvrpProblem::new(
///     vec![Depot::new(0, 0.0, 0.0)],
///     vec![Customer::new(1, 3.0, 0.0, 1), Customer::new(2, 3.0, 4.0, 1)],
///     vec![],
///     vec![Vehicle::new(0, VehicleType::Fossil, 5, 100.0)],
/// )
/// .unwrap();
///
/// let solver = ExactSolver::new(&problem, ExactConfig::default());
/// let outcome = solver.solve(&MicroLpBackend, None).unwrap();
/// assert_eq!(outcome.status, ExactStatus::Optimal);
/// assert!(outcome.evaluation.feasible);
/// // 3 + 4 + 5 distance, counted once for distance and once for time.
/// assert!((outcome.evaluation.objective - 24.0).abs() < 1e-6);
/// ```
pub struct ExactSolver<'a> {
    problem: &'a GvrpProblem,
    config: ExactConfig,
}

impl<'a> ExactSolver<'a> {
    /// Creates a solver; nothing is checked until a solve.
    pub fn new(problem: &'a GvrpProblem, config: ExactConfig) -> Self {
        Self { problem, config }
    }

    /// Configuration the solver was built with.
    pub fn config(&self) -> &ExactConfig {
        &self.config
    }

    /// Fails with [`GvrpError::InstanceTooLarge`] when any size limit is
    /// exceeded.
    pub fn check_size(&self) -> Result<(), GvrpError> {
        let p = self.problem;
        let c = &self.config;
        if p.num_customers() > c.max_customers
            || p.num_vehicles() > c.max_vehicles
            || p.num_stations() > c.max_stations
        {
            return Err(GvrpError::InstanceTooLarge {
                customers: p.num_customers(),
                vehicles: p.num_vehicles(),
                stations: p.num_stations(),
                max_customers: c.max_customers,
                max_vehicles: c.max_vehicles,
                max_stations: c.max_stations,
            });
        }
        Ok(())
    }

    /// Assembles the model after the size guard.
    pub fn build_model(&self) -> Result<MilpModel, GvrpError> {
        self.config.weights.validate()?;
        self.check_size()?;
        Ok(Formulation::build(self.problem, self.config.weights)?.model)
    }

    fn evaluator(&self) -> SolutionEvaluator<'a> {
        SolutionEvaluator::new(self.problem, &LinearResourceModel, self.config.weights)
            .with_mode(EvaluationMode::CheckOnly)
    }

    /// Solves the instance.
    ///
    /// `warm_start` is returned, with a relaxation gap if the relaxation
    /// solves in time, when the backend times out without an incumbent.
    ///
    /// # Errors
    ///
    /// - [`GvrpError::InstanceTooLarge`] from the size guard
    /// - [`GvrpError::InfeasibleModel`] when no plan satisfies the constraints
    /// - [`GvrpError::Backend`] on backend failure, or on timeout without a
    ///   warm start
    #[instrument(skip_all, level = Level::DEBUG)]
    pub fn solve(
        &self,
        backend: &dyn MilpBackend,
        warm_start: Option<&Solution>,
    ) -> Result<ExactOutcome, GvrpError> {
        self.config.weights.validate()?;
        self.check_size()?;
        let formulation = Formulation::build(self.problem, self.config.weights)?;
        let budget = SolveBudget {
            time_limit: self.config.time_limit,
        };
        let result = backend.solve(&formulation.model, &budget)?;

        let (values, status) = match (result.status, result.values) {
            (MilpStatus::Optimal, Some(values)) => (values, ExactStatus::Optimal),
            (MilpStatus::Feasible { best_bound }, Some(values)) => {
                let gap = relative_gap(formulation.model.objective_value(&values), best_bound);
                (values, ExactStatus::BestFound { gap: Some(gap) })
            }
            (MilpStatus::Infeasible, _) => {
                return Err(GvrpError::InfeasibleModel {
                    reason: "no route plan satisfies capacity and range".into(),
                });
            }
            (MilpStatus::Unbounded, _) => {
                return Err(GvrpError::Backend("backend reported an unbounded model".into()));
            }
            (MilpStatus::TimedOut, _) => {
                let Some(warm) = warm_start else {
                    return Err(GvrpError::Backend(
                        "time limit reached before an incumbent was found".into(),
                    ));
                };
                return self.fall_back(backend, &formulation.model, &budget, warm);
            }
            (status, None) => {
                return Err(GvrpError::Backend(format!(
                    "backend reported {status:?} without variable values"
                )));
            }
        };

        let solution = formulation.decode(self.problem, &values)?;
        let evaluation = self.evaluator().evaluate(&solution)?;
        let optimal = status == ExactStatus::Optimal;
        info!(
            objective = evaluation.objective,
            feasible = evaluation.feasible,
            optimal,
            "Exact solve finished"
        );
        Ok(ExactOutcome {
            solution,
            evaluation,
            status,
        })
    }

    fn fall_back(
        &self,
        backend: &dyn MilpBackend,
        model: &MilpModel,
        budget: &SolveBudget,
        warm: &Solution,
    ) -> Result<ExactOutcome, GvrpError> {
        let evaluation = self.evaluator().evaluate(warm)?;
        let bound = match backend.solve(&model.relaxed(), budget) {
            Ok(relaxed) if relaxed.status == MilpStatus::Optimal => {
                relaxed.values.map(|v| model.objective_value(&v))
            }
            _ => None,
        };
        let gap = bound.map(|b| relative_gap(evaluation.objective, b));
        warn!(?gap, "Exact solve timed out, returning warm start");
        Ok(ExactOutcome {
            solution: warm.clone(),
            evaluation,
            status: ExactStatus::BestFound { gap },
        })
    }
}

fn relative_gap(objective: f64, bound: f64) -> f64 {
    ((objective - bound) / objective.abs().max(1e-9)).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::ObjectiveWeights;
    use crate::exact::{MicroLpBackend, MilpResult};
    use crate::models::{Customer, Depot, Route, Station, StationKind, Stop, Vehicle, VehicleType};

    struct Scripted(MilpStatus);

    impl MilpBackend for Scripted {
        fn solve(&self, model: &MilpModel, _: &SolveBudget) -> Result<MilpResult, GvrpError> {
            Ok(MilpResult {
                status: if model.num_binaries() == 0 {
                    MilpStatus::Infeasible
                } else {
                    self.0
                },
                values: None,
            })
        }
    }

    fn line_problem(customers: usize) -> GvrpProblem {
        GvrpProblem::new(
            vec![Depot::new(0, 0.0, 0.0)],
            (1..=customers)
                .map(|i| Customer::new(i, i as f64, 0.0, 1))
                .collect(),
            vec![],
            vec![Vehicle::new(0, VehicleType::Fossil, 10, 100.0)],
        )
        .expect("valid")
    }

    #[test]
    fn test_size_guard() {
        let p = line_problem(9);
        let solver = ExactSolver::new(&p, ExactConfig::default());
        assert!(matches!(
            solver.solve(&MicroLpBackend, None),
            Err(GvrpError::InstanceTooLarge {
                customers: 9,
                max_customers: 8,
                ..
            })
        ));
        assert!(solver.build_model().is_err());
    }

    #[test]
    fn test_rejects_invalid_weights() {
        let p = line_problem(2);
        let config =
            ExactConfig::default().with_weights(ObjectiveWeights::default().with_emissions(-1.0));
        let solver = ExactSolver::new(&p, config);
        assert!(matches!(
            solver.solve(&MicroLpBackend, None),
            Err(GvrpError::InvalidConfig(_))
        ));
        assert!(matches!(solver.build_model(), Err(GvrpError::InvalidConfig(_))));
    }

    #[test]
    fn test_station_needed_for_range() {
        // Customer at 8, range 10: the way back needs the station at 9.
        let p = GvrpProblem::new(
            vec![Depot::new(0, 0.0, 0.0)],
            vec![Customer::new(1, 8.0, 0.0, 1)],
            vec![Station::new(0, 9.0, 0.0, StationKind::Fuel)],
            vec![Vehicle::new(0, VehicleType::Fossil, 10, 10.0).with_recharge_rate(0.5)],
        )
        .expect("valid");
        let config = ExactConfig::default().with_weights(ObjectiveWeights::distance_only());
        let outcome = ExactSolver::new(&p, config)
            .solve(&MicroLpBackend, None)
            .expect("solves");
        assert!(outcome.evaluation.feasible);
        let stops = outcome.solution.routes()[0].stops();
        assert!(stops.contains(&Stop::Station(0)));
        assert!((outcome.evaluation.breakdown.total_distance - 18.0).abs() < 1e-6);
    }

    #[test]
    fn test_infeasible_model() {
        // Customer at 8, range 10, no station.
        let p = GvrpProblem::new(
            vec![Depot::new(0, 0.0, 0.0)],
            vec![Customer::new(1, 8.0, 0.0, 1)],
            vec![],
            vec![Vehicle::new(0, VehicleType::Fossil, 10, 10.0)],
        )
        .expect("valid");
        let result = ExactSolver::new(&p, ExactConfig::default()).solve(&MicroLpBackend, None);
        assert!(matches!(result, Err(GvrpError::InfeasibleModel { .. })));
    }

    #[test]
    fn test_timeout_falls_back_to_warm_start() {
        let p = line_problem(2);
        let mut warm = Solution::new();
        warm.add_route(Route::from_customers(0, &[1, 2]));
        let solver = ExactSolver::new(&p, ExactConfig::default());

        let outcome = solver
            .solve(&Scripted(MilpStatus::TimedOut), Some(&warm))
            .expect("falls back");
        assert_eq!(outcome.solution, warm);
        assert_eq!(outcome.status, ExactStatus::BestFound { gap: None });

        assert!(matches!(
            solver.solve(&Scripted(MilpStatus::TimedOut), None),
            Err(GvrpError::Backend(_))
        ));
    }

    #[test]
    fn test_relative_gap() {
        assert!((relative_gap(10.0, 8.0) - 0.2).abs() < 1e-12);
        assert_eq!(relative_gap(10.0, 12.0), 0.0);
    }
}

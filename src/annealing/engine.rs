//! Simulated annealing state machine.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, instrument, Level};

use super::moves::{neighbour, Plan};
use super::{AcceptanceStrategy, AnnealingConfig, CancellationToken};
use crate::constructive::cheapest_insertion;
use crate::error::{EntityKind, GvrpError};
use crate::evaluation::{SolutionEvaluation, SolutionEvaluator};
use crate::models::{GvrpProblem, Solution, Stop};

/// Why a run converged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvergenceReason {
    TemperatureFloor,
    IterationBudget,
    Stagnation,
}

/// Why a run stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    Cancelled,
}

/// Lifecycle of an annealing run.
///
/// `Initializing → Annealing → Converged | Aborted`. A failing evaluator
/// ends the run with an error instead of a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnealingState {
    Initializing,
    Annealing,
    Converged(ConvergenceReason),
    Aborted(AbortReason),
}

impl AnnealingState {
    /// Returns `true` for `Converged` and `Aborted`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnnealingState::Converged(_) | AnnealingState::Aborted(_))
    }
}

/// Result of an annealing run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnealingOutcome {
    /// Best solution found, repair stations included.
    pub best: Solution,
    /// Evaluation of `best`.
    pub evaluation: SolutionEvaluation,
    /// Terminal state.
    pub state: AnnealingState,
    pub iterations: usize,
    pub accepted: usize,
    pub improvements: usize,
    pub final_temperature: f64,
}

/// Simulated annealing over index plans.
///
/// Each iteration draws `candidates_per_iteration` neighbours from the
/// seeded RNG, scores them (in parallel when more than one), and moves to
/// the best of them with the Metropolis rule. The best solution is replaced
/// only by a strictly better feasible one, so the initial solution is
/// returned when nothing better is found.
///
/// # Examples
///
/// ```
/// use u_gvrp::models::{Customer, Depot, GvrpProblem, Vehicle, VehicleType};
/// use u_gvrp::evaluation::{ObjectiveWeights, SolutionEvaluator};
/// use u_gvrp::resource::LinearResourceModel;
/// use u_gvrp::annealing::{AnnealingConfig, AnnealingEngine, CancellationToken};
///
/// let problem = GvrpProblem::new(
///     vec![Depot::new(0, 0.0, 0.0)],
///     vec![
///         Customer::new(1, 2.0, 0.0, 5),
///         Customer::new(2, 0.0, 2.0, 5),
///         Customer::new(3, -2.0, 0.0, 5),
///     ],
///     vec![],
///     vec![
///         Vehicle::new(0, VehicleType::Fossil, 10, 50.0),
///         Vehicle::new(1, VehicleType::Fossil, 10, 50.0),
///     ],
/// )
/// .unwrap();
///
/// let evaluator = SolutionEvaluator::new(&problem, &LinearResourceModel, ObjectiveWeights::distance_only());
/// let config = AnnealingConfig::default().with_max_iterations(500);
/// let mut engine = AnnealingEngine::new(&problem, evaluator, config).unwrap();
/// let outcome = engine.solve(&CancellationToken::new()).unwrap();
///
/// assert!(outcome.evaluation.feasible);
/// assert!(outcome.state.is_terminal());
/// ```
pub struct AnnealingEngine<'a> {
    problem: &'a GvrpProblem,
    evaluator: SolutionEvaluator<'a>,
    config: AnnealingConfig,
    state: AnnealingState,
}

impl<'a> AnnealingEngine<'a> {
    /// Creates an engine. `evaluator` must score the same `problem`.
    ///
    /// Fails with [`GvrpError::InvalidConfig`] on an invalid `config` or
    /// invalid evaluator weights.
    pub fn new(
        problem: &'a GvrpProblem,
        evaluator: SolutionEvaluator<'a>,
        config: AnnealingConfig,
    ) -> Result<Self, GvrpError> {
        config.validate()?;
        evaluator.weights().validate()?;
        Ok(Self {
            problem,
            evaluator,
            config,
            state: AnnealingState::Initializing,
        })
    }

    /// Current state; terminal once a run returns.
    pub fn state(&self) -> AnnealingState {
        self.state
    }

    /// Configuration the engine was built with.
    pub fn config(&self) -> &AnnealingConfig {
        &self.config
    }

    /// Builds an initial solution by cheapest insertion, then anneals it.
    pub fn solve(&mut self, token: &CancellationToken) -> Result<AnnealingOutcome, GvrpError> {
        self.state = AnnealingState::Initializing;
        let initial = cheapest_insertion(self.problem, &self.evaluator.route_evaluator())?;
        self.run(&initial, token)
    }

    /// Anneals starting from `initial`.
    ///
    /// Station stops in `initial` are dropped; the evaluator re-inserts
    /// whatever stations its mode allows.
    #[instrument(skip_all, level = Level::DEBUG, fields(seed = self.config.seed))]
    pub fn run(
        &mut self,
        initial: &Solution,
        token: &CancellationToken,
    ) -> Result<AnnealingOutcome, GvrpError> {
        self.state = AnnealingState::Initializing;
        let config = &self.config;
        let evaluator = &self.evaluator;
        let mut rng = StdRng::seed_from_u64(config.seed);

        let mut current = plan_of(self.problem, initial)?;
        let mut current_eval = evaluator.evaluate_plan(&current.routes)?;
        let mut best_eval = current_eval.clone();

        let mut temperature = config.initial_temperature;
        let mut iterations = 0;
        let mut accepted = 0;
        let mut improvements = 0;
        let mut since_improvement = 0;

        self.state = AnnealingState::Annealing;
        let terminal = loop {
            if token.is_cancelled() {
                break AnnealingState::Aborted(AbortReason::Cancelled);
            }
            if iterations >= config.max_iterations {
                break AnnealingState::Converged(ConvergenceReason::IterationBudget);
            }
            if temperature < config.min_temperature {
                break AnnealingState::Converged(ConvergenceReason::TemperatureFloor);
            }
            if config
                .stagnation_window
                .is_some_and(|w| since_improvement >= w)
            {
                break AnnealingState::Converged(ConvergenceReason::Stagnation);
            }
            iterations += 1;

            let candidates: Vec<Plan> = (0..config.candidates_per_iteration)
                .filter_map(|_| neighbour(&current, &config.moves, &mut rng))
                .collect();
            let scored: Vec<SolutionEvaluation> = if candidates.len() > 1 {
                candidates
                    .par_iter()
                    .map(|p| evaluator.evaluate_plan(&p.routes))
                    .collect::<Result<_, _>>()?
            } else {
                candidates
                    .iter()
                    .map(|p| evaluator.evaluate_plan(&p.routes))
                    .collect::<Result<_, _>>()?
            };
            if token.is_cancelled() {
                break AnnealingState::Aborted(AbortReason::Cancelled);
            }

            let pick = scored
                .iter()
                .enumerate()
                .filter(|(_, e)| e.feasible || config.acceptance == AcceptanceStrategy::Penalized)
                .min_by(|a, b| a.1.objective.total_cmp(&b.1.objective))
                .map(|(i, _)| i);

            let mut improved = false;
            if let Some(i) = pick {
                let delta = scored[i].objective - current_eval.objective;
                let accept = delta < 0.0 || rng.random::<f64>() < (-delta / temperature).exp();
                if accept {
                    accepted += 1;
                    let mut candidates = candidates;
                    let mut scored = scored;
                    current = candidates.swap_remove(i);
                    current_eval = scored.swap_remove(i);
                    if current_eval.feasible && current_eval.objective < best_eval.objective {
                        best_eval = current_eval.clone();
                        improvements += 1;
                        improved = true;
                        debug!(iterations, objective = best_eval.objective, "New best");
                    }
                }
            }
            since_improvement = if improved { 0 } else { since_improvement + 1 };

            if iterations % config.cooling_interval == 0 {
                temperature *= config.cooling_rate;
            }
        };

        self.state = terminal;
        info!(
            state = ?terminal,
            iterations,
            accepted,
            improvements,
            objective = best_eval.objective,
            feasible = best_eval.feasible,
            "Annealing finished"
        );
        Ok(AnnealingOutcome {
            best: best_eval.repaired_solution(),
            evaluation: best_eval,
            state: terminal,
            iterations,
            accepted,
            improvements,
            final_temperature: temperature,
        })
    }
}

/// Index plan of a solution: customer indices per vehicle slot, plus the
/// customers it leaves unrouted.
fn plan_of(problem: &GvrpProblem, solution: &Solution) -> Result<Plan, GvrpError> {
    let mut routes = vec![Vec::new(); problem.num_vehicles()];
    let mut routed = vec![false; problem.num_customers()];
    for route in solution.routes() {
        let k = problem.vehicle_index(route.vehicle_id())?;
        if !routes[k].is_empty() {
            return Err(GvrpError::InvalidConfig(format!(
                "initial solution drives vehicle {} twice",
                route.vehicle_id()
            )));
        }
        for stop in route.stops() {
            if let Stop::Customer(id) = *stop {
                let ci = problem.customer_index(id)?;
                if routed[ci] {
                    return Err(GvrpError::InvalidConfig(format!(
                        "initial solution visits {} {id} twice",
                        EntityKind::Customer
                    )));
                }
                routed[ci] = true;
                routes[k].push(ci);
            }
        }
    }
    let pool = (0..routed.len()).filter(|&ci| !routed[ci]).collect();
    Ok(Plan::new(routes, pool))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::ObjectiveWeights;
    use crate::models::{Customer, Depot, Route, Vehicle, VehicleType};
    use crate::resource::LinearResourceModel;

    fn problem() -> GvrpProblem {
        GvrpProblem::new(
            vec![Depot::new(0, 0.0, 0.0)],
            vec![
                Customer::new(1, 5.0, 0.0, 3),
                Customer::new(2, 5.0, 5.0, 3),
                Customer::new(3, 0.0, 5.0, 3),
                Customer::new(4, -5.0, 0.0, 3),
                Customer::new(5, 0.0, -5.0, 3),
            ],
            vec![],
            vec![
                Vehicle::new(0, VehicleType::Fossil, 9, 100.0),
                Vehicle::new(1, VehicleType::Fossil, 9, 100.0),
            ],
        )
        .expect("valid")
    }

    #[test]
    fn test_never_worse_than_initial() {
        let p = problem();
        let ev = SolutionEvaluator::new(&p, &LinearResourceModel, ObjectiveWeights::distance_only());
        let initial = cheapest_insertion(&p, &ev.route_evaluator()).expect("feasible");
        let initial_obj = ev.evaluate(&initial).expect("known").objective;

        let config = AnnealingConfig::default().with_max_iterations(2_000);
        let mut engine = AnnealingEngine::new(&p, ev, config).expect("valid config");
        let out = engine.run(&initial, &CancellationToken::new()).expect("runs");
        assert!(out.evaluation.feasible);
        assert!(out.evaluation.objective <= initial_obj + 1e-9);
        assert_eq!(engine.state(), out.state);
        assert!(out.state.is_terminal());
    }

    #[test]
    fn test_temperature_floor_reached() {
        let p = problem();
        let ev = SolutionEvaluator::new(&p, &LinearResourceModel, ObjectiveWeights::default());
        let config = AnnealingConfig::default()
            .with_cooling_rate(0.5)
            .with_initial_temperature(8.0)
            .with_stagnation_window(None);
        let mut engine = AnnealingEngine::new(&p, ev, config).expect("valid config");
        let out = engine.solve(&CancellationToken::new()).expect("runs");
        assert_eq!(out.state, AnnealingState::Converged(ConvergenceReason::TemperatureFloor));
        // 8 -> 4 -> 2 -> 1 -> 0.5
        assert_eq!(out.iterations, 4);
        assert!((out.final_temperature - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_iteration_budget_and_stagnation() {
        let p = problem();
        let ev = SolutionEvaluator::new(&p, &LinearResourceModel, ObjectiveWeights::default());
        let budget = AnnealingConfig::default()
            .with_max_iterations(10)
            .with_stagnation_window(None);
        let out = AnnealingEngine::new(&p, ev, budget)
            .expect("valid")
            .solve(&CancellationToken::new())
            .expect("runs");
        assert_eq!(out.state, AnnealingState::Converged(ConvergenceReason::IterationBudget));
        assert_eq!(out.iterations, 10);

        let stagnant = AnnealingConfig::default()
            .with_stagnation_window(Some(25))
            .with_cooling_rate(0.999999);
        let out = AnnealingEngine::new(&p, ev, stagnant)
            .expect("valid")
            .solve(&CancellationToken::new())
            .expect("runs");
        assert_eq!(out.state, AnnealingState::Converged(ConvergenceReason::Stagnation));
    }

    #[test]
    fn test_cancelled_before_start_returns_initial() {
        let p = problem();
        let ev = SolutionEvaluator::new(&p, &LinearResourceModel, ObjectiveWeights::default());
        let initial = cheapest_insertion(&p, &ev.route_evaluator()).expect("feasible");
        let token = CancellationToken::new();
        token.cancel();
        let mut engine =
            AnnealingEngine::new(&p, ev, AnnealingConfig::default()).expect("valid config");
        let out = engine.run(&initial, &token).expect("runs");
        assert_eq!(out.state, AnnealingState::Aborted(AbortReason::Cancelled));
        assert_eq!(out.iterations, 0);
        assert_eq!(out.best, initial);
    }

    #[test]
    fn test_multi_candidate_is_deterministic() {
        let p = problem();
        let ev = SolutionEvaluator::new(&p, &LinearResourceModel, ObjectiveWeights::default());
        let config = AnnealingConfig::default()
            .with_max_iterations(300)
            .with_candidates_per_iteration(4)
            .with_seed(99);
        let run = || {
            AnnealingEngine::new(&p, ev, config.clone())
                .expect("valid")
                .solve(&CancellationToken::new())
                .expect("runs")
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_hard_reject_keeps_current_feasible() {
        let p = problem();
        let ev = SolutionEvaluator::new(&p, &LinearResourceModel, ObjectiveWeights::default());
        let config = AnnealingConfig::default()
            .with_max_iterations(500)
            .with_acceptance(AcceptanceStrategy::HardReject);
        let out = AnnealingEngine::new(&p, ev, config)
            .expect("valid")
            .solve(&CancellationToken::new())
            .expect("runs");
        assert!(out.evaluation.feasible);
    }

    #[test]
    fn test_unserved_initial_customers_can_be_routed() {
        let p = problem();
        let ev = SolutionEvaluator::new(&p, &LinearResourceModel, ObjectiveWeights::default());
        let mut initial = Solution::new();
        initial.add_route(Route::from_customers(0, &[1, 2]));
        initial.add_route(Route::from_customers(1, &[4, 5]));
        initial.add_unserved(3);
        let config = AnnealingConfig::default()
            .with_max_iterations(3_000)
            .with_seed(3);
        let out = AnnealingEngine::new(&p, ev, config)
            .expect("valid")
            .run(&initial, &CancellationToken::new())
            .expect("runs");
        assert!(out.evaluation.feasible);
        assert_eq!(out.best.num_served(), 5);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let p = problem();
        let ev = SolutionEvaluator::new(&p, &LinearResourceModel, ObjectiveWeights::default());
        let config = AnnealingConfig::default().with_cooling_rate(2.0);
        assert!(AnnealingEngine::new(&p, ev, config).is_err());
    }

    #[test]
    fn test_rejects_invalid_weights() {
        let p = problem();
        let weights = ObjectiveWeights::default()
            .with_distance(f64::NAN)
            .with_time(-5.0);
        let ev = SolutionEvaluator::new(&p, &LinearResourceModel, weights);
        assert!(matches!(
            AnnealingEngine::new(&p, ev, AnnealingConfig::default()),
            Err(GvrpError::InvalidConfig(_))
        ));
        let seeds = [1, 2];
        assert!(matches!(
            crate::annealing::run_restarts(
                &p,
                &ev,
                &AnnealingConfig::default(),
                &seeds,
                &CancellationToken::new()
            ),
            Err(GvrpError::InvalidConfig(_))
        ));
    }
}

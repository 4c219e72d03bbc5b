//! Annealing followed by an exact solve when the instance is small enough.
//!
//! The annealing result is the warm start and fallback of the exact solver.
//! Both results are scored by the same [`SolutionEvaluator`] before they are
//! compared, so the cross-validation gap is meaningful even when annealing
//! runs with a non-linear [`ResourceModel`].

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn, Level};

use crate::annealing::{
    run_restarts, AnnealingConfig, AnnealingEngine, AnnealingOutcome, CancellationToken,
};
use crate::error::GvrpError;
use crate::evaluation::{ObjectiveWeights, SolutionEvaluation, SolutionEvaluator};
use crate::exact::{ExactConfig, ExactOutcome, ExactSolver, MilpBackend};
use crate::models::{GvrpProblem, Solution};
use crate::resource::ResourceModel;

/// Configuration for [`HybridSolver`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridConfig {
    /// Weights for both stages; overrides `exact.weights`.
    pub weights: ObjectiveWeights,
    pub annealing: AnnealingConfig,
    pub exact: ExactConfig,
    /// Seeds for parallel restarts. Empty runs a single engine with
    /// `annealing.seed`.
    pub restart_seeds: Vec<u64>,
}

impl HybridConfig {
    /// Sets the weights shared by both stages.
    pub fn with_weights(mut self, weights: ObjectiveWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Sets the annealing configuration.
    pub fn with_annealing(mut self, annealing: AnnealingConfig) -> Self {
        self.annealing = annealing;
        self
    }

    /// Sets the exact solver configuration.
    pub fn with_exact(mut self, exact: ExactConfig) -> Self {
        self.exact = exact;
        self
    }

    /// Sets the seeds for parallel restarts.
    pub fn with_restart_seeds(mut self, seeds: Vec<u64>) -> Self {
        self.restart_seeds = seeds;
        self
    }
}

/// Which stage produced the returned solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolutionSource {
    Annealing,
    Exact,
}

/// Annealing and exact objectives under the same evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CrossValidation {
    pub annealing_objective: f64,
    pub exact_objective: f64,
    /// `(annealing - exact) / |exact|`; positive when the exact stage is
    /// better.
    pub relative_gap: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HybridOutcome {
    pub best: Solution,
    pub evaluation: SolutionEvaluation,
    pub source: SolutionSource,
    pub annealing: AnnealingOutcome,
    /// `None` when the exact stage was skipped.
    pub exact: Option<ExactOutcome>,
    pub cross_validation: Option<CrossValidation>,
}

/// Runs annealing, then the exact solver, and keeps the better feasible
/// result.
///
/// # Timeouts
///
/// With [`MicroLpBackend`](crate::exact::MicroLpBackend), an exact stage
/// that hits `exact.time_limit` falls back to the annealing result but
/// leaves its solver thread running until microlp finishes. Back-to-back
/// runs on instances that routinely time out accumulate such threads; keep
/// the size guard tight for those workloads, or set `exact.time_limit` to
/// `None` to solve on the calling thread.
///
/// # Examples
///
/// ```
/// use u_gvrp::models::{Customer, Depot, GvrpProblem, Vehicle, VehicleType};
/// use u_gvrp::annealing::{AnnealingConfig, CancellationToken};
/// use u_gvrp::exact::MicroLpBackend;
/// use u_gvrp::hybrid::{HybridConfig, HybridSolver};
/// use u_gvrp::resource::LinearResourceModel;
///
/// let problem = GvrpProblem::new(
///     vec![Depot::new(0, 0.0, 0.0)],
///     vec![Customer::new(1, 1.0, 0.0, 1), Customer::new(2, 0.0, 1.0, 1)],
///     vec![],
///     vec![Vehicle::new(0, VehicleType::Fossil, 5, 100.0)],
/// )
/// .unwrap();
///
/// let config = HybridConfig::default()
///     .with_annealing(AnnealingConfig::default().with_max_iterations(200));
/// let solver = HybridSolver::new(&problem, &LinearResourceModel, &MicroLpBackend, config);
/// let outcome = solver.solve(&CancellationToken::new()).unwrap();
///
/// assert!(outcome.evaluation.feasible);
/// let cv = outcome.cross_validation.unwrap();
/// assert!(cv.relative_gap.abs() < 1e-6);
/// ```
pub struct HybridSolver<'a> {
    problem: &'a GvrpProblem,
    resources: &'a dyn ResourceModel,
    backend: &'a dyn MilpBackend,
    config: HybridConfig,
}

impl<'a> HybridSolver<'a> {
    /// Creates a solver. `resources` scores both stages when comparing.
    pub fn new(
        problem: &'a GvrpProblem,
        resources: &'a dyn ResourceModel,
        backend: &'a dyn MilpBackend,
        config: HybridConfig,
    ) -> Self {
        Self {
            problem,
            resources,
            backend,
            config,
        }
    }

    #[instrument(skip_all, level = Level::DEBUG)]
    pub fn solve(&self, token: &CancellationToken) -> Result<HybridOutcome, GvrpError> {
        let config = &self.config;
        config.weights.validate()?;
        let evaluator = SolutionEvaluator::new(self.problem, self.resources, config.weights);

        let annealing = if config.restart_seeds.is_empty() {
            AnnealingEngine::new(self.problem, evaluator, config.annealing.clone())?.solve(token)?
        } else {
            run_restarts(
                self.problem,
                &evaluator,
                &config.annealing,
                &config.restart_seeds,
                token,
            )?
        };

        let exact = self.exact_stage(&annealing.best, token)?;
        let Some(exact) = exact else {
            return Ok(HybridOutcome {
                best: annealing.best.clone(),
                evaluation: annealing.evaluation.clone(),
                source: SolutionSource::Annealing,
                annealing,
                exact: None,
                cross_validation: None,
            });
        };

        let rescored = evaluator.evaluate(&exact.solution)?;
        let cross = CrossValidation {
            annealing_objective: annealing.evaluation.objective,
            exact_objective: rescored.objective,
            relative_gap: (annealing.evaluation.objective - rescored.objective)
                / rescored.objective.abs().max(1e-9),
        };
        info!(
            annealing = cross.annealing_objective,
            exact = cross.exact_objective,
            gap = cross.relative_gap,
            "Cross-validation"
        );

        let exact_wins = rescored.feasible
            && (!annealing.evaluation.feasible
                || rescored.objective < annealing.evaluation.objective);
        let (best, evaluation, source) = if exact_wins {
            (rescored.repaired_solution(), rescored, SolutionSource::Exact)
        } else {
            (
                annealing.best.clone(),
                annealing.evaluation.clone(),
                SolutionSource::Annealing,
            )
        };
        Ok(HybridOutcome {
            best,
            evaluation,
            source,
            annealing,
            exact: Some(exact),
            cross_validation: Some(cross),
        })
    }

    /// Runs the exact solver unless the size guard or cancellation rules it
    /// out. An infeasible model is logged and skipped: the formulation visits
    /// each station at most once per vehicle, which annealing does not need.
    fn exact_stage(
        &self,
        warm: &Solution,
        token: &CancellationToken,
    ) -> Result<Option<ExactOutcome>, GvrpError> {
        if token.is_cancelled() {
            info!("Cancelled, skipping exact solve");
            return Ok(None);
        }
        let exact_config = self.config.exact.clone().with_weights(self.config.weights);
        let solver = ExactSolver::new(self.problem, exact_config);
        if let Err(e) = solver.check_size() {
            warn!(%e, "Skipping exact solve");
            return Ok(None);
        }
        match solver.solve(self.backend, Some(warm)) {
            Ok(outcome) => Ok(Some(outcome)),
            Err(e @ GvrpError::InfeasibleModel { .. }) => {
                warn!(%e, "Exact model infeasible, keeping annealing result");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exact::MicroLpBackend;
    use crate::models::{Customer, Depot, Vehicle, VehicleType};
    use crate::resource::LinearResourceModel;

    fn problem(customers: usize) -> GvrpProblem {
        GvrpProblem::new(
            vec![Depot::new(0, 0.0, 0.0)],
            (1..=customers)
                .map(|i| Customer::new(i, (i % 3) as f64 + 1.0, (i / 3) as f64, 1))
                .collect(),
            vec![],
            vec![
                Vehicle::new(0, VehicleType::Fossil, 3, 100.0),
                Vehicle::new(1, VehicleType::Fossil, 3, 100.0),
            ],
        )
        .expect("valid")
    }

    fn quick() -> HybridConfig {
        HybridConfig::default()
            .with_weights(ObjectiveWeights::distance_only())
            .with_annealing(AnnealingConfig::default().with_max_iterations(300))
    }

    #[test]
    fn test_exact_skipped_for_large_instance() {
        let p = problem(4);
        let config = quick().with_exact(ExactConfig::default().with_max_customers(3));
        let out = HybridSolver::new(&p, &LinearResourceModel, &MicroLpBackend, config)
            .solve(&CancellationToken::new())
            .expect("runs");
        assert!(out.exact.is_none());
        assert!(out.cross_validation.is_none());
        assert_eq!(out.source, SolutionSource::Annealing);
        assert_eq!(out.best, out.annealing.best);
    }

    #[test]
    fn test_exact_never_worse_than_annealing() {
        let p = problem(4);
        let out = HybridSolver::new(&p, &LinearResourceModel, &MicroLpBackend, quick())
            .solve(&CancellationToken::new())
            .expect("runs");
        let cv = out.cross_validation.expect("exact ran");
        assert!(cv.relative_gap >= -1e-6);
        assert!(out.evaluation.objective <= out.annealing.evaluation.objective + 1e-9);
    }

    #[test]
    fn test_cancelled_skips_exact() {
        let p = problem(3);
        let token = CancellationToken::new();
        token.cancel();
        let out = HybridSolver::new(&p, &LinearResourceModel, &MicroLpBackend, quick())
            .solve(&token)
            .expect("runs");
        assert!(out.exact.is_none());
    }

    #[test]
    fn test_rejects_invalid_weights() {
        let p = problem(3);
        let config =
            quick().with_weights(ObjectiveWeights::default().with_distance(f64::NAN));
        let result = HybridSolver::new(&p, &LinearResourceModel, &MicroLpBackend, config)
            .solve(&CancellationToken::new());
        assert!(matches!(result, Err(GvrpError::InvalidConfig(_))));
    }

    #[test]
    fn test_restart_seeds_used() {
        let p = problem(3);
        let config = quick().with_restart_seeds(vec![1, 2]);
        let out = HybridSolver::new(&p, &LinearResourceModel, &MicroLpBackend, config)
            .solve(&CancellationToken::new())
            .expect("runs");
        assert!(out.evaluation.feasible);
    }
}

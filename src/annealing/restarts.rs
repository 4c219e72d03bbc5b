use rayon::prelude::*;
use tracing::{info, instrument, Level};

use super::{AnnealingConfig, AnnealingEngine, AnnealingOutcome, CancellationToken};
use crate::constructive::cheapest_insertion;
use crate::error::GvrpError;
use crate::evaluation::SolutionEvaluator;
use crate::models::GvrpProblem;

/// Runs one annealing restart per seed in parallel and returns the best.
///
/// Every restart starts from the same cheapest-insertion solution and uses
/// `config` with its seed replaced. Restarts share nothing mutable; results
/// are compared only after all of them finish. The lowest objective wins,
/// ties going to the earliest seed, so the result does not depend on thread
/// scheduling.
///
/// # Errors
///
/// [`GvrpError::InvalidConfig`] when `seeds` is empty, plus anything
/// construction or a restart reports.
#[instrument(skip_all, level = Level::DEBUG, fields(restarts = seeds.len()))]
pub fn run_restarts(
    problem: &GvrpProblem,
    evaluator: &SolutionEvaluator<'_>,
    config: &AnnealingConfig,
    seeds: &[u64],
    token: &CancellationToken,
) -> Result<AnnealingOutcome, GvrpError> {
    if seeds.is_empty() {
        return Err(GvrpError::InvalidConfig(
            "at least one restart seed is required".into(),
        ));
    }
    config.validate()?;
    evaluator.weights().validate()?;
    let initial = cheapest_insertion(problem, &evaluator.route_evaluator())?;

    let outcomes = seeds
        .par_iter()
        .map(|&seed| {
            let config = config.clone().with_seed(seed);
            AnnealingEngine::new(problem, *evaluator, config)?.run(&initial, token)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut best: Option<(usize, AnnealingOutcome)> = None;
    for (i, outcome) in outcomes.into_iter().enumerate() {
        if best
            .as_ref()
            .is_none_or(|(_, b)| outcome.evaluation.objective < b.evaluation.objective)
        {
            best = Some((i, outcome));
        }
    }
    let (winner, outcome) = best.ok_or_else(|| {
        GvrpError::InvalidConfig("at least one restart seed is required".into())
    })?;
    info!(
        seed = seeds[winner],
        objective = outcome.evaluation.objective,
        "Restarts finished"
    );
    Ok(outcome)
}

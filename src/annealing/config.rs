//! Simulated annealing configuration.

use serde::{Deserialize, Serialize};

use crate::error::GvrpError;

/// Neighbourhood move applied to an index plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveKind {
    /// Move one customer to another position or route.
    Relocate,
    /// Exchange two customers between different routes.
    Swap,
    /// Reverse a subsequence within one route.
    Reverse,
    /// Hand a whole route to another vehicle.
    Reassign,
}

impl MoveKind {
    /// All moves, in a fixed order.
    pub const ALL: [MoveKind; 4] = [
        MoveKind::Relocate,
        MoveKind::Swap,
        MoveKind::Reverse,
        MoveKind::Reassign,
    ];
}

/// How infeasible neighbours are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptanceStrategy {
    /// Score infeasible neighbours with the evaluator's penalty.
    #[default]
    Penalized,
    /// Never move to an infeasible neighbour.
    HardReject,
}

/// Configuration for [`AnnealingEngine`](super::AnnealingEngine).
///
/// # Examples
///
/// ```
/// use u_gvrp::annealing::{AnnealingConfig, MoveKind};
///
/// let config = AnnealingConfig::default()
///     .with_max_iterations(2_000)
///     .with_seed(7)
///     .with_moves(vec![MoveKind::Relocate, MoveKind::Reverse]);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.seed, 7);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnealingConfig {
    /// Starting temperature.
    pub initial_temperature: f64,
    /// Geometric cooling factor in (0, 1).
    pub cooling_rate: f64,
    /// Iterations between cooling steps.
    pub cooling_interval: usize,
    /// Search stops once the temperature drops below this value.
    pub min_temperature: f64,
    pub max_iterations: usize,
    /// Iterations without a new best before stopping. `None` disables.
    pub stagnation_window: Option<usize>,
    pub seed: u64,
    pub moves: Vec<MoveKind>,
    /// Neighbours generated and scored per iteration.
    pub candidates_per_iteration: usize,
    pub acceptance: AcceptanceStrategy,
}

impl Default for AnnealingConfig {
    fn default() -> Self {
        Self {
            initial_temperature: 100.0,
            cooling_rate: 0.997,
            cooling_interval: 1,
            min_temperature: 1.0,
            max_iterations: 100_000,
            stagnation_window: Some(5_000),
            seed: 42,
            moves: MoveKind::ALL.to_vec(),
            candidates_per_iteration: 1,
            acceptance: AcceptanceStrategy::Penalized,
        }
    }
}

impl AnnealingConfig {
    /// Sets the starting temperature.
    pub fn with_initial_temperature(mut self, t: f64) -> Self {
        self.initial_temperature = t;
        self
    }

    /// Sets the geometric cooling factor.
    pub fn with_cooling_rate(mut self, rate: f64) -> Self {
        self.cooling_rate = rate;
        self
    }

    /// Sets the number of iterations between cooling steps.
    pub fn with_cooling_interval(mut self, n: usize) -> Self {
        self.cooling_interval = n;
        self
    }

    /// Sets the temperature floor.
    pub fn with_min_temperature(mut self, t: f64) -> Self {
        self.min_temperature = t;
        self
    }

    /// Sets the iteration budget.
    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    /// Sets the stagnation window; `None` disables it.
    pub fn with_stagnation_window(mut self, window: Option<usize>) -> Self {
        self.stagnation_window = window;
        self
    }

    /// Sets the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the enabled neighbourhood moves.
    pub fn with_moves(mut self, moves: Vec<MoveKind>) -> Self {
        self.moves = moves;
        self
    }

    /// Sets how many neighbours each iteration scores.
    pub fn with_candidates_per_iteration(mut self, n: usize) -> Self {
        self.candidates_per_iteration = n;
        self
    }

    /// Sets how infeasible neighbours are treated.
    pub fn with_acceptance(mut self, acceptance: AcceptanceStrategy) -> Self {
        self.acceptance = acceptance;
        self
    }

    /// Checks parameter ranges.
    pub fn validate(&self) -> Result<(), GvrpError> {
        let fail = |msg: String| -> Result<(), GvrpError> { Err(GvrpError::InvalidConfig(msg)) };
        if !self.initial_temperature.is_finite() || self.initial_temperature <= 0.0 {
            return fail(format!(
                "initial_temperature must be positive, got {}",
                self.initial_temperature
            ));
        }
        if !(self.cooling_rate > 0.0 && self.cooling_rate < 1.0) {
            return fail(format!(
                "cooling_rate must lie in (0, 1), got {}",
                self.cooling_rate
            ));
        }
        if self.cooling_interval == 0 {
            return fail("cooling_interval must be at least 1".into());
        }
        if !self.min_temperature.is_finite() || self.min_temperature < 0.0 {
            return fail(format!(
                "min_temperature must be non-negative, got {}",
                self.min_temperature
            ));
        }
        if self.stagnation_window == Some(0) {
            return fail("stagnation_window must be at least 1".into());
        }
        if self.moves.is_empty() {
            return fail("at least one move kind is required".into());
        }
        if self.candidates_per_iteration == 0 {
            return fail("candidates_per_iteration must be at least 1".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(AnnealingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad = [
            AnnealingConfig::default().with_cooling_rate(1.0),
            AnnealingConfig::default().with_cooling_rate(f64::NAN),
            AnnealingConfig::default().with_initial_temperature(0.0),
            AnnealingConfig::default().with_cooling_interval(0),
            AnnealingConfig::default().with_stagnation_window(Some(0)),
            AnnealingConfig::default().with_moves(vec![]),
            AnnealingConfig::default().with_candidates_per_iteration(0),
            AnnealingConfig::default().with_min_temperature(-1.0),
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(GvrpError::InvalidConfig(_))),
                "{config:?}"
            );
        }
    }

    #[test]
    fn test_serde_defaults_fill_missing_fields() {
        let config: AnnealingConfig =
            serde_json::from_str(r#"{"seed": 9, "moves": ["swap"]}"#).expect("valid json");
        assert_eq!(config.seed, 9);
        assert_eq!(config.moves, vec![MoveKind::Swap]);
        assert_eq!(config.cooling_rate, 0.997);
    }
}

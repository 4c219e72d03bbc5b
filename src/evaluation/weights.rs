use serde::{Deserialize, Serialize};

use super::CostBreakdown;
use crate::error::GvrpError;

/// Weights of the scalar objective
/// `distance·w_d + emissions·w_e + time·w_t`.
///
/// # Examples
///
/// ```
/// use u_gvrp::evaluation::ObjectiveWeights;
///
/// let w = ObjectiveWeights::default().with_emissions(2.0);
/// assert_eq!(w.distance, 1.0);
/// assert_eq!(w.emissions, 2.0);
///
/// let d = ObjectiveWeights::distance_only();
/// assert_eq!((d.distance, d.emissions, d.time), (1.0, 0.0, 0.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectiveWeights {
    pub distance: f64,
    pub emissions: f64,
    pub time: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            distance: 1.0,
            emissions: 1.0,
            time: 1.0,
        }
    }
}

impl ObjectiveWeights {
    /// Minimise total distance.
    pub fn distance_only() -> Self {
        Self {
            distance: 1.0,
            emissions: 0.0,
            time: 0.0,
        }
    }

    /// Minimise total emissions.
    pub fn emissions_only() -> Self {
        Self {
            distance: 0.0,
            emissions: 1.0,
            time: 0.0,
        }
    }

    /// Minimise total delivery time, replenishment included.
    pub fn time_only() -> Self {
        Self {
            distance: 0.0,
            emissions: 0.0,
            time: 1.0,
        }
    }

    /// Sets the weight per unit distance.
    pub fn with_distance(mut self, w: f64) -> Self {
        self.distance = w;
        self
    }

    /// Sets the weight per unit emissions.
    pub fn with_emissions(mut self, w: f64) -> Self {
        self.emissions = w;
        self
    }

    /// Sets the weight per unit time.
    pub fn with_time(mut self, w: f64) -> Self {
        self.time = w;
        self
    }

    /// Weighted cost of a breakdown, without any infeasibility penalty.
    pub fn cost(&self, breakdown: &CostBreakdown) -> f64 {
        self.distance * breakdown.total_distance
            + self.emissions * breakdown.total_emissions
            + self.time * breakdown.total_time
    }

    /// Fails with [`GvrpError::InvalidConfig`] unless every weight is finite
    /// and non-negative.
    pub fn validate(&self) -> Result<(), GvrpError> {
        let named = [
            ("distance", self.distance),
            ("emissions", self.emissions),
            ("time", self.time),
        ];
        match named.iter().find(|(_, w)| !(w.is_finite() && *w >= 0.0)) {
            Some((name, w)) => Err(GvrpError::InvalidConfig(format!(
                "{name} weight must be finite and non-negative, got {w}"
            ))),
            None => Ok(()),
        }
    }
}

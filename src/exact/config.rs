use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::evaluation::ObjectiveWeights;

/// Configuration for [`ExactSolver`](super::ExactSolver).
///
/// The size limits keep the MILP small enough for an in-process
/// branch-and-bound backend.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use u_gvrp::exact::ExactConfig;
///
/// let config = ExactConfig::default()
///     .with_max_customers(5)
///     .with_time_limit(Some(Duration::from_secs(10)));
/// assert_eq!(config.max_customers, 5);
/// assert_eq!(config.max_vehicles, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExactConfig {
    pub max_customers: usize,
    pub max_vehicles: usize,
    pub max_stations: usize,
    /// Wall-clock limit for one backend solve. `None` waits indefinitely.
    pub time_limit: Option<Duration>,
    pub weights: ObjectiveWeights,
}

impl Default for ExactConfig {
    fn default() -> Self {
        Self {
            max_customers: 8,
            max_vehicles: 3,
            max_stations: 4,
            time_limit: Some(Duration::from_secs(180)),
            weights: ObjectiveWeights::default(),
        }
    }
}

impl ExactConfig {
    /// Sets the customer limit of the size guard.
    pub fn with_max_customers(mut self, n: usize) -> Self {
        self.max_customers = n;
        self
    }

    /// Sets the vehicle limit of the size guard.
    pub fn with_max_vehicles(mut self, n: usize) -> Self {
        self.max_vehicles = n;
        self
    }

    /// Sets the station limit of the size guard.
    pub fn with_max_stations(mut self, n: usize) -> Self {
        self.max_stations = n;
        self
    }

    /// Sets the wall-clock limit per backend solve.
    pub fn with_time_limit(mut self, limit: Option<Duration>) -> Self {
        self.time_limit = limit;
        self
    }

    /// Sets the objective weights.
    pub fn with_weights(mut self, weights: ObjectiveWeights) -> Self {
        self.weights = weights;
        self
    }
}

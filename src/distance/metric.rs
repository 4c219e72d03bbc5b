//! Coordinate metrics and checked distance/travel-time functions.

use serde::{Deserialize, Serialize};

use crate::error::{GvrpError, InputError};
use crate::models::Location;

/// Metric used to turn coordinates into travel distance.
///
/// Both metrics are symmetric and deterministic.
///
/// # Examples
///
/// ```
/// use u_gvrp::distance::DistanceMetric;
/// use u_gvrp::models::{Location, LocationId};
///
/// let a = Location::new(LocationId::Depot(0), 0.0, 0.0);
/// let b = Location::new(LocationId::Customer(1), 3.0, 4.0);
/// assert!((DistanceMetric::Euclidean.measure(&a, &b) - 5.0).abs() < 1e-10);
/// assert!((DistanceMetric::Manhattan.measure(&a, &b) - 7.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Straight-line distance.
    #[default]
    Euclidean,
    /// Rectilinear (grid) distance.
    Manhattan,
}

impl DistanceMetric {
    /// Distance between two locations. Assumes finite coordinates.
    pub fn measure(&self, a: &Location, b: &Location) -> f64 {
        let dx = a.x() - b.x();
        let dy = a.y() - b.y();
        match self {
            DistanceMetric::Euclidean => (dx * dx + dy * dy).sqrt(),
            DistanceMetric::Manhattan => dx.abs() + dy.abs(),
        }
    }

    /// Distance between two locations, rejecting non-finite coordinates.
    pub fn distance(&self, a: &Location, b: &Location) -> Result<f64, GvrpError> {
        check_finite(a)?;
        check_finite(b)?;
        Ok(self.measure(a, b))
    }

    /// Travel time between two locations at the given speed.
    pub fn travel_time(&self, a: &Location, b: &Location, speed: f64) -> Result<f64, GvrpError> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(InputError::InvalidSpeed { speed }.into());
        }
        Ok(self.distance(a, b)? / speed)
    }
}

/// Euclidean distance between two locations.
///
/// Fails only if either location has non-finite coordinates.
///
/// # Examples
///
/// ```
/// use u_gvrp::distance::distance;
/// use u_gvrp::models::{Location, LocationId};
///
/// let a = Location::new(LocationId::Depot(0), 0.0, 0.0);
/// let b = Location::new(LocationId::Customer(1), 6.0, 8.0);
/// assert_eq!(distance(&a, &b).unwrap(), 10.0);
///
/// let bad = Location::new(LocationId::Customer(2), f64::NAN, 0.0);
/// assert!(distance(&a, &bad).is_err());
/// ```
pub fn distance(a: &Location, b: &Location) -> Result<f64, GvrpError> {
    DistanceMetric::Euclidean.distance(a, b)
}

/// Euclidean travel time between two locations at `speed`.
pub fn travel_time(a: &Location, b: &Location, speed: f64) -> Result<f64, GvrpError> {
    DistanceMetric::Euclidean.travel_time(a, b, speed)
}

fn check_finite(loc: &Location) -> Result<(), GvrpError> {
    if loc.is_finite() {
        Ok(())
    } else {
        Err(InputError::NonFinitePoint {
            x: loc.x(),
            y: loc.y(),
        }
        .into())
    }
}

use serde::{Deserialize, Serialize};

use super::{effective_speed, ensure_compatible, ResourceModel};
use crate::error::GvrpError;
use crate::models::{Station, Vehicle, VehicleType};

/// Electric charging that slows down above a state-of-charge threshold.
///
/// Charging always ends at a full battery, so the last
/// `min(amount, range × (1 - threshold))` units are charged `slowdown`
/// times slower. Fuel refills behave like [`LinearResourceModel`].
///
/// [`LinearResourceModel`]: super::LinearResourceModel
///
/// # Examples
///
/// ```
/// use u_gvrp::models::{Station, StationKind, Vehicle, VehicleType};
/// use u_gvrp::resource::{LinearResourceModel, ResourceModel, TaperedChargingModel};
///
/// let ev = Vehicle::new(0, VehicleType::Electric, 100, 100.0);
/// let s = Station::new(0, 0.0, 0.0, StationKind::Standard);
/// let tapered = TaperedChargingModel::default();
///
/// let slow = tapered.replenish_time(&ev, &s, 50.0).unwrap();
/// let fast = LinearResourceModel.replenish_time(&ev, &s, 50.0).unwrap();
/// assert!(slow > fast);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaperedChargingModel {
    /// State of charge (0..1) above which charging slows.
    pub threshold: f64,
    /// Time multiplier above the threshold (≥ 1).
    pub slowdown: f64,
}

impl Default for TaperedChargingModel {
    fn default() -> Self {
        Self {
            threshold: 0.8,
            slowdown: 2.0,
        }
    }
}

impl TaperedChargingModel {
    /// Creates a model with the given threshold and slowdown.
    ///
    /// The threshold is clamped to `[0, 1]` and the slowdown to at least 1.
    pub fn new(threshold: f64, slowdown: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
            slowdown: slowdown.max(1.0),
        }
    }
}

impl ResourceModel for TaperedChargingModel {
    fn consumption(&self, _vehicle: &Vehicle, distance: f64) -> f64 {
        distance
    }

    fn replenish_time(
        &self,
        vehicle: &Vehicle,
        station: &Station,
        amount: f64,
    ) -> Result<f64, GvrpError> {
        ensure_compatible(vehicle, station)?;
        let amount = amount.max(0.0);
        let per_unit = vehicle.recharge_rate() / effective_speed(vehicle, station);
        if vehicle.vehicle_type() != VehicleType::Electric {
            return Ok(amount * per_unit);
        }
        let tail = amount.min(vehicle.max_range() * (1.0 - self.threshold));
        Ok(((amount - tail) + tail * self.slowdown) * per_unit)
    }
}

//! Energy and fuel consumption and replenishment rules.
//!
//! A [`ResourceModel`] decides how much range a leg consumes and how long a
//! station stop takes. [`LinearResourceModel`] is the default;
//! [`TaperedChargingModel`] slows electric charging near a full battery.

mod linear;
mod tapered;

pub use linear::LinearResourceModel;
pub use tapered::TaperedChargingModel;

use crate::error::GvrpError;
use crate::models::{Station, Vehicle, VehicleType};

/// Consumption and replenishment rules per vehicle type.
///
/// Implementations must be deterministic: evaluating the same leg or stop
/// twice yields the same value.
pub trait ResourceModel: Send + Sync {
    /// Range consumed by driving `distance`. Must not decrease as
    /// `distance` grows.
    fn consumption(&self, vehicle: &Vehicle, distance: f64) -> f64;

    /// Time to replenish `amount` range units at `station`, ending full.
    ///
    /// Fails with [`GvrpError::IncompatibleStation`] when the station does
    /// not serve the vehicle's type.
    fn replenish_time(
        &self,
        vehicle: &Vehicle,
        station: &Station,
        amount: f64,
    ) -> Result<f64, GvrpError>;

    /// Emissions produced by driving `distance`.
    fn emissions(&self, vehicle: &Vehicle, distance: f64) -> f64 {
        vehicle.emission_rate() * distance
    }
}

/// Replenishment speed the station actually delivers to this vehicle.
///
/// Electric vehicles are capped by their charge port, if any.
pub fn effective_speed(vehicle: &Vehicle, station: &Station) -> f64 {
    let factor = station.speed_factor();
    match (vehicle.vehicle_type(), vehicle.port()) {
        (VehicleType::Electric, Some(port)) => factor.min(port.max_speed_factor()),
        _ => factor,
    }
}

pub(crate) fn ensure_compatible(vehicle: &Vehicle, station: &Station) -> Result<(), GvrpError> {
    if station.serves(vehicle.vehicle_type()) {
        Ok(())
    } else {
        Err(GvrpError::IncompatibleStation {
            vehicle_id: vehicle.id(),
            vehicle_type: vehicle.vehicle_type(),
            station_id: station.id(),
            kind: station.kind(),
        })
    }
}

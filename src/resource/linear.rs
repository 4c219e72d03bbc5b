use super::{effective_speed, ensure_compatible, ResourceModel};
use crate::error::GvrpError;
use crate::models::{Station, Vehicle};

/// One range unit per distance unit; replenishment time linear in amount.
///
/// `time = amount × recharge_rate / effective_speed`.
///
/// # Examples
///
/// ```
/// use u_gvrp::models::{Station, StationKind, Vehicle, VehicleType};
/// use u_gvrp::resource::{LinearResourceModel, ResourceModel};
///
/// let ev = Vehicle::new(0, VehicleType::Electric, 100, 200.0).with_recharge_rate(0.5);
/// let fast = Station::new(0, 0.0, 0.0, StationKind::Fast);
/// let model = LinearResourceModel;
///
/// assert_eq!(model.consumption(&ev, 30.0), 30.0);
/// // 40 units at 0.5 time/unit, twice as fast
/// assert!((model.replenish_time(&ev, &fast, 40.0).unwrap() - 10.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinearResourceModel;

impl ResourceModel for LinearResourceModel {
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
        Ok(amount.max(0.0) * vehicle.recharge_rate() / effective_speed(vehicle, station))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{StationKind, VehicleType};

    #[test]
    fn test_fuel_refill_time() {
        let truck = Vehicle::new(0, VehicleType::Fossil, 100, 500.0).with_recharge_rate(0.1);
        let pump = Station::new(0, 0.0, 0.0, StationKind::Fuel);
        let t = LinearResourceModel
            .replenish_time(&truck, &pump, 300.0)
            .expect("compatible");
        assert!((t - 30.0).abs() < 1e-10);
    }

    #[test]
    fn test_incompatible_station_rejected() {
        let truck = Vehicle::new(3, VehicleType::Fossil, 100, 500.0);
        let charger = Station::new(8, 0.0, 0.0, StationKind::Super);
        let err = LinearResourceModel
            .replenish_time(&truck, &charger, 10.0)
            .expect_err("fossil at charger");
        assert!(matches!(
            err,
            GvrpError::IncompatibleStation {
                vehicle_id: 3,
                station_id: 8,
                ..
            }
        ));
    }

    #[test]
    fn test_zero_amount_is_free() {
        let ev = Vehicle::new(0, VehicleType::Electric, 10, 50.0).with_recharge_rate(2.0);
        let s = Station::new(0, 0.0, 0.0, StationKind::Standard);
        assert_eq!(LinearResourceModel.replenish_time(&ev, &s, 0.0).expect("ok"), 0.0);
    }
}

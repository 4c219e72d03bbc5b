//! Vehicle type with capacity, range, and emission parameters.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Propulsion type of a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    /// Battery electric; replenishes at charging stations.
    Electric,
    /// Combustion engine; replenishes at fuel stations.
    Fossil,
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleType::Electric => f.write_str("electric"),
            VehicleType::Fossil => f.write_str("fossil"),
        }
    }
}

/// Charging port fitted to an electric vehicle.
///
/// The port caps the speed factor a charging station can deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargePort {
    /// Standard port (speed factor 1).
    Standard,
    /// Fast-charge port (speed factor up to 2).
    Fast,
    /// Super-charge port (speed factor up to 4).
    Super,
}

impl ChargePort {
    /// Highest station speed factor this port accepts.
    pub fn max_speed_factor(&self) -> f64 {
        match self {
            ChargePort::Standard => 1.0,
            ChargePort::Fast => 2.0,
            ChargePort::Super => 4.0,
        }
    }
}

/// A vehicle that services at most one route per optimization run.
///
/// Range is measured in distance units on a full charge or tank; the
/// recharge rate is the time needed to replenish one unit of range at a
/// station with speed factor 1.
///
/// # Examples
///
/// ```
/// use u_gvrp::models::{Vehicle, VehicleType};
///
/// let v = Vehicle::new(0, VehicleType::Electric, 200, 150.0)
///     .with_recharge_rate(0.5)
///     .with_depot(3);
/// assert_eq!(v.id(), 0);
/// assert_eq!(v.capacity(), 200);
/// assert_eq!(v.max_range(), 150.0);
/// assert_eq!(v.depot_id(), 3);
/// assert_eq!(v.emission_rate(), 0.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vehicle {
    id: usize,
    vehicle_type: VehicleType,
    capacity: i32,
    max_range: f64,
    recharge_rate: f64,
    emission_rate: f64,
    depot_id: usize,
    speed: f64,
    port: Option<ChargePort>,
}

impl Vehicle {
    /// Creates a vehicle with the given type, capacity, and range.
    ///
    /// Default: depot 0, recharge rate 1.0, zero emissions, speed 1.0,
    /// no charge port limit.
    pub fn new(id: usize, vehicle_type: VehicleType, capacity: i32, max_range: f64) -> Self {
        Self {
            id,
            vehicle_type,
            capacity,
            max_range,
            recharge_rate: 1.0,
            emission_rate: 0.0,
            depot_id: 0,
            speed: 1.0,
            port: None,
        }
    }

    /// Sets the depot this vehicle starts and ends at.
    pub fn with_depot(mut self, depot_id: usize) -> Self {
        self.depot_id = depot_id;
        self
    }

    /// Sets time per unit of range replenished.
    pub fn with_recharge_rate(mut self, rate: f64) -> Self {
        self.recharge_rate = rate;
        self
    }

    /// Sets emission units per distance unit.
    pub fn with_emission_rate(mut self, rate: f64) -> Self {
        self.emission_rate = rate;
        self
    }

    /// Sets travel speed (distance units per time unit).
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    /// Sets the charging port.
    pub fn with_port(mut self, port: ChargePort) -> Self {
        self.port = Some(port);
        self
    }

    /// Vehicle ID.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Propulsion type.
    pub fn vehicle_type(&self) -> VehicleType {
        self.vehicle_type
    }

    /// Maximum load capacity.
    pub fn capacity(&self) -> i32 {
        self.capacity
    }

    /// Range on a full charge or tank.
    pub fn max_range(&self) -> f64 {
        self.max_range
    }

    /// Time per unit of range replenished.
    pub fn recharge_rate(&self) -> f64 {
        self.recharge_rate
    }

    /// Emission units per distance unit.
    pub fn emission_rate(&self) -> f64 {
        self.emission_rate
    }

    /// Depot ID (start and end of route).
    pub fn depot_id(&self) -> usize {
        self.depot_id
    }

    /// Travel speed.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Charging port, if any.
    pub fn port(&self) -> Option<ChargePort> {
        self.port
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicle_new() {
        let v = Vehicle::new(0, VehicleType::Fossil, 200, 300.0);
        assert_eq!(v.id(), 0);
        assert_eq!(v.vehicle_type(), VehicleType::Fossil);
        assert_eq!(v.capacity(), 200);
        assert_eq!(v.depot_id(), 0);
        assert_eq!(v.recharge_rate(), 1.0);
        assert_eq!(v.emission_rate(), 0.0);
        assert_eq!(v.speed(), 1.0);
        assert!(v.port().is_none());
    }

    #[test]
    fn test_vehicle_builder() {
        let v = Vehicle::new(1, VehicleType::Electric, 100, 80.0)
            .with_depot(2)
            .with_recharge_rate(0.25)
            .with_emission_rate(0.01)
            .with_speed(30.0)
            .with_port(ChargePort::Fast);
        assert_eq!(v.depot_id(), 2);
        assert_eq!(v.recharge_rate(), 0.25);
        assert_eq!(v.emission_rate(), 0.01);
        assert_eq!(v.speed(), 30.0);
        assert_eq!(v.port(), Some(ChargePort::Fast));
    }

    #[test]
    fn test_port_caps() {
        assert_eq!(ChargePort::Standard.max_speed_factor(), 1.0);
        assert_eq!(ChargePort::Fast.max_speed_factor(), 2.0);
        assert_eq!(ChargePort::Super.max_speed_factor(), 4.0);
    }
}

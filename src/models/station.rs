//! Charging and fuel stations.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Location, LocationId, VehicleType};

/// Kind of replenishment a station offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StationKind {
    /// Standard AC charging.
    Standard,
    /// Fast DC charging.
    Fast,
    /// Super charging.
    Super,
    /// Fuel pump.
    Fuel,
}

impl StationKind {
    /// Default replenishment speed factor for this kind.
    pub fn default_speed_factor(&self) -> f64 {
        match self {
            StationKind::Standard => 1.0,
            StationKind::Fast => 2.0,
            StationKind::Super => 4.0,
            StationKind::Fuel => 1.0,
        }
    }

    /// Vehicle types this kind serves unless overridden.
    pub fn default_compatibility(&self) -> &'static [VehicleType] {
        match self {
            StationKind::Fuel => &[VehicleType::Fossil],
            _ => &[VehicleType::Electric],
        }
    }
}

impl fmt::Display for StationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StationKind::Standard => "standard",
            StationKind::Fast => "fast",
            StationKind::Super => "super",
            StationKind::Fuel => "fuel",
        };
        f.write_str(name)
    }
}

/// A charging or fuel station.
///
/// A visit replenishes the vehicle to its full range. The speed factor
/// divides the vehicle's recharge rate, so a factor of 2 halves the time.
///
/// # Examples
///
/// ```
/// use u_gvrp::models::{Station, StationKind, VehicleType};
///
/// let s = Station::new(1, 5.0, 5.0, StationKind::Fast);
/// assert!(s.serves(VehicleType::Electric));
/// assert!(!s.serves(VehicleType::Fossil));
/// assert_eq!(s.speed_factor(), 2.0);
///
/// let shared = Station::new(2, 0.0, 0.0, StationKind::Standard)
///     .with_compatibility(&[VehicleType::Electric, VehicleType::Fossil]);
/// assert!(shared.serves(VehicleType::Fossil));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Station {
    id: usize,
    location: Location,
    kind: StationKind,
    compatible: Vec<VehicleType>,
    speed_factor: f64,
}

impl Station {
    /// Creates a station with the default compatibility and speed of `kind`.
    pub fn new(id: usize, x: f64, y: f64, kind: StationKind) -> Self {
        Self {
            id,
            location: Location::new(LocationId::Station(id), x, y),
            kind,
            compatible: kind.default_compatibility().to_vec(),
            speed_factor: kind.default_speed_factor(),
        }
    }

    /// Overrides the vehicle types this station serves.
    pub fn with_compatibility(mut self, types: &[VehicleType]) -> Self {
        let mut compatible = types.to_vec();
        compatible.sort();
        compatible.dedup();
        self.compatible = compatible;
        self
    }

    /// Overrides the replenishment speed factor.
    pub fn with_speed_factor(mut self, factor: f64) -> Self {
        self.speed_factor = factor;
        self
    }

    /// Station ID.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Station location.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Station kind.
    pub fn kind(&self) -> StationKind {
        self.kind
    }

    /// Vehicle types this station serves.
    pub fn compatible_types(&self) -> &[VehicleType] {
        &self.compatible
    }

    /// Replenishment speed factor.
    pub fn speed_factor(&self) -> f64 {
        self.speed_factor
    }

    /// Returns `true` if this station can replenish the given vehicle type.
    pub fn serves(&self, vehicle_type: VehicleType) -> bool {
        self.compatible.contains(&vehicle_type)
    }
}

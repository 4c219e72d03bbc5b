//! Error taxonomy for model construction, evaluation, and solving.

use std::fmt;

use thiserror::Error;

use crate::models::{StationKind, VehicleType};

/// Kind of entity referenced by an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A depot.
    Depot,
    /// A customer.
    Customer,
    /// A charging or fuel station.
    Station,
    /// A vehicle.
    Vehicle,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Depot => "depot",
            EntityKind::Customer => "customer",
            EntityKind::Station => "station",
            EntityKind::Vehicle => "vehicle",
        };
        f.write_str(name)
    }
}

/// Malformed input detected while building a problem snapshot.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("{kind} {id} has non-finite coordinates ({x}, {y})")]
    NonFiniteCoordinate {
        kind: EntityKind,
        id: usize,
        x: f64,
        y: f64,
    },

    #[error("customer {customer_id} has negative demand {demand}")]
    NegativeDemand { customer_id: usize, demand: i32 },

    #[error("vehicle {vehicle_id} has negative capacity {capacity}")]
    NegativeCapacity { vehicle_id: usize, capacity: i32 },

    #[error("{kind} {id} has invalid {field} {value}: must be finite and positive")]
    NonPositive {
        kind: EntityKind,
        id: usize,
        field: &'static str,
        value: f64,
    },

    #[error("{kind} {id} has invalid {field} {value}: must be finite and non-negative")]
    NegativeRate {
        kind: EntityKind,
        id: usize,
        field: &'static str,
        value: f64,
    },

    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: EntityKind, id: usize },

    #[error("vehicle {vehicle_id} is bound to unknown depot {depot_id}")]
    UnknownDepot { vehicle_id: usize, depot_id: usize },

    #[error("{vehicles} vehicles supplied but no depot to bind them to")]
    NoDepots { vehicles: usize },

    #[error("travel speed {speed} must be finite and positive")]
    InvalidSpeed { speed: f64 },

    #[error("coordinates ({x}, {y}) are not finite")]
    NonFinitePoint { x: f64, y: f64 },
}

/// Errors surfaced by the optimization core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GvrpError {
    #[error("station {station_id} ({kind}) cannot serve {vehicle_type} vehicle {vehicle_id}")]
    IncompatibleStation {
        vehicle_id: usize,
        vehicle_type: VehicleType,
        station_id: usize,
        kind: StationKind,
    },

    #[error("no remaining vehicle can feasibly serve customers {customer_ids:?} (fleet of {fleet_size})")]
    CapacityExhausted {
        customer_ids: Vec<usize>,
        fleet_size: usize,
    },

    #[error("exact model is infeasible: {reason}")]
    InfeasibleModel { reason: String },

    #[error(
        "instance too large for the exact solver: {customers} customers, {vehicles} vehicles, \
         {stations} stations (limits {max_customers}/{max_vehicles}/{max_stations})"
    )]
    InstanceTooLarge {
        customers: usize,
        vehicles: usize,
        stations: usize,
        max_customers: usize,
        max_vehicles: usize,
        max_stations: usize,
    },

    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),

    #[error("unknown {kind} id {id}")]
    UnknownEntity { kind: EntityKind, id: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("MILP backend failed: {0}")]
    Backend(String),
}

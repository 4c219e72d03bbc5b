//! Serde input records at the ingestion boundary.
//!
//! External loaders (CSV, JSON, generators) produce a [`ProblemInput`];
//! [`ProblemInput::into_problem`] turns it into a validated [`GvrpProblem`].

use serde::{Deserialize, Serialize};

use super::{
    ChargePort, Customer, Depot, GvrpProblem, Station, StationKind, Vehicle, VehicleType,
};
use crate::distance::DistanceMetric;
use crate::error::{GvrpError, InputError};

/// A vehicle as supplied by an external loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecord {
    pub id: usize,
    pub vehicle_type: VehicleType,
    pub capacity: i32,
    pub range: f64,
    pub recharge_rate: f64,
    #[serde(default)]
    pub emission_rate: f64,
    /// Bound depot. Unbound vehicles are assigned round-robin.
    #[serde(default)]
    pub depot_id: Option<usize>,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub port: Option<ChargePort>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepotRecord {
    pub id: usize,
    pub x: f64,
    pub y: f64,
}

/// A charging or fuel station record.
///
/// `station_type` defaults to `standard` in the charging list and to `fuel`
/// in the fuel list. An empty `compatible_vehicle_types` falls back to the
/// kind's default compatibility, and `rate` overrides its speed factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationRecord {
    pub id: usize,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub station_type: Option<StationKind>,
    #[serde(default)]
    pub compatible_vehicle_types: Vec<VehicleType>,
    #[serde(default)]
    pub rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub id: usize,
    pub x: f64,
    pub y: f64,
    pub demand: i32,
}

/// Complete problem input as loaded from an external source.
///
/// # Examples
///
/// ```
/// use u_gvrp::models::{DepotRecord, CustomerRecord, ProblemInput, VehicleRecord, VehicleType};
///
/// let input = ProblemInput {
///     vehicles: vec![VehicleRecord {
///         id: 0,
///         vehicle_type: VehicleType::Fossil,
///         capacity: 100,
///         range: 500.0,
///         recharge_rate: 0.1,
///         emission_rate: 0.2,
///         depot_id: None,
///         speed: None,
///         port: None,
///     }],
///     depots: vec![DepotRecord { id: 0, x: 0.0, y: 0.0 }],
///     charging_stations: vec![],
///     fuel_stations: vec![],
///     customers: vec![CustomerRecord { id: 1, x: 3.0, y: 4.0, demand: 7 }],
/// };
/// let problem = input.into_problem().unwrap();
/// assert_eq!(problem.num_vehicles(), 1);
/// assert_eq!(problem.vehicles()[0].depot_id(), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProblemInput {
    pub vehicles: Vec<VehicleRecord>,
    pub depots: Vec<DepotRecord>,
    pub charging_stations: Vec<StationRecord>,
    pub fuel_stations: Vec<StationRecord>,
    pub customers: Vec<CustomerRecord>,
}

impl ProblemInput {
    /// Validates the records and builds a Euclidean problem snapshot.
    pub fn into_problem(self) -> Result<GvrpProblem, GvrpError> {
        self.into_problem_with_metric(DistanceMetric::Euclidean)
    }

    /// Validates the records and builds a problem with the given metric.
    ///
    /// Vehicles without a depot are bound round-robin to depots in
    /// ascending id order, visiting vehicles in ascending id order.
    pub fn into_problem_with_metric(
        self,
        metric: DistanceMetric,
    ) -> Result<GvrpProblem, GvrpError> {
        let mut depot_ids: Vec<usize> = self.depots.iter().map(|d| d.id).collect();
        depot_ids.sort_unstable();

        let mut records = self.vehicles;
        records.sort_by_key(|r| r.id);
        let fleet = records.len();
        let mut next_depot = 0;
        let mut vehicles = Vec::with_capacity(records.len());
        for r in records {
            let depot_id = match r.depot_id {
                Some(id) => id,
                None => {
                    if depot_ids.is_empty() {
                        return Err(InputError::NoDepots { vehicles: fleet }.into());
                    }
                    let id = depot_ids[next_depot % depot_ids.len()];
                    next_depot += 1;
                    id
                }
            };
            let mut v = Vehicle::new(r.id, r.vehicle_type, r.capacity, r.range)
                .with_depot(depot_id)
                .with_recharge_rate(r.recharge_rate)
                .with_emission_rate(r.emission_rate);
            if let Some(speed) = r.speed {
                v = v.with_speed(speed);
            }
            if let Some(port) = r.port {
                v = v.with_port(port);
            }
            vehicles.push(v);
        }

        let depots = self
            .depots
            .iter()
            .map(|d| Depot::new(d.id, d.x, d.y))
            .collect();
        let customers = self
            .customers
            .iter()
            .map(|c| Customer::new(c.id, c.x, c.y, c.demand))
            .collect();
        let stations = self
            .charging_stations
            .iter()
            .map(|s| station_from_record(s, StationKind::Standard))
            .chain(
                self.fuel_stations
                    .iter()
                    .map(|s| station_from_record(s, StationKind::Fuel)),
            )
            .collect();

        GvrpProblem::with_metric(depots, customers, stations, vehicles, metric)
    }
}

fn station_from_record(record: &StationRecord, default_kind: StationKind) -> Station {
    let kind = record.station_type.unwrap_or(default_kind);
    let mut station = Station::new(record.id, record.x, record.y, kind);
    if !record.compatible_vehicle_types.is_empty() {
        station = station.with_compatibility(&record.compatible_vehicle_types);
    }
    if let Some(rate) = record.rate {
        station = station.with_speed_factor(rate);
    }
    station
}

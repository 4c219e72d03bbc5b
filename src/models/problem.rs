//! Validated, immutable problem snapshot.

use std::collections::HashMap;

use super::{Customer, Depot, Location, LocationId, Station, Stop, Vehicle, VehicleType};
use crate::distance::{DistanceMatrix, DistanceMetric};
use crate::error::{EntityKind, GvrpError, InputError};

/// A GVRP instance: validated entities plus a precomputed distance matrix.
///
/// Entities are sorted by id on construction. Matrix nodes are laid out as
/// depots first, then customers, then stations, each block in id order.
/// Solvers address entities through this snapshot and never mutate it.
///
/// # Examples
///
/// ```
/// use u_gvrp::models::{Customer, Depot, GvrpProblem, Station, StationKind, Vehicle, VehicleType};
///
/// let problem = GvrpProblem::new(
///     vec![Depot::new(0, 0.0, 0.0)],
///     vec![Customer::new(1, 3.0, 4.0, 10)],
///     vec![Station::new(0, 6.0, 8.0, StationKind::Fast)],
///     vec![Vehicle::new(0, VehicleType::Electric, 100, 50.0)],
/// )
/// .unwrap();
///
/// assert_eq!(problem.num_customers(), 1);
/// let depot = problem.depot_node(0);
/// let customer = problem.customer_node(0);
/// assert!((problem.distance(depot, customer) - 5.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct GvrpProblem {
    depots: Vec<Depot>,
    customers: Vec<Customer>,
    stations: Vec<Station>,
    vehicles: Vec<Vehicle>,
    metric: DistanceMetric,
    matrix: DistanceMatrix,
    depot_index: HashMap<usize, usize>,
    customer_index: HashMap<usize, usize>,
    station_index: HashMap<usize, usize>,
    vehicle_index: HashMap<usize, usize>,
    vehicle_depot: Vec<usize>,
    electric_stations: Vec<usize>,
    fossil_stations: Vec<usize>,
}

impl GvrpProblem {
    /// Builds a Euclidean problem from its entities.
    pub fn new(
        depots: Vec<Depot>,
        customers: Vec<Customer>,
        stations: Vec<Station>,
        vehicles: Vec<Vehicle>,
    ) -> Result<Self, GvrpError> {
        Self::with_metric(depots, customers, stations, vehicles, DistanceMetric::Euclidean)
    }

    /// Builds a problem with an explicit distance metric.
    ///
    /// Fails with [`GvrpError::InvalidInput`] on malformed entities.
    pub fn with_metric(
        mut depots: Vec<Depot>,
        mut customers: Vec<Customer>,
        mut stations: Vec<Station>,
        mut vehicles: Vec<Vehicle>,
        metric: DistanceMetric,
    ) -> Result<Self, GvrpError> {
        depots.sort_by_key(Depot::id);
        customers.sort_by_key(Customer::id);
        stations.sort_by_key(Station::id);
        vehicles.sort_by_key(Vehicle::id);

        for d in &depots {
            check_location(EntityKind::Depot, d.id(), d.location())?;
        }
        for c in &customers {
            check_location(EntityKind::Customer, c.id(), c.location())?;
            if c.demand() < 0 {
                return Err(InputError::NegativeDemand {
                    customer_id: c.id(),
                    demand: c.demand(),
                }
                .into());
            }
        }
        for s in &stations {
            check_location(EntityKind::Station, s.id(), s.location())?;
            check_positive(EntityKind::Station, s.id(), "speed factor", s.speed_factor())?;
        }
        for v in &vehicles {
            validate_vehicle(v)?;
        }

        let depot_index = index_by_id(EntityKind::Depot, depots.iter().map(Depot::id))?;
        let customer_index = index_by_id(EntityKind::Customer, customers.iter().map(Customer::id))?;
        let station_index = index_by_id(EntityKind::Station, stations.iter().map(Station::id))?;
        let vehicle_index = index_by_id(EntityKind::Vehicle, vehicles.iter().map(Vehicle::id))?;

        if depots.is_empty() && !vehicles.is_empty() {
            return Err(InputError::NoDepots {
                vehicles: vehicles.len(),
            }
            .into());
        }
        let vehicle_depot = vehicles
            .iter()
            .map(|v| {
                depot_index
                    .get(&v.depot_id())
                    .copied()
                    .ok_or(InputError::UnknownDepot {
                        vehicle_id: v.id(),
                        depot_id: v.depot_id(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let locations: Vec<Location> = depots
            .iter()
            .map(|d| *d.location())
            .chain(customers.iter().map(|c| *c.location()))
            .chain(stations.iter().map(|s| *s.location()))
            .collect();
        let matrix = DistanceMatrix::from_locations(&locations, metric);

        let compatible = |t: VehicleType| {
            stations
                .iter()
                .enumerate()
                .filter(|(_, s)| s.serves(t))
                .map(|(i, _)| i)
                .collect::<Vec<_>>()
        };
        let electric_stations = compatible(VehicleType::Electric);
        let fossil_stations = compatible(VehicleType::Fossil);

        Ok(Self {
            depots,
            customers,
            stations,
            vehicles,
            metric,
            matrix,
            depot_index,
            customer_index,
            station_index,
            vehicle_index,
            vehicle_depot,
            electric_stations,
            fossil_stations,
        })
    }

    /// Depots in id order.
    pub fn depots(&self) -> &[Depot] {
        &self.depots
    }

    /// Customers in id order.
    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    /// Stations in id order.
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// Vehicles in id order.
    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    /// Metric the matrix was built with.
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// The node distance matrix.
    pub fn matrix(&self) -> &DistanceMatrix {
        &self.matrix
    }

    /// Number of customers.
    pub fn num_customers(&self) -> usize {
        self.customers.len()
    }

    /// Number of vehicles.
    pub fn num_vehicles(&self) -> usize {
        self.vehicles.len()
    }

    /// Number of charging and fuel stations.
    pub fn num_stations(&self) -> usize {
        self.stations.len()
    }

    /// Position of a customer id in [`customers`](Self::customers).
    pub fn customer_index(&self, id: usize) -> Result<usize, GvrpError> {
        lookup(&self.customer_index, EntityKind::Customer, id)
    }

    /// Position of a station id in [`stations`](Self::stations).
    pub fn station_index(&self, id: usize) -> Result<usize, GvrpError> {
        lookup(&self.station_index, EntityKind::Station, id)
    }

    /// Position of a vehicle id in [`vehicles`](Self::vehicles).
    pub fn vehicle_index(&self, id: usize) -> Result<usize, GvrpError> {
        lookup(&self.vehicle_index, EntityKind::Vehicle, id)
    }

    /// Position of a depot id in [`depots`](Self::depots).
    pub fn depot_index(&self, id: usize) -> Result<usize, GvrpError> {
        lookup(&self.depot_index, EntityKind::Depot, id)
    }

    /// Looks up a vehicle by id.
    pub fn vehicle(&self, id: usize) -> Result<&Vehicle, GvrpError> {
        Ok(&self.vehicles[self.vehicle_index(id)?])
    }

    /// Looks up a customer by id.
    pub fn customer(&self, id: usize) -> Result<&Customer, GvrpError> {
        Ok(&self.customers[self.customer_index(id)?])
    }

    /// Looks up a station by id.
    pub fn station(&self, id: usize) -> Result<&Station, GvrpError> {
        Ok(&self.stations[self.station_index(id)?])
    }

    /// Matrix node of the depot at index `idx`.
    pub fn depot_node(&self, idx: usize) -> usize {
        idx
    }

    /// Matrix node of the customer at index `idx`.
    pub fn customer_node(&self, idx: usize) -> usize {
        self.depots.len() + idx
    }

    /// Matrix node of the station at index `idx`.
    pub fn station_node(&self, idx: usize) -> usize {
        self.depots.len() + self.customers.len() + idx
    }

    /// Depot node of the vehicle at index `vehicle_idx`.
    pub fn vehicle_depot_node(&self, vehicle_idx: usize) -> usize {
        self.depot_node(self.vehicle_depot[vehicle_idx])
    }

    /// Matrix node of a route stop.
    pub fn stop_node(&self, stop: Stop) -> Result<usize, GvrpError> {
        match stop {
            Stop::Customer(id) => Ok(self.customer_node(self.customer_index(id)?)),
            Stop::Station(id) => Ok(self.station_node(self.station_index(id)?)),
        }
    }

    /// Identifier of the entity at a matrix node.
    pub fn node_location_id(&self, node: usize) -> LocationId {
        let d = self.depots.len();
        let c = self.customers.len();
        if node < d {
            LocationId::Depot(self.depots[node].id())
        } else if node < d + c {
            LocationId::Customer(self.customers[node - d].id())
        } else {
            LocationId::Station(self.stations[node - d - c].id())
        }
    }

    /// Distance between two matrix nodes.
    pub fn distance(&self, from: usize, to: usize) -> f64 {
        self.matrix.get(from, to)
    }

    /// Index of the station serving `vehicle_type` nearest to matrix node
    /// `node`, excluding a station at `node` itself.
    pub fn nearest_station(&self, node: usize, vehicle_type: VehicleType) -> Option<usize> {
        let candidates: Vec<usize> = self
            .compatible_stations(vehicle_type)
            .iter()
            .map(|&s| self.station_node(s))
            .filter(|&n| n != node)
            .collect();
        self.matrix
            .nearest_neighbor(node, &candidates)
            .map(|n| n - self.depots.len() - self.customers.len())
    }

    /// Indices of stations that serve the given vehicle type, in id order.
    pub fn compatible_stations(&self, vehicle_type: VehicleType) -> &[usize] {
        match vehicle_type {
            VehicleType::Electric => &self.electric_stations,
            VehicleType::Fossil => &self.fossil_stations,
        }
    }
}

fn check_location(kind: EntityKind, id: usize, loc: &Location) -> Result<(), InputError> {
    if loc.is_finite() {
        Ok(())
    } else {
        Err(InputError::NonFiniteCoordinate {
            kind,
            id,
            x: loc.x(),
            y: loc.y(),
        })
    }
}

fn check_positive(
    kind: EntityKind,
    id: usize,
    field: &'static str,
    value: f64,
) -> Result<(), InputError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(InputError::NonPositive {
            kind,
            id,
            field,
            value,
        })
    }
}

fn check_rate(id: usize, field: &'static str, value: f64) -> Result<(), InputError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(InputError::NegativeRate {
            kind: EntityKind::Vehicle,
            id,
            field,
            value,
        })
    }
}

fn validate_vehicle(v: &Vehicle) -> Result<(), InputError> {
    if v.capacity() < 0 {
        return Err(InputError::NegativeCapacity {
            vehicle_id: v.id(),
            capacity: v.capacity(),
        });
    }
    check_positive(EntityKind::Vehicle, v.id(), "range", v.max_range())?;
    check_positive(EntityKind::Vehicle, v.id(), "speed", v.speed())?;
    check_rate(v.id(), "recharge rate", v.recharge_rate())?;
    check_rate(v.id(), "emission rate", v.emission_rate())
}

fn index_by_id(
    kind: EntityKind,
    ids: impl Iterator<Item = usize>,
) -> Result<HashMap<usize, usize>, InputError> {
    let mut index = HashMap::new();
    for (i, id) in ids.enumerate() {
        if index.insert(id, i).is_some() {
            return Err(InputError::DuplicateId { kind, id });
        }
    }
    Ok(index)
}

fn lookup(map: &HashMap<usize, usize>, kind: EntityKind, id: usize) -> Result<usize, GvrpError> {
    map.get(&id)
        .copied()
        .ok_or(GvrpError::UnknownEntity { kind, id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StationKind;

    fn sample() -> GvrpProblem {
        GvrpProblem::new(
            vec![Depot::new(1, 10.0, 0.0), Depot::new(0, 0.0, 0.0)],
            vec![Customer::new(5, 3.0, 4.0, 10), Customer::new(2, 0.0, 8.0, 5)],
            vec![
                Station::new(7, 6.0, 8.0, StationKind::Fuel),
                Station::new(3, 0.0, 4.0, StationKind::Standard),
            ],
            vec![
                Vehicle::new(0, VehicleType::Electric, 50, 30.0),
                Vehicle::new(1, VehicleType::Fossil, 50, 30.0).with_depot(1),
            ],
        )
        .expect("valid problem")
    }

    #[test]
    fn test_node_layout_sorted_by_id() {
        let p = sample();
        assert_eq!(p.node_location_id(0), LocationId::Depot(0));
        assert_eq!(p.node_location_id(1), LocationId::Depot(1));
        assert_eq!(p.node_location_id(2), LocationId::Customer(2));
        assert_eq!(p.node_location_id(3), LocationId::Customer(5));
        assert_eq!(p.node_location_id(4), LocationId::Station(3));
        assert_eq!(p.node_location_id(5), LocationId::Station(7));
        assert_eq!(p.matrix().size(), 6);
    }

    #[test]
    fn test_stop_node_and_distance() {
        let p = sample();
        let c5 = p.stop_node(Stop::Customer(5)).expect("known");
        assert_eq!(c5, 3);
        assert!((p.distance(p.depot_node(0), c5) - 5.0).abs() < 1e-10);
        assert!(p.stop_node(Stop::Customer(99)).is_err());
    }

    #[test]
    fn test_vehicle_depot_binding() {
        let p = sample();
        assert_eq!(p.vehicle_depot_node(0), 0);
        assert_eq!(p.vehicle_depot_node(1), 1);
    }

    #[test]
    fn test_compatible_stations() {
        let p = sample();
        assert_eq!(p.compatible_stations(VehicleType::Electric), &[0]);
        assert_eq!(p.compatible_stations(VehicleType::Fossil), &[1]);
    }

    #[test]
    fn test_nearest_station_skips_own_node() {
        let p = sample();
        assert_eq!(p.nearest_station(0, VehicleType::Electric), Some(0));
        assert_eq!(p.nearest_station(0, VehicleType::Fossil), Some(1));
        assert_eq!(p.nearest_station(p.station_node(0), VehicleType::Electric), None);
    }

    #[test]
    fn test_rejects_negative_demand() {
        let err = GvrpProblem::new(
            vec![Depot::new(0, 0.0, 0.0)],
            vec![Customer::new(1, 1.0, 1.0, -3)],
            vec![],
            vec![],
        )
        .expect_err("negative demand");
        assert!(matches!(
            err,
            GvrpError::InvalidInput(InputError::NegativeDemand { customer_id: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let err = GvrpProblem::new(
            vec![Depot::new(0, 0.0, 0.0)],
            vec![Customer::new(1, 1.0, 1.0, 1), Customer::new(1, 2.0, 2.0, 1)],
            vec![],
            vec![],
        )
        .expect_err("duplicate");
        assert!(matches!(
            err,
            GvrpError::InvalidInput(InputError::DuplicateId {
                kind: EntityKind::Customer,
                id: 1
            })
        ));
    }

    #[test]
    fn test_rejects_bad_vehicle_fields() {
        let depots = || vec![Depot::new(0, 0.0, 0.0)];
        let zero_range = GvrpProblem::new(
            depots(),
            vec![],
            vec![],
            vec![Vehicle::new(0, VehicleType::Electric, 10, 0.0)],
        );
        assert!(zero_range.is_err());

        let neg_cap = GvrpProblem::new(
            depots(),
            vec![],
            vec![],
            vec![Vehicle::new(0, VehicleType::Electric, -1, 10.0)],
        );
        assert!(matches!(
            neg_cap,
            Err(GvrpError::InvalidInput(InputError::NegativeCapacity { .. }))
        ));

        let neg_rate = GvrpProblem::new(
            depots(),
            vec![],
            vec![],
            vec![Vehicle::new(0, VehicleType::Fossil, 10, 10.0).with_emission_rate(-0.5)],
        );
        assert!(matches!(
            neg_rate,
            Err(GvrpError::InvalidInput(InputError::NegativeRate { .. }))
        ));
    }

    #[test]
    fn test_rejects_unknown_depot_and_no_depots() {
        let unknown = GvrpProblem::new(
            vec![Depot::new(0, 0.0, 0.0)],
            vec![],
            vec![],
            vec![Vehicle::new(0, VehicleType::Electric, 10, 10.0).with_depot(4)],
        );
        assert!(matches!(
            unknown,
            Err(GvrpError::InvalidInput(InputError::UnknownDepot {
                vehicle_id: 0,
                depot_id: 4
            }))
        ));

        let none = GvrpProblem::new(
            vec![],
            vec![],
            vec![],
            vec![Vehicle::new(0, VehicleType::Electric, 10, 10.0)],
        );
        assert!(matches!(
            none,
            Err(GvrpError::InvalidInput(InputError::NoDepots { vehicles: 1 }))
        ));
    }

    #[test]
    fn test_rejects_non_finite_coordinates() {
        let err = GvrpProblem::new(
            vec![Depot::new(0, f64::NAN, 0.0)],
            vec![],
            vec![],
            vec![],
        )
        .expect_err("nan depot");
        assert!(matches!(
            err,
            GvrpError::InvalidInput(InputError::NonFiniteCoordinate {
                kind: EntityKind::Depot,
                ..
            })
        ));
    }
}

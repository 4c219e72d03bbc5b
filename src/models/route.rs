//! Route, stop, and visit types.

use serde::{Deserialize, Serialize};

use super::LocationId;

/// A stop on a route. The depot is implicit at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Stop {
    /// Deliver to the customer with this ID.
    Customer(usize),
    /// Replenish at the station with this ID.
    Station(usize),
}

impl Stop {
    /// Location identifier of this stop.
    pub fn location_id(&self) -> LocationId {
        match *self {
            Stop::Customer(id) => LocationId::Customer(id),
            Stop::Station(id) => LocationId::Station(id),
        }
    }

    /// Returns `true` for station stops.
    pub fn is_station(&self) -> bool {
        matches!(self, Stop::Station(_))
    }
}

/// A single evaluated stop within a route.
///
/// Tracks timing, load, and range state as computed by the route evaluator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Visit {
    /// Stop being visited.
    pub stop: Stop,
    /// Arrival time at this stop.
    pub arrival_time: f64,
    /// Departure time (arrival + replenishment pause).
    pub departure_time: f64,
    /// Cumulative load delivered after this visit.
    pub load_after: i32,
    /// Remaining range on arrival.
    pub range_on_arrival: f64,
    /// Remaining range on departure (full after a station).
    pub range_on_departure: f64,
}

/// An ordered sequence of stops assigned to a single vehicle.
///
/// A route starts and ends at the vehicle's depot (not stored in `stops`).
///
/// # Examples
///
/// ```
/// use u_gvrp::models::{Route, Stop};
///
/// let mut route = Route::new(0);
/// route.push(Stop::Customer(1));
/// route.push(Stop::Station(4));
/// route.push(Stop::Customer(2));
/// assert_eq!(route.len(), 3);
/// assert_eq!(route.customer_ids(), vec![1, 2]);
/// assert_eq!(route.station_ids(), vec![4]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    vehicle_id: usize,
    stops: Vec<Stop>,
}

impl Route {
    /// Creates an empty route for the given vehicle.
    pub fn new(vehicle_id: usize) -> Self {
        Self {
            vehicle_id,
            stops: Vec::new(),
        }
    }

    /// Creates a route from a stop sequence.
    pub fn with_stops(vehicle_id: usize, stops: Vec<Stop>) -> Self {
        Self { vehicle_id, stops }
    }

    /// Creates a route visiting the given customers in order.
    pub fn from_customers(vehicle_id: usize, customer_ids: &[usize]) -> Self {
        Self {
            vehicle_id,
            stops: customer_ids.iter().map(|&id| Stop::Customer(id)).collect(),
        }
    }

    /// Appends a stop to the end of this route.
    pub fn push(&mut self, stop: Stop) {
        self.stops.push(stop);
    }

    /// Returns the vehicle assigned to this route.
    pub fn vehicle_id(&self) -> usize {
        self.vehicle_id
    }

    /// Returns the ordered sequence of stops.
    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    /// Returns the number of stops (excluding depot).
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    /// Returns `true` if this route has no stops.
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Returns the customer IDs in visit order.
    pub fn customer_ids(&self) -> Vec<usize> {
        self.stops
            .iter()
            .filter_map(|s| match s {
                Stop::Customer(id) => Some(*id),
                Stop::Station(_) => None,
            })
            .collect()
    }

    /// Returns the station IDs in visit order.
    pub fn station_ids(&self) -> Vec<usize> {
        self.stops
            .iter()
            .filter_map(|s| match s {
                Stop::Station(id) => Some(*id),
                Stop::Customer(_) => None,
            })
            .collect()
    }
}

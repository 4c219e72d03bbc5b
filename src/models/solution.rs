//! Solution and violation types.

use serde::{Deserialize, Serialize};

use super::{LocationId, Route};

/// A type of constraint violation in a route or solution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViolationType {
    /// Cumulative load exceeded vehicle capacity.
    CapacityExceeded {
        /// Vehicle whose route overflowed.
        vehicle_id: usize,
        /// Customer at which the load first exceeded capacity.
        customer_id: usize,
        /// Load after that customer.
        load: i32,
        /// Vehicle capacity.
        capacity: i32,
    },
    /// A leg could not be driven on the remaining range.
    RangeExceeded {
        /// Vehicle on that leg.
        vehicle_id: usize,
        /// Leg start.
        from: LocationId,
        /// Leg end.
        to: LocationId,
        /// Range the leg consumes.
        required: f64,
        /// Range left at the leg start.
        available: f64,
    },
    /// A station stop cannot serve the vehicle's type.
    IncompatibleStation {
        /// Vehicle stopping at the station.
        vehicle_id: usize,
        /// Offending station.
        station_id: usize,
    },
    /// Customer explicitly marked as unserved.
    UnservedCustomer {
        /// Customer ID.
        customer_id: usize,
    },
    /// Customer routed and also marked unserved.
    ServedAndUnserved {
        /// Customer ID.
        customer_id: usize,
    },
    /// Customer neither routed nor marked unserved.
    MissingCustomer {
        /// Customer ID.
        customer_id: usize,
    },
    /// Customer visited more than once.
    DuplicateCustomer {
        /// Customer ID.
        customer_id: usize,
        /// Number of visits.
        visits: usize,
    },
    /// Vehicle assigned more than one route.
    DuplicateVehicle {
        /// Vehicle ID.
        vehicle_id: usize,
    },
}

/// A constraint violation in a solution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    /// The type of violation.
    pub kind: ViolationType,
}

impl Violation {
    /// Creates a new violation.
    pub fn new(kind: ViolationType) -> Self {
        Self { kind }
    }
}

/// A complete solution: at most one route per vehicle plus the customers
/// that could not be served.
///
/// Unserved customers are an infeasibility, never silently dropped.
///
/// # Examples
///
/// ```
/// use u_gvrp::models::{Route, Solution};
///
/// let mut sol = Solution::new();
/// sol.add_route(Route::from_customers(0, &[1, 2]));
/// sol.add_unserved(3);
/// assert_eq!(sol.num_routes(), 1);
/// assert_eq!(sol.num_served(), 2);
/// assert_eq!(sol.unserved(), &[3]);
/// assert!(sol.route_for(0).is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    routes: Vec<Route>,
    unserved: Vec<usize>,
}

impl Solution {
    /// Creates an empty solution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a route to this solution.
    pub fn add_route(&mut self, route: Route) {
        self.routes.push(route);
    }

    /// Marks a customer as unserved.
    pub fn add_unserved(&mut self, customer_id: usize) {
        self.unserved.push(customer_id);
    }

    /// Returns the routes in this solution.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Returns the route driven by `vehicle_id`, if any.
    pub fn route_for(&self, vehicle_id: usize) -> Option<&Route> {
        self.routes.iter().find(|r| r.vehicle_id() == vehicle_id)
    }

    /// Returns the number of routes (vehicles used).
    pub fn num_routes(&self) -> usize {
        self.routes.len()
    }

    /// Returns the IDs of unserved customers.
    pub fn unserved(&self) -> &[usize] {
        &self.unserved
    }

    /// Total number of customer visits across all routes.
    pub fn num_served(&self) -> usize {
        self.routes.iter().map(|r| r.customer_ids().len()).sum()
    }
}

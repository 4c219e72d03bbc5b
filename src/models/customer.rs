//! Customer type.

use serde::Serialize;

use super::{Location, LocationId};

/// A customer with a delivery demand.
///
/// # Examples
///
/// ```
/// use u_gvrp::models::{Customer, LocationId};
///
/// let c = Customer::new(1, 41.0, 49.0, 10);
/// assert_eq!(c.id(), 1);
/// assert_eq!(c.demand(), 10);
/// assert_eq!(c.location().id(), LocationId::Customer(1));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Customer {
    id: usize,
    location: Location,
    demand: i32,
}

impl Customer {
    /// Creates a new customer.
    pub fn new(id: usize, x: f64, y: f64, demand: i32) -> Self {
        Self {
            id,
            location: Location::new(LocationId::Customer(id), x, y),
            demand,
        }
    }

    /// Customer ID.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Customer location.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Demand at this customer (load units to deliver).
    pub fn demand(&self) -> i32 {
        self.demand
    }
}

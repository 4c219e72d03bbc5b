//! Located entities: identifiers, coordinates, and depots.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a located entity.
///
/// Identifiers are unique per kind, so a depot and a customer may share the
/// same numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum LocationId {
    /// A depot.
    Depot(usize),
    /// A customer.
    Customer(usize),
    /// A charging or fuel station.
    Station(usize),
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationId::Depot(id) => write!(f, "depot {id}"),
            LocationId::Customer(id) => write!(f, "customer {id}"),
            LocationId::Station(id) => write!(f, "station {id}"),
        }
    }
}

/// A 2D coordinate tagged with the entity it belongs to.
///
/// # Examples
///
/// ```
/// use u_gvrp::models::{Location, LocationId};
///
/// let loc = Location::new(LocationId::Customer(3), 4.0, 2.5);
/// assert_eq!(loc.id(), LocationId::Customer(3));
/// assert_eq!(loc.x(), 4.0);
/// assert!(loc.is_finite());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Location {
    id: LocationId,
    x: f64,
    y: f64,
}

impl Location {
    /// Creates a location. Coordinates are checked when a problem is built.
    pub fn new(id: LocationId, x: f64, y: f64) -> Self {
        Self { id, x, y }
    }

    /// Identifier of the owning entity.
    pub fn id(&self) -> LocationId {
        self.id
    }

    /// X-coordinate.
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Y-coordinate.
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Returns `true` if both coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Start and end point for the vehicles bound to it.
///
/// # Examples
///
/// ```
/// use u_gvrp::models::{Depot, LocationId};
///
/// let depot = Depot::new(1, 0.0, 0.0);
/// assert_eq!(depot.location().id(), LocationId::Depot(1));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Depot {
    id: usize,
    location: Location,
}

impl Depot {
    /// Creates a depot at the given coordinates.
    pub fn new(id: usize, x: f64, y: f64) -> Self {
        Self {
            id,
            location: Location::new(LocationId::Depot(id), x, y),
        }
    }

    /// Depot ID.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Depot location.
    pub fn location(&self) -> &Location {
        &self.location
    }
}

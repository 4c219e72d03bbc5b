//! Domain model types for green vehicle routing.
//!
//! Provides the located entities (depots, customers, stations), the
//! heterogeneous fleet, routes as ordered stop sequences, solutions, the
//! serde input records, and the validated problem snapshot that ties
//! everything together.

mod customer;
mod input;
mod location;
mod problem;
mod route;
mod solution;
mod station;
mod vehicle;

pub use customer::Customer;
pub use input::{CustomerRecord, DepotRecord, ProblemInput, StationRecord, VehicleRecord};
pub use location::{Depot, Location, LocationId};
pub use problem::GvrpProblem;
pub use route::{Route, Stop, Visit};
pub use solution::{Solution, Violation, ViolationType};
pub use station::{Station, StationKind};
pub use vehicle::{ChargePort, Vehicle, VehicleType};

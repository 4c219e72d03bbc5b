//! Exact MILP solving for small instances.
//!
//! The crate owns the model: [`ExactSolver`] assembles a backend-neutral
//! [`MilpModel`], a [`MilpBackend`] solves it, and the solver decodes the
//! arc values back into routes. [`MicroLpBackend`] is the bundled
//! pure-Rust backend.
//!
//! # Complexity
//!
//! Per vehicle the model has O((n + s)²) binary arcs for n customers and s
//! compatible stations; branch and bound is exponential in the worst case,
//! hence the size guard in [`ExactConfig`].

mod backend;
mod config;
mod formulation;
mod model;
mod solver;

pub use backend::{MicroLpBackend, MilpBackend, MilpResult, MilpStatus, SolveBudget};
pub use config::ExactConfig;
pub use model::{LinearConstraint, MilpModel, Sense, VarDef, VarId, VarKind};
pub use solver::{ExactOutcome, ExactSolver, ExactStatus};

//! Simulated annealing over route plans.
//!
//! # Algorithm
//!
//! The engine keeps a *current* and a *best* plan. Each iteration perturbs
//! the current plan with one of the configured moves (relocate, swap,
//! reverse, reassign), scores it through
//! [`SolutionEvaluator`](crate::evaluation::SolutionEvaluator), and accepts
//! it if it is better or, otherwise, with probability `exp(-Δ/T)`. The
//! temperature cools geometrically. Only feasible solutions may replace the
//! best.
//!
//! Runs are reproducible: all randomness comes from a `StdRng` seeded by
//! [`AnnealingConfig::seed`], and parallel candidate scoring never touches
//! the RNG.
//!
//! # Reference
//!
//! Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing",
//! *Science* 220(4598).

mod cancel;
mod config;
mod engine;
mod moves;
mod restarts;

pub use cancel::CancellationToken;
pub use config::{AcceptanceStrategy, AnnealingConfig, MoveKind};
pub use engine::{
    AbortReason, AnnealingEngine, AnnealingOutcome, AnnealingState, ConvergenceReason,
};
pub use restarts::run_restarts;

//! Constructive heuristics for building initial GVRP solutions.
//!
//! - [`cheapest_insertion`]: greedy cheapest feasible insertion with
//!   station repair, O(n³m) route evaluations

mod cheapest_insertion;

pub use cheapest_insertion::cheapest_insertion;

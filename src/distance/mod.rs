//! Distance and travel time between located entities.
//!
//! Provides checked pairwise functions over a configurable metric and a
//! dense matrix precomputed once per problem.

mod matrix;
mod metric;

pub use matrix::DistanceMatrix;
pub use metric::{distance, travel_time, DistanceMetric};

//! Route feasibility checking and cost evaluation.
//!
//! [`RouteEvaluator`] walks one vehicle's stops; [`SolutionEvaluator`]
//! aggregates routes into a [`CostBreakdown`] and a weighted objective. Both
//! construction and search score candidates through the same engine.

mod route;
mod solution;
mod weights;

pub use route::{EvaluationMode, RouteEvaluation, RouteEvaluator, RouteSlack};
pub use solution::{
    CostBreakdown, SolutionEvaluation, SolutionEvaluator, DEFAULT_INFEASIBILITY_PENALTY,
};
pub use weights::ObjectiveWeights;

//! # u-gvrp
//!
//! Green vehicle routing: heterogeneous electric and fossil fleets with
//! capacity and range limits, charging and fuel stations, and a weighted
//! objective over distance, emissions and delivery time.
//!
//! ## Modules
//!
//! - [`models`]: entities, input records, routes, solutions and the
//!   validated [`GvrpProblem`](models::GvrpProblem) snapshot
//! - [`distance`]: metrics and the dense distance matrix
//! - [`resource`]: consumption and replenishment rules per vehicle type
//! - [`evaluation`]: route feasibility walk with station repair, solution
//!   objective
//! - [`constructive`]: cheapest feasible insertion
//! - [`annealing`]: simulated annealing with cancellation and restarts
//! - [`exact`]: MILP formulation for small instances
//! - [`hybrid`]: annealing followed by the exact solver
//! - [`report`]: serializable output
//!
//! ## Example
//!
//! ```
//! use u_gvrp::models::{CustomerRecord, DepotRecord, ProblemInput, StationRecord, StationKind,
//!     VehicleRecord, VehicleType};
//! use u_gvrp::annealing::{AnnealingConfig, AnnealingEngine, CancellationToken};
//! use u_gvrp::evaluation::{ObjectiveWeights, SolutionEvaluator};
//! use u_gvrp::report::SolutionReport;
//! use u_gvrp::resource::LinearResourceModel;
//!
//! let input = ProblemInput {
//!     vehicles: vec![VehicleRecord {
//!         id: 0,
//!         vehicle_type: VehicleType::Electric,
//!         capacity: 20,
//!         range: 12.0,
//!         recharge_rate: 0.5,
//!         emission_rate: 0.0,
//!         depot_id: None,
//!         speed: None,
//!         port: None,
//!     }],
//!     depots: vec![DepotRecord { id: 0, x: 0.0, y: 0.0 }],
//!     charging_stations: vec![StationRecord {
//!         id: 0,
//!         x: 5.0,
//!         y: 0.0,
//!         station_type: Some(StationKind::Fast),
//!         compatible_vehicle_types: vec![],
//!         rate: None,
//!     }],
//!     fuel_stations: vec![],
//!     customers: vec![CustomerRecord { id: 1, x: 10.0, y: 0.0, demand: 5 }],
//! };
//! let problem = input.into_problem().unwrap();
//!
//! let evaluator = SolutionEvaluator::new(&problem, &LinearResourceModel, ObjectiveWeights::default());
//! let config = AnnealingConfig::default().with_max_iterations(100);
//! let outcome = AnnealingEngine::new(&problem, evaluator, config)
//!     .unwrap()
//!     .solve(&CancellationToken::new())
//!     .unwrap();
//!
//! let report = SolutionReport::from(&outcome.evaluation);
//! assert!(report.feasible);
//! assert!((report.breakdown.total_distance - 20.0).abs() < 1e-9);
//! ```

pub mod annealing;
pub mod constructive;
pub mod distance;
pub mod error;
pub mod evaluation;
pub mod exact;
pub mod hybrid;
pub mod models;
pub mod report;
pub mod resource;

pub use error::{GvrpError, InputError};

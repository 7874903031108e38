//! POI Tour Planner Library
//!
//! Plans visiting orders over geographic points of interest, minimizing travel
//! distance, travel time, or travel plus on-site visit time.
//!
//! # Features
//!
//! - Greedy seed-based clustering of nearby POIs before any expensive search
//! - Exact solvers (Backtracking, Branch-and-Bound, Held-Karp) with node ceilings
//! - Heuristics (Bitonic sweep, grid-decomposition "PTAS", Ant Colony, Nearest Neighbor)
//! - Pluggable distance/duration matrix providers and visit duration tables
//! - Cooperative cancellation and deadlines
//! - Per-run metrics with CSV export
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use poi_tour_planner::{
//!     Algorithm, CategoryDurations, HaversineMatrixProvider, MetricsRecorder, PlannerConfig,
//!     PoiInstance, TourPlanner,
//! };
//!
//! let instance = PoiInstance::from_file("pois.json").unwrap();
//! let planner = TourPlanner::new(
//!     PlannerConfig::default(),
//!     HaversineMatrixProvider::default(),
//!     CategoryDurations::new(),
//!     Arc::new(MetricsRecorder::new()),
//! )
//! .unwrap();
//!
//! let route = planner
//!     .solve(&instance.pois, Some(&instance.metadata), &Algorithm::HeldKarp)
//!     .unwrap();
//! println!("Total time: {:.1} min", route.total_time_minutes());
//! ```

pub mod algorithm;
pub mod budget;
pub mod category;
pub mod clustering;
pub mod config;
pub mod error;
pub mod exact;
pub mod expansion;
pub mod geo;
pub mod heuristics;
pub mod instance;
pub mod matrix;
pub mod metrics;
pub mod planner;
pub mod solution;

pub use algorithm::{Algorithm, TourAlgorithm};
pub use budget::{CancelHandle, SearchBudget};
pub use category::{CategoryDurations, PoiMetadata, VisitDurationTable, DEFAULT_VISIT_MINUTES};
pub use clustering::{cluster, ClusterRecord, Clustering};
pub use config::{ComplexityLimits, PlannerConfig};
pub use error::{PlannerError, Result};
pub use geo::Coordinate;
pub use heuristics::{AcoConfig, GridConfig, SweepStrategy};
pub use instance::{PoiInstance, TourProblem};
pub use matrix::{HaversineMatrixProvider, MatrixProvider, RouteMatrices, StaticMatrixProvider};
pub use metrics::{MetricEntry, MetricsRecorder};
pub use planner::{AlgorithmRun, TourPlanner};
pub use solution::{Optimality, Route, RouteWarning, Tour};

//! Tours over clustered nodes and the routes expanded from them.

use crate::geo::Coordinate;
use crate::instance::TourProblem;
use serde::{Deserialize, Serialize};

/// Whether an algorithm guarantees an optimal answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Optimality {
    Exact,
    Heuristic,
}

impl std::fmt::Display for Optimality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Optimality::Exact => write!(f, "exact"),
            Optimality::Heuristic => write!(f, "heuristic"),
        }
    }
}

/// Non-fatal issue attached to a successful result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RouteWarning {
    /// The solver could not reconstruct its optimum and returned a trivial tour
    AlgorithmDegeneracy { algorithm: String, reason: String },
}

impl std::fmt::Display for RouteWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteWarning::AlgorithmDegeneracy { algorithm, reason } => {
                write!(f, "{} fell back to a trivial tour: {}", algorithm, reason)
            }
        }
    }
}

/// A tour over clustered node indices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tour {
    /// Visiting order, starting at node 0; the return leg is implicit
    pub order: Vec<usize>,
    /// Value of the objective the algorithm minimized
    pub cost: f64,
    pub algorithm: String,
    pub optimality: Optimality,
    /// Number of iterations (if applicable)
    pub iterations: Option<usize>,
    pub warnings: Vec<RouteWarning>,
}

impl Tour {
    pub fn new(order: Vec<usize>, cost: f64, algorithm: &str, optimality: Optimality) -> Self {
        Tour {
            order,
            cost,
            algorithm: algorithm.to_string(),
            optimality,
            iterations: None,
            warnings: Vec::new(),
        }
    }

    /// The `0 -> 1` tour every algorithm returns for two nodes
    pub fn trivial_pair(problem: &TourProblem, algorithm: &str) -> Self {
        Tour::new(vec![0, 1], problem.distance(0, 1), algorithm, Optimality::Exact)
    }

    /// Index-ascending tour, flagged as degenerate
    pub fn degenerate(problem: &TourProblem, algorithm: &str, reason: &str) -> Self {
        log::warn!("{} fell back to an index-ascending tour: {}", algorithm, reason);
        let order: Vec<usize> = (0..problem.dimension()).collect();
        let cost = problem.tour_time(&order);
        let mut tour = Tour::new(order, cost, algorithm, Optimality::Heuristic);
        tour.warnings.push(RouteWarning::AlgorithmDegeneracy {
            algorithm: algorithm.to_string(),
            reason: reason.to_string(),
        });
        tour
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = Some(iterations);
        self
    }

    pub fn is_degenerate(&self) -> bool {
        !self.warnings.is_empty()
    }
}

impl std::fmt::Display for Tour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Tour ({}, {})", self.algorithm, self.optimality)?;
        writeln!(f, "  Cost: {:.2}", self.cost)?;
        if let Some(iter) = self.iterations {
            writeln!(f, "  Iterations: {}", iter)?;
        }
        writeln!(f, "  Order: {:?}", self.order)
    }
}

/// A tour over every original POI, with aggregate metrics.
///
/// Distances are meters, durations seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    /// Coordinates in visiting order; closed (ends at the start) for 3+ POIs
    pub stops: Vec<Coordinate>,
    /// Original POI indices in visiting order, each exactly once
    pub order: Vec<usize>,
    pub total_distance_m: f64,
    pub travel_duration_s: f64,
    pub visit_duration_s: f64,
    pub total_time_s: f64,
    pub algorithm: String,
    pub variant: Option<String>,
    pub optimality: Optimality,
    pub iterations: Option<usize>,
    /// Number of nodes the algorithm actually searched over
    pub clustered_count: usize,
    pub warnings: Vec<RouteWarning>,
}

impl Route {
    pub fn total_time_minutes(&self) -> f64 {
        self.total_time_s / 60.0
    }

    pub fn is_closed(&self) -> bool {
        self.stops.len() > 2 && self.stops.first() == self.stops.last()
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.variant {
            Some(v) => writeln!(f, "Route ({} / {})", self.algorithm, v)?,
            None => writeln!(f, "Route ({})", self.algorithm)?,
        }
        writeln!(f, "  Distance: {:.1} m", self.total_distance_m)?;
        writeln!(f, "  Travel: {:.1} min", self.travel_duration_s / 60.0)?;
        writeln!(f, "  Visits: {:.1} min", self.visit_duration_s / 60.0)?;
        writeln!(f, "  Total: {:.1} min", self.total_time_minutes())?;
        writeln!(f, "  Searched nodes: {}", self.clustered_count)?;
        for w in &self.warnings {
            writeln!(f, "  Warning: {}", w)?;
        }
        writeln!(f, "  Order: {:?}", self.order)
    }
}

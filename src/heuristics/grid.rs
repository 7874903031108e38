//! Grid-decomposition heuristic, labelled "PTAS".
//!
//! Coordinates are normalized into the unit square, split into a
//! `grid_size x grid_size` grid and given boundary portals, with both sizes
//! derived from `epsilon` as in Arora's scheme. The decomposition is kept for
//! diagnostics only: the tour itself is a nearest-neighbour walk whose edge
//! score grows with the normalized Manhattan distance, so there is no
//! `(1 + epsilon)` guarantee.

use crate::algorithm::{trivial_tour, TourAlgorithm};
use crate::budget::SearchBudget;
use crate::error::Result;
use crate::geo::Coordinate;
use crate::heuristics::construction::nearest_neighbor_order;
use crate::instance::TourProblem;
use crate::solution::{Optimality, Tour};
use serde::{Deserialize, Serialize};

const MAX_GRID_SIZE: usize = 32;
const MAX_PORTALS_PER_EDGE: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Approximation parameter in (0, 1]
    pub epsilon: f64,
    /// At or below this many nodes the grid is skipped
    pub small_instance_threshold: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            epsilon: 0.5,
            small_instance_threshold: 8,
        }
    }
}

/// A point on a cell boundary, in unit-square coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Portal {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone)]
pub struct GridDecomposition {
    pub grid_size: usize,
    pub portals_per_edge: usize,
    /// (x, y) in [0, 1], x from longitude and y from latitude
    pub normalized: Vec<(f64, f64)>,
    /// Row-major cell index of every node
    pub cells: Vec<usize>,
    pub portals: Vec<Portal>,
}

impl GridDecomposition {
    pub fn grid_size_for(epsilon: f64) -> usize {
        ((1.0 / epsilon).ceil() as usize).clamp(1, MAX_GRID_SIZE)
    }

    pub fn portals_for(n: usize, epsilon: f64) -> usize {
        let log_n = (n.max(2) as f64).log2();
        ((log_n / epsilon).ceil() as usize).clamp(1, MAX_PORTALS_PER_EDGE)
    }

    pub fn build(coords: &[Coordinate], epsilon: f64) -> Self {
        let normalized = normalize(coords);
        let grid_size = Self::grid_size_for(epsilon);
        let portals_per_edge = Self::portals_for(coords.len(), epsilon);

        let cell_of = |v: f64| ((v * grid_size as f64) as usize).min(grid_size - 1);
        let cells = normalized
            .iter()
            .map(|&(x, y)| cell_of(y) * grid_size + cell_of(x))
            .collect();

        // Shared edges are listed once: every horizontal and vertical grid
        // line carries `portals_per_edge` evenly spaced points per cell side.
        let step = 1.0 / grid_size as f64;
        let mut portals = Vec::new();
        for line in 0..=grid_size {
            let fixed = line as f64 * step;
            for cell in 0..grid_size {
                for k in 0..portals_per_edge {
                    let along = (cell as f64 + (k as f64 + 0.5) / portals_per_edge as f64) * step;
                    portals.push(Portal { x: along, y: fixed });
                    portals.push(Portal { x: fixed, y: along });
                }
            }
        }

        GridDecomposition {
            grid_size,
            portals_per_edge,
            normalized,
            cells,
            portals,
        }
    }

    pub fn occupied_cells(&self) -> usize {
        let mut cells = self.cells.clone();
        cells.sort_unstable();
        cells.dedup();
        cells.len()
    }

    /// Manhattan distance between two nodes in the unit square
    pub fn manhattan(&self, i: usize, j: usize) -> f64 {
        let (xi, yi) = self.normalized[i];
        let (xj, yj) = self.normalized[j];
        (xi - xj).abs() + (yi - yj).abs()
    }
}

/// Map coordinates into the unit square; a degenerate axis collapses to 0
fn normalize(coords: &[Coordinate]) -> Vec<(f64, f64)> {
    let min_lng = coords.iter().map(|c| c.longitude).fold(f64::INFINITY, f64::min);
    let max_lng = coords.iter().map(|c| c.longitude).fold(f64::NEG_INFINITY, f64::max);
    let min_lat = coords.iter().map(|c| c.latitude).fold(f64::INFINITY, f64::min);
    let max_lat = coords.iter().map(|c| c.latitude).fold(f64::NEG_INFINITY, f64::max);

    let span_lng = max_lng - min_lng;
    let span_lat = max_lat - min_lat;
    let scale = |v: f64, min: f64, span: f64| if span > 0.0 { (v - min) / span } else { 0.0 };

    coords
        .iter()
        .map(|c| {
            (
                scale(c.longitude, min_lng, span_lng),
                scale(c.latitude, min_lat, span_lat),
            )
        })
        .collect()
}

pub struct GridPtasHeuristic {
    pub config: GridConfig,
}

impl GridPtasHeuristic {
    pub fn new(config: GridConfig) -> Self {
        GridPtasHeuristic { config }
    }

    pub fn with_epsilon(epsilon: f64) -> Self {
        GridPtasHeuristic {
            config: GridConfig {
                epsilon,
                ..Default::default()
            },
        }
    }
}

impl TourAlgorithm for GridPtasHeuristic {
    fn solve(&self, problem: &TourProblem, budget: &SearchBudget) -> Result<Tour> {
        if let Some(tour) = trivial_tour(problem, self.name())? {
            return Ok(tour);
        }

        let n = problem.dimension();
        let order = if n <= self.config.small_instance_threshold {
            nearest_neighbor_order(problem, budget, |i, j| problem.distance(i, j))?
        } else {
            let epsilon = self.config.epsilon;
            let grid = GridDecomposition::build(&problem.coords, epsilon);
            log::debug!(
                "Grid {}x{}, {} occupied cells, {} portals",
                grid.grid_size,
                grid.grid_size,
                grid.occupied_cells(),
                grid.portals.len()
            );
            nearest_neighbor_order(problem, budget, |i, j| {
                problem.distance(i, j) * (1.0 + epsilon * grid.manhattan(i, j))
            })?
        };

        let cost = problem.tour_length(&order);
        Ok(Tour::new(order, cost, self.name(), Optimality::Heuristic))
    }

    fn name(&self) -> &str {
        "GridPtas"
    }
}

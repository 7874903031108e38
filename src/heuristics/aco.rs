//! Ant Colony Optimization.
//!
//! Ant System over the distance matrix: every ant builds a full tour from the
//! start by roulette-wheel selection on `pheromone^alpha * (1/d)^beta`; after
//! all ants finish, pheromone evaporates and every ant reinforces the edges it
//! used. Each ant draws from its own generator seeded from the colony's, so
//! building ants in parallel gives the same result as building them in turn.

use crate::algorithm::{trivial_tour, TourAlgorithm};
use crate::budget::SearchBudget;
use crate::error::Result;
use crate::instance::TourProblem;
use crate::solution::{Optimality, Tour};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// ACO configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcoConfig {
    /// Number of ants
    pub num_ants: usize,
    /// Number of iterations
    pub max_iterations: usize,
    /// Pheromone importance (alpha)
    pub alpha: f64,
    /// Heuristic importance (beta)
    pub beta: f64,
    /// Evaporation rate (rho)
    pub evaporation_rate: f64,
    /// Initial pheromone level
    pub initial_pheromone: f64,
    /// Random seed
    pub seed: u64,
    /// Build the ants of an iteration on the rayon pool
    pub parallel: bool,
}

impl Default for AcoConfig {
    fn default() -> Self {
        AcoConfig {
            num_ants: 20,
            max_iterations: 100,
            alpha: 1.0,
            beta: 2.5,
            evaporation_rate: 0.1,
            initial_pheromone: 1.0,
            seed: 42,
            parallel: true,
        }
    }
}

/// Heuristic desirability for a zero-length edge between distinct nodes
const ZERO_DISTANCE_DESIRABILITY: f64 = 1e6;

/// One ant's closed tour
#[derive(Debug, Clone)]
pub struct Ant {
    pub tour: Vec<usize>,
    pub distance: f64,
}

/// State exposed to the per-iteration observer
#[derive(Debug)]
pub struct AcoSnapshot<'a> {
    pub iteration: usize,
    pub best_tour: &'a [usize],
    pub best_distance: f64,
    pub ants: &'a [Ant],
    pub pheromone: &'a [Vec<f64>],
}

/// Result of a colony run
#[derive(Debug, Clone)]
pub struct AcoOutcome {
    pub tour: Tour,
    /// Best distance after each iteration
    pub best_history: Vec<f64>,
}

struct Colony<'a> {
    problem: &'a TourProblem,
    config: &'a AcoConfig,
    pheromone: Vec<Vec<f64>>,
    heuristic: Vec<Vec<f64>>,
}

impl<'a> Colony<'a> {
    fn new(problem: &'a TourProblem, config: &'a AcoConfig) -> Self {
        let n = problem.dimension();

        let pheromone = vec![vec![config.initial_pheromone; n]; n];

        let mut heuristic = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    let dist = problem.distance(i, j);
                    heuristic[i][j] = if dist > 0.0 { 1.0 / dist } else { ZERO_DISTANCE_DESIRABILITY };
                }
            }
        }

        Colony {
            problem,
            config,
            pheromone,
            heuristic,
        }
    }

    fn construct_ant(&self, seed: u64) -> Ant {
        let n = self.problem.dimension();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let mut tour = Vec::with_capacity(n);
        tour.push(0);
        let mut visited = vec![false; n];
        visited[0] = true;

        let mut current = 0;
        while tour.len() < n {
            let next = self.select_next_node(current, &visited, &mut rng);
            visited[next] = true;
            tour.push(next);
            current = next;
        }

        let distance = self.problem.tour_length(&tour);
        Ant { tour, distance }
    }

    /// Roulette-wheel pick among unvisited nodes; callers guarantee one exists
    fn select_next_node(&self, current: usize, visited: &[bool], rng: &mut ChaCha8Rng) -> usize {
        let candidates: Vec<(usize, f64)> = (0..visited.len())
            .filter(|&j| !visited[j])
            .map(|j| {
                let tau = self.pheromone[current][j].powf(self.config.alpha);
                let eta = self.heuristic[current][j].powf(self.config.beta);
                (j, tau * eta)
            })
            .collect();

        let total: f64 = candidates.iter().map(|&(_, w)| w).sum();
        if !(total.is_finite() && total > 0.0) {
            return candidates[0].0;
        }

        let draw = rng.gen::<f64>();
        let mut cumulative = 0.0;
        for &(j, w) in &candidates {
            cumulative += w / total;
            if draw <= cumulative {
                return j;
            }
        }
        candidates[candidates.len() - 1].0
    }

    fn update_pheromone(&mut self, ants: &[Ant]) {
        let retain = 1.0 - self.config.evaporation_rate;
        for row in self.pheromone.iter_mut() {
            for tau in row.iter_mut() {
                *tau *= retain;
            }
        }

        let num_ants = self.config.num_ants as f64;
        for ant in ants {
            if ant.distance <= 0.0 {
                continue;
            }
            let deposit = 1.0 / (num_ants * ant.distance);
            let m = ant.tour.len();
            for i in 0..m {
                let from = ant.tour[i];
                let to = ant.tour[(i + 1) % m];
                self.pheromone[from][to] += deposit;
                self.pheromone[to][from] += deposit;
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AntColonyOptimization {
    pub config: AcoConfig,
}

impl AntColonyOptimization {
    pub fn new(config: AcoConfig) -> Self {
        AntColonyOptimization { config }
    }

    /// Run the colony, calling `observer` after every iteration
    pub fn solve_with_observer<F>(&self, problem: &TourProblem, budget: &SearchBudget, mut observer: F) -> Result<AcoOutcome>
    where
        F: FnMut(&AcoSnapshot<'_>),
    {
        if let Some(tour) = trivial_tour(problem, self.name())? {
            let history = vec![tour.cost];
            return Ok(AcoOutcome { tour, best_history: history });
        }

        let mut colony = Colony::new(problem, &self.config);
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);

        let mut best_tour: Vec<usize> = Vec::new();
        let mut best_distance = f64::INFINITY;
        let mut history = Vec::with_capacity(self.config.max_iterations);
        let mut iterations = 0;

        for iteration in 0..self.config.max_iterations {
            budget.check()?;

            let seeds: Vec<u64> = (0..self.config.num_ants).map(|_| rng.gen()).collect();
            let ants: Vec<Ant> = if self.config.parallel {
                let colony = &colony;
                seeds.par_iter().map(|&s| colony.construct_ant(s)).collect()
            } else {
                seeds.iter().map(|&s| colony.construct_ant(s)).collect()
            };

            colony.update_pheromone(&ants);

            for ant in &ants {
                if ant.distance < best_distance {
                    best_distance = ant.distance;
                    best_tour = ant.tour.clone();
                }
            }
            history.push(best_distance);
            iterations = iteration + 1;

            observer(&AcoSnapshot {
                iteration,
                best_tour: &best_tour,
                best_distance,
                ants: &ants,
                pheromone: &colony.pheromone,
            });
        }

        if best_tour.is_empty() {
            let mut tour = Tour::degenerate(problem, self.name(), "colony ran no iterations");
            // the colony minimizes distance, not time
            tour.cost = problem.tour_length(&tour.order);
            return Ok(AcoOutcome { tour, best_history: history });
        }

        log::debug!("ACO finished {} iterations, best {:.1} m", iterations, best_distance);

        let tour = Tour::new(best_tour, best_distance, self.name(), Optimality::Heuristic).with_iterations(iterations);
        Ok(AcoOutcome { tour, best_history: history })
    }
}

impl TourAlgorithm for AntColonyOptimization {
    fn solve(&self, problem: &TourProblem, budget: &SearchBudget) -> Result<Tour> {
        Ok(self.solve_with_observer(problem, budget, |_| {})?.tour)
    }

    fn name(&self) -> &str {
        "AntColony"
    }
}

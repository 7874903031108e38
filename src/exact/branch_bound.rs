//! Best-first branch and bound over partial paths.
//!
//! The frontier is a min-heap keyed on a lower bound; nodes whose bound
//! reaches the incumbent are pruned. The incumbent starts from the
//! nearest-neighbour tour so pruning is effective from the first pop.

use crate::algorithm::{trivial_tour, TourAlgorithm};
use crate::budget::SearchBudget;
use crate::error::{PlannerError, Result};
use crate::heuristics::construction::nearest_neighbor_order;
use crate::instance::TourProblem;
use crate::solution::{Optimality, Tour};
use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Hard ceiling imposed by the visited bitmask
const MASK_BITS: usize = 63;

/// Pops between two budget checks
const CHECK_INTERVAL: usize = 256;

#[derive(Debug, Clone)]
struct SearchNode {
    bound: f64,
    cost: f64,
    path: Vec<usize>,
    visited: u64,
}

impl PartialEq for SearchNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SearchNode {}

impl PartialOrd for SearchNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SearchNode {
    // BinaryHeap is a max-heap: smaller bound ranks higher, deeper paths break ties
    fn cmp(&self, other: &Self) -> Ordering {
        OrderedFloat(other.bound)
            .cmp(&OrderedFloat(self.bound))
            .then_with(|| self.path.len().cmp(&other.path.len()))
    }
}

#[derive(Debug, Clone)]
pub struct BranchAndBoundSolver {
    pub max_nodes: usize,
}

impl BranchAndBoundSolver {
    pub fn new(max_nodes: usize) -> Self {
        BranchAndBoundSolver { max_nodes }
    }

    /// Admissible completion bound for a partial path ending at `current`.
    ///
    /// Accumulated cost, plus the cheapest edge from `current` into the
    /// unvisited set, plus for every unvisited node its cheapest edge towards
    /// another unvisited node or back to the start. The return edge into the
    /// start is covered by that last term.
    fn lower_bound(problem: &TourProblem, cost: f64, current: usize, visited: u64) -> f64 {
        let n = problem.dimension();
        let unvisited: Vec<usize> = (0..n).filter(|&u| visited & (1 << u) == 0).collect();

        if unvisited.is_empty() {
            return cost + problem.distance(current, 0);
        }

        let leave = unvisited
            .iter()
            .map(|&u| problem.distance(current, u))
            .fold(f64::INFINITY, f64::min);

        let mut bound = cost + leave;
        for &u in &unvisited {
            let cheapest = unvisited
                .iter()
                .copied()
                .chain(std::iter::once(0))
                .filter(|&v| v != u)
                .map(|v| problem.distance(u, v))
                .fold(f64::INFINITY, f64::min);
            bound += cheapest;
        }
        bound
    }
}

impl TourAlgorithm for BranchAndBoundSolver {
    fn solve(&self, problem: &TourProblem, budget: &SearchBudget) -> Result<Tour> {
        if let Some(tour) = trivial_tour(problem, self.name())? {
            return Ok(tour);
        }
        let n = problem.dimension();
        let limit = self.max_nodes.min(MASK_BITS);
        if n > limit {
            return Err(PlannerError::complexity(self.name(), n, limit));
        }

        let mut best_path = nearest_neighbor_order(problem, budget, |i, j| problem.distance(i, j))?;
        let mut best_cost = problem.tour_length(&best_path);

        let mut frontier = BinaryHeap::new();
        let root_visited = 1u64;
        frontier.push(SearchNode {
            bound: Self::lower_bound(problem, 0.0, 0, root_visited),
            cost: 0.0,
            path: vec![0],
            visited: root_visited,
        });

        let mut expanded = 0usize;
        while let Some(node) = frontier.pop() {
            expanded += 1;
            if expanded % CHECK_INTERVAL == 0 {
                budget.check()?;
            }

            // every remaining node has an equal or larger bound
            if node.bound >= best_cost {
                break;
            }

            let current = node.path[node.path.len() - 1];
            for next in 1..n {
                if node.visited & (1 << next) != 0 {
                    continue;
                }

                let cost = node.cost + problem.distance(current, next);
                let visited = node.visited | (1 << next);

                if node.path.len() + 1 == n {
                    let total = cost + problem.distance(next, 0);
                    if total < best_cost {
                        best_cost = total;
                        best_path = node.path.clone();
                        best_path.push(next);
                    }
                    continue;
                }

                let bound = Self::lower_bound(problem, cost, next, visited);
                if bound < best_cost {
                    let mut path = Vec::with_capacity(node.path.len() + 1);
                    path.extend_from_slice(&node.path);
                    path.push(next);
                    frontier.push(SearchNode { bound, cost, path, visited });
                }
            }
        }

        log::debug!(
            "Branch and bound expanded {} nodes, best {:.1} m",
            expanded,
            best_cost
        );

        Ok(Tour::new(best_path, best_cost, self.name(), Optimality::Exact).with_iterations(expanded))
    }

    fn name(&self) -> &str {
        "BranchAndBound"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exact::BacktrackingSolver;
    use crate::instance::tests::{problem_from_distances, scattered_problem, square_problem};

    #[test]
    fn test_matches_exhaustive_search() {
        for seed in 0..5 {
            let problem = scattered_problem(8, seed);
            let budget = SearchBudget::unlimited();
            let exact = BacktrackingSolver::new(10).solve(&problem, &budget).unwrap();
            let bnb = BranchAndBoundSolver::new(15).solve(&problem, &budget).unwrap();
            assert!(problem.is_complete(&bnb.order));
            assert!((bnb.cost - exact.cost).abs() < 1e-6, "seed {}: {} vs {}", seed, bnb.cost, exact.cost);
        }
    }

    #[test]
    fn test_square() {
        let problem = square_problem();
        let tour = BranchAndBoundSolver::new(15)
            .solve(&problem, &SearchBudget::unlimited())
            .unwrap();
        assert_eq!(tour.cost, 4000.0);
    }

    #[test]
    fn test_lower_bound_is_admissible_on_complete_paths() {
        let problem = problem_from_distances(vec![
            vec![0.0, 2.0, 9.0],
            vec![1.0, 0.0, 6.0],
            vec![15.0, 7.0, 0.0],
        ]);
        // 0 -> 1 -> 2 -> 0 costs 2 + 6 + 15
        let bound = BranchAndBoundSolver::lower_bound(&problem, 2.0, 1, 0b011);
        assert!(bound <= 23.0);
        let closed = BranchAndBoundSolver::lower_bound(&problem, 8.0, 2, 0b111);
        assert_eq!(closed, 23.0);
    }

    #[test]
    fn test_rejects_large_instances() {
        let problem = scattered_problem(16, 2);
        let err = BranchAndBoundSolver::new(15)
            .solve(&problem, &SearchBudget::unlimited())
            .unwrap_err();
        assert!(matches!(err, PlannerError::ComplexityLimitExceeded { .. }));
    }

    #[test]
    fn test_cancelled_budget_stops_search() {
        let problem = scattered_problem(12, 3);
        let budget = SearchBudget::unlimited();
        budget.cancel_handle().cancel();
        let err = BranchAndBoundSolver::new(15).solve(&problem, &budget).unwrap_err();
        assert!(matches!(err, PlannerError::Cancelled));
    }
}

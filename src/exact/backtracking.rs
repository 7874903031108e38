//! Exhaustive permutation search.
//!
//! Enumerates every ordering of the non-start nodes with Heap's exchange
//! scheme, driven by an explicit counter array instead of recursion.

use crate::algorithm::{trivial_tour, TourAlgorithm};
use crate::budget::SearchBudget;
use crate::error::{PlannerError, Result};
use crate::instance::TourProblem;
use crate::solution::{Optimality, Tour};

/// Permutations evaluated between two budget checks
const CHECK_INTERVAL: usize = 4096;

#[derive(Debug, Clone)]
pub struct BacktrackingSolver {
    /// Largest node count accepted (start included)
    pub max_nodes: usize,
}

impl BacktrackingSolver {
    pub fn new(max_nodes: usize) -> Self {
        BacktrackingSolver { max_nodes }
    }
}

impl TourAlgorithm for BacktrackingSolver {
    fn solve(&self, problem: &TourProblem, budget: &SearchBudget) -> Result<Tour> {
        if let Some(tour) = trivial_tour(problem, self.name())? {
            return Ok(tour);
        }
        let n = problem.dimension();
        if n > self.max_nodes {
            return Err(PlannerError::complexity(self.name(), n, self.max_nodes));
        }

        let mut perm: Vec<usize> = (1..n).collect();
        let k = perm.len();
        let closed_cost = |p: &[usize]| -> f64 {
            let mut cost = problem.distance(0, p[0]);
            for w in p.windows(2) {
                cost += problem.distance(w[0], w[1]);
            }
            cost + problem.distance(p[k - 1], 0)
        };

        let mut best_cost = closed_cost(&perm);
        let mut best_perm = perm.clone();
        let mut evaluated = 1usize;

        let mut counters = vec![0usize; k];
        let mut i = 1;
        while i < k {
            if counters[i] < i {
                if i % 2 == 0 {
                    perm.swap(0, i);
                } else {
                    perm.swap(counters[i], i);
                }

                let cost = closed_cost(&perm);
                if cost < best_cost {
                    best_cost = cost;
                    best_perm.copy_from_slice(&perm);
                }

                evaluated += 1;
                if evaluated % CHECK_INTERVAL == 0 {
                    budget.check()?;
                }

                counters[i] += 1;
                i = 1;
            } else {
                counters[i] = 0;
                i += 1;
            }
        }

        log::debug!("Backtracking evaluated {} permutations", evaluated);

        let mut order = Vec::with_capacity(n);
        order.push(0);
        order.extend(best_perm);
        Ok(Tour::new(order, best_cost, self.name(), Optimality::Exact).with_iterations(evaluated))
    }

    fn name(&self) -> &str {
        "Backtracking"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::tests::{scattered_problem, square_problem};
    use std::time::{Duration, Instant};

    #[test]
    fn test_enumerates_every_permutation() {
        let problem = scattered_problem(7, 3);
        let tour = BacktrackingSolver::new(10)
            .solve(&problem, &SearchBudget::unlimited())
            .unwrap();
        // 6! orderings of the non-start nodes
        assert_eq!(tour.iterations, Some(720));
        assert!(problem.is_complete(&tour.order));
    }

    #[test]
    fn test_square_optimum() {
        let problem = square_problem();
        let tour = BacktrackingSolver::new(10)
            .solve(&problem, &SearchBudget::unlimited())
            .unwrap();
        assert_eq!(tour.cost, 4000.0);
    }

    #[test]
    fn test_rejects_large_instances() {
        let problem = scattered_problem(12, 1);
        let err = BacktrackingSolver::new(10)
            .solve(&problem, &SearchBudget::unlimited())
            .unwrap_err();
        assert!(matches!(err, PlannerError::ComplexityLimitExceeded { nodes: 12, limit: 10, .. }));
    }

    #[test]
    fn test_cancelled_budget_stops_enumeration() {
        let problem = scattered_problem(10, 6);
        let budget = SearchBudget::unlimited();
        budget.cancel_handle().cancel();
        let err = BacktrackingSolver::new(10).solve(&problem, &budget).unwrap_err();
        assert!(matches!(err, PlannerError::Cancelled));
    }

    #[test]
    fn test_deadline_interrupts_running_search() {
        // 11! orderings take far longer than the deadline
        let problem = scattered_problem(12, 6);
        let started = Instant::now();
        let err = BacktrackingSolver::new(12)
            .solve(&problem, &SearchBudget::with_timeout(Duration::from_millis(5)))
            .unwrap_err();
        assert!(matches!(err, PlannerError::DeadlineExceeded { elapsed_ms } if elapsed_ms >= 5));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}

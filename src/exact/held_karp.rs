//! Held-Karp bitmask dynamic program.
//!
//! `dp[mask][last]` is the cheapest travel-plus-visit time to leave node 0,
//! visit exactly the nodes of `mask` and stand at `last`. Masks are processed
//! by increasing size so every predecessor state is final when read.

use crate::algorithm::{trivial_tour, TourAlgorithm};
use crate::budget::SearchBudget;
use crate::error::{PlannerError, Result};
use crate::instance::TourProblem;
use crate::solution::{Optimality, Tour};

/// Above this the tables no longer fit in memory on ordinary hosts
pub const HELD_KARP_HARD_LIMIT: usize = 20;

const NO_PARENT: u8 = u8::MAX;

/// Masks filled between two budget checks
const CHECK_INTERVAL: usize = 2048;

#[derive(Debug, Clone)]
pub struct HeldKarpSolver {
    pub max_nodes: usize,
}

impl HeldKarpSolver {
    pub fn new(max_nodes: usize) -> Self {
        HeldKarpSolver { max_nodes }
    }

    fn reconstruct(parent: &[u8], n: usize, full: usize, last: usize) -> Option<Vec<usize>> {
        let mut order = Vec::with_capacity(n);
        let mut mask = full;
        let mut node = last;

        while node != 0 {
            order.push(node);
            let p = parent[mask * n + node];
            if p == NO_PARENT {
                return None;
            }
            mask ^= 1 << node;
            node = p as usize;
        }

        order.push(0);
        order.reverse();
        Some(order)
    }
}

impl TourAlgorithm for HeldKarpSolver {
    fn solve(&self, problem: &TourProblem, budget: &SearchBudget) -> Result<Tour> {
        if let Some(tour) = trivial_tour(problem, self.name())? {
            return Ok(tour);
        }
        let n = problem.dimension();
        let limit = self.max_nodes.min(HELD_KARP_HARD_LIMIT);
        if n > limit {
            return Err(PlannerError::complexity(self.name(), n, limit));
        }

        let states = 1usize << n;
        let mut dp = vec![f64::INFINITY; states * n];
        let mut parent = vec![NO_PARENT; states * n];

        for city in 1..n {
            let mask = 1 | (1 << city);
            dp[mask * n + city] = problem.duration(0, city) + problem.visit(city);
            parent[mask * n + city] = 0;
        }

        // only masks containing the start (odd masks) are reachable
        let mut filled = 0usize;
        for size in 3..=n {
            budget.check()?;

            for mask in (1..states).step_by(2) {
                if mask.count_ones() as usize != size {
                    continue;
                }
                filled += 1;
                if filled % CHECK_INTERVAL == 0 {
                    budget.check()?;
                }

                for last in 1..n {
                    if mask & (1 << last) == 0 {
                        continue;
                    }
                    let prev_mask = mask ^ (1 << last);

                    let mut best = f64::INFINITY;
                    let mut best_prev = NO_PARENT;
                    for prev in 1..n {
                        if prev_mask & (1 << prev) == 0 {
                            continue;
                        }
                        let cost = dp[prev_mask * n + prev] + problem.duration(prev, last);
                        if cost < best {
                            best = cost;
                            best_prev = prev as u8;
                        }
                    }

                    if best_prev != NO_PARENT {
                        dp[mask * n + last] = best + problem.visit(last);
                        parent[mask * n + last] = best_prev;
                    }
                }
            }
        }

        let full = states - 1;
        let mut best_cost = f64::INFINITY;
        let mut best_last = None;
        for last in 1..n {
            let cost = dp[full * n + last] + problem.duration(last, 0);
            if cost < best_cost {
                best_cost = cost;
                best_last = Some(last);
            }
        }

        let reconstructed = best_last.and_then(|last| Self::reconstruct(&parent, n, full, last));
        match reconstructed {
            Some(order) if problem.is_complete(&order) => {
                log::debug!("Held-Karp filled {} states, best {:.1} s", states * n, best_cost);
                Ok(Tour::new(order, best_cost, self.name(), Optimality::Exact).with_iterations(states))
            }
            _ => Ok(Tour::degenerate(problem, self.name(), "no valid memo entry for the full tour")),
        }
    }

    fn name(&self) -> &str {
        "HeldKarp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exact::BacktrackingSolver;
    use crate::instance::tests::{scattered_problem, square_problem};

    #[test]
    fn test_square_perimeter() {
        let problem = square_problem();
        let tour = HeldKarpSolver::new(16)
            .solve(&problem, &SearchBudget::unlimited())
            .unwrap();
        assert_eq!(problem.tour_length(&tour.order), 4000.0);
        assert!(!tour.is_degenerate());
    }

    #[test]
    fn test_agrees_with_exhaustive_search() {
        // durations mirror distances and visits are zero, so both minimize the same thing
        for seed in 10..14 {
            let problem = scattered_problem(8, seed);
            let budget = SearchBudget::unlimited();
            let hk = HeldKarpSolver::new(16).solve(&problem, &budget).unwrap();
            let bt = BacktrackingSolver::new(10).solve(&problem, &budget).unwrap();
            assert!((hk.cost - bt.cost).abs() < 1e-6);
            assert!(problem.is_complete(&hk.order));
        }
    }

    #[test]
    fn test_visit_time_is_part_of_cost() {
        let mut problem = square_problem();
        problem.visit_seconds = vec![100.0, 10.0, 10.0, 10.0];
        let tour = HeldKarpSolver::new(16)
            .solve(&problem, &SearchBudget::unlimited())
            .unwrap();
        // the start's own visit is never counted
        assert_eq!(tour.cost, 4030.0);
    }

    #[test]
    fn test_limit_is_capped() {
        let problem = scattered_problem(21, 5);
        let err = HeldKarpSolver::new(64)
            .solve(&problem, &SearchBudget::unlimited())
            .unwrap_err();
        assert!(matches!(err, PlannerError::ComplexityLimitExceeded { limit: 20, .. }));
    }

    #[test]
    fn test_expired_deadline_aborts() {
        let problem = scattered_problem(10, 2);
        let err = HeldKarpSolver::new(16)
            .solve(&problem, &SearchBudget::with_timeout(std::time::Duration::ZERO))
            .unwrap_err();
        assert!(matches!(err, PlannerError::DeadlineExceeded { .. }));
    }

    #[test]
    fn test_cancel_from_another_thread() {
        let problem = scattered_problem(16, 8);
        let budget = SearchBudget::unlimited();
        let handle = budget.cancel_handle();

        let worker = std::thread::spawn(move || HeldKarpSolver::new(16).solve(&problem, &budget));
        handle.cancel();
        assert!(matches!(worker.join().unwrap(), Err(PlannerError::Cancelled)));
    }

    #[test]
    fn test_missing_parent_is_detected() {
        let parent = vec![NO_PARENT; 8 * 3];
        assert!(HeldKarpSolver::reconstruct(&parent, 3, 7, 2).is_none());
    }
}

use crate::algorithm::{trivial_tour, TourAlgorithm};
use crate::budget::SearchBudget;
use crate::error::Result;
use crate::instance::TourProblem;
use crate::solution::{Optimality, Tour};
use ordered_float::OrderedFloat;

/// Nearest-neighbour walk from node 0 under an arbitrary edge score.
///
/// Ties go to the lowest index. Returns the visiting order without the
/// closing leg.
pub(crate) fn nearest_neighbor_order<F>(problem: &TourProblem, budget: &SearchBudget, score: F) -> Result<Vec<usize>>
where
    F: Fn(usize, usize) -> f64,
{
    let n = problem.dimension();
    let mut tour = Vec::with_capacity(n);
    tour.push(0);
    let mut visited = vec![false; n];
    visited[0] = true;

    let mut current = 0;
    while tour.len() < n {
        budget.check()?;

        let next = (0..n)
            .filter(|&j| !visited[j])
            .min_by_key(|&j| (OrderedFloat(score(current, j)), j));

        match next {
            Some(j) => {
                visited[j] = true;
                tour.push(j);
                current = j;
            }
            None => break,
        }
    }

    Ok(tour)
}

/// Greedy Nearest Neighbor Heuristic
///
/// Builds a tour by repeatedly moving to the nearest unvisited node by
/// matrix distance, then closes it back to the start.
#[derive(Debug, Clone, Default)]
pub struct NearestNeighborHeuristic;

impl NearestNeighborHeuristic {
    pub fn new() -> Self {
        NearestNeighborHeuristic
    }
}

impl TourAlgorithm for NearestNeighborHeuristic {
    fn solve(&self, problem: &TourProblem, budget: &SearchBudget) -> Result<Tour> {
        if let Some(tour) = trivial_tour(problem, self.name())? {
            return Ok(tour);
        }

        let order = nearest_neighbor_order(problem, budget, |i, j| problem.distance(i, j))?;
        let cost = problem.tour_length(&order);
        Ok(Tour::new(order, cost, self.name(), Optimality::Heuristic))
    }

    fn name(&self) -> &str {
        "NearestNeighbor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::tests::{problem_from_distances, scattered_problem, square_problem};

    #[test]
    fn test_nearest_neighbor_visits_all() {
        let problem = scattered_problem(12, 7);
        let tour = NearestNeighborHeuristic::new()
            .solve(&problem, &SearchBudget::unlimited())
            .unwrap();
        assert!(problem.is_complete(&tour.order));
        assert!((tour.cost - problem.tour_length(&tour.order)).abs() < 1e-9);
    }

    #[test]
    fn test_nearest_neighbor_follows_square() {
        let problem = square_problem();
        let tour = NearestNeighborHeuristic::new()
            .solve(&problem, &SearchBudget::unlimited())
            .unwrap();
        assert_eq!(tour.order, vec![0, 1, 2, 3]);
        assert_eq!(tour.cost, 4000.0);
    }

    #[test]
    fn test_nearest_neighbor_uses_directed_distances() {
        // 0 -> 2 is short but 0 -> 1 is shorter
        let problem = problem_from_distances(vec![
            vec![0.0, 1.0, 2.0],
            vec![9.0, 0.0, 1.0],
            vec![1.0, 9.0, 0.0],
        ]);
        let tour = NearestNeighborHeuristic::new()
            .solve(&problem, &SearchBudget::unlimited())
            .unwrap();
        assert_eq!(tour.order, vec![0, 1, 2]);
        assert_eq!(tour.cost, 3.0);
    }

    #[test]
    fn test_expired_deadline_stops_walk() {
        let problem = scattered_problem(6, 1);
        let err = NearestNeighborHeuristic::new()
            .solve(&problem, &SearchBudget::with_timeout(std::time::Duration::ZERO))
            .unwrap_err();
        assert!(matches!(err, crate::error::PlannerError::DeadlineExceeded { .. }));
    }
}

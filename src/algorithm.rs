//! The family of tour algorithms behind one interface.

use crate::budget::SearchBudget;
use crate::config::PlannerConfig;
use crate::error::{PlannerError, Result};
use crate::exact::{BacktrackingSolver, BranchAndBoundSolver, HeldKarpSolver};
use crate::heuristics::{
    AcoConfig, AntColonyOptimization, BitonicSweepHeuristic, GridConfig, GridPtasHeuristic,
    NearestNeighborHeuristic, SweepStrategy,
};
use crate::instance::TourProblem;
use crate::solution::Tour;
use serde::{Deserialize, Serialize};

/// Trait for tour construction methods.
///
/// Implementations receive the clustered problem (start at node 0) and return
/// a tour over its indices.
pub trait TourAlgorithm {
    fn solve(&self, problem: &TourProblem, budget: &SearchBudget) -> Result<Tour>;
    fn name(&self) -> &str;
}

/// Cases every algorithm handles identically: fewer than two nodes is an
/// error, exactly two is the single leg `0 -> 1`.
pub(crate) fn trivial_tour(problem: &TourProblem, algorithm: &str) -> Result<Option<Tour>> {
    match problem.dimension() {
        n if n < 2 => Err(PlannerError::InsufficientPoints { required: 2, actual: n }),
        2 => Ok(Some(Tour::trivial_pair(problem, algorithm))),
        _ => Ok(None),
    }
}

/// Selectable algorithm with its own parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Algorithm {
    Backtracking,
    BranchAndBound,
    HeldKarp,
    BitonicSweep(SweepStrategy),
    GridPtas { epsilon: f64 },
    AntColony(AcoConfig),
    NearestNeighbor,
}

impl Algorithm {
    /// Every algorithm, parameterized from `config`
    pub fn all(config: &PlannerConfig) -> Vec<Algorithm> {
        vec![
            Algorithm::Backtracking,
            Algorithm::BranchAndBound,
            Algorithm::HeldKarp,
            Algorithm::BitonicSweep(config.sweep_strategy),
            Algorithm::GridPtas {
                epsilon: config.grid.epsilon,
            },
            Algorithm::AntColony(config.aco.clone()),
            Algorithm::NearestNeighbor,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Backtracking => "Backtracking",
            Algorithm::BranchAndBound => "BranchAndBound",
            Algorithm::HeldKarp => "HeldKarp",
            Algorithm::BitonicSweep(_) => "BitonicSweep",
            Algorithm::GridPtas { .. } => "GridPtas",
            Algorithm::AntColony(_) => "AntColony",
            Algorithm::NearestNeighbor => "NearestNeighbor",
        }
    }

    /// Parameter label distinguishing runs of the same algorithm
    pub fn variant(&self) -> Option<String> {
        match self {
            Algorithm::BitonicSweep(strategy) => Some(strategy.label().to_string()),
            Algorithm::GridPtas { epsilon } => Some(format!("eps={:.2}", epsilon)),
            Algorithm::AntColony(aco) => Some(format!(
                "ants={},iter={},seed={}",
                aco.num_ants, aco.max_iterations, aco.seed
            )),
            _ => None,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(
            self,
            Algorithm::Backtracking | Algorithm::BranchAndBound | Algorithm::HeldKarp
        )
    }

    /// Check the algorithm's own parameters
    pub fn validate(&self) -> Result<()> {
        match self {
            Algorithm::GridPtas { epsilon } => crate::config::validate_epsilon(*epsilon),
            Algorithm::AntColony(aco) => crate::config::validate_aco(aco),
            _ => Ok(()),
        }
    }

    /// Instantiate the solver, taking node ceilings and grid settings from `config`
    pub fn build(&self, config: &PlannerConfig) -> Box<dyn TourAlgorithm + Send + Sync> {
        match self {
            Algorithm::Backtracking => Box::new(BacktrackingSolver::new(config.limits.backtracking)),
            Algorithm::BranchAndBound => Box::new(BranchAndBoundSolver::new(config.limits.branch_and_bound)),
            Algorithm::HeldKarp => Box::new(HeldKarpSolver::new(config.limits.held_karp)),
            Algorithm::BitonicSweep(strategy) => Box::new(BitonicSweepHeuristic::new(*strategy)),
            Algorithm::GridPtas { epsilon } => Box::new(GridPtasHeuristic::new(GridConfig {
                epsilon: *epsilon,
                ..config.grid.clone()
            })),
            Algorithm::AntColony(aco) => Box::new(AntColonyOptimization::new(aco.clone())),
            Algorithm::NearestNeighbor => Box::new(NearestNeighborHeuristic::new()),
        }
    }

    pub fn solve(&self, problem: &TourProblem, config: &PlannerConfig, budget: &SearchBudget) -> Result<Tour> {
        self.validate()?;
        self.build(config).solve(problem, budget)
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.variant() {
            Some(v) => write!(f, "{} ({})", self.name(), v),
            None => write!(f, "{}", self.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;
    use crate::instance::tests::{problem_from_distances, scattered_problem};
    use crate::matrix::RouteMatrices;

    #[test]
    fn test_every_algorithm_handles_two_nodes() {
        let problem = problem_from_distances(vec![vec![0.0, 700.0], vec![650.0, 0.0]]);
        let config = PlannerConfig::default();
        for algorithm in Algorithm::all(&config) {
            let tour = algorithm.solve(&problem, &config, &SearchBudget::unlimited()).unwrap();
            assert_eq!(tour.order, vec![0, 1], "{}", algorithm);
            assert_eq!(tour.cost, 700.0, "{}", algorithm);
        }
    }

    #[test]
    fn test_every_algorithm_rejects_single_node() {
        let coords = vec![Coordinate::new(0.0, 0.0)];
        let problem =
            TourProblem::without_visits(coords, RouteMatrices::new(vec![vec![0.0]], vec![vec![0.0]])).unwrap();
        let config = PlannerConfig::default();
        for algorithm in Algorithm::all(&config) {
            let err = algorithm.solve(&problem, &config, &SearchBudget::unlimited()).unwrap_err();
            assert!(matches!(err, PlannerError::InsufficientPoints { actual: 1, .. }));
        }
    }

    #[test]
    fn test_every_algorithm_returns_complete_tours() {
        let problem = scattered_problem(9, 21);
        let mut config = PlannerConfig::default();
        config.aco.max_iterations = 10;
        for algorithm in Algorithm::all(&config) {
            let tour = algorithm.solve(&problem, &config, &SearchBudget::unlimited()).unwrap();
            assert!(problem.is_complete(&tour.order), "{}: {:?}", algorithm, tour.order);
        }
    }

    #[test]
    fn test_cancelled_budget_stops_search() {
        let problem = scattered_problem(9, 2);
        let config = PlannerConfig::default();
        let budget = SearchBudget::unlimited();
        budget.cancel_handle().cancel();
        let err = Algorithm::HeldKarp.solve(&problem, &config, &budget).unwrap_err();
        assert!(matches!(err, PlannerError::Cancelled));
    }

    #[test]
    fn test_invalid_parameters_are_rejected() {
        let config = PlannerConfig::default();
        let problem = scattered_problem(5, 1);
        let err = Algorithm::GridPtas { epsilon: 0.0 }
            .solve(&problem, &config, &SearchBudget::unlimited())
            .unwrap_err();
        assert!(matches!(err, PlannerError::Configuration(_)));
    }

    #[test]
    fn test_variant_labels() {
        assert_eq!(Algorithm::HeldKarp.variant(), None);
        assert_eq!(
            Algorithm::BitonicSweep(SweepStrategy::Clockwise).variant().as_deref(),
            Some("clockwise")
        );
        assert_eq!(Algorithm::GridPtas { epsilon: 0.25 }.to_string(), "GridPtas (eps=0.25)");
    }
}

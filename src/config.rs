//! Planner configuration.

use crate::error::{PlannerError, Result};
use crate::exact::HELD_KARP_HARD_LIMIT;
use crate::heuristics::{AcoConfig, GridConfig, SweepStrategy};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest node counts the exponential solvers accept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplexityLimits {
    pub backtracking: usize,
    pub branch_and_bound: usize,
    pub held_karp: usize,
}

impl Default for ComplexityLimits {
    fn default() -> Self {
        ComplexityLimits {
            backtracking: 10,
            branch_and_bound: 15,
            held_karp: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Seed radius for POI clustering, in meters
    pub max_cluster_distance_m: f64,
    pub limits: ComplexityLimits,
    /// Per-request search deadline
    pub deadline_ms: Option<u64>,
    pub aco: AcoConfig,
    pub sweep_strategy: SweepStrategy,
    pub grid: GridConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            max_cluster_distance_m: 100.0,
            limits: ComplexityLimits::default(),
            deadline_ms: None,
            aco: AcoConfig::default(),
            sweep_strategy: SweepStrategy::default(),
            grid: GridConfig::default(),
        }
    }
}

impl PlannerConfig {
    /// Read a JSON configuration; missing fields take their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(&path).map_err(|e| {
            PlannerError::configuration(format!("cannot read {}: {}", path.as_ref().display(), e))
        })?;
        let config: PlannerConfig = serde_json::from_str(&raw)
            .map_err(|e| PlannerError::configuration(format!("invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.max_cluster_distance_m.is_finite() || self.max_cluster_distance_m < 0.0 {
            return Err(PlannerError::configuration(format!(
                "max_cluster_distance_m must be a non-negative number, got {}",
                self.max_cluster_distance_m
            )));
        }
        validate_aco(&self.aco)?;
        validate_epsilon(self.grid.epsilon)?;
        if self.limits.held_karp > HELD_KARP_HARD_LIMIT {
            return Err(PlannerError::configuration(format!(
                "held_karp limit {} exceeds the hard ceiling of {}",
                self.limits.held_karp, HELD_KARP_HARD_LIMIT
            )));
        }
        if self.deadline_ms == Some(0) {
            return Err(PlannerError::configuration("deadline_ms must be greater than zero"));
        }
        Ok(())
    }
}

pub(crate) fn validate_aco(aco: &AcoConfig) -> Result<()> {
    if aco.num_ants == 0 {
        return Err(PlannerError::configuration("ACO needs at least one ant"));
    }
    if aco.max_iterations == 0 {
        return Err(PlannerError::configuration("ACO needs at least one iteration"));
    }
    if !(aco.evaporation_rate > 0.0 && aco.evaporation_rate <= 1.0) {
        return Err(PlannerError::configuration(format!(
            "evaporation_rate must be in (0, 1], got {}",
            aco.evaporation_rate
        )));
    }
    if !(aco.initial_pheromone > 0.0 && aco.initial_pheromone.is_finite()) {
        return Err(PlannerError::configuration("initial_pheromone must be positive"));
    }
    if !aco.alpha.is_finite() || !aco.beta.is_finite() {
        return Err(PlannerError::configuration("alpha and beta must be finite"));
    }
    Ok(())
}

pub(crate) fn validate_epsilon(epsilon: f64) -> Result<()> {
    if !(epsilon > 0.0 && epsilon <= 1.0) {
        return Err(PlannerError::configuration(format!(
            "epsilon must be in (0, 1], got {}",
            epsilon
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PlannerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_cluster_distance_m, 100.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PlannerConfig =
            serde_json::from_str(r#"{"max_cluster_distance_m": 50.0, "aco": {"num_ants": 5}}"#).unwrap();
        assert_eq!(config.max_cluster_distance_m, 50.0);
        assert_eq!(config.aco.num_ants, 5);
        assert_eq!(config.aco.max_iterations, 100);
        assert_eq!(config.limits.held_karp, 16);
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = PlannerConfig::default();
        config.aco.evaporation_rate = 0.0;
        assert!(matches!(config.validate(), Err(PlannerError::Configuration(_))));

        let mut config = PlannerConfig::default();
        config.aco.max_iterations = 0;
        assert!(matches!(config.validate(), Err(PlannerError::Configuration(_))));

        let mut config = PlannerConfig::default();
        config.limits.held_karp = 30;
        assert!(config.validate().is_err());

        let mut config = PlannerConfig::default();
        config.grid.epsilon = 1.5;
        assert!(config.validate().is_err());

        let mut config = PlannerConfig::default();
        config.max_cluster_distance_m = -1.0;
        assert!(config.validate().is_err());
    }
}

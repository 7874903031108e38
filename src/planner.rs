//! The planning pipeline.
//!
//! [`TourPlanner`] owns the collaborators injected at construction (matrix
//! provider, visit duration table, metrics recorder) and runs one request as:
//! validate, cluster, fetch matrices, solve, expand, record. A metrics entry is
//! recorded for every call, including failed ones.

use crate::algorithm::Algorithm;
use crate::budget::SearchBudget;
use crate::category::{PoiMetadata, VisitDurationTable};
use crate::clustering::cluster;
use crate::config::PlannerConfig;
use crate::error::{PlannerError, Result};
use crate::expansion::expand_route;
use crate::geo::Coordinate;
use crate::instance::TourProblem;
use crate::matrix::MatrixProvider;
use crate::metrics::{MetricEntry, MetricsRecorder};
use crate::solution::Route;
use std::sync::Arc;
use std::time::Instant;

/// Outcome of one algorithm in [`TourPlanner::compare`]
#[derive(Debug)]
pub struct AlgorithmRun {
    pub algorithm: Algorithm,
    pub result: Result<Route>,
    pub elapsed_ms: f64,
}

pub struct TourPlanner<P, D> {
    config: PlannerConfig,
    provider: P,
    durations: D,
    metrics: Arc<MetricsRecorder>,
}

impl<P: MatrixProvider, D: VisitDurationTable> TourPlanner<P, D> {
    /// Fails with `Configuration` on an invalid config; nothing is built then.
    pub fn new(config: PlannerConfig, provider: P, durations: D, metrics: Arc<MetricsRecorder>) -> Result<Self> {
        config.validate()?;
        Ok(TourPlanner {
            config,
            provider,
            durations,
            metrics,
        })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<MetricsRecorder> {
        &self.metrics
    }

    /// Plan a route over `pois` (start first, end last) with the configured deadline
    pub fn solve(&self, pois: &[Coordinate], metadata: Option<&[PoiMetadata]>, algorithm: &Algorithm) -> Result<Route> {
        let budget = SearchBudget::from_millis(self.config.deadline_ms);
        self.solve_with_budget(pois, metadata, algorithm, &budget)
    }

    pub fn solve_with_budget(
        &self,
        pois: &[Coordinate],
        metadata: Option<&[PoiMetadata]>,
        algorithm: &Algorithm,
        budget: &SearchBudget,
    ) -> Result<Route> {
        log::info!("Planning {} POIs with {}", pois.len(), algorithm);
        let start = Instant::now();

        let result = self.plan(pois, metadata, algorithm, budget);

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        let mut entry = MetricEntry::new(algorithm.name(), algorithm.variant(), pois.len(), elapsed_ms);
        match &result {
            Ok(route) => {
                log::info!(
                    "{} finished in {:.2} ms: {:.1} m, {:.1} min",
                    algorithm,
                    elapsed_ms,
                    route.total_distance_m,
                    route.total_time_minutes()
                );
                entry = entry.with_route(route);
            }
            Err(e) => log::warn!("{} failed after {:.2} ms: {}", algorithm, elapsed_ms, e),
        }
        self.metrics.record(entry);

        result
    }

    /// Run several algorithms on the same input, one after the other
    pub fn compare(
        &self,
        pois: &[Coordinate],
        metadata: Option<&[PoiMetadata]>,
        algorithms: &[Algorithm],
    ) -> Vec<AlgorithmRun> {
        algorithms
            .iter()
            .map(|algorithm| {
                let start = Instant::now();
                let result = self.solve(pois, metadata, algorithm);
                AlgorithmRun {
                    algorithm: algorithm.clone(),
                    result,
                    elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
                }
            })
            .collect()
    }

    fn plan(
        &self,
        pois: &[Coordinate],
        metadata: Option<&[PoiMetadata]>,
        algorithm: &Algorithm,
        budget: &SearchBudget,
    ) -> Result<Route> {
        validate_input(pois, metadata)?;
        algorithm.validate()?;

        let clustering = cluster(pois, self.config.max_cluster_distance_m, metadata);
        let matrices = self.provider.route_matrices(&clustering.pois)?;
        let problem = TourProblem::with_durations(
            clustering.pois.clone(),
            matrices,
            &clustering.metadata(),
            &self.durations,
        )?;

        let tour = algorithm.solve(&problem, &self.config, budget)?;

        let visit_seconds: Vec<f64> = (0..pois.len())
            .map(|i| self.durations.visit_seconds(metadata.and_then(|m| m.get(i))))
            .collect();

        expand_route(
            &tour,
            &problem,
            &clustering.records,
            pois,
            &visit_seconds,
            algorithm.variant(),
        )
    }
}

fn validate_input(pois: &[Coordinate], metadata: Option<&[PoiMetadata]>) -> Result<()> {
    if pois.len() < 2 {
        return Err(PlannerError::InsufficientPoints {
            required: 2,
            actual: pois.len(),
        });
    }
    if let Some(i) = pois.iter().position(|p| !p.is_finite()) {
        return Err(PlannerError::validation(format!("POI {} has non-finite coordinates", i)));
    }
    if let Some(m) = metadata {
        if m.len() != pois.len() {
            return Err(PlannerError::validation(format!(
                "metadata has {} entries for {} POIs",
                m.len(),
                pois.len()
            )));
        }
    }
    Ok(())
}

//! Run metrics.
//!
//! Every planner call appends one [`MetricEntry`], successful or not, to a
//! shared [`MetricsRecorder`]. The recorder is append-only; only [`MetricsRecorder::clear`]
//! removes entries. Failed runs carry timing only.

use crate::error::{PlannerError, Result};
use crate::solution::Route;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Column order of the CSV export
pub const CSV_HEADER: [&str; 12] = [
    "algorithm",
    "variant",
    "nodeCount",
    "executionTimeMs",
    "memoryUsageMB",
    "routeDistance",
    "routeDuration",
    "routeVisitTime",
    "routeTotalTime",
    "iterations",
    "optimality",
    "timestamp",
];

/// Statistics of one algorithm invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricEntry {
    pub algorithm: String,
    pub variant: Option<String>,
    /// Number of POIs the caller submitted
    pub node_count: usize,
    pub execution_time_ms: f64,
    #[serde(rename = "memoryUsageMB")]
    pub memory_usage_mb: Option<f64>,
    /// Meters
    pub route_distance: Option<f64>,
    /// Seconds of travel
    pub route_duration: Option<f64>,
    /// Seconds on site
    pub route_visit_time: Option<f64>,
    pub route_total_time: Option<f64>,
    pub iterations: Option<usize>,
    pub optimality: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl MetricEntry {
    /// Timing-only entry, as recorded for a failed run
    pub fn new(algorithm: &str, variant: Option<String>, node_count: usize, execution_time_ms: f64) -> Self {
        MetricEntry {
            algorithm: algorithm.to_string(),
            variant,
            node_count,
            execution_time_ms,
            memory_usage_mb: None,
            route_distance: None,
            route_duration: None,
            route_visit_time: None,
            route_total_time: None,
            iterations: None,
            optimality: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_route(mut self, route: &Route) -> Self {
        self.route_distance = Some(route.total_distance_m);
        self.route_duration = Some(route.travel_duration_s);
        self.route_visit_time = Some(route.visit_duration_s);
        self.route_total_time = Some(route.total_time_s);
        self.iterations = route.iterations;
        self.optimality = Some(route.optimality.to_string());
        self
    }

    pub fn is_failure(&self) -> bool {
        self.route_distance.is_none()
    }

    fn csv_record(&self) -> [String; 12] {
        fn opt<T: ToString>(v: &Option<T>) -> String {
            v.as_ref().map(|x| x.to_string()).unwrap_or_default()
        }
        [
            self.algorithm.clone(),
            opt(&self.variant),
            self.node_count.to_string(),
            format!("{:.3}", self.execution_time_ms),
            opt(&self.memory_usage_mb),
            opt(&self.route_distance),
            opt(&self.route_duration),
            opt(&self.route_visit_time),
            opt(&self.route_total_time),
            opt(&self.iterations),
            opt(&self.optimality),
            self.timestamp.to_rfc3339(),
        ]
    }
}

/// Aggregated statistics for an algorithm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmStatistics {
    pub algorithm: String,
    pub runs: usize,
    pub failures: usize,
    pub mean_time_ms: f64,
    pub std_time_ms: f64,
    /// Over successful runs only
    pub mean_distance: Option<f64>,
    pub std_distance: Option<f64>,
    pub best_distance: Option<f64>,
}

/// Shared, append-only log of [`MetricEntry`] values
#[derive(Debug, Default)]
pub struct MetricsRecorder {
    entries: Mutex<Vec<MetricEntry>>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn acquire(&self) -> MutexGuard<'_, Vec<MetricEntry>> {
        // a panicking writer cannot leave a half-pushed entry behind
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn record(&self, entry: MetricEntry) {
        log::debug!(
            "Recording {} on {} nodes: {:.2} ms",
            entry.algorithm,
            entry.node_count,
            entry.execution_time_ms
        );
        self.acquire().push(entry);
    }

    /// Snapshot of every entry in insertion order
    pub fn all(&self) -> Vec<MetricEntry> {
        self.acquire().clone()
    }

    pub fn len(&self) -> usize {
        self.acquire().len()
    }

    pub fn is_empty(&self) -> bool {
        self.acquire().is_empty()
    }

    pub fn clear(&self) {
        self.acquire().clear();
    }

    /// Most recent entry per (algorithm, variant, node count)
    pub fn latest_per_key(&self) -> Vec<MetricEntry> {
        let mut latest: BTreeMap<(String, Option<String>, usize), MetricEntry> = BTreeMap::new();
        for entry in self.acquire().iter() {
            let key = (entry.algorithm.clone(), entry.variant.clone(), entry.node_count);
            match latest.get(&key) {
                Some(kept) if kept.timestamp > entry.timestamp => {}
                _ => {
                    latest.insert(key, entry.clone());
                }
            }
        }
        latest.into_values().collect()
    }

    /// Per-algorithm statistics, sorted by mean distance (failures last)
    pub fn statistics(&self) -> Vec<AlgorithmStatistics> {
        let mut grouped: BTreeMap<String, Vec<MetricEntry>> = BTreeMap::new();
        for entry in self.acquire().iter() {
            grouped.entry(entry.algorithm.clone()).or_default().push(entry.clone());
        }

        let mut statistics: Vec<AlgorithmStatistics> = grouped
            .into_iter()
            .map(|(algorithm, entries)| {
                let times: Vec<f64> = entries.iter().map(|e| e.execution_time_ms).collect();
                let distances: Vec<f64> = entries.iter().filter_map(|e| e.route_distance).collect();

                let (mean_distance, std_distance, best_distance) = if distances.is_empty() {
                    (None, None, None)
                } else {
                    (
                        Some(distances.iter().mean()),
                        Some(distances.iter().population_std_dev()),
                        Some(distances.iter().cloned().fold(f64::INFINITY, f64::min)),
                    )
                };

                AlgorithmStatistics {
                    algorithm,
                    runs: entries.len(),
                    failures: entries.len() - distances.len(),
                    mean_time_ms: times.iter().mean(),
                    std_time_ms: times.iter().population_std_dev(),
                    mean_distance,
                    std_distance,
                    best_distance,
                }
            })
            .collect();

        statistics.sort_by(|a, b| {
            let key = |s: &AlgorithmStatistics| s.mean_distance.unwrap_or(f64::INFINITY);
            key(a).total_cmp(&key(b))
        });
        statistics
    }

    /// CSV with a header row and one line per entry
    pub fn export_csv(&self) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer.write_record(CSV_HEADER)?;
        for entry in self.acquire().iter() {
            writer.write_record(entry.csv_record())?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| PlannerError::Io(e.into_error()))?;
        String::from_utf8(bytes).map_err(|e| PlannerError::validation(format!("CSV export is not UTF-8: {}", e)))
    }

    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let csv = self.export_csv()?;
        std::fs::write(path, csv)?;
        Ok(())
    }

    /// Generate summary report
    pub fn summary_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("       Tour Planner Run Report\n");
        report.push_str("========================================\n\n");

        report.push_str(&"-".repeat(84));
        report.push('\n');
        report.push_str(&format!(
            "{:<18} {:>8} {:>12} {:>12} {:>14} {:>14}\n",
            "Algorithm", "Runs", "Avg ms", "Std ms", "Avg dist (m)", "Best dist (m)"
        ));
        report.push_str(&"-".repeat(84));
        report.push('\n');

        for stat in self.statistics() {
            let dist = |v: Option<f64>| v.map(|d| format!("{:.1}", d)).unwrap_or_else(|| "-".to_string());
            report.push_str(&format!(
                "{:<18} {:>8} {:>12.2} {:>12.2} {:>14} {:>14}\n",
                stat.algorithm,
                format!("{}/{}", stat.runs - stat.failures, stat.runs),
                stat.mean_time_ms,
                stat.std_time_ms,
                dist(stat.mean_distance),
                dist(stat.best_distance),
            ));
        }

        report.push_str(&"-".repeat(84));
        report.push('\n');
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(algorithm: &str, nodes: usize, ms: f64, distance: Option<f64>) -> MetricEntry {
        let mut e = MetricEntry::new(algorithm, None, nodes, ms);
        e.route_distance = distance;
        e
    }

    #[test]
    fn test_record_and_clear() {
        let recorder = MetricsRecorder::new();
        recorder.record(entry("HeldKarp", 5, 1.0, Some(100.0)));
        recorder.record(entry("HeldKarp", 5, 2.0, None));
        assert_eq!(recorder.len(), 2);
        assert!(recorder.all()[1].is_failure());

        recorder.clear();
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_latest_per_key_keeps_newest() {
        let recorder = MetricsRecorder::new();
        let mut old = entry("AntColony", 8, 5.0, Some(900.0));
        old.timestamp = old.timestamp - Duration::seconds(10);
        recorder.record(entry("AntColony", 8, 3.0, Some(800.0)));
        recorder.record(old);
        recorder.record(entry("AntColony", 9, 4.0, Some(700.0)));

        let latest = recorder.latest_per_key();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].node_count, 8);
        assert_eq!(latest[0].route_distance, Some(800.0));
        assert_eq!(recorder.len(), 3);
    }

    #[test]
    fn test_statistics() {
        let recorder = MetricsRecorder::new();
        recorder.record(entry("NearestNeighbor", 5, 1.0, Some(100.0)));
        recorder.record(entry("NearestNeighbor", 5, 3.0, Some(300.0)));
        recorder.record(entry("HeldKarp", 30, 0.5, None));

        let stats = recorder.statistics();
        assert_eq!(stats[0].algorithm, "NearestNeighbor");
        assert_eq!(stats[0].mean_distance, Some(200.0));
        assert_eq!(stats[0].best_distance, Some(100.0));
        assert!((stats[0].std_time_ms - 1.0).abs() < 1e-9);
        assert_eq!(stats[1].failures, 1);
        assert_eq!(stats[1].mean_distance, None);

        let report = recorder.summary_report();
        assert!(report.contains("NearestNeighbor"));
        assert!(report.contains("0/1"));
    }

    #[test]
    fn test_csv_column_order() {
        let recorder = MetricsRecorder::new();
        let csv = recorder.export_csv().unwrap();
        assert_eq!(csv.trim_end(), CSV_HEADER.join(","));

        let mut e = entry("BitonicSweep", 4, 1.5, Some(4000.0));
        e.variant = Some("clockwise".to_string());
        e.optimality = Some("heuristic".to_string());
        recorder.record(e);

        let csv = recorder.export_csv().unwrap();
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), CSV_HEADER.to_vec());

        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[0], "BitonicSweep");
        assert_eq!(&row[1], "clockwise");
        assert_eq!(&row[2], "4");
        assert_eq!(&row[4], "");
        assert_eq!(&row[5], "4000");
        assert!(DateTime::parse_from_rfc3339(&row[11]).is_ok());
    }

    #[test]
    fn test_concurrent_appends() {
        let recorder = std::sync::Arc::new(MetricsRecorder::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let recorder = recorder.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        recorder.record(entry("NearestNeighbor", t * 100 + i, 0.1, Some(1.0)));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(recorder.len(), 200);
    }
}

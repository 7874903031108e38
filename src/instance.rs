//! Problem representations.
//!
//! [`PoiInstance`] is the raw caller input (POIs plus category metadata) as read
//! from a JSON file. [`TourProblem`] is what the tour algorithms consume: the
//! clustered coordinates with their distance/duration matrices and a visit
//! duration per node.

use crate::category::{PoiMetadata, VisitDurationTable};
use crate::error::{PlannerError, Result};
use crate::geo::{haversine_meters, Coordinate};
use crate::matrix::RouteMatrices;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A POI as it appears in an input file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoiRecord {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sub_category: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct InstanceFile {
    #[serde(default)]
    name: Option<String>,
    pois: Vec<PoiRecord>,
}

/// Raw caller input: the first POI is the start, the last one the end
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoiInstance {
    pub name: String,
    pub pois: Vec<Coordinate>,
    pub metadata: Vec<PoiMetadata>,
}

impl PoiInstance {
    pub fn new(name: &str, pois: Vec<Coordinate>, metadata: Vec<PoiMetadata>) -> Self {
        PoiInstance {
            name: name.to_string(),
            pois,
            metadata,
        }
    }

    /// Parse an instance from a JSON file of the form
    /// `{"name": "...", "pois": [{"latitude": .., "longitude": .., "category": ..}]}`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(&path)?;
        let fallback_name = path
            .as_ref()
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_json(&raw, &fallback_name)
    }

    pub fn from_json(raw: &str, fallback_name: &str) -> Result<Self> {
        let file: InstanceFile = serde_json::from_str(raw)?;

        let mut pois = Vec::with_capacity(file.pois.len());
        let mut metadata = Vec::with_capacity(file.pois.len());

        for (i, record) in file.pois.into_iter().enumerate() {
            let coord = Coordinate::new(record.latitude, record.longitude);
            if !coord.is_finite()
                || record.latitude.abs() > 90.0
                || record.longitude.abs() > 180.0
            {
                return Err(PlannerError::validation(format!(
                    "POI {} has invalid coordinates ({}, {})",
                    i, record.latitude, record.longitude
                )));
            }
            pois.push(coord);
            metadata.push(PoiMetadata {
                category: record.category,
                sub_category: record.sub_category,
            });
        }

        Ok(PoiInstance {
            name: file.name.unwrap_or_else(|| fallback_name.to_string()),
            pois,
            metadata,
        })
    }

    pub fn len(&self) -> usize {
        self.pois.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pois.is_empty()
    }

    pub fn statistics(&self) -> InstanceStatistics {
        let n = self.pois.len();

        let mut distances = Vec::new();
        for i in 0..n {
            for j in i + 1..n {
                distances.push(haversine_meters(&self.pois[i], &self.pois[j]));
            }
        }
        let avg_distance = if distances.is_empty() {
            0.0
        } else {
            distances.iter().sum::<f64>() / distances.len() as f64
        };
        let max_distance = distances.iter().cloned().fold(0.0, f64::max);
        let min_distance = distances.iter().cloned().fold(f64::INFINITY, f64::min);

        let lat = self.pois.iter().map(|p| p.latitude);
        let lng = self.pois.iter().map(|p| p.longitude);

        InstanceStatistics {
            name: self.name.clone(),
            num_pois: n,
            num_categorized: self.metadata.iter().filter(|m| m.category.is_some()).count(),
            min_latitude: lat.clone().fold(f64::INFINITY, f64::min),
            max_latitude: lat.fold(f64::NEG_INFINITY, f64::max),
            min_longitude: lng.clone().fold(f64::INFINITY, f64::min),
            max_longitude: lng.fold(f64::NEG_INFINITY, f64::max),
            avg_distance,
            min_distance: if min_distance.is_finite() { min_distance } else { 0.0 },
            max_distance,
        }
    }
}

/// Statistics about a POI instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub num_pois: usize,
    pub num_categorized: usize,
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
    pub avg_distance: f64,
    pub min_distance: f64,
    pub max_distance: f64,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  POIs: {} ({} with a category)", self.num_pois, self.num_categorized)?;
        writeln!(
            f,
            "  Bounding box: lat [{:.5}, {:.5}], lng [{:.5}, {:.5}]",
            self.min_latitude, self.max_latitude, self.min_longitude, self.max_longitude
        )?;
        writeln!(f, "  Avg distance: {:.1} m", self.avg_distance)?;
        writeln!(f, "  Min distance: {:.1} m", self.min_distance)?;
        writeln!(f, "  Max distance: {:.1} m", self.max_distance)
    }
}

/// Clustered nodes with their pairwise costs; node 0 is the start.
#[derive(Debug, Clone)]
pub struct TourProblem {
    pub coords: Vec<Coordinate>,
    /// Meters
    pub distance_matrix: Vec<Vec<f64>>,
    /// Seconds
    pub duration_matrix: Vec<Vec<f64>>,
    /// Seconds spent on site at each node
    pub visit_seconds: Vec<f64>,
}

impl TourProblem {
    pub fn new(coords: Vec<Coordinate>, matrices: RouteMatrices, visit_seconds: Vec<f64>) -> Result<Self> {
        let n = coords.len();
        matrices.validate(n)?;
        if visit_seconds.len() != n {
            return Err(PlannerError::validation(format!(
                "expected {} visit durations, got {}",
                n,
                visit_seconds.len()
            )));
        }
        Ok(TourProblem {
            coords,
            distance_matrix: matrices.distance,
            duration_matrix: matrices.duration,
            visit_seconds,
        })
    }

    /// Build a problem whose visit durations come from a category table
    pub fn with_durations<D: VisitDurationTable + ?Sized>(
        coords: Vec<Coordinate>,
        matrices: RouteMatrices,
        metadata: &[PoiMetadata],
        durations: &D,
    ) -> Result<Self> {
        let visit_seconds = (0..coords.len())
            .map(|i| durations.visit_seconds(metadata.get(i)))
            .collect();
        Self::new(coords, matrices, visit_seconds)
    }

    /// Problem with zero visit time everywhere
    pub fn without_visits(coords: Vec<Coordinate>, matrices: RouteMatrices) -> Result<Self> {
        let n = coords.len();
        Self::new(coords, matrices, vec![0.0; n])
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.coords.len()
    }

    #[inline]
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.distance_matrix[i][j]
    }

    #[inline]
    pub fn duration(&self, i: usize, j: usize) -> f64 {
        self.duration_matrix[i][j]
    }

    #[inline]
    pub fn visit(&self, i: usize) -> f64 {
        self.visit_seconds[i]
    }

    /// Closed tour length in meters; the return leg to `tour[0]` is implicit
    pub fn tour_length(&self, tour: &[usize]) -> f64 {
        self.closed_sum(tour, &self.distance_matrix)
    }

    /// Closed tour travel time in seconds
    pub fn tour_duration(&self, tour: &[usize]) -> f64 {
        self.closed_sum(tour, &self.duration_matrix)
    }

    /// Visit time in seconds of every node but the start
    pub fn tour_visit_time(&self, tour: &[usize]) -> f64 {
        tour.iter().skip(1).map(|&n| self.visit(n)).sum()
    }

    /// Travel plus visit time
    pub fn tour_time(&self, tour: &[usize]) -> f64 {
        self.tour_duration(tour) + self.tour_visit_time(tour)
    }

    fn closed_sum(&self, tour: &[usize], matrix: &[Vec<f64>]) -> f64 {
        if tour.len() < 2 {
            return 0.0;
        }
        let legs: f64 = tour.windows(2).map(|w| matrix[w[0]][w[1]]).sum();
        legs + matrix[tour[tour.len() - 1]][tour[0]]
    }

    /// Tour starts at 0 and visits every node exactly once
    pub fn is_complete(&self, tour: &[usize]) -> bool {
        let n = self.dimension();
        if tour.len() != n || tour.first() != Some(&0) {
            return false;
        }
        let mut seen = vec![false; n];
        for &node in tour {
            if node >= n || seen[node] {
                return false;
            }
            seen[node] = true;
        }
        true
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::category::CategoryDurations;

    /// Problem from a distance matrix; durations mirror distances in seconds
    pub(crate) fn problem_from_distances(distance: Vec<Vec<f64>>) -> TourProblem {
        let n = distance.len();
        let coords = (0..n).map(|i| Coordinate::new(i as f64 * 0.001, 0.0)).collect();
        let matrices = RouteMatrices::new(distance.clone(), distance);
        TourProblem::without_visits(coords, matrices).unwrap()
    }

    /// Unit square with 1000 m sides, diagonals ~1414 m
    pub(crate) fn square_problem() -> TourProblem {
        let d = 1000.0;
        let g = 1414.0;
        problem_from_distances(vec![
            vec![0.0, d, g, d],
            vec![d, 0.0, d, g],
            vec![g, d, 0.0, d],
            vec![d, g, d, 0.0],
        ])
    }

    /// Deterministic pseudo-random asymmetric instance
    pub(crate) fn scattered_problem(n: usize, seed: u64) -> TourProblem {
        use rand::prelude::*;
        use rand_chacha::ChaCha8Rng;

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let pts: Vec<(f64, f64)> = (0..n)
            .map(|_| (rng.gen_range(0.0..5000.0), rng.gen_range(0.0..5000.0)))
            .collect();
        let mut distance = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    let dx = pts[i].0 - pts[j].0;
                    let dy = pts[i].1 - pts[j].1;
                    // one-way streets make some legs longer
                    let detour = if (i + j) % 3 == 0 && i < j { 1.2 } else { 1.0 };
                    distance[i][j] = (dx * dx + dy * dy).sqrt() * detour;
                }
            }
        }
        problem_from_distances(distance)
    }

    #[test]
    fn test_tour_metrics() {
        let problem = square_problem();
        assert_eq!(problem.tour_length(&[0, 1, 2, 3]), 4000.0);
        assert_eq!(problem.tour_length(&[0, 2, 1, 3]), 1414.0 * 2.0 + 2000.0);
        assert!(problem.is_complete(&[0, 3, 2, 1]));
        assert!(!problem.is_complete(&[0, 1, 1, 3]));
        assert!(!problem.is_complete(&[1, 0, 2, 3]));
    }

    #[test]
    fn test_visit_time_skips_start() {
        let coords = vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.01), Coordinate::new(0.01, 0.0)];
        let m = vec![vec![0.0; 3]; 3];
        let metadata = vec![
            PoiMetadata::new(Some("museum"), Some("art")),
            PoiMetadata::new(Some("museum"), Some("art")),
            PoiMetadata::default(),
        ];
        let table = CategoryDurations::new().with_entry("museum", Some("art"), 45.0);
        let problem =
            TourProblem::with_durations(coords, RouteMatrices::new(m.clone(), m), &metadata, &table).unwrap();

        assert_eq!(problem.tour_visit_time(&[0, 1, 2]), 2700.0 + 1800.0);
    }

    #[test]
    fn test_instance_from_json() {
        let raw = r#"{"pois": [
            {"latitude": 45.0, "longitude": 7.0},
            {"latitude": 45.1, "longitude": 7.1, "category": "museum", "subCategory": "art"}
        ]}"#;
        let instance = PoiInstance::from_json(raw, "fixture").unwrap();
        assert_eq!(instance.name, "fixture");
        assert_eq!(instance.len(), 2);
        assert_eq!(instance.metadata[1].sub_category.as_deref(), Some("art"));

        let stats = instance.statistics();
        assert_eq!(stats.num_categorized, 1);
        assert!(stats.max_distance > 10_000.0);
    }

    #[test]
    fn test_instance_rejects_bad_coordinates() {
        let raw = r#"{"pois": [{"latitude": 95.0, "longitude": 7.0}]}"#;
        assert!(PoiInstance::from_json(raw, "bad").is_err());
    }
}

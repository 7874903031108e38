//! Distance and duration matrices, and the providers that supply them.
//!
//! Real road-network matrices come from an external routing service; this
//! crate only consumes them through [`MatrixProvider`]. Matrices are never
//! assumed to be symmetric or to respect the triangle inequality.

use crate::error::{PlannerError, Result};
use crate::geo::{haversine_meters, Coordinate, CoordinateIndex};

/// Average travel speed assumed by [`HaversineMatrixProvider`].
const DEFAULT_SPEED_KMH: f64 = 40.0;

/// Pairwise costs aligned to a coordinate list: meters and seconds
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatrices {
    pub distance: Vec<Vec<f64>>,
    pub duration: Vec<Vec<f64>>,
}

impl RouteMatrices {
    pub fn new(distance: Vec<Vec<f64>>, duration: Vec<Vec<f64>>) -> Self {
        RouteMatrices { distance, duration }
    }

    pub fn dimension(&self) -> usize {
        self.distance.len()
    }

    /// Check both matrices are `n x n` with finite, non-negative entries
    pub fn validate(&self, n: usize) -> Result<()> {
        for (name, matrix) in [("distance", &self.distance), ("duration", &self.duration)] {
            if matrix.len() != n {
                return Err(PlannerError::upstream(format!(
                    "{} matrix has {} rows, expected {}",
                    name,
                    matrix.len(),
                    n
                )));
            }
            for (i, row) in matrix.iter().enumerate() {
                if row.len() != n {
                    return Err(PlannerError::upstream(format!(
                        "{} matrix row {} has {} columns, expected {}",
                        name,
                        i,
                        row.len(),
                        n
                    )));
                }
                if let Some(bad) = row.iter().find(|v| !v.is_finite() || **v < 0.0) {
                    return Err(PlannerError::upstream(format!(
                        "{} matrix row {} contains invalid value {}",
                        name, i, bad
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Supplies distance/duration matrices for a coordinate list.
///
/// Implementations must reject fewer than two coordinates with
/// [`PlannerError::UpstreamMatrix`]. Retrying belongs to the implementation,
/// never to the caller.
pub trait MatrixProvider {
    fn route_matrices(&self, coords: &[Coordinate]) -> Result<RouteMatrices>;
}

impl<T: MatrixProvider + ?Sized> MatrixProvider for &T {
    fn route_matrices(&self, coords: &[Coordinate]) -> Result<RouteMatrices> {
        (**self).route_matrices(coords)
    }
}

fn ensure_enough_coordinates(coords: &[Coordinate]) -> Result<()> {
    if coords.len() < 2 {
        return Err(PlannerError::upstream(format!(
            "matrix request needs at least 2 coordinates, got {}",
            coords.len()
        )));
    }
    Ok(())
}

/// Great-circle matrices with travel time at an assumed constant speed.
///
/// Ignores the road network, so it is always available.
#[derive(Debug, Clone)]
pub struct HaversineMatrixProvider {
    pub speed_kmh: f64,
}

impl Default for HaversineMatrixProvider {
    fn default() -> Self {
        HaversineMatrixProvider {
            speed_kmh: DEFAULT_SPEED_KMH,
        }
    }
}

impl HaversineMatrixProvider {
    pub fn new(speed_kmh: f64) -> Self {
        HaversineMatrixProvider { speed_kmh }
    }

    fn meters_to_seconds(&self, meters: f64) -> f64 {
        meters / (self.speed_kmh * 1000.0 / 3600.0)
    }
}

impl MatrixProvider for HaversineMatrixProvider {
    fn route_matrices(&self, coords: &[Coordinate]) -> Result<RouteMatrices> {
        ensure_enough_coordinates(coords)?;
        if self.speed_kmh.is_nan() || self.speed_kmh <= 0.0 {
            return Err(PlannerError::configuration(format!(
                "speed must be positive, got {} km/h",
                self.speed_kmh
            )));
        }

        let n = coords.len();
        let mut distance = vec![vec![0.0; n]; n];
        let mut duration = vec![vec![0.0; n]; n];

        for i in 0..n {
            for j in 0..n {
                if i != j {
                    let meters = haversine_meters(&coords[i], &coords[j]);
                    distance[i][j] = meters;
                    duration[i][j] = self.meters_to_seconds(meters);
                }
            }
        }

        Ok(RouteMatrices { distance, duration })
    }
}

/// Precomputed matrices for a known coordinate set.
///
/// Requests for any subset are answered by coordinate lookup, which is how
/// matrices fetched for the raw POI list are reused for the clustered list.
#[derive(Debug, Clone)]
pub struct StaticMatrixProvider {
    index: CoordinateIndex,
    matrices: RouteMatrices,
}

impl StaticMatrixProvider {
    pub fn new(coords: &[Coordinate], matrices: RouteMatrices) -> Result<Self> {
        matrices.validate(coords.len())?;
        Ok(StaticMatrixProvider {
            index: CoordinateIndex::new(coords),
            matrices,
        })
    }

    /// Build from a distance matrix alone, deriving durations at `speed_kmh`
    pub fn from_distances(coords: &[Coordinate], distance: Vec<Vec<f64>>, speed_kmh: f64) -> Result<Self> {
        let mps = speed_kmh * 1000.0 / 3600.0;
        let duration = distance
            .iter()
            .map(|row| row.iter().map(|d| d / mps).collect())
            .collect();
        Self::new(coords, RouteMatrices::new(distance, duration))
    }

    pub fn distance_between(&self, from: &Coordinate, to: &Coordinate) -> Option<f64> {
        self.index.lookup(&self.matrices.distance, from, to)
    }

    pub fn duration_between(&self, from: &Coordinate, to: &Coordinate) -> Option<f64> {
        self.index.lookup(&self.matrices.duration, from, to)
    }
}

impl MatrixProvider for StaticMatrixProvider {
    fn route_matrices(&self, coords: &[Coordinate]) -> Result<RouteMatrices> {
        ensure_enough_coordinates(coords)?;

        let rows: Vec<usize> = coords
            .iter()
            .map(|c| {
                self.index.row(c).ok_or_else(|| {
                    PlannerError::upstream(format!(
                        "no matrix entry for ({}, {})",
                        c.latitude, c.longitude
                    ))
                })
            })
            .collect::<Result<_>>()?;

        let pick = |m: &Vec<Vec<f64>>| -> Vec<Vec<f64>> {
            rows.iter()
                .map(|&i| rows.iter().map(|&j| m[i][j]).collect())
                .collect()
        };

        Ok(RouteMatrices {
            distance: pick(&self.matrices.distance),
            duration: pick(&self.matrices.duration),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords() -> Vec<Coordinate> {
        vec![
            Coordinate::new(45.0, 7.0),
            Coordinate::new(45.01, 7.0),
            Coordinate::new(45.0, 7.01),
        ]
    }

    #[test]
    fn test_haversine_provider_shape() {
        let provider = HaversineMatrixProvider::default();
        let m = provider.route_matrices(&coords()).unwrap();
        assert_eq!(m.dimension(), 3);
        for i in 0..3 {
            assert_eq!(m.distance[i][i], 0.0);
            assert_eq!(m.duration[i][i], 0.0);
        }
        assert!(m.validate(3).is_ok());
    }

    #[test]
    fn test_speed_conversion() {
        let provider = HaversineMatrixProvider::new(36.0);
        // 36 km/h is 10 m/s
        assert!((provider.meters_to_seconds(1000.0) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_single_coordinate() {
        let provider = HaversineMatrixProvider::default();
        let err = provider.route_matrices(&coords()[..1]).unwrap_err();
        assert!(matches!(err, PlannerError::UpstreamMatrix(_)));
    }

    #[test]
    fn test_static_provider_subset_lookup() {
        let c = coords();
        let distance = vec![
            vec![0.0, 5.0, 7.0],
            vec![6.0, 0.0, 9.0],
            vec![8.0, 10.0, 0.0],
        ];
        let provider = StaticMatrixProvider::from_distances(&c, distance, 36.0).unwrap();

        let sub = provider.route_matrices(&[c[2], c[0]]).unwrap();
        assert_eq!(sub.distance, vec![vec![0.0, 8.0], vec![7.0, 0.0]]);
        assert!((sub.duration[0][1] - 0.8).abs() < 1e-9);
        assert_eq!(provider.distance_between(&c[1], &c[2]), Some(9.0));

        let unknown = Coordinate::new(1.0, 1.0);
        assert!(provider.route_matrices(&[c[0], unknown]).is_err());
    }

    #[test]
    fn test_validate_rejects_malformed() {
        let m = RouteMatrices::new(vec![vec![0.0, 1.0]], vec![vec![0.0, 1.0]]);
        assert!(m.validate(2).is_err());

        let m = RouteMatrices::new(
            vec![vec![0.0, f64::NAN], vec![1.0, 0.0]],
            vec![vec![0.0, 1.0], vec![1.0, 0.0]],
        );
        assert!(m.validate(2).is_err());
    }
}

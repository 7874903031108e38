//! Greedy POI clustering.
//!
//! Nearby POIs are collapsed into a single representative before any expensive
//! search. Each cluster is grown from a seed and absorbs the unvisited interior
//! POIs lying within `max_distance` of that seed. Membership is not transitive:
//! two POIs close to each other can still land in different clusters when no
//! single seed is close to both.

use crate::category::PoiMetadata;
use crate::geo::{haversine_meters, Coordinate};
use serde::{Deserialize, Serialize};

/// One node of the clustered sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterRecord {
    /// Coordinate of the seed
    pub representative: Coordinate,
    /// Category metadata inherited from the seed
    pub metadata: PoiMetadata,
    /// Original indices, seed first, then in order of absorption
    pub clustered_ids: Vec<usize>,
}

impl ClusterRecord {
    fn singleton(index: usize, coordinate: Coordinate, metadata: Option<&[PoiMetadata]>) -> Self {
        ClusterRecord {
            representative: coordinate,
            metadata: metadata_at(metadata, index),
            clustered_ids: vec![index],
        }
    }

    pub fn seed(&self) -> usize {
        self.clustered_ids[0]
    }

    pub fn size(&self) -> usize {
        self.clustered_ids.len()
    }
}

/// Output of [`cluster`]: `pois[i]` is the representative of `records[i]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Clustering {
    pub pois: Vec<Coordinate>,
    pub records: Vec<ClusterRecord>,
}

impl Clustering {
    pub fn len(&self) -> usize {
        self.pois.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pois.is_empty()
    }

    /// Number of original POIs covered
    pub fn original_count(&self) -> usize {
        self.records.iter().map(|r| r.size()).sum()
    }

    pub fn metadata(&self) -> Vec<PoiMetadata> {
        self.records.iter().map(|r| r.metadata.clone()).collect()
    }
}

fn metadata_at(metadata: Option<&[PoiMetadata]>, index: usize) -> PoiMetadata {
    metadata
        .and_then(|m| m.get(index))
        .cloned()
        .unwrap_or_default()
}

/// Cluster `pois` with seed radius `max_distance` (meters).
///
/// The first and last POIs (start and end) are never merged and always keep
/// the first and last slots of the result.
pub fn cluster(pois: &[Coordinate], max_distance: f64, metadata: Option<&[PoiMetadata]>) -> Clustering {
    let n = pois.len();

    if n <= 2 {
        let records = pois
            .iter()
            .enumerate()
            .map(|(i, &p)| ClusterRecord::singleton(i, p, metadata))
            .collect();
        return Clustering { pois: pois.to_vec(), records };
    }

    let mut records = Vec::new();
    records.push(ClusterRecord::singleton(0, pois[0], metadata));

    let last = n - 1;
    let mut visited = vec![false; n];

    for seed in 1..last {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;

        let mut clustered_ids = vec![seed];
        for other in (seed + 1)..last {
            if visited[other] {
                continue;
            }
            if haversine_meters(&pois[seed], &pois[other]) <= max_distance {
                visited[other] = true;
                clustered_ids.push(other);
            }
        }

        records.push(ClusterRecord {
            representative: pois[seed],
            metadata: metadata_at(metadata, seed),
            clustered_ids,
        });
    }

    records.push(ClusterRecord::singleton(last, pois[last], metadata));

    log::debug!(
        "Clustered {} POIs into {} nodes (radius {:.1} m)",
        n,
        records.len(),
        max_distance
    );

    Clustering {
        pois: records.iter().map(|r| r.representative).collect(),
        records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    // ~111 m per 0.001 degree of latitude
    fn line_of_pois(count: usize, step_deg: f64) -> Vec<Coordinate> {
        (0..count)
            .map(|i| Coordinate::new(45.0 + i as f64 * step_deg, 7.0))
            .collect()
    }

    #[test]
    fn test_small_inputs_are_unclustered() {
        let pois = line_of_pois(2, 0.0);
        let result = cluster(&pois, 1000.0, None);
        assert_eq!(result.len(), 2);
        assert_eq!(result.records[0].clustered_ids, vec![0]);
        assert_eq!(result.records[1].clustered_ids, vec![1]);
    }

    #[test]
    fn test_identity_partition_when_radius_is_small() {
        let pois = line_of_pois(6, 0.01);
        let result = cluster(&pois, 10.0, None);
        assert_eq!(result.len(), 6);
        for (i, record) in result.records.iter().enumerate() {
            assert_eq!(record.clustered_ids, vec![i]);
        }
    }

    #[test]
    fn test_start_and_end_never_merged() {
        // Everything sits on the same spot
        let pois = vec![Coordinate::new(45.0, 7.0); 5];
        let result = cluster(&pois, 100.0, None);

        assert_eq!(result.len(), 3);
        assert_eq!(result.records[0].clustered_ids, vec![0]);
        assert_eq!(result.records[1].clustered_ids, vec![1, 2, 3]);
        assert_eq!(result.records[2].clustered_ids, vec![4]);
    }

    #[test]
    fn test_membership_is_seed_based_not_transitive() {
        // 1 and 2 are 80 m apart, 2 and 3 are 80 m apart, 1 and 3 are 160 m apart
        let pois = vec![
            Coordinate::new(45.1, 7.1),
            Coordinate::new(45.0, 7.0),
            Coordinate::new(45.00072, 7.0),
            Coordinate::new(45.00144, 7.0),
            Coordinate::new(45.2, 7.2),
        ];
        let result = cluster(&pois, 100.0, None);

        assert_eq!(result.records[1].clustered_ids, vec![1, 2]);
        assert_eq!(result.records[2].clustered_ids, vec![3]);
    }

    #[test]
    fn test_every_index_appears_once_and_metadata_follows_seed() {
        let pois = vec![
            Coordinate::new(45.0, 7.0),
            Coordinate::new(45.01, 7.0),
            Coordinate::new(45.0101, 7.0),
            Coordinate::new(45.02, 7.0),
            Coordinate::new(45.03, 7.0),
        ];
        let metadata = vec![
            PoiMetadata::default(),
            PoiMetadata::new(Some("museum"), Some("art")),
            PoiMetadata::new(Some("park"), None),
            PoiMetadata::new(Some("cafe"), None),
            PoiMetadata::default(),
        ];
        let result = cluster(&pois, 50.0, Some(&metadata));

        let all: Vec<usize> = result.records.iter().flat_map(|r| r.clustered_ids.clone()).collect();
        let unique: HashSet<usize> = all.iter().copied().collect();
        assert_eq!(all.len(), pois.len());
        assert_eq!(unique.len(), pois.len());
        assert_eq!(result.records[1].metadata.category.as_deref(), Some("museum"));
        assert_eq!(result.original_count(), 5);
    }
}

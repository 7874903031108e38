//! Geographic primitives: coordinates, great-circle distance and
//! coordinate-keyed matrix lookups.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A point on the globe, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Coordinate { latitude, longitude }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Bit-exact lookup key for this coordinate
    pub fn key(&self) -> CoordinateKey {
        CoordinateKey(self.latitude.to_bits(), self.longitude.to_bits())
    }
}

/// Hashable key built from the raw bits of both components.
///
/// Two coordinates share a key only when their floats are bit-identical, so
/// `-0.0` and `0.0` are distinct keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordinateKey(u64, u64);

/// Great-circle distance in meters
pub fn haversine_meters(from: &Coordinate, to: &Coordinate) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lng = (to.longitude - from.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c
}

/// Arithmetic mean of latitudes and longitudes
pub fn centroid(points: &[Coordinate]) -> Option<Coordinate> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let lat = points.iter().map(|p| p.latitude).sum::<f64>() / n;
    let lng = points.iter().map(|p| p.longitude).sum::<f64>() / n;
    Some(Coordinate::new(lat, lng))
}

/// Maps coordinates to their row in a matrix built for a coordinate list.
///
/// Duplicated coordinates resolve to their first occurrence.
#[derive(Debug, Clone, Default)]
pub struct CoordinateIndex {
    rows: HashMap<CoordinateKey, usize>,
}

impl CoordinateIndex {
    pub fn new(coords: &[Coordinate]) -> Self {
        let mut rows = HashMap::with_capacity(coords.len());
        for (i, c) in coords.iter().enumerate() {
            rows.entry(c.key()).or_insert(i);
        }
        CoordinateIndex { rows }
    }

    pub fn row(&self, coord: &Coordinate) -> Option<usize> {
        self.rows.get(&coord.key()).copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up `matrix[from][to]` by coordinate instead of by index
    pub fn lookup(&self, matrix: &[Vec<f64>], from: &Coordinate, to: &Coordinate) -> Option<f64> {
        let i = self.row(from)?;
        let j = self.row(to)?;
        matrix.get(i).and_then(|r| r.get(j)).copied()
    }
}

/// Proper intersection test for segments `p1-p2` and `p3-p4` in the
/// (longitude, latitude) plane. Shared endpoints do not count.
pub fn segments_intersect(p1: &Coordinate, p2: &Coordinate, p3: &Coordinate, p4: &Coordinate) -> bool {
    fn orient(a: &Coordinate, b: &Coordinate, c: &Coordinate) -> f64 {
        (b.longitude - a.longitude) * (c.latitude - a.latitude)
            - (b.latitude - a.latitude) * (c.longitude - a.longitude)
    }

    if p1 == p3 || p1 == p4 || p2 == p3 || p2 == p4 {
        return false;
    }

    let d1 = orient(p3, p4, p1);
    let d2 = orient(p3, p4, p2);
    let d3 = orient(p1, p2, p3);
    let d4 = orient(p1, p2, p4);

    ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}

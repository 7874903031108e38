//! Route expansion.
//!
//! A tour over clustered nodes is mapped back onto the original POI list: each
//! clustered stop is replaced by every POI its cluster absorbed, seed first and
//! then in absorption order. Matching is by clustered index only.

use crate::clustering::ClusterRecord;
use crate::error::{PlannerError, Result};
use crate::geo::Coordinate;
use crate::instance::TourProblem;
use crate::solution::{Route, Tour};

/// Original POI indices in visiting order, each exactly once
pub fn expand_order(order: &[usize], records: &[ClusterRecord]) -> Result<Vec<usize>> {
    let original_count = records.iter().flat_map(|r| r.clustered_ids.iter()).map(|&i| i + 1).max().unwrap_or(0);
    let mut seen = vec![false; original_count];
    let mut expanded = Vec::with_capacity(original_count);

    for &node in order {
        let record = records.get(node).ok_or_else(|| {
            PlannerError::validation(format!("tour references node {} but only {} clusters exist", node, records.len()))
        })?;
        for &original in &record.clustered_ids {
            if !seen[original] {
                seen[original] = true;
                expanded.push(original);
            }
        }
    }

    Ok(expanded)
}

/// Build the full [`Route`] for a tour computed over `problem`.
///
/// Travel aggregates follow the clustered tour (closed for 3+ nodes, a single
/// leg for two). Visit time covers every original POI except the start, using
/// `visit_seconds` indexed by original POI.
pub fn expand_route(
    tour: &Tour,
    problem: &TourProblem,
    records: &[ClusterRecord],
    pois: &[Coordinate],
    visit_seconds: &[f64],
    variant: Option<String>,
) -> Result<Route> {
    if !problem.is_complete(&tour.order) {
        return Err(PlannerError::validation(format!(
            "{} returned an incomplete tour {:?}",
            tour.algorithm, tour.order
        )));
    }

    let order = expand_order(&tour.order, records)?;
    if order.len() != pois.len() {
        return Err(PlannerError::validation(format!(
            "expanded route covers {} of {} POIs",
            order.len(),
            pois.len()
        )));
    }

    let (total_distance_m, travel_duration_s) = if tour.order.len() == 2 {
        let (a, b) = (tour.order[0], tour.order[1]);
        (problem.distance(a, b), problem.duration(a, b))
    } else {
        (problem.tour_length(&tour.order), problem.tour_duration(&tour.order))
    };

    let visit_duration_s: f64 = order
        .iter()
        .filter(|&&i| i != 0)
        .map(|&i| visit_seconds.get(i).copied().unwrap_or(0.0))
        .sum();

    let mut stops: Vec<Coordinate> = order.iter().map(|&i| pois[i]).collect();
    if stops.len() > 2 {
        stops.push(pois[order[0]]);
    }

    Ok(Route {
        stops,
        order,
        total_distance_m,
        travel_duration_s,
        visit_duration_s,
        total_time_s: travel_duration_s + visit_duration_s,
        algorithm: tour.algorithm.clone(),
        variant,
        optimality: tour.optimality,
        iterations: tour.iterations,
        clustered_count: problem.dimension(),
        warnings: tour.warnings.clone(),
    })
}

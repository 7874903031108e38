//! Bitonic sweep heuristic.
//!
//! Nodes are laid out along one axis (longitude, latitude, polar angle or
//! radius around the centroid) and the optimal bitonic tour over that order
//! is found in O(n²): one arm leaves the first node of the order moving
//! forward, the other comes back to it, and every node belongs to exactly one
//! arm. The closed cycle is then rotated so it begins at node 0. The matrices
//! may be asymmetric, so the table tracks which arm owns the newest node.

use crate::algorithm::{trivial_tour, TourAlgorithm};
use crate::budget::SearchBudget;
use crate::error::Result;
use crate::geo::{centroid, haversine_meters, Coordinate};
use crate::instance::TourProblem;
use crate::solution::{Optimality, Tour};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Axis along which nodes are ordered before the sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SweepStrategy {
    WestToEast,
    EastToWest,
    SouthToNorth,
    NorthToSouth,
    Clockwise,
    CounterClockwise,
    InsideOut,
    OutsideIn,
}

impl Default for SweepStrategy {
    fn default() -> Self {
        SweepStrategy::WestToEast
    }
}

impl SweepStrategy {
    pub const ALL: [SweepStrategy; 8] = [
        SweepStrategy::WestToEast,
        SweepStrategy::EastToWest,
        SweepStrategy::SouthToNorth,
        SweepStrategy::NorthToSouth,
        SweepStrategy::Clockwise,
        SweepStrategy::CounterClockwise,
        SweepStrategy::InsideOut,
        SweepStrategy::OutsideIn,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SweepStrategy::WestToEast => "west-east",
            SweepStrategy::EastToWest => "east-west",
            SweepStrategy::SouthToNorth => "south-north",
            SweepStrategy::NorthToSouth => "north-south",
            SweepStrategy::Clockwise => "clockwise",
            SweepStrategy::CounterClockwise => "counter-clockwise",
            SweepStrategy::InsideOut => "inside-out",
            SweepStrategy::OutsideIn => "outside-in",
        }
    }

    /// Sort key of a point; smaller keys come first
    fn key(&self, p: &Coordinate, center: &Coordinate) -> f64 {
        let angle = || (p.latitude - center.latitude).atan2(p.longitude - center.longitude);
        match self {
            SweepStrategy::WestToEast => p.longitude,
            SweepStrategy::EastToWest => -p.longitude,
            SweepStrategy::SouthToNorth => p.latitude,
            SweepStrategy::NorthToSouth => -p.latitude,
            SweepStrategy::Clockwise => -angle(),
            SweepStrategy::CounterClockwise => angle(),
            SweepStrategy::InsideOut => haversine_meters(p, center),
            SweepStrategy::OutsideIn => -haversine_meters(p, center),
        }
    }

    /// Every node, the start included, sorted by this strategy
    pub fn order(&self, coords: &[Coordinate]) -> Vec<usize> {
        let Some(center) = centroid(coords) else {
            return Vec::new();
        };
        let mut order: Vec<usize> = (0..coords.len()).collect();
        order.sort_by_key(|&i| (OrderedFloat(self.key(&coords[i], &center)), i));
        order
    }
}

impl std::fmt::Display for SweepStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for SweepStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        SweepStrategy::ALL
            .iter()
            .copied()
            .find(|st| st.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown sweep strategy '{}'", s))
    }
}

/// Which arm holds the newest node of a state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arm {
    /// Newest node ends the outgoing arm
    Out,
    /// Newest node starts the returning arm
    Back,
}

#[derive(Debug, Clone, Copy)]
struct Step {
    cost: f64,
    /// (arm, other endpoint) of the state this one was extended from
    from: Option<(Arm, usize)>,
}

const UNSET: Step = Step { cost: f64::INFINITY, from: None };

/// Bitonic tour table over a fixed sweep order.
///
/// `out[a][j]`: nodes `0..=j` covered, the outgoing arm ends at `j`, the
/// returning arm starts at `a < j`. `back[a][j]` is the mirror image. Node
/// positions refer to the sweep order, not to problem indices.
struct BitonicTable {
    out: Vec<Vec<Step>>,
    back: Vec<Vec<Step>>,
}

pub struct BitonicSweepHeuristic {
    pub strategy: SweepStrategy,
}

impl BitonicSweepHeuristic {
    pub fn new(strategy: SweepStrategy) -> Self {
        BitonicSweepHeuristic { strategy }
    }

    fn fill(problem: &TourProblem, order: &[usize], budget: &SearchBudget) -> Result<BitonicTable> {
        let n = order.len();
        let t = |a: usize, b: usize| problem.duration(order[a], order[b]);
        let v = |a: usize| problem.visit(order[a]);

        let mut out = vec![vec![UNSET; n]; n];
        let mut back = vec![vec![UNSET; n]; n];

        out[0][1] = Step { cost: t(0, 1) + v(1), from: None };
        back[0][1] = Step { cost: t(1, 0) + v(1), from: None };

        for j in 1..n - 1 {
            budget.check()?;
            let next = j + 1;
            let visit = v(next);

            for a in 0..j {
                let o = out[a][j];
                if o.cost.is_finite() {
                    // extend the outgoing arm
                    let c = o.cost + t(j, next) + visit;
                    if c < out[a][next].cost {
                        out[a][next] = Step { cost: c, from: Some((Arm::Out, a)) };
                    }
                    // or hang the new node in front of the returning arm
                    let c = o.cost + t(next, a) + visit;
                    if c < back[j][next].cost {
                        back[j][next] = Step { cost: c, from: Some((Arm::Out, a)) };
                    }
                }

                let b = back[a][j];
                if b.cost.is_finite() {
                    let c = b.cost + t(next, j) + visit;
                    if c < back[a][next].cost {
                        back[a][next] = Step { cost: c, from: Some((Arm::Back, a)) };
                    }
                    let c = b.cost + t(a, next) + visit;
                    if c < out[j][next].cost {
                        out[j][next] = Step { cost: c, from: Some((Arm::Back, a)) };
                    }
                }
            }
        }

        Ok(BitonicTable { out, back })
    }

    /// Walk the predecessor links back from the closing state; returns sweep
    /// positions in visiting order, beginning at position 0
    fn reconstruct(table: &BitonicTable, n: usize, mut arm: Arm, mut other: usize) -> Option<Vec<usize>> {
        let mut outgoing = Vec::new();
        let mut returning = Vec::new();

        let mut j = n - 1;
        loop {
            match arm {
                Arm::Out => outgoing.push(j),
                Arm::Back => returning.push(j),
            }
            if j == 1 {
                break;
            }
            let step = match arm {
                Arm::Out => table.out[other][j],
                Arm::Back => table.back[other][j],
            };
            // predecessor state has j - 1 as its newest node
            let (prev_arm, prev_other) = step.from?;
            arm = prev_arm;
            other = prev_other;
            j -= 1;
        }

        outgoing.reverse();
        let mut tour = Vec::with_capacity(n);
        tour.push(0);
        tour.extend(outgoing);
        tour.extend(returning);
        Some(tour)
    }
}

impl TourAlgorithm for BitonicSweepHeuristic {
    fn solve(&self, problem: &TourProblem, budget: &SearchBudget) -> Result<Tour> {
        if let Some(tour) = trivial_tour(problem, self.name())? {
            return Ok(tour);
        }

        let order = self.strategy.order(&problem.coords);
        let n = order.len();
        let table = Self::fill(problem, &order, budget)?;
        let t = |a: usize, b: usize| problem.duration(order[a], order[b]);

        let last = n - 1;
        let mut best: Option<(f64, Arm, usize)> = None;
        for a in 0..last {
            let closing_out = table.out[a][last].cost + t(last, a);
            if best.map_or(true, |(c, _, _)| closing_out < c) {
                best = Some((closing_out, Arm::Out, a));
            }
            let closing_back = table.back[a][last].cost + t(a, last);
            if best.map_or(true, |(c, _, _)| closing_back < c) {
                best = Some((closing_back, Arm::Back, a));
            }
        }

        let reconstructed = best
            .filter(|(c, _, _)| c.is_finite())
            .and_then(|(_, arm, a)| Self::reconstruct(&table, n, arm, a))
            .map(|positions| {
                let mut tour: Vec<usize> = positions.into_iter().map(|p| order[p]).collect();
                // same cycle and direction, read from the start node
                if let Some(at) = tour.iter().position(|&node| node == 0) {
                    tour.rotate_left(at);
                }
                tour
            });

        match reconstructed {
            Some(tour) if problem.is_complete(&tour) => {
                let cost = problem.tour_time(&tour);
                Ok(Tour::new(tour, cost, self.name(), Optimality::Heuristic))
            }
            _ => Ok(Tour::degenerate(problem, self.name(), "bitonic table has no closing state")),
        }
    }

    fn name(&self) -> &str {
        "BitonicSweep"
    }
}

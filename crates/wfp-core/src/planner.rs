// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::geo::{distance_km, Coordinate};
use crate::poi::PointOfInterest;
use serde::{Deserialize, Serialize};

/// A leg between two consecutive stops. Always derivable from the plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub from: Coordinate,
    pub to: Coordinate,
}

impl Segment {
    pub fn new(from: Coordinate, to: Coordinate) -> Self {
        Self { from, to }
    }

    pub fn length_km(&self) -> f64 {
        distance_km(self.from, self.to)
    }
}

/// Greedy nearest-neighbour visiting order starting at `start`.
///
/// O(n²) and not a TSP solver. Ties go to the candidate that appears first
/// in `remaining`. `start` must be finite; it is not validated here.
pub fn plan(start: Coordinate, remaining: &[PointOfInterest]) -> Vec<PointOfInterest> {
    let mut pool: Vec<&PointOfInterest> = remaining.iter().collect();
    let mut order = Vec::with_capacity(pool.len());
    let mut cursor = start;

    while !pool.is_empty() {
        let mut best_idx = 0;
        let mut best_dist = f64::INFINITY;
        for (i, candidate) in pool.iter().enumerate() {
            let d = distance_km(cursor, candidate.coordinate());
            if d < best_dist {
                best_dist = d;
                best_idx = i;
            }
        }
        // `remove` keeps the relative order of the rest, so ties stay stable.
        let next = pool.remove(best_idx);
        cursor = next.coordinate();
        order.push(next.clone());
    }

    order
}

/// Same order as `plan`, reduced to bare coordinates.
pub fn ordered_coordinates(start: Coordinate, pois: &[PointOfInterest]) -> Vec<Coordinate> {
    plan(start, pois)
        .iter()
        .map(PointOfInterest::coordinate)
        .collect()
}

/// Legs between consecutive stops of a plan.
pub fn static_segments(plan: &[PointOfInterest]) -> Vec<Segment> {
    plan.windows(2)
        .map(|w| Segment::new(w[0].coordinate(), w[1].coordinate()))
        .collect()
}

/// Total length of the route, including the leg from `start` to the first stop.
pub fn route_length_km(start: Coordinate, plan: &[PointOfInterest]) -> f64 {
    let mut cursor = start;
    let mut total = 0.0;
    for stop in plan {
        total += distance_km(cursor, stop.coordinate());
        cursor = stop.coordinate();
    }
    total
}

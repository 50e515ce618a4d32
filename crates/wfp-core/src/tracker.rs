// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::geo::{distance_km, Coordinate};
use crate::planner::{self, Segment};
use crate::poi::{self, PointOfInterest};
use serde_json::Value;
use std::collections::HashSet;

/// Default arrival radius (200 m).
pub const DEFAULT_ARRIVAL_THRESHOLD_KM: f64 = 0.2;

/// Checks whether `live` has reached the head of `plan`.
///
/// Returns the target id the first time it comes within `threshold_km`, and
/// records it in `visited`. Later calls for the same id return `None` no
/// matter how long the aircraft lingers inside the threshold.
pub fn check_arrival(
    live: Coordinate,
    plan: &[PointOfInterest],
    visited: &mut HashSet<String>,
    threshold_km: f64,
) -> Option<String> {
    let target = plan.first()?;
    let d = distance_km(live, target.coordinate());
    if d <= threshold_km && !visited.contains(&target.id) {
        visited.insert(target.id.clone());
        Some(target.id.clone())
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Arrival {
    pub poi: PointOfInterest,
    /// Leg from the live position at arrival time to the reached stop.
    pub segment: Segment,
    pub remaining: usize,
}

/// Owner of the remaining/visited state. Nothing else mutates it; all
/// changes go through `replace_pois`, `replan` and `observe`.
#[derive(Debug, Clone)]
pub struct RouteTracker {
    threshold_km: f64,
    remaining: Vec<PointOfInterest>,
    plan: Vec<PointOfInterest>,
    visited: HashSet<String>,
    completed: Vec<Segment>,
    epoch: u64,
}

impl Default for RouteTracker {
    fn default() -> Self {
        Self::new(DEFAULT_ARRIVAL_THRESHOLD_KM)
    }
}

impl RouteTracker {
    pub fn new(threshold_km: f64) -> Self {
        Self {
            threshold_km,
            remaining: Vec::new(),
            plan: Vec::new(),
            visited: HashSet::new(),
            completed: Vec::new(),
            epoch: 0,
        }
    }

    pub fn threshold_km(&self) -> f64 {
        self.threshold_km
    }

    pub fn set_threshold_km(&mut self, threshold_km: f64) {
        self.threshold_km = threshold_km;
    }

    /// Replaces the POI source wholesale: normalises `raw`, starts a new
    /// planning epoch and plans from `start` when one is known.
    pub fn replace_pois(&mut self, raw: &[Value], start: Option<Coordinate>) {
        let pois = poi::normalize(raw);
        self.replace_normalized(pois, start);
    }

    /// Same as `replace_pois` for records that are already normalised.
    pub fn replace_normalized(&mut self, pois: Vec<PointOfInterest>, start: Option<Coordinate>) {
        self.remaining = pois;
        self.visited.clear();
        self.completed.clear();
        self.epoch += 1;

        match start.filter(Coordinate::is_finite) {
            Some(start) => self.replan(start),
            None => {
                log::info!(
                    "No valid starting position; route left empty — remaining={}",
                    self.remaining.len()
                );
                self.plan.clear();
            }
        }
    }

    /// True when POIs are loaded but no order exists yet, i.e. they arrived
    /// before the first position fix.
    pub fn needs_plan(&self) -> bool {
        self.plan.is_empty() && !self.remaining.is_empty()
    }

    /// Plans from `live` if the remaining set has no order yet. Returns true
    /// when a plan was made.
    pub fn ensure_planned(&mut self, live: Coordinate) -> bool {
        if !self.needs_plan() || !live.is_finite() {
            return false;
        }
        log::info!(
            "Planning deferred route from first fix — start={} remaining={}",
            live,
            self.remaining.len()
        );
        self.replan(live);
        true
    }

    /// Recomputes the whole order from `start`.
    pub fn replan(&mut self, start: Coordinate) {
        if !start.is_finite() {
            log::warn!("Ignoring replan from non-finite start — start={:?}", start);
            return;
        }
        self.plan = planner::plan(start, &self.remaining);
        log::debug!(
            "Route planned — epoch={} stops={} start={}",
            self.epoch,
            self.plan.len(),
            start
        );
    }

    /// Feeds one live position sample. On arrival the target leaves the
    /// remaining set and the rest is replanned from `live`.
    pub fn observe(&mut self, live: Coordinate) -> Option<Arrival> {
        if !live.is_finite() {
            return None;
        }
        self.ensure_planned(live);
        let arrived_id = check_arrival(live, &self.plan, &mut self.visited, self.threshold_km)?;

        let idx = self.remaining.iter().position(|p| p.id == arrived_id);
        let poi = match idx {
            Some(i) => self.remaining.remove(i),
            None => self.plan[0].clone(),
        };
        // Ids may collide for coordinate-synthesised POIs; drop every copy.
        self.remaining.retain(|p| p.id != arrived_id);

        let segment = Segment::new(live, poi.coordinate());
        self.completed.push(segment);
        self.plan = planner::plan(live, &self.remaining);

        log::info!(
            "Arrived at POI — id={} title={} remaining={} epoch={}",
            poi.id,
            poi.title,
            self.remaining.len(),
            self.epoch
        );

        Some(Arrival {
            poi,
            segment,
            remaining: self.remaining.len(),
        })
    }

    pub fn plan(&self) -> &[PointOfInterest] {
        &self.plan
    }

    pub fn remaining(&self) -> &[PointOfInterest] {
        &self.remaining
    }

    pub fn visited(&self) -> &HashSet<String> {
        &self.visited
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn current_target(&self) -> Option<&PointOfInterest> {
        self.plan.first()
    }

    /// The live leg towards the current target, redrawn every tick.
    pub fn current_segment(&self, live: Coordinate) -> Option<Segment> {
        self.current_target()
            .map(|target| Segment::new(live, target.coordinate()))
    }

    pub fn upcoming_segments(&self) -> Vec<Segment> {
        planner::static_segments(&self.plan)
    }

    pub fn completed_segments(&self) -> &[Segment] {
        &self.completed
    }

    pub fn distance_to_target_km(&self, live: Coordinate) -> Option<f64> {
        self.current_target()
            .map(|target| distance_km(live, target.coordinate()))
    }

    /// Nothing left to visit. A loaded set still waiting for its first fix
    /// is not finished.
    pub fn is_finished(&self) -> bool {
        self.remaining.is_empty()
    }
}

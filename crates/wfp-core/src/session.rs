// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! The live navigation loop: one position poll per tick, arrival detection
//! against the current plan, and the host side effects that go with it.

use crate::config::RouteConfig;
use crate::export;
use crate::geo::Coordinate;
use crate::host::{
    MessageChannel, PositionSource, SimVars, EVENT_PAUSE_SET, UNIT_BOOL, VAR_NEXT_POI,
    VAR_START_FLIGHT,
};
use crate::planner::Segment;
use crate::poi::{self, PointOfInterest};
use crate::scheduler::{DelayedWrites, Interval};
use crate::tracker::{Arrival, RouteTracker};
use log::{debug, info, warn};
use serde_json::Value;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Poller not due, or the session was shut down.
    Idle,
    /// No usable position from the host this tick.
    NoFix,
    /// StartFlight is not raised; nothing is tracked.
    Inactive { position: Coordinate },
    /// Tracking, but nothing reached. `current_leg` is the live segment to
    /// the target, absent once the route is done.
    Tracking {
        position: Coordinate,
        current_leg: Option<Segment>,
        distance_km: Option<f64>,
    },
    Arrived(Arrival),
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub poll_interval: Duration,
    pub pulse_delay: Duration,
    pub auto_pause: bool,
    pub require_start_flight: bool,
    pub dedup_km: f64,
    pub arrival_threshold_km: f64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&RouteConfig::default())
    }
}

impl From<&RouteConfig> for SessionSettings {
    fn from(config: &RouteConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            pulse_delay: config.pulse_delay(),
            auto_pause: config.auto_pause,
            require_start_flight: config.require_start_flight,
            dedup_km: config.dedup_km,
            arrival_threshold_km: config.arrival_threshold_km,
        }
    }
}

pub struct NavigationSession<H: SimVars> {
    host: H,
    tracker: RouteTracker,
    poller: Interval,
    delayed: DelayedWrites,
    settings: SessionSettings,
    last_fix: Option<Coordinate>,
    shut_down: bool,
}

impl<H: SimVars> NavigationSession<H> {
    pub fn new(host: H, settings: SessionSettings) -> Self {
        Self {
            tracker: RouteTracker::new(settings.arrival_threshold_km),
            poller: Interval::new(settings.poll_interval),
            delayed: DelayedWrites::new(),
            host,
            settings,
            last_fix: None,
            shut_down: false,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn tracker(&self) -> &RouteTracker {
        &self.tracker
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn last_fix(&self) -> Option<Coordinate> {
        self.last_fix
    }

    /// Replaces the POI set with a fresh search result.
    ///
    /// Candidates are normalised, near-duplicates dropped, and a new planning
    /// epoch starts from `start` (or the host's current position). When a
    /// channel is given the ordered coordinates are exported through it too.
    pub fn load_pois(
        &mut self,
        raw: &[Value],
        start: Option<Coordinate>,
        channel: Option<&mut dyn MessageChannel>,
    ) -> Vec<PointOfInterest> {
        let candidates = poi::normalize(raw);
        let kept = poi::dedup_nearby(candidates, self.settings.dedup_km);

        let start = start
            .filter(Coordinate::is_finite)
            .or_else(|| self.host.position());

        self.tracker.replace_normalized(kept.clone(), start);
        info!(
            "Loaded POIs — raw={} kept={} planned={} epoch={}",
            raw.len(),
            kept.len(),
            self.tracker.plan().len(),
            self.tracker.epoch()
        );

        if let Some(channel) = channel {
            if !kept.is_empty() {
                export::send_ordered_pois(channel, start, &kept);
            }
        }
        kept
    }

    /// Replans the remaining set from an explicit new fix.
    pub fn replan_from(&mut self, start: Coordinate) {
        self.tracker.replan(start);
    }

    fn tracking_active(&self) -> bool {
        !self.settings.require_start_flight || self.host.get_bool(VAR_START_FLIGHT)
    }

    /// One cooperative step. Runs due delayed writes, then, if the poller is
    /// due, reads the latest position and checks for arrival.
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        if self.shut_down {
            return TickOutcome::Idle;
        }

        self.delayed.run_due(now, &mut self.host);

        if !self.poller.poll(now) {
            return TickOutcome::Idle;
        }

        let Some(position) = self.host.position() else {
            debug!("No position fix this tick");
            return TickOutcome::NoFix;
        };
        self.last_fix = Some(position);
        self.tracker.ensure_planned(position);

        if !self.tracking_active() {
            return TickOutcome::Inactive { position };
        }

        match self.tracker.observe(position) {
            Some(arrival) => {
                self.on_arrival(now);
                TickOutcome::Arrived(arrival)
            }
            None => TickOutcome::Tracking {
                position,
                current_leg: self.tracker.current_segment(position),
                distance_km: self.tracker.distance_to_target_km(position),
            },
        }
    }

    fn on_arrival(&mut self, now: Instant) {
        match self.host.set(VAR_NEXT_POI, UNIT_BOOL, 1.0) {
            Ok(()) => {
                self.delayed
                    .schedule(now + self.settings.pulse_delay, VAR_NEXT_POI, UNIT_BOOL, 0.0);
            }
            Err(e) => warn!("Failed to raise {} — error={}", VAR_NEXT_POI, e),
        }

        if self.settings.auto_pause {
            match self.host.set(EVENT_PAUSE_SET, UNIT_BOOL, 1.0) {
                Ok(()) => info!("Auto-pause requested on arrival"),
                Err(e) => warn!("Failed to request pause — error={}", e),
            }
        }
    }

    /// Stops the poller and drops pending delayed writes. Later ticks do
    /// nothing.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.poller.stop();
        let cancelled = self.delayed.cancel_all();
        self.shut_down = true;
        info!(
            "Navigation session stopped — cancelled_writes={}",
            cancelled
        );
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    pub fn pending_writes(&self) -> usize {
        self.delayed.len()
    }

    pub fn into_host(mut self) -> H {
        self.shutdown();
        self.host
    }
}

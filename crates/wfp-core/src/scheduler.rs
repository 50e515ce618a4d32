// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Explicit timers for the single-threaded tick loop. State is never
//! captured here; callers re-read their own state when a timer fires.

use crate::host::SimVars;
use std::time::{Duration, Instant};

/// Fixed-cadence poller. Fires at most once per `poll`; a late tick re-arms
/// from the time it was observed, so missed periods never burst.
#[derive(Debug, Clone)]
pub struct Interval {
    period: Duration,
    next_due: Option<Instant>,
    stopped: bool,
}

impl Interval {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_due: None,
            stopped: false,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// The first poll always fires.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.stopped {
            return false;
        }
        match self.next_due {
            Some(due) if now < due => false,
            _ => {
                self.next_due = Some(now + self.period);
                true
            }
        }
    }

    pub fn stop(&mut self) {
        self.stopped = true;
        self.next_due = None;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

#[derive(Debug, Clone, PartialEq)]
struct PendingWrite {
    due: Instant,
    name: String,
    unit: String,
    value: f64,
}

/// One-shot variable writes deferred to a later tick, e.g. the falling half
/// of a pulsed flag.
#[derive(Debug, Clone, Default)]
pub struct DelayedWrites {
    pending: Vec<PendingWrite>,
}

impl DelayedWrites {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Instant, name: &str, unit: &str, value: f64) {
        self.pending.push(PendingWrite {
            due,
            name: name.to_string(),
            unit: unit.to_string(),
            value,
        });
    }

    /// Performs every write whose time has come, in due order. Host errors
    /// are logged and the write is dropped.
    pub fn run_due<H: SimVars + ?Sized>(&mut self, now: Instant, host: &mut H) -> usize {
        let (mut due, rest): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|w| w.due <= now);
        self.pending = rest;
        due.sort_by_key(|w| w.due);

        for write in &due {
            if let Err(e) = host.set(&write.name, &write.unit, write.value) {
                log::warn!("Delayed write failed — var={} error={}", write.name, e);
            }
        }
        due.len()
    }

    pub fn cancel_all(&mut self) -> usize {
        let n = self.pending.len();
        self.pending.clear();
        n
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Capability traits for everything the core needs from the simulator and
//! the outside world. The core never touches host globals directly.

use crate::geo::Coordinate;
use crate::WfpError;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};

pub const VAR_PLANE_LATITUDE: &str = "PLANE LATITUDE";
pub const VAR_PLANE_LONGITUDE: &str = "PLANE LONGITUDE";
pub const VAR_PLANE_HEADING: &str = "PLANE HEADING DEGREES TRUE";
pub const VAR_START_FLIGHT: &str = "L:WFP_StartFlight";
pub const VAR_NEXT_POI: &str = "L:WFP_NextPoi";
pub const VAR_NEXT_POI_SOUND: &str = "L:WFP_NEXT_POI_SOUND";
pub const VAR_NEXT_POI_VOLUME: &str = "L:WFP_NEXT_POI_VOLUME";
pub const EVENT_PAUSE_SET: &str = "K:PAUSE_SET";

pub const UNIT_DEGREES: &str = "degrees";
pub const UNIT_BOOL: &str = "Bool";
pub const UNIT_NUMBER: &str = "Number";

/// Outbound event name consumed by the native module.
pub const EVENT_TO_MODULE: &str = "OnMessageFromJs";

const COMM_LOG_CAPACITY: usize = 300;

/// Named simulator variables ("read named value" / "write named value").
pub trait SimVars {
    fn get(&self, name: &str, unit: &str) -> Option<f64>;
    fn set(&mut self, name: &str, unit: &str, value: f64) -> Result<(), WfpError>;

    fn get_bool(&self, name: &str) -> bool {
        self.get(name, UNIT_BOOL) == Some(1.0)
    }
}

/// Polled aircraft position. `None` means "no fix this tick".
pub trait PositionSource {
    fn position(&self) -> Option<Coordinate>;
    fn heading(&self) -> Option<f64>;
}

impl<T: SimVars + ?Sized> PositionSource for T {
    fn position(&self) -> Option<Coordinate> {
        let lat = self.get(VAR_PLANE_LATITUDE, UNIT_DEGREES)?;
        let lon = self.get(VAR_PLANE_LONGITUDE, UNIT_DEGREES)?;
        Some(Coordinate::new(lat, lon)).filter(Coordinate::is_finite)
    }

    fn heading(&self) -> Option<f64> {
        self.get(VAR_PLANE_HEADING, UNIT_DEGREES)
            .filter(|h| h.is_finite())
    }
}

/// Named-event channel towards the host's native module. Best effort:
/// `send` returns false when the channel is not ready or delivery failed.
pub trait MessageChannel {
    fn is_ready(&self) -> bool;
    fn send(&mut self, event: &str, payload: &str) -> bool;
}

/// Nearby POI lookup. Implementations swallow their own failures and return
/// an empty list instead.
pub trait PoiSearch {
    fn search(&self, center: Coordinate, radius_m: u32, limit: u32) -> Vec<Value>;
}

/// Rolling, timestamped record of channel traffic.
#[derive(Debug, Clone, Default)]
pub struct CommLog {
    lines: VecDeque<String>,
}

impl CommLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, msg: impl AsRef<str>) {
        if self.lines.len() == COMM_LOG_CAPACITY {
            self.lines.pop_front();
        }
        let time = chrono::Local::now().format("%H:%M:%S");
        self.lines.push_back(format!("[{}] {}", time, msg.as_ref()));
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarWrite {
    pub name: String,
    pub unit: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub event: String,
    pub payload: String,
}

/// In-process host: variables in a map, every write and message recorded.
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    vars: HashMap<String, f64>,
    pub writes: Vec<VarWrite>,
    pub sent: Vec<SentMessage>,
    pub ready: bool,
    pub comm_log: CommLog,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self {
            ready: true,
            ..Self::default()
        }
    }

    pub fn set_position(&mut self, position: Coordinate) {
        self.vars.insert(VAR_PLANE_LATITUDE.to_string(), position.lat);
        self.vars.insert(VAR_PLANE_LONGITUDE.to_string(), position.lon);
    }

    pub fn clear_position(&mut self) {
        self.vars.remove(VAR_PLANE_LATITUDE);
        self.vars.remove(VAR_PLANE_LONGITUDE);
    }

    /// Sets a variable without recording it as a write.
    pub fn insert_var(&mut self, name: &str, value: f64) {
        self.vars.insert(name.to_string(), value);
    }

    pub fn writes_to<'a>(&'a self, name: &'a str) -> impl Iterator<Item = f64> + 'a {
        self.writes
            .iter()
            .filter(move |w| w.name == name)
            .map(|w| w.value)
    }
}

impl SimVars for MemoryHost {
    fn get(&self, name: &str, _unit: &str) -> Option<f64> {
        self.vars.get(name).copied()
    }

    fn set(&mut self, name: &str, unit: &str, value: f64) -> Result<(), WfpError> {
        self.vars.insert(name.to_string(), value);
        self.writes.push(VarWrite {
            name: name.to_string(),
            unit: unit.to_string(),
            value,
        });
        Ok(())
    }
}

impl MessageChannel for MemoryHost {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn send(&mut self, event: &str, payload: &str) -> bool {
        if !self.ready {
            self.comm_log.push("Channel not ready — cannot send.");
            return false;
        }
        self.comm_log.push(format!("Sent [{}]: {}", event, payload));
        self.sent.push(SentMessage {
            event: event.to_string(),
            payload: payload.to_string(),
        });
        true
    }
}

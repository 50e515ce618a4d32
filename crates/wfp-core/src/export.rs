// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::geo::Coordinate;
use crate::host::{MessageChannel, EVENT_TO_MODULE};
use crate::planner;
use crate::poi::PointOfInterest;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const POI_COORDINATES: &str = "POI_COORDINATES";

/// One-shot payload handed to the native module: ordered bare coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiCoordinatesMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Vec<Coordinate>,
    pub count: usize,
}

impl PoiCoordinatesMessage {
    pub fn new(data: Vec<Coordinate>) -> Self {
        Self {
            kind: POI_COORDINATES.to_string(),
            count: data.len(),
            data,
        }
    }
}

/// Orders `pois` nearest-neighbour from `start` and strips them to
/// coordinates. Without a start the input order is kept.
pub fn build_message(start: Option<Coordinate>, pois: &[PointOfInterest]) -> PoiCoordinatesMessage {
    let valid: Vec<PointOfInterest> = pois
        .iter()
        .filter(|p| p.coordinate().is_finite())
        .cloned()
        .collect();

    let data = match start.filter(Coordinate::is_finite) {
        Some(start) => planner::ordered_coordinates(start, &valid),
        None => valid.iter().map(PointOfInterest::coordinate).collect(),
    };

    PoiCoordinatesMessage::new(data)
}

/// Builds and sends the ordered-coordinates payload. Returns false when the
/// channel is not ready or the send failed; never errors.
pub fn send_ordered_pois(
    channel: &mut dyn MessageChannel,
    start: Option<Coordinate>,
    pois: &[PointOfInterest],
) -> bool {
    if !channel.is_ready() {
        warn!("Message channel not ready; ordered POIs not sent");
        return false;
    }

    let message = build_message(start, pois);
    let payload = match serde_json::to_string(&message) {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to serialize POI coordinates: {}", e);
            return false;
        }
    };

    let sent = channel.send(EVENT_TO_MODULE, &payload);
    if sent {
        info!(
            "Ordered POI coordinates sent — count={} event={}",
            message.count, EVENT_TO_MODULE
        );
    } else {
        warn!("Channel rejected ordered POI coordinates — count={}", message.count);
    }
    sent
}

fn coordinate_from(entry: &Value) -> Option<Coordinate> {
    let lat = entry.get("lat")?.as_f64()?;
    let lon = entry.get("lon")?.as_f64()?;
    Some(Coordinate::new(lat, lon)).filter(Coordinate::is_finite)
}

/// Receiving side of the payload. Anything that is not a well-formed
/// `POI_COORDINATES` message yields an empty list; malformed entries inside
/// `data` are skipped.
pub fn parse_poi_coordinates(received: &str) -> Vec<Coordinate> {
    let value: Value = match serde_json::from_str(received) {
        Ok(v) => v,
        Err(e) => {
            debug!("Ignoring non-JSON module message: {}", e);
            return Vec::new();
        }
    };

    if value.get("type").and_then(Value::as_str) != Some(POI_COORDINATES) {
        return Vec::new();
    }

    let Some(entries) = value.get("data").and_then(Value::as_array) else {
        return Vec::new();
    };

    let coords: Vec<Coordinate> = entries.iter().filter_map(coordinate_from).collect();
    if coords.len() != entries.len() {
        warn!(
            "Skipped malformed coordinate entries — total={} parsed={}",
            entries.len(),
            coords.len()
        );
    }
    coords
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::geo::{distance_km, Coordinate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const UNKNOWN_TITLE: &str = "Unknown POI";

/// Minimum spacing between two freshly fetched candidates.
pub const DEFAULT_DEDUP_KM: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    pub title: String,
}

impl PointOfInterest {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}

/// Accepts JSON numbers and numeric strings. Anything else yields NaN so the
/// caller's finiteness filter drops it.
fn coerce_f64(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

fn id_from(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text_from(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn normalize_one(record: &Value) -> Option<PointOfInterest> {
    let obj = record.as_object()?;

    let lat = coerce_f64(obj.get("lat"));
    let lon = coerce_f64(obj.get("lon"));
    if !lat.is_finite() || !lon.is_finite() {
        return None;
    }

    let id = obj
        .get("id")
        .and_then(id_from)
        .or_else(|| obj.get("pageid").and_then(id_from))
        .unwrap_or_else(|| format!("{}-{}", lat, lon));

    let title = text_from(obj.get("title"))
        .or_else(|| text_from(obj.get("name")))
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string());

    Some(PointOfInterest { id, lat, lon, title })
}

/// Maps raw search records to uniform POIs, dropping entries without finite
/// coordinates. Input order is preserved.
pub fn normalize(raw: &[Value]) -> Vec<PointOfInterest> {
    let pois: Vec<PointOfInterest> = raw.iter().filter_map(normalize_one).collect();
    log::debug!(
        "Normalized POIs — input={} valid={}",
        raw.len(),
        pois.len()
    );
    pois
}

/// Keeps a candidate only if it lies more than `min_separation_km` from every
/// candidate already kept. First come, first kept.
pub fn dedup_nearby(candidates: Vec<PointOfInterest>, min_separation_km: f64) -> Vec<PointOfInterest> {
    let total = candidates.len();
    let mut kept: Vec<PointOfInterest> = Vec::with_capacity(total);

    for candidate in candidates {
        let here = candidate.coordinate();
        if kept
            .iter()
            .all(|k| distance_km(k.coordinate(), here) > min_separation_km)
        {
            kept.push(candidate);
        }
    }

    if kept.len() != total {
        log::debug!(
            "Dropped near-duplicate POIs — dropped={} kept={} min_separation_km={}",
            total - kept.len(),
            kept.len(),
            min_separation_km
        );
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_geosearch_record() {
        let raw = vec![json!({
            "pageid": 18618509,
            "ns": 0,
            "title": "Wikimedia Foundation",
            "lat": 37.78697,
            "lon": -122.399677,
            "dist": 13.7,
            "primary": ""
        })];
        let pois = normalize(&raw);
        assert_eq!(pois.len(), 1);
        assert_eq!(pois[0].id, "18618509");
        assert_eq!(pois[0].title, "Wikimedia Foundation");
        assert_eq!(pois[0].lat, 37.78697);
        assert_eq!(pois[0].lon, -122.399677);
    }

    #[test]
    fn test_normalize_coerces_strings_and_falls_back() {
        let raw = vec![
            json!({"lat": "10.5", "lon": " 20.25 ", "name": "Named only"}),
            json!({"lat": 1.0, "lon": 2.0}),
            json!({"id": "abc", "pageid": 7, "lat": 3, "lon": 4, "title": "T", "name": "N"}),
        ];
        let pois = normalize(&raw);
        assert_eq!(pois.len(), 3);

        assert_eq!(pois[0].lat, 10.5);
        assert_eq!(pois[0].lon, 20.25);
        assert_eq!(pois[0].title, "Named only");
        assert_eq!(pois[0].id, "10.5-20.25");

        assert_eq!(pois[1].title, UNKNOWN_TITLE);
        assert_eq!(pois[1].id, "1-2");

        assert_eq!(pois[2].id, "abc");
        assert_eq!(pois[2].title, "T");
    }

    #[test]
    fn test_normalize_drops_invalid_and_keeps_order() {
        let raw = vec![
            json!({"id": "a", "lat": 1.0, "lon": 1.0}),
            json!({"id": "bad-lat", "lat": "north", "lon": 1.0}),
            json!({"id": "b", "lat": 2.0, "lon": 2.0}),
            json!({"id": "missing-lon", "lat": 2.0}),
            json!("not an object"),
            json!({"id": "null-lat", "lat": null, "lon": 3.0}),
            json!({"id": "c", "lat": "3", "lon": "3"}),
        ];
        let pois = normalize(&raw);
        let ids: Vec<&str> = pois.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(pois.iter().all(|p| p.lat.is_finite() && p.lon.is_finite()));
    }

    #[test]
    fn test_normalize_empty() {
        assert!(normalize(&[]).is_empty());
    }

    fn poi(id: &str, lat: f64, lon: f64) -> PointOfInterest {
        PointOfInterest {
            id: id.to_string(),
            lat,
            lon,
            title: id.to_string(),
        }
    }

    #[test]
    fn test_dedup_drops_close_candidates() {
        // ~55 m and ~5.5 km east of the first point.
        let candidates = vec![
            poi("a", 10.0, 10.0),
            poi("a-dup", 10.0, 10.0005),
            poi("b", 10.0, 10.05),
            poi("b-dup", 10.0, 10.0502),
        ];
        let kept = dedup_nearby(candidates, DEFAULT_DEDUP_KM);
        let ids: Vec<&str> = kept.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_dedup_pairwise_separation_holds() {
        let mut candidates = Vec::new();
        for i in 0..20 {
            for j in 0..5 {
                candidates.push(poi(
                    &format!("{}-{}", i, j),
                    45.0 + i as f64 * 0.0004,
                    7.0 + j as f64 * 0.0007,
                ));
            }
        }
        let kept = dedup_nearby(candidates, DEFAULT_DEDUP_KM);
        assert!(!kept.is_empty());
        for (i, a) in kept.iter().enumerate() {
            for b in kept.iter().skip(i + 1) {
                assert!(distance_km(a.coordinate(), b.coordinate()) > DEFAULT_DEDUP_KM);
            }
        }
    }
}

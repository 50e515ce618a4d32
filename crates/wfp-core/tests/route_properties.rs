use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use std::collections::HashSet;
use wfp_core::geo::{distance_km, Coordinate};
use wfp_core::planner::plan;
use wfp_core::poi::{dedup_nearby, normalize, PointOfInterest, DEFAULT_DEDUP_KM};
use wfp_core::tracker::check_arrival;

// --- Mock Helpers ---

fn make_poi(id: &str, lat: f64, lon: f64) -> PointOfInterest {
    PointOfInterest {
        id: id.to_string(),
        lat,
        lon,
        title: format!("POI {}", id),
    }
}

/// A cluster of POIs around a center, roughly the spread of one GeoSearch page.
fn random_cluster(rng: &mut StdRng, n: usize, center: Coordinate, spread_deg: f64) -> Vec<PointOfInterest> {
    (0..n)
        .map(|i| {
            make_poi(
                &format!("p{}", i),
                center.lat + rng.gen_range(-spread_deg..spread_deg),
                center.lon + rng.gen_range(-spread_deg..spread_deg),
            )
        })
        .collect()
}

fn random_coordinate(rng: &mut StdRng) -> Coordinate {
    Coordinate::new(rng.gen_range(-90.0..=90.0), rng.gen_range(-180.0..=180.0))
}

fn ids(pois: &[PointOfInterest]) -> Vec<&str> {
    pois.iter().map(|p| p.id.as_str()).collect()
}

// --- Test Suite ---

#[test]
fn test_distance_is_symmetric_and_non_negative() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..500 {
        let a = random_coordinate(&mut rng);
        let b = random_coordinate(&mut rng);
        let ab = distance_km(a, b);
        assert!(ab >= 0.0);
        assert!((ab - distance_km(b, a)).abs() < 1e-6);
        assert_eq!(distance_km(a, a), 0.0);
        // Never longer than half the circumference.
        assert!(ab <= std::f64::consts::PI * 6371.0 + 1e-6);
    }
}

#[test]
fn test_normalize_filters_and_preserves_order() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut raw: Vec<Value> = Vec::new();
    let mut expected = Vec::new();
    for i in 0..200 {
        let id = format!("r{}", i);
        match rng.gen_range(0..5) {
            0 => raw.push(json!({"id": id, "lat": "garbage", "lon": 1.0})),
            1 => raw.push(json!({"id": id, "lon": 1.0})),
            2 => {
                raw.push(json!({"id": id, "lat": format!("{}", i as f64 / 10.0), "lon": "5"}));
                expected.push(id);
            }
            _ => {
                raw.push(json!({"id": id, "lat": i as f64 / 10.0, "lon": -5.0}));
                expected.push(id);
            }
        }
    }

    let pois = normalize(&raw);
    assert!(pois.iter().all(|p| p.lat.is_finite() && p.lon.is_finite()));
    assert_eq!(ids(&pois), expected.iter().map(String::as_str).collect::<Vec<_>>());
}

#[test]
fn test_dedup_keeps_pairwise_separation() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..20 {
        let cluster = random_cluster(&mut rng, 60, Coordinate::new(48.85, 2.35), 0.005);
        let kept = dedup_nearby(cluster, DEFAULT_DEDUP_KM);
        for (i, a) in kept.iter().enumerate() {
            for b in &kept[i + 1..] {
                assert!(distance_km(a.coordinate(), b.coordinate()) > DEFAULT_DEDUP_KM);
            }
        }
    }
}

#[test]
fn test_plan_is_deterministic_permutation() {
    let mut rng = StdRng::seed_from_u64(42);
    for n in [0, 1, 2, 5, 17, 40] {
        let pois = random_cluster(&mut rng, n, Coordinate::new(35.68, 139.76), 0.2);
        let start = Coordinate::new(35.7, 139.7);

        let first = plan(start, &pois);
        let second = plan(start, &pois);
        assert_eq!(first, second);

        assert_eq!(first.len(), pois.len());
        let mut a: Vec<&str> = ids(&first);
        let mut b: Vec<&str> = ids(&pois);
        a.sort_unstable();
        b.sort_unstable();
        assert_eq!(a, b);
    }
}

#[test]
fn test_plan_each_step_is_greedy() {
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..10 {
        let pois = random_cluster(&mut rng, 25, Coordinate::new(-33.86, 151.2), 0.3);
        let start = Coordinate::new(-33.86, 151.2);
        let order = plan(start, &pois);

        let mut cursor = start;
        let mut left: Vec<&PointOfInterest> = pois.iter().collect();
        for chosen in &order {
            let chosen_d = distance_km(cursor, chosen.coordinate());
            for other in &left {
                assert!(distance_km(cursor, other.coordinate()) >= chosen_d);
            }
            left.retain(|p| p.id != chosen.id);
            cursor = chosen.coordinate();
        }
        assert!(left.is_empty());
    }
}

#[test]
fn test_scenario_a_coincident_start() {
    let order = plan(
        Coordinate::new(0.0, 0.0),
        &[make_poi("P1", 0.0, 0.0), make_poi("P2", 0.0, 1.0)],
    );
    assert_eq!(ids(&order), vec!["P1", "P2"]);
}

#[test]
fn test_scenario_b_three_on_equator() {
    let order = plan(
        Coordinate::new(0.0, 0.0),
        &[
            make_poi("x0", 0.0, 0.0),
            make_poi("x5", 0.0, 5.0),
            make_poi("x1", 0.0, 1.0),
        ],
    );
    let coords: Vec<(f64, f64)> = order.iter().map(|p| (p.lat, p.lon)).collect();
    assert_eq!(coords, vec![(0.0, 0.0), (0.0, 1.0), (0.0, 5.0)]);
}

#[test]
fn test_scenario_c_and_d_threshold() {
    let target = vec![make_poi("T", 10.0, 10.0)];
    let live = Coordinate::new(10.0, 10.0005);

    let mut visited = HashSet::new();
    assert_eq!(
        check_arrival(live, &target, &mut visited, 0.1).as_deref(),
        Some("T")
    );

    let mut visited = HashSet::new();
    assert_eq!(check_arrival(live, &target, &mut visited, 0.01), None);
}

#[test]
fn test_arrival_idempotent_over_many_ticks() {
    let target = vec![make_poi("T", 51.5, -0.12), make_poi("U", 51.6, -0.12)];
    let mut visited = HashSet::new();
    let mut rng = StdRng::seed_from_u64(5);
    let mut hits = 0;
    for _ in 0..120 {
        // Jitter within ~50 m of the target.
        let live = Coordinate::new(
            51.5 + rng.gen_range(-0.0003..0.0003),
            -0.12 + rng.gen_range(-0.0003..0.0003),
        );
        if check_arrival(live, &target, &mut visited, 0.2).is_some() {
            hits += 1;
        }
    }
    assert_eq!(hits, 1);
    assert!(visited.contains("T"));
}

//! End-to-end tests driving [`Engine::plan`] against `InMemoryStore`
//! fixtures, covering the seed scenarios and universal invariants.

use std::sync::Arc;

use transit_route_engine::engine::{Deadline, Engine, PlanRequest};
use transit_route_engine::model::LegMode;
use transit_route_engine::store::memory::{InMemoryStore, LineRecord, PatternRecord};
use transit_route_engine::store::Stop;
use transit_route_engine::EngineConfig;

fn line(id: i64, short_name: &str) -> LineRecord {
    LineRecord {
        id,
        short_name: short_name.to_string(),
        long_name: format!("Line {short_name}"),
        color: "0088FF".to_string(),
        text_color: "FFFFFF".to_string(),
        mode: "BUS".to_string(),
        active: true,
    }
}

fn straight_pattern(id: &str, line_id: i64, from: (f64, f64), to: (f64, f64), steps: usize) -> PatternRecord {
    let polyline: Vec<(f64, f64)> = (0..=steps)
        .map(|i| {
            let t = i as f64 / steps as f64;
            (from.0 + (to.0 - from.0) * t, from.1 + (to.1 - from.1) * t)
        })
        .collect();
    PatternRecord {
        id: id.to_string(),
        line_id,
        polyline: Some(polyline),
    }
}

fn base_request(from: (f64, f64), to: (f64, f64)) -> PlanRequest {
    PlanRequest {
        from,
        to,
        num_itineraries: 5,
        max_walk_distance_m: 1500.0,
        modes: vec![],
        date_ms: 0,
    }
}

#[tokio::test]
async fn short_direct_ride_has_zero_transfers_and_low_walk() {
    let origin = (-17.7833, -63.1821);
    let destination = (-17.7512, -63.1755);
    let store = InMemoryStore::builder()
        .line(line(1, "A"))
        .pattern(straight_pattern("pattern:1:outbound", 1, origin, destination, 40))
        .build();

    let engine = Engine::new(EngineConfig::default());
    let plan = engine
        .plan(&store, &base_request(origin, destination), Deadline::none())
        .await;

    assert!(!plan.itineraries.is_empty());
    let best = &plan.itineraries[0];
    assert_eq!(best.transfers, 0);
    assert!(best.walk_distance_m < 600.0, "walk distance was {}", best.walk_distance_m);
}

#[tokio::test]
async fn no_nearby_service_falls_back_to_walk_only() {
    let origin = (-17.7833, -63.1821);
    let destination = (0.0, 0.0);
    let store = InMemoryStore::builder().build();

    let engine = Engine::new(EngineConfig::default());
    let plan = engine
        .plan(&store, &base_request(origin, destination), Deadline::none())
        .await;

    assert_eq!(plan.itineraries.len(), 1);
    let only = &plan.itineraries[0];
    assert_eq!(only.legs.len(), 1);
    assert_eq!(only.legs[0].mode, LegMode::Walk);
    assert_eq!(only.transfers, 0);
}

#[tokio::test]
async fn identical_requests_produce_byte_identical_ranking() {
    let origin = (-17.7833, -63.1821);
    let destination = (-17.7512, -63.1755);
    let store = InMemoryStore::builder()
        .line(line(1, "A"))
        .line(line(2, "B"))
        .pattern(straight_pattern("pattern:1:outbound", 1, origin, destination, 40))
        .pattern(straight_pattern(
            "pattern:2:outbound",
            2,
            (origin.0, origin.1 + 0.002),
            (destination.0, destination.1 + 0.002),
            40,
        ))
        .build();

    let engine = Engine::new(EngineConfig::default());
    let request = base_request(origin, destination);

    let first = engine.plan(&store, &request, Deadline::none()).await;
    let second = engine.plan(&store, &request, Deadline::none()).await;

    assert_eq!(first.itineraries, second.itineraries);
}

#[tokio::test]
async fn itineraries_alternate_walk_bus_and_bookend_on_walk() {
    let origin = (-17.7833, -63.1821);
    let destination = (-17.7512, -63.1755);
    let store = InMemoryStore::builder()
        .line(line(1, "A"))
        .pattern(straight_pattern("pattern:1:outbound", 1, origin, destination, 40))
        .build();

    let engine = Engine::new(EngineConfig::default());
    let plan = engine
        .plan(&store, &base_request(origin, destination), Deadline::none())
        .await;

    for itinerary in &plan.itineraries {
        assert_eq!(itinerary.legs.first().unwrap().mode, LegMode::Walk);
        assert_eq!(itinerary.legs.last().unwrap().mode, LegMode::Walk);
        let bus_legs = itinerary.legs.iter().filter(|l| l.mode == LegMode::Bus).count();
        assert_eq!(itinerary.transfers as usize, bus_legs.saturating_sub(1));

        let walk_sum: f64 = itinerary
            .legs
            .iter()
            .filter(|l| l.mode == LegMode::Walk)
            .map(|l| l.distance_m)
            .sum();
        assert!((walk_sum - itinerary.walk_distance_m).abs() < 1e-6);

        let leg_duration_sum: i64 = itinerary.legs.iter().map(|l| l.duration_s.round() as i64).sum();
        assert!(leg_duration_sum <= itinerary.duration_s);
    }
}

#[tokio::test]
async fn origin_equals_destination_yields_zero_distance_walk() {
    let point = (-17.7833, -63.1821);
    let store = InMemoryStore::builder().build();
    let engine = Engine::new(EngineConfig::default());
    let plan = engine
        .plan(&store, &base_request(point, point), Deadline::none())
        .await;

    assert_eq!(plan.itineraries.len(), 1);
    let only = &plan.itineraries[0];
    assert_eq!(only.legs.len(), 1);
    assert_eq!(only.legs[0].distance_m, 0.0);
    assert_eq!(only.duration_s, 0);
}

#[tokio::test]
async fn mode_filter_excluding_bus_forces_walk_only() {
    let origin = (-17.7833, -63.1821);
    let destination = (-17.7512, -63.1755);
    let store = InMemoryStore::builder()
        .line(line(1, "A"))
        .pattern(straight_pattern("pattern:1:outbound", 1, origin, destination, 40))
        .build();

    let engine = Engine::new(EngineConfig::default());
    let mut request = base_request(origin, destination);
    request.modes = vec!["WALK".to_string()];

    let plan = engine.plan(&store, &request, Deadline::none()).await;
    assert_eq!(plan.itineraries.len(), 1);
    assert_eq!(plan.itineraries[0].legs[0].mode, LegMode::Walk);
    assert_eq!(plan.itineraries[0].transfers, 0);
}

#[tokio::test]
async fn stop_based_builder_rejects_excess_access_walk() {
    let origin = (-17.7833, -63.1821);
    let destination = (-17.7512, -63.1755);
    // Stops are far from both origin and destination (well beyond the
    // 1200m access+egress cap), and there's no geometry-based pattern
    // either, so only the walk-only fallback should survive.
    let far_origin_stop = Stop {
        id: 1,
        name: "Far Origin Stop".to_string(),
        lat: origin.0 + 0.05,
        lon: origin.1 + 0.05,
    };
    let far_dest_stop = Stop {
        id: 2,
        name: "Far Dest Stop".to_string(),
        lat: destination.0 - 0.05,
        lon: destination.1 - 0.05,
    };
    let store = InMemoryStore::builder()
        .line(line(1, "A"))
        .pattern(straight_pattern(
            "pattern:1:outbound",
            1,
            (far_origin_stop.lat, far_origin_stop.lon),
            (far_dest_stop.lat, far_dest_stop.lon),
            10,
        ))
        .stop(far_origin_stop.clone())
        .stop(far_dest_stop.clone())
        .pattern_stop("pattern:1:outbound", far_origin_stop.id, 1)
        .pattern_stop("pattern:1:outbound", far_dest_stop.id, 2)
        .build();

    let engine = Engine::new(EngineConfig::default());
    let plan = engine
        .plan(&store, &base_request(origin, destination), Deadline::none())
        .await;

    assert_eq!(plan.itineraries.len(), 1);
    assert_eq!(plan.itineraries[0].legs[0].mode, LegMode::Walk);
}

#[tokio::test]
async fn cross_town_transfer_prefers_short_walk_over_long_direct() {
    // Two lines that only connect via a transfer point roughly midway;
    // no single line reaches all the way from origin to destination.
    let origin = (-17.7200, -63.1950);
    let destination = (-17.8100, -63.1500);
    let midpoint = (-17.765, -63.1725);

    let store = InMemoryStore::builder()
        .line(line(1, "A"))
        .line(line(2, "B"))
        .pattern(straight_pattern("pattern:1:outbound", 1, origin, midpoint, 40))
        .pattern(straight_pattern("pattern:2:outbound", 2, midpoint, destination, 40))
        .build();

    let engine = Engine::new(EngineConfig::default());
    let plan = engine
        .plan(&store, &base_request(origin, destination), Deadline::none())
        .await;

    assert!(!plan.itineraries.is_empty());
    let best = &plan.itineraries[0];
    assert!(best.transfers <= 1);
}

#[tokio::test]
async fn expired_deadline_recovers_with_whatever_was_built() {
    let origin = (-17.7833, -63.1821);
    let destination = (-17.7512, -63.1755);
    let store = InMemoryStore::builder()
        .line(line(1, "A"))
        .pattern(straight_pattern("pattern:1:outbound", 1, origin, destination, 40))
        .build();

    let engine = Engine::new(EngineConfig::default());
    let already_past = std::time::Instant::now() - std::time::Duration::from_secs(1);
    let plan = engine
        .plan(&store, &base_request(origin, destination), Deadline::at(already_past))
        .await;

    // No store calls should have run; the engine still owes a total result.
    assert_eq!(plan.itineraries.len(), 1);
    assert_eq!(plan.itineraries[0].legs[0].mode, LegMode::Walk);
}

#[tokio::test]
async fn shared_store_works_behind_arc_dyn() {
    let origin = (-17.7833, -63.1821);
    let destination = (-17.7512, -63.1755);
    let store: Arc<dyn transit_route_engine::store::SpatialStore> = Arc::new(
        InMemoryStore::builder()
            .line(line(1, "A"))
            .pattern(straight_pattern("pattern:1:outbound", 1, origin, destination, 40))
            .build(),
    );

    let engine = Engine::new(EngineConfig::default());
    let plan = engine
        .plan(store.as_ref(), &base_request(origin, destination), Deadline::none())
        .await;
    assert!(!plan.itineraries.is_empty());
}

//! §6.2 HTTP surface tests: malformed coordinates yield 400; a
//! well-formed request always yields 200 with a non-empty plan.

use std::sync::Arc;

use actix_web::{test, web, App};

use transit_route_engine::server::{self, AppState};
use transit_route_engine::store::memory::{InMemoryStore, LineRecord, PatternRecord};
use transit_route_engine::store::SpatialStore;
use transit_route_engine::EngineConfig;

fn empty_store() -> Arc<dyn SpatialStore> {
    Arc::new(InMemoryStore::builder().build())
}

fn populated_store() -> Arc<dyn SpatialStore> {
    let origin = (-17.7833, -63.1821);
    let destination = (-17.7512, -63.1755);
    let polyline: Vec<(f64, f64)> = (0..=40)
        .map(|i| {
            let t = i as f64 / 40.0;
            (origin.0 + (destination.0 - origin.0) * t, origin.1 + (destination.1 - origin.1) * t)
        })
        .collect();
    Arc::new(
        InMemoryStore::builder()
            .line(LineRecord {
                id: 1,
                short_name: "A".to_string(),
                long_name: "Line A".to_string(),
                color: "0088FF".to_string(),
                text_color: "FFFFFF".to_string(),
                mode: "BUS".to_string(),
                active: true,
            })
            .pattern(PatternRecord {
                id: "pattern:1:outbound".to_string(),
                line_id: 1,
                polyline: Some(polyline),
            })
            .build(),
    )
}

#[actix_web::test]
async fn malformed_from_place_yields_400() {
    let data = web::Data::new(AppState::new(empty_store(), EngineConfig::default()));
    let app = test::init_service(App::new().app_data(data).configure(server::configure)).await;

    let req = test::TestRequest::get()
        .uri("/plan?fromPlace=abc&toPlace=-17.7512,-63.1755")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn well_formed_request_yields_200_with_itineraries() {
    let data = web::Data::new(AppState::new(populated_store(), EngineConfig::default()));
    let app = test::init_service(App::new().app_data(data).configure(server::configure)).await;

    let req = test::TestRequest::get()
        .uri("/plan?fromPlace=-17.7833,-63.1821&toPlace=-17.7512,-63.1755")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert!(resp.status().is_success());
    let body: serde_json::Value = test::read_body_json(resp).await;
    let itineraries = body["plan"]["itineraries"].as_array().expect("itineraries array");
    assert!(!itineraries.is_empty());
}

#[actix_web::test]
async fn empty_store_still_yields_200_with_walk_only_itinerary() {
    let data = web::Data::new(AppState::new(empty_store(), EngineConfig::default()));
    let app = test::init_service(App::new().app_data(data).configure(server::configure)).await;

    let req = test::TestRequest::get()
        .uri("/plan?fromPlace=-17.7833,-63.1821&toPlace=-17.7512,-63.1755")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert!(resp.status().is_success());
    let body: serde_json::Value = test::read_body_json(resp).await;
    let itineraries = body["plan"]["itineraries"].as_array().expect("itineraries array");
    assert_eq!(itineraries.len(), 1);
    assert_eq!(itineraries[0]["legs"][0]["mode"], "WALK");
}

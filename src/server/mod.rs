//! §6.2 HTTP surface: the single `GET /plan` endpoint. Everything else
//! (auth, admin CRUD, geocoding, GraphQL) is an external collaborator and
//! lives outside this crate.

pub mod cors;

use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_web::{get, web, App, HttpResponse, HttpServer, Responder};
use serde::Deserialize;

use crate::config::EngineConfig;
use crate::engine::{Deadline, Engine, PlanRequest};
use crate::error::EngineError;
use crate::otp::PlanResponseDto;
use crate::store::SpatialStore;

/// Store calls beyond this are cut off; whatever itineraries are already
/// built get ranked and returned rather than surfacing a timeout to the
/// client (§5 cancellation is always recovered, never an error).
const REQUEST_DEADLINE: Duration = Duration::from_secs(5);

/// Public so integration tests can assemble the same service wiring
/// `start_server` uses, via [`configure`], without opening a real socket.
pub struct AppState {
    engine: Engine,
    store: Arc<dyn SpatialStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn SpatialStore>, config: EngineConfig) -> Self {
        AppState {
            engine: Engine::new(config),
            store,
        }
    }
}

/// Registers the `/plan` route on an `actix-web` service config. Shared by
/// `start_server` and by tests building an in-process `test::init_service`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(plan);
}

#[derive(Debug, Deserialize)]
struct PlanQuery {
    #[serde(rename = "fromPlace")]
    from_place: String,
    #[serde(rename = "toPlace")]
    to_place: String,
    #[serde(rename = "numItineraries")]
    num_itineraries: Option<usize>,
    #[serde(rename = "maxWalkDistance")]
    max_walk_distance: Option<f64>,
    mode: Option<String>,
    #[allow(dead_code)]
    date: Option<String>,
    #[allow(dead_code)]
    time: Option<String>,
}

fn parse_place(raw: &str) -> Result<(f64, f64), EngineError> {
    let mut parts = raw.splitn(2, ',');
    let (lat_str, lon_str) = match (parts.next(), parts.next()) {
        (Some(lat), Some(lon)) => (lat.trim(), lon.trim()),
        _ => return Err(EngineError::BadRequest(format!("expected \"lat,lon\", got {raw:?}"))),
    };
    let lat: f64 = lat_str
        .parse()
        .map_err(|_| EngineError::BadRequest(format!("not a number: {lat_str:?}")))?;
    let lon: f64 = lon_str
        .parse()
        .map_err(|_| EngineError::BadRequest(format!("not a number: {lon_str:?}")))?;
    Ok((lat, lon))
}

fn parse_modes(raw: Option<&str>) -> Vec<String> {
    raw.map(|m| m.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

#[get("/plan")]
async fn plan(query: web::Query<PlanQuery>, state: web::Data<AppState>) -> impl Responder {
    let from = match parse_place(&query.from_place) {
        Ok(p) => p,
        Err(e) => return HttpResponse::BadRequest().body(e.to_string()),
    };
    let to = match parse_place(&query.to_place) {
        Ok(p) => p,
        Err(e) => return HttpResponse::BadRequest().body(e.to_string()),
    };

    let request = PlanRequest {
        from,
        to,
        num_itineraries: query.num_itineraries.unwrap_or(5),
        max_walk_distance_m: query.max_walk_distance.unwrap_or(1500.0),
        modes: parse_modes(query.mode.as_deref()),
        date_ms: chrono::Utc::now().timestamp_millis(),
    };

    let deadline = Deadline::at(Instant::now() + REQUEST_DEADLINE);
    let plan = state.engine.plan(state.store.as_ref(), &request, deadline).await;
    HttpResponse::Ok().json(PlanResponseDto::from(&plan))
}

pub async fn start_server(
    store: Arc<dyn SpatialStore>,
    config: EngineConfig,
    host: &str,
    port: u16,
) -> std::io::Result<()> {
    let data = web::Data::new(AppState::new(store, config));

    log::info!("listening on {host}:{port}");

    HttpServer::new(move || {
        App::new()
            .wrap(cors::cors_middleware())
            .app_data(data.clone())
            .configure(configure)
    })
    .bind((host, port))?
    .run()
    .await
}

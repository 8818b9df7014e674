//! Orchestration: §4.3.8's overall plan procedure. Wires components A–E
//! together against one `SpatialStore` call for one request. The engine
//! holds no state across requests; every call gets its own store handle
//! (or a shared `Arc<dyn SpatialStore>`) and deadline.

use std::time::Instant;

use crate::builders::{direct_geometry, direct_stops, projection, transfer, walk_only};
use crate::config::EngineConfig;
use crate::geodesy::haversine_distance_m;
use crate::model::{Itinerary, Place, Plan};
use crate::rank;
use crate::store::SpatialStore;

const MAX_GEOMETRY_DIRECT_CANDIDATES: usize = 100;
const MAX_STOP_DIRECT_CANDIDATES: usize = 25;
const MAX_ONE_TRANSFER_CANDIDATES: usize = 50;
const MAX_TWO_TRANSFER_CANDIDATES: usize = 30;
const MAX_THREE_TRANSFER_CANDIDATES: usize = 20;
const NEARBY_STOP_LIMIT: usize = 8;

/// The pattern-proximity cap fed to `geomTransfer`/`geomTripleTransfer`.
/// The spec names the parameter without a default; this value keeps
/// transfer candidates to patterns that genuinely cross paths rather than
/// merely sharing a search radius.
const INTER_PATTERN_M: f64 = 80.0;

/// A deadline-driven cooperative cancellation budget. Checked before each
/// batch of `SpatialStore` calls; once expired, the engine stops issuing
/// further calls and ranks whatever has already been built.
#[derive(Debug, Clone, Copy)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    pub fn none() -> Self {
        Deadline(None)
    }

    pub fn at(instant: Instant) -> Self {
        Deadline(Some(instant))
    }

    pub fn expired(&self) -> bool {
        match self.0 {
            Some(instant) => Instant::now() >= instant,
            None => false,
        }
    }
}

/// One parsed `/plan` request. Coordinate parsing and the BadRequest→400
/// mapping happen at the HTTP layer (`server`); by the time a `PlanRequest`
/// reaches the engine its coordinates are already valid floats.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub from: (f64, f64),
    pub to: (f64, f64),
    pub num_itineraries: usize,
    pub max_walk_distance_m: f64,
    pub modes: Vec<String>,
    /// Epoch-ms the request was issued at; threaded through as every leg's
    /// clock origin and echoed back as `Plan.date`.
    pub date_ms: i64,
}

fn adaptive_radii(direct_distance_m: f64) -> (f64, f64) {
    if direct_distance_m < 2_000.0 {
        (800.0, 1_200.0)
    } else if direct_distance_m < 5_000.0 {
        (1_500.0, 2_000.0)
    } else {
        (2_500.0, 3_000.0)
    }
}

fn wants_transit(modes: &[String]) -> bool {
    modes.is_empty() || modes.iter().any(|m| m.eq_ignore_ascii_case("BUS"))
}

/// Stateless per-request planner: A–E composed leaves-first.
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Engine { config }
    }

    /// Always returns a plan — the engine's contract is total. Any
    /// `StoreUnavailable` failure along the way is logged and recovered
    /// with whatever itineraries were already built; an empty result
    /// after ranking becomes the walk-only fallback (§4.3.7).
    pub async fn plan(&self, store: &dyn SpatialStore, request: &PlanRequest, deadline: Deadline) -> Plan {
        let direct_distance_m = haversine_distance_m(request.from, request.to);
        let mut itineraries: Vec<Itinerary> = Vec::new();

        if wants_transit(&request.modes) {
            let (geom_radius_m, stop_radius_m) = adaptive_radii(direct_distance_m);

            if !deadline.expired() {
                self.run_geometry_direct(store, request, geom_radius_m, &mut itineraries).await;
            }

            if itineraries.len() < request.num_itineraries && !deadline.expired() {
                self.run_stop_direct(store, request, stop_radius_m, &mut itineraries).await;
            }

            if !deadline.expired() {
                self.run_one_transfer(store, request, geom_radius_m, &mut itineraries).await;
            }

            if itineraries.len() < request.num_itineraries && !deadline.expired() {
                self.run_two_transfer(store, request, geom_radius_m, &mut itineraries).await;
            }

            if itineraries.len() < request.num_itineraries && !deadline.expired() {
                self.run_three_transfer(store, request, geom_radius_m, &mut itineraries).await;
            }
        }

        let mut ranked = rank::rank(itineraries, direct_distance_m, request.num_itineraries, &self.config);

        if ranked.is_empty() {
            ranked.push(walk_only::build(request.from, request.to, request.date_ms, &self.config));
        }

        Plan {
            itineraries: ranked,
            date_ms: request.date_ms,
            from: Place::new("Origin", request.from.0, request.from.1),
            to: Place::new("Destination", request.to.0, request.to.1),
        }
    }

    async fn run_geometry_direct(
        &self,
        store: &dyn SpatialStore,
        request: &PlanRequest,
        geom_radius_m: f64,
        itineraries: &mut Vec<Itinerary>,
    ) {
        let routes = match store.geom_routes_through_both(request.from, request.to, geom_radius_m).await {
            Ok(routes) => routes,
            Err(err) => {
                log::error!("geomRoutesThroughBoth failed: {err}");
                return;
            }
        };

        for route in routes.into_iter().take(MAX_GEOMETRY_DIRECT_CANDIDATES) {
            let polyline = match store.pattern_geometry(&route.pattern_id).await {
                Ok(Some(polyline)) if polyline.len() >= 2 => polyline,
                Ok(_) => {
                    log::debug!("geometry builder: pattern {} has no usable polyline", route.pattern_id);
                    continue;
                }
                Err(err) => {
                    log::error!("patternGeometry({}) failed: {err}", route.pattern_id);
                    continue;
                }
            };

            if let Some(itinerary) = direct_geometry::build(
                &route.pattern_id,
                &route.line,
                &polyline,
                request.from,
                request.to,
                request.date_ms,
                &self.config,
            ) {
                itineraries.push(itinerary);
            }
        }
    }

    async fn run_stop_direct(
        &self,
        store: &dyn SpatialStore,
        request: &PlanRequest,
        stop_radius_m: f64,
        itineraries: &mut Vec<Itinerary>,
    ) {
        let origin_stops = match store
            .nearby_stops(request.from.0, request.from.1, stop_radius_m, NEARBY_STOP_LIMIT)
            .await
        {
            Ok(stops) => stops,
            Err(err) => {
                log::error!("nearbyStops(origin) failed: {err}");
                return;
            }
        };
        let dest_stops = match store
            .nearby_stops(request.to.0, request.to.1, stop_radius_m, NEARBY_STOP_LIMIT)
            .await
        {
            Ok(stops) => stops,
            Err(err) => {
                log::error!("nearbyStops(destination) failed: {err}");
                return;
            }
        };

        if origin_stops.is_empty() || dest_stops.is_empty() {
            return;
        }

        let origin_ids: Vec<i64> = origin_stops.iter().map(|s| s.stop.id).collect();
        let dest_ids: Vec<i64> = dest_stops.iter().map(|s| s.stop.id).collect();

        let routes = match store.direct_stop_routes(&origin_ids, &dest_ids).await {
            Ok(routes) => routes,
            Err(err) => {
                log::error!("directStopRoutes failed: {err}");
                return;
            }
        };

        for route in routes.into_iter().take(MAX_STOP_DIRECT_CANDIDATES) {
            let origin_stop = match store.stop_by_id(route.origin_stop_id).await {
                Ok(Some(stop)) => stop,
                Ok(None) => continue,
                Err(err) => {
                    log::error!("stopById({}) failed: {err}", route.origin_stop_id);
                    continue;
                }
            };
            let dest_stop = match store.stop_by_id(route.dest_stop_id).await {
                Ok(Some(stop)) => stop,
                Ok(None) => continue,
                Err(err) => {
                    log::error!("stopById({}) failed: {err}", route.dest_stop_id);
                    continue;
                }
            };
            let polyline = match store.pattern_geometry(&route.pattern_id).await {
                Ok(Some(polyline)) if polyline.len() >= 2 => polyline,
                Ok(_) => continue,
                Err(err) => {
                    log::error!("patternGeometry({}) failed: {err}", route.pattern_id);
                    continue;
                }
            };

            let (board_pt, i_board) = projection::project(&polyline, (origin_stop.lat, origin_stop.lon));
            let (alight_pt, i_alight) = projection::project(&polyline, (dest_stop.lat, dest_stop.lon));
            if i_board >= i_alight {
                log::debug!("stop builder: pattern {} has inverted stop ordering", route.pattern_id);
                continue;
            }
            let mut ride = polyline[i_board..=i_alight].to_vec();
            // Anchor the ride's endpoints on the authored stop coordinates
            // rather than the projected vertices, since stop boarding/
            // alighting is defined by the stop itself.
            ride[0] = board_pt;
            let last = ride.len() - 1;
            ride[last] = alight_pt;

            if let Some(itinerary) = direct_stops::build(
                &route.pattern_id,
                &route.line,
                request.from,
                request.to,
                &origin_stop,
                &dest_stop,
                ride,
                request.date_ms,
                &self.config,
            ) {
                itineraries.push(itinerary);
            }
        }
    }

    async fn run_one_transfer(
        &self,
        store: &dyn SpatialStore,
        request: &PlanRequest,
        geom_radius_m: f64,
        itineraries: &mut Vec<Itinerary>,
    ) {
        let pairs = match store
            .geom_transfer(request.from, request.to, geom_radius_m, INTER_PATTERN_M)
            .await
        {
            Ok(pairs) => pairs,
            Err(err) => {
                log::error!("geomTransfer failed: {err}");
                return;
            }
        };

        for pair in pairs.into_iter().take(MAX_ONE_TRANSFER_CANDIDATES) {
            let poly1 = match self.fetch_polyline(store, &pair.pattern1_id).await {
                Some(p) => p,
                None => continue,
            };
            let poly2 = match self.fetch_polyline(store, &pair.pattern2_id).await {
                Some(p) => p,
                None => continue,
            };

            if let Some(itinerary) = transfer::one_transfer(
                transfer::RidePattern {
                    pattern_id: &pair.pattern1_id,
                    line: &pair.line1,
                    polyline: &poly1,
                },
                transfer::RidePattern {
                    pattern_id: &pair.pattern2_id,
                    line: &pair.line2,
                    polyline: &poly2,
                },
                pair.transfer_point,
                request.from,
                request.to,
                request.date_ms,
                &self.config,
            ) {
                itineraries.push(itinerary);
            }
        }
    }

    async fn run_two_transfer(
        &self,
        store: &dyn SpatialStore,
        request: &PlanRequest,
        geom_radius_m: f64,
        itineraries: &mut Vec<Itinerary>,
    ) {
        let triples = match store
            .geom_triple_transfer(request.from, request.to, geom_radius_m, INTER_PATTERN_M)
            .await
        {
            Ok(triples) => triples,
            Err(err) => {
                log::error!("geomTripleTransfer failed: {err}");
                return;
            }
        };

        for triple in triples.into_iter().take(MAX_TWO_TRANSFER_CANDIDATES) {
            let poly1 = match self.fetch_polyline(store, &triple.pattern1_id).await {
                Some(p) => p,
                None => continue,
            };
            let poly2 = match self.fetch_polyline(store, &triple.pattern2_id).await {
                Some(p) => p,
                None => continue,
            };
            let poly3 = match self.fetch_polyline(store, &triple.pattern3_id).await {
                Some(p) => p,
                None => continue,
            };

            if let Some(itinerary) = transfer::two_transfer(
                transfer::RidePattern {
                    pattern_id: &triple.pattern1_id,
                    line: &triple.line1,
                    polyline: &poly1,
                },
                transfer::RidePattern {
                    pattern_id: &triple.pattern2_id,
                    line: &triple.line2,
                    polyline: &poly2,
                },
                transfer::RidePattern {
                    pattern_id: &triple.pattern3_id,
                    line: &triple.line3,
                    polyline: &poly3,
                },
                triple.transfer_point_12,
                triple.transfer_point_23,
                request.from,
                request.to,
                request.date_ms,
                &self.config,
            ) {
                itineraries.push(itinerary);
            }
        }
    }

    /// Three transfers aren't a distinct store query (§4.2 defines pairs and
    /// triples only); a fourth leg is found by chasing one more
    /// `geomTransfer` hop onward from each triple's last transfer point,
    /// keeping only continuations whose first pattern matches the triple's
    /// third leg.
    async fn run_three_transfer(
        &self,
        store: &dyn SpatialStore,
        request: &PlanRequest,
        geom_radius_m: f64,
        itineraries: &mut Vec<Itinerary>,
    ) {
        let triples = match store
            .geom_triple_transfer(request.from, request.to, geom_radius_m, INTER_PATTERN_M)
            .await
        {
            Ok(triples) => triples,
            Err(err) => {
                log::error!("geomTripleTransfer failed: {err}");
                return;
            }
        };

        for triple in triples.into_iter().take(MAX_THREE_TRANSFER_CANDIDATES) {
            let continuations = match store
                .geom_transfer(triple.transfer_point_23, request.to, geom_radius_m, INTER_PATTERN_M)
                .await
            {
                Ok(pairs) => pairs,
                Err(err) => {
                    log::error!("geomTransfer (three-transfer continuation) failed: {err}");
                    continue;
                }
            };
            let Some(fourth) = continuations
                .into_iter()
                .find(|pair| pair.pattern1_id == triple.pattern3_id)
            else {
                continue;
            };

            let poly1 = match self.fetch_polyline(store, &triple.pattern1_id).await {
                Some(p) => p,
                None => continue,
            };
            let poly2 = match self.fetch_polyline(store, &triple.pattern2_id).await {
                Some(p) => p,
                None => continue,
            };
            let poly3 = match self.fetch_polyline(store, &triple.pattern3_id).await {
                Some(p) => p,
                None => continue,
            };
            let poly4 = match self.fetch_polyline(store, &fourth.pattern2_id).await {
                Some(p) => p,
                None => continue,
            };

            if let Some(itinerary) = transfer::three_transfer(
                transfer::RidePattern {
                    pattern_id: &triple.pattern1_id,
                    line: &triple.line1,
                    polyline: &poly1,
                },
                transfer::RidePattern {
                    pattern_id: &triple.pattern2_id,
                    line: &triple.line2,
                    polyline: &poly2,
                },
                transfer::RidePattern {
                    pattern_id: &triple.pattern3_id,
                    line: &triple.line3,
                    polyline: &poly3,
                },
                transfer::RidePattern {
                    pattern_id: &fourth.pattern2_id,
                    line: &fourth.line2,
                    polyline: &poly4,
                },
                triple.transfer_point_12,
                triple.transfer_point_23,
                fourth.transfer_point,
                request.from,
                request.to,
                request.date_ms,
                &self.config,
            ) {
                itineraries.push(itinerary);
            }
        }
    }

    async fn fetch_polyline(&self, store: &dyn SpatialStore, pattern_id: &str) -> Option<Vec<(f64, f64)>> {
        match store.pattern_geometry(pattern_id).await {
            Ok(Some(polyline)) if polyline.len() >= 2 => Some(polyline),
            Ok(_) => {
                log::debug!("transfer builder: pattern {pattern_id} has no usable polyline");
                None
            }
            Err(err) => {
                log::error!("patternGeometry({pattern_id}) failed: {err}");
                None
            }
        }
    }
}

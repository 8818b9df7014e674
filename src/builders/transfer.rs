//! §4.3.4–4.3.6 — one/two/three-transfer itineraries by geometry. All three
//! are the same shape (an alternating walk/bus chain through N ride legs and
//! N-1 transfer points) extended by one more hop each; a single internal
//! chain-builder does the leg assembly and ordering/walk-cap validation,
//! and three thin wrappers adapt the store's pair/triple candidate shapes
//! to it.

use crate::config::EngineConfig;
use crate::geodesy::{haversine_distance_m, walk_distance_m};
use crate::model::{Itinerary, Leg, Place, RouteInfo};
use crate::store::LineInfo;

use super::projection::project;
use super::{bus_leg, leg_duration_seconds, walk_leg};

/// One ride leg's pattern identity and geometry, as resolved by the engine
/// via `patternGeometry` before the builder runs.
pub struct RidePattern<'a> {
    pub pattern_id: &'a str,
    pub line: &'a LineInfo,
    pub polyline: &'a [(f64, f64)],
}

fn route_info(pattern_id: &str, line: &LineInfo) -> RouteInfo {
    RouteInfo {
        route: line.short_name.clone(),
        route_id: pattern_id.to_string(),
        route_short_name: line.short_name.clone(),
        route_long_name: line.long_name.clone(),
        route_color: line.color.clone(),
        route_text_color: line.text_color.clone(),
        agency_name: "Transit".to_string(),
    }
}

/// Build a chain of `patterns.len()` ride legs joined by `transfer_points`
/// (length `patterns.len() - 1`). Requires each ride leg's projected board
/// index to precede its alight index, and the sum of detour-scaled walk
/// distances (access + inter-transfer + egress) to be within `walk_cap_m`.
/// Returns `None` on any ordering violation or cap breach.
fn build_chain(
    patterns: &[RidePattern],
    transfer_points: &[(f64, f64)],
    origin: (f64, f64),
    destination: (f64, f64),
    start_ms: i64,
    config: &EngineConfig,
    walk_cap_m: f64,
) -> Option<Itinerary> {
    let n = patterns.len();
    assert_eq!(transfer_points.len(), n - 1);

    // Resolve board/alight vertex for every ride leg first, so we can
    // validate ordering and the walk-distance cap before emitting legs.
    let mut boards = Vec::with_capacity(n);
    let mut alights = Vec::with_capacity(n);
    for (i, pattern) in patterns.iter().enumerate() {
        let board_anchor = if i == 0 { origin } else { transfer_points[i - 1] };
        let alight_anchor = if i == n - 1 { destination } else { transfer_points[i] };
        let (board_pt, i_board) = project(pattern.polyline, board_anchor);
        let (alight_pt, i_alight) = project(pattern.polyline, alight_anchor);
        if i_board >= i_alight {
            return None;
        }
        boards.push((board_pt, i_board));
        alights.push((alight_pt, i_alight));
    }

    let access_m = haversine_distance_m(origin, boards[0].0);
    let egress_m = haversine_distance_m(alights[n - 1].0, destination);
    let mut transfer_walks_m = Vec::with_capacity(n - 1);
    for i in 0..n - 1 {
        transfer_walks_m.push(haversine_distance_m(alights[i].0, boards[i + 1].0));
    }

    let total_detour_walk_m: f64 = walk_distance_m(access_m)
        + walk_distance_m(egress_m)
        + transfer_walks_m.iter().map(|&m| walk_distance_m(m)).sum::<f64>();
    if total_detour_walk_m > walk_cap_m {
        return None;
    }

    let mut clock = start_ms;
    let mut legs: Vec<Leg> = Vec::with_capacity(n * 2 + 1);
    let mut walk_time_s = 0i64;
    let mut walk_distance_total_m = 0.0f64;
    let mut transit_time_s = 0i64;

    let walk_in = walk_leg(
        Place::new("Origin", origin.0, origin.1),
        Place::new("Transfer point", boards[0].0 .0, boards[0].0 .1),
        access_m,
        clock,
        config,
    );
    clock = walk_in.end_time_ms;
    walk_time_s += walk_in.duration_s as i64;
    walk_distance_total_m += walk_in.distance_m;
    legs.push(walk_in);

    for i in 0..n {
        clock += config.wait_seconds_per_board as i64 * 1000;

        let ride = if boards[i].1 < alights[i].1 {
            patterns[i].polyline[boards[i].1..=alights[i].1].to_vec()
        } else {
            unreachable!("ordering already validated above")
        };

        let bus = bus_leg(
            Place::new("Transfer point", boards[i].0 .0, boards[i].0 .1),
            Place::new("Transfer point", alights[i].0 .0, alights[i].0 .1),
            ride,
            route_info(patterns[i].pattern_id, patterns[i].line),
            clock,
            config,
        );
        clock = bus.end_time_ms;
        transit_time_s += leg_duration_seconds(&bus);
        legs.push(bus);

        if i < n - 1 {
            let walk = walk_leg(
                Place::new("Transfer point", alights[i].0 .0, alights[i].0 .1),
                Place::new("Transfer point", boards[i + 1].0 .0, boards[i + 1].0 .1),
                transfer_walks_m[i],
                clock,
                config,
            );
            clock = walk.end_time_ms;
            walk_time_s += walk.duration_s as i64;
            walk_distance_total_m += walk.distance_m;
            legs.push(walk);
        }
    }

    let walk_out = walk_leg(
        Place::new("Transfer point", alights[n - 1].0 .0, alights[n - 1].0 .1),
        Place::new("Destination", destination.0, destination.1),
        egress_m,
        clock,
        config,
    );
    clock = walk_out.end_time_ms;
    walk_time_s += walk_out.duration_s as i64;
    walk_distance_total_m += walk_out.distance_m;
    legs.push(walk_out);

    Some(Itinerary {
        legs,
        start_time_ms: start_ms,
        end_time_ms: clock,
        duration_s: (clock - start_ms) / 1000,
        walk_time_s,
        walk_distance_m: walk_distance_total_m,
        waiting_time_s: config.wait_seconds_per_board as i64 * n as i64,
        transit_time_s,
        transfers: (n - 1) as u32,
    })
}

const ONE_TRANSFER_WALK_CAP_M: f64 = 1_000.0;
const TWO_TRANSFER_WALK_CAP_M: f64 = 800.0;
const THREE_TRANSFER_WALK_CAP_M: f64 = 600.0;

/// §4.3.4 — one transfer, two ride legs joined at a single transfer point.
pub fn one_transfer(
    p1: RidePattern,
    p2: RidePattern,
    transfer_point: (f64, f64),
    origin: (f64, f64),
    destination: (f64, f64),
    start_ms: i64,
    config: &EngineConfig,
) -> Option<Itinerary> {
    build_chain(
        &[p1, p2],
        &[transfer_point],
        origin,
        destination,
        start_ms,
        config,
        ONE_TRANSFER_WALK_CAP_M,
    )
}

/// §4.3.5 — two transfers, three ride legs on pairwise-distinct lines.
pub fn two_transfer(
    p1: RidePattern,
    p2: RidePattern,
    p3: RidePattern,
    transfer_point_12: (f64, f64),
    transfer_point_23: (f64, f64),
    origin: (f64, f64),
    destination: (f64, f64),
    start_ms: i64,
    config: &EngineConfig,
) -> Option<Itinerary> {
    if p1.line.id == p2.line.id || p2.line.id == p3.line.id || p1.line.id == p3.line.id {
        return None;
    }
    build_chain(
        &[p1, p2, p3],
        &[transfer_point_12, transfer_point_23],
        origin,
        destination,
        start_ms,
        config,
        TWO_TRANSFER_WALK_CAP_M,
    )
}

/// §4.3.6 — three transfers, four ride legs. Optional: the engine only
/// attempts this when still short of the requested itinerary count.
#[allow(clippy::too_many_arguments)]
pub fn three_transfer(
    p1: RidePattern,
    p2: RidePattern,
    p3: RidePattern,
    p4: RidePattern,
    transfer_point_12: (f64, f64),
    transfer_point_23: (f64, f64),
    transfer_point_34: (f64, f64),
    origin: (f64, f64),
    destination: (f64, f64),
    start_ms: i64,
    config: &EngineConfig,
) -> Option<Itinerary> {
    let lines = [p1.line.id, p2.line.id, p3.line.id, p4.line.id];
    for i in 0..lines.len() {
        for j in (i + 1)..lines.len() {
            if lines[i] == lines[j] {
                return None;
            }
        }
    }
    build_chain(
        &[p1, p2, p3, p4],
        &[transfer_point_12, transfer_point_23, transfer_point_34],
        origin,
        destination,
        start_ms,
        config,
        THREE_TRANSFER_WALK_CAP_M,
    )
}

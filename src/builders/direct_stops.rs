//! §4.3.3 — direct itinerary by scheduled stops: board and alight only at
//! authored `Stop` locations, using the pattern's own sequence numbers
//! rather than a geometry projection.

use crate::config::EngineConfig;
use crate::geodesy::{haversine_distance_m, walk_distance_m};
use crate::model::{Itinerary, Place, RouteInfo};
use crate::store::{LineInfo, Stop};

use super::{bus_leg, leg_duration_seconds, walk_leg};

const MAX_ACCESS_EGRESS_WALK_M: f64 = 1_200.0;

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

/// `origin`/`destination` are the rider's actual request coordinates;
/// `origin_stop`/`dest_stop` are the authored stops the pattern serves, with
/// `seq_start < seq_end` already established by the store's query. `ride`
/// is the pattern's own geometry clipped to the stop-to-stop span (the
/// stops themselves don't carry shape, only sequence order).
#[allow(clippy::too_many_arguments)]
pub fn build(
    pattern_id: &str,
    line: &LineInfo,
    origin: (f64, f64),
    destination: (f64, f64),
    origin_stop: &Stop,
    dest_stop: &Stop,
    ride: Vec<(f64, f64)>,
    start_ms: i64,
    config: &EngineConfig,
) -> Option<Itinerary> {
    let access_m = haversine_distance_m(origin, (origin_stop.lat, origin_stop.lon));
    let egress_m = haversine_distance_m((dest_stop.lat, dest_stop.lon), destination);
    if walk_distance_m(access_m) + walk_distance_m(egress_m) > MAX_ACCESS_EGRESS_WALK_M {
        return None;
    }

    let mut clock = start_ms;
    let mut legs = Vec::with_capacity(3);

    let walk1 = walk_leg(
        Place::new("Origin", origin.0, origin.1),
        Place::new(&origin_stop.name, origin_stop.lat, origin_stop.lon),
        access_m,
        clock,
        config,
    );
    clock = walk1.end_time_ms;
    let walk1_distance = walk1.distance_m;
    let walk1_duration = walk1.duration_s as i64;
    legs.push(walk1);

    clock += config.wait_seconds_per_board as i64 * 1000;
    let waiting_time_s = config.wait_seconds_per_board as i64;

    let bus = bus_leg(
        Place::new(&origin_stop.name, origin_stop.lat, origin_stop.lon),
        Place::new(&dest_stop.name, dest_stop.lat, dest_stop.lon),
        ride,
        route_info(pattern_id, line),
        clock,
        config,
    );
    clock = bus.end_time_ms;
    let transit_time_s = leg_duration_seconds(&bus);
    legs.push(bus);

    let walk2 = walk_leg(
        Place::new(&dest_stop.name, dest_stop.lat, dest_stop.lon),
        Place::new("Destination", destination.0, destination.1),
        egress_m,
        clock,
        config,
    );
    clock = walk2.end_time_ms;
    let walk2_distance = walk2.distance_m;
    let walk2_duration = walk2.duration_s as i64;
    legs.push(walk2);

    Some(Itinerary {
        legs,
        start_time_ms: start_ms,
        end_time_ms: clock,
        duration_s: (clock - start_ms) / 1000,
        walk_time_s: walk1_duration + walk2_duration,
        walk_distance_m: walk1_distance + walk2_distance,
        waiting_time_s,
        transit_time_s,
        transfers: 0,
    })
}

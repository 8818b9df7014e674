//! Component C: the itinerary builders. Each builder consumes a
//! store-supplied candidate and produces either a valid [`crate::model::Itinerary`]
//! or `None`. Shared leg-assembly helpers live here; the per-shape
//! algorithms (§4.3.2–4.3.7) live in their own modules.

pub mod direct_geometry;
pub mod direct_stops;
pub mod projection;
pub mod transfer;
pub mod walk_only;

use crate::config::EngineConfig;
use crate::geodesy::{bus_time_seconds, polyline_length_m, walk_distance_m, walk_time_seconds};
use crate::model::{Leg, LegMode, Place, RouteInfo};

/// Build a WALK leg between two places using the §4.1 detour model. Never
/// construct a WALK leg's distance any other way.
pub fn walk_leg(from: Place, to: Place, straight_line_m: f64, start_ms: i64, config: &EngineConfig) -> Leg {
    let distance_m = walk_distance_m(straight_line_m);
    let duration_s = walk_time_seconds(distance_m, config);
    let geometry = vec![(from.lat, from.lon), (to.lat, to.lon)];
    Leg {
        mode: LegMode::Walk,
        start_time_ms: start_ms,
        end_time_ms: start_ms + duration_s as i64 * 1000,
        duration_s: duration_s as f64,
        distance_m,
        from,
        to,
        route: None,
        geometry,
    }
}

/// Build a BUS leg riding `geometry` (already sliced to the board/alight
/// range, in authored order) with the given route display metadata.
pub fn bus_leg(
    from: Place,
    to: Place,
    geometry: Vec<(f64, f64)>,
    route: RouteInfo,
    start_ms: i64,
    config: &EngineConfig,
) -> Leg {
    let distance_m = polyline_length_m(&geometry);
    let duration_s = bus_time_seconds(distance_m, config);
    Leg {
        mode: LegMode::Bus,
        start_time_ms: start_ms,
        end_time_ms: start_ms + duration_s as i64 * 1000,
        duration_s: duration_s as f64,
        distance_m,
        from,
        to,
        route: Some(route),
        geometry,
    }
}

/// Sum of a leg's own duration in whole seconds, for wall-clock advancing.
pub fn leg_duration_seconds(leg: &Leg) -> i64 {
    ((leg.end_time_ms - leg.start_time_ms) as f64 / 1000.0).round() as i64
}

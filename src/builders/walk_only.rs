//! §4.3.7 — walk-only fallback: a single WALK leg, used when no transit
//! candidate survives (no service nearby, or the deadline expired before
//! any candidate was ranked).

use crate::config::EngineConfig;
use crate::geodesy::haversine_distance_m;
use crate::model::{Itinerary, Place};

use super::walk_leg;

pub fn build(origin: (f64, f64), destination: (f64, f64), start_ms: i64, config: &EngineConfig) -> Itinerary {
    let straight_line_m = haversine_distance_m(origin, destination);
    let leg = walk_leg(
        Place::new("Origin", origin.0, origin.1),
        Place::new("Destination", destination.0, destination.1),
        straight_line_m,
        start_ms,
        config,
    );
    let end_time_ms = leg.end_time_ms;
    let walk_time_s = leg.duration_s as i64;
    let walk_distance_m = leg.distance_m;
    Itinerary {
        legs: vec![leg],
        start_time_ms: start_ms,
        end_time_ms,
        duration_s: (end_time_ms - start_ms) / 1000,
        walk_time_s,
        walk_distance_m,
        waiting_time_s: 0,
        transit_time_s: 0,
        transfers: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_leg_walk_itinerary() {
        let config = EngineConfig::default();
        let itinerary = build((-17.7833, -63.1821), (0.0, 0.0), 0, &config);
        assert_eq!(itinerary.legs.len(), 1);
        assert!(itinerary.legs[0].mode == crate::model::LegMode::Walk);
        assert_eq!(itinerary.transfers, 0);
        assert_eq!(itinerary.transit_time_s, 0);
    }
}

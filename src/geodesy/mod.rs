//! Component A: Haversine distance, the walk-detour model, and the
//! walk/bus time estimators. Kept dependency-light and pure so builders and
//! property tests can call it without touching the store.

pub mod polyline;

use geo::{Distance, Haversine};
use geo_types::Point;

use crate::config::EngineConfig;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two (lat, lon) pairs, in meters.
///
/// Uses `geo`'s Haversine implementation (radius-parameterized the same way
/// as the `EARTH_RADIUS_M` constant above) rather than hand-rolling the
/// trigonometry.
pub fn haversine_distance_m(a: (f64, f64), b: (f64, f64)) -> f64 {
    let _ = EARTH_RADIUS_M; // documents the radius geo::Haversine assumes
    let pa = Point::new(a.1, a.0);
    let pb = Point::new(b.1, b.0);
    Haversine::distance(pa, pb)
}

/// Piecewise detour multiplier modeling a grid street network. This stands
/// in for a true pedestrian router and must be the only source of
/// user-facing walk distance/time anywhere in the engine.
pub fn walk_detour_factor(straight_line_m: f64) -> f64 {
    if straight_line_m < 200.0 {
        1.3
    } else if straight_line_m < 500.0 {
        1.5
    } else if straight_line_m < 1000.0 {
        1.7
    } else {
        2.0
    }
}

/// Detour-scaled walking distance. Never mix raw haversine into
/// walk-distance accounting; this is the only function that should produce
/// a walk leg's reported distance.
pub fn walk_distance_m(straight_line_m: f64) -> f64 {
    straight_line_m * walk_detour_factor(straight_line_m)
}

/// Walking time in whole seconds, floored.
pub fn walk_time_seconds(distance_m: f64, config: &EngineConfig) -> u32 {
    ((distance_m / config.walk_speed_m_per_min) * 60.0).floor() as u32
}

/// In-vehicle bus time in whole seconds, floored.
pub fn bus_time_seconds(distance_m: f64, config: &EngineConfig) -> u32 {
    ((distance_m / config.bus_speed_m_per_min) * 60.0).floor() as u32
}

/// Sum of haversine distances along a sequence of consecutive vertices.
pub fn polyline_length_m(points: &[(f64, f64)]) -> f64 {
    points
        .windows(2)
        .map(|pair| haversine_distance_m(pair[0], pair[1]))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_is_zero() {
        assert_eq!(haversine_distance_m((-17.78, -63.18), (-17.78, -63.18)), 0.0);
        assert_eq!(walk_distance_m(0.0), 0.0);
    }

    #[test]
    fn detour_steps() {
        assert_eq!(walk_detour_factor(50.0), 1.3);
        assert_eq!(walk_detour_factor(199.9), 1.3);
        assert_eq!(walk_detour_factor(200.0), 1.5);
        assert_eq!(walk_detour_factor(499.9), 1.5);
        assert_eq!(walk_detour_factor(500.0), 1.7);
        assert_eq!(walk_detour_factor(999.9), 1.7);
        assert_eq!(walk_detour_factor(1000.0), 2.0);
        assert_eq!(walk_detour_factor(5000.0), 2.0);
    }

    #[test]
    fn known_haversine() {
        // Roughly 1 degree of latitude ~ 111.2 km
        let d = haversine_distance_m((0.0, 0.0), (1.0, 0.0));
        assert!((d - 111_195.0).abs() < 500.0);
    }

    #[test]
    fn time_estimators_floor() {
        let cfg = EngineConfig::default();
        assert_eq!(walk_time_seconds(70.0, &cfg), 60);
        assert_eq!(walk_time_seconds(75.0, &cfg), 64);
        assert_eq!(bus_time_seconds(333.0, &cfg), 60);
    }
}

//! §4.3.2 — direct itinerary by geometry: the rider may board/alight at any
//! vertex along a pattern's polyline, not just at an authored stop.

use crate::config::EngineConfig;
use crate::geodesy::haversine_distance_m;
use crate::model::{Itinerary, Place, RouteInfo};
use crate::store::LineInfo;

use super::projection::project;
use super::{bus_leg, leg_duration_seconds, walk_leg};

const LOOP_THRESHOLD_M: f64 = 1_000.0;
const REVERSE_RECOVERY_MAX_GAP: usize = 10;

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

/// Slice `polyline` for a direct ride from `i_board` to `i_alight`,
/// handling the forward case, the loop heuristic, and the bounded
/// reverse-mis-projection recovery. Returns `None` on an invalid direction.
fn slice_for_ride(polyline: &[(f64, f64)], i_board: usize, i_alight: usize) -> Option<Vec<(f64, f64)>> {
    if i_board < i_alight {
        return Some(polyline[i_board..=i_alight].to_vec());
    }

    let first = polyline[0];
    let last = polyline[polyline.len() - 1];
    if haversine_distance_m(first, last) < LOOP_THRESHOLD_M {
        let mut slice = polyline[i_board..].to_vec();
        slice.extend_from_slice(&polyline[..=i_alight]);
        return Some(slice);
    }

    if i_board.saturating_sub(i_alight) < REVERSE_RECOVERY_MAX_GAP {
        log::warn!(
            "direct_geometry: reversing a near-identity candidate (board {i_board}, alight {i_alight}) — \
             this may ride against the pattern's authored direction"
        );
        let mut slice = polyline[i_alight..=i_board].to_vec();
        slice.reverse();
        return Some(slice);
    }

    None
}

pub fn build(
    pattern_id: &str,
    line: &LineInfo,
    polyline: &[(f64, f64)],
    origin: (f64, f64),
    destination: (f64, f64),
    start_ms: i64,
    config: &EngineConfig,
) -> Option<Itinerary> {
    if polyline.len() < 2 {
        log::debug!("direct_geometry: pattern {pattern_id} has fewer than 2 vertices");
        return None;
    }

    let (board_pt, i_board) = project(polyline, origin);
    let (alight_pt, i_alight) = project(polyline, destination);

    if i_board == i_alight {
        return None;
    }

    let ride = slice_for_ride(polyline, i_board, i_alight)?;

    let mut clock = start_ms;
    let mut legs = Vec::with_capacity(3);

    let walk1 = walk_leg(
        Place::new("Origin", origin.0, origin.1),
        Place::new("Bus boarding point", board_pt.0, board_pt.1),
        haversine_distance_m(origin, board_pt),
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
        Place::new("Bus boarding point", board_pt.0, board_pt.1),
        Place::new("Bus alighting point", alight_pt.0, alight_pt.1),
        ride,
        route_info(pattern_id, line),
        clock,
        config,
    );
    clock = bus.end_time_ms;
    let transit_time_s = leg_duration_seconds(&bus);
    legs.push(bus);

    let walk2 = walk_leg(
        Place::new("Bus alighting point", alight_pt.0, alight_pt.1),
        Place::new("Destination", destination.0, destination.1),
        haversine_distance_m(alight_pt, destination),
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

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> LineInfo {
        LineInfo {
            id: 1,
            short_name: "12".into(),
            long_name: "Line 12".into(),
            color: "0088FF".into(),
            text_color: "FFFFFF".into(),
            mode: "BUS".into(),
        }
    }

    fn straight_polyline(n: usize) -> Vec<(f64, f64)> {
        (0..n).map(|i| (-17.78 + i as f64 * 0.001, -63.18)).collect()
    }

    #[test]
    fn forward_slice_builds_itinerary() {
        let poly = straight_polyline(20);
        let config = EngineConfig::default();
        let itinerary = build(
            "pattern:1:outbound",
            &line(),
            &poly,
            poly[2],
            poly[15],
            0,
            &config,
        )
        .unwrap();
        assert_eq!(itinerary.transfers, 0);
        assert_eq!(itinerary.legs.len(), 3);
        assert_eq!(itinerary.legs[0].distance_m, 0.0);
        assert!(itinerary.legs[1].is_transit());
    }

    #[test]
    fn equal_indices_are_invalid() {
        let poly = straight_polyline(20);
        let config = EngineConfig::default();
        assert!(build("p", &line(), &poly, poly[5], poly[5], 0, &config).is_none());
    }

    #[test]
    fn loop_route_wraps_around() {
        // First and last vertex 500m apart (< 1000m threshold): a loop.
        let mut poly: Vec<(f64, f64)> = (0..100)
            .map(|i| (-17.78 + i as f64 * 0.0001, -63.18))
            .collect();
        poly[99] = (poly[0].0 + 0.0045, poly[0].1); // ~500m from vertex 0
        let board = poly[90];
        let alight = poly[5];
        let slice = slice_for_ride(&poly, 90, 5).unwrap();
        assert_eq!(slice.len(), 15);
        let _ = (board, alight);
    }

    #[test]
    fn large_backward_gap_is_invalid() {
        let poly = straight_polyline(50);
        assert!(slice_for_ride(&poly, 40, 5).is_none());
    }

    #[test]
    fn small_backward_gap_reverses() {
        let poly = straight_polyline(50);
        let slice = slice_for_ride(&poly, 12, 5).unwrap();
        assert_eq!(slice.first(), Some(&poly[5]));
        assert_eq!(slice.last(), Some(&poly[12]));
    }
}

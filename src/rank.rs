//! Component D: generalized-cost ranking and the post-sort excess-walk
//! filter (§4.4). Operates purely on already-built [`Itinerary`] values;
//! the builders never sort or drop candidates themselves.

use crate::config::EngineConfig;
use crate::model::Itinerary;

const ROUTE_EFFICIENCY_PENALTY_THRESHOLD: f64 = 2.0;
const ROUTE_EFFICIENCY_PENALTY: f64 = 1.5;
const ROUTE_EFFICIENCY_NORMAL: f64 = 1.0;

const DIRECT_BONUS: f64 = -200.0;
const DIRECT_BONUS_WALK_DISTANCE_M: f64 = 500.0;

/// `D` is the direct-line (haversine) distance between origin and
/// destination for this request; it bounds how efficient a transit ride
/// "should" be before the inefficiency penalty kicks in.
fn route_efficiency(itinerary: &Itinerary, direct_distance_m: f64) -> f64 {
    let bus_distance_m = itinerary.bus_leg_distance_m();
    if bus_distance_m > direct_distance_m * ROUTE_EFFICIENCY_PENALTY_THRESHOLD {
        ROUTE_EFFICIENCY_PENALTY
    } else {
        ROUTE_EFFICIENCY_NORMAL
    }
}

/// Cumulative linear penalty past three walking-distance thresholds: each
/// threshold crossed adds its own marginal rate over the excess beyond it,
/// so the penalty keeps climbing rather than capping at a flat add-on.
fn excess_walk_penalty(walk_distance_m: f64) -> f64 {
    let mut penalty = 0.0;
    if walk_distance_m > 300.0 {
        penalty += (walk_distance_m - 300.0) * 2.0;
    }
    if walk_distance_m > 800.0 {
        penalty += (walk_distance_m - 800.0) * 4.0;
    }
    if walk_distance_m > 1500.0 {
        penalty += (walk_distance_m - 1500.0) * 10.0;
    }
    penalty
}

fn direct_bonus(itinerary: &Itinerary) -> f64 {
    if itinerary.transfers == 0 && itinerary.walk_distance_m < DIRECT_BONUS_WALK_DISTANCE_M {
        DIRECT_BONUS
    } else {
        0.0
    }
}

/// The generalized cost `C` for one itinerary, lower is better.
pub fn cost(itinerary: &Itinerary, direct_distance_m: f64, config: &EngineConfig) -> f64 {
    let transit_s = itinerary.transit_time_s as f64;
    let walk_s = itinerary.walk_time_s as f64;
    let wait_s = itinerary.waiting_time_s as f64;
    let transfers = itinerary.transfers as f64;

    transit_s * route_efficiency(itinerary, direct_distance_m)
        + walk_s * config.walk_penalty_weight
        + wait_s
        + transfers * config.transfer_penalty_seconds as f64
        + excess_walk_penalty(itinerary.walk_distance_m)
        + direct_bonus(itinerary)
}

/// Sort ascending by cost, apply the post-sort excess-walk pruning rule,
/// then truncate to `requested`.
///
/// Pruning rule: if at least 5 itineraries remain after sorting and the
/// minimum walkDistance among the top 5 is under 1000 m, drop any
/// itinerary ranked 4th or later whose walkDistance is at least 2000 m —
/// a cheap-but-long-walk outlier shouldn't survive next to a batch of
/// itineraries that prove a much shorter walk was available.
pub fn rank(
    mut itineraries: Vec<Itinerary>,
    direct_distance_m: f64,
    requested: usize,
    config: &EngineConfig,
) -> Vec<Itinerary> {
    itineraries.sort_by(|a, b| {
        cost(a, direct_distance_m, config)
            .partial_cmp(&cost(b, direct_distance_m, config))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    if itineraries.len() >= 5 {
        let min_top5_walk = itineraries[..5]
            .iter()
            .map(|it| it.walk_distance_m)
            .fold(f64::INFINITY, f64::min);
        if min_top5_walk < 1_000.0 {
            let mut kept = Vec::with_capacity(itineraries.len());
            for (i, itinerary) in itineraries.into_iter().enumerate() {
                if i >= 3 && itinerary.walk_distance_m >= 2_000.0 {
                    continue;
                }
                kept.push(itinerary);
            }
            itineraries = kept;
        }
    }

    itineraries.truncate(requested);
    itineraries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Leg, LegMode, Place};

    fn walk_leg(distance_m: f64, duration_s: f64) -> Leg {
        Leg {
            mode: LegMode::Walk,
            start_time_ms: 0,
            end_time_ms: (duration_s * 1000.0) as i64,
            duration_s,
            distance_m,
            from: Place::new("A", 0.0, 0.0),
            to: Place::new("B", 0.0, 0.0),
            route: None,
            geometry: vec![],
        }
    }

    fn direct_itinerary(walk_distance_m: f64, transit_time_s: i64, bus_distance_m: f64) -> Itinerary {
        let mut legs = vec![walk_leg(walk_distance_m / 2.0, 0.0)];
        legs.push(Leg {
            mode: LegMode::Bus,
            start_time_ms: 0,
            end_time_ms: transit_time_s * 1000,
            duration_s: transit_time_s as f64,
            distance_m: bus_distance_m,
            from: Place::new("Board", 0.0, 0.0),
            to: Place::new("Alight", 0.0, 0.0),
            route: None,
            geometry: vec![],
        });
        legs.push(walk_leg(walk_distance_m / 2.0, 0.0));
        Itinerary {
            legs,
            start_time_ms: 0,
            end_time_ms: transit_time_s * 1000,
            duration_s: transit_time_s,
            walk_time_s: 0,
            walk_distance_m,
            waiting_time_s: 300,
            transit_time_s,
            transfers: 0,
        }
    }

    #[test]
    fn direct_bonus_favors_short_walk_no_transfer() {
        let config = EngineConfig::default();
        let short = direct_itinerary(400.0, 600, 2000.0);
        let long_transfer = Itinerary {
            transfers: 1,
            ..direct_itinerary(400.0, 600, 2000.0)
        };
        assert!(cost(&short, 2000.0, &config) < cost(&long_transfer, 2000.0, &config));
    }

    #[test]
    fn inefficient_route_gets_penalized() {
        let config = EngineConfig::default();
        let efficient = direct_itinerary(400.0, 600, 1000.0);
        let inefficient = direct_itinerary(400.0, 600, 5000.0);
        assert!(cost(&efficient, 1000.0, &config) < cost(&inefficient, 1000.0, &config));
    }

    #[test]
    fn rank_truncates_to_requested_count() {
        let config = EngineConfig::default();
        let itineraries = vec![
            direct_itinerary(100.0, 300, 500.0),
            direct_itinerary(200.0, 400, 600.0),
            direct_itinerary(300.0, 500, 700.0),
        ];
        let ranked = rank(itineraries, 500.0, 2, &config);
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn excess_walk_outlier_pruned_when_better_walks_exist() {
        let config = EngineConfig::default();
        let mut itineraries: Vec<Itinerary> = (0..5).map(|_| direct_itinerary(200.0, 400, 500.0)).collect();
        itineraries.push(direct_itinerary(2500.0, 100, 500.0));
        let ranked = rank(itineraries, 500.0, 10, &config);
        assert!(ranked.iter().all(|it| it.walk_distance_m < 2_000.0));
    }
}

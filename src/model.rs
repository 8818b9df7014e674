//! Ephemeral entities built fresh for one plan request: [`Leg`],
//! [`Itinerary`], and [`Plan`]. Builder-specific candidate shapes live next
//! to the builder that consumes them (`builders::*`); this module holds only
//! what survives to ranking and serialization.

use serde::Serialize;

/// A named point with coordinates, reused for origin/destination and every
/// leg boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl Place {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Place {
            name: name.into(),
            lat,
            lon,
        }
    }
}

/// The source dispatches on leg mode strings; we use a tagged variant with
/// exactly the two cases the spec recognizes and keep the wire form literal
/// in `otp::LegDto`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegMode {
    Walk,
    Bus,
}

/// Route display metadata, present only on BUS legs.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteInfo {
    pub route: String,
    pub route_id: String,
    pub route_short_name: String,
    pub route_long_name: String,
    pub route_color: String,
    pub route_text_color: String,
    pub agency_name: String,
}

/// One continuous walk or ride.
#[derive(Debug, Clone, PartialEq)]
pub struct Leg {
    pub mode: LegMode,
    pub start_time_ms: i64,
    pub end_time_ms: i64,
    pub duration_s: f64,
    pub distance_m: f64,
    pub from: Place,
    pub to: Place,
    pub route: Option<RouteInfo>,
    /// Input vertices for the leg's geometry; encoded to a polyline and
    /// counted for `legGeometry.length` at serialization time.
    pub geometry: Vec<(f64, f64)>,
}

impl Leg {
    pub fn is_transit(&self) -> bool {
        self.mode == LegMode::Bus
    }
}

/// Ordered non-empty sequence of legs with aggregate totals.
#[derive(Debug, Clone, PartialEq)]
pub struct Itinerary {
    pub legs: Vec<Leg>,
    pub start_time_ms: i64,
    pub end_time_ms: i64,
    pub duration_s: i64,
    pub walk_time_s: i64,
    pub walk_distance_m: f64,
    pub waiting_time_s: i64,
    pub transit_time_s: i64,
    pub transfers: u32,
}

impl Itinerary {
    pub fn bus_leg_distance_m(&self) -> f64 {
        self.legs
            .iter()
            .filter(|leg| leg.is_transit())
            .map(|leg| leg.distance_m)
            .sum()
    }
}

/// List of ranked itineraries plus the request-echo places.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub itineraries: Vec<Itinerary>,
    pub date_ms: i64,
    pub from: Place,
    pub to: Place,
}

//! Component E: the OTP-compatible wire schema. Downstream clients bind to
//! this exact shape, so field names and aliases are load-bearing, not
//! cosmetic — keep them literal even where they read oddly against Rust
//! naming conventions.

use serde::Serialize;

use crate::geodesy::polyline;
use crate::model::{Itinerary, Leg, LegMode, Plan};

#[derive(Debug, Clone, Serialize)]
pub struct PlaceDto {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(rename = "vertexType")]
    pub vertex_type: &'static str,
}

impl From<&crate::model::Place> for PlaceDto {
    fn from(place: &crate::model::Place) -> Self {
        PlaceDto {
            name: place.name.clone(),
            lat: place.lat,
            lon: place.lon,
            vertex_type: "NORMAL",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LegGeometryDto {
    pub points: String,
    pub length: usize,
}

impl From<&[(f64, f64)]> for LegGeometryDto {
    fn from(points: &[(f64, f64)]) -> Self {
        LegGeometryDto {
            points: polyline::encode(points),
            length: points.len(),
        }
    }
}

fn mode_str(mode: LegMode) -> &'static str {
    match mode {
        LegMode::Walk => "WALK",
        LegMode::Bus => "BUS",
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LegDto {
    pub mode: &'static str,
    #[serde(rename = "startTime")]
    pub start_time: i64,
    #[serde(rename = "endTime")]
    pub end_time: i64,
    pub duration: f64,
    pub distance: f64,
    pub from: PlaceDto,
    pub to: PlaceDto,
    pub route: Option<String>,
    #[serde(rename = "routeId")]
    pub route_id: Option<String>,
    #[serde(rename = "routeShortName")]
    pub route_short_name: Option<String>,
    #[serde(rename = "routeLongName")]
    pub route_long_name: Option<String>,
    #[serde(rename = "routeColor")]
    pub route_color: Option<String>,
    #[serde(rename = "routeTextColor")]
    pub route_text_color: Option<String>,
    #[serde(rename = "agencyName")]
    pub agency_name: Option<String>,
    #[serde(rename = "legGeometry")]
    pub leg_geometry: LegGeometryDto,
    #[serde(rename = "rentedBike")]
    pub rented_bike: bool,
    #[serde(rename = "transitLeg")]
    pub transit_leg: bool,
    #[serde(rename = "realTime")]
    pub real_time: bool,
    pub pathway: bool,
    #[serde(rename = "intermediateStops")]
    pub intermediate_stops: Vec<()>,
}

impl From<&Leg> for LegDto {
    fn from(leg: &Leg) -> Self {
        let route = leg.route.as_ref();
        LegDto {
            mode: mode_str(leg.mode),
            start_time: leg.start_time_ms,
            end_time: leg.end_time_ms,
            duration: leg.duration_s,
            distance: leg.distance_m,
            from: PlaceDto::from(&leg.from),
            to: PlaceDto::from(&leg.to),
            route: route.map(|r| r.route.clone()),
            route_id: route.map(|r| r.route_id.clone()),
            route_short_name: route.map(|r| r.route_short_name.clone()),
            route_long_name: route.map(|r| r.route_long_name.clone()),
            route_color: route.map(|r| r.route_color.clone()),
            route_text_color: route.map(|r| r.route_text_color.clone()),
            agency_name: route.map(|r| r.agency_name.clone()),
            leg_geometry: LegGeometryDto::from(leg.geometry.as_slice()),
            rented_bike: false,
            transit_leg: leg.is_transit(),
            real_time: false,
            pathway: false,
            intermediate_stops: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ItineraryDto {
    pub legs: Vec<LegDto>,
    #[serde(rename = "startTime")]
    pub start_time: i64,
    #[serde(rename = "endTime")]
    pub end_time: i64,
    pub duration: i64,
    #[serde(rename = "walkTime")]
    pub walk_time: i64,
    #[serde(rename = "walkDistance")]
    pub walk_distance: f64,
    pub transfers: u32,
    #[serde(rename = "transitTime")]
    pub transit_time: i64,
    #[serde(rename = "waitingTime")]
    pub waiting_time: i64,
    #[serde(rename = "elevationLost")]
    pub elevation_lost: f64,
    #[serde(rename = "elevationGained")]
    pub elevation_gained: f64,
    #[serde(rename = "tooSloped")]
    pub too_sloped: bool,
}

impl From<&Itinerary> for ItineraryDto {
    fn from(itinerary: &Itinerary) -> Self {
        ItineraryDto {
            legs: itinerary.legs.iter().map(LegDto::from).collect(),
            start_time: itinerary.start_time_ms,
            end_time: itinerary.end_time_ms,
            duration: itinerary.duration_s,
            walk_time: itinerary.walk_time_s,
            walk_distance: itinerary.walk_distance_m,
            transfers: itinerary.transfers,
            transit_time: itinerary.transit_time_s,
            waiting_time: itinerary.waiting_time_s,
            elevation_lost: 0.0,
            elevation_gained: 0.0,
            too_sloped: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanDto {
    pub itineraries: Vec<ItineraryDto>,
    pub date: i64,
    pub from: PlaceDto,
    pub to: PlaceDto,
}

impl From<&Plan> for PlanDto {
    fn from(plan: &Plan) -> Self {
        PlanDto {
            itineraries: plan.itineraries.iter().map(ItineraryDto::from).collect(),
            date: plan.date_ms,
            from: PlaceDto::from(&plan.from),
            to: PlaceDto::from(&plan.to),
        }
    }
}

/// The envelope actually written to the wire: `requestParameters` is
/// always empty, matching the shape clients already parse for OTP
/// responses.
#[derive(Debug, Clone, Serialize)]
pub struct PlanResponseDto {
    pub plan: PlanDto,
    #[serde(rename = "requestParameters")]
    pub request_parameters: serde_json::Map<String, serde_json::Value>,
}

impl From<&Plan> for PlanResponseDto {
    fn from(plan: &Plan) -> Self {
        PlanResponseDto {
            plan: PlanDto::from(plan),
            request_parameters: serde_json::Map::new(),
        }
    }
}

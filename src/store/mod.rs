//! Component B: the spatial query layer contract. `SpatialStore` is the
//! seam the engine sees; table/column names are a private detail of each
//! implementation (§6.1). [`postgis`] talks to a PostGIS-backed relational
//! store the way the original service's SQLAlchemy queries did; [`memory`]
//! is an in-process R-tree-indexed double used by tests.

pub mod memory;
pub mod postgis;

use async_trait::async_trait;

use crate::error::Result;

/// A boarding location, as read from the store. Never mutated by the
/// engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub id: i64,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

/// Display metadata for a Line, denormalized onto whichever query row
/// needs it (the original queries `COALESCE` these against the line's
/// generic name so planning code never has to branch on missing display
/// fields).
#[derive(Debug, Clone, PartialEq)]
pub struct LineInfo {
    pub id: i64,
    pub short_name: String,
    pub long_name: String,
    pub color: String,
    pub text_color: String,
    pub mode: String,
}

/// Authored direction of a Pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Outbound,
    Inbound,
}

/// Row returned by `nearbyStops`.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyStop {
    pub stop: Stop,
    pub distance_m: f64,
}

/// Row returned by `geomRoutesThroughBoth`.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryRoute {
    pub pattern_id: String,
    pub line: LineInfo,
    pub dist_from_m: f64,
    pub dist_to_m: f64,
}

impl GeometryRoute {
    pub fn total_dist_m(&self) -> f64 {
        self.dist_from_m + self.dist_to_m
    }
}

/// Row returned by `directStopRoutes`.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectStopRoute {
    pub pattern_id: String,
    pub line: LineInfo,
    pub origin_stop_id: i64,
    pub dest_stop_id: i64,
    pub seq_start: i64,
    pub seq_end: i64,
}

/// Row returned by `geomTransfer`: a pair of patterns from different lines
/// chained by a single transfer point, which is the closest point on P1 to
/// P2.
#[derive(Debug, Clone, PartialEq)]
pub struct GeomTransferPair {
    pub pattern1_id: String,
    pub line1: LineInfo,
    pub pattern2_id: String,
    pub line2: LineInfo,
    pub transfer_point: (f64, f64),
}

/// Row returned by `geomTripleTransfer`: three pairwise-distinct lines
/// chained via two closest-point transfers.
#[derive(Debug, Clone, PartialEq)]
pub struct GeomTripleTransfer {
    pub pattern1_id: String,
    pub line1: LineInfo,
    pub pattern2_id: String,
    pub line2: LineInfo,
    pub pattern3_id: String,
    pub line3: LineInfo,
    pub transfer_point_12: (f64, f64),
    pub transfer_point_23: (f64, f64),
}

/// The read-only spatial query layer. Every method must be translatable to
/// a single bounded query against the backing store; no method may hold a
/// connection across another method's suspension point.
#[async_trait]
pub trait SpatialStore: Send + Sync {
    async fn nearby_stops(
        &self,
        lat: f64,
        lon: f64,
        radius_m: f64,
        limit: usize,
    ) -> Result<Vec<NearbyStop>>;

    async fn geom_routes_through_both(
        &self,
        from: (f64, f64),
        to: (f64, f64),
        radius_m: f64,
    ) -> Result<Vec<GeometryRoute>>;

    async fn direct_stop_routes(
        &self,
        origin_stop_ids: &[i64],
        dest_stop_ids: &[i64],
    ) -> Result<Vec<DirectStopRoute>>;

    async fn geom_transfer(
        &self,
        from: (f64, f64),
        to: (f64, f64),
        radius_m: f64,
        inter_pattern_m: f64,
    ) -> Result<Vec<GeomTransferPair>>;

    async fn geom_triple_transfer(
        &self,
        from: (f64, f64),
        to: (f64, f64),
        radius_m: f64,
        inter_pattern_m: f64,
    ) -> Result<Vec<GeomTripleTransfer>>;

    async fn pattern_geometry(&self, pattern_id: &str) -> Result<Option<Vec<(f64, f64)>>>;

    async fn stop_by_id(&self, id: i64) -> Result<Option<Stop>>;
}

//! PostGIS-backed implementation of [`SpatialStore`]. Table and column
//! names here are this implementation's private choice — the engine only
//! depends on the trait. Schema (for reference, not enforced by this
//! module): `lines(id, short_name, long_name, color, text_color, mode,
//! active)`, `patterns(id, line_id, sense, geom geography(LineString,4326))`,
//! `stops(id, name, lat, lon, geom geography(Point,4326), active)`,
//! `pattern_stops(pattern_id, stop_id, sequence)`.
//!
//! Query shapes follow the original service's SQLAlchemy `text()` queries
//! (`ST_DWithin`/`ST_Distance` against `::geography` casts,
//! `ST_DumpPoints` for polyline vertices), translated to parameterized
//! `tokio_postgres` queries.

use async_trait::async_trait;
use tokio_postgres::{Client, Row};

use crate::error::{EngineError, Result};

use super::{
    DirectStopRoute, GeomTransferPair, GeomTripleTransfer, GeometryRoute, LineInfo, NearbyStop,
    SpatialStore, Stop,
};

pub struct PostgisStore {
    client: Client,
}

impl PostgisStore {
    pub fn new(client: Client) -> Self {
        PostgisStore { client }
    }

    /// Connect using a libpq-style connection string, spawning the
    /// connection driver task the way `tokio-postgres` expects.
    pub async fn connect(conn_str: &str) -> Result<Self> {
        let (client, connection) = tokio_postgres::connect(conn_str, tokio_postgres::NoTls)
            .await
            .map_err(|e| EngineError::StoreUnavailable(e.to_string()))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                log::error!("postgis connection driver failed: {e}");
            }
        });

        Ok(PostgisStore::new(client))
    }
}

fn line_from_row(row: &Row, prefix_offset: usize) -> LineInfo {
    LineInfo {
        id: row.get(prefix_offset),
        short_name: row.get(prefix_offset + 1),
        long_name: row.get(prefix_offset + 2),
        color: row.get(prefix_offset + 3),
        text_color: row.get(prefix_offset + 4),
        mode: row.get(prefix_offset + 5),
    }
}

const LINE_COLUMNS: &str = "l.id, COALESCE(l.short_name, l.id::text), COALESCE(l.long_name, l.id::text), COALESCE(l.color, '0088FF'), COALESCE(l.text_color, 'FFFFFF'), COALESCE(l.mode, 'BUS')";

#[async_trait]
impl SpatialStore for PostgisStore {
    async fn nearby_stops(
        &self,
        lat: f64,
        lon: f64,
        radius_m: f64,
        limit: usize,
    ) -> Result<Vec<NearbyStop>> {
        let rows = self
            .client
            .query(
                "SELECT s.id, s.name, s.lat, s.lon,
                        ST_Distance(s.geom, ST_SetSRID(ST_MakePoint($2, $1), 4326)::geography) AS distance
                 FROM stops s
                 WHERE s.active
                 AND ST_DWithin(s.geom, ST_SetSRID(ST_MakePoint($2, $1), 4326)::geography, $3)
                 ORDER BY distance ASC
                 LIMIT $4",
                &[&lat, &lon, &radius_m, &(limit as i64)],
            )
            .await
            .map_err(|e| EngineError::StoreUnavailable(e.to_string()))?;

        Ok(rows
            .iter()
            .map(|row| NearbyStop {
                stop: Stop {
                    id: row.get(0),
                    name: row.get(1),
                    lat: row.get(2),
                    lon: row.get(3),
                },
                distance_m: row.get(4),
            })
            .collect())
    }

    async fn geom_routes_through_both(
        &self,
        from: (f64, f64),
        to: (f64, f64),
        radius_m: f64,
    ) -> Result<Vec<GeometryRoute>> {
        let query = format!(
            "WITH near_from AS (
                SELECT p.id AS pattern_id, p.line_id,
                       ST_Distance(p.geom, ST_SetSRID(ST_MakePoint($2, $1), 4326)::geography) AS dist_from
                FROM patterns p
                JOIN lines l ON l.id = p.line_id
                WHERE l.active AND p.geom IS NOT NULL
                AND ST_DWithin(p.geom, ST_SetSRID(ST_MakePoint($2, $1), 4326)::geography, $5)
            ),
            near_to AS (
                SELECT p.id AS pattern_id,
                       ST_Distance(p.geom, ST_SetSRID(ST_MakePoint($4, $3), 4326)::geography) AS dist_to
                FROM patterns p
                JOIN lines l ON l.id = p.line_id
                WHERE l.active AND p.geom IS NOT NULL
                AND ST_DWithin(p.geom, ST_SetSRID(ST_MakePoint($4, $3), 4326)::geography, $5)
            )
            SELECT nf.pattern_id, {LINE_COLUMNS}, nf.dist_from, nt.dist_to,
                   ST_Length(p.geom) AS route_length
            FROM near_from nf
            JOIN near_to nt ON nf.pattern_id = nt.pattern_id
            JOIN patterns p ON p.id = nf.pattern_id
            JOIN lines l ON l.id = nf.line_id
            ORDER BY (nf.dist_from + nt.dist_to) ASC, route_length ASC
            LIMIT 200"
        );

        let rows = self
            .client
            .query(&query, &[&from.0, &from.1, &to.0, &to.1, &radius_m])
            .await
            .map_err(|e| EngineError::StoreUnavailable(e.to_string()))?;

        Ok(rows
            .iter()
            .map(|row| GeometryRoute {
                pattern_id: row.get(0),
                line: line_from_row(row, 1),
                dist_from_m: row.get(7),
                dist_to_m: row.get(8),
            })
            .collect())
    }

    async fn direct_stop_routes(
        &self,
        origin_stop_ids: &[i64],
        dest_stop_ids: &[i64],
    ) -> Result<Vec<DirectStopRoute>> {
        if origin_stop_ids.is_empty() || dest_stop_ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!(
            "SELECT p.id, {LINE_COLUMNS}, ps1.stop_id, ps2.stop_id, ps1.sequence, ps2.sequence
             FROM patterns p
             JOIN lines l ON l.id = p.line_id
             JOIN pattern_stops ps1 ON ps1.pattern_id = p.id
             JOIN pattern_stops ps2 ON ps2.pattern_id = p.id
             WHERE l.active
             AND ps1.stop_id = ANY($1)
             AND ps2.stop_id = ANY($2)
             AND ps1.sequence < ps2.sequence
             ORDER BY (ps2.sequence - ps1.sequence) ASC
             LIMIT 50"
        );

        let rows = self
            .client
            .query(&query, &[&origin_stop_ids, &dest_stop_ids])
            .await
            .map_err(|e| EngineError::StoreUnavailable(e.to_string()))?;

        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for row in &rows {
            let pattern_id: String = row.get(0);
            if !seen.insert(pattern_id.clone()) {
                continue;
            }
            out.push(DirectStopRoute {
                pattern_id,
                line: line_from_row(row, 1),
                origin_stop_id: row.get(7),
                dest_stop_id: row.get(8),
                seq_start: row.get(9),
                seq_end: row.get(10),
            });
        }
        Ok(out)
    }

    async fn geom_transfer(
        &self,
        from: (f64, f64),
        to: (f64, f64),
        radius_m: f64,
        inter_pattern_m: f64,
    ) -> Result<Vec<GeomTransferPair>> {
        let l1 = LINE_COLUMNS.replace("l.", "l1.");
        let l2 = LINE_COLUMNS.replace("l.", "l2.");
        let query = format!(
            "WITH near_from AS (
                SELECT p.id AS pattern_id, p.line_id, p.geom,
                       ST_Distance(p.geom, ST_SetSRID(ST_MakePoint($2, $1), 4326)::geography) AS dist_from
                FROM patterns p JOIN lines l ON l.id = p.line_id
                WHERE l.active AND p.geom IS NOT NULL
                AND ST_DWithin(p.geom, ST_SetSRID(ST_MakePoint($2, $1), 4326)::geography, $5)
            ),
            near_to AS (
                SELECT p.id AS pattern_id, p.line_id, p.geom,
                       ST_Distance(p.geom, ST_SetSRID(ST_MakePoint($4, $3), 4326)::geography) AS dist_to
                FROM patterns p JOIN lines l ON l.id = p.line_id
                WHERE l.active AND p.geom IS NOT NULL
                AND ST_DWithin(p.geom, ST_SetSRID(ST_MakePoint($4, $3), 4326)::geography, $5)
            )
            SELECT nf.pattern_id, {l1}, nt.pattern_id, {l2},
                   ST_Y(ST_ClosestPoint(nf.geom::geometry, nt.geom::geometry)) AS transfer_lat,
                   ST_X(ST_ClosestPoint(nf.geom::geometry, nt.geom::geometry)) AS transfer_lon,
                   ST_Distance(nf.geom, nt.geom) AS inter_dist,
                   nf.dist_from, nt.dist_to
            FROM near_from nf
            JOIN near_to nt ON nf.line_id != nt.line_id
            JOIN lines l1 ON l1.id = nf.line_id
            JOIN lines l2 ON l2.id = nt.line_id
            WHERE ST_Distance(nf.geom, nt.geom) <= $6
            ORDER BY (nf.dist_from + nt.dist_to + inter_dist) ASC
            LIMIT 100"
        );

        let rows = self
            .client
            .query(
                &query,
                &[&from.0, &from.1, &to.0, &to.1, &radius_m, &inter_pattern_m],
            )
            .await
            .map_err(|e| EngineError::StoreUnavailable(e.to_string()))?;

        Ok(rows
            .iter()
            .map(|row| GeomTransferPair {
                pattern1_id: row.get(0),
                line1: line_from_row(row, 1),
                pattern2_id: row.get(7),
                line2: line_from_row(row, 8),
                transfer_point: (row.get(14), row.get(15)),
            })
            .collect())
    }

    async fn geom_triple_transfer(
        &self,
        from: (f64, f64),
        to: (f64, f64),
        radius_m: f64,
        inter_pattern_m: f64,
    ) -> Result<Vec<GeomTripleTransfer>> {
        let l1 = LINE_COLUMNS.replace("l.", "l1.");
        let l2 = LINE_COLUMNS.replace("l.", "l2.");
        let l3 = LINE_COLUMNS.replace("l.", "l3.");
        let query = format!(
            "WITH near_from AS (
                SELECT p.id AS pattern_id, p.line_id, p.geom
                FROM patterns p JOIN lines l ON l.id = p.line_id
                WHERE l.active AND p.geom IS NOT NULL
                AND ST_DWithin(p.geom, ST_SetSRID(ST_MakePoint($2, $1), 4326)::geography, $5)
            ),
            near_to AS (
                SELECT p.id AS pattern_id, p.line_id, p.geom
                FROM patterns p JOIN lines l ON l.id = p.line_id
                WHERE l.active AND p.geom IS NOT NULL
                AND ST_DWithin(p.geom, ST_SetSRID(ST_MakePoint($4, $3), 4326)::geography, $5)
            ),
            middle AS (
                SELECT p.id AS pattern_id, p.line_id, p.geom
                FROM patterns p JOIN lines l ON l.id = p.line_id
                WHERE l.active AND p.geom IS NOT NULL
            )
            SELECT nf.pattern_id, {l1}, m.pattern_id, {l2}, nt.pattern_id, {l3},
                   ST_Y(ST_ClosestPoint(nf.geom::geometry, m.geom::geometry)) AS t12_lat,
                   ST_X(ST_ClosestPoint(nf.geom::geometry, m.geom::geometry)) AS t12_lon,
                   ST_Y(ST_ClosestPoint(m.geom::geometry, nt.geom::geometry)) AS t23_lat,
                   ST_X(ST_ClosestPoint(m.geom::geometry, nt.geom::geometry)) AS t23_lon
            FROM near_from nf
            JOIN middle m ON m.line_id != nf.line_id
                AND ST_Distance(nf.geom, m.geom) <= $6
            JOIN near_to nt ON nt.line_id != nf.line_id AND nt.line_id != m.line_id
                AND ST_Distance(m.geom, nt.geom) <= $6
            JOIN lines l1 ON l1.id = nf.line_id
            JOIN lines l2 ON l2.id = m.line_id
            JOIN lines l3 ON l3.id = nt.line_id
            LIMIT 50"
        );

        let rows = self
            .client
            .query(
                &query,
                &[&from.0, &from.1, &to.0, &to.1, &radius_m, &inter_pattern_m],
            )
            .await
            .map_err(|e| EngineError::StoreUnavailable(e.to_string()))?;

        Ok(rows
            .iter()
            .map(|row| GeomTripleTransfer {
                pattern1_id: row.get(0),
                line1: line_from_row(row, 1),
                pattern2_id: row.get(7),
                line2: line_from_row(row, 8),
                pattern3_id: row.get(14),
                line3: line_from_row(row, 15),
                transfer_point_12: (row.get(21), row.get(22)),
                transfer_point_23: (row.get(23), row.get(24)),
            })
            .collect())
    }

    async fn pattern_geometry(&self, pattern_id: &str) -> Result<Option<Vec<(f64, f64)>>> {
        let rows = self
            .client
            .query(
                "SELECT ST_Y((dp).geom), ST_X((dp).geom)
                 FROM (
                    SELECT ST_DumpPoints(geom::geometry) AS dp
                    FROM patterns WHERE id = $1
                 ) sub
                 ORDER BY (dp).path[1]",
                &[&pattern_id],
            )
            .await
            .map_err(|e| EngineError::StoreUnavailable(e.to_string()))?;

        if rows.len() < 2 {
            return Ok(None);
        }

        Ok(Some(
            rows.iter().map(|row| (row.get(0), row.get(1))).collect(),
        ))
    }

    async fn stop_by_id(&self, id: i64) -> Result<Option<Stop>> {
        let row = self
            .client
            .query_opt(
                "SELECT id, name, lat, lon FROM stops WHERE id = $1 AND active",
                &[&id],
            )
            .await
            .map_err(|e| EngineError::StoreUnavailable(e.to_string()))?;

        Ok(row.map(|row| Stop {
            id: row.get(0),
            name: row.get(1),
            lat: row.get(2),
            lon: row.get(3),
        }))
    }
}

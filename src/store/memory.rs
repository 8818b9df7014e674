//! In-process spatial store used by tests and by the seed scenarios in the
//! spec's property tests. Stops are indexed in an `rstar::RTree` the same
//! way the teacher's `TransitNetwork` indexes GTFS stops for nearest-point
//! queries; pattern-to-pattern proximity is computed by brute-force
//! vertex-pair distance, which is consistent with the vertex-only
//! projection model the rest of the engine uses (§4.3.1).

use std::collections::HashMap;

use async_trait::async_trait;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::error::Result;
use crate::geodesy::haversine_distance_m;

use super::{
    DirectStopRoute, GeomTransferPair, GeomTripleTransfer, GeometryRoute, LineInfo, NearbyStop,
    SpatialStore, Stop,
};

#[derive(Debug, Clone)]
pub struct LineRecord {
    pub id: i64,
    pub short_name: String,
    pub long_name: String,
    pub color: String,
    pub text_color: String,
    pub mode: String,
    pub active: bool,
}

impl LineRecord {
    fn info(&self) -> LineInfo {
        LineInfo {
            id: self.id,
            short_name: self.short_name.clone(),
            long_name: self.long_name.clone(),
            color: self.color.clone(),
            text_color: self.text_color.clone(),
            mode: self.mode.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PatternRecord {
    pub id: String,
    pub line_id: i64,
    pub polyline: Option<Vec<(f64, f64)>>,
}

struct StopNode {
    stop: Stop,
}

impl RTreeObject for StopNode {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.stop.lon, self.stop.lat])
    }
}

impl PointDistance for StopNode {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.stop.lon - point[0];
        let dy = self.stop.lat - point[1];
        dx * dx + dy * dy
    }
}

/// A `(pattern_id, stop_id, sequence)` edge.
#[derive(Debug, Clone)]
pub struct PatternStopRecord {
    pub pattern_id: String,
    pub stop_id: i64,
    pub sequence: i64,
}

#[derive(Default)]
pub struct InMemoryStore {
    lines: HashMap<i64, LineRecord>,
    patterns: HashMap<String, PatternRecord>,
    pattern_stops: Vec<PatternStopRecord>,
    stops_by_id: HashMap<i64, Stop>,
    stop_tree: RTree<StopNode>,
}

impl InMemoryStore {
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }

    fn active_patterns(&self) -> impl Iterator<Item = &PatternRecord> {
        self.patterns
            .values()
            .filter(move |p| self.lines.get(&p.line_id).map(|l| l.active).unwrap_or(false))
    }

    fn closest_vertex(
        polyline: &[(f64, f64)],
        point: (f64, f64),
    ) -> Option<(f64, usize, (f64, f64))> {
        polyline
            .iter()
            .enumerate()
            .map(|(i, &v)| (haversine_distance_m(point, v), i, v))
            .min_by(|a, b| a.0.partial_cmp(&b.0).unwrap())
    }

    /// Minimum vertex-pair distance between two polylines, plus the vertex
    /// on `a` that realizes it.
    fn closest_pair(a: &[(f64, f64)], b: &[(f64, f64)]) -> (f64, (f64, f64)) {
        let mut best = f64::INFINITY;
        let mut best_point = a[0];
        for &va in a {
            for &vb in b {
                let d = haversine_distance_m(va, vb);
                if d < best {
                    best = d;
                    best_point = va;
                }
            }
        }
        (best, best_point)
    }
}

#[derive(Default)]
pub struct InMemoryStoreBuilder {
    lines: HashMap<i64, LineRecord>,
    patterns: HashMap<String, PatternRecord>,
    pattern_stops: Vec<PatternStopRecord>,
    stops: Vec<Stop>,
}

impl InMemoryStoreBuilder {
    pub fn line(mut self, line: LineRecord) -> Self {
        self.lines.insert(line.id, line);
        self
    }

    pub fn pattern(mut self, pattern: PatternRecord) -> Self {
        self.patterns.insert(pattern.id.clone(), pattern);
        self
    }

    pub fn stop(mut self, stop: Stop) -> Self {
        self.stops.push(stop);
        self
    }

    pub fn pattern_stop(mut self, pattern_id: &str, stop_id: i64, sequence: i64) -> Self {
        self.pattern_stops.push(PatternStopRecord {
            pattern_id: pattern_id.to_string(),
            stop_id,
            sequence,
        });
        self
    }

    pub fn build(self) -> InMemoryStore {
        let mut stop_tree = RTree::new();
        let mut stops_by_id = HashMap::new();
        for stop in self.stops {
            stops_by_id.insert(stop.id, stop.clone());
            stop_tree.insert(StopNode { stop });
        }

        InMemoryStore {
            lines: self.lines,
            patterns: self.patterns,
            pattern_stops: self.pattern_stops,
            stops_by_id,
            stop_tree,
        }
    }
}

#[async_trait]
impl SpatialStore for InMemoryStore {
    async fn nearby_stops(
        &self,
        lat: f64,
        lon: f64,
        radius_m: f64,
        limit: usize,
    ) -> Result<Vec<NearbyStop>> {
        let mut candidates: Vec<NearbyStop> = self
            .stop_tree
            .iter()
            .map(|node| NearbyStop {
                stop: node.stop.clone(),
                distance_m: haversine_distance_m((lat, lon), (node.stop.lat, node.stop.lon)),
            })
            .filter(|n| n.distance_m <= radius_m)
            .collect();
        candidates.sort_by(|a, b| a.distance_m.partial_cmp(&b.distance_m).unwrap());
        candidates.truncate(limit);
        Ok(candidates)
    }

    async fn geom_routes_through_both(
        &self,
        from: (f64, f64),
        to: (f64, f64),
        radius_m: f64,
    ) -> Result<Vec<GeometryRoute>> {
        let mut out = Vec::new();
        for pattern in self.active_patterns() {
            let Some(polyline) = &pattern.polyline else {
                continue;
            };
            let Some((dist_from, ..)) = Self::closest_vertex(polyline, from) else {
                continue;
            };
            let Some((dist_to, ..)) = Self::closest_vertex(polyline, to) else {
                continue;
            };
            if dist_from <= radius_m && dist_to <= radius_m {
                out.push(GeometryRoute {
                    pattern_id: pattern.id.clone(),
                    line: self.lines[&pattern.line_id].info(),
                    dist_from_m: dist_from,
                    dist_to_m: dist_to,
                });
            }
        }
        out.sort_by(|a, b| a.total_dist_m().partial_cmp(&b.total_dist_m()).unwrap());
        out.truncate(200);
        Ok(out)
    }

    async fn direct_stop_routes(
        &self,
        origin_stop_ids: &[i64],
        dest_stop_ids: &[i64],
    ) -> Result<Vec<DirectStopRoute>> {
        let mut by_pattern: HashMap<&str, Vec<&PatternStopRecord>> = HashMap::new();
        for ps in &self.pattern_stops {
            by_pattern.entry(&ps.pattern_id).or_default().push(ps);
        }

        let mut out = Vec::new();
        for pattern in self.active_patterns() {
            let Some(stops) = by_pattern.get(pattern.id.as_str()) else {
                continue;
            };
            let mut best: Option<(i64, i64, i64, i64)> = None;
            for origin in stops.iter().filter(|s| origin_stop_ids.contains(&s.stop_id)) {
                for dest in stops.iter().filter(|s| dest_stop_ids.contains(&s.stop_id)) {
                    if origin.sequence < dest.sequence {
                        let gap = dest.sequence - origin.sequence;
                        if best.map(|(_, _, s, e)| gap < e - s).unwrap_or(true) {
                            best = Some((origin.stop_id, dest.stop_id, origin.sequence, dest.sequence));
                        }
                    }
                }
            }
            if let Some((origin_stop_id, dest_stop_id, seq_start, seq_end)) = best {
                out.push(DirectStopRoute {
                    pattern_id: pattern.id.clone(),
                    line: self.lines[&pattern.line_id].info(),
                    origin_stop_id,
                    dest_stop_id,
                    seq_start,
                    seq_end,
                });
            }
        }
        out.sort_by_key(|r| r.seq_end - r.seq_start);
        out.truncate(50);
        Ok(out)
    }

    async fn geom_transfer(
        &self,
        from: (f64, f64),
        to: (f64, f64),
        radius_m: f64,
        inter_pattern_m: f64,
    ) -> Result<Vec<GeomTransferPair>> {
        let patterns: Vec<&PatternRecord> = self.active_patterns().collect();
        let mut out = Vec::new();
        for p1 in &patterns {
            let Some(poly1) = &p1.polyline else { continue };
            let Some((d_from, ..)) = Self::closest_vertex(poly1, from) else {
                continue;
            };
            if d_from > radius_m {
                continue;
            }
            for p2 in &patterns {
                if p2.line_id == p1.line_id {
                    continue;
                }
                let Some(poly2) = &p2.polyline else { continue };
                let Some((d_to, ..)) = Self::closest_vertex(poly2, to) else {
                    continue;
                };
                if d_to > radius_m {
                    continue;
                }
                let (inter_dist, transfer_point) = Self::closest_pair(poly1, poly2);
                if inter_dist <= inter_pattern_m {
                    out.push(GeomTransferPair {
                        pattern1_id: p1.id.clone(),
                        line1: self.lines[&p1.line_id].info(),
                        pattern2_id: p2.id.clone(),
                        line2: self.lines[&p2.line_id].info(),
                        transfer_point,
                    });
                }
            }
        }
        out.sort_by(|a, b| {
            let cost = |t: &GeomTransferPair| {
                haversine_distance_m(from, t.transfer_point) + haversine_distance_m(to, t.transfer_point)
            };
            cost(a).partial_cmp(&cost(b)).unwrap()
        });
        out.truncate(100);
        Ok(out)
    }

    async fn geom_triple_transfer(
        &self,
        from: (f64, f64),
        to: (f64, f64),
        radius_m: f64,
        inter_pattern_m: f64,
    ) -> Result<Vec<GeomTripleTransfer>> {
        let patterns: Vec<&PatternRecord> = self.active_patterns().collect();
        let mut out = Vec::new();
        for p1 in &patterns {
            let Some(poly1) = &p1.polyline else { continue };
            let Some((d_from, ..)) = Self::closest_vertex(poly1, from) else {
                continue;
            };
            if d_from > radius_m {
                continue;
            }
            for p2 in &patterns {
                if p2.line_id == p1.line_id {
                    continue;
                }
                let Some(poly2) = &p2.polyline else { continue };
                let (d12, t12) = Self::closest_pair(poly1, poly2);
                if d12 > inter_pattern_m {
                    continue;
                }
                for p3 in &patterns {
                    if p3.line_id == p1.line_id || p3.line_id == p2.line_id {
                        continue;
                    }
                    let Some(poly3) = &p3.polyline else { continue };
                    let Some((d_to, ..)) = Self::closest_vertex(poly3, to) else {
                        continue;
                    };
                    if d_to > radius_m {
                        continue;
                    }
                    let (d23, t23) = Self::closest_pair(poly2, poly3);
                    if d23 > inter_pattern_m {
                        continue;
                    }
                    out.push(GeomTripleTransfer {
                        pattern1_id: p1.id.clone(),
                        line1: self.lines[&p1.line_id].info(),
                        pattern2_id: p2.id.clone(),
                        line2: self.lines[&p2.line_id].info(),
                        pattern3_id: p3.id.clone(),
                        line3: self.lines[&p3.line_id].info(),
                        transfer_point_12: t12,
                        transfer_point_23: t23,
                    });
                }
            }
        }
        out.truncate(50);
        Ok(out)
    }

    async fn pattern_geometry(&self, pattern_id: &str) -> Result<Option<Vec<(f64, f64)>>> {
        Ok(self
            .patterns
            .get(pattern_id)
            .and_then(|p| p.polyline.clone())
            .filter(|poly| poly.len() >= 2))
    }

    async fn stop_by_id(&self, id: i64) -> Result<Option<Stop>> {
        Ok(self.stops_by_id.get(&id).cloned())
    }
}

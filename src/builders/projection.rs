//! §4.3.1 — nearest-vertex projection. The builders never synthesize a new
//! coordinate on a segment between vertices; this is the only projection
//! used to pick board/alight points, for bit-exact reproducibility across
//! reimplementations.

use crate::geodesy::haversine_distance_m;

/// Project `point` onto `polyline`, returning the nearest vertex and its
/// index. Ties resolve to the earliest index (guaranteed by `<` rather than
/// `<=` in the scan).
pub fn project(polyline: &[(f64, f64)], point: (f64, f64)) -> ((f64, f64), usize) {
    let mut best_dist = f64::INFINITY;
    let mut best_index = 0;
    for (i, &vertex) in polyline.iter().enumerate() {
        let d = haversine_distance_m(point, vertex);
        if d < best_dist {
            best_dist = d;
            best_index = i;
        }
    }
    (polyline[best_index], best_index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_earliest_index_on_tie() {
        let polyline = vec![(0.0, 0.0), (0.0, 1.0), (0.0, 0.0)];
        let (vertex, index) = project(&polyline, (0.0, 0.0));
        assert_eq!(vertex, (0.0, 0.0));
        assert_eq!(index, 0);
    }

    #[test]
    fn picks_nearest_vertex() {
        let polyline = vec![(0.0, 0.0), (0.0, 0.01), (0.0, 0.02)];
        let (vertex, index) = project(&polyline, (0.0, 0.019));
        assert_eq!(vertex, (0.0, 0.02));
        assert_eq!(index, 2);
    }
}

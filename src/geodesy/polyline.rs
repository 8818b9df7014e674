//! Google polyline-5 encoding, used for every `legGeometry.points` field on
//! the wire. Decoding isn't required by the spec but is kept so the
//! encode/decode round-trip property (§8 property 6) is directly testable.

/// Encode an ordered (lat, lon) sequence at precision 1e5. Empty input
/// yields the empty string.
pub fn encode(points: &[(f64, f64)]) -> String {
    let mut out = String::new();
    let mut prev_lat: i64 = 0;
    let mut prev_lon: i64 = 0;

    for &(lat, lon) in points {
        let lat_e5 = (lat * 1e5).round() as i64;
        let lon_e5 = (lon * 1e5).round() as i64;

        encode_value(lat_e5 - prev_lat, &mut out);
        encode_value(lon_e5 - prev_lon, &mut out);

        prev_lat = lat_e5;
        prev_lon = lon_e5;
    }

    out
}

fn encode_value(value: i64, out: &mut String) {
    let mut v = if value < 0 { !(value << 1) } else { value << 1 };
    while v >= 0x20 {
        out.push((0x20 | (v & 0x1f)) as u8 as char);
        v >>= 5;
    }
    out.push(v as u8 as char);
}

fn shift_byte(byte: u8) -> i64 {
    (byte as i64) - 63
}

/// Decode a precision-5 polyline back into (lat, lon) pairs.
pub fn decode(encoded: &str) -> Vec<(f64, f64)> {
    let bytes = encoded.as_bytes();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lon: i64 = 0;
    let mut out = Vec::new();

    while index < bytes.len() {
        let d_lat = decode_value(bytes, &mut index);
        let d_lon = decode_value(bytes, &mut index);
        lat += d_lat;
        lon += d_lon;
        out.push((lat as f64 / 1e5, lon as f64 / 1e5));
    }

    out
}

fn decode_value(bytes: &[u8], index: &mut usize) -> i64 {
    let mut result: i64 = 0;
    let mut shift = 0;
    loop {
        let b = shift_byte(bytes[*index]);
        *index += 1;
        result |= (b & 0x1f) << shift;
        shift += 5;
        if b < 0x20 {
            break;
        }
    }
    if result & 1 != 0 {
        !(result >> 1)
    } else {
        result >> 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_empty_string() {
        assert_eq!(encode(&[]), "");
    }

    #[test]
    fn known_vector() {
        // From Google's published polyline algorithm example.
        let points = [(38.5, -120.2), (40.7, -120.95), (43.252, -126.453)];
        assert_eq!(encode(&points), "_p~iF~ps|U_ulLnnqC_mqNvxq`@");
    }

    #[test]
    fn round_trips() {
        let points = vec![
            (-17.7833, -63.1821),
            (-17.7800, -63.1800),
            (-17.7700, -63.1700),
            (-17.7512, -63.1755),
        ];
        let encoded = encode(&points);
        let decoded = decode(&encoded);
        assert_eq!(decoded.len(), points.len());
        for (a, b) in points.iter().zip(decoded.iter()) {
            assert!((a.0 - b.0).abs() < 1e-5);
            assert!((a.1 - b.1).abs() < 1e-5);
        }
    }
}

//! Encoded polyline decoding
//!
//! The primary directions provider compresses route geometry as a polyline
//! string: 5-bit chunked, signed-delta encoded, 1e5 coordinate precision.
//! Format reference:
//! https://developers.google.com/maps/documentation/utilities/polylinealgorithm

use anyhow::Result;

use crate::types::Coordinates;

/// Decode an encoded polyline into coordinates.
///
/// `precision` is the number of decimal places the deltas were scaled to
/// (5 for the primary provider's encoding).
pub fn decode_polyline(encoded: &str, precision: u32) -> Result<Vec<Coordinates>> {
    let factor = 10_f64.powi(precision as i32);
    let mut coordinates = Vec::new();
    let mut lat = 0i64;
    let mut lng = 0i64;

    let bytes = encoded.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        lat += decode_value(bytes, &mut i)?;
        lng += decode_value(bytes, &mut i)?;

        coordinates.push(Coordinates {
            lat: lat as f64 / factor,
            lng: lng as f64 / factor,
        });
    }

    Ok(coordinates)
}

/// Decode one signed varint value, advancing `i` past its chunks
fn decode_value(bytes: &[u8], i: &mut usize) -> Result<i64> {
    let mut shift = 0;
    let mut result = 0i64;

    loop {
        if *i >= bytes.len() {
            anyhow::bail!("Invalid polyline encoding: truncated chunk");
        }
        let byte = bytes[*i] as i64 - 63;
        *i += 1;
        result |= (byte & 0x1f) << shift;
        shift += 5;
        if byte < 0x20 {
            break;
        }
    }

    // Low bit is the sign
    Ok(if result & 1 != 0 {
        !(result >> 1)
    } else {
        result >> 1
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_reference_polyline() {
        // Worked example from the format reference
        let coords = decode_polyline("_p~iF~ps|U_ulLnnqC_mqNvxq`@", 5).unwrap();

        assert_eq!(coords.len(), 3);
        assert!((coords[0].lat - 38.5).abs() < 1e-5);
        assert!((coords[0].lng - -120.2).abs() < 1e-5);
        assert!((coords[1].lat - 40.7).abs() < 1e-5);
        assert!((coords[1].lng - -120.95).abs() < 1e-5);
        assert!((coords[2].lat - 43.252).abs() < 1e-5);
        assert!((coords[2].lng - -126.453).abs() < 1e-5);
    }

    #[test]
    fn test_decode_single_point() {
        // Delta encoding of (38.5, -120.2) alone
        let coords = decode_polyline("_p~iF~ps|U", 5).unwrap();
        assert_eq!(coords.len(), 1);
        assert!((coords[0].lat - 38.5).abs() < 1e-5);
    }

    #[test]
    fn test_decode_empty_string() {
        let coords = decode_polyline("", 5).unwrap();
        assert!(coords.is_empty());
    }

    #[test]
    fn test_decode_truncated_input_errors() {
        // A continuation chunk with nothing after it
        assert!(decode_polyline("_", 5).is_err());
    }
}

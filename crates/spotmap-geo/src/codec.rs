//! Point codec for stored locations.
//!
//! Reads a point from any of the shapes the store hands back and writes the
//! textual literal the store expects:
//!
//! - EWKB: `0x01` byte-order marker, little-endian geometry type word (with the
//!   `0x20000000` SRID flag), optional little-endian SRID, then two
//!   little-endian `f64` values, longitude first.
//! - EWKT: `SRID=4326;POINT(<lon> <lat>)`.
//! - Structured: `{"type": "Point", "coordinates": [<lon>, <lat>]}`.
//!
//! Decoding never range-checks; see [`crate::validation`] for the write path.

use spotmap_core::error::DecodeError;
use spotmap_core::models::{GeoPoint, WireLocation, WGS84_SRID};
use std::str::FromStr;

/// EWKB flag marking an embedded SRID in the geometry type word
pub const EWKB_SRID_FLAG: u32 = 0x2000_0000;

const LITTLE_ENDIAN: u8 = 0x01;
const WKB_POINT: u32 = 1;
const WKB_HEADER_LEN: usize = 5;
const SRID_LEN: usize = 4;
const COORDINATES_LEN: usize = 16;

/// Length of an EWKB point carrying an SRID
pub const EWKB_POINT_LEN: usize = WKB_HEADER_LEN + SRID_LEN + COORDINATES_LEN;

/// A raw point value, tagged by wire shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawPoint<'a> {
    /// EWKB (or plain WKB) bytes
    Binary(&'a [u8]),
    /// Hex-encoded EWKB, as rendered by PostgREST and `to_jsonb`
    Hex(&'a str),
    /// EWKT or WKT literal
    Text(&'a str),
    /// GeoJSON-style `{type, coordinates}` object
    Structured(&'a serde_json::Value),
}

impl<'a> RawPoint<'a> {
    /// Pick the wire shape of a JSON column value; `None` when absent
    pub fn classify(value: &'a serde_json::Value) -> Option<RawPoint<'a>> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else if is_hex(trimmed) {
                    Some(RawPoint::Hex(trimmed))
                } else {
                    Some(RawPoint::Text(trimmed))
                }
            }
            other => Some(RawPoint::Structured(other)),
        }
    }
}

fn is_hex(s: &str) -> bool {
    s.len() % 2 == 0 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Encoder/decoder bound to the spatial reference points are written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointCodec {
    srid: u32,
}

impl Default for PointCodec {
    fn default() -> Self {
        Self::new(WGS84_SRID)
    }
}

impl PointCodec {
    pub fn new(srid: u32) -> Self {
        Self { srid }
    }

    pub fn srid(&self) -> u32 {
        self.srid
    }

    /// Decode a raw point of any shape
    pub fn decode(&self, raw: RawPoint<'_>) -> Result<GeoPoint, DecodeError> {
        match raw {
            RawPoint::Binary(bytes) => self.decode_ewkb(bytes),
            RawPoint::Hex(hex_str) => {
                let bytes =
                    hex::decode(hex_str).map_err(|e| DecodeError::InvalidHex(e.to_string()))?;
                self.decode_ewkb(&bytes)
            }
            RawPoint::Text(literal) => decode_ewkt(literal),
            RawPoint::Structured(value) => decode_structured(value),
        }
    }

    /// Decode a JSON column value; `Absent` for null or empty values
    pub fn decode_value(&self, value: &serde_json::Value) -> Result<GeoPoint, DecodeError> {
        let raw = RawPoint::classify(value).ok_or(DecodeError::Absent)?;
        self.decode(raw)
    }

    /// Point of a row, or `None` when it has no usable location.
    ///
    /// Malformed values are logged and reported as absent.
    pub fn point_of(&self, row: &WireLocation) -> Option<GeoPoint> {
        let value = row.location.as_ref()?;
        match self.decode_value(value) {
            Ok(point) => Some(point),
            Err(DecodeError::Absent) => None,
            Err(e) => {
                tracing::debug!(
                    id = ?row.id,
                    error = %e,
                    "Location value could not be decoded"
                );
                None
            }
        }
    }

    fn decode_ewkb(&self, bytes: &[u8]) -> Result<GeoPoint, DecodeError> {
        let (point, srid) = decode_ewkb(bytes)?;
        if let Some(srid) = srid {
            if srid != self.srid {
                tracing::warn!(
                    point_srid = srid,
                    expected_srid = self.srid,
                    "Decoded point uses an unexpected spatial reference"
                );
            }
        }
        Ok(point)
    }

    /// Textual point literal for writes: `SRID=<srid>;POINT(<lon> <lat>)`
    pub fn encode(&self, point: &GeoPoint) -> String {
        format!("SRID={};POINT({} {})", self.srid, point.longitude, point.latitude)
    }

    /// EWKB bytes with the SRID embedded
    pub fn encode_ewkb(&self, point: &GeoPoint) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(EWKB_POINT_LEN);
        bytes.push(LITTLE_ENDIAN);
        bytes.extend_from_slice(&(WKB_POINT | EWKB_SRID_FLAG).to_le_bytes());
        bytes.extend_from_slice(&self.srid.to_le_bytes());
        bytes.extend_from_slice(&point.longitude.to_le_bytes());
        bytes.extend_from_slice(&point.latitude.to_le_bytes());
        bytes
    }

    /// Upper-case hex EWKB, the shape PostGIS renders geography columns in
    pub fn encode_hex(&self, point: &GeoPoint) -> String {
        hex::encode_upper(self.encode_ewkb(point))
    }
}

/// Decode EWKB or plain WKB point bytes, returning the embedded SRID if any
pub fn decode_ewkb(bytes: &[u8]) -> Result<(GeoPoint, Option<u32>), DecodeError> {
    if bytes.len() < WKB_HEADER_LEN {
        return Err(DecodeError::Truncated { len: bytes.len(), needed: EWKB_POINT_LEN });
    }

    if bytes[0] != LITTLE_ENDIAN {
        return Err(DecodeError::UnsupportedByteOrder(bytes[0]));
    }

    let type_word = read_u32(bytes, 1);
    // Strip the Z/M/SRID flag bits, then the ISO dimension offset (1001, 2001, ...)
    if (type_word & 0x0FFF_FFFF) % 1000 != WKB_POINT {
        return Err(DecodeError::NotAPoint(type_word));
    }

    let has_srid = type_word & EWKB_SRID_FLAG != 0;
    let prefix_len = if has_srid { WKB_HEADER_LEN + SRID_LEN } else { WKB_HEADER_LEN };
    let needed = prefix_len + COORDINATES_LEN;
    if bytes.len() < needed {
        return Err(DecodeError::Truncated { len: bytes.len(), needed });
    }

    let srid = has_srid.then(|| read_u32(bytes, WKB_HEADER_LEN));
    let longitude = read_f64(bytes, prefix_len);
    let latitude = read_f64(bytes, prefix_len + 8);

    Ok((GeoPoint { latitude, longitude }, srid))
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(word)
}

fn read_f64(bytes: &[u8], at: usize) -> f64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&bytes[at..at + 8]);
    f64::from_le_bytes(word)
}

/// Decode `SRID=n;POINT(x y)` or a bare `POINT(x y)` literal
pub fn decode_ewkt(literal: &str) -> Result<GeoPoint, DecodeError> {
    let body = strip_srid_prefix(literal.trim())?;

    let parsed = wkt::Wkt::<f64>::from_str(body)
        .map_err(|e| DecodeError::MalformedText(format!("{:?}", e)))?;
    let point: geo::Point<f64> = parsed
        .try_into()
        .map_err(|e: wkt::conversion::Error| DecodeError::MalformedText(format!("{:?}", e)))?;

    Ok(GeoPoint { latitude: point.y(), longitude: point.x() })
}

fn strip_srid_prefix(literal: &str) -> Result<&str, DecodeError> {
    let Some((head, body)) = literal.split_once(';') else {
        return Ok(literal);
    };

    let head = head.trim();
    let code = head
        .get(..5)
        .filter(|tag| tag.eq_ignore_ascii_case("SRID="))
        .and_then(|_| head.get(5..));

    match code {
        Some(code) if code.parse::<u32>().is_ok() => Ok(body.trim()),
        _ => Err(DecodeError::MalformedText(format!("invalid SRID prefix '{}'", head))),
    }
}

/// Decode a `{"type": "Point", "coordinates": [lon, lat]}` object
pub fn decode_structured(value: &serde_json::Value) -> Result<GeoPoint, DecodeError> {
    let geometry = geojson::Geometry::from_json_value(value.clone())
        .map_err(|e| DecodeError::MalformedStructured(e.to_string()))?;

    match geometry.value {
        geojson::Value::Point(position) if position.len() >= 2 => {
            Ok(GeoPoint { latitude: position[1], longitude: position[0] })
        }
        geojson::Value::Point(position) => Err(DecodeError::MalformedStructured(format!(
            "expected [longitude, latitude], got {} coordinate(s)",
            position.len()
        ))),
        other => Err(DecodeError::MalformedStructured(format!(
            "expected a Point geometry, got {}",
            geometry_name(&other)
        ))),
    }
}

fn geometry_name(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BUDAPEST_HEX: &str = "0101000020E6100000984C158C4A0A3340D656EC2FBBBF4740";

    #[test]
    fn test_encode_puts_longitude_first() {
        let codec = PointCodec::default();
        let literal = codec.encode(&GeoPoint::new(47.4979, 19.0402));
        assert_eq!(literal, "SRID=4326;POINT(19.0402 47.4979)");
    }

    #[test]
    fn test_decode_postgis_hex() {
        let codec = PointCodec::default();
        let point = codec.decode(RawPoint::Hex(BUDAPEST_HEX)).unwrap();
        assert_eq!(point, GeoPoint::new(47.4979, 19.0402));
    }

    #[test]
    fn test_encode_hex_matches_postgis_rendering() {
        let codec = PointCodec::default();
        assert_eq!(codec.encode_hex(&GeoPoint::new(47.4979, 19.0402)), BUDAPEST_HEX);
    }

    #[test]
    fn test_decode_structured_point() {
        let codec = PointCodec::default();
        let value = json!({ "type": "Point", "coordinates": [19.0402, 47.4979] });
        let point = codec.decode_value(&value).unwrap();
        assert_eq!(point.latitude, 47.4979);
        assert_eq!(point.longitude, 19.0402);
    }

    #[test]
    fn test_decode_structured_rejects_other_geometries() {
        let value = json!({ "type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]] });
        assert!(matches!(decode_structured(&value), Err(DecodeError::MalformedStructured(_))));

        let value = json!({ "type": "Point", "coordinates": "19.04 47.49" });
        assert!(decode_structured(&value).is_err());
    }

    #[test]
    fn test_truncated_binary() {
        let codec = PointCodec::default();
        let bytes = codec.encode_ewkb(&GeoPoint::new(1.0, 2.0));

        assert_eq!(
            codec.decode(RawPoint::Binary(&bytes[..EWKB_POINT_LEN - 1])),
            Err(DecodeError::Truncated { len: EWKB_POINT_LEN - 1, needed: EWKB_POINT_LEN })
        );
        assert_eq!(
            codec.decode(RawPoint::Binary(&[])),
            Err(DecodeError::Truncated { len: 0, needed: EWKB_POINT_LEN })
        );
    }

    #[test]
    fn test_plain_wkb_without_srid() {
        let mut bytes = vec![LITTLE_ENDIAN];
        bytes.extend_from_slice(&WKB_POINT.to_le_bytes());
        bytes.extend_from_slice(&(-73.9857f64).to_le_bytes());
        bytes.extend_from_slice(&40.7484f64.to_le_bytes());

        let (point, srid) = decode_ewkb(&bytes).unwrap();
        assert_eq!(point, GeoPoint::new(40.7484, -73.9857));
        assert_eq!(srid, None);
    }

    #[test]
    fn test_rejects_non_point_and_big_endian() {
        let codec = PointCodec::default();
        let mut bytes = codec.encode_ewkb(&GeoPoint::new(1.0, 2.0));

        bytes[1] = 3; // polygon
        assert!(matches!(decode_ewkb(&bytes), Err(DecodeError::NotAPoint(_))));

        bytes[0] = 0x00;
        assert_eq!(decode_ewkb(&bytes), Err(DecodeError::UnsupportedByteOrder(0x00)));
    }

    #[test]
    fn test_decode_text_literals() {
        let point = decode_ewkt("SRID=4326;POINT(-122.4194 37.7749)").unwrap();
        assert_eq!(point, GeoPoint::new(37.7749, -122.4194));

        let point = decode_ewkt("POINT(2.3522 48.8566)").unwrap();
        assert_eq!(point, GeoPoint::new(48.8566, 2.3522));

        assert!(decode_ewkt("SRID=abc;POINT(1 2)").is_err());
        assert!(decode_ewkt("LINESTRING(0 0, 1 1)").is_err());
        assert!(decode_ewkt("not a point").is_err());
    }

    #[test]
    fn test_classify_values() {
        assert_eq!(RawPoint::classify(&json!(null)), None);
        assert_eq!(RawPoint::classify(&json!("  ")), None);
        assert_eq!(RawPoint::classify(&json!("0101")), Some(RawPoint::Hex("0101")));
        assert_eq!(
            RawPoint::classify(&json!("POINT(1 2)")),
            Some(RawPoint::Text("POINT(1 2)"))
        );
        assert!(matches!(RawPoint::classify(&json!({})), Some(RawPoint::Structured(_))));
    }

    #[test]
    fn test_point_of_treats_garbage_as_absent() {
        let codec = PointCodec::default();
        let row = WireLocation::new(1, "Broken").with_location(json!("ZZZZ"));
        assert_eq!(codec.point_of(&row), None);

        let row = WireLocation::new(2, "Odd hex").with_location(json!("0101"));
        assert_eq!(codec.point_of(&row), None);

        let row = WireLocation::new(3, "Nowhere");
        assert_eq!(codec.point_of(&row), None);

        let row = WireLocation::new(4, "Budapest").with_location(json!(BUDAPEST_HEX));
        assert_eq!(codec.point_of(&row), Some(GeoPoint::new(47.4979, 19.0402)));
    }
}

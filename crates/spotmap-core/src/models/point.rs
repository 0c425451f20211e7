use serde::{Deserialize, Serialize};

/// WGS 84 (EPSG:4326), the spatial reference of every stored point
pub const WGS84_SRID: u32 = 4326;

/// A geographic point in signed degrees.
///
/// Decoding never range-checks; a point becomes write-eligible only after
/// it passes validation in `spotmap-geo`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Bit-level equality of both coordinates
    pub fn bit_eq(&self, other: &GeoPoint) -> bool {
        self.latitude.to_bits() == other.latitude.to_bits()
            && self.longitude.to_bits() == other.longitude.to_bits()
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

use spotmap_core::error::{Result, SpotmapError};
use spotmap_core::models::GeoPoint;

pub const LATITUDE_RANGE: std::ops::RangeInclusive<f64> = -90.0..=90.0;
pub const LONGITUDE_RANGE: std::ops::RangeInclusive<f64> = -180.0..=180.0;

/// Validation result with details
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

/// Validation error with the offending field
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: &'static str,
    pub value: f64,
    pub reason: String,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        Self { is_valid: true, errors: Vec::new() }
    }

    /// Add an error to the result
    pub fn add_error(&mut self, field: &'static str, value: f64, reason: String) {
        self.is_valid = false;
        self.errors.push(ValidationError { field, value, reason });
    }
}

/// Check that both coordinates are finite and in range
pub fn validate_point(point: &GeoPoint) -> ValidationResult {
    let mut result = ValidationResult::valid();
    check_coordinate(&mut result, "latitude", point.latitude, &LATITUDE_RANGE);
    check_coordinate(&mut result, "longitude", point.longitude, &LONGITUDE_RANGE);
    result
}

fn check_coordinate(
    result: &mut ValidationResult,
    field: &'static str,
    value: f64,
    range: &std::ops::RangeInclusive<f64>,
) {
    if !value.is_finite() {
        result.add_error(field, value, "Coordinates must be finite".to_string());
    } else if !range.contains(&value) {
        result.add_error(
            field,
            value,
            format!("must be between {} and {}", range.start(), range.end()),
        );
    }
}

/// Reject a point before it is written to the store
pub fn ensure_valid(point: &GeoPoint) -> Result<()> {
    let validation = validate_point(point);
    match validation.errors.into_iter().next() {
        None => Ok(()),
        Some(error) => Err(SpotmapError::Validation {
            field: error.field.to_string(),
            value: error.value.to_string(),
            reason: error.reason,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_points() {
        assert!(validate_point(&GeoPoint::new(47.4979, 19.0402)).is_valid);
        assert!(validate_point(&GeoPoint::new(-90.0, 180.0)).is_valid);
        assert!(validate_point(&GeoPoint::new(90.0, -180.0)).is_valid);
        assert!(ensure_valid(&GeoPoint::new(0.0, 0.0)).is_ok());
    }

    #[test]
    fn test_out_of_range() {
        let result = validate_point(&GeoPoint::new(91.0, -181.0));
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.errors[0].field, "latitude");
        assert_eq!(result.errors[1].field, "longitude");
    }

    #[test]
    fn test_non_finite() {
        let result = validate_point(&GeoPoint::new(f64::NAN, 10.0));
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].reason, "Coordinates must be finite");

        let err = ensure_valid(&GeoPoint::new(10.0, f64::INFINITY)).unwrap_err();
        assert!(matches!(err, SpotmapError::Validation { ref field, .. } if field == "longitude"));
    }
}

//! Spotmap Geo - Point codec and coordinate validation
//!
//! This crate converts stored point values (EWKB, EWKT, and structured
//! `{type, coordinates}` objects) to signed-degree coordinates and back, and
//! checks coordinates before they are written.

pub mod codec;
pub mod validation;

pub use codec::{PointCodec, RawPoint};
pub use validation::{ensure_valid, validate_point, ValidationResult};

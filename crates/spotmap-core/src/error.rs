//! Error types for spotmap

use std::path::PathBuf;
use thiserror::Error;

use crate::models::EntityKind;

/// A raw point value could not be turned into coordinates.
///
/// Always recoverable: callers render "location unavailable" instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("point payload truncated: {len} bytes, need at least {needed}")]
    Truncated { len: usize, needed: usize },

    #[error("unsupported byte order marker 0x{0:02x}")]
    UnsupportedByteOrder(u8),

    #[error("geometry type {0} is not a point")]
    NotAPoint(u32),

    #[error("invalid hex payload: {0}")]
    InvalidHex(String),

    #[error("malformed point literal: {0}")]
    MalformedText(String),

    #[error("malformed structured point: {0}")]
    MalformedStructured(String),

    #[error("no point value present")]
    Absent,
}

#[derive(Debug, Error)]
pub enum SpotmapError {
    // Write-path validation
    #[error("Invalid {field}: {value} ({reason})")]
    Validation {
        field: String,
        value: String,
        reason: String,
    },

    // Remote store errors
    #[error("Fetch failed for {kind}: {reason}")]
    Fetch { kind: EntityKind, reason: String },

    #[error("Store error: {0}")]
    Store(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: String },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    #[error("Config file not found at {path}")]
    ConfigFileNotFound { path: PathBuf },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SpotmapError {
    /// Wrap a store failure as a fetch error for the given kind
    pub fn fetch(kind: EntityKind, err: impl std::fmt::Display) -> Self {
        SpotmapError::Fetch { kind, reason: err.to_string() }
    }
}

impl From<serde_json::Error> for SpotmapError {
    fn from(err: serde_json::Error) -> Self {
        SpotmapError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SpotmapError>;

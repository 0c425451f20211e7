//! Spotmap Core - Domain models, error taxonomy, and configuration
//!
//! This crate contains the types shared by the point codec, the storage
//! adapters, and the listing layer of the spotmap admin console.

pub mod config;
pub mod error;
pub mod models;

pub use error::{DecodeError, Result, SpotmapError};

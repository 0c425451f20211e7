//! Spotmap Store - Storage ports and adapters
//!
//! This crate defines the ports the listing layer talks to (the location
//! store of record and the image bucket) and provides in-memory, PostgreSQL,
//! and HTTP adapters for them.

pub mod images;
pub mod memory;
pub mod ports;
pub mod postgres;

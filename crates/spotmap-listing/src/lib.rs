//! Spotmap Listing - Consistent paginated listings over the store of record
//!
//! This crate turns listing params into remote queries, applies fetched
//! pages last-issued-wins, removes duplicate rows, and runs the mutations
//! that keep the displayed rows in step with the store.

pub mod coordinator;
pub mod debounce;
pub mod query;
pub mod reconcile;
pub mod state;

pub use coordinator::{Begin, FetchCoordinator, FetchOutcome, FetchPhase, Ticket};
pub use debounce::Debouncer;
pub use query::build;
pub use reconcile::{ReconcileConfig, ReconcileReport, ReconciliationFilter};
pub use state::{ListingIntent, ListingState};

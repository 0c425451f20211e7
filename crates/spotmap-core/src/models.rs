pub mod listing;
pub mod location;
pub mod point;
pub mod query;

pub use listing::{FingerprintField, ListingSnapshot, Page};
pub use location::{EntityKind, FieldValue, KindDetails, LocationId, WireLocation};
pub use point::{GeoPoint, WGS84_SRID};
pub use query::{
    OrderClause, QueryParams, RemoteQuery, RowRange, SortDirection, SortKey, TextMatch,
};

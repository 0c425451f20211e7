use async_trait::async_trait;
use spotmap_core::error::Result;
use spotmap_core::models::{EntityKind, LocationId, Page, RemoteQuery, WireLocation};

/// Port for the store of record holding the three location collections
#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Fetch one page of rows plus the total size of the filtered collection
    async fn fetch_page(&self, query: &RemoteQuery) -> Result<Page>;

    /// Flip the availability flag of a row
    async fn set_availability(
        &self,
        kind: EntityKind,
        id: &LocationId,
        available: bool,
    ) -> Result<()>;

    /// Overwrite the point of a row with an encoded `SRID=n;POINT(lon lat)` literal
    async fn update_point(&self, kind: EntityKind, id: &LocationId, literal: &str) -> Result<()>;

    /// Delete a row, returning it if it existed
    async fn delete_location(
        &self,
        kind: EntityKind,
        id: &LocationId,
    ) -> Result<Option<WireLocation>>;
}

/// Port for the object-storage bucket holding location images
#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Remove objects by their in-bucket paths
    async fn remove(&self, paths: &[String]) -> Result<()>;
}

//! In-memory storage implementations for development and testing.
//!
//! These implementations use `RwLock::unwrap()` intentionally. Lock poisoning
//! only occurs when another thread panicked while holding the lock, which is
//! an unrecoverable state. For production workloads, use the PostgreSQL backend.

use async_trait::async_trait;
use chrono::Utc;
use spotmap_core::error::{Result, SpotmapError};
use spotmap_core::models::{
    EntityKind, FieldValue, LocationId, OrderClause, Page, RemoteQuery, SortDirection,
    WireLocation,
};
use spotmap_geo::codec::decode_ewkt;
use spotmap_geo::PointCodec;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use crate::ports::{ImageStorage, LocationStore};

/// In-memory implementation of LocationStore
#[derive(Debug, Clone, Default)]
pub struct MemoryLocationStore {
    rows: Arc<RwLock<HashMap<EntityKind, Vec<WireLocation>>>>,
    codec: PointCodec,
}

impl MemoryLocationStore {
    /// Create a new, empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with rows per kind
    pub fn with_rows(rows: HashMap<EntityKind, Vec<WireLocation>>) -> Self {
        Self { rows: Arc::new(RwLock::new(rows)), codec: PointCodec::default() }
    }

    /// Load rows from a JSON file keyed by kind:
    /// `{"parking": [...], "service": [...], "repair_station": [...]}`
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let rows: HashMap<EntityKind, Vec<WireLocation>> = serde_json::from_str(&content)?;
        let total: usize = rows.values().map(Vec::len).sum();
        tracing::debug!(rows = total, path = %path.as_ref().display(), "Loaded seed rows");
        Ok(Self::with_rows(rows))
    }

    /// Append a row to a kind's collection
    pub fn insert(&self, kind: EntityKind, row: WireLocation) {
        self.rows.write().unwrap().entry(kind).or_default().push(row);
    }

    /// Current copy of a row, bypassing paging
    pub fn get(&self, kind: EntityKind, id: &LocationId) -> Option<WireLocation> {
        let rows = self.rows.read().unwrap();
        rows.get(&kind)?.iter().find(|row| row.id.as_ref() == Some(id)).cloned()
    }

    fn with_row<T>(
        &self,
        kind: EntityKind,
        id: &LocationId,
        update: impl FnOnce(&mut WireLocation) -> T,
    ) -> Result<T> {
        let mut rows = self.rows.write().unwrap();
        let row = rows
            .get_mut(&kind)
            .and_then(|rows| rows.iter_mut().find(|row| row.id.as_ref() == Some(id)))
            .ok_or_else(|| SpotmapError::NotFound { kind, id: id.to_string() })?;
        let result = update(row);
        row.updated_at = Some(Utc::now());
        Ok(result)
    }
}

#[async_trait]
impl LocationStore for MemoryLocationStore {
    async fn fetch_page(&self, query: &RemoteQuery) -> Result<Page> {
        let rows = self.rows.read().unwrap();
        let collection = rows.get(&query.kind).map(Vec::as_slice).unwrap_or_default();
        Ok(apply_query(collection, query))
    }

    async fn set_availability(
        &self,
        kind: EntityKind,
        id: &LocationId,
        available: bool,
    ) -> Result<()> {
        self.with_row(kind, id, |row| row.available = available)
    }

    async fn update_point(&self, kind: EntityKind, id: &LocationId, literal: &str) -> Result<()> {
        // Stored the way PostGIS renders a geography column: hex EWKB
        let point = decode_ewkt(literal).map_err(|e| SpotmapError::Validation {
            field: "location".to_string(),
            value: literal.to_string(),
            reason: e.to_string(),
        })?;
        let encoded = self.codec.encode_hex(&point);
        self.with_row(kind, id, |row| row.location = Some(serde_json::Value::String(encoded)))
    }

    async fn delete_location(
        &self,
        kind: EntityKind,
        id: &LocationId,
    ) -> Result<Option<WireLocation>> {
        let mut rows = self.rows.write().unwrap();
        let Some(collection) = rows.get_mut(&kind) else {
            return Ok(None);
        };
        let position = collection.iter().position(|row| row.id.as_ref() == Some(id));
        Ok(position.map(|index| collection.remove(index)))
    }
}

/// Evaluate a remote query against an in-memory collection.
///
/// Mirrors the SQL the PostgreSQL adapter renders: case-insensitive substring
/// match over the listed columns, ordering with missing values last, then the
/// inclusive row range.
pub fn apply_query(rows: &[WireLocation], query: &RemoteQuery) -> Page {
    let mut matching: Vec<&WireLocation> = rows
        .iter()
        .filter(|row| match &query.text_match {
            None => true,
            Some(text_match) => {
                let needle = text_match.needle.to_lowercase();
                text_match.columns.iter().any(|column| {
                    row.text_field(column)
                        .map(|value| value.to_lowercase().contains(&needle))
                        .unwrap_or(false)
                })
            }
        })
        .collect();

    matching.sort_by(|a, b| compare_rows(a, b, &query.order));

    let total_count = matching.len() as u64;
    let rows = matching
        .into_iter()
        .skip(query.range.offset() as usize)
        .take(query.range.limit() as usize)
        .cloned()
        .collect();

    Page { rows, total_count }
}

fn compare_rows(a: &WireLocation, b: &WireLocation, order: &[OrderClause]) -> Ordering {
    for clause in order {
        let ordering = match (a.field(clause.column), b.field(clause.column)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => {
                let ordering = compare_values(&x, &y);
                match clause.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            }
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn compare_values(a: &FieldValue, b: &FieldValue) -> Ordering {
    match (a, b) {
        (FieldValue::Id(x), FieldValue::Id(y)) => x.cmp(y),
        (FieldValue::Text(x), FieldValue::Text(y)) => x.cmp(y),
        (FieldValue::Number(x), FieldValue::Number(y)) => x.total_cmp(y),
        (FieldValue::Bool(x), FieldValue::Bool(y)) => x.cmp(y),
        (FieldValue::Time(x), FieldValue::Time(y)) => x.cmp(y),
        _ => value_rank(a).cmp(&value_rank(b)),
    }
}

fn value_rank(value: &FieldValue) -> u8 {
    match value {
        FieldValue::Bool(_) => 0,
        FieldValue::Number(_) => 1,
        FieldValue::Time(_) => 2,
        FieldValue::Text(_) => 3,
        FieldValue::Id(_) => 4,
    }
}

/// In-memory implementation of ImageStorage that records removals
#[derive(Debug, Clone, Default)]
pub struct MemoryImageStorage {
    removed: Arc<RwLock<Vec<String>>>,
}

impl MemoryImageStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every path removed so far, in submission order
    pub fn removed(&self) -> Vec<String> {
        self.removed.read().unwrap().clone()
    }
}

#[async_trait]
impl ImageStorage for MemoryImageStorage {
    async fn remove(&self, paths: &[String]) -> Result<()> {
        self.removed.write().unwrap().extend_from_slice(paths);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use spotmap_core::models::{RowRange, TextMatch};

    fn query(order: Vec<OrderClause>, range: RowRange) -> RemoteQuery {
        RemoteQuery {
            kind: EntityKind::Parking,
            collection: EntityKind::Parking.collection(),
            text_match: None,
            order,
            range,
        }
    }

    fn by(column: &'static str, direction: SortDirection) -> OrderClause {
        OrderClause { column, direction }
    }

    fn sample_rows() -> Vec<WireLocation> {
        vec![
            WireLocation::new(3, "Central").with_city("Budapest"),
            WireLocation::new(1, "Riverside").with_city("Szeged"),
            WireLocation::new(2, "Airport"),
            WireLocation::new(4, "central annex").with_city("Budapest"),
        ]
    }

    fn ids(page: &Page) -> Vec<String> {
        page.rows.iter().filter_map(|row| row.id.as_ref().map(ToString::to_string)).collect()
    }

    #[test]
    fn test_order_with_tiebreak_and_nulls_last() {
        let rows = sample_rows();
        let page = apply_query(
            &rows,
            &query(
                vec![by("city", SortDirection::Ascending), by("id", SortDirection::Ascending)],
                RowRange { from: 0, to: 9 },
            ),
        );
        assert_eq!(ids(&page), vec!["3", "4", "1", "2"]);
        assert_eq!(page.total_count, 4);

        let page = apply_query(
            &rows,
            &query(
                vec![by("city", SortDirection::Descending), by("id", SortDirection::Ascending)],
                RowRange { from: 0, to: 9 },
            ),
        );
        assert_eq!(ids(&page), vec!["1", "3", "4", "2"]);
    }

    #[test]
    fn test_text_match_is_case_insensitive() {
        let rows = sample_rows();
        let mut q = query(vec![by("id", SortDirection::Ascending)], RowRange { from: 0, to: 9 });
        q.text_match = Some(TextMatch { needle: "CENTRAL".to_string(), columns: vec!["name"] });

        let page = apply_query(&rows, &q);
        assert_eq!(ids(&page), vec!["3", "4"]);
        assert_eq!(page.total_count, 2);
    }

    #[test]
    fn test_range_past_end_keeps_total() {
        let rows = sample_rows();
        let page = apply_query(
            &rows,
            &query(vec![by("id", SortDirection::Ascending)], RowRange { from: 2, to: 3 }),
        );
        assert_eq!(ids(&page), vec!["3", "4"]);

        let page = apply_query(
            &rows,
            &query(vec![by("id", SortDirection::Ascending)], RowRange { from: 10, to: 19 }),
        );
        assert!(page.rows.is_empty());
        assert_eq!(page.total_count, 4);
    }

    #[tokio::test]
    async fn test_mutations() {
        let store = MemoryLocationStore::new();
        for row in sample_rows() {
            store.insert(EntityKind::Parking, row);
        }

        let id = LocationId::Int(1);
        store.set_availability(EntityKind::Parking, &id, true).await.unwrap();
        assert!(store.get(EntityKind::Parking, &id).unwrap().available);

        store
            .update_point(EntityKind::Parking, &id, "SRID=4326;POINT(20.1414 46.253)")
            .await
            .unwrap();
        let row = store.get(EntityKind::Parking, &id).unwrap();
        let point = PointCodec::default().point_of(&row).unwrap();
        assert_eq!(point.latitude, 46.253);
        assert_eq!(point.longitude, 20.1414);

        let missing = LocationId::Int(99);
        assert!(matches!(
            store.set_availability(EntityKind::Parking, &missing, true).await,
            Err(SpotmapError::NotFound { .. })
        ));

        let deleted = store.delete_location(EntityKind::Parking, &id).await.unwrap();
        assert_eq!(deleted.map(|row| row.name), Some("Riverside".to_string()));
        assert!(store.get(EntityKind::Parking, &id).is_none());
        assert!(store.delete_location(EntityKind::Service, &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_image_storage_records_removals() {
        let images = MemoryImageStorage::new();
        images.remove(&["a/1.jpg".to_string(), "a/2.jpg".to_string()]).await.unwrap();
        assert_eq!(images.removed(), vec!["a/1.jpg", "a/2.jpg"]);
    }

    #[test]
    fn test_seed_rows_deserialize_by_kind() {
        let seed = json!({
            "parking": [{ "id": 1, "name": "Garage" }],
            "repair_station": [{ "id": "rs-1", "name": "Bike Doctor" }]
        });
        let rows: HashMap<EntityKind, Vec<WireLocation>> = serde_json::from_value(seed).unwrap();
        let store = MemoryLocationStore::with_rows(rows);
        assert!(store.get(EntityKind::RepairStation, &LocationId::from("rs-1")).is_some());
    }
}

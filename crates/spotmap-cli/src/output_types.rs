use serde::Serialize;
use spotmap_core::models::{EntityKind, GeoPoint, KindDetails, ListingSnapshot, WireLocation};
use spotmap_geo::PointCodec;
use spotmap_listing::ReconcileReport;
use tabled::Tabled;

/// One location, decoded for display
#[derive(Debug, Serialize)]
pub struct LocationItem {
    pub id: String,
    pub name: String,
    pub city: Option<String>,
    pub address: Option<String>,
    pub available: bool,
    pub point: Option<GeoPoint>,
    pub images: usize,
    pub details: KindDetails,
}

impl LocationItem {
    pub fn from_row(kind: EntityKind, row: &WireLocation, codec: &PointCodec) -> Self {
        Self {
            id: row.id.as_ref().map(ToString::to_string).unwrap_or_default(),
            name: row.name.clone(),
            city: row.city.clone(),
            address: row.address.clone(),
            available: row.available,
            point: codec.point_of(row),
            images: row.images.len(),
            details: row.details(kind),
        }
    }
}

/// Output for list and browse
#[derive(Debug, Serialize)]
pub struct ListOutput {
    pub kind: EntityKind,
    pub search: String,
    pub page: u32,
    pub total_pages: u64,
    pub total_count: u64,
    pub rows: Vec<LocationItem>,
    pub reconciled: Option<ReconcileReport>,
}

impl ListOutput {
    pub fn from_snapshot(
        snapshot: &ListingSnapshot,
        codec: &PointCodec,
        reconciled: Option<ReconcileReport>,
    ) -> Self {
        let kind = snapshot.params.kind;
        Self {
            kind,
            search: snapshot.params.search.clone(),
            page: snapshot.params.page,
            total_pages: snapshot.total_pages(),
            total_count: snapshot.total_count,
            rows: snapshot.rows.iter().map(|row| LocationItem::from_row(kind, row, codec)).collect(),
            reconciled,
        }
    }
}

#[derive(Tabled)]
pub struct LocationRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "City")]
    pub city: String,
    #[tabled(rename = "Available")]
    pub available: String,
    #[tabled(rename = "Location")]
    pub location: String,
    #[tabled(rename = "Details")]
    pub details: String,
}

impl From<&LocationItem> for LocationRow {
    fn from(item: &LocationItem) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            city: item.city.clone().unwrap_or_default(),
            available: if item.available { "✓" } else { "✗" }.to_string(),
            location: item
                .point
                .map(|p| format!("{:.5}, {:.5}", p.latitude, p.longitude))
                .unwrap_or_else(|| "unavailable".to_string()),
            details: item.details.summary(),
        }
    }
}

/// Output for decode
#[derive(Debug, Serialize)]
pub struct DecodeOutput {
    pub shape: &'static str,
    pub latitude: f64,
    pub longitude: f64,
}

/// Output for encode
#[derive(Debug, Serialize)]
pub struct EncodeOutput {
    pub srid: u32,
    pub literal: String,
    pub hex: String,
}

/// Output for toggle, delete and set-location
#[derive(Debug, Serialize)]
pub struct MutationOutput {
    pub kind: EntityKind,
    pub id: String,
    pub action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Output for config
#[derive(Debug, Serialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    pub source: String,
}

#[derive(Tabled)]
pub struct ConfigRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}

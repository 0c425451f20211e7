use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use super::query::SortKey;
use crate::error::SpotmapError;

/// The three kinds of location the console administers
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    #[default]
    Parking,
    Service,
    RepairStation,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] =
        [EntityKind::Parking, EntityKind::Service, EntityKind::RepairStation];

    /// Remote collection (table) holding rows of this kind
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::Parking => "parking_spots",
            EntityKind::Service => "services",
            EntityKind::RepairStation => "repair_stations",
        }
    }

    /// Text columns searched by a case-insensitive substring filter
    pub fn search_columns(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Parking => &["name", "city", "address", "description"],
            EntityKind::Service => &["name", "city", "address", "category", "description"],
            EntityKind::RepairStation => &["name", "city", "address", "description"],
        }
    }

    /// Sort keys the collection supports
    pub fn sort_keys(&self) -> &'static [SortKey] {
        match self {
            EntityKind::Parking => &[
                SortKey::Name,
                SortKey::City,
                SortKey::Available,
                SortKey::Capacity,
                SortKey::CreatedAt,
                SortKey::UpdatedAt,
                SortKey::Id,
            ],
            EntityKind::Service => &[
                SortKey::Name,
                SortKey::City,
                SortKey::Available,
                SortKey::Rating,
                SortKey::CreatedAt,
                SortKey::UpdatedAt,
                SortKey::Id,
            ],
            EntityKind::RepairStation => &[
                SortKey::Name,
                SortKey::City,
                SortKey::Available,
                SortKey::CreatedAt,
                SortKey::UpdatedAt,
                SortKey::Id,
            ],
        }
    }

    /// Dense index, used for per-kind slots
    pub fn index(&self) -> usize {
        match self {
            EntityKind::Parking => 0,
            EntityKind::Service => 1,
            EntityKind::RepairStation => 2,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Parking => "parking",
            EntityKind::Service => "service",
            EntityKind::RepairStation => "repair_station",
        };
        f.write_str(label)
    }
}

impl FromStr for EntityKind {
    type Err = SpotmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "parking" | "parking_spot" | "parking_spots" => Ok(EntityKind::Parking),
            "service" | "services" => Ok(EntityKind::Service),
            "repair_station" | "repair_stations" | "repair" => Ok(EntityKind::RepairStation),
            _ => Err(SpotmapError::ConfigInvalid {
                key: "entity_kind".to_string(),
                reason: format!(
                    "Unknown entity kind: {}. Use parking, service, or repair_station",
                    s
                ),
            }),
        }
    }
}

/// Opaque row identity, unique within its kind
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocationId {
    Int(i64),
    Text(String),
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationId::Int(n) => write!(f, "{}", n),
            LocationId::Text(s) => f.write_str(s),
        }
    }
}

impl FromStr for LocationId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.parse::<i64>().map(LocationId::Int).unwrap_or_else(|_| LocationId::Text(s.to_string())))
    }
}

impl From<i64> for LocationId {
    fn from(n: i64) -> Self {
        LocationId::Int(n)
    }
}

impl From<&str> for LocationId {
    fn from(s: &str) -> Self {
        LocationId::Text(s.to_string())
    }
}

/// A row as returned by the remote store.
///
/// `location` keeps the raw wire value (hex EWKB, WKT literal, or a
/// structured `{type, coordinates}` object); decode it with `spotmap-geo`.
/// Kind-specific columns stay in `attributes`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WireLocation {
    #[serde(default)]
    pub id: Option<LocationId>,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub city: Option<String>,

    #[serde(default)]
    pub address: Option<String>,

    #[serde(default)]
    pub location: Option<serde_json::Value>,

    #[serde(default, alias = "is_available")]
    pub available: bool,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub images: Vec<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A comparable column value, as seen by sorting
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Id(LocationId),
    Text(String),
    Number(f64),
    Bool(bool),
    Time(DateTime<Utc>),
}

impl WireLocation {
    pub fn new(id: impl Into<LocationId>, name: impl Into<String>) -> Self {
        Self { id: Some(id.into()), name: name.into(), ..Default::default() }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_location(mut self, location: serde_json::Value) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_available(mut self, available: bool) -> Self {
        self.available = available;
        self
    }

    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Text content of a column, for search matching
    pub fn text_field(&self, column: &str) -> Option<&str> {
        match column {
            "name" => Some(self.name.as_str()),
            "description" => self.description.as_deref(),
            "city" => self.city.as_deref(),
            "address" => self.address.as_deref(),
            other => self.attributes.get(other).and_then(|v| v.as_str()),
        }
    }

    /// Value of a column for ordering; `None` behaves like SQL NULL
    pub fn field(&self, column: &str) -> Option<FieldValue> {
        match column {
            "id" => self.id.clone().map(FieldValue::Id),
            "name" => Some(FieldValue::Text(self.name.clone())),
            "available" => Some(FieldValue::Bool(self.available)),
            "created_at" => self.created_at.map(FieldValue::Time),
            "updated_at" => self.updated_at.map(FieldValue::Time),
            "description" | "city" | "address" => {
                self.text_field(column).map(|s| FieldValue::Text(s.to_string()))
            }
            other => match self.attributes.get(other)? {
                serde_json::Value::String(s) => Some(FieldValue::Text(s.clone())),
                serde_json::Value::Number(n) => n.as_f64().map(FieldValue::Number),
                serde_json::Value::Bool(b) => Some(FieldValue::Bool(*b)),
                _ => None,
            },
        }
    }

    /// Typed view of the kind-specific attributes
    pub fn details(&self, kind: EntityKind) -> KindDetails {
        let attr = |key: &str| self.attributes.get(key);
        let text = |key: &str| attr(key).and_then(|v| v.as_str()).map(str::to_string);
        let flag = |key: &str| attr(key).and_then(|v| v.as_bool());

        match kind {
            EntityKind::Parking => KindDetails::Parking {
                covered: flag("covered"),
                free: flag("free"),
                capacity: attr("capacity").and_then(|v| v.as_i64()),
            },
            EntityKind::Service => KindDetails::Service {
                phone: text("phone"),
                rating: attr("rating").and_then(|v| v.as_f64()),
                opening_hours: text("opening_hours"),
                category: text("category"),
            },
            EntityKind::RepairStation => KindDetails::RepairStation {
                phone: text("phone"),
                opening_hours: text("opening_hours"),
                services: attr("services")
                    .and_then(|v| v.as_array())
                    .map(|items| {
                        items.iter().filter_map(|i| i.as_str().map(str::to_string)).collect()
                    })
                    .unwrap_or_default(),
            },
        }
    }
}

/// Kind-specific attributes of a location
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KindDetails {
    Parking {
        covered: Option<bool>,
        free: Option<bool>,
        capacity: Option<i64>,
    },
    Service {
        phone: Option<String>,
        rating: Option<f64>,
        opening_hours: Option<String>,
        category: Option<String>,
    },
    RepairStation {
        phone: Option<String>,
        opening_hours: Option<String>,
        services: Vec<String>,
    },
}

impl KindDetails {
    /// One-line summary for tabular output
    pub fn summary(&self) -> String {
        match self {
            KindDetails::Parking { covered, free, capacity } => {
                let mut parts = Vec::new();
                if let Some(capacity) = capacity {
                    parts.push(format!("{} places", capacity));
                }
                if *covered == Some(true) {
                    parts.push("covered".to_string());
                }
                if *free == Some(true) {
                    parts.push("free".to_string());
                }
                parts.join(", ")
            }
            KindDetails::Service { phone, rating, category, .. } => {
                let mut parts = Vec::new();
                if let Some(category) = category {
                    parts.push(category.clone());
                }
                if let Some(rating) = rating {
                    parts.push(format!("{:.1}★", rating));
                }
                if let Some(phone) = phone {
                    parts.push(phone.clone());
                }
                parts.join(", ")
            }
            KindDetails::RepairStation { phone, services, .. } => {
                let mut parts: Vec<String> = services.clone();
                if let Some(phone) = phone {
                    parts.push(phone.clone());
                }
                parts.join(", ")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_store_row() {
        let row: WireLocation = serde_json::from_value(json!({
            "id": 42,
            "name": "Central Garage",
            "city": "Budapest",
            "location": "0101000020E6100000",
            "is_available": true,
            "images": null,
            "created_at": "2024-03-01T10:00:00+00:00",
            "capacity": 120,
            "covered": true
        }))
        .unwrap();

        assert_eq!(row.id, Some(LocationId::Int(42)));
        assert!(row.available);
        assert!(row.images.is_empty());
        assert!(row.created_at.is_some());
        assert_eq!(
            row.details(EntityKind::Parking),
            KindDetails::Parking { covered: Some(true), free: None, capacity: Some(120) }
        );
    }

    #[test]
    fn test_missing_identity_deserializes_as_none() {
        let row: WireLocation = serde_json::from_value(json!({ "name": "Nameless" })).unwrap();
        assert_eq!(row.id, None);

        let row: WireLocation =
            serde_json::from_value(json!({ "id": "b7c1", "name": "Text id" })).unwrap();
        assert_eq!(row.id, Some(LocationId::Text("b7c1".to_string())));
    }

    #[test]
    fn test_field_lookup() {
        let row = WireLocation::new(7, "Bike Fix")
            .with_city("Szeged")
            .with_attribute("rating", json!(4.5));

        assert_eq!(row.field("id"), Some(FieldValue::Id(LocationId::Int(7))));
        assert_eq!(row.field("rating"), Some(FieldValue::Number(4.5)));
        assert_eq!(row.text_field("city"), Some("Szeged"));
        assert_eq!(row.field("address"), None);
    }

    #[test]
    fn test_entity_kind_parsing() {
        assert_eq!("parking".parse::<EntityKind>().unwrap(), EntityKind::Parking);
        assert_eq!("repair-station".parse::<EntityKind>().unwrap(), EntityKind::RepairStation);
        assert_eq!("SERVICES".parse::<EntityKind>().unwrap(), EntityKind::Service);
        assert!("garage".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_location_id_parsing() {
        assert_eq!("12".parse::<LocationId>().unwrap(), LocationId::Int(12));
        assert_eq!("a-12".parse::<LocationId>().unwrap(), LocationId::from("a-12"));
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::location::EntityKind;
use crate::error::{Result, SpotmapError};

/// Columns a listing can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Name,
    City,
    Available,
    Rating,
    Capacity,
    #[default]
    CreatedAt,
    UpdatedAt,
    Id,
}

impl SortKey {
    pub fn column(&self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::City => "city",
            SortKey::Available => "available",
            SortKey::Rating => "rating",
            SortKey::Capacity => "capacity",
            SortKey::CreatedAt => "created_at",
            SortKey::UpdatedAt => "updated_at",
            SortKey::Id => "id",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for SortKey {
    type Err = SpotmapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "name" => Ok(SortKey::Name),
            "city" => Ok(SortKey::City),
            "available" | "availability" => Ok(SortKey::Available),
            "rating" => Ok(SortKey::Rating),
            "capacity" => Ok(SortKey::Capacity),
            "created_at" | "created" => Ok(SortKey::CreatedAt),
            "updated_at" | "updated" => Ok(SortKey::UpdatedAt),
            "id" => Ok(SortKey::Id),
            _ => Err(SpotmapError::ConfigInvalid {
                key: "sort_key".to_string(),
                reason: format!("Unknown sort key: {}", s),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    pub fn reversed(&self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = SpotmapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            _ => Err(SpotmapError::ConfigInvalid {
                key: "sort_direction".to_string(),
                reason: format!("Unknown sort direction: {}. Use asc or desc", s),
            }),
        }
    }
}

/// Everything the presentation layer controls about a listing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryParams {
    pub kind: EntityKind,
    pub search: String,
    pub sort_key: SortKey,
    pub direction: SortDirection,
    /// 1-based page number
    pub page: u32,
    pub page_size: u32,
}

impl QueryParams {
    /// First page of a kind, newest rows first
    pub fn new(kind: EntityKind, page_size: u32) -> Self {
        Self {
            kind,
            search: String::new(),
            sort_key: SortKey::CreatedAt,
            direction: SortDirection::Descending,
            page: 1,
            page_size,
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn sorted_by(mut self, sort_key: SortKey, direction: SortDirection) -> Self {
        self.sort_key = sort_key;
        self.direction = direction;
        self
    }

    pub fn at_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Check the invariants the builder relies on
    pub fn validate(&self) -> Result<()> {
        if self.page < 1 {
            return Err(SpotmapError::Validation {
                field: "page".to_string(),
                value: self.page.to_string(),
                reason: "pages are numbered from 1".to_string(),
            });
        }
        if self.page_size < 1 {
            return Err(SpotmapError::Validation {
                field: "page_size".to_string(),
                value: self.page_size.to_string(),
                reason: "page size must be positive".to_string(),
            });
        }
        if !self.kind.sort_keys().contains(&self.sort_key) {
            return Err(SpotmapError::Validation {
                field: "sort_key".to_string(),
                value: self.sort_key.to_string(),
                reason: format!("{} rows cannot be sorted by this column", self.kind),
            });
        }
        Ok(())
    }
}

/// Case-insensitive substring match over a fixed set of columns
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TextMatch {
    pub needle: String,
    pub columns: Vec<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct OrderClause {
    pub column: &'static str,
    pub direction: SortDirection,
}

/// Inclusive row range `from..=to`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RowRange {
    pub from: u64,
    pub to: u64,
}

impl RowRange {
    pub fn offset(&self) -> u64 {
        self.from
    }

    pub fn limit(&self) -> u64 {
        self.to + 1 - self.from
    }
}

/// A fully determined request against one remote collection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RemoteQuery {
    pub kind: EntityKind,
    pub collection: &'static str,
    pub text_match: Option<TextMatch>,
    pub order: Vec<OrderClause>,
    pub range: RowRange,
}

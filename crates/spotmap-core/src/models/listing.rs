use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::location::WireLocation;
use super::query::QueryParams;
use crate::error::SpotmapError;

/// One page of rows plus the size of the full result set
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Page {
    pub rows: Vec<WireLocation>,
    pub total_count: u64,
}

/// The rows currently shown for a kind, and the params that produced them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingSnapshot {
    pub rows: Vec<WireLocation>,
    pub total_count: u64,
    pub params: QueryParams,
}

impl ListingSnapshot {
    pub fn total_pages(&self) -> u64 {
        let page_size = u64::from(self.params.page_size.max(1));
        self.total_count.div_ceil(page_size)
    }
}

/// Row columns that make up a content fingerprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerprintField {
    Name,
    City,
    Address,
    Description,
}

impl FingerprintField {
    pub fn column(&self) -> &'static str {
        match self {
            FingerprintField::Name => "name",
            FingerprintField::City => "city",
            FingerprintField::Address => "address",
            FingerprintField::Description => "description",
        }
    }

    pub fn defaults() -> Vec<FingerprintField> {
        vec![FingerprintField::Name, FingerprintField::City, FingerprintField::Address]
    }
}

impl FromStr for FingerprintField {
    type Err = SpotmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" => Ok(FingerprintField::Name),
            "city" => Ok(FingerprintField::City),
            "address" => Ok(FingerprintField::Address),
            "description" => Ok(FingerprintField::Description),
            _ => Err(SpotmapError::ConfigInvalid {
                key: "fingerprint_fields".to_string(),
                reason: format!(
                    "Unknown fingerprint field: {}. Use name, city, address, or description",
                    s
                ),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntityKind;

    #[test]
    fn test_total_pages_rounds_up() {
        let snapshot = |total_count| ListingSnapshot {
            rows: Vec::new(),
            total_count,
            params: QueryParams::new(EntityKind::Parking, 20),
        };

        assert_eq!(snapshot(0).total_pages(), 0);
        assert_eq!(snapshot(20).total_pages(), 1);
        assert_eq!(snapshot(21).total_pages(), 2);
    }
}

//! Duplicate removal applied to every fetched page before it is shown.
//!
//! Two order-preserving passes: rows repeating an identity already seen, then
//! rows whose normalized content fingerprint was already seen. Rows without an
//! identity cannot be addressed by any mutation and are dropped as anomalous.

use serde::Serialize;
use spotmap_core::config::LayeredConfig;
use spotmap_core::models::{FingerprintField, LocationId, WireLocation};
use std::collections::HashSet;

const FIELD_SEPARATOR: char = '\u{1f}';

/// Which passes run and which columns make up the fingerprint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileConfig {
    pub identity_pass: bool,
    pub fingerprint_pass: bool,
    pub fingerprint_fields: Vec<FingerprintField>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            identity_pass: true,
            fingerprint_pass: true,
            fingerprint_fields: FingerprintField::defaults(),
        }
    }
}

impl ReconcileConfig {
    pub fn from_config(config: &LayeredConfig) -> Self {
        Self {
            identity_pass: config.identity_pass.value,
            fingerprint_pass: config.fingerprint_pass.value,
            fingerprint_fields: config.fingerprint_fields.value.clone(),
        }
    }
}

/// Rows dropped by each pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub missing_identity: usize,
    pub duplicate_identity: usize,
    pub duplicate_fingerprint: usize,
}

impl ReconcileReport {
    pub fn dropped(&self) -> usize {
        self.missing_identity + self.duplicate_identity + self.duplicate_fingerprint
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReconciliationFilter {
    config: ReconcileConfig,
}

impl ReconciliationFilter {
    pub fn new(config: ReconcileConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Drop duplicates, keeping the first occurrence of each
    pub fn filter(&self, rows: Vec<WireLocation>) -> Vec<WireLocation> {
        self.filter_with_report(rows).0
    }

    pub fn filter_with_report(
        &self,
        rows: Vec<WireLocation>,
    ) -> (Vec<WireLocation>, ReconcileReport) {
        let mut report = ReconcileReport::default();
        let mut rows = rows;

        if self.config.identity_pass {
            let mut seen: HashSet<LocationId> = HashSet::new();
            rows.retain(|row| match &row.id {
                None => {
                    tracing::warn!(name = %row.name, "Dropping row without an identity");
                    report.missing_identity += 1;
                    false
                }
                Some(id) => {
                    let first = seen.insert(id.clone());
                    if !first {
                        report.duplicate_identity += 1;
                    }
                    first
                }
            });
        }

        if self.config.fingerprint_pass && !self.config.fingerprint_fields.is_empty() {
            let mut seen: HashSet<String> = HashSet::new();
            rows.retain(|row| {
                let first = seen.insert(self.fingerprint(row));
                if !first {
                    tracing::debug!(id = ?row.id, "Dropping row with repeated content");
                    report.duplicate_fingerprint += 1;
                }
                first
            });
        }

        if report.dropped() > 0 {
            tracing::debug!(
                missing_identity = report.missing_identity,
                duplicate_identity = report.duplicate_identity,
                duplicate_fingerprint = report.duplicate_fingerprint,
                "Reconciled fetched rows"
            );
        }

        (rows, report)
    }

    /// Normalized, case-folded concatenation of the configured columns
    pub fn fingerprint(&self, row: &WireLocation) -> String {
        let mut fingerprint = String::new();
        for (i, field) in self.config.fingerprint_fields.iter().enumerate() {
            if i > 0 {
                fingerprint.push(FIELD_SEPARATOR);
            }
            if let Some(value) = row.text_field(field.column()) {
                fingerprint.push_str(&normalize(value));
            }
        }
        fingerprint
    }
}

fn normalize(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, name: &str, city: &str, address: &str) -> WireLocation {
        WireLocation::new(id, name).with_city(city).with_address(address)
    }

    fn ids(rows: &[WireLocation]) -> Vec<String> {
        rows.iter().filter_map(|row| row.id.as_ref().map(ToString::to_string)).collect()
    }

    #[test]
    fn test_identity_then_fingerprint() {
        let rows = vec![
            row(1, "Central Garage", "Budapest", "Fő utca 1"),
            row(1, "Central Garage", "Budapest", "Fő utca 1"),
            row(2, "Riverside", "Szeged", "Part 2"),
            row(3, "  riverside ", "SZEGED", "Part   2"),
        ];

        let (kept, report) = ReconciliationFilter::default().filter_with_report(rows);
        assert_eq!(ids(&kept), vec!["1", "2"]);
        assert_eq!(report.duplicate_identity, 1);
        assert_eq!(report.duplicate_fingerprint, 1);
        assert_eq!(report.dropped(), 2);
    }

    #[test]
    fn test_rows_without_identity_are_dropped() {
        let mut anonymous = row(9, "Ghost", "Nowhere", "");
        anonymous.id = None;
        let rows = vec![anonymous, row(1, "Real", "Town", "Street")];

        let (kept, report) = ReconciliationFilter::default().filter_with_report(rows);
        assert_eq!(ids(&kept), vec!["1"]);
        assert_eq!(report.missing_identity, 1);
    }

    #[test]
    fn test_passes_can_be_disabled() {
        let rows = vec![row(1, "A", "X", "Y"), row(1, "A", "X", "Y"), row(2, "A", "X", "Y")];

        let identity_only = ReconciliationFilter::new(ReconcileConfig {
            fingerprint_pass: false,
            ..Default::default()
        });
        assert_eq!(ids(&identity_only.filter(rows.clone())), vec!["1", "2"]);

        let none = ReconciliationFilter::new(ReconcileConfig {
            identity_pass: false,
            fingerprint_pass: false,
            fingerprint_fields: Vec::new(),
        });
        assert_eq!(none.filter(rows).len(), 3);
    }

    #[test]
    fn test_fingerprint_fields_do_not_run_together() {
        let filter = ReconciliationFilter::default();
        let a = row(1, "ab", "c", "");
        let b = row(2, "a", "bc", "");
        assert_ne!(filter.fingerprint(&a), filter.fingerprint(&b));
    }

    #[test]
    fn test_custom_fingerprint_fields() {
        let filter = ReconciliationFilter::new(ReconcileConfig {
            fingerprint_fields: vec![FingerprintField::Name],
            ..Default::default()
        });
        let rows = vec![row(1, "Same", "A", "1"), row(2, "same", "B", "2")];
        assert_eq!(ids(&filter.filter(rows)), vec!["1"]);
    }
}

use crate::error::{Result, SpotmapError};
use crate::models::{FingerprintField, WGS84_SRID};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for the listing layer
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub page_size: ConfigValue<u32>,
    pub debounce_ms: ConfigValue<u64>,
    pub srid: ConfigValue<u32>,
    pub identity_pass: ConfigValue<bool>,
    pub fingerprint_pass: ConfigValue<bool>,
    pub fingerprint_fields: ConfigValue<Vec<FingerprintField>>,
    pub image_bucket: ConfigValue<String>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            page_size: ConfigValue::new(20, ConfigSource::Default),
            debounce_ms: ConfigValue::new(300, ConfigSource::Default),
            srid: ConfigValue::new(WGS84_SRID, ConfigSource::Default),
            identity_pass: ConfigValue::new(true, ConfigSource::Default),
            fingerprint_pass: ConfigValue::new(true, ConfigSource::Default),
            fingerprint_fields: ConfigValue::new(
                FingerprintField::defaults(),
                ConfigSource::Default,
            ),
            image_bucket: ConfigValue::new("location-images".to_string(), ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        if !path.as_ref().exists() {
            return Err(SpotmapError::ConfigFileNotFound { path: path.as_ref().to_path_buf() });
        }

        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| SpotmapError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| SpotmapError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(page_size) = file_config.page_size {
            if page_size == 0 {
                return Err(SpotmapError::ConfigInvalid {
                    key: "page_size".to_string(),
                    reason: "Invalid page size: 0. Use a positive integer".to_string(),
                });
            }
            self.page_size.update(page_size, ConfigSource::File);
        }

        if let Some(debounce_ms) = file_config.debounce_ms {
            self.debounce_ms.update(debounce_ms, ConfigSource::File);
        }

        if let Some(srid) = file_config.srid {
            self.srid.update(srid, ConfigSource::File);
        }

        if let Some(identity_pass) = file_config.identity_pass {
            self.identity_pass.update(identity_pass, ConfigSource::File);
        }

        if let Some(fingerprint_pass) = file_config.fingerprint_pass {
            self.fingerprint_pass.update(fingerprint_pass, ConfigSource::File);
        }

        if let Some(fields) = file_config.fingerprint_fields {
            self.fingerprint_fields.update(fields, ConfigSource::File);
        }

        if let Some(bucket) = file_config.image_bucket {
            self.image_bucket.update(bucket, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        if let Ok(raw) = env::var("SPOTMAP_PAGE_SIZE") {
            match parse_page_size(&raw) {
                Ok(size) => self.page_size.update(size, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid SPOTMAP_PAGE_SIZE value '{}': expected a positive integer",
                    raw
                ),
            }
        }

        if let Ok(raw) = env::var("SPOTMAP_DEBOUNCE_MS") {
            match raw.parse::<u64>() {
                Ok(ms) => self.debounce_ms.update(ms, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid SPOTMAP_DEBOUNCE_MS value '{}': expected milliseconds",
                    raw
                ),
            }
        }

        if let Ok(raw) = env::var("SPOTMAP_SRID") {
            match raw.parse::<u32>() {
                Ok(srid) => self.srid.update(srid, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid SPOTMAP_SRID value '{}': expected integer EPSG code",
                    raw
                ),
            }
        }

        if let Ok(raw) = env::var("SPOTMAP_IDENTITY_PASS") {
            match parse_flag(&raw) {
                Ok(flag) => self.identity_pass.update(flag, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid SPOTMAP_IDENTITY_PASS value '{}': expected true or false",
                    raw
                ),
            }
        }

        if let Ok(raw) = env::var("SPOTMAP_FINGERPRINT_PASS") {
            match parse_flag(&raw) {
                Ok(flag) => self.fingerprint_pass.update(flag, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid SPOTMAP_FINGERPRINT_PASS value '{}': expected true or false",
                    raw
                ),
            }
        }

        if let Ok(raw) = env::var("SPOTMAP_FINGERPRINT_FIELDS") {
            match parse_fingerprint_fields(&raw) {
                Ok(fields) => self.fingerprint_fields.update(fields, ConfigSource::Environment),
                Err(e) => tracing::warn!("Invalid SPOTMAP_FINGERPRINT_FIELDS value '{}': {}", raw, e),
            }
        }

        if let Ok(bucket) = env::var("SPOTMAP_IMAGE_BUCKET") {
            self.image_bucket.update(bucket, ConfigSource::Environment);
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(page_size) = overrides.page_size {
            self.page_size.update(page_size, ConfigSource::Cli);
        }

        if let Some(debounce_ms) = overrides.debounce_ms {
            self.debounce_ms.update(debounce_ms, ConfigSource::Cli);
        }

        if let Some(srid) = overrides.srid {
            self.srid.update(srid, ConfigSource::Cli);
        }

        if let Some(fingerprint_pass) = overrides.fingerprint_pass {
            self.fingerprint_pass.update(fingerprint_pass, ConfigSource::Cli);
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms.value)
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "page_size".to_string(),
            (self.page_size.value.to_string(), self.page_size.source),
        );

        map.insert(
            "debounce_ms".to_string(),
            (self.debounce_ms.value.to_string(), self.debounce_ms.source),
        );

        map.insert("srid".to_string(), (format!("EPSG:{}", self.srid.value), self.srid.source));

        map.insert(
            "identity_pass".to_string(),
            (self.identity_pass.value.to_string(), self.identity_pass.source),
        );

        map.insert(
            "fingerprint_pass".to_string(),
            (self.fingerprint_pass.value.to_string(), self.fingerprint_pass.source),
        );

        let fields: Vec<&str> =
            self.fingerprint_fields.value.iter().map(FingerprintField::column).collect();
        map.insert(
            "fingerprint_fields".to_string(),
            (fields.join(","), self.fingerprint_fields.source),
        );

        map.insert(
            "image_bucket".to_string(),
            (self.image_bucket.value.clone(), self.image_bucket.source),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    page_size: Option<u32>,
    debounce_ms: Option<u64>,
    srid: Option<u32>,
    identity_pass: Option<bool>,
    fingerprint_pass: Option<bool>,
    fingerprint_fields: Option<Vec<FingerprintField>>,
    image_bucket: Option<String>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub page_size: Option<u32>,
    pub debounce_ms: Option<u64>,
    pub srid: Option<u32>,
    pub fingerprint_pass: Option<bool>,
}

/// Parse a page size; zero is rejected
pub fn parse_page_size(s: &str) -> Result<u32> {
    match s.trim().parse::<u32>() {
        Ok(size) if size > 0 => Ok(size),
        _ => Err(SpotmapError::ConfigInvalid {
            key: "page_size".to_string(),
            reason: format!("Invalid page size: {}. Use a positive integer", s),
        }),
    }
}

/// Parse a boolean switch
pub fn parse_flag(s: &str) -> Result<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(SpotmapError::ConfigInvalid {
            key: "flag".to_string(),
            reason: format!("Invalid boolean: {}. Use true or false", s),
        }),
    }
}

/// Parse a comma-separated fingerprint field list
pub fn parse_fingerprint_fields(s: &str) -> Result<Vec<FingerprintField>> {
    let fields = s
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(str::parse)
        .collect::<Result<Vec<FingerprintField>>>()?;

    if fields.is_empty() {
        return Err(SpotmapError::ConfigInvalid {
            key: "fingerprint_fields".to_string(),
            reason: "at least one field is required".to_string(),
        });
    }
    Ok(fields)
}

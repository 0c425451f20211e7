//! Image cleanup against the object-storage bucket.
//!
//! Rows keep public URLs of the form
//! `<base>/storage/v1/object/public/<bucket>/<path>`; removal takes `<path>`.

use async_trait::async_trait;
use spotmap_core::error::{Result, SpotmapError};
use std::time::Duration;

use crate::ports::ImageStorage;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// URL segment preceding an object's in-bucket path
pub fn bucket_marker(bucket: &str) -> String {
    format!("/storage/v1/object/public/{}/", bucket)
}

/// In-bucket path of a public image URL, without any query string
pub fn extract_object_path(url: &str, marker: &str) -> Option<String> {
    let (_, tail) = url.split_once(marker)?;
    let path = tail.split(['?', '#']).next().unwrap_or_default();
    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}

/// Paths of every image URL that lives in `bucket`; foreign URLs are skipped
pub fn object_paths(urls: &[String], bucket: &str) -> Vec<String> {
    let marker = bucket_marker(bucket);
    urls.iter()
        .filter_map(|url| {
            let path = extract_object_path(url, &marker);
            if path.is_none() {
                tracing::debug!(url = %url, bucket, "Image URL is outside the bucket, skipping");
            }
            path
        })
        .collect()
}

/// Object storage reached over its HTTP API
pub struct HttpImageStorage {
    client: reqwest::Client,
    base_url: String,
    bucket: String,
    api_key: String,
}

impl HttpImageStorage {
    pub fn new(
        base_url: impl Into<String>,
        bucket: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SpotmapError::Store(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            api_key: api_key.into(),
        })
    }

    /// Build from SPOTMAP_STORAGE_URL and SPOTMAP_STORAGE_KEY
    pub fn from_env(bucket: impl Into<String>) -> Result<Self> {
        let require = |key: &str| {
            std::env::var(key)
                .ok()
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| SpotmapError::ConfigMissing { key: key.to_string() })
        };
        Self::new(require("SPOTMAP_STORAGE_URL")?, bucket, require("SPOTMAP_STORAGE_KEY")?)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ImageStorage for HttpImageStorage {
    async fn remove(&self, paths: &[String]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }

        let url = format!("{}/storage/v1/object/{}", self.base_url, self.bucket);
        let response = self
            .client
            .delete(&url)
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "prefixes": paths }))
            .send()
            .await
            .map_err(|e| SpotmapError::Store(format!("Image removal request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpotmapError::Store(format!(
                "Image removal returned HTTP {}",
                status.as_u16()
            )));
        }

        tracing::debug!(bucket = %self.bucket, count = paths.len(), "Removed images");
        Ok(())
    }
}

//! HTTP object storage.
//!
//! Speaks the storage REST dialect used by Supabase-compatible services:
//! objects are written with `POST /storage/v1/object/{bucket}/{key}` and
//! served from `/storage/v1/object/public/{bucket}/{key}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use sage_kitchen_core::gateway::{FileStore, GatewayError, GatewayResult};
use sage_kitchen_core::upload::ObjectKey;

use crate::config::StorageConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// [`FileStore`] backed by a storage bucket over HTTP.
pub struct BucketStore {
    client: reqwest::Client,
    base_url: String,
    bucket: String,
    service_key: SecretString,
}

impl BucketStore {
    #[must_use]
    pub fn new(config: &StorageConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base_url: config.url.as_str().trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
            service_key: config.service_key.clone(),
        }
    }

    fn object_url(&self, key: &ObjectKey) -> String {
        format!("{}/storage/v1/object/{}/{key}", self.base_url, self.bucket)
    }

    /// URL the object is publicly served from.
    #[must_use]
    pub fn public_url(&self, key: &ObjectKey) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{key}",
            self.base_url, self.bucket
        )
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.service_key.expose_secret())
    }
}

impl std::fmt::Debug for BucketStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BucketStore")
            .field("base_url", &self.base_url)
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

async fn ensure_success(response: reqwest::Response) -> GatewayResult<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(GatewayError::backend(format!(
        "storage returned {status}: {body}"
    )))
}

#[async_trait]
impl FileStore for BucketStore {
    #[instrument(skip(self, bytes), fields(bucket = %self.bucket, size = bytes.len()))]
    async fn put(&self, key: &ObjectKey, content_type: &str, bytes: Vec<u8>) -> GatewayResult<String> {
        let response = self
            .client
            .post(self.object_url(key))
            .header(AUTHORIZATION, self.bearer())
            .header(CONTENT_TYPE, content_type)
            .header("cache-control", "max-age=3600")
            .body(bytes)
            .send()
            .await
            .map_err(GatewayError::backend)?;
        ensure_success(response).await?;

        tracing::debug!(%key, "Object uploaded");
        Ok(self.public_url(key))
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn remove(&self, key: &ObjectKey) -> GatewayResult<()> {
        let response = self
            .client
            .delete(self.object_url(key))
            .header(AUTHORIZATION, self.bearer())
            .send()
            .await
            .map_err(GatewayError::backend)?;
        ensure_success(response).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use url::Url;

    use super::*;

    fn store() -> BucketStore {
        BucketStore::new(&StorageConfig {
            url: Url::parse("https://files.sage.kitchen/").unwrap(),
            bucket: "sage-kitchen".to_string(),
            service_key: SecretString::from("kT9#vQ2$wX7!pL4@"),
        })
    }

    #[test]
    fn test_urls() {
        let store = store();
        let key = ObjectKey::from_raw("products/1-abc.png");
        assert_eq!(
            store.object_url(&key),
            "https://files.sage.kitchen/storage/v1/object/sage-kitchen/products/1-abc.png"
        );
        assert_eq!(
            store.public_url(&key),
            "https://files.sage.kitchen/storage/v1/object/public/sage-kitchen/products/1-abc.png"
        );
    }

    #[test]
    fn test_debug_hides_key() {
        let debug_output = format!("{:?}", store());
        assert!(!debug_output.contains("kT9#"));
    }
}

// SPDX-License-Identifier: MIT

//! File storage client (hosted object storage).
//!
//! Used for profile photos: upload, signed-URL creation, and removal of
//! the previous photo. Paths are namespaced per user and cache-busted
//! with an upload timestamp.

use crate::error::AppError;
use serde::Deserialize;

/// Bucket holding profile photos.
pub const PROFILE_PHOTO_BUCKET: &str = "profile-photos";

/// Signed URLs stay valid for one year; a new upload replaces the URL
/// anyway.
pub const SIGNED_URL_TTL_SECS: u64 = 31_536_000;

/// Hosted storage client.
#[derive(Clone)]
pub struct StorageClient {
    inner: Option<StorageInner>,
}

#[derive(Clone)]
struct StorageInner {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl StorageClient {
    /// Create a client for the hosted project's storage endpoint.
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            inner: Some(StorageInner {
                http: reqwest::Client::new(),
                base_url: format!("{}/storage/v1", base_url.trim_end_matches('/')),
                api_key: api_key.to_string(),
            }),
        }
    }

    /// Create a mock client for testing (offline mode).
    pub fn new_mock() -> Self {
        Self { inner: None }
    }

    fn get_inner(&self) -> Result<&StorageInner, AppError> {
        self.inner
            .as_ref()
            .ok_or_else(|| AppError::Storage("Storage not configured (offline mode)".to_string()))
    }

    /// Upload an object. Fails if the path already exists; callers pick
    /// unique, timestamped paths.
    pub async fn upload(
        &self,
        token: &str,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), AppError> {
        let inner = self.get_inner()?;
        let url = format!("{}/object/{}/{}", inner.base_url, bucket, encode_path(path));

        let response = inner
            .http
            .post(&url)
            .header("apikey", &inner.api_key)
            .header("Content-Type", content_type)
            .header("Cache-Control", "3600")
            .bearer_auth(token)
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        Self::check_response(response).await
    }

    /// Create a signed URL for an object.
    pub async fn create_signed_url(
        &self,
        token: &str,
        bucket: &str,
        path: &str,
        expires_in_secs: u64,
    ) -> Result<String, AppError> {
        let inner = self.get_inner()?;
        let url = format!(
            "{}/object/sign/{}/{}",
            inner.base_url,
            bucket,
            encode_path(path)
        );

        let response = inner
            .http
            .post(&url)
            .header("apikey", &inner.api_key)
            .bearer_auth(token)
            .json(&serde_json::json!({ "expiresIn": expires_in_secs }))
            .send()
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Storage(format!("HTTP {}: {}", status, body)));
        }

        let signed: SignedUrlResponse = response
            .json()
            .await
            .map_err(|e| AppError::Storage(format!("JSON parse error: {}", e)))?;

        // The service returns a path relative to its own root.
        Ok(format!(
            "{}{}",
            inner.base_url,
            signed.signed_url.trim_start_matches("/storage/v1")
        ))
    }

    /// Remove objects by path.
    pub async fn remove(&self, token: &str, bucket: &str, paths: &[&str]) -> Result<(), AppError> {
        let inner = self.get_inner()?;
        let url = format!("{}/object/{}", inner.base_url, bucket);

        let response = inner
            .http
            .delete(&url)
            .header("apikey", &inner.api_key)
            .bearer_auth(token)
            .json(&serde_json::json!({ "prefixes": paths }))
            .send()
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        Self::check_response(response).await
    }

    async fn check_response(response: reqwest::Response) -> Result<(), AppError> {
        if response.status().is_success() {
            return Ok(());
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(AppError::Storage(format!("HTTP {}: {}", status, body)))
    }
}

/// Percent-encode each path segment while keeping the separators.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[derive(Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_path_keeps_separators() {
        assert_eq!(encode_path("user/photo 1.png"), "user/photo%201.png");
        assert_eq!(encode_path("plain.png"), "plain.png");
    }

    #[tokio::test]
    async fn test_offline_mode_errors() {
        let storage = StorageClient::new_mock();
        let err = storage
            .remove("token", PROFILE_PHOTO_BUCKET, &["a.png"])
            .await
            .expect_err("offline storage should error");
        assert!(matches!(err, AppError::Storage(_)));
    }
}

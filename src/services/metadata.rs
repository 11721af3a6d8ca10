// SPDX-License-Identifier: MIT

//! External game-metadata client.
//!
//! Searches a third-party catalog by name and fetches full records by ID
//! to pre-fill new games (title, cover, release year, rating, and the
//! genre/theme/platform tag lists). The service authenticates with a
//! client-credentials app token, which is cached and refreshed shortly
//! before expiry.

use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;

const DEFAULT_API_URL: &str = "https://api.igdb.com/v4";
const DEFAULT_TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";
const SEARCH_LIMIT: u32 = 10;
/// Refresh the app token this long before it actually expires.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

const GAME_FIELDS: &str = "name,cover.url,first_release_date,total_rating,\
                           genres.name,themes.name,platforms.name,\
                           involved_companies.company.name,involved_companies.developer,\
                           involved_companies.publisher";

/// Metadata service client.
#[derive(Clone)]
pub struct MetadataClient {
    inner: Option<Arc<MetadataInner>>,
}

struct MetadataInner {
    http: reqwest::Client,
    api_url: String,
    token_url: String,
    client_id: String,
    client_secret: String,
    app_token: RwLock<Option<CachedToken>>,
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl MetadataClient {
    /// Create a client with service credentials.
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            inner: Some(Arc::new(MetadataInner {
                http: reqwest::Client::new(),
                api_url: DEFAULT_API_URL.to_string(),
                token_url: DEFAULT_TOKEN_URL.to_string(),
                client_id,
                client_secret,
                app_token: RwLock::new(None),
            })),
        }
    }

    /// Create a mock client for testing (offline mode).
    pub fn new_mock() -> Self {
        Self { inner: None }
    }

    fn get_inner(&self) -> Result<&Arc<MetadataInner>, AppError> {
        self.inner.as_ref().ok_or_else(|| {
            AppError::Metadata("Metadata service not configured (offline mode)".to_string())
        })
    }

    /// Search the catalog by name. Terms shorter than 3 characters return
    /// nothing, mirroring the search box behavior.
    pub async fn search(&self, term: &str) -> Result<Vec<MetadataGame>, AppError> {
        if term.chars().count() < 3 {
            return Ok(Vec::new());
        }

        // The service speaks its own query language in the request body.
        let escaped = term.replace('"', "\\\"");
        let body = format!(
            "search \"{}\"; fields {}; limit {};",
            escaped, GAME_FIELDS, SEARCH_LIMIT
        );
        self.query_games(&body).await
    }

    /// Fetch a single catalog record by ID.
    pub async fn get_game(&self, id: u64) -> Result<Option<MetadataGame>, AppError> {
        let body = format!("where id = {}; fields {}; limit 1;", id, GAME_FIELDS);
        Ok(self.query_games(&body).await?.into_iter().next())
    }

    async fn query_games(&self, body: &str) -> Result<Vec<MetadataGame>, AppError> {
        let inner = self.get_inner()?;
        let token = self.app_token().await?;
        let url = format!("{}/games", inner.api_url);

        let response = inner
            .http
            .post(&url)
            .header("Client-ID", &inner.client_id)
            .bearer_auth(token)
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| AppError::Metadata(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Metadata(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Metadata(format!("JSON parse error: {}", e)))
    }

    /// Get a valid app token, refreshing through the credentials grant
    /// when the cached one is missing or about to expire.
    async fn app_token(&self) -> Result<String, AppError> {
        let inner = self.get_inner()?;

        if let Some(cached) = inner.app_token.read().await.as_ref() {
            if cached.expires_at > Utc::now() {
                return Ok(cached.token.clone());
            }
        }

        let mut slot = inner.app_token.write().await;
        // Another request may have refreshed while we waited for the lock.
        if let Some(cached) = slot.as_ref() {
            if cached.expires_at > Utc::now() {
                return Ok(cached.token.clone());
            }
        }

        let response = inner
            .http
            .post(&inner.token_url)
            .form(&[
                ("client_id", inner.client_id.as_str()),
                ("client_secret", inner.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Metadata(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::Metadata(format!(
                "Token request failed: HTTP {}",
                status
            )));
        }

        let token: AppTokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Metadata(format!("JSON parse error: {}", e)))?;

        let cached = CachedToken {
            token: token.access_token.clone(),
            expires_at: Utc::now()
                + chrono::Duration::seconds(
                    (token.expires_in - TOKEN_EXPIRY_MARGIN_SECS).max(0),
                ),
        };
        *slot = Some(cached);

        tracing::debug!("Refreshed metadata service app token");
        Ok(token.access_token)
    }
}

#[derive(Deserialize)]
struct AppTokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Catalog record as the metadata service returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataGame {
    pub id: u64,
    pub name: String,
    pub cover: Option<MetadataCover>,
    /// Unix timestamp of first release
    pub first_release_date: Option<i64>,
    /// Community rating (0–100)
    pub total_rating: Option<f64>,
    #[serde(default)]
    pub genres: Vec<NamedRef>,
    #[serde(default)]
    pub themes: Vec<NamedRef>,
    #[serde(default)]
    pub platforms: Vec<NamedRef>,
    #[serde(default)]
    pub involved_companies: Vec<InvolvedCompany>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetadataCover {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedRef {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvolvedCompany {
    pub company: NamedRef,
    #[serde(default)]
    pub developer: bool,
    #[serde(default)]
    pub publisher: bool,
}

impl MetadataGame {
    /// Full-size cover URL. The service hands out protocol-relative
    /// thumbnail URLs; swap the size segment and pin https.
    pub fn cover_url(&self) -> Option<String> {
        self.cover.as_ref().map(|c| {
            let url = c.url.replace("t_thumb", "t_cover_big");
            if let Some(rest) = url.strip_prefix("//") {
                format!("https://{}", rest)
            } else {
                url
            }
        })
    }

    /// Release year derived from the first release date.
    pub fn release_year(&self) -> Option<i32> {
        use chrono::Datelike;
        let ts = self.first_release_date?;
        Some(DateTime::<Utc>::from_timestamp(ts, 0)?.year())
    }

    /// Comma-joined labels, `None` when the list is empty.
    pub fn joined_names(refs: &[NamedRef]) -> Option<String> {
        if refs.is_empty() {
            return None;
        }
        Some(
            refs.iter()
                .map(|r| r.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        )
    }

    /// First company flagged as developer.
    pub fn developer(&self) -> Option<String> {
        self.involved_companies
            .iter()
            .find(|c| c.developer)
            .map(|c| c.company.name.clone())
    }

    /// First company flagged as publisher.
    pub fn publisher(&self) -> Option<String> {
        self.involved_companies
            .iter()
            .find(|c| c.publisher)
            .map(|c| c.company.name.clone())
    }
}

// SPDX-License-Identifier: MIT

//! Remote data gateway client with typed operations.
//!
//! The hosted backend exposes row-level CRUD over a PostgREST-style REST
//! API plus one custom RPC (`update_user_xp`). Every request carries the
//! project API key and the caller's access token, so row-level security
//! stays with the gateway; this client only shapes requests and maps rows
//! into typed records.
//!
//! Provides high-level operations for:
//! - Games (catalog rows)
//! - Challenges (joined with their parent game where the UI needs it)
//! - Profiles (lazily created on first sign-in)
//! - Achievement counts and the XP adjustment RPC

use crate::db::tables;
use crate::error::AppError;
use crate::models::{
    Challenge, ChallengeUpdate, ChallengeWithGame, Game, GameUpdate, NewChallenge, NewGame,
    NewProfile, UserProfile,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

/// Remote data gateway client.
#[derive(Clone)]
pub struct GatewayDb {
    inner: Option<GatewayInner>,
}

#[derive(Clone)]
struct GatewayInner {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GatewayDb {
    /// Create a new gateway client for a hosted backend project.
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            inner: Some(GatewayInner {
                http: reqwest::Client::new(),
                base_url: base_url.trim_end_matches('/').to_string(),
                api_key: api_key.to_string(),
            }),
        }
    }

    /// Create a mock gateway client for testing (offline mode).
    ///
    /// All operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { inner: None }
    }

    fn get_inner(&self) -> Result<&GatewayInner, AppError> {
        self.inner
            .as_ref()
            .ok_or_else(|| AppError::Gateway("Gateway not connected (offline mode)".to_string()))
    }

    fn table_url(&self, table: &str) -> Result<String, AppError> {
        Ok(format!("{}/rest/v1/{}", self.get_inner()?.base_url, table))
    }

    // ─── Game Operations ─────────────────────────────────────────

    /// Get all games for a user, ordered by name.
    pub async fn list_games(&self, token: &str, user_id: Uuid) -> Result<Vec<Game>, AppError> {
        let url = format!(
            "{}?user_id=eq.{}&order=name.asc",
            self.table_url(tables::GAMES)?,
            user_id
        );
        self.get_rows(&url, token).await
    }

    /// Get a single game owned by the user.
    pub async fn get_game(
        &self,
        token: &str,
        user_id: Uuid,
        game_id: i64,
    ) -> Result<Option<Game>, AppError> {
        let url = format!(
            "{}?id=eq.{}&user_id=eq.{}&limit=1",
            self.table_url(tables::GAMES)?,
            game_id,
            user_id
        );
        let rows: Vec<Game> = self.get_rows(&url, token).await?;
        Ok(rows.into_iter().next())
    }

    /// Most recently touched games, for the dashboard. Rows never edited
    /// (null `updated_at`) sort after edited ones, then by creation date.
    pub async fn recent_games(
        &self,
        token: &str,
        user_id: Uuid,
        limit: u32,
    ) -> Result<Vec<Game>, AppError> {
        let url = format!(
            "{}?user_id=eq.{}&order=updated_at.desc.nullslast,created_at.desc&limit={}",
            self.table_url(tables::GAMES)?,
            user_id,
            limit
        );
        self.get_rows(&url, token).await
    }

    /// Insert a game row and return it as stored.
    pub async fn insert_game(&self, token: &str, game: &NewGame) -> Result<Game, AppError> {
        let url = self.table_url(tables::GAMES)?;
        self.insert_row(&url, token, game).await
    }

    /// Apply an edit to a game row.
    pub async fn update_game(
        &self,
        token: &str,
        user_id: Uuid,
        game_id: i64,
        update: &GameUpdate,
    ) -> Result<(), AppError> {
        let url = format!(
            "{}?id=eq.{}&user_id=eq.{}",
            self.table_url(tables::GAMES)?,
            game_id,
            user_id
        );
        self.patch_rows(&url, token, update).await
    }

    /// Delete a game row. Challenge rows must be deleted first; the
    /// gateway has no cascade.
    pub async fn delete_game(
        &self,
        token: &str,
        user_id: Uuid,
        game_id: i64,
    ) -> Result<(), AppError> {
        let url = format!(
            "{}?id=eq.{}&user_id=eq.{}",
            self.table_url(tables::GAMES)?,
            game_id,
            user_id
        );
        self.delete_rows(&url, token).await
    }

    /// Exact count of a user's games.
    pub async fn count_games(&self, token: &str, user_id: Uuid) -> Result<u64, AppError> {
        let url = format!(
            "{}?user_id=eq.{}",
            self.table_url(tables::GAMES)?,
            user_id
        );
        self.count_rows(&url, token).await
    }

    // ─── Challenge Operations ────────────────────────────────────

    /// All challenges belonging to a user's games, joined with the parent
    /// game, newest start first.
    pub async fn list_challenges(
        &self,
        token: &str,
        user_id: Uuid,
    ) -> Result<Vec<ChallengeWithGame>, AppError> {
        let url = format!(
            "{}?select=*,games!inner(user_id,name)&games.user_id=eq.{}&order=started_at.desc.nullslast",
            self.table_url(tables::CHALLENGES)?,
            user_id
        );
        self.get_rows(&url, token).await
    }

    /// Challenges attached to one game (used for cascade deletion).
    pub async fn list_challenges_for_game(
        &self,
        token: &str,
        game_id: i64,
    ) -> Result<Vec<Challenge>, AppError> {
        let url = format!(
            "{}?game_id=eq.{}",
            self.table_url(tables::CHALLENGES)?,
            game_id
        );
        self.get_rows(&url, token).await
    }

    /// Get a single challenge joined with its parent game. The join is
    /// how ownership is checked: the row only comes back when the parent
    /// game belongs to `user_id`.
    pub async fn get_challenge(
        &self,
        token: &str,
        user_id: Uuid,
        challenge_id: i64,
    ) -> Result<Option<ChallengeWithGame>, AppError> {
        let url = format!(
            "{}?select=*,games!inner(user_id,name)&id=eq.{}&games.user_id=eq.{}&limit=1",
            self.table_url(tables::CHALLENGES)?,
            challenge_id,
            user_id
        );
        let rows: Vec<ChallengeWithGame> = self.get_rows(&url, token).await?;
        Ok(rows.into_iter().next())
    }

    /// Insert a challenge row and return it as stored.
    pub async fn insert_challenge(
        &self,
        token: &str,
        challenge: &NewChallenge,
    ) -> Result<Challenge, AppError> {
        let url = self.table_url(tables::CHALLENGES)?;
        self.insert_row(&url, token, challenge).await
    }

    /// Apply an edit to a challenge row.
    pub async fn update_challenge(
        &self,
        token: &str,
        challenge_id: i64,
        update: &ChallengeUpdate,
    ) -> Result<(), AppError> {
        let url = format!(
            "{}?id=eq.{}",
            self.table_url(tables::CHALLENGES)?,
            challenge_id
        );
        self.patch_rows(&url, token, update).await
    }

    /// Delete a single challenge row.
    pub async fn delete_challenge(&self, token: &str, challenge_id: i64) -> Result<(), AppError> {
        let url = format!(
            "{}?id=eq.{}",
            self.table_url(tables::CHALLENGES)?,
            challenge_id
        );
        self.delete_rows(&url, token).await
    }

    /// Delete every challenge attached to one game (cascade step).
    pub async fn delete_challenges_for_game(
        &self,
        token: &str,
        game_id: i64,
    ) -> Result<(), AppError> {
        let url = format!(
            "{}?game_id=eq.{}",
            self.table_url(tables::CHALLENGES)?,
            game_id
        );
        self.delete_rows(&url, token).await
    }

    /// Exact count of challenges across a user's games.
    pub async fn count_challenges(&self, token: &str, user_id: Uuid) -> Result<u64, AppError> {
        let url = format!(
            "{}?select=*,games!inner(user_id)&games.user_id=eq.{}",
            self.table_url(tables::CHALLENGES)?,
            user_id
        );
        self.count_rows(&url, token).await
    }

    // ─── Achievement Operations ──────────────────────────────────

    /// Exact count of achievements across a user's games.
    pub async fn count_achievements(&self, token: &str, user_id: Uuid) -> Result<u64, AppError> {
        let url = format!(
            "{}?select=*,games!inner(user_id)&games.user_id=eq.{}",
            self.table_url(tables::ACHIEVEMENTS)?,
            user_id
        );
        self.count_rows(&url, token).await
    }

    // ─── Profile Operations ──────────────────────────────────────

    /// Get a user's profile row.
    pub async fn get_profile(
        &self,
        token: &str,
        user_id: Uuid,
    ) -> Result<Option<UserProfile>, AppError> {
        let url = format!(
            "{}?user_id=eq.{}&limit=1",
            self.table_url(tables::PROFILES)?,
            user_id
        );
        let rows: Vec<UserProfile> = self.get_rows(&url, token).await?;
        Ok(rows.into_iter().next())
    }

    /// Create the lazily-initialized profile row on first sign-in.
    pub async fn insert_profile(
        &self,
        token: &str,
        profile: &NewProfile,
    ) -> Result<UserProfile, AppError> {
        let url = self.table_url(tables::PROFILES)?;
        self.insert_row(&url, token, profile).await
    }

    /// Refresh `last_login` on sign-in.
    pub async fn update_last_login(
        &self,
        token: &str,
        user_id: Uuid,
        when: &str,
    ) -> Result<(), AppError> {
        let url = format!(
            "{}?user_id=eq.{}",
            self.table_url(tables::PROFILES)?,
            user_id
        );
        self.patch_rows(&url, token, &serde_json::json!({ "last_login": when }))
            .await
    }

    /// Update the profile display name.
    pub async fn update_profile_name(
        &self,
        token: &str,
        user_id: Uuid,
        name: &str,
    ) -> Result<(), AppError> {
        let url = format!(
            "{}?user_id=eq.{}",
            self.table_url(tables::PROFILES)?,
            user_id
        );
        self.patch_rows(&url, token, &serde_json::json!({ "name": name }))
            .await
    }

    /// Point the profile at a freshly uploaded photo.
    pub async fn set_profile_photo(
        &self,
        token: &str,
        user_id: Uuid,
        photo_url: &str,
    ) -> Result<(), AppError> {
        let url = format!(
            "{}?user_id=eq.{}",
            self.table_url(tables::PROFILES)?,
            user_id
        );
        self.patch_rows(&url, token, &serde_json::json!({ "photo_url": photo_url }))
            .await
    }

    // ─── XP RPC ──────────────────────────────────────────────────

    /// Atomically adjust a profile's XP through the gateway's stored
    /// procedure. Treated as a black box returning success/error.
    pub async fn update_user_xp(
        &self,
        token: &str,
        user_id: Uuid,
        xp_delta: i32,
    ) -> Result<(), AppError> {
        let inner = self.get_inner()?;
        let url = format!("{}/rest/v1/rpc/update_user_xp", inner.base_url);

        let response = inner
            .http
            .post(&url)
            .header("apikey", &inner.api_key)
            .bearer_auth(token)
            .json(&serde_json::json!({ "user_id": user_id, "xp_delta": xp_delta }))
            .send()
            .await
            .map_err(|e| AppError::Gateway(e.to_string()))?;

        Self::check_response(response).await
    }

    // ─── Request Helpers ─────────────────────────────────────────

    /// GET a filtered row set and map it to typed records.
    async fn get_rows<T: DeserializeOwned>(
        &self,
        url: &str,
        token: &str,
    ) -> Result<Vec<T>, AppError> {
        let inner = self.get_inner()?;

        let response = inner
            .http
            .get(url)
            .header("apikey", &inner.api_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AppError::Gateway(e.to_string()))?;

        Self::check_response_json(response).await
    }

    /// POST a single row, asking the gateway to echo the stored
    /// representation back (IDs and defaults filled in).
    async fn insert_row<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        token: &str,
        body: &B,
    ) -> Result<T, AppError> {
        let inner = self.get_inner()?;

        let response = inner
            .http
            .post(url)
            .header("apikey", &inner.api_key)
            .header("Prefer", "return=representation")
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Gateway(e.to_string()))?;

        let mut rows: Vec<T> = Self::check_response_json(response).await?;
        if rows.is_empty() {
            return Err(AppError::Gateway(
                "Insert returned no representation".to_string(),
            ));
        }
        Ok(rows.remove(0))
    }

    /// PATCH the rows matched by the URL's filters.
    async fn patch_rows<B: Serialize>(
        &self,
        url: &str,
        token: &str,
        body: &B,
    ) -> Result<(), AppError> {
        let inner = self.get_inner()?;

        let response = inner
            .http
            .patch(url)
            .header("apikey", &inner.api_key)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Gateway(e.to_string()))?;

        Self::check_response(response).await
    }

    /// DELETE the rows matched by the URL's filters.
    async fn delete_rows(&self, url: &str, token: &str) -> Result<(), AppError> {
        let inner = self.get_inner()?;

        let response = inner
            .http
            .delete(url)
            .header("apikey", &inner.api_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AppError::Gateway(e.to_string()))?;

        Self::check_response(response).await
    }

    /// HEAD request with an exact-count preference; the total comes back
    /// in the `content-range` header as `"<range>/<total>"`.
    async fn count_rows(&self, url: &str, token: &str) -> Result<u64, AppError> {
        let inner = self.get_inner()?;

        let response = inner
            .http
            .head(url)
            .header("apikey", &inner.api_key)
            .header("Prefer", "count=exact")
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AppError::Gateway(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::Gateway(format!(
                "Count request failed: HTTP {}",
                response.status()
            )));
        }

        let content_range = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Gateway("Count response missing content-range".to_string()))?;

        parse_content_range_total(content_range)
            .ok_or_else(|| AppError::Gateway(format!("Unparseable content-range: {content_range}")))
    }

    /// Check response status and return an error if not successful.
    async fn check_response(response: reqwest::Response) -> Result<(), AppError> {
        if response.status().is_success() {
            return Ok(());
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(AppError::Gateway(format!("HTTP {}: {}", status, body)))
    }

    /// Check response status and parse the JSON body.
    async fn check_response_json<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Gateway(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("JSON parse error: {}", e)))
    }
}

/// Extract the total from a `content-range` value like `0-24/57` or `*/57`.
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit('/').next()?.trim().parse().ok()
}

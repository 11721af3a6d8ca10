// SPDX-License-Identifier: MIT

//! Game library routes.
//!
//! The listing fetches the user's rows once and shapes them with the
//! catalog view-model (status filter, search, sort, derived display
//! fields). Deletion cascades: a game's challenges are removed first,
//! with XP compensation for any that were completed.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Game, GameStatus, GameUpdate, NewGame};
use crate::services::challenges::xp_delta_for_delete;
use crate::services::library::{
    self, filter_by_search, filter_by_status, format_playtime, sort_games, status_color, SortMode,
};
use crate::services::metadata::MetadataGame;
use crate::time_utils::{format_form_datetime, now_rfc3339, parse_form_datetime, to_stored};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/games", get(list_games).post(create_game))
        .route(
            "/api/games/{id}",
            get(get_game).put(update_game).delete(delete_game),
        )
}

// ─── Listing ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct ListGamesQuery {
    /// Status label filter; "all" (the default) passes everything
    #[serde(default = "default_status_filter")]
    status: String,
    /// Sort mode: name | recent | playtime
    #[serde(default)]
    sort: Option<String>,
    /// Free-text search; terms under 3 characters are ignored
    #[serde(default)]
    search: String,
}

fn default_status_filter() -> String {
    "all".to_string()
}

/// Library entry shaped for display.
#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GameSummary {
    pub id: i64,
    pub name: String,
    pub cover_url: Option<String>,
    pub status: String,
    pub status_color: String,
    /// Raw `"HH:MM:SS"` playtime
    pub playtime: Option<String>,
    /// Rounded whole hours for the badge ("0" when unplayed)
    pub playtime_hours: String,
    pub updated_at: Option<String>,
}

impl GameSummary {
    fn from_game(game: Game) -> Self {
        Self {
            id: game.id,
            name: game.name,
            cover_url: game.cover_url,
            status: game.status.label().to_string(),
            status_color: status_color(game.status).to_string(),
            playtime_hours: format_playtime(game.playtime.as_deref()),
            playtime: game.playtime,
            updated_at: game.updated_at,
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GamesResponse {
    pub games: Vec<GameSummary>,
    pub total: u32,
}

/// List the user's library, filtered and sorted client-side style.
async fn list_games(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ListGamesQuery>,
) -> Result<Json<GamesResponse>> {
    let sort = match params.sort.as_deref() {
        None => SortMode::default(),
        Some(raw) => SortMode::from_param(raw).ok_or_else(|| {
            AppError::BadRequest(format!("Unknown sort mode: {}", raw))
        })?,
    };

    tracing::debug!(
        user_id = %user.user_id,
        status = %params.status,
        search = %params.search,
        "Fetching library"
    );

    let rows = state.db.list_games(&user.token, user.user_id).await?;

    let filtered = filter_by_search(
        filter_by_status(rows, &params.status),
        &params.search,
    );
    let mut games = filtered;
    sort_games(&mut games, sort);

    let summaries: Vec<GameSummary> = games.into_iter().map(GameSummary::from_game).collect();

    Ok(Json(GamesResponse {
        total: summaries.len() as u32,
        games: summaries,
    }))
}

// ─── Detail ──────────────────────────────────────────────────

/// Full game record for the detail page.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GameDetailResponse {
    pub id: i64,
    pub name: String,
    pub cover_url: Option<String>,
    pub status: String,
    pub status_color: String,
    pub playtime: Option<String>,
    pub playtime_hours: String,
    pub developer: Option<String>,
    pub publisher: Option<String>,
    pub release_year: Option<i32>,
    pub genres: Option<String>,
    pub themes: Option<String>,
    pub platforms: Option<String>,
    pub rating: Option<f32>,
    pub platform_played: Option<String>,
    /// `dd/MM/yyyy HH:mm` display values
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    pub personal_rating: Option<i32>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl GameDetailResponse {
    fn from_game(game: Game) -> Self {
        Self {
            id: game.id,
            status: game.status.label().to_string(),
            status_color: status_color(game.status).to_string(),
            playtime_hours: format_playtime(game.playtime.as_deref()),
            started_at: game.started_at.as_deref().and_then(format_form_datetime),
            finished_at: game.finished_at.as_deref().and_then(format_form_datetime),
            name: game.name,
            cover_url: game.cover_url,
            playtime: game.playtime,
            developer: game.developer,
            publisher: game.publisher,
            release_year: game.release_year,
            genres: game.genres,
            themes: game.themes,
            platforms: game.platforms,
            rating: game.rating,
            platform_played: game.platform_played,
            personal_rating: game.personal_rating,
            created_at: game.created_at,
            updated_at: game.updated_at,
        }
    }
}

/// Get one game.
async fn get_game(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<GameDetailResponse>> {
    let game = state
        .db
        .get_game(&user.token, user.user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Game {} not found", id)))?;

    Ok(Json(GameDetailResponse::from_game(game)))
}

// ─── Creation ────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct CreateGamePayload {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(url)]
    pub cover_url: Option<String>,
    /// Status label; defaults to Queued
    pub status: Option<String>,
    /// `"HH:MM:SS"`
    pub playtime: Option<String>,
    /// Metadata service record to pre-fill descriptive fields from
    pub metadata_id: Option<u64>,
}

/// Create a game, optionally enriched from the metadata service.
async fn create_game(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateGamePayload>,
) -> Result<Json<GameDetailResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let status = parse_status(payload.status.as_deref())?.unwrap_or(GameStatus::Queued);
    let playtime = validate_playtime(payload.playtime)?;

    let mut new_game = NewGame {
        user_id: user.user_id,
        name: payload.name,
        cover_url: payload.cover_url,
        status,
        playtime,
        developer: None,
        publisher: None,
        release_year: None,
        genres: None,
        themes: None,
        platforms: None,
        rating: None,
    };

    // Metadata enrichment is best-effort: a catalog outage should not
    // block adding a game by hand.
    if let Some(metadata_id) = payload.metadata_id {
        match state.metadata.get_game(metadata_id).await {
            Ok(Some(meta)) => {
                if new_game.cover_url.is_none() {
                    new_game.cover_url = meta.cover_url();
                }
                new_game.release_year = meta.release_year();
                new_game.rating = meta.total_rating.map(|r| r as f32);
                new_game.genres = MetadataGame::joined_names(&meta.genres);
                new_game.themes = MetadataGame::joined_names(&meta.themes);
                new_game.platforms = MetadataGame::joined_names(&meta.platforms);
                new_game.developer = meta.developer();
                new_game.publisher = meta.publisher();
            }
            Ok(None) => {
                tracing::warn!(metadata_id, "Metadata record not found");
            }
            Err(e) => {
                tracing::warn!(error = %e, metadata_id, "Metadata lookup failed");
            }
        }
    }

    let game = state.db.insert_game(&user.token, &new_game).await?;

    tracing::info!(user_id = %user.user_id, game_id = game.id, "Game added to library");

    Ok(Json(GameDetailResponse::from_game(game)))
}

// ─── Editing ─────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct UpdateGamePayload {
    /// Status label (required; the edit form always submits it)
    pub status: String,
    pub playtime: Option<String>,
    #[validate(length(max = 100))]
    pub platform_played: Option<String>,
    /// `dd/MM/yyyy HH:mm`
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    #[validate(range(min = 0, max = 10))]
    pub personal_rating: Option<i32>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UpdateResponse {
    pub success: bool,
}

/// Apply the edit form to a game.
async fn update_game(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateGamePayload>,
) -> Result<Json<UpdateResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    // The row must exist (and be the caller's) before patching.
    state
        .db
        .get_game(&user.token, user.user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Game {} not found", id)))?;

    let status = GameStatus::from_label(&payload.status)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown status: {}", payload.status)))?;

    let update = GameUpdate {
        status,
        playtime: validate_playtime(payload.playtime)?,
        platform_played: payload.platform_played,
        started_at: parse_form_date_field(payload.started_at.as_deref(), "started_at")?,
        finished_at: parse_form_date_field(payload.finished_at.as_deref(), "finished_at")?,
        personal_rating: payload.personal_rating,
        updated_at: now_rfc3339(),
    };

    state
        .db
        .update_game(&user.token, user.user_id, id, &update)
        .await?;

    Ok(Json(UpdateResponse { success: true }))
}

// ─── Deletion ────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteGameResponse {
    pub success: bool,
    /// Challenges removed alongside the game
    pub challenges_deleted: u32,
    /// Set when a non-fatal XP adjustment failed
    pub warning: Option<String>,
}

/// Delete a game and cascade to its challenges.
///
/// Completed challenges give back their XP before the rows go away, the
/// same compensation a direct challenge delete applies.
async fn delete_game(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteGameResponse>> {
    state
        .db
        .get_game(&user.token, user.user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Game {} not found", id)))?;

    let challenges = state.db.list_challenges_for_game(&user.token, id).await?;
    let challenge_count = challenges.len() as u32;

    let xp_delta: i32 = challenges
        .iter()
        .map(|c| xp_delta_for_delete(c.status))
        .sum();

    let mut warning = None;
    if xp_delta != 0 {
        if let Err(e) = state
            .db
            .update_user_xp(&user.token, user.user_id, xp_delta)
            .await
        {
            tracing::warn!(error = %e, xp_delta, "XP compensation failed during cascade delete");
            warning = Some("Game deleted, but the XP adjustment failed".to_string());
        }
    }

    if challenge_count > 0 {
        state
            .db
            .delete_challenges_for_game(&user.token, id)
            .await?;
    }
    state.db.delete_game(&user.token, user.user_id, id).await?;

    tracing::info!(
        user_id = %user.user_id,
        game_id = id,
        challenges_deleted = challenge_count,
        "Game deleted"
    );

    Ok(Json(DeleteGameResponse {
        success: true,
        challenges_deleted: challenge_count,
        warning,
    }))
}

// ─── Helpers ─────────────────────────────────────────────────

fn parse_status(label: Option<&str>) -> Result<Option<GameStatus>> {
    label
        .map(|raw| {
            GameStatus::from_label(raw)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown status: {}", raw)))
        })
        .transpose()
}

/// Require `"HH:MM:SS"` shape when playtime is present.
fn validate_playtime(playtime: Option<String>) -> Result<Option<String>> {
    match playtime {
        Some(raw) if !raw.trim().is_empty() => {
            if library::playtime_seconds(&raw).is_none() {
                return Err(AppError::BadRequest(format!(
                    "Invalid playtime (expected HH:MM:SS): {}",
                    raw
                )));
            }
            Ok(Some(raw))
        }
        _ => Ok(None),
    }
}

/// Convert an optional `dd/MM/yyyy HH:mm` form value to storage form.
fn parse_form_date_field(value: Option<&str>, field: &str) -> Result<Option<String>> {
    match value {
        Some(raw) if !raw.trim().is_empty() => {
            let parsed = parse_form_datetime(raw).ok_or_else(|| {
                AppError::BadRequest(format!(
                    "Invalid {} (expected dd/MM/yyyy HH:mm): {}",
                    field, raw
                ))
            })?;
            Ok(Some(to_stored(parsed)))
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_playtime() {
        assert_eq!(
            validate_playtime(Some("10:30:00".to_string())).unwrap(),
            Some("10:30:00".to_string())
        );
        assert_eq!(validate_playtime(Some("  ".to_string())).unwrap(), None);
        assert_eq!(validate_playtime(None).unwrap(), None);
        assert!(validate_playtime(Some("ten hours".to_string())).is_err());
        assert!(validate_playtime(Some("10:99:00".to_string())).is_err());
    }

    #[test]
    fn test_parse_form_date_field() {
        assert_eq!(
            parse_form_date_field(Some("15/03/2024 14:00"), "started_at").unwrap(),
            Some("2024-03-15T14:00:00-03:00".to_string())
        );
        assert_eq!(parse_form_date_field(None, "started_at").unwrap(), None);
        assert!(parse_form_date_field(Some("2024-03-15"), "started_at").is_err());
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(
            parse_status(Some("playing")).unwrap(),
            Some(GameStatus::Playing)
        );
        assert_eq!(parse_status(None).unwrap(), None);
        assert!(parse_status(Some("backlogged")).is_err());
    }
}

// SPDX-License-Identifier: MIT

//! Challenge routes.
//!
//! Saving a challenge can carry an XP side effect: the transition into
//! Completed awards +5 through the gateway RPC, and deleting a completed
//! challenge gives the 5 back. The XP call is never allowed to fail the
//! primary operation; a failure degrades to a warning on the response.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{
    ChallengeStatus, ChallengeUpdate, ChallengeWithGame, Difficulty, NewChallenge,
};
use crate::services::challenges::{
    difficulty_color, filter_challenges, status_color, xp_delta_for_delete, xp_delta_for_save,
};
use crate::time_utils::{format_form_datetime, parse_form_datetime, to_stored};
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
        .route("/api/challenges", get(list_challenges).post(create_challenge))
        .route(
            "/api/challenges/{id}",
            get(get_challenge).put(update_challenge).delete(delete_challenge),
        )
}

// ─── Listing ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct ListChallengesQuery {
    /// Status label filter (exact label, case-insensitive)
    #[serde(default)]
    status: Option<String>,
    /// Difficulty label filter
    #[serde(default)]
    difficulty: Option<String>,
    /// Matches challenge name or parent game name
    #[serde(default)]
    search: String,
}

/// Challenge shaped for display, joined with its parent game.
#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ChallengeSummary {
    pub id: i64,
    pub game_id: i64,
    pub game_name: String,
    pub name: String,
    pub description: Option<String>,
    pub difficulty: Option<String>,
    pub difficulty_color: String,
    pub reward: Option<String>,
    pub completion_pct: i32,
    pub status: String,
    pub status_color: String,
    /// `dd/MM/yyyy HH:mm` display values
    pub started_at: Option<String>,
    pub ends_at: Option<String>,
}

impl ChallengeSummary {
    fn from_row(row: ChallengeWithGame) -> Self {
        let challenge = row.challenge;
        Self {
            id: challenge.id,
            game_id: challenge.game_id,
            game_name: row.game.name,
            difficulty: challenge.difficulty.map(|d| d.label().to_string()),
            difficulty_color: difficulty_color(challenge.difficulty).to_string(),
            status: challenge.status.label().to_string(),
            status_color: status_color(challenge.status).to_string(),
            started_at: challenge.started_at.as_deref().and_then(format_form_datetime),
            ends_at: challenge.ends_at.as_deref().and_then(format_form_datetime),
            name: challenge.name,
            description: challenge.description,
            reward: challenge.reward,
            completion_pct: challenge.completion_pct,
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ChallengesResponse {
    pub challenges: Vec<ChallengeSummary>,
    pub total: u32,
}

/// List the user's challenges with conjunctive filters.
async fn list_challenges(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ListChallengesQuery>,
) -> Result<Json<ChallengesResponse>> {
    let status = parse_status_filter(params.status.as_deref())?;
    let difficulty = parse_difficulty_filter(params.difficulty.as_deref())?;

    tracing::debug!(
        user_id = %user.user_id,
        status = ?status,
        difficulty = ?difficulty,
        search = %params.search,
        "Fetching challenges"
    );

    let rows = state.db.list_challenges(&user.token, user.user_id).await?;
    let filtered = filter_challenges(rows, status, difficulty, &params.search);

    let summaries: Vec<ChallengeSummary> =
        filtered.into_iter().map(ChallengeSummary::from_row).collect();

    Ok(Json(ChallengesResponse {
        total: summaries.len() as u32,
        challenges: summaries,
    }))
}

/// Get one challenge.
async fn get_challenge(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<ChallengeSummary>> {
    let row = state
        .db
        .get_challenge(&user.token, user.user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Challenge {} not found", id)))?;

    Ok(Json(ChallengeSummary::from_row(row)))
}

// ─── Creation / Editing ──────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct ChallengePayload {
    pub game_id: i64,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    /// Difficulty label
    pub difficulty: Option<String>,
    #[validate(length(max = 200))]
    pub reward: Option<String>,
    /// Clamped to [0,100] at this boundary; the store does not enforce it
    #[validate(range(min = 0, max = 100))]
    #[serde(default)]
    pub completion_pct: i32,
    /// Status label; defaults to Not Started
    pub status: Option<String>,
    /// `dd/MM/yyyy HH:mm`
    pub started_at: Option<String>,
    pub ends_at: Option<String>,
}

/// Result of a create/update, with the non-fatal XP warning channel.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SaveChallengeResponse {
    pub id: i64,
    pub success: bool,
    /// XP awarded by this save (0 or +5)
    pub xp_awarded: i32,
    /// Set when the save succeeded but the XP adjustment failed
    pub warning: Option<String>,
}

/// Create a challenge. Creating one already marked Completed counts as
/// the completion edge and awards XP.
async fn create_challenge(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<ChallengePayload>,
) -> Result<Json<SaveChallengeResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let fields = ChallengeFields::parse(&payload)?;

    // The parent game must exist and belong to the caller.
    state
        .db
        .get_game(&user.token, user.user_id, payload.game_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Game {} not found", payload.game_id)))?;

    let new_challenge = NewChallenge {
        game_id: payload.game_id,
        name: payload.name.clone(),
        description: payload.description.clone(),
        difficulty: fields.difficulty,
        reward: payload.reward.clone(),
        completion_pct: payload.completion_pct,
        status: fields.status,
        started_at: fields.started_at,
        ends_at: fields.ends_at,
    };

    let challenge = state.db.insert_challenge(&user.token, &new_challenge).await?;

    let delta = xp_delta_for_save(None, fields.status);
    let (xp_awarded, warning) = apply_xp(&state, &user, delta).await;

    tracing::info!(
        user_id = %user.user_id,
        challenge_id = challenge.id,
        xp_awarded,
        "Challenge created"
    );

    Ok(Json(SaveChallengeResponse {
        id: challenge.id,
        success: true,
        xp_awarded,
        warning,
    }))
}

/// Update a challenge. XP is awarded only on the edge into Completed;
/// re-saving an already-completed challenge awards nothing.
async fn update_challenge(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(payload): Json<ChallengePayload>,
) -> Result<Json<SaveChallengeResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let fields = ChallengeFields::parse(&payload)?;

    let existing = state
        .db
        .get_challenge(&user.token, user.user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Challenge {} not found", id)))?;
    let previous_status = existing.challenge.status;

    // Re-parenting is allowed, but only onto the caller's own game.
    if payload.game_id != existing.challenge.game_id {
        state
            .db
            .get_game(&user.token, user.user_id, payload.game_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Game {} not found", payload.game_id)))?;
    }

    let update = ChallengeUpdate {
        game_id: payload.game_id,
        name: payload.name.clone(),
        description: payload.description.clone(),
        difficulty: fields.difficulty,
        reward: payload.reward.clone(),
        completion_pct: payload.completion_pct,
        status: fields.status,
        started_at: fields.started_at,
        ends_at: fields.ends_at,
    };

    state.db.update_challenge(&user.token, id, &update).await?;

    let delta = xp_delta_for_save(Some(previous_status), fields.status);
    let (xp_awarded, warning) = apply_xp(&state, &user, delta).await;

    Ok(Json(SaveChallengeResponse {
        id,
        success: true,
        xp_awarded,
        warning,
    }))
}

// ─── Deletion ────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteChallengeResponse {
    pub success: bool,
    pub warning: Option<String>,
}

/// Delete a challenge, compensating XP first when it was completed.
async fn delete_challenge(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteChallengeResponse>> {
    let existing = state
        .db
        .get_challenge(&user.token, user.user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Challenge {} not found", id)))?;

    let delta = xp_delta_for_delete(existing.challenge.status);
    let (_, warning) = apply_xp(&state, &user, delta).await;

    state.db.delete_challenge(&user.token, id).await?;

    tracing::info!(user_id = %user.user_id, challenge_id = id, "Challenge deleted");

    Ok(Json(DeleteChallengeResponse {
        success: true,
        warning,
    }))
}

// ─── Helpers ─────────────────────────────────────────────────

/// Parsed enum/date fields shared by create and update.
struct ChallengeFields {
    status: ChallengeStatus,
    difficulty: Option<Difficulty>,
    started_at: Option<String>,
    ends_at: Option<String>,
}

impl ChallengeFields {
    fn parse(payload: &ChallengePayload) -> Result<Self> {
        let status = match payload.status.as_deref() {
            None => ChallengeStatus::NotStarted,
            Some(raw) => ChallengeStatus::from_label(raw)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown status: {}", raw)))?,
        };

        let difficulty = payload
            .difficulty
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| {
                Difficulty::from_label(raw)
                    .ok_or_else(|| AppError::BadRequest(format!("Unknown difficulty: {}", raw)))
            })
            .transpose()?;

        Ok(Self {
            status,
            difficulty,
            started_at: parse_date(payload.started_at.as_deref(), "started_at")?,
            ends_at: parse_date(payload.ends_at.as_deref(), "ends_at")?,
        })
    }
}

fn parse_date(value: Option<&str>, field: &str) -> Result<Option<String>> {
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

fn parse_status_filter(raw: Option<&str>) -> Result<Option<ChallengeStatus>> {
    raw.filter(|s| !s.trim().is_empty())
        .map(|s| {
            ChallengeStatus::from_label(s)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown status: {}", s)))
        })
        .transpose()
}

fn parse_difficulty_filter(raw: Option<&str>) -> Result<Option<Difficulty>> {
    raw.filter(|s| !s.trim().is_empty())
        .map(|s| {
            Difficulty::from_label(s)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown difficulty: {}", s)))
        })
        .transpose()
}

/// Apply an XP delta through the gateway RPC. Failures are non-fatal:
/// the primary operation already succeeded, so the error becomes a
/// warning on the response.
async fn apply_xp(state: &Arc<AppState>, user: &AuthUser, delta: i32) -> (i32, Option<String>) {
    if delta == 0 {
        return (0, None);
    }

    match state
        .db
        .update_user_xp(&user.token, user.user_id, delta)
        .await
    {
        Ok(()) => (delta, None),
        Err(e) => {
            tracing::warn!(error = %e, delta, user_id = %user.user_id, "XP adjustment failed");
            (0, Some("Saved, but the XP adjustment failed".to_string()))
        }
    }
}

// SPDX-License-Identifier: MIT

//! Dashboard route: aggregate counts, recent games, and the user's
//! level/XP header.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Game, GameStatus};
use crate::services::library::{format_playtime, status_color};
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Recent-games strip length.
const RECENT_GAMES_LIMIT: u32 = 10;
/// Active-challenges strip length.
const ACTIVE_CHALLENGES_LIMIT: usize = 10;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/dashboard", get(get_dashboard))
}

/// Recent game entry with its progress label ("Playing - 42h", or just
/// "Queued" for unstarted games).
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RecentGame {
    pub id: i64,
    pub name: String,
    pub cover_url: Option<String>,
    pub progress: String,
    pub status_color: String,
}

impl RecentGame {
    fn from_game(game: Game) -> Self {
        let progress = if game.status == GameStatus::Queued {
            game.status.label().to_string()
        } else {
            format!(
                "{} - {}h",
                game.status.label(),
                format_playtime(game.playtime.as_deref())
            )
        };

        Self {
            id: game.id,
            name: game.name,
            cover_url: game.cover_url,
            status_color: status_color(game.status).to_string(),
            progress,
        }
    }
}

/// Active challenge entry for the dashboard strip.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActiveChallenge {
    pub id: i64,
    pub game_name: String,
    pub name: String,
    pub completion_pct: i32,
    pub difficulty: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DashboardResponse {
    /// First word of the profile display name
    pub first_name: String,
    pub level: i32,
    pub xp: i32,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub games_count: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub challenges_count: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub achievements_count: u64,
    pub recent_games: Vec<RecentGame>,
    pub active_challenges: Vec<ActiveChallenge>,
}

/// Assemble the dashboard. The pieces are independent reads, fetched
/// together.
async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<DashboardResponse>> {
    let token = &user.token;
    let user_id = user.user_id;

    let (profile, recent, challenges, games_count, challenges_count, achievements_count) = tokio::try_join!(
        state.db.get_profile(token, user_id),
        state.db.recent_games(token, user_id, RECENT_GAMES_LIMIT),
        state.db.list_challenges(token, user_id),
        state.db.count_games(token, user_id),
        state.db.count_challenges(token, user_id),
        state.db.count_achievements(token, user_id),
    )?;

    let profile = profile
        .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", user_id)))?;

    let first_name = profile
        .name
        .split_whitespace()
        .next()
        .unwrap_or("Player")
        .to_string();

    let active_challenges: Vec<ActiveChallenge> = challenges
        .into_iter()
        .take(ACTIVE_CHALLENGES_LIMIT)
        .map(|row| ActiveChallenge {
            id: row.challenge.id,
            game_name: row.game.name,
            name: row.challenge.name,
            completion_pct: row.challenge.completion_pct,
            difficulty: row.challenge.difficulty.map(|d| d.label().to_string()),
        })
        .collect();

    Ok(Json(DashboardResponse {
        first_name,
        level: profile.level,
        xp: profile.xp,
        games_count,
        challenges_count,
        achievements_count,
        recent_games: recent.into_iter().map(RecentGame::from_game).collect(),
        active_challenges,
    }))
}

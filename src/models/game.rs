// SPDX-License-Identifier: MIT

//! Game catalog models for storage and API.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Play status of a game in the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Queued,
    Playing,
    Completed,
    Paused,
}

impl GameStatus {
    /// Stored/display label for the status.
    pub fn label(&self) -> &'static str {
        match self {
            GameStatus::Queued => "Queued",
            GameStatus::Playing => "Playing",
            GameStatus::Completed => "Completed",
            GameStatus::Paused => "Paused",
        }
    }

    /// Parse a label case-insensitively.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_lowercase().as_str() {
            "queued" => Some(GameStatus::Queued),
            "playing" => Some(GameStatus::Playing),
            "completed" => Some(GameStatus::Completed),
            "paused" => Some(GameStatus::Paused),
            _ => None,
        }
    }
}

/// Game row as stored in the gateway's `games` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    /// Row ID (gateway-assigned)
    pub id: i64,
    /// Owning user (identity provider ID)
    pub user_id: Uuid,
    /// Display name
    pub name: String,
    /// Cover image URL
    pub cover_url: Option<String>,
    pub status: GameStatus,
    /// Accumulated playtime as `"HH:MM:SS"` text
    pub playtime: Option<String>,

    // Descriptive metadata, optionally filled from the metadata service
    // at creation time.
    pub developer: Option<String>,
    pub publisher: Option<String>,
    pub release_year: Option<i32>,
    /// Comma-separated genre labels
    pub genres: Option<String>,
    /// Comma-separated theme labels
    pub themes: Option<String>,
    /// Comma-separated platform labels
    pub platforms: Option<String>,
    /// Community rating (0–100)
    pub rating: Option<f32>,

    // Per-user play details
    pub platform_played: Option<String>,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    /// Personal score (0–10)
    pub personal_rating: Option<i32>,

    /// When the row was created (RFC3339)
    pub created_at: String,
    /// Last modification (RFC3339, null until first edit)
    pub updated_at: Option<String>,
}

/// Insert payload for a new game row. The gateway assigns `id` and
/// `created_at`.
#[derive(Debug, Clone, Serialize)]
pub struct NewGame {
    pub user_id: Uuid,
    pub name: String,
    pub cover_url: Option<String>,
    pub status: GameStatus,
    pub playtime: Option<String>,
    pub developer: Option<String>,
    pub publisher: Option<String>,
    pub release_year: Option<i32>,
    pub genres: Option<String>,
    pub themes: Option<String>,
    pub platforms: Option<String>,
    pub rating: Option<f32>,
}

/// Edit payload for a game row. The edit form always submits the full
/// editable field set, so absent optionals clear their columns.
#[derive(Debug, Clone, Serialize)]
pub struct GameUpdate {
    pub status: GameStatus,
    pub playtime: Option<String>,
    pub platform_played: Option<String>,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    pub personal_rating: Option<i32>,
    /// Touch timestamp, drives the "recent" sort
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels_round_trip() {
        for status in [
            GameStatus::Queued,
            GameStatus::Playing,
            GameStatus::Completed,
            GameStatus::Paused,
        ] {
            assert_eq!(GameStatus::from_label(status.label()), Some(status));
        }
    }

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!(GameStatus::from_label("PLAYING"), Some(GameStatus::Playing));
        assert_eq!(GameStatus::from_label("queued"), Some(GameStatus::Queued));
        assert_eq!(GameStatus::from_label("shelved"), None);
    }
}

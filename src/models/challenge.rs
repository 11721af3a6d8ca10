// SPDX-License-Identifier: MIT

//! Challenge models for storage and API.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Progress status of a challenge. Transitions are unordered: the UI may
/// set any value at any time, and Completed is not terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChallengeStatus {
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl ChallengeStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ChallengeStatus::NotStarted => "Not Started",
            ChallengeStatus::InProgress => "In Progress",
            ChallengeStatus::Completed => "Completed",
        }
    }

    /// Parse a label case-insensitively (query-string filter values).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_lowercase().as_str() {
            "not started" => Some(ChallengeStatus::NotStarted),
            "in progress" => Some(ChallengeStatus::InProgress),
            "completed" => Some(ChallengeStatus::Completed),
            _ => None,
        }
    }
}

/// Self-assigned difficulty label for a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::Expert => "Expert",
        }
    }

    /// Parse a label case-insensitively (query-string filter values).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            "expert" => Some(Difficulty::Expert),
            _ => None,
        }
    }
}

/// Challenge row as stored in the gateway's `challenges` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    /// Row ID (gateway-assigned)
    pub id: i64,
    /// Parent game row
    pub game_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub difficulty: Option<Difficulty>,
    /// Self-chosen reward label (e.g. "Eternal glory")
    pub reward: Option<String>,
    /// Completion percentage, 0–100
    pub completion_pct: i32,
    pub status: ChallengeStatus,
    /// Start timestamp (RFC3339, UTC−3 offset)
    pub started_at: Option<String>,
    /// Target/completion timestamp (RFC3339, UTC−3 offset)
    pub ends_at: Option<String>,
    pub created_at: String,
}

/// Parent-game fields embedded in a joined challenge listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeGameRef {
    pub user_id: Uuid,
    pub name: String,
}

/// Challenge joined with its parent game, as the listing query returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct ChallengeWithGame {
    #[serde(flatten)]
    pub challenge: Challenge,
    /// Embedded parent game (`games` resource)
    #[serde(rename = "games")]
    pub game: ChallengeGameRef,
}

/// Insert payload for a new challenge row.
#[derive(Debug, Clone, Serialize)]
pub struct NewChallenge {
    pub game_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub reward: Option<String>,
    pub completion_pct: i32,
    pub status: ChallengeStatus,
    pub started_at: Option<String>,
    pub ends_at: Option<String>,
}

/// Edit payload for a challenge row; the form submits the full field set.
#[derive(Debug, Clone, Serialize)]
pub struct ChallengeUpdate {
    pub game_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub reward: Option<String>,
    pub completion_pct: i32,
    pub status: ChallengeStatus,
    pub started_at: Option<String>,
    pub ends_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serde_uses_stored_labels() {
        let json = serde_json::to_string(&ChallengeStatus::NotStarted).unwrap();
        assert_eq!(json, "\"Not Started\"");

        let parsed: ChallengeStatus = serde_json::from_str("\"In Progress\"").unwrap();
        assert_eq!(parsed, ChallengeStatus::InProgress);
    }

    #[test]
    fn test_joined_row_deserializes_embedded_game() {
        let raw = serde_json::json!({
            "id": 7,
            "game_id": 3,
            "name": "Beat the final boss hitless",
            "description": null,
            "difficulty": "Expert",
            "reward": "Eternal glory",
            "completion_pct": 40,
            "status": "In Progress",
            "started_at": "2024-03-15T14:00:00-03:00",
            "ends_at": null,
            "created_at": "2024-03-01T10:00:00Z",
            "games": {
                "user_id": "7f3d7a3e-6a1f-4bf5-9d56-8b6a44c1a111",
                "name": "Hollow Knight"
            }
        });

        let row: ChallengeWithGame = serde_json::from_value(raw).unwrap();
        assert_eq!(row.challenge.id, 7);
        assert_eq!(row.game.name, "Hollow Knight");
        assert_eq!(row.challenge.difficulty, Some(Difficulty::Expert));
    }
}

// SPDX-License-Identifier: MIT

//! Challenge view-model: filtering, derived display fields, and the
//! XP-delta decisions for status transitions.
//!
//! Like the library view-model these are pure functions; the handlers own
//! the gateway calls and apply whatever delta is decided here through the
//! `update_user_xp` RPC.

use crate::models::{ChallengeStatus, ChallengeWithGame, Difficulty};
use crate::services::library::NEUTRAL_COLOR;

/// XP awarded when a challenge transitions into Completed, and reclaimed
/// when a completed challenge is deleted.
pub const COMPLETION_XP: i32 = 5;

/// Conjunctive filter over the joined challenge listing.
///
/// `None` filters pass everything; the search term matches the challenge
/// name or the parent game's name, case-insensitively.
pub fn filter_challenges(
    mut challenges: Vec<ChallengeWithGame>,
    status: Option<ChallengeStatus>,
    difficulty: Option<Difficulty>,
    search: &str,
) -> Vec<ChallengeWithGame> {
    let needle = search.trim().to_lowercase();

    challenges.retain(|row| {
        let matches_status = status.map_or(true, |s| row.challenge.status == s);
        let matches_difficulty = difficulty.map_or(true, |d| row.challenge.difficulty == Some(d));
        let matches_search = needle.is_empty()
            || row.challenge.name.to_lowercase().contains(&needle)
            || row.game.name.to_lowercase().contains(&needle);
        matches_status && matches_difficulty && matches_search
    });
    challenges
}

/// Badge color token for a challenge status.
pub fn status_color(status: ChallengeStatus) -> &'static str {
    match status {
        ChallengeStatus::NotStarted => "#7f8c8d",
        ChallengeStatus::InProgress => "#f39c12",
        ChallengeStatus::Completed => "#2ecc71",
    }
}

/// Badge color token for a difficulty label; missing maps to neutral.
pub fn difficulty_color(difficulty: Option<Difficulty>) -> &'static str {
    match difficulty {
        Some(Difficulty::Easy) => "#2ecc71",
        Some(Difficulty::Medium) => "#f39c12",
        Some(Difficulty::Hard) => "#e74c3c",
        Some(Difficulty::Expert) => "#c0392b",
        None => NEUTRAL_COLOR,
    }
}

/// XP delta for saving a challenge.
///
/// Awards exactly once on the edge into Completed, including creating a
/// challenge already marked Completed (`previous` is `None`). Re-saving a
/// challenge that already was Completed awards nothing, so repeated saves
/// are idempotent.
pub fn xp_delta_for_save(previous: Option<ChallengeStatus>, new: ChallengeStatus) -> i32 {
    if new == ChallengeStatus::Completed && previous != Some(ChallengeStatus::Completed) {
        COMPLETION_XP
    } else {
        0
    }
}

/// Compensating XP delta for deleting a challenge in the given status.
pub fn xp_delta_for_delete(status: ChallengeStatus) -> i32 {
    if status == ChallengeStatus::Completed {
        -COMPLETION_XP
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Challenge, ChallengeGameRef};
    use uuid::Uuid;

    fn make_row(
        id: i64,
        name: &str,
        game_name: &str,
        status: ChallengeStatus,
        difficulty: Option<Difficulty>,
    ) -> ChallengeWithGame {
        ChallengeWithGame {
            challenge: Challenge {
                id,
                game_id: 1,
                name: name.to_string(),
                description: None,
                difficulty,
                reward: None,
                completion_pct: 0,
                status,
                started_at: None,
                ends_at: None,
                created_at: "2024-01-01T00:00:00Z".to_string(),
            },
            game: ChallengeGameRef {
                user_id: Uuid::nil(),
                name: game_name.to_string(),
            },
        }
    }

    #[test]
    fn test_empty_filters_pass_everything() {
        let rows = vec![
            make_row(1, "No-hit run", "Hollow Knight", ChallengeStatus::InProgress, None),
            make_row(2, "All endings", "Nier", ChallengeStatus::Completed, None),
        ];
        let filtered = filter_challenges(rows, None, None, "");
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_filters_are_conjunctive() {
        let rows = vec![
            make_row(
                1,
                "No-hit run",
                "Hollow Knight",
                ChallengeStatus::InProgress,
                Some(Difficulty::Expert),
            ),
            make_row(
                2,
                "Speedrun",
                "Hollow Knight",
                ChallengeStatus::Completed,
                Some(Difficulty::Expert),
            ),
            make_row(
                3,
                "All endings",
                "Nier",
                ChallengeStatus::InProgress,
                Some(Difficulty::Medium),
            ),
        ];

        let filtered = filter_challenges(
            rows,
            Some(ChallengeStatus::InProgress),
            Some(Difficulty::Expert),
            "",
        );
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].challenge.id, 1);
    }

    #[test]
    fn test_search_matches_challenge_or_game_name() {
        let rows = vec![
            make_row(1, "No-hit run", "Hollow Knight", ChallengeStatus::InProgress, None),
            make_row(2, "Hollow victory", "Celeste", ChallengeStatus::InProgress, None),
            make_row(3, "All berries", "Celeste", ChallengeStatus::InProgress, None),
        ];
        let filtered = filter_challenges(rows, None, None, "hollow");
        let ids: Vec<i64> = filtered.iter().map(|r| r.challenge.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_xp_awarded_once_on_completion_edge() {
        // Edit into Completed
        assert_eq!(
            xp_delta_for_save(Some(ChallengeStatus::InProgress), ChallengeStatus::Completed),
            COMPLETION_XP
        );
        // Created already Completed
        assert_eq!(xp_delta_for_save(None, ChallengeStatus::Completed), COMPLETION_XP);
        // Re-saving a completed challenge awards nothing
        assert_eq!(
            xp_delta_for_save(Some(ChallengeStatus::Completed), ChallengeStatus::Completed),
            0
        );
        // Non-completing saves award nothing
        assert_eq!(
            xp_delta_for_save(Some(ChallengeStatus::NotStarted), ChallengeStatus::InProgress),
            0
        );
    }

    #[test]
    fn test_completion_is_revertible_without_delta() {
        // Completed -> InProgress does not subtract; only deletion
        // compensates.
        assert_eq!(
            xp_delta_for_save(Some(ChallengeStatus::Completed), ChallengeStatus::InProgress),
            0
        );
    }

    #[test]
    fn test_delete_compensation() {
        assert_eq!(xp_delta_for_delete(ChallengeStatus::Completed), -COMPLETION_XP);
        assert_eq!(xp_delta_for_delete(ChallengeStatus::InProgress), 0);
        assert_eq!(xp_delta_for_delete(ChallengeStatus::NotStarted), 0);
    }

    #[test]
    fn test_color_maps() {
        assert_eq!(status_color(ChallengeStatus::Completed), "#2ecc71");
        assert_eq!(difficulty_color(Some(Difficulty::Expert)), "#c0392b");
        assert_eq!(difficulty_color(None), NEUTRAL_COLOR);
    }
}

// SPDX-License-Identifier: MIT

//! Catalog view-model: filtering, sorting, and derived display fields for
//! the game library.
//!
//! Pure functions over in-memory lists. A personal collection is small
//! enough that filtering client-side avoids a gateway round trip per
//! keystroke, so the handlers fetch once and shape the rows here.

use crate::models::{Game, GameStatus};
use crate::time_utils::parse_stored;
use std::cmp::Ordering;

/// Minimum search length before the term filters anything; shorter terms
/// would match too much of the catalog to be useful.
const MIN_SEARCH_LEN: usize = 3;

/// Neutral badge color for unknown or missing values.
pub const NEUTRAL_COLOR: &str = "#808080";

/// Sort mode for the library listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    Name,
    Recent,
    Playtime,
}

impl SortMode {
    /// Parse a query-string value.
    pub fn from_param(param: &str) -> Option<Self> {
        match param.to_lowercase().as_str() {
            "name" => Some(SortMode::Name),
            "recent" => Some(SortMode::Recent),
            "playtime" => Some(SortMode::Playtime),
            _ => None,
        }
    }
}

/// Keep the games whose status matches `status` (case-insensitive label).
///
/// `"all"` passes every row unchanged. Unknown labels match nothing.
pub fn filter_by_status(mut games: Vec<Game>, status: &str) -> Vec<Game> {
    if status.eq_ignore_ascii_case("all") {
        return games;
    }
    games.retain(|game| game.status.label().eq_ignore_ascii_case(status));
    games
}

/// Keep the games whose name contains `term`, case-insensitively.
///
/// Terms shorter than three characters are a no-op.
pub fn filter_by_search(mut games: Vec<Game>, term: &str) -> Vec<Game> {
    if term.chars().count() < MIN_SEARCH_LEN {
        return games;
    }
    let needle = term.to_lowercase();
    games.retain(|game| game.name.to_lowercase().contains(&needle));
    games
}

/// Sort the library in place. All modes are stable: rows with equal keys
/// keep their relative order.
pub fn sort_games(games: &mut [Game], mode: SortMode) {
    match mode {
        SortMode::Name => {
            games.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        }
        SortMode::Recent => {
            // Descending by last-modified instant; never-edited rows sort
            // last regardless of direction.
            games.sort_by(|a, b| {
                let a_ts = a.updated_at.as_deref().and_then(parse_stored);
                let b_ts = b.updated_at.as_deref().and_then(parse_stored);
                compare_desc_nulls_last(a_ts, b_ts)
            });
        }
        SortMode::Playtime => {
            games.sort_by(|a, b| {
                let a_secs = a.playtime.as_deref().and_then(playtime_seconds);
                let b_secs = b.playtime.as_deref().and_then(playtime_seconds);
                compare_desc_nulls_last(a_secs, b_secs)
            });
        }
    }
}

/// Descending comparison where `None` always sorts last.
fn compare_desc_nulls_last<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Total seconds in a `"HH:MM:SS"` playtime string.
pub(crate) fn playtime_seconds(playtime: &str) -> Option<u64> {
    let mut parts = playtime.split(':');
    let hours: u64 = parts.next()?.trim().parse().ok()?;
    let minutes: u64 = parts.next()?.trim().parse().ok()?;
    let seconds: u64 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() || minutes >= 60 || seconds >= 60 {
        return None;
    }
    Some(hours * 3600 + minutes * 60 + seconds)
}

/// Whole-hour display string for a `"HH:MM:SS"` playtime value.
///
/// Rounds half away from zero ("01:30:00" displays as 2h). Absent or
/// malformed playtime yields the `"0"` sentinel.
pub fn format_playtime(playtime: Option<&str>) -> String {
    match playtime.and_then(playtime_seconds) {
        Some(total_secs) => {
            let hours = total_secs as f64 / 3600.0;
            format!("{}", hours.round() as u64)
        }
        None => "0".to_string(),
    }
}

/// Badge color token for a game status.
pub fn status_color(status: GameStatus) -> &'static str {
    match status {
        GameStatus::Completed => "#4CAF50",
        GameStatus::Playing => "#6c5ce7",
        GameStatus::Paused => "#FFA500",
        GameStatus::Queued => NEUTRAL_COLOR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn make_game(id: i64, name: &str, status: GameStatus) -> Game {
        Game {
            id,
            user_id: Uuid::nil(),
            name: name.to_string(),
            cover_url: None,
            status,
            playtime: None,
            developer: None,
            publisher: None,
            release_year: None,
            genres: None,
            themes: None,
            platforms: None,
            rating: None,
            platform_played: None,
            started_at: None,
            finished_at: None,
            personal_rating: None,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: None,
        }
    }

    fn names(games: &[Game]) -> Vec<&str> {
        games.iter().map(|g| g.name.as_str()).collect()
    }

    #[test]
    fn test_filter_all_is_identity() {
        let games = vec![
            make_game(1, "Zelda", GameStatus::Playing),
            make_game(2, "Celeste", GameStatus::Completed),
            make_game(3, "Hades", GameStatus::Queued),
        ];
        let filtered = filter_by_status(games.clone(), "all");
        assert_eq!(names(&filtered), names(&games));
    }

    #[test]
    fn test_filter_by_status_is_case_insensitive() {
        let games = vec![
            make_game(1, "Zelda", GameStatus::Playing),
            make_game(2, "Celeste", GameStatus::Completed),
        ];
        let filtered = filter_by_status(games, "completed");
        assert_eq!(names(&filtered), vec!["Celeste"]);
    }

    #[test]
    fn test_filter_by_unknown_status_matches_nothing() {
        let games = vec![make_game(1, "Zelda", GameStatus::Playing)];
        assert!(filter_by_status(games, "shelved").is_empty());
    }

    #[test]
    fn test_short_search_terms_are_a_no_op() {
        let games = vec![
            make_game(1, "Zelda", GameStatus::Playing),
            make_game(2, "Celeste", GameStatus::Completed),
        ];
        for term in ["", "z", "ze"] {
            assert_eq!(filter_by_search(games.clone(), term).len(), 2);
        }
    }

    #[test]
    fn test_search_matches_substring_case_insensitively() {
        let games = vec![
            make_game(1, "Alan Wake", GameStatus::Playing),
            make_game(2, "Celeste", GameStatus::Completed),
            make_game(3, "The Awakening", GameStatus::Queued),
        ];
        let filtered = filter_by_search(games, "wak");
        assert_eq!(names(&filtered), vec!["Alan Wake", "The Awakening"]);
    }

    #[test]
    fn test_sort_by_name() {
        let mut games = vec![
            make_game(1, "Zelda", GameStatus::Playing),
            make_game(2, "Alan Wake", GameStatus::Playing),
            make_game(3, "Celeste", GameStatus::Playing),
        ];
        sort_games(&mut games, SortMode::Name);
        assert_eq!(names(&games), vec!["Alan Wake", "Celeste", "Zelda"]);
    }

    #[test]
    fn test_sort_recent_puts_null_timestamps_last() {
        let mut games = vec![
            make_game(1, "Untouched", GameStatus::Queued),
            make_game(2, "January", GameStatus::Playing),
            make_game(3, "June", GameStatus::Playing),
        ];
        games[1].updated_at = Some("2024-01-01T00:00:00Z".to_string());
        games[2].updated_at = Some("2024-06-01T00:00:00Z".to_string());

        sort_games(&mut games, SortMode::Recent);
        assert_eq!(names(&games), vec!["June", "January", "Untouched"]);
    }

    #[test]
    fn test_sort_playtime_descending_missing_last() {
        let mut games = vec![
            make_game(1, "Short", GameStatus::Playing),
            make_game(2, "Unplayed", GameStatus::Queued),
            make_game(3, "Long", GameStatus::Playing),
        ];
        games[0].playtime = Some("02:15:00".to_string());
        games[2].playtime = Some("120:00:00".to_string());

        sort_games(&mut games, SortMode::Playtime);
        assert_eq!(names(&games), vec!["Long", "Short", "Unplayed"]);
    }

    #[test]
    fn test_sort_is_stable_on_ties() {
        let mut games = vec![
            make_game(1, "First", GameStatus::Playing),
            make_game(2, "Second", GameStatus::Playing),
            make_game(3, "Third", GameStatus::Playing),
        ];
        for game in &mut games {
            game.playtime = Some("10:00:00".to_string());
        }
        sort_games(&mut games, SortMode::Playtime);
        assert_eq!(names(&games), vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_format_playtime_rounds_half_up() {
        assert_eq!(format_playtime(Some("01:30:00")), "2");
        assert_eq!(format_playtime(Some("01:29:59")), "1");
        assert_eq!(format_playtime(Some("00:00:00")), "0");
        assert_eq!(format_playtime(Some("120:45:00")), "121");
    }

    #[test]
    fn test_format_playtime_sentinel() {
        assert_eq!(format_playtime(None), "0");
        assert_eq!(format_playtime(Some("not a duration")), "0");
    }

    #[test]
    fn test_status_colors() {
        assert_eq!(status_color(GameStatus::Completed), "#4CAF50");
        assert_eq!(status_color(GameStatus::Queued), NEUTRAL_COLOR);
    }

    #[test]
    fn test_sort_mode_parsing() {
        assert_eq!(SortMode::from_param("Recent"), Some(SortMode::Recent));
        assert_eq!(SortMode::from_param("alphabetical"), None);
    }
}

// SPDX-License-Identifier: MIT

//! Shared helpers for date/time formatting.
//!
//! Form dates are entered as `dd/MM/yyyy HH:mm` wall-clock time in the
//! fixed São Paulo offset (UTC−3) and stored as RFC3339 with an explicit
//! `-03:00` offset. Display formatting converts whatever offset was stored
//! back to UTC−3, so a submitted value reloads unchanged.

use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat, Utc};

const FORM_FORMAT: &str = "%d/%m/%Y %H:%M";
const SAO_PAULO_OFFSET_SECS: i32 = 3 * 3600;

/// The fixed UTC−3 offset used for all form timestamps.
pub fn sao_paulo_offset() -> FixedOffset {
    FixedOffset::west_opt(SAO_PAULO_OFFSET_SECS).expect("valid fixed offset")
}

/// Parse a `dd/MM/yyyy HH:mm` form value into an offset-aware timestamp.
pub fn parse_form_datetime(input: &str) -> Option<DateTime<FixedOffset>> {
    let naive = NaiveDateTime::parse_from_str(input.trim(), FORM_FORMAT).ok()?;
    naive.and_local_timezone(sao_paulo_offset()).single()
}

/// Serialize an offset-aware timestamp for the gateway (RFC3339, `-03:00`).
pub fn to_stored(date: DateTime<FixedOffset>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Parse a stored RFC3339 timestamp, keeping its offset.
pub fn parse_stored(stored: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(stored).ok()
}

/// Format a stored RFC3339 timestamp for form display (`dd/MM/yyyy HH:mm`
/// in UTC−3). Returns `None` when the stored value does not parse.
pub fn format_form_datetime(stored: &str) -> Option<String> {
    let date = parse_stored(stored)?;
    Some(
        date.with_timezone(&sao_paulo_offset())
            .format(FORM_FORMAT)
            .to_string(),
    )
}

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current time as the gateway stores it.
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_round_trip() {
        let parsed = parse_form_datetime("15/03/2024 14:00").unwrap();
        let stored = to_stored(parsed);
        assert_eq!(stored, "2024-03-15T14:00:00-03:00");
        assert_eq!(
            format_form_datetime(&stored).unwrap(),
            "15/03/2024 14:00"
        );
    }

    #[test]
    fn test_display_converts_utc_to_sao_paulo() {
        // 17:00Z is 14:00 at UTC−3
        assert_eq!(
            format_form_datetime("2024-03-15T17:00:00Z").unwrap(),
            "15/03/2024 14:00"
        );
    }

    #[test]
    fn test_rejects_malformed_input() {
        assert!(parse_form_datetime("2024-03-15 14:00").is_none());
        assert!(parse_form_datetime("31/02/2024 10:00").is_none());
        assert!(format_form_datetime("not-a-date").is_none());
    }
}

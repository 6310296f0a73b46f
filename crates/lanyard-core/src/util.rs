//! Shared utility functions used across multiple modules.

use chrono::{DateTime, SubsecRound, Utc};
use reqwest::StatusCode;
use serde::Deserialize;

/// Normalize optional text by trimming whitespace and removing empties.
///
/// Returns `None` when the input is `None` or the trimmed value is empty.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Check if a string starts with `http://` or `https://`.
pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Truncate text to at most 180 characters for error messages.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

/// Current Unix timestamp in seconds.
pub fn unix_timestamp_now() -> i64 {
    Utc::now().timestamp()
}

/// Current Unix timestamp in milliseconds.
pub fn unix_millis_now() -> i64 {
    Utc::now().timestamp_millis()
}

/// Timestamp stamped on a push batch.
///
/// Truncated to milliseconds so the value survives a round trip through
/// `PostgreSQL` `timestamptz` and RFC 3339 text unchanged.
pub fn sync_timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

#[derive(Debug, Deserialize)]
struct SupabaseErrorBody {
    error: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
    msg: Option<String>,
    details: Option<String>,
}

/// Render a Supabase (`GoTrue` or `PostgREST`) error response as one line.
pub fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<SupabaseErrorBody>(body) {
        if let Some(message) = payload
            .message
            .or(payload.msg)
            .or(payload.error_description)
            .or(payload.error)
        {
            return match payload.details {
                Some(details) if !details.trim().is_empty() => format!(
                    "{} - {} ({})",
                    message.trim(),
                    compact_text(&details),
                    status.as_u16()
                ),
                _ => format!("{} ({})", message.trim(), status.as_u16()),
            };
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_option_rejects_empty() {
        assert_eq!(normalize_text_option(None), None);
        assert_eq!(normalize_text_option(Some("   ".to_string())), None);
    }

    #[test]
    fn normalize_text_option_trims_value() {
        assert_eq!(
            normalize_text_option(Some(" https://example.com ".to_string())),
            Some("https://example.com".to_string())
        );
    }

    #[test]
    fn is_http_url_accepts_valid_schemes() {
        assert!(is_http_url("http://localhost"));
        assert!(is_http_url("https://example.com"));
        assert!(!is_http_url("ftp://example.com"));
        assert!(!is_http_url("example.com"));
    }

    #[test]
    fn sync_timestamp_has_millisecond_precision() {
        let stamp = sync_timestamp_now();
        assert_eq!(stamp.timestamp_subsec_nanos() % 1_000_000, 0);
    }

    #[test]
    fn parse_api_error_prefers_message_and_details() {
        let body = r#"{"message":"duplicate key","details":"Key (id) exists"}"#;
        assert_eq!(
            parse_api_error(StatusCode::CONFLICT, body),
            "duplicate key - Key (id) exists (409)"
        );
    }

    #[test]
    fn parse_api_error_falls_back_to_status() {
        assert_eq!(
            parse_api_error(StatusCode::BAD_GATEWAY, "  "),
            "HTTP 502"
        );
        assert_eq!(
            parse_api_error(StatusCode::BAD_REQUEST, "not json"),
            "not json (400)"
        );
    }
}

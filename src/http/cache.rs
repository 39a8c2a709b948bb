//! HTTP cache validation module
//!
//! `ETag` / `Last-Modified` generation and conditional request checks.

use chrono::{DateTime, Utc};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Generate an `ETag` from file identity and metadata
///
/// The file is not read, so the tag changes whenever the size or the
/// modification time does.
///
/// # Returns
/// Quoted `ETag` string, e.g., `"1a2b3c-400"`
pub fn generate_etag(path: &Path, size: u64, modified: Option<SystemTime>) -> String {
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    if let Some(nanos) = modified
        .and_then(|m| m.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_nanos())
    {
        nanos.hash(&mut hasher);
    }
    format!("\"{:x}-{size:x}\"", hasher.finish())
}

/// Check if client's `If-None-Match` header matches the server's `ETag`
///
/// Supports:
/// - Single `ETag`: `"abc123"`
/// - Multiple `ETags`: `"abc123", "def456"`
/// - Weak tags: `W/"abc123"` (weak comparison)
/// - Wildcard: `*`
///
/// # Returns
/// Returns true if matched (should return 304), false otherwise
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client_etag| {
        client_etag.split(',').any(|e| {
            let e = e.trim();
            e == "*" || e.trim_start_matches("W/") == etag
        })
    })
}

/// Format a timestamp as an HTTP-date (`Sun, 06 Nov 1994 08:49:37 GMT`)
pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format(HTTP_DATE).to_string()
}

/// Parse an HTTP-date header value
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// True when `If-Modified-Since` is at or after the file's mtime (second precision)
pub fn not_modified_since(if_modified_since: Option<&str>, modified: Option<SystemTime>) -> bool {
    let (Some(since), Some(modified)) = (if_modified_since.and_then(parse_http_date), modified)
    else {
        return false;
    };
    DateTime::<Utc>::from(modified).timestamp() <= since.timestamp()
}

/// Whether a `Range` header may be honoured given the request's `If-Range`
///
/// `If-Range` holds either an `ETag` (strong comparison) or an HTTP-date
/// that must equal the file's mtime. Anything that does not match means the
/// client's partial copy is stale and the full file must be sent.
pub fn if_range_allows(if_range: Option<&str>, etag: &str, modified: Option<SystemTime>) -> bool {
    let Some(value) = if_range.map(str::trim) else {
        return true;
    };
    if value.starts_with('"') || value.starts_with("W/") {
        return value == etag;
    }
    match (parse_http_date(value), modified) {
        (Some(date), Some(modified)) => DateTime::<Utc>::from(modified).timestamp() == date.timestamp(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn test_generate_etag() {
        let etag = generate_etag(Path::new("a.txt"), 1024, Some(at(1000)));
        assert!(etag.starts_with('"'));
        assert!(etag.ends_with("-400\""));
    }

    #[test]
    fn test_etag_consistency() {
        let etag1 = generate_etag(Path::new("a.txt"), 10, Some(at(5)));
        let etag2 = generate_etag(Path::new("a.txt"), 10, Some(at(5)));
        assert_eq!(etag1, etag2);
    }

    #[test]
    fn test_etag_changes_with_metadata() {
        let base = generate_etag(Path::new("a.txt"), 10, Some(at(5)));
        assert_ne!(base, generate_etag(Path::new("a.txt"), 11, Some(at(5))));
        assert_ne!(base, generate_etag(Path::new("a.txt"), 10, Some(at(6))));
        assert_ne!(base, generate_etag(Path::new("b.txt"), 10, Some(at(5))));
    }

    #[test]
    fn test_check_etag_match() {
        let etag = "\"abc123\"";
        assert!(check_etag_match(Some("\"abc123\""), etag));
        assert!(check_etag_match(Some("\"xyz\", \"abc123\""), etag));
        assert!(check_etag_match(Some("W/\"abc123\""), etag));
        assert!(check_etag_match(Some("*"), etag));
        assert!(!check_etag_match(Some("\"different\""), etag));
        assert!(!check_etag_match(None, etag));
    }

    #[test]
    fn test_http_date_round_trip() {
        let formatted = http_date(at(784_111_777));
        assert_eq!(formatted, "Sun, 06 Nov 1994 08:49:37 GMT");
        assert_eq!(
            parse_http_date(&formatted).map(|d| d.timestamp()),
            Some(784_111_777)
        );
        assert!(parse_http_date("yesterday").is_none());
    }

    #[test]
    fn test_not_modified_since() {
        let modified = Some(at(784_111_777));
        assert!(not_modified_since(Some("Sun, 06 Nov 1994 08:49:37 GMT"), modified));
        assert!(not_modified_since(Some("Mon, 07 Nov 1994 08:49:37 GMT"), modified));
        assert!(!not_modified_since(Some("Sat, 05 Nov 1994 08:49:37 GMT"), modified));
        assert!(!not_modified_since(Some("garbage"), modified));
        assert!(!not_modified_since(None, modified));
        assert!(!not_modified_since(Some("Sun, 06 Nov 1994 08:49:37 GMT"), None));
    }

    #[test]
    fn test_if_range_allows() {
        let etag = "\"abc\"";
        let modified = Some(at(784_111_777));
        assert!(if_range_allows(None, etag, modified));
        assert!(if_range_allows(Some("\"abc\""), etag, modified));
        assert!(!if_range_allows(Some("\"old\""), etag, modified));
        assert!(!if_range_allows(Some("W/\"abc\""), etag, modified));
        assert!(if_range_allows(Some("Sun, 06 Nov 1994 08:49:37 GMT"), etag, modified));
        assert!(!if_range_allows(Some("Mon, 07 Nov 1994 08:49:37 GMT"), etag, modified));
    }
}

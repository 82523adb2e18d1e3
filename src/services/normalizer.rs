//! Timestamp normalization service
//!
//! Canvas mixes timezone-aware and timezone-naive timestamps, RSS feeds
//! add their own formats, and some records carry no timestamp at all.
//! Everything is collapsed into a single UTC instant so records from
//! different sources order consistently.

use crate::types::{DaybriefError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Sentinel instant for records without a timestamp.
///
/// Sorts before every real instant, so undated items rank first in an
/// ascending view. Callers wanting "undated last" must special-case it
/// before comparing.
pub const UNDATED: DateTime<Utc> = DateTime::<Utc>::MIN_UTC;

/// Normalize a raw upstream timestamp into a UTC instant.
///
/// - Absent or empty input maps to [`UNDATED`].
/// - A stamp with an explicit offset is converted to its UTC equivalent.
/// - A stamp without an offset is read as UTC (never as host-local time),
///   so ordering is deterministic regardless of where the process runs.
/// - Anything else is a hard `Parse` error for the caller to handle.
///
/// `normalize(None)` yields [`UNDATED`]; `"2024-01-05T08:00:00+01:00"`
/// and `"2024-01-05T07:00:00Z"` normalize to the same instant.
pub fn normalize(raw: Option<&str>) -> Result<DateTime<Utc>> {
    let s = match raw {
        Some(s) => s.trim(),
        None => return Ok(UNDATED),
    };
    if s.is_empty() {
        return Ok(UNDATED);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // RSS pubDate stamps are RFC 2822.
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Offset-less stamps are read as UTC by design.
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }

    Err(DaybriefError::Parse(format!("invalid timestamp '{}'", s)))
}

/// Normalize, substituting the undated sentinel on parse failure.
///
/// This is the aggregator-facing variant: one malformed record must not
/// abort a whole batch, it just sorts as undated.
pub fn normalize_or_undated(raw: Option<&str>) -> DateTime<Utc> {
    normalize(raw).unwrap_or(UNDATED)
}

use chrono::{DateTime, Utc};

/// Promote a possibly-naive datetime to UTC without shifting the wall clock
/// (spec invariant 7). `chrono::DateTime<Utc>` is always timezone-aware in
/// Rust, so callers that parse from a naive source (e.g. a bare ISO string
/// with no offset) should go through [`naive_to_utc`] instead of assuming
/// the local zone.
#[must_use]
pub fn naive_to_utc(naive: chrono::NaiveDateTime) -> DateTime<Utc> {
  naive.and_utc()
}

/// Parse an RFC3339/ISO-8601 timestamp leniently: accepts an explicit offset
/// or a naive timestamp (treated as already being UTC, never shifted).
pub fn parse_datetime_lenient(raw: &str) -> Option<DateTime<Utc>> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
    return Some(dt.with_timezone(&Utc));
  }
  chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
    .or_else(|_| chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
    .ok()
    .map(naive_to_utc)
}

/// Clamp a datetime arithmetic overflow to the representable `DateTime<Utc>`
/// bounds rather than panicking or propagating an error (spec invariant 7,
/// testable property 7).
#[must_use]
pub fn clamp_to_range(dt: Option<DateTime<Utc>>, fallback_min: bool) -> DateTime<Utc> {
  dt.unwrap_or({
    if fallback_min {
      DateTime::<Utc>::MIN_UTC
    } else {
      DateTime::<Utc>::MAX_UTC
    }
  })
}

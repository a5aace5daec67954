//! Validity window parsing.
//!
//! Residents enter times from a local-time picker ("2025-03-01T08:00"), which
//! carries no zone. Such strings are read in the estate's configured offset,
//! never the server's. Strings with an explicit zone (`Z` or `+01:00`) are
//! taken as given. Everything is stored in UTC.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

use crate::error::AppError;

/// Local formats accepted from date-time pickers and hand-written clients.
const LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a window boundary into UTC.
///
/// # Errors
///
/// `InvalidRequest` naming `field` when the string is not a recognised
/// date-time.
pub fn parse_boundary(
    field: &str,
    input: &str,
    estate_offset: FixedOffset,
) -> Result<DateTime<Utc>, AppError> {
    let input = input.trim();

    if let Ok(zoned) = DateTime::parse_from_rfc3339(input) {
        return Ok(zoned.with_timezone(&Utc));
    }

    LOCAL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .and_then(|naive| estate_offset.from_local_datetime(&naive).single())
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| {
            AppError::InvalidRequest(format!(
                "{field} must be a date-time such as 2025-03-01T08:00"
            ))
        })
}

/// Parse and check a full window. Both ends are inclusive; equal is allowed.
pub fn parse_window(
    valid_from: &str,
    valid_until: &str,
    estate_offset: FixedOffset,
) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
    let from = parse_boundary("validFrom", valid_from, estate_offset)?;
    let until = parse_boundary("validUntil", valid_until, estate_offset)?;

    if until < from {
        return Err(AppError::InvalidRequest(
            "validUntil must not be earlier than validFrom".to_string(),
        ));
    }

    Ok((from, until))
}

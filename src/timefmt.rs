//! Conversions between ISO-8601 UTC timestamps (`2022-01-16T16:39:43Z`) and
//! the ITSM datetime format (`2022-01-16 16:39:43`) that incident records
//! and automation extra-vars use.

use thiserror::Error;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, PrimitiveDateTime};

#[derive(Debug, Error)]
pub enum TimeFormatError {
    #[error("not an ISO-8601 UTC datetime: {0}")]
    Parse(#[from] time::error::Parse),

    #[error("datetime render failed: {0}")]
    Format(#[from] time::error::Format),

    #[error("shifted datetime is out of range")]
    OutOfRange,
}

fn parse_iso(value: &str) -> Result<PrimitiveDateTime, time::error::Parse> {
    let iso = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");
    PrimitiveDateTime::parse(value, iso)
}

fn render(dt: PrimitiveDateTime) -> Result<String, time::error::Format> {
    let itsm = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    dt.format(itsm)
}

/// `2022-01-16T16:39:43Z` -> `2022-01-16 16:39:43`.
pub fn to_itsm_datetime(value: &str) -> Result<String, TimeFormatError> {
    Ok(render(parse_iso(value)?)?)
}

/// Parse an ISO-8601 UTC datetime, move it by `delta` (negative durations
/// move it back), and render it in ITSM format.
pub fn shift_datetime(value: &str, delta: Duration) -> Result<String, TimeFormatError> {
    let shifted = parse_iso(value)?
        .checked_add(delta)
        .ok_or(TimeFormatError::OutOfRange)?;
    Ok(render(shifted)?)
}

/// Current UTC time in ITSM format.
pub fn now_itsm() -> String {
    let itsm = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    OffsetDateTime::now_utc().format(itsm).unwrap_or_default()
}

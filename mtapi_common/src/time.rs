//! Terminal datetime conversion.
//!
//! The terminal represents datetimes as integer seconds since the Unix epoch.
//! An unset datetime travels as `0`.
use chrono::{DateTime, Utc};

use crate::response::{FromResponse, ResponseEnvelope};

/// Encodes a datetime for the wire, clamped to the terminal's 32-bit range.
pub fn to_mt_time(time: DateTime<Utc>) -> i32 {
    time.timestamp().clamp(0, i32::MAX as i64) as i32
}

/// Encodes an optional datetime; `None` becomes the unset value `0`.
pub fn to_mt_time_opt(time: Option<DateTime<Utc>>) -> i32 {
    time.map(to_mt_time).unwrap_or(0)
}

/// Decodes a wire datetime. Out-of-range input yields the epoch.
pub fn from_mt_time(seconds: i32) -> DateTime<Utc> {
    DateTime::from_timestamp(seconds as i64, 0).unwrap_or_default()
}

impl FromResponse for DateTime<Utc> {
    const TYPE_NAME: &'static str = "DateTime<Utc>";

    fn from_response(response: &ResponseEnvelope) -> Option<Self> {
        i32::from_response(response).map(from_mt_time)
    }
}

impl FromResponse for Vec<DateTime<Utc>> {
    const TYPE_NAME: &'static str = "Vec<DateTime<Utc>>";

    fn from_response(response: &ResponseEnvelope) -> Option<Self> {
        match response {
            ResponseEnvelope::IntArray(v) => Some(v.iter().copied().map(from_mt_time).collect()),
            _ => None,
        }
    }
}

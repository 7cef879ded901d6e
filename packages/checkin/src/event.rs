//! Decoding of a single check-in record.
//!
//! Records follow the geotagged-status layout of the streaming APIs the
//! archives were captured from:
//!
//! ```json
//! {
//!   "created_at": "Tue Feb 12 06:33:37 +0000 2013",
//!   "coordinates": {"type": "Point", "coordinates": [-97.13, 33.21]},
//!   "user": {"id": 12345, "id_str": "12345"}
//! }
//! ```
//!
//! Records without a usable point or user are not check-ins and decode to
//! `None`.

use chrono::{DateTime, Utc};
use hotspot_checkin_models::{CheckIn, UserId};
use hotspot_geography_models::Point;
use serde::Deserialize;

/// Timestamp layout of `created_at`.
const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

#[derive(Deserialize)]
struct RawRecord {
    coordinates: Option<RawCoordinates>,
    user: Option<RawUser>,
    created_at: Option<String>,
}

#[derive(Deserialize)]
struct RawCoordinates {
    coordinates: Option<Vec<f64>>,
}

#[derive(Deserialize)]
struct RawUser {
    id: Option<u64>,
    id_str: Option<String>,
}

/// Extracts a check-in from an already-parsed JSON record.
#[must_use]
pub fn decode_record(record: &serde_json::Value) -> Option<CheckIn> {
    let raw = RawRecord::deserialize(record).ok()?;

    let point = raw.coordinates.and_then(|c| c.coordinates).and_then(|c| match c[..] {
        [longitude, latitude] if longitude.is_finite() && latitude.is_finite() => {
            Some(Point::new(longitude, latitude))
        }
        _ => None,
    })?;

    let user = raw.user?;
    let user_id = match (user.id, user.id_str) {
        (Some(id), _) => UserId::from(id),
        (None, Some(id)) if !id.is_empty() => UserId::new(id),
        _ => return None,
    };

    let created_at = raw.created_at.as_deref().and_then(parse_created_at);

    Some(CheckIn {
        user_id,
        point,
        created_at,
    })
}

/// Decodes one archive line.
///
/// # Errors
///
/// Returns the JSON error if the line is not valid JSON. A valid record that
/// is not a usable check-in decodes to `Ok(None)`.
pub fn decode_line(line: &[u8]) -> Result<Option<CheckIn>, serde_json::Error> {
    let record: serde_json::Value = serde_json::from_slice(line)?;
    Ok(decode_record(&record))
}

/// Parses a `created_at` timestamp such as `Tue Feb 12 06:33:37 +0000 2013`.
#[must_use]
pub fn parse_created_at(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(value, CREATED_AT_FORMAT)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

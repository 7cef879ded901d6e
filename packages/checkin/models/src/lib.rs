#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Check-in event and archive statistics types.
//!
//! A check-in is one geocoded event posted by a user. Only the fields the
//! interaction graph needs survive decoding: who, where, and (when the
//! source has it) when.

use std::fmt;

use chrono::{DateTime, Utc};
use hotspot_geography_models::Point;
use serde::{Deserialize, Serialize};

/// Identifier of the user who posted a check-in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a user id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for UserId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A decoded check-in event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckIn {
    /// Who checked in.
    pub user_id: UserId,
    /// Where, in `GeoJSON` (longitude, latitude) order.
    pub point: Point,
    /// When the event was created, if the record carries a parseable
    /// timestamp.
    pub created_at: Option<DateTime<Utc>>,
}

/// Counters from reading or filtering archives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveStats {
    /// Archive files opened.
    pub files: u64,
    /// Lines that decoded as JSON.
    pub total: u64,
    /// Records kept (usable check-ins, or filter matches).
    pub kept: u64,
    /// Lines that failed to decode as JSON.
    pub errors: u64,
}

impl ArchiveStats {
    /// Adds the counters of `other` to these.
    pub const fn absorb(&mut self, other: &Self) {
        self.files += other.files;
        self.total += other.total;
        self.kept += other.kept;
        self.errors += other.errors;
    }
}

impl fmt::Display for ArchiveStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "count: {}\ttotal: {}\terrors: {}",
            self.kept, self.total, self.errors
        )
    }
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Check-in archive decoding, filtering, and per-user trails.
//!
//! Check-in archives hold one JSON-encoded event per line, optionally
//! gzip compressed. [`archive`] decodes them into [`CheckIn`] records,
//! [`filter`] combines many archives into one while keeping only matching
//! records, and [`trails`] groups decoded check-ins into each user's
//! ordered sequence of points.

pub mod archive;
pub mod event;
pub mod filter;
pub mod progress;
pub mod trails;

pub use archive::{read_archive, read_archives};
pub use event::{decode_line, decode_record};
pub use filter::{InBox, RecordFilter, combine_filter};
pub use hotspot_checkin_models::{ArchiveStats, CheckIn, UserId};
pub use trails::group_by_user;

/// Errors that can occur while reading or writing check-in archives.
#[derive(Debug, thiserror::Error)]
pub enum CheckinError {
    /// Archive directory not found.
    #[error("Directory not found: {0}")]
    DirectoryNotFound(String),

    /// I/O error while reading an archive or writing the filtered output.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl CheckinError {
    pub(crate) fn io(path: &std::path::Path) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.display().to_string();
        move |source| Self::Io { path, source }
    }
}

//! Combine many archives into one, keeping only matching records.
//!
//! Streaming endpoints that filter by location also return records that
//! only matched through a coarse place polygon. This pass re-checks every
//! record against a precise predicate (for example, "has coordinates
//! inside this bounding box") and writes the survivors, byte for byte, to
//! a single output archive.

use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use bzip2::write::BzEncoder;
use flate2::Compression;
use flate2::write::GzEncoder;
use hotspot_checkin_models::ArchiveStats;
use hotspot_geography_models::{BoundingBox, Point};

use crate::CheckinError;
use crate::archive::{for_each_line, open_archive};
use crate::progress::ProgressCallback;

/// Archive extensions picked up from an input directory.
const ARCHIVE_EXTENSIONS: &[&str] = &["bz2", "gz", "json", "jsonl"];

/// Predicate over a decoded JSON record.
pub trait RecordFilter: Send + Sync {
    /// Whether `record` should be kept.
    fn matches(&self, record: &serde_json::Value) -> bool;
}

/// Matches records whose `coordinates.coordinates` point lies strictly
/// inside a bounding box.
#[derive(Debug, Clone, Copy)]
pub struct InBox(pub BoundingBox);

impl RecordFilter for InBox {
    fn matches(&self, record: &serde_json::Value) -> bool {
        let Some(coords) = record
            .pointer("/coordinates/coordinates")
            .and_then(serde_json::Value::as_array)
        else {
            return false;
        };
        match coords.as_slice() {
            [lon, lat] => match (lon.as_f64(), lat.as_f64()) {
                (Some(lon), Some(lat)) => self.0.contains(&Point::new(lon, lat)),
                _ => false,
            },
            _ => false,
        }
    }
}

/// Lists the archive files directly inside `directory`, sorted by name.
///
/// # Errors
///
/// Returns [`CheckinError::DirectoryNotFound`] if `directory` does not
/// exist and [`CheckinError::Io`] if it cannot be listed.
pub fn list_archives(directory: &Path) -> Result<Vec<PathBuf>, CheckinError> {
    if !directory.is_dir() {
        return Err(CheckinError::DirectoryNotFound(
            directory.display().to_string(),
        ));
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(directory).map_err(CheckinError::io(directory))? {
        let path = entry.map_err(CheckinError::io(directory))?.path();
        let is_archive = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ARCHIVE_EXTENSIONS.contains(&ext));
        if path.is_file() && is_archive {
            paths.push(path);
        }
    }
    paths.sort();

    Ok(paths)
}

/// Output archive, compressed according to its extension (`.gz` or `.bz2`).
enum Sink {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
    Bzip2(BzEncoder<BufWriter<File>>),
}

impl Sink {
    fn create(path: &Path) -> std::io::Result<Self> {
        let file = BufWriter::new(File::create(path)?);
        Ok(match path.extension().and_then(OsStr::to_str) {
            Some("gz") => Self::Gzip(GzEncoder::new(file, Compression::default())),
            Some("bz2") => Self::Bzip2(BzEncoder::new(file, bzip2::Compression::default())),
            _ => Self::Plain(file),
        })
    }

    fn write_line(&mut self, line: &[u8]) -> std::io::Result<()> {
        let writer: &mut dyn Write = match self {
            Self::Plain(w) => w,
            Self::Gzip(w) => w,
            Self::Bzip2(w) => w,
        };
        writer.write_all(line)?;
        writer.write_all(b"\n")
    }

    fn finish(self) -> std::io::Result<()> {
        match self {
            Self::Plain(mut w) => w.flush(),
            Self::Gzip(w) => w.finish()?.flush(),
            Self::Bzip2(w) => w.finish()?.flush(),
        }
    }
}

/// Copies every record from the archives in `directory` that matches any
/// of `filters` into `output`.
///
/// Records are kept in input order. Lines that are not valid JSON are
/// counted as errors and dropped. A status line is logged every
/// `msg_interval` decoded records and once at the end.
///
/// # Errors
///
/// Returns [`CheckinError`] if the directory cannot be listed, an archive
/// cannot be read, or the output cannot be written.
pub fn combine_filter(
    directory: &Path,
    output: &Path,
    filters: &[&dyn RecordFilter],
    msg_interval: u64,
    progress: &dyn ProgressCallback,
) -> Result<ArchiveStats, CheckinError> {
    let archives = list_archives(directory)?;
    log::info!(
        "Filtering {} archive(s) from {} into {}",
        archives.len(),
        directory.display(),
        output.display()
    );
    progress.set_total(archives.len() as u64);

    let mut sink = Sink::create(output).map_err(CheckinError::io(output))?;
    let mut stats = ArchiveStats::default();

    for path in &archives {
        log::info!("Processing: {}", path.display());
        progress.set_message(format!("Filtering {}", path.display()));

        let reader = open_archive(path)?;
        let mut write_result = Ok(());

        for_each_line(reader, |line| {
            if write_result.is_err() {
                return;
            }
            let Ok(record) = serde_json::from_slice::<serde_json::Value>(line) else {
                stats.errors += 1;
                return;
            };
            if filters.iter().any(|filter| filter.matches(&record)) {
                stats.kept += 1;
                write_result = sink.write_line(line);
            }
            stats.total += 1;
            if msg_interval > 0 && stats.total % msg_interval == 0 {
                log::info!("{stats}");
            }
        })
        .map_err(CheckinError::io(path))?;

        write_result.map_err(CheckinError::io(output))?;
        stats.files += 1;
        progress.inc(1);
    }

    sink.finish().map_err(CheckinError::io(output))?;

    if msg_interval == 0 || stats.total % msg_interval != 0 {
        log::info!("{stats}");
    }
    progress.finish(format!("Kept {} of {} records", stats.kept, stats.total));

    Ok(stats)
}

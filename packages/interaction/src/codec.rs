//! Line-oriented text format for [`InteractionGraph`].
//!
//! ```text
//! <source_id>\t{"<target_id>":<count>,...}
//! ```
//!
//! One line per source block with at least one outgoing edge, sorted by
//! source id (numeric ids first, then lexical), with the inner object's
//! keys in the same order. There is no header or trailer. Loading is
//! strict: any malformed line fails the whole load.

use std::ffi::OsString;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use hotspot_geography_models::BlockId;
use hotspot_interaction_models::{InteractionGraph, Targets};
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};

/// Errors from reading or writing a graph file.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Reading from or writing to the underlying stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Opening, creating, or renaming a graph file failed.
    #[error("I/O error at {path}: {source}")]
    File {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Encoding a line failed.
    #[error("JSON encode error: {0}")]
    Json(#[from] serde_json::Error),

    /// A line of a graph file does not follow the format.
    #[error("Malformed graph line {line}: {reason}")]
    Malformed {
        /// 1-based line number.
        line: usize,
        /// What is wrong with the line.
        reason: String,
    },
}

/// Inner object entries in file order, repeated keys included.
struct RawTargets(Vec<(String, serde_json::Value)>);

impl<'de> Deserialize<'de> for RawTargets {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = RawTargets;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a JSON object of target counts")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, serde_json::Value>()? {
                    entries.push(entry);
                }
                Ok(RawTargets(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// Writes `graph` to `sink`.
///
/// # Errors
///
/// Returns [`CodecError`] if writing to `sink` fails.
pub fn dump(graph: &InteractionGraph, mut sink: impl Write) -> Result<(), CodecError> {
    for (source, targets) in graph {
        if targets.is_empty() {
            continue;
        }
        let json = serde_json::to_string(targets)?;
        writeln!(sink, "{source}\t{json}")?;
    }
    sink.flush()?;
    Ok(())
}

/// Reads a graph previously written by [`dump`].
///
/// # Errors
///
/// Returns [`CodecError::Malformed`] on the first line that is not
/// `<id>\t<non-empty JSON object of non-negative integer counts>`, repeats
/// a source id or a target id within a line, or is blank, and [`CodecError::Io`] if reading fails.
pub fn load(source: impl BufRead) -> Result<InteractionGraph, CodecError> {
    let mut graph = InteractionGraph::new();

    for (idx, line) in source.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        let malformed = |reason: String| CodecError::Malformed {
            line: line_no,
            reason,
        };

        let line = line.strip_suffix('\r').unwrap_or(&line);
        let Some((source_id, json)) = line.split_once('\t') else {
            return Err(malformed("missing tab separator".to_string()));
        };
        if source_id.is_empty() {
            return Err(malformed("empty source id".to_string()));
        }

        let RawTargets(raw) =
            serde_json::from_str(json).map_err(|e| malformed(format!("invalid JSON object: {e}")))?;
        if raw.is_empty() {
            return Err(malformed(format!("source {source_id} has no targets")));
        }

        let mut targets = Targets::new();
        for (target_id, value) in raw {
            let Some(count) = value.as_u64() else {
                return Err(malformed(format!(
                    "count for target {target_id} is not a non-negative integer: {value}"
                )));
            };
            let target = BlockId::new(target_id);
            if targets.contains_key(&target) {
                return Err(malformed(format!("duplicate target {target} for source {source_id}")));
            }
            targets.insert(target, count);
        }

        if graph.insert(BlockId::from(source_id), targets).is_some() {
            return Err(malformed(format!("duplicate source id {source_id}")));
        }
    }

    Ok(graph)
}

/// Writes `graph` to `path`.
///
/// The file is written to a temporary sibling first and renamed into place.
///
/// # Errors
///
/// Returns [`CodecError`] if the file cannot be created, written, or
/// renamed.
pub fn dump_to_path(graph: &InteractionGraph, path: &Path) -> Result<(), CodecError> {
    let file_error = |p: &Path| {
        let path = p.display().to_string();
        move |source| CodecError::File { path, source }
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(file_error(parent))?;
    }

    write_via_temp(path, |sink| dump(graph, sink))?;

    log::info!(
        "Wrote {} sources / {} edges to {}",
        graph.source_count(),
        graph.edge_count(),
        path.display()
    );
    Ok(())
}

/// `path` with `.tmp` appended to its full file name, so `graph.tsv` and
/// `graph.json` never share a temporary file.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Runs `write` against a temporary sibling of `path` and renames it into
/// place. The temporary file is removed if `write` fails.
fn write_via_temp(
    path: &Path,
    write: impl FnOnce(BufWriter<File>) -> Result<(), CodecError>,
) -> Result<(), CodecError> {
    let tmp_path = temp_path(path);
    let file = File::create(&tmp_path).map_err(|e| CodecError::File {
        path: tmp_path.display().to_string(),
        source: e,
    })?;

    if let Err(e) = write(BufWriter::new(file)) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e);
    }

    std::fs::rename(&tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        CodecError::File {
            path: path.display().to_string(),
            source: e,
        }
    })
}

/// Reads the graph stored at `path`.
///
/// # Errors
///
/// Returns [`CodecError::File`] if the file cannot be opened and any error
/// [`load`] reports.
pub fn load_from_path(path: &Path) -> Result<InteractionGraph, CodecError> {
    let file = File::open(path).map_err(|e| CodecError::File {
        path: path.display().to_string(),
        source: e,
    })?;
    let graph = load(BufReader::new(file))?;

    log::info!(
        "Loaded {} sources / {} edges from {}",
        graph.source_count(),
        graph.edge_count(),
        path.display()
    );
    Ok(graph)
}

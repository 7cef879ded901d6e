//! Reading check-ins out of line-delimited JSON archives.

use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use bzip2::read::MultiBzDecoder;
use flate2::read::GzDecoder;
use hotspot_checkin_models::{ArchiveStats, CheckIn};

use crate::CheckinError;
use crate::event::decode_line;
use crate::progress::ProgressCallback;

/// Lines between progress updates.
const PROGRESS_INTERVAL: u64 = 10_000;

/// Opens an archive for line-by-line reading, decompressing `.gz` and
/// `.bz2` files. Concatenated bzip2 streams are read as one.
///
/// # Errors
///
/// Returns [`CheckinError::Io`] if the file cannot be opened.
pub fn open_archive(path: &Path) -> Result<Box<dyn BufRead>, CheckinError> {
    let file = File::open(path).map_err(CheckinError::io(path))?;

    Ok(match path.extension().and_then(OsStr::to_str) {
        Some("gz") => Box::new(BufReader::new(GzDecoder::new(file))),
        Some("bz2") => Box::new(BufReader::new(MultiBzDecoder::new(file))),
        _ => Box::new(BufReader::new(file)),
    })
}

/// Calls `on_line` with every line of `reader`, without its line ending.
///
/// Lines are handed over as raw bytes so that invalid UTF-8 surfaces as a
/// per-record decode error instead of aborting the whole archive.
pub(crate) fn for_each_line(
    mut reader: impl BufRead,
    mut on_line: impl FnMut(&[u8]),
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        let mut line = buf.as_slice();
        while let Some((last, rest)) = line.split_last() {
            if *last == b'\n' || *last == b'\r' {
                line = rest;
            } else {
                break;
            }
        }
        if !line.is_empty() {
            on_line(line);
        }
    }
}

/// Decodes every check-in from the archive at `path`, in file order.
///
/// Lines that are not valid JSON are counted in [`ArchiveStats::errors`]
/// and skipped; valid records without a usable point or user are skipped
/// silently.
///
/// # Errors
///
/// Returns [`CheckinError::Io`] if the archive cannot be opened or read.
pub fn read_archive(
    path: &Path,
    progress: &dyn ProgressCallback,
) -> Result<(Vec<CheckIn>, ArchiveStats), CheckinError> {
    log::info!("Processing: {}", path.display());
    progress.set_message(format!("Reading {}", path.display()));

    let reader = open_archive(path)?;
    let mut checkins = Vec::new();
    let mut stats = ArchiveStats {
        files: 1,
        ..ArchiveStats::default()
    };
    let mut lines = 0u64;

    for_each_line(reader, |line| {
        lines += 1;
        if lines % PROGRESS_INTERVAL == 0 {
            progress.set_position(lines);
        }

        match decode_line(line) {
            Ok(decoded) => {
                stats.total += 1;
                if let Some(checkin) = decoded {
                    stats.kept += 1;
                    checkins.push(checkin);
                }
            }
            Err(e) => {
                stats.errors += 1;
                log::debug!("{}: line {lines}: {e}", path.display());
            }
        }
    })
    .map_err(CheckinError::io(path))?;

    progress.set_position(lines);
    log::info!("{}: {stats}", path.display());

    Ok((checkins, stats))
}

/// Reads several archives in order and concatenates their check-ins.
///
/// # Errors
///
/// Returns the first [`CheckinError`] encountered.
pub fn read_archives(
    paths: &[&Path],
    progress: &dyn ProgressCallback,
) -> Result<(Vec<CheckIn>, ArchiveStats), CheckinError> {
    let mut all = Vec::new();
    let mut stats = ArchiveStats::default();

    for path in paths {
        let (checkins, file_stats) = read_archive(path, progress)?;
        all.extend(checkins);
        stats.absorb(&file_stats);
    }

    progress.finish(format!("Read {} check-ins from {} archive(s)", stats.kept, stats.files));
    Ok((all, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NullProgress;
    use hotspot_checkin_models::UserId;
    use hotspot_geography_models::Point;
    use std::io::Write;

    const LINES: &str = concat!(
        r#"{"coordinates":{"coordinates":[1.0,2.0]},"user":{"id":1}}"#,
        "\n",
        "garbage\n",
        r#"{"coordinates":null,"user":{"id":2}}"#,
        "\r\n",
        "\n",
        r#"{"coordinates":{"coordinates":[3.0,4.0]},"user":{"id":1}}"#,
    );

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = std::fs::remove_dir_all(&tmp);
        std::fs::create_dir_all(&tmp).unwrap();
        tmp
    }

    #[test]
    fn for_each_line_strips_line_endings() {
        let mut seen = Vec::new();
        for_each_line("a\r\nb\n\nc".as_bytes(), |line| seen.push(line.to_vec())).unwrap();
        assert_eq!(seen, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn reads_plain_archive() {
        let tmp = temp_dir("hotspot_checkin_archive_plain");
        let path = tmp.join("checkins.json");
        std::fs::write(&path, LINES).unwrap();

        let (checkins, stats) = read_archive(&path, &NullProgress).unwrap();
        assert_eq!(checkins.len(), 2);
        assert_eq!(checkins[0].point, Point::new(1.0, 2.0));
        assert_eq!(checkins[1].point, Point::new(3.0, 4.0));
        assert_eq!(checkins[1].user_id, UserId::from(1));
        assert_eq!(
            stats,
            ArchiveStats {
                files: 1,
                total: 3,
                kept: 2,
                errors: 1,
            }
        );

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn reads_gzipped_archives_in_order() {
        let tmp = temp_dir("hotspot_checkin_archive_gz");
        let first = tmp.join("a.json.gz");
        let second = tmp.join("b.json");

        let mut encoder = flate2::write::GzEncoder::new(
            File::create(&first).unwrap(),
            flate2::Compression::default(),
        );
        encoder.write_all(LINES.as_bytes()).unwrap();
        encoder.finish().unwrap();
        std::fs::write(
            &second,
            r#"{"coordinates":{"coordinates":[5.0,6.0]},"user":{"id":9}}"#,
        )
        .unwrap();

        let (checkins, stats) = read_archives(&[first.as_path(), second.as_path()], &NullProgress).unwrap();
        assert_eq!(checkins.len(), 3);
        assert_eq!(checkins[2].user_id, UserId::from(9));
        assert_eq!(stats.files, 2);
        assert_eq!(stats.errors, 1);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn reads_bzip2_archive() {
        let tmp = temp_dir("hotspot_checkin_archive_bz2");
        let path = tmp.join("checkins.json.bz2");

        let mut encoder =
            bzip2::write::BzEncoder::new(File::create(&path).unwrap(), bzip2::Compression::default());
        encoder.write_all(LINES.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let (checkins, stats) = read_archive(&path, &NullProgress).unwrap();
        assert_eq!(checkins.len(), 2);
        assert_eq!(checkins[1].point, Point::new(3.0, 4.0));
        assert_eq!(stats.total, 3);
        assert_eq!(stats.errors, 1);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn reads_concatenated_bzip2_streams() {
        let tmp = temp_dir("hotspot_checkin_archive_bz2_multi");
        let path = tmp.join("checkins.json.bz2");

        let mut bytes = Vec::new();
        for user in [1, 2] {
            let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
            writeln!(
                encoder,
                r#"{{"coordinates":{{"coordinates":[1.0,2.0]}},"user":{{"id":{user}}}}}"#
            )
            .unwrap();
            bytes.extend(encoder.finish().unwrap());
        }
        std::fs::write(&path, bytes).unwrap();

        let (checkins, _) = read_archive(&path, &NullProgress).unwrap();
        let users: Vec<UserId> = checkins.into_iter().map(|c| c.user_id).collect();
        assert_eq!(users, vec![UserId::from(1), UserId::from(2)]);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_archive_is_an_error() {
        let result = read_archive(Path::new("/nonexistent/checkins.json"), &NullProgress);
        assert!(matches!(result, Err(CheckinError::Io { .. })));
    }
}

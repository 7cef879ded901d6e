//! Block archive reader.
//!
//! A block archive is a tab-delimited text file, optionally gzip or bzip2
//! compressed, with one `<block_id>\t<GeoJSON geometry>` record per line.
//! The geometry may be a `Polygon`, a `MultiPolygon`, or a `Feature`
//! wrapping either.

use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use bzip2::read::MultiBzDecoder;
use flate2::read::GzDecoder;
use geo::MultiPolygon;
use geojson::GeoJson;

use crate::{Block, SpatialError};

/// Loads every well-formed block from the archive at `path`.
///
/// Files ending in `.gz` or `.bz2` are decompressed on the fly.
///
/// # Errors
///
/// Returns [`SpatialError::Io`] if the file cannot be opened or read.
pub fn load_blocks(path: &Path) -> Result<Vec<Block>, SpatialError> {
    log::info!("Loading blocks from {}", path.display());

    let file = File::open(path).map_err(|e| SpatialError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    let reader: Box<dyn BufRead> = match path.extension().and_then(OsStr::to_str) {
        Some("gz") => Box::new(BufReader::new(GzDecoder::new(file))),
        Some("bz2") => Box::new(BufReader::new(MultiBzDecoder::new(file))),
        _ => Box::new(BufReader::new(file)),
    };

    parse_blocks(reader).map_err(|e| match e {
        SpatialError::Io { source, .. } => SpatialError::Io {
            path: path.display().to_string(),
            source,
        },
    })
}

/// Parses block records from an already-open reader.
///
/// Lines that lack a tab or whose geometry is not a polygon are logged and
/// skipped.
///
/// # Errors
///
/// Returns [`SpatialError::Io`] if reading from `reader` fails.
pub fn parse_blocks(reader: impl BufRead) -> Result<Vec<Block>, SpatialError> {
    let mut blocks = Vec::new();
    let mut skipped = 0u64;

    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| SpatialError::Io {
            path: "<reader>".to_string(),
            source: e,
        })?;
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }

        let Some((id, geometry)) = line.split_once('\t') else {
            log::warn!("Block archive line {}: missing tab separator", idx + 1);
            skipped += 1;
            continue;
        };
        let id = id.trim();
        if id.is_empty() {
            log::warn!("Block archive line {}: empty block id", idx + 1);
            skipped += 1;
            continue;
        }

        let Some(multi_polygon) = parse_geojson_to_multipolygon(geometry) else {
            log::warn!("Failed to parse GeoJSON for block {id}");
            skipped += 1;
            continue;
        };

        blocks.push(Block::new(id, multi_polygon));
    }

    log::info!("Loaded {} blocks ({skipped} skipped)", blocks.len());

    Ok(blocks)
}

/// Parse a `GeoJSON` string into a [`MultiPolygon`].
/// Handles `Polygon` and `MultiPolygon` geometries, bare or inside a
/// `Feature`.
fn parse_geojson_to_multipolygon(geojson_str: &str) -> Option<MultiPolygon<f64>> {
    let geojson: GeoJson = geojson_str.parse().ok()?;
    let geom = match geojson {
        GeoJson::Geometry(geom) => geom,
        GeoJson::Feature(feature) => feature.geometry?,
        GeoJson::FeatureCollection(_) => return None,
    };
    let geo_geom: geo::Geometry<f64> = geom.try_into().ok()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}

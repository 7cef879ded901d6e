#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! In-memory spatial index for point-to-block resolution.
//!
//! Holds the fixed set of block polygons loaded at startup, builds an
//! R-tree over their envelopes, and answers "which block contains this
//! point". Used by both the graph build pass and the query server, so the
//! containment rule is identical in both phases.

pub mod archive;

use std::collections::BTreeMap;

use geo::{BoundingRect, Contains, MultiPolygon};
use hotspot_geography_models::{BlockId, Point};
use rstar::{AABB, RTree, RTreeObject};

pub use archive::{load_blocks, parse_blocks};

/// Errors that can occur while loading block polygons.
#[derive(Debug, thiserror::Error)]
pub enum SpatialError {
    /// The block archive could not be read.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// A named block polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Unique block identifier.
    pub id: BlockId,
    /// Block boundary. Single polygons are stored as a one-element
    /// multipolygon.
    pub geometry: MultiPolygon<f64>,
}

impl Block {
    /// Creates a block from an id and its boundary.
    #[must_use]
    pub fn new(id: impl Into<BlockId>, geometry: MultiPolygon<f64>) -> Self {
        Self {
            id: id.into(),
            geometry,
        }
    }
}

/// Envelope of a block stored in the R-tree, pointing back at the block's
/// load position.
struct BlockEntry {
    position: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for BlockEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Immutable index over the block set.
///
/// Constructed once and shared read-only across the build pass and all
/// query handlers.
///
/// Blocks are expected to tile the area without overlap. When they do
/// overlap, [`BlockIndex::resolve`] returns the block that was loaded
/// first, so the load order of the block archive is the priority order.
pub struct BlockIndex {
    blocks: Vec<Block>,
    by_id: BTreeMap<BlockId, usize>,
    tree: RTree<BlockEntry>,
}

impl BlockIndex {
    /// Builds the index. Later blocks that repeat an already-seen id are
    /// dropped, as are blocks with empty geometry.
    #[must_use]
    pub fn new(blocks: impl IntoIterator<Item = Block>) -> Self {
        let mut kept = Vec::new();
        let mut by_id = BTreeMap::new();
        let mut entries = Vec::new();

        for block in blocks {
            if by_id.contains_key(&block.id) {
                log::warn!("Duplicate block id {}; keeping the first occurrence", block.id);
                continue;
            }
            let Some(envelope) = compute_envelope(&block.geometry) else {
                log::warn!("Block {} has empty geometry; skipping", block.id);
                continue;
            };

            let position = kept.len();
            by_id.insert(block.id.clone(), position);
            entries.push(BlockEntry { position, envelope });
            kept.push(block);
        }

        log::debug!("Indexed {} blocks", kept.len());

        Self {
            blocks: kept,
            by_id,
            tree: RTree::bulk_load(entries),
        }
    }

    /// Look up the block containing `point`.
    ///
    /// Points on a block boundary are not contained by that block. Among
    /// several containing blocks, the earliest loaded wins.
    #[must_use]
    pub fn resolve(&self, point: &Point) -> Option<&BlockId> {
        let query = geo::Point::new(point.longitude, point.latitude);
        let query_env = AABB::from_point([point.longitude, point.latitude]);

        self.tree
            .locate_in_envelope_intersecting(&query_env)
            .filter(|entry| self.blocks[entry.position].geometry.contains(&query))
            .map(|entry| entry.position)
            .min()
            .map(|position| &self.blocks[position].id)
    }

    /// Returns the block with the given id.
    #[must_use]
    pub fn get(&self, id: &BlockId) -> Option<&Block> {
        self.by_id.get(id).map(|&position| &self.blocks[position])
    }

    /// Number of indexed blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether no blocks were indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Compute the bounding box envelope for a [`MultiPolygon`].
fn compute_envelope(mp: &MultiPolygon<f64>) -> Option<AABB<[f64; 2]>> {
    mp.bounding_rect()
        .map(|rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon};

    /// Axis-aligned square block from `(x0, y0)` to `(x1, y1)`.
    fn square(id: &str, x0: f64, y0: f64, x1: f64, y1: f64) -> Block {
        let ring = LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]);
        Block::new(id, MultiPolygon(vec![Polygon::new(ring, vec![])]))
    }

    #[test]
    fn resolves_containing_block() {
        let index = BlockIndex::new(vec![
            square("A", 0.0, 0.0, 1.0, 1.0),
            square("B", 1.0, 0.0, 2.0, 1.0),
        ]);

        assert_eq!(index.resolve(&Point::new(0.5, 0.5)).map(BlockId::as_str), Some("A"));
        assert_eq!(index.resolve(&Point::new(1.5, 0.5)).map(BlockId::as_str), Some("B"));
        assert_eq!(index.resolve(&Point::new(5.0, 5.0)), None);
    }

    #[test]
    fn boundary_points_are_not_contained() {
        let index = BlockIndex::new(vec![square("A", 0.0, 0.0, 1.0, 1.0)]);
        assert_eq!(index.resolve(&Point::new(1.0, 0.5)), None);
        assert_eq!(index.resolve(&Point::new(0.0, 0.0)), None);
    }

    #[test]
    fn overlapping_blocks_resolve_to_first_loaded() {
        let index = BlockIndex::new(vec![
            square("late-small", 0.4, 0.4, 0.6, 0.6),
            square("big", 0.0, 0.0, 1.0, 1.0),
        ]);
        assert_eq!(
            index.resolve(&Point::new(0.5, 0.5)).map(BlockId::as_str),
            Some("late-small")
        );

        let reversed = BlockIndex::new(vec![
            square("big", 0.0, 0.0, 1.0, 1.0),
            square("late-small", 0.4, 0.4, 0.6, 0.6),
        ]);
        assert_eq!(
            reversed.resolve(&Point::new(0.5, 0.5)).map(BlockId::as_str),
            Some("big")
        );
    }

    #[test]
    fn resolve_is_idempotent() {
        let index = BlockIndex::new(vec![
            square("A", 0.0, 0.0, 1.0, 1.0),
            square("B", 1.0, 0.0, 2.0, 1.0),
        ]);
        let point = Point::new(1.25, 0.75);
        let first = index.resolve(&point).cloned();
        for _ in 0..10 {
            assert_eq!(index.resolve(&point).cloned(), first);
        }
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let index = BlockIndex::new(vec![
            square("A", 0.0, 0.0, 1.0, 1.0),
            square("A", 5.0, 5.0, 6.0, 6.0),
        ]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.resolve(&Point::new(5.5, 5.5)), None);
        assert_eq!(index.resolve(&Point::new(0.5, 0.5)), Some(&BlockId::from("A")));
        assert!(index.get(&BlockId::from("A")).is_some());
    }

    #[test]
    fn empty_geometry_is_skipped() {
        let index = BlockIndex::new(vec![Block::new("empty", MultiPolygon(vec![]))]);
        assert!(index.is_empty());
        assert!(index.get(&BlockId::from("empty")).is_none());
    }
}

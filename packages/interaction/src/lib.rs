#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Block interaction graph: build, persist, and query.
//!
//! The build pass turns each user's ordered check-in points into
//! block-to-block transitions ([`builder`]), memoizing point lookups per
//! user ([`cache`]). The resulting [`InteractionGraph`] is written to and
//! read from a sorted, tab-separated text file ([`codec`]). At query time
//! a single block's interaction profile is derived from the graph
//! ([`query`]).

pub mod builder;
pub mod cache;
pub mod codec;
pub mod query;

pub use builder::{BuildStats, InteractionGraphBuilder, build};
pub use cache::UserTrailCache;
pub use codec::{CodecError, dump, dump_to_path, load, load_from_path};
pub use hotspot_interaction_models::{EdgeMode, InteractionGraph, Targets, WeightedBlock};
pub use query::{InteractionIndex, interaction_counts, normalize, query};

#[cfg(test)]
pub(crate) mod test_support {
    use geo::{LineString, MultiPolygon, Polygon};
    use hotspot_geography_models::{BlockId, Point};
    use hotspot_spatial::{Block, BlockIndex};

    pub fn id(s: &str) -> BlockId {
        BlockId::from(s)
    }

    pub fn square(id: &str, x0: f64, y0: f64, x1: f64, y1: f64) -> Block {
        let ring = LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]);
        Block::new(id, MultiPolygon(vec![Polygon::new(ring, vec![])]))
    }

    /// Four unit squares side by side along the x axis: `A` `B` `C` `D`.
    pub fn row_index() -> BlockIndex {
        BlockIndex::new(vec![
            square("A", 0.0, 0.0, 1.0, 1.0),
            square("B", 1.0, 0.0, 2.0, 1.0),
            square("C", 2.0, 0.0, 3.0, 1.0),
            square("D", 3.0, 0.0, 4.0, 1.0),
        ])
    }

    /// A point in the interior of the block at `column` of [`row_index`].
    pub fn in_column(column: u8) -> Point {
        Point::new(f64::from(column) + 0.5, 0.5)
    }

    /// A point outside every block of [`row_index`].
    pub const OUTSIDE: Point = Point::new(-10.0, -10.0);
}

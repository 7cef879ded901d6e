//! Per-user memo of point-to-block resolutions.

use std::collections::BTreeMap;

use hotspot_geography_models::{BlockId, Point, PointKey};
use hotspot_spatial::BlockIndex;

/// Remembers which block (if any) each distinct point of one user's trail
/// resolved to.
///
/// A cache belongs to exactly one user's processing and is dropped when
/// that user is done. Resolution is a pure function of the point and the
/// block set, so the cache only saves work and never changes a result.
#[derive(Debug, Default)]
pub struct UserTrailCache<'a> {
    resolved: BTreeMap<PointKey, Option<&'a BlockId>>,
    hits: u64,
    misses: u64,
}

impl<'a> UserTrailCache<'a> {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the block containing `point`, resolving it through `index`
    /// only the first time this exact point is seen.
    pub fn lookup_or_resolve(&mut self, point: &Point, index: &'a BlockIndex) -> Option<&'a BlockId> {
        let key = point.key();
        if let Some(&block) = self.resolved.get(&key) {
            self.hits += 1;
            return block;
        }

        self.misses += 1;
        let block = index.resolve(point);
        self.resolved.insert(key, block);
        block
    }

    /// Lookups answered from the cache.
    #[must_use]
    pub const fn hits(&self) -> u64 {
        self.hits
    }

    /// Lookups that went to the index.
    #[must_use]
    pub const fn misses(&self) -> u64 {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{OUTSIDE, id, in_column, row_index};

    #[test]
    fn repeated_points_hit_the_cache() {
        let index = row_index();
        let mut cache = UserTrailCache::new();

        assert_eq!(cache.lookup_or_resolve(&in_column(0), &index), Some(&id("A")));
        assert_eq!(cache.lookup_or_resolve(&in_column(0), &index), Some(&id("A")));
        assert_eq!(cache.lookup_or_resolve(&in_column(1), &index), Some(&id("B")));

        assert_eq!(cache.misses(), 2);
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn unresolvable_points_are_cached_too() {
        let index = row_index();
        let mut cache = UserTrailCache::new();

        assert_eq!(cache.lookup_or_resolve(&OUTSIDE, &index), None);
        assert_eq!(cache.lookup_or_resolve(&OUTSIDE, &index), None);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn cached_result_matches_direct_resolution() {
        let index = row_index();
        let mut cache = UserTrailCache::new();
        for column in [0, 3, 1, 3, 0, 2] {
            let point = in_column(column);
            assert_eq!(cache.lookup_or_resolve(&point, &index), index.resolve(&point));
        }
    }
}

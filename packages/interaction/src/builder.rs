//! Turns per-user check-in trails into an [`InteractionGraph`].
//!
//! Every pair of consecutive points in a user's trail is one candidate
//! transition. Both endpoints are resolved to blocks; pairs with an
//! endpoint outside every block are dropped, all others increment the
//! `source -> target` count (self transitions included).

use std::collections::BTreeMap;

use hotspot_geography_models::Point;
use hotspot_interaction_models::InteractionGraph;
use hotspot_spatial::BlockIndex;

use crate::cache::UserTrailCache;

/// Default number of trails between progress log lines.
const DEFAULT_LOG_INTERVAL: u64 = 10_000;

/// Counters collected while building a graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Trails processed.
    pub users: u64,
    /// Consecutive point pairs examined.
    pub pairs: u64,
    /// Pairs recorded as transitions.
    pub transitions: u64,
    /// Pairs dropped because an endpoint is outside every block.
    pub skipped: u64,
    /// Point lookups answered from a user's cache.
    pub cache_hits: u64,
    /// Point lookups that went to the block index.
    pub cache_misses: u64,
}

/// Accumulates transitions from many users into one graph.
pub struct InteractionGraphBuilder<'a> {
    index: &'a BlockIndex,
    graph: InteractionGraph,
    stats: BuildStats,
    log_interval: u64,
}

impl<'a> InteractionGraphBuilder<'a> {
    /// Creates a builder resolving points against `index`.
    #[must_use]
    pub fn new(index: &'a BlockIndex) -> Self {
        Self {
            index,
            graph: InteractionGraph::new(),
            stats: BuildStats::default(),
            log_interval: DEFAULT_LOG_INTERVAL,
        }
    }

    /// Sets how many trails pass between progress log lines. Zero disables
    /// progress logging.
    #[must_use]
    pub const fn with_log_interval(mut self, log_interval: u64) -> Self {
        self.log_interval = log_interval;
        self
    }

    /// Adds one user's ordered trail.
    ///
    /// Each call gets its own [`UserTrailCache`], so lookups are never
    /// shared between users.
    pub fn add_trail(&mut self, points: &[Point]) {
        let mut cache = UserTrailCache::new();

        for pair in points.windows(2) {
            self.stats.pairs += 1;
            let source = cache.lookup_or_resolve(&pair[0], self.index);
            let target = cache.lookup_or_resolve(&pair[1], self.index);

            let (Some(source), Some(target)) = (source, target) else {
                self.stats.skipped += 1;
                continue;
            };

            self.graph.record(source, target);
            self.stats.transitions += 1;
        }

        self.stats.users += 1;
        self.stats.cache_hits += cache.hits();
        self.stats.cache_misses += cache.misses();

        if self.log_interval > 0 && self.stats.users % self.log_interval == 0 {
            log::info!(
                "users: {}\ttransitions: {}\tskipped: {}",
                self.stats.users,
                self.stats.transitions,
                self.stats.skipped
            );
        }
    }

    /// Counters so far.
    #[must_use]
    pub const fn stats(&self) -> BuildStats {
        self.stats
    }

    /// Consumes the builder and returns the graph.
    #[must_use]
    pub fn finish(self) -> InteractionGraph {
        log::info!(
            "Built interaction graph: {} users, {} transitions ({} skipped), {} sources, {} edges",
            self.stats.users,
            self.stats.transitions,
            self.stats.skipped,
            self.graph.source_count(),
            self.graph.edge_count()
        );
        self.graph
    }
}

/// Builds the interaction graph for every user's trail.
///
/// The result does not depend on the order users are visited in.
#[must_use]
pub fn build<U>(sequences: &BTreeMap<U, Vec<Point>>, index: &BlockIndex) -> InteractionGraph {
    let mut builder = InteractionGraphBuilder::new(index);
    for points in sequences.values() {
        builder.add_trail(points);
    }
    builder.finish()
}

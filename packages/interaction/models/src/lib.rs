#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Block interaction graph and query result types.
//!
//! The [`InteractionGraph`] counts how often users moved from one block to
//! another between consecutive check-ins. It is written once by the build
//! pass and read many times by the query server.

use std::collections::BTreeMap;
use std::collections::btree_map;

use hotspot_geography_models::BlockId;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Outgoing transition counts for one source block, keyed by target block.
pub type Targets = BTreeMap<BlockId, u64>;

/// Weighted directed graph of block-to-block transitions.
///
/// Absence of an edge means a count of zero. The builder never stores
/// explicit zeros, and every source present has at least one target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionGraph {
    edges: BTreeMap<BlockId, Targets>,
}

impl InteractionGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `count` transitions from `source` to `target`.
    pub fn add(&mut self, source: BlockId, target: BlockId, count: u64) {
        *self
            .edges
            .entry(source)
            .or_default()
            .entry(target)
            .or_insert(0) += count;
    }

    /// Records a single transition from `source` to `target`.
    pub fn record(&mut self, source: &BlockId, target: &BlockId) {
        if let Some(targets) = self.edges.get_mut(source) {
            *targets.entry(target.clone()).or_insert(0) += 1;
        } else {
            self.edges
                .insert(source.clone(), BTreeMap::from([(target.clone(), 1)]));
        }
    }

    /// Replaces the outgoing edges of `source`, returning the previous ones.
    pub fn insert(&mut self, source: BlockId, targets: Targets) -> Option<Targets> {
        self.edges.insert(source, targets)
    }

    /// Outgoing edges of `source`, if it has any.
    #[must_use]
    pub fn targets(&self, source: &BlockId) -> Option<&Targets> {
        self.edges.get(source)
    }

    /// Transition count from `source` to `target` (zero when absent).
    #[must_use]
    pub fn count(&self, source: &BlockId, target: &BlockId) -> u64 {
        self.edges
            .get(source)
            .and_then(|targets| targets.get(target))
            .copied()
            .unwrap_or(0)
    }

    /// Iterates sources and their targets in ascending block id order.
    pub fn iter(&self) -> btree_map::Iter<'_, BlockId, Targets> {
        self.edges.iter()
    }

    /// Adds every count of `other` into this graph.
    pub fn merge(&mut self, other: &Self) {
        for (source, targets) in other {
            for (target, count) in targets {
                self.add(source.clone(), target.clone(), *count);
            }
        }
    }

    /// Number of sources with outgoing edges.
    #[must_use]
    pub fn source_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of distinct `(source, target)` edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeMap::len).sum()
    }

    /// Sum of all transition counts.
    #[must_use]
    pub fn total_transitions(&self) -> u64 {
        self.edges.values().flat_map(BTreeMap::values).sum()
    }

    /// Sum of self-transition counts (`source == target`).
    #[must_use]
    pub fn self_transitions(&self) -> u64 {
        self.edges
            .iter()
            .filter_map(|(source, targets)| targets.get(source))
            .sum()
    }

    /// Whether the graph has no edges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

impl<'a> IntoIterator for &'a InteractionGraph {
    type Item = (&'a BlockId, &'a Targets);
    type IntoIter = btree_map::Iter<'a, BlockId, Targets>;

    fn into_iter(self) -> Self::IntoIter {
        self.edges.iter()
    }
}

/// Whether a query reports only outgoing transitions or also folds in
/// transitions arriving from other blocks.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EdgeMode {
    /// Outgoing transitions only.
    Directed,
    /// Outgoing plus incoming transitions from other blocks.
    Undirected,
}

impl EdgeMode {
    /// Whether this is [`EdgeMode::Directed`].
    #[must_use]
    pub const fn is_directed(self) -> bool {
        matches!(self, Self::Directed)
    }
}

/// One entry of a normalized interaction profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightedBlock {
    /// Target block.
    pub block_id: BlockId,
    /// Count divided by the largest count in the profile, in `(0, 1]`.
    pub weight: f64,
}

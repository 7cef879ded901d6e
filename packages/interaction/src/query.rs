//! Interaction profile of a single block.
//!
//! Given a query point, the containing block's outgoing transition counts
//! are copied out of the graph, optionally combined with the counts of
//! transitions arriving from other blocks, and scaled so the strongest
//! interaction has weight 1.0.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use hotspot_geography_models::{BlockId, Point};
use hotspot_interaction_models::{EdgeMode, InteractionGraph, Targets, WeightedBlock};
use hotspot_spatial::BlockIndex;

/// Raw interaction counts of `source` (before normalization).
///
/// Returns `None` when `source` has no outgoing edges in `graph`. The
/// returned map is a private copy; the graph is never modified.
///
/// In [`EdgeMode::Undirected`], every other block `t` with an edge
/// `t -> source` adds that count to `t`'s entry. A self-loop on `source`
/// is kept from the outgoing edges but never added a second time.
#[must_use]
pub fn interaction_counts(
    source: &BlockId,
    graph: &InteractionGraph,
    mode: EdgeMode,
) -> Option<Targets> {
    let mut edges = graph.targets(source)?.clone();

    if mode == EdgeMode::Undirected {
        for (other, targets) in graph {
            if other == source {
                continue;
            }
            if let Some(count) = targets.get(source) {
                *edges.entry(other.clone()).or_insert(0) += count;
            }
        }
    }

    Some(edges)
}

/// Scales `counts` by their maximum.
///
/// Every entry is kept, so a zero count becomes a weight of 0.0 and the
/// largest is exactly 1.0. An empty input, or one whose counts are all
/// zero, yields an empty profile. Entries are ordered by weight, strongest
/// first, ties by block id.
#[must_use]
pub fn normalize(counts: Targets) -> Vec<WeightedBlock> {
    let mut entries: Vec<(BlockId, u64)> = counts.into_iter().collect();
    let max_count = entries.iter().map(|(_, count)| *count).max().unwrap_or(0);
    if max_count == 0 {
        return Vec::new();
    }

    entries.sort_by(|(a_id, a_count), (b_id, b_count)| {
        Reverse(a_count).cmp(&Reverse(b_count)).then_with(|| a_id.cmp(b_id))
    });

    #[allow(clippy::cast_precision_loss)]
    let max_count = max_count as f64;

    entries
        .into_iter()
        .map(|(block_id, count)| {
            #[allow(clippy::cast_precision_loss)]
            let weight = count as f64 / max_count;
            WeightedBlock { block_id, weight }
        })
        .collect()
}

/// Interaction profile of the block containing `point`.
///
/// Returns an empty list when the point is outside every block or its block
/// has no recorded interactions; the two cases are not distinguished.
#[must_use]
pub fn query(
    point: &Point,
    index: &BlockIndex,
    graph: &InteractionGraph,
    mode: EdgeMode,
) -> Vec<WeightedBlock> {
    index
        .resolve(point)
        .and_then(|source| interaction_counts(source, graph, mode))
        .map(normalize)
        .unwrap_or_default()
}

/// A loaded graph plus its transpose, for serving many queries.
///
/// The transpose (`target -> source -> count`) is built once so an
/// undirected query reads the incoming edges of one block instead of
/// scanning every source in the graph. Results are identical to
/// [`query`].
#[derive(Debug, Clone, Default)]
pub struct InteractionIndex {
    graph: InteractionGraph,
    incoming: BTreeMap<BlockId, Targets>,
}

impl InteractionIndex {
    /// Builds the transpose of `graph`.
    #[must_use]
    pub fn new(graph: InteractionGraph) -> Self {
        let mut incoming: BTreeMap<BlockId, Targets> = BTreeMap::new();
        for (source, targets) in &graph {
            for (target, count) in targets {
                incoming
                    .entry(target.clone())
                    .or_default()
                    .insert(source.clone(), *count);
            }
        }

        Self { graph, incoming }
    }

    /// The underlying graph.
    #[must_use]
    pub const fn graph(&self) -> &InteractionGraph {
        &self.graph
    }

    /// Same as [`interaction_counts`], using the prebuilt transpose.
    #[must_use]
    pub fn counts(&self, source: &BlockId, mode: EdgeMode) -> Option<Targets> {
        let mut edges = self.graph.targets(source)?.clone();

        if mode == EdgeMode::Undirected
            && let Some(arrivals) = self.incoming.get(source)
        {
            for (other, count) in arrivals {
                if other != source {
                    *edges.entry(other.clone()).or_insert(0) += count;
                }
            }
        }

        Some(edges)
    }

    /// Normalized profile of `source`.
    #[must_use]
    pub fn profile(&self, source: &BlockId, mode: EdgeMode) -> Vec<WeightedBlock> {
        self.counts(source, mode).map(normalize).unwrap_or_default()
    }

    /// Same as [`query`], using the prebuilt transpose.
    #[must_use]
    pub fn query(&self, point: &Point, index: &BlockIndex, mode: EdgeMode) -> Vec<WeightedBlock> {
        index
            .resolve(point)
            .map(|source| self.profile(source, mode))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{OUTSIDE, id, in_column, row_index};

    const TOLERANCE: f64 = 1e-9;

    fn graph_a() -> InteractionGraph {
        let mut graph = InteractionGraph::new();
        graph.add(id("A"), id("B"), 2);
        graph.add(id("A"), id("C"), 4);
        graph
    }

    fn graph_a_d() -> InteractionGraph {
        let mut graph = graph_a();
        graph.add(id("D"), id("A"), 6);
        graph
    }

    fn weights(profile: &[WeightedBlock]) -> BTreeMap<String, f64> {
        profile
            .iter()
            .map(|w| (w.block_id.to_string(), w.weight))
            .collect()
    }

    fn assert_weights(profile: &[WeightedBlock], expected: &[(&str, f64)]) {
        let actual = weights(profile);
        assert_eq!(actual.len(), expected.len(), "profile: {profile:?}");
        for (block, weight) in expected {
            let got = actual[*block];
            assert!(
                (got - weight).abs() < TOLERANCE,
                "weight for {block}: expected {weight}, got {got}"
            );
        }
    }

    #[test]
    fn directed_query_normalizes_outgoing_counts() {
        let index = row_index();
        let profile = query(&in_column(0), &index, &graph_a(), EdgeMode::Directed);
        assert_weights(&profile, &[("B", 0.5), ("C", 1.0)]);
    }

    #[test]
    fn directed_query_ignores_incoming_edges() {
        let index = row_index();
        let profile = query(&in_column(0), &index, &graph_a_d(), EdgeMode::Directed);
        assert_weights(&profile, &[("B", 0.5), ("C", 1.0)]);
    }

    #[test]
    fn undirected_query_folds_in_incoming_edges() {
        let index = row_index();
        let profile = query(&in_column(0), &index, &graph_a_d(), EdgeMode::Undirected);
        assert_weights(&profile, &[("B", 2.0 / 6.0), ("C", 4.0 / 6.0), ("D", 1.0)]);
    }

    #[test]
    fn undirected_fold_adds_to_existing_forward_edge() {
        let mut graph = graph_a();
        graph.add(id("B"), id("A"), 6);
        let counts = interaction_counts(&id("A"), &graph, EdgeMode::Undirected).unwrap();
        assert_eq!(counts, Targets::from([(id("B"), 8), (id("C"), 4)]));
    }

    #[test]
    fn undirected_fold_does_not_double_self_loops() {
        let mut graph = graph_a();
        graph.add(id("A"), id("A"), 3);
        let counts = interaction_counts(&id("A"), &graph, EdgeMode::Undirected).unwrap();
        assert_eq!(counts[&id("A")], 3);
    }

    #[test]
    fn query_never_mutates_the_graph() {
        let index = row_index();
        let graph = graph_a_d();
        let before = graph.clone();
        let _ = query(&in_column(0), &index, &graph, EdgeMode::Undirected);
        assert_eq!(graph, before);
    }

    #[test]
    fn point_outside_every_block_is_empty() {
        let index = row_index();
        for mode in [EdgeMode::Directed, EdgeMode::Undirected] {
            assert!(query(&OUTSIDE, &index, &graph_a_d(), mode).is_empty());
        }
    }

    #[test]
    fn block_without_outgoing_edges_is_empty() {
        let index = row_index();
        // C only receives transitions.
        for mode in [EdgeMode::Directed, EdgeMode::Undirected] {
            assert!(query(&in_column(2), &index, &graph_a_d(), mode).is_empty());
        }
    }

    #[test]
    fn normalize_handles_empty_and_all_zero_counts() {
        assert!(normalize(Targets::new()).is_empty());
        assert!(normalize(Targets::from([(id("A"), 0)])).is_empty());
        assert!(normalize(Targets::from([(id("A"), 0), (id("B"), 0)])).is_empty());
    }

    #[test]
    fn normalize_keeps_zero_counts_beside_positive_ones() {
        let profile = normalize(Targets::from([(id("B"), 0), (id("C"), 2)]));
        assert_eq!(profile.len(), 2);
        assert_eq!(profile[0].block_id, id("C"));
        assert!((profile[0].weight - 1.0).abs() < TOLERANCE);
        assert_eq!(profile[1].block_id, id("B"));
        assert!(profile[1].weight.abs() < TOLERANCE);
    }

    #[test]
    fn profile_is_ranked_strongest_first() {
        let counts = Targets::from([(id("x"), 1), (id("b"), 5), (id("a"), 5), (id("9"), 2)]);
        let order: Vec<String> = normalize(counts)
            .into_iter()
            .map(|w| w.block_id.to_string())
            .collect();
        assert_eq!(order, vec!["a", "b", "9", "x"]);
    }

    #[test]
    fn transpose_matches_scanning_query() {
        let index = row_index();
        let mut graph = graph_a_d();
        graph.add(id("B"), id("A"), 1);
        graph.add(id("A"), id("A"), 2);
        graph.add(id("C"), id("D"), 9);
        let interactions = InteractionIndex::new(graph.clone());

        for column in 0..4 {
            for mode in [EdgeMode::Directed, EdgeMode::Undirected] {
                let point = in_column(column);
                assert_eq!(
                    interactions.query(&point, &index, mode),
                    query(&point, &index, &graph, mode),
                    "column {column}, {mode}"
                );
            }
        }
        assert_eq!(interactions.graph(), &graph);
    }
}

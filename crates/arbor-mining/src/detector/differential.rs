//! Per-cluster occurrence table for patterns mined over several clusters.

use arbor_core::config::DifferentialConfig;
use arbor_core::types::{ClusterId, FxHashSet, PatternId};
use serde::Serialize;
use tracing::debug;

use crate::cluster::{ClusterInfo, ClusterRegistry};
use crate::tracable::{PatternArena, TracablePattern};

/// How often one pattern occurs in one cluster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClusterSupport {
    pub cluster: ClusterId,
    pub occurrences: usize,
    pub trees: usize,
    /// Share of the cluster's trees the pattern occurs in.
    pub support: f64,
}

/// Difference between two clusters, `a` minus `b`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PairDifferential {
    pub a: ClusterId,
    pub b: ClusterId,
    pub occurrence_delta: i64,
    pub support_delta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DifferentialRow {
    pub pattern: PatternId,
    pub size: usize,
    pub clusters: Vec<ClusterSupport>,
    /// Every ordered pair of distinct clusters.
    pub pairs: Vec<PairDifferential>,
}

impl DifferentialRow {
    fn build(pattern: &TracablePattern, registry: &ClusterRegistry) -> Self {
        let clusters: Vec<ClusterSupport> = registry
            .iter()
            .map(|info| {
                let trees = pattern.cluster_tree_count(info.id);
                ClusterSupport {
                    cluster: info.id,
                    occurrences: pattern.cluster_count(info.id),
                    trees,
                    support: if info.tree_count == 0 {
                        0.0
                    } else {
                        trees as f64 / info.tree_count as f64
                    },
                }
            })
            .collect();

        let mut pairs = Vec::with_capacity(clusters.len() * clusters.len().saturating_sub(1));
        for a in &clusters {
            for b in clusters.iter().filter(|b| b.cluster != a.cluster) {
                pairs.push(PairDifferential {
                    a: a.cluster,
                    b: b.cluster,
                    occurrence_delta: a.occurrences as i64 - b.occurrences as i64,
                    support_delta: a.support - b.support,
                });
            }
        }

        Self {
            pattern: pattern.id(),
            size: pattern.size(),
            clusters,
            pairs,
        }
    }

    pub fn cluster(&self, id: ClusterId) -> Option<&ClusterSupport> {
        self.clusters.iter().find(|c| c.cluster == id)
    }

    pub fn pair(&self, a: ClusterId, b: ClusterId) -> Option<&PairDifferential> {
        self.pairs.iter().find(|p| p.a == a && p.b == b)
    }
}

/// Similarity and differential thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifferentialFilter {
    pub min_similarity: f64,
    pub max_similarity: f64,
    pub min_differential: f64,
    pub max_differential: f64,
}

impl DifferentialFilter {
    pub fn new(min_similarity: f64, max_similarity: f64, min_differential: f64, max_differential: f64) -> Self {
        Self {
            min_similarity,
            max_similarity,
            min_differential,
            max_differential,
        }
    }

    pub fn from_config(config: &DifferentialConfig) -> Self {
        Self::new(
            config.effective_min_similarity(),
            config.effective_max_similarity(),
            config.effective_min_differential(),
            config.effective_max_differential(),
        )
    }

    /// A filter that accepts every row.
    pub fn is_trivial(&self) -> bool {
        self.min_similarity <= 0.0
            && self.max_similarity >= 1.0
            && self.min_differential <= 0.0
            && self.max_differential >= 1.0
    }

    pub fn accepts_pair(&self, pair: &PairDifferential) -> bool {
        let delta = pair.support_delta.abs();
        delta >= self.min_differential && delta <= self.max_differential
    }

    /// The pattern's tree count within `[floor(n * min), ceil(n * max)]`
    /// for a cluster of `cluster_trees` trees.
    pub fn accepts_cluster(&self, support: &ClusterSupport, cluster_trees: usize) -> bool {
        let n = cluster_trees as f64;
        let low = (n * self.min_similarity).floor() as usize;
        let high = (n * self.max_similarity).ceil() as usize;
        (low..=high).contains(&support.trees)
    }
}

impl Default for DifferentialFilter {
    fn default() -> Self {
        Self::from_config(&DifferentialConfig::default())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DifferentialTable {
    pub clusters: Vec<ClusterInfo>,
    rows: Vec<DifferentialRow>,
}

impl DifferentialTable {
    /// One row per known id, in the order given.
    pub fn build(registry: &ClusterRegistry, arena: &PatternArena, ids: &[PatternId]) -> Self {
        let rows = ids
            .iter()
            .filter_map(|&id| arena.get(id))
            .map(|p| DifferentialRow::build(p, registry))
            .collect();
        Self {
            clusters: registry.iter().cloned().collect(),
            rows,
        }
    }

    /// Drops failing pairs; a pair needs both clusters within the similarity
    /// bounds. Rows left without a pair are removed.
    pub fn filter(&mut self, filter: &DifferentialFilter) {
        let before = self.rows.len();
        let sizes: Vec<(ClusterId, usize)> = self.clusters.iter().map(|c| (c.id, c.tree_count)).collect();
        for row in &mut self.rows {
            let similar: FxHashSet<ClusterId> = row
                .clusters
                .iter()
                .filter(|c| {
                    sizes
                        .iter()
                        .find(|(id, _)| *id == c.cluster)
                        .is_some_and(|&(_, n)| filter.accepts_cluster(c, n))
                })
                .map(|c| c.cluster)
                .collect();
            row.pairs
                .retain(|p| similar.contains(&p.a) && similar.contains(&p.b) && filter.accepts_pair(p));
        }
        self.rows.retain(|row| !row.pairs.is_empty());
        debug!(before, after = self.rows.len(), "filtered differential table");
    }

    /// Keeps the rows of `ids` only.
    pub fn retain(&mut self, ids: &[PatternId]) {
        let keep: FxHashSet<PatternId> = ids.iter().copied().collect();
        self.rows.retain(|row| keep.contains(&row.pattern));
    }

    pub fn rows(&self) -> &[DifferentialRow] {
        &self.rows
    }

    pub fn row(&self, pattern: PatternId) -> Option<&DifferentialRow> {
        self.rows.iter().find(|r| r.pattern == pattern)
    }

    pub fn pattern_ids(&self) -> Vec<PatternId> {
        self.rows.iter().map(|r| r.pattern).collect()
    }

    /// Patterns occurring at least once in `cluster`.
    pub fn patterns_for(&self, cluster: ClusterId) -> Vec<PatternId> {
        self.rows
            .iter()
            .filter(|r| r.cluster(cluster).is_some_and(|c| c.occurrences > 0))
            .map(|r| r.pattern)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::test_support::{make_pattern, make_registry};

    fn make_table() -> (DifferentialTable, PatternId, PatternId) {
        let registry = make_registry(&[2, 2]);
        let mut arena = PatternArena::new();
        // both trees of cluster 1, none of cluster 2
        let skewed = make_pattern(&arena, &[(1, 1), (1, 2)]);
        // one tree of each, twice in tree 3
        let even = make_pattern(&arena, &[(1, 1), (2, 3), (2, 3)]);
        let skewed = arena.insert(skewed);
        let even = arena.insert(even);
        (DifferentialTable::build(&registry, &arena, &[skewed, even]), skewed, even)
    }

    #[test]
    fn rows_hold_every_ordered_pair() {
        let (table, skewed, even) = make_table();
        let row = table.row(skewed).unwrap();
        assert_eq!(row.pairs.len(), 2);
        assert_eq!(row.pair(1, 2).unwrap().occurrence_delta, 2);
        assert_eq!(row.pair(2, 1).unwrap().support_delta, -1.0);

        let row = table.row(even).unwrap();
        assert_eq!(row.cluster(2).unwrap().occurrences, 2);
        assert_eq!(row.cluster(2).unwrap().trees, 1);
        assert_eq!(row.pair(1, 2).unwrap().occurrence_delta, -1);
        assert_eq!(row.pair(1, 2).unwrap().support_delta, 0.0);
        assert_eq!(table.patterns_for(2), vec![even]);
    }

    #[test]
    fn default_filter_keeps_large_differences() {
        let (mut table, skewed, _) = make_table();
        let filter = DifferentialFilter::default();
        assert!(!filter.is_trivial());
        table.filter(&filter);
        // only cluster 1 is similar enough for the skewed pattern, and a
        // pair needs both clusters; nothing survives
        assert!(table.is_empty());

        let (mut table, _, _) = make_table();
        table.filter(&DifferentialFilter::new(0.0, 1.0, 0.5, 1.0));
        assert_eq!(table.pattern_ids(), vec![skewed]);
    }

    #[test]
    fn trivial_filter_accepts_everything() {
        let filter = DifferentialFilter::new(0.0, 1.0, 0.0, 1.0);
        assert!(filter.is_trivial());
        let (mut table, _, _) = make_table();
        table.filter(&filter);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn cluster_bounds_round_outwards() {
        let filter = DifferentialFilter::new(0.5, 0.5, 0.0, 1.0);
        let support = |trees| ClusterSupport {
            cluster: 1,
            occurrences: trees,
            trees,
            support: 0.0,
        };
        // floor(1.5) = 1, ceil(1.5) = 2
        assert!(!filter.accepts_cluster(&support(0), 3));
        assert!(filter.accepts_cluster(&support(1), 3));
        assert!(filter.accepts_cluster(&support(2), 3));
        assert!(!filter.accepts_cluster(&support(3), 3));
    }

    #[test]
    fn retain_keeps_named_rows() {
        let (mut table, skewed, even) = make_table();
        table.retain(&[even]);
        assert!(table.row(skewed).is_none());
        assert_eq!(table.len(), 1);
    }
}

//! Discriminative metrics comparing tree shares between clusters.

use arbor_core::errors::MetricError;
use arbor_core::types::ClusterId;

use super::{check_range, cluster_size, share, Metric, MetricContext};
use crate::cluster::ClusterRegistry;
use crate::tracable::TracablePattern;

/// A target cluster (optional) and the clusters it is contrasted with.
#[derive(Debug, Clone, Default)]
pub(crate) struct Contrast {
    target: Option<ClusterId>,
    opposites: Option<Vec<ClusterId>>,
    target_size: Option<(ClusterId, usize)>,
    opposite_sizes: Vec<(ClusterId, usize)>,
}

impl Contrast {
    pub(crate) fn new(
        target: Option<ClusterId>,
        opposites: Option<Vec<ClusterId>>,
    ) -> Result<Self, MetricError> {
        if let (Some(t), Some(list)) = (target, &opposites) {
            if list.contains(&t) {
                return Err(MetricError::TargetInOpposites { cluster: t });
            }
        }
        Ok(Self {
            target,
            opposites,
            ..Default::default()
        })
    }

    /// Without an explicit list every non-target cluster is an opposite.
    pub(crate) fn init(&mut self, clusters: &ClusterRegistry) -> Result<(), MetricError> {
        self.target_size = match self.target {
            Some(t) => Some((t, cluster_size(clusters, t)?)),
            None => None,
        };
        self.opposite_sizes = match &self.opposites {
            Some(ids) => ids
                .iter()
                .map(|&id| cluster_size(clusters, id).map(|n| (id, n)))
                .collect::<Result<_, _>>()?,
            None => clusters
                .iter()
                .filter(|c| Some(c.id) != self.target)
                .map(|c| (c.id, c.tree_count))
                .collect(),
        };
        Ok(())
    }

    pub(crate) fn has_target(&self) -> bool {
        self.target_size.is_some()
    }

    pub(crate) fn target_trees(&self, pattern: &TracablePattern) -> usize {
        self.target_size
            .map_or(0, |(t, _)| pattern.cluster_tree_count(t))
    }

    pub(crate) fn opposite_trees<'a>(
        &'a self,
        pattern: &'a TracablePattern,
    ) -> impl Iterator<Item = usize> + 'a {
        self.opposite_sizes
            .iter()
            .map(move |&(c, _)| pattern.cluster_tree_count(c))
    }

    fn target_share(&self, pattern: &TracablePattern) -> f64 {
        self.target_size.map_or(0.0, |(t, n)| share(pattern, t, n))
    }

    fn opposite_shares(&self, pattern: &TracablePattern) -> Vec<f64> {
        self.opposite_sizes
            .iter()
            .map(|&(c, n)| share(pattern, c, n))
            .collect()
    }

    /// |target share - opposite share| for every opposite.
    pub(crate) fn target_diffs(&self, pattern: &TracablePattern) -> Vec<f64> {
        let t = self.target_share(pattern);
        self.opposite_shares(pattern)
            .into_iter()
            .map(|s| (t - s).abs())
            .collect()
    }

    /// For every opposite, its share differences to all *other* opposites.
    pub(crate) fn pairwise_diffs(&self, pattern: &TracablePattern) -> Vec<Vec<f64>> {
        let shares = self.opposite_shares(pattern);
        shares
            .iter()
            .enumerate()
            .map(|(i, a)| {
                shares
                    .iter()
                    .enumerate()
                    .filter(|&(j, _)| j != i)
                    .map(|(_, b)| (a - b).abs())
                    .collect()
            })
            .collect()
    }

    /// Largest target difference, or the smallest pairwise difference over
    /// all opposites when there is no target.
    pub(crate) fn rank(&self, pattern: &TracablePattern) -> f64 {
        if self.has_target() {
            return self.target_diffs(pattern).into_iter().fold(0.0, f64::max);
        }
        self.pairwise_diffs(pattern)
            .into_iter()
            .map(|diffs| diffs.into_iter().fold(f64::INFINITY, f64::min))
            .map(|d| if d.is_finite() { d } else { 0.0 })
            .fold(1.0, f64::min)
    }
}

/// Keeps patterns whose tree share differs between clusters by `[min, max]`.
///
/// With a target, one opposite in range suffices. Without one, every
/// opposite needs another opposite in range. Applicable patterns are not
/// grown further.
#[derive(Debug, Clone)]
pub struct DifferenceMetric {
    contrast: Contrast,
    min_differential: f64,
    max_differential: f64,
}

impl DifferenceMetric {
    pub fn new(
        target: Option<ClusterId>,
        opposites: Option<Vec<ClusterId>>,
        min_differential: f64,
        max_differential: f64,
    ) -> Result<Self, MetricError> {
        check_range("differential", min_differential, max_differential)?;
        Ok(Self {
            contrast: Contrast::new(target, opposites)?,
            min_differential,
            max_differential,
        })
    }

    fn in_range(&self, diff: f64) -> bool {
        self.min_differential <= diff && diff <= self.max_differential
    }
}

impl Metric for DifferenceMetric {
    fn name(&self) -> &'static str {
        "difference"
    }

    fn init(&mut self, clusters: &ClusterRegistry) -> Result<(), MetricError> {
        self.contrast.init(clusters)
    }

    fn applicable(&self, pattern: &TracablePattern, _ctx: &MetricContext<'_>) -> bool {
        if self.contrast.has_target() {
            return self
                .contrast
                .target_diffs(pattern)
                .into_iter()
                .any(|d| self.in_range(d));
        }
        let pairwise = self.contrast.pairwise_diffs(pattern);
        !pairwise.is_empty()
            && pairwise
                .into_iter()
                .all(|diffs| diffs.into_iter().any(|d| self.in_range(d)))
    }

    fn expand(&self, pattern: &TracablePattern, ctx: &MetricContext<'_>) -> bool {
        !self.applicable(pattern, ctx)
    }

    fn rank(&self, pattern: &TracablePattern, _ctx: &MetricContext<'_>) -> f64 {
        self.contrast.rank(pattern)
    }
}

/// [`DifferenceMetric`] that only grows a pattern while its difference
/// strictly improves over its origin. Ranks by that improvement.
#[derive(Debug, Clone)]
pub struct DifferenceMustGrowMetric {
    inner: DifferenceMetric,
}

impl DifferenceMustGrowMetric {
    pub fn new(
        target: Option<ClusterId>,
        opposites: Option<Vec<ClusterId>>,
        min_differential: f64,
        max_differential: f64,
    ) -> Result<Self, MetricError> {
        Ok(Self {
            inner: DifferenceMetric::new(target, opposites, min_differential, max_differential)?,
        })
    }
}

impl Metric for DifferenceMustGrowMetric {
    fn name(&self) -> &'static str {
        "difference_must_grow"
    }

    fn init(&mut self, clusters: &ClusterRegistry) -> Result<(), MetricError> {
        self.inner.init(clusters)
    }

    fn applicable(&self, pattern: &TracablePattern, ctx: &MetricContext<'_>) -> bool {
        self.inner.applicable(pattern, ctx)
    }

    fn expand(&self, pattern: &TracablePattern, ctx: &MetricContext<'_>) -> bool {
        match ctx.origin(pattern) {
            None => true,
            Some(origin) => self.inner.rank(pattern, ctx) - self.inner.rank(origin, ctx) > 0.0,
        }
    }

    fn rank(&self, pattern: &TracablePattern, ctx: &MetricContext<'_>) -> f64 {
        let own = self.inner.rank(pattern, ctx);
        match ctx.origin(pattern) {
            None => own,
            Some(origin) => own - self.inner.rank(origin, ctx),
        }
    }
}

/// Keeps patterns that have no counterexample: with a target, patterns
/// absent from the target or from every opposite; without one, patterns
/// absent from at least one opposite.
#[derive(Debug, Clone)]
pub struct NoCounterexampleMetric {
    contrast: Contrast,
}

impl NoCounterexampleMetric {
    pub fn new(
        target: Option<ClusterId>,
        opposites: Option<Vec<ClusterId>>,
    ) -> Result<Self, MetricError> {
        Ok(Self {
            contrast: Contrast::new(target, opposites)?,
        })
    }
}

impl Metric for NoCounterexampleMetric {
    fn name(&self) -> &'static str {
        "no_counterexample"
    }

    fn init(&mut self, clusters: &ClusterRegistry) -> Result<(), MetricError> {
        self.contrast.init(clusters)
    }

    fn applicable(&self, pattern: &TracablePattern, _ctx: &MetricContext<'_>) -> bool {
        if self.contrast.has_target() {
            return self.contrast.target_trees(pattern) == 0
                || self.contrast.opposite_trees(pattern).all(|n| n == 0);
        }
        self.contrast.opposite_trees(pattern).any(|n| n == 0)
    }

    fn expand(&self, pattern: &TracablePattern, ctx: &MetricContext<'_>) -> bool {
        !self.applicable(pattern, ctx)
    }

    fn rank(&self, pattern: &TracablePattern, _ctx: &MetricContext<'_>) -> f64 {
        self.contrast.rank(pattern)
    }
}

//! Success/fail contrast metrics for locating faulty code patterns.

use arbor_core::errors::MetricError;
use arbor_core::types::ClusterId;

use super::{cluster_size, share, Metric, MetricContext};
use crate::cluster::ClusterRegistry;
use crate::tracable::TracablePattern;

#[derive(Debug, Clone, Copy)]
struct SuccessFail {
    success: ClusterId,
    fail: ClusterId,
    success_size: usize,
    fail_size: usize,
}

impl SuccessFail {
    fn new(success: ClusterId, fail: ClusterId) -> Self {
        Self {
            success,
            fail,
            success_size: 0,
            fail_size: 0,
        }
    }

    fn init(&mut self, clusters: &ClusterRegistry) -> Result<(), MetricError> {
        self.success_size = cluster_size(clusters, self.success)?;
        self.fail_size = cluster_size(clusters, self.fail)?;
        Ok(())
    }

    fn success_share(&self, pattern: &TracablePattern) -> f64 {
        share(pattern, self.success, self.success_size)
    }

    fn fail_share(&self, pattern: &TracablePattern) -> f64 {
        share(pattern, self.fail, self.fail_size)
    }
}

/// Finds patterns that (almost) never occur in successful trees.
///
/// Applicable while the pattern hits at most `max_outliers` successful
/// trees. Grows while not yet applicable and the success/fail share gap
/// has not shrunk relative to the origin.
#[derive(Debug, Clone)]
pub struct FaultFindingMetric {
    clusters: SuccessFail,
    max_outliers: usize,
}

impl FaultFindingMetric {
    pub fn new(success: ClusterId, fail: ClusterId, max_outliers: usize) -> Self {
        Self {
            clusters: SuccessFail::new(success, fail),
            max_outliers,
        }
    }

    fn gap(&self, pattern: &TracablePattern) -> f64 {
        (self.clusters.success_share(pattern) - self.clusters.fail_share(pattern)).abs()
    }
}

impl Metric for FaultFindingMetric {
    fn name(&self) -> &'static str {
        "fault_finding"
    }

    fn init(&mut self, clusters: &ClusterRegistry) -> Result<(), MetricError> {
        self.clusters.init(clusters)
    }

    fn applicable(&self, pattern: &TracablePattern, _ctx: &MetricContext<'_>) -> bool {
        pattern.cluster_tree_count(self.clusters.success) <= self.max_outliers
    }

    fn expand(&self, pattern: &TracablePattern, ctx: &MetricContext<'_>) -> bool {
        match ctx.origin(pattern) {
            None => true,
            Some(origin) => !self.applicable(pattern, ctx) && self.gap(pattern) >= self.gap(origin),
        }
    }

    /// Successful minus failing trees; lower is better.
    fn rank(&self, pattern: &TracablePattern, _ctx: &MetricContext<'_>) -> f64 {
        pattern.cluster_tree_count(self.clusters.success) as f64
            - pattern.cluster_tree_count(self.clusters.fail) as f64
    }
}

/// Finds patterns that are missing from failing trees. Scores with
/// `success share + 3 * fail share`; meant to be combined with a top-N
/// ranking.
#[derive(Debug, Clone)]
pub struct FaultOfOmissionFindingMetric {
    clusters: SuccessFail,
    min_support: f64,
}

impl FaultOfOmissionFindingMetric {
    pub fn new(success: ClusterId, fail: ClusterId, min_support: f64) -> Self {
        Self {
            clusters: SuccessFail::new(success, fail),
            min_support,
        }
    }

    fn score(&self, pattern: &TracablePattern) -> f64 {
        self.clusters.success_share(pattern) + 3.0 * self.clusters.fail_share(pattern)
    }
}

impl Metric for FaultOfOmissionFindingMetric {
    fn name(&self) -> &'static str {
        "fault_of_omission"
    }

    fn init(&mut self, clusters: &ClusterRegistry) -> Result<(), MetricError> {
        self.clusters.init(clusters)
    }

    fn applicable(&self, pattern: &TracablePattern, _ctx: &MetricContext<'_>) -> bool {
        self.score(pattern) >= self.min_support
    }

    fn expand(&self, pattern: &TracablePattern, ctx: &MetricContext<'_>) -> bool {
        match ctx.origin(pattern) {
            None => true,
            Some(origin) => !self.applicable(pattern, ctx) && self.score(pattern) < self.score(origin),
        }
    }

    fn rank(&self, pattern: &TracablePattern, _ctx: &MetricContext<'_>) -> f64 {
        self.score(pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::test_support::*;
    use crate::tracable::PatternArena;

    #[test]
    fn fault_finding_tolerates_outliers() {
        let registry = make_registry(&[4, 4]);
        let mut metric = FaultFindingMetric::new(1, 2, 1);
        metric.init(&registry).unwrap();
        let mut arena = PatternArena::new();

        let wide = make_pattern(&arena, &[(1, 1), (1, 2), (2, 5), (2, 6)]);
        let wide_id = arena.insert(wide);
        let mut narrow = make_pattern(&arena, &[(1, 1), (2, 5), (2, 6)]);
        narrow.origin = Some(wide_id);

        let ctx = MetricContext::new(&arena);
        assert!(metric.applicable(&narrow, &ctx));
        assert!(!metric.expand(&narrow, &ctx));
        assert_eq!(metric.rank(&narrow, &ctx), -1.0);
        let wide = ctx.arena.get(wide_id).unwrap();
        assert!(!metric.applicable(wide, &ctx));
        assert!(metric.expand(wide, &ctx));
    }

    #[test]
    fn fault_finding_rejects_unknown_clusters() {
        let registry = make_registry(&[4]);
        let mut metric = FaultFindingMetric::new(1, 2, 0);
        assert!(matches!(
            metric.init(&registry),
            Err(MetricError::UnknownCluster { cluster: 2 })
        ));
    }

    #[test]
    fn omission_score_overweights_failures() {
        let registry = make_registry(&[2, 2]);
        let mut metric = FaultOfOmissionFindingMetric::new(1, 2, 2.0);
        metric.init(&registry).unwrap();
        let mut arena = PatternArena::new();

        let origin = make_pattern(&arena, &[(1, 1), (2, 3)]);
        assert!(metric.applicable(&origin, &MetricContext::new(&arena)));
        let origin_id = arena.insert(origin);
        let mut child = make_pattern(&arena, &[(1, 1)]);
        child.origin = Some(origin_id);

        let ctx = MetricContext::new(&arena);
        assert_eq!(metric.rank(&child, &ctx), 0.5);
        assert!(!metric.applicable(&child, &ctx));
        assert!(metric.expand(&child, &ctx));
    }
}

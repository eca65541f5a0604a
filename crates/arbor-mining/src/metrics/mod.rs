//! Metric plug-ins that decide which patterns are kept and which are grown.
//!
//! A pattern is a result iff every metric finds it `applicable`, and is
//! grown further iff every metric wants to `expand` it. Stateful ranking
//! metrics commit a pattern to their bounded rankings while answering, so
//! a set first checks every stateful metric without committing and only
//! then asks each of them once.

pub mod difference;
pub mod fault;
pub mod ranking;
pub mod structural;
pub mod support;

use arbor_core::errors::MetricError;
use arbor_core::types::{ClusterId, PatternId};

use crate::cluster::ClusterRegistry;
use crate::tracable::{PatternArena, TracablePattern};

pub use difference::{DifferenceMetric, DifferenceMustGrowMetric, NoCounterexampleMetric};
pub use fault::{FaultFindingMetric, FaultOfOmissionFindingMetric};
pub use ranking::{MaxSupportPerGroupMetric, TopNMetric};
pub use structural::{MustContainMetric, PatternSizeMetric};
pub use support::SupportMetric;

/// Read access to already stored patterns, needed for origin comparisons.
#[derive(Debug, Clone, Copy)]
pub struct MetricContext<'a> {
    pub arena: &'a PatternArena,
}

impl<'a> MetricContext<'a> {
    pub fn new(arena: &'a PatternArena) -> Self {
        Self { arena }
    }

    pub fn origin(&self, pattern: &TracablePattern) -> Option<&'a TracablePattern> {
        self.arena.origin_of(pattern)
    }
}

/// Patterns pushed out of a bounded ranking since the last call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evictions {
    /// No longer worth growing.
    pub frontier: Vec<PatternId>,
    /// No longer part of the result set.
    pub results: Vec<PatternId>,
}

impl Evictions {
    pub fn is_empty(&self) -> bool {
        self.frontier.is_empty() && self.results.is_empty()
    }

    pub fn extend(&mut self, other: Evictions) {
        self.frontier.extend(other.frontier);
        self.results.extend(other.results);
    }
}

/// Trait for pattern quality measures.
pub trait Metric: Send + Sync {
    fn name(&self) -> &'static str;

    /// Resolves cluster ids and sizes for this run.
    fn init(&mut self, _clusters: &ClusterRegistry) -> Result<(), MetricError> {
        Ok(())
    }

    /// Keep the pattern in the result set.
    fn applicable(&self, pattern: &TracablePattern, ctx: &MetricContext<'_>) -> bool;

    /// Grow the pattern further.
    fn expand(&self, pattern: &TracablePattern, ctx: &MetricContext<'_>) -> bool;

    /// Ordering key; the direction depends on the metric.
    fn rank(&self, pattern: &TracablePattern, ctx: &MetricContext<'_>) -> f64;

    /// True if `applicable`/`expand` mutate internal rankings.
    fn is_stateful(&self) -> bool {
        false
    }

    /// Non-committing form of `applicable` for stateful metrics.
    fn would_apply(&self, _pattern: &TracablePattern, _ctx: &MetricContext<'_>) -> bool {
        true
    }

    /// Non-committing form of `expand` for stateful metrics.
    fn would_expand(&self, _pattern: &TracablePattern, _ctx: &MetricContext<'_>) -> bool {
        true
    }

    /// Undoes an accepting `applicable` for `id`.
    fn retract_applicable(&self, _id: PatternId) {}

    /// Undoes an accepting `expand` for `id`.
    fn retract_expand(&self, _id: PatternId) {}

    /// Called once before each growth round.
    fn begin_round(&self) {}

    fn take_evictions(&self) -> Evictions {
        Evictions::default()
    }
}

/// Fraction of `trees` trees of `cluster` the pattern occurs in.
pub(crate) fn share(pattern: &TracablePattern, cluster: ClusterId, trees: usize) -> f64 {
    if trees == 0 {
        return 0.0;
    }
    pattern.cluster_tree_count(cluster) as f64 / trees as f64
}

pub(crate) fn check_range(field: &str, min: f64, max: f64) -> Result<(), MetricError> {
    if min > max || min.is_nan() || max.is_nan() {
        return Err(MetricError::InvalidRange {
            field: field.to_string(),
            min,
            max,
        });
    }
    Ok(())
}

pub(crate) fn cluster_size(clusters: &ClusterRegistry, id: ClusterId) -> Result<usize, MetricError> {
    clusters
        .get(id)
        .map(|c| c.tree_count)
        .ok_or(MetricError::UnknownCluster { cluster: id })
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Keep,
    Grow,
}

impl Stage {
    fn ask(self, metric: &dyn Metric, pattern: &TracablePattern, ctx: &MetricContext<'_>) -> bool {
        match self {
            Stage::Keep => metric.applicable(pattern, ctx),
            Stage::Grow => metric.expand(pattern, ctx),
        }
    }

    fn check(self, metric: &dyn Metric, pattern: &TracablePattern, ctx: &MetricContext<'_>) -> bool {
        match self {
            Stage::Keep => metric.would_apply(pattern, ctx),
            Stage::Grow => metric.would_expand(pattern, ctx),
        }
    }

    fn retract(self, metric: &dyn Metric, id: PatternId) {
        match self {
            Stage::Keep => metric.retract_applicable(id),
            Stage::Grow => metric.retract_expand(id),
        }
    }
}

/// AND-composition of metrics. Stateless metrics are asked first so that
/// stateful rankings only see patterns everything else accepted, and no
/// ranking keeps a pattern another ranking rejects.
#[derive(Default)]
pub struct MetricSet {
    metrics: Vec<Box<dyn Metric>>,
}

impl MetricSet {
    pub fn new(metrics: Vec<Box<dyn Metric>>) -> Self {
        Self { metrics }
    }

    pub fn push(&mut self, metric: Box<dyn Metric>) {
        self.metrics.push(metric);
    }

    /// Pushes `metric`, dropping any metric of the same name first.
    pub fn replace(&mut self, metric: Box<dyn Metric>) {
        let name = metric.name();
        self.metrics.retain(|m| m.name() != name);
        self.metrics.push(metric);
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.metrics.iter().map(|m| m.name()).collect()
    }

    pub fn init(&mut self, clusters: &ClusterRegistry) -> Result<(), MetricError> {
        for metric in &mut self.metrics {
            metric.init(clusters)?;
        }
        Ok(())
    }

    fn decide(&self, stage: Stage, pattern: &TracablePattern, ctx: &MetricContext<'_>) -> bool {
        let mut stateless = self.metrics.iter().filter(|m| !m.is_stateful());
        if !stateless.all(|m| stage.ask(&**m, pattern, ctx)) {
            return false;
        }
        let stateful: Vec<&dyn Metric> = self
            .metrics
            .iter()
            .filter(|m| m.is_stateful())
            .map(|m| &**m)
            .collect();
        if stateful.len() > 1 && !stateful.iter().all(|m| stage.check(*m, pattern, ctx)) {
            return false;
        }
        // A concurrent offer can still flip a commit after the check.
        for (i, metric) in stateful.iter().enumerate() {
            if !stage.ask(*metric, pattern, ctx) {
                for committed in &stateful[..i] {
                    stage.retract(*committed, pattern.id());
                }
                return false;
            }
        }
        true
    }

    pub fn applicable(&self, pattern: &TracablePattern, ctx: &MetricContext<'_>) -> bool {
        self.decide(Stage::Keep, pattern, ctx)
    }

    pub fn expand(&self, pattern: &TracablePattern, ctx: &MetricContext<'_>) -> bool {
        self.decide(Stage::Grow, pattern, ctx)
    }

    /// Rank by the first metric; 0 for an empty set.
    pub fn rank(&self, pattern: &TracablePattern, ctx: &MetricContext<'_>) -> f64 {
        self.metrics
            .first()
            .map_or(0.0, |m| m.rank(pattern, ctx))
    }

    pub fn begin_round(&self) {
        for metric in &self.metrics {
            metric.begin_round();
        }
    }

    pub fn take_evictions(&self) -> Evictions {
        let mut all = Evictions::default();
        for metric in &self.metrics {
            all.extend(metric.take_evictions());
        }
        all
    }
}

impl std::fmt::Debug for MetricSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricSet")
            .field("metrics", &self.names())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use arbor_core::types::{ClusterId, NodeId, TreeId};

    use crate::cluster::{Cluster, ClusterRegistry};
    use crate::hierarchy::TypeHierarchy;
    use crate::tracable::{NodeSeed, Occurrence, PatternArena, TracablePattern};
    use crate::tree::TreeNode;

    /// Registry with the given tree counts, cluster ids 1, 2, ...
    pub(crate) fn make_registry(sizes: &[usize]) -> ClusterRegistry {
        let clusters: Vec<Cluster<TreeNode>> = sizes
            .iter()
            .enumerate()
            .map(|(i, &n)| {
                Cluster::new(
                    format!("c{}", i + 1),
                    (0..n).map(|t| TreeNode::new("A", t as NodeId + 1)).collect(),
                )
            })
            .collect();
        ClusterRegistry::from_clusters(&clusters)
    }

    /// One-node pattern occurring once in each listed (cluster, tree).
    pub(crate) fn make_pattern(arena: &PatternArena, occurrences: &[(ClusterId, TreeId)]) -> TracablePattern {
        let meta = Arc::new(TypeHierarchy::flat(["A"]).build(&[]).unwrap());
        let mut out: Option<TracablePattern> = None;
        for (i, &(cluster_id, tree_id)) in occurrences.iter().enumerate() {
            let p = TracablePattern::single(
                arena,
                &meta,
                meta.mask("A"),
                NodeSeed {
                    node_id: i as NodeId + 1,
                    content: 0,
                    variable: None,
                },
                Occurrence { tree_id, cluster_id },
                &[],
            );
            match out.as_mut() {
                Some(acc) => acc.add_location(p).unwrap(),
                None => out = Some(p),
            }
        }
        out.unwrap()
    }
}

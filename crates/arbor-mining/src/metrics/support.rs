use arbor_core::errors::MetricError;
use arbor_core::types::ClusterId;

use super::{check_range, cluster_size, share, Metric, MetricContext};
use crate::cluster::ClusterRegistry;
use crate::tracable::TracablePattern;

/// Keeps and grows patterns whose tree share lies in `[min, max]` for at
/// least one of the selected clusters (all clusters when none are given).
#[derive(Debug, Clone)]
pub struct SupportMetric {
    selected: Option<Vec<ClusterId>>,
    min_support: f64,
    max_support: f64,
    sizes: Vec<(ClusterId, usize)>,
}

impl SupportMetric {
    pub fn new(
        clusters: Option<Vec<ClusterId>>,
        min_support: f64,
        max_support: f64,
    ) -> Result<Self, MetricError> {
        check_range("support", min_support, max_support)?;
        Ok(Self {
            selected: clusters,
            min_support,
            max_support,
            sizes: Vec::new(),
        })
    }

    fn shares<'a>(&'a self, pattern: &'a TracablePattern) -> impl Iterator<Item = f64> + 'a {
        self.sizes.iter().map(move |&(c, n)| share(pattern, c, n))
    }
}

impl Metric for SupportMetric {
    fn name(&self) -> &'static str {
        "support"
    }

    fn init(&mut self, clusters: &ClusterRegistry) -> Result<(), MetricError> {
        self.sizes = match &self.selected {
            Some(ids) => ids
                .iter()
                .map(|&id| cluster_size(clusters, id).map(|n| (id, n)))
                .collect::<Result<_, _>>()?,
            None => clusters.iter().map(|c| (c.id, c.tree_count)).collect(),
        };
        Ok(())
    }

    fn applicable(&self, pattern: &TracablePattern, _ctx: &MetricContext<'_>) -> bool {
        self.shares(pattern)
            .any(|s| self.min_support <= s && s <= self.max_support)
    }

    fn expand(&self, pattern: &TracablePattern, ctx: &MetricContext<'_>) -> bool {
        self.applicable(pattern, ctx)
    }

    fn rank(&self, pattern: &TracablePattern, _ctx: &MetricContext<'_>) -> f64 {
        self.shares(pattern).fold(0.0, f64::max)
    }
}

//! Structural admissibility filters.

use super::{Metric, MetricContext};
use crate::codec::Pattern;
use crate::tracable::TracablePattern;

/// Caps pattern size. `None` means unbounded.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternSizeMetric {
    max_size: Option<usize>,
}

impl PatternSizeMetric {
    pub fn new(max_size: Option<usize>) -> Self {
        Self { max_size }
    }

    pub fn max_size(&self) -> Option<usize> {
        self.max_size
    }
}

impl Metric for PatternSizeMetric {
    fn name(&self) -> &'static str {
        "pattern_size"
    }

    fn applicable(&self, pattern: &TracablePattern, _ctx: &MetricContext<'_>) -> bool {
        self.max_size.map_or(true, |max| pattern.size() <= max)
    }

    /// Only patterns below the cap can still gain a node.
    fn expand(&self, pattern: &TracablePattern, _ctx: &MetricContext<'_>) -> bool {
        self.max_size.map_or(true, |max| pattern.size() < max)
    }

    fn rank(&self, pattern: &TracablePattern, _ctx: &MetricContext<'_>) -> f64 {
        pattern.size() as f64
    }
}

/// Keeps patterns that contain at least one of the given patterns.
#[derive(Debug, Clone)]
pub struct MustContainMetric {
    required: Vec<Pattern>,
}

impl MustContainMetric {
    pub fn new(required: Vec<Pattern>) -> Self {
        Self { required }
    }
}

impl Metric for MustContainMetric {
    fn name(&self) -> &'static str {
        "must_contain"
    }

    fn applicable(&self, pattern: &TracablePattern, _ctx: &MetricContext<'_>) -> bool {
        self.required.iter().any(|r| pattern.pattern().contains(r))
    }

    fn expand(&self, _pattern: &TracablePattern, _ctx: &MetricContext<'_>) -> bool {
        true
    }

    fn rank(&self, _pattern: &TracablePattern, _ctx: &MetricContext<'_>) -> f64 {
        0.0
    }
}

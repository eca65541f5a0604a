//! Entry points for single-cluster and differential mining.

use std::sync::Arc;

use arbor_core::config::ArborConfig;
use arbor_core::errors::{DetectionError, MiningError, MiningResult};
use arbor_core::events::EventDispatcher;
use arbor_core::traits::CancellationToken;
use arbor_core::types::PatternId;
use tracing::info;

use super::differential::{DifferentialFilter, DifferentialTable};
use super::grouping::group;
use super::growth::PatternGrowthDetector;
use super::MiningOutcome;
use crate::cluster::Cluster;
use crate::hierarchy::TypeHierarchyMask;
use crate::metrics::{Metric, MetricSet};
use crate::relations::{PatternRelationMapper, PatternRelations};
use crate::tracable::TracablePattern;
use crate::tree::SyntaxTree;

/// Grouped patterns of one cluster.
#[derive(Debug, Default)]
pub struct PatternReport {
    pub outcome: MiningOutcome,
    /// Grouped result ids, sorted.
    pub patterns: Vec<PatternId>,
}

impl PatternReport {
    pub fn iter(&self) -> impl Iterator<Item = &TracablePattern> {
        self.patterns.iter().filter_map(|&id| self.outcome.arena.get(id))
    }

    pub fn relations(&self) -> PatternRelations {
        PatternRelationMapper::map_arena(&self.outcome.arena, &self.patterns)
    }
}

/// Grouped, filtered patterns of several clusters with their per-cluster table.
#[derive(Debug, Default)]
pub struct DifferentialReport {
    pub outcome: MiningOutcome,
    pub table: DifferentialTable,
}

impl DifferentialReport {
    pub fn iter(&self) -> impl Iterator<Item = &TracablePattern> {
        self.table
            .rows()
            .iter()
            .filter_map(|row| self.outcome.arena.get(row.pattern))
    }

    pub fn relations(&self) -> PatternRelations {
        PatternRelationMapper::map_arena(&self.outcome.arena, &self.table.pattern_ids())
    }
}

/// Mines with one hierarchy and one configuration.
#[derive(Debug)]
pub struct PatternDetector {
    meta: Arc<TypeHierarchyMask>,
    config: ArborConfig,
    detector: PatternGrowthDetector,
}

impl PatternDetector {
    pub fn new(meta: Arc<TypeHierarchyMask>, config: ArborConfig) -> Self {
        let detector = PatternGrowthDetector::new(config.mining.clone(), MetricSet::default());
        Self {
            meta,
            config,
            detector,
        }
    }

    /// Adds `metric`, replacing a metric of the same name.
    pub fn with_metric(mut self, metric: Box<dyn Metric>) -> Self {
        self.detector.metrics_mut().replace(metric);
        self
    }

    pub fn with_events(mut self, events: EventDispatcher) -> Self {
        self.detector = self.detector.with_events(events);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.detector = self.detector.with_cancellation(cancel);
        self
    }

    pub fn config(&self) -> &ArborConfig {
        &self.config
    }

    pub fn meta(&self) -> &Arc<TypeHierarchyMask> {
        &self.meta
    }

    pub fn find_patterns<T: SyntaxTree>(
        &mut self,
        cluster: &Cluster<T>,
    ) -> Result<MiningResult<PatternReport>, MiningError> {
        let MiningResult { data: outcome, errors } =
            self.detector.mine(&self.meta, std::slice::from_ref(cluster))?;
        let mining = &self.config.mining;
        let patterns = group(
            &outcome.arena,
            &outcome.results,
            mining.effective_grouping(),
            mining.effective_hierarchy_compare(),
        );
        info!(
            cluster = %cluster.name,
            mined = outcome.results.len(),
            grouped = patterns.len(),
            "patterns found"
        );

        let mut report = MiningResult::new(PatternReport { outcome, patterns });
        report.errors = errors;
        Ok(report)
    }

    pub fn compare_patterns<T: SyntaxTree>(
        &mut self,
        clusters: &[Cluster<T>],
    ) -> Result<MiningResult<DifferentialReport>, MiningError> {
        if clusters.len() < 2 {
            return Err(DetectionError::InsufficientClusters {
                found: clusters.len(),
            }
            .into());
        }
        let MiningResult { data: outcome, errors } = self.detector.mine(&self.meta, clusters)?;

        let mut table = DifferentialTable::build(&outcome.registry, &outcome.arena, &outcome.results);
        let filter = DifferentialFilter::from_config(&self.config.differential);
        if !filter.is_trivial() {
            table.filter(&filter);
        }
        let mining = &self.config.mining;
        let grouped = group(
            &outcome.arena,
            &table.pattern_ids(),
            mining.effective_grouping(),
            mining.effective_hierarchy_compare(),
        );
        table.retain(&grouped);
        info!(
            clusters = clusters.len(),
            mined = outcome.results.len(),
            rows = table.len(),
            "patterns compared"
        );

        let mut report = MiningResult::new(DifferentialReport { outcome, table });
        report.errors = errors;
        Ok(report)
    }
}

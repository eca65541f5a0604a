//! Breadth-first pattern growth over a forest of trees.

use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::time::Instant;

use arbor_core::config::{MiningConfig, Specialization};
use arbor_core::errors::{DetectionError, GrowthError, MiningError, MiningResult};
use arbor_core::events::types::{MiningCompleteEvent, MiningStartedEvent, RoundCompletedEvent};
use arbor_core::events::EventDispatcher;
use arbor_core::traits::{Cancellable, CancellationToken};
use arbor_core::types::{FxHashMap, FxHashSet, NodeId, PatternId};
use rayon::prelude::*;
use tracing::{debug, info, trace, warn};

use super::seeding::{seed_clusters, specialization_drops, SeedOptions, SeedTable};
use super::{MiningOutcome, MiningStats};
use crate::cluster::{Cluster, ClusterRegistry};
use crate::hierarchy::TypeHierarchyMask;
use crate::memo::SessionMemo;
use crate::metrics::{Evictions, Metric, MetricContext, MetricSet, PatternSizeMetric};
use crate::tracable::{Extension, PatternArena, TracablePattern};
use crate::tree::SyntaxTree;

/// What the metrics decided for one pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Verdict {
    keep: bool,
    grow: bool,
}

/// Grows patterns one node per round until nothing is worth growing.
///
/// Every round expands each frontier pattern at every position by every
/// seed variant of its growth points; children the metrics keep become
/// results, children they want grown form the next frontier.
pub struct PatternGrowthDetector {
    config: MiningConfig,
    metrics: MetricSet,
    size_limit: PatternSizeMetric,
    events: EventDispatcher,
    cancel: CancellationToken,
}

impl PatternGrowthDetector {
    pub fn new(config: MiningConfig, metrics: MetricSet) -> Self {
        let size_limit = PatternSizeMetric::new(config.effective_max_pattern_size());
        Self {
            config,
            metrics,
            size_limit,
            events: EventDispatcher::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_events(mut self, events: EventDispatcher) -> Self {
        self.events = events;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &MiningConfig {
        &self.config
    }

    pub fn metrics(&self) -> &MetricSet {
        &self.metrics
    }

    pub fn metrics_mut(&mut self) -> &mut MetricSet {
        &mut self.metrics
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Mines all clusters together with a fresh session memo.
    pub fn mine<T: SyntaxTree>(
        &mut self,
        meta: &Arc<TypeHierarchyMask>,
        clusters: &[Cluster<T>],
    ) -> Result<MiningResult<MiningOutcome>, MiningError> {
        let mut memo = SessionMemo::new();
        self.mine_with_memo(meta, clusters, &mut memo)
    }

    /// Mines all clusters together. Cluster ids are assigned from 1 in
    /// input order. A cancelled run returns what was found so far.
    pub fn mine_with_memo<T: SyntaxTree>(
        &mut self,
        meta: &Arc<TypeHierarchyMask>,
        clusters: &[Cluster<T>],
        memo: &mut SessionMemo,
    ) -> Result<MiningResult<MiningOutcome>, MiningError> {
        let start = Instant::now();
        let registry = ClusterRegistry::from_clusters(clusters);
        if registry.total_trees() == 0 {
            return Err(DetectionError::EmptyCorpus.into());
        }
        self.metrics.init(&registry)?;

        let mut errors: Vec<MiningError> = Vec::new();
        let mut arena = PatternArena::new();
        let mut stats = MiningStats::default();
        let specialization = self.config.effective_specialization();
        let embedded = self.config.effective_embedded();

        // Phase 1: Seed every node at every requested hierarchy level
        let seeding = seed_clusters(
            &arena,
            meta,
            clusters,
            memo,
            SeedOptions {
                floor: self.config.effective_hierarchy_floor(),
                ceil: self.config.effective_hierarchy_ceil(),
                embedded,
            },
        )?;
        let table = seeding.table;
        let mut seeds = seeding.seeds;

        // Phase 2: Drop hierarchy-level duplicates
        let drops = specialization_drops(&seeds.iter().collect::<Vec<_>>(), specialization);
        stats.pruned += drops.iter().filter(|&&d| d).count();
        let mut dropped = drops.into_iter();
        seeds.retain(|_| !dropped.next().unwrap_or(false));

        // Phase 3: Pre-prune the seeds
        self.metrics.begin_round();
        let mut results: FxHashSet<PatternId> = FxHashSet::default();
        let mut frontier: Vec<PatternId> = Vec::with_capacity(seeds.len());
        for seed in seeds {
            let verdict = judge(&self.size_limit, &self.metrics, &seed, &MetricContext::new(&arena));
            if !verdict.grow {
                stats.pruned += 1;
            }
            if !verdict.keep && !verdict.grow {
                continue;
            }
            let id = arena.insert(seed);
            if verdict.keep {
                results.insert(id);
            }
            if verdict.grow {
                frontier.push(id);
            } else {
                arena.finish(id);
            }
        }
        apply_evictions(self.metrics.take_evictions(), &mut arena, &mut results, &mut frontier);

        info!(
            clusters = registry.len(),
            trees = registry.total_trees(),
            seeds = frontier.len(),
            variants = table.len(),
            "mining started"
        );
        self.events.emit_mining_started(&MiningStartedEvent {
            clusters: registry.len(),
            trees: registry.total_trees(),
            seeds: frontier.len(),
        });

        // Phase 4: Grow round by round
        let parallel = self.config.effective_parallel();
        while !frontier.is_empty() {
            if let Err(cancelled) = self.cancel.checkpoint() {
                warn!(round = stats.rounds, frontier = frontier.len(), "mining cancelled");
                stats.cancelled = true;
                errors.push(cancelled);
                break;
            }
            stats.rounds += 1;
            self.metrics.begin_round();

            let round = GrowthRound {
                arena: &arena,
                table: &table,
                metrics: &self.metrics,
                size_limit: &self.size_limit,
                embedded,
                specialization,
            };
            let expansions: Vec<Expansion> = if parallel {
                frontier.par_iter().map(|&id| round.expand(id)).collect()
            } else {
                frontier.iter().map(|&id| round.expand(id)).collect()
            };

            let evaluated = frontier.len();
            let mut next = Vec::new();
            let mut pruned = 0;
            for expansion in expansions {
                pruned += expansion.pruned;
                errors.extend(expansion.errors.into_iter().map(MiningError::from));
                for (child, verdict) in expansion.children {
                    let id = arena.insert(child);
                    if verdict.keep {
                        results.insert(id);
                    }
                    if verdict.grow {
                        next.push(id);
                    } else {
                        arena.finish(id);
                    }
                }
            }
            for id in frontier.drain(..) {
                arena.finish(id);
            }
            frontier = next;
            apply_evictions(self.metrics.take_evictions(), &mut arena, &mut results, &mut frontier);

            stats.evaluated += evaluated;
            stats.pruned += pruned;
            info!(
                round = stats.rounds,
                evaluated,
                frontier = frontier.len(),
                found = results.len(),
                pruned,
                "growth round completed"
            );
            self.events.emit_round_completed(&RoundCompletedEvent {
                round: stats.rounds,
                evaluated,
                frontier: frontier.len(),
                found: results.len(),
                pruned,
            });
        }
        for id in frontier {
            arena.finish(id);
        }

        let mut results: Vec<PatternId> = results.into_iter().collect();
        results.sort_unstable();
        stats.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            rounds = stats.rounds,
            evaluated = stats.evaluated,
            results = results.len(),
            pruned = stats.pruned,
            duration_ms = stats.duration_ms,
            "mining complete"
        );
        self.events.emit_mining_complete(&MiningCompleteEvent {
            rounds: stats.rounds,
            results: results.len(),
            cancelled: stats.cancelled,
            duration_ms: stats.duration_ms,
        });

        let mut mined = MiningResult::new(MiningOutcome {
            arena,
            results,
            registry,
            stats,
        });
        for error in errors {
            mined.add_error(error);
        }
        Ok(mined)
    }
}

impl std::fmt::Debug for PatternGrowthDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternGrowthDetector")
            .field("config", &self.config)
            .field("metrics", &self.metrics)
            .field("max_size", &self.size_limit.max_size())
            .finish()
    }
}

/// The size cap is asked first so oversized children never reach a
/// stateful ranking.
fn judge(
    size_limit: &PatternSizeMetric,
    metrics: &MetricSet,
    pattern: &TracablePattern,
    ctx: &MetricContext<'_>,
) -> Verdict {
    Verdict {
        keep: size_limit.applicable(pattern, ctx) && metrics.applicable(pattern, ctx),
        grow: size_limit.expand(pattern, ctx) && metrics.expand(pattern, ctx),
    }
}

fn apply_evictions(
    evictions: Evictions,
    arena: &mut PatternArena,
    results: &mut FxHashSet<PatternId>,
    frontier: &mut Vec<PatternId>,
) {
    if evictions.is_empty() {
        return;
    }
    for id in &evictions.results {
        results.remove(id);
    }
    let evicted: FxHashSet<PatternId> = evictions.frontier.into_iter().collect();
    frontier.retain(|id| !evicted.contains(id));
    for id in evicted {
        arena.finish(id);
    }
    debug!(
        frontier = frontier.len(),
        results = results.len(),
        "applied ranking evictions"
    );
}

/// Children produced from one frontier pattern.
#[derive(Debug, Default)]
struct Expansion {
    children: Vec<(TracablePattern, Verdict)>,
    pruned: usize,
    errors: Vec<GrowthError>,
}

/// All occurrences of one target class reachable from one position.
struct TargetGroup {
    target: TracablePattern,
    extensions: Vec<Extension>,
    nodes: FxHashSet<NodeId>,
}

/// Read-only view shared by all workers of one round.
struct GrowthRound<'a> {
    arena: &'a PatternArena,
    table: &'a SeedTable,
    metrics: &'a MetricSet,
    size_limit: &'a PatternSizeMetric,
    embedded: bool,
    specialization: Specialization,
}

impl GrowthRound<'_> {
    fn expand(&self, id: PatternId) -> Expansion {
        let mut out = Expansion::default();
        let Some(pattern) = self.arena.get(id) else {
            return out;
        };
        let ctx = MetricContext::new(self.arena);

        for pos in 0..pattern.size() {
            let groups = match self.collect_targets(pattern, pos) {
                Ok(groups) => groups,
                Err(e) => {
                    out.errors.push(e);
                    continue;
                }
            };
            let drops = specialization_drops(
                &groups.iter().map(|g| &g.target).collect::<Vec<_>>(),
                self.specialization,
            );
            for (group, dropped) in groups.into_iter().zip(drops) {
                if dropped {
                    out.pruned += 1;
                    continue;
                }
                let children = match pattern.grow(self.arena, pos, &group.extensions, &group.target, self.embedded) {
                    Ok(children) => children,
                    Err(e) => {
                        out.errors.push(e);
                        continue;
                    }
                };
                for child in children {
                    let verdict = judge(self.size_limit, self.metrics, &child, &ctx);
                    if !verdict.grow {
                        out.pruned += 1;
                    }
                    if verdict.keep || verdict.grow {
                        out.children.push((child, verdict));
                    } else {
                        trace!(origin = %id, pos, "child rejected by metrics");
                    }
                }
            }
        }
        out
    }

    /// Groups the growth points at `pos` by the class of the seed variant
    /// they would attach, merging the variants of distinct nodes.
    fn collect_targets(&self, pattern: &TracablePattern, pos: usize) -> Result<Vec<TargetGroup>, GrowthError> {
        let mut groups: Vec<TargetGroup> = Vec::new();
        let mut by_class: FxHashMap<u32, usize> = FxHashMap::default();
        for (occurrence, candidate) in pattern.growth_points(pos) {
            let node = candidate.abs();
            let extension = Extension {
                occurrence,
                node: candidate,
            };
            for (class, variant) in self.table.variants_of(node) {
                match by_class.entry(class) {
                    Entry::Occupied(e) => {
                        let group = &mut groups[*e.get()];
                        if group.nodes.insert(node) {
                            group.target.add_location(variant.clone())?;
                        }
                        group.extensions.push(extension);
                    }
                    Entry::Vacant(e) => {
                        e.insert(groups.len());
                        let mut nodes = FxHashSet::default();
                        nodes.insert(node);
                        groups.push(TargetGroup {
                            target: variant.clone(),
                            extensions: vec![extension],
                            nodes,
                        });
                    }
                }
            }
        }
        Ok(groups)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use arbor_core::events::MiningEventHandler;

    use super::*;
    use crate::codec::Pattern;
    use crate::hierarchy::TypeHierarchy;
    use crate::metrics::SupportMetric;
    use crate::tree::TreeNode;

    fn make_meta() -> Arc<TypeHierarchyMask> {
        Arc::new(TypeHierarchy::flat(["A", "B", "C"]).build(&[]).unwrap())
    }

    fn make_config(max_size: i64, parallel: bool) -> MiningConfig {
        MiningConfig {
            max_pattern_size: Some(max_size),
            hierarchy_floor: Some(1),
            hierarchy_ceil: Some(1),
            parallel: Some(parallel),
            ..Default::default()
        }
    }

    fn make_clusters() -> Vec<Cluster<TreeNode>> {
        let tree = |base: i64| {
            TreeNode::new("A", base)
                .with_child(TreeNode::new("B", base + 1))
                .with_child(TreeNode::new("C", base + 2))
        };
        vec![Cluster::new("c", vec![tree(1), tree(10)])]
    }

    fn result_patterns(outcome: &MiningOutcome) -> Vec<Pattern> {
        outcome.patterns().map(|p| p.pattern().clone()).collect()
    }

    #[test]
    fn finds_every_induced_subtree() {
        let meta = make_meta();
        let mut detector = PatternGrowthDetector::new(make_config(-1, false), MetricSet::default());
        let mined = detector.mine(&meta, &make_clusters()).unwrap();
        assert!(mined.is_clean());
        let outcome = mined.data;

        // A, B, C, A(B), A(C), A(B, C)
        assert_eq!(outcome.results.len(), 6);
        let full = Pattern::encode(
            &TreeNode::new("A", 0)
                .with_child(TreeNode::new("B", 0))
                .with_child(TreeNode::new("C", 0)),
            &meta,
        );
        let found = result_patterns(&outcome);
        assert!(found.contains(&full));
        let full = outcome.patterns().find(|p| p.pattern() == &full).unwrap();
        assert_eq!(full.occurrence_count(), 2);
        assert_eq!(full.tree_count(), 2);
        assert!(outcome.patterns().all(TracablePattern::is_finished));
    }

    #[test]
    fn size_cap_limits_growth() {
        let meta = make_meta();
        let mut detector = PatternGrowthDetector::new(make_config(2, false), MetricSet::default());
        let outcome = detector.mine(&meta, &make_clusters()).unwrap().data;
        assert_eq!(outcome.results.len(), 5);
        assert!(outcome.patterns().all(|p| p.size() <= 2));
        assert_eq!(outcome.stats.rounds, 1);
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let meta = make_meta();
        let mut sequential = PatternGrowthDetector::new(make_config(-1, false), MetricSet::default());
        let mut parallel = PatternGrowthDetector::new(make_config(-1, true), MetricSet::default());
        let a = sequential.mine(&meta, &make_clusters()).unwrap().data;
        let b = parallel.mine(&meta, &make_clusters()).unwrap().data;

        let mut left: Vec<String> = a.patterns().map(|p| p.pattern().to_string()).collect();
        let mut right: Vec<String> = b.patterns().map(|p| p.pattern().to_string()).collect();
        left.sort();
        right.sort();
        assert_eq!(left, right);
    }

    #[test]
    fn support_prunes_rare_patterns() {
        let meta = make_meta();
        let clusters = vec![Cluster::new(
            "c",
            vec![
                TreeNode::new("A", 1).with_child(TreeNode::new("B", 2)),
                TreeNode::new("A", 10).with_child(TreeNode::new("C", 11)),
            ],
        )];
        let metrics = MetricSet::new(vec![Box::new(SupportMetric::new(None, 1.0, 1.0).unwrap())]);
        let mut detector = PatternGrowthDetector::new(make_config(-1, false), metrics);
        let outcome = detector.mine(&meta, &clusters).unwrap().data;
        let found: Vec<String> = outcome.patterns().map(|p| p.pattern().to_string()).collect();
        assert_eq!(found, vec!["A".to_string()]);
        assert!(outcome.stats.pruned > 0);
    }

    #[test]
    fn empty_corpus_is_an_error() {
        let meta = make_meta();
        let mut detector = PatternGrowthDetector::new(make_config(-1, false), MetricSet::default());
        let clusters: Vec<Cluster<TreeNode>> = vec![Cluster::new("empty", Vec::new())];
        assert!(matches!(
            detector.mine(&meta, &clusters),
            Err(MiningError::Detection(DetectionError::EmptyCorpus))
        ));
    }

    #[test]
    fn cancellation_stops_at_round_boundary() {
        let meta = make_meta();
        let token = CancellationToken::new();
        token.cancel();
        let mut detector = PatternGrowthDetector::new(make_config(-1, false), MetricSet::default())
            .with_cancellation(token);
        let mined = detector.mine(&meta, &make_clusters()).unwrap();
        assert!(mined.data.stats.cancelled);
        assert_eq!(mined.data.stats.rounds, 0);
        // seeds are already results
        assert_eq!(mined.data.results.len(), 3);
        assert!(matches!(mined.errors.as_slice(), [MiningError::Cancelled]));
    }

    struct RoundCounter(AtomicUsize);

    impl MiningEventHandler for RoundCounter {
        fn on_round_completed(&self, _event: &RoundCompletedEvent) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn rounds_are_reported_to_handlers() {
        let meta = make_meta();
        let counter = Arc::new(RoundCounter(AtomicUsize::new(0)));
        let mut events = EventDispatcher::new();
        events.register(counter.clone());
        let mut detector =
            PatternGrowthDetector::new(make_config(-1, false), MetricSet::default()).with_events(events);
        let outcome = detector.mine(&meta, &make_clusters()).unwrap().data;
        assert_eq!(counter.0.load(Ordering::Relaxed), outcome.stats.rounds);
        assert!(outcome.stats.rounds >= 2);
    }
}

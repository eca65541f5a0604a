//! Bounded best-of-N selection on top of a ranking metric.

use std::sync::{Mutex, MutexGuard, PoisonError};

use arbor_core::errors::MetricError;
use arbor_core::types::{ClusterId, PatternId};

use super::{Evictions, Metric, MetricContext};
use crate::cluster::ClusterRegistry;
use crate::tracable::TracablePattern;

/// Scores sorted ascending (lower is better) with at most `limit` entries.
#[derive(Debug, Clone, Default)]
pub(crate) struct BoundedRanking {
    limit: usize,
    entries: Vec<(f64, PatternId)>,
}

impl BoundedRanking {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            limit,
            entries: Vec::with_capacity(limit.min(1024)),
        }
    }

    /// Inserts `id` if the ranking has room or `score` beats the worst entry,
    /// which is then evicted. Ties keep the earlier entry.
    pub(crate) fn offer(&mut self, score: f64, id: PatternId) -> (bool, Option<PatternId>) {
        if score.is_nan() || self.limit == 0 {
            return (false, None);
        }
        let mut evicted = None;
        if self.entries.len() >= self.limit {
            match self.entries.last() {
                Some(&(worst, _)) if score < worst => {
                    evicted = self.entries.pop().map(|(_, id)| id);
                }
                _ => return (false, None),
            }
        }
        let at = self.entries.partition_point(|&(s, _)| s <= score);
        self.entries.insert(at, (score, id));
        (true, evicted)
    }

    /// Whether `offer` would currently accept `score`.
    pub(crate) fn would_accept(&self, score: f64) -> bool {
        if score.is_nan() || self.limit == 0 {
            return false;
        }
        self.entries.len() < self.limit || self.entries.last().is_some_and(|&(worst, _)| score < worst)
    }

    pub(crate) fn remove(&mut self, id: PatternId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|&(_, e)| e != id);
        self.entries.len() != before
    }

    pub(crate) fn contains(&self, id: PatternId) -> bool {
        self.entries.iter().any(|&(_, e)| e == id)
    }

    pub(crate) fn ids(&self) -> impl Iterator<Item = PatternId> + '_ {
        self.entries.iter().map(|&(_, id)| id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

fn directed(rank: f64, lower_is_better: bool) -> f64 {
    if lower_is_better {
        rank
    } else {
        -rank
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct TopNState {
    growth: BoundedRanking,
    results: BoundedRanking,
    evictions: Evictions,
}

/// Keeps the `final_count` best results and grows the `grow_count` best
/// patterns of each round, as ranked by the wrapped metric. The wrapped
/// metric's own `applicable`/`expand` must also hold.
pub struct TopNMetric {
    ranking: Box<dyn Metric>,
    grow_count: usize,
    final_count: usize,
    lower_is_better: bool,
    state: Mutex<TopNState>,
}

impl TopNMetric {
    pub fn new(
        ranking: Box<dyn Metric>,
        grow_count: usize,
        final_count: usize,
        lower_is_better: bool,
    ) -> Self {
        Self {
            ranking,
            grow_count,
            final_count,
            lower_is_better,
            state: Mutex::new(TopNState {
                growth: BoundedRanking::new(grow_count),
                results: BoundedRanking::new(final_count),
                evictions: Evictions::default(),
            }),
        }
    }

    /// Result ids currently held, best first.
    pub fn results(&self) -> Vec<PatternId> {
        lock(&self.state).results.ids().collect()
    }
}

impl Metric for TopNMetric {
    fn name(&self) -> &'static str {
        "top_n"
    }

    fn init(&mut self, clusters: &ClusterRegistry) -> Result<(), MetricError> {
        self.ranking.init(clusters)?;
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        *state = TopNState {
            growth: BoundedRanking::new(self.grow_count),
            results: BoundedRanking::new(self.final_count),
            evictions: Evictions::default(),
        };
        Ok(())
    }

    fn applicable(&self, pattern: &TracablePattern, ctx: &MetricContext<'_>) -> bool {
        if !self.ranking.applicable(pattern, ctx) {
            return false;
        }
        let score = directed(self.ranking.rank(pattern, ctx), self.lower_is_better);
        let mut state = lock(&self.state);
        let (accepted, evicted) = state.results.offer(score, pattern.id());
        state.evictions.results.extend(evicted);
        accepted
    }

    fn would_apply(&self, pattern: &TracablePattern, ctx: &MetricContext<'_>) -> bool {
        if !self.ranking.applicable(pattern, ctx) {
            return false;
        }
        let score = directed(self.ranking.rank(pattern, ctx), self.lower_is_better);
        lock(&self.state).results.would_accept(score)
    }

    fn retract_applicable(&self, id: PatternId) {
        lock(&self.state).results.remove(id);
    }

    fn expand(&self, pattern: &TracablePattern, ctx: &MetricContext<'_>) -> bool {
        if !self.ranking.expand(pattern, ctx) {
            return false;
        }
        let score = directed(self.ranking.rank(pattern, ctx), self.lower_is_better);
        let mut state = lock(&self.state);
        let (accepted, evicted) = state.growth.offer(score, pattern.id());
        state.evictions.frontier.extend(evicted);
        accepted
    }

    fn would_expand(&self, pattern: &TracablePattern, ctx: &MetricContext<'_>) -> bool {
        if !self.ranking.expand(pattern, ctx) {
            return false;
        }
        let score = directed(self.ranking.rank(pattern, ctx), self.lower_is_better);
        lock(&self.state).growth.would_accept(score)
    }

    fn retract_expand(&self, id: PatternId) {
        lock(&self.state).growth.remove(id);
    }

    fn rank(&self, pattern: &TracablePattern, ctx: &MetricContext<'_>) -> f64 {
        self.ranking.rank(pattern, ctx)
    }

    fn is_stateful(&self) -> bool {
        true
    }

    fn begin_round(&self) {
        self.ranking.begin_round();
        lock(&self.state).growth.clear();
    }

    fn take_evictions(&self) -> Evictions {
        let mut out = std::mem::take(&mut lock(&self.state).evictions);
        out.extend(self.ranking.take_evictions());
        out
    }
}

impl std::fmt::Debug for TopNMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopNMetric")
            .field("ranking", &self.ranking.name())
            .field("grow_count", &self.grow_count)
            .field("final_count", &self.final_count)
            .field("lower_is_better", &self.lower_is_better)
            .finish()
    }
}

#[derive(Debug, Default)]
struct PerGroupState {
    growth: BoundedRanking,
    groups: Vec<(ClusterId, BoundedRanking)>,
    evictions: Evictions,
}

/// Like [`TopNMetric`], but the result budget is split evenly across
/// clusters and each cluster keeps the patterns with the most occurrences
/// in it. A pattern leaves the results only when no cluster holds it.
pub struct MaxSupportPerGroupMetric {
    ranking: Box<dyn Metric>,
    grow_count: usize,
    final_count: usize,
    lower_is_better: bool,
    state: Mutex<PerGroupState>,
}

impl MaxSupportPerGroupMetric {
    pub fn new(
        ranking: Box<dyn Metric>,
        grow_count: usize,
        final_count: usize,
        lower_is_better: bool,
    ) -> Self {
        Self {
            ranking,
            grow_count,
            final_count,
            lower_is_better,
            state: Mutex::new(PerGroupState {
                growth: BoundedRanking::new(grow_count),
                ..Default::default()
            }),
        }
    }

    /// Result ids held by any cluster.
    pub fn results(&self) -> Vec<PatternId> {
        let state = lock(&self.state);
        let mut ids: Vec<PatternId> = state.groups.iter().flat_map(|(_, r)| r.ids()).collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

impl Metric for MaxSupportPerGroupMetric {
    fn name(&self) -> &'static str {
        "max_support_per_group"
    }

    fn init(&mut self, clusters: &ClusterRegistry) -> Result<(), MetricError> {
        self.ranking.init(clusters)?;
        let budget = (self.final_count / clusters.len().max(1)).max(1);
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        *state = PerGroupState {
            growth: BoundedRanking::new(self.grow_count),
            groups: clusters
                .ids()
                .map(|id| (id, BoundedRanking::new(budget)))
                .collect(),
            evictions: Evictions::default(),
        };
        Ok(())
    }

    fn applicable(&self, pattern: &TracablePattern, ctx: &MetricContext<'_>) -> bool {
        if !self.ranking.applicable(pattern, ctx) {
            return false;
        }
        let mut state = lock(&self.state);
        let mut accepted = false;
        let mut evicted = Vec::new();
        for (cluster, ranking) in state.groups.iter_mut() {
            let count = pattern.cluster_count(*cluster);
            if count == 0 {
                continue;
            }
            let (ok, out) = ranking.offer(directed(count as f64, self.lower_is_better), pattern.id());
            accepted |= ok;
            evicted.extend(out);
        }
        for id in evicted {
            if !state.groups.iter().any(|(_, r)| r.contains(id)) {
                state.evictions.results.push(id);
            }
        }
        accepted
    }

    fn would_apply(&self, pattern: &TracablePattern, ctx: &MetricContext<'_>) -> bool {
        if !self.ranking.applicable(pattern, ctx) {
            return false;
        }
        let state = lock(&self.state);
        state.groups.iter().any(|(cluster, ranking)| {
            let count = pattern.cluster_count(*cluster);
            count > 0 && ranking.would_accept(directed(count as f64, self.lower_is_better))
        })
    }

    fn retract_applicable(&self, id: PatternId) {
        for (_, ranking) in lock(&self.state).groups.iter_mut() {
            ranking.remove(id);
        }
    }

    fn expand(&self, pattern: &TracablePattern, ctx: &MetricContext<'_>) -> bool {
        if !self.ranking.expand(pattern, ctx) {
            return false;
        }
        let score = directed(self.ranking.rank(pattern, ctx), self.lower_is_better);
        let mut state = lock(&self.state);
        let (accepted, evicted) = state.growth.offer(score, pattern.id());
        state.evictions.frontier.extend(evicted);
        accepted
    }

    fn would_expand(&self, pattern: &TracablePattern, ctx: &MetricContext<'_>) -> bool {
        if !self.ranking.expand(pattern, ctx) {
            return false;
        }
        let score = directed(self.ranking.rank(pattern, ctx), self.lower_is_better);
        lock(&self.state).growth.would_accept(score)
    }

    fn retract_expand(&self, id: PatternId) {
        lock(&self.state).growth.remove(id);
    }

    fn rank(&self, pattern: &TracablePattern, ctx: &MetricContext<'_>) -> f64 {
        self.ranking.rank(pattern, ctx)
    }

    fn is_stateful(&self) -> bool {
        true
    }

    fn begin_round(&self) {
        self.ranking.begin_round();
        lock(&self.state).growth.clear();
    }

    fn take_evictions(&self) -> Evictions {
        let mut out = std::mem::take(&mut lock(&self.state).evictions);
        out.extend(self.ranking.take_evictions());
        out
    }
}

impl std::fmt::Debug for MaxSupportPerGroupMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaxSupportPerGroupMetric")
            .field("ranking", &self.ranking.name())
            .field("grow_count", &self.grow_count)
            .field("final_count", &self.final_count)
            .field("lower_is_better", &self.lower_is_better)
            .finish()
    }
}

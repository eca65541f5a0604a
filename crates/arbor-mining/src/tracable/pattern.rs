//! A pattern together with every place it occurs.
//!
//! Occurrence data is stored column-wise: `node_ids[pos][occ]`, one
//! `tree_ids`/`cluster_ids` entry per occurrence, and growth points as a
//! flat candidate buffer with row offsets (row = `occ * size + pos`).

use std::sync::Arc;

use arbor_core::errors::GrowthError;
use arbor_core::types::{ClusterId, FxHashMap, FxHashSet, NodeId, PatternId, SmallVec, TreeId};
use serde::Serialize;

use super::arena::PatternArena;
use super::GROWTH_CHUNK;
use crate::codec::{Pattern, ShapeBits};
use crate::hierarchy::TypeHierarchyMask;
use crate::memo::{content_id, SessionMemo};
use crate::tree::{GrowthCandidates, SyntaxTree};

/// Node id of the "anywhere" root of embedded seeds.
pub const WILDCARD_NODE_ID: NodeId = i64::MAX;

/// Where a seed occurrence lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub tree_id: TreeId,
    pub cluster_id: ClusterId,
}

/// The node behind a single-node seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeSeed {
    pub node_id: NodeId,
    /// Content id, 0 for value-abstracted seeds.
    pub content: u64,
    /// Interned variable identity.
    pub variable: Option<u64>,
}

/// Per-cluster support of a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClusterSupportCount {
    pub cluster: ClusterId,
    pub occurrences: usize,
    pub trees: usize,
}

/// Candidate lists for every (occurrence, position) row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct GrowthPoints {
    pub(crate) offsets: Vec<u32>,
    pub(crate) candidates: Vec<NodeId>,
}

impl GrowthPoints {
    pub(crate) fn new() -> Self {
        Self {
            offsets: vec![0],
            candidates: Vec::new(),
        }
    }

    pub(crate) fn rows(&self) -> usize {
        self.offsets.len() - 1
    }

    pub(crate) fn row(&self, row: usize) -> &[NodeId] {
        match (self.offsets.get(row), self.offsets.get(row + 1)) {
            (Some(&start), Some(&end)) => &self.candidates[start as usize..end as usize],
            _ => &[],
        }
    }

    pub(crate) fn push_row(&mut self, row: &[NodeId]) {
        self.candidates.extend_from_slice(row);
        self.offsets.push(self.candidates.len() as u32);
    }

    fn push_empty_rows(&mut self, count: usize) {
        let end = self.candidates.len() as u32;
        self.offsets.extend(std::iter::repeat(end).take(count));
    }

    fn append(&mut self, other: &GrowthPoints) {
        let base = self.candidates.len() as u32;
        reserve_chunked(&mut self.candidates, other.candidates.len());
        self.candidates.extend_from_slice(&other.candidates);
        self.offsets
            .extend(other.offsets[1..].iter().map(|o| o + base));
    }
}

/// Reserves capacity for `additional` items rounded up to whole chunks.
pub(crate) fn reserve_chunked<T>(buf: &mut Vec<T>, additional: usize) {
    let free = buf.capacity() - buf.len();
    if free < additional {
        buf.reserve(additional.div_ceil(GROWTH_CHUNK) * GROWTH_CHUNK);
    }
}

/// Everything two patterns must share to be merged into one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatternKey {
    pub masks: Vec<u64>,
    pub shape: ShapeBits,
    pub content: Vec<u64>,
    pub variables: Vec<Option<u32>>,
}

/// A pattern with its occurrences, variable bindings, growth points and lineage.
#[derive(Debug, Clone)]
pub struct TracablePattern {
    pub(crate) id: PatternId,
    pub(crate) pattern: Pattern,
    pub(crate) origin: Option<PatternId>,
    pub(crate) origin_ext: usize,
    /// Content id per position; 0 = any value.
    pub(crate) content: Vec<u64>,
    /// Binding label per position. Equal labels must refer to the same
    /// variable within one occurrence.
    pub(crate) variables: Vec<Option<u32>>,
    pub(crate) tree_ids: Vec<TreeId>,
    pub(crate) cluster_ids: Vec<ClusterId>,
    pub(crate) node_ids: Vec<Vec<NodeId>>,
    /// Variable identity per position and occurrence; empty for unlabelled positions.
    pub(crate) identities: Vec<Vec<u64>>,
    pub(crate) growth: Option<GrowthPoints>,
    pub(crate) support: SmallVec<[ClusterSupportCount; 4]>,
    pub(crate) tree_count: usize,
}

impl TracablePattern {
    /// One-node pattern occurring once.
    pub fn single(
        arena: &PatternArena,
        meta: &Arc<TypeHierarchyMask>,
        mask: u64,
        seed: NodeSeed,
        occurrence: Occurrence,
        candidates: &[NodeId],
    ) -> Self {
        let mut growth = GrowthPoints::new();
        growth.push_row(candidates);
        let mut pattern = Self {
            id: arena.allocate_id(),
            pattern: Pattern::single(meta, mask),
            origin: None,
            origin_ext: 0,
            content: vec![seed.content],
            variables: vec![seed.variable.map(|_| 0)],
            tree_ids: vec![occurrence.tree_id],
            cluster_ids: vec![occurrence.cluster_id],
            node_ids: vec![vec![seed.node_id]],
            identities: vec![seed.variable.into_iter().collect()],
            growth: Some(growth),
            support: SmallVec::new(),
            tree_count: 0,
        };
        pattern.refresh_support();
        pattern
    }

    /// Whole-tree pattern with explicit content and variable bindings.
    /// Growth points exclude nodes already part of the tree.
    pub fn from_tree<T: SyntaxTree>(
        arena: &PatternArena,
        tree: &T,
        occurrence: Occurrence,
        meta: &Arc<TypeHierarchyMask>,
        candidates: &GrowthCandidates,
        memo: &mut SessionMemo,
    ) -> Self {
        let nodes = tree.preorder();
        let own: FxHashSet<NodeId> = nodes.iter().map(|n| n.id()).collect();

        let mut labels: FxHashMap<u64, u32> = FxHashMap::default();
        let mut variables = Vec::with_capacity(nodes.len());
        let mut identities = Vec::with_capacity(nodes.len());
        let mut growth = GrowthPoints::new();
        for node in &nodes {
            match node.variable() {
                Some(name) => {
                    let identity = memo.variable_identity(name);
                    let next = labels.len() as u32;
                    variables.push(Some(*labels.entry(identity).or_insert(next)));
                    identities.push(vec![identity]);
                }
                None => {
                    variables.push(None);
                    identities.push(Vec::new());
                }
            }
            let row: Vec<NodeId> = candidates
                .get(node.id())
                .iter()
                .copied()
                .filter(|c| !own.contains(&c.abs()))
                .collect();
            growth.push_row(&row);
        }

        let mut pattern = Self {
            id: arena.allocate_id(),
            pattern: Pattern::encode(tree, meta),
            origin: None,
            origin_ext: 0,
            content: nodes.iter().map(|n| content_id(n.content())).collect(),
            variables,
            tree_ids: vec![occurrence.tree_id],
            cluster_ids: vec![occurrence.cluster_id],
            node_ids: nodes.iter().map(|n| vec![n.id()]).collect(),
            identities,
            growth: Some(growth),
            support: SmallVec::new(),
            tree_count: 0,
        };
        pattern.refresh_support();
        pattern
    }

    pub fn id(&self) -> PatternId {
        self.id
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn size(&self) -> usize {
        self.pattern.size()
    }

    pub fn origin(&self) -> Option<PatternId> {
        self.origin
    }

    /// Position that was extended to produce this pattern.
    pub fn origin_ext(&self) -> usize {
        self.origin_ext
    }

    pub fn content(&self) -> &[u64] {
        &self.content
    }

    pub fn variables(&self) -> &[Option<u32>] {
        &self.variables
    }

    pub fn key(&self) -> PatternKey {
        PatternKey {
            masks: self.pattern.masks().to_vec(),
            shape: self.pattern.shape().clone(),
            content: self.content.clone(),
            variables: self.variables.clone(),
        }
    }

    fn same_key(&self, other: &TracablePattern) -> bool {
        self.pattern.masks() == other.pattern.masks()
            && self.pattern.shape() == other.pattern.shape()
            && self.content == other.content
            && self.variables == other.variables
    }

    pub fn occurrence_count(&self) -> usize {
        self.tree_ids.len()
    }

    /// Distinct trees the pattern occurs in.
    pub fn tree_count(&self) -> usize {
        self.tree_count
    }

    pub fn tree_ids(&self) -> &[TreeId] {
        &self.tree_ids
    }

    pub fn cluster_ids(&self) -> &[ClusterId] {
        &self.cluster_ids
    }

    /// Node ids at `pos`, one per occurrence.
    pub fn node_ids(&self, pos: usize) -> &[NodeId] {
        self.node_ids.get(pos).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn support(&self) -> &[ClusterSupportCount] {
        &self.support
    }

    /// Distinct trees of `cluster` the pattern occurs in.
    pub fn cluster_tree_count(&self, cluster: ClusterId) -> usize {
        self.support
            .iter()
            .find(|s| s.cluster == cluster)
            .map_or(0, |s| s.trees)
    }

    /// Occurrences in `cluster`.
    pub fn cluster_count(&self, cluster: ClusterId) -> usize {
        self.support
            .iter()
            .find(|s| s.cluster == cluster)
            .map_or(0, |s| s.occurrences)
    }

    pub fn tree_id_set(&self) -> FxHashSet<TreeId> {
        self.tree_ids.iter().copied().collect()
    }

    /// Every corpus node covered by an occurrence, the wildcard root excluded.
    pub fn node_id_set(&self) -> FxHashSet<NodeId> {
        self.node_ids
            .iter()
            .flatten()
            .filter(|&&n| n != WILDCARD_NODE_ID)
            .map(|n| n.abs())
            .collect()
    }

    pub fn generalizes(&self, other: &TracablePattern) -> bool {
        self.pattern.generalizes(&other.pattern)
    }

    /// Generalization that also requires equal content and variable bindings.
    pub fn generalizes_eq_content(&self, other: &TracablePattern) -> bool {
        self.content == other.content
            && self.variables == other.variables
            && self.pattern.generalizes(&other.pattern)
    }

    pub fn contains(&self, other: &TracablePattern) -> bool {
        self.pattern.contains(&other.pattern)
    }

    pub fn is_finished(&self) -> bool {
        self.growth.is_none()
    }

    /// Candidates of one (occurrence, position) row.
    pub fn growth_at(&self, occurrence: usize, pos: usize) -> &[NodeId] {
        match &self.growth {
            Some(g) => g.row(occurrence * self.size() + pos),
            None => &[],
        }
    }

    /// All `(occurrence, candidate)` pairs at `pos`.
    pub fn growth_points(&self, pos: usize) -> Vec<(usize, NodeId)> {
        (0..self.occurrence_count())
            .flat_map(|occ| self.growth_at(occ, pos).iter().map(move |&c| (occ, c)))
            .collect()
    }

    pub fn has_growth_points(&self) -> bool {
        self.growth
            .as_ref()
            .is_some_and(|g| !g.candidates.is_empty())
    }

    /// Merges the occurrences of a pattern with the same key into `self`.
    pub fn add_location(&mut self, other: TracablePattern) -> Result<(), GrowthError> {
        if !self.same_key(&other) {
            return Err(GrowthError::ShapeMismatch);
        }
        let size = self.size();
        let before = self.occurrence_count();

        reserve_chunked(&mut self.tree_ids, other.tree_ids.len());
        reserve_chunked(&mut self.cluster_ids, other.cluster_ids.len());
        self.tree_ids.extend_from_slice(&other.tree_ids);
        self.cluster_ids.extend_from_slice(&other.cluster_ids);
        for (column, extra) in self.node_ids.iter_mut().zip(&other.node_ids) {
            reserve_chunked(column, extra.len());
            column.extend_from_slice(extra);
        }
        for (column, extra) in self.identities.iter_mut().zip(&other.identities) {
            column.extend_from_slice(extra);
        }

        let added = other.occurrence_count();
        let theirs = other.growth;
        if let Some(mine) = self.growth.as_mut() {
            match theirs {
                Some(theirs) => mine.append(&theirs),
                None => mine.push_empty_rows(added * size),
            }
        } else if let Some(theirs) = theirs {
            let mut merged = GrowthPoints::new();
            merged.push_empty_rows(before * size);
            merged.append(&theirs);
            self.growth = Some(merged);
        }

        self.refresh_support();
        Ok(())
    }

    /// Releases growth-point storage.
    pub fn finish(&mut self) {
        self.growth = None;
    }

    pub(crate) fn refresh_support(&mut self) {
        let mut support: SmallVec<[ClusterSupportCount; 4]> = SmallVec::new();
        let mut seen: FxHashSet<(ClusterId, TreeId)> = FxHashSet::default();
        for (&cluster, &tree) in self.cluster_ids.iter().zip(&self.tree_ids) {
            let fresh = seen.insert((cluster, tree));
            match support.iter_mut().find(|s| s.cluster == cluster) {
                Some(entry) => {
                    entry.occurrences += 1;
                    entry.trees += usize::from(fresh);
                }
                None => support.push(ClusterSupportCount {
                    cluster,
                    occurrences: 1,
                    trees: 1,
                }),
            }
        }
        support.sort_by_key(|s| s.cluster);
        self.tree_count = support.iter().map(|s| s.trees).sum();
        self.support = support;
    }
}

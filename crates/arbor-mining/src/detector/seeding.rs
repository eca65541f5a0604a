//! Seeding: one single-node pattern per node and hierarchy level, merged by key.

use std::collections::hash_map::Entry;
use std::sync::Arc;

use arbor_core::config::Specialization;
use arbor_core::errors::GrowthError;
use arbor_core::types::{ClusterId, FxHashMap, NodeId, SmallVec};
use tracing::debug;

use crate::cluster::Cluster;
use crate::codec::ShapeBits;
use crate::hierarchy::{TypeHierarchyMask, ANYWHERE_MASK};
use crate::memo::SessionMemo;
use crate::tracable::{NodeSeed, Occurrence, PatternArena, PatternKey, TracablePattern, WILDCARD_NODE_ID};
use crate::tree::{GrowthCandidates, SyntaxTree};

#[derive(Debug, Clone, Copy)]
pub(crate) struct SeedOptions {
    pub(crate) floor: u32,
    pub(crate) ceil: u32,
    pub(crate) embedded: bool,
}

/// Single-occurrence seed variants of every node, used as growth targets.
/// Variants sharing a key share a class, the index of their merged seed.
#[derive(Debug, Default)]
pub(crate) struct SeedTable {
    variants: Vec<TracablePattern>,
    classes: Vec<u32>,
    by_node: FxHashMap<NodeId, SmallVec<[u32; 4]>>,
}

impl SeedTable {
    fn push(&mut self, node: NodeId, variant: TracablePattern, class: u32) {
        let index = self.variants.len() as u32;
        self.variants.push(variant);
        self.classes.push(class);
        self.by_node.entry(node).or_default().push(index);
    }

    /// `(class, variant)` pairs of `node`; empty for nodes outside the corpus.
    pub(crate) fn variants_of(&self, node: NodeId) -> impl Iterator<Item = (u32, &TracablePattern)> + '_ {
        self.by_node
            .get(&node)
            .into_iter()
            .flatten()
            .map(move |&i| (self.classes[i as usize], &self.variants[i as usize]))
    }

    pub(crate) fn len(&self) -> usize {
        self.variants.len()
    }
}

pub(crate) struct Seeding {
    pub(crate) table: SeedTable,
    /// Merged seeds, indexed by class.
    pub(crate) seeds: Vec<TracablePattern>,
}

pub(crate) fn seed_clusters<T: SyntaxTree>(
    arena: &PatternArena,
    meta: &Arc<TypeHierarchyMask>,
    clusters: &[Cluster<T>],
    memo: &mut SessionMemo,
    options: SeedOptions,
) -> Result<Seeding, GrowthError> {
    let mut seeds: Vec<TracablePattern> = Vec::new();
    let mut index: FxHashMap<PatternKey, u32> = FxHashMap::default();
    let mut table = SeedTable::default();

    for (i, cluster) in clusters.iter().enumerate() {
        let cluster_id = i as ClusterId + 1;
        for tree in &cluster.trees {
            let derived: GrowthCandidates;
            let candidates = match &cluster.candidates {
                Some(precomputed) => precomputed,
                None => {
                    derived = if options.embedded {
                        GrowthCandidates::embedded(tree)
                    } else {
                        GrowthCandidates::direct(tree)
                    };
                    &derived
                }
            };
            let occurrence = Occurrence {
                tree_id: tree.id(),
                cluster_id,
            };

            if options.embedded {
                let wildcard = TracablePattern::single(
                    arena,
                    meta,
                    ANYWHERE_MASK,
                    NodeSeed {
                        node_id: WILDCARD_NODE_ID,
                        content: 0,
                        variable: None,
                    },
                    occurrence,
                    candidates.get(tree.id()),
                );
                merge(&mut seeds, &mut index, wildcard)?;
            }

            for node in tree.preorder() {
                let variable = node.variable().map(|name| memo.variable_identity(name));
                let variants = memo.variants(
                    meta,
                    node.type_name(),
                    node.content(),
                    options.floor,
                    options.ceil,
                );
                for (mask, content) in variants {
                    let variant = TracablePattern::single(
                        arena,
                        meta,
                        mask,
                        NodeSeed {
                            node_id: node.id(),
                            content,
                            variable,
                        },
                        occurrence,
                        candidates.get(node.id()),
                    );
                    let class = merge(&mut seeds, &mut index, variant.clone())?;
                    table.push(node.id(), variant, class);
                }
            }
        }
    }

    debug!(
        seeds = seeds.len(),
        variants = table.len(),
        variables = memo.variable_count(),
        "seeded corpus"
    );
    Ok(Seeding { table, seeds })
}

fn merge(
    seeds: &mut Vec<TracablePattern>,
    index: &mut FxHashMap<PatternKey, u32>,
    seed: TracablePattern,
) -> Result<u32, GrowthError> {
    match index.entry(seed.key()) {
        Entry::Occupied(e) => {
            let class = *e.get();
            seeds[class as usize].add_location(seed)?;
            Ok(class)
        }
        Entry::Vacant(e) => {
            let class = seeds.len() as u32;
            e.insert(class);
            seeds.push(seed);
            Ok(class)
        }
    }
}

/// Marks hierarchy-level duplicates for removal: patterns with identical
/// shape, content, bindings and occurrence count where one generalizes
/// the other. `Specialized` drops the general side, `Generalized` the
/// specific side. Of two equal patterns the later one is dropped.
pub(crate) fn specialization_drops(patterns: &[&TracablePattern], mode: Specialization) -> Vec<bool> {
    let mut drops = vec![false; patterns.len()];
    if mode == Specialization::All || patterns.len() < 2 {
        return drops;
    }

    type Bucket<'a> = (usize, &'a ShapeBits, &'a [u64], &'a [Option<u32>]);
    let mut buckets: FxHashMap<Bucket<'_>, SmallVec<[usize; 4]>> = FxHashMap::default();
    for (i, p) in patterns.iter().enumerate() {
        buckets
            .entry((p.occurrence_count(), p.pattern().shape(), p.content(), p.variables()))
            .or_default()
            .push(i);
    }

    for members in buckets.values().filter(|m| m.len() > 1) {
        for &i in members {
            drops[i] = members.iter().any(|&j| {
                if i == j {
                    return false;
                }
                let (general, specific) = match mode {
                    Specialization::Specialized => (i, j),
                    _ => (j, i),
                };
                patterns[general].generalizes_eq_content(patterns[specific])
                    && (!patterns[specific].generalizes_eq_content(patterns[general]) || i > j)
            });
        }
    }
    drops
}

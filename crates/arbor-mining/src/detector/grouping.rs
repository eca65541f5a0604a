//! Reduces a mined pattern set to its minimal or maximal members.

use arbor_core::config::Grouping;
use arbor_core::types::{FxHashMap, FxHashSet, NodeId, PatternId, TreeId};
use tracing::debug;

use crate::tracable::{PatternArena, TracablePattern, WILDCARD_NODE_ID};

/// The trees and nodes a pattern touches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Footprint {
    pub trees: FxHashSet<TreeId>,
    pub nodes: FxHashSet<NodeId>,
}

impl Footprint {
    pub fn of(pattern: &TracablePattern) -> Self {
        Self {
            trees: pattern.tree_id_set(),
            nodes: pattern.node_id_set(),
        }
    }

    pub fn subset(&self, other: &Footprint) -> bool {
        self.trees.len() <= other.trees.len()
            && self.nodes.len() <= other.nodes.len()
            && self.trees.is_subset(&other.trees)
            && self.nodes.is_subset(&other.nodes)
    }
}

struct Member<'a> {
    id: PatternId,
    pattern: &'a TracablePattern,
    footprint: Footprint,
}

/// `small` lies inside `big`: its footprint is covered and, when
/// `hierarchy_compare` is set, every node it shares agrees on type and content.
fn covers(big: &Member<'_>, small: &Member<'_>, hierarchy_compare: bool) -> bool {
    small.footprint.subset(&big.footprint)
        && (!hierarchy_compare || hierarchy_matches(big.pattern, small.pattern))
}

/// Every position of `small` is located by the node it matched in its
/// first occurrence; `big` must hold that node at a position with the same
/// mask and content.
fn hierarchy_matches(big: &TracablePattern, small: &TracablePattern) -> bool {
    let mut positions: FxHashMap<NodeId, usize> = FxHashMap::default();
    for pos in 0..big.size() {
        for &node in big.node_ids(pos) {
            positions.entry(node.abs()).or_insert(pos);
        }
    }
    (0..small.size()).all(|pos| {
        let Some(&node) = small.node_ids(pos).first() else {
            return false;
        };
        if node == WILDCARD_NODE_ID {
            return true;
        }
        positions.get(&node.abs()).is_some_and(|&q| {
            big.pattern().masks()[q] == small.pattern().masks()[pos] && big.content()[q] == small.content()[pos]
        })
    })
}

/// Filters `ids` by `mode`. `Min` keeps patterns that cover no other kept
/// pattern, `Max` keeps patterns no other kept pattern covers. The result
/// is sorted by id.
pub fn group(arena: &PatternArena, ids: &[PatternId], mode: Grouping, hierarchy_compare: bool) -> Vec<PatternId> {
    let mut members: Vec<Member<'_>> = ids
        .iter()
        .filter_map(|&id| {
            arena.get(id).map(|pattern| Member {
                id,
                pattern,
                footprint: Footprint::of(pattern),
            })
        })
        .collect();

    let mut out: Vec<PatternId> = match mode {
        Grouping::All => members.iter().map(|m| m.id).collect(),
        Grouping::Min => {
            members.sort_by_key(|m| (m.pattern.size(), m.id));
            antichain(&members, |x, kept| covers(x, kept, hierarchy_compare))
        }
        Grouping::Max => {
            members.sort_by_key(|m| (std::cmp::Reverse(m.pattern.size()), m.id));
            antichain(&members, |x, kept| covers(kept, x, hierarchy_compare))
        }
    };
    out.sort_unstable();
    out.dedup();

    debug!(
        candidates = ids.len(),
        kept = out.len(),
        mode = ?mode,
        "grouped patterns"
    );
    out
}

/// Admits members in order. `dominated(x, k)` says `x` must yield to the
/// kept `k`; an admitted member evicts every kept one it dominates.
fn antichain<'a, F>(members: &'a [Member<'a>], dominated: F) -> Vec<PatternId>
where
    F: Fn(&Member<'a>, &Member<'a>) -> bool,
{
    let mut kept: Vec<&Member<'a>> = Vec::new();
    for member in members {
        if kept.iter().any(|k| dominated(member, k)) {
            continue;
        }
        kept.retain(|k| !dominated(k, member));
        kept.push(member);
    }
    kept.into_iter().map(|m| m.id).collect()
}

//! Storage for mined patterns and their lineage.

use std::sync::atomic::{AtomicU32, Ordering};

use arbor_core::types::{FxHashMap, PatternId};

use super::pattern::TracablePattern;

/// Owns every pattern kept during a mining run. Patterns reference their
/// origin by id, so the lineage DAG never holds pointers.
#[derive(Debug)]
pub struct PatternArena {
    patterns: FxHashMap<PatternId, TracablePattern>,
    next_id: AtomicU32,
}

impl Default for PatternArena {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternArena {
    pub fn new() -> Self {
        Self {
            patterns: FxHashMap::default(),
            next_id: AtomicU32::new(1),
        }
    }

    /// Hands out a fresh id. Safe to call from parallel growth.
    pub fn allocate_id(&self) -> PatternId {
        PatternId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub fn insert(&mut self, pattern: TracablePattern) -> PatternId {
        let id = pattern.id();
        self.patterns.insert(id, pattern);
        id
    }

    pub fn get(&self, id: PatternId) -> Option<&TracablePattern> {
        self.patterns.get(&id)
    }

    pub fn get_mut(&mut self, id: PatternId) -> Option<&mut TracablePattern> {
        self.patterns.get_mut(&id)
    }

    pub fn contains(&self, id: PatternId) -> bool {
        self.patterns.contains_key(&id)
    }

    /// Releases the growth points of a pattern that will not be expanded again.
    pub fn finish(&mut self, id: PatternId) {
        if let Some(p) = self.patterns.get_mut(&id) {
            p.finish();
        }
    }

    pub fn origin_of(&self, pattern: &TracablePattern) -> Option<&TracablePattern> {
        pattern.origin().and_then(|id| self.get(id))
    }

    /// `id` and its stored ancestors, newest first.
    pub fn lineage(&self, id: PatternId) -> Vec<PatternId> {
        let mut out = Vec::new();
        let mut current = self.get(id);
        while let Some(p) = current {
            out.push(p.id());
            current = self.origin_of(p);
        }
        out
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TracablePattern> {
        self.patterns.values()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::hierarchy::TypeHierarchy;
    use crate::tracable::{Extension, NodeSeed, Occurrence};

    #[test]
    fn lineage_follows_origins() {
        let meta = Arc::new(TypeHierarchy::flat(["A", "B"]).build(&[]).unwrap());
        let mut arena = PatternArena::new();
        let seed = |arena: &PatternArena, ty: &str, node| {
            TracablePattern::single(
                arena,
                &meta,
                meta.mask(ty),
                NodeSeed {
                    node_id: node,
                    content: 0,
                    variable: None,
                },
                Occurrence {
                    tree_id: 1,
                    cluster_id: 1,
                },
                &[2],
            )
        };
        let a = seed(&arena, "A", 1);
        let b = seed(&arena, "B", 2);
        let ab = a
            .grow(&arena, 0, &[Extension { occurrence: 0, node: 2 }], &b, false)
            .unwrap()
            .remove(0);
        let a_id = arena.insert(a);
        let ab_id = arena.insert(ab);

        assert_eq!(arena.lineage(ab_id), vec![ab_id, a_id]);
        assert_eq!(arena.len(), 2);
        arena.finish(ab_id);
        assert!(arena.get(ab_id).is_some_and(TracablePattern::is_finished));
    }
}

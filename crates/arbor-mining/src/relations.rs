//! Containment and generalization relations between mined patterns.
//!
//! Patterns are inserted one at a time; each insertion compares the new
//! pattern against the known ones and propagates the transitive closure, so
//! candidates already implied by an earlier match are never compared.

use std::collections::{BTreeSet, VecDeque};

use arbor_core::types::{FxHashMap, FxHashSet, PatternId};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use tracing::{debug, warn};

use crate::codec::Pattern;
use crate::tracable::PatternArena;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RelationKind {
    /// `from` contains `to`.
    Contains,
    /// `from` generalizes `to`.
    Generalizes,
}

/// A relation found by direct comparison rather than propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Relation {
    pub from: PatternId,
    pub to: PatternId,
    pub kind: RelationKind,
}

/// Transitively closed neighbours of one pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelationEntry {
    pub contains: BTreeSet<PatternId>,
    pub contained_in: BTreeSet<PatternId>,
    /// More specific patterns.
    pub generalizes: BTreeSet<PatternId>,
    /// More general patterns.
    pub specializes: BTreeSet<PatternId>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PatternRelations {
    order: Vec<PatternId>,
    entries: FxHashMap<PatternId, RelationEntry>,
    direct: Vec<Relation>,
}

impl PatternRelations {
    /// Ids in insertion order.
    pub fn order(&self) -> &[PatternId] {
        &self.order
    }

    pub fn get(&self, id: PatternId) -> Option<&RelationEntry> {
        self.entries.get(&id)
    }

    pub fn direct(&self) -> &[Relation] {
        &self.direct
    }

    pub fn contains(&self, container: PatternId, containee: PatternId) -> bool {
        self.get(container).is_some_and(|e| e.contains.contains(&containee))
    }

    pub fn generalizes(&self, general: PatternId, specific: PatternId) -> bool {
        self.get(general).is_some_and(|e| e.generalizes.contains(&specific))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Directly compared relations as a graph; one node per pattern.
    pub fn to_graph(&self) -> DiGraph<PatternId, RelationKind> {
        let mut graph = DiGraph::with_capacity(self.order.len(), self.direct.len());
        let index: FxHashMap<PatternId, NodeIndex> =
            self.order.iter().map(|&id| (id, graph.add_node(id))).collect();
        for relation in &self.direct {
            if let (Some(&from), Some(&to)) = (index.get(&relation.from), index.get(&relation.to)) {
                graph.add_edge(from, to, relation.kind);
            }
        }
        graph
    }

    fn entry_mut(&mut self, id: PatternId) -> &mut RelationEntry {
        self.entries.entry(id).or_default()
    }
}

/// Incrementally relates patterns by `contains` and `generalizes`.
#[derive(Debug, Default)]
pub struct PatternRelationMapper {
    known: Vec<(PatternId, Pattern)>,
    relations: PatternRelations,
}

impl PatternRelationMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map<I>(patterns: I) -> PatternRelations
    where
        I: IntoIterator<Item = (PatternId, Pattern)>,
    {
        let mut mapper = Self::new();
        for (id, pattern) in patterns {
            mapper.insert(id, pattern);
        }
        mapper.finish()
    }

    /// Relates the stored patterns of `ids`; unknown ids are skipped.
    pub fn map_arena(arena: &PatternArena, ids: &[PatternId]) -> PatternRelations {
        Self::map(
            ids.iter()
                .filter_map(|&id| arena.get(id).map(|p| (id, p.pattern().clone()))),
        )
    }

    pub fn insert(&mut self, id: PatternId, pattern: Pattern) {
        if self.relations.entries.contains_key(&id) {
            warn!(pattern = %id, "pattern already mapped");
            return;
        }
        let mut entry = RelationEntry::default();
        self.relate_containment(id, &pattern, &mut entry);
        self.relate_generalization(id, &pattern, &mut entry);

        debug!(
            pattern = %id,
            contains = entry.contains.len(),
            contained_in = entry.contained_in.len(),
            generalizes = entry.generalizes.len(),
            specializes = entry.specializes.len(),
            "mapped pattern"
        );
        self.relations.order.push(id);
        self.relations.entries.insert(id, entry);
        self.known.push((id, pattern));
    }

    pub fn relations(&self) -> &PatternRelations {
        &self.relations
    }

    pub fn finish(self) -> PatternRelations {
        self.relations
    }

    fn relate_containment(&mut self, id: PatternId, pattern: &Pattern, entry: &mut RelationEntry) {
        let mut worklist: VecDeque<usize> = (0..self.known.len()).collect();
        let mut skip: FxHashSet<PatternId> = FxHashSet::default();
        while let Some(i) = worklist.pop_front() {
            let (other, other_pattern) = &self.known[i];
            let other = *other;
            if skip.contains(&other) {
                continue;
            }
            if other_pattern.contains(pattern) {
                let above = self.relations.entry_mut(other).contained_in.clone();
                self.relations.entry_mut(other).contains.insert(id);
                for &y in &above {
                    self.relations.entry_mut(y).contains.insert(id);
                }
                entry.contained_in.insert(other);
                entry.contained_in.extend(above.iter().copied());
                skip.extend(above);
                self.relations.direct.push(Relation {
                    from: other,
                    to: id,
                    kind: RelationKind::Contains,
                });
            } else if pattern.contains(other_pattern) {
                let below = self.relations.entry_mut(other).contains.clone();
                self.relations.entry_mut(other).contained_in.insert(id);
                for &y in &below {
                    self.relations.entry_mut(y).contained_in.insert(id);
                }
                entry.contains.insert(other);
                entry.contains.extend(below.iter().copied());
                skip.extend(below);
                self.relations.direct.push(Relation {
                    from: id,
                    to: other,
                    kind: RelationKind::Contains,
                });
            }
        }
    }

    fn relate_generalization(&mut self, id: PatternId, pattern: &Pattern, entry: &mut RelationEntry) {
        let mut worklist: VecDeque<usize> = (0..self.known.len()).collect();
        let mut skip: FxHashSet<PatternId> = FxHashSet::default();
        while let Some(i) = worklist.pop_front() {
            let (other, other_pattern) = &self.known[i];
            let other = *other;
            if skip.contains(&other) {
                continue;
            }
            if other_pattern.generalizes(pattern) {
                let above = self.relations.entry_mut(other).specializes.clone();
                self.relations.entry_mut(other).generalizes.insert(id);
                for &y in &above {
                    self.relations.entry_mut(y).generalizes.insert(id);
                }
                entry.specializes.insert(other);
                entry.specializes.extend(above.iter().copied());
                skip.extend(above);
                self.relations.direct.push(Relation {
                    from: other,
                    to: id,
                    kind: RelationKind::Generalizes,
                });
            } else if pattern.generalizes(other_pattern) {
                let below = self.relations.entry_mut(other).generalizes.clone();
                self.relations.entry_mut(other).specializes.insert(id);
                for &y in &below {
                    self.relations.entry_mut(y).specializes.insert(id);
                }
                entry.generalizes.insert(other);
                entry.generalizes.extend(below.iter().copied());
                skip.extend(below);
                self.relations.direct.push(Relation {
                    from: id,
                    to: other,
                    kind: RelationKind::Generalizes,
                });
            }
        }
    }
}

//! One-node extension of a tracable pattern.

use arbor_core::errors::GrowthError;
use arbor_core::types::{FxHashMap, FxHashSet, NodeId, SmallVec};
use tracing::{trace, warn};

use super::arena::PatternArena;
use super::pattern::{GrowthPoints, TracablePattern};

/// Extends occurrence `occurrence` by the candidate `node` (negative when
/// the relationship is indirect).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extension {
    pub occurrence: usize,
    pub node: NodeId,
}

/// Binding label of the new node and the extensions (with their target row) sharing it.
type BindingGroup = (Option<u32>, Vec<(Extension, Option<usize>)>);

impl TracablePattern {
    /// Attaches `target` as the new last child of `pos` in every occurrence
    /// named by `extensions`.
    ///
    /// Returns one pattern per distinct variable binding of the new node;
    /// extensions whose binding disagrees fork into separate patterns.
    /// `self` is never modified.
    pub fn grow(
        &self,
        arena: &PatternArena,
        pos: usize,
        extensions: &[Extension],
        target: &TracablePattern,
        embedded: bool,
    ) -> Result<Vec<TracablePattern>, GrowthError> {
        let size = self.size();
        if pos >= size {
            return Err(GrowthError::PositionOutOfRange { pos, size });
        }
        if extensions.is_empty() {
            return Err(GrowthError::EmptyExtension);
        }
        if target.size() != 1 {
            return Err(GrowthError::TargetNotSingleNode {
                size: target.size(),
            });
        }
        let growth = self.growth.as_ref().ok_or(GrowthError::GrowthPointsReleased)?;
        let count = self.occurrence_count();
        if let Some(bad) = extensions.iter().find(|e| e.occurrence >= count) {
            return Err(GrowthError::OccurrenceOutOfRange {
                occurrence: bad.occurrence,
                count,
            });
        }

        let mut target_rows: FxHashMap<NodeId, usize> = FxHashMap::default();
        for (occ, &node) in target.node_ids(0).iter().enumerate() {
            target_rows.entry(node.abs()).or_insert(occ);
        }

        let groups = self.bind_variables(extensions, target, &target_rows);
        if groups.len() > 1 {
            trace!(pattern = %self.id, pos, forks = groups.len(), "variable binding forked growth");
        }

        let topo = self.pattern.topology();
        let insert_at = topo.subtree_end(pos);
        let bit_at = topo.close_bit(pos);
        let ancestors: FxHashSet<usize> = topo.ancestors(pos).skip(1).collect();

        let mut children = Vec::with_capacity(groups.len());
        for (label, rows) in groups {
            let mut pattern = self.pattern.clone();
            {
                let (masks, shape) = pattern.parts_mut();
                masks.insert(insert_at, target.pattern.masks()[0]);
                shape.insert_edge(bit_at);
            }

            let mut content = self.content.clone();
            content.insert(insert_at, target.content[0]);
            let mut variables = self.variables.clone();
            variables.insert(insert_at, label);

            let mut tree_ids = Vec::with_capacity(rows.len());
            let mut cluster_ids = Vec::with_capacity(rows.len());
            let mut node_ids: Vec<Vec<NodeId>> = vec![Vec::with_capacity(rows.len()); size + 1];
            let mut identities: Vec<Vec<u64>> = vec![Vec::new(); size + 1];
            let mut points = GrowthPoints::new();

            for (ext, target_row) in rows {
                let occ = ext.occurrence;
                tree_ids.push(self.tree_ids[occ]);
                cluster_ids.push(self.cluster_ids[occ]);

                for q in 0..=size {
                    if q == insert_at {
                        node_ids[q].push(ext.node.abs());
                        if label.is_some() {
                            identities[q].push(target_identity(target, target_row));
                        }
                        continue;
                    }
                    let p = if q < insert_at { q } else { q - 1 };
                    node_ids[q].push(self.node_ids[p][occ]);
                    if !self.identities[p].is_empty() {
                        identities[q].push(self.identities[p][occ]);
                    }
                }

                let adopted = target_row
                    .and_then(|row| target.growth.as_ref().map(|g| g.row(row)))
                    .unwrap_or(&[]);
                for q in 0..=size {
                    if q == insert_at {
                        points.push_row(adopted);
                        continue;
                    }
                    let p = if q < insert_at { q } else { q - 1 };
                    let row = growth.row(occ * size + p);
                    if p == pos {
                        points.push_row(remaining_after(row, ext.node, adopted.len(), embedded));
                    } else if ancestors.contains(&p) {
                        points.push_row(row);
                    } else {
                        points.push_row(&[]);
                    }
                }
            }

            let mut child = TracablePattern {
                id: arena.allocate_id(),
                pattern,
                origin: Some(self.id),
                origin_ext: pos,
                content,
                variables,
                tree_ids,
                cluster_ids,
                node_ids,
                identities,
                growth: Some(points),
                support: SmallVec::new(),
                tree_count: 0,
            };
            child.refresh_support();
            children.push(child);
        }
        Ok(children)
    }

    /// Groups extensions by the binding label the new node receives.
    fn bind_variables(
        &self,
        extensions: &[Extension],
        target: &TracablePattern,
        target_rows: &FxHashMap<NodeId, usize>,
    ) -> Vec<BindingGroup> {
        let with_row = |e: &Extension| (*e, target_rows.get(&e.node.abs()).copied());

        if target.variables[0].is_none() {
            return vec![(None, extensions.iter().map(with_row).collect())];
        }

        // first position of every label already in use
        let mut labelled: SmallVec<[(u32, usize); 4]> = SmallVec::new();
        for (p, label) in self.variables.iter().enumerate() {
            if let Some(l) = *label {
                if !labelled.iter().any(|&(s, _)| s == l) {
                    labelled.push((l, p));
                }
            }
        }
        let fresh = labelled.iter().map(|(l, _)| l + 1).max().unwrap_or(0);

        let mut groups: Vec<BindingGroup> = Vec::new();
        for ext in extensions {
            let (ext, row) = with_row(ext);
            let identity = row.map(|r| target_identity(target, Some(r)));
            let label = identity
                .and_then(|id| {
                    labelled
                        .iter()
                        .find(|(_, p)| self.identities[*p][ext.occurrence] == id)
                        .map(|(l, _)| *l)
                })
                .unwrap_or(fresh);
            match groups.iter_mut().find(|(l, _)| *l == Some(label)) {
                Some((_, rows)) => rows.push((ext, row)),
                None => groups.push((Some(label), vec![(ext, row)])),
            }
        }
        groups
    }
}

fn target_identity(target: &TracablePattern, row: Option<usize>) -> u64 {
    row.and_then(|r| target.identities[0].get(r).copied())
        .unwrap_or(0)
}

/// Growth points left at the extended position: everything after the
/// consumed candidate, minus the candidate's own descendants in embedded mode.
fn remaining_after(row: &[NodeId], consumed: NodeId, adopted: usize, embedded: bool) -> &[NodeId] {
    match row.iter().position(|&c| c == consumed) {
        Some(i) => {
            let skip = if embedded { adopted } else { 0 };
            &row[(i + 1 + skip).min(row.len())..]
        }
        None => {
            warn!(node = consumed, "consumed growth point missing from its row");
            row
        }
    }
}

//! Per-session lookup tables: variable interning, content hashing and the
//! hierarchy-level variant cache used while seeding.

use std::sync::{Arc, Weak};

use arbor_core::types::{FxHashMap, SmallVec, SmallVec4};
use lasso::{Key, Rodeo};
use tracing::debug;
use xxhash_rust::xxh3::xxh3_64;

use crate::hierarchy::TypeHierarchyMask;

/// One seed variant of a node: mask plus content id (0 = no content).
pub type Variant = (u64, u64);

/// Caches owned by one mining session and passed by the caller.
#[derive(Debug, Default)]
pub struct SessionMemo {
    variables: Rodeo,
    /// Hierarchy the cached chains were computed for.
    owner: Option<Weak<TypeHierarchyMask>>,
    /// type name → masks of its ancestor chain, the type itself first.
    chains: FxHashMap<String, Vec<u64>>,
}

impl SessionMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stable non-zero identity of a variable name within this session.
    pub fn variable_identity(&mut self, name: &str) -> u64 {
        self.variables.get_or_intern(name).into_usize() as u64 + 1
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    /// Drops cached chains computed for a different hierarchy.
    fn bind(&mut self, meta: &Arc<TypeHierarchyMask>) {
        let current = self
            .owner
            .as_ref()
            .is_some_and(|owner| owner.ptr_eq(&Arc::downgrade(meta)));
        if !current {
            if !self.chains.is_empty() {
                debug!(cached = self.chains.len(), "hierarchy changed, clearing chain cache");
            }
            self.chains.clear();
            self.owner = Some(Arc::downgrade(meta));
        }
    }

    /// Masks of `type_name` and its ancestors, innermost first.
    pub fn chain(&mut self, meta: &Arc<TypeHierarchyMask>, type_name: &str) -> &[u64] {
        self.bind(meta);
        self.chains
            .entry(type_name.to_string())
            .or_insert_with(|| {
                let mut chain: Vec<u64> = meta
                    .hierarchy_of(type_name)
                    .iter()
                    .map(|t| meta.mask(t))
                    .collect();
                chain.reverse();
                chain.dedup();
                chain
            })
    }

    /// Seed variants for a node in `[floor, ceil]`. Level 0 is the explicit
    /// node (type mask plus content), level `L` the value-abstracted
    /// `L - 1`-th ancestor counted from the type itself.
    pub fn variants(
        &mut self,
        meta: &Arc<TypeHierarchyMask>,
        type_name: &str,
        content: Option<&str>,
        floor: u32,
        ceil: u32,
    ) -> SmallVec4<Variant> {
        let mut out: SmallVec4<Variant> = SmallVec::new();
        if floor == 0 {
            out.push((meta.mask(type_name), content_id(content)));
        }
        let chain = self.chain(meta, type_name);
        let top = (ceil as usize).min(chain.len());
        for level in floor.max(1) as usize..=top {
            let variant = (chain[level - 1], 0);
            if !out.contains(&variant) {
                out.push(variant);
            }
        }
        out
    }
}

/// 64-bit id of a literal attribute signature; 0 when the node has none.
pub fn content_id(content: Option<&str>) -> u64 {
    content.map_or(0, |c| xxh3_64(c.as_bytes()).max(1))
}

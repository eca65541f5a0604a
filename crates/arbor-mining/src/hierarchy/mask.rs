//! Nested bit-mask codes for a type hierarchy.
//!
//! Masks are read MSB-first. Each hierarchy layer owns a contiguous bit
//! range; a type's code is written into its layer's range and OR-ed with the
//! parent's mask, so every mask carries all of its ancestors as a prefix.

use arbor_core::errors::HierarchyError;
use arbor_core::types::FxHashMap;
use tracing::debug;

/// Mask of the hierarchy root: matches any type.
pub const ANY_MASK: u64 = 0;
/// Mask of the "anywhere" wildcard used as an embedded pattern root.
pub const ANYWHERE_MASK: u64 = u64::MAX;
pub const ANYWHERE_TYPE: &str = "*";
/// Catch-all for API-boundary types without an own mask.
pub const API_TYPE: &str = "<api>";
/// Catch-all for every other type without an own mask.
pub const EXCLUDED_TYPE: &str = "<excluded>";

/// Ones in the top `width` bits.
pub(crate) fn top_ones(width: u32) -> u64 {
    match width {
        0 => 0,
        w if w >= 64 => u64::MAX,
        w => u64::MAX << (64 - w),
    }
}

/// Smallest bit width able to hold `codes` distinct codes.
fn bit_width(codes: u64) -> u32 {
    (64 - (codes - 1).leading_zeros()).max(1)
}

/// Immutable type → mask table built once per hierarchy.
#[derive(Debug, Clone)]
pub struct TypeHierarchyMask {
    root: String,
    masks: FxHashMap<String, u64>,
    inverse: FxHashMap<u64, String>,
    /// End bit offset (from the MSB) of each layer.
    layers: Vec<u32>,
    children: FxHashMap<String, Vec<String>>,
    api_prefixes: Vec<String>,
}

impl TypeHierarchyMask {
    pub fn new(
        hierarchy: &FxHashMap<String, Vec<String>>,
        root: &str,
    ) -> Result<Self, HierarchyError> {
        Self::with_api_prefixes(hierarchy, root, &[])
    }

    /// Builds the mask table. Types starting with one of `api_prefixes` that
    /// are not part of the hierarchy map to [`API_TYPE`].
    pub fn with_api_prefixes(
        hierarchy: &FxHashMap<String, Vec<String>>,
        root: &str,
        api_prefixes: &[String],
    ) -> Result<Self, HierarchyError> {
        let mut children = hierarchy.clone();
        let root_children = children
            .get_mut(root)
            .ok_or_else(|| HierarchyError::MissingRoot {
                root: root.to_string(),
            })?;
        for sentinel in [API_TYPE, EXCLUDED_TYPE] {
            if !root_children.iter().any(|c| c == sentinel) {
                root_children.push(sentinel.to_string());
            }
        }

        let mut masks = FxHashMap::default();
        let mut inverse = FxHashMap::default();
        masks.insert(root.to_string(), ANY_MASK);
        inverse.insert(ANY_MASK, root.to_string());
        masks.insert(ANYWHERE_TYPE.to_string(), ANYWHERE_MASK);
        inverse.insert(ANYWHERE_MASK, ANYWHERE_TYPE.to_string());

        let mut layers = Vec::new();
        let mut entry_points = vec![root.to_string()];
        let mut offset = 0u32;

        while !entry_points.is_empty() {
            let widest = entry_points
                .iter()
                .filter_map(|e| children.get(e))
                .map(Vec::len)
                .max()
                .unwrap_or(0);
            if widest == 0 {
                break;
            }
            // code 0 stays reserved for "unspecified"
            let codes = widest as u64 + 1;
            let end = offset + bit_width(codes);
            if end > 64 {
                return Err(HierarchyError::BitBudgetExceeded {
                    layer: layers.len(),
                    bits: end,
                });
            }
            layers.push(end);
            debug!(layer = layers.len() - 1, start = offset, end, widest, "hierarchy layer");

            let mut next = Vec::new();
            for entry in &entry_points {
                let Some(mut group) = children.get(entry) else {
                    continue;
                };
                let parent_mask = masks.get(entry).copied().unwrap_or(ANY_MASK);

                // Collapse single-child chains as long as the group below
                // still fits into this layer.
                let mut collapsed: Vec<&String> = Vec::new();
                while group.len() == 1 {
                    let only = &group[0];
                    match children.get(only) {
                        Some(grand)
                            if !grand.is_empty()
                                && (grand.len() as u64) < codes
                                && !collapsed.contains(&only) =>
                        {
                            collapsed.push(only);
                            group = grand;
                        }
                        _ => break,
                    }
                }
                for name in collapsed {
                    if masks.contains_key(name) {
                        return Err(HierarchyError::MaskCollision {
                            type_name: name.clone(),
                            mask: parent_mask,
                        });
                    }
                    debug!(type_name = %name, parent = %entry, "collapsed single-child type");
                    masks.insert(name.clone(), parent_mask);
                }

                for (i, child) in group.iter().enumerate() {
                    let code = i as u64 + 1;
                    let mask = (code << (64 - end)) | parent_mask;
                    if masks.contains_key(child) || inverse.contains_key(&mask) {
                        return Err(HierarchyError::MaskCollision {
                            type_name: child.clone(),
                            mask,
                        });
                    }
                    masks.insert(child.clone(), mask);
                    inverse.insert(mask, child.clone());
                    next.push(child.clone());
                }
            }
            offset = end;
            entry_points = next;
        }

        debug!(types = masks.len(), layers = layers.len(), bits = offset, "type hierarchy masked");

        Ok(Self {
            root: root.to_string(),
            masks,
            inverse,
            layers,
            children,
            api_prefixes: api_prefixes.to_vec(),
        })
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// End offsets of all layers, root layer first.
    pub fn layers(&self) -> &[u32] {
        &self.layers
    }

    /// Number of layers in the hierarchy.
    pub fn max_height(&self) -> usize {
        self.layers.len()
    }

    pub fn contains_type(&self, type_name: &str) -> bool {
        self.masks.contains_key(type_name)
    }

    fn is_api_type(&self, type_name: &str) -> bool {
        self.api_prefixes.iter().any(|p| type_name.starts_with(p.as_str()))
    }

    /// Mask of `type_name`; unknown types fall back to the API or excluded sentinel.
    pub fn mask(&self, type_name: &str) -> u64 {
        if let Some(mask) = self.masks.get(type_name) {
            return *mask;
        }
        let fallback = if self.is_api_type(type_name) {
            API_TYPE
        } else {
            EXCLUDED_TYPE
        };
        self.masks.get(fallback).copied().unwrap_or(ANY_MASK)
    }

    /// Exact lookup without sentinel fallback.
    pub fn try_mask(&self, type_name: &str) -> Option<u64> {
        self.masks.get(type_name).copied()
    }

    pub fn unmask(&self, mask: u64) -> Option<&str> {
        self.inverse.get(&mask).map(String::as_str)
    }

    /// Bit width of the deepest layer that carries a code in `mask`.
    /// The root mask has width 0.
    pub fn mask_size(&self, mask: u64) -> u32 {
        let mut start = 0;
        let mut size = 0;
        for &end in &self.layers {
            if mask & top_ones(end) & !top_ones(start) != 0 {
                size = end;
            }
            start = end;
        }
        size
    }

    /// True if `general` equals `specific` or is one of its ancestors.
    pub fn generalizes_mask(&self, general: u64, specific: u64) -> bool {
        let prefix = top_ones(self.mask_size(general));
        general & prefix == specific & prefix
    }

    /// Ancestor types of `mask` from the root down to the type itself.
    pub fn hierarchy(&self, mask: u64) -> Vec<&str> {
        if mask == ANYWHERE_MASK {
            return vec![ANYWHERE_TYPE];
        }
        let mut out = vec![self.root.as_str()];
        let depth = self.mask_size(mask);
        for &end in self.layers.iter().take_while(|&&end| end <= depth) {
            if let Some(name) = self.inverse.get(&(mask & top_ones(end))) {
                if out.last() != Some(&name.as_str()) {
                    out.push(name);
                }
            }
        }
        out
    }

    /// Ancestor chain of a type name, root first. Unmodeled and API types
    /// are their own hierarchy.
    pub fn hierarchy_of(&self, type_name: &str) -> Vec<String> {
        let Some(&mask) = self.masks.get(type_name) else {
            return vec![type_name.to_string()];
        };
        if self.is_api_type(type_name) {
            return vec![type_name.to_string()];
        }
        let mut chain: Vec<String> = self.hierarchy(mask).into_iter().map(String::from).collect();
        if chain.last().map(String::as_str) != Some(type_name) {
            chain.push(type_name.to_string());
        }
        chain
    }

    /// All concrete (leaf) types below `type_name`, breadth first.
    pub fn instantiables(&self, type_name: &str) -> Vec<String> {
        let Some(direct) = self.children.get(type_name) else {
            return vec![type_name.to_string()];
        };
        let mut out = Vec::new();
        let mut queue: std::collections::VecDeque<&String> = direct.iter().collect();
        while let Some(current) = queue.pop_front() {
            match self.children.get(current) {
                Some(below) => queue.extend(below.iter()),
                None => out.push(current.clone()),
            }
        }
        out
    }
}

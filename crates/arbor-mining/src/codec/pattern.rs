//! Bit-packed tree pattern: one mask per node plus the shape bits.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use arbor_core::types::NodeId;
use serde::Serialize;

use super::shape::{ShapeBits, Topology};
use crate::hierarchy::{TypeHierarchyMask, EXCLUDED_TYPE};
use crate::tree::SyntaxTree;

/// A tree pattern in DFS preorder. Literal values are not part of it.
#[derive(Clone, Serialize)]
pub struct Pattern {
    #[serde(skip_serializing)]
    meta: Arc<TypeHierarchyMask>,
    masks: Vec<u64>,
    shape: ShapeBits,
}

impl Pattern {
    pub fn encode<T: SyntaxTree>(tree: &T, meta: &Arc<TypeHierarchyMask>) -> Self {
        let size = tree.size();
        let mut masks = Vec::with_capacity(size);
        let mut shape = ShapeBits::with_capacity(2 * (size - 1));
        encode_node(tree, meta, &mut masks, &mut shape);
        Self {
            meta: Arc::clone(meta),
            masks,
            shape,
        }
    }

    /// One-node pattern with an explicit mask.
    pub fn single(meta: &Arc<TypeHierarchyMask>, mask: u64) -> Self {
        Self {
            meta: Arc::clone(meta),
            masks: vec![mask],
            shape: ShapeBits::new(),
        }
    }

    pub fn from_parts(meta: Arc<TypeHierarchyMask>, masks: Vec<u64>, shape: ShapeBits) -> Self {
        debug_assert_eq!(shape.len(), 2 * masks.len().saturating_sub(1));
        Self { meta, masks, shape }
    }

    pub fn meta(&self) -> &Arc<TypeHierarchyMask> {
        &self.meta
    }

    pub fn masks(&self) -> &[u64] {
        &self.masks
    }

    pub fn shape(&self) -> &ShapeBits {
        &self.shape
    }

    pub fn size(&self) -> usize {
        self.masks.len()
    }

    pub fn topology(&self) -> Topology {
        self.shape.topology()
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut Vec<u64>, &mut ShapeBits) {
        (&mut self.masks, &mut self.shape)
    }

    /// Same shape, and every mask of `self` is equal to or an ancestor of
    /// the mask at the same position in `other`.
    pub fn generalizes(&self, other: &Pattern) -> bool {
        self.masks.len() == other.masks.len()
            && self.shape == other.shape
            && self
                .masks
                .iter()
                .zip(&other.masks)
                .all(|(&g, &s)| self.meta.generalizes_mask(g, s))
    }

    /// Left-to-right match of `other`'s masks inside `self`.
    ///
    /// Only the relative DFS order is checked, not the nesting, so
    /// `A(B, C)` contains `B(C)`. The cursor stays on a matched position,
    /// so one node may satisfy repeated needles: `A(B, C)` also contains
    /// `B(B)`. Equal sizes require structural equality.
    pub fn contains(&self, other: &Pattern) -> bool {
        if self.size() < other.size() {
            return false;
        }
        if self.size() == other.size() {
            return self.masks == other.masks && self.shape == other.shape;
        }
        let mut pos = 0;
        for needle in &other.masks {
            while pos < self.masks.len() && self.masks[pos] != *needle {
                pos += 1;
            }
            if pos == self.masks.len() {
                return false;
            }
        }
        true
    }

    /// Rebuilds the pattern as a typed tree.
    pub fn decode(&self) -> PatternTree {
        let topo = self.topology();
        self.decode_at(&topo, 0)
    }

    fn decode_at(&self, topo: &Topology, pos: usize) -> PatternTree {
        let type_name = self
            .meta
            .unmask(self.masks[pos])
            .unwrap_or(EXCLUDED_TYPE)
            .to_string();
        PatternTree {
            type_name,
            children: topo.children(pos).map(|c| self.decode_at(topo, c)).collect(),
        }
    }
}

fn encode_node<T: SyntaxTree>(
    node: &T,
    meta: &TypeHierarchyMask,
    masks: &mut Vec<u64>,
    shape: &mut ShapeBits,
) {
    masks.push(meta.mask(node.type_name()));
    for child in node.children() {
        shape.push_open();
        encode_node(child, meta, masks, shape);
        shape.push_close();
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.meta, &other.meta)
            && self.masks == other.masks
            && self.shape == other.shape
    }
}

impl Eq for Pattern {}

impl Hash for Pattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.masks.hash(state);
        self.shape.hash(state);
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("masks", &self.masks)
            .field("shape", &self.shape)
            .finish()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.decode())
    }
}

/// Decoded pattern. Carries type names only; ids are always 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternTree {
    pub type_name: String,
    pub children: Vec<PatternTree>,
}

impl SyntaxTree for PatternTree {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn id(&self) -> NodeId {
        0
    }

    fn children(&self) -> &[Self] {
        &self.children
    }
}

impl fmt::Display for PatternTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name)?;
        if !self.children.is_empty() {
            f.write_str("(")?;
            for (i, child) in self.children.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{child}")?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::TypeHierarchy;
    use crate::tree::TreeNode;

    fn make_meta() -> Arc<TypeHierarchyMask> {
        let h = TypeHierarchy::new("Node")
            .with_children("Node", &["Expr", "Stmt"])
            .with_children("Expr", &["Add", "Lit"])
            .with_children("Stmt", &["If", "Block"]);
        Arc::new(h.build(&[]).unwrap())
    }

    fn make_tree() -> TreeNode {
        TreeNode::new("If", 1)
            .with_child(TreeNode::new("Add", 2).with_child(TreeNode::new("Lit", 3)))
            .with_child(TreeNode::new("Block", 4))
    }

    #[test]
    fn encode_decode_preserves_structure() {
        let meta = make_meta();
        let p = Pattern::encode(&make_tree(), &meta);
        assert_eq!(p.size(), 4);
        assert_eq!(p.shape().len(), 6);
        assert_eq!(p.to_string(), "If(Add(Lit), Block)");
        assert_eq!(Pattern::encode(&p.decode(), &meta), p);
    }

    #[test]
    fn abstract_pattern_generalizes_concrete() {
        let meta = make_meta();
        let concrete = Pattern::encode(&make_tree(), &meta);
        let abstracted = TreeNode::new("Stmt", 1)
            .with_child(TreeNode::new("Expr", 2).with_child(TreeNode::new("Lit", 3)))
            .with_child(TreeNode::new("Block", 4));
        let general = Pattern::encode(&abstracted, &meta);
        assert!(general.generalizes(&concrete));
        assert!(!concrete.generalizes(&general));
        assert!(concrete.generalizes(&concrete));
    }

    #[test]
    fn contains_respects_order_only() {
        let meta = make_meta();
        let whole = Pattern::encode(&make_tree(), &meta);
        let part = Pattern::encode(&TreeNode::new("Add", 1).with_child(TreeNode::new("Lit", 2)), &meta);
        assert!(whole.contains(&part));
        assert!(!part.contains(&whole));

        let reversed = Pattern::encode(&TreeNode::new("Block", 1).with_child(TreeNode::new("Add", 2)), &meta);
        assert!(!whole.contains(&reversed));
    }

    #[test]
    fn contains_lets_one_position_match_repeated_types() {
        let meta = make_meta();
        let whole = Pattern::encode(
            &TreeNode::new("Block", 1)
                .with_child(TreeNode::new("Lit", 2))
                .with_child(TreeNode::new("If", 3)),
            &meta,
        );
        let twice = Pattern::encode(&TreeNode::new("Lit", 1).with_child(TreeNode::new("Lit", 2)), &meta);
        assert!(whole.contains(&twice));

        let missing = Pattern::encode(&TreeNode::new("Lit", 1).with_child(TreeNode::new("Add", 2)), &meta);
        assert!(!whole.contains(&missing));
    }

    #[test]
    fn equality_requires_shared_hierarchy() {
        let tree = make_tree();
        let a = Pattern::encode(&tree, &make_meta());
        let b = Pattern::encode(&tree, &make_meta());
        assert_eq!(a.masks(), b.masks());
        assert_ne!(a, b);
    }
}

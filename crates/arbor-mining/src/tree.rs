//! The tree capability the miner consumes and the search space derived from it.

use arbor_core::types::{FxHashMap, NodeId};
use serde::{Deserialize, Serialize};

/// A labelled, ordered tree node supplied by the corpus.
pub trait SyntaxTree: Sized {
    /// Name of the node's type, resolved through the type hierarchy.
    fn type_name(&self) -> &str;

    /// Corpus-wide unique node id. Must be positive; negated ids mark
    /// indirect relationships in embedded growth candidates.
    fn id(&self) -> NodeId;

    fn children(&self) -> &[Self];

    /// Literal attribute signature of the node, if it carries values.
    fn content(&self) -> Option<&str> {
        None
    }

    /// Name of the variable this node reads or writes, if any.
    fn variable(&self) -> Option<&str> {
        None
    }

    /// Number of nodes in this subtree.
    fn size(&self) -> usize {
        1 + self.children().iter().map(SyntaxTree::size).sum::<usize>()
    }

    /// All nodes of this subtree in DFS preorder.
    fn preorder(&self) -> Vec<&Self> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children().iter().rev());
        }
        out
    }
}

/// Owned tree used by callers that do not bring their own node type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub type_name: String,
    pub id: NodeId,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub variable: Option<String>,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(type_name: impl Into<String>, id: NodeId) -> Self {
        Self {
            type_name: type_name.into(),
            id,
            content: None,
            variable: None,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: TreeNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = TreeNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_variable(mut self, variable: impl Into<String>) -> Self {
        self.variable = Some(variable.into());
        self
    }
}

impl SyntaxTree for TreeNode {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn id(&self) -> NodeId {
        self.id
    }

    fn children(&self) -> &[Self] {
        &self.children
    }

    fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    fn variable(&self) -> Option<&str> {
        self.variable.as_deref()
    }
}

/// The search space: for every node, the nodes a pattern may grow into from it.
#[derive(Debug, Clone, Default)]
pub struct GrowthCandidates {
    candidates: FxHashMap<NodeId, Vec<NodeId>>,
}

impl GrowthCandidates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(candidates: FxHashMap<NodeId, Vec<NodeId>>) -> Self {
        Self { candidates }
    }

    pub fn insert(&mut self, node: NodeId, candidates: Vec<NodeId>) {
        self.candidates.insert(node, candidates);
    }

    /// Candidates of `node`, empty if it has none.
    pub fn get(&self, node: NodeId) -> &[NodeId] {
        self.candidates.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn extend(&mut self, other: GrowthCandidates) {
        self.candidates.extend(other.candidates);
    }

    /// Induced search space: every node may grow into its direct children.
    pub fn direct<T: SyntaxTree>(tree: &T) -> Self {
        let mut candidates = FxHashMap::default();
        for node in tree.preorder() {
            candidates.insert(node.id(), node.children().iter().map(SyntaxTree::id).collect());
        }
        Self { candidates }
    }

    /// Embedded search space: direct children keep their id, deeper
    /// descendants are negated. Lists are in DFS preorder, so the
    /// descendants of a candidate directly follow it.
    pub fn embedded<T: SyntaxTree>(tree: &T) -> Self {
        let mut candidates = FxHashMap::default();
        for node in tree.preorder() {
            let mut list = Vec::with_capacity(node.size() - 1);
            for child in node.children() {
                list.push(child.id());
                list.extend(child.preorder().into_iter().skip(1).map(|d| -d.id()));
            }
            candidates.insert(node.id(), list);
        }
        Self { candidates }
    }
}

//! Tracable pattern growth through the public API.

use std::sync::Arc;

use arbor_core::errors::GrowthError;
use arbor_mining::codec::Pattern;
use arbor_mining::hierarchy::{TypeHierarchy, TypeHierarchyMask};
use arbor_mining::memo::SessionMemo;
use arbor_mining::tracable::{Extension, NodeSeed, Occurrence, PatternArena, TracablePattern};
use arbor_mining::{GrowthCandidates, TreeNode};

fn make_meta() -> Arc<TypeHierarchyMask> {
    Arc::new(
        TypeHierarchy::new("Node")
            .with_children("Node", &["Expr", "Stmt"])
            .with_children("Expr", &["Add", "Lit", "Read"])
            .with_children("Stmt", &["If", "Block"])
            .build(&[])
            .unwrap(),
    )
}

fn make_seed(arena: &PatternArena, meta: &Arc<TypeHierarchyMask>, ty: &str, node: i64, tree: i64, growth: &[i64]) -> TracablePattern {
    TracablePattern::single(
        arena,
        meta,
        meta.mask(ty),
        NodeSeed {
            node_id: node,
            content: 0,
            variable: None,
        },
        Occurrence {
            tree_id: tree,
            cluster_id: 1,
        },
        growth,
    )
}

fn ext(occurrence: usize, node: i64) -> Extension {
    Extension { occurrence, node }
}

// ---- Single extension ----

#[test]
fn test_growth_adds_one_node_below_origin() {
    let meta = make_meta();
    let arena = PatternArena::new();
    // If#1(Block#2(Lit#3), Add#4)
    let root = make_seed(&arena, &meta, "If", 1, 1, &[2, 4]);
    let block = make_seed(&arena, &meta, "Block", 2, 1, &[3]);
    let add = make_seed(&arena, &meta, "Add", 4, 1, &[]);

    let if_block = root.grow(&arena, 0, &[ext(0, 2)], &block, false).unwrap().remove(0);
    assert_eq!(if_block.size(), 2);
    assert_eq!(if_block.origin(), Some(root.id()));
    assert!(if_block.contains(&root));

    let if_block_add = if_block.grow(&arena, 0, &[ext(0, 4)], &add, false).unwrap().remove(0);
    let direct = Pattern::encode(
        &TreeNode::new("If", 1)
            .with_child(TreeNode::new("Block", 2))
            .with_child(TreeNode::new("Add", 4)),
        &meta,
    );
    assert_eq!(if_block_add.pattern(), &direct);
    assert_eq!(if_block_add.origin_ext(), 0);
    // Block is not on the path to Add and stops growing
    assert!(if_block_add.growth_at(0, 1).is_empty());
    assert!(if_block_add.growth_at(0, 0).is_empty());
}

#[test]
fn test_growth_never_modifies_the_parent() {
    let meta = make_meta();
    let arena = PatternArena::new();
    let root = make_seed(&arena, &meta, "If", 1, 1, &[2]);
    let block = make_seed(&arena, &meta, "Block", 2, 1, &[]);
    let before = root.growth_points(0);
    let _ = root.grow(&arena, 0, &[ext(0, 2)], &block, false).unwrap();
    assert_eq!(root.growth_points(0), before);
    assert_eq!(root.size(), 1);
}

// ---- Occurrences ----

#[test]
fn test_extensions_select_occurrences() {
    let meta = make_meta();
    let arena = PatternArena::new();
    let mut root = make_seed(&arena, &meta, "If", 1, 1, &[2]);
    root.add_location(make_seed(&arena, &meta, "If", 10, 2, &[11])).unwrap();
    root.add_location(make_seed(&arena, &meta, "If", 20, 3, &[21])).unwrap();
    assert_eq!(root.occurrence_count(), 3);

    let mut block = make_seed(&arena, &meta, "Block", 2, 1, &[]);
    block.add_location(make_seed(&arena, &meta, "Block", 21, 3, &[])).unwrap();

    let grown = root
        .grow(&arena, 0, &[ext(0, 2), ext(2, 21)], &block, false)
        .unwrap()
        .remove(0);
    assert_eq!(grown.occurrence_count(), 2);
    assert_eq!(grown.tree_ids(), &[1, 3]);
    assert_eq!(grown.node_ids(1), &[2, 21]);
}

#[test]
fn test_add_location_rejects_a_different_shape() {
    let meta = make_meta();
    let arena = PatternArena::new();
    let mut root = make_seed(&arena, &meta, "If", 1, 1, &[]);
    let other = make_seed(&arena, &meta, "Block", 2, 1, &[]);
    assert!(matches!(root.add_location(other), Err(GrowthError::ShapeMismatch)));
}

#[test]
fn test_finish_releases_growth_points() {
    let meta = make_meta();
    let mut arena = PatternArena::new();
    let root = make_seed(&arena, &meta, "If", 1, 1, &[2]);
    assert!(root.has_growth_points());
    let id = arena.insert(root);
    arena.finish(id);
    let root = arena.get(id).unwrap();
    assert!(root.is_finished());
    assert!(root.growth_points(0).is_empty());
}

// ---- Whole trees ----

#[test]
fn test_whole_tree_grows_from_outside_candidates() {
    let meta = make_meta();
    let arena = PatternArena::new();
    let mut memo = SessionMemo::new();
    let tree = TreeNode::new("Add", 1)
        .with_child(TreeNode::new("Read", 2).with_variable("x"))
        .with_child(TreeNode::new("Read", 3).with_variable("x"));
    let mut candidates = GrowthCandidates::direct(&tree);
    candidates.insert(1, vec![2, 3, 4]);

    let whole = TracablePattern::from_tree(
        &arena,
        &tree,
        Occurrence {
            tree_id: 1,
            cluster_id: 1,
        },
        &meta,
        &candidates,
        &mut memo,
    );
    assert_eq!(whole.size(), 3);
    assert_eq!(whole.variables(), &[None, Some(0), Some(0)]);
    // children already in the pattern are not growth points
    assert_eq!(whole.growth_at(0, 0), &[4]);

    let lit = make_seed(&arena, &meta, "Lit", 4, 1, &[]);
    let grown = whole.grow(&arena, 0, &[ext(0, 4)], &lit, false).unwrap().remove(0);
    assert_eq!(grown.pattern().to_string(), "Add(Read, Read, Lit)");
    assert_eq!(grown.variables(), &[None, Some(0), Some(0), None]);
}

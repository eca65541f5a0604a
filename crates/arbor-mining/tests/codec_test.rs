//! Hierarchy mask and pattern codec tests against literal golden values.

use std::sync::Arc;

use arbor_mining::codec::{Pattern, ShapeBits};
use arbor_mining::hierarchy::{TypeHierarchy, TypeHierarchyMask, ANYWHERE_MASK, ANY_MASK};
use arbor_mining::TreeNode;

fn make_meta() -> Arc<TypeHierarchyMask> {
    Arc::new(
        TypeHierarchy::new("Root")
            .with_children("Root", &["A", "B", "C"])
            .build(&[])
            .unwrap(),
    )
}

fn leaf(ty: &str, id: i64) -> TreeNode {
    TreeNode::new(ty, id)
}

// ---- Masks ----

#[test]
fn test_two_leaf_hierarchy_gets_distinct_masks() {
    let meta = TypeHierarchy::new("Root")
        .with_children("Root", &["A", "B"])
        .build(&[])
        .unwrap();
    assert_ne!(meta.mask("A"), meta.mask("B"));
    // A, B plus the API-boundary and excluded catch-all types
    assert_eq!(meta.layers(), &[3]);
    assert_eq!(meta.mask_size(meta.mask("A")), 3);
    assert_eq!(meta.mask_size(ANY_MASK), 0);
}

#[test]
fn test_root_and_wildcard_sentinels() {
    let meta = make_meta();
    assert_eq!(meta.mask("Root"), ANY_MASK);
    assert_eq!(meta.mask("*"), ANYWHERE_MASK);
    assert!(meta.generalizes_mask(ANY_MASK, meta.mask("C")));
    assert_eq!(meta.unmask(meta.mask("C")), Some("C"));
}

// ---- Encoding ----

#[test]
fn test_single_node_has_empty_shape() {
    let meta = make_meta();
    let p = Pattern::encode(&leaf("A", 1), &meta);
    assert_eq!(p.masks(), &[meta.mask("A")]);
    assert!(p.shape().is_empty());
    assert_eq!(p.size(), 1);
}

#[test]
fn test_two_children_golden_bits() {
    let meta = make_meta();
    let p = Pattern::encode(&leaf("A", 1).with_child(leaf("B", 2)).with_child(leaf("C", 3)), &meta);
    assert_eq!(p.masks(), &[meta.mask("A"), meta.mask("B"), meta.mask("C")]);
    // open B, close B, open C, close C
    assert_eq!(p.shape().words(), &[0x5000_0000_0000_0000]);
    assert_eq!(p.shape().len(), 4);
}

#[test]
fn test_nested_child_golden_bits() {
    let meta = make_meta();
    let p = Pattern::encode(&leaf("A", 1).with_child(leaf("B", 2).with_child(leaf("C", 3))), &meta);
    // open B, open C, close C, close B
    assert_eq!(p.shape().words(), &[0x3000_0000_0000_0000]);
    assert_eq!(p.to_string(), "A(B(C))");
}

#[test]
fn test_shape_spills_into_second_word() {
    let meta = make_meta();
    let root = leaf("A", 0).with_children((1..=40).map(|i| leaf("B", i)));
    let p = Pattern::encode(&root, &meta);
    assert_eq!(p.shape().len(), 80);
    assert_eq!(p.shape().words().len(), 2);
    assert_eq!(p.shape().words()[0], 0x5555_5555_5555_5555);
}

#[test]
fn test_values_are_dropped_by_encoding() {
    let meta = make_meta();
    let one = Pattern::encode(&leaf("A", 1).with_content("1"), &meta);
    let two = Pattern::encode(&leaf("A", 7).with_content("2"), &meta);
    assert_eq!(one, two);
}

#[test]
fn test_json_tree_encodes() {
    let meta = make_meta();
    let tree: TreeNode = serde_json::from_str(
        r#"{"type_name": "A", "id": 1, "children": [
            {"type_name": "B", "id": 2, "content": "x"},
            {"type_name": "C", "id": 3}
        ]}"#,
    )
    .unwrap();
    let p = Pattern::encode(&tree, &meta);
    assert_eq!(p.to_string(), "A(B, C)");
}

// ---- Containment ----

#[test]
fn test_containment_ignores_nesting() {
    let meta = make_meta();
    let flat = Pattern::encode(&leaf("A", 1).with_child(leaf("B", 2)).with_child(leaf("C", 3)), &meta);
    let nested = Pattern::encode(&leaf("B", 1).with_child(leaf("C", 2)), &meta);
    // only DFS order is compared, so B(C) is found inside A(B, C)
    assert!(flat.contains(&nested));
}

#[test]
fn test_equal_sizes_need_equal_structure() {
    let meta = make_meta();
    let flat = Pattern::encode(&leaf("A", 1).with_child(leaf("B", 2)).with_child(leaf("C", 3)), &meta);
    let nested = Pattern::encode(&leaf("A", 1).with_child(leaf("B", 2).with_child(leaf("C", 3))), &meta);
    assert!(!flat.contains(&nested));
    assert!(flat.contains(&flat.clone()));
}

#[test]
fn test_from_parts_matches_encoding() {
    let meta = make_meta();
    let mut shape = ShapeBits::new();
    shape.push_open();
    shape.push_close();
    let parts = Pattern::from_parts(Arc::clone(&meta), vec![meta.mask("A"), meta.mask("B")], shape);
    assert_eq!(parts, Pattern::encode(&leaf("A", 1).with_child(leaf("B", 2)), &meta));
}

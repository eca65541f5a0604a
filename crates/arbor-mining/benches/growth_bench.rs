//! Growth benchmarks over generated forests.
//!
//! Run with: cargo bench -p arbor-mining --bench growth_bench

use std::sync::Arc;

use arbor_core::config::MiningConfig;
use arbor_mining::detector::PatternGrowthDetector;
use arbor_mining::hierarchy::{TypeHierarchy, TypeHierarchyMask};
use arbor_mining::{Cluster, MetricSet, PatternRelationMapper, TreeNode};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

fn make_meta() -> Arc<TypeHierarchyMask> {
    let hierarchy = TypeHierarchy::new("Node")
        .with_children("Node", &["Expr", "Stmt"])
        .with_children("Expr", &["Add", "Call", "Lit", "Read"])
        .with_children("Stmt", &["If", "Block", "Assign", "Return"]);
    match hierarchy.build(&[]) {
        Ok(meta) => Arc::new(meta),
        Err(e) => panic!("bench hierarchy: {e}"),
    }
}

/// `Block(If(Read, Block(Assign(Add(Read, Lit)))), Return(Call(Read)))`
/// with a varying literal and every third tree missing its return.
fn sample_tree(idx: i64) -> TreeNode {
    let base = idx * 100;
    let mut root = TreeNode::new("Block", base).with_child(
        TreeNode::new("If", base + 1)
            .with_child(TreeNode::new("Read", base + 2).with_variable("flag"))
            .with_child(
                TreeNode::new("Block", base + 3).with_child(
                    TreeNode::new("Assign", base + 4).with_child(
                        TreeNode::new("Add", base + 5)
                            .with_child(TreeNode::new("Read", base + 6).with_variable("i"))
                            .with_child(TreeNode::new("Lit", base + 7).with_content(format!("{}", idx % 4))),
                    ),
                ),
            ),
    );
    if idx % 3 != 0 {
        root = root.with_child(
            TreeNode::new("Return", base + 8)
                .with_child(TreeNode::new("Call", base + 9).with_child(TreeNode::new("Read", base + 10).with_variable("i"))),
        );
    }
    root
}

fn config(parallel: bool, max_size: i64) -> MiningConfig {
    MiningConfig {
        max_pattern_size: Some(max_size),
        hierarchy_floor: Some(0),
        hierarchy_ceil: Some(2),
        parallel: Some(parallel),
        ..Default::default()
    }
}

fn growth_by_forest_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("growth_forest");
    group.sample_size(10);
    let meta = make_meta();

    for trees in [10_i64, 50, 200] {
        let clusters = vec![Cluster::new("bench", (0..trees).map(sample_tree).collect())];
        for parallel in [false, true] {
            let label = if parallel { "parallel" } else { "sequential" };
            group.bench_with_input(BenchmarkId::new(label, trees), &clusters, |b, clusters| {
                b.iter(|| {
                    let mut detector = PatternGrowthDetector::new(config(parallel, 4), MetricSet::default());
                    let _ = detector.mine(&meta, clusters);
                });
            });
        }
    }

    group.finish();
}

fn relation_mapping(c: &mut Criterion) {
    let mut group = c.benchmark_group("relations");
    group.sample_size(10);
    let meta = make_meta();
    let clusters = vec![Cluster::new("bench", (0..20).map(sample_tree).collect())];
    let mut detector = PatternGrowthDetector::new(config(true, 3), MetricSet::default());
    let outcome = match detector.mine(&meta, &clusters) {
        Ok(mined) => mined.data,
        Err(e) => panic!("bench mining: {e}"),
    };

    group.bench_function("map_results", |b| {
        b.iter(|| PatternRelationMapper::map_arena(&outcome.arena, &outcome.results));
    });

    group.finish();
}

criterion_group!(benches, growth_by_forest_size, relation_mapping);
criterion_main!(benches);

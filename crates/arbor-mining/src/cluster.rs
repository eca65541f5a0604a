//! Named groups of trees and the id registry metrics consume.

use arbor_core::types::ClusterId;
use serde::{Deserialize, Serialize};

use crate::tree::GrowthCandidates;

/// A named group of trees mined together.
#[derive(Debug, Clone)]
pub struct Cluster<T> {
    pub name: String,
    pub trees: Vec<T>,
    /// Precomputed search space; derived from the trees when absent.
    pub candidates: Option<GrowthCandidates>,
}

impl<T> Cluster<T> {
    pub fn new(name: impl Into<String>, trees: Vec<T>) -> Self {
        Self {
            name: name.into(),
            trees,
            candidates: None,
        }
    }

    pub fn with_candidates(mut self, candidates: GrowthCandidates) -> Self {
        self.candidates = Some(candidates);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterInfo {
    pub id: ClusterId,
    pub name: String,
    pub tree_count: usize,
}

/// Cluster ids of one mining run, assigned from 1 in input order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterRegistry {
    clusters: Vec<ClusterInfo>,
}

impl ClusterRegistry {
    pub fn from_clusters<T>(clusters: &[Cluster<T>]) -> Self {
        Self {
            clusters: clusters
                .iter()
                .enumerate()
                .map(|(i, c)| ClusterInfo {
                    id: i as ClusterId + 1,
                    name: c.name.clone(),
                    tree_count: c.trees.len(),
                })
                .collect(),
        }
    }

    pub fn get(&self, id: ClusterId) -> Option<&ClusterInfo> {
        (id as usize)
            .checked_sub(1)
            .and_then(|i| self.clusters.get(i))
    }

    pub fn contains(&self, id: ClusterId) -> bool {
        self.get(id).is_some()
    }

    pub fn by_name(&self, name: &str) -> Option<&ClusterInfo> {
        self.clusters.iter().find(|c| c.name == name)
    }

    /// Trees in the cluster; 0 for unknown ids.
    pub fn tree_count(&self, id: ClusterId) -> usize {
        self.get(id).map_or(0, |c| c.tree_count)
    }

    pub fn total_trees(&self) -> usize {
        self.clusters.iter().map(|c| c.tree_count).sum()
    }

    pub fn ids(&self) -> impl Iterator<Item = ClusterId> + '_ {
        self.clusters.iter().map(|c| c.id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClusterInfo> {
        self.clusters.iter()
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

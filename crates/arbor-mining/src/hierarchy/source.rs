//! Hierarchy inputs: the declared type map and its rewrites.

use arbor_core::config::{HierarchyConfig, HierarchySource};
use arbor_core::errors::HierarchyError;
use arbor_core::types::FxHashMap;
use serde::{Deserialize, Serialize};

use super::mask::TypeHierarchyMask;

/// Root of the flat hierarchy; matches any node.
pub const ANY_TYPE: &str = ".";

/// A `type → [subtypes]` map with a designated root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeHierarchy {
    pub root: String,
    pub children: FxHashMap<String, Vec<String>>,
}

impl TypeHierarchy {
    pub fn new(root: impl Into<String>) -> Self {
        let root = root.into();
        let mut children = FxHashMap::default();
        children.insert(root.clone(), Vec::new());
        Self { root, children }
    }

    /// Registers `child` below `parent`, keeping declaration order.
    pub fn add(&mut self, parent: &str, child: &str) {
        let list = self.children.entry(parent.to_string()).or_default();
        if !list.iter().any(|c| c == child) {
            list.push(child.to_string());
        }
    }

    pub fn with_children(mut self, parent: &str, children: &[&str]) -> Self {
        for child in children {
            self.add(parent, child);
        }
        self
    }

    /// Two-layer hierarchy: the any-wildcard root with every type directly below.
    pub fn flat<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut hierarchy = Self::new(ANY_TYPE);
        for t in types {
            hierarchy.add(ANY_TYPE, t.as_ref());
        }
        hierarchy
    }

    /// Merges abstract types that differ only by a data type name
    /// (`AddIntNode`, `AddDoubleNode` → `AddDTNode`). Concrete types are kept.
    pub fn data_type_independent(&self, data_types: &[String]) -> Self {
        if data_types.is_empty() {
            return self.clone();
        }
        let mut children = self.children.clone();
        let mut work = vec![self.root.clone()];

        while let Some(current) = work.pop() {
            let Some(list) = children.get(&current).cloned() else {
                continue;
            };
            let (dependent, mut kept): (Vec<String>, Vec<String>) = list.into_iter().partition(|c| {
                children.contains_key(c) && data_types.iter().any(|dt| c.contains(dt.as_str()))
            });

            let mut merged: Vec<(String, Vec<String>)> = Vec::new();
            for name in dependent {
                let abstracted = abstract_name(&name, data_types);
                let grand = children.remove(&name).unwrap_or_default();
                match merged.iter_mut().find(|(n, _)| *n == abstracted) {
                    Some((_, list)) => list.extend(grand),
                    None => merged.push((abstracted, grand)),
                }
            }
            for (name, grand) in merged {
                kept.push(name.clone());
                children.insert(name, grand);
            }

            work.extend(kept.iter().cloned());
            children.insert(current, kept);
        }

        Self {
            root: self.root.clone(),
            children,
        }
    }

    pub fn build(&self, api_prefixes: &[String]) -> Result<TypeHierarchyMask, HierarchyError> {
        TypeHierarchyMask::with_api_prefixes(&self.children, &self.root, api_prefixes)
    }
}

/// Strips the package path and replaces every data type name with `DT`.
fn abstract_name(name: &str, data_types: &[String]) -> String {
    let simple = name.rsplit('.').next().unwrap_or(name);
    data_types
        .iter()
        .fold(simple.to_string(), |acc, dt| acc.replace(dt.as_str(), "DT"))
}

/// The two interchangeable hierarchy sources of a language.
#[derive(Debug, Clone, Default)]
pub struct HierarchySet {
    pub supertype: TypeHierarchy,
    pub logical: Option<TypeHierarchy>,
}

impl HierarchySet {
    pub fn new(supertype: TypeHierarchy) -> Self {
        Self {
            supertype,
            logical: None,
        }
    }

    pub fn with_logical(mut self, logical: TypeHierarchy) -> Self {
        self.logical = Some(logical);
        self
    }

    pub fn select(&self, source: HierarchySource) -> &TypeHierarchy {
        match (source, &self.logical) {
            (HierarchySource::Logical, Some(logical)) => logical,
            (HierarchySource::Logical, None) => {
                tracing::warn!("no logical hierarchy supplied, using supertype hierarchy");
                &self.supertype
            }
            (HierarchySource::Supertype, _) => &self.supertype,
        }
    }

    /// Selects the configured source, applies the data type rewrite and builds the masks.
    pub fn build(&self, config: &HierarchyConfig) -> Result<TypeHierarchyMask, HierarchyError> {
        self.select(config.effective_source())
            .data_type_independent(&config.data_types)
            .build(&config.api_prefixes)
    }
}

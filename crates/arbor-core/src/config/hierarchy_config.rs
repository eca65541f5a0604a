//! Type hierarchy configuration.

use serde::{Deserialize, Serialize};

/// Which hierarchy the masks are built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HierarchySource {
    /// The declared supertype chain.
    #[default]
    Supertype,
    /// The enclosing (logical) grouping chosen by the language developer.
    Logical,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HierarchyConfig {
    /// Hierarchy source. Default: supertype.
    pub source: Option<HierarchySource>,
    /// Type-name prefixes of API-boundary types that have no own mask.
    #[serde(default)]
    pub api_prefixes: Vec<String>,
    /// Data type names collapsed by the data-type independent rewrite.
    #[serde(default)]
    pub data_types: Vec<String>,
}

impl HierarchyConfig {
    pub fn effective_source(&self) -> HierarchySource {
        self.source.unwrap_or_default()
    }
}

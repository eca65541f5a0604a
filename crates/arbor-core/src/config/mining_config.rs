//! Pattern growth configuration.

use serde::{Deserialize, Serialize};

/// How a mined pattern set is reduced before it is handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Grouping {
    /// Keep only patterns without an already kept subset.
    Min,
    /// Keep only patterns without an already kept superset.
    #[default]
    Max,
    /// Keep everything.
    All,
}

impl std::str::FromStr for Grouping {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            "all" => Ok(Self::All),
            other => Err(format!("unknown grouping '{other}'")),
        }
    }
}

/// Which of several hierarchy-level duplicates with identical occurrences survive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Specialization {
    /// Drop the more general duplicate.
    #[default]
    Specialized,
    /// Drop the more specific duplicate.
    Generalized,
    All,
}

impl std::str::FromStr for Specialization {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "specialized" => Ok(Self::Specialized),
            "generalized" => Ok(Self::Generalized),
            "all" => Ok(Self::All),
            other => Err(format!("unknown specialization '{other}'")),
        }
    }
}

/// Configuration for the growth loop.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MiningConfig {
    /// Largest pattern (in nodes) that is grown. -1 means unbounded. Default: 8.
    pub max_pattern_size: Option<i64>,
    /// Allow indirect descendants as growth candidates. Default: false.
    pub embedded: Option<bool>,
    /// Result grouping. Default: max.
    pub grouping: Option<Grouping>,
    /// Lowest hierarchy level used for seeding (0 = explicit node). Default: 0.
    pub hierarchy_floor: Option<u32>,
    /// Highest hierarchy level used for seeding. Default: unbounded.
    pub hierarchy_ceil: Option<u32>,
    /// Duplicate handling across hierarchy levels. Default: specialized.
    pub specialization: Option<Specialization>,
    /// Grow frontier patterns with rayon. Default: true.
    pub parallel: Option<bool>,
    /// Require overlapping nodes to agree on type and content when grouping. Default: true.
    pub hierarchy_compare: Option<bool>,
}

impl MiningConfig {
    /// Returns the effective size cap, `None` when unbounded.
    pub fn effective_max_pattern_size(&self) -> Option<usize> {
        let size = self.max_pattern_size.unwrap_or(8);
        if size < 0 {
            None
        } else {
            Some(size as usize)
        }
    }

    pub fn effective_embedded(&self) -> bool {
        self.embedded.unwrap_or(false)
    }

    pub fn effective_grouping(&self) -> Grouping {
        self.grouping.unwrap_or_default()
    }

    pub fn effective_hierarchy_floor(&self) -> u32 {
        self.hierarchy_floor.unwrap_or(0)
    }

    pub fn effective_hierarchy_ceil(&self) -> u32 {
        self.hierarchy_ceil.unwrap_or(u32::MAX)
    }

    pub fn effective_specialization(&self) -> Specialization {
        self.specialization.unwrap_or_default()
    }

    pub fn effective_parallel(&self) -> bool {
        self.parallel.unwrap_or(true)
    }

    pub fn effective_hierarchy_compare(&self) -> bool {
        self.hierarchy_compare.unwrap_or(true)
    }
}

//! Top-level arbor configuration with 4-layer resolution.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{DifferentialConfig, Grouping, HierarchyConfig, MiningConfig, Specialization};
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`ARBOR_*`)
/// 3. Project config (`arbor.toml` in project root)
/// 4. User config (`~/.arbor/config.toml`)
/// 5. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ArborConfig {
    pub mining: MiningConfig,
    pub hierarchy: HierarchyConfig,
    pub differential: DifferentialConfig,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub max_pattern_size: Option<i64>,
    pub embedded: Option<bool>,
    pub grouping: Option<Grouping>,
    pub parallel: Option<bool>,
    pub min_differential: Option<f64>,
}

impl ArborConfig {
    /// Load configuration with 4-layer resolution.
    pub fn load(root: &Path, cli_overrides: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Layer 4 (lowest priority): user config
        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                match Self::merge_toml_file(&mut config, &user_config_path) {
                    Ok(()) => {}
                    Err(ConfigError::ParseError { .. }) => {
                        return Err(ConfigError::ParseError {
                            path: user_config_path.display().to_string(),
                            message: "invalid TOML in user config".to_string(),
                        });
                    }
                    Err(e) => {
                        ::tracing::warn!(error = %e, "ignoring unreadable user config");
                    }
                }
            }
        }

        // Layer 3: project config
        let project_config_path = root.join("arbor.toml");
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        // Layer 2: environment variables
        Self::apply_env_overrides(&mut config);

        // Layer 1 (highest priority): CLI flags
        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values.
    pub fn validate(config: &ArborConfig) -> Result<(), ConfigError> {
        let d = &config.differential;
        for (field, value) in [
            ("differential.min_similarity", d.min_similarity),
            ("differential.max_similarity", d.max_similarity),
            ("differential.min_differential", d.min_differential),
            ("differential.max_differential", d.max_differential),
        ] {
            if let Some(v) = value {
                if !(0.0..=1.0).contains(&v) {
                    return Err(ConfigError::ValidationFailed {
                        field: field.to_string(),
                        message: "must be between 0.0 and 1.0".to_string(),
                    });
                }
            }
        }
        if d.effective_min_similarity() > d.effective_max_similarity() {
            return Err(ConfigError::ValidationFailed {
                field: "differential.min_similarity".to_string(),
                message: "must not exceed max_similarity".to_string(),
            });
        }
        if d.effective_min_differential() > d.effective_max_differential() {
            return Err(ConfigError::ValidationFailed {
                field: "differential.min_differential".to_string(),
                message: "must not exceed max_differential".to_string(),
            });
        }

        let m = &config.mining;
        if let Some(size) = m.max_pattern_size {
            if size == 0 || size < -1 {
                return Err(ConfigError::ValidationFailed {
                    field: "mining.max_pattern_size".to_string(),
                    message: "must be positive or -1 for unbounded".to_string(),
                });
            }
        }
        if m.effective_hierarchy_floor() > m.effective_hierarchy_ceil() {
            return Err(ConfigError::ValidationFailed {
                field: "mining.hierarchy_floor".to_string(),
                message: "must not exceed hierarchy_ceil".to_string(),
            });
        }
        Ok(())
    }

    /// Returns the user config path: `~/.arbor/config.toml`.
    fn user_config_path() -> Option<std::path::PathBuf> {
        dirs_path().map(|d| d.join("config.toml"))
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored (forward-compatible).
    fn merge_toml_file(config: &mut ArborConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: ArborConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`, where `other` values override `base` values
    /// only when `other` has a `Some` value.
    fn merge(base: &mut ArborConfig, other: &ArborConfig) {
        // Mining
        let (b, o) = (&mut base.mining, &other.mining);
        if o.max_pattern_size.is_some() {
            b.max_pattern_size = o.max_pattern_size;
        }
        if o.embedded.is_some() {
            b.embedded = o.embedded;
        }
        if o.grouping.is_some() {
            b.grouping = o.grouping;
        }
        if o.hierarchy_floor.is_some() {
            b.hierarchy_floor = o.hierarchy_floor;
        }
        if o.hierarchy_ceil.is_some() {
            b.hierarchy_ceil = o.hierarchy_ceil;
        }
        if o.specialization.is_some() {
            b.specialization = o.specialization;
        }
        if o.parallel.is_some() {
            b.parallel = o.parallel;
        }
        if o.hierarchy_compare.is_some() {
            b.hierarchy_compare = o.hierarchy_compare;
        }

        // Hierarchy
        if other.hierarchy.source.is_some() {
            base.hierarchy.source = other.hierarchy.source;
        }
        if !other.hierarchy.api_prefixes.is_empty() {
            base.hierarchy.api_prefixes = other.hierarchy.api_prefixes.clone();
        }
        if !other.hierarchy.data_types.is_empty() {
            base.hierarchy.data_types = other.hierarchy.data_types.clone();
        }

        // Differential
        let (b, o) = (&mut base.differential, &other.differential);
        if o.min_similarity.is_some() {
            b.min_similarity = o.min_similarity;
        }
        if o.max_similarity.is_some() {
            b.max_similarity = o.max_similarity;
        }
        if o.min_differential.is_some() {
            b.min_differential = o.min_differential;
        }
        if o.max_differential.is_some() {
            b.max_differential = o.max_differential;
        }
    }

    /// Apply environment variable overrides.
    /// Pattern: `ARBOR_MINING_MAX_PATTERN_SIZE`, `ARBOR_DIFFERENTIAL_MIN_DIFFERENTIAL`, etc.
    fn apply_env_overrides(config: &mut ArborConfig) {
        if let Ok(val) = std::env::var("ARBOR_MINING_MAX_PATTERN_SIZE") {
            if let Ok(v) = val.parse::<i64>() {
                config.mining.max_pattern_size = Some(v);
            }
        }
        if let Ok(val) = std::env::var("ARBOR_MINING_EMBEDDED") {
            if let Ok(v) = val.parse::<bool>() {
                config.mining.embedded = Some(v);
            }
        }
        if let Ok(val) = std::env::var("ARBOR_MINING_GROUPING") {
            if let Ok(v) = val.parse::<Grouping>() {
                config.mining.grouping = Some(v);
            }
        }
        if let Ok(val) = std::env::var("ARBOR_MINING_SPECIALIZATION") {
            if let Ok(v) = val.parse::<Specialization>() {
                config.mining.specialization = Some(v);
            }
        }
        if let Ok(val) = std::env::var("ARBOR_MINING_PARALLEL") {
            if let Ok(v) = val.parse::<bool>() {
                config.mining.parallel = Some(v);
            }
        }
        if let Ok(val) = std::env::var("ARBOR_DIFFERENTIAL_MIN_DIFFERENTIAL") {
            if let Ok(v) = val.parse::<f64>() {
                config.differential.min_differential = Some(v);
            }
        }
        if let Ok(val) = std::env::var("ARBOR_DIFFERENTIAL_MIN_SIMILARITY") {
            if let Ok(v) = val.parse::<f64>() {
                config.differential.min_similarity = Some(v);
            }
        }
    }

    /// Apply CLI overrides (highest priority).
    fn apply_cli_overrides(config: &mut ArborConfig, cli: &CliOverrides) {
        if let Some(v) = cli.max_pattern_size {
            config.mining.max_pattern_size = Some(v);
        }
        if let Some(v) = cli.embedded {
            config.mining.embedded = Some(v);
        }
        if let Some(v) = cli.grouping {
            config.mining.grouping = Some(v);
        }
        if let Some(v) = cli.parallel {
            config.mining.parallel = Some(v);
        }
        if let Some(v) = cli.min_differential {
            config.differential.min_differential = Some(v);
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

/// Returns the user-level arbor config directory: `~/.arbor/`.
fn dirs_path() -> Option<std::path::PathBuf> {
    home_dir().map(|h| h.join(".arbor"))
}

fn home_dir() -> Option<std::path::PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(std::path::PathBuf::from)
}

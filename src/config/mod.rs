//! Configuration data model and manager.
//!
//! Mirrors the original tool's `mom.yaml`: a command-mapping table, script
//! search paths, execution/recovery policy, interactive-agent toggles, and
//! output-rendering thresholds. This crate stores it as TOML rather than
//! YAML but keeps the same section shape.

pub mod defaults;
pub mod loader;
pub mod validation;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

pub use loader::{ConfigLoadResult, ConfigLoader};

/// Errors raised while loading, parsing, or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("configuration is invalid: {0}")]
    Invalid(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level configuration, deserialized from `mom.toml` (or the configured
/// file name) and merged across the search-path layers in [`loader`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub command_name: String,
    pub commands: HashMap<String, CommandMapping>,
    pub script_paths: Vec<String>,
    pub execution: ExecutionConfig,
    pub output: OutputConfig,
    pub recovery: Vec<RecoveryCommand>,
    pub interactive: InteractiveConfig,
    pub user_preferences: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        defaults::default_config()
    }
}

/// One verb's mapping: a fuzzy-target `pattern`, a `fallback` used once
/// retries on the primary are exhausted, and any number of target-kind keys
/// (e.g. `python = "..."`) that take priority over `pattern` when the
/// invocation names that target kind explicitly.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CommandMapping {
    pub pattern: Option<String>,
    pub fallback: Option<String>,
    #[serde(flatten)]
    pub targets: HashMap<String, String>,
}

impl CommandMapping {
    /// Resolve the primary template to use for a given target kind, following
    /// the same precedence as the original tool: an exact target-kind key
    /// beats `pattern`, which beats having nothing at all.
    pub fn resolve_primary(&self, target_kind: Option<&str>) -> Option<&str> {
        if let Some(kind) = target_kind {
            if let Some(template) = self.targets.get(kind) {
                return Some(template);
            }
        }
        self.pattern.as_deref()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub retry_count: usize,
    pub auto_reset_on_cache_failure: bool,
    pub timeout: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            retry_count: 2,
            auto_reset_on_cache_failure: true,
            timeout: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: String,
    pub head_lines: usize,
    pub tail_lines: usize,
    pub max_line_length: usize,
    pub duplicate_threshold: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "structured".to_string(),
            head_lines: 10,
            tail_lines: 10,
            max_line_length: 200,
            duplicate_threshold: 3,
        }
    }
}

/// A single named recovery command. Kept as an ordered vector (not a map)
/// so declaration order — the order recovery commands actually run in — is
/// preserved across a TOML round-trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryCommand {
    pub name: String,
    pub command: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractiveConfig {
    pub enable_executing_agent: bool,
    pub enable_specialized_agents: bool,
    pub enable_general_agent: bool,
    pub plugins: Vec<PluginConfig>,
}

impl Default for InteractiveConfig {
    fn default() -> Self {
        Self {
            enable_executing_agent: true,
            enable_specialized_agents: true,
            enable_general_agent: true,
            plugins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub priority: i32,
}

/// High-level entry point used by the CLI: resolves the layered config file
/// once and exposes the resolved [`Config`] plus where it came from.
#[derive(Debug)]
pub struct ConfigManager {
    pub config: Config,
    pub config_path: Option<PathBuf>,
    pub fallback_used: bool,
}

impl ConfigManager {
    /// Load configuration, honoring an explicit `--config` path if given.
    /// An explicit path that does not exist is an error rather than a
    /// silent fall-through to the search order. Structural validation (the
    /// required `commands`/`script_paths` sections) is not enforced here —
    /// it only gates the explicit `config --validate` subcommand, so a
    /// config that omits mappings still works for e.g. `mom run`.
    pub fn load(explicit_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path));
            }
            let config = loader::load_from_file(&path)?;
            return Ok(Self {
                config,
                config_path: Some(path),
                fallback_used: false,
            });
        }

        let result = ConfigLoader::new().load_with_fallback()?;
        Ok(Self {
            config: result.config,
            config_path: result.loaded_from,
            fallback_used: result.fallback_used,
        })
    }

    pub fn get_command_mapping(&self, command: &str, target_kind: Option<&str>) -> Option<ResolvedMapping> {
        let mapping = self.config.commands.get(command)?;
        Some(ResolvedMapping {
            primary: mapping.resolve_primary(target_kind).map(str::to_string),
            fallback: mapping.fallback.clone(),
        })
    }

    pub fn script_search_roots(&self) -> Vec<PathBuf> {
        let base = self
            .config_path
            .as_ref()
            .and_then(|p| p.parent())
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

        self.config
            .script_paths
            .iter()
            .flat_map(|pattern| resolve_script_path_pattern(&base, pattern))
            .collect()
    }
}

/// The fully resolved primary/fallback pair for one command invocation.
#[derive(Debug, Clone)]
pub struct ResolvedMapping {
    pub primary: Option<String>,
    pub fallback: Option<String>,
}

/// Resolve one `script_paths` entry relative to `base`, expanding a glob
/// segment if present, and keep only entries that exist as directories.
fn resolve_script_path_pattern(base: &std::path::Path, pattern: &str) -> Vec<PathBuf> {
    let candidates = if pattern.contains('*') {
        let full_pattern = base.join(pattern);
        glob::glob(&full_pattern.to_string_lossy())
            .map(|paths| paths.filter_map(Result::ok).collect())
            .unwrap_or_default()
    } else {
        vec![base.join(pattern)]
    };

    candidates.into_iter().filter(|path| path.is_dir()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_primary_prefers_target_kind_over_pattern() {
        let mut targets = HashMap::new();
        targets.insert("python".to_string(), "uv run pytest".to_string());
        let mapping = CommandMapping {
            pattern: Some("nx run {target}:test".to_string()),
            fallback: None,
            targets,
        };

        assert_eq!(mapping.resolve_primary(Some("python")), Some("uv run pytest"));
        assert_eq!(mapping.resolve_primary(Some("rust")), Some("nx run {target}:test"));
        assert_eq!(mapping.resolve_primary(None), Some("nx run {target}:test"));
    }

    #[test]
    fn resolve_primary_none_when_nothing_matches() {
        let mapping = CommandMapping::default();
        assert_eq!(mapping.resolve_primary(Some("python")), None);
    }

    #[test]
    fn resolve_script_path_pattern_drops_nonexistent_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("scripts")).unwrap();

        let resolved = resolve_script_path_pattern(dir.path(), "scripts");
        assert_eq!(resolved, vec![dir.path().join("scripts")]);

        let missing = resolve_script_path_pattern(dir.path(), "does-not-exist");
        assert!(missing.is_empty());
    }
}

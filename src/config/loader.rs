//! Configuration loading and saving utilities with fallback support.

use crate::config::defaults;
use crate::config::defaults::DEFAULT_CONFIG_FILE_NAME;
use crate::config::{Config, ConfigError};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Resolves `mom.toml` across the layered search order: current directory,
/// then each ancestor up to the filesystem root, then a dotfile in the
/// user's home directory, then a system-wide path. The first layer that
/// exists and parses wins; an explicit `--config` path bypasses this
/// entirely (see `ConfigManager::load`).
#[derive(Debug, Default)]
pub struct ConfigLoader {
    search_paths: Vec<PathBuf>,
}

/// Outcome of a fallback load: the resolved config, where (if anywhere) it
/// came from, and whether every search path was tried before falling back
/// to built-in defaults.
#[derive(Debug)]
pub struct ConfigLoadResult {
    pub config: Config,
    pub loaded_from: Option<PathBuf>,
    pub fallback_used: bool,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            search_paths: Self::default_search_paths(),
        }
    }

    fn default_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd.join(DEFAULT_CONFIG_FILE_NAME));

            let mut ancestor = cwd.as_path();
            while let Some(parent) = ancestor.parent() {
                paths.push(parent.join(DEFAULT_CONFIG_FILE_NAME));
                ancestor = parent;
            }
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(format!(".{DEFAULT_CONFIG_FILE_NAME}")));
        }

        paths.push(PathBuf::from("/etc/mom").join(DEFAULT_CONFIG_FILE_NAME));

        paths
    }

    /// Try each search path in order, returning the first one that exists
    /// and parses. Falls back to built-in defaults if none do.
    pub fn load_with_fallback(&self) -> Result<ConfigLoadResult, ConfigError> {
        for path in &self.search_paths {
            if !path.exists() {
                continue;
            }

            match load_from_file(path) {
                Ok(config) => {
                    debug!(path = %path.display(), "loaded configuration");
                    return Ok(ConfigLoadResult {
                        config,
                        loaded_from: Some(path.clone()),
                        fallback_used: false,
                    });
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "failed to load configuration, trying next search path");
                }
            }
        }

        Ok(ConfigLoadResult {
            config: Config::default(),
            loaded_from: None,
            fallback_used: true,
        })
    }
}

/// Deep-merge one TOML layer over another: tables merge key-by-key,
/// recursing into nested tables; anything else (strings, arrays, ints,
/// bools) is a leaf and the override replaces the base outright. Mirrors
/// the original `_merge_configs(base, override)`'s recursive-for-maps,
/// replace-for-leaves semantics (spec.md §3).
fn merge_toml_tables(base: toml::Value, over: toml::Value) -> toml::Value {
    use toml::Value;

    match (base, over) {
        (Value::Table(mut base_table), Value::Table(over_table)) => {
            for (key, over_value) in over_table {
                let merged_value = match base_table.remove(&key) {
                    Some(base_value) => merge_toml_tables(base_value, over_value),
                    None => over_value,
                };
                base_table.insert(key, merged_value);
            }
            Value::Table(base_table)
        }
        (_, over_value) => over_value,
    }
}

pub fn load_from_file(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let override_value: toml::Value = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    // Re-parse the built-in defaults as a `toml::Value` rather than reaching
    // for `Value::try_from`, so the merge only relies on the same
    // `to_string`/`from_str` pair already used elsewhere in this module.
    let default_text = toml::to_string(&defaults::default_config())?;
    let base_value: toml::Value =
        toml::from_str(&default_text).expect("built-in default config always round-trips through TOML");

    let merged = merge_toml_tables(base_value, override_value);
    let merged_text = toml::to_string(&merged)?;

    toml::from_str(&merged_text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn save_to_file(config: &Config, path: &Path) -> Result<(), ConfigError> {
    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_from_file_roundtrips_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE_NAME);
        let config = Config::default();
        save_to_file(&config, &path).unwrap();

        let loaded = load_from_file(&path).unwrap();
        assert_eq!(loaded.command_name, config.command_name);
    }

    #[test]
    fn load_from_file_merges_partial_commands_over_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            r#"
[commands.test]
pattern = "uv run pytest {target}"
"#,
        )
        .unwrap();

        let loaded = load_from_file(&path).unwrap();

        // The overridden mapping's `pattern` wins...
        assert_eq!(
            loaded.commands.get("test").and_then(|m| m.pattern.as_deref()),
            Some("uv run pytest {target}")
        );
        // ...without losing the default mapping's `fallback`...
        assert_eq!(
            loaded.commands.get("test").and_then(|m| m.fallback.as_deref()),
            Some("cd {target} && cargo test")
        );
        // ...or the other built-in command mappings this file never mentioned.
        assert!(loaded.commands.contains_key("build"));
        assert!(loaded.commands.contains_key("create"));
        assert!(loaded.commands.contains_key("format"));
    }

    #[test]
    fn load_from_file_merges_user_preferences_over_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            r#"
[user_preferences]
author = "Ada"
"#,
        )
        .unwrap();

        let loaded = load_from_file(&path).unwrap();
        assert_eq!(loaded.user_preferences.get("author").map(String::as_str), Some("Ada"));
    }

    #[test]
    fn load_from_file_missing_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("does-not-exist.toml");
        assert!(load_from_file(&path).is_err());
    }

    #[test]
    fn fallback_returns_defaults_when_nothing_found() {
        let loader = ConfigLoader {
            search_paths: vec![PathBuf::from("/nonexistent/mom.toml")],
        };
        let result = loader.load_with_fallback().unwrap();
        assert!(result.fallback_used);
        assert!(result.loaded_from.is_none());
    }
}

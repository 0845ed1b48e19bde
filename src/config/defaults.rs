//! Built-in default configuration.
//!
//! Used whenever no config file is found anywhere in the search order, and
//! as the template body `--init-config` writes out.

use super::{
    CommandMapping, Config, ExecutionConfig, InteractiveConfig, OutputConfig, RecoveryCommand,
};
use std::collections::HashMap;

pub const DEFAULT_CONFIG_FILE_NAME: &str = "mom.toml";

pub fn default_config() -> Config {
    let mut commands = HashMap::new();

    commands.insert(
        "create".to_string(),
        CommandMapping {
            pattern: None,
            fallback: Some("mkdir -p {name} && cd {name} && git init".to_string()),
            targets: HashMap::new(),
        },
    );
    commands.insert(
        "test".to_string(),
        CommandMapping {
            pattern: Some("{target} test".to_string()),
            fallback: Some("cd {target} && cargo test".to_string()),
            targets: HashMap::new(),
        },
    );
    commands.insert(
        "build".to_string(),
        CommandMapping {
            pattern: Some("{target} build".to_string()),
            fallback: Some("cd {target} && cargo build".to_string()),
            targets: HashMap::new(),
        },
    );
    commands.insert(
        "format".to_string(),
        CommandMapping {
            pattern: Some("{target} format".to_string()),
            fallback: Some("cd {target} && cargo fmt".to_string()),
            targets: HashMap::new(),
        },
    );

    Config {
        command_name: "mom".to_string(),
        commands,
        script_paths: vec!["scripts".to_string()],
        execution: ExecutionConfig::default(),
        output: OutputConfig::default(),
        recovery: vec![RecoveryCommand {
            name: "cache_reset".to_string(),
            command: "echo no recovery command configured".to_string(),
        }],
        interactive: InteractiveConfig::default(),
        user_preferences: HashMap::new(),
    }
}

/// The literal template body `mom --init-config` writes to disk. Kept as a
/// single formatted string (rather than serializing `Config::default()`) so
/// the generated file carries the same explanatory comments the original
/// tool's `_init_config` produced, adapted to TOML syntax.
pub fn init_config_template() -> String {
    r#"# mom configuration file
# Configure command mappings for your project.

# Command name (what you type before the verb, purely cosmetic here)
command_name = "mom"

# Script discovery paths (relative to this file)
script_paths = ["scripts"]

# Command mappings. `pattern` is tried first; `fallback` runs once the
# primary command's retries are exhausted. Additional keys (e.g. `python`)
# override `pattern` when the invocation names that target kind.
[commands.create]
fallback = "mkdir -p {name} && cd {name} && git init"

[commands.test]
pattern = "{target} test"
fallback = "cd {target} && cargo test"

[commands.build]
pattern = "{target} build"
fallback = "cd {target} && cargo build"

[commands.format]
pattern = "{target} format"
fallback = "cd {target} && cargo fmt"

# Execution settings
[execution]
auto_reset_on_cache_failure = true
retry_count = 2
timeout = 300

# AI-tailored output configuration
[output]
format = "structured"  # structured, json, markdown
head_lines = 10
tail_lines = 10
max_line_length = 200
duplicate_threshold = 3

# Recovery commands (run between retries when a primary command fails)
[[recovery]]
name = "cache_reset"
command = "echo no recovery command configured"

# Interactive agent tiers mediating subprocess prompts
[interactive]
enable_executing_agent = true
enable_specialized_agents = true
enable_general_agent = true

# Filled in by specialized/general agents answering project-name,
# author, license, etc. prompts on your behalf
[user_preferences]
author = "Developer"
email = "dev@example.com"
license = "MIT"
git_username = "developer"
git_email = "dev@example.com"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = default_config();
        let serialized = toml::to_string_pretty(&config).expect("serialize");
        let parsed: Config = toml::from_str(&serialized).expect("parse");
        assert_eq!(parsed.command_name, config.command_name);
        assert_eq!(parsed.commands.len(), config.commands.len());
    }

    #[test]
    fn init_template_parses_as_valid_config() {
        let template = init_config_template();
        let parsed: Config = toml::from_str(&template).expect("template should parse");
        assert_eq!(parsed.command_name, "mom");
        assert!(parsed.commands.contains_key("test"));
    }
}

//! CLI front end. Wires config → (script discovery) → substitution →
//! shell execution engine → output formatter/renderer for each verb, and
//! maps the result to a process exit code.

use crate::config::{Config, ConfigManager};
use crate::discovery::ScriptDiscovery;
use crate::error::{MomError, MomResult};
use crate::interactive::agents::{DockerAgent, EscalationAgent, GeneralAgent, GitAgent, NpmAgent, PythonAgent};
use crate::interactive::{AgentRegistry, CommandResult, ExecutionContext, ProjectInfo, Router};
use crate::output::{render, OutputFormatter, RenderFormat};
use crate::shell::ShellEngine;
use crate::substitution;
use clap::{Parser, Subcommand};
use regex::Regex;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "mom")]
#[command(about = "Maps short verbs onto project-specific shell pipelines")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Path to a config file, bypassing the usual search order.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run the AI-tailored output formatter (default).
    #[arg(long, global = true, conflicts_with = "raw_output")]
    pub ai_output: bool,

    /// Print the child process's raw stdout/stderr unformatted.
    #[arg(long, global = true)]
    pub raw_output: bool,

    #[arg(long, global = true, value_name = "FORMAT")]
    pub output_format: Option<String>,

    /// Disable head/tail truncation for this invocation.
    #[arg(long, global = true)]
    pub expand: bool,

    /// Write a default configuration file into the current directory.
    #[arg(long)]
    pub init_config: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create something of the given kind (e.g. `create python my-service`).
    Create {
        kind: String,
        args: Vec<String>,
    },
    Test {
        target: String,
        args: Vec<String>,
    },
    Build {
        target: String,
        args: Vec<String>,
    },
    Format {
        target: String,
        args: Vec<String>,
    },
    /// Discover and execute a project script by name.
    Script {
        name: String,
        args: Vec<String>,
    },
    /// Run a raw shell command, bypassing the mapping table entirely.
    Run {
        tokens: Vec<String>,
    },
    /// List every script discovered across the configured search paths.
    ListScripts,
    Config {
        #[arg(long)]
        show: bool,
        #[arg(long)]
        validate: bool,
    },
}

/// Parse and run, returning the process exit code. Kept separate from
/// `main` so tests can drive it without a real process boundary.
///
/// Every fallible path converges on a single `MomError`, matched exactly
/// once here to decide between a flat `1` and whatever exit code a
/// successfully-run command produced (0/1/124, per `process_exit_code`).
pub fn run(cli: Cli) -> i32 {
    match try_run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("mom: {err}");
            1
        }
    }
}

fn try_run(cli: Cli) -> MomResult<i32> {
    if cli.init_config {
        return Ok(run_init_config());
    }

    let manager = ConfigManager::load(cli.config.clone())?;

    if manager.fallback_used {
        warn!("no configuration file found, falling back to built-in defaults");
    }

    match cli.command {
        None => {
            eprintln!("mom: no command given (try `mom --help`)");
            Ok(1)
        }
        Some(Commands::Config { show, validate }) => run_config_command(&manager, show, validate),
        Some(Commands::ListScripts) => Ok(run_list_scripts(&manager)),
        Some(Commands::Create { kind, args }) => {
            run_mapped_verb(&cli, &manager, "create", Some(&kind), None, Some(&kind), &args)
        }
        Some(Commands::Test { target, args }) => {
            run_mapped_verb(&cli, &manager, "test", None, Some(&target), None, &args)
        }
        Some(Commands::Build { target, args }) => {
            run_mapped_verb(&cli, &manager, "build", None, Some(&target), None, &args)
        }
        Some(Commands::Format { target, args }) => {
            run_mapped_verb(&cli, &manager, "format", None, Some(&target), None, &args)
        }
        Some(Commands::Script { name, args }) => run_script(&cli, &manager, &name, &args),
        Some(Commands::Run { tokens }) => run_raw(&cli, &manager, &tokens),
    }
}

fn run_init_config() -> i32 {
    use crate::config::defaults;

    let path = PathBuf::from(defaults::DEFAULT_CONFIG_FILE_NAME);
    if path.exists() {
        eprintln!("mom: {} already exists", path.display());
        return 1;
    }

    match std::fs::write(&path, defaults::init_config_template()) {
        Ok(()) => {
            println!("Wrote default configuration to {}", path.display());
            0
        }
        Err(err) => {
            eprintln!("mom: failed to write {}: {err}", path.display());
            1
        }
    }
}

fn run_config_command(manager: &ConfigManager, show: bool, validate: bool) -> MomResult<i32> {
    if validate {
        crate::config::validation::validate(&manager.config)?;
        println!("configuration is valid");
        return Ok(0);
    }

    if show {
        let text = toml::to_string_pretty(&manager.config)?;
        println!("{text}");
        return Ok(0);
    }

    println!("Use `mom config --show` or `mom config --validate`");
    Ok(0)
}

fn run_list_scripts(manager: &ConfigManager) -> i32 {
    let discovery = ScriptDiscovery::new(manager.script_search_roots());

    for (root, scripts) in discovery.list_available_scripts() {
        println!("{}:", root.display());
        if scripts.is_empty() {
            println!("  (no scripts found)");
            continue;
        }
        for script in scripts {
            let info = discovery.get_script_info(&script);
            match info.description {
                Some(desc) => println!("  {:<20} {}", info.name, desc),
                None => println!("  {}", info.name),
            }
        }
    }

    0
}

fn run_mapped_verb(
    cli: &Cli,
    manager: &ConfigManager,
    verb: &str,
    target_kind: Option<&str>,
    subst_target: Option<&str>,
    subst_name: Option<&str>,
    args: &[String],
) -> MomResult<i32> {
    let Some(mapping) = manager.get_command_mapping(verb, target_kind) else {
        return Err(MomError::InvalidInput { message: format!("no mapping configured for '{verb}'") });
    };

    if mapping.primary.is_none() && mapping.fallback.is_none() {
        return Err(MomError::InvalidInput {
            message: format!("'{verb}' has neither a primary nor a fallback command configured"),
        });
    }

    let substitution_context = substitution::build_context(subst_target, subst_name, args);
    let agent_context = build_execution_context(manager, format!("{verb} {}", args.join(" ")));
    let engine = build_shell_engine(manager);

    let outcome = engine.run(
        mapping.primary.as_deref(),
        mapping.fallback.as_deref(),
        &substitution_context,
        &manager.config.execution,
        &manager.config.recovery,
        &agent_context,
        None,
    );

    let command_text = mapping
        .primary
        .as_deref()
        .or(mapping.fallback.as_deref())
        .unwrap_or(verb)
        .to_string();

    handle_outcome(cli, manager, &command_text, outcome)
}

fn run_script(cli: &Cli, manager: &ConfigManager, name: &str, args: &[String]) -> MomResult<i32> {
    let discovery = ScriptDiscovery::new(manager.script_search_roots());

    let Some(path) = discovery.find_script(name) else {
        return Err(script_not_found_error(&discovery, name));
    };

    let Some(command) = build_script_command(&path, args) else {
        return Err(MomError::InvalidInput {
            message: format!("'{}' is not executable and has no recognized interpreter", path.display()),
        });
    };

    let working_dir = path.parent().map(PathBuf::from);
    let agent_context = build_execution_context(manager, command.clone());
    let engine = build_shell_engine(manager);

    let outcome = engine.run(
        Some(&command),
        None,
        &substitution::build_context(None, Some(name), args),
        &manager.config.execution,
        &manager.config.recovery,
        &agent_context,
        working_dir.as_deref(),
    );

    handle_outcome(cli, manager, &command, outcome)
}

fn run_raw(cli: &Cli, manager: &ConfigManager, tokens: &[String]) -> MomResult<i32> {
    if tokens.is_empty() {
        return Err(MomError::InvalidInput { message: "'run' needs at least one token".to_string() });
    }

    let command = tokens.join(" ");
    let agent_context = build_execution_context(manager, command.clone());
    let engine = build_shell_engine(manager);

    let outcome = engine.run(
        Some(&command),
        None,
        &std::collections::HashMap::new(),
        &manager.config.execution,
        &manager.config.recovery,
        &agent_context,
        None,
    );

    handle_outcome(cli, manager, &command, outcome)
}

fn build_script_command(path: &std::path::Path, args: &[String]) -> Option<String> {
    use crate::discovery::interpreter_for;

    let args_suffix = if args.is_empty() { String::new() } else { format!(" {}", args.join(" ")) };

    if let Some(interpreter) = interpreter_for(path) {
        return Some(format!("{} {}{}", interpreter.join(" "), path.display(), args_suffix));
    }

    if crate::discovery::is_executable_script(path) {
        return Some(format!("{}{}", path.display(), args_suffix));
    }

    read_shebang_interpreter(path).map(|interpreter| format!("{} {}{}", interpreter, path.display(), args_suffix))
}

fn read_shebang_interpreter(path: &std::path::Path) -> Option<String> {
    let contents = std::fs::read_to_string(path).ok()?;
    let first_line = contents.lines().next()?;
    first_line.strip_prefix("#!").map(|rest| rest.trim().to_string())
}

fn script_not_found_error(discovery: &ScriptDiscovery, name: &str) -> MomError {
    let stems = discovery.all_script_stems();
    let name_lower = name.to_lowercase();

    let suggestion = stems.iter().find(|stem| {
        let stem_lower = stem.to_lowercase();
        stem_lower.contains(&name_lower) || name_lower.contains(stem_lower.as_str())
    });

    let message = match suggestion {
        Some(candidate) => format!("script '{name}' not found. Did you mean '{candidate}'?"),
        None => format!("script '{name}' not found. Run `mom list-scripts` to see what's available."),
    };
    MomError::InvalidInput { message }
}

fn build_execution_context(manager: &ConfigManager, command: String) -> ExecutionContext {
    let working_directory = std::env::current_dir().unwrap_or_default();
    ExecutionContext {
        current_task: String::new(),
        command_history: vec![command],
        environment_vars: std::env::vars().collect(),
        working_directory: working_directory.clone(),
        user_preferences: manager.config.user_preferences.clone(),
        project_info: ProjectInfo::probe(&working_directory),
        session_metadata: std::collections::HashMap::new(),
    }
}

/// Build the agent registry for this invocation from the config's
/// `interactive` toggles: escalation, the four specialized agents
/// (each gated behind the regex family it owns), and the general agent.
fn build_registry(config: &Config) -> AgentRegistry {
    let mut registry = AgentRegistry::new();
    let interactive = &config.interactive;

    if interactive.enable_executing_agent {
        registry.register_escalation_agent(Box::new(EscalationAgent::new()));
    }

    if interactive.enable_specialized_agents {
        registry.register_specialized_agent(
            Regex::new(r"git (commit|config|init|clone|merge|rebase)").unwrap(),
            Box::new(GitAgent::default()),
        );
        registry.register_specialized_agent(
            Regex::new(r"npm (init|create)|yarn (init|create)").unwrap(),
            Box::new(NpmAgent::default()),
        );
        registry.register_specialized_agent(
            Regex::new(r"docker (run|build|exec)|docker-compose").unwrap(),
            Box::new(DockerAgent::default()),
        );
        registry.register_specialized_agent(
            Regex::new(r"pip install|python setup\.py|poetry init|uv init").unwrap(),
            Box::new(PythonAgent::default()),
        );
    }

    if interactive.enable_general_agent {
        registry.register_general_agent(Box::new(GeneralAgent::new(config.user_preferences.clone())));
    }

    registry
}

fn build_shell_engine(manager: &ConfigManager) -> ShellEngine {
    let registry = build_registry(&manager.config);
    ShellEngine::new(Router::new(registry))
}

fn handle_outcome(
    cli: &Cli,
    manager: &ConfigManager,
    command: &str,
    outcome: Result<crate::shell::ExecutionOutcome, crate::shell::ShellError>,
) -> MomResult<i32> {
    let outcome = outcome?;

    if outcome.used_fallback {
        info!(command, "ran via fallback after primary attempts failed");
    }

    print_result(cli, manager, command, &outcome.result);
    Ok(process_exit_code(outcome.result.exit_code))
}

/// Map a child's raw exit code onto the process-level contract (spec.md
/// §4.7/§7): `0` stays `0`, a timeout's `124` passes through unchanged, and
/// every other non-zero code collapses to a bare `1` — the CLI never
/// forwards an arbitrary child return code as its own, matching the
/// original's uniform `sys.exit(1)` on every failing path.
fn process_exit_code(exit_code: i32) -> i32 {
    match exit_code {
        0 => 0,
        124 => 124,
        _ => 1,
    }
}

fn print_result(cli: &Cli, manager: &ConfigManager, command: &str, result: &CommandResult) {
    if cli.raw_output {
        print!("{}", result.stdout);
        eprint!("{}", result.stderr);
        return;
    }

    let mut output_config = manager.config.output.clone();
    if let Some(format) = &cli.output_format {
        output_config.format = format.clone();
    }
    if cli.expand {
        output_config.head_lines = 1_000_000;
        output_config.tail_lines = 0;
    }

    let format = RenderFormat::parse(&output_config.format).unwrap_or(RenderFormat::Structured);
    let formatter = OutputFormatter::new(&output_config);
    let formatted = formatter.format(command, result);
    println!("{}", render(&formatted, format));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_registry_respects_disabled_tiers() {
        let mut config = Config::default();
        config.interactive.enable_executing_agent = false;
        config.interactive.enable_specialized_agents = false;
        config.interactive.enable_general_agent = false;

        let registry = build_registry(&config);
        assert_eq!(registry.agent_count(), 0);
    }

    #[test]
    fn build_registry_wires_every_enabled_tier() {
        let config = Config::default();
        let registry = build_registry(&config);
        // escalation + general + 4 specialized
        assert_eq!(registry.agent_count(), 6);
    }

    #[test]
    fn process_exit_code_collapses_arbitrary_failures_to_one() {
        assert_eq!(process_exit_code(0), 0);
        assert_eq!(process_exit_code(124), 124);
        assert_eq!(process_exit_code(1), 1);
        assert_eq!(process_exit_code(3), 1);
        assert_eq!(process_exit_code(255), 1);
    }
}

//! mom — a universal command-mapping executor.
//!
//! Maps short, stable verbs onto project-specific shell pipelines,
//! mediates interactive prompts through a pluggable agent system, retries
//! with fallbacks and recovery commands, and formats output for both
//! humans and machine consumers.

pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod interactive;
pub mod logging;
pub mod output;
pub mod shell;
pub mod substitution;

pub use config::{Config, ConfigError, ConfigManager};
pub use error::{MomError, MomResult};
pub use interactive::{Agent, AgentCounters, AgentError, AgentRegistry, EscalationRequest, ExecutionContext};
pub use output::{OutputFormatter, RenderFormat};
pub use shell::{ExecutionOutcome, ShellEngine, ShellError};

/// Version information, surfaced by `mom --version` and the `general` agent.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

//! Interactive agent subsystem.
//!
//! When a mapped command is likely to prompt (confirmation, a package
//! name, a version string…), an [`Agent`] answers on the invoking user's
//! behalf instead of the command hanging waiting for a human. Agents are
//! tried in priority order by the [`AgentRegistry`]; [`router::Router`]
//! drives the actual subprocess and prompt-detection loop.

pub mod agents;
pub mod router;

use regex::Regex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

pub use router::{CommandResult, InteractionLogEntry, Router};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent '{0}' failed to produce a response: {1}")]
    ResponseFailed(String, String),
}

/// Everything an agent needs to know to answer a prompt: what's being run,
/// what the project looks like, and what the user has told us about
/// themselves up front.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    pub current_task: String,
    pub command_history: Vec<String>,
    pub environment_vars: HashMap<String, String>,
    pub working_directory: PathBuf,
    pub user_preferences: HashMap<String, String>,
    pub project_info: ProjectInfo,
    pub session_metadata: HashMap<String, String>,
}

/// Project metadata probed from the working directory, the way the
/// original system inspects `package.json`/`pyproject.toml`/`Dockerfile`
/// before handing control to an agent.
#[derive(Debug, Clone, Default)]
pub struct ProjectInfo {
    pub name: String,
    pub path: PathBuf,
    pub version: Option<String>,
    pub project_type: Option<String>,
    pub description: Option<String>,
    pub has_docker: bool,
}

impl ProjectInfo {
    pub fn probe(dir: &std::path::Path) -> Self {
        let mut info = ProjectInfo {
            name: dir
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            path: dir.to_path_buf(),
            ..Default::default()
        };

        let package_json = dir.join("package.json");
        if let Ok(contents) = std::fs::read_to_string(&package_json) {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(&contents) {
                if let Some(name) = value.get("name").and_then(|v| v.as_str()) {
                    info.name = name.to_string();
                }
                info.version = value.get("version").and_then(|v| v.as_str()).map(String::from);
                info.description = value.get("description").and_then(|v| v.as_str()).map(String::from);
                info.project_type = Some("javascript".to_string());
            }
        }

        if dir.join("pyproject.toml").exists() {
            info.project_type = Some("python".to_string());
        }

        if dir.join("Cargo.toml").exists() {
            info.project_type = Some("rust".to_string());
        }

        if dir.join("Dockerfile").exists() {
            info.has_docker = true;
        }

        info
    }
}

/// Everything packaged up for an escalation callback: the prompt and
/// command that triggered it, plus enough of the [`ExecutionContext`] for
/// whatever embeds `mom` to make an informed decision without needing the
/// whole context (spec.md §4.5.1).
#[derive(Debug, Clone)]
pub struct EscalationRequest {
    pub prompt: String,
    pub command: String,
    pub current_task: String,
    pub project_info: ProjectInfo,
    pub working_directory: PathBuf,
    pub recent_commands: Vec<String>,
}

const ESCALATION_HISTORY_WINDOW: usize = 5;

impl EscalationRequest {
    fn from_context(prompt: &str, command: &str, context: &ExecutionContext) -> Self {
        let start = context.command_history.len().saturating_sub(ESCALATION_HISTORY_WINDOW);
        Self {
            prompt: prompt.to_string(),
            command: command.to_string(),
            current_task: context.current_task.clone(),
            project_info: context.project_info.clone(),
            working_directory: context.working_directory.clone(),
            recent_commands: context.command_history[start..].to_vec(),
        }
    }
}

/// Approximate, single-writer usage statistics for one agent: how many
/// prompts it was asked to answer, and how many of those it answered
/// without erroring. The router is the only writer (per spec.md §5, these
/// never coordinate across concurrent invocations).
#[derive(Debug, Default)]
pub struct AgentCounters {
    usage_count: AtomicUsize,
    success_count: AtomicUsize,
}

impl AgentCounters {
    pub fn record(&self, success: bool) {
        self.usage_count.fetch_add(1, Ordering::Relaxed);
        if success {
            self.success_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn usage_count(&self) -> usize {
        self.usage_count.load(Ordering::Relaxed)
    }

    pub fn success_count(&self) -> usize {
        self.success_count.load(Ordering::Relaxed)
    }

    pub fn success_rate(&self) -> f64 {
        let usage = self.usage_count();
        if usage == 0 {
            0.0
        } else {
            self.success_count() as f64 / usage as f64
        }
    }
}

/// Something that can answer an interactive prompt raised by a running
/// command. `can_handle` decides whether this agent applies to a given
/// command at all; `handle_prompt` is only called once that's true.
pub trait Agent: Send + Sync {
    fn name(&self) -> &str;
    fn priority(&self) -> i32;
    fn counters(&self) -> &AgentCounters;
    fn can_handle(&self, command: &str, context: &ExecutionContext) -> bool;
    fn handle_prompt(&self, prompt: &str, command: &str, context: &ExecutionContext) -> Result<String, AgentError>;

    /// Record whether the last `handle_prompt` call produced a usable
    /// response. Invoked by the router, once per prompt, after the call
    /// returns (spec.md §4.5.3).
    fn record_usage(&self, success: bool) {
        self.counters().record(success);
    }
}

/// Holds the four agent tiers and picks the first one in the order the
/// spec fixes: custom (highest, explicit priority ordering among
/// themselves) → specialized (regex-matched command families) → general
/// (always willing) → escalation (last resort, typically an injected
/// callback out to whatever invoked `mom`).
#[derive(Default)]
pub struct AgentRegistry {
    custom: Vec<Box<dyn Agent>>,
    specialized: Vec<(Regex, Box<dyn Agent>)>,
    general: Option<Box<dyn Agent>>,
    escalation: Option<Box<dyn Agent>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_escalation_agent(&mut self, agent: Box<dyn Agent>) {
        self.escalation = Some(agent);
    }

    pub fn register_general_agent(&mut self, agent: Box<dyn Agent>) {
        self.general = Some(agent);
    }

    pub fn register_specialized_agent(&mut self, pattern: Regex, agent: Box<dyn Agent>) {
        self.specialized.push((pattern, agent));
    }

    /// Register a custom agent and keep the list sorted by descending
    /// priority, matching the original registry's re-sort-on-register
    /// behavior.
    pub fn register_custom_agent(&mut self, agent: Box<dyn Agent>) {
        self.custom.push(agent);
        self.custom.sort_by(|a, b| b.priority().cmp(&a.priority()));
    }

    pub fn find_agent(&self, command: &str, context: &ExecutionContext) -> Option<&dyn Agent> {
        for agent in &self.custom {
            if agent.can_handle(command, context) {
                return Some(agent.as_ref());
            }
        }

        for (pattern, agent) in &self.specialized {
            if pattern.is_match(command) && agent.can_handle(command, context) {
                return Some(agent.as_ref());
            }
        }

        if let Some(agent) = &self.general {
            if agent.can_handle(command, context) {
                return Some(agent.as_ref());
            }
        }

        if let Some(agent) = &self.escalation {
            if agent.can_handle(command, context) {
                return Some(agent.as_ref());
            }
        }

        None
    }

    pub fn agent_count(&self) -> usize {
        self.custom.len()
            + self.specialized.len()
            + self.general.is_some() as usize
            + self.escalation.is_some() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interactive::agents::GeneralAgent;

    #[test]
    fn registry_prefers_specialized_over_general() {
        let mut registry = AgentRegistry::new();
        registry.register_general_agent(Box::new(GeneralAgent::new(HashMap::new())));
        registry.register_specialized_agent(
            Regex::new(r"git (commit|init)").unwrap(),
            Box::new(agents::GitAgent::default()),
        );

        let ctx = ExecutionContext::default();
        let agent = registry.find_agent("git commit -m test", &ctx).unwrap();
        assert_eq!(agent.name(), "git");
    }

    #[test]
    fn registry_falls_through_to_general_when_no_specialist_matches() {
        let mut registry = AgentRegistry::new();
        registry.register_general_agent(Box::new(GeneralAgent::new(HashMap::new())));
        registry.register_specialized_agent(
            Regex::new(r"git (commit|init)").unwrap(),
            Box::new(agents::GitAgent::default()),
        );

        let ctx = ExecutionContext::default();
        let agent = registry.find_agent("cargo build", &ctx).unwrap();
        assert_eq!(agent.name(), "general");
    }

    #[test]
    fn empty_registry_finds_nothing() {
        let registry = AgentRegistry::new();
        let ctx = ExecutionContext::default();
        assert!(registry.find_agent("echo hi", &ctx).is_none());
    }
}

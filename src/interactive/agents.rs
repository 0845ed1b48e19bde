//! Concrete agents: one escalation agent, four command-family specialists,
//! and a general-purpose fallback.

use super::{Agent, AgentCounters, AgentError, EscalationRequest, ExecutionContext};
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

/// Destructive-intent words that make every agent here answer conservatively
/// regardless of command family.
const DESTRUCTIVE_WORDS: &[&str] = &["delete", "remove", "destroy", "force", "overwrite", "prune"];

fn is_destructive_prompt(prompt: &str) -> bool {
    let lower = prompt.to_lowercase();
    DESTRUCTIVE_WORDS.iter().any(|w| lower.contains(w))
}

fn default_yes_no(prompt: &str) -> String {
    if is_destructive_prompt(prompt) {
        "n".to_string()
    } else if prompt.to_lowercase().contains("(y/n)") || prompt.to_lowercase().contains("(yes/no)") {
        "y".to_string()
    } else {
        String::new()
    }
}

/// Lowercase, whitespace-to-hyphen slug of a task description, used to turn
/// `current_task` into a branch-name-safe fragment.
fn slugify(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Last-resort agent. Delegates to an injected callback (typically supplied
/// by whatever embeds `mom`); when none is set, degrades to the same
/// conservative yes/no default every other agent falls back on.
pub struct EscalationAgent {
    callback: Option<Arc<dyn Fn(EscalationRequest) -> String + Send + Sync>>,
    counters: AgentCounters,
}

impl EscalationAgent {
    pub fn new() -> Self {
        Self {
            callback: None,
            counters: AgentCounters::default(),
        }
    }

    pub fn with_callback(callback: Arc<dyn Fn(EscalationRequest) -> String + Send + Sync>) -> Self {
        Self {
            callback: Some(callback),
            counters: AgentCounters::default(),
        }
    }
}

impl Agent for EscalationAgent {
    fn name(&self) -> &str {
        "escalation"
    }

    fn priority(&self) -> i32 {
        100
    }

    fn counters(&self) -> &AgentCounters {
        &self.counters
    }

    fn can_handle(&self, _command: &str, _context: &ExecutionContext) -> bool {
        true
    }

    fn handle_prompt(&self, prompt: &str, command: &str, context: &ExecutionContext) -> Result<String, AgentError> {
        if let Some(callback) = &self.callback {
            return Ok(callback(EscalationRequest::from_context(prompt, command, context)));
        }
        Ok(default_yes_no(prompt))
    }
}

#[derive(Default)]
pub struct GitAgent {
    counters: AgentCounters,
}

impl Agent for GitAgent {
    fn name(&self) -> &str {
        "git"
    }

    fn priority(&self) -> i32 {
        70
    }

    fn counters(&self) -> &AgentCounters {
        &self.counters
    }

    fn can_handle(&self, command: &str, _context: &ExecutionContext) -> bool {
        command.contains("git ")
    }

    fn handle_prompt(&self, prompt: &str, _command: &str, context: &ExecutionContext) -> Result<String, AgentError> {
        let lower = prompt.to_lowercase();

        if lower.contains("commit message") || (lower.contains("message") && lower.ends_with(':')) {
            return Ok(if context.current_task.is_empty() {
                format!("Update {}", context.project_info.name)
            } else {
                format!("feat: {}", context.current_task)
            });
        }
        if lower.contains("email") {
            return Ok(context
                .user_preferences
                .get("email")
                .cloned()
                .unwrap_or_else(|| "dev@example.com".to_string()));
        }
        if lower.contains("name") && !lower.contains("branch") {
            return Ok(context
                .user_preferences
                .get("author")
                .cloned()
                .unwrap_or_else(|| "mom".to_string()));
        }
        if lower.contains("branch") {
            return Ok(if context.current_task.is_empty() {
                "feature".to_string()
            } else {
                format!("feature/{}", slugify(&context.current_task))
            });
        }
        if lower.contains("continue") || lower.contains("proceed") {
            return Ok(if is_destructive_prompt(&lower) { "n" } else { "y" }.to_string());
        }

        Ok(default_yes_no(prompt))
    }
}

#[derive(Default)]
pub struct NpmAgent {
    counters: AgentCounters,
}

impl Agent for NpmAgent {
    fn name(&self) -> &str {
        "npm"
    }

    fn priority(&self) -> i32 {
        70
    }

    fn counters(&self) -> &AgentCounters {
        &self.counters
    }

    fn can_handle(&self, command: &str, _context: &ExecutionContext) -> bool {
        command.contains("npm ") || command.contains("yarn ")
    }

    fn handle_prompt(&self, prompt: &str, _command: &str, context: &ExecutionContext) -> Result<String, AgentError> {
        let lower = prompt.to_lowercase();
        let info = &context.project_info;

        if lower.contains("package name") {
            return Ok(info.name.clone());
        }
        if lower.contains("version") {
            return Ok(info.version.clone().unwrap_or_else(|| "1.0.0".to_string()));
        }
        if lower.contains("description") {
            return Ok(info.description.clone().unwrap_or_default());
        }
        if lower.contains("entry point") {
            return Ok("index.js".to_string());
        }
        if lower.contains("test command") {
            return Ok(String::new());
        }
        if lower.contains("git repository") {
            return Ok(String::new());
        }
        if lower.contains("keywords") {
            return Ok(String::new());
        }
        if lower.contains("author") {
            return Ok(context.user_preferences.get("author").cloned().unwrap_or_default());
        }
        if lower.contains("license") {
            return Ok(context
                .user_preferences
                .get("license")
                .cloned()
                .unwrap_or_else(|| "MIT".to_string()));
        }
        if lower.contains("is this ok") {
            return Ok("yes".to_string());
        }

        Ok(default_yes_no(prompt))
    }
}

#[derive(Default)]
pub struct DockerAgent {
    counters: AgentCounters,
}

impl Agent for DockerAgent {
    fn name(&self) -> &str {
        "docker"
    }

    fn priority(&self) -> i32 {
        70
    }

    fn counters(&self) -> &AgentCounters {
        &self.counters
    }

    fn can_handle(&self, command: &str, _context: &ExecutionContext) -> bool {
        command.contains("docker ") || command.contains("docker-compose")
    }

    fn handle_prompt(&self, prompt: &str, _command: &str, context: &ExecutionContext) -> Result<String, AgentError> {
        let lower = prompt.to_lowercase();
        let info = &context.project_info;

        if lower.contains("container name") {
            return Ok(format!("{}-container", info.name));
        }
        if lower.contains("port") {
            return Ok("3000".to_string());
        }
        if lower.contains("environment") || lower.contains("env") {
            return Ok("production".to_string());
        }
        if lower.contains("volume") || lower.contains("mount") {
            return Ok("/app".to_string());
        }
        if lower.contains("image") || lower.contains("base image") {
            return Ok("node:alpine".to_string());
        }
        if lower.contains("continue") || lower.contains("proceed") {
            return Ok(if is_destructive_prompt(&lower) { "n" } else { "y" }.to_string());
        }

        Ok(default_yes_no(prompt))
    }
}

#[derive(Default)]
pub struct PythonAgent {
    counters: AgentCounters,
}

impl Agent for PythonAgent {
    fn name(&self) -> &str {
        "python"
    }

    fn priority(&self) -> i32 {
        70
    }

    fn counters(&self) -> &AgentCounters {
        &self.counters
    }

    fn can_handle(&self, command: &str, _context: &ExecutionContext) -> bool {
        command.contains("pip install")
            || command.contains("setup.py")
            || command.contains("poetry init")
            || command.contains("uv init")
    }

    fn handle_prompt(&self, prompt: &str, _command: &str, context: &ExecutionContext) -> Result<String, AgentError> {
        let lower = prompt.to_lowercase();
        let info = &context.project_info;

        if lower.contains("package name") || lower.contains("project name") {
            return Ok(info.name.clone());
        }
        if lower.contains("version") {
            return Ok(info.version.clone().unwrap_or_else(|| "0.1.0".to_string()));
        }
        if lower.contains("author") {
            return Ok(context.user_preferences.get("author").cloned().unwrap_or_default());
        }
        if lower.contains("license") {
            return Ok(context
                .user_preferences
                .get("license")
                .cloned()
                .unwrap_or_else(|| "MIT".to_string()));
        }

        Ok(default_yes_no(prompt))
    }
}

/// Always willing to handle anything, and therefore always the last tier
/// tried before escalation. Answers a fixed set of common prompt shapes
/// from project info and user preferences; otherwise a conservative
/// default.
pub struct GeneralAgent {
    patterns: Vec<(Regex, &'static str)>,
    priority: i32,
    counters: AgentCounters,
}

impl GeneralAgent {
    pub fn new(_config: HashMap<String, String>) -> Self {
        Self {
            counters: AgentCounters::default(),
            patterns: vec![
                (Regex::new(r"(?i)\(y/n\)|\(yes/no\)|continue\?|proceed\?|ok\?").unwrap(), "confirm"),
                (Regex::new(r"(?i)version").unwrap(), "version"),
                (Regex::new(r"(?i)license").unwrap(), "license"),
                (Regex::new(r"(?i)author").unwrap(), "author"),
                (Regex::new(r"(?i)description").unwrap(), "description"),
                (Regex::new(r"(?i)entry point|main file").unwrap(), "entry_point"),
                (Regex::new(r"(?i)test command").unwrap(), "test_command"),
                (Regex::new(r"(?i)repository|git url").unwrap(), "repository"),
                (Regex::new(r"(?i)keywords").unwrap(), "keywords"),
                (Regex::new(r"(?i)package name|project name").unwrap(), "name"),
            ],
            priority: 10,
        }
    }

    fn respond(&self, kind: &str, context: &ExecutionContext) -> String {
        let info = &context.project_info;
        match kind {
            "confirm" => "y".to_string(),
            "version" => info.version.clone().unwrap_or_else(|| "0.1.0".to_string()),
            "license" => context.user_preferences.get("license").cloned().unwrap_or_else(|| "MIT".to_string()),
            "author" => context.user_preferences.get("author").cloned().unwrap_or_default(),
            "description" => info.description.clone().unwrap_or_default(),
            "entry_point" => "index.js".to_string(),
            "test_command" => String::new(),
            "repository" => String::new(),
            "keywords" => String::new(),
            "name" => info.name.clone(),
            _ => String::new(),
        }
    }
}

impl Agent for GeneralAgent {
    fn name(&self) -> &str {
        "general"
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn counters(&self) -> &AgentCounters {
        &self.counters
    }

    fn can_handle(&self, _command: &str, _context: &ExecutionContext) -> bool {
        true
    }

    fn handle_prompt(&self, prompt: &str, _command: &str, context: &ExecutionContext) -> Result<String, AgentError> {
        for (pattern, kind) in &self.patterns {
            if pattern.is_match(prompt) {
                return Ok(self.respond(kind, context));
            }
        }

        if is_destructive_prompt(prompt) {
            return Ok("n".to_string());
        }

        Ok(String::new())
    }
}

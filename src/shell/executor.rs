//! Retry/fallback/recovery orchestration around one primary command.

use crate::config::{ExecutionConfig, RecoveryCommand};
use crate::interactive::{CommandResult, ExecutionContext, Router};
use crate::substitution;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::ShellError;

/// Outcome of running a command through its full retry/fallback policy:
/// the last result produced, how many primary attempts were made, and
/// whether the fallback template ultimately had to run.
#[derive(Debug)]
pub struct ExecutionOutcome {
    pub result: CommandResult,
    pub attempts: usize,
    pub used_fallback: bool,
}

pub struct ShellEngine {
    router: Router,
}

impl ShellEngine {
    pub fn new(router: Router) -> Self {
        Self { router }
    }

    /// Run `primary` up to `execution.retry_count + 1` times, running
    /// `recovery` commands before every retry when
    /// `auto_reset_on_cache_failure` is set — a blanket policy toggle, not a
    /// guess at whether this particular failure was cache-related. If every
    /// primary attempt fails and a `fallback` template is configured, run
    /// it through the same retry policy.
    pub fn run(
        &self,
        primary: Option<&str>,
        fallback: Option<&str>,
        substitution_context: &HashMap<String, String>,
        exec_config: &ExecutionConfig,
        recovery: &[RecoveryCommand],
        agent_context: &ExecutionContext,
        working_dir: Option<&Path>,
    ) -> Result<ExecutionOutcome, ShellError> {
        if let Some(template) = primary {
            let outcome = self.run_with_retries(
                template,
                substitution_context,
                exec_config,
                recovery,
                agent_context,
                working_dir,
            )?;

            if outcome.result.success() {
                return Ok(outcome);
            }

            if let Some(fallback_template) = fallback {
                info!(command = template, "primary command exhausted retries, trying fallback");
                let mut fallback_outcome = self.run_with_retries(
                    fallback_template,
                    substitution_context,
                    exec_config,
                    recovery,
                    agent_context,
                    working_dir,
                )?;
                fallback_outcome.used_fallback = true;
                return Ok(fallback_outcome);
            }

            return Ok(outcome);
        }

        if let Some(fallback_template) = fallback {
            let mut outcome = self.run_with_retries(
                fallback_template,
                substitution_context,
                exec_config,
                recovery,
                agent_context,
                working_dir,
            )?;
            outcome.used_fallback = true;
            return Ok(outcome);
        }

        Err(ShellError::NoCommandConfigured)
    }

    fn run_with_retries(
        &self,
        template: &str,
        substitution_context: &HashMap<String, String>,
        exec_config: &ExecutionConfig,
        recovery: &[RecoveryCommand],
        agent_context: &ExecutionContext,
        working_dir: Option<&Path>,
    ) -> Result<ExecutionOutcome, ShellError> {
        let command = substitution::substitute(template, substitution_context);
        let timeout = Duration::from_secs(exec_config.timeout);

        let mut last_result = None;

        for attempt in 0..=exec_config.retry_count {
            if attempt > 0 && exec_config.auto_reset_on_cache_failure {
                self.run_recovery_commands(recovery, agent_context, working_dir, timeout);
            }

            debug!(command = %command, attempt, "executing command");
            let result = self
                .router
                .execute(&command, agent_context, working_dir, timeout)
                .map_err(ShellError::Io)?;

            if result.success() {
                return Ok(ExecutionOutcome {
                    result,
                    attempts: attempt + 1,
                    used_fallback: false,
                });
            }

            warn!(command = %command, attempt, exit_code = result.exit_code, "attempt failed");
            last_result = Some((result, attempt + 1));
        }

        let (result, attempts) = last_result.expect("retry_count >= 0 guarantees at least one attempt");
        Ok(ExecutionOutcome {
            result,
            attempts,
            used_fallback: false,
        })
    }

    fn run_recovery_commands(
        &self,
        recovery: &[RecoveryCommand],
        agent_context: &ExecutionContext,
        working_dir: Option<&Path>,
        timeout: Duration,
    ) {
        for entry in recovery {
            debug!(name = %entry.name, command = %entry.command, "running recovery command");
            if let Err(err) = self.router.execute(&entry.command, agent_context, working_dir, timeout) {
                warn!(name = %entry.name, error = %err, "recovery command failed to spawn");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interactive::AgentRegistry;

    fn engine() -> ShellEngine {
        ShellEngine::new(Router::new(AgentRegistry::new()))
    }

    #[test]
    fn succeeds_on_first_attempt_without_fallback() {
        let mut ctx = HashMap::new();
        ctx.insert("target".to_string(), "x".to_string());
        let exec_config = ExecutionConfig {
            retry_count: 2,
            auto_reset_on_cache_failure: true,
            timeout: 5,
        };

        let outcome = engine()
            .run(Some("true"), None, &ctx, &exec_config, &[], &ExecutionContext::default(), None)
            .unwrap();

        assert!(outcome.result.success());
        assert_eq!(outcome.attempts, 1);
        assert!(!outcome.used_fallback);
    }

    #[test]
    fn falls_back_after_primary_exhausts_retries() {
        let ctx = HashMap::new();
        let exec_config = ExecutionConfig {
            retry_count: 0,
            auto_reset_on_cache_failure: false,
            timeout: 5,
        };

        let outcome = engine()
            .run(Some("false"), Some("true"), &ctx, &exec_config, &[], &ExecutionContext::default(), None)
            .unwrap();

        assert!(outcome.result.success());
        assert!(outcome.used_fallback);
    }

    #[test]
    fn reports_failure_when_no_fallback_configured() {
        let ctx = HashMap::new();
        let exec_config = ExecutionConfig {
            retry_count: 0,
            auto_reset_on_cache_failure: false,
            timeout: 5,
        };

        let outcome = engine()
            .run(Some("false"), None, &ctx, &exec_config, &[], &ExecutionContext::default(), None)
            .unwrap();

        assert!(!outcome.result.success());
        assert!(!outcome.used_fallback);
    }

    #[test]
    fn errors_when_nothing_is_configured() {
        let ctx = HashMap::new();
        let exec_config = ExecutionConfig::default();
        let result = engine().run(None, None, &ctx, &exec_config, &[], &ExecutionContext::default(), None);
        assert!(matches!(result, Err(ShellError::NoCommandConfigured)));
    }
}

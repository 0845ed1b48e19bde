//! Routes a shell command through agent-mediated execution.
//!
//! A background thread per stdio pipe forwards chunks to the main loop over
//! an `mpsc::channel`; the main loop polls with a ~100ms `recv_timeout`,
//! checks each chunk against the interactive-prompt heuristic, and on a hit
//! asks the registry's chosen agent for a response before writing it to the
//! child's stdin. This is the portable stand-in for true non-blocking pipe
//! polling (platform-specific `select`/IOCP is out of scope for a crate
//! that has to behave the same on Linux, macOS, and Windows).

use super::{Agent, AgentRegistry, ExecutionContext};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{Read, Write};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const READ_CHUNK_SIZE: usize = 1024;
/// Grace window between SIGTERM and SIGKILL on a timed-out or cancelled
/// child, per spec.md §5 ("a short grace window (≈2 s)").
const KILL_GRACE_PERIOD: Duration = Duration::from_secs(2);

static PROMPT_INDICATORS: &[&str] = &[
    "?", "(y/n)", "(yes/no)", "enter", "input", "select", "choose", "continue?", "proceed?", "ok?",
];

static TRAILING_PROMPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[:?]\s*$|>\s$").unwrap());

/// One agent/child interaction: the prompt text seen, what was sent back,
/// which agent answered (or `"emergency_fallback"` if the agent errored),
/// and the error message in that case.
#[derive(Debug, Clone)]
pub struct InteractionLogEntry {
    pub prompt: String,
    pub response: String,
    pub agent: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub interaction_log: Vec<InteractionLogEntry>,
    pub agent_used: Option<String>,
    pub execution_time_ms: u128,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

enum Chunk {
    Stdout(Vec<u8>),
    Stderr(Vec<u8>),
    StdoutDone,
    StderrDone,
}

pub struct Router {
    registry: AgentRegistry,
}

impl Router {
    pub fn new(registry: AgentRegistry) -> Self {
        Self { registry }
    }

    pub fn execute(
        &self,
        command: &str,
        context: &ExecutionContext,
        working_dir: Option<&Path>,
        timeout: Duration,
    ) -> std::io::Result<CommandResult> {
        let start = Instant::now();

        let agent = self.registry.find_agent(command, context);

        let mut result = match agent {
            Some(agent) => self.execute_with_agent(command, context, working_dir, timeout, agent)?,
            None => execute_non_interactive(command, working_dir, timeout)?,
        };

        result.execution_time_ms = start.elapsed().as_millis();
        result.agent_used = agent.map(|a| a.name().to_string());
        Ok(result)
    }

    fn execute_with_agent(
        &self,
        command: &str,
        context: &ExecutionContext,
        working_dir: Option<&Path>,
        timeout: Duration,
        agent: &dyn Agent,
    ) -> std::io::Result<CommandResult> {
        let mut cmd = build_shell_command(command, working_dir);
        cmd.stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped());

        let mut child = cmd.spawn()?;
        let pid = child.id();

        let (tx, rx) = mpsc::channel();
        spawn_reader(child.stdout.take().expect("piped stdout"), tx.clone(), Chunk::Stdout, Chunk::StdoutDone);
        spawn_reader(child.stderr.take().expect("piped stderr"), tx, Chunk::Stderr, Chunk::StderrDone);

        let mut stdout_buf = String::new();
        let mut stderr_buf = String::new();
        let mut interaction_log = Vec::new();
        let mut stdout_done = false;
        let mut stderr_done = false;
        let start = Instant::now();

        loop {
            if start.elapsed() > timeout {
                kill_process(pid, &mut child);
                return Ok(CommandResult {
                    stdout: stdout_buf,
                    stderr: stderr_buf,
                    exit_code: 124,
                    interaction_log,
                    agent_used: None,
                    execution_time_ms: 0,
                });
            }

            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(Chunk::Stdout(bytes)) => {
                    let text = String::from_utf8_lossy(&bytes).into_owned();
                    stdout_buf.push_str(&text);

                    if is_interactive_prompt(&text) {
                        let outcome = agent.handle_prompt(&text, command, context);
                        agent.record_usage(outcome.is_ok());
                        let (response, agent_name, error) = match outcome {
                            Ok(response) => (response, agent.name().to_string(), None),
                            Err(err) => {
                                warn!(error = %err, "agent failed to answer prompt, using emergency response");
                                (emergency_response(&text), "emergency_fallback".to_string(), Some(err.to_string()))
                            }
                        };

                        if let Some(stdin) = child.stdin.as_mut() {
                            let _ = writeln!(stdin, "{response}");
                            let _ = stdin.flush();
                        }

                        interaction_log.push(InteractionLogEntry {
                            prompt: text.trim().to_string(),
                            response,
                            agent: agent_name,
                            error,
                        });
                    }
                }
                Ok(Chunk::Stderr(bytes)) => {
                    stderr_buf.push_str(&String::from_utf8_lossy(&bytes));
                }
                Ok(Chunk::StdoutDone) => stdout_done = true,
                Ok(Chunk::StderrDone) => stderr_done = true,
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    if let Ok(Some(_)) = child.try_wait() {
                        if stdout_done && stderr_done {
                            break;
                        }
                    }
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }

        let status = child.wait()?;
        debug!(command, exit_code = status.code(), "mediated command finished");

        Ok(CommandResult {
            stdout: stdout_buf,
            stderr: stderr_buf,
            exit_code: status.code().unwrap_or(-1),
            interaction_log,
            agent_used: None,
            execution_time_ms: 0,
        })
    }
}

fn spawn_reader<R: Read + Send + 'static>(
    mut reader: R,
    tx: mpsc::Sender<Chunk>,
    wrap: fn(Vec<u8>) -> Chunk,
    done: Chunk,
) {
    std::thread::spawn(move || {
        let mut buf = [0u8; READ_CHUNK_SIZE];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send(wrap(buf[..n].to_vec())).is_err() {
                        return;
                    }
                }
                Err(_) => break,
            }
        }
        let _ = tx.send(done);
    });
}

fn execute_non_interactive(command: &str, working_dir: Option<&Path>, timeout: Duration) -> std::io::Result<CommandResult> {
    let mut cmd = build_shell_command(command, working_dir);
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

    let mut child = cmd.spawn()?;
    let pid = child.id();
    let start = Instant::now();

    loop {
        if let Some(status) = child.try_wait()? {
            let output = child.wait_with_output()?;
            return Ok(CommandResult {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                exit_code: status.code().unwrap_or(-1),
                interaction_log: Vec::new(),
                agent_used: None,
                execution_time_ms: 0,
            });
        }

        if start.elapsed() > timeout {
            kill_process(pid, &mut child);
            return Ok(CommandResult {
                stdout: String::new(),
                stderr: "command timed out".to_string(),
                exit_code: 124,
                interaction_log: Vec::new(),
                agent_used: None,
                execution_time_ms: 0,
            });
        }

        std::thread::sleep(POLL_INTERVAL);
    }
}

fn build_shell_command(command: &str, working_dir: Option<&Path>) -> Command {
    let (shell, arg) = if cfg!(target_os = "windows") {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    };

    let mut cmd = Command::new(shell);
    cmd.arg(arg).arg(command);
    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }
    cmd
}

#[cfg(unix)]
fn kill_process(pid: u32, child: &mut Child) {
    unsafe {
        libc::kill(pid as i32, libc::SIGTERM);
    }
    std::thread::sleep(KILL_GRACE_PERIOD);
    let _ = child.kill();
    let _ = child.wait();
}

#[cfg(not(unix))]
fn kill_process(_pid: u32, child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Detects whether a chunk of freshly read output looks like it's waiting
/// on stdin: a known phrase anywhere in it, or the last non-empty line
/// ending in `:`, `?`, or `> `.
pub fn is_interactive_prompt(output: &str) -> bool {
    if output.trim().is_empty() {
        return false;
    }

    let lower = output.to_lowercase();
    if PROMPT_INDICATORS.iter().any(|indicator| lower.contains(indicator)) {
        return true;
    }

    // Only trim trailing newlines here, not all trailing whitespace: a
    // prompt genuinely ending in "> " (a trailing space) must keep that
    // space so `TRAILING_PROMPT`'s `>\s$` alternative can still match it.
    if let Some(last_line) = output.trim_end_matches(['\n', '\r']).lines().last() {
        if TRAILING_PROMPT.is_match(last_line) {
            return true;
        }
    }

    false
}

/// The response used when the chosen agent errors out mid-prompt: refuse
/// anything that sounds destructive, agree to plain yes/no confirmations,
/// and otherwise send nothing rather than guess.
pub fn emergency_response(prompt: &str) -> String {
    let lower = prompt.to_lowercase();
    if ["delete", "remove", "destroy"].iter().any(|w| lower.contains(w)) {
        return "n".to_string();
    }
    if lower.contains("(y/n)") {
        return "y".to_string();
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interactive::agents::GeneralAgent;
    use std::collections::HashMap;

    #[test]
    fn detects_question_mark_prompts() {
        assert!(is_interactive_prompt("Proceed with installation?"));
        assert!(is_interactive_prompt("Package name: "));
        assert!(!is_interactive_prompt("Compiling package v0.1.0"));
    }

    #[test]
    fn detects_trailing_colon_prompt() {
        assert!(is_interactive_prompt("Version:"));
        assert!(is_interactive_prompt("Enter value:"));
    }

    #[test]
    fn plain_colon_mid_line_is_not_a_prompt() {
        assert!(!is_interactive_prompt("12:30:00 Compiling package: v0.1.0"));
    }

    #[test]
    fn detects_trailing_angle_bracket_prompt() {
        assert!(is_interactive_prompt("irb(main):001:0> "));
        assert!(!is_interactive_prompt("irb(main):001:0>"));
    }

    #[test]
    fn emergency_response_refuses_destructive_prompts() {
        assert_eq!(emergency_response("Delete all files? (y/n)"), "n");
        assert_eq!(emergency_response("Continue? (y/n)"), "y");
        assert_eq!(emergency_response("Just a statement."), "");
    }

    #[test]
    fn non_interactive_echo_succeeds() {
        let result = execute_non_interactive("echo hello", None, Duration::from_secs(5)).unwrap();
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.stdout.trim(), "hello");
    }

    #[test]
    fn non_interactive_respects_timeout() {
        let result = execute_non_interactive("sleep 2", None, Duration::from_millis(200)).unwrap();
        assert_eq!(result.exit_code, 124);
    }

    #[test]
    fn mediated_execution_answers_a_read_prompt() {
        let mut registry = AgentRegistry::new();
        registry.register_general_agent(Box::new(GeneralAgent::new(HashMap::new())));
        let router = Router::new(registry);

        let context = ExecutionContext::default();
        let result = router
            .execute(
                "read -p 'continue? (y/n) ' ans; echo \"got:$ans\"",
                &context,
                None,
                Duration::from_secs(5),
            )
            .unwrap();

        assert_eq!(result.exit_code, 0);
        assert!(result.stdout.contains("got:y"));
        assert_eq!(result.interaction_log.len(), 1);
    }
}

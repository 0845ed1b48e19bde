//! AI-tailored output formatting: normalize raw command output into a
//! bounded, de-duplicated shape, then render it in one of three formats.

pub mod families;
pub mod renderer;

use crate::config::OutputConfig;
use crate::interactive::CommandResult;
use regex::Regex;
use once_cell::sync::Lazy;
use std::collections::HashMap;

pub use renderer::{render, RenderFormat};

static ANSI_ESCAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*[a-zA-Z]").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Failure,
    Timeout,
}

impl Status {
    /// The literal the stable `json` contract uses (spec.md §3/§6):
    /// `success` or `error`. `Failure` and `Timeout` both collapse to
    /// `error` here — the original formatter never distinguished a timeout
    /// from any other non-zero exit at the status level (`output.py`:
    /// `status = "success" if returncode == 0 else "error"`); callers that
    /// need to tell the two apart read `exit_code` (124 for a timeout)
    /// instead.
    pub fn contract_str(self) -> &'static str {
        match self {
            Status::Success => "success",
            Status::Failure | Status::Timeout => "error",
        }
    }
}

/// The normalized, bounded view of a command's output that every renderer
/// draws from.
#[derive(Debug, Clone)]
pub struct FormattedOutput {
    pub command: String,
    pub status: Status,
    pub exit_code: i32,
    pub summary: String,
    pub head: Vec<String>,
    pub tail: Vec<String>,
    pub expandable_body: Vec<String>,
    pub filtered_count: usize,
    pub execution_time_ms: u128,
    pub interactions: usize,
    pub metadata: HashMap<String, String>,
}

pub struct OutputFormatter<'a> {
    config: &'a OutputConfig,
}

impl<'a> OutputFormatter<'a> {
    pub fn new(config: &'a OutputConfig) -> Self {
        Self { config }
    }

    pub fn format(&self, command: &str, result: &CommandResult) -> FormattedOutput {
        let status = if result.exit_code == 124 {
            Status::Timeout
        } else if result.success() {
            Status::Success
        } else {
            Status::Failure
        };

        let combined: Vec<String> = result
            .stdout
            .lines()
            .map(str::to_string)
            .chain(result.stderr.lines().map(|line| format!("[STDERR] {line}")))
            .collect();

        let (cleaned, filtered_count) = self.clean_and_filter_lines(combined);
        let (mut head, tail, expandable_body) = self.split_head_tail(&cleaned);

        let family_summary = families::summarize(command, &cleaned, status, result.exit_code);

        if let Some(override_lines) = &family_summary.head_override {
            if !override_lines.is_empty() {
                head = override_lines.iter().take(self.config.head_lines).cloned().collect();
            }
        }

        let mut metadata = family_summary.metadata;
        metadata.insert("total_lines".to_string(), cleaned.len().to_string());
        if let Some(agent) = &result.agent_used {
            metadata.insert("agent_used".to_string(), agent.clone());
        }

        FormattedOutput {
            command: command.to_string(),
            status,
            exit_code: result.exit_code,
            summary: family_summary.text,
            head,
            tail,
            expandable_body,
            filtered_count,
            execution_time_ms: result.execution_time_ms,
            interactions: result.interaction_log.len(),
            metadata,
        }
    }

    /// Strip ANSI escapes, truncate overlong lines, and drop lines repeated
    /// beyond `duplicate_threshold` occurrences (keeping the first N),
    /// tracked by an md5 hash of each cleaned line the way the original
    /// formatter's dedup pass does.
    fn clean_and_filter_lines(&self, lines: Vec<String>) -> (Vec<String>, usize) {
        let mut seen_counts: HashMap<[u8; 16], usize> = HashMap::new();
        let mut cleaned = Vec::with_capacity(lines.len());
        let mut filtered = 0usize;

        for line in lines {
            let stripped = ANSI_ESCAPE.replace_all(&line, "").into_owned();
            if stripped.trim().is_empty() {
                continue;
            }
            let truncated = if stripped.chars().count() > self.config.max_line_length {
                let keep = self.config.max_line_length.saturating_sub(3);
                format!("{}...", stripped.chars().take(keep).collect::<String>())
            } else {
                stripped
            };

            let hash = md5::compute(truncated.as_bytes()).0;
            let count = seen_counts.entry(hash).or_insert(0);
            *count += 1;

            if *count <= self.config.duplicate_threshold {
                cleaned.push(truncated);
            } else {
                filtered += 1;
            }
        }

        (cleaned, filtered)
    }

    /// When the whole output fits in `head_lines + tail_lines`, there is no
    /// expandable middle: everything goes in `head` and `tail` stays empty.
    /// Otherwise split into head / hidden middle / tail.
    fn split_head_tail(&self, lines: &[String]) -> (Vec<String>, Vec<String>, Vec<String>) {
        let head_n = self.config.head_lines;
        let tail_n = self.config.tail_lines;

        if lines.len() <= head_n + tail_n {
            return (lines.to_vec(), Vec::new(), Vec::new());
        }

        let head = lines[..head_n].to_vec();
        let tail = lines[lines.len() - tail_n..].to_vec();
        let expandable_body = lines[head_n..lines.len() - tail_n].to_vec();

        (head, tail, expandable_body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> OutputConfig {
        OutputConfig {
            format: "structured".to_string(),
            head_lines: 2,
            tail_lines: 2,
            max_line_length: 20,
            duplicate_threshold: 1,
        }
    }

    fn result(stdout: &str, exit_code: i32) -> CommandResult {
        CommandResult {
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_code,
            interaction_log: Vec::new(),
            agent_used: None,
            execution_time_ms: 42,
        }
    }

    #[test]
    fn short_output_has_no_expandable_body() {
        let cfg = config();
        let formatter = OutputFormatter::new(&cfg);
        let formatted = formatter.format("cargo test", &result("line1\nline2\nline3", 0));
        assert!(formatted.expandable_body.is_empty());
        assert_eq!(formatted.head.len(), 3);
    }

    #[test]
    fn long_output_splits_head_middle_tail() {
        let cfg = config();
        let formatter = OutputFormatter::new(&cfg);
        let lines: Vec<String> = (0..10).map(|i| format!("line{i}")).collect();
        let formatted = formatter.format("cargo build", &result(&lines.join("\n"), 0));
        assert_eq!(formatted.head, vec!["line0", "line1"]);
        assert_eq!(formatted.tail, vec!["line8", "line9"]);
        assert_eq!(formatted.expandable_body.len(), 6);
    }

    #[test]
    fn duplicate_lines_beyond_threshold_are_filtered() {
        let cfg = config();
        let formatter = OutputFormatter::new(&cfg);
        let formatted = formatter.format("cmd", &result("same\nsame\nsame", 0));
        assert_eq!(formatted.filtered_count, 2);
        assert_eq!(formatted.head, vec!["same"]);
    }

    #[test]
    fn ansi_escapes_are_stripped() {
        let cfg = config();
        let formatter = OutputFormatter::new(&cfg);
        let formatted = formatter.format("cmd", &result("\x1b[32mok\x1b[0m", 0));
        assert_eq!(formatted.head, vec!["ok"]);
    }

    #[test]
    fn empty_lines_are_dropped() {
        let cfg = config();
        let formatter = OutputFormatter::new(&cfg);
        let formatted = formatter.format("cmd", &result("line1\n\n   \nline2", 0));
        assert_eq!(formatted.head, vec!["line1", "line2"]);
    }

    #[test]
    fn stderr_lines_are_tagged_and_appended_after_stdout() {
        let cfg = config();
        let formatter = OutputFormatter::new(&cfg);
        let mut r = result("out line", 1);
        r.stderr = "oops".to_string();
        let formatted = formatter.format("cmd", &r);
        assert_eq!(formatted.head, vec!["out line", "[STDERR] oops"]);
    }

    #[test]
    fn failing_pytest_output_overrides_head_with_failing_lines() {
        let cfg = config();
        let formatter = OutputFormatter::new(&cfg);
        let output = "test_a.py::test_one PASSED\n\
                      test_a.py::test_two FAILED\n\
                      E   assert 1 == 2\n\
                      ===== 1 passed, 1 failed in 0.1s =====";
        let formatted = formatter.format("pytest tests/", &result(output, 1));
        assert_eq!(formatted.status, Status::Failure);
        assert!(formatted.head.iter().any(|line| line.contains("FAILED")));
        assert_eq!(formatted.summary, "1 tests passed, 1 failed");
    }

    #[test]
    fn status_reflects_timeout_exit_code() {
        let cfg = config();
        let formatter = OutputFormatter::new(&cfg);
        let formatted = formatter.format("cmd", &result("", 124));
        assert_eq!(formatted.status, Status::Timeout);
    }
}

//! Renders a [`FormattedOutput`] in one of the three shapes a caller can
//! ask for: human-facing structured text, a canonical JSON contract for
//! machine consumers, or markdown for pasting into a PR/issue.

use super::{FormattedOutput, Status};
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderFormat {
    Structured,
    Json,
    Markdown,
}

impl RenderFormat {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "structured" => Some(Self::Structured),
            "json" => Some(Self::Json),
            "markdown" => Some(Self::Markdown),
            _ => None,
        }
    }
}

pub fn render(formatted: &FormattedOutput, format: RenderFormat) -> String {
    match format {
        RenderFormat::Structured => render_structured(formatted),
        RenderFormat::Json => render_json(formatted),
        RenderFormat::Markdown => render_markdown(formatted),
    }
}

fn status_marker(status: Status) -> &'static str {
    match status {
        Status::Success => "\u{2705}",
        Status::Failure => "\u{274c}",
        Status::Timeout => "\u{23f1}\u{fe0f}",
    }
}

fn render_structured(f: &FormattedOutput) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} {}\n", status_marker(f.status), f.summary));
    out.push_str(&format!("\u{1f4cb} {}\n", f.command));

    for line in &f.head {
        out.push_str(line);
        out.push('\n');
    }

    if !f.expandable_body.is_empty() {
        out.push_str(&format!("\u{1f504} ... {} more lines ...\n", f.expandable_body.len()));
    }

    for line in &f.tail {
        out.push_str(line);
        out.push('\n');
    }

    if f.filtered_count > 0 {
        out.push_str(&format!("\u{1f4ca} {} duplicate lines filtered\n", f.filtered_count));
    }

    out.push_str(&format!(
        "\u{26a1} {}ms",
        f.execution_time_ms
    ));

    if f.interactions > 0 {
        out.push_str(&format!(" \u{00b7} {} interaction(s) mediated", f.interactions));
    }
    out.push('\n');

    out
}

/// Keys match the stable machine contract in the external-interfaces spec
/// exactly: `command`, `status`, `summary`, `head_lines`, `tail_lines`,
/// `total_lines`, `filtered_duplicates`, `expandable_body`, `metadata`.
fn render_json(f: &FormattedOutput) -> String {
    let total_lines = f.head.len() + f.expandable_body.len() + f.tail.len();

    let value = json!({
        "command": f.command,
        "status": f.status.contract_str(),
        "exit_code": f.exit_code,
        "summary": f.summary,
        "head_lines": f.head,
        "tail_lines": f.tail,
        "total_lines": total_lines,
        "filtered_duplicates": f.filtered_count,
        "expandable_body": if f.expandable_body.is_empty() { None } else { Some(&f.expandable_body) },
        "execution_time_ms": f.execution_time_ms,
        "interactions": f.interactions,
        "metadata": f.metadata,
    });

    serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
}

fn render_markdown(f: &FormattedOutput) -> String {
    let mut out = String::new();
    out.push_str(&format!("## {} `{}`\n\n", status_marker(f.status), f.command));
    out.push_str(&format!("{}\n\n", f.summary));

    out.push_str("```\n");
    for line in &f.head {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str("```\n");

    if !f.expandable_body.is_empty() {
        out.push_str(&format!(
            "\n<details>\n<summary>{} more lines</summary>\n\n```\n",
            f.expandable_body.len()
        ));
        for line in &f.expandable_body {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str("```\n</details>\n");
    }

    if !f.tail.is_empty() {
        out.push_str("\n```\n");
        for line in &f.tail {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str("```\n");
    }

    out.push_str(&format!(
        "\n_exit code {} \u{00b7} {}ms \u{00b7} {} interaction(s)_\n",
        f.exit_code, f.execution_time_ms, f.interactions
    ));

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn sample(status: Status) -> FormattedOutput {
        FormattedOutput {
            command: "cargo test".to_string(),
            status,
            exit_code: if status == Status::Success { 0 } else { 1 },
            summary: "12 tests passed".to_string(),
            head: vec!["line1".to_string()],
            tail: vec![],
            expandable_body: vec![],
            filtered_count: 0,
            execution_time_ms: 120,
            interactions: 0,
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn structured_render_includes_success_marker() {
        let rendered = render(&sample(Status::Success), RenderFormat::Structured);
        assert!(rendered.starts_with("\u{2705}"));
        assert!(rendered.contains("cargo test"));
    }

    #[test]
    fn structured_render_includes_failure_marker() {
        let rendered = render(&sample(Status::Failure), RenderFormat::Structured);
        assert!(rendered.starts_with("\u{274c}"));
    }

    #[test]
    fn json_render_round_trips_as_valid_json() {
        let rendered = render(&sample(Status::Success), RenderFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed["command"], "cargo test");
        assert_eq!(parsed["status"], "success");
    }

    #[test]
    fn json_render_collapses_failure_and_timeout_to_error_status() {
        let failure = render(&sample(Status::Failure), RenderFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&failure).unwrap();
        assert_eq!(parsed["status"], "error");

        let mut timed_out = sample(Status::Timeout);
        timed_out.exit_code = 124;
        let rendered = render(&timed_out, RenderFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed["status"], "error");
        assert_eq!(parsed["exit_code"], 124);
    }

    #[test]
    fn json_render_uses_the_stable_contract_keys() {
        let mut f = sample(Status::Success);
        f.tail = vec!["tail1".to_string()];
        f.expandable_body = vec!["hidden".to_string()];
        f.filtered_count = 3;

        let rendered = render(&f, RenderFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed["head_lines"], serde_json::json!(["line1"]));
        assert_eq!(parsed["tail_lines"], serde_json::json!(["tail1"]));
        assert_eq!(parsed["total_lines"], 3);
        assert_eq!(parsed["filtered_duplicates"], 3);
        assert_eq!(parsed["expandable_body"], serde_json::json!(["hidden"]));
    }

    #[test]
    fn json_render_omits_expandable_body_when_everything_fits() {
        let rendered = render(&sample(Status::Success), RenderFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert!(parsed["expandable_body"].is_null());
    }

    #[test]
    fn markdown_render_collapses_expandable_body_in_details_block() {
        let mut f = sample(Status::Success);
        f.expandable_body = vec!["hidden1".to_string(), "hidden2".to_string()];
        let rendered = render(&f, RenderFormat::Markdown);
        assert!(rendered.contains("<details>"));
        assert!(rendered.contains("hidden1"));
    }

    #[test]
    fn render_format_parse_rejects_unknown_names() {
        assert_eq!(RenderFormat::parse("yaml"), None);
        assert_eq!(RenderFormat::parse("json"), Some(RenderFormat::Json));
    }
}

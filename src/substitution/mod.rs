//! `{identifier}` placeholder expansion.
//!
//! Command and script templates reference `{target}`, `{name}`, `{args}`,
//! and arbitrary environment variable names. Unknown placeholders are left
//! untouched in the output (rather than erroring) so a template can still
//! be useful even when a caller doesn't supply every possible variable —
//! the warning surfaces the gap without blocking execution.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::warn;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{(\w+)\}").unwrap());

/// Build the substitution context for one command invocation: `target`,
/// `name`, `args` (space-joined), plus every process environment variable.
/// CLI-supplied values take precedence over same-named environment
/// variables.
pub fn build_context(target: Option<&str>, name: Option<&str>, args: &[String]) -> HashMap<String, String> {
    let mut context: HashMap<String, String> = std::env::vars().collect();

    if let Some(target) = target {
        context.insert("target".to_string(), target.to_string());
    }
    if let Some(name) = name {
        context.insert("name".to_string(), name.to_string());
    }
    context.insert("args".to_string(), args.join(" "));

    context
}

/// Expand every `{identifier}` in `template` using `context`. Placeholders
/// with no entry in `context` are left as-is in the output; each one also
/// produces a `tracing::warn!`.
pub fn substitute(template: &str, context: &HashMap<String, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures| {
            let key = &caps[1];
            match context.get(key) {
                Some(value) => value.clone(),
                None => {
                    warn!(placeholder = key, "unresolved substitution placeholder");
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}

/// Names of every placeholder in `template` that has no entry in `context`,
/// without performing the substitution. Used by validation/dry-run paths.
pub fn unresolved_placeholders(template: &str, context: &HashMap<String, String>) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(template)
        .map(|c| c[1].to_string())
        .filter(|name| !context.contains_key(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn substitutes_known_placeholders() {
        let ctx = context(&[("target", "api"), ("name", "widget")]);
        assert_eq!(substitute("nx run {target}:test", &ctx), "nx run api:test");
        assert_eq!(substitute("create {name}", &ctx), "create widget");
    }

    #[test]
    fn leaves_unknown_placeholders_intact() {
        let ctx = context(&[("target", "api")]);
        assert_eq!(substitute("run {target} as {unknown}", &ctx), "run api as {unknown}");
    }

    #[test]
    fn unresolved_placeholders_reports_missing_only() {
        let ctx = context(&[("target", "api")]);
        let missing = unresolved_placeholders("{target} {name} {args}", &ctx);
        assert_eq!(missing, vec!["name".to_string(), "args".to_string()]);
    }

    #[test]
    fn template_without_placeholders_is_unchanged() {
        let ctx = HashMap::new();
        assert_eq!(substitute("cargo build --release", &ctx), "cargo build --release");
    }

    #[test]
    fn build_context_prefers_explicit_over_environment() {
        std::env::set_var("target", "from-env");
        let ctx = build_context(Some("from-cli"), None, &[]);
        assert_eq!(ctx.get("target").map(String::as_str), Some("from-cli"));
        std::env::remove_var("target");
    }
}

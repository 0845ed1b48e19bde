//! Script discovery across configured search roots.
//!
//! Resolves a bare script name to a file on disk by trying exact and
//! extension-qualified candidates in each search root in order, falling
//! back to substring-fuzzy matching across every discovered script if none
//! match exactly.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Extensions recognized as scripts, in the order exact-match candidates
/// are tried.
const SCRIPT_EXTENSIONS: &[&str] = &["py", "sh", "js", "ts", "mjs"];

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("script '{0}' not found in any configured search path")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Metadata about a discovered script, used by `list-scripts` and by the
/// shell executor to pick an interpreter.
#[derive(Debug, Clone)]
pub struct ScriptInfo {
    pub name: String,
    pub path: PathBuf,
    pub extension: Option<String>,
    pub size_bytes: u64,
    pub executable: bool,
    pub description: Option<String>,
}

pub struct ScriptDiscovery {
    search_roots: Vec<PathBuf>,
}

impl ScriptDiscovery {
    pub fn new(search_roots: Vec<PathBuf>) -> Self {
        Self { search_roots }
    }

    /// Resolve a script name to a path. Tries, per search root in order: the
    /// exact name, then the name with each recognized extension appended.
    /// If nothing matches exactly in any root, falls back to a substring
    /// match against every script's stem across all roots.
    pub fn find_script(&self, name: &str) -> Option<PathBuf> {
        for root in &self.search_roots {
            if let Some(candidate) = self.find_exact_in_root(root, name) {
                return Some(candidate);
            }
        }

        self.fuzzy_find(name)
    }

    fn find_exact_in_root(&self, root: &Path, name: &str) -> Option<PathBuf> {
        let exact = root.join(name);
        if exact.is_file() {
            return Some(exact);
        }

        for ext in SCRIPT_EXTENSIONS {
            let candidate = root.join(format!("{name}.{ext}"));
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        None
    }

    /// Substring match in either direction: the query contains the stem, or
    /// the stem contains the query.
    fn fuzzy_find(&self, name: &str) -> Option<PathBuf> {
        let name_lower = name.to_lowercase();
        for (_, scripts) in self.list_available_scripts() {
            for script in scripts {
                if let Some(stem) = script.file_stem().and_then(|s| s.to_str()) {
                    let stem_lower = stem.to_lowercase();
                    if stem_lower.contains(&name_lower) || name_lower.contains(stem_lower.as_str()) {
                        return Some(script);
                    }
                }
            }
        }
        None
    }

    /// All scripts found by walking each search root one level deep, grouped
    /// by the root they were found under (the shape `list-scripts` prints).
    pub fn list_available_scripts(&self) -> Vec<(PathBuf, Vec<PathBuf>)> {
        self.search_roots
            .iter()
            .map(|root| {
                let scripts = self.scripts_in_root(root);
                (root.clone(), scripts)
            })
            .collect()
    }

    fn scripts_in_root(&self, root: &Path) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(root) else {
            return Vec::new();
        };

        entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_executable_script(path))
            .collect()
    }

    /// Names of every discovered script stem, used for "did you mean"
    /// suggestions when an exact/fuzzy lookup misses entirely.
    pub fn all_script_stems(&self) -> Vec<String> {
        self.list_available_scripts()
            .into_iter()
            .flat_map(|(_, scripts)| scripts)
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().to_string()))
            .collect()
    }

    pub fn get_script_info(&self, path: &Path) -> ScriptInfo {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = path.extension().map(|e| e.to_string_lossy().to_string());
        let size_bytes = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        let executable = is_executable_script(path);
        let description = extract_description(path);

        ScriptInfo {
            name,
            path: path.to_path_buf(),
            extension,
            size_bytes,
            executable,
            description,
        }
    }
}

/// A script is executable if its extension is recognized, the executable
/// bit is set, or its first line is a shebang.
pub fn is_executable_script(path: &Path) -> bool {
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        if SCRIPT_EXTENSIONS.contains(&ext) {
            return true;
        }
    }

    if has_executable_bit(path) {
        return true;
    }

    has_shebang(path)
}

#[cfg(unix)]
fn has_executable_bit(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn has_executable_bit(_path: &Path) -> bool {
    false
}

fn has_shebang(path: &Path) -> bool {
    let Ok(file) = fs::File::open(path) else {
        return false;
    };
    let mut first_line = String::new();
    if BufReader::new(file).read_line(&mut first_line).is_err() {
        return false;
    }
    first_line.starts_with("#!")
}

/// Extract a one-line description: a Python module docstring, or the first
/// non-shebang comment among the first ten lines for anything else.
fn extract_description(path: &Path) -> Option<String> {
    let file = fs::File::open(path).ok()?;
    let reader = BufReader::new(file);
    let lines: Vec<String> = reader.lines().take(10).filter_map(Result::ok).collect();

    if path.extension().and_then(|e| e.to_str()) == Some("py") {
        if let Some(doc) = extract_python_docstring(&lines) {
            return Some(doc);
        }
    }

    lines.into_iter().find_map(|line| {
        let trimmed = line.trim();
        if trimmed.starts_with('#') && !trimmed.starts_with("#!") {
            let text = trimmed.trim_start_matches('#').trim();
            if text.len() > 10 {
                return Some(text.to_string());
            }
        }
        None
    })
}

fn extract_python_docstring(lines: &[String]) -> Option<String> {
    for line in lines {
        let trimmed = line.trim();
        for quote in ["\"\"\"", "'''"] {
            if let Some(rest) = trimmed.strip_prefix(quote) {
                let rest = rest.strip_suffix(quote).unwrap_or(rest);
                if !rest.is_empty() {
                    return Some(rest.trim().to_string());
                }
            }
        }
    }
    None
}

/// Interpreters, matched by extension, that `shell::executor` invokes a
/// script through when it lacks an executable bit of its own.
pub fn interpreter_for(path: &Path) -> Option<Vec<String>> {
    let ext = path.extension()?.to_str()?;
    let interpreter = match ext {
        "py" => vec!["python".to_string()],
        "sh" => vec!["bash".to_string()],
        "js" | "mjs" => vec!["node".to_string()],
        "ts" => vec!["npx".to_string(), "tsx".to_string()],
        _ => return None,
    };
    debug!(?path, ?interpreter, "selected interpreter for script");
    Some(interpreter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_script(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn finds_exact_match_with_extension() {
        let dir = tempdir().unwrap();
        write_script(dir.path(), "deploy.sh", "#!/bin/bash\necho hi\n");

        let discovery = ScriptDiscovery::new(vec![dir.path().to_path_buf()]);
        let found = discovery.find_script("deploy").expect("should find deploy.sh");
        assert_eq!(found.file_name().unwrap(), "deploy.sh");
    }

    #[test]
    fn falls_back_to_fuzzy_substring_match() {
        let dir = tempdir().unwrap();
        write_script(dir.path(), "run_migrations.sh", "#!/bin/bash\n");

        let discovery = ScriptDiscovery::new(vec![dir.path().to_path_buf()]);
        let found = discovery.find_script("migrations").expect("substring match should find it");
        assert_eq!(found.file_name().unwrap(), "run_migrations.sh");
        assert_eq!(
            discovery.all_script_stems(),
            vec!["run_migrations".to_string()]
        );
    }

    #[test]
    fn fuzzy_match_also_matches_when_query_is_longer_than_stem() {
        let dir = tempdir().unwrap();
        write_script(dir.path(), "test.sh", "#!/bin/bash\n");

        let discovery = ScriptDiscovery::new(vec![dir.path().to_path_buf()]);
        let found = discovery.find_script("run_test_suite").expect("stem contained in query should match");
        assert_eq!(found.file_name().unwrap(), "test.sh");
    }

    #[test]
    fn missing_script_returns_none() {
        let dir = tempdir().unwrap();
        let discovery = ScriptDiscovery::new(vec![dir.path().to_path_buf()]);
        assert!(discovery.find_script("nope").is_none());
    }

    #[test]
    fn extracts_python_docstring_description() {
        let dir = tempdir().unwrap();
        let path = write_script(
            dir.path(),
            "build.py",
            "\"\"\"Builds the release artifact.\"\"\"\nimport sys\n",
        );

        let discovery = ScriptDiscovery::new(vec![dir.path().to_path_buf()]);
        let info = discovery.get_script_info(&path);
        assert_eq!(info.description.as_deref(), Some("Builds the release artifact."));
    }

    #[test]
    fn extracts_leading_comment_description_for_shell() {
        let dir = tempdir().unwrap();
        let path = write_script(
            dir.path(),
            "deploy.sh",
            "#!/bin/bash\n# Deploys the current build to staging\necho hi\n",
        );

        let discovery = ScriptDiscovery::new(vec![dir.path().to_path_buf()]);
        let info = discovery.get_script_info(&path);
        assert_eq!(
            info.description.as_deref(),
            Some("Deploys the current build to staging")
        );
    }

    #[test]
    fn interpreter_for_known_extensions() {
        assert_eq!(
            interpreter_for(Path::new("x.py")),
            Some(vec!["python".to_string()])
        );
        assert_eq!(interpreter_for(Path::new("x.ts")), Some(vec!["npx".to_string(), "tsx".to_string()]));
        assert_eq!(interpreter_for(Path::new("x.bin")), None);
    }
}

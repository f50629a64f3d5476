//! Change-set provider. Restricts the runnable set to lines touched by a
//! diff: mutants on unchanged lines are skipped no matter their coverage.
//! The set is built either from `git diff -U0` against a base ref or from
//! a saved patch file; without either, every line counts as changed.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::process::Command;

use regex::Regex;

use crate::error::{GomutError, Result};

#[derive(Debug)]
pub enum Changes {
    /// No diff configured: the whole tree counts as changed.
    All,
    Set(HashMap<String, HashSet<usize>>),
}

impl Changes {
    pub fn all() -> Changes {
        Changes::All
    }

    /// Parses unified diff text into per-file changed-line sets. Only the
    /// post-image side matters, so hunk headers contribute their `+`
    /// ranges and pure deletions contribute nothing.
    pub fn from_patch(patch: &str) -> Result<Changes> {
        let file_pattern = Regex::new(r"^\+\+\+ (?:b/)?(.+)$")?;
        let hunk_pattern = Regex::new(r"@@.*\+(\d+)(?:,(\d+))?.*@@")?;

        let mut set: HashMap<String, HashSet<usize>> = HashMap::new();
        let mut current: Option<String> = None;

        for line in patch.lines() {
            if let Some(captures) = file_pattern.captures(line) {
                let path = captures[1].trim().to_string();
                if path == "/dev/null" {
                    current = None;
                } else {
                    set.entry(path.clone()).or_default();
                    current = Some(path);
                }
                continue;
            }
            if !line.starts_with("@@") {
                continue;
            }
            if let (Some(file), Some(captures)) = (&current, hunk_pattern.captures(line)) {
                let start: usize = captures[1]
                    .parse()
                    .map_err(|_| GomutError::Git("invalid line number in diff".to_string()))?;
                let count: usize = match captures.get(2) {
                    Some(m) => m
                        .as_str()
                        .parse()
                        .map_err(|_| GomutError::Git("invalid line count in diff".to_string()))?,
                    None => 1,
                };
                if let Some(lines) = set.get_mut(file) {
                    lines.extend(start..start + count);
                }
            }
        }

        Ok(Changes::Set(set))
    }

    /// Runs `git diff -U0 <base>` in the repository root and parses the
    /// output.
    pub fn from_git(base: &str, repo_root: &Path) -> Result<Changes> {
        let output = Command::new("git")
            .args(["diff", "-U0", base])
            .current_dir(repo_root)
            .output()
            .map_err(|e| GomutError::Git(format!("failed to execute git: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GomutError::Git(format!("git diff failed: {stderr}")));
        }

        let stdout = std::str::from_utf8(&output.stdout)
            .map_err(|e| GomutError::Git(format!("invalid UTF-8 in git output: {e}")))?;

        Changes::from_patch(stdout)
    }

    /// Re-keys the set with `prefix` removed, so repo-root-relative diff
    /// paths line up with calling-dir-relative file names.
    pub fn stripped(self, prefix: &str) -> Changes {
        let dir = prefix.trim_start_matches("./").trim_end_matches('/');
        if dir.is_empty() || dir == "." {
            return self;
        }
        match self {
            Changes::All => Changes::All,
            Changes::Set(set) => Changes::Set(
                set.into_iter()
                    .map(|(path, lines)| match path.strip_prefix(&format!("{dir}/")) {
                        Some(rest) => (rest.to_string(), lines),
                        None => (path, lines),
                    })
                    .collect(),
            ),
        }
    }

    pub fn is_changed(&self, file: &str, line: usize) -> bool {
        match self {
            Changes::All => true,
            Changes::Set(set) => set.get(file).is_some_and(|lines| lines.contains(&line)),
        }
    }
}

//! Coverage provider. Parses the Go cover-profile format and answers
//! whether a source position sits inside a covered statement block. When
//! the caller has no profile at hand, one can be generated by running the
//! test suite with `-coverprofile`.

use std::collections::HashMap;
use std::path::Path;
use std::process::Command;

use regex::Regex;

use crate::error::{GomutError, Result};
use crate::syntax::Position;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Block {
    start_line: usize,
    start_col: usize,
    end_line: usize,
    end_col: usize,
    count: usize,
}

impl Block {
    fn contains(&self, line: usize, column: usize) -> bool {
        let after_start =
            line > self.start_line || (line == self.start_line && column >= self.start_col);
        let before_end = line < self.end_line || (line == self.end_line && column <= self.end_col);

        after_start && before_end
    }
}

/// Statement-level coverage, keyed by file path relative to the calling
/// directory.
#[derive(Debug, Default)]
pub struct Profile {
    blocks: HashMap<String, Vec<Block>>,
}

impl Profile {
    pub fn empty() -> Profile {
        Profile::default()
    }

    /// Parses cover-profile content. Paths in the profile are
    /// module-qualified (`module/pkg/file.go:…`); they are stored
    /// relative to the calling directory so positions can be looked up
    /// directly.
    pub fn parse(content: &str, module_name: &str, calling_dir: &str) -> Result<Profile> {
        // file.go:line.col,line.col numstmt count
        let line_pattern = Regex::new(r"^(.+):(\d+)\.(\d+),(\d+)\.(\d+) (\d+) (\d+)$")?;

        let mut blocks: HashMap<String, Vec<Block>> = HashMap::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("mode:") {
                continue;
            }
            let captures = line_pattern
                .captures(line)
                .ok_or_else(|| GomutError::Coverage(format!("malformed profile line: {line}")))?;

            let file = relativize(&captures[1], module_name, calling_dir);
            let block = Block {
                start_line: parse_field(&captures[2])?,
                start_col: parse_field(&captures[3])?,
                end_line: parse_field(&captures[4])?,
                end_col: parse_field(&captures[5])?,
                count: parse_field(&captures[7])?,
            };
            blocks.entry(file).or_default().push(block);
        }

        Ok(Profile { blocks })
    }

    pub fn from_file(path: &Path, module_name: &str, calling_dir: &str) -> Result<Profile> {
        let content = std::fs::read_to_string(path)?;
        Profile::parse(&content, module_name, calling_dir)
    }

    /// Runs `go test ./... -coverprofile` in the calling directory and
    /// parses the result.
    pub fn generate(
        go_program: &str,
        dir: &Path,
        module_name: &str,
        calling_dir: &str,
    ) -> Result<Profile> {
        let profile_file = tempfile::Builder::new()
            .prefix("gomut-cover-")
            .suffix(".out")
            .tempfile()?;

        let output = Command::new(go_program)
            .arg("test")
            .arg("./...")
            .arg(format!("-coverprofile={}", profile_file.path().display()))
            .current_dir(dir)
            .output()
            .map_err(|e| GomutError::Command(format!("failed to run {go_program} test: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GomutError::Command(format!(
                "coverage run failed: {stderr}"
            )));
        }

        Profile::from_file(profile_file.path(), module_name, calling_dir)
    }

    pub fn is_covered(&self, pos: &Position) -> bool {
        self.blocks
            .get(&pos.file)
            .is_some_and(|blocks| {
                blocks
                    .iter()
                    .any(|b| b.count > 0 && b.contains(pos.line, pos.column))
            })
    }
}

fn parse_field(s: &str) -> Result<usize> {
    s.parse()
        .map_err(|_| GomutError::Coverage(format!("invalid number in profile: {s}")))
}

fn relativize(path: &str, module_name: &str, calling_dir: &str) -> String {
    let mut rest = path;
    if let Some(stripped) = rest.strip_prefix(&format!("{module_name}/")) {
        rest = stripped;
    }
    let dir = calling_dir.trim_start_matches("./").trim_end_matches('/');
    if !dir.is_empty() && dir != "." {
        if let Some(stripped) = rest.strip_prefix(&format!("{dir}/")) {
            rest = stripped;
        }
    }

    rest.to_string()
}

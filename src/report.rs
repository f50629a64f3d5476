//! Result aggregation. Consumes the execution stream, surfaces each
//! lived mutant once per `(file, line)` as a review comment, and writes
//! `comments.json` for the reporting pipeline.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::mutants::{Mutant, Status};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub body: String,
    pub path: String,
    pub line: usize,
    pub side: String,
}

pub struct Results {
    pub module: String,
    pub elapsed: Duration,
    pub mutants: Vec<Mutant>,
}

/// Deduplicates lived findings per source site. Later lived mutants at an
/// already-surfaced `(file, line)` stay in the report but produce no
/// further comment.
#[derive(Default)]
pub struct Aggregator {
    surfaced: HashMap<String, HashSet<usize>>,
    comments: Vec<Comment>,
}

impl Aggregator {
    pub fn new() -> Aggregator {
        Aggregator::default()
    }

    pub fn observe(&mut self, mutant: &Mutant) {
        if mutant.status != Status::Lived {
            return;
        }
        let pos = mutant.position();
        let lines = self.surfaced.entry(pos.file.clone()).or_default();
        if lines.insert(pos.line) {
            self.comments.push(Comment {
                body: comment_body(mutant),
                path: pos.file.clone(),
                line: pos.line,
                side: "RIGHT".to_string(),
            });
        }
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }
}

fn comment_body(mutant: &Mutant) -> String {
    format!(
        "Changing the code like shown below does not cause any tests exercising them to fail.\n\
         Consider adding tests that fail when the code is mutated.\n\n\
         ```diff\n{}\n```",
        mutant.diff()
    )
}

/// Writes the comment array with four-space indentation. A marshalling
/// or write failure here is fatal to the run.
pub fn write_comments(path: &Path, comments: &[Comment]) -> Result<()> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    comments.serialize(&mut serializer)?;
    fs::write(path, buf)?;

    Ok(())
}

/// Status counts for the closing summary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub killed: usize,
    pub lived: usize,
    pub timed_out: usize,
    pub not_viable: usize,
    pub not_covered: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl Summary {
    pub fn of(mutants: &[Mutant]) -> Summary {
        let mut summary = Summary {
            total: mutants.len(),
            ..Summary::default()
        };
        for mutant in mutants {
            match mutant.status {
                Status::Killed => summary.killed += 1,
                Status::Lived => summary.lived += 1,
                Status::TimedOut => summary.timed_out += 1,
                Status::NotViable => summary.not_viable += 1,
                Status::NotCovered => summary.not_covered += 1,
                Status::Skipped => summary.skipped += 1,
                Status::Error => summary.errors += 1,
                Status::Runnable => {}
            }
        }
        summary
    }

    /// Share of tested mutants the suite caught.
    pub fn efficacy(&self) -> f64 {
        let tested = self.killed + self.lived;
        if tested == 0 {
            return 0.0;
        }
        self.killed as f64 / tested as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn comment(path: &str, line: usize) -> Comment {
        Comment {
            body: "body".to_string(),
            path: path.to_string(),
            line,
            side: "RIGHT".to_string(),
        }
    }

    #[test]
    fn comments_are_written_with_four_space_indent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("comments.json");

        write_comments(&path, &[comment("demo.go", 4)]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n    {"), "got: {text}");
        assert!(text.contains("\n        \"body\""), "got: {text}");

        let parsed: Vec<Comment> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].side, "RIGHT");
    }

    #[test]
    fn empty_comment_list_is_an_empty_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("comments.json");

        write_comments(&path, &[]).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }

    #[test]
    fn efficacy_counts_killed_over_tested() {
        let summary = Summary {
            total: 10,
            killed: 3,
            lived: 1,
            not_covered: 6,
            ..Summary::default()
        };
        assert_eq!(summary.efficacy(), 0.75);
    }

    #[test]
    fn efficacy_of_nothing_tested_is_zero() {
        assert_eq!(Summary::default().efficacy(), 0.0);
    }
}

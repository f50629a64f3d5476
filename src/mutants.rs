//! Mutant lifecycle. A mutant owns a single reversible edit over a
//! source file whose canonical text is shared among every mutant of that
//! file. Since the text is shared, at most one mutation may be applied to
//! a file at a time: a process-wide registry keeps one lock per filename,
//! and the worker holds it for the whole apply/test/rollback cycle.
//! Locks for different files are independent, so mutations on different
//! files proceed in parallel.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use serde::{Deserialize, Serialize};
use similar::TextDiff;

use crate::error::Result;
use crate::operators::MutatorKind;
use crate::syntax::{Position, Span};

/// The reversible edit a catalogue operator produces: splice
/// `replacement` over `span`, or splice `original` back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub span: Span,
    pub original: String,
    pub replacement: String,
    pub position: Position,
}

impl Mutation {
    pub fn apply(&self, text: &mut String) {
        text.replace_range(self.span.start..self.span.end, &self.replacement);
    }

    pub fn reset(&self, text: &mut String) {
        let end = self.span.start + self.replacement.len();
        text.replace_range(self.span.start..end, &self.original);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    NotCovered,
    Skipped,
    Runnable,
    Lived,
    Killed,
    NotViable,
    TimedOut,
    Error,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::NotCovered => "NOT COVERED",
            Status::Skipped => "SKIPPED",
            Status::Runnable => "RUNNABLE",
            Status::Lived => "LIVED",
            Status::Killed => "KILLED",
            Status::NotViable => "NOT VIABLE",
            Status::TimedOut => "TIMED OUT",
            Status::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate code change plus its execution bookkeeping.
pub struct Mutant {
    pub kind: MutatorKind,
    pub package: String,
    pub status: Status,
    mutation: Mutation,
    text: Arc<Mutex<String>>,
    workdir: PathBuf,
    orig_file: Vec<u8>,
    diff: String,
    pub test_exec_error: Option<String>,
}

impl Mutant {
    pub fn new(
        kind: MutatorKind,
        package: String,
        mutation: Mutation,
        text: Arc<Mutex<String>>,
    ) -> Mutant {
        Mutant {
            kind,
            package,
            status: Status::default(),
            mutation,
            text,
            workdir: PathBuf::new(),
            orig_file: Vec::new(),
            diff: String::new(),
            test_exec_error: None,
        }
    }

    pub fn position(&self) -> &Position {
        &self.mutation.position
    }

    pub fn mutation(&self) -> &Mutation {
        &self.mutation
    }

    pub fn diff(&self) -> &str {
        &self.diff
    }

    /// Sets the base path under which apply and rollback operate. By
    /// default that is the tree the analysis ran on; pointing it at a
    /// copy keeps the original sources untouched.
    pub fn set_workdir(&mut self, path: impl Into<PathBuf>) {
        self.workdir = path.into();
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// The per-file lock callers must hold across apply, the test run and
    /// rollback.
    pub fn lock(&self) -> Arc<Mutex<()>> {
        file_lock(&self.mutation.position.file)
    }

    /// Writes the mutated file to disk. The pre-edit bytes are kept on
    /// the mutant for rollback; the shared buffer is returned to
    /// canonical form before this returns, while the on-disk file keeps
    /// the mutation for the test run.
    pub fn apply(&mut self) -> Result<()> {
        let target = self.workdir.join(&self.mutation.position.file);
        self.orig_file = fs::read(&target)?;

        let mut text = self.text.lock().unwrap();

        // Sibling copy of the pre-edit emission, diffed against the
        // mutated file below.
        let copy_orig = copy_orig_path(&target);
        fs::write(&copy_orig, text.as_bytes())?;

        self.mutation.apply(&mut text);
        fs::write(&target, text.as_bytes())?;
        self.mutation.reset(&mut text);
        drop(text);

        let original = fs::read_to_string(&copy_orig)?;
        let mutated = fs::read_to_string(&target)?;
        self.diff = unified_diff(&original, &mutated);

        fs::remove_file(&copy_orig)?;

        Ok(())
    }

    /// Puts the original file back and drops the retained bytes.
    pub fn rollback(&mut self) -> Result<()> {
        // Nothing was read (or a rollback already ran): a Go file is
        // never empty, so an empty buffer means there is nothing to
        // restore.
        if self.orig_file.is_empty() {
            return Ok(());
        }
        let target = self.workdir.join(&self.mutation.position.file);
        let written = fs::write(&target, &self.orig_file);
        self.orig_file = Vec::new();
        written?;

        Ok(())
    }
}

fn copy_orig_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".copy.orig");
    PathBuf::from(name)
}

fn unified_diff(original: &str, mutated: &str) -> String {
    TextDiff::from_lines(original, mutated)
        .unified_diff()
        .context_radius(3)
        .header("Original", "New")
        .to_string()
}

static FILE_LOCKS: OnceLock<Mutex<HashMap<String, Arc<Mutex<()>>>>> = OnceLock::new();

/// Process-wide lock registry, one entry per filename. Entries are
/// created on first use and never removed; the table is bounded by the
/// number of source files.
pub fn file_lock(filename: &str) -> Arc<Mutex<()>> {
    let registry = FILE_LOCKS.get_or_init(|| Mutex::new(HashMap::new()));
    let mut map = registry.lock().unwrap();
    map.entry(filename.to_string()).or_default().clone()
}

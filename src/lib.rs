//! # gomut
//!
//! A mutation testing engine for Go projects.
//!
//! The engine walks a module's syntax trees for spots where a small,
//! behaviour-changing edit can be applied, prunes arid code and
//! candidates outside the covered/changed set, then applies each
//! surviving mutation to an isolated copy of the tree, runs `go test`
//! against it, and reports the mutants the suite failed to kill.

pub mod arid;
pub mod changes;
pub mod copy_tree;
pub mod coverage;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod exclusion;
pub mod mutants;
pub mod operators;
pub mod output;
pub mod report;
pub mod runner;
pub mod syntax;
pub mod workerpool;

pub use error::{GomutError, Result};

/// Whether a path is a mutable Go source file. Test files are never
/// mutated.
pub fn is_go_source(path: &std::path::Path) -> bool {
    let is_go = path.extension().and_then(|e| e.to_str()) == Some("go");
    let is_test = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with("_test.go"));

    is_go && !is_test
}

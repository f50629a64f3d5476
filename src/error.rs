use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GomutError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse {0}")]
    Parse(PathBuf),

    #[error("Git command failed: {0}")]
    Git(String),

    #[error("command execution failed: {0}")]
    Command(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("coverage profile error: {0}")]
    Coverage(String),

    #[error("no go.mod found under {0}")]
    MissingGoMod(PathBuf),

    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("walkdir error: {0}")]
    Walkdir(#[from] walkdir::Error),

    #[error("grammar error: {0}")]
    Grammar(#[from] tree_sitter::LanguageError),

    #[error("other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, GomutError>;

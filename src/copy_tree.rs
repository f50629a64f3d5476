//! Isolated working tree. The module is copied into a session temp
//! directory before any mutation is applied, so the original sources are
//! never touched; the copy disappears with the session.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

const SKIP_NAMES: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    ".idea",
    ".vscode",
    "comments.json",
];

const SKIP_SUFFIXES: &[&str] = &[".copy.orig"];

pub struct WorkTree {
    pub root: PathBuf,
    _temp_dir: TempDir,
}

fn should_skip(name: &str) -> bool {
    SKIP_NAMES.iter().any(|s| *s == name) || SKIP_SUFFIXES.iter().any(|s| name.ends_with(s))
}

fn copy_dir_filtered(src: &Path, dst: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let name = entry.file_name();
        let name_str = name.to_string_lossy();
        if should_skip(&name_str) {
            continue;
        }
        let src_path = entry.path();
        let dst_path = dst.join(&name);
        let ft = entry.file_type()?;
        if ft.is_dir() {
            copy_dir_filtered(&src_path, &dst_path)?;
        } else if ft.is_file() {
            fs::copy(&src_path, &dst_path)?;
        }
        // Skip symlinks and other special files
    }
    Ok(())
}

/// Copies the module tree into a fresh temp directory tagged with the
/// session id.
pub fn create(module_root: &Path, session_id: &str) -> std::io::Result<WorkTree> {
    let temp_dir = tempfile::Builder::new()
        .prefix(&format!("gomut-{}-", session_id))
        .tempdir()?;

    copy_dir_filtered(module_root, temp_dir.path())?;

    Ok(WorkTree {
        root: temp_dir.path().to_path_buf(),
        _temp_dir: temp_dir,
    })
}

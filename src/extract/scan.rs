//! Discovery of Python files below a root directory.

use crate::error::{ExtractError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// All `**/*.py` files under `root` whose root-relative path starts with
/// `prefix`, sorted.
pub fn module_files(root: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/**/*.py",
        glob::Pattern::escape(&root.to_string_lossy())
    );
    // Hidden directories such as `.venv` and `.tox` are not descended into.
    let options = glob::MatchOptions {
        require_literal_leading_dot: true,
        ..Default::default()
    };
    let entries = glob::glob_with(&pattern, options)
        .map_err(|e| ExtractError::io(root, std::io::Error::new(std::io::ErrorKind::InvalidInput, e)))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            ExtractError::io(path, std::io::Error::from(e))
        })?;
        let relative = path.strip_prefix(root).unwrap_or(&path);
        if relative.to_string_lossy().starts_with(prefix) {
            files.push(path);
        }
    }
    files.sort();

    debug!("Found {} module files under {}", files.len(), root.display());
    Ok(files)
}

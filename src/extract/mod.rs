//! Tool extraction entry points.
//!
//! Every call parses the source afresh and builds new walk state, so results
//! depend only on the input text and the options.

mod collector;
pub mod docstring;
pub mod scan;

pub use docstring::{docstring_summary, extract_docstring};
pub use scan::module_files;

use crate::error::{ExtractError, Result};
use crate::syntax::SourceTree;
use crate::types::{ExtractOptions, ToolSpec};
use collector::Collector;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Extracts tool specifications from Python sources.
#[derive(Debug, Clone, Default)]
pub struct ToolExtractor {
    options: ExtractOptions,
}

impl ToolExtractor {
    pub fn new(options: ExtractOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Tools for every module-level function and class method in `source`.
    pub fn extract_from_text(&self, source: &str) -> Result<Vec<ToolSpec>> {
        let tree = SourceTree::parse(source)?;
        let tools = Collector::new(source, &self.options).collect(tree.root());
        debug!("Extracted {} tools", tools.len());
        Ok(tools)
    }

    /// Read `path` as UTF-8 and extract from its contents.
    pub fn extract_from_file(&self, path: impl AsRef<Path>) -> Result<Vec<ToolSpec>> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| ExtractError::io(path, e))?;
        let tools = self.extract_from_text(&source)?;
        if self.options.debug {
            info!("Extracted {} tools from {}", tools.len(), path.display());
        }
        Ok(tools)
    }

    /// Extract every file in order; the first failure aborts.
    pub fn extract_from_files(&self, paths: &[PathBuf]) -> Result<Vec<(PathBuf, Vec<ToolSpec>)>> {
        paths
            .iter()
            .map(|path| Ok((path.clone(), self.extract_from_file(path)?)))
            .collect()
    }
}

/// [`ToolExtractor::extract_from_text`] with default options.
pub fn extract_from_text(source: &str) -> Result<Vec<ToolSpec>> {
    ToolExtractor::default().extract_from_text(source)
}

/// [`ToolExtractor::extract_from_file`] with default options.
pub fn extract_from_file(path: impl AsRef<Path>) -> Result<Vec<ToolSpec>> {
    ToolExtractor::default().extract_from_file(path)
}

//! Agentix: static tool-schema extraction for Python sources.
//!
//! Discovers module-level functions and class methods, decodes their
//! docstrings and turns their annotations into JSON-Schema fragments, ready
//! to be offered to a language model as function-calling tools.

pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod schema;
pub mod syntax;
pub mod types;

pub use error::{ExtractError, Result};
pub use export::{render_tools_block, to_tool_calling_format, FunctionTool, ToolDefinition};
pub use extract::{extract_from_file, extract_from_text, ToolExtractor};
pub use types::{ExtractOptions, ParamKind, ToolSpec, UnresolvedDefaults};

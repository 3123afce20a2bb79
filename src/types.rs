//! Shared types used across the extractor.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// ---------------------------------------------------------------------------
// Tool specifications
// ---------------------------------------------------------------------------

/// One discovered callable, described for function-calling integration.
///
/// Created during a single extraction call and handed straight to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Bare identifier of the definition.
    pub name: String,
    /// First non-blank line of the docstring.
    pub description: Option<String>,
    /// Full decoded docstring.
    pub docstring: Option<String>,
    /// `{"type": "object", "properties": {...}, "additionalProperties": false, "required"?: [...]}`
    pub parameters_schema: Value,
    /// Schema fragment for the return annotation, if there is one.
    pub returns: Option<Value>,
    /// Enclosing class names plus `name`, dot-joined.
    pub qualified_name: String,
    pub is_method: bool,
    /// Nearest enclosing class.
    pub class_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// How a parameter binds at the call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    PositionalOnly,
    PositionalOrKeyword,
    VarArgs,
    KeywordOnly,
    VarKwargs,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PositionalOnly => write!(f, "positional_only"),
            Self::PositionalOrKeyword => write!(f, "positional_or_keyword"),
            Self::VarArgs => write!(f, "var_args"),
            Self::KeywordOnly => write!(f, "keyword_only"),
            Self::VarKwargs => write!(f, "var_kwargs"),
        }
    }
}

impl ParamKind {
    /// `*args` and `**kwargs` are never required.
    pub fn is_variadic(self) -> bool {
        matches!(self, Self::VarArgs | Self::VarKwargs)
    }
}

/// A resolved parameter, ready to be placed into a parameters schema.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ToolParam {
    pub name: String,
    pub schema: Value,
    pub default: Option<Value>,
    pub kind: ParamKind,
    pub required: bool,
}

// ---------------------------------------------------------------------------
// Extraction options
// ---------------------------------------------------------------------------

/// What to emit as `default` when a default value is not a plain literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedDefaults {
    /// Pass the raw source text through as a string.
    #[default]
    Raw,
    /// Wrap the raw source text as `{"unresolved": "<text>"}`.
    Tagged,
}

/// Knobs for a single extraction run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Log every visited definition at `info` instead of `trace`.
    pub debug: bool,

    /// Docstring characters used by the exporter when there is no summary line.
    pub description_limit: usize,

    /// Policy for defaults that do not evaluate as literals.
    pub unresolved_defaults: UnresolvedDefaults,

    /// Keep the first parameter of `@staticmethod` methods.
    pub respect_staticmethod: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            debug: false,
            description_limit: 300,
            unresolved_defaults: UnresolvedDefaults::Raw,
            respect_staticmethod: true,
        }
    }
}

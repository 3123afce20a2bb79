//! Python source parsing on top of tree-sitter.
//!
//! Everything downstream works on byte ranges into the original text, so
//! annotations and defaults keep their exact source spelling.

pub mod inspect;

use crate::error::{ExtractError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use tree_sitter::{Node, Parser, Tree};

/// Deepest syntax tree accepted; walks over the tree recurse per level.
const MAX_TREE_DEPTH: usize = 1000;

/// A parsed module together with the text it was parsed from.
pub struct SourceTree<'s> {
    source: &'s str,
    tree: Tree,
}

impl<'s> SourceTree<'s> {
    /// Parse `source`, failing on the first error or missing node.
    pub fn parse(source: &'s str) -> Result<Self> {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_python::LANGUAGE.into())?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| ExtractError::syntax(1, 1, "parser produced no tree"))?;

        let root = tree.root_node();
        if root.has_error() {
            let (line, column, message) = match first_error(root) {
                Some(node) if node.is_missing() => {
                    let pos = node.start_position();
                    (pos.row + 1, pos.column + 1, format!("missing `{}`", node.kind()))
                }
                Some(node) => {
                    let pos = node.start_position();
                    let snippet: String = source[node.byte_range()].chars().take(40).collect();
                    (pos.row + 1, pos.column + 1, format!("unexpected `{}`", snippet.trim()))
                }
                None => (1, 1, "invalid syntax".to_string()),
            };
            debug!("Parse failed at {}:{}: {}", line, column, message);
            return Err(ExtractError::syntax(line, column, message));
        }

        if let Some(node) = first_too_deep(root, MAX_TREE_DEPTH) {
            let pos = node.start_position();
            debug!("Parse rejected at {}:{}: nesting too deep", pos.row + 1, pos.column + 1);
            return Err(ExtractError::syntax(
                pos.row + 1,
                pos.column + 1,
                format!("nesting deeper than {} levels", MAX_TREE_DEPTH),
            ));
        }

        Ok(Self { source, tree })
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn source(&self) -> &'s str {
        self.source
    }

    /// Exact source text covered by `node`.
    pub fn text(&self, node: Node<'_>) -> &'s str {
        &self.source[node.byte_range()]
    }
}

/// Depth-first search for the first erroneous or missing node.
fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if node.has_error() && cursor.goto_first_child() {
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}

/// First node, in document order, sitting more than `limit` levels below
/// `root`.
fn first_too_deep(root: Node<'_>, limit: usize) -> Option<Node<'_>> {
    let mut cursor = root.walk();
    let mut depth = 0usize;
    loop {
        if cursor.goto_first_child() {
            depth += 1;
            if depth > limit {
                return Some(cursor.node());
            }
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return None;
            }
            depth -= 1;
        }
    }
}

pub(crate) fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

/// Source span of a node: 1-based lines, 0-based columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePosition {
    pub lineno: usize,
    pub col_offset: usize,
    pub end_lineno: usize,
    pub end_col_offset: usize,
}

impl NodePosition {
    pub fn of(node: Node<'_>) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        Self {
            lineno: start.row + 1,
            col_offset: start.column,
            end_lineno: end.row + 1,
            end_col_offset: end.column,
        }
    }
}

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// Identifier of a `function_definition` or `class_definition`.
pub fn definition_name<'s>(node: Node<'_>, source: &'s str) -> Option<&'s str> {
    node.child_by_field_name("name")
        .map(|name| &source[name.byte_range()])
}

/// Unwrap a `decorated_definition` to the definition it decorates.
pub fn undecorated(node: Node<'_>) -> Node<'_> {
    if node.kind() == "decorated_definition" {
        node.child_by_field_name("definition").unwrap_or(node)
    } else {
        node
    }
}

/// Decorator expressions attached to a definition, without the leading `@`.
pub fn decorators<'s>(definition: Node<'_>, source: &'s str) -> Vec<&'s str> {
    let Some(parent) = definition.parent() else {
        return Vec::new();
    };
    if parent.kind() != "decorated_definition" {
        return Vec::new();
    }
    named_children(parent)
        .into_iter()
        .filter(|n| n.kind() == "decorator")
        .map(|n| source[n.byte_range()].trim_start_matches('@').trim())
        .collect()
}

/// Definitions (functions and classes) placed directly in a `block`.
pub fn direct_definitions(block: Node<'_>) -> Vec<Node<'_>> {
    named_children(block)
        .into_iter()
        .map(undecorated)
        .filter(|n| matches!(n.kind(), "function_definition" | "class_definition"))
        .collect()
}

/// First statement of a definition body, skipping comments.
pub fn first_statement(definition: Node<'_>) -> Option<Node<'_>> {
    let body = definition.child_by_field_name("body")?;
    named_children(body)
        .into_iter()
        .find(|n| n.kind() != "comment")
}

/// Return annotation source text, if any.
pub fn return_annotation<'s>(function: Node<'_>, source: &'s str) -> Option<&'s str> {
    function
        .child_by_field_name("return_type")
        .map(|n| &source[n.byte_range()])
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// A parameter as written: name plus annotation/default source text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawParam {
    pub name: String,
    pub annotation: Option<String>,
    pub default: Option<String>,
}

impl RawParam {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Parameter list split into its call-binding groups, each in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters {
    pub positional_only: Vec<RawParam>,
    pub positional: Vec<RawParam>,
    pub var_args: Option<RawParam>,
    pub keyword_only: Vec<RawParam>,
    pub var_kwargs: Option<RawParam>,
}

impl Parameters {
    fn push(&mut self, param: RawParam, keyword_only: bool) {
        if keyword_only {
            self.keyword_only.push(param);
        } else {
            self.positional.push(param);
        }
    }

    /// Total number of declared parameters.
    pub fn len(&self) -> usize {
        self.positional_only.len()
            + self.positional.len()
            + self.keyword_only.len()
            + usize::from(self.var_args.is_some())
            + usize::from(self.var_kwargs.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decode the `parameters` field of a `function_definition`.
pub fn parameters(function: Node<'_>, source: &str) -> Parameters {
    let mut out = Parameters::default();
    let Some(list) = function.child_by_field_name("parameters") else {
        return out;
    };

    let text = |n: Node<'_>| source[n.byte_range()].to_string();
    let mut keyword_only = false;

    for child in named_children(list) {
        match child.kind() {
            "comment" => {}
            "positional_separator" => {
                let before = std::mem::take(&mut out.positional);
                out.positional_only.extend(before);
            }
            "keyword_separator" => keyword_only = true,
            "identifier" => out.push(RawParam::new(text(child)), keyword_only),
            "list_splat_pattern" => {
                out.var_args = Some(RawParam::new(splat_name(child, source)));
                keyword_only = true;
            }
            "dictionary_splat_pattern" => {
                out.var_kwargs = Some(RawParam::new(splat_name(child, source)));
            }
            "typed_parameter" => {
                let annotation = child.child_by_field_name("type").map(text);
                let Some(target) = named_children(child)
                    .into_iter()
                    .find(|n| !matches!(n.kind(), "type" | "comment"))
                else {
                    continue;
                };
                let mut param = match target.kind() {
                    "list_splat_pattern" | "dictionary_splat_pattern" => {
                        RawParam::new(splat_name(target, source))
                    }
                    _ => RawParam::new(text(target)),
                };
                param.annotation = annotation;
                match target.kind() {
                    "list_splat_pattern" => {
                        out.var_args = Some(param);
                        keyword_only = true;
                    }
                    "dictionary_splat_pattern" => out.var_kwargs = Some(param),
                    _ => out.push(param, keyword_only),
                }
            }
            "default_parameter" | "typed_default_parameter" => {
                let Some(name) = child.child_by_field_name("name") else {
                    continue;
                };
                let param = RawParam {
                    name: text(name),
                    annotation: child.child_by_field_name("type").map(text),
                    default: child.child_by_field_name("value").map(text),
                };
                out.push(param, keyword_only);
            }
            other => trace!("Skipping parameter node of kind {}", other),
        }
    }

    out
}

/// Name bound by `*name` / `**name`.
fn splat_name(node: Node<'_>, source: &str) -> String {
    match named_children(node).first() {
        Some(inner) => source[inner.byte_range()].to_string(),
        None => source[node.byte_range()].trim_start_matches('*').to_string(),
    }
}

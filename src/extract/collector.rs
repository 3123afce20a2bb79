//! Depth-aware walk that turns definitions into [`ToolSpec`]s.
//!
//! Only definitions that are not nested inside another definition become
//! tools: module-level functions and methods of (possibly nested) classes.
//! Inner functions are still walked so deeper nesting is tracked correctly.

use super::docstring::{docstring_summary, extract_docstring};
use crate::schema::{build_parameters_schema, resolve};
use crate::syntax::{decorators, definition_name, named_children, parameters, return_annotation};
use crate::types::{ExtractOptions, ToolSpec};
use tracing::{info, trace};
use tree_sitter::Node;

/// Walk state for one extraction call. Never reused.
pub(crate) struct Collector<'s, 'o> {
    source: &'s str,
    options: &'o ExtractOptions,
    classes: Vec<String>,
    tools: Vec<ToolSpec>,
}

impl<'s, 'o> Collector<'s, 'o> {
    pub(crate) fn new(source: &'s str, options: &'o ExtractOptions) -> Self {
        Self {
            source,
            options,
            classes: Vec::new(),
            tools: Vec::new(),
        }
    }

    /// Walk the whole tree under `root`, returning tools in document order.
    pub(crate) fn collect(mut self, root: Node<'_>) -> Vec<ToolSpec> {
        self.walk(root, 0);
        self.tools
    }

    fn walk(&mut self, node: Node<'_>, depth: usize) {
        match node.kind() {
            "class_definition" => {
                let name = definition_name(node, self.source).unwrap_or_default();
                self.classes.push(name.to_string());
                self.walk_children(node, depth);
                self.classes.pop();
            }
            "function_definition" => {
                if depth == 0 {
                    let spec = self.build_spec(node);
                    self.tools.push(spec);
                } else if self.options.debug {
                    info!(
                        "Skipping nested definition {:?} at depth {}",
                        definition_name(node, self.source),
                        depth
                    );
                }
                self.walk_children(node, depth + 1);
            }
            _ => self.walk_children(node, depth),
        }
    }

    fn walk_children(&mut self, node: Node<'_>, depth: usize) {
        for child in named_children(node) {
            self.walk(child, depth);
        }
    }

    fn build_spec(&self, node: Node<'_>) -> ToolSpec {
        let source = self.source;
        let name = definition_name(node, source).unwrap_or_default().to_string();
        let is_method = !self.classes.is_empty();
        let qualified_name = if is_method {
            format!("{}.{}", self.classes.join("."), name)
        } else {
            name.clone()
        };

        if self.options.debug {
            info!("Visiting function: {}", qualified_name);
        } else {
            trace!("Visiting function: {}", qualified_name);
        }

        let docstring = extract_docstring(node, source);
        let description = docstring_summary(docstring.as_deref());

        let is_static = self.options.respect_staticmethod
            && decorators(node, source).contains(&"staticmethod");
        let parameters_schema = build_parameters_schema(
            &parameters(node, source),
            is_method && !is_static,
            self.options.unresolved_defaults,
        );

        ToolSpec {
            name,
            description,
            docstring,
            parameters_schema,
            returns: return_annotation(node, source).map(resolve),
            qualified_name,
            is_method,
            class_name: self.classes.last().cloned(),
        }
    }
}

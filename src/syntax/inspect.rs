//! Structural queries over a parsed module, plus class decorator insertion.

use super::{
    decorators, definition_name, direct_definitions, named_children, return_annotation,
    NodePosition, SourceTree,
};
use crate::error::{ExtractError, Result};
use serde::Serialize;
use tracing::debug;
use tree_sitter::Node;

/// A class found by [`module_classes_implementing`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassInfo {
    pub name: String,
    /// Methods defined directly in the class body, in source order.
    pub methods: Vec<String>,
    pub position: NodePosition,
}

/// A method found by [`function_defs_in_class`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionInfo {
    pub name: String,
    /// Parameter list as written, parentheses included.
    pub params: String,
    pub returns: Option<String>,
    pub source: String,
    pub position: NodePosition,
}

/// Methods defined at the immediate level of a class body.
fn class_methods<'t>(class: Node<'t>) -> Vec<Node<'t>> {
    class
        .child_by_field_name("body")
        .map(direct_definitions)
        .unwrap_or_default()
        .into_iter()
        .filter(|n| n.kind() == "function_definition")
        .collect()
}

/// Does `class` define every name in `method_names` directly in its body?
pub fn class_implements<S: AsRef<str>>(class: Node<'_>, source: &str, method_names: &[S]) -> bool {
    let defined: Vec<&str> = class_methods(class)
        .into_iter()
        .filter_map(|m| definition_name(m, source))
        .collect();
    method_names
        .iter()
        .all(|wanted| defined.contains(&wanted.as_ref()))
}

/// Top-level classes that implement all of `method_names`.
pub fn module_classes_implementing<S: AsRef<str>>(
    tree: &SourceTree<'_>,
    method_names: &[S],
) -> Vec<ClassInfo> {
    let source = tree.source();
    direct_definitions(tree.root())
        .into_iter()
        .filter(|n| n.kind() == "class_definition")
        .filter(|n| class_implements(*n, source, method_names))
        .filter_map(|class| {
            let name = definition_name(class, source)?;
            Some(ClassInfo {
                name: name.to_string(),
                methods: class_methods(class)
                    .into_iter()
                    .filter_map(|m| definition_name(m, source).map(str::to_string))
                    .collect(),
                position: NodePosition::of(class),
            })
        })
        .collect()
}

/// The wanted methods of the top-level class `class_name`, in source order.
pub fn function_defs_in_class<S: AsRef<str>>(
    tree: &SourceTree<'_>,
    class_name: &str,
    function_names: &[S],
) -> Vec<FunctionInfo> {
    let source = tree.source();
    let Some(class) = direct_definitions(tree.root())
        .into_iter()
        .find(|n| n.kind() == "class_definition" && definition_name(*n, source) == Some(class_name))
    else {
        debug!("Class {} not found at module level", class_name);
        return Vec::new();
    };

    class_methods(class)
        .into_iter()
        .filter_map(|method| {
            let name = definition_name(method, source)?;
            if !function_names.iter().any(|w| w.as_ref() == name) {
                return None;
            }
            Some(FunctionInfo {
                name: name.to_string(),
                params: method
                    .child_by_field_name("parameters")
                    .map(|p| tree.text(p).to_string())
                    .unwrap_or_default(),
                returns: return_annotation(method, source).map(str::to_string),
                source: tree.text(method).to_string(),
                position: NodePosition::of(method),
            })
        })
        .collect()
}

fn collect_classes<'t>(node: Node<'t>, out: &mut Vec<Node<'t>>) {
    if node.kind() == "class_definition" {
        out.push(node);
    }
    for child in named_children(node) {
        collect_classes(child, out);
    }
}

/// Insert `@decorator` above every class named `class_name`.
///
/// The new decorator goes first. Classes that already carry the same
/// decorator text are left alone; all other bytes are preserved.
pub fn add_class_decorator(source: &str, class_name: &str, decorator: &str) -> Result<String> {
    let tree = SourceTree::parse(source)?;
    let decorator = decorator.trim().trim_start_matches('@').trim();
    validate_decorator(decorator)?;

    let mut classes = Vec::new();
    collect_classes(tree.root(), &mut classes);

    let mut inserts = Vec::new();
    for class in classes {
        if definition_name(class, source) != Some(class_name) {
            continue;
        }
        if decorators(class, source).contains(&decorator) {
            debug!("Class {} already decorated with @{}", class_name, decorator);
            continue;
        }
        let anchor = match class.parent() {
            Some(parent) if parent.kind() == "decorated_definition" => parent,
            _ => class,
        };
        let at = anchor.start_byte();
        let line_start = source[..at].rfind('\n').map_or(0, |i| i + 1);
        let indent = &source[line_start..at];
        inserts.push((at, format!("@{}\n{}", decorator, indent)));
    }

    let mut out = source.to_string();
    for (at, text) in inserts.into_iter().rev() {
        out.insert_str(at, &text);
    }
    Ok(out)
}

/// `decorator` must be a single Python expression usable after `@`.
fn validate_decorator(decorator: &str) -> Result<()> {
    let invalid = || ExtractError::syntax(1, 1, format!("invalid decorator `{}`", decorator));
    if decorator.contains(['\n', '\r']) {
        return Err(invalid());
    }
    let stub = format!("@{}\nclass _Decorated:\n    pass\n", decorator);
    let tree = SourceTree::parse(&stub).map_err(|_| invalid())?;
    let parsed = direct_definitions(tree.root());
    match parsed.as_slice() {
        [class] if decorators(*class, &stub) == [decorator] => Ok(()),
        _ => Err(invalid()),
    }
}

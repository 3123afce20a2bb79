//! Conversion of type-annotation source text into JSON-Schema fragments.
//!
//! The grammar is deliberately small: `Optional[T]`, `Union[...]` and `A | B`
//! unions, the sequence/tuple/mapping generics, and plain builtin names.
//! Anything else falls back to `{"type": "string"}`.

use serde_json::{json, Value};
use tracing::trace;

const NAMESPACE_PREFIXES: &[&str] = &[
    "typing_extensions.",
    "typing.",
    "collections.abc.",
    "builtins.",
    "t.",
];

const SEQUENCE_GENERICS: &[&str] = &["List", "list", "Sequence", "Iterable"];
const TUPLE_GENERICS: &[&str] = &["Tuple", "tuple"];
const MAPPING_GENERICS: &[&str] = &["Dict", "dict", "Mapping"];

/// Generic nesting past this depth resolves to a string.
const MAX_TYPE_DEPTH: usize = 64;

/// Schema for an optional annotation; absent annotations are strings.
pub fn resolve_type(annotation: Option<&str>) -> Value {
    annotation.map_or_else(string_schema, resolve)
}

/// Schema for the annotation `text`. Never fails.
pub fn resolve(text: &str) -> Value {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    resolve_compact(&compact, 0)
}

/// `anyOf` over every JSON type, used for unannotated `*args` / `**kwargs`.
pub fn permissive_schema() -> Value {
    json!({
        "anyOf": [
            {"type": "string"},
            {"type": "number"},
            {"type": "boolean"},
            {"type": "object"},
            {"type": "array"},
            {"type": "null"},
        ]
    })
}

/// True for an `anyOf` schema with a `{"type": "null"}` branch.
pub fn is_nullable(schema: &Value) -> bool {
    schema
        .get("anyOf")
        .and_then(Value::as_array)
        .is_some_and(|branches| {
            branches
                .iter()
                .any(|b| b.get("type").and_then(Value::as_str) == Some("null"))
        })
}

fn string_schema() -> Value {
    json!({"type": "string"})
}

fn any_of<'a>(parts: impl IntoIterator<Item = &'a str>, depth: usize) -> Value {
    let branches: Vec<Value> = parts
        .into_iter()
        .map(|part| resolve_compact(part, depth))
        .collect();
    json!({ "anyOf": branches })
}

fn resolve_compact(text: &str, depth: usize) -> Value {
    let text = normalize(text);
    if text.is_empty() {
        return string_schema();
    }
    if depth >= MAX_TYPE_DEPTH {
        trace!("Annotation nested deeper than {} levels", MAX_TYPE_DEPTH);
        return string_schema();
    }
    let depth = depth + 1;

    if let Some(inner) = generic_args(text, &["Optional"]) {
        return json!({ "anyOf": [resolve_compact(inner, depth), {"type": "null"}] });
    }

    if let Some(inner) = generic_args(text, &["Union"]) {
        return any_of(split_top_level(inner, ','), depth);
    }

    let alternatives = split_top_level(text, '|');
    if alternatives.len() > 1 {
        return any_of(alternatives, depth);
    }

    if let Some(inner) = generic_args(text, SEQUENCE_GENERICS) {
        return json!({ "type": "array", "items": resolve_compact(inner, depth) });
    }

    if let Some(inner) = generic_args(text, TUPLE_GENERICS) {
        let members = split_top_level(inner, ',')
            .into_iter()
            .filter(|m| *m != "...");
        return json!({ "type": "array", "items": any_of(members, depth) });
    }

    if let Some(inner) = generic_args(text, MAPPING_GENERICS) {
        let value = split_first_top_level(inner, ',').map_or("", |(_, v)| v);
        return json!({ "type": "object", "additionalProperties": resolve_compact(value, depth) });
    }

    match base_type(text) {
        Some(ty) => json!({ "type": ty }),
        None => {
            trace!("Unrecognised annotation {:?}, falling back to string", text);
            string_schema()
        }
    }
}

/// Strip namespace prefixes and forward-reference quotes.
fn normalize(mut text: &str) -> &str {
    loop {
        let before = text;
        text = unquote(text);
        if let Some(rest) = NAMESPACE_PREFIXES
            .iter()
            .find_map(|prefix| text.strip_prefix(prefix))
        {
            text = rest;
        }
        if text == before {
            return text;
        }
    }
}

/// Contents of `text` when it is one quoted token, such as `'Repo'`.
///
/// `'A'|'B'` is two quoted members and stays as it is.
fn unquote(text: &str) -> &str {
    let Some(quote) = text.chars().next().filter(|c| matches!(c, '"' | '\'')) else {
        return text;
    };
    match text[1..].find(quote) {
        Some(end) if end + 2 == text.len() => &text[1..end + 1],
        _ => text,
    }
}

fn base_type(name: &str) -> Option<&'static str> {
    let ty = match name.to_ascii_lowercase().as_str() {
        "str" => "string",
        "int" => "integer",
        "float" => "number",
        "bool" => "boolean",
        "dict" | "mapping" => "object",
        "list" | "tuple" | "sequence" | "iterable" => "array",
        "none" | "nonetype" | "null" => "null",
        _ => return None,
    };
    Some(ty)
}

/// If `text` is exactly `Name[...]` for one of `names`, the bracket contents.
///
/// The bracket opened after the name has to close at the very end, so
/// `Optional[int]|str` is not an `Optional`.
fn generic_args<'a>(text: &'a str, names: &[&str]) -> Option<&'a str> {
    names.iter().find_map(|name| {
        let open = name.len();
        if !text.starts_with(name) || text.as_bytes().get(open) != Some(&b'[') {
            return None;
        }
        (matching_close(text, open)? == text.len() - 1).then(|| &text[open + 1..text.len() - 1])
    })
}

/// Byte index of the bracket closing the one at `open`.
fn matching_close(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, c) in text.char_indices().skip_while(|(i, _)| *i < open) {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '[' | '(' | '{' => depth += 1,
            ']' | ')' | '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Byte offsets of `sep` outside any brackets or quotes.
fn top_level_positions(text: &str, sep: char) -> Vec<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut out = Vec::new();
    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '[' | '(' | '{' => depth += 1,
            ']' | ')' | '}' => depth = depth.saturating_sub(1),
            _ if c == sep && depth == 0 => out.push(i),
            _ => {}
        }
    }
    out
}

/// Split on `sep` at bracket depth zero.
fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for at in top_level_positions(text, sep) {
        parts.push(&text[start..at]);
        start = at + sep.len_utf8();
    }
    parts.push(&text[start..]);
    parts
}

/// Split once, on the first `sep` at bracket depth zero.
fn split_first_top_level(text: &str, sep: char) -> Option<(&str, &str)> {
    let at = *top_level_positions(text, sep).first()?;
    Some((&text[..at], &text[at + sep.len_utf8()..]))
}

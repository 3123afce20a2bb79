//! Docstring discovery and decoding.

use crate::schema::decode_string;
use crate::syntax::{first_statement, named_children};
use tracing::debug;
use tree_sitter::Node;

/// Raw text (prefix and quotes included) of a definition's docstring.
///
/// Only a standalone plain string literal as the first statement counts;
/// f-strings and implicitly concatenated strings do not.
pub fn docstring_literal<'s>(definition: Node<'_>, source: &'s str) -> Option<&'s str> {
    let stmt = first_statement(definition)?;
    if stmt.kind() != "expression_statement" {
        return None;
    }
    let exprs: Vec<Node<'_>> = named_children(stmt)
        .into_iter()
        .filter(|n| n.kind() != "comment")
        .collect();
    let [expr] = exprs.as_slice() else {
        return None;
    };
    if expr.kind() != "string" {
        return None;
    }

    let raw = &source[expr.byte_range()];
    let prefix = &raw[..raw.find(['\'', '"'])?];
    if prefix.contains(['f', 'F']) {
        return None;
    }
    Some(raw)
}

/// Decoded docstring of a definition, if it has one.
pub fn extract_docstring(definition: Node<'_>, source: &str) -> Option<String> {
    docstring_literal(definition, source).map(decode_docstring)
}

/// Unescape and clean a docstring literal.
///
/// Literals that fail to decode are returned with only the outer quote
/// characters stripped.
pub fn decode_docstring(raw: &str) -> String {
    match decode_string(raw) {
        Ok(text) => clean_docstring(&text),
        Err(e) => {
            debug!("Docstring did not decode ({}), stripping quotes", e);
            raw.trim_matches(['\'', '"']).to_string()
        }
    }
}

/// First non-blank line, trimmed.
pub fn docstring_summary(doc: Option<&str>) -> Option<String> {
    doc?.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

/// Normalise indentation the way Python's `inspect.cleandoc` does.
pub fn clean_docstring(text: &str) -> String {
    let expanded = expand_tabs(text);
    let lines: Vec<&str> = expanded.split('\n').collect();

    let margin = lines
        .iter()
        .skip(1)
        .filter(|line| !line.trim_start().is_empty())
        .map(|line| line.chars().count() - line.trim_start().chars().count())
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<String> = Vec::with_capacity(lines.len());
    if let Some(first) = lines.first() {
        cleaned.push(first.trim_start().to_string());
    }
    for line in lines.iter().skip(1) {
        cleaned.push(line.chars().skip(margin).collect());
    }

    while cleaned.last().is_some_and(|l| l.trim().is_empty()) {
        cleaned.pop();
    }
    let leading_blank = cleaned
        .iter()
        .take_while(|l| l.trim().is_empty())
        .count();

    cleaned[leading_blank..].join("\n")
}

fn expand_tabs(text: &str) -> String {
    const TAB: usize = 8;
    let mut out = String::with_capacity(text.len());
    let mut column = 0;
    for c in text.chars() {
        match c {
            '\t' => {
                let pad = TAB - column % TAB;
                out.extend(std::iter::repeat(' ').take(pad));
                column += pad;
            }
            '\n' | '\r' => {
                out.push(c);
                column = 0;
            }
            _ => {
                out.push(c);
                column += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{direct_definitions, SourceTree};

    fn doc_of(src: &str) -> Option<String> {
        let tree = SourceTree::parse(src).unwrap();
        let def = direct_definitions(tree.root())[0];
        extract_docstring(def, src)
    }

    #[test]
    fn multi_line_docstring_is_dedented() {
        let src = "def f():\n    \"\"\"This is a sample function.\n    It has a multi-line docstring.\n    \"\"\"\n    return 1\n";
        assert_eq!(
            doc_of(src).as_deref(),
            Some("This is a sample function.\nIt has a multi-line docstring.")
        );
    }

    #[test]
    fn docstring_must_be_first_statement() {
        assert_eq!(doc_of("def f():\n    x = 1\n    \"\"\"late\"\"\"\n"), None);
        assert_eq!(doc_of("def f():\n    pass\n"), None);
        assert_eq!(doc_of("def f():\n    f\"{x}\"\n"), None);
        assert_eq!(doc_of("def f():\n    'a' 'b'\n"), None);
        assert_eq!(doc_of("def f():\n    # lead\n    'doc'\n").as_deref(), Some("doc"));
        assert_eq!(doc_of("class C:\n    r'''raw \\n'''\n").as_deref(), Some("raw \\n"));
    }

    #[test]
    fn undecodable_literal_strips_quotes() {
        assert_eq!(decode_docstring(r#""""bad \N{BULLET} escape""""#), r"bad \N{BULLET} escape");
        assert_eq!(decode_docstring("b'bytes'"), "b'bytes");
    }

    #[test]
    fn summary_is_first_non_blank_line() {
        assert_eq!(docstring_summary(Some("\n\n  First.\nSecond")).as_deref(), Some("First."));
        assert_eq!(docstring_summary(Some("   \n ")), None);
        assert_eq!(docstring_summary(None), None);
    }

    #[test]
    fn cleandoc_rules() {
        assert_eq!(clean_docstring("\n    Title\n\n      indented\n    "), "Title\n\n  indented");
        assert_eq!(clean_docstring("one line  "), "one line  ");
        assert_eq!(clean_docstring("   "), "");
    }
}

//! Function-calling wire format for extracted tools.
//!
//! Produces the OpenAI-compatible `{"type": "function", "function": {...}}`
//! records carried in a chat request's `tools` field.

use crate::types::{ExtractOptions, ToolSpec};
use serde::{Deserialize, Serialize};

/// Definition of a tool exposed to the inference model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// One entry of a request's `tools` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionTool {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: ToolDefinition,
}

impl FunctionTool {
    /// Wire record for `spec`; docstring text is cut to `description_limit`
    /// characters when there is no summary line.
    pub fn from_spec(spec: &ToolSpec, description_limit: usize) -> Self {
        let description = spec.description.clone().unwrap_or_else(|| {
            spec.docstring
                .as_deref()
                .unwrap_or_default()
                .chars()
                .take(description_limit)
                .collect()
        });

        Self {
            kind: "function".into(),
            function: ToolDefinition {
                name: flatten_name(&spec.qualified_name),
                description,
                parameters: spec.parameters_schema.clone(),
            },
        }
    }
}

/// `A.B.c` becomes `A__B__c`; function names may not contain dots.
pub fn flatten_name(qualified_name: &str) -> String {
    qualified_name.replace('.', "__")
}

/// Convert specs to wire records, keeping their order. Descriptions use the
/// default [`ExtractOptions::description_limit`].
pub fn to_tool_calling_format(specs: &[ToolSpec]) -> Vec<FunctionTool> {
    to_tool_calling_format_with_limit(specs, ExtractOptions::default().description_limit)
}

pub fn to_tool_calling_format_with_limit(
    specs: &[ToolSpec],
    description_limit: usize,
) -> Vec<FunctionTool> {
    specs
        .iter()
        .map(|spec| FunctionTool::from_spec(spec, description_limit))
        .collect()
}

/// Delimited text block embedding the tools in a prompt.
pub fn render_tools_block(tools: &[FunctionTool]) -> serde_json::Result<String> {
    let json = serde_json::to_string_pretty(tools)?;
    Ok(format!("[TOOLS]\n{}\n[END TOOLS]\n\n", json))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(qualified_name: &str) -> ToolSpec {
        ToolSpec {
            name: "test_func".into(),
            description: Some("A test function.".into()),
            docstring: Some("A test function docstring.".into()),
            parameters_schema: json!({
                "type": "object",
                "properties": {"a": {"type": "integer"}},
                "additionalProperties": false,
                "required": ["a"]
            }),
            returns: Some(json!({"type": "string"})),
            qualified_name: qualified_name.into(),
            is_method: false,
            class_name: None,
        }
    }

    #[test]
    fn single_tool() {
        let s = spec("test_func");
        let out = to_tool_calling_format(std::slice::from_ref(&s));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, "function");
        assert_eq!(out[0].function.name, "test_func");
        assert_eq!(out[0].function.description, "A test function.");
        assert_eq!(out[0].function.parameters, s.parameters_schema);
    }

    #[test]
    fn qualified_names_are_flattened() {
        let out = to_tool_calling_format(&[spec("A.B.c")]);
        assert_eq!(out[0].function.name, "A__B__c");
    }

    #[test]
    fn description_falls_back_to_truncated_docstring() {
        let mut s = spec("f");
        s.description = None;
        s.docstring = Some("x".repeat(400));
        let out = to_tool_calling_format(&[s.clone()]);
        assert_eq!(
            out[0].function.description.len(),
            ExtractOptions::default().description_limit
        );
        assert_eq!(out[0].function.description.len(), 300);

        s.docstring = None;
        let out = to_tool_calling_format_with_limit(&[s], 10);
        assert_eq!(out[0].function.description, "");
    }

    #[test]
    fn preserves_order_and_serializes_type_field() {
        let out = to_tool_calling_format(&[spec("f1"), spec("f2")]);
        let names: Vec<_> = out.iter().map(|t| t.function.name.as_str()).collect();
        assert_eq!(names, ["f1", "f2"]);

        let value = serde_json::to_value(&out[0]).unwrap();
        assert_eq!(value["type"], "function");
        assert_eq!(value["function"]["parameters"]["required"], json!(["a"]));
    }

    #[test]
    fn tools_block_is_delimited() {
        let block = render_tools_block(&to_tool_calling_format(&[spec("f")])).unwrap();
        assert!(block.starts_with("[TOOLS]\n[\n"));
        assert!(block.ends_with("]\n[END TOOLS]\n\n"));
        assert!(block.contains("\"name\": \"f\""));
    }
}

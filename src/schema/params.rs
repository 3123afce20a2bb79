//! Parameter-list schema assembly.

use super::literal::eval_literal;
use super::types::{is_nullable, permissive_schema, resolve_type};
use crate::syntax::{Parameters, RawParam};
use crate::types::{ParamKind, ToolParam, UnresolvedDefaults};
use serde_json::{json, Map, Value};
use tracing::{debug, trace};

/// Build the `parameters` schema for one definition.
///
/// With `elide_receiver`, the first positional parameter (the implicit
/// `self`/`cls`) is dropped.
pub fn build_parameters_schema(
    params: &Parameters,
    elide_receiver: bool,
    unresolved: UnresolvedDefaults,
) -> Value {
    let tool_params = collect_params(params, elide_receiver, unresolved);

    let mut properties = Map::new();
    let mut required = Vec::new();
    for param in tool_params {
        trace!(
            "Parameter {} ({}): required={}, default={:?}",
            param.name,
            param.kind,
            param.required,
            param.default
        );
        if param.required {
            required.push(Value::String(param.name.clone()));
        }
        properties.insert(param.name, param.schema);
    }

    let mut schema = json!({
        "type": "object",
        "properties": properties,
        "additionalProperties": false,
    });
    if !required.is_empty() {
        schema["required"] = Value::Array(required);
    }
    schema
}

fn collect_params(
    params: &Parameters,
    elide_receiver: bool,
    unresolved: UnresolvedDefaults,
) -> Vec<ToolParam> {
    let positional = params
        .positional_only
        .iter()
        .map(|p| (p, ParamKind::PositionalOnly))
        .chain(
            params
                .positional
                .iter()
                .map(|p| (p, ParamKind::PositionalOrKeyword)),
        )
        .skip(usize::from(elide_receiver));

    let mut out: Vec<ToolParam> = positional
        .map(|(p, kind)| plain_param(p, kind, unresolved))
        .collect();

    if let Some(p) = &params.var_args {
        out.push(variadic_param(p, ParamKind::VarArgs));
    }
    out.extend(
        params
            .keyword_only
            .iter()
            .map(|p| plain_param(p, ParamKind::KeywordOnly, unresolved)),
    );
    if let Some(p) = &params.var_kwargs {
        out.push(variadic_param(p, ParamKind::VarKwargs));
    }
    out
}

fn plain_param(param: &RawParam, kind: ParamKind, unresolved: UnresolvedDefaults) -> ToolParam {
    let mut schema = resolve_type(param.annotation.as_deref());
    let default = param
        .default
        .as_deref()
        .map(|src| evaluate_default(&param.name, src, unresolved));

    let required = default.is_none() && !is_nullable(&schema);
    if let (Some(value), Some(obj)) = (&default, schema.as_object_mut()) {
        obj.insert("default".to_string(), value.clone());
    }

    ToolParam {
        name: param.name.clone(),
        schema,
        default,
        kind,
        required,
    }
}

fn variadic_param(param: &RawParam, kind: ParamKind) -> ToolParam {
    let inner = match param.annotation.as_deref() {
        Some(annotation) => resolve_type(Some(annotation)),
        None => permissive_schema(),
    };
    let schema = match kind {
        ParamKind::VarKwargs => json!({ "type": "object", "additionalProperties": inner }),
        _ => json!({ "type": "array", "items": inner }),
    };
    ToolParam {
        name: param.name.clone(),
        schema,
        default: None,
        kind,
        required: false,
    }
}

fn evaluate_default(name: &str, src: &str, unresolved: UnresolvedDefaults) -> Value {
    match eval_literal(src) {
        Ok(value) => value,
        Err(e) => {
            debug!("Default for {} is not a literal ({}): {}", name, e, src);
            match unresolved {
                UnresolvedDefaults::Raw => Value::String(src.to_string()),
                UnresolvedDefaults::Tagged => json!({ "unresolved": src }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str, annotation: Option<&str>, default: Option<&str>) -> RawParam {
        RawParam {
            name: name.to_string(),
            annotation: annotation.map(str::to_string),
            default: default.map(str::to_string),
        }
    }

    fn property_names(schema: &Value) -> Vec<String> {
        schema["properties"]
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect()
    }

    #[test]
    fn sample_function_schema() {
        let params = Parameters {
            positional: vec![
                raw("param1", Some("int"), None),
                raw("param2", Some("str"), Some("\"default\"")),
            ],
            ..Default::default()
        };
        let schema = build_parameters_schema(&params, false, UnresolvedDefaults::Raw);
        assert_eq!(
            schema,
            json!({
                "type": "object",
                "properties": {
                    "param1": {"type": "integer"},
                    "param2": {"type": "string", "default": "default"}
                },
                "additionalProperties": false,
                "required": ["param1"]
            })
        );
    }

    #[test]
    fn declaration_order_and_receiver_elision() {
        let params = Parameters {
            positional_only: vec![raw("self", None, None), raw("a", None, None)],
            positional: vec![raw("b", None, None)],
            var_args: Some(raw("args", None, None)),
            keyword_only: vec![raw("c", Some("bool"), Some("True"))],
            var_kwargs: Some(raw("kwargs", Some("int"), None)),
        };
        let schema = build_parameters_schema(&params, true, UnresolvedDefaults::Raw);
        assert_eq!(property_names(&schema), ["a", "b", "args", "c", "kwargs"]);
        assert_eq!(schema["required"], json!(["a", "b"]));
        assert_eq!(schema["properties"]["args"]["items"], permissive_schema());
        assert_eq!(
            schema["properties"]["kwargs"],
            json!({"type": "object", "additionalProperties": {"type": "integer"}})
        );
        assert_eq!(schema["properties"]["c"], json!({"type": "boolean", "default": true}));
    }

    #[test]
    fn receiver_falls_through_to_positional() {
        let params = Parameters {
            positional: vec![raw("self", None, None), raw("x", Some("float"), None)],
            ..Default::default()
        };
        let schema = build_parameters_schema(&params, true, UnresolvedDefaults::Raw);
        assert_eq!(property_names(&schema), ["x"]);
    }

    #[test]
    fn nullable_parameters_are_optional() {
        let params = Parameters {
            positional: vec![raw("maybe", Some("Optional[int]"), None)],
            ..Default::default()
        };
        let schema = build_parameters_schema(&params, false, UnresolvedDefaults::Raw);
        assert!(schema.get("required").is_none());
    }

    #[test]
    fn unresolved_default_policies() {
        let params = Parameters {
            positional: vec![raw("path", Some("str"), Some("os.getcwd()"))],
            ..Default::default()
        };
        let raw_schema = build_parameters_schema(&params, false, UnresolvedDefaults::Raw);
        assert_eq!(raw_schema["properties"]["path"]["default"], json!("os.getcwd()"));

        let tagged = build_parameters_schema(&params, false, UnresolvedDefaults::Tagged);
        assert_eq!(
            tagged["properties"]["path"]["default"],
            json!({"unresolved": "os.getcwd()"})
        );
        assert!(tagged.get("required").is_none());
    }

    #[test]
    fn empty_parameter_list() {
        let schema = build_parameters_schema(&Parameters::default(), true, UnresolvedDefaults::Raw);
        assert_eq!(
            schema,
            json!({"type": "object", "properties": {}, "additionalProperties": false})
        );
    }
}

use agentix::{
    extract_from_file, extract_from_text, to_tool_calling_format, ExtractError, ExtractOptions,
    ToolExtractor, UnresolvedDefaults,
};
use serde_json::json;
use std::io::Write;

const SAMPLE: &str = r#"
def sample_function(param1: int, param2: str = "default") -> bool:
    """This is a sample function.
    It has a multi-line docstring.
    """
    return True
"#;

#[test]
fn sample_function_spec() {
    let tools = extract_from_text(SAMPLE).unwrap();
    assert_eq!(tools.len(), 1);
    let tool = &tools[0];

    assert_eq!(tool.name, "sample_function");
    assert_eq!(tool.qualified_name, "sample_function");
    assert_eq!(tool.description.as_deref(), Some("This is a sample function."));
    assert_eq!(
        tool.docstring.as_deref(),
        Some("This is a sample function.\nIt has a multi-line docstring.")
    );
    assert_eq!(tool.parameters_schema["properties"]["param1"], json!({"type": "integer"}));
    assert_eq!(
        tool.parameters_schema["properties"]["param2"],
        json!({"type": "string", "default": "default"})
    );
    assert_eq!(tool.parameters_schema["required"], json!(["param1"]));
    assert_eq!(tool.parameters_schema["additionalProperties"], json!(false));
    assert_eq!(tool.returns, Some(json!({"type": "boolean"})));
    assert!(!tool.is_method);
}

#[test]
fn extract_from_file_reads_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "def another_function(x: float) -> str:\n    \"\"\"Another example function.\n    This docstring spans multiple lines.\n    \"\"\"\n    return str(x)\n"
    )
    .unwrap();

    let tools = extract_from_file(file.path()).unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "another_function");
    assert_eq!(tools[0].description.as_deref(), Some("Another example function."));
    assert_eq!(tools[0].parameters_schema["properties"]["x"], json!({"type": "number"}));
    assert_eq!(tools[0].returns, Some(json!({"type": "string"})));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = extract_from_file(dir.path().join("nope.py")).unwrap_err();
    assert!(matches!(err, ExtractError::Io { .. }));
}

#[test]
fn invalid_source_is_a_syntax_error() {
    let err = extract_from_text("def ok(): pass\n\ndef broken(x:\n").unwrap_err();
    assert!(matches!(err, ExtractError::Syntax { .. }), "got {err}");
}

#[test]
fn methods_elide_receiver_and_nested_functions_are_skipped() {
    let src = r#"
class Repo:
    """Storage."""

    def get(self, key: str, default: Optional[str] = None) -> Optional[str]:
        """Fetch a value."""
        def normalise(k):
            return k.lower()
        return None

    @classmethod
    def open(cls, path: str, *, create: bool = False) -> "Repo":
        ...

def helper(*args: int, **options) -> None:
    pass
"#;
    let tools = extract_from_text(src).unwrap();
    let names: Vec<_> = tools.iter().map(|t| t.qualified_name.as_str()).collect();
    assert_eq!(names, ["Repo.get", "Repo.open", "helper"]);

    let get = &tools[0];
    assert!(get.is_method);
    assert_eq!(get.class_name.as_deref(), Some("Repo"));
    assert_eq!(get.name, "get");
    let props = get.parameters_schema["properties"].as_object().unwrap();
    assert_eq!(props.keys().collect::<Vec<_>>(), ["key", "default"]);
    assert_eq!(
        props["default"],
        json!({"anyOf": [{"type": "string"}, {"type": "null"}], "default": null})
    );
    assert_eq!(get.parameters_schema["required"], json!(["key"]));

    let open = &tools[1];
    assert_eq!(open.returns, Some(json!({"type": "string"})));
    let open_props = open.parameters_schema["properties"].as_object().unwrap();
    assert_eq!(open_props.keys().collect::<Vec<_>>(), ["path", "create"]);

    let helper = &tools[2];
    assert_eq!(helper.description, None);
    assert_eq!(helper.docstring, None);
    assert_eq!(
        helper.parameters_schema["properties"]["args"],
        json!({"type": "array", "items": {"type": "integer"}})
    );
    assert_eq!(helper.parameters_schema["properties"]["options"]["type"], json!("object"));
    assert!(helper.parameters_schema.get("required").is_none());
    assert_eq!(helper.returns, Some(json!({"type": "null"})));
}

#[test]
fn duplicate_names_are_disambiguated_by_qualified_name() {
    let src = "def run(): pass\n\nclass A:\n    def run(self): pass\n\nclass B:\n    def run(self): pass\n";
    let tools = extract_from_text(src).unwrap();
    let qualified: Vec<_> = tools.iter().map(|t| t.qualified_name.as_str()).collect();
    assert_eq!(qualified, ["run", "A.run", "B.run"]);
    assert!(tools.iter().all(|t| t.name == "run"));

    let exported = to_tool_calling_format(&tools);
    let names: Vec<_> = exported.iter().map(|t| t.function.name.as_str()).collect();
    assert_eq!(names, ["run", "A__run", "B__run"]);
}

#[test]
fn extraction_is_idempotent() {
    let src = "class A:\n    class B:\n        def c(self, n: int = 3): '''Doc.'''\n";
    let first = extract_from_text(src).unwrap();
    let second = extract_from_text(src).unwrap();
    assert_eq!(first, second);

    let exported = to_tool_calling_format(&first);
    assert_eq!(exported[0].function.name, "A__B__c");
    assert_eq!(exported[0].function.description, "Doc.");
}

#[test]
fn tagged_defaults_and_options_flow_through() {
    let extractor = ToolExtractor::new(ExtractOptions {
        unresolved_defaults: UnresolvedDefaults::Tagged,
        ..Default::default()
    });
    let tools = extractor
        .extract_from_text("import os\n\ndef cwd(path: str = os.getcwd(), retries: int = -2): pass\n")
        .unwrap();
    let props = &tools[0].parameters_schema["properties"];
    assert_eq!(props["path"]["default"], json!({"unresolved": "os.getcwd()"}));
    assert_eq!(props["retries"]["default"], json!(-2));
}

#[test]
fn serialized_spec_uses_snake_case_fields() {
    let tools = extract_from_text(SAMPLE).unwrap();
    let value = serde_json::to_value(&tools[0]).unwrap();
    for key in [
        "name",
        "description",
        "docstring",
        "parameters_schema",
        "returns",
        "qualified_name",
        "is_method",
        "class_name",
    ] {
        assert!(value.get(key).is_some(), "missing {key}");
    }
    assert_eq!(value["class_name"], json!(null));
}

#[test]
fn deep_nesting_is_rejected_without_exhausting_the_stack() {
    let handle = std::thread::Builder::new()
        .stack_size(2 << 20)
        .spawn(|| {
            let too_deep = format!("def f(x={}{}): pass\n", "[".repeat(5000), "]".repeat(5000));
            let err = extract_from_text(&too_deep).unwrap_err();

            let nested = format!("def g(x={}{}): pass\n", "[".repeat(300), "]".repeat(300));
            let tools = extract_from_text(&nested).unwrap();
            (err, tools)
        })
        .unwrap();
    let (err, tools) = handle.join().unwrap();

    assert!(matches!(err, ExtractError::Syntax { .. }), "got {err}");
    let default = &tools[0].parameters_schema["properties"]["x"]["default"];
    assert_eq!(default.as_str().map(str::len), Some(600));
}

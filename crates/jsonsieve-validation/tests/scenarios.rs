//! End-to-end scenarios: compiled schema against streamed instances.

use jsonsieve_validation::{Problem, SchemaReader, Validator};

fn validate(schema: &str, instance: &str) -> Vec<Problem> {
    let schema = SchemaReader::new().read_str(schema).expect("valid schema");
    Validator::new(schema)
        .validate_str(instance)
        .expect("well-formed instance")
}

#[test]
fn test_integer_range() {
    let schema = r#"{ "type": "integer", "minimum": 0, "maximum": 100 }"#;
    assert!(validate(schema, "42").is_empty());

    let problems = validate(schema, "100.5");
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].keyword(), Some("type"));
}

#[test]
fn test_one_of_matching_many() {
    let schema = r#"{ "oneOf": [ {"type": "integer"}, {"multipleOf": 5} ] }"#;
    let problems = validate(schema, "10");
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].message_key(), "instance.problem.oneOf.many");
    assert_eq!(problems[0].branches().len(), 2);
}

#[test]
fn test_one_of_matching_none() {
    let schema = r#"{ "oneOf": [ {"type": "integer"}, {"multipleOf": 5} ] }"#;
    let problems = validate(schema, r#""x""#);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].message_key(), "instance.problem.oneOf.few");
    assert_eq!(problems[0].branches().len(), 2);
}

#[test]
fn test_closed_object() {
    let schema = r#"{
        "properties": {"a": {"type": "integer"}},
        "required": ["a"],
        "additionalProperties": false
    }"#;

    let problems = validate(schema, r#"{"a": 1, "b": 2}"#);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].keyword(), Some("additionalProperties"));
    assert_eq!(
        problems[0].parameters().get("actual").map(ToString::to_string),
        Some("b".to_string())
    );

    let problems = validate(schema, "{}");
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].keyword(), Some("required"));

    let problems = validate(schema, r#"{"a": "x"}"#);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].keyword(), Some("type"));

    assert!(validate(schema, r#"{"a": 7}"#).is_empty());
}

#[test]
fn test_property_dependencies() {
    let schema = r#"{ "dependencies": {"a": ["b"]} }"#;

    let problems = validate(schema, r#"{"a": 1}"#);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].message_key(), "instance.problem.dependencies");
    assert_eq!(
        problems[0].parameters().get("missing").map(ToString::to_string),
        Some(r#"["b"]"#.to_string())
    );
    assert_eq!(
        problems[0]
            .parameters()
            .get("dependant")
            .map(ToString::to_string),
        Some("a".to_string())
    );

    assert!(validate(schema, r#"{"a": 1, "b": 2}"#).is_empty());
    assert!(validate(schema, r#"{"b": 2}"#).is_empty());
}

#[test]
fn test_conditional() {
    let schema = r#"{
        "if": {"properties": {"t": {"const": "x"}}, "required": ["t"]},
        "then": {"required": ["x"]},
        "else": {"required": ["y"]}
    }"#;

    let problems = validate(schema, r#"{"t": "x"}"#);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].keyword(), Some("required"));
    assert!(problems[0].message(&Default::default()).contains('x'));

    let problems = validate(schema, r#"{"t": "z"}"#);
    assert_eq!(problems.len(), 1);
    assert!(problems[0].message(&Default::default()).contains('y'));

    assert!(validate(schema, r#"{"t": "x", "x": 1}"#).is_empty());
    assert!(validate(schema, r#"{"t": "z", "y": 1}"#).is_empty());
}

#[test]
fn test_email_format() {
    let schema = r#"{ "format": "email" }"#;
    assert!(validate(schema, r#""a@b.c""#).is_empty());

    let problems = validate(schema, r#""not-an-email""#);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].keyword(), Some("format"));
}

#[test]
fn test_unknown_format_is_inert_in_lax_mode() {
    let schema = r#"{ "format": "zzz" }"#;
    assert!(validate(schema, r#""anything at all""#).is_empty());
}

#[test]
fn test_unknown_format_is_rejected_in_strict_mode() {
    let result = SchemaReader::new()
        .with_strict_format(true)
        .read_str(r#"{ "format": "zzz" }"#);
    assert!(result.is_err());
}

//! Engine behavior: streaming contract, combinators, references,
//! buffering keywords.

use jsonsieve_validation::{Problem, SchemaReader, ValidatingEventReader, Validator};
use jsonsieve_json::JsonEventReader;
use std::sync::Arc;

fn compile(schema: &str) -> Arc<jsonsieve_validation::Schema> {
    SchemaReader::new().read_str(schema).expect("valid schema")
}

fn validate(schema: &str, instance: &str) -> Vec<Problem> {
    Validator::new(compile(schema))
        .validate_str(instance)
        .expect("well-formed instance")
}

#[test]
fn test_events_are_forwarded_unchanged() {
    let input = r#"{"a": [1, {"b": null}], "c": "text"}"#;
    let plain: Vec<_> = JsonEventReader::new(input).map(|e| e.unwrap()).collect();

    let schema = compile(r#"{"type": "object"}"#);
    let mut problems = Vec::new();
    let mut reader = ValidatingEventReader::new(schema, JsonEventReader::new(input), |batch| {
        problems.extend_from_slice(batch)
    });
    let mut seen = Vec::new();
    while let Some(event) = reader.next_event().unwrap() {
        seen.push(event);
    }
    assert_eq!(seen, plain);
}

#[test]
fn test_all_of_collects_problems_from_every_branch() {
    let schema = r#"{ "allOf": [ {"minimum": 3}, {"multipleOf": 2} ] }"#;
    let problems = validate(schema, "1");
    assert_eq!(problems.len(), 2);
    assert_eq!(problems[0].keyword(), Some("minimum"));
    assert_eq!(problems[1].keyword(), Some("multipleOf"));
}

#[test]
fn test_any_of_reports_branches_only_on_total_failure() {
    let schema = r#"{ "anyOf": [ {"type": "string"}, {"minimum": 10} ] }"#;
    assert!(validate(schema, r#""ok""#).is_empty());
    assert!(validate(schema, "12").is_empty());

    let problems = validate(schema, "3");
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].message_key(), "instance.problem.anyOf");
    assert_eq!(problems[0].branches().len(), 2);
}

#[test]
fn test_not_inverts_validity() {
    let cases = [
        (r#"{ "not": {"type": "integer"} }"#, "5", false),
        (r#"{ "not": {"type": "integer"} }"#, r#""x""#, true),
        (r#"{ "not": {"not": {"type": "integer"}} }"#, "5", true),
        (r#"{ "not": {} }"#, "null", false),
    ];
    for (schema, instance, expect_valid) in cases {
        let problems = validate(schema, instance);
        assert_eq!(
            problems.is_empty(),
            expect_valid,
            "schema {schema} instance {instance}"
        );
    }
}

#[test]
fn test_negation_invariant() {
    let schemas = [
        r#"{"type": "integer", "minimum": 3}"#,
        r#"{"maxLength": 2}"#,
        r#"{"required": ["a"]}"#,
        r#"{"enum": [1, 2, 3]}"#,
    ];
    let instances = ["2", "7", r#""abc""#, r#"{"a": 1}"#, r#"{}"#, "[1, 1]"];
    for schema in schemas {
        let negated = format!(r#"{{"not": {schema}}}"#);
        for instance in instances {
            let direct = validate(schema, instance);
            let inverted = validate(&negated, instance);
            assert_eq!(
                direct.is_empty(),
                !inverted.is_empty(),
                "schema {schema} instance {instance}"
            );
        }
    }
}

#[test]
fn test_schema_dependency_activates_retroactively() {
    // The subschema starts evaluating before "a" is seen; its problems
    // must still surface once "a" activates the dependency.
    let schema = r#"{ "dependencies": {"a": {"required": ["b"]}} }"#;
    let problems = validate(schema, r#"{"x": 1, "a": 2}"#);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].keyword(), Some("required"));

    assert!(validate(schema, r#"{"b": 0, "a": 2}"#).is_empty());
    assert!(validate(schema, r#"{"x": 1}"#).is_empty());
}

#[test]
fn test_recursive_ref() {
    let schema = r##"{
        "type": "object",
        "properties": {
            "value": {"type": "integer"},
            "next": {"$ref": "#"}
        },
        "required": ["value"]
    }"##;
    assert!(validate(schema, r#"{"value": 1, "next": {"value": 2}}"#).is_empty());

    let problems = validate(schema, r#"{"value": 1, "next": {"value": "x"}}"#);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].keyword(), Some("type"));
}

#[test]
fn test_unresolved_ref_reports_dereference_problem() {
    let schema = r##"{ "properties": {"a": {"$ref": "#/definitions/missing"}} }"##;
    let problems = validate(schema, r#"{"a": 1}"#);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].message_key(), "schema.problem.dereference");
    assert_eq!(problems[0].keyword(), Some("$ref"));
}

#[test]
fn test_ref_short_circuits_siblings() {
    let schema = r##"{
        "definitions": {"anything": true},
        "properties": {"a": {"$ref": "#/definitions/anything", "type": "string"}}
    }"##;
    // The sibling "type" is ignored per Draft-07.
    assert!(validate(schema, r#"{"a": 42}"#).is_empty());
}

#[test]
fn test_unique_items_uses_numeric_equality() {
    let schema = r#"{ "uniqueItems": true }"#;
    let problems = validate(schema, "[1, 2, 1.0]");
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].keyword(), Some("uniqueItems"));

    assert!(validate(schema, "[1, 2, 3]").is_empty());
    // Objects compare structurally, key order insensitive.
    let problems = validate(schema, r#"[{"a": 1, "b": 2}, {"b": 2, "a": 1}]"#);
    assert_eq!(problems.len(), 1);
}

#[test]
fn test_tuple_items_and_additional_items() {
    let schema = r#"{
        "items": [{"type": "integer"}, {"type": "string"}],
        "additionalItems": {"type": "boolean"}
    }"#;
    assert!(validate(schema, r#"[1, "a", true, false]"#).is_empty());

    let problems = validate(schema, r#"[1, "a", 3]"#);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].keyword(), Some("type"));

    let closed = r#"{ "items": [{"type": "integer"}], "additionalItems": false }"#;
    let problems = validate(closed, "[1, 2, 3]");
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].keyword(), Some("additionalItems"));
}

#[test]
fn test_contains_with_bounds() {
    let schema = r#"{ "contains": {"type": "integer"} }"#;
    assert!(validate(schema, r#"[true, 3, "x"]"#).is_empty());
    let problems = validate(schema, r#"["x", true]"#);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].message_key(), "instance.problem.contains");

    let bounded = r#"{ "contains": {"type": "integer"}, "minContains": 2, "maxContains": 3 }"#;
    assert!(validate(bounded, "[1, 2]").is_empty());
    let problems = validate(bounded, "[1]");
    assert_eq!(problems[0].keyword(), Some("minContains"));
    let problems = validate(bounded, "[1, 2, 3, 4]");
    assert_eq!(problems[0].keyword(), Some("maxContains"));

    // minContains 0 accepts an empty match set.
    let zero = r#"{ "contains": {"type": "integer"}, "minContains": 0 }"#;
    assert!(validate(zero, r#"["x"]"#).is_empty());
}

#[test]
fn test_pattern_properties_cooperate_with_properties() {
    let schema = r#"{
        "properties": {"exact": {"type": "integer"}},
        "patternProperties": {"^x-": {"type": "string"}},
        "additionalProperties": {"type": "boolean"}
    }"#;
    assert!(validate(schema, r#"{"exact": 1, "x-header": "v", "flag": true}"#).is_empty());

    let problems = validate(schema, r#"{"x-header": 5}"#);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].keyword(), Some("type"));

    let problems = validate(schema, r#"{"other": "not boolean"}"#);
    assert_eq!(problems.len(), 1);
}

#[test]
fn test_false_property_schema_rejects_the_value_not_the_name() {
    // "foo" is a recognized property that can never validate; this is not
    // an additionalProperties violation.
    let schema = r#"{ "properties": {"foo": false} }"#;
    let problems = validate(schema, r#"{"foo": 1}"#);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].message_key(), "instance.problem.rejected");
    assert_ne!(problems[0].keyword(), Some("additionalProperties"));

    assert!(validate(schema, r#"{"bar": 1}"#).is_empty());

    let pattern = r#"{ "patternProperties": {"^x-": false} }"#;
    let problems = validate(pattern, r#"{"x-one": 1}"#);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].message_key(), "instance.problem.rejected");
}

#[test]
fn test_vacuous_if_condition_selects_then() {
    // With no "a" property the dependency never activates and the "if"
    // subschema vacuously validates, so "then" applies, not "else".
    let schema = r#"{
        "if": {"dependencies": {"a": ["b"]}},
        "then": {"required": ["t"]},
        "else": {"required": ["e"]}
    }"#;
    let problems = validate(schema, "{}");
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].keyword(), Some("required"));
    assert_eq!(
        problems[0].parameters().get("missing").map(ToString::to_string),
        Some(r#"["t"]"#.to_string())
    );

    let problems = validate(schema, r#"{"a": 1}"#);
    assert_eq!(problems.len(), 1);
    assert_eq!(
        problems[0].parameters().get("missing").map(ToString::to_string),
        Some(r#"["e"]"#.to_string())
    );

    assert!(validate(schema, r#"{"t": 0}"#).is_empty());
}

#[test]
fn test_property_names() {
    let schema = r#"{ "propertyNames": {"maxLength": 3} }"#;
    assert!(validate(schema, r#"{"ab": 1, "abc": 2}"#).is_empty());
    let problems = validate(schema, r#"{"toolong": 1}"#);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].keyword(), Some("maxLength"));
}

#[test]
fn test_const_and_multiple_of_canonicalise_numbers() {
    assert!(validate(r#"{"const": 1}"#, "1.0").is_empty());
    assert!(validate(r#"{"const": 1}"#, "1e0").is_empty());
    assert!(validate(r#"{"multipleOf": 0.1}"#, "0.3").is_empty());
    assert!(!validate(r#"{"multipleOf": 0.1}"#, "0.35").is_empty());
}

#[test]
fn test_string_length_counts_code_points() {
    let schema = r#"{ "minLength": 2, "maxLength": 2 }"#;
    // Two code points, four UTF-8 bytes.
    assert!(validate(schema, r#""日本""#).is_empty());
    // One code point outside the BMP (two UTF-16 units).
    assert!(!validate(schema, "\"\u{1F600}\"").is_empty());
}

#[test]
fn test_deep_nesting_streams_through() {
    let schema = r#"{
        "type": "object",
        "properties": {
            "rows": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {"n": {"type": "integer"}},
                    "required": ["n"]
                }
            }
        }
    }"#;
    assert!(validate(schema, r#"{"rows": [{"n": 1}, {"n": 2}, {"n": 3}]}"#).is_empty());
    let problems = validate(schema, r#"{"rows": [{"n": 1}, {}, {"n": "x"}]}"#);
    assert_eq!(problems.len(), 2);
}

#[test]
fn test_problem_locations_point_into_the_source() {
    let schema = r#"{"properties": {"a": {"type": "integer"}}}"#;
    let problems = validate(schema, "{\n  \"a\": \"oops\"\n}");
    assert_eq!(problems.len(), 1);
    let location = problems[0].location().expect("location");
    assert_eq!(location.row, 1);
    assert_eq!(location.column, 7);
}

#[test]
fn test_value_reader_returns_value_and_problems() {
    let schema = compile(r#"{"properties": {"a": {"type": "string"}}}"#);
    let (value, problems) = Validator::new(schema)
        .read_value(r#"{"a": 1, "b": [true]}"#)
        .unwrap();
    assert_eq!(problems.len(), 1);
    assert_eq!(
        value.get("a").and_then(|v| v.as_decimal()),
        Some(1.into())
    );
    assert!(value.get("b").is_some());
}

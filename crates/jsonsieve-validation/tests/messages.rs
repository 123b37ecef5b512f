//! Message catalog coverage and localized rendering.

use jsonsieve_validation::{catalog, Locale, ProblemRenderer, SchemaReader, Validator};

/// Every message key the engine can emit.
const ENGINE_KEYS: &[&str] = &[
    "instance.problem.type",
    "instance.problem.not.type",
    "instance.problem.enum",
    "instance.problem.not.enum",
    "instance.problem.const",
    "instance.problem.not.const",
    "instance.problem.multipleOf",
    "instance.problem.not.multipleOf",
    "instance.problem.maximum",
    "instance.problem.not.maximum",
    "instance.problem.minimum",
    "instance.problem.not.minimum",
    "instance.problem.exclusiveMaximum",
    "instance.problem.not.exclusiveMaximum",
    "instance.problem.exclusiveMinimum",
    "instance.problem.not.exclusiveMinimum",
    "instance.problem.maxLength",
    "instance.problem.not.maxLength",
    "instance.problem.minLength",
    "instance.problem.not.minLength",
    "instance.problem.pattern",
    "instance.problem.not.pattern",
    "instance.problem.format",
    "instance.problem.not.format",
    "instance.problem.contentEncoding",
    "instance.problem.not.contentEncoding",
    "instance.problem.contentMediaType",
    "instance.problem.not.contentMediaType",
    "instance.problem.maxItems",
    "instance.problem.not.maxItems",
    "instance.problem.minItems",
    "instance.problem.not.minItems",
    "instance.problem.uniqueItems",
    "instance.problem.not.uniqueItems",
    "instance.problem.contains",
    "instance.problem.not.contains",
    "instance.problem.minContains",
    "instance.problem.maxContains",
    "instance.problem.maxProperties",
    "instance.problem.not.maxProperties",
    "instance.problem.minProperties",
    "instance.problem.not.minProperties",
    "instance.problem.required",
    "instance.problem.not.required",
    "instance.problem.additionalProperties",
    "instance.problem.additionalItems",
    "instance.problem.dependencies",
    "instance.problem.not.dependencies",
    "instance.problem.anyOf",
    "instance.problem.oneOf.few",
    "instance.problem.oneOf.many",
    "instance.problem.not.oneOf",
    "instance.problem.rejected",
    "schema.problem.dereference",
];

#[test]
fn test_every_engine_key_resolves_in_both_locales() {
    for key in ENGINE_KEYS {
        for locale in [Locale::english(), Locale::new("ja")] {
            let template = catalog::template(&locale, key);
            assert_ne!(template, *key, "missing {key} in {:?}", locale.tag());
        }
    }
}

#[test]
fn test_japanese_rendering() {
    let schema = SchemaReader::new()
        .read_str(r#"{"maxLength": 3}"#)
        .unwrap();
    let problems = Validator::new(schema).validate_str(r#""too long""#).unwrap();
    assert_eq!(problems.len(), 1);

    let ja = ProblemRenderer::new(Locale::new("ja_JP.UTF-8"));
    let line = ja.render(&problems[0]);
    assert!(line.contains("文字列"), "{line}");
    assert!(line.contains('3'), "{line}");

    let en = ProblemRenderer::new(Locale::english());
    let line = en.render(&problems[0]);
    assert!(line.contains("at most 3"), "{line}");
}

#[test]
fn test_compound_problem_renders_branch_groups() {
    let schema = SchemaReader::new()
        .read_str(r#"{ "oneOf": [ {"type": "integer"}, {"multipleOf": 5} ] }"#)
        .unwrap();
    let problems = Validator::new(schema).validate_str(r#""x""#).unwrap();
    let text = ProblemRenderer::new(Locale::english()).render(&problems[0]);
    assert!(text.contains("exactly one"), "{text}");
    assert!(text.contains("1)"), "{text}");
    assert!(text.contains("2)"), "{text}");
}

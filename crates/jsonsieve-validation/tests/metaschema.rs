//! Meta-schema invariants.

use jsonsieve_validation::{metaschema, Locale, Validator};

#[test]
fn test_metaschema_validates_itself() {
    let validator = Validator::new(metaschema::draft07());
    let problems = validator
        .validate_str(metaschema::DRAFT07_JSON)
        .expect("meta-schema parses");
    assert!(
        problems.is_empty(),
        "meta-schema should validate itself: {:?}",
        problems
            .iter()
            .map(|p| p.message(&Locale::english()))
            .collect::<Vec<_>>()
    );
}

#[test]
fn test_serialized_schema_validates_against_metaschema() {
    let schema = metaschema::draft07();
    let serialized = schema.to_json();
    let validator = Validator::new(metaschema::draft07());
    let problems = validator.validate_value(&serialized);
    assert!(
        problems.is_empty(),
        "to_json output should satisfy the meta-schema: {:?}",
        problems
            .iter()
            .map(|p| p.message(&Locale::english()))
            .collect::<Vec<_>>()
    );
}

#[test]
fn test_ordinary_schema_passes_metaschema() {
    let validator = Validator::new(metaschema::draft07());
    let problems = validator
        .validate_str(
            r#"{
                "type": "object",
                "properties": {"name": {"type": "string", "minLength": 1}},
                "required": ["name"]
            }"#,
        )
        .unwrap();
    assert!(problems.is_empty());
}

#[test]
fn test_malformed_schema_fails_metaschema() {
    let validator = Validator::new(metaschema::draft07());
    // "type" must be a simple type name or an array of them.
    let problems = validator.validate_str(r#"{"type": 12}"#).unwrap();
    assert!(!problems.is_empty());
}

//! The keyword model.
//!
//! Every supported keyword is a variant of [`Keyword`], carrying its
//! compiled payload. A keyword knows its name, the instance types it
//! evaluates, and its JSON rendering; evaluator construction lives with
//! the schema, which groups cooperating keywords (the properties family,
//! the items family, `if`/`then`/`else`, the content pair).

use crate::content::{ContentEncodingScheme, ContentMimeType};
use crate::format::FormatMatcher;
use crate::schema::Schema;
use crate::value::{InstanceType, JsonValue};
use indexmap::IndexMap;
use regex::Regex;
use rust_decimal::Decimal;
use std::sync::Arc;

/// A `dependencies` entry: subschema or required-property list.
#[derive(Debug, Clone)]
pub enum Dependency {
    Schema(Arc<Schema>),
    Properties(Vec<String>),
}

/// The two shapes of `items`.
#[derive(Debug, Clone)]
pub enum ItemsKind {
    Single(Arc<Schema>),
    Tuple(Vec<Arc<Schema>>),
}

/// The three flavours a keyword can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordKind {
    Assertion,
    Combiner,
    Annotation,
}

#[derive(Debug, Clone)]
pub enum Keyword {
    // Assertions.
    Type(Vec<InstanceType>),
    Enum(Vec<JsonValue>),
    Const(JsonValue),
    MultipleOf(Decimal),
    Maximum(Decimal),
    ExclusiveMaximum(Decimal),
    Minimum(Decimal),
    ExclusiveMinimum(Decimal),
    MaxLength(usize),
    MinLength(usize),
    Pattern(Regex),
    MaxItems(usize),
    MinItems(usize),
    UniqueItems(bool),
    MaxContains(usize),
    MinContains(usize),
    MaxProperties(usize),
    MinProperties(usize),
    Required(Vec<String>),
    Format {
        attribute: String,
        /// `None` in lax mode for an unknown attribute: inert.
        matcher: Option<FormatMatcher>,
    },
    ContentEncoding {
        name: String,
        scheme: Option<ContentEncodingScheme>,
    },
    ContentMediaType {
        name: String,
        mime_type: Option<ContentMimeType>,
    },

    // Combiners.
    Items(ItemsKind),
    AdditionalItems(Arc<Schema>),
    Contains(Arc<Schema>),
    Properties(IndexMap<String, Arc<Schema>>),
    PatternProperties(Vec<(Regex, Arc<Schema>)>),
    AdditionalProperties(Arc<Schema>),
    Dependencies(IndexMap<String, Dependency>),
    PropertyNames(Arc<Schema>),
    If(Arc<Schema>),
    Then(Arc<Schema>),
    Else(Arc<Schema>),
    AllOf(Vec<Arc<Schema>>),
    AnyOf(Vec<Arc<Schema>>),
    OneOf(Vec<Arc<Schema>>),
    Not(Arc<Schema>),
    Definitions(IndexMap<String, Arc<Schema>>),

    // Annotations.
    Title(String),
    Description(String),
    Comment(String),
    Default(JsonValue),
    Examples(Vec<JsonValue>),
    ReadOnly(bool),
    WriteOnly(bool),
    SchemaUri(String),
    /// Unrecognized keywords are preserved verbatim for round-tripping.
    Unknown(String, JsonValue),
}

impl Keyword {
    pub fn name(&self) -> &str {
        match self {
            Keyword::Type(_) => "type",
            Keyword::Enum(_) => "enum",
            Keyword::Const(_) => "const",
            Keyword::MultipleOf(_) => "multipleOf",
            Keyword::Maximum(_) => "maximum",
            Keyword::ExclusiveMaximum(_) => "exclusiveMaximum",
            Keyword::Minimum(_) => "minimum",
            Keyword::ExclusiveMinimum(_) => "exclusiveMinimum",
            Keyword::MaxLength(_) => "maxLength",
            Keyword::MinLength(_) => "minLength",
            Keyword::Pattern(_) => "pattern",
            Keyword::MaxItems(_) => "maxItems",
            Keyword::MinItems(_) => "minItems",
            Keyword::UniqueItems(_) => "uniqueItems",
            Keyword::MaxContains(_) => "maxContains",
            Keyword::MinContains(_) => "minContains",
            Keyword::MaxProperties(_) => "maxProperties",
            Keyword::MinProperties(_) => "minProperties",
            Keyword::Required(_) => "required",
            Keyword::Format { .. } => "format",
            Keyword::ContentEncoding { .. } => "contentEncoding",
            Keyword::ContentMediaType { .. } => "contentMediaType",
            Keyword::Items(_) => "items",
            Keyword::AdditionalItems(_) => "additionalItems",
            Keyword::Contains(_) => "contains",
            Keyword::Properties(_) => "properties",
            Keyword::PatternProperties(_) => "patternProperties",
            Keyword::AdditionalProperties(_) => "additionalProperties",
            Keyword::Dependencies(_) => "dependencies",
            Keyword::PropertyNames(_) => "propertyNames",
            Keyword::If(_) => "if",
            Keyword::Then(_) => "then",
            Keyword::Else(_) => "else",
            Keyword::AllOf(_) => "allOf",
            Keyword::AnyOf(_) => "anyOf",
            Keyword::OneOf(_) => "oneOf",
            Keyword::Not(_) => "not",
            Keyword::Definitions(_) => "definitions",
            Keyword::Title(_) => "title",
            Keyword::Description(_) => "description",
            Keyword::Comment(_) => "$comment",
            Keyword::Default(_) => "default",
            Keyword::Examples(_) => "examples",
            Keyword::ReadOnly(_) => "readOnly",
            Keyword::WriteOnly(_) => "writeOnly",
            Keyword::SchemaUri(_) => "$schema",
            Keyword::Unknown(name, _) => name,
        }
    }

    pub fn kind(&self) -> KeywordKind {
        match self {
            Keyword::Type(_)
            | Keyword::Enum(_)
            | Keyword::Const(_)
            | Keyword::MultipleOf(_)
            | Keyword::Maximum(_)
            | Keyword::ExclusiveMaximum(_)
            | Keyword::Minimum(_)
            | Keyword::ExclusiveMinimum(_)
            | Keyword::MaxLength(_)
            | Keyword::MinLength(_)
            | Keyword::Pattern(_)
            | Keyword::MaxItems(_)
            | Keyword::MinItems(_)
            | Keyword::UniqueItems(_)
            | Keyword::MaxContains(_)
            | Keyword::MinContains(_)
            | Keyword::MaxProperties(_)
            | Keyword::MinProperties(_)
            | Keyword::Required(_)
            | Keyword::Format { .. }
            | Keyword::ContentEncoding { .. }
            | Keyword::ContentMediaType { .. } => KeywordKind::Assertion,
            Keyword::Items(_)
            | Keyword::AdditionalItems(_)
            | Keyword::Contains(_)
            | Keyword::Properties(_)
            | Keyword::PatternProperties(_)
            | Keyword::AdditionalProperties(_)
            | Keyword::Dependencies(_)
            | Keyword::PropertyNames(_)
            | Keyword::If(_)
            | Keyword::Then(_)
            | Keyword::Else(_)
            | Keyword::AllOf(_)
            | Keyword::AnyOf(_)
            | Keyword::OneOf(_)
            | Keyword::Not(_)
            | Keyword::Definitions(_) => KeywordKind::Combiner,
            _ => KeywordKind::Annotation,
        }
    }

    /// The instance types this keyword evaluates, or `None` when it
    /// applies to every type.
    pub fn supported_types(&self) -> Option<&'static [InstanceType]> {
        const NUMERIC: &[InstanceType] = &[InstanceType::Integer, InstanceType::Number];
        const STRING: &[InstanceType] = &[InstanceType::String];
        const ARRAY: &[InstanceType] = &[InstanceType::Array];
        const OBJECT: &[InstanceType] = &[InstanceType::Object];
        match self {
            Keyword::MultipleOf(_)
            | Keyword::Maximum(_)
            | Keyword::ExclusiveMaximum(_)
            | Keyword::Minimum(_)
            | Keyword::ExclusiveMinimum(_) => Some(NUMERIC),
            Keyword::MaxLength(_)
            | Keyword::MinLength(_)
            | Keyword::Pattern(_)
            | Keyword::Format { .. }
            | Keyword::ContentEncoding { .. }
            | Keyword::ContentMediaType { .. } => Some(STRING),
            Keyword::MaxItems(_)
            | Keyword::MinItems(_)
            | Keyword::UniqueItems(_)
            | Keyword::MaxContains(_)
            | Keyword::MinContains(_)
            | Keyword::Items(_)
            | Keyword::AdditionalItems(_)
            | Keyword::Contains(_) => Some(ARRAY),
            Keyword::MaxProperties(_)
            | Keyword::MinProperties(_)
            | Keyword::Required(_)
            | Keyword::Properties(_)
            | Keyword::PatternProperties(_)
            | Keyword::AdditionalProperties(_)
            | Keyword::Dependencies(_)
            | Keyword::PropertyNames(_) => Some(OBJECT),
            _ => None,
        }
    }

    /// Whether this keyword produces an evaluator for instances of `ty`.
    pub fn applies_to(&self, ty: InstanceType) -> bool {
        if self.kind() == KeywordKind::Annotation {
            return false;
        }
        match self.supported_types() {
            None => true,
            Some(types) => types.contains(&ty),
        }
    }

    /// The subschemas this keyword carries, in document order; used by
    /// the reference resolver's graph walk.
    pub fn subschemas(&self) -> Vec<&Arc<Schema>> {
        match self {
            Keyword::Items(ItemsKind::Single(schema))
            | Keyword::AdditionalItems(schema)
            | Keyword::Contains(schema)
            | Keyword::AdditionalProperties(schema)
            | Keyword::PropertyNames(schema)
            | Keyword::If(schema)
            | Keyword::Then(schema)
            | Keyword::Else(schema)
            | Keyword::Not(schema) => vec![schema],
            Keyword::Items(ItemsKind::Tuple(list))
            | Keyword::AllOf(list)
            | Keyword::AnyOf(list)
            | Keyword::OneOf(list) => list.iter().collect(),
            Keyword::Properties(map) | Keyword::Definitions(map) => map.values().collect(),
            Keyword::PatternProperties(entries) => {
                entries.iter().map(|(_, schema)| schema).collect()
            }
            Keyword::Dependencies(map) => map
                .values()
                .filter_map(|dependency| match dependency {
                    Dependency::Schema(schema) => Some(schema),
                    Dependency::Properties(_) => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// The keyword's value rendered back to JSON.
    pub fn to_json(&self) -> JsonValue {
        fn schemas(list: &[Arc<Schema>]) -> JsonValue {
            JsonValue::Array(list.iter().map(|s| s.to_json()).collect())
        }
        fn schema_map(map: &IndexMap<String, Arc<Schema>>) -> JsonValue {
            JsonValue::Object(
                map.iter()
                    .map(|(k, s)| (k.clone(), s.to_json()))
                    .collect(),
            )
        }
        fn strings(list: &[String]) -> JsonValue {
            JsonValue::Array(list.iter().cloned().map(JsonValue::String).collect())
        }
        match self {
            Keyword::Type(types) => {
                if types.len() == 1 {
                    JsonValue::String(types[0].name().to_string())
                } else {
                    JsonValue::Array(
                        types
                            .iter()
                            .map(|t| JsonValue::String(t.name().to_string()))
                            .collect(),
                    )
                }
            }
            Keyword::Enum(values) => JsonValue::Array(values.clone()),
            Keyword::Const(value) => value.clone(),
            Keyword::MultipleOf(n)
            | Keyword::Maximum(n)
            | Keyword::ExclusiveMaximum(n)
            | Keyword::Minimum(n)
            | Keyword::ExclusiveMinimum(n) => JsonValue::Number(*n),
            Keyword::MaxLength(n)
            | Keyword::MinLength(n)
            | Keyword::MaxItems(n)
            | Keyword::MinItems(n)
            | Keyword::MaxContains(n)
            | Keyword::MinContains(n)
            | Keyword::MaxProperties(n)
            | Keyword::MinProperties(n) => JsonValue::Number(Decimal::from(*n as u64)),
            Keyword::UniqueItems(b) | Keyword::ReadOnly(b) | Keyword::WriteOnly(b) => {
                JsonValue::Bool(*b)
            }
            Keyword::Pattern(regex) => JsonValue::String(regex.as_str().to_string()),
            Keyword::Required(names) => strings(names),
            Keyword::Format { attribute, .. } => JsonValue::String(attribute.clone()),
            Keyword::ContentEncoding { name, .. } | Keyword::ContentMediaType { name, .. } => {
                JsonValue::String(name.clone())
            }
            Keyword::Items(ItemsKind::Single(schema)) => schema.to_json(),
            Keyword::Items(ItemsKind::Tuple(list)) => schemas(list),
            Keyword::AdditionalItems(schema)
            | Keyword::Contains(schema)
            | Keyword::AdditionalProperties(schema)
            | Keyword::PropertyNames(schema)
            | Keyword::If(schema)
            | Keyword::Then(schema)
            | Keyword::Else(schema)
            | Keyword::Not(schema) => schema.to_json(),
            Keyword::Properties(map) | Keyword::Definitions(map) => schema_map(map),
            Keyword::PatternProperties(entries) => JsonValue::Object(
                entries
                    .iter()
                    .map(|(regex, schema)| (regex.as_str().to_string(), schema.to_json()))
                    .collect(),
            ),
            Keyword::Dependencies(map) => JsonValue::Object(
                map.iter()
                    .map(|(k, dep)| {
                        let value = match dep {
                            Dependency::Schema(schema) => schema.to_json(),
                            Dependency::Properties(names) => strings(names),
                        };
                        (k.clone(), value)
                    })
                    .collect(),
            ),
            Keyword::AllOf(list) | Keyword::AnyOf(list) | Keyword::OneOf(list) => schemas(list),
            Keyword::Title(s) | Keyword::Description(s) | Keyword::Comment(s)
            | Keyword::SchemaUri(s) => JsonValue::String(s.clone()),
            Keyword::Default(value) => value.clone(),
            Keyword::Examples(values) => JsonValue::Array(values.clone()),
            Keyword::Unknown(_, value) => value.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_match_draft07_spelling() {
        assert_eq!(Keyword::MaxLength(1).name(), "maxLength");
        assert_eq!(Keyword::Comment(String::new()).name(), "$comment");
        assert_eq!(
            Keyword::Unknown("x-vendor".to_string(), JsonValue::Null).name(),
            "x-vendor"
        );
    }

    #[test]
    fn test_applicability() {
        let max_length = Keyword::MaxLength(3);
        assert!(max_length.applies_to(InstanceType::String));
        assert!(!max_length.applies_to(InstanceType::Integer));
        let const_kw = Keyword::Const(JsonValue::Null);
        assert!(const_kw.applies_to(InstanceType::Object));
        let title = Keyword::Title("t".to_string());
        assert!(!title.applies_to(InstanceType::String));
    }

    #[test]
    fn test_type_to_json_collapses_singleton() {
        let single = Keyword::Type(vec![InstanceType::Integer]);
        assert_eq!(
            single.to_json(),
            JsonValue::String("integer".to_string())
        );
    }
}

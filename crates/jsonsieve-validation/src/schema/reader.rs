//! Parsing schema documents into compiled schemas.
//!
//! The reader walks a parsed JSON document and drives the builder, one
//! subschema at a time, recording every subschema's JSON pointer for the
//! reference resolver. Boolean schemas are allowed anywhere a schema is
//! expected; unrecognized keywords are preserved verbatim.

use super::builder::{BuildError, SchemaBuilder};
use super::resolver;
use super::Schema;
use crate::evaluator::assembler::ValueAssembler;
use crate::format::FormatRegistry;
use crate::value::{InstanceType, JsonValue};
use jsonsieve_json::JsonEventReader;
use rust_decimal::prelude::ToPrimitive;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while reading a schema document.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error(transparent)]
    Parse(#[from] jsonsieve_json::Error),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("schema at {pointer} must be an object or a boolean")]
    NotASchema { pointer: String },

    #[error("'{keyword}' at {pointer} must be {expected}")]
    InvalidKeyword {
        keyword: String,
        pointer: String,
        expected: &'static str,
    },
}

pub type ReadResult<T> = Result<T, ReadError>;

/// Reads schema documents. Owns the format registry and the
/// strict-versus-lax format mode.
pub struct SchemaReader {
    registry: FormatRegistry,
    strict_format: bool,
}

impl SchemaReader {
    pub fn new() -> Self {
        Self {
            registry: FormatRegistry::with_defaults(),
            strict_format: false,
        }
    }

    pub fn with_strict_format(mut self, strict: bool) -> Self {
        self.strict_format = strict;
        self
    }

    pub fn with_registry(mut self, registry: FormatRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Parse, build and link a schema from JSON text.
    pub fn read_str(&self, input: &str) -> ReadResult<Arc<Schema>> {
        let mut assembler = ValueAssembler::new();
        let mut reader = JsonEventReader::new(input);
        let mut document = None;
        while let Some(event) = reader.next_event()? {
            if let Some(value) = assembler.feed(&event.kind) {
                document = Some(value);
            }
        }
        match document {
            Some(document) => self.read_document(&document),
            None => Err(ReadError::NotASchema {
                pointer: "#".to_string(),
            }),
        }
    }

    /// Build and link a schema from an already-parsed document.
    pub fn read_document(&self, document: &JsonValue) -> ReadResult<Arc<Schema>> {
        let mut by_pointer = HashMap::new();
        let root = self.read_schema(document, "#", &mut by_pointer)?;
        resolver::resolve(&root, &by_pointer);
        Ok(root)
    }

    fn read_schema(
        &self,
        value: &JsonValue,
        pointer: &str,
        by_pointer: &mut HashMap<String, Arc<Schema>>,
    ) -> ReadResult<Arc<Schema>> {
        let schema = match value {
            JsonValue::Bool(accept) => Arc::new(Schema::Always(*accept)),
            JsonValue::Object(members) => self.read_object(members, pointer, by_pointer)?,
            _ => {
                return Err(ReadError::NotASchema {
                    pointer: pointer.to_string(),
                })
            }
        };
        by_pointer.insert(pointer.to_string(), Arc::clone(&schema));
        Ok(schema)
    }

    fn read_object(
        &self,
        members: &[(String, JsonValue)],
        pointer: &str,
        by_pointer: &mut HashMap<String, Arc<Schema>>,
    ) -> ReadResult<Arc<Schema>> {
        let mut builder = SchemaBuilder::new(&self.registry, self.strict_format);
        for (key, value) in members {
            let at = |suffix: &str| format!("{pointer}/{suffix}");
            builder = match key.as_str() {
                "$id" => builder.with_id(self.string(value, key, pointer)?),
                "$ref" => builder.with_ref(self.string(value, key, pointer)?),
                "$schema" => builder.with_schema_uri(self.string(value, key, pointer)?),
                "type" => builder.with_type(self.types(value, pointer)?)?,
                "enum" => {
                    let values = self.array(value, key, pointer)?.to_vec();
                    builder.with_enum(values)?
                }
                "const" => builder.with_const(value.clone()),
                "multipleOf" => builder.with_multiple_of(self.number(value, key, pointer)?)?,
                "maximum" => builder.with_maximum(self.number(value, key, pointer)?),
                "exclusiveMaximum" => {
                    builder.with_exclusive_maximum(self.number(value, key, pointer)?)
                }
                "minimum" => builder.with_minimum(self.number(value, key, pointer)?),
                "exclusiveMinimum" => {
                    builder.with_exclusive_minimum(self.number(value, key, pointer)?)
                }
                "maxLength" => builder.with_max_length(self.size(value, key, pointer)?),
                "minLength" => builder.with_min_length(self.size(value, key, pointer)?),
                "pattern" => builder.with_pattern(&self.string(value, key, pointer)?)?,
                "maxItems" => builder.with_max_items(self.size(value, key, pointer)?),
                "minItems" => builder.with_min_items(self.size(value, key, pointer)?),
                "uniqueItems" => builder.with_unique_items(self.bool(value, key, pointer)?),
                "maxContains" => builder.with_max_contains(self.size(value, key, pointer)?),
                "minContains" => builder.with_min_contains(self.size(value, key, pointer)?),
                "maxProperties" => builder.with_max_properties(self.size(value, key, pointer)?),
                "minProperties" => builder.with_min_properties(self.size(value, key, pointer)?),
                "required" => builder.with_required(self.strings(value, key, pointer)?)?,
                "format" => builder.with_format(&self.string(value, key, pointer)?)?,
                "contentEncoding" => {
                    builder.with_content_encoding(&self.string(value, key, pointer)?)
                }
                "contentMediaType" => {
                    builder.with_content_media_type(&self.string(value, key, pointer)?)
                }
                "items" => match value {
                    JsonValue::Array(list) => {
                        let mut schemas = Vec::with_capacity(list.len());
                        for (i, item) in list.iter().enumerate() {
                            schemas.push(self.read_schema(
                                item,
                                &at(&format!("items/{i}")),
                                by_pointer,
                            )?);
                        }
                        builder.with_items_tuple(schemas)?
                    }
                    _ => builder.with_items(self.read_schema(value, &at("items"), by_pointer)?),
                },
                "additionalItems" => builder.with_additional_items(self.read_schema(
                    value,
                    &at("additionalItems"),
                    by_pointer,
                )?),
                "contains" => {
                    builder.with_contains(self.read_schema(value, &at("contains"), by_pointer)?)
                }
                "properties" => {
                    let members = self.object(value, key, pointer)?;
                    for (name, subschema) in members {
                        let sub = self.read_schema(
                            subschema,
                            &at(&format!("properties/{}", escape_pointer(name))),
                            by_pointer,
                        )?;
                        builder = builder.with_property(name.clone(), sub);
                    }
                    builder
                }
                "patternProperties" => {
                    let members = self.object(value, key, pointer)?;
                    for (pattern, subschema) in members {
                        let sub = self.read_schema(
                            subschema,
                            &at(&format!("patternProperties/{}", escape_pointer(pattern))),
                            by_pointer,
                        )?;
                        builder = builder.with_pattern_property(pattern, sub)?;
                    }
                    builder
                }
                "additionalProperties" => builder.with_additional_properties(self.read_schema(
                    value,
                    &at("additionalProperties"),
                    by_pointer,
                )?),
                "dependencies" => {
                    let members = self.object(value, key, pointer)?;
                    for (name, entry) in members {
                        builder = match entry {
                            JsonValue::Array(_) => builder.with_dependency_properties(
                                name.clone(),
                                self.strings(entry, key, pointer)?,
                            )?,
                            _ => {
                                let sub = self.read_schema(
                                    entry,
                                    &at(&format!("dependencies/{}", escape_pointer(name))),
                                    by_pointer,
                                )?;
                                builder.with_dependency_schema(name.clone(), sub)
                            }
                        };
                    }
                    builder
                }
                "propertyNames" => builder.with_property_names(self.read_schema(
                    value,
                    &at("propertyNames"),
                    by_pointer,
                )?),
                "if" => builder.with_if(self.read_schema(value, &at("if"), by_pointer)?),
                "then" => builder.with_then(self.read_schema(value, &at("then"), by_pointer)?),
                "else" => builder.with_else(self.read_schema(value, &at("else"), by_pointer)?),
                "allOf" => builder.with_all_of(self.schema_list(value, key, pointer, by_pointer)?)?,
                "anyOf" => builder.with_any_of(self.schema_list(value, key, pointer, by_pointer)?)?,
                "oneOf" => builder.with_one_of(self.schema_list(value, key, pointer, by_pointer)?)?,
                "not" => builder.with_not(self.read_schema(value, &at("not"), by_pointer)?),
                "definitions" => {
                    let members = self.object(value, key, pointer)?;
                    for (name, subschema) in members {
                        let sub = self.read_schema(
                            subschema,
                            &at(&format!("definitions/{}", escape_pointer(name))),
                            by_pointer,
                        )?;
                        builder = builder.with_definition(name.clone(), sub);
                    }
                    builder
                }
                "title" => builder.with_title(self.string(value, key, pointer)?),
                "description" => builder.with_description(self.string(value, key, pointer)?),
                "$comment" => builder.with_comment(self.string(value, key, pointer)?),
                "default" => builder.with_default(value.clone()),
                "examples" => builder.with_examples(self.array(value, key, pointer)?.to_vec()),
                "readOnly" => builder.with_read_only(self.bool(value, key, pointer)?),
                "writeOnly" => builder.with_write_only(self.bool(value, key, pointer)?),
                _ => builder.with_unknown(key.clone(), value.clone()),
            };
        }
        Ok(builder.build())
    }

    fn schema_list(
        &self,
        value: &JsonValue,
        keyword: &str,
        pointer: &str,
        by_pointer: &mut HashMap<String, Arc<Schema>>,
    ) -> ReadResult<Vec<Arc<Schema>>> {
        let list = self.array(value, keyword, pointer)?;
        let mut schemas = Vec::with_capacity(list.len());
        for (i, item) in list.iter().enumerate() {
            schemas.push(self.read_schema(item, &format!("{pointer}/{keyword}/{i}"), by_pointer)?);
        }
        Ok(schemas)
    }

    fn invalid(&self, keyword: &str, pointer: &str, expected: &'static str) -> ReadError {
        ReadError::InvalidKeyword {
            keyword: keyword.to_string(),
            pointer: pointer.to_string(),
            expected,
        }
    }

    fn string(&self, value: &JsonValue, keyword: &str, pointer: &str) -> ReadResult<String> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.invalid(keyword, pointer, "a string"))
    }

    fn bool(&self, value: &JsonValue, keyword: &str, pointer: &str) -> ReadResult<bool> {
        value
            .as_bool()
            .ok_or_else(|| self.invalid(keyword, pointer, "a boolean"))
    }

    fn number(
        &self,
        value: &JsonValue,
        keyword: &str,
        pointer: &str,
    ) -> ReadResult<rust_decimal::Decimal> {
        value
            .as_decimal()
            .ok_or_else(|| self.invalid(keyword, pointer, "a number"))
    }

    fn size(&self, value: &JsonValue, keyword: &str, pointer: &str) -> ReadResult<usize> {
        let expected = "a non-negative integer";
        let number = value
            .as_decimal()
            .ok_or_else(|| self.invalid(keyword, pointer, expected))?;
        if number != number.trunc() {
            return Err(self.invalid(keyword, pointer, expected));
        }
        number
            .to_usize()
            .ok_or_else(|| self.invalid(keyword, pointer, expected))
    }

    fn array<'v>(
        &self,
        value: &'v JsonValue,
        keyword: &str,
        pointer: &str,
    ) -> ReadResult<&'v [JsonValue]> {
        value
            .as_array()
            .ok_or_else(|| self.invalid(keyword, pointer, "an array"))
    }

    fn object<'v>(
        &self,
        value: &'v JsonValue,
        keyword: &str,
        pointer: &str,
    ) -> ReadResult<&'v [(String, JsonValue)]> {
        value
            .as_object()
            .ok_or_else(|| self.invalid(keyword, pointer, "an object"))
    }

    fn strings(&self, value: &JsonValue, keyword: &str, pointer: &str) -> ReadResult<Vec<String>> {
        let list = self.array(value, keyword, pointer)?;
        list.iter()
            .map(|item| self.string(item, keyword, pointer))
            .collect()
    }

    fn types(&self, value: &JsonValue, pointer: &str) -> ReadResult<Vec<InstanceType>> {
        let one = |value: &JsonValue| -> ReadResult<InstanceType> {
            let name = self.string(value, "type", pointer)?;
            InstanceType::from_name(&name)
                .ok_or_else(|| self.invalid("type", pointer, "a simple type name"))
        };
        match value {
            JsonValue::Array(list) => list.iter().map(one).collect(),
            _ => Ok(vec![one(value)?]),
        }
    }
}

impl Default for SchemaReader {
    fn default() -> Self {
        Self::new()
    }
}

/// RFC 6901 escaping for pointer segments built from property names.
fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyword::Keyword;

    #[test]
    fn test_reads_boolean_schema() {
        let reader = SchemaReader::new();
        assert!(matches!(
            &*reader.read_str("true").unwrap(),
            Schema::Always(true)
        ));
        assert!(matches!(
            &*reader.read_str("false").unwrap(),
            Schema::Always(false)
        ));
    }

    #[test]
    fn test_rejects_non_schema_document() {
        let reader = SchemaReader::new();
        assert!(matches!(
            reader.read_str("[1,2]"),
            Err(ReadError::NotASchema { .. })
        ));
    }

    #[test]
    fn test_preserves_keyword_order() {
        let reader = SchemaReader::new();
        let schema = reader
            .read_str(r#"{"minimum": 0, "type": "integer", "maximum": 10}"#)
            .unwrap();
        match &*schema {
            Schema::Object(object) => {
                let names: Vec<&str> = object.keywords().keys().map(String::as_str).collect();
                assert_eq!(names, vec!["minimum", "type", "maximum"]);
            }
            _ => panic!("expected object schema"),
        }
    }

    #[test]
    fn test_unknown_keywords_are_preserved() {
        let reader = SchemaReader::new();
        let schema = reader.read_str(r#"{"x-vendor": {"a": 1}}"#).unwrap();
        match &*schema {
            Schema::Object(object) => {
                assert!(matches!(
                    object.keywords().get("x-vendor"),
                    Some(Keyword::Unknown(..))
                ));
            }
            _ => panic!("expected object schema"),
        }
    }

    #[test]
    fn test_local_ref_resolves() {
        let reader = SchemaReader::new();
        let schema = reader
            .read_str(
                r##"{
                    "definitions": {"positive": {"type": "integer", "minimum": 1}},
                    "$ref": "#/definitions/positive"
                }"##,
            )
            .unwrap();
        match &*schema {
            Schema::Ref(reference) => assert!(reference.target().is_some()),
            _ => panic!("expected reference schema"),
        }
    }

    #[test]
    fn test_unresolved_ref_is_linked_to_sentinel() {
        let reader = SchemaReader::new();
        let schema = reader.read_str(r##"{"$ref": "#/definitions/nope"}"##).unwrap();
        match &*schema {
            Schema::Ref(reference) => assert!(reference.target().is_none()),
            _ => panic!("expected reference schema"),
        }
    }

    #[test]
    fn test_invalid_size_keyword() {
        let reader = SchemaReader::new();
        assert!(matches!(
            reader.read_str(r#"{"maxLength": -1}"#),
            Err(ReadError::InvalidKeyword { .. })
        ));
        assert!(matches!(
            reader.read_str(r#"{"maxLength": 1.5}"#),
            Err(ReadError::InvalidKeyword { .. })
        ));
    }
}

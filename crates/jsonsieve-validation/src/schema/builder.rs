//! Fluent, one-shot construction of schemas.
//!
//! The builder checks structural constraints as keywords arrive: empty
//! collections, duplicates, non-positive multipliers, uncompilable
//! patterns, unknown formats in strict mode. A build error is a schema
//! authoring problem, fatal at construction time; it is disjoint from
//! validation problems, which are never fatal.

use super::{ObjectSchema, Schema, SchemaReference};
use crate::content::{ContentEncodingScheme, ContentMimeType};
use crate::format::FormatRegistry;
use crate::keyword::{Dependency, ItemsKind, Keyword};
use crate::value::{InstanceType, JsonValue};
use indexmap::IndexMap;
use regex::Regex;
use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;

/// Errors detected while building a schema.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("'{keyword}' must not be empty")]
    EmptyCollection { keyword: &'static str },

    #[error("'{keyword}' must not contain duplicate entries")]
    DuplicateEntries { keyword: &'static str },

    #[error("'{keyword}' must be positive, but was {value}")]
    NonPositive {
        keyword: &'static str,
        value: Decimal,
    },

    #[error("invalid regular expression \"{pattern}\": {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: Box<regex::Error>,
    },

    #[error("unknown format attribute \"{attribute}\"")]
    UnknownFormat { attribute: String },
}

pub type BuildResult<T> = Result<T, BuildError>;

/// Builds one schema; subschemas are built first and passed in.
///
/// Map-valued keywords (`properties`, `patternProperties`, `dependencies`,
/// `definitions`) accumulate entry by entry and are emitted as one keyword
/// at [`SchemaBuilder::build`].
pub struct SchemaBuilder<'r> {
    registry: &'r FormatRegistry,
    strict_format: bool,
    id: Option<String>,
    ref_uri: Option<String>,
    keywords: IndexMap<String, Keyword>,
    properties: IndexMap<String, Arc<Schema>>,
    pattern_properties: Vec<(Regex, Arc<Schema>)>,
    dependencies: IndexMap<String, Dependency>,
    definitions: IndexMap<String, Arc<Schema>>,
}

impl<'r> SchemaBuilder<'r> {
    pub fn new(registry: &'r FormatRegistry, strict_format: bool) -> Self {
        Self {
            registry,
            strict_format,
            id: None,
            ref_uri: None,
            keywords: IndexMap::new(),
            properties: IndexMap::new(),
            pattern_properties: Vec::new(),
            dependencies: IndexMap::new(),
            definitions: IndexMap::new(),
        }
    }

    fn add(mut self, keyword: Keyword) -> Self {
        self.keywords.insert(keyword.name().to_string(), keyword);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_ref(mut self, uri: impl Into<String>) -> Self {
        self.ref_uri = Some(uri.into());
        self
    }

    pub fn with_schema_uri(self, uri: impl Into<String>) -> Self {
        self.add(Keyword::SchemaUri(uri.into()))
    }

    pub fn with_type(self, types: Vec<InstanceType>) -> BuildResult<Self> {
        require_non_empty(&types, "type")?;
        require_unique(&types, "type")?;
        Ok(self.add(Keyword::Type(types)))
    }

    pub fn with_enum(self, values: Vec<JsonValue>) -> BuildResult<Self> {
        require_non_empty(&values, "enum")?;
        require_unique(&values, "enum")?;
        Ok(self.add(Keyword::Enum(values)))
    }

    pub fn with_const(self, value: JsonValue) -> Self {
        self.add(Keyword::Const(value))
    }

    pub fn with_multiple_of(self, factor: Decimal) -> BuildResult<Self> {
        if factor <= Decimal::ZERO {
            return Err(BuildError::NonPositive {
                keyword: "multipleOf",
                value: factor,
            });
        }
        Ok(self.add(Keyword::MultipleOf(factor)))
    }

    pub fn with_maximum(self, bound: Decimal) -> Self {
        self.add(Keyword::Maximum(bound))
    }

    pub fn with_exclusive_maximum(self, bound: Decimal) -> Self {
        self.add(Keyword::ExclusiveMaximum(bound))
    }

    pub fn with_minimum(self, bound: Decimal) -> Self {
        self.add(Keyword::Minimum(bound))
    }

    pub fn with_exclusive_minimum(self, bound: Decimal) -> Self {
        self.add(Keyword::ExclusiveMinimum(bound))
    }

    pub fn with_max_length(self, limit: usize) -> Self {
        self.add(Keyword::MaxLength(limit))
    }

    pub fn with_min_length(self, limit: usize) -> Self {
        self.add(Keyword::MinLength(limit))
    }

    pub fn with_pattern(self, pattern: &str) -> BuildResult<Self> {
        let regex = compile_pattern(pattern)?;
        Ok(self.add(Keyword::Pattern(regex)))
    }

    pub fn with_max_items(self, limit: usize) -> Self {
        self.add(Keyword::MaxItems(limit))
    }

    pub fn with_min_items(self, limit: usize) -> Self {
        self.add(Keyword::MinItems(limit))
    }

    pub fn with_unique_items(self, unique: bool) -> Self {
        self.add(Keyword::UniqueItems(unique))
    }

    pub fn with_max_contains(self, limit: usize) -> Self {
        self.add(Keyword::MaxContains(limit))
    }

    pub fn with_min_contains(self, limit: usize) -> Self {
        self.add(Keyword::MinContains(limit))
    }

    pub fn with_max_properties(self, limit: usize) -> Self {
        self.add(Keyword::MaxProperties(limit))
    }

    pub fn with_min_properties(self, limit: usize) -> Self {
        self.add(Keyword::MinProperties(limit))
    }

    pub fn with_required(self, names: Vec<String>) -> BuildResult<Self> {
        require_non_empty(&names, "required")?;
        require_unique(&names, "required")?;
        Ok(self.add(Keyword::Required(names)))
    }

    /// In strict mode an unknown attribute is a build error; in lax mode
    /// it becomes an inert annotation that always matches.
    pub fn with_format(self, attribute: &str) -> BuildResult<Self> {
        let matcher = self.registry.get(attribute);
        if matcher.is_none() && self.strict_format {
            return Err(BuildError::UnknownFormat {
                attribute: attribute.to_string(),
            });
        }
        Ok(self.add(Keyword::Format {
            attribute: attribute.to_string(),
            matcher,
        }))
    }

    /// Unknown encodings degrade to inert annotations.
    pub fn with_content_encoding(self, name: &str) -> Self {
        let scheme = ContentEncodingScheme::from_name(name);
        self.add(Keyword::ContentEncoding {
            name: name.to_string(),
            scheme,
        })
    }

    /// Unknown media types degrade to inert annotations.
    pub fn with_content_media_type(self, name: &str) -> Self {
        let mime_type = ContentMimeType::from_name(name);
        self.add(Keyword::ContentMediaType {
            name: name.to_string(),
            mime_type,
        })
    }

    pub fn with_items(self, schema: Arc<Schema>) -> Self {
        self.add(Keyword::Items(ItemsKind::Single(schema)))
    }

    pub fn with_items_tuple(self, schemas: Vec<Arc<Schema>>) -> BuildResult<Self> {
        require_non_empty(&schemas, "items")?;
        Ok(self.add(Keyword::Items(ItemsKind::Tuple(schemas))))
    }

    pub fn with_additional_items(self, schema: Arc<Schema>) -> Self {
        self.add(Keyword::AdditionalItems(schema))
    }

    pub fn with_contains(self, schema: Arc<Schema>) -> Self {
        self.add(Keyword::Contains(schema))
    }

    pub fn with_property(mut self, name: impl Into<String>, schema: Arc<Schema>) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    pub fn with_pattern_property(
        mut self,
        pattern: &str,
        schema: Arc<Schema>,
    ) -> BuildResult<Self> {
        let regex = compile_pattern(pattern)?;
        self.pattern_properties.push((regex, schema));
        Ok(self)
    }

    pub fn with_additional_properties(self, schema: Arc<Schema>) -> Self {
        self.add(Keyword::AdditionalProperties(schema))
    }

    pub fn with_dependency_properties(
        mut self,
        name: impl Into<String>,
        required: Vec<String>,
    ) -> BuildResult<Self> {
        require_unique(&required, "dependencies")?;
        self.dependencies
            .insert(name.into(), Dependency::Properties(required));
        Ok(self)
    }

    pub fn with_dependency_schema(mut self, name: impl Into<String>, schema: Arc<Schema>) -> Self {
        self.dependencies
            .insert(name.into(), Dependency::Schema(schema));
        self
    }

    pub fn with_property_names(self, schema: Arc<Schema>) -> Self {
        self.add(Keyword::PropertyNames(schema))
    }

    pub fn with_if(self, schema: Arc<Schema>) -> Self {
        self.add(Keyword::If(schema))
    }

    pub fn with_then(self, schema: Arc<Schema>) -> Self {
        self.add(Keyword::Then(schema))
    }

    pub fn with_else(self, schema: Arc<Schema>) -> Self {
        self.add(Keyword::Else(schema))
    }

    pub fn with_all_of(self, schemas: Vec<Arc<Schema>>) -> BuildResult<Self> {
        require_non_empty(&schemas, "allOf")?;
        Ok(self.add(Keyword::AllOf(schemas)))
    }

    pub fn with_any_of(self, schemas: Vec<Arc<Schema>>) -> BuildResult<Self> {
        require_non_empty(&schemas, "anyOf")?;
        Ok(self.add(Keyword::AnyOf(schemas)))
    }

    pub fn with_one_of(self, schemas: Vec<Arc<Schema>>) -> BuildResult<Self> {
        require_non_empty(&schemas, "oneOf")?;
        Ok(self.add(Keyword::OneOf(schemas)))
    }

    pub fn with_not(self, schema: Arc<Schema>) -> Self {
        self.add(Keyword::Not(schema))
    }

    pub fn with_definition(mut self, name: impl Into<String>, schema: Arc<Schema>) -> Self {
        self.definitions.insert(name.into(), schema);
        self
    }

    pub fn with_title(self, title: impl Into<String>) -> Self {
        self.add(Keyword::Title(title.into()))
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        self.add(Keyword::Description(description.into()))
    }

    pub fn with_comment(self, comment: impl Into<String>) -> Self {
        self.add(Keyword::Comment(comment.into()))
    }

    pub fn with_default(self, value: JsonValue) -> Self {
        self.add(Keyword::Default(value))
    }

    pub fn with_examples(self, values: Vec<JsonValue>) -> Self {
        self.add(Keyword::Examples(values))
    }

    pub fn with_read_only(self, value: bool) -> Self {
        self.add(Keyword::ReadOnly(value))
    }

    pub fn with_write_only(self, value: bool) -> Self {
        self.add(Keyword::WriteOnly(value))
    }

    pub fn with_unknown(self, name: impl Into<String>, value: JsonValue) -> Self {
        let name = name.into();
        self.add(Keyword::Unknown(name, value))
    }

    /// Finalize: deferred maps become single keywords, and the result is
    /// a reference when `$ref` was present.
    pub fn build(mut self) -> Arc<Schema> {
        if !self.properties.is_empty() {
            let keyword = Keyword::Properties(std::mem::take(&mut self.properties));
            self.keywords.insert("properties".to_string(), keyword);
        }
        if !self.pattern_properties.is_empty() {
            let keyword = Keyword::PatternProperties(std::mem::take(&mut self.pattern_properties));
            self.keywords.insert("patternProperties".to_string(), keyword);
        }
        if !self.dependencies.is_empty() {
            let keyword = Keyword::Dependencies(std::mem::take(&mut self.dependencies));
            self.keywords.insert("dependencies".to_string(), keyword);
        }
        if !self.definitions.is_empty() {
            let keyword = Keyword::Definitions(std::mem::take(&mut self.definitions));
            self.keywords.insert("definitions".to_string(), keyword);
        }
        match self.ref_uri {
            Some(uri) => Arc::new(Schema::Ref(SchemaReference::new(uri, self.id, self.keywords))),
            None => Arc::new(Schema::Object(ObjectSchema::new(self.id, self.keywords))),
        }
    }
}

fn compile_pattern(pattern: &str) -> BuildResult<Regex> {
    Regex::new(pattern).map_err(|source| BuildError::InvalidPattern {
        pattern: pattern.to_string(),
        source: Box::new(source),
    })
}

fn require_non_empty<T>(items: &[T], keyword: &'static str) -> BuildResult<()> {
    if items.is_empty() {
        return Err(BuildError::EmptyCollection { keyword });
    }
    Ok(())
}

fn require_unique<T: PartialEq>(items: &[T], keyword: &'static str) -> BuildResult<()> {
    for (i, item) in items.iter().enumerate() {
        if items[..i].contains(item) {
            return Err(BuildError::DuplicateEntries { keyword });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn builder(registry: &FormatRegistry) -> SchemaBuilder<'_> {
        SchemaBuilder::new(registry, false)
    }

    #[test]
    fn test_rejects_empty_enum() {
        let registry = FormatRegistry::with_defaults();
        assert!(matches!(
            builder(&registry).with_enum(vec![]),
            Err(BuildError::EmptyCollection { keyword: "enum" })
        ));
    }

    #[test]
    fn test_rejects_duplicate_enum_values() {
        let registry = FormatRegistry::with_defaults();
        let values = vec![JsonValue::Bool(true), JsonValue::Bool(true)];
        assert!(matches!(
            builder(&registry).with_enum(values),
            Err(BuildError::DuplicateEntries { .. })
        ));
    }

    #[test]
    fn test_rejects_non_positive_multiple_of() {
        let registry = FormatRegistry::with_defaults();
        assert!(matches!(
            builder(&registry).with_multiple_of(Decimal::ZERO),
            Err(BuildError::NonPositive { .. })
        ));
        assert!(builder(&registry)
            .with_multiple_of(Decimal::from_str("0.1").unwrap())
            .is_ok());
    }

    #[test]
    fn test_rejects_bad_pattern() {
        let registry = FormatRegistry::with_defaults();
        assert!(matches!(
            builder(&registry).with_pattern("(unclosed"),
            Err(BuildError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_unknown_format_strict_vs_lax() {
        let registry = FormatRegistry::with_defaults();
        assert!(matches!(
            SchemaBuilder::new(&registry, true).with_format("zzz"),
            Err(BuildError::UnknownFormat { .. })
        ));
        let schema = builder(&registry).with_format("zzz").unwrap().build();
        // lax: inert annotation, accepts any string
        let mut evaluator =
            schema.evaluator(crate::value::InstanceType::String, true);
        let event = jsonsieve_json::Event::new(
            jsonsieve_json::EventKind::String("anything".to_string()),
            jsonsieve_json::Location::default(),
        );
        let mut sink = Vec::new();
        assert_eq!(
            evaluator.evaluate(&event, 0, &mut sink),
            crate::evaluator::Verdict::True
        );
    }

    #[test]
    fn test_deferred_maps_emit_single_keywords() {
        let registry = FormatRegistry::with_defaults();
        let sub = builder(&registry).build();
        let schema = builder(&registry)
            .with_property("a", Arc::clone(&sub))
            .with_property("b", sub)
            .build();
        match &*schema {
            Schema::Object(object) => {
                assert_eq!(object.keywords().len(), 1);
                assert!(object.keywords().contains_key("properties"));
            }
            _ => panic!("expected object schema"),
        }
    }
}

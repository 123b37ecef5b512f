//! The compiled schema model.
//!
//! A schema is one of: a boolean schema (`true` accepts everything,
//! `false` nothing), an object schema (an ordered keyword set, optionally
//! carrying `$id`), or a reference whose target is filled in by the
//! resolver after construction. The graph may be cyclic; targets are
//! dereferenced lazily at evaluator-creation time, so recursion bottoms
//! out on the event stream itself.

pub mod builder;
pub mod reader;
pub mod resolver;

use crate::content::{ContentEncodingEvaluator, ContentMediaTypeEvaluator};
use crate::evaluator::array::{
    ContainsEvaluator, ItemCountEvaluator, ItemsEvaluator, ItemsSchemas, UniqueItemsEvaluator,
};
use crate::evaluator::conditional::ConditionalEvaluator;
use crate::evaluator::logical::{ConjunctiveEvaluator, DisjunctiveEvaluator, ExclusiveEvaluator};
use crate::evaluator::object::{
    PropertiesEvaluator, PropertyCountEvaluator, PropertyDependencyEvaluator,
    PropertyNamesEvaluator, RequiredEvaluator, SchemaDependencyEvaluator,
};
use crate::evaluator::scalar::{
    EqualityEvaluator, EqualityKind, FormatEvaluator, NumericAssertion, NumericEvaluator,
    PatternEvaluator, StringLengthEvaluator, TypeEvaluator,
};
use crate::evaluator::{
    is_structured, AlwaysFalse, AlwaysTrue, BoxedEvaluator, DereferenceEvaluator, Shallow,
};
use crate::keyword::{Dependency, ItemsKind, Keyword, KeywordKind};
use crate::value::{InstanceType, JsonValue};
use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// A compiled schema.
#[derive(Debug)]
pub enum Schema {
    /// `true` / `false`.
    Always(bool),
    Object(ObjectSchema),
    Ref(SchemaReference),
}

impl Schema {
    /// Create the evaluator for an instance of the given type.
    ///
    /// `affirmative` is false under an odd number of enclosing `not`s;
    /// every keyword knows how to produce its negated evaluator.
    pub fn evaluator(&self, ty: InstanceType, affirmative: bool) -> BoxedEvaluator {
        match self {
            Schema::Always(value) => {
                if *value == affirmative {
                    Box::new(AlwaysTrue)
                } else {
                    Box::new(AlwaysFalse)
                }
            }
            Schema::Object(schema) => schema.evaluator(ty, affirmative),
            Schema::Ref(reference) => match reference.target() {
                Some(target) => target.evaluator(ty, affirmative),
                None => Box::new(DereferenceEvaluator::new(reference.display_uri())),
            },
        }
    }

    /// Serialize back to JSON, deterministically, in keyword insertion
    /// order. References render as `$ref` and never recurse into their
    /// targets, so cyclic graphs are safe.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Schema::Always(value) => JsonValue::Bool(*value),
            Schema::Object(schema) => schema.to_json(),
            Schema::Ref(reference) => reference.to_json(),
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Schema::Object(schema) => schema.id.as_deref(),
            Schema::Ref(reference) => reference.id.as_deref(),
            Schema::Always(_) => None,
        }
    }

    /// Direct subschemas, for graph walks.
    pub fn subschemas(&self) -> Vec<&Arc<Schema>> {
        match self {
            Schema::Always(_) => Vec::new(),
            Schema::Object(schema) => schema
                .keywords
                .values()
                .flat_map(Keyword::subschemas)
                .collect(),
            Schema::Ref(reference) => reference
                .keywords
                .values()
                .flat_map(Keyword::subschemas)
                .collect(),
        }
    }
}

/// An object schema: ordered keywords plus an optional `$id`.
#[derive(Debug)]
pub struct ObjectSchema {
    pub(crate) id: Option<String>,
    pub(crate) keywords: IndexMap<String, Keyword>,
}

impl ObjectSchema {
    pub fn new(id: Option<String>, keywords: IndexMap<String, Keyword>) -> Self {
        Self { id, keywords }
    }

    pub fn keywords(&self) -> &IndexMap<String, Keyword> {
        &self.keywords
    }

    pub fn to_json(&self) -> JsonValue {
        let mut members = Vec::with_capacity(self.keywords.len() + 1);
        if let Some(id) = &self.id {
            members.push(("$id".to_string(), JsonValue::String(id.clone())));
        }
        for (name, keyword) in &self.keywords {
            members.push((name.clone(), keyword.to_json()));
        }
        JsonValue::Object(members)
    }

    /// Assertion keywords whose supported types exclude `ty`; used for the
    /// inapplicability guard. Returns the first offender's name and the
    /// union of their supported types.
    fn inapplicable_assertions(&self, ty: InstanceType) -> Option<(&str, Vec<InstanceType>)> {
        let mut first: Option<&str> = None;
        let mut union: Vec<InstanceType> = Vec::new();
        for keyword in self.keywords.values() {
            if keyword.kind() != KeywordKind::Assertion {
                continue;
            }
            // Keywords that degraded to inert annotations, and refinements
            // that only qualify another keyword, assert nothing.
            match keyword {
                Keyword::Format { matcher: None, .. }
                | Keyword::ContentEncoding { scheme: None, .. }
                | Keyword::ContentMediaType {
                    mime_type: None, ..
                }
                | Keyword::UniqueItems(false)
                | Keyword::MinContains(_)
                | Keyword::MaxContains(_) => continue,
                _ => {}
            }
            let Some(types) = keyword.supported_types() else {
                continue;
            };
            if types.contains(&ty) {
                continue;
            }
            first.get_or_insert(keyword.name());
            for t in types {
                if !union.contains(t) {
                    union.push(*t);
                }
            }
        }
        first.map(|name| (name, union))
    }

    fn evaluator(&self, ty: InstanceType, affirmative: bool) -> BoxedEvaluator {
        // A failing `type` assertion guards the whole schema: the single
        // type problem is the verdict and no sibling keyword evaluates.
        if let Some(Keyword::Type(types)) = self.keywords.get("type") {
            if !types.iter().any(|t| ty.satisfies(*t)) {
                return if affirmative {
                    Box::new(TypeEvaluator::new(types.clone(), ty, true))
                } else {
                    Box::new(AlwaysTrue)
                };
            }
        }
        let mut children: Vec<BoxedEvaluator> = Vec::new();
        let mut properties_done = false;
        let mut items_done = false;
        let mut conditional_done = false;
        for keyword in self.keywords.values() {
            if !keyword.applies_to(ty) {
                continue;
            }
            match keyword {
                Keyword::Type(types) => {
                    // Affirmative match was established by the guard.
                    if !affirmative {
                        children.push(Box::new(TypeEvaluator::new(types.clone(), ty, false)));
                    }
                }
                Keyword::Enum(values) => children.push(Box::new(EqualityEvaluator::new(
                    EqualityKind::Enum(values.clone()),
                    affirmative,
                ))),
                Keyword::Const(value) => children.push(Box::new(EqualityEvaluator::new(
                    EqualityKind::Const(value.clone()),
                    affirmative,
                ))),
                Keyword::MultipleOf(bound) => children.push(Box::new(NumericEvaluator::new(
                    NumericAssertion::MultipleOf,
                    *bound,
                    affirmative,
                ))),
                Keyword::Maximum(bound) => children.push(Box::new(NumericEvaluator::new(
                    NumericAssertion::Maximum,
                    *bound,
                    affirmative,
                ))),
                Keyword::ExclusiveMaximum(bound) => children.push(Box::new(
                    NumericEvaluator::new(NumericAssertion::ExclusiveMaximum, *bound, affirmative),
                )),
                Keyword::Minimum(bound) => children.push(Box::new(NumericEvaluator::new(
                    NumericAssertion::Minimum,
                    *bound,
                    affirmative,
                ))),
                Keyword::ExclusiveMinimum(bound) => children.push(Box::new(
                    NumericEvaluator::new(NumericAssertion::ExclusiveMinimum, *bound, affirmative),
                )),
                Keyword::MaxLength(limit) => {
                    children.push(Box::new(StringLengthEvaluator::max(*limit, affirmative)))
                }
                Keyword::MinLength(limit) => {
                    children.push(Box::new(StringLengthEvaluator::min(*limit, affirmative)))
                }
                Keyword::Pattern(regex) => {
                    children.push(Box::new(PatternEvaluator::new(regex.clone(), affirmative)))
                }
                Keyword::Format { attribute, matcher } => {
                    if let Some(matcher) = matcher {
                        children.push(Box::new(FormatEvaluator::new(
                            attribute.clone(),
                            *matcher,
                            affirmative,
                        )));
                    }
                }
                Keyword::ContentEncoding { scheme, .. } => {
                    if let Some(scheme) = scheme {
                        children.push(Box::new(ContentEncodingEvaluator::new(
                            *scheme,
                            affirmative,
                        )));
                    }
                }
                Keyword::ContentMediaType { mime_type, .. } => {
                    let Some(mime_type) = mime_type else { continue };
                    // A sibling contentEncoding with an unknown scheme
                    // makes the media type untestable.
                    let encoding = match self.keywords.get("contentEncoding") {
                        Some(Keyword::ContentEncoding { scheme: None, .. }) => continue,
                        Some(Keyword::ContentEncoding {
                            scheme: Some(scheme),
                            ..
                        }) => Some(*scheme),
                        _ => None,
                    };
                    children.push(Box::new(ContentMediaTypeEvaluator::new(
                        mime_type.clone(),
                        encoding,
                        affirmative,
                    )));
                }
                Keyword::MaxItems(limit) => children.push(Box::new(Shallow::new(Box::new(
                    ItemCountEvaluator::max(*limit, affirmative),
                )))),
                Keyword::MinItems(limit) => children.push(Box::new(Shallow::new(Box::new(
                    ItemCountEvaluator::min(*limit, affirmative),
                )))),
                Keyword::UniqueItems(unique) => {
                    if *unique {
                        children.push(Box::new(UniqueItemsEvaluator::new(affirmative)));
                    }
                }
                Keyword::Contains(schema) => children.push(Box::new(ContainsEvaluator::new(
                    Arc::clone(schema),
                    self.min_contains(),
                    self.max_contains(),
                    affirmative,
                ))),
                // Refinements of `contains`; inert on their own.
                Keyword::MinContains(_) | Keyword::MaxContains(_) => {}
                Keyword::MaxProperties(limit) => children.push(Box::new(Shallow::new(Box::new(
                    PropertyCountEvaluator::max(*limit, affirmative),
                )))),
                Keyword::MinProperties(limit) => children.push(Box::new(Shallow::new(Box::new(
                    PropertyCountEvaluator::min(*limit, affirmative),
                )))),
                Keyword::Required(names) => children.push(Box::new(Shallow::new(Box::new(
                    RequiredEvaluator::new(names.clone(), affirmative),
                )))),
                Keyword::PropertyNames(schema) => children.push(Box::new(
                    PropertyNamesEvaluator::new(Arc::clone(schema), affirmative),
                )),
                Keyword::Dependencies(map) => {
                    children.push(self.dependencies_evaluator(map, ty, affirmative))
                }
                Keyword::Properties(_)
                | Keyword::PatternProperties(_)
                | Keyword::AdditionalProperties(_) => {
                    if !properties_done {
                        properties_done = true;
                        children.push(self.properties_evaluator(affirmative));
                    }
                }
                Keyword::Items(_) | Keyword::AdditionalItems(_) => {
                    if !items_done {
                        items_done = true;
                        if let Some(evaluator) = self.items_evaluator(affirmative) {
                            children.push(evaluator);
                        }
                    }
                }
                Keyword::If(schema) => {
                    if !conditional_done {
                        conditional_done = true;
                        children.push(self.conditional_evaluator(schema, ty, affirmative));
                    }
                }
                // Grouped under `if`; inert without it.
                Keyword::Then(_) | Keyword::Else(_) => {}
                Keyword::AllOf(schemas) => {
                    // `true` subschemas are the conjunction's neutral
                    // element (and, negated, the disjunction's); drop them.
                    let subs: Vec<BoxedEvaluator> = schemas
                        .iter()
                        .filter(|s| !matches!(&***s, Schema::Always(true)))
                        .map(|s| s.evaluator(ty, affirmative))
                        .collect();
                    children.push(match (subs.is_empty(), affirmative) {
                        (true, true) => continue,
                        (true, false) => Box::new(AlwaysFalse),
                        (false, true) => {
                            Box::new(ConjunctiveEvaluator::new(subs, is_structured(ty)))
                        }
                        (false, false) => {
                            Box::new(DisjunctiveEvaluator::new(subs, is_structured(ty), "allOf"))
                        }
                    });
                }
                Keyword::AnyOf(schemas) => {
                    // Symmetrically, `false` subschemas never contribute to
                    // a disjunction.
                    let subs: Vec<BoxedEvaluator> = schemas
                        .iter()
                        .filter(|s| !matches!(&***s, Schema::Always(false)))
                        .map(|s| s.evaluator(ty, affirmative))
                        .collect();
                    children.push(match (subs.is_empty(), affirmative) {
                        (true, true) => Box::new(AlwaysFalse),
                        (true, false) => continue,
                        (false, true) => {
                            Box::new(DisjunctiveEvaluator::new(subs, is_structured(ty), "anyOf"))
                        }
                        (false, false) => {
                            Box::new(ConjunctiveEvaluator::new(subs, is_structured(ty)))
                        }
                    });
                }
                Keyword::OneOf(schemas) => {
                    let pairs: Vec<(BoxedEvaluator, BoxedEvaluator)> = schemas
                        .iter()
                        .map(|s| (s.evaluator(ty, true), s.evaluator(ty, false)))
                        .collect();
                    children.push(Box::new(ExclusiveEvaluator::new(
                        pairs,
                        is_structured(ty),
                        affirmative,
                    )));
                }
                Keyword::Not(schema) => children.push(schema.evaluator(ty, !affirmative)),
                Keyword::Definitions(_) => {}
                // Annotations never reach here; applies_to filters them.
                _ => {}
            }
        }
        let structured = is_structured(ty);
        if children.is_empty() {
            // A schema whose assertions cannot apply to this instance type
            // at all rejects it; an explicit (matching) `type` keyword
            // overrides that, as do pure annotations.
            let guarded = self.keywords.get("type").is_none();
            return if affirmative {
                match self.inapplicable_assertions(ty) {
                    Some((name, union)) if guarded => {
                        Box::new(TypeEvaluator::guard(union, ty, name))
                    }
                    _ => Box::new(AlwaysTrue),
                }
            } else if guarded && self.inapplicable_assertions(ty).is_some() {
                Box::new(AlwaysTrue)
            } else {
                Box::new(AlwaysFalse)
            };
        }
        if children.len() == 1 {
            return children.pop().expect("one child");
        }
        if affirmative {
            Box::new(ConjunctiveEvaluator::new(children, structured))
        } else {
            Box::new(DisjunctiveEvaluator::new(children, structured, "not"))
        }
    }

    fn min_contains(&self) -> Option<usize> {
        match self.keywords.get("minContains") {
            Some(Keyword::MinContains(limit)) => Some(*limit),
            _ => None,
        }
    }

    fn max_contains(&self) -> Option<usize> {
        match self.keywords.get("maxContains") {
            Some(Keyword::MaxContains(limit)) => Some(*limit),
            _ => None,
        }
    }

    fn properties_evaluator(&self, affirmative: bool) -> BoxedEvaluator {
        let literal = match self.keywords.get("properties") {
            Some(Keyword::Properties(map)) => map.clone(),
            _ => IndexMap::new(),
        };
        let patterns = match self.keywords.get("patternProperties") {
            Some(Keyword::PatternProperties(entries)) => entries.clone(),
            _ => Vec::new(),
        };
        let additional = match self.keywords.get("additionalProperties") {
            Some(Keyword::AdditionalProperties(schema)) => Some(Arc::clone(schema)),
            _ => None,
        };
        Box::new(PropertiesEvaluator::new(
            literal,
            patterns,
            additional,
            affirmative,
        ))
    }

    fn items_evaluator(&self, affirmative: bool) -> Option<BoxedEvaluator> {
        let additional = match self.keywords.get("additionalItems") {
            Some(Keyword::AdditionalItems(schema)) => Some(Arc::clone(schema)),
            _ => None,
        };
        let schemas = match self.keywords.get("items") {
            Some(Keyword::Items(ItemsKind::Single(schema))) => {
                ItemsSchemas::Single(Arc::clone(schema))
            }
            Some(Keyword::Items(ItemsKind::Tuple(list))) => {
                ItemsSchemas::Tuple(list.clone(), additional)
            }
            // `additionalItems` without a tuple `items` matches every
            // extra item: nothing to evaluate.
            _ => return None,
        };
        Some(Box::new(ItemsEvaluator::new(schemas, affirmative)))
    }

    fn conditional_evaluator(
        &self,
        condition: &Arc<Schema>,
        ty: InstanceType,
        affirmative: bool,
    ) -> BoxedEvaluator {
        let then_branch = match self.keywords.get("then") {
            Some(Keyword::Then(schema)) => Some(schema.evaluator(ty, affirmative)),
            _ if !affirmative => Some(Box::new(AlwaysFalse) as BoxedEvaluator),
            _ => None,
        };
        let else_branch = match self.keywords.get("else") {
            Some(Keyword::Else(schema)) => Some(schema.evaluator(ty, affirmative)),
            _ if !affirmative => Some(Box::new(AlwaysFalse) as BoxedEvaluator),
            _ => None,
        };
        Box::new(ConditionalEvaluator::new(
            condition.evaluator(ty, true),
            then_branch,
            else_branch,
            is_structured(ty),
        ))
    }

    fn dependencies_evaluator(
        &self,
        map: &IndexMap<String, Dependency>,
        ty: InstanceType,
        affirmative: bool,
    ) -> BoxedEvaluator {
        let mut entries: Vec<BoxedEvaluator> = Vec::new();
        for (property, dependency) in map {
            match dependency {
                Dependency::Schema(schema) => entries.push(Box::new(
                    SchemaDependencyEvaluator::new(property.clone(), schema.evaluator(ty, affirmative)),
                )),
                Dependency::Properties(names) => entries.push(Box::new(
                    PropertyDependencyEvaluator::new(property.clone(), names.clone(), affirmative),
                )),
            }
        }
        if entries.len() == 1 {
            return entries.pop().expect("one entry");
        }
        if affirmative {
            Box::new(ConjunctiveEvaluator::new(entries, true))
        } else {
            Box::new(DisjunctiveEvaluator::new(entries, true, "dependencies"))
        }
    }
}

/// A `$ref` schema with a late-bound target.
///
/// The target slot is populated once by the resolver; when it stays empty,
/// any instance reaching this schema gets a dereference problem.
#[derive(Debug)]
pub struct SchemaReference {
    pub(crate) uri: String,
    pub(crate) id: Option<String>,
    pub(crate) resolved_uri: OnceCell<String>,
    target: OnceCell<Arc<Schema>>,
    /// Sibling keywords: ignored for evaluation per Draft-07, kept for
    /// serialization.
    pub(crate) keywords: IndexMap<String, Keyword>,
}

impl SchemaReference {
    pub fn new(uri: impl Into<String>, id: Option<String>, keywords: IndexMap<String, Keyword>) -> Self {
        Self {
            uri: uri.into(),
            id,
            resolved_uri: OnceCell::new(),
            target: OnceCell::new(),
            keywords,
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The URI after composition against the enclosing base, once the
    /// resolver ran.
    pub fn display_uri(&self) -> &str {
        self.resolved_uri.get().map(String::as_str).unwrap_or(&self.uri)
    }

    pub fn set_resolved_uri(&self, uri: String) {
        let _ = self.resolved_uri.set(uri);
    }

    pub fn target(&self) -> Option<&Arc<Schema>> {
        self.target.get()
    }

    pub fn set_target(&self, target: Arc<Schema>) {
        let _ = self.target.set(target);
    }

    pub fn to_json(&self) -> JsonValue {
        let mut members = Vec::with_capacity(self.keywords.len() + 2);
        if let Some(id) = &self.id {
            members.push(("$id".to_string(), JsonValue::String(id.clone())));
        }
        members.push(("$ref".to_string(), JsonValue::String(self.uri.clone())));
        for (name, keyword) in &self.keywords {
            members.push((name.clone(), keyword.to_json()));
        }
        JsonValue::Object(members)
    }
}

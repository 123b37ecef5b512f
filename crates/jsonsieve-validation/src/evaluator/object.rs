//! Evaluators scoped to one object instance.
//!
//! The properties family (`properties`, `patternProperties`,
//! `additionalProperties`) cooperates inside a single evaluator: each key
//! seen at depth 1 selects the union of matching subschemas, and the value
//! evaluator is spawned lazily when the value's first event arrives.

use super::logical::{dispatch_problem_lists, ConjunctiveEvaluator, DisjunctiveEvaluator};
use super::{
    instance_type_of, BoxedEvaluator, Evaluator, ProblemBranch, ProblemSink, Verdict,
};
use crate::problem::Problem;
use crate::schema::Schema;
use crate::value::InstanceType;
use indexmap::IndexMap;
use jsonsieve_json::{Event, EventKind, Location};
use regex::Regex;
use std::sync::Arc;

/// Combine the subschemas applying to one property value into one child
/// evaluator.
fn child_evaluator(
    schemas: &[Arc<Schema>],
    ty: InstanceType,
    affirmative: bool,
) -> BoxedEvaluator {
    let mut children: Vec<BoxedEvaluator> = schemas
        .iter()
        .map(|s| s.evaluator(ty, affirmative))
        .collect();
    if children.len() == 1 {
        return children.pop().expect("one child");
    }
    let structured = super::is_structured(ty);
    if affirmative {
        Box::new(ConjunctiveEvaluator::new(children, structured))
    } else {
        Box::new(DisjunctiveEvaluator::new(children, structured, "properties"))
    }
}

/// The subschemas applying to one property, tagged with where they came
/// from: the `additionalProperties` fallback carries different reporting
/// semantics than an explicit match.
enum Selection {
    /// Nothing matched and there is no `additionalProperties`.
    Unconstrained,
    /// Literal and/or pattern matches.
    Matched(Vec<Arc<Schema>>),
    /// The `additionalProperties` fallback.
    Additional(Arc<Schema>),
}

/// `properties` + `patternProperties` + `additionalProperties`.
pub struct PropertiesEvaluator {
    properties: IndexMap<String, Arc<Schema>>,
    patterns: Vec<(Regex, Arc<Schema>)>,
    additional: Option<Arc<Schema>>,
    affirmative: bool,
    /// Subschemas selected by the last key, awaiting the value's first
    /// event.
    pending: Option<Vec<Arc<Schema>>>,
    current: Option<BoxedEvaluator>,
    /// Index into `branches` of the current child's buffer (negated mode).
    current_branch: Option<usize>,
    has_false: bool,
    branches: Vec<ProblemBranch>,
    location: Option<Location>,
}

impl PropertiesEvaluator {
    pub fn new(
        properties: IndexMap<String, Arc<Schema>>,
        patterns: Vec<(Regex, Arc<Schema>)>,
        additional: Option<Arc<Schema>>,
        affirmative: bool,
    ) -> Self {
        Self {
            properties,
            patterns,
            additional,
            affirmative,
            pending: None,
            current: None,
            current_branch: None,
            has_false: false,
            branches: Vec::new(),
            location: None,
        }
    }

    fn select(&self, key: &str) -> Selection {
        let mut selected = Vec::new();
        if let Some(schema) = self.properties.get(key) {
            selected.push(Arc::clone(schema));
        }
        for (regex, schema) in &self.patterns {
            // Unanchored find, per ECMA-262 semantics.
            if regex.is_match(key) {
                selected.push(Arc::clone(schema));
            }
        }
        if !selected.is_empty() {
            return Selection::Matched(selected);
        }
        match &self.additional {
            Some(schema) => Selection::Additional(Arc::clone(schema)),
            None => Selection::Unconstrained,
        }
    }

    fn on_key(&mut self, key: &str, location: Location, sink: &mut dyn ProblemSink) -> Verdict {
        self.current = None;
        match self.select(key) {
            // Only `additionalProperties: false` means the property is not
            // recognized here; it reports the offending key by name, at
            // the key's own location. A `false` schema named by
            // `properties` or matched by a pattern recognizes the key and
            // rejects its value through the normal child path.
            Selection::Additional(schema) if matches!(&*schema, Schema::Always(false)) => {
                self.pending = None;
                if self.affirmative {
                    sink.dispatch(
                        Problem::builder("instance.problem.additionalProperties")
                            .keyword("additionalProperties")
                            .location(location)
                            .param("actual", key)
                            .build(),
                    );
                    self.has_false = true;
                } else {
                    return Verdict::True;
                }
            }
            Selection::Additional(schema) => self.pending = Some(vec![schema]),
            Selection::Matched(schemas) => self.pending = Some(schemas),
            Selection::Unconstrained => self.pending = None,
        }
        Verdict::Pending
    }

    fn step_child(&mut self, event: &Event, depth: usize, sink: &mut dyn ProblemSink) -> Verdict {
        if let Some(schemas) = self.pending.take() {
            if let Some(ty) = instance_type_of(&event.kind) {
                self.current = Some(child_evaluator(&schemas, ty, self.affirmative));
                if !self.affirmative {
                    self.branches.push(ProblemBranch::default());
                    self.current_branch = Some(self.branches.len() - 1);
                }
            }
        }
        let Some(child) = self.current.as_mut() else {
            return Verdict::Pending;
        };
        let verdict = if self.affirmative {
            child.evaluate(event, depth - 1, sink)
        } else {
            let branch = self
                .current_branch
                .and_then(|i| self.branches.get_mut(i))
                .expect("negated child has a branch");
            child.evaluate(event, depth - 1, &mut branch.problems)
        };
        match verdict {
            Verdict::Pending => Verdict::Pending,
            Verdict::False => {
                self.current = None;
                if self.affirmative {
                    self.has_false = true;
                } else if let Some(branch) =
                    self.current_branch.take().and_then(|i| self.branches.get_mut(i))
                {
                    branch.finish();
                }
                Verdict::Pending
            }
            Verdict::True | Verdict::Ignored => {
                self.current = None;
                if self.affirmative {
                    Verdict::Pending
                } else {
                    Verdict::True
                }
            }
        }
    }
}

impl Evaluator for PropertiesEvaluator {
    fn evaluate(&mut self, event: &Event, depth: usize, sink: &mut dyn ProblemSink) -> Verdict {
        if self.location.is_none() {
            self.location = Some(event.location);
        }
        match (&event.kind, depth) {
            (EventKind::StartObject, 0) => Verdict::Pending,
            (EventKind::EndObject, 0) => {
                if self.affirmative {
                    if self.has_false {
                        Verdict::False
                    } else {
                        Verdict::True
                    }
                } else {
                    let branches = std::mem::take(&mut self.branches);
                    dispatch_problem_lists(
                        branches,
                        "instance.problem.anyOf",
                        "properties",
                        self.location,
                        sink,
                    );
                    Verdict::False
                }
            }
            (EventKind::KeyName(key), 1) => self.on_key(key, event.location, sink),
            (_, d) if d >= 1 => self.step_child(event, depth, sink),
            _ => Verdict::Pending,
        }
    }
}

/// `required`: a shallow working-set evaluator.
pub struct RequiredEvaluator {
    required: Vec<String>,
    missing: Vec<String>,
    affirmative: bool,
}

impl RequiredEvaluator {
    pub fn new(required: Vec<String>, affirmative: bool) -> Self {
        Self {
            missing: required.clone(),
            required,
            affirmative,
        }
    }
}

impl Evaluator for RequiredEvaluator {
    fn evaluate(&mut self, event: &Event, depth: usize, sink: &mut dyn ProblemSink) -> Verdict {
        match (&event.kind, depth) {
            (EventKind::KeyName(key), 1) => {
                self.missing.retain(|name| name != key);
                Verdict::Pending
            }
            (EventKind::EndObject, 0) => {
                if self.missing.is_empty() != self.affirmative {
                    let (key, param, names) = if self.affirmative {
                        (
                            "instance.problem.required",
                            "missing",
                            std::mem::take(&mut self.missing),
                        )
                    } else {
                        (
                            "instance.problem.not.required",
                            "expected",
                            std::mem::take(&mut self.required),
                        )
                    };
                    sink.dispatch(
                        Problem::builder(key)
                            .keyword("required")
                            .location(event.location)
                            .param(param, names)
                            .build(),
                    );
                    return Verdict::False;
                }
                Verdict::True
            }
            _ => Verdict::Pending,
        }
    }
}

/// `maxProperties` / `minProperties`.
pub struct PropertyCountEvaluator {
    max: bool,
    limit: usize,
    count: usize,
    affirmative: bool,
}

impl PropertyCountEvaluator {
    pub fn max(limit: usize, affirmative: bool) -> Self {
        Self {
            max: true,
            limit,
            count: 0,
            affirmative,
        }
    }

    pub fn min(limit: usize, affirmative: bool) -> Self {
        Self {
            max: false,
            limit,
            count: 0,
            affirmative,
        }
    }

    fn message(&self, location: Location) -> Problem {
        let key = match (self.max, self.affirmative) {
            (true, true) => "instance.problem.maxProperties",
            (true, false) => "instance.problem.not.maxProperties",
            (false, true) => "instance.problem.minProperties",
            (false, false) => "instance.problem.not.minProperties",
        };
        Problem::builder(key)
            .keyword(if self.max {
                "maxProperties"
            } else {
                "minProperties"
            })
            .location(location)
            .param("limit", self.limit)
            .param("actual", self.count)
            .build()
    }
}

impl Evaluator for PropertyCountEvaluator {
    fn evaluate(&mut self, event: &Event, depth: usize, sink: &mut dyn ProblemSink) -> Verdict {
        match (&event.kind, depth) {
            (EventKind::KeyName(_), 1) => {
                self.count += 1;
                // A max bound can fail as soon as it is exceeded.
                if self.max && self.affirmative && self.count > self.limit {
                    sink.dispatch(self.message(event.location));
                    return Verdict::False;
                }
                Verdict::Pending
            }
            (EventKind::EndObject, 0) => {
                let ok = if self.max {
                    self.count <= self.limit
                } else {
                    self.count >= self.limit
                };
                if ok == self.affirmative {
                    Verdict::True
                } else {
                    sink.dispatch(self.message(event.location));
                    Verdict::False
                }
            }
            _ => Verdict::Pending,
        }
    }
}

/// `propertyNames`: each key is validated as a string instance at the
/// key's own location.
pub struct PropertyNamesEvaluator {
    schema: Arc<Schema>,
    affirmative: bool,
    has_false: bool,
    branches: Vec<ProblemBranch>,
    location: Option<Location>,
}

impl PropertyNamesEvaluator {
    pub fn new(schema: Arc<Schema>, affirmative: bool) -> Self {
        Self {
            schema,
            affirmative,
            has_false: false,
            branches: Vec::new(),
            location: None,
        }
    }
}

impl Evaluator for PropertyNamesEvaluator {
    fn evaluate(&mut self, event: &Event, depth: usize, sink: &mut dyn ProblemSink) -> Verdict {
        if self.location.is_none() {
            self.location = Some(event.location);
        }
        match (&event.kind, depth) {
            (EventKind::KeyName(key), 1) => {
                let synthetic = Event::new(EventKind::String(key.clone()), event.location);
                let mut child = self.schema.evaluator(InstanceType::String, self.affirmative);
                if self.affirmative {
                    if child.evaluate(&synthetic, 0, sink) == Verdict::False {
                        self.has_false = true;
                    }
                } else {
                    let mut branch = ProblemBranch::default();
                    match child.evaluate(&synthetic, 0, &mut branch.problems) {
                        Verdict::True | Verdict::Ignored => return Verdict::True,
                        _ => {
                            branch.finish();
                            self.branches.push(branch);
                        }
                    }
                }
                Verdict::Pending
            }
            (EventKind::EndObject, 0) => {
                if self.affirmative {
                    if self.has_false {
                        Verdict::False
                    } else {
                        Verdict::True
                    }
                } else {
                    let branches = std::mem::take(&mut self.branches);
                    dispatch_problem_lists(
                        branches,
                        "instance.problem.anyOf",
                        "propertyNames",
                        self.location,
                        sink,
                    );
                    Verdict::False
                }
            }
            _ => Verdict::Pending,
        }
    }
}

/// One `dependencies` entry with a schema value.
///
/// The subschema runs from the start of the object, but its problems stay
/// buffered until the dependant property actually appears; activation
/// flushes them retroactively. Without activation the entry reports
/// `Ignored` at the end of the object.
pub struct SchemaDependencyEvaluator {
    property: String,
    inner: BoxedEvaluator,
    active: bool,
    buffered: Vec<Problem>,
    result: Option<Verdict>,
}

impl SchemaDependencyEvaluator {
    pub fn new(property: impl Into<String>, inner: BoxedEvaluator) -> Self {
        Self {
            property: property.into(),
            inner,
            active: false,
            buffered: Vec::new(),
            result: None,
        }
    }
}

impl Evaluator for SchemaDependencyEvaluator {
    fn evaluate(&mut self, event: &Event, depth: usize, sink: &mut dyn ProblemSink) -> Verdict {
        if !self.active {
            if let (EventKind::KeyName(key), 1) = (&event.kind, depth) {
                if *key == self.property {
                    self.active = true;
                    sink.dispatch_all(std::mem::take(&mut self.buffered));
                }
            }
        }
        if self.result.is_none() {
            let verdict = if self.active {
                self.inner.evaluate(event, depth, sink)
            } else {
                self.inner.evaluate(event, depth, &mut self.buffered)
            };
            if verdict != Verdict::Pending {
                self.result = Some(verdict);
            }
        }
        if self.active {
            self.result.unwrap_or(Verdict::Pending)
        } else if matches!((&event.kind, depth), (EventKind::EndObject, 0)) {
            Verdict::Ignored
        } else {
            Verdict::Pending
        }
    }
}

/// One `dependencies` entry with a required-property-list value.
pub struct PropertyDependencyEvaluator {
    property: String,
    required: Vec<String>,
    missing: Vec<String>,
    affirmative: bool,
    active: bool,
}

impl PropertyDependencyEvaluator {
    pub fn new(property: impl Into<String>, required: Vec<String>, affirmative: bool) -> Self {
        Self {
            property: property.into(),
            missing: required.clone(),
            required,
            affirmative,
            active: false,
        }
    }
}

impl Evaluator for PropertyDependencyEvaluator {
    fn evaluate(&mut self, event: &Event, depth: usize, sink: &mut dyn ProblemSink) -> Verdict {
        match (&event.kind, depth) {
            (EventKind::KeyName(key), 1) => {
                if *key == self.property {
                    self.active = true;
                }
                self.missing.retain(|name| name != key);
                Verdict::Pending
            }
            (EventKind::EndObject, 0) => {
                if !self.active {
                    return Verdict::Ignored;
                }
                if self.affirmative {
                    if self.missing.is_empty() {
                        Verdict::True
                    } else {
                        sink.dispatch(
                            Problem::builder("instance.problem.dependencies")
                                .keyword("dependencies")
                                .location(event.location)
                                .param("missing", std::mem::take(&mut self.missing))
                                .param("dependant", self.property.clone())
                                .build(),
                        );
                        Verdict::False
                    }
                } else if self.missing.is_empty() {
                    sink.dispatch(
                        Problem::builder("instance.problem.not.dependencies")
                            .keyword("dependencies")
                            .location(event.location)
                            .param("required", std::mem::take(&mut self.required))
                            .param("dependant", self.property.clone())
                            .build(),
                    );
                    Verdict::False
                } else {
                    Verdict::True
                }
            }
            _ => Verdict::Pending,
        }
    }
}

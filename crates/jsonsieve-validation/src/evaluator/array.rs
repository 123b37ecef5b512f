//! Evaluators scoped to one array instance.
//!
//! Element boundaries are detected structurally: a depth-1 event while no
//! child is running starts the next element. `uniqueItems` and `contains`
//! buffer per-element state, a documented bounded exception to the
//! streaming principle.

use super::assembler::ValueAssembler;
use super::logical::dispatch_problem_lists;
use super::{
    instance_type_of, BoxedEvaluator, DiscardSink, Evaluator, ProblemBranch, ProblemSink, Verdict,
};
use crate::problem::Problem;
use crate::schema::Schema;
use crate::value::JsonValue;
use jsonsieve_json::{Event, EventKind, Location};
use std::sync::Arc;

/// The `items` / `additionalItems` pair.
pub enum ItemsSchemas {
    /// `items` with a single schema: every element validates against it.
    Single(Arc<Schema>),
    /// Tuple form: the k-th element validates against the k-th schema,
    /// extra elements against `additionalItems` (absent: anything goes).
    Tuple(Vec<Arc<Schema>>, Option<Arc<Schema>>),
}

impl ItemsSchemas {
    fn for_index(&self, index: usize) -> Option<Arc<Schema>> {
        match self {
            ItemsSchemas::Single(schema) => Some(Arc::clone(schema)),
            ItemsSchemas::Tuple(schemas, additional) => schemas
                .get(index)
                .cloned()
                .or_else(|| additional.clone()),
        }
    }

    fn tuple_len(&self) -> usize {
        match self {
            ItemsSchemas::Single(_) => 0,
            ItemsSchemas::Tuple(schemas, _) => schemas.len(),
        }
    }
}

/// `items` + `additionalItems`.
pub struct ItemsEvaluator {
    schemas: ItemsSchemas,
    affirmative: bool,
    index: usize,
    current: Option<BoxedEvaluator>,
    current_branch: Option<usize>,
    reported_additional: bool,
    has_false: bool,
    branches: Vec<ProblemBranch>,
    location: Option<Location>,
}

impl ItemsEvaluator {
    pub fn new(schemas: ItemsSchemas, affirmative: bool) -> Self {
        Self {
            schemas,
            affirmative,
            index: 0,
            current: None,
            current_branch: None,
            reported_additional: false,
            has_false: false,
            branches: Vec::new(),
            location: None,
        }
    }

    fn start_element(&mut self, event: &Event, sink: &mut dyn ProblemSink) -> Verdict {
        let index = self.index;
        self.index += 1;
        let Some(schema) = self.schemas.for_index(index) else {
            return Verdict::Pending;
        };
        // A `false` additional-items schema means the tuple length is the
        // hard limit; report once, at the first extra element.
        if matches!(*schema, Schema::Always(false)) && index >= self.schemas.tuple_len() {
            if !self.affirmative {
                return Verdict::True;
            }
            if !self.reported_additional {
                self.reported_additional = true;
                sink.dispatch(
                    Problem::builder("instance.problem.additionalItems")
                        .keyword("additionalItems")
                        .location(event.location)
                        .param("limit", self.schemas.tuple_len())
                        .build(),
                );
                self.has_false = true;
            }
            return Verdict::Pending;
        }
        if let Some(ty) = instance_type_of(&event.kind) {
            self.current = Some(schema.evaluator(ty, self.affirmative));
            if !self.affirmative {
                self.branches.push(ProblemBranch::default());
                self.current_branch = Some(self.branches.len() - 1);
            }
        }
        Verdict::Pending
    }

    fn step_child(&mut self, event: &Event, depth: usize, sink: &mut dyn ProblemSink) -> Verdict {
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
                } else if let Some(branch) = self
                    .current_branch
                    .take()
                    .and_then(|i| self.branches.get_mut(i))
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

impl Evaluator for ItemsEvaluator {
    fn evaluate(&mut self, event: &Event, depth: usize, sink: &mut dyn ProblemSink) -> Verdict {
        if self.location.is_none() {
            self.location = Some(event.location);
        }
        match (&event.kind, depth) {
            (EventKind::StartArray, 0) => Verdict::Pending,
            (EventKind::EndArray, 0) => {
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
                        "items",
                        self.location,
                        sink,
                    );
                    Verdict::False
                }
            }
            (_, d) if d >= 1 => {
                if self.current.is_some() {
                    self.step_child(event, depth, sink)
                } else if d == 1
                    && !matches!(event.kind, EventKind::EndObject | EventKind::EndArray)
                {
                    // A depth-1 value event with no running child starts
                    // the next element; the end of a skipped element does
                    // not.
                    let verdict = self.start_element(event, sink);
                    if verdict != Verdict::Pending {
                        return verdict;
                    }
                    if self.current.is_some() {
                        self.step_child(event, depth, sink)
                    } else {
                        Verdict::Pending
                    }
                } else {
                    Verdict::Pending
                }
            }
            _ => Verdict::Pending,
        }
    }
}

/// `maxItems` / `minItems`: shallow element counting.
pub struct ItemCountEvaluator {
    max: bool,
    limit: usize,
    count: usize,
    affirmative: bool,
}

impl ItemCountEvaluator {
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
            (true, true) => "instance.problem.maxItems",
            (true, false) => "instance.problem.not.maxItems",
            (false, true) => "instance.problem.minItems",
            (false, false) => "instance.problem.not.minItems",
        };
        Problem::builder(key)
            .keyword(if self.max { "maxItems" } else { "minItems" })
            .location(location)
            .param("limit", self.limit)
            .param("actual", self.count)
            .build()
    }
}

impl Evaluator for ItemCountEvaluator {
    fn evaluate(&mut self, event: &Event, depth: usize, sink: &mut dyn ProblemSink) -> Verdict {
        match (&event.kind, depth) {
            (EventKind::EndArray, 0) => {
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
            (kind, 1) => {
                // Every depth-1 event that begins a value is one element;
                // the ends of nested elements are not.
                if !matches!(kind, EventKind::EndObject | EventKind::EndArray) {
                    self.count += 1;
                }
                if self.max && self.affirmative && self.count > self.limit {
                    sink.dispatch(self.message(event.location));
                    return Verdict::False;
                }
                Verdict::Pending
            }
            _ => Verdict::Pending,
        }
    }
}

/// `uniqueItems`: buffers each assembled element and compares structurally
/// against all previously seen elements.
pub struct UniqueItemsEvaluator {
    affirmative: bool,
    seen: Vec<JsonValue>,
    assembler: Option<ValueAssembler>,
    duplicate: Option<(usize, usize)>,
    location: Option<Location>,
}

impl UniqueItemsEvaluator {
    pub fn new(affirmative: bool) -> Self {
        Self {
            affirmative,
            seen: Vec::new(),
            assembler: None,
            duplicate: None,
            location: None,
        }
    }

    fn on_element(&mut self, value: JsonValue) -> Option<(usize, usize)> {
        let index = self.seen.len();
        let first = self.seen.iter().position(|seen| *seen == value);
        self.seen.push(value);
        first.map(|first| (first, index))
    }
}

impl Evaluator for UniqueItemsEvaluator {
    fn evaluate(&mut self, event: &Event, depth: usize, sink: &mut dyn ProblemSink) -> Verdict {
        if depth == 0 && matches!(event.kind, EventKind::StartArray) {
            self.location = Some(event.location);
            return Verdict::Pending;
        }
        if depth == 0 && matches!(event.kind, EventKind::EndArray) {
            return match (self.duplicate, self.affirmative) {
                (None, true) => Verdict::True,
                (Some(_), false) => Verdict::True,
                (None, false) => {
                    sink.dispatch(
                        Problem::builder("instance.problem.not.uniqueItems")
                            .keyword("uniqueItems")
                            .location(event.location)
                            .build(),
                    );
                    Verdict::False
                }
                // The affirmative duplicate case already decided early.
                (Some(_), true) => Verdict::True,
            };
        }
        if depth >= 1 {
            let assembler = self.assembler.get_or_insert_with(ValueAssembler::new);
            if let Some(value) = assembler.feed(&event.kind) {
                self.assembler = None;
                if let Some((first, index)) = self.on_element(value) {
                    if self.duplicate.is_none() {
                        self.duplicate = Some((first, index));
                        if self.affirmative {
                            sink.dispatch(
                                Problem::builder("instance.problem.uniqueItems")
                                    .keyword("uniqueItems")
                                    .location(event.location)
                                    .param("index", index)
                                    .param("first", first)
                                    .build(),
                            );
                            return Verdict::False;
                        }
                    }
                }
            }
        }
        Verdict::Pending
    }
}

/// `contains` with the `minContains` / `maxContains` refinements.
pub struct ContainsEvaluator {
    schema: Arc<Schema>,
    min: usize,
    max: Option<usize>,
    explicit_min: bool,
    affirmative: bool,
    matched: usize,
    current: Option<BoxedEvaluator>,
    location: Option<Location>,
}

impl ContainsEvaluator {
    pub fn new(
        schema: Arc<Schema>,
        min: Option<usize>,
        max: Option<usize>,
        affirmative: bool,
    ) -> Self {
        Self {
            schema,
            explicit_min: min.is_some(),
            min: min.unwrap_or(1),
            max,
            affirmative,
            matched: 0,
            current: None,
            location: None,
        }
    }

    fn satisfied(&self) -> bool {
        self.matched >= self.min && self.max.map_or(true, |max| self.matched <= max)
    }
}

impl Evaluator for ContainsEvaluator {
    fn evaluate(&mut self, event: &Event, depth: usize, sink: &mut dyn ProblemSink) -> Verdict {
        match (&event.kind, depth) {
            (EventKind::StartArray, 0) => {
                self.location = Some(event.location);
                Verdict::Pending
            }
            (EventKind::EndArray, 0) => {
                let location = self.location.unwrap_or(event.location);
                if self.satisfied() == self.affirmative {
                    return Verdict::True;
                }
                let problem = if !self.affirmative {
                    Problem::builder("instance.problem.not.contains")
                        .keyword("contains")
                        .location(location)
                        .param("actual", self.matched)
                        .build()
                } else if self.matched < self.min {
                    if self.explicit_min {
                        Problem::builder("instance.problem.minContains")
                            .keyword("minContains")
                            .location(location)
                            .param("limit", self.min)
                            .param("actual", self.matched)
                            .build()
                    } else {
                        Problem::builder("instance.problem.contains")
                            .keyword("contains")
                            .location(location)
                            .build()
                    }
                } else {
                    Problem::builder("instance.problem.maxContains")
                        .keyword("maxContains")
                        .location(location)
                        .param("limit", self.max.unwrap_or(self.matched))
                        .param("actual", self.matched)
                        .build()
                };
                sink.dispatch(problem);
                Verdict::False
            }
            (_, d) if d >= 1 => {
                // The subschema's own problems never surface; only the
                // match count matters.
                let mut discard = DiscardSink;
                if self.current.is_none() && d == 1 {
                    if let Some(ty) = instance_type_of(&event.kind) {
                        self.current = Some(self.schema.evaluator(ty, true));
                    }
                }
                if let Some(child) = self.current.as_mut() {
                    match child.evaluate(event, depth - 1, &mut discard) {
                        Verdict::Pending => {}
                        Verdict::True | Verdict::Ignored => {
                            self.current = None;
                            self.matched += 1;
                        }
                        Verdict::False => self.current = None,
                    }
                }
                Verdict::Pending
            }
            _ => Verdict::Pending,
        }
    }
}

//! The event-driven evaluation engine.
//!
//! An evaluator is a single-use, stateful object created for one (schema,
//! instance type) pair. It consumes parse events in instance order and
//! reports a tri-state verdict per event; once `True` or `False` is
//! returned it must not be invoked again. `Ignored` is returned only by
//! conditional evaluators whose activation never triggered; conjunctive
//! parents coerce it to `True`.

pub mod array;
pub mod assembler;
pub mod conditional;
pub mod logical;
pub mod object;
pub mod scalar;

use crate::problem::Problem;
use crate::value::InstanceType;
use jsonsieve_json::{Event, EventKind};

/// The outcome of offering one event to an evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    True,
    False,
    Pending,
    Ignored,
}

impl Verdict {
    pub fn is_decided(self) -> bool {
        matches!(self, Verdict::True | Verdict::False | Verdict::Ignored)
    }
}

/// Receives problems as evaluators dispatch them.
pub trait ProblemSink {
    fn dispatch(&mut self, problem: Problem);

    fn dispatch_all(&mut self, problems: Vec<Problem>) {
        for problem in problems {
            self.dispatch(problem);
        }
    }
}

impl ProblemSink for Vec<Problem> {
    fn dispatch(&mut self, problem: Problem) {
        self.push(problem);
    }
}

/// Swallows problems; used for `if` subschemas, whose problems never
/// surface.
pub struct DiscardSink;

impl ProblemSink for DiscardSink {
    fn dispatch(&mut self, _problem: Problem) {}
}

/// A stateful, single-use evaluator.
pub trait Evaluator {
    fn evaluate(&mut self, event: &Event, depth: usize, sink: &mut dyn ProblemSink) -> Verdict;
}

pub type BoxedEvaluator = Box<dyn Evaluator>;

/// Problems buffered for one branch of a logical evaluator.
///
/// A branch is *resolvable* when its child completed with `False` and
/// actually reported problems; branch dispatch prefers resolvable lists.
#[derive(Debug, Default)]
pub struct ProblemBranch {
    pub problems: Vec<Problem>,
    pub resolvable: bool,
}

impl ProblemBranch {
    pub fn finish(&mut self) {
        self.resolvable = !self.problems.is_empty();
    }
}

/// Succeeds on the first event, whatever it is.
pub struct AlwaysTrue;

impl Evaluator for AlwaysTrue {
    fn evaluate(&mut self, _event: &Event, _depth: usize, _sink: &mut dyn ProblemSink) -> Verdict {
        Verdict::True
    }
}

/// Fails on the first event with a catch-all problem; produced by the
/// `false` schema and by negated empty schemas.
pub struct AlwaysFalse;

impl Evaluator for AlwaysFalse {
    fn evaluate(&mut self, event: &Event, _depth: usize, sink: &mut dyn ProblemSink) -> Verdict {
        sink.dispatch(
            Problem::builder("instance.problem.rejected")
                .location(event.location)
                .build(),
        );
        Verdict::False
    }
}

/// Stands in for the target of a reference that never resolved.
pub struct DereferenceEvaluator {
    uri: String,
}

impl DereferenceEvaluator {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

impl Evaluator for DereferenceEvaluator {
    fn evaluate(&mut self, event: &Event, _depth: usize, sink: &mut dyn ProblemSink) -> Verdict {
        sink.dispatch(
            Problem::builder("schema.problem.dereference")
                .keyword("$ref")
                .location(event.location)
                .param("ref", self.uri.clone())
                .build(),
        );
        Verdict::False
    }
}

/// Restricts an inner evaluator to the shallow view: only depth-0 and
/// depth-1 events are delivered, deeper nesting is skipped.
pub struct Shallow {
    inner: BoxedEvaluator,
}

impl Shallow {
    pub fn new(inner: BoxedEvaluator) -> Self {
        Self { inner }
    }
}

impl Evaluator for Shallow {
    fn evaluate(&mut self, event: &Event, depth: usize, sink: &mut dyn ProblemSink) -> Verdict {
        if depth > 1 {
            return Verdict::Pending;
        }
        self.inner.evaluate(event, depth, sink)
    }
}

/// The instance type announced by the first event of a value, or `None`
/// for events that cannot start a value.
pub fn instance_type_of(kind: &EventKind) -> Option<InstanceType> {
    Some(match kind {
        EventKind::StartObject => InstanceType::Object,
        EventKind::StartArray => InstanceType::Array,
        EventKind::String(_) => InstanceType::String,
        EventKind::Number(n) => {
            if n.is_integral() {
                InstanceType::Integer
            } else {
                InstanceType::Number
            }
        }
        EventKind::True | EventKind::False => InstanceType::Boolean,
        EventKind::Null => InstanceType::Null,
        EventKind::EndObject | EventKind::EndArray | EventKind::KeyName(_) => return None,
    })
}

/// Whether events of this type bracket a multi-event scope.
pub fn is_structured(ty: InstanceType) -> bool {
    matches!(ty, InstanceType::Array | InstanceType::Object)
}

/// Whether this event closes the scope the evaluator was created for.
pub fn closes_scope(event: &Event, depth: usize) -> bool {
    depth == 0 && matches!(event.kind, EventKind::EndObject | EventKind::EndArray)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonsieve_json::Location;

    fn event(kind: EventKind) -> Event {
        Event::new(kind, Location::default())
    }

    #[test]
    fn test_always_false_reports_once() {
        let mut sink = Vec::new();
        let verdict = AlwaysFalse.evaluate(&event(EventKind::Null), 0, &mut sink);
        assert_eq!(verdict, Verdict::False);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].message_key(), "instance.problem.rejected");
    }

    #[test]
    fn test_instance_type_of_number_events() {
        use jsonsieve_json::JsonNumber;
        assert_eq!(
            instance_type_of(&EventKind::Number(JsonNumber::from_literal("3"))),
            Some(InstanceType::Integer)
        );
        assert_eq!(
            instance_type_of(&EventKind::Number(JsonNumber::from_literal("3.5"))),
            Some(InstanceType::Number)
        );
        assert_eq!(instance_type_of(&EventKind::KeyName("a".to_string())), None);
    }
}

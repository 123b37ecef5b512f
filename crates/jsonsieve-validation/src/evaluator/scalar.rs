//! Evaluators for assertions that decide on a single value.
//!
//! Most of these look at exactly one event: the scalar that opened the
//! evaluator's scope. The equality evaluators (`const`, `enum`) are the
//! exception; they assemble the whole value first.

use super::assembler::ValueAssembler;
use super::{Evaluator, ProblemSink, Verdict};
use crate::problem::Problem;
use crate::value::{InstanceType, JsonValue};
use jsonsieve_json::{Event, EventKind};
use regex::Regex;
use rust_decimal::Decimal;

/// Joins type names for the `{expected}` message parameter.
fn type_names(types: &[InstanceType]) -> String {
    types
        .iter()
        .map(InstanceType::name)
        .collect::<Vec<_>>()
        .join(" or ")
}

/// The `type` assertion, and the guard emitted when a schema's assertions
/// cannot apply to the instance at all.
pub struct TypeEvaluator {
    expected: Vec<InstanceType>,
    actual: InstanceType,
    keyword: String,
    affirmative: bool,
}

impl TypeEvaluator {
    pub fn new(expected: Vec<InstanceType>, actual: InstanceType, affirmative: bool) -> Self {
        Self {
            expected,
            actual,
            keyword: "type".to_string(),
            affirmative,
        }
    }

    /// Guard used when none of a schema's assertions support the actual
    /// instance type; reports under the offending keyword's name.
    pub fn guard(expected: Vec<InstanceType>, actual: InstanceType, keyword: &str) -> Self {
        Self {
            expected,
            actual,
            keyword: keyword.to_string(),
            affirmative: true,
        }
    }
}

impl Evaluator for TypeEvaluator {
    fn evaluate(&mut self, event: &Event, _depth: usize, sink: &mut dyn ProblemSink) -> Verdict {
        let matches = self.expected.iter().any(|t| self.actual.satisfies(*t));
        if matches == self.affirmative {
            return Verdict::True;
        }
        let key = if self.affirmative {
            "instance.problem.type"
        } else {
            "instance.problem.not.type"
        };
        sink.dispatch(
            Problem::builder(key)
                .keyword(&self.keyword)
                .location(event.location)
                .param("expected", type_names(&self.expected))
                .param("actual", self.actual.name())
                .build(),
        );
        Verdict::False
    }
}

/// Whether the assertion expects the value to equal a constant or to be a
/// member of a fixed set.
pub enum EqualityKind {
    Const(JsonValue),
    Enum(Vec<JsonValue>),
}

/// `const` and `enum`. Assembles the instance value, then compares
/// structurally with numeric canonicalisation.
pub struct EqualityEvaluator {
    kind: EqualityKind,
    affirmative: bool,
    assembler: ValueAssembler,
    location: Option<jsonsieve_json::Location>,
}

impl EqualityEvaluator {
    pub fn new(kind: EqualityKind, affirmative: bool) -> Self {
        Self {
            kind,
            affirmative,
            assembler: ValueAssembler::new(),
            location: None,
        }
    }
}

impl Evaluator for EqualityEvaluator {
    fn evaluate(&mut self, event: &Event, _depth: usize, sink: &mut dyn ProblemSink) -> Verdict {
        if self.location.is_none() {
            self.location = Some(event.location);
        }
        let value = match self.assembler.feed(&event.kind) {
            Some(value) => value,
            None => return Verdict::Pending,
        };
        let location = self.location.unwrap_or(event.location);
        let (matches, key, expected) = match &self.kind {
            EqualityKind::Const(expected) => (
                value == *expected,
                if self.affirmative {
                    "instance.problem.const"
                } else {
                    "instance.problem.not.const"
                },
                expected.clone(),
            ),
            EqualityKind::Enum(values) => (
                values.contains(&value),
                if self.affirmative {
                    "instance.problem.enum"
                } else {
                    "instance.problem.not.enum"
                },
                JsonValue::Array(values.clone()),
            ),
        };
        if matches == self.affirmative {
            return Verdict::True;
        }
        let keyword = match &self.kind {
            EqualityKind::Const(_) => "const",
            EqualityKind::Enum(_) => "enum",
        };
        sink.dispatch(
            Problem::builder(key)
                .keyword(keyword)
                .location(location)
                .param("expected", expected)
                .param("actual", value)
                .build(),
        );
        Verdict::False
    }
}

/// Which numeric bound is being asserted.
#[derive(Debug, Clone, Copy)]
pub enum NumericAssertion {
    MultipleOf,
    Maximum,
    ExclusiveMaximum,
    Minimum,
    ExclusiveMinimum,
}

impl NumericAssertion {
    pub fn keyword(self) -> &'static str {
        match self {
            NumericAssertion::MultipleOf => "multipleOf",
            NumericAssertion::Maximum => "maximum",
            NumericAssertion::ExclusiveMaximum => "exclusiveMaximum",
            NumericAssertion::Minimum => "minimum",
            NumericAssertion::ExclusiveMinimum => "exclusiveMinimum",
        }
    }

    fn message_key(self, affirmative: bool) -> &'static str {
        match (self, affirmative) {
            (NumericAssertion::MultipleOf, true) => "instance.problem.multipleOf",
            (NumericAssertion::MultipleOf, false) => "instance.problem.not.multipleOf",
            (NumericAssertion::Maximum, true) => "instance.problem.maximum",
            (NumericAssertion::Maximum, false) => "instance.problem.not.maximum",
            (NumericAssertion::ExclusiveMaximum, true) => "instance.problem.exclusiveMaximum",
            (NumericAssertion::ExclusiveMaximum, false) => "instance.problem.not.exclusiveMaximum",
            (NumericAssertion::Minimum, true) => "instance.problem.minimum",
            (NumericAssertion::Minimum, false) => "instance.problem.not.minimum",
            (NumericAssertion::ExclusiveMinimum, true) => "instance.problem.exclusiveMinimum",
            (NumericAssertion::ExclusiveMinimum, false) => "instance.problem.not.exclusiveMinimum",
        }
    }

    fn test(self, value: Decimal, bound: Decimal) -> bool {
        match self {
            NumericAssertion::MultipleOf => (value % bound).is_zero(),
            NumericAssertion::Maximum => value <= bound,
            NumericAssertion::ExclusiveMaximum => value < bound,
            NumericAssertion::Minimum => value >= bound,
            NumericAssertion::ExclusiveMinimum => value > bound,
        }
    }
}

/// One numeric bound against the single number event.
pub struct NumericEvaluator {
    assertion: NumericAssertion,
    bound: Decimal,
    affirmative: bool,
}

impl NumericEvaluator {
    pub fn new(assertion: NumericAssertion, bound: Decimal, affirmative: bool) -> Self {
        Self {
            assertion,
            bound,
            affirmative,
        }
    }
}

impl Evaluator for NumericEvaluator {
    fn evaluate(&mut self, event: &Event, _depth: usize, sink: &mut dyn ProblemSink) -> Verdict {
        let value = match &event.kind {
            EventKind::Number(n) => n.value(),
            _ => return Verdict::True,
        };
        if self.assertion.test(value, self.bound) == self.affirmative {
            return Verdict::True;
        }
        let param = if matches!(self.assertion, NumericAssertion::MultipleOf) {
            "factor"
        } else {
            "limit"
        };
        sink.dispatch(
            Problem::builder(self.assertion.message_key(self.affirmative))
                .keyword(self.assertion.keyword())
                .location(event.location)
                .param(param, self.bound)
                .param("actual", value)
                .build(),
        );
        Verdict::False
    }
}

/// `maxLength` / `minLength`, counted in Unicode scalar values.
pub struct StringLengthEvaluator {
    max: bool,
    limit: usize,
    affirmative: bool,
}

impl StringLengthEvaluator {
    pub fn max(limit: usize, affirmative: bool) -> Self {
        Self {
            max: true,
            limit,
            affirmative,
        }
    }

    pub fn min(limit: usize, affirmative: bool) -> Self {
        Self {
            max: false,
            limit,
            affirmative,
        }
    }
}

impl Evaluator for StringLengthEvaluator {
    fn evaluate(&mut self, event: &Event, _depth: usize, sink: &mut dyn ProblemSink) -> Verdict {
        let value = match &event.kind {
            EventKind::String(s) => s,
            _ => return Verdict::True,
        };
        // Code points, not bytes or UTF-16 units.
        let length = value.chars().count();
        let ok = if self.max {
            length <= self.limit
        } else {
            length >= self.limit
        };
        if ok == self.affirmative {
            return Verdict::True;
        }
        let key = match (self.max, self.affirmative) {
            (true, true) => "instance.problem.maxLength",
            (true, false) => "instance.problem.not.maxLength",
            (false, true) => "instance.problem.minLength",
            (false, false) => "instance.problem.not.minLength",
        };
        sink.dispatch(
            Problem::builder(key)
                .keyword(if self.max { "maxLength" } else { "minLength" })
                .location(event.location)
                .param("limit", self.limit)
                .param("actual", length)
                .build(),
        );
        Verdict::False
    }
}

/// `pattern`: ECMA-262 find semantics (unanchored).
pub struct PatternEvaluator {
    regex: Regex,
    affirmative: bool,
}

impl PatternEvaluator {
    pub fn new(regex: Regex, affirmative: bool) -> Self {
        Self { regex, affirmative }
    }
}

impl Evaluator for PatternEvaluator {
    fn evaluate(&mut self, event: &Event, _depth: usize, sink: &mut dyn ProblemSink) -> Verdict {
        let value = match &event.kind {
            EventKind::String(s) => s,
            _ => return Verdict::True,
        };
        if self.regex.is_match(value) == self.affirmative {
            return Verdict::True;
        }
        let key = if self.affirmative {
            "instance.problem.pattern"
        } else {
            "instance.problem.not.pattern"
        };
        sink.dispatch(
            Problem::builder(key)
                .keyword("pattern")
                .location(event.location)
                .param("pattern", self.regex.as_str())
                .param("actual", value.as_str())
                .build(),
        );
        Verdict::False
    }
}

/// `format` with a matcher from the registry.
pub struct FormatEvaluator {
    attribute: String,
    matcher: fn(&str) -> bool,
    affirmative: bool,
}

impl FormatEvaluator {
    pub fn new(attribute: impl Into<String>, matcher: fn(&str) -> bool, affirmative: bool) -> Self {
        Self {
            attribute: attribute.into(),
            matcher,
            affirmative,
        }
    }
}

impl Evaluator for FormatEvaluator {
    fn evaluate(&mut self, event: &Event, _depth: usize, sink: &mut dyn ProblemSink) -> Verdict {
        let value = match &event.kind {
            EventKind::String(s) => s,
            _ => return Verdict::True,
        };
        if (self.matcher)(value) == self.affirmative {
            return Verdict::True;
        }
        let key = if self.affirmative {
            "instance.problem.format"
        } else {
            "instance.problem.not.format"
        };
        sink.dispatch(
            Problem::builder(key)
                .keyword("format")
                .location(event.location)
                .param("attribute", self.attribute.clone())
                .param("actual", value.as_str())
                .build(),
        );
        Verdict::False
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonsieve_json::{JsonNumber, Location};
    use std::str::FromStr;

    fn number_event(text: &str) -> Event {
        Event::new(
            EventKind::Number(JsonNumber::from_literal(text)),
            Location::default(),
        )
    }

    fn string_event(text: &str) -> Event {
        Event::new(EventKind::String(text.to_string()), Location::default())
    }

    #[test]
    fn test_multiple_of_is_exact_decimal() {
        let mut sink = Vec::new();
        let mut evaluator = NumericEvaluator::new(
            NumericAssertion::MultipleOf,
            Decimal::from_str("0.1").unwrap(),
            true,
        );
        assert_eq!(
            evaluator.evaluate(&number_event("0.3"), 0, &mut sink),
            Verdict::True
        );
        assert!(sink.is_empty());
    }

    #[test]
    fn test_maximum_violation() {
        let mut sink = Vec::new();
        let mut evaluator =
            NumericEvaluator::new(NumericAssertion::Maximum, Decimal::from(100), true);
        assert_eq!(
            evaluator.evaluate(&number_event("100.5"), 0, &mut sink),
            Verdict::False
        );
        assert_eq!(sink[0].keyword(), Some("maximum"));
    }

    #[test]
    fn test_string_length_counts_code_points() {
        let mut sink = Vec::new();
        let mut evaluator = StringLengthEvaluator::max(2, true);
        assert_eq!(
            evaluator.evaluate(&string_event("日本"), 0, &mut sink),
            Verdict::True
        );
    }

    #[test]
    fn test_negated_const_succeeds_on_mismatch() {
        let mut sink = Vec::new();
        let mut evaluator =
            EqualityEvaluator::new(EqualityKind::Const(JsonValue::Bool(true)), false);
        assert_eq!(
            evaluator.evaluate(
                &Event::new(EventKind::False, Location::default()),
                0,
                &mut sink
            ),
            Verdict::True
        );
    }

    #[test]
    fn test_const_canonicalises_numbers() {
        let mut sink = Vec::new();
        let mut evaluator = EqualityEvaluator::new(
            EqualityKind::Const(JsonValue::Number(Decimal::from(1))),
            true,
        );
        assert_eq!(
            evaluator.evaluate(&number_event("1.0"), 0, &mut sink),
            Verdict::True
        );
    }

    #[test]
    fn test_pattern_uses_find_semantics() {
        let mut sink = Vec::new();
        let mut evaluator = PatternEvaluator::new(Regex::new("b+").unwrap(), true);
        assert_eq!(
            evaluator.evaluate(&string_event("abbc"), 0, &mut sink),
            Verdict::True
        );
    }
}

//! Parse events yielded by the event reader.

use crate::location::Location;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

/// A single parse event with the location it started at.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub location: Location,
}

impl Event {
    pub fn new(kind: EventKind, location: Location) -> Self {
        Self { kind, location }
    }
}

/// The kind of a parse event.
///
/// Scalar values carry their payload so that consumers never need to reach
/// back into the parser state.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    KeyName(String),
    String(String),
    Number(JsonNumber),
    True,
    False,
    Null,
}

impl EventKind {
    /// Short lowercase name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::StartObject => "start of object",
            EventKind::EndObject => "end of object",
            EventKind::StartArray => "start of array",
            EventKind::EndArray => "end of array",
            EventKind::KeyName(_) => "object key",
            EventKind::String(_) => "string",
            EventKind::Number(_) => "number",
            EventKind::True => "true",
            EventKind::False => "false",
            EventKind::Null => "null",
        }
    }
}

/// A JSON number literal.
///
/// The literal text is kept verbatim; `value` is the decimal interpretation
/// used for all comparisons. Literals whose magnitude exceeds the decimal
/// range are clamped to the nearest representable value.
#[derive(Debug, Clone)]
pub struct JsonNumber {
    text: String,
    value: Decimal,
    integral: bool,
}

impl JsonNumber {
    /// Interpret a literal already checked against the JSON number grammar.
    pub fn from_literal(text: &str) -> Self {
        let value = parse_decimal(text);
        let integral = value == value.trunc();
        Self {
            text: text.to_string(),
            value,
            integral,
        }
    }

    /// The literal text as it appeared in the input.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The numeric value.
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Whether the value is mathematically an integer (`1.0` and `1e2` are).
    pub fn is_integral(&self) -> bool {
        self.integral
    }
}

impl From<Decimal> for JsonNumber {
    fn from(value: Decimal) -> Self {
        Self {
            text: value.to_string(),
            value,
            integral: value == value.trunc(),
        }
    }
}

/// Numbers compare by value, not by literal text.
impl PartialEq for JsonNumber {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl fmt::Display for JsonNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn parse_decimal(text: &str) -> Decimal {
    let parsed = if text.contains(['e', 'E']) {
        Decimal::from_scientific(text)
    } else {
        Decimal::from_str(text)
    };
    parsed.unwrap_or_else(|_| {
        // Out of decimal range; clamp through f64 so comparisons stay sane.
        match text.parse::<f64>() {
            Ok(f) if f.is_finite() => Decimal::from_f64_retain(f).unwrap_or(Decimal::MAX),
            Ok(f) if f < 0.0 => Decimal::MIN,
            _ => Decimal::MAX,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_and_scientific_are_equal() {
        let one = JsonNumber::from_literal("1");
        assert_eq!(one, JsonNumber::from_literal("1.0"));
        assert_eq!(one, JsonNumber::from_literal("1e0"));
        assert_eq!(one, JsonNumber::from_literal("0.1e1"));
    }

    #[test]
    fn test_integral_detection() {
        assert!(JsonNumber::from_literal("42").is_integral());
        assert!(JsonNumber::from_literal("1.0").is_integral());
        assert!(JsonNumber::from_literal("1e2").is_integral());
        assert!(!JsonNumber::from_literal("100.5").is_integral());
    }

    #[test]
    fn test_text_is_preserved() {
        assert_eq!(JsonNumber::from_literal("1.50").text(), "1.50");
    }
}

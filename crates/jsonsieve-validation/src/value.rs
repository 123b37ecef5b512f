//! In-memory JSON values and instance types.
//!
//! The engine itself never materializes instances; this representation exists
//! for the keywords that need whole values (`const`, `enum`, `uniqueItems`),
//! for schema documents, and for the value-reading output surface.
//!
//! All numeric values use `rust_decimal::Decimal` -- never `f64` -- so that
//! `1`, `1.0` and `1e0` compare equal and `multipleOf` remainders are exact.

use jsonsieve_json::JsonNumber;
use rust_decimal::Decimal;
use std::fmt;

/// The closed set of JSON instance types.
///
/// `Integer` is a refinement of `Number`: an instance is an integer iff its
/// value is numerically equal to a mathematical integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceType {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

impl InstanceType {
    /// The keyword spelling used in `type` and in problem messages.
    pub fn name(&self) -> &'static str {
        match self {
            InstanceType::Null => "null",
            InstanceType::Boolean => "boolean",
            InstanceType::Integer => "integer",
            InstanceType::Number => "number",
            InstanceType::String => "string",
            InstanceType::Array => "array",
            InstanceType::Object => "object",
        }
    }

    /// Parse a `type` keyword entry.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "null" => InstanceType::Null,
            "boolean" => InstanceType::Boolean,
            "integer" => InstanceType::Integer,
            "number" => InstanceType::Number,
            "string" => InstanceType::String,
            "array" => InstanceType::Array,
            "object" => InstanceType::Object,
            _ => return None,
        })
    }

    /// Whether an instance of type `self` satisfies a `type` constraint
    /// naming `expected`. Integers are numbers.
    pub fn satisfies(&self, expected: InstanceType) -> bool {
        *self == expected || (expected == InstanceType::Number && *self == InstanceType::Integer)
    }
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A JSON value.
///
/// Object members keep their document order; equality is key-order
/// insensitive (see [`PartialEq`] below).
#[derive(Debug, Clone)]
pub enum JsonValue {
    Null,
    Bool(bool),
    Number(Decimal),
    String(String),
    Array(Vec<JsonValue>),
    Object(Vec<(String, JsonValue)>),
}

impl JsonValue {
    pub fn instance_type(&self) -> InstanceType {
        match self {
            JsonValue::Null => InstanceType::Null,
            JsonValue::Bool(_) => InstanceType::Boolean,
            JsonValue::Number(n) => {
                if *n == n.trunc() {
                    InstanceType::Integer
                } else {
                    InstanceType::Number
                }
            }
            JsonValue::String(_) => InstanceType::String,
            JsonValue::Array(_) => InstanceType::Array,
            JsonValue::Object(_) => InstanceType::Object,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            JsonValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&[(String, JsonValue)]> {
        match self {
            JsonValue::Object(members) => Some(members),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[JsonValue]> {
        match self {
            JsonValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            JsonValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            JsonValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Look up a member of an object value.
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.as_object()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Convert to a `serde_json::Value` for machine-readable output.
    pub fn to_serde(&self) -> serde_json::Value {
        match self {
            JsonValue::Null => serde_json::Value::Null,
            JsonValue::Bool(b) => serde_json::Value::Bool(*b),
            JsonValue::Number(n) => {
                use rust_decimal::prelude::ToPrimitive;
                if *n == n.trunc() {
                    if let Some(i) = n.to_i64() {
                        return serde_json::Value::from(i);
                    }
                }
                n.to_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(serde_json::Value::Number)
                    .unwrap_or_else(|| serde_json::Value::String(n.to_string()))
            }
            JsonValue::String(s) => serde_json::Value::String(s.clone()),
            JsonValue::Array(items) => {
                serde_json::Value::Array(items.iter().map(JsonValue::to_serde).collect())
            }
            JsonValue::Object(members) => serde_json::Value::Object(
                members
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_serde()))
                    .collect(),
            ),
        }
    }
}

impl From<JsonNumber> for JsonValue {
    fn from(n: JsonNumber) -> Self {
        JsonValue::Number(n.value())
    }
}

/// Structural equality: numbers by numeric value, objects key-order
/// insensitive.
impl PartialEq for JsonValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (JsonValue::Null, JsonValue::Null) => true,
            (JsonValue::Bool(a), JsonValue::Bool(b)) => a == b,
            (JsonValue::Number(a), JsonValue::Number(b)) => a == b,
            (JsonValue::String(a), JsonValue::String(b)) => a == b,
            (JsonValue::Array(a), JsonValue::Array(b)) => a == b,
            (JsonValue::Object(a), JsonValue::Object(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(key, value)| {
                        b.iter().any(|(other_key, other_value)| {
                            key == other_key && value == other_value
                        })
                    })
            }
            _ => false,
        }
    }
}

/// Compact JSON rendering, used in problem messages.
impl fmt::Display for JsonValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonValue::Null => f.write_str("null"),
            JsonValue::Bool(true) => f.write_str("true"),
            JsonValue::Bool(false) => f.write_str("false"),
            JsonValue::Number(n) => write!(f, "{}", n),
            JsonValue::String(s) => write_json_string(f, s),
            JsonValue::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            JsonValue::Object(members) => {
                f.write_str("{")?;
                for (i, (key, value)) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write_json_string(f, key)?;
                    write!(f, ":{}", value)?;
                }
                f.write_str("}")
            }
        }
    }
}

fn write_json_string(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for ch in s.chars() {
        match ch {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if (c as u32) < 0x20 => write!(f, "\\u{:04x}", c as u32)?,
            c => write!(f, "{}", c)?,
        }
    }
    f.write_str("\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn num(s: &str) -> JsonValue {
        JsonValue::Number(Decimal::from_str(s).unwrap())
    }

    #[test]
    fn test_numbers_compare_by_value() {
        assert_eq!(num("1"), num("1.0"));
        assert_eq!(num("0.30"), num("0.3"));
        assert_ne!(num("1"), num("2"));
    }

    #[test]
    fn test_object_equality_ignores_key_order() {
        let a = JsonValue::Object(vec![
            ("x".to_string(), num("1")),
            ("y".to_string(), num("2")),
        ]);
        let b = JsonValue::Object(vec![
            ("y".to_string(), num("2")),
            ("x".to_string(), num("1")),
        ]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_integer_refines_number() {
        assert_eq!(num("1.0").instance_type(), InstanceType::Integer);
        assert_eq!(num("100.5").instance_type(), InstanceType::Number);
        assert!(InstanceType::Integer.satisfies(InstanceType::Number));
        assert!(!InstanceType::Number.satisfies(InstanceType::Integer));
    }
}

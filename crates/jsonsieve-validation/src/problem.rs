//! Validation problems.
//!
//! A problem is an immutable record of a single validation failure: a stable
//! message key, an ordered parameter bag, the source location it was detected
//! at, and the keyword that produced it. Compound failures (`anyOf`,
//! `oneOf`) additionally carry *branches*: one problem list per attempted
//! subschema.

use crate::catalog::{self, Locale};
use crate::value::JsonValue;
use indexmap::IndexMap;
use jsonsieve_json::Location;
use rust_decimal::Decimal;
use std::fmt;

/// A value carried in a problem's parameter bag.
#[derive(Debug, Clone, PartialEq)]
pub enum ProblemValue {
    String(String),
    Number(Decimal),
    Size(usize),
    StringList(Vec<String>),
    Json(JsonValue),
}

impl fmt::Display for ProblemValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProblemValue::String(s) => f.write_str(s),
            ProblemValue::Number(n) => write!(f, "{}", n),
            ProblemValue::Size(n) => write!(f, "{}", n),
            ProblemValue::StringList(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "\"{}\"", item)?;
                }
                f.write_str("]")
            }
            ProblemValue::Json(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for ProblemValue {
    fn from(s: &str) -> Self {
        ProblemValue::String(s.to_string())
    }
}

impl From<String> for ProblemValue {
    fn from(s: String) -> Self {
        ProblemValue::String(s)
    }
}

impl From<usize> for ProblemValue {
    fn from(n: usize) -> Self {
        ProblemValue::Size(n)
    }
}

impl From<Decimal> for ProblemValue {
    fn from(n: Decimal) -> Self {
        ProblemValue::Number(n)
    }
}

impl From<Vec<String>> for ProblemValue {
    fn from(items: Vec<String>) -> Self {
        ProblemValue::StringList(items)
    }
}

impl From<JsonValue> for ProblemValue {
    fn from(v: JsonValue) -> Self {
        ProblemValue::Json(v)
    }
}

/// A single validation failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    message_key: String,
    parameters: IndexMap<String, ProblemValue>,
    location: Option<Location>,
    keyword: Option<String>,
    branches: Vec<Vec<Problem>>,
}

impl Problem {
    pub fn builder(message_key: impl Into<String>) -> ProblemBuilder {
        ProblemBuilder {
            message_key: message_key.into(),
            parameters: IndexMap::new(),
            location: None,
            keyword: None,
            branches: Vec::new(),
        }
    }

    /// The stable message key, resolved through the catalog when rendering.
    pub fn message_key(&self) -> &str {
        &self.message_key
    }

    pub fn parameters(&self) -> &IndexMap<String, ProblemValue> {
        &self.parameters
    }

    pub fn location(&self) -> Option<Location> {
        self.location
    }

    /// The schema keyword that produced this problem, when known.
    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref()
    }

    /// Child problem lists of a compound problem; empty for simple problems.
    pub fn branches(&self) -> &[Vec<Problem>] {
        &self.branches
    }

    pub fn has_branches(&self) -> bool {
        !self.branches.is_empty()
    }

    /// The localized message with parameters substituted.
    pub fn message(&self, locale: &Locale) -> String {
        let template = catalog::template(locale, &self.message_key);
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            match rest[open..].find('}') {
                Some(close) => {
                    let name = &rest[open + 1..open + close];
                    match self.parameters.get(name) {
                        Some(value) => out.push_str(&value.to_string()),
                        None => {
                            out.push('{');
                            out.push_str(name);
                            out.push('}');
                        }
                    }
                    rest = &rest[open + close + 1..];
                }
                None => {
                    out.push_str(&rest[open..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }

    /// Machine-readable form, used by the CLI's `--json` output.
    pub fn to_serde(&self, locale: &Locale) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        map.insert(
            "message".to_string(),
            serde_json::Value::String(self.message(locale)),
        );
        map.insert(
            "key".to_string(),
            serde_json::Value::String(self.message_key.clone()),
        );
        if let Some(keyword) = &self.keyword {
            map.insert(
                "keyword".to_string(),
                serde_json::Value::String(keyword.clone()),
            );
        }
        if let Some(location) = self.location {
            map.insert(
                "location".to_string(),
                serde_json::json!({ "row": location.row + 1, "column": location.column + 1 }),
            );
        }
        if !self.branches.is_empty() {
            let branches: Vec<serde_json::Value> = self
                .branches
                .iter()
                .map(|list| {
                    serde_json::Value::Array(list.iter().map(|p| p.to_serde(locale)).collect())
                })
                .collect();
            map.insert("branches".to_string(), serde_json::Value::Array(branches));
        }
        serde_json::Value::Object(map)
    }
}

/// Builder for [`Problem`].
#[derive(Debug)]
pub struct ProblemBuilder {
    message_key: String,
    parameters: IndexMap<String, ProblemValue>,
    location: Option<Location>,
    keyword: Option<String>,
    branches: Vec<Vec<Problem>>,
}

impl ProblemBuilder {
    pub fn param(mut self, name: &str, value: impl Into<ProblemValue>) -> Self {
        self.parameters.insert(name.to_string(), value.into());
        self
    }

    pub fn location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn keyword(mut self, keyword: &str) -> Self {
        self.keyword = Some(keyword.to_string());
        self
    }

    pub fn branches(mut self, branches: Vec<Vec<Problem>>) -> Self {
        self.branches = branches;
        self
    }

    pub fn build(self) -> Problem {
        Problem {
            message_key: self.message_key,
            parameters: self.parameters,
            location: self.location,
            keyword: self.keyword,
            branches: self.branches,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_substitution() {
        let problem = Problem::builder("instance.problem.maxLength")
            .keyword("maxLength")
            .param("limit", 3usize)
            .param("actual", 5usize)
            .build();
        let message = problem.message(&Locale::english());
        assert!(message.contains('3'), "{message}");
        assert!(message.contains('5'), "{message}");
    }

    #[test]
    fn test_unknown_parameter_is_left_verbatim() {
        let problem = Problem::builder("instance.problem.maxLength").build();
        let message = problem.message(&Locale::english());
        assert!(message.contains("{limit}"), "{message}");
    }

    #[test]
    fn test_unknown_key_falls_back_to_key_text() {
        let problem = Problem::builder("no.such.key").build();
        assert_eq!(problem.message(&Locale::english()), "no.such.key");
    }
}

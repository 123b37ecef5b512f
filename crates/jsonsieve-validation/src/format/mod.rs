//! String format attributes.
//!
//! Each attribute is a pure `&str -> bool` matcher. Registries are
//! per-validator instances; the defaults cover every Draft-07 format.
//! In strict mode an unknown `format` is a build error, in lax mode it
//! degrades to an inert annotation.

mod datetime;
mod email;
mod hostname;
mod ipaddr;
mod pointer;
mod uri;

use std::collections::HashMap;

/// A format matcher. Pure function; shareable across evaluations.
pub type FormatMatcher = fn(&str) -> bool;

/// Maps format attribute names to matchers.
#[derive(Debug, Clone)]
pub struct FormatRegistry {
    attributes: HashMap<String, FormatMatcher>,
}

impl FormatRegistry {
    /// An empty registry; every format is unknown.
    pub fn empty() -> Self {
        Self {
            attributes: HashMap::new(),
        }
    }

    /// A registry with all Draft-07 format attributes registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register("date", datetime::date);
        registry.register("date-time", datetime::date_time);
        registry.register("time", datetime::time);
        registry.register("email", email::email);
        registry.register("idn-email", email::idn_email);
        registry.register("hostname", hostname::hostname);
        registry.register("idn-hostname", hostname::idn_hostname);
        registry.register("ipv4", ipaddr::ipv4);
        registry.register("ipv6", ipaddr::ipv6);
        registry.register("json-pointer", pointer::json_pointer);
        registry.register("relative-json-pointer", pointer::relative_json_pointer);
        registry.register("regex", regex_attribute);
        registry.register("uri", uri::uri);
        registry.register("uri-reference", uri::uri_reference);
        registry.register("iri", uri::iri);
        registry.register("iri-reference", uri::iri_reference);
        registry.register("uri-template", uri::uri_template);
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, matcher: FormatMatcher) {
        self.attributes.insert(name.into(), matcher);
    }

    pub fn get(&self, name: &str) -> Option<FormatMatcher> {
        self.attributes.get(name).copied()
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// The `regex` format: the string must compile as an ECMA-262 pattern.
/// Approximated with the host regex engine, like most implementations.
fn regex_attribute(value: &str) -> bool {
    regex::Regex::new(value).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_draft07() {
        let registry = FormatRegistry::with_defaults();
        for name in [
            "date",
            "date-time",
            "time",
            "email",
            "idn-email",
            "hostname",
            "idn-hostname",
            "ipv4",
            "ipv6",
            "json-pointer",
            "relative-json-pointer",
            "regex",
            "uri",
            "uri-reference",
            "iri",
            "iri-reference",
            "uri-template",
        ] {
            assert!(registry.get(name).is_some(), "missing format {name}");
        }
    }

    #[test]
    fn test_regex_attribute() {
        assert!(regex_attribute("^a+$"));
        assert!(!regex_attribute("(unclosed"));
    }
}

//! Localized message catalogs.
//!
//! Catalogs are embedded JSON maps from message key to template, loaded
//! lazily at first use. Lookup falls back from the requested locale to
//! English, and from English to the raw key, so a missing entry can never
//! panic mid-validation.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// A BCP 47-ish locale tag. Only the primary subtag is significant for
/// catalog lookup (`ja-JP` and `ja_JP.UTF-8` both select the `ja` catalog).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    tag: String,
}

impl Locale {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    pub fn english() -> Self {
        Self::new("en")
    }

    /// Pick the locale from the standard environment variables, in the
    /// usual precedence order.
    pub fn from_env() -> Self {
        for name in ["LC_ALL", "LC_MESSAGES", "LANG"] {
            if let Ok(value) = std::env::var(name) {
                if !value.is_empty() && value != "C" && value != "POSIX" {
                    return Self::new(value);
                }
            }
        }
        Self::english()
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The lowercase primary subtag (`ja_JP.UTF-8` → `ja`).
    pub fn primary(&self) -> String {
        self.tag
            .split(['-', '_', '.'])
            .next()
            .unwrap_or("")
            .to_ascii_lowercase()
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::english()
    }
}

static CATALOGS: Lazy<HashMap<&'static str, HashMap<String, String>>> = Lazy::new(|| {
    let mut catalogs = HashMap::new();
    catalogs.insert("en", load(include_str!("messages/en.json")));
    catalogs.insert("ja", load(include_str!("messages/ja.json")));
    catalogs
});

fn load(data: &str) -> HashMap<String, String> {
    serde_json::from_str(data).expect("embedded message catalog is invalid JSON")
}

/// Resolve a message key to its template for the given locale.
pub fn template<'a>(locale: &Locale, key: &'a str) -> &'a str {
    lookup(&locale.primary(), key)
        .or_else(|| lookup("en", key))
        .unwrap_or(key)
}

fn lookup(tag: &str, key: &str) -> Option<&'static str> {
    CATALOGS.get(tag)?.get(key).map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogs_load() {
        assert!(!CATALOGS["en"].is_empty());
        assert!(!CATALOGS["ja"].is_empty());
    }

    #[test]
    fn test_catalogs_cover_the_same_keys() {
        let en: std::collections::BTreeSet<_> = CATALOGS["en"].keys().collect();
        let ja: std::collections::BTreeSet<_> = CATALOGS["ja"].keys().collect();
        assert_eq!(en, ja);
    }

    #[test]
    fn test_locale_fallback() {
        let french = Locale::new("fr-FR");
        assert_eq!(
            template(&french, "instance.problem.anyOf"),
            template(&Locale::english(), "instance.problem.anyOf")
        );
    }

    #[test]
    fn test_japanese_lookup() {
        let ja = Locale::new("ja_JP.UTF-8");
        assert_ne!(
            template(&ja, "instance.problem.anyOf"),
            template(&Locale::english(), "instance.problem.anyOf")
        );
    }
}

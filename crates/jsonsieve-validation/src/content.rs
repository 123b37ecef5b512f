//! `contentEncoding` / `contentMediaType` assertions.
//!
//! Known values become assertions; unknown values degrade to inert
//! annotations at schema-reading time. When an encoding is known but the
//! string does not decode, the media-type assertion has nothing to test
//! and succeeds, per the lax contract of Draft-07 content keywords.

use crate::evaluator::{Evaluator, ProblemSink, Verdict};
use crate::problem::Problem;
use base64::Engine;
use jsonsieve_json::{Event, EventKind, JsonEventReader};

/// A known content transfer encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncodingScheme {
    Base64,
}

impl ContentEncodingScheme {
    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("base64") {
            Some(ContentEncodingScheme::Base64)
        } else {
            None
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ContentEncodingScheme::Base64 => "base64",
        }
    }

    pub fn decode(&self, value: &str) -> Option<Vec<u8>> {
        match self {
            ContentEncodingScheme::Base64 => {
                base64::engine::general_purpose::STANDARD.decode(value).ok()
            }
        }
    }

    pub fn can_decode(&self, value: &str) -> bool {
        self.decode(value).is_some()
    }
}

/// A known media type matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentMimeType {
    ApplicationJson,
}

impl ContentMimeType {
    /// Parse the type/subtype part; parameters after `;` are accepted and
    /// ignored.
    pub fn from_name(name: &str) -> Option<Self> {
        let essence = name.split(';').next().unwrap_or("").trim();
        if essence.eq_ignore_ascii_case("application/json") {
            Some(ContentMimeType::ApplicationJson)
        } else {
            None
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ContentMimeType::ApplicationJson => "application/json",
        }
    }

    pub fn test_bytes(&self, bytes: &[u8]) -> bool {
        match std::str::from_utf8(bytes) {
            Ok(text) => self.test_text(text),
            Err(_) => false,
        }
    }

    pub fn test_text(&self, text: &str) -> bool {
        match self {
            ContentMimeType::ApplicationJson => {
                let mut reader = JsonEventReader::new(text);
                loop {
                    match reader.next_event() {
                        Ok(Some(_)) => {}
                        Ok(None) => return true,
                        Err(_) => return false,
                    }
                }
            }
        }
    }
}

/// The `contentEncoding` assertion: the string must decode.
pub struct ContentEncodingEvaluator {
    scheme: ContentEncodingScheme,
    affirmative: bool,
}

impl ContentEncodingEvaluator {
    pub fn new(scheme: ContentEncodingScheme, affirmative: bool) -> Self {
        Self {
            scheme,
            affirmative,
        }
    }
}

impl Evaluator for ContentEncodingEvaluator {
    fn evaluate(&mut self, event: &Event, _depth: usize, sink: &mut dyn ProblemSink) -> Verdict {
        let value = match &event.kind {
            EventKind::String(s) => s,
            _ => return Verdict::True,
        };
        if self.scheme.can_decode(value) == self.affirmative {
            return Verdict::True;
        }
        let key = if self.affirmative {
            "instance.problem.contentEncoding"
        } else {
            "instance.problem.not.contentEncoding"
        };
        sink.dispatch(
            Problem::builder(key)
                .keyword("contentEncoding")
                .location(event.location)
                .param("encoding", self.scheme.name())
                .build(),
        );
        Verdict::False
    }
}

/// The `contentMediaType` assertion, optionally decoding through the
/// sibling `contentEncoding` first.
pub struct ContentMediaTypeEvaluator {
    mime_type: ContentMimeType,
    encoding: Option<ContentEncodingScheme>,
    affirmative: bool,
}

impl ContentMediaTypeEvaluator {
    pub fn new(
        mime_type: ContentMimeType,
        encoding: Option<ContentEncodingScheme>,
        affirmative: bool,
    ) -> Self {
        Self {
            mime_type,
            encoding,
            affirmative,
        }
    }

    /// `default_result` is returned when the sibling encoding cannot
    /// decode the string: nothing to test.
    fn test_value(&self, value: &str, default_result: bool) -> bool {
        match self.encoding {
            Some(scheme) => match scheme.decode(value) {
                Some(bytes) => self.mime_type.test_bytes(&bytes),
                None => default_result,
            },
            None => self.mime_type.test_text(value),
        }
    }
}

impl Evaluator for ContentMediaTypeEvaluator {
    fn evaluate(&mut self, event: &Event, _depth: usize, sink: &mut dyn ProblemSink) -> Verdict {
        let value = match &event.kind {
            EventKind::String(s) => s,
            _ => return Verdict::True,
        };
        if self.test_value(value, self.affirmative) == self.affirmative {
            return Verdict::True;
        }
        let key = if self.affirmative {
            "instance.problem.contentMediaType"
        } else {
            "instance.problem.not.contentMediaType"
        };
        sink.dispatch(
            Problem::builder(key)
                .keyword("contentMediaType")
                .location(event.location)
                .param("type", self.mime_type.name())
                .build(),
        );
        Verdict::False
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonsieve_json::Location;

    fn string_event(text: &str) -> Event {
        Event::new(EventKind::String(text.to_string()), Location::default())
    }

    #[test]
    fn test_media_type_parses_parameters() {
        assert_eq!(
            ContentMimeType::from_name("application/json; charset=utf-8"),
            Some(ContentMimeType::ApplicationJson)
        );
        assert_eq!(ContentMimeType::from_name("text/html"), None);
    }

    #[test]
    fn test_json_media_type() {
        let mime = ContentMimeType::ApplicationJson;
        assert!(mime.test_text(r#"{"a": 1}"#));
        assert!(!mime.test_text("{broken"));
    }

    #[test]
    fn test_base64_then_json() {
        // {"x":true} in base64
        let encoded = base64::engine::general_purpose::STANDARD.encode(r#"{"x":true}"#);
        let mut evaluator = ContentMediaTypeEvaluator::new(
            ContentMimeType::ApplicationJson,
            Some(ContentEncodingScheme::Base64),
            true,
        );
        let mut sink = Vec::new();
        assert_eq!(
            evaluator.evaluate(&string_event(&encoded), 0, &mut sink),
            Verdict::True
        );
    }

    #[test]
    fn test_undecodable_string_is_not_tested() {
        let mut evaluator = ContentMediaTypeEvaluator::new(
            ContentMimeType::ApplicationJson,
            Some(ContentEncodingScheme::Base64),
            true,
        );
        let mut sink = Vec::new();
        assert_eq!(
            evaluator.evaluate(&string_event("%%% not base64 %%%"), 0, &mut sink),
            Verdict::True
        );
        assert!(sink.is_empty());
    }

    #[test]
    fn test_encoding_assertion() {
        let mut evaluator = ContentEncodingEvaluator::new(ContentEncodingScheme::Base64, true);
        let mut sink = Vec::new();
        assert_eq!(
            evaluator.evaluate(&string_event("aGVsbG8="), 0, &mut sink),
            Verdict::True
        );
        let mut evaluator = ContentEncodingEvaluator::new(ContentEncodingScheme::Base64, true);
        assert_eq!(
            evaluator.evaluate(&string_event("!!!"), 0, &mut sink),
            Verdict::False
        );
    }
}

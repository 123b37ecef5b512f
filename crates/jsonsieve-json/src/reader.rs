//! Pull-style event reader enforcing the JSON grammar.

use crate::error::{Error, Result};
use crate::event::{Event, EventKind};
use crate::location::Location;
use crate::tokenizer::{Token, TokenKind, Tokenizer};

/// What the grammar expects next inside the innermost open container.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Container {
    /// Inside an object: `true` when a key (or `}`) is expected and a `}`
    /// is still permitted (i.e. no dangling comma).
    ObjectKey { end_allowed: bool },
    /// Inside an object, after a key and its colon.
    ObjectValue,
    /// Inside an object, after a member value.
    ObjectComma,
    /// Inside an array: `true` when a `]` is still permitted.
    ArrayValue { end_allowed: bool },
    /// Inside an array, after an element.
    ArrayComma,
}

/// A validating pull reader producing one [`Event`] per call.
///
/// The reader checks the full JSON grammar: matched brackets, key/colon
/// pairs, comma placement, and a single top-level value with no trailing
/// content.
pub struct JsonEventReader<'a> {
    tokenizer: Tokenizer<'a>,
    stack: Vec<Container>,
    done: bool,
}

impl<'a> JsonEventReader<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            tokenizer: Tokenizer::new(input),
            stack: Vec::new(),
            done: false,
        }
    }

    /// Pull the next event, or `None` after the top-level value completes.
    pub fn next_event(&mut self) -> Result<Option<Event>> {
        let token = match self.tokenizer.next_token()? {
            Some(token) => token,
            None => {
                if self.done {
                    return Ok(None);
                }
                return Err(Error::UnexpectedEnd {
                    location: self.tokenizer.location(),
                });
            }
        };
        if self.done {
            return Err(Error::TrailingData {
                location: token.location,
            });
        }
        let event = match self.stack.last().copied() {
            None => self.on_value(token)?,
            Some(Container::ObjectKey { end_allowed }) => self.on_object_key(token, end_allowed)?,
            Some(Container::ObjectValue) => {
                *self.stack.last_mut().unwrap() = Container::ObjectComma;
                self.on_value(token)?
            }
            Some(Container::ObjectComma) => self.on_object_comma(token)?,
            Some(Container::ArrayValue { end_allowed }) => {
                self.on_array_value(token, end_allowed)?
            }
            Some(Container::ArrayComma) => self.on_array_comma(token)?,
        };
        if self.stack.is_empty() {
            self.done = true;
        }
        Ok(Some(event))
    }

    /// A value is expected; scalar tokens complete it, brackets open a
    /// container.
    fn on_value(&mut self, token: Token) -> Result<Event> {
        let location = token.location;
        let kind = match token.kind {
            TokenKind::LeftBrace => {
                self.stack.push(Container::ObjectKey { end_allowed: true });
                EventKind::StartObject
            }
            TokenKind::LeftBracket => {
                self.stack.push(Container::ArrayValue { end_allowed: true });
                EventKind::StartArray
            }
            TokenKind::String(s) => EventKind::String(s),
            TokenKind::Number(n) => EventKind::Number(n),
            TokenKind::True => EventKind::True,
            TokenKind::False => EventKind::False,
            TokenKind::Null => EventKind::Null,
            other => return Err(unexpected(other, location)),
        };
        Ok(Event::new(kind, location))
    }

    fn on_object_key(&mut self, token: Token, end_allowed: bool) -> Result<Event> {
        let location = token.location;
        match token.kind {
            TokenKind::String(key) => {
                self.expect_colon()?;
                *self.stack.last_mut().unwrap() = Container::ObjectValue;
                Ok(Event::new(EventKind::KeyName(key), location))
            }
            TokenKind::RightBrace if end_allowed => {
                self.stack.pop();
                Ok(Event::new(EventKind::EndObject, location))
            }
            other => Err(unexpected(other, location)),
        }
    }

    fn on_object_comma(&mut self, token: Token) -> Result<Event> {
        let location = token.location;
        match token.kind {
            TokenKind::Comma => {
                *self.stack.last_mut().unwrap() = Container::ObjectKey { end_allowed: false };
                let next = self.tokenizer.next_token()?.ok_or(Error::UnexpectedEnd {
                    location: self.tokenizer.location(),
                })?;
                self.on_object_key(next, false)
            }
            TokenKind::RightBrace => {
                self.stack.pop();
                Ok(Event::new(EventKind::EndObject, location))
            }
            other => Err(unexpected(other, location)),
        }
    }

    fn on_array_value(&mut self, token: Token, end_allowed: bool) -> Result<Event> {
        let location = token.location;
        if token.kind == TokenKind::RightBracket {
            if !end_allowed {
                return Err(unexpected(TokenKind::RightBracket, location));
            }
            self.stack.pop();
            return Ok(Event::new(EventKind::EndArray, location));
        }
        *self.stack.last_mut().unwrap() = Container::ArrayComma;
        self.on_value(token)
    }

    fn on_array_comma(&mut self, token: Token) -> Result<Event> {
        let location = token.location;
        match token.kind {
            TokenKind::Comma => {
                *self.stack.last_mut().unwrap() = Container::ArrayValue { end_allowed: false };
                let next = self.tokenizer.next_token()?.ok_or(Error::UnexpectedEnd {
                    location: self.tokenizer.location(),
                })?;
                self.on_array_value(next, false)
            }
            TokenKind::RightBracket => {
                self.stack.pop();
                Ok(Event::new(EventKind::EndArray, location))
            }
            other => Err(unexpected(other, location)),
        }
    }

    fn expect_colon(&mut self) -> Result<()> {
        match self.tokenizer.next_token()? {
            Some(Token {
                kind: TokenKind::Colon,
                ..
            }) => Ok(()),
            Some(token) => Err(unexpected(token.kind, token.location)),
            None => Err(Error::UnexpectedEnd {
                location: self.tokenizer.location(),
            }),
        }
    }
}

fn unexpected(kind: TokenKind, location: Location) -> Error {
    Error::UnexpectedToken {
        token: kind.name().to_string(),
        location,
    }
}

impl Iterator for JsonEventReader<'_> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::JsonNumber;

    fn events(input: &str) -> Vec<EventKind> {
        JsonEventReader::new(input)
            .map(|e| e.unwrap().kind)
            .collect()
    }

    #[test]
    fn test_scalar_document() {
        assert_eq!(events("42"), vec![EventKind::Number(JsonNumber::from_literal("42"))]);
        assert_eq!(events("\"x\""), vec![EventKind::String("x".to_string())]);
        assert_eq!(events("null"), vec![EventKind::Null]);
    }

    #[test]
    fn test_nested_structure() {
        assert_eq!(
            events(r#"{"a": [1, {"b": true}], "c": null}"#),
            vec![
                EventKind::StartObject,
                EventKind::KeyName("a".to_string()),
                EventKind::StartArray,
                EventKind::Number(JsonNumber::from_literal("1")),
                EventKind::StartObject,
                EventKind::KeyName("b".to_string()),
                EventKind::True,
                EventKind::EndObject,
                EventKind::EndArray,
                EventKind::KeyName("c".to_string()),
                EventKind::Null,
                EventKind::EndObject,
            ]
        );
    }

    #[test]
    fn test_empty_containers() {
        assert_eq!(
            events("{}"),
            vec![EventKind::StartObject, EventKind::EndObject]
        );
        assert_eq!(
            events("[]"),
            vec![EventKind::StartArray, EventKind::EndArray]
        );
    }

    #[test]
    fn test_trailing_data_is_rejected() {
        let mut reader = JsonEventReader::new("1 2");
        assert!(reader.next_event().unwrap().is_some());
        assert!(matches!(
            reader.next_event(),
            Err(Error::TrailingData { .. })
        ));
    }

    #[test]
    fn test_trailing_comma_is_rejected() {
        let mut reader = JsonEventReader::new("[1,]");
        assert!(reader.next_event().unwrap().is_some());
        assert!(reader.next_event().unwrap().is_some());
        assert!(matches!(
            reader.next_event(),
            Err(Error::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_missing_colon_is_rejected() {
        let mut reader = JsonEventReader::new(r#"{"a" 1}"#);
        assert!(reader.next_event().unwrap().is_some());
        assert!(matches!(
            reader.next_event(),
            Err(Error::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_unclosed_container_is_rejected() {
        let mut reader = JsonEventReader::new("[1");
        assert!(reader.next_event().unwrap().is_some());
        assert!(reader.next_event().unwrap().is_some());
        assert!(matches!(reader.next_event(), Err(Error::UnexpectedEnd { .. })));
    }

    #[test]
    fn test_event_locations() {
        let mut reader = JsonEventReader::new("{\n  \"a\": 7\n}");
        let start = reader.next_event().unwrap().unwrap();
        assert_eq!((start.location.row, start.location.column), (0, 0));
        let key = reader.next_event().unwrap().unwrap();
        assert_eq!((key.location.row, key.location.column), (1, 2));
        let value = reader.next_event().unwrap().unwrap();
        assert_eq!((value.location.row, value.location.column), (1, 7));
    }
}

//! Incremental assembly of [`JsonValue`]s from parse events.
//!
//! Used by the keywords that cannot avoid seeing whole values (`const`,
//! `enum`, `uniqueItems`) and by the value-reading output surface. This is
//! the documented bounded exception to the streaming principle.

use crate::value::JsonValue;
use jsonsieve_json::EventKind;

enum Frame {
    Array(Vec<JsonValue>),
    Object {
        members: Vec<(String, JsonValue)>,
        pending_key: Option<String>,
    },
}

/// Builds one JSON value from the event sequence of its scope.
#[derive(Default)]
pub struct ValueAssembler {
    stack: Vec<Frame>,
}

impl ValueAssembler {
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }

    /// Feed one event. Returns the finished value on the event that
    /// completes it.
    pub fn feed(&mut self, kind: &EventKind) -> Option<JsonValue> {
        match kind {
            EventKind::StartObject => {
                self.stack.push(Frame::Object {
                    members: Vec::new(),
                    pending_key: None,
                });
                None
            }
            EventKind::StartArray => {
                self.stack.push(Frame::Array(Vec::new()));
                None
            }
            EventKind::KeyName(key) => {
                if let Some(Frame::Object { pending_key, .. }) = self.stack.last_mut() {
                    *pending_key = Some(key.clone());
                }
                None
            }
            EventKind::EndObject => {
                let members = match self.stack.pop() {
                    Some(Frame::Object { members, .. }) => members,
                    _ => Vec::new(),
                };
                self.complete(JsonValue::Object(members))
            }
            EventKind::EndArray => {
                let items = match self.stack.pop() {
                    Some(Frame::Array(items)) => items,
                    _ => Vec::new(),
                };
                self.complete(JsonValue::Array(items))
            }
            EventKind::String(s) => self.complete(JsonValue::String(s.clone())),
            EventKind::Number(n) => self.complete(JsonValue::Number(n.value())),
            EventKind::True => self.complete(JsonValue::Bool(true)),
            EventKind::False => self.complete(JsonValue::Bool(false)),
            EventKind::Null => self.complete(JsonValue::Null),
        }
    }

    fn complete(&mut self, value: JsonValue) -> Option<JsonValue> {
        match self.stack.last_mut() {
            None => Some(value),
            Some(Frame::Array(items)) => {
                items.push(value);
                None
            }
            Some(Frame::Object {
                members,
                pending_key,
            }) => {
                if let Some(key) = pending_key.take() {
                    // Duplicate keys: the last occurrence wins.
                    if let Some(existing) = members.iter_mut().find(|(k, _)| *k == key) {
                        existing.1 = value;
                    } else {
                        members.push((key, value));
                    }
                }
                None
            }
        }
    }
}

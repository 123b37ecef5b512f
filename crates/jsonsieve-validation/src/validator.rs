//! Driving evaluation from an event source.
//!
//! The validating event reader forwards every event unchanged while the
//! evaluator tree runs alongside; all problems caused by an event are
//! handed to the problem handler before the next event is returned.

use crate::evaluator::assembler::ValueAssembler;
use crate::evaluator::{instance_type_of, BoxedEvaluator, Verdict};
use crate::problem::Problem;
use crate::schema::Schema;
use crate::value::JsonValue;
use jsonsieve_json::{Event, EventKind, JsonEventReader, Location};
use std::collections::VecDeque;
use std::sync::Arc;

/// Anything that can feed parse events to the engine.
pub trait EventSource {
    fn next_event(&mut self) -> jsonsieve_json::Result<Option<Event>>;
}

impl EventSource for JsonEventReader<'_> {
    fn next_event(&mut self) -> jsonsieve_json::Result<Option<Event>> {
        JsonEventReader::next_event(self)
    }
}

/// Replays an in-memory value as an event stream. Locations are absent.
pub struct ValueEventSource {
    queue: VecDeque<Event>,
}

impl ValueEventSource {
    pub fn new(value: &JsonValue) -> Self {
        let mut queue = VecDeque::new();
        push_events(value, &mut queue);
        Self { queue }
    }
}

fn push_events(value: &JsonValue, queue: &mut VecDeque<Event>) {
    let at = Location::default();
    match value {
        JsonValue::Null => queue.push_back(Event::new(EventKind::Null, at)),
        JsonValue::Bool(true) => queue.push_back(Event::new(EventKind::True, at)),
        JsonValue::Bool(false) => queue.push_back(Event::new(EventKind::False, at)),
        JsonValue::Number(n) => {
            queue.push_back(Event::new(EventKind::Number((*n).into()), at))
        }
        JsonValue::String(s) => queue.push_back(Event::new(EventKind::String(s.clone()), at)),
        JsonValue::Array(items) => {
            queue.push_back(Event::new(EventKind::StartArray, at));
            for item in items {
                push_events(item, queue);
            }
            queue.push_back(Event::new(EventKind::EndArray, at));
        }
        JsonValue::Object(members) => {
            queue.push_back(Event::new(EventKind::StartObject, at));
            for (key, member) in members {
                queue.push_back(Event::new(EventKind::KeyName(key.clone()), at));
                push_events(member, queue);
            }
            queue.push_back(Event::new(EventKind::EndObject, at));
        }
    }
}

impl EventSource for ValueEventSource {
    fn next_event(&mut self) -> jsonsieve_json::Result<Option<Event>> {
        Ok(self.queue.pop_front())
    }
}

/// Wraps an event source, forwarding events unchanged and diverting
/// problems to a handler.
pub struct ValidatingEventReader<S, H>
where
    S: EventSource,
    H: FnMut(&[Problem]),
{
    source: S,
    schema: Arc<Schema>,
    handler: H,
    evaluator: Option<BoxedEvaluator>,
    depth: usize,
    decided: bool,
    buffer: Vec<Problem>,
}

impl<S, H> ValidatingEventReader<S, H>
where
    S: EventSource,
    H: FnMut(&[Problem]),
{
    pub fn new(schema: Arc<Schema>, source: S, handler: H) -> Self {
        Self {
            source,
            schema,
            handler,
            evaluator: None,
            depth: 0,
            decided: false,
            buffer: Vec::new(),
        }
    }

    /// Pull the next event. Problems raised by it reach the handler
    /// before this call returns.
    pub fn next_event(&mut self) -> jsonsieve_json::Result<Option<Event>> {
        let Some(event) = self.source.next_event()? else {
            return Ok(None);
        };
        self.process(&event);
        Ok(Some(event))
    }

    fn process(&mut self, event: &Event) {
        let depth = match &event.kind {
            EventKind::StartObject | EventKind::StartArray => {
                let depth = self.depth;
                self.depth += 1;
                depth
            }
            EventKind::EndObject | EventKind::EndArray => {
                self.depth = self.depth.saturating_sub(1);
                self.depth
            }
            _ => self.depth,
        };
        if !self.decided {
            if self.evaluator.is_none() {
                if let Some(ty) = instance_type_of(&event.kind) {
                    self.evaluator = Some(self.schema.evaluator(ty, true));
                }
            }
            if let Some(evaluator) = self.evaluator.as_mut() {
                let verdict = evaluator.evaluate(event, depth, &mut self.buffer);
                if verdict != Verdict::Pending {
                    self.decided = true;
                }
            }
        }
        if !self.buffer.is_empty() {
            let problems = std::mem::take(&mut self.buffer);
            (self.handler)(&problems);
        }
    }
}

/// A compiled schema ready to evaluate instances.
#[derive(Clone)]
pub struct Validator {
    schema: Arc<Schema>,
}

impl Validator {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Validate JSON text, collecting every problem.
    pub fn validate_str(&self, input: &str) -> jsonsieve_json::Result<Vec<Problem>> {
        self.validate_source(JsonEventReader::new(input))
    }

    /// Validate an already-parsed value.
    pub fn validate_value(&self, value: &JsonValue) -> Vec<Problem> {
        // A value replay cannot produce parse errors.
        self.validate_source(ValueEventSource::new(value))
            .unwrap_or_default()
    }

    /// Drain an event source, collecting every problem.
    pub fn validate_source<S: EventSource>(&self, source: S) -> jsonsieve_json::Result<Vec<Problem>> {
        let mut problems = Vec::new();
        let mut reader = ValidatingEventReader::new(Arc::clone(&self.schema), source, |batch| {
            problems.extend_from_slice(batch)
        });
        while reader.next_event()?.is_some() {}
        drop(reader);
        Ok(problems)
    }

    /// Read the whole instance into a value while validating it.
    pub fn read_value(&self, input: &str) -> jsonsieve_json::Result<(JsonValue, Vec<Problem>)> {
        let mut problems = Vec::new();
        let mut assembler = ValueAssembler::new();
        let mut value = None;
        let mut reader = ValidatingEventReader::new(
            Arc::clone(&self.schema),
            JsonEventReader::new(input),
            |batch| problems.extend_from_slice(batch),
        );
        while let Some(event) = reader.next_event()? {
            if let Some(complete) = assembler.feed(&event.kind) {
                value = Some(complete);
            }
        }
        drop(reader);
        match value {
            Some(value) => Ok((value, problems)),
            // The event reader errors out before this can happen.
            None => Err(jsonsieve_json::Error::UnexpectedEnd {
                location: Location::default(),
            }),
        }
    }
}

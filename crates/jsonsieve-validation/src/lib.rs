// Streaming JSON Schema (Draft-07) validation.
//
// This crate compiles schemas into a keyword graph and evaluates instances
// as event streams: schema evaluation, including conditional composition
// and $ref resolution, runs without materializing the instance as a tree
// and without re-reading the input.

pub mod catalog;
pub mod content;
pub mod evaluator;
pub mod format;
pub mod keyword;
pub mod metaschema;
pub mod problem;
pub mod render;
pub mod schema;
pub mod validator;
pub mod value;

pub use catalog::Locale;
pub use format::FormatRegistry;
pub use problem::{Problem, ProblemValue};
pub use render::ProblemRenderer;
pub use schema::builder::{BuildError, SchemaBuilder};
pub use schema::reader::{ReadError, SchemaReader};
pub use schema::Schema;
pub use validator::{EventSource, ValidatingEventReader, Validator, ValueEventSource};
pub use value::{InstanceType, JsonValue};

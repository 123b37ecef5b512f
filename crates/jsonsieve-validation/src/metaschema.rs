//! The embedded Draft-07 meta-schema.

use crate::schema::reader::SchemaReader;
use crate::schema::Schema;
use once_cell::sync::Lazy;
use std::sync::Arc;

/// The `$schema` URI identifying Draft-07 documents.
pub const DRAFT07_URI: &str = "http://json-schema.org/draft-07/schema#";

/// The meta-schema JSON, embedded at compile time.
pub const DRAFT07_JSON: &str = include_str!("metaschema/draft-07.json");

static DRAFT07: Lazy<Arc<Schema>> = Lazy::new(|| {
    SchemaReader::new()
        .read_str(DRAFT07_JSON)
        .expect("embedded Draft-07 meta-schema is valid")
});

/// The compiled meta-schema, shared process-wide.
pub fn draft07() -> Arc<Schema> {
    Arc::clone(&DRAFT07)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metaschema_compiles() {
        let schema = draft07();
        assert!(schema.id().is_some());
    }
}

//! `$id` / `$ref` resolution.
//!
//! Two passes over the freshly built (still acyclic) graph: collect every
//! `$id`, composed against the nearest enclosing base per RFC 3986 section
//! 5, then bind every reference site. Misses are left unbound; the
//! evaluator reports them lazily as dereference problems, so validation
//! can still proceed everywhere else.

use super::{Schema, SchemaReference};
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

pub fn resolve(root: &Arc<Schema>, by_pointer: &HashMap<String, Arc<Schema>>) {
    let mut by_id: HashMap<String, Arc<Schema>> = HashMap::new();
    let mut sites: Vec<(Arc<Schema>, Option<Url>)> = Vec::new();
    collect(root, None, &mut by_id, &mut sites);
    let root_base = root.id().and_then(|id| Url::parse(id).ok());
    let root_doc = document_of(root_base.as_ref());
    for (site, base) in sites {
        let Schema::Ref(reference) = &*site else {
            continue;
        };
        bind(reference, &base, root, &root_doc, &by_id, by_pointer);
    }
}

fn collect(
    schema: &Arc<Schema>,
    base: Option<Url>,
    by_id: &mut HashMap<String, Arc<Schema>>,
    sites: &mut Vec<(Arc<Schema>, Option<Url>)>,
) {
    let base = match schema.id() {
        Some(id) => {
            // Anchors are found both by their literal spelling and by the
            // absolute form when a base exists.
            by_id.insert(id.to_string(), Arc::clone(schema));
            let composed = compose(base.as_ref(), id);
            if let Some(url) = &composed {
                by_id.insert(url.to_string(), Arc::clone(schema));
            }
            composed.or(base)
        }
        None => base,
    };
    if matches!(&**schema, Schema::Ref(_)) {
        sites.push((Arc::clone(schema), base.clone()));
    }
    for subschema in schema.subschemas() {
        collect(subschema, base.clone(), by_id, sites);
    }
}

fn bind(
    reference: &SchemaReference,
    base: &Option<Url>,
    root: &Arc<Schema>,
    root_doc: &Option<String>,
    by_id: &HashMap<String, Arc<Schema>>,
    by_pointer: &HashMap<String, Arc<Schema>>,
) {
    let uri = reference.uri();
    let resolved = compose(base.as_ref(), uri);
    if let Some(url) = &resolved {
        reference.set_resolved_uri(url.to_string());
    } else {
        reference.set_resolved_uri(uri.to_string());
    }
    if let Some(target) = by_id.get(uri) {
        reference.set_target(Arc::clone(target));
        return;
    }
    if let Some(url) = &resolved {
        if let Some(target) = by_id.get(url.as_str()) {
            reference.set_target(Arc::clone(target));
            return;
        }
    }
    // Same-document pointer or empty fragment.
    let (doc, fragment) = match uri.split_once('#') {
        Some((doc, fragment)) => (doc, Some(fragment)),
        None => (uri, None),
    };
    let same_document = if doc.is_empty() {
        document_of(base.as_ref()) == *root_doc
    } else {
        document_of(resolved.as_ref()).is_some() && document_of(resolved.as_ref()) == *root_doc
    };
    if !same_document {
        return;
    }
    match fragment {
        None | Some("") => reference.set_target(Arc::clone(root)),
        Some(pointer) if pointer.starts_with('/') => {
            if let Some(target) = by_pointer.get(&format!("#{pointer}")) {
                reference.set_target(Arc::clone(target));
            }
        }
        Some(_) => {}
    }
}

fn compose(base: Option<&Url>, reference: &str) -> Option<Url> {
    match base {
        Some(base) => base.join(reference).ok(),
        None => Url::parse(reference).ok(),
    }
}

/// The document part of a URI: everything except the fragment.
fn document_of(url: Option<&Url>) -> Option<String> {
    url.map(|url| {
        let mut url = url.clone();
        url.set_fragment(None);
        url.to_string()
    })
}

#[cfg(test)]
mod tests {
    use crate::schema::reader::SchemaReader;
    use crate::schema::Schema;

    #[test]
    fn test_id_based_resolution() {
        let reader = SchemaReader::new();
        let schema = reader
            .read_str(
                r#"{
                    "$id": "http://example.com/root.json",
                    "definitions": {
                        "leaf": {"$id": "leaf.json", "type": "string"}
                    },
                    "properties": {
                        "a": {"$ref": "http://example.com/leaf.json"}
                    }
                }"#,
            )
            .unwrap();
        let Schema::Object(object) = &*schema else {
            panic!("expected object schema");
        };
        let Some(crate::keyword::Keyword::Properties(map)) = object.keywords().get("properties")
        else {
            panic!("expected properties");
        };
        let sub = &map["a"];
        let Schema::Ref(reference) = &**sub else {
            panic!("expected reference");
        };
        assert!(reference.target().is_some());
    }

    #[test]
    fn test_recursive_root_ref() {
        let reader = SchemaReader::new();
        let schema = reader
            .read_str(r##"{"properties": {"child": {"$ref": "#"}}}"##)
            .unwrap();
        let Schema::Object(object) = &*schema else {
            panic!("expected object schema");
        };
        let Some(crate::keyword::Keyword::Properties(map)) = object.keywords().get("properties")
        else {
            panic!("expected properties");
        };
        let sub = &map["child"];
        let Schema::Ref(reference) = &**sub else {
            panic!("expected reference");
        };
        assert!(reference.target().is_some());
    }
}

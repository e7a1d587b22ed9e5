//! Template merge operations
//!
//! A template is an overlay tree shaped like a specification document but
//! carrying only the common fields (`$description`, `$extensions`). Several
//! template files can be combined into a single overlay with [`merge`] before
//! being attached to the parse [`Context`](crate::spec::Context); the parser
//! then folds the template's extension bags into every document node at the
//! matching path (a `*` key matches all children not explicitly addressed at
//! that level).
//!
//! The merge is a recursive deep merge: object-valued fields recurse (the
//! second tree's child keys override or extend the first one's), any other
//! field from the second tree replaces the first one's. Inputs are never
//! mutated; the result is a new tree.

use serde_json::Value;

/// Deep-merge template `b` into template `a`, returning a new tree.
///
/// For every key of `b`: when both sides hold an object, the objects are
/// merged recursively; otherwise `b`'s subtree replaces (or creates) the key.
/// Keys only present in `a` are preserved. Scalar roots follow the same rule:
/// `b` wins.
pub fn merge(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Object(a_map), Value::Object(b_map)) => {
            let mut merged = a_map.clone();
            for (key, b_value) in b_map {
                let replacement = match merged.get(key) {
                    Some(existing) if existing.is_object() && b_value.is_object() => {
                        merge(existing, b_value)
                    }
                    _ => b_value.clone(),
                };
                merged.insert(key.clone(), replacement);
            }
            Value::Object(merged)
        }
        _ => b.clone(),
    }
}

/// Merge an ordered list of templates into a single overlay.
///
/// Later templates override earlier ones, key by key. An empty list yields an
/// empty object.
pub fn merge_all<'a>(templates: impl IntoIterator<Item = &'a Value>) -> Value {
    templates
        .into_iter()
        .fold(Value::Object(serde_json::Map::new()), |acc, template| {
            merge(&acc, template)
        })
}

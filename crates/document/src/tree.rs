//! Shape-tolerant accessors over parsed document trees.
//!
//! Documents are arbitrary nestings of objects, arrays and strings;
//! every shape assumption the engine makes is expressed here as a total
//! accessor that returns `None`/empty on mismatch instead of failing.

use serde_json::Value;

/// A parsed document: a tree of objects, arrays, strings and other
/// scalars. `serde_json` is built with `preserve_order`, so object
/// entries iterate in document-declaration order.
pub type DocumentTree = Value;

/// Top-level entries of a document, in declaration order.
/// Empty if the top-level value is not an object.
pub fn entries(tree: &DocumentTree) -> impl Iterator<Item = (&str, &Value)> {
    tree.as_object()
        .into_iter()
        .flat_map(|obj| obj.iter().map(|(k, v)| (k.as_str(), v)))
}

/// Look up a property on an object value.
pub fn property<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.as_object().and_then(|obj| obj.get(key))
}

/// Interpret a value as a list of path strings.
///
/// Accepts both an array of strings and a bare string (the original
/// format allows either for include lists). Non-string array elements
/// are skipped. Returns `None` for any other shape, which callers
/// report as a malformed document.
pub fn path_list(value: &Value) -> Option<Vec<&str>> {
    match value {
        Value::String(s) => Some(vec![s.as_str()]),
        Value::Array(items) => Some(items.iter().filter_map(Value::as_str).collect()),
        _ => None,
    }
}

//! Flattening and path lookup.
//!
//! These helpers work on plain [`Value`]s, not on observable nodes. Bindings
//! use them to project the observed state into a dot-keyed map and to refresh
//! one entry of that map when a notification arrives.

use indexmap::IndexMap;

use super::{PathKey, Segment};
use crate::value::Value;

/// Dot-keyed view of a nested value, in traversal order.
pub type FlatMap = IndexMap<String, Value>;

/// Flatten a nested value into a map from path key to value.
///
/// - Arrays are kept whole under their own key, together with `<key>.length`,
///   and their elements are flattened beneath them.
/// - Plain objects are not kept; only their flattened members are.
/// - Everything else is a leaf.
///
/// ```rust,ignore
/// flatten(&json!({"a": 1, "c": [0, 1]}).into());
/// // {"a": 1, "c": [0, 1], "c.length": 2, "c.0": 0, "c.1": 1}
/// ```
pub fn flatten(value: &Value) -> FlatMap {
    let mut out = FlatMap::new();
    flatten_members(&mut out, &PathKey::root(), value);
    out
}

fn flatten_members(out: &mut FlatMap, prefix: &PathKey, value: &Value) {
    match value {
        Value::Object(obj) => {
            for (key, child) in obj.entries() {
                flatten_entry(out, prefix.child(Segment::Key(key)), child);
            }
        }
        Value::Array(arr) => {
            for (index, child) in arr.to_vec().into_iter().enumerate() {
                flatten_entry(out, prefix.child(index), child);
            }
        }
        _ => {}
    }
}

fn flatten_entry(out: &mut FlatMap, key: PathKey, value: Value) {
    match &value {
        Value::Array(arr) => {
            let length = key.child("length").to_string();
            out.insert(key.to_string(), value.clone());
            out.insert(length, Value::from(arr.len()));
            flatten_members(out, &key, &value);
        }
        Value::Object(_) => flatten_members(out, &key, &value),
        _ => {
            out.insert(key.to_string(), value);
        }
    }
}

/// Project `keys` out of a flattened map, in the order requested.
///
/// Keys missing from `flat` are present in the result as `Undefined`.
pub fn extract<I, K>(flat: &FlatMap, keys: I) -> FlatMap
where
    I: IntoIterator<Item = K>,
    K: AsRef<str>,
{
    keys.into_iter()
        .map(|key| {
            let key = key.as_ref();
            (key.to_string(), flat.get(key).cloned().unwrap_or_default())
        })
        .collect()
}

/// Look up the current value at a dotted path.
///
/// Returns `Undefined` as soon as a segment is missing instead of failing.
/// The empty path resolves to `value` itself.
pub fn resolve(value: &Value, path: &str) -> Value {
    PathKey::parse(path)
        .segments()
        .iter()
        .try_fold(value.clone(), |current, segment| current.member(segment))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        Value::from(json!({"a": 1, "b": 2, "c": {"d": "x"}}))
    }

    #[test]
    fn flatten_nested_object() {
        let flat = flatten(&sample());
        let keys: Vec<&str> = flat.keys().map(String::as_str).collect();

        assert_eq!(keys, vec!["a", "b", "c.d"]);
        assert_eq!(flat["a"], Value::from(1));
        assert_eq!(flat["c.d"], Value::from("x"));
        assert!(!flat.contains_key("c"));
    }

    #[test]
    fn flatten_keeps_arrays_and_lengths() {
        let value = Value::from(json!({"a": 1, "c": [0, 1]}));
        let flat = flatten(&value);
        let keys: Vec<&str> = flat.keys().map(String::as_str).collect();

        assert_eq!(keys, vec!["a", "c", "c.length", "c.0", "c.1"]);
        assert_eq!(flat["c"], Value::array([0, 1]));
        assert_eq!(flat["c.length"], Value::from(2));
        assert_eq!(flat["c.1"], Value::from(1));
    }

    #[test]
    fn flatten_objects_inside_arrays() {
        let value = Value::from(json!({"f": [{"g": "hi", "h": 10}]}));
        let flat = flatten(&value);

        assert_eq!(flat["f.length"], Value::from(1));
        assert_eq!(flat["f.0.g"], Value::from("hi"));
        assert_eq!(flat["f.0.h"], Value::from(10));
        assert!(!flat.contains_key("f.0"));
    }

    #[test]
    fn flatten_keeps_null_and_functions_as_leaves() {
        let f = Value::method(|_, _| Ok(Value::Undefined));
        let value = Value::object([("n", Value::Null), ("f", f.clone())]);
        let flat = flatten(&value);

        assert_eq!(flat["n"], Value::Null);
        assert_eq!(flat["f"], f);
    }

    #[test]
    fn flatten_primitive_is_empty() {
        assert!(flatten(&Value::from(3)).is_empty());
    }

    #[test]
    fn extract_selected_keys() {
        let flat = flatten(&sample());

        let all = extract(&flat, ["a", "b", "c.d"]);
        assert_eq!(all.len(), 3);
        assert_eq!(all["c.d"], Value::from("x"));

        let only_a = extract(&flat, ["a"]);
        assert_eq!(only_a.len(), 1);
        assert_eq!(only_a["a"], Value::from(1));
    }

    #[test]
    fn extract_omits_unselected_keys() {
        let flat = flatten(&sample());
        let nested = extract(&flat, ["c.d"]);

        assert_eq!(nested.len(), 1);
        assert_eq!(nested["c.d"], Value::from("x"));
        assert!(nested.get("a").is_none());
        assert!(nested.get("b").is_none());
        assert!(nested.get("c").is_none());
    }

    #[test]
    fn extract_missing_key_is_undefined() {
        let flat = flatten(&sample());
        let out = extract(&flat, ["zzz", "a"]);

        let keys: Vec<&str> = out.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zzz", "a"]);
        assert!(out["zzz"].is_undefined());
    }

    #[test]
    fn resolve_nested_path() {
        let value = Value::from(json!({"a": 1, "b": {"c": 2}}));
        assert_eq!(resolve(&value, "b.c"), Value::from(2));
        assert_eq!(resolve(&value, "a"), Value::from(1));
    }

    #[test]
    fn resolve_through_arrays() {
        let value = Value::from(json!({"f": [{"g": "x"}], "e": [1, 2, 3]}));
        assert_eq!(resolve(&value, "f.0.g"), Value::from("x"));
        assert_eq!(resolve(&value, "e.length"), Value::from(3));
        assert!(resolve(&value, "e.7").is_undefined());
    }

    #[test]
    fn resolve_missing_segment_is_undefined() {
        let value = Value::from(json!({"a": 1, "b": {"c": 2}, "n": null}));
        assert!(resolve(&value, "x.y.z").is_undefined());
        assert!(resolve(&value, "a.b").is_undefined());
        assert!(resolve(&value, "n.q").is_undefined());
    }

    #[test]
    fn resolve_empty_path_is_the_value() {
        let value = sample();
        assert_eq!(resolve(&value, ""), value);
    }
}

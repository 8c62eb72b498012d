//! Dynamic Values
//!
//! The observable wraps plain, dynamically shaped data: objects, arrays,
//! primitives and functions. [`Value`] is that data model.
//!
//! # Reference Semantics
//!
//! Primitives are copied, containers are shared. `Value::Object` and
//! `Value::Array` hold handles ([`ObjectRef`], [`ArrayRef`]) to storage that
//! lives as long as any handle does. Reading a nested object out of an
//! observable and writing into it mutates the same storage the root sees.
//!
//! # Equality
//!
//! `PartialEq` is structural for containers and by identity for functions.
//! Comparing a container graph that contains itself does not terminate.

mod method;
mod shared;

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

pub use method::Method;
pub use shared::{ArrayRef, ObjectRef};

use crate::error::{ObservableError, Result};
use crate::path::{Segment, SEPARATOR};
use crate::reactive::Node;

#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(ArrayRef),
    Object(ObjectRef),
    Function(Method),
}

impl Value {
    /// Build an object from key/value pairs, keeping their order.
    pub fn object<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let entries: IndexMap<String, Value> = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Value::Object(ObjectRef::new(entries))
    }

    pub fn array<V, I>(items: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        Value::Array(ArrayRef::new(items.into_iter().map(Into::into).collect()))
    }

    /// Wrap a closure as a method. See [`Method`].
    pub fn method<F>(f: F) -> Self
    where
        F: Fn(&Node, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Value::Function(Method::new(f))
    }

    /// Name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
        }
    }

    /// Objects and arrays are containers; everything else is returned
    /// unwrapped by observable reads.
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Object(_))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayRef> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&Method> {
        match self {
            Value::Function(method) => Some(method),
            _ => None,
        }
    }

    /// Read one member of this value.
    ///
    /// Objects are looked up by the segment's string form. Arrays accept an
    /// index or `length`; strings expose `length` (in UTF-16 units). Anything
    /// else has no members.
    pub fn member(&self, segment: &Segment) -> Option<Value> {
        match self {
            Value::Object(obj) => obj.get(&segment.to_string()),
            Value::Array(arr) => match segment {
                Segment::Index(i) => arr.get(*i),
                Segment::Key(k) if k == "length" => Some(Value::Number(arr.len() as f64)),
                Segment::Key(_) => None,
            },
            Value::String(s) => match segment {
                Segment::Key(k) if k == "length" => {
                    Some(Value::Number(s.encode_utf16().count() as f64))
                }
                _ => None,
            },
            _ => None,
        }
    }
}

/// Reject any object key in `value`'s graph that contains the path
/// separator. Shared containers are visited once.
pub(crate) fn validate_keys(value: &Value) -> Result<()> {
    let mut seen = HashSet::new();
    validate_keys_in(value, &mut seen)
}

fn validate_keys_in(value: &Value, seen: &mut HashSet<usize>) -> Result<()> {
    match value {
        Value::Object(obj) => {
            if !seen.insert(obj.addr()) {
                return Ok(());
            }
            for (key, child) in obj.entries() {
                if key.contains(SEPARATOR) {
                    return Err(ObservableError::SeparatorInKey { key });
                }
                validate_keys_in(&child, seen)?;
            }
            Ok(())
        }
        Value::Array(arr) => {
            if !seen.insert(arr.addr()) {
                return Ok(());
            }
            arr.to_vec()
                .iter()
                .try_for_each(|child| validate_keys_in(child, seen))
        }
        _ => Ok(()),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b) || a.to_vec() == b.to_vec(),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b) || a.entries() == b.entries(),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("Undefined"),
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Array(arr) => f.debug_list().entries(arr.to_vec()).finish(),
            Value::Object(obj) => f.debug_map().entries(obj.entries()).finish(),
            Value::Function(method) => fmt::Debug::fmt(method, f),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Undefined | Value::Null | Value::Function(_) => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(arr) => {
                let items = arr.to_vec();
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in &items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(obj) => {
                let entries = obj.entries();
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in &entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Conversions
// ----------------------------------------------------------------------------

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(ArrayRef::new(items))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

impl From<ArrayRef> for Value {
    fn from(arr: ArrayRef) -> Self {
        Value::Array(arr)
    }
}

impl From<Method> for Value {
    fn from(method: Method) -> Self {
        Value::Function(method)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::array(items),
            serde_json::Value::Object(map) => Value::object(map),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_preserves_shape_and_order() {
        let value = Value::from(json!({"b": 1, "a": [true, null, "x"], "c": {"d": 2.5}}));

        let obj = value.as_object().unwrap();
        assert_eq!(obj.keys(), vec!["b", "a", "c"]);
        assert_eq!(
            obj.get("a"),
            Some(Value::array([Value::from(true), Value::Null, Value::from("x")]))
        );
        assert_eq!(
            obj.get("c").unwrap().member(&Segment::Key("d".into())),
            Some(Value::from(2.5))
        );
    }

    #[test]
    fn containers_compare_structurally() {
        let a = Value::from(json!({"x": [1, 2]}));
        let b = Value::from(json!({"x": [1, 2]}));
        let c = Value::from(json!({"x": [1, 3]}));

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn functions_compare_by_identity() {
        let f = Value::method(|_, _| Ok(Value::Undefined));
        let g = Value::method(|_, _| Ok(Value::Undefined));

        assert_eq!(f, f.clone());
        assert_ne!(f, g);
    }

    #[test]
    fn member_lookup() {
        let arr = Value::array([10, 20]);
        assert_eq!(arr.member(&Segment::Index(1)), Some(Value::from(20)));
        assert_eq!(arr.member(&Segment::Key("length".into())), Some(Value::from(2)));
        assert_eq!(arr.member(&Segment::Index(5)), None);

        let s = Value::from("héllo");
        assert_eq!(s.member(&Segment::Key("length".into())), Some(Value::from(5)));

        assert_eq!(Value::Null.member(&Segment::Key("x".into())), None);
        assert_eq!(Value::from(3).member(&Segment::Key("x".into())), None);
    }

    #[test]
    fn validate_keys_rejects_separator() {
        let ok = Value::from(json!({"a": {"b": [{"c": 1}]}}));
        assert!(validate_keys(&ok).is_ok());

        let bad = Value::from(json!({"a": [{"c.d": 1}]}));
        let err = validate_keys(&bad).unwrap_err();
        assert!(matches!(err, ObservableError::SeparatorInKey { key } if key == "c.d"));
    }

    #[test]
    fn validate_keys_handles_cycles() {
        let obj = ObjectRef::default();
        obj.insert("self", Value::Object(obj.clone()));
        assert!(validate_keys(&Value::Object(obj)).is_ok());
    }

    #[test]
    fn serializes_to_json() {
        let value = Value::object([
            ("a", Value::from(1)),
            ("b", Value::Undefined),
            ("f", Value::method(|_, _| Ok(Value::Null))),
            ("l", Value::array(["x"])),
        ]);

        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json, json!({"a": 1.0, "b": null, "f": null, "l": ["x"]}));
    }
}

//! Shared Containers
//!
//! Objects and arrays are stored behind reference-counted handles. Cloning an
//! [`ObjectRef`] or [`ArrayRef`] clones the handle, not the contents, so every
//! wrapped node read from the same property points at the same storage.
//!
//! # Locking
//!
//! Each container has its own `RwLock`. Accessors copy what they need out of
//! the lock and release it before returning; no guard ever escapes this
//! module. Nested containers are separate locks, so walking a graph never
//! holds more than one at a time.

use std::collections::TryReserveError;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use super::Value;

#[derive(Debug, Default)]
struct ObjectData {
    entries: IndexMap<String, Value>,
    frozen: bool,
}

#[derive(Debug, Default)]
struct ArrayData {
    items: Vec<Value>,
    frozen: bool,
}

/// Handle to a mutable, insertion-ordered string-keyed object.
#[derive(Debug, Clone, Default)]
pub struct ObjectRef(Arc<RwLock<ObjectData>>);

impl ObjectRef {
    pub fn new(entries: IndexMap<String, Value>) -> Self {
        Self(Arc::new(RwLock::new(ObjectData {
            entries,
            frozen: false,
        })))
    }

    /// Get a copy of the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.read().entries.get(key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.read().entries.contains_key(key)
    }

    /// Store `value` under `key`.
    ///
    /// Returns `false` without touching the entries if the object is frozen.
    pub fn insert(&self, key: impl Into<String>, value: Value) -> bool {
        let mut data = self.0.write();
        if data.frozen {
            return false;
        }
        data.entries.insert(key.into(), value);
        true
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.read().entries.keys().cloned().collect()
    }

    /// Snapshot of the entries in insertion order.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.0
            .read()
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reject all further writes. Nested containers are not affected.
    pub fn freeze(&self) {
        self.0.write().frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.0.read().frozen
    }

    /// Whether both handles point at the same storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

/// Handle to a mutable array.
#[derive(Debug, Clone, Default)]
pub struct ArrayRef(Arc<RwLock<ArrayData>>);

impl ArrayRef {
    pub fn new(items: Vec<Value>) -> Self {
        Self(Arc::new(RwLock::new(ArrayData {
            items,
            frozen: false,
        })))
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.read().items.get(index).cloned()
    }

    /// Store `value` at `index`, padding with `Undefined` when `index` is past
    /// the end.
    ///
    /// Returns `Ok(false)` if the array is frozen, and an error if the padding
    /// cannot be allocated.
    pub fn set(&self, index: usize, value: Value) -> Result<bool, TryReserveError> {
        let mut data = self.0.write();
        if data.frozen {
            return Ok(false);
        }
        if index >= data.items.len() {
            resize(&mut data.items, index.saturating_add(1))?;
        }
        data.items[index] = value;
        Ok(true)
    }

    /// Truncate or pad the array to `len` elements.
    ///
    /// Returns `Ok(false)` if the array is frozen.
    pub fn set_len(&self, len: usize) -> Result<bool, TryReserveError> {
        let mut data = self.0.write();
        if data.frozen {
            return Ok(false);
        }
        resize(&mut data.items, len)?;
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.0.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the elements.
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.read().items.clone()
    }

    pub fn freeze(&self) {
        self.0.write().frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.0.read().frozen
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

/// Resize without aborting when the allocation is refused.
fn resize(items: &mut Vec<Value>, len: usize) -> Result<(), TryReserveError> {
    if len > items.len() {
        items.try_reserve_exact(len - items.len())?;
    }
    items.resize(len, Value::Undefined);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_clone_shares_storage() {
        let a = ObjectRef::default();
        let b = a.clone();

        a.insert("x", Value::from(1));
        assert_eq!(b.get("x"), Some(Value::from(1)));
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&ObjectRef::default()));
    }

    #[test]
    fn object_keeps_insertion_order() {
        let obj = ObjectRef::default();
        obj.insert("z", Value::Null);
        obj.insert("a", Value::Null);
        obj.insert("m", Value::Null);
        obj.insert("z", Value::from(true));

        assert_eq!(obj.keys(), vec!["z", "a", "m"]);
    }

    #[test]
    fn frozen_object_rejects_writes() {
        let obj = ObjectRef::default();
        obj.insert("x", Value::from(1));
        obj.freeze();

        assert!(!obj.insert("x", Value::from(2)));
        assert!(!obj.insert("y", Value::from(3)));
        assert_eq!(obj.get("x"), Some(Value::from(1)));
        assert!(!obj.contains_key("y"));
    }

    #[test]
    fn array_set_pads_past_end() {
        let arr = ArrayRef::new(vec![Value::from(1)]);
        assert!(arr.set(3, Value::from(4)).unwrap());

        assert_eq!(arr.len(), 4);
        assert_eq!(arr.get(1), Some(Value::Undefined));
        assert_eq!(arr.get(3), Some(Value::from(4)));
    }

    #[test]
    fn array_set_len_truncates_and_pads() {
        let arr = ArrayRef::new(vec![Value::from(1), Value::from(2), Value::from(3)]);

        assert!(arr.set_len(1).unwrap());
        assert_eq!(arr.to_vec(), vec![Value::from(1)]);

        assert!(arr.set_len(2).unwrap());
        assert_eq!(arr.to_vec(), vec![Value::from(1), Value::Undefined]);
    }

    #[test]
    fn frozen_array_rejects_writes() {
        let arr = ArrayRef::new(vec![Value::from(1)]);
        arr.freeze();

        assert!(!arr.set(0, Value::from(9)).unwrap());
        assert!(!arr.set_len(0).unwrap());
        assert_eq!(arr.to_vec(), vec![Value::from(1)]);
    }

    #[test]
    fn array_growth_past_addressable_size_fails() {
        let arr = ArrayRef::new(vec![Value::from(1), Value::from(2), Value::from(3)]);

        assert!(arr.set(usize::MAX, Value::from(1)).is_err());
        assert!(arr.set_len(usize::MAX).is_err());
        assert_eq!(arr.len(), 3);
    }
}

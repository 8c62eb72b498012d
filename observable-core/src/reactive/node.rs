//! Wrapped Nodes
//!
//! A [`Node`] is the interception boundary around one object or array in the
//! observed graph. It remembers the path it was reached by and the registry of
//! its root, so that every write through it can be announced at the right
//! path key.
//!
//! # Reads
//!
//! `get` fetches the underlying member. Objects and arrays come back as a new
//! `Node` one level deeper; primitives, functions, null and undefined come
//! back as plain values. Nodes are not cached: two reads of the same property
//! give two nodes over the same storage.
//!
//! # Writes
//!
//! `set` performs the assignment on the underlying storage first. If the
//! container accepted it, the child path is notified, which bubbles up through
//! every ancestor. A frozen container rejects the write: `set` returns
//! `Ok(false)` and nobody is notified.
//!
//! Array mutators (`push`, `pop`, `splice`, `fill`) are sequences of index
//! and `length` writes, each of which notifies on its own.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::registry::SubscriptionRegistry;
use crate::error::{ObservableError, Result};
use crate::path::{PathKey, Segment, SEPARATOR};
use crate::value::{self, ArrayRef, ObjectRef, Value};

/// Largest array length, `2^32 - 1`. Indices run below it.
const MAX_ARRAY_LENGTH: usize = u32::MAX as usize;

#[derive(Clone)]
enum Target {
    Object(ObjectRef),
    Array(ArrayRef),
}

/// A validated array write.
#[derive(Clone, Copy)]
enum ArrayWrite {
    Index(usize),
    Length(usize),
}

impl ArrayWrite {
    /// Length the array needs for the write to fit.
    fn required(self) -> usize {
        match self {
            ArrayWrite::Index(index) => index + 1,
            ArrayWrite::Length(len) => len,
        }
    }
}

/// Result of reading a property through a node.
#[derive(Debug, Clone)]
pub enum Property {
    /// An object or array, wrapped for further interception.
    Node(Node),
    /// Any other value, returned as is.
    Value(Value),
}

impl Property {
    /// The wrapped node, if this is an object or array.
    pub fn node(self) -> Option<Node> {
        match self {
            Property::Node(node) => Some(node),
            Property::Value(_) => None,
        }
    }

    /// The underlying value, unwrapping nodes back to their container.
    pub fn into_value(self) -> Value {
        match self {
            Property::Node(node) => node.to_value(),
            Property::Value(value) => value,
        }
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Property::Node(_))
    }
}

/// Interception boundary around an object or array.
#[derive(Clone)]
pub struct Node {
    target: Target,
    path: PathKey,
    registry: Arc<SubscriptionRegistry>,
}

impl Node {
    /// Wrap `value` at `path`. Returns `None` for non-containers.
    pub(crate) fn wrap(value: &Value, path: PathKey, registry: Arc<SubscriptionRegistry>) -> Option<Self> {
        let target = match value {
            Value::Object(obj) => Target::Object(obj.clone()),
            Value::Array(arr) => Target::Array(arr.clone()),
            _ => return None,
        };
        Some(Self {
            target,
            path,
            registry,
        })
    }

    /// Path from the root to this node. Empty for the root itself.
    pub fn path(&self) -> &PathKey {
        &self.path
    }

    pub fn is_array(&self) -> bool {
        matches!(self.target, Target::Array(_))
    }

    /// The wrapped container as a plain value. Shares storage with the node.
    pub fn to_value(&self) -> Value {
        match &self.target {
            Target::Object(obj) => Value::Object(obj.clone()),
            Target::Array(arr) => Value::Array(arr.clone()),
        }
    }

    /// Number of entries (objects) or elements (arrays).
    pub fn len(&self) -> usize {
        match &self.target {
            Target::Object(obj) => obj.len(),
            Target::Array(arr) => arr.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Property names of an object, or indices of an array, as path segments.
    pub fn keys(&self) -> Vec<Segment> {
        match &self.target {
            Target::Object(obj) => obj.keys().into_iter().map(Segment::Key).collect(),
            Target::Array(arr) => (0..arr.len()).map(Segment::Index).collect(),
        }
    }

    pub fn is_frozen(&self) -> bool {
        match &self.target {
            Target::Object(obj) => obj.is_frozen(),
            Target::Array(arr) => arr.is_frozen(),
        }
    }

    /// Freeze the wrapped container. Later writes to it are rejected.
    pub fn freeze(&self) {
        match &self.target {
            Target::Object(obj) => obj.freeze(),
            Target::Array(arr) => arr.freeze(),
        }
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// Read a property, wrapping objects and arrays.
    ///
    /// Missing properties read as `Undefined`. Arrays also expose `length`.
    pub fn get(&self, key: impl Into<Segment>) -> Property {
        let segment = self.normalize(key.into());
        let value = self.read(&segment);
        match Node::wrap(&value, self.path.child(segment), Arc::clone(&self.registry)) {
            Some(node) => Property::Node(node),
            None => Property::Value(value),
        }
    }

    /// Read a property without wrapping it.
    pub fn value(&self, key: impl Into<Segment>) -> Value {
        let segment = self.normalize(key.into());
        self.read(&segment)
    }

    /// Walk a dotted path below this node.
    ///
    /// Stops with `Undefined` at the first segment that does not lead into a
    /// container. The empty path returns this node.
    pub fn at(&self, path: &str) -> Property {
        let mut current = Property::Node(self.clone());
        for segment in PathKey::parse(path).segments() {
            current = match current {
                Property::Node(node) => node.get(segment.clone()),
                Property::Value(_) => return Property::Value(Value::Undefined),
            };
        }
        current
    }

    fn read(&self, segment: &Segment) -> Value {
        self.to_value().member(segment).unwrap_or_default()
    }

    /// Objects are keyed by string, arrays by index.
    fn normalize(&self, segment: Segment) -> Segment {
        match (&self.target, segment) {
            (Target::Object(_), Segment::Index(i)) => Segment::Key(i.to_string()),
            (Target::Array(_), Segment::Key(k)) => Segment::parse(&k),
            (_, segment) => segment,
        }
    }

    // ------------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------------

    /// Assign a property, then notify its path and every ancestor.
    ///
    /// Returns `Ok(false)` if the container is frozen. Listener failures are
    /// returned as `ObservableError::Listener` after the assignment has
    /// already taken effect. A write refused with `ReentrancyLimit` is not
    /// applied.
    ///
    /// On arrays only canonical indices below `2^32 - 1` and `length` are
    /// writable. Other keys, such as `"01"`, fail with `InvalidArrayKey`,
    /// although [`get`](Self::get) reads them as `Undefined`. Growing an array
    /// past `max_array_length` fails with `ArrayCapacity`.
    pub fn set(&self, key: impl Into<Segment>, value: impl Into<Value>) -> Result<bool> {
        let segment = self.normalize(key.into());
        let value = value.into();

        if let Segment::Key(k) = &segment {
            if k.contains(SEPARATOR) {
                return Err(ObservableError::SeparatorInKey { key: k.clone() });
            }
        }
        value::validate_keys(&value)?;

        let key = self.path.child(segment.clone());
        let applied = match &self.target {
            Target::Object(obj) => self
                .registry
                .write(&key, || Ok(obj.insert(segment.to_string(), value)))?,
            Target::Array(arr) => {
                let write = self.array_write(&segment, &value)?;
                self.registry.write(&key, || {
                    let stored = match write {
                        ArrayWrite::Index(index) => arr.set(index, value),
                        ArrayWrite::Length(len) => arr.set_len(len),
                    };
                    stored.map_err(|_| self.capacity_error(write.required()))
                })?
            }
        };

        if !applied {
            debug!(path = %key, "write rejected by frozen container");
        }
        Ok(applied)
    }

    /// Check an array write and work out what it stores.
    fn array_write(&self, segment: &Segment, value: &Value) -> Result<ArrayWrite> {
        let write = match segment {
            Segment::Index(index) if *index < MAX_ARRAY_LENGTH => ArrayWrite::Index(*index),
            Segment::Key(k) if k == "length" => ArrayWrite::Length(self.length_from(value)?),
            other => {
                return Err(ObservableError::InvalidArrayKey {
                    path: self.path.to_string(),
                    key: other.to_string(),
                });
            }
        };

        let required = write.required();
        if required > self.len() && required > self.registry.config().max_array_length {
            return Err(self.capacity_error(required));
        }
        Ok(write)
    }

    fn capacity_error(&self, requested: usize) -> ObservableError {
        ObservableError::ArrayCapacity {
            path: self.path.to_string(),
            requested,
            limit: self.registry.config().max_array_length,
        }
    }

    fn length_from(&self, value: &Value) -> Result<usize> {
        match value {
            Value::Number(n)
                if *n >= 0.0 && n.fract() == 0.0 && *n <= MAX_ARRAY_LENGTH as f64 =>
            {
                Ok(*n as usize)
            }
            other => Err(ObservableError::InvalidLength {
                path: self.path.child("length").to_string(),
                value: format!("{other:?}"),
            }),
        }
    }

    // ------------------------------------------------------------------------
    // Array mutators
    // ------------------------------------------------------------------------

    fn require_array(&self, operation: &str) -> Result<()> {
        if self.is_array() {
            return Ok(());
        }
        Err(ObservableError::InvalidArrayKey {
            path: self.path.to_string(),
            key: operation.to_string(),
        })
    }

    /// Append `value`. Writes the new index, then `length`.
    ///
    /// Returns the new length, or the unchanged length if the array is frozen.
    pub fn push(&self, value: impl Into<Value>) -> Result<usize> {
        self.require_array("push")?;
        let len = self.len();
        if !self.set(len, value)? {
            return Ok(len);
        }
        self.set("length", len + 1)?;
        Ok(self.len())
    }

    /// Remove and return the last element by shrinking `length`.
    ///
    /// Returns `None` for an empty or frozen array.
    pub fn pop(&self) -> Result<Option<Value>> {
        self.require_array("pop")?;
        let len = self.len();
        if len == 0 {
            self.set("length", 0)?;
            return Ok(None);
        }

        let last = self.value(len - 1);
        if !self.set("length", len - 1)? {
            return Ok(None);
        }
        Ok(Some(last))
    }

    /// Remove `delete_count` elements at `start` and insert `items` there.
    ///
    /// Elements after the removed range are moved with index writes, then
    /// `length` is written. Returns the removed elements; nothing is removed
    /// from a frozen array.
    pub fn splice<I>(&self, start: usize, delete_count: usize, items: I) -> Result<Vec<Value>>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.require_array("splice")?;
        if self.is_frozen() {
            debug!(path = %self.path, "splice rejected by frozen array");
            return Ok(Vec::new());
        }

        let items: Vec<Value> = items.into_iter().map(Into::into).collect();
        for item in &items {
            value::validate_keys(item)?;
        }

        let len = self.len();
        let start = start.min(len);
        let delete_count = delete_count.min(len - start);
        let insert_count = items.len();

        let current = self.to_value();
        let removed: Vec<Value> = (start..start + delete_count)
            .map(|i| current.member(&Segment::Index(i)).unwrap_or_default())
            .collect();

        if insert_count < delete_count {
            for from in start + delete_count..len {
                let to = from - delete_count + insert_count;
                self.set(to, self.value(from))?;
            }
        } else if insert_count > delete_count {
            for from in (start + delete_count..len).rev() {
                let to = from - delete_count + insert_count;
                self.set(to, self.value(from))?;
            }
        }

        for (offset, item) in items.into_iter().enumerate() {
            self.set(start + offset, item)?;
        }
        self.set("length", len - delete_count + insert_count)?;

        Ok(removed)
    }

    /// Write `value` to every index.
    ///
    /// Returns `false` if the array is frozen.
    pub fn fill(&self, value: impl Into<Value>) -> Result<bool> {
        self.require_array("fill")?;
        if self.is_frozen() {
            debug!(path = %self.path, "fill rejected by frozen array");
            return Ok(false);
        }

        let value = value.into();
        for index in 0..self.len() {
            self.set(index, value.clone())?;
        }
        Ok(true)
    }

    // ------------------------------------------------------------------------
    // Methods
    // ------------------------------------------------------------------------

    /// Call the function stored under `key` with this node as its receiver.
    pub fn call(&self, key: impl Into<Segment>, args: &[Value]) -> Result<Value> {
        let segment = self.normalize(key.into());
        match self.read(&segment) {
            Value::Function(method) => method.invoke(self, args),
            _ => Err(ObservableError::NotCallable {
                path: self.path.child(segment).to_string(),
            }),
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("path", &self.path.to_string())
            .field("value", &self.to_value())
            .finish()
    }
}

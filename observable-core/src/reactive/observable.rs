//! Observable Root
//!
//! [`Observable`] is what the caller constructs. It owns the subscription
//! registry for the whole graph and dereferences to the root [`Node`], so
//! reads and writes look the same at the root as anywhere else.
//!
//! Only the root exposes `subscribe`. Nested nodes can write and notify but
//! cannot register listeners; subscriptions always go through the value
//! returned by [`Observable::new`].

use std::ops::Deref;
use std::sync::Arc;

use tracing::debug;

use super::listener::{fallible, infallible};
use super::node::Node;
use super::registry::{Subscription, SubscriptionRegistry};
use crate::config::ObservableConfig;
use crate::error::{ListenerError, ObservableError, Result};
use crate::path::{self, FlatMap, PathKey};
use crate::value::{self, Value};

/// Deep-reactive wrapper around an object graph.
///
/// # Example
///
/// ```rust,ignore
/// let obs = Observable::new(json!({"a": 1, "b": {"c": 2}}))?;
///
/// let sub = obs.subscribe("b", || println!("b changed"));
/// obs.get("b").node().unwrap().set("c", 3)?;   // prints "b changed"
///
/// sub.unsubscribe();
/// ```
#[derive(Clone)]
pub struct Observable {
    root: Node,
    registry: Arc<SubscriptionRegistry>,
}

impl Observable {
    /// Wrap `initial` with the default configuration.
    ///
    /// Fails if `initial` is not an object or if any property name in it
    /// contains the path separator.
    pub fn new(initial: impl Into<Value>) -> Result<Self> {
        Self::with_config(initial, ObservableConfig::default())
    }

    pub fn with_config(initial: impl Into<Value>, config: ObservableConfig) -> Result<Self> {
        let initial = initial.into();
        if !matches!(initial, Value::Object(_)) {
            return Err(ObservableError::InvalidRoot {
                found: initial.type_name(),
            });
        }
        value::validate_keys(&initial)?;

        let registry = Arc::new(SubscriptionRegistry::new(config));
        let root = Node::wrap(&initial, PathKey::root(), Arc::clone(&registry)).ok_or(
            ObservableError::InvalidRoot {
                found: initial.type_name(),
            },
        )?;

        debug!(entries = root.len(), "observable created");
        Ok(Self { root, registry })
    }

    /// Register `listener` for `path`.
    ///
    /// It runs after every write to `path` or anything beneath it, in the
    /// order listeners were registered. Each call adds a new registration,
    /// even for a listener that is already registered.
    pub fn subscribe<F>(&self, path: impl AsRef<str>, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.registry
            .subscribe(path.as_ref().to_string(), infallible(listener))
    }

    /// Like [`subscribe`](Self::subscribe), for a listener that can fail.
    ///
    /// An error aborts the rest of the notification chain and is returned
    /// from the write that triggered it.
    pub fn try_subscribe<F>(&self, path: impl AsRef<str>, listener: F) -> Subscription
    where
        F: Fn() -> std::result::Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.registry
            .subscribe(path.as_ref().to_string(), fallible(listener))
    }

    /// Number of listeners registered for exactly `path`.
    pub fn listener_count(&self, path: impl AsRef<str>) -> usize {
        self.registry.listener_count(path.as_ref())
    }

    /// Current value at a dotted path, or `Undefined` if it does not exist.
    pub fn resolve(&self, path: &str) -> Value {
        path::resolve(&self.root.to_value(), path)
    }

    /// Dot-keyed snapshot of the current state.
    pub fn flatten(&self) -> FlatMap {
        path::flatten(&self.root.to_value())
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn config(&self) -> &ObservableConfig {
        self.registry.config()
    }
}

impl Deref for Observable {
    type Target = Node;

    fn deref(&self) -> &Node {
        &self.root
    }
}

impl std::fmt::Debug for Observable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.root.to_value())
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[test]
    fn construction_requires_an_object() {
        for bad in [json!(1), json!("x"), json!(null), json!([1, 2])] {
            assert!(matches!(
                Observable::new(bad),
                Err(ObservableError::InvalidRoot { .. })
            ));
        }
        assert!(Observable::new(json!({})).is_ok());
    }

    #[test]
    fn construction_rejects_separator_keys() {
        let err = Observable::new(json!({"a": {"b.c": 1}})).unwrap_err();
        assert!(matches!(err, ObservableError::SeparatorInKey { ref key } if key == "b.c"));
    }

    #[test]
    fn deref_reaches_root_node() {
        let obs = Observable::new(json!({"a": 1})).unwrap();
        assert_eq!(obs.value("a"), Value::from(1));
        assert!(obs.path().is_root());
    }

    #[test]
    fn subscribe_and_count() {
        let obs = Observable::new(json!({"a": 1})).unwrap();
        let count = Arc::new(AtomicI32::new(0));
        let count_clone = count.clone();

        let sub = obs.subscribe("a", move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(obs.listener_count("a"), 1);
        assert_eq!(sub.path(), "a");

        obs.set("a", 2).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);

        sub.unsubscribe();
        assert_eq!(obs.listener_count("a"), 0);
    }

    #[test]
    fn independent_observables_do_not_share_listeners() {
        let data = Value::from(json!({"a": 1}));
        let first = Observable::new(data.clone()).unwrap();
        let second = Observable::new(data).unwrap();

        let count = Arc::new(AtomicI32::new(0));
        let count_clone = count.clone();
        first.subscribe("a", move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        second.set("a", 5).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 0);
        // Both wrap the same storage
        assert_eq!(first.value("a"), Value::from(5));
    }

    #[test]
    fn resolve_and_flatten_see_live_state() {
        let obs = Observable::new(json!({"a": 1, "b": {"c": 2}})).unwrap();
        obs.get("b").node().unwrap().set("c", 3).unwrap();

        assert_eq!(obs.resolve("b.c"), Value::from(3));
        assert_eq!(obs.flatten()["b.c"], Value::from(3));
    }

    #[test]
    fn config_is_kept() {
        let config = ObservableConfig::default().with_max_notify_depth(4);
        let obs = Observable::with_config(json!({}), config.clone()).unwrap();
        assert_eq!(obs.config(), &config);
    }
}

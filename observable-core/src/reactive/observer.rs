//! Observer
//!
//! A selection of paths kept in sync with an [`Observable`]. This is the
//! rendering-agnostic core of a UI binding: it builds an initial projection of
//! the selected paths, subscribes to each of them, and re-resolves a path's
//! entry whenever that path (or anything beneath it) changes.
//!
//! How a consumer reacts to a refresh (re-render, log, forward) is up to the
//! callbacks registered with [`Observer::on_change`].
//!
//! # Lifetime
//!
//! The observer holds one subscription per path. They are removed by
//! [`Observer::dispose`] or when the observer is dropped. Listeners only hold
//! a weak reference to the observer state and a handle to the observed data,
//! never to the observable itself, so an observer does not keep its
//! observable alive.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use super::observable::Observable;
use super::registry::Subscription;
use crate::path::{self, FlatMap};
use crate::value::Value;

type ChangeCallback = Arc<dyn Fn(&str) + Send + Sync>;

struct ObserverState {
    values: RwLock<FlatMap>,
    version: AtomicU64,
    callbacks: RwLock<Vec<ChangeCallback>>,
}

impl ObserverState {
    fn refresh(&self, root: &Value, path: &str) {
        let current = path::resolve(root, path);
        self.values.write().insert(path.to_string(), current);
        self.version.fetch_add(1, Ordering::SeqCst);

        let callbacks = self.callbacks.read().clone();
        for callback in callbacks {
            callback(path);
        }
    }
}

pub struct Observer {
    state: Arc<ObserverState>,
    subscriptions: Mutex<Vec<Subscription>>,
    disposed: AtomicBool,
}

impl Observer {
    /// Select `paths` from `observable` and start tracking them.
    ///
    /// The initial projection comes from the flattened state. Container paths,
    /// which flattening does not keep, are resolved directly.
    pub fn new<I, P>(observable: &Observable, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        let paths: Vec<String> = paths.into_iter().map(Into::into).collect();
        let root = observable.to_value();

        let mut values = path::extract(&path::flatten(&root), &paths);
        for (key, value) in values.iter_mut() {
            if value.is_undefined() {
                *value = path::resolve(&root, key);
            }
        }

        let state = Arc::new(ObserverState {
            values: RwLock::new(values),
            version: AtomicU64::new(0),
            callbacks: RwLock::new(Vec::new()),
        });

        let subscriptions = paths
            .iter()
            .map(|path| {
                let weak: Weak<ObserverState> = Arc::downgrade(&state);
                let root = root.clone();
                let key = path.clone();
                observable.subscribe(path, move || {
                    if let Some(state) = weak.upgrade() {
                        state.refresh(&root, &key);
                    }
                })
            })
            .collect();

        debug!(paths = ?paths, "observer created");
        Self {
            state,
            subscriptions: Mutex::new(subscriptions),
            disposed: AtomicBool::new(false),
        }
    }

    /// Register a callback run after each refresh, with the refreshed path.
    pub fn on_change<F>(&self, callback: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.state.callbacks.write().push(Arc::new(callback));
    }

    /// Current projection, in the order the paths were selected.
    pub fn values(&self) -> FlatMap {
        self.state.values.read().clone()
    }

    /// Current value for one selected path.
    pub fn get(&self, path: &str) -> Option<Value> {
        self.state.values.read().get(path).cloned()
    }

    /// Number of refreshes since creation.
    pub fn version(&self) -> u64 {
        self.state.version.load(Ordering::SeqCst)
    }

    /// Stop tracking. Later calls do nothing.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        for subscription in self.subscriptions.lock().drain(..) {
            subscription.unsubscribe();
        }
        debug!("observer disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

impl Drop for Observer {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Observer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observer")
            .field("values", &self.values())
            .field("version", &self.version())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicI32;

    #[test]
    fn initial_projection() {
        let obs = Observable::new(json!({"a": 1, "b": {"c": 2}, "e": [1, 2]})).unwrap();
        let observer = Observer::new(&obs, ["b.c", "e", "e.length", "b", "missing"]);

        let values = observer.values();
        let keys: Vec<&str> = values.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b.c", "e", "e.length", "b", "missing"]);

        assert_eq!(values["b.c"], Value::from(2));
        assert_eq!(values["e.length"], Value::from(2));
        assert_eq!(values["b"], Value::from(json!({"c": 2})));
        assert!(values["missing"].is_undefined());
        assert_eq!(observer.version(), 0);
    }

    #[test]
    fn refreshes_on_change() {
        let obs = Observable::new(json!({"a": 1, "b": {"c": 2}})).unwrap();
        let observer = Observer::new(&obs, ["a", "b.c"]);

        obs.set("a", 10).unwrap();
        assert_eq!(observer.get("a"), Some(Value::from(10)));
        assert_eq!(observer.version(), 1);

        obs.get("b").node().unwrap().set("c", 20).unwrap();
        assert_eq!(observer.get("b.c"), Some(Value::from(20)));
        assert_eq!(observer.version(), 2);
    }

    #[test]
    fn callbacks_receive_refreshed_path() {
        let obs = Observable::new(json!({"a": 1, "b": [1]})).unwrap();
        let observer = Observer::new(&obs, ["b"]);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        observer.on_change(move |path| seen_clone.lock().push(path.to_string()));

        obs.get("b").node().unwrap().push(2).unwrap();

        // Index write and length write each bubble to `b`
        assert_eq!(*seen.lock(), vec!["b", "b"]);
        assert_eq!(observer.get("b"), Some(Value::array([1, 2])));
    }

    #[test]
    fn dispose_unsubscribes() {
        let obs = Observable::new(json!({"a": 1})).unwrap();
        let observer = Observer::new(&obs, ["a"]);
        assert_eq!(obs.listener_count("a"), 1);

        observer.dispose();
        observer.dispose();
        assert!(observer.is_disposed());
        assert_eq!(obs.listener_count("a"), 0);

        obs.set("a", 2).unwrap();
        assert_eq!(observer.version(), 0);
    }

    #[test]
    fn drop_unsubscribes() {
        let obs = Observable::new(json!({"a": 1})).unwrap();
        let count = Arc::new(AtomicI32::new(0));
        {
            let observer = Observer::new(&obs, ["a"]);
            let count_clone = count.clone();
            observer.on_change(move |_| {
                count_clone.fetch_add(1, Ordering::SeqCst);
            });
            obs.set("a", 2).unwrap();
        }

        assert_eq!(obs.listener_count("a"), 0);
        obs.set("a", 3).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dispose_after_observable_dropped_is_noop() {
        let obs = Observable::new(json!({"a": 1})).unwrap();
        let observer = Observer::new(&obs, ["a"]);
        drop(obs);

        observer.dispose();
        assert!(observer.is_disposed());
    }
}

//! Subscription Registry
//!
//! Maps a path key to the ordered list of listeners registered for it and
//! drives notification when a path changes.
//!
//! # Bubbling
//!
//! A change at `f.0.g` notifies `f.0.g`, then `f.0`, then `f`. Within one
//! path, listeners run in the order they were registered. The walk is
//! iterative: the chain is derived from the key's segments up front instead
//! of recursing once per ancestor.
//!
//! # Reentrancy
//!
//! The listener list for a path is copied out of the lock before any listener
//! runs, and no lock is held while a listener executes. Listeners may
//! therefore write to the observable, subscribe, or unsubscribe. Those
//! changes apply to the next notification, not to the snapshot in flight.

use std::collections::HashMap;
use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, trace};

use super::listener::{Listener, ListenerId};
use super::scope::NotifyScope;
use crate::config::ObservableConfig;
use crate::error::{ObservableError, Result};
use crate::path::PathKey;

pub struct SubscriptionRegistry {
    /// Listeners keyed by the string form of their path.
    listeners: RwLock<HashMap<String, Vec<(ListenerId, Listener)>>>,

    /// Number of notification chains currently running.
    depth: AtomicUsize,

    config: ObservableConfig,
}

impl SubscriptionRegistry {
    pub fn new(config: ObservableConfig) -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
            depth: AtomicUsize::new(0),
            config,
        }
    }

    pub fn config(&self) -> &ObservableConfig {
        &self.config
    }

    /// Append `listener` to the list for `key`.
    pub(crate) fn subscribe(self: &Arc<Self>, key: String, listener: Listener) -> Subscription {
        let id = ListenerId::next();
        debug!(path = %key, %id, "subscribe");

        self.listeners
            .write()
            .entry(key.clone())
            .or_default()
            .push((id, listener));

        Subscription {
            key,
            id,
            registry: Arc::downgrade(self),
        }
    }

    /// Remove one registration. Returns whether it was still present.
    fn remove(&self, key: &str, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let Some(list) = listeners.get_mut(key) else {
            return false;
        };

        let Some(position) = list.iter().position(|(existing, _)| *existing == id) else {
            return false;
        };
        list.remove(position);

        if list.is_empty() {
            listeners.remove(key);
        }
        debug!(path = %key, %id, "unsubscribe");
        true
    }

    /// Number of listeners registered for exactly `key`.
    pub fn listener_count(&self, key: &str) -> usize {
        self.listeners.read().get(key).map_or(0, Vec::len)
    }

    /// Notify `key` and every ancestor of it, nearest first.
    ///
    /// Stops at the first failing listener; the rest of the chain is skipped.
    pub fn notify(&self, key: &PathKey) -> Result<()> {
        let scope = self.enter(key)?;
        self.notify_chain(&scope, key)
    }

    /// Run `apply`, then notify `key` if it reports that storage changed.
    ///
    /// The depth limit is checked before `apply` runs, so a write refused
    /// with `ReentrancyLimit` leaves storage untouched.
    pub(crate) fn write<F>(&self, key: &PathKey, apply: F) -> Result<bool>
    where
        F: FnOnce() -> Result<bool>,
    {
        let scope = self.enter(key)?;
        if !apply()? {
            return Ok(false);
        }
        self.notify_chain(&scope, key)?;
        Ok(true)
    }

    fn enter(&self, key: &PathKey) -> Result<NotifyScope<'_>> {
        NotifyScope::enter(&self.depth, self.config.max_notify_depth, key)
    }

    fn notify_chain(&self, scope: &NotifyScope<'_>, key: &PathKey) -> Result<()> {
        trace!(path = %key, depth = scope.depth(), "notify");

        for ancestor in key.ancestors() {
            self.notify_exact(&ancestor.to_string())?;
        }
        Ok(())
    }

    fn notify_exact(&self, key: &str) -> Result<()> {
        let snapshot: Vec<Listener> = match self.listeners.read().get(key) {
            Some(list) => list.iter().map(|(_, listener)| Arc::clone(listener)).collect(),
            None => return Ok(()),
        };
        trace!(path = %key, listeners = snapshot.len(), "notify listeners");

        for listener in snapshot {
            listener().map_err(|source| ObservableError::Listener {
                path: key.to_string(),
                source,
            })?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self.listeners.read();
        let total: usize = listeners.values().map(Vec::len).sum();
        f.debug_struct("SubscriptionRegistry")
            .field("paths", &listeners.len())
            .field("listeners", &total)
            .field("config", &self.config)
            .finish()
    }
}

/// Handle for one registration, returned by `subscribe`.
///
/// Dropping the handle leaves the listener registered; call
/// [`unsubscribe`](Self::unsubscribe) to remove it.
#[derive(Debug, Clone)]
pub struct Subscription {
    key: String,
    id: ListenerId,
    registry: Weak<SubscriptionRegistry>,
}

impl Subscription {
    /// Remove exactly this registration.
    ///
    /// Returns `true` if it was removed by this call. Repeated calls, and calls
    /// after the observable itself has been dropped, do nothing.
    pub fn unsubscribe(&self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => registry.remove(&self.key, self.id),
            None => false,
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// The path key this registration listens on.
    pub fn path(&self) -> &str {
        &self.key
    }
}

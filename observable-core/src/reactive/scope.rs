//! Notification Scope
//!
//! Tracks how many notification chains are running on one registry. A
//! listener that writes back into the observable starts a nested chain while
//! the outer one is still on the stack; the scope counts that nesting so a
//! configured limit can stop runaway recursion.
//!
//! # Implementation
//!
//! The depth lives in the registry as an atomic counter. Entering a scope
//! increments it and the returned guard decrements it on drop, so the count
//! stays correct when a listener fails or panics.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{ObservableError, Result};
use crate::path::PathKey;

/// Guard for one active notification chain.
pub(crate) struct NotifyScope<'a> {
    depth: &'a AtomicUsize,
}

impl<'a> NotifyScope<'a> {
    /// Enter a new chain for `path`.
    ///
    /// Fails with `ReentrancyLimit` if `limit` chains are already active.
    pub fn enter(depth: &'a AtomicUsize, limit: Option<usize>, path: &PathKey) -> Result<Self> {
        let active = depth.fetch_add(1, Ordering::SeqCst);
        let scope = Self { depth };

        if let Some(limit) = limit {
            if active >= limit {
                return Err(ObservableError::ReentrancyLimit {
                    path: path.to_string(),
                    limit,
                });
            }
        }

        Ok(scope)
    }

    /// Number of chains active, this one included.
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }
}

impl Drop for NotifyScope<'_> {
    fn drop(&mut self) {
        self.depth.fetch_sub(1, Ordering::SeqCst);
    }
}

//! Listener types for the subscription registry.
//!
//! A listener is a callback registered against one path key. It is invoked
//! synchronously whenever that path, or anything beneath it, is written.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::ListenerError;

/// Identity of one registration, in the order registrations were made.
///
/// Removal goes by this ID rather than by the callback, so subscribing the
/// same closure twice yields two independent registrations. IDs are unique
/// across every registry in the process and increase with each `subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Stored form of a listener. Infallible listeners are adapted to always
/// return `Ok`.
pub(crate) type Listener = Arc<dyn Fn() -> Result<(), ListenerError> + Send + Sync>;

pub(crate) fn infallible<F>(listener: F) -> Listener
where
    F: Fn() + Send + Sync + 'static,
{
    Arc::new(move || {
        listener();
        Ok(())
    })
}

pub(crate) fn fallible<F>(listener: F) -> Listener
where
    F: Fn() -> Result<(), ListenerError> + Send + Sync + 'static,
{
    Arc::new(listener)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn ids_follow_registration_order() {
        let first = ListenerId::next();
        let second = ListenerId::next();

        assert!(first < second);
        assert!(first.as_u64() > 0);
        assert_eq!(first.to_string(), format!("listener#{}", first.as_u64()));
    }

    #[test]
    fn infallible_listener_calls_callback() {
        let called = Arc::new(AtomicBool::new(false));
        let called_clone = called.clone();

        let listener = infallible(move || {
            called_clone.store(true, Ordering::SeqCst);
        });

        assert!(!called.load(Ordering::SeqCst));
        assert!(listener().is_ok());
        assert!(called.load(Ordering::SeqCst));
    }

    #[test]
    fn fallible_listener_reports_error() {
        let listener = fallible(|| Err("nope".into()));
        assert_eq!(listener().unwrap_err().to_string(), "nope");
    }
}

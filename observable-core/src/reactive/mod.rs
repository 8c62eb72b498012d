//! Reactive Core
//!
//! This module turns a plain object graph into an observable one: reads and
//! writes go through [`Node`]s, writes are announced to listeners registered
//! on path keys, and a change anywhere bubbles up to every enclosing path.
//!
//! # Concepts
//!
//! ## Observable
//!
//! The root wrapper. It owns the [`SubscriptionRegistry`] for the whole graph
//! and is the only place listeners can be registered.
//!
//! ## Nodes
//!
//! A node wraps one object or array together with the path it was reached
//! by. Reading an object or array member yields a fresh node one level
//! deeper; other values come back unwrapped.
//!
//! ## Notification
//!
//! Every accepted write notifies its exact path key, then each ancestor key in
//! child-to-parent order. Listeners run synchronously inside the write, in
//! registration order. There is no batching: N writes give N chains.
//!
//! ## Observers
//!
//! An [`Observer`] keeps a projection of selected paths up to date, the way a
//! UI binding would.

mod listener;
mod node;
mod observable;
mod observer;
mod registry;
mod scope;

pub use listener::ListenerId;
pub use node::{Node, Property};
pub use observable::Observable;
pub use observer::Observer;
pub use registry::{Subscription, SubscriptionRegistry};

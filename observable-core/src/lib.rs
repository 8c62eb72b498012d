//! Observable Core
//!
//! This crate provides a deep-reactive wrapper for plain nested data. It
//! implements:
//!
//! - A dynamic data model of objects, arrays, primitives and methods
//! - Wrapped nodes that intercept reads and writes at any depth
//! - Path-keyed subscriptions with child-to-parent bubbling
//! - Flatten / extract / resolve helpers for projecting state by path
//!
//! Everything runs synchronously on the writer's stack. A write returns only
//! after every listener for the written path and its ancestors has run.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `value`: the data model (`Value`, shared object and array handles, methods)
//! - `path`: path keys and the flatten / extract / resolve utilities
//! - `reactive`: the observable root, wrapped nodes, the subscription
//!   registry and observers
//! - `config`: runtime configuration
//! - `error`: the crate error type
//!
//! # Example
//!
//! ```rust,ignore
//! use observable_core::{Observable, Value};
//! use serde_json::json;
//!
//! let obs = Observable::new(json!({"a": 1, "b": [1, 2, 3]}))?;
//!
//! // Listen on a container path
//! let sub = obs.subscribe("b", || println!("b changed"));
//!
//! // Mutate beneath it
//! obs.get("b").node().unwrap().push(4)?;
//! // Prints "b changed" twice: once for `b.3`, once for `b.length`
//!
//! assert_eq!(obs.resolve("b.length"), Value::from(4));
//! sub.unsubscribe();
//! ```
//!
//! # Constraints
//!
//! Property names must not contain `.`, the path separator. Construction and
//! writes reject such names with `ObservableError::SeparatorInKey`.

pub mod config;
pub mod error;
pub mod path;
pub mod reactive;
pub mod value;

pub use config::ObservableConfig;
pub use error::{ListenerError, ObservableError, Result};
pub use path::{extract, flatten, resolve, FlatMap, PathKey, Segment};
pub use reactive::{Node, Observable, Observer, Property, Subscription};
pub use value::{ArrayRef, Method, ObjectRef, Value};

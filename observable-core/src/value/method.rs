//! Callable values.

use std::fmt;
use std::sync::Arc;

use super::Value;
use crate::error::Result;
use crate::reactive::Node;

type MethodFn = dyn Fn(&Node, &[Value]) -> Result<Value> + Send + Sync;

/// A function stored as a property value.
///
/// The first argument is the receiver: the wrapped node the method was read
/// from. Writes made through it go through the same interception as any other
/// write, so listeners fire for state a method mutates.
///
/// ```rust,ignore
/// let counter = Value::object([
///     ("a", Value::from(100)),
///     ("increment", Value::method(|this, _args| {
///         let a = this.value("a").as_f64().unwrap_or_default();
///         this.set("a", a + 100.0)?;
///         Ok(Value::Undefined)
///     })),
/// ]);
/// ```
#[derive(Clone)]
pub struct Method(Arc<MethodFn>);

impl Method {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Node, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Run the method against `this`.
    pub fn invoke(&self, this: &Node, args: &[Value]) -> Result<Value> {
        (self.0)(this, args)
    }

    /// Functions compare by identity.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Method({:p})", Arc::as_ptr(&self.0) as *const ())
    }
}

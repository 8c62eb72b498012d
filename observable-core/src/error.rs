//! Error types for the observable core.

use thiserror::Error;

/// Error returned by a fallible listener.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ObservableError>;

#[derive(Debug, Error)]
pub enum ObservableError {
    /// The value handed to the constructor is not an object.
    #[error("observable root must be an object, found {found}")]
    InvalidRoot { found: &'static str },

    /// Property names must not contain the path separator.
    #[error("property name `{key}` contains the path separator '.'")]
    SeparatorInKey { key: String },

    /// `length` written on an array with a value that is not a non-negative integer.
    #[error("invalid array length at `{path}`: {value}")]
    InvalidLength { path: String, value: String },

    /// A non-index key written on an array.
    #[error("`{key}` is not an index or `length` on the array at `{path}`")]
    InvalidArrayKey { path: String, key: String },

    /// An array write would grow the array past the configured maximum, or
    /// the memory for it could not be reserved.
    #[error("array at `{path}` cannot grow to {requested} elements (limit {limit})")]
    ArrayCapacity {
        path: String,
        requested: usize,
        limit: usize,
    },

    #[error("`{path}` is not a function")]
    NotCallable { path: String },

    /// A listener failed. Listeners after it in the chain were skipped.
    #[error("listener for `{path}` failed: {source}")]
    Listener {
        path: String,
        #[source]
        source: ListenerError,
    },

    #[error("notification for `{path}` exceeded the reentrancy limit of {limit}")]
    ReentrancyLimit { path: String, limit: usize },

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listener_error_keeps_source() {
        let err = ObservableError::Listener {
            path: "b.c".to_string(),
            source: "boom".into(),
        };
        assert_eq!(err.to_string(), "listener for `b.c` failed: boom");
        assert!(std::error::Error::source(&err).is_some());
    }
}

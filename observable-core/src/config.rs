//! Observable Configuration
//!
//! Runtime knobs for an [`Observable`](crate::reactive::Observable). The
//! defaults reproduce the plain synchronous model: every write notifies
//! inline and reentrant writes from listeners are not limited. Arrays are
//! stored densely, so their length is capped well below the `u32::MAX`
//! ceiling of array lengths.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default cap on array length: 2^24 elements.
pub const DEFAULT_MAX_ARRAY_LENGTH: usize = 1 << 24;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservableConfig {
    /// Maximum number of notification chains that may be active at once on
    /// one root. A listener that writes back into the observable starts a
    /// nested chain; once this many are running, the next write fails with
    /// `ObservableError::ReentrancyLimit` instead of recursing further.
    ///
    /// `None` leaves recursion unbounded.
    pub max_notify_depth: Option<usize>,

    /// Largest length an array may be grown to, by an index write or by
    /// writing `length`. Larger writes fail with
    /// `ObservableError::ArrayCapacity` and leave the array unchanged.
    pub max_array_length: usize,
}

impl Default for ObservableConfig {
    fn default() -> Self {
        Self {
            max_notify_depth: None,
            max_array_length: DEFAULT_MAX_ARRAY_LENGTH,
        }
    }
}

impl ObservableConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_max_notify_depth(mut self, depth: usize) -> Self {
        self.max_notify_depth = Some(depth);
        self
    }

    pub fn with_max_array_length(mut self, len: usize) -> Self {
        self.max_array_length = len;
        self
    }
}

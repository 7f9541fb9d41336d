use serde::{Deserialize, Serialize};

use crate::id::MAX_ID;

/// Configuration for a [`ResourceTable`](crate::ResourceTable).
///
/// Missing fields fall back to their defaults when deserializing, so hosts can
/// embed this in their own configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceTableConfig {
    /// The largest ID the table hands out, inclusive. Defaults to [`MAX_ID`].
    pub max_id: u64,

    /// The number of resources to preallocate room for.
    pub capacity: usize,
}

impl ResourceTableConfig {
    #[inline]
    pub fn with_max_id(mut self, max_id: u64) -> Self {
        self.max_id = max_id;
        self
    }

    #[inline]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

impl Default for ResourceTableConfig {
    fn default() -> Self {
        Self {
            max_id: MAX_ID,
            capacity: 0,
        }
    }
}

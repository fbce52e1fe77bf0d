// SPDX-License-Identifier: MIT OR Apache-2.0
//! Evaluation context, the cache-validity key for one evaluation pass.

use std::hash::{Hash, Hasher};

/// Key an output cache entry is tagged with; derived from the context
pub type CacheKey = u64;

/// Lightweight cache-validity key for one evaluation request.
///
/// Conceptually a timestamp: two contexts created for the same frame
/// produce the same [`CacheKey`], so cached output values survive across
/// repeated pulls within a frame and are recomputed when the frame advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EvalContext {
    frame: u64,
}

impl EvalContext {
    /// Create a context for the given frame
    pub fn new(frame: u64) -> Self {
        Self { frame }
    }

    /// The frame this context was created for
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// The cache key outputs computed under this context are tagged with
    pub fn key(&self) -> CacheKey {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.frame.hash(&mut hasher);
        hasher.finish()
    }
}

//! Invalidation records
//!
//! Invalidation in this crate is coarse: a single key inside a bucket, a whole
//! bucket sub-cache, or slots whose provider TTL hint elapsed. Every
//! invalidation is reported as an `InvalidationEvent` so callers and logs can
//! see what was dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reason for cache invalidation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvalidationReason {
    /// Provider TTL hint elapsed
    Expired,

    /// Explicit flush requested by a caller
    Flush,

    /// Flush following a successful write through the backing store
    RecordSaved,

    /// Provider cleared wholesale
    Cleared,
}

impl std::fmt::Display for InvalidationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidationReason::Expired => write!(f, "TTL expired"),
            InvalidationReason::Flush => write!(f, "manual flush"),
            InvalidationReason::RecordSaved => write!(f, "record saved"),
            InvalidationReason::Cleared => write!(f, "cache cleared"),
        }
    }
}

/// What an invalidation actually removed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvalidationScope {
    /// One key, inside `bucket` or the top-level provider when `None`
    Key {
        bucket: Option<String>,
        key: String,
    },

    /// A whole bucket sub-cache
    Bucket(String),

    /// A set of keys in a single provider
    Keys(Vec<String>),

    /// The request named neither a bucket nor a key
    Nothing,
}

/// Event for cache invalidation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidationEvent {
    /// Reason for invalidation
    pub reason: InvalidationReason,

    /// What was invalidated
    pub scope: InvalidationScope,

    /// When the invalidation occurred
    pub timestamp: DateTime<Utc>,

    /// Additional context
    pub context: Option<String>,
}

impl InvalidationEvent {
    /// Create a new invalidation event
    pub fn new(reason: InvalidationReason, scope: InvalidationScope) -> Self {
        Self {
            reason,
            scope,
            timestamp: Utc::now(),
            context: None,
        }
    }

    /// Add context to the event
    pub fn with_context(mut self, context: String) -> Self {
        self.context = Some(context);
        self
    }

    /// Whether anything was targeted
    pub fn is_noop(&self) -> bool {
        match &self.scope {
            InvalidationScope::Nothing => true,
            InvalidationScope::Keys(keys) => keys.is_empty(),
            _ => false,
        }
    }
}

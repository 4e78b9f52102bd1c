//! Cache key derivation
//!
//! A `CacheKeyDescriptor` describes one query's cacheable identity. Its key is
//! the concatenation of every contributing fragment, each followed by
//! [`KEY_SEPARATOR`], in this fixed order:
//!
//! type, search criteria, preloads, wheres, order, limit, offset, group, extra.
//!
//! Fields that do not contribute are skipped entirely. Sequence fragments keep
//! the order they were supplied in, so `["a", "b"]` and `["b", "a"]` produce
//! different keys.

use crate::cache::types::CacheKey;
use crate::store::Cacheable;

/// Separator appended after every key fragment
pub const KEY_SEPARATOR: char = ':';

/// Snapshot of a criteria object's cache identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFragment {
    /// Fragment identifying the criteria's filter values
    pub key: String,
    /// Logical table/entity group the criteria belongs to
    pub bucket: String,
}

impl SearchFragment {
    /// Capture the cache identity of a criteria object
    pub fn of<C: Cacheable + ?Sized>(criteria: &C) -> Self {
        Self {
            key: criteria.cache_key(),
            bucket: criteria.cache_bucket(),
        }
    }
}

/// Structured description of a cacheable query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheKeyDescriptor {
    /// Logical partition; derived from `search` when absent
    pub bucket: Option<String>,
    /// Type identity of the result shape
    pub type_name: Option<String>,
    /// Criteria whose own key fragment and bucket participate
    pub search: Option<SearchFragment>,
    pub preloads: Vec<String>,
    pub wheres: Vec<String>,
    pub order: String,
    pub limit: u64,
    pub offset: u64,
    pub group: String,
    pub extra: Vec<String>,
}

impl CacheKeyDescriptor {
    /// Create an empty descriptor (generates the empty key)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bucket explicitly
    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    /// Use `T`'s type name as the type identity
    pub fn of_type<T: ?Sized>(self) -> Self {
        self.type_name(std::any::type_name::<T>())
    }

    /// Set the type identity token
    pub fn type_name(mut self, name: impl Into<String>) -> Self {
        self.type_name = Some(name.into());
        self
    }

    /// Attach search criteria
    pub fn search<C: Cacheable + ?Sized>(mut self, criteria: &C) -> Self {
        self.search = Some(SearchFragment::of(criteria));
        self
    }

    pub fn preload(mut self, preload: impl Into<String>) -> Self {
        self.preloads.push(preload.into());
        self
    }

    pub fn where_clause(mut self, clause: impl Into<String>) -> Self {
        self.wheres.push(clause.into());
        self
    }

    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = order.into();
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Append an extra discriminator
    pub fn extra(mut self, extra: impl Into<String>) -> Self {
        self.extra.push(extra.into());
        self
    }

    /// Bucket name this descriptor routes to, if any
    ///
    /// An explicit non-empty bucket wins, then the search criteria's bucket.
    pub fn resolve_bucket(&self) -> Option<&str> {
        self.bucket
            .as_deref()
            .filter(|b| !b.is_empty())
            .or_else(|| {
                self.search
                    .as_ref()
                    .map(|s| s.bucket.as_str())
                    .filter(|b| !b.is_empty())
            })
    }

    /// Generate the cache key
    ///
    /// Returns the empty string when no field contributes, meaning the query
    /// is not cacheable.
    pub fn generate(&self) -> CacheKey {
        let mut key = CacheKey::new();
        let mut push = |fragment: &str| {
            key.push_str(fragment);
            key.push(KEY_SEPARATOR);
        };

        if let Some(type_name) = &self.type_name {
            push(type_name);
        }
        if let Some(search) = &self.search {
            push(&search.key);
        }
        for preload in &self.preloads {
            push(preload);
        }
        for clause in &self.wheres {
            push(clause);
        }
        if !self.order.is_empty() {
            push(&self.order);
        }
        if self.limit > 0 {
            push(&self.limit.to_string());
        }
        if self.offset > 0 {
            push(&self.offset.to_string());
        }
        if !self.group.is_empty() {
            push(&self.group);
        }
        for extra in &self.extra {
            push(extra);
        }

        key
    }
}

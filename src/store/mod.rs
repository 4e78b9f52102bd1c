//! Backing store contract
//!
//! The cache layer never talks to a database itself. It needs:
//! - criteria objects that can describe their own cache identity ([`Cacheable`]),
//! - records that can be serialized into cache payloads ([`Record`]),
//! - a store able to run find/first/last/count/save for those records ([`Store`]),
//!   reached through separate read and write handles ([`ReadWriteStore`]).

pub mod memory;
pub mod naming;

use crate::error::StoreResult;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

pub use memory::MemoryStore;
pub use naming::NamingStrategy;

/// Anything that can describe its own cache identity
pub trait Cacheable {
    /// Fragment uniquely identifying this instance's filter values
    fn cache_key(&self) -> String;

    /// Logical table/entity group used for invalidation
    fn cache_bucket(&self) -> String;
}

/// A persisted record type
///
/// Criteria for queries are expressed as partially filled records of the same
/// type; fields left at their zero value do not constrain the query.
pub trait Record: Cacheable + Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Primary key used for upserts
    fn primary_key(&self) -> String;
}

/// Query and write operations a backing store must support
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// All records matching `criteria`
    async fn find_many<R: Record>(&self, criteria: &R) -> StoreResult<Vec<R>>;

    /// First matching record, or `StoreError::NotFound`
    async fn find_first<R: Record>(&self, criteria: &R) -> StoreResult<R>;

    /// Last matching record, or `StoreError::NotFound`
    async fn find_last<R: Record>(&self, criteria: &R) -> StoreResult<R>;

    /// Number of matching records
    async fn count<R: Record>(&self, criteria: &R) -> StoreResult<i64>;

    /// Insert or update `record` by primary key
    async fn save<R: Record>(&self, record: &R) -> StoreResult<()>;
}

/// Read and write access paths to a backing store
#[derive(Debug)]
pub struct ReadWriteStore<S> {
    read: Arc<S>,
    write: Arc<S>,
}

impl<S: Store> ReadWriteStore<S> {
    /// Pair separate read and write handles (e.g. replica and primary)
    pub fn new(read: S, write: S) -> Self {
        Self {
            read: Arc::new(read),
            write: Arc::new(write),
        }
    }

    /// Use one handle for both reads and writes
    pub fn shared(store: S) -> Self {
        Self::from_shared(Arc::new(store))
    }

    /// Use one already shared handle for both reads and writes
    pub fn from_shared(store: Arc<S>) -> Self {
        Self {
            read: store.clone(),
            write: store,
        }
    }

    /// Read access path
    pub fn read(&self) -> &S {
        &self.read
    }

    /// Write access path
    pub fn write(&self) -> &S {
        &self.write
    }
}

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Redis(#[from] redis::RedisError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Primitives the counters are built on.
///
/// Every operation must be atomic on the store side; callers never lock.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Round-trip to the store, used for the startup connectivity check
    async fn ping(&self) -> StoreResult<()>;

    /// Add `member` to the set at `key`. Re-adding an existing member is a no-op.
    async fn set_add(&self, key: &str, member: &str) -> StoreResult<()>;

    /// Number of members in the set at `key` (0 if absent)
    async fn set_card(&self, key: &str) -> StoreResult<i64>;

    /// Increment `field` of the hash at `key` by `delta` and return the new value.
    /// A missing field starts at 0.
    async fn hash_incr(&self, key: &str, field: &str, delta: i64) -> StoreResult<i64>;
}

pub mod memory;
pub mod redis_store;
pub mod trait_def;

pub use memory::MemoryStore;
pub use redis_store::{connect_with_retry, RedisStore};
pub use trait_def::{CounterStore, StoreError, StoreResult};

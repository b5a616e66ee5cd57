//! In-process counter store
//!
//! Same semantics as the Redis primitives, kept in DashMaps. Used for local
//! trial runs (`--memory`) and throughout the tests.

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::collections::HashMap;

use crate::storage::{CounterStore, StoreResult};

#[derive(Default)]
pub struct MemoryStore {
    sets: DashMap<String, DashSet<String>>,
    hashes: DashMap<String, HashMap<String, i64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a hash field, without modifying it
    pub fn hash_get(&self, key: &str, field: &str) -> Option<i64> {
        self.hashes
            .get(key)
            .and_then(|hash| hash.get(field).copied())
    }

    /// All keys currently holding a set or a hash, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .sets
            .iter()
            .map(|entry| entry.key().clone())
            .chain(self.hashes.iter().map(|entry| entry.key().clone()))
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn set_add(&self, key: &str, member: &str) -> StoreResult<()> {
        self.sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn set_card(&self, key: &str) -> StoreResult<i64> {
        Ok(self.sets.get(key).map(|set| set.len() as i64).unwrap_or(0))
    }

    async fn hash_incr(&self, key: &str, field: &str, delta: i64) -> StoreResult<i64> {
        // The entry guard holds the shard lock, making read-modify-write atomic per key
        let mut hash = self.hashes.entry(key.to_string()).or_default();
        let value = hash.entry(field.to_string()).or_insert(0);
        *value += delta;
        Ok(*value)
    }
}

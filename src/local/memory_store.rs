use async_trait::async_trait;
use dashmap::DashMap;

use crate::{DamperError, TimestampStore};

/// In-process [`TimestampStore`] backed by a concurrent map.
///
/// Suitable for tests and for single-process deployments where coordination
/// across machines is not needed. Shared by cloning the `Arc` it is handed
/// to the factory in.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TimestampStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DamperError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), DamperError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), DamperError> {
        self.entries.remove(key);
        Ok(())
    }
}

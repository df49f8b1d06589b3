//! Persistent key-value slots.
//!
//! A slot holds one serialized snapshot per key. Backends are synchronous in
//! spirit (one read, one write, no transactions) but exposed through an async
//! trait so file and SQLite backends can run off the caller's task.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::StoreError;

#[async_trait]
pub trait SlotStorage: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Read the raw value stored under `key`, `None` when the slot is empty.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Overwrite the slot stored under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Process-local slots. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemorySlots {
    slots: RwLock<HashMap<String, String>>,
}

impl MemorySlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a slot, e.g. with a snapshot left by an earlier session.
    pub fn with_slot(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut slots = HashMap::new();
        slots.insert(key.into(), value.into());
        Self {
            slots: RwLock::new(slots),
        }
    }
}

#[async_trait]
impl SlotStorage for MemorySlots {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.slots.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.slots
            .write()
            .await
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

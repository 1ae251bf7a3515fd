//! In-Memory Session Store
//!
//! `SessionStore` over a map, standing in for browser-style string storage.

use crate::ports::outbound::SessionStore;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// String key/value store held in memory.
#[derive(Default)]
pub struct InMemorySessionStore {
    items: RwLock<BTreeMap<String, String>>,
}

impl InMemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_item(&self, key: &str) -> Option<String> {
        self.items.read().get(key).cloned()
    }

    async fn set_item(&self, key: &str, value: String) {
        self.items.write().insert(key.to_string(), value);
    }

    async fn remove_item(&self, key: &str) {
        self.items.write().remove(key);
    }

    async fn keys(&self) -> Vec<String> {
        self.items.read().keys().cloned().collect()
    }
}

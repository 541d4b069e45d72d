use std::{collections::HashMap, sync::Arc};

use arc_swap::ArcSwap;
use async_trait::async_trait;
use tokio::sync::RwLock;

use confcentral::errors::ServiceError;

pub const RECENT_ANNOUNCEMENTS_KEY: &str = "RECENT ANNOUNCEMENTS";
pub const SPEAKER_ANNOUNCEMENTS_KEY: &str = "SPEAKER ANNOUNCEMENTS";

/// A string cache. Values are replaced wholesale, never edited in place.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Arc<String>>, ServiceError>;

    async fn set(&self, key: &str, value: String) -> Result<(), ServiceError>;

    /// Returns whether a value was removed.
    async fn delete(&self, key: &str) -> Result<bool, ServiceError>;
}

/// Cache slots held in process.
///
/// The map lock is only taken for writing when a slot is created or
/// removed; replacing the value of an existing slot is a pointer swap.
pub struct InMemoryCache {
    slots: RwLock<HashMap<String, ArcSwap<String>>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Arc<String>>, ServiceError> {
        let slots = self.slots.read().await;
        Ok(slots.get(key).map(|slot| slot.load_full()))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), ServiceError> {
        {
            let slots = self.slots.read().await;
            if let Some(slot) = slots.get(key) {
                slot.store(Arc::new(value));
                return Ok(());
            }
        }

        let mut slots = self.slots.write().await;
        slots.insert(key.to_string(), ArcSwap::from_pointee(value));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, ServiceError> {
        let mut slots = self.slots.write().await;
        Ok(slots.remove(key).is_some())
    }
}

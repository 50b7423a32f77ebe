//! In-flight de-duplication

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::asset::AssetKey;

/// Set of keys with an outstanding upload. Cloning shares the same set.
#[derive(Debug, Clone, Default)]
pub struct InFlightGuard {
    keys: Arc<Mutex<HashSet<AssetKey>>>,
}

impl InFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<AssetKey>> {
        // A panicking holder cannot leave the set half-updated
        self.keys.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Claim `key`. Returns false when an upload for it is already running.
    pub fn try_acquire(&self, key: &AssetKey) -> bool {
        self.lock().insert(key.clone())
    }

    /// Release `key`; releasing an absent key is a no-op
    pub fn release(&self, key: &AssetKey) {
        self.lock().remove(key);
    }

    pub fn contains(&self, key: &AssetKey) -> bool {
        self.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

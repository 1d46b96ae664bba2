//! The single "current store" slot.
//!
//! [`Snapshot`] holds the store generation that queries read. The reload
//! controller is its only writer. Readers clone the `Arc` under a read lock
//! and keep using their generation even after a newer one is swapped in.

use std::sync::{Arc, RwLock};

use lds_store::Store;

#[derive(Debug, Default)]
pub struct Snapshot {
    current: RwLock<Option<Arc<Store>>>,
}

impl Snapshot {
    /// An empty slot. Queries against it report "not ready".
    pub fn new() -> Self {
        Self::default()
    }

    /// The current generation, if one has been installed.
    pub fn load(&self) -> Option<Arc<Store>> {
        self.current.read().expect("snapshot lock poisoned").clone()
    }

    /// Install `store` as the current generation and return the previous one.
    pub fn replace(&self, store: Store) -> Option<Arc<Store>> {
        let next = Arc::new(store);
        let mut current = self.current.write().expect("snapshot lock poisoned");
        current.replace(next)
    }

    pub fn is_set(&self) -> bool {
        self.current.read().expect("snapshot lock poisoned").is_some()
    }
}

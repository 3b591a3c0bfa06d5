// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Binding Cache
//!
//! Memoises fully resolved bindings by [`BindingContextKey`] for the lifetime of one
//! synthesis run. There is no eviction and no persistence: the registry clears the
//! cache between independent runs, so no entry can outlive the manifest it came from.
//!
//! Writes go through a `parking_lot::Mutex`, which linearises them when bindings are
//! resolved on several threads. An entry is never replaced: the first result stored
//! under a key stays until [`BindingCache::clear`].

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::binding::{BindingContextKey, BindingResult};

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: BindingContextKey,
    pub result: Arc<BindingResult>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct BindingCache {
    entries: Mutex<HashMap<BindingContextKey, CacheEntry>>,
}

impl BindingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &BindingContextKey) -> Option<Arc<BindingResult>> {
        self.entries.lock().get(key).map(|entry| Arc::clone(&entry.result))
    }

    /// Stores `result` unless the key is already present. Returns the cached result,
    /// which is the earlier one if another writer got there first.
    pub fn set(&self, key: BindingContextKey, result: Arc<BindingResult>) -> Arc<BindingResult> {
        let mut entries = self.entries.lock();
        let entry = entries.entry(key.clone()).or_insert_with(|| CacheEntry {
            key,
            result,
            created_at: Utc::now(),
        });
        Arc::clone(&entry.result)
    }

    pub fn entry(&self, key: &BindingContextKey) -> Option<CacheEntry> {
        self.entries.lock().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

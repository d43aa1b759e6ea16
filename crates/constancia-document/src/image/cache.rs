// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared image cache with single-flight loading and LRU eviction.
//
// Each source key maps to one `OnceCell`. Concurrent requests for the same key
// await the same cell, so the underlying reader runs once and every waiter
// observes the same outcome. Successful images stay cached until evicted;
// failures are handed to the waiters already queued and then forgotten so a
// later build can try again.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::RawImage;
use super::source::{ImageReader, load_image};

type Slot = Arc<OnceCell<Option<Arc<RawImage>>>>;

struct Entry {
    slot: Slot,
    /// Logical clock value of the most recent access.
    last_used: u64,
}

struct LruState {
    entries: HashMap<String, Entry>,
    clock: u64,
}

/// Bounded, concurrency-safe cache of decoded image headers and bytes.
pub struct ImageCache<R> {
    reader: Arc<R>,
    capacity: usize,
    state: Mutex<LruState>,
}

impl<R: ImageReader> ImageCache<R> {
    /// Create a cache that keeps at most `capacity` distinct sources.
    pub fn new(reader: Arc<R>, capacity: usize) -> Self {
        Self {
            reader,
            capacity: capacity.max(1),
            state: Mutex::new(LruState {
                entries: HashMap::new(),
                clock: 0,
            }),
        }
    }

    /// The reader backing this cache, for uncached one-off loads.
    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Number of sources currently held (pending or completed).
    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fetch the image for `source`, loading it at most once across
    /// concurrent callers.
    pub async fn get(&self, source: &str) -> Option<Arc<RawImage>> {
        let slot = self.slot_for(source);

        let outcome = slot
            .get_or_init(|| async {
                debug!(source, "image cache miss, loading");
                load_image(self.reader.as_ref(), source).await.map(Arc::new)
            })
            .await
            .clone();

        if outcome.is_none() {
            self.forget_failed(source, &slot);
        }
        outcome
    }

    /// Look up or create the slot for `source`, bumping its recency and
    /// evicting the least recently used entry when over capacity.
    fn slot_for(&self, source: &str) -> Slot {
        let Ok(mut state) = self.state.lock() else {
            // A poisoned map only loses sharing; load without caching.
            return Arc::new(OnceCell::new());
        };

        state.clock += 1;
        let now = state.clock;

        if let Some(entry) = state.entries.get_mut(source) {
            entry.last_used = now;
            return Arc::clone(&entry.slot);
        }

        if state.entries.len() >= self.capacity {
            let oldest = state
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| key.clone());
            if let Some(key) = oldest {
                info!(evicted = %key, capacity = self.capacity, "image cache full, evicting");
                state.entries.remove(&key);
            }
        }

        let slot: Slot = Arc::new(OnceCell::new());
        state.entries.insert(
            source.to_string(),
            Entry {
                slot: Arc::clone(&slot),
                last_used: now,
            },
        );
        slot
    }

    /// Drop a failed slot unless it has already been replaced.
    fn forget_failed(&self, source: &str, slot: &Slot) {
        if let Ok(mut state) = self.state.lock() {
            let same_slot = state
                .entries
                .get(source)
                .is_some_and(|entry| Arc::ptr_eq(&entry.slot, slot));
            if same_slot {
                state.entries.remove(source);
            }
        }
    }
}

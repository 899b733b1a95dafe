use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug)]
struct CacheEntry {
    body: Arc<str>,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.stored_at)
    }

    /// Still retained under the window it was stored with
    fn is_live(&self, now: Instant) -> bool {
        self.age(now) < self.ttl
    }
}

/// Bounded in-memory cache of upstream response bodies.
///
/// An entry is kept for the revalidation window of the request that stored
/// it, and a read only returns it while it is younger than the reader's own
/// window as well. When the cache is full, entries past their stored window
/// are purged first and then the oldest entry is evicted.
#[derive(Debug)]
pub struct ResponseCache {
    capacity: usize,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ResponseCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Body stored under `key`, if it is younger than `max_age`
    pub fn get(&self, key: &str, max_age: Duration) -> Option<Arc<str>> {
        self.get_at(key, max_age, Instant::now())
    }

    pub fn insert(&self, key: impl Into<String>, body: impl Into<Arc<str>>, ttl: Duration) {
        self.insert_at(key.into(), body.into(), ttl, Instant::now());
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    fn get_at(&self, key: &str, max_age: Duration, now: Instant) -> Option<Arc<str>> {
        let mut entries = self.entries.lock();
        let entry = entries.get(key)?;
        if !entry.is_live(now) {
            entries.remove(key);
            return None;
        }
        (entry.age(now) < max_age).then(|| Arc::clone(&entry.body))
    }

    fn insert_at(&self, key: String, body: Arc<str>, ttl: Duration, now: Instant) {
        if ttl.is_zero() {
            return;
        }
        let mut entries = self.entries.lock();

        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            entries.retain(|_, entry| entry.is_live(now));

            if entries.len() >= self.capacity {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.stored_at)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(
            key,
            CacheEntry {
                body,
                stored_at: now,
                ttl,
            },
        );
    }
}

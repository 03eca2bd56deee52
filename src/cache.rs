//! Cache layer - memoizes extraction results per key with a time-to-live
//!
//! Invalidation always wins: it removes matching entries immediately and
//! bumps a generation counter, so a value whose computation started before
//! an invalidation is handed to its caller but never stored.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

/// Time source, injectable so TTL behaviour can be tested without sleeping
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct Entry<V> {
    value: V,
    /// `None` when the TTL overflows `Instant`
    expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

struct State<V> {
    entries: HashMap<String, Entry<V>>,
    generation: u64,
}

pub struct CacheLayer<V> {
    state: Mutex<State<V>>,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> Default for CacheLayer<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> CacheLayer<V> {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(State {
                entries: HashMap::new(),
                generation: 0,
            }),
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fresh cached value for `key`, if any
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let state = self.lock();
        state
            .entries
            .get(key)
            .filter(|e| e.is_fresh(now))
            .map(|e| e.value.clone())
    }

    /// Return the cached value for `key`, or run `producer` and cache its result for `ttl`
    ///
    /// The lock is not held while `producer` runs.
    pub fn get_or_compute<F>(&self, key: &str, ttl: Duration, producer: F) -> V
    where
        F: FnOnce() -> V,
    {
        let generation = {
            let now = self.clock.now();
            let state = self.lock();
            if let Some(entry) = state.entries.get(key).filter(|e| e.is_fresh(now)) {
                debug!(key, "Cache hit");
                return entry.value.clone();
            }
            state.generation
        };

        debug!(key, "Cache miss");
        let value = producer();

        let now = self.clock.now();
        let mut state = self.lock();
        if state.generation == generation {
            state.entries.retain(|_, e| e.is_fresh(now));
            state.entries.insert(
                key.to_string(),
                Entry {
                    value: value.clone(),
                    expires_at: now.checked_add(ttl),
                },
            );
        } else {
            debug!(key, "Invalidated during computation, result not cached");
        }
        value
    }

    /// Drop one key; returns whether an entry was removed
    pub fn invalidate(&self, key: &str) -> bool {
        let mut state = self.lock();
        state.generation += 1;
        let removed = state.entries.remove(key).is_some();
        debug!(key, removed, "Cache invalidated");
        removed
    }

    /// Drop every key starting with `prefix`; returns the number removed
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut state = self.lock();
        state.generation += 1;
        let before = state.entries.len();
        state.entries.retain(|k, _| !k.starts_with(prefix));
        let removed = before - state.entries.len();
        debug!(prefix, removed, "Cache invalidated by prefix");
        removed
    }

    /// Drop everything; returns the number removed
    pub fn invalidate_all(&self) -> usize {
        let mut state = self.lock();
        state.generation += 1;
        let removed = state.entries.len();
        state.entries.clear();
        debug!(removed, "Cache cleared");
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! Deduplication filter: per-thread bounded LRU with TTL.
//!
//! The same statement is validated many times per second on a hot path;
//! re-running the pipeline is wasteful. The filter caches verdicts per
//! `(statement id, sql text)` and hands them back for a short TTL window.
//!
//! Storage is thread-local: each thread owns its cache, so lookups and
//! stores never contend on a lock. Every filter instance carries a
//! process-unique id; a thread's slot for an id that no longer matches a
//! live filter simply stops being used, and replacing the filter (the way
//! configuration changes are deployed) starts every thread from an empty
//! cache. Threads managed outside the runtime should call
//! [`DedupFilter::clear_thread_cache`] at teardown.
//!
//! The filter is consulted before parsing, so a hit pays zero parse cost.

use std::cell::RefCell;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::debug;

use sqlsentinel_config::DedupConfig;
use sqlsentinel_types::ValidationResult;

use crate::context::SqlContext;

static NEXT_FILTER_ID: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static THREAD_CACHES: RefCell<HashMap<u64, LruTtlCache>> = RefCell::new(HashMap::new());
}

/// Amortizes validation across repeated statements.
#[derive(Debug)]
pub struct DedupFilter {
    id: u64,
    enabled: bool,
    capacity: usize,
    ttl: Duration,
}

impl DedupFilter {
    pub fn new(config: &DedupConfig) -> Self {
        Self {
            id: NEXT_FILTER_ID.fetch_add(1, Ordering::Relaxed),
            enabled: config.enabled,
            capacity: config.capacity.max(1),
            ttl: Duration::from_millis(config.ttl_ms),
        }
    }

    /// Returns the cached verdict for this `(statement id, sql)` pair when
    /// one was stored within the TTL on the current thread.
    pub fn lookup(&self, context: &SqlContext) -> Option<ValidationResult> {
        if !self.enabled {
            return None;
        }
        let key = cache_key(context);
        let hit = THREAD_CACHES.with(|caches| caches.borrow_mut().get_mut(&self.id)?.get(key));
        if hit.is_some() {
            debug!(statement_id = %context.statement_id, "deduplication cache hit");
        }
        hit
    }

    /// Caches a verdict on the current thread.
    pub fn store(&self, context: &SqlContext, result: &ValidationResult) {
        if !self.enabled {
            return;
        }
        let key = cache_key(context);
        THREAD_CACHES.with(|caches| {
            caches
                .borrow_mut()
                .entry(self.id)
                .or_insert_with(|| LruTtlCache::new(self.capacity, self.ttl))
                .insert(key, result.clone());
        });
    }

    /// Drops this filter's cache on the current thread.
    pub fn clear_thread_cache(&self) {
        THREAD_CACHES.with(|caches| {
            caches.borrow_mut().remove(&self.id);
        });
    }
}

/// 64-bit key: statement-id hash xored with SQL-text hash.
fn cache_key(context: &SqlContext) -> u64 {
    hash64(context.statement_id.as_str()) ^ hash64(&context.sql)
}

fn hash64(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

/// Bounded single-threaded LRU with per-entry TTL.
///
/// Recency is tracked with a marker queue: every access pushes a
/// `(key, touch)` marker and only the newest marker per key is honored at
/// eviction time, stale ones are skipped. The queue is compacted when it
/// outgrows the live entry set.
#[derive(Debug)]
struct LruTtlCache {
    capacity: usize,
    ttl: Duration,
    entries: HashMap<u64, CacheEntry>,
    order: VecDeque<(u64, u64)>,
    tick: u64,
}

#[derive(Debug)]
struct CacheEntry {
    result: ValidationResult,
    created: Instant,
    touch: u64,
}

impl LruTtlCache {
    fn new(capacity: usize, ttl: Duration) -> Self {
        assert!(capacity > 0, "dedup cache capacity must be > 0");
        Self {
            capacity,
            ttl,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::new(),
            tick: 0,
        }
    }

    /// Returns a live entry, refreshing its recency. Entries older than the
    /// TTL are treated as absent and dropped on the spot.
    fn get(&mut self, key: u64) -> Option<ValidationResult> {
        if self
            .entries
            .get(&key)
            .is_some_and(|entry| entry.created.elapsed() >= self.ttl)
        {
            self.entries.remove(&key);
            return None;
        }

        self.tick += 1;
        let tick = self.tick;
        let entry = self.entries.get_mut(&key)?;
        entry.touch = tick;
        let result = entry.result.clone();
        self.order.push_back((key, tick));
        self.compact_if_bloated();
        Some(result)
    }

    fn insert(&mut self, key: u64, result: ValidationResult) {
        self.tick += 1;
        let tick = self.tick;

        if let Some(entry) = self.entries.get_mut(&key) {
            entry.result = result;
            entry.created = Instant::now();
            entry.touch = tick;
        } else {
            while self.entries.len() >= self.capacity {
                self.evict_lru();
            }
            self.entries.insert(
                key,
                CacheEntry {
                    result,
                    created: Instant::now(),
                    touch: tick,
                },
            );
        }
        self.order.push_back((key, tick));
        self.compact_if_bloated();
    }

    /// Pops markers until one matches a live entry's newest touch, then
    /// evicts that entry.
    fn evict_lru(&mut self) {
        while let Some((key, touch)) = self.order.pop_front() {
            let is_current = self
                .entries
                .get(&key)
                .is_some_and(|entry| entry.touch == touch);
            if is_current {
                self.entries.remove(&key);
                return;
            }
        }
        // Marker queue drained with entries still present: give up on
        // recency and clear. Unreachable in practice since every entry has
        // a marker.
        self.entries.clear();
    }

    fn compact_if_bloated(&mut self) {
        if self.order.len() > self.capacity.saturating_mul(8).max(64) {
            let entries = &self.entries;
            self.order
                .retain(|(key, touch)| entries.get(key).is_some_and(|entry| entry.touch == *touch));
        }
    }
}

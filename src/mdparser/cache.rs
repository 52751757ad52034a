//! Bounded FIFO cache of rendered documents.
//!
//! Keyed by a hash of the markdown plus the fully resolved options. Entries
//! older than `max_age` are treated as misses and dropped on read; when the
//! cache is full the oldest *inserted* entry goes first, regardless of use.
use sha2::{Digest, Sha256};
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use crate::render_config::RenderOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Zero disables caching.
    pub max_size: usize,
    pub max_age: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            max_size: 100,
            max_age: Duration::from_secs(5 * 60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    /// `hits / (hits + misses)`, 0 before the first lookup.
    pub hit_rate: f64,
}

#[derive(Debug)]
struct CacheEntry {
    output: String,
    inserted: Instant,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    order: VecDeque<String>,
}

impl CacheState {
    fn remove(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.order.retain(|k| k != key);
        }
    }
}

#[derive(Debug)]
pub struct RenderCache {
    config: CacheConfig,
    state: Mutex<CacheState>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for RenderCache {
    fn default() -> Self {
        RenderCache::new(CacheConfig::default())
    }
}

impl RenderCache {
    pub fn new(config: CacheConfig) -> Self {
        RenderCache {
            config,
            state: Mutex::new(CacheState::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> CacheConfig {
        self.config
    }

    // a panic while holding the lock leaves plain data behind, keep using it
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fresh cached output for `key`. A stale entry is removed and counts as a miss.
    pub fn get(&self, key: &str) -> Option<String> {
        let mut state = self.lock();
        let fresh = match state.entries.get(key) {
            Some(entry) if entry.inserted.elapsed() <= self.config.max_age => {
                Some(entry.output.clone())
            }
            Some(_) => {
                trace!(target: "chatmark::cache", key, "stale entry dropped");
                state.remove(key);
                None
            }
            None => None,
        };
        drop(state);

        match fresh {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        fresh
    }

    /// Store `output`, evicting the oldest insertions while over capacity.
    pub fn insert(&self, key: String, output: String) {
        if self.config.max_size == 0 {
            return;
        }
        let mut state = self.lock();
        state.remove(&key);
        while state.order.len() >= self.config.max_size {
            let Some(oldest) = state.order.pop_front() else {
                break;
            };
            state.entries.remove(&oldest);
            debug!(target: "chatmark::cache", key = %oldest, "evicted");
        }
        state.order.push_back(key.clone());
        state.entries.insert(
            key,
            CacheEntry {
                output,
                inserted: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all entries and reset the counters.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.order.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStats {
            size: self.len(),
            max_size: self.config.max_size,
            hits,
            misses,
            hit_rate: if total == 0 {
                0.0
            } else {
                hits as f64 / total as f64
            },
        }
    }
}

/// Deterministic key over the markdown and every resolved option.
pub fn cache_key(markdown: &str, options: &RenderOptions) -> String {
    match serde_json::to_string(options) {
        Ok(json) => {
            let mut hasher = Sha256::new();
            hasher.update(markdown.as_bytes());
            hasher.update([0u8]);
            hasher.update(json.as_bytes());
            hex::encode(hasher.finalize())
        }
        Err(err) => {
            debug!(target: "chatmark::cache", error = %err, "options not serializable, using degraded key");
            degraded_key(markdown, options)
        }
    }
}

fn degraded_key(markdown: &str, options: &RenderOptions) -> String {
    let options_debug = format!("{options:?}");
    let mut hasher = DefaultHasher::new();
    markdown.hash(&mut hasher);
    options_debug.hash(&mut hasher);
    format!(
        "key_{}_{}_{:016x}",
        markdown.len(),
        options_debug.len(),
        hasher.finish()
    )
}

//! In-process response cache with time-to-live expiry.
//!
//! Entries are keyed by the canonical request hash and hold an immutable,
//! shared payload. Expired entries are invisible to `get` immediately and are
//! physically removed by `sweep`, which a background sweeper runs on a fixed
//! period until stopped.
//!
//! There is no per-key locking: two concurrent misses for the same key both
//! compute a payload and both `put` it. The last write wins.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use flowtutor_core::{Error, Result};

// =============================================================================
// CLOCK
// =============================================================================

/// Source of the current time for expiry decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for tests.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let step = chrono::Duration::from_std(by).unwrap_or(chrono::Duration::zero());
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += step;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// =============================================================================
// CACHE
// =============================================================================

/// A cached payload.
#[derive(Debug)]
pub struct CacheEntry<T> {
    pub key: String,
    pub payload: Arc<T>,
    pub created_at: DateTime<Utc>,
}

impl<T> Clone for CacheEntry<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            payload: Arc::clone(&self.payload),
            created_at: self.created_at,
        }
    }
}

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub evictions: u64,
}

/// TTL cache shared between request handlers.
pub struct ResponseCache<T> {
    inner: Arc<ResponseCacheInner<T>>,
}

struct ResponseCacheInner<T> {
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
    evictions: AtomicU64,
}

impl<T> Clone for ResponseCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + Sync + 'static> ResponseCache<T> {
    /// Create a cache using the wall clock.
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Create a cache with an injected clock.
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(ResponseCacheInner {
                entries: RwLock::new(HashMap::new()),
                ttl,
                clock,
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
                inserts: AtomicU64::new(0),
                evictions: AtomicU64::new(0),
            }),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.inner.clock.now()
    }

    fn is_expired(&self, entry: &CacheEntry<T>, now: DateTime<Utc>) -> bool {
        // A clock running backwards leaves the entry live.
        (now - entry.created_at)
            .to_std()
            .map(|age| age >= self.inner.ttl)
            .unwrap_or(false)
    }

    /// Look up a live entry.
    pub async fn get(&self, key: &str) -> Option<CacheEntry<T>> {
        let now = self.now();
        let entries = self.inner.entries.read().await;
        match entries.get(key) {
            Some(entry) if !self.is_expired(entry, now) => {
                self.inner.hits.fetch_add(1, Ordering::Relaxed);
                debug!(cache_key = %key, "Cache HIT");
                Some(entry.clone())
            }
            _ => {
                self.inner.misses.fetch_add(1, Ordering::Relaxed);
                debug!(cache_key = %key, "Cache MISS");
                None
            }
        }
    }

    /// Store a payload, replacing any previous entry for `key`.
    pub async fn put(&self, key: impl Into<String>, payload: T) -> Arc<T> {
        let key = key.into();
        let payload = Arc::new(payload);
        let entry = CacheEntry {
            key: key.clone(),
            payload: Arc::clone(&payload),
            created_at: self.now(),
        };
        self.inner.entries.write().await.insert(key.clone(), entry);
        self.inner.inserts.fetch_add(1, Ordering::Relaxed);
        debug!(cache_key = %key, ttl_secs = self.inner.ttl.as_secs(), "Cache SET");
        payload
    }

    /// Remove every entry whose age at `now` is at least the TTL.
    ///
    /// Returns the number of entries removed.
    pub async fn sweep(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.inner.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry, now));
        let removed = before - entries.len();
        if removed > 0 {
            self.inner
                .evictions
                .fetch_add(removed as u64, Ordering::Relaxed);
        }
        debug!(removed, remaining = entries.len(), "Cache sweep");
        removed
    }

    pub async fn len(&self) -> usize {
        self.inner.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.entries.read().await.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
            inserts: self.inner.inserts.load(Ordering::Relaxed),
            evictions: self.inner.evictions.load(Ordering::Relaxed),
        }
    }

    /// Spawn the periodic sweeper and return a handle for stopping it.
    ///
    /// Must be called within a tokio runtime. `period` must be non-zero.
    pub fn start_sweeper(&self, period: Duration) -> SweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let cache = self.clone();

        let task = tokio::spawn(async move {
            info!(period_secs = period.as_secs(), "Cache sweeper started");
            let mut ticker = tokio::time::interval(period);
            // First tick completes immediately
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Cache sweeper received shutdown signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        cache.sweep(cache.now()).await;
                    }
                }
            }
        });

        SweeperHandle { shutdown_tx, task }
    }
}

/// Handle for controlling a running cache sweeper.
pub struct SweeperHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signal the sweeper to stop and wait for it to exit.
    pub async fn stop(self) -> Result<()> {
        // A closed channel means the task already exited.
        let _ = self.shutdown_tx.send(()).await;
        self.task
            .await
            .map_err(|e| Error::Internal(format!("Cache sweeper task failed: {}", e)))?;
        info!("Cache sweeper stopped");
        Ok(())
    }
}

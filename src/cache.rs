//! Memoization of scenario results keyed by content fingerprint.
//!
//! Entries expire after a time-to-live and the least recently used entry is
//! evicted once `max_entries` is exceeded. Concurrent callers asking for the
//! same uncached key share one computation: the first caller computes and
//! the rest wait on a per-key watch channel. The shared map lock is only held
//! for bookkeeping, never across a computation, so unrelated keys never
//! serialize behind each other.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::domain::error::FincastError;
use crate::domain::fingerprint::Fingerprint;
use crate::domain::profile::FinancialProfile;
use crate::domain::scenario::{ScenarioParameters, ScenarioResult};

pub const DEFAULT_TTL_SECONDS: u64 = 300;
pub const DEFAULT_MAX_ENTRIES: usize = 128;
pub const DEFAULT_COMPUTE_TIMEOUT_MS: u64 = 5_000;

pub type CacheOutcome = Result<Arc<ScenarioResult>, FincastError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    pub ttl_seconds: u64,
    pub max_entries: usize,
    /// A computation running longer than this fails with `ComputationTimeout`.
    pub compute_timeout_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            ttl_seconds: DEFAULT_TTL_SECONDS,
            max_entries: DEFAULT_MAX_ENTRIES,
            compute_timeout_ms: DEFAULT_COMPUTE_TIMEOUT_MS,
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<(), FincastError> {
        let invalid = |key: &str| FincastError::ConfigInvalid {
            section: "cache".to_string(),
            key: key.to_string(),
            reason: format!("{key} must be positive"),
        };
        if self.ttl_seconds == 0 {
            return Err(invalid("ttl_seconds"));
        }
        if self.max_entries == 0 {
            return Err(invalid("max_entries"));
        }
        if self.compute_timeout_ms == 0 {
            return Err(invalid("compute_timeout_ms"));
        }
        Ok(())
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    pub fn compute_timeout(&self) -> Duration {
        Duration::from_millis(self.compute_timeout_ms)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub entries: usize,
}

impl CacheStats {
    /// Hits as a percentage of all lookups; 0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64 * 100.0
        }
    }
}

struct Entry {
    value: Arc<ScenarioResult>,
    inserted_at: Instant,
    last_used: u64,
}

type Slot = watch::Receiver<Option<CacheOutcome>>;

#[derive(Default)]
struct State {
    entries: HashMap<Fingerprint, Entry>,
    in_flight: HashMap<Fingerprint, Slot>,
    clock: u64,
    stats: CacheStats,
}

impl State {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn lookup(&mut self, key: &Fingerprint, ttl: Duration) -> Option<Arc<ScenarioResult>> {
        let expired = self.entries.get(key)?.inserted_at.elapsed() >= ttl;
        if expired {
            self.entries.remove(key);
            self.stats.expirations += 1;
            debug!(key = %key.short(), "cache entry expired");
            return None;
        }
        let tick = self.tick();
        let entry = self.entries.get_mut(key)?;
        entry.last_used = tick;
        Some(Arc::clone(&entry.value))
    }

    fn insert(&mut self, key: Fingerprint, value: Arc<ScenarioResult>, config: &CacheConfig) {
        let ttl = config.ttl();
        let before = self.entries.len();
        self.entries.retain(|_, e| e.inserted_at.elapsed() < ttl);
        self.stats.expirations += (before - self.entries.len()) as u64;

        while self.entries.len() >= config.max_entries {
            let Some(lru) = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone())
            else {
                break;
            };
            self.entries.remove(&lru);
            self.stats.evictions += 1;
            info!(key = %lru.short(), "evicted least recently used scenario result");
        }

        let tick = self.tick();
        self.entries.insert(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
                last_used: tick,
            },
        );
    }
}

enum Acquire {
    Hit(Arc<ScenarioResult>),
    Owner(watch::Sender<Option<CacheOutcome>>),
    Waiter(Slot),
}

/// Time- and size-bounded result cache. Construct one per analyzer and share
/// it by reference (or `Arc`); there is no global instance.
pub struct ResultCache {
    config: CacheConfig,
    state: Mutex<State>,
}

impl ResultCache {
    pub fn new(config: CacheConfig) -> Result<Self, FincastError> {
        config.validate()?;
        Ok(ResultCache {
            config,
            state: Mutex::new(State::default()),
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats {
            entries: state.entries.len(),
            ..state.stats
        }
    }

    /// Cached result for `(baseline, parameters)`, computing it with
    /// `compute` on a miss.
    pub async fn get_or_compute<F, Fut>(
        &self,
        baseline: &FinancialProfile,
        parameters: &ScenarioParameters,
        compute: F,
    ) -> CacheOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ScenarioResult, FincastError>>,
    {
        let key = Fingerprint::scenario(baseline, parameters)?;
        self.get_or_compute_key(key, &parameters.name, compute).await
    }

    /// As [`ResultCache::get_or_compute`] with a precomputed key. `label`
    /// only names the computation in errors and logs.
    ///
    /// At most one computation per key runs at a time. If the computing
    /// caller is cancelled, waiters retry and exactly one of them takes over.
    /// Failures are handed to every waiter and never cached.
    pub async fn get_or_compute_key<F, Fut>(
        &self,
        key: Fingerprint,
        label: &str,
        compute: F,
    ) -> CacheOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ScenarioResult, FincastError>>,
    {
        let sender = loop {
            match self.acquire(&key) {
                Acquire::Hit(value) => {
                    debug!(key = %key.short(), scenario = label, "cache hit");
                    return Ok(value);
                }
                Acquire::Owner(sender) => break sender,
                Acquire::Waiter(mut slot) => {
                    debug!(key = %key.short(), scenario = label, "awaiting in-flight computation");
                    let shared = match slot.wait_for(Option::is_some).await {
                        Ok(outcome) => outcome.clone(),
                        Err(_) => None,
                    };
                    match shared {
                        Some(outcome) => return outcome,
                        None => {
                            debug!(key = %key.short(), scenario = label, "in-flight computation abandoned, retrying");
                        }
                    }
                }
            }
        };

        debug!(key = %key.short(), scenario = label, "cache miss, computing");
        let mut guard = InFlightGuard {
            cache: self,
            key: &key,
            settled: false,
        };

        let limit = self.config.compute_timeout();
        let outcome: CacheOutcome = match tokio::time::timeout(limit, compute()).await {
            Ok(Ok(value)) => Ok(Arc::new(value)),
            Ok(Err(err)) => Err(err),
            Err(_) => {
                warn!(scenario = label, limit_ms = self.config.compute_timeout_ms, "computation timed out");
                Err(FincastError::ComputationTimeout {
                    scenario: label.to_string(),
                    limit_ms: self.config.compute_timeout_ms,
                })
            }
        };

        {
            let mut state = self.lock();
            state.in_flight.remove(&key);
            if let Ok(value) = &outcome {
                state.insert(key.clone(), Arc::clone(value), &self.config);
            }
        }
        guard.settled = true;
        sender.send_replace(Some(outcome.clone()));
        outcome
    }

    fn acquire(&self, key: &Fingerprint) -> Acquire {
        let mut state = self.lock();
        if let Some(value) = state.lookup(key, self.config.ttl()) {
            state.stats.hits += 1;
            return Acquire::Hit(value);
        }
        if let Some(slot) = state.in_flight.get(key) {
            return Acquire::Waiter(slot.clone());
        }
        state.stats.misses += 1;
        let (sender, slot) = watch::channel(None);
        state.in_flight.insert(key.clone(), slot);
        Acquire::Owner(sender)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the in-flight slot if the owning caller is dropped (cancelled or
/// panicked) before publishing an outcome.
struct InFlightGuard<'a> {
    cache: &'a ResultCache,
    key: &'a Fingerprint,
    settled: bool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!(key = %self.key.short(), "computation abandoned, releasing key");
            self.cache.lock().in_flight.remove(self.key);
        }
    }
}

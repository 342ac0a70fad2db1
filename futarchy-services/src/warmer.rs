//! Demand-driven cache warming
//!
//! Chart queries that were computed successfully are remembered in a
//! bounded [`WarmList`]. [`CacheWarmer`] wakes slightly more often than the
//! response cache expires and recomputes every remembered query whose
//! response slot has gone empty.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, Instant};
use tracing::{debug, info};

use crate::chart_service::{ChartParams, ChartService, SpotMode};

/// Gap between a warm cycle and the response TTL
pub const WARM_MARGIN: Duration = Duration::from_secs(5);

/// Floor for the warm cycle period
pub const MIN_WARM_INTERVAL: Duration = Duration::from_secs(5);

/// Warm cycle period for a response cache TTL.
pub fn warm_interval(response_ttl: Duration) -> Duration {
    response_ttl.saturating_sub(WARM_MARGIN).max(MIN_WARM_INTERVAL)
}

#[derive(Debug, Clone)]
pub struct WarmEntry {
    pub params: ChartParams,
    pub registered_at: Instant,
    pub last_seen: Instant,
}

/// Bounded set of recently served chart queries
pub struct WarmList {
    capacity: usize,
    retention: Duration,
    entries: Mutex<HashMap<String, WarmEntry>>,
}

impl WarmList {
    pub fn new(capacity: usize, retention: Duration) -> Self {
        Self {
            capacity,
            retention,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Track `key`, or bump its `last_seen` if already tracked. When full,
    /// the entry with the oldest `last_seen` makes room; its key is returned.
    pub fn register(&self, key: String, params: ChartParams) -> Option<String> {
        if self.capacity == 0 {
            return None;
        }

        let now = Instant::now();
        let mut entries = self.entries.lock();

        if let Some(entry) = entries.get_mut(&key) {
            entry.last_seen = now;
            return None;
        }

        let mut evicted = None;
        if entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
                debug!("Warm list full, dropped {}", oldest);
                evicted = Some(oldest);
            }
        }

        entries.insert(
            key,
            WarmEntry {
                params,
                registered_at: now,
                last_seen: now,
            },
        );
        evicted
    }

    /// Bump `last_seen` of a tracked key. Returns whether it was tracked.
    pub fn touch(&self, key: &str) -> bool {
        match self.entries.lock().get_mut(key) {
            Some(entry) => {
                entry.last_seen = Instant::now();
                true
            }
            None => false,
        }
    }

    /// Drop entries not seen within the retention window.
    pub fn evict_stale(&self) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        let retention = self.retention;
        entries.retain(|_, entry| entry.last_seen.elapsed() <= retention);
        before - entries.len()
    }

    pub fn snapshot(&self) -> Vec<(String, ChartParams)> {
        self.entries
            .lock()
            .iter()
            .map(|(key, entry)| (key.clone(), entry.params.clone()))
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<WarmEntry> {
        self.entries.lock().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outcome of one warm cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarmCycle {
    pub evicted: usize,
    /// Expired cache entries swept across all layers
    pub purged: usize,
    /// Response slot still fresh
    pub skipped: usize,
    pub refreshed: usize,
    /// Recomputed but degraded, so not cached
    pub failed: usize,
}

/// Background loop keeping warm-listed responses cached
pub struct CacheWarmer {
    service: Arc<ChartService>,
    period: Duration,
}

impl CacheWarmer {
    pub fn new(service: Arc<ChartService>, response_ttl: Duration) -> Self {
        Self {
            service,
            period: warm_interval(response_ttl),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Run warm cycles forever.
    pub async fn start(self: Arc<Self>) {
        info!("Starting cache warmer with {:?} period", self.period);

        let mut ticker = interval(self.period);

        loop {
            ticker.tick().await;
            self.warm_once().await;
        }
    }

    /// Evict stale entries and sweep expired cache entries, then recompute
    /// every tracked query whose response is no longer cached. Spot series
    /// come from the spot cache only.
    pub async fn warm_once(&self) -> WarmCycle {
        let warm_list = self.service.warm_list();
        let mut cycle = WarmCycle {
            evicted: warm_list.evict_stale(),
            purged: self.service.caches().purge_expired(),
            ..WarmCycle::default()
        };

        let tracked = warm_list.snapshot();
        if tracked.is_empty() {
            debug!("Warm list empty, skipping cycle");
            return cycle;
        }

        for (key, params) in tracked {
            if self.service.cached_response(&key).is_some() {
                cycle.skipped += 1;
                continue;
            }

            let response = self.service.compute(&params, SpotMode::CacheOnly).await;
            if response.degraded {
                cycle.failed += 1;
            } else {
                cycle.refreshed += 1;
            }
        }

        info!(
            "Warm cycle: {} refreshed, {} fresh, {} degraded, {} evicted, {} purged",
            cycle.refreshed, cycle.skipped, cycle.failed, cycle.evicted, cycle.purged
        );
        cycle
    }
}

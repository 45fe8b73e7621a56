//! Short-lived cache of backend response bodies, keyed by request URL.
//!
//! Query parameters are emitted in a fixed order, so equal filter states
//! produce equal keys. A zero TTL disables the cache entirely.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CachedBody {
    body: String,
    /// `None` when the TTL reaches past the clock's range.
    expires_at: Option<Instant>,
}

impl CachedBody {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |expires_at| now <= expires_at)
    }
}

/// Thread-safe response cache shared by clones of one REST client.
///
/// Expired entries are evicted on lookup and on every insert, so the map
/// only holds live bodies.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    entries: Arc<tokio::sync::RwLock<HashMap<String, CachedBody>>>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(tokio::sync::RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn is_disabled(&self) -> bool {
        self.ttl.is_zero()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Body cached for `url`, if present and not expired. An expired entry
    /// is removed.
    pub async fn get(&self, url: &str) -> Option<String> {
        if self.is_disabled() {
            return None;
        }
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        match entries.get(url) {
            Some(entry) if entry.is_live(now) => Some(entry.body.clone()),
            Some(_) => {
                entries.remove(url);
                None
            }
            None => None,
        }
    }

    /// Stores a successful response body and drops expired entries. No-op
    /// when disabled.
    pub async fn put(&self, url: &str, body: &str) {
        if self.is_disabled() {
            return;
        }
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.is_live(now));
        entries.insert(
            url.to_owned(),
            CachedBody {
                body: body.to_owned(),
                expires_at: now.checked_add(self.ttl),
            },
        );
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::disabled()
    }
}

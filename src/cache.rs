//! Time-expiring response cache.
//!
//! Entries are keyed by route plus normalised query parameters. Each key owns
//! a [`OnceCell`]: every caller that arrives while the value is being
//! computed awaits the same cell, so a key is computed at most once per
//! lifetime no matter how many requests race for it. Once the entry expires
//! the cell is swapped for a fresh one and the next caller recomputes.
//!
//! The map itself sits behind a plain mutex that is only held to look up or
//! swap a cell, never across an `.await`.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio::time::Instant;

/// A cached value and the moment it stops being served.
#[derive(Debug, Clone)]
pub struct Cached<V> {
    pub value: V,
    pub expires_at: Instant,
}
impl<V> Cached<V> {
    /// Time left before expiry, rounded down to whole seconds.
    pub fn max_age(&self) -> u64 {
        self.expires_at.saturating_duration_since(Instant::now()).as_secs()
    }

    fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

type Slot<V> = Arc<OnceCell<Cached<V>>>;

pub struct ResponseCache<V> {
    ttl: Duration,
    entries: Mutex<HashMap<String, Slot<V>>>,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Build a cache key from a route and its parameters.
    ///
    /// Parameters are sorted and absent values dropped, so `?b=2&a=1` and
    /// `?a=1&b=2&c` share an entry. A route without parameters is keyed by
    /// the route alone.
    pub fn key<'a>(route: &str, params: impl IntoIterator<Item = (&'a str, Option<String>)>) -> String {
        let mut params: Vec<(&str, String)> =
            params.into_iter().filter_map(|(name, value)| value.map(|value| (name, value))).collect();
        if params.is_empty() {
            return route.to_string();
        }
        params.sort();
        let query: Vec<String> = params.into_iter().map(|(name, value)| format!("{name}={value}")).collect();
        format!("{route}?{}", query.join("&"))
    }

    /// Return the cached value for `key`, computing it with `compute` if the
    /// entry is missing or expired.
    ///
    /// Errors are handed back to every waiting caller's own attempt and are
    /// never cached: the next caller runs `compute` again.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: &str, compute: F) -> Result<Cached<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let slot = self.slot(key);
        let cached = slot
            .get_or_try_init(|| async {
                let value = compute().await?;
                tracing::debug!(key, ttl = ?self.ttl, "caching response");
                Ok::<_, E>(Cached {
                    value,
                    expires_at: Instant::now() + self.ttl,
                })
            })
            .await?;
        Ok(cached.clone())
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of keys currently tracked, including expired ones that have
    /// not been replaced yet.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fetch the live cell for `key`, replacing it when its value expired.
    /// A cell whose value is still being computed is live.
    fn slot(&self, key: &str) -> Slot<V> {
        let now = Instant::now();
        let mut entries = self.lock();
        if let Some(slot) = entries.get(key)
            && slot.get().is_none_or(|cached| cached.is_fresh(now))
        {
            return Arc::clone(slot);
        }
        entries.retain(|_, slot| slot.get().is_none_or(|cached| cached.is_fresh(now)));
        let slot = Arc::new(OnceCell::new());
        entries.insert(key.to_string(), Arc::clone(&slot));
        slot
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Slot<V>>> {
        // The map is always left consistent, so a poisoned lock is still usable.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

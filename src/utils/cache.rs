//! Time-to-live cache with single-flight de-duplication.
//!
//! Every key is in one of three states: absent, pending (a shared in-flight
//! fetch) or resolved (a value and the instant it was stored). Concurrent
//! callers for a pending key all await the same fetch, so only one fetch per
//! key is ever polled at a time. Producers are called with no lock held. Failed fetches evict the key so the next
//! caller starts over. Staleness is only checked when a key is read.

use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use thiserror::Error;
use tokio::time::Instant;

/// Failure of a cached fetch, shared by every caller that awaited it.
#[derive(Debug, Clone, Error)]
#[error("{0:#}")]
pub struct CacheError(Arc<eyre::Report>);

impl From<eyre::Report> for CacheError {
    fn from(report: eyre::Report) -> Self {
        Self(Arc::new(report))
    }
}

/// The in-flight fetch handle every waiter clones
type SharedFetch<V> = Shared<BoxFuture<'static, Result<V, CacheError>>>;

/// State of a present key
enum Slot<V> {
    /// A fetch is running; `id` tells this fetch apart from later ones
    Pending { id: u64, fetch: SharedFetch<V> },
    /// A fetched value and when it was stored
    Resolved { value: V, stored_at: Instant },
}

/// What a read of a present key found
enum Lookup<V> {
    /// Resolved and within the TTL
    Fresh(V),
    /// Somebody else is already fetching
    InFlight(u64, SharedFetch<V>),
    /// Resolved but older than the TTL
    Stale,
}

impl<V: Clone> Slot<V> {
    fn lookup(&self, ttl: Duration) -> Lookup<V> {
        match self {
            Self::Pending { id, fetch } => Lookup::InFlight(*id, fetch.clone()),
            Self::Resolved { value, stored_at } if stored_at.elapsed() <= ttl => {
                Lookup::Fresh(value.clone())
            }
            Self::Resolved { .. } => Lookup::Stale,
        }
    }
}

/// A key/value cache whose values expire `ttl` after they were fetched.
///
/// The cache is an ordinary value: the component that needs it owns one and
/// hands out references. Keys are compared structurally through `Hash + Eq`.
pub struct TtlCache<K, V> {
    /// How long a resolved value is served before it is fetched again
    ttl: Duration,
    /// Per-key state
    entries: DashMap<K, Slot<V>>,
    /// Source of fetch ids
    next_id: AtomicU64,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + Send + Sync + 'static,
{
    /// Creates an empty cache.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
            next_id: AtomicU64::new(0),
        }
    }

    /// Returns the value for `key`, calling `producer` only when no fresh or
    /// in-flight value exists.
    ///
    /// # Arguments
    ///
    /// * `key` - The structural cache key, also handed to the producer
    /// * `producer` - Builds the fetch future for a missing or stale key
    ///
    /// # Errors
    ///
    /// Returns the producer's failure. Every caller that awaited the same
    /// fetch receives the same error, and the key is evicted.
    pub async fn get<F, Fut>(&self, key: K, producer: F) -> Result<V, CacheError>
    where
        F: FnOnce(K) -> Fut,
        Fut: Future<Output = eyre::Result<V>> + Send + 'static,
    {
        let found = self.entries.get(&key).map(|slot| slot.lookup(self.ttl));
        match found {
            Some(Lookup::Fresh(value)) => return Ok(value),
            Some(Lookup::InFlight(id, fetch)) => return self.wait(&key, id, fetch).await,
            Some(Lookup::Stale) | None => {}
        }

        // The producer runs with no shard locked, so it may read this cache
        let (own_id, own_fetch) = self.launch(key.clone(), producer);
        let (id, fetch) = match self.entries.entry(key.clone()) {
            Entry::Occupied(mut occupied) => match occupied.get().lookup(self.ttl) {
                Lookup::Fresh(value) => return Ok(value),
                // another caller got here first; the unpolled fetch is dropped
                Lookup::InFlight(id, fetch) => (id, fetch),
                Lookup::Stale => {
                    occupied.insert(Slot::Pending {
                        id: own_id,
                        fetch: own_fetch.clone(),
                    });
                    (own_id, own_fetch)
                }
            },
            Entry::Vacant(vacant) => {
                vacant.insert(Slot::Pending {
                    id: own_id,
                    fetch: own_fetch.clone(),
                });
                (own_id, own_fetch)
            }
        };

        self.wait(&key, id, fetch).await
    }

    /// Drops every entry, pending fetches included
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of pending or resolved keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no key is pending or resolved
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Awaits fetch `id` and settles its slot
    async fn wait(&self, key: &K, id: u64, fetch: SharedFetch<V>) -> Result<V, CacheError> {
        let result = fetch.await;
        self.settle(key, id, &result);
        result
    }

    fn launch<F, Fut>(&self, key: K, producer: F) -> (u64, SharedFetch<V>)
    where
        F: FnOnce(K) -> Fut,
        Fut: Future<Output = eyre::Result<V>> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let fetch = producer(key)
            .map(|result| result.map_err(CacheError::from))
            .boxed()
            .shared();
        (id, fetch)
    }

    /// Moves the pending fetch `id` to its final state. Only the first waiter
    /// to wake up does anything; a newer fetch for the same key is left alone.
    fn settle(&self, key: &K, id: u64, result: &Result<V, CacheError>) {
        let Entry::Occupied(mut occupied) = self.entries.entry(key.clone()) else {
            return;
        };
        if !matches!(occupied.get(), Slot::Pending { id: pending, .. } if *pending == id) {
            return;
        }
        match result {
            Ok(value) => {
                occupied.insert(Slot::Resolved {
                    value: value.clone(),
                    stored_at: Instant::now(),
                });
            }
            Err(_) => {
                occupied.remove();
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    fn counting_producer(
        calls: &Arc<AtomicUsize>,
        value: u64,
    ) -> impl FnOnce(&'static str) -> BoxFuture<'static, eyre::Result<u64>> {
        let calls = Arc::clone(calls);
        move |_key: &'static str| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(value)
            }
            .boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_gets_share_one_fetch() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            cache.get("prices", counting_producer(&calls, 7)),
            cache.get("prices", counting_producer(&calls, 8)),
        );

        assert_eq!(a.unwrap(), 7);
        assert_eq!(b.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_value_is_served_until_ttl() {
        let cache = TtlCache::new(Duration::from_secs(300));
        let calls = Arc::new(AtomicUsize::new(0));

        assert_eq!(cache.get("k", counting_producer(&calls, 1)).await.unwrap(), 1);
        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(cache.get("k", counting_producer(&calls, 2)).await.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get("k", counting_producer(&calls, 3)).await.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_evicts_and_reaches_all_waiters() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        let failing = |calls: &Arc<AtomicUsize>| {
            let calls = Arc::clone(calls);
            move |_key: &'static str| {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    Err::<u64, _>(eyre::eyre!("price api down"))
                }
            }
        };

        let (a, b) = tokio::join!(
            cache.get("k", failing(&calls)),
            cache.get("k", failing(&calls)),
        );
        assert_eq!(a.unwrap_err().to_string(), "price api down");
        assert_eq!(b.unwrap_err().to_string(), "price api down");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.is_empty());

        assert_eq!(cache.get("k", counting_producer(&calls, 5)).await.unwrap(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_keys_do_not_wait_on_each_other() {
        let cache = Arc::new(TtlCache::new(Duration::from_secs(60)));
        let (_never_tx, never_rx) = tokio::sync::oneshot::channel::<u64>();

        let stuck = Arc::clone(&cache);
        let handle = tokio::spawn(async move {
            stuck
                .get("slow", move |_: &'static str| async move { Ok(never_rx.await?) })
                .await
        });
        tokio::task::yield_now().await;

        let calls = Arc::new(AtomicUsize::new(0));
        assert_eq!(cache.get("fast", counting_producer(&calls, 9)).await.unwrap(), 9);
        assert_eq!(cache.len(), 2);
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_producer_may_read_the_cache() {
        let cache: TtlCache<&'static str, usize> = TtlCache::new(Duration::from_secs(60));
        let reading_len = |_key: &'static str| {
            let seen = cache.len();
            async move { Ok(seen) }
        };

        assert_eq!(cache.get("a", reading_len).await.unwrap(), 0);
        assert_eq!(cache.get("b", reading_len).await.unwrap(), 1);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(cache.get("a", reading_len).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_clear_forces_refetch() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        cache.get("k", counting_producer(&calls, 1)).await.unwrap();
        cache.clear();
        cache.get("k", counting_producer(&calls, 1)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}

//! Rate limiting and shared counters.
//!
//! Both the upload rate limiter and the visit counter sit on top of the
//! `CounterStore` trait so the backing store can be swapped for an external
//! shared one when the service runs as multiple instances. The in-process
//! implementation is a sharded mutex map with fixed-window bucket expiry.
//!
//! Check-and-increment happens under the shard lock, so two concurrent
//! requests for the same identity cannot both observe a stale count and both
//! be admitted when only one fits under the ceiling.

use async_trait::async_trait;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Outcome of an atomic increment-with-ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

/// Atomic counter store keyed by string identity.
///
/// `increment_with_ceiling` must be atomic: the read, compare, and increment
/// happen as one operation. Counters with an expiry self-reset at the window
/// boundary; application logic never resets them explicitly.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Read a counter, treating expired entries as absent.
    async fn get(&self, key: &str) -> Option<u64>;

    /// Write a counter value with an optional time-to-live.
    async fn put(&self, key: &str, value: u64, expires_in: Option<Duration>);

    /// Increment a non-expiring counter and return the new value.
    async fn increment(&self, key: &str) -> u64;

    /// Atomically increment within a fixed window, refusing without
    /// incrementing once `ceiling` is reached.
    async fn increment_with_ceiling(
        &self,
        key: &str,
        ceiling: u32,
        window: Duration,
    ) -> CounterDecision;
}

#[derive(Clone)]
struct CounterBucket {
    value: u64,
    reset_at: Option<Instant>,
    inserted_at: Instant,
}

impl CounterBucket {
    fn new(value: u64, reset_at: Option<Instant>) -> Self {
        Self {
            value,
            reset_at,
            inserted_at: Instant::now(),
        }
    }

    fn expired(&self, now: Instant) -> bool {
        matches!(self.reset_at, Some(reset_at) if now >= reset_at)
    }
}

/// Sharded in-process counter store.
///
/// Uses multiple shards (separate HashMaps) to distribute load and reduce
/// contention on a single mutex. Keys are hashed to determine which shard to use.
pub struct ShardedCounterStore {
    shards: Vec<Arc<Mutex<HashMap<String, CounterBucket>>>>,
    shard_count: usize,
    max_buckets: usize,
}

impl ShardedCounterStore {
    /// Create a new store with the default shard count (16 shards).
    pub fn new() -> Self {
        Self::with_shards(16)
    }

    /// Create a store with a custom shard count
    ///
    /// # Arguments
    /// * `shard_count` - Number of shards (should be a power of 2 for best distribution)
    pub fn with_shards(shard_count: usize) -> Self {
        let shards = (0..shard_count)
            .map(|_| Arc::new(Mutex::new(HashMap::new())))
            .collect();
        Self {
            shards,
            shard_count,
            max_buckets: 10_000, // per shard, bounds memory under identity churn
        }
    }

    fn shard_index(&self, key: &str) -> usize {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % self.shard_count
    }

    /// Drop expired buckets; if the shard is still at capacity afterwards,
    /// evict the bucket closest to its reset, falling back to the oldest
    /// insertion when nothing carries an expiry, so the map cannot grow
    /// unbounded even when it fills with non-expiring buckets.
    fn enforce_capacity(buckets: &mut HashMap<String, CounterBucket>, max_buckets: usize) {
        if buckets.len() < max_buckets {
            return;
        }

        let now = Instant::now();
        buckets.retain(|_key, bucket| !bucket.expired(now));

        if buckets.len() >= max_buckets {
            let victim_key = buckets
                .iter()
                .filter(|(_, bucket)| bucket.reset_at.is_some())
                .min_by_key(|(_, bucket)| bucket.reset_at)
                .or_else(|| buckets.iter().min_by_key(|(_, bucket)| bucket.inserted_at))
                .map(|(k, _)| k.clone());

            if let Some(key_to_remove) = victim_key {
                buckets.remove(&key_to_remove);
                tracing::debug!(
                    removed_key = %key_to_remove,
                    "Evicted oldest counter bucket due to capacity limit"
                );
            }
        }
    }
}

impl Default for ShardedCounterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CounterStore for ShardedCounterStore {
    async fn get(&self, key: &str) -> Option<u64> {
        let shard = &self.shards[self.shard_index(key)];
        let buckets = shard.lock().await;
        let bucket = buckets.get(key)?;
        if bucket.expired(Instant::now()) {
            return None;
        }
        Some(bucket.value)
    }

    async fn put(&self, key: &str, value: u64, expires_in: Option<Duration>) {
        let shard = &self.shards[self.shard_index(key)];
        let mut buckets = shard.lock().await;
        Self::enforce_capacity(&mut buckets, self.max_buckets);
        buckets.insert(
            key.to_string(),
            CounterBucket::new(value, expires_in.map(|ttl| Instant::now() + ttl)),
        );
    }

    async fn increment(&self, key: &str) -> u64 {
        let shard = &self.shards[self.shard_index(key)];
        let mut buckets = shard.lock().await;
        Self::enforce_capacity(&mut buckets, self.max_buckets);
        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| CounterBucket::new(0, None));
        bucket.value += 1;
        bucket.value
    }

    async fn increment_with_ceiling(
        &self,
        key: &str,
        ceiling: u32,
        window: Duration,
    ) -> CounterDecision {
        let shard = &self.shards[self.shard_index(key)];
        let mut buckets = shard.lock().await;

        Self::enforce_capacity(&mut buckets, self.max_buckets);

        let now = Instant::now();
        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| CounterBucket::new(0, Some(now + window)));

        // Fixed window: the counter self-resets at the boundary.
        if bucket.expired(now) {
            bucket.value = 0;
            bucket.reset_at = Some(now + window);
        }

        if bucket.value < u64::from(ceiling) {
            bucket.value += 1;
            let remaining = ceiling.saturating_sub(bucket.value as u32);
            CounterDecision::Allowed { remaining }
        } else {
            let retry_after = bucket
                .reset_at
                .map(|reset_at| reset_at.saturating_duration_since(now))
                .unwrap_or(window);
            CounterDecision::Limited { retry_after }
        }
    }
}

/// Upload-attempt rate limiter keyed by client identity.
///
/// Fixed window, documented: simpler than a sliding window and matches the
/// admission semantics the pipeline needs. Every admitted attempt counts;
/// refused attempts do not increment.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    max_attempts: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, max_attempts: u32, window: Duration) -> Self {
        Self {
            store,
            max_attempts,
            window,
        }
    }

    pub async fn check_and_increment(&self, identity: &str) -> CounterDecision {
        let key = format!("ratelimit:ip:{}", identity);
        self.store
            .increment_with_ceiling(&key, self.max_attempts, self.window)
            .await
    }
}

/// Per-identity unique visit counter.
#[derive(Clone)]
pub struct VisitCounter {
    store: Arc<dyn CounterStore>,
}

/// Seen-flags carry a finite TTL so the store can expire and evict them;
/// identities are client-chosen, so unbounded flags would be a memory leak.
/// An identity counts again once its flag ages out.
const VISIT_RETENTION: Duration = Duration::from_secs(30 * 24 * 60 * 60);

impl VisitCounter {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    /// Record a visit and return the unique-visitor total. An identity only
    /// counts once within the retention window; repeat visits return the
    /// current total unchanged.
    pub async fn record(&self, identity: &str) -> u64 {
        let seen_key = format!("visits:ip:{}", identity);
        if self.store.get(&seen_key).await.is_none() {
            self.store.put(&seen_key, 1, Some(VISIT_RETENTION)).await;
            self.store.increment("visits:total").await
        } else {
            self.store.get("visits:total").await.unwrap_or(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ceiling_admits_exactly_max_attempts() {
        let store = ShardedCounterStore::new();
        let window = Duration::from_secs(60);

        for i in 0..5u32 {
            let decision = store.increment_with_ceiling("ip:1.2.3.4", 5, window).await;
            assert_eq!(
                decision,
                CounterDecision::Allowed {
                    remaining: 5 - i - 1
                }
            );
        }

        // The (ceiling+1)-th attempt is refused.
        let decision = store.increment_with_ceiling("ip:1.2.3.4", 5, window).await;
        assert!(matches!(decision, CounterDecision::Limited { .. }));
    }

    #[tokio::test]
    async fn test_limited_attempts_do_not_increment() {
        let store = ShardedCounterStore::new();
        let window = Duration::from_secs(60);

        for _ in 0..3 {
            store.increment_with_ceiling("ip:k", 3, window).await;
        }
        for _ in 0..10 {
            let decision = store.increment_with_ceiling("ip:k", 3, window).await;
            assert!(matches!(decision, CounterDecision::Limited { .. }));
        }
        assert_eq!(store.get("ip:k").await, Some(3));
    }

    #[tokio::test]
    async fn test_window_expiry_resets_counter() {
        let store = ShardedCounterStore::new();
        let window = Duration::from_millis(20);

        for _ in 0..2 {
            store.increment_with_ceiling("ip:w", 2, window).await;
        }
        assert!(matches!(
            store.increment_with_ceiling("ip:w", 2, window).await,
            CounterDecision::Limited { .. }
        ));

        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(matches!(
            store.increment_with_ceiling("ip:w", 2, window).await,
            CounterDecision::Allowed { .. }
        ));
    }

    #[tokio::test]
    async fn test_concurrent_admissions_never_exceed_ceiling() {
        let store = Arc::new(ShardedCounterStore::new());
        let window = Duration::from_secs(60);
        let ceiling = 10u32;

        let mut tasks = Vec::new();
        for _ in 0..50 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store
                    .increment_with_ceiling("ip:conc", ceiling, window)
                    .await
            }));
        }

        let mut admitted = 0;
        for task in tasks {
            if matches!(task.await.unwrap(), CounterDecision::Allowed { .. }) {
                admitted += 1;
            }
        }
        assert_eq!(admitted, ceiling);
    }

    #[tokio::test]
    async fn test_identities_are_independent() {
        let store = ShardedCounterStore::new();
        let window = Duration::from_secs(60);

        store.increment_with_ceiling("ip:a", 1, window).await;
        assert!(matches!(
            store.increment_with_ceiling("ip:a", 1, window).await,
            CounterDecision::Limited { .. }
        ));
        assert!(matches!(
            store.increment_with_ceiling("ip:b", 1, window).await,
            CounterDecision::Allowed { .. }
        ));
    }

    fn tiny_store(max_buckets: usize) -> ShardedCounterStore {
        ShardedCounterStore {
            shards: vec![Arc::new(Mutex::new(HashMap::new()))],
            shard_count: 1,
            max_buckets,
        }
    }

    #[tokio::test]
    async fn test_capacity_bound_holds_for_non_expiring_buckets() {
        let store = tiny_store(8);

        // Non-expiring buckets must still be evictable, or client-chosen
        // identities could grow the map without bound.
        for i in 0..50 {
            store.put(&format!("visits:ip:10.0.0.{}", i), 1, None).await;
        }

        let shard = store.shards[0].lock().await;
        assert!(shard.len() <= 8, "shard grew to {} buckets", shard.len());
    }

    #[tokio::test]
    async fn test_capacity_bound_holds_for_increment() {
        let store = tiny_store(8);

        for i in 0..50 {
            store.increment(&format!("counter:{}", i)).await;
        }

        let shard = store.shards[0].lock().await;
        assert!(shard.len() <= 8, "shard grew to {} buckets", shard.len());
    }

    #[tokio::test]
    async fn test_visit_seen_flags_carry_expiry() {
        let store = Arc::new(ShardedCounterStore::new());
        let visits = VisitCounter::new(store.clone());

        visits.record("203.0.113.77").await;

        let seen_key = "visits:ip:203.0.113.77";
        let shard = store.shards[store.shard_index(seen_key)].lock().await;
        let bucket = shard.get(seen_key).expect("seen flag recorded");
        assert!(bucket.reset_at.is_some(), "seen flag must be expirable");
    }

    #[tokio::test]
    async fn test_visit_counter_counts_identity_once() {
        let store: Arc<dyn CounterStore> = Arc::new(ShardedCounterStore::new());
        let visits = VisitCounter::new(store);

        assert_eq!(visits.record("1.1.1.1").await, 1);
        assert_eq!(visits.record("1.1.1.1").await, 1);
        assert_eq!(visits.record("2.2.2.2").await, 2);
        assert_eq!(visits.record("1.1.1.1").await, 2);
    }

    #[tokio::test]
    async fn test_rate_limiter_wraps_store() {
        let store: Arc<dyn CounterStore> = Arc::new(ShardedCounterStore::new());
        let limiter = RateLimiter::new(store, 2, Duration::from_secs(60));

        assert!(matches!(
            limiter.check_and_increment("9.9.9.9").await,
            CounterDecision::Allowed { remaining: 1 }
        ));
        assert!(matches!(
            limiter.check_and_increment("9.9.9.9").await,
            CounterDecision::Allowed { remaining: 0 }
        ));
        assert!(matches!(
            limiter.check_and_increment("9.9.9.9").await,
            CounterDecision::Limited { .. }
        ));
    }
}

//! TTL cache for scored reputation results
//!
//! Keyed by `(address, data source)` so live and fallback results for the
//! same address never collide. Reads treat expired entries as misses even
//! though the stale entry may still physically exist; expired entries are
//! actually removed by the eviction sweep that runs when a write pushes the
//! entry count over the configured ceiling. The cache is owned by the
//! reputation service and shared behind an `Arc`; nothing else writes to it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use palisade_core::{DataSource, ReputationResult};

use crate::config::CacheConfig;
use crate::error::AppError;

#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct CacheKey {
    pub address: String,
    pub source: DataSource,
}

impl CacheKey {
    /// Addresses are hex and compared case-insensitively, so the key stores
    /// the lowercased form.
    pub fn new(address: &str, source: DataSource) -> Self {
        Self {
            address: address.to_ascii_lowercase(),
            source,
        }
    }
}

struct CacheEntry {
    result: ReputationResult,
    expires_at: Instant,
}

pub struct ReputationCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    default_ttl: Duration,
    max_entries: usize,
}

impl ReputationCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl: Duration::from_secs(config.ttl_seconds),
            max_entries: config.max_entries,
        }
    }

    /// Fresh entry or miss. Stale entries are left in place for the sweep,
    /// and an entry that fails the sanity check reads as a miss so the
    /// caller recomputes it instead of serving garbage.
    pub async fn get(&self, key: &CacheKey) -> Option<ReputationResult> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if Instant::now() >= entry.expires_at {
            return None;
        }
        if entry.result.score > 100 || !entry.result.address().eq_ignore_ascii_case(&key.address) {
            let err = AppError::CacheCorruption(format!(
                "entry for {} fails sanity checks",
                key.address
            ));
            tracing::error!(wallet = %key.address, error = %err, "Ignoring corrupt cache entry");
            return None;
        }
        Some(entry.result.clone())
    }

    /// Insert or overwrite, then sweep if the write pushed the entry count
    /// over the ceiling.
    pub async fn put(&self, key: CacheKey, result: ReputationResult, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.default_ttl);
        let mut entries = self.entries.write().await;
        entries.insert(
            key,
            CacheEntry {
                result,
                expires_at: Instant::now() + ttl,
            },
        );
        if entries.len() > self.max_entries {
            Self::evict(&mut entries, self.max_entries);
        }
    }

    /// Drop everything; returns how many entries were removed.
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.write().await;
        let dropped = entries.len();
        entries.clear();
        dropped
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Remove everything already expired; if the map is still over the
    /// ceiling, keep removing the entries closest to expiry. Fresh entries
    /// are never evicted while longer-lived ones remain.
    fn evict(entries: &mut HashMap<CacheKey, CacheEntry>, max_entries: usize) {
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, entry| now < entry.expires_at);

        if entries.len() > max_entries {
            let mut by_expiry: Vec<(CacheKey, Instant)> = entries
                .iter()
                .map(|(key, entry)| (key.clone(), entry.expires_at))
                .collect();
            by_expiry.sort_by_key(|(_, expires_at)| *expires_at);

            let excess = entries.len() - max_entries;
            for (key, _) in by_expiry.into_iter().take(excess) {
                entries.remove(&key);
            }
        }

        tracing::debug!(
            removed = %(before - entries.len()),
            remaining = %entries.len(),
            "Cache sweep completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use palisade_core::{TrustLevel, VerificationMode, WalletData};

    fn result_for(address: &str, score: u8) -> ReputationResult {
        ReputationResult {
            score,
            trust_level: TrustLevel::Medium,
            verification_mode: VerificationMode::Simple,
            wallet_data: WalletData::empty(address),
            data_source: DataSource::Live,
            computed_at: Utc::now(),
        }
    }

    fn cache(ttl_seconds: u64, max_entries: usize) -> ReputationCache {
        ReputationCache::new(&CacheConfig {
            ttl_seconds,
            max_entries,
        })
    }

    #[tokio::test]
    async fn absent_key_is_a_miss() {
        let cache = cache(60, 10);
        let key = CacheKey::new("0xabc", DataSource::Live);
        assert!(cache.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn fresh_entry_round_trips() {
        let cache = cache(60, 10);
        let key = CacheKey::new("0xabc", DataSource::Live);
        cache.put(key.clone(), result_for("0xabc", 55), None).await;
        assert_eq!(cache.get(&key).await.unwrap().score, 55);
    }

    #[tokio::test]
    async fn live_and_fallback_keys_do_not_collide() {
        let cache = cache(60, 10);
        cache
            .put(CacheKey::new("0xabc", DataSource::Live), result_for("0xabc", 80), None)
            .await;
        cache
            .put(CacheKey::new("0xabc", DataSource::Fallback), result_for("0xabc", 35), None)
            .await;
        let live = cache.get(&CacheKey::new("0xabc", DataSource::Live)).await.unwrap();
        let fallback = cache.get(&CacheKey::new("0xabc", DataSource::Fallback)).await.unwrap();
        assert_eq!(live.score, 80);
        assert_eq!(fallback.score, 35);
    }

    #[tokio::test]
    async fn keys_normalize_address_case() {
        let cache = cache(60, 10);
        cache
            .put(CacheKey::new("0xABC", DataSource::Live), result_for("0xABC", 42), None)
            .await;
        assert!(cache.get(&CacheKey::new("0xabc", DataSource::Live)).await.is_some());
    }

    #[tokio::test]
    async fn put_overwrites_existing_entry() {
        let cache = cache(60, 10);
        let key = CacheKey::new("0xabc", DataSource::Live);
        cache.put(key.clone(), result_for("0xabc", 10), None).await;
        cache.put(key.clone(), result_for("0xabc", 90), None).await;
        assert_eq!(cache.get(&key).await.unwrap().score, 90);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn expired_entry_reads_as_miss_before_any_sweep() {
        let cache = cache(60, 10);
        let key = CacheKey::new("0xabc", DataSource::Live);
        cache
            .put(key.clone(), result_for("0xabc", 55), Some(Duration::from_millis(20)))
            .await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(cache.get(&key).await.is_none());
        // Physically still present until a sweep runs.
        assert_eq!(cache.len().await, 1);
    }

    #[test]
    fn clear_drops_everything() {
        tokio_test::block_on(async {
            let cache = cache(60, 10);
            cache
                .put(CacheKey::new("0xa", DataSource::Live), result_for("0xa", 1), None)
                .await;
            cache
                .put(CacheKey::new("0xb", DataSource::Live), result_for("0xb", 2), None)
                .await;
            assert_eq!(cache.clear().await, 2);
            assert_eq!(cache.len().await, 0);
        });
    }

    #[tokio::test]
    async fn mismatched_entry_reads_as_a_miss() {
        let cache = cache(60, 10);
        let key = CacheKey::new("0xabc", DataSource::Live);
        // An entry whose payload disagrees with its key is corrupt; readers
        // treat it as absent and recompute.
        cache.put(key.clone(), result_for("0xother", 55), None).await;
        assert!(cache.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn sweep_removes_expired_entries_first() {
        let cache = cache(60, 2);
        cache
            .put(
                CacheKey::new("0xstale", DataSource::Live),
                result_for("0xstale", 1),
                Some(Duration::from_millis(10)),
            )
            .await;
        cache
            .put(CacheKey::new("0xa", DataSource::Live), result_for("0xa", 2), None)
            .await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        // This write crosses the ceiling and triggers the sweep.
        cache
            .put(CacheKey::new("0xb", DataSource::Live), result_for("0xb", 3), None)
            .await;
        assert_eq!(cache.len().await, 2);
        assert!(cache.get(&CacheKey::new("0xstale", DataSource::Live)).await.is_none());
        assert!(cache.get(&CacheKey::new("0xa", DataSource::Live)).await.is_some());
        assert!(cache.get(&CacheKey::new("0xb", DataSource::Live)).await.is_some());
    }

    #[tokio::test]
    async fn sweep_prefers_entries_closest_to_expiry() {
        let cache = cache(60, 2);
        cache
            .put(
                CacheKey::new("0xshort", DataSource::Live),
                result_for("0xshort", 1),
                Some(Duration::from_secs(5)),
            )
            .await;
        cache
            .put(
                CacheKey::new("0xlong", DataSource::Live),
                result_for("0xlong", 2),
                Some(Duration::from_secs(500)),
            )
            .await;
        cache
            .put(
                CacheKey::new("0xmedium", DataSource::Live),
                result_for("0xmedium", 3),
                Some(Duration::from_secs(50)),
            )
            .await;
        // Nothing has expired, so the entry soonest to expire goes.
        assert_eq!(cache.len().await, 2);
        assert!(cache.get(&CacheKey::new("0xshort", DataSource::Live)).await.is_none());
        assert!(cache.get(&CacheKey::new("0xlong", DataSource::Live)).await.is_some());
        assert!(cache.get(&CacheKey::new("0xmedium", DataSource::Live)).await.is_some());
    }
}

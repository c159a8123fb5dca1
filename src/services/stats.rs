use crate::client::DonationStore;
use crate::error::UpstreamError;
use crate::models::{CharityStatsSnapshot, DonorStatsSnapshot, PlatformVerificationStats};
use crate::services::aggregator::{aggregate_charity, aggregate_donor, aggregate_platform};
use crate::services::cache::{CacheOutcome, RequestCache};
use crate::services::coalesce::KeyedLocks;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const PLATFORM_KEY: &str = "stats:platform";

/// Fetches donation data from the store and serves aggregated statistics
/// through a short-lived [`RequestCache`].
///
/// The cache lock is only held to read or write an entry. Fetches are
/// serialized per key, so concurrent requests for the same statistics wait
/// for the first one instead of hitting the store again, while other keys
/// proceed.
pub struct StatsService {
    store: Arc<dyn DonationStore>,
    cache: Mutex<RequestCache>,
    fetches: KeyedLocks,
    ttl: Duration,
}

impl StatsService {
    pub fn new(store: Arc<dyn DonationStore>, ttl: Duration) -> Self {
        Self {
            store,
            cache: Mutex::new(RequestCache::new()),
            fetches: KeyedLocks::new(),
            ttl,
        }
    }

    pub async fn donor_stats(
        &self,
        donor_id: &str,
    ) -> Result<CacheOutcome<DonorStatsSnapshot>, UpstreamError> {
        let store = &self.store;
        self.cached(&format!("stats:donor:{}", donor_id), move || async move {
            let donations = store.donor_donations(donor_id).await?;
            Ok::<_, UpstreamError>(aggregate_donor(donor_id, &donations))
        })
        .await
    }

    pub async fn charity_stats(
        &self,
        charity_id: &str,
    ) -> Result<CacheOutcome<CharityStatsSnapshot>, UpstreamError> {
        let store = &self.store;
        self.cached(&format!("stats:charity:{}", charity_id), move || async move {
            let (donations, flow) = futures::try_join!(
                store.charity_donations(charity_id),
                store.charity_fund_flow(charity_id),
            )?;
            Ok::<_, UpstreamError>(aggregate_charity(charity_id, &donations, &flow))
        })
        .await
    }

    pub async fn platform_stats(
        &self,
    ) -> Result<CacheOutcome<PlatformVerificationStats>, UpstreamError> {
        let store = &self.store;
        self.cached(PLATFORM_KEY, move || async move {
            let donations = store.all_donations().await?;
            Ok::<_, UpstreamError>(aggregate_platform(&donations))
        })
        .await
    }

    async fn cached<T, F, Fut>(
        &self,
        key: &str,
        fetch: F,
    ) -> Result<CacheOutcome<T>, UpstreamError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        if let Some(value) = self.cache.lock().await.get(key, self.ttl) {
            return Ok(CacheOutcome { value, hit: true });
        }

        let _fetching = self.fetches.acquire(key).await;

        // Filled by the caller this one waited for.
        let generation = {
            let mut cache = self.cache.lock().await;
            if let Some(value) = cache.get(key, self.ttl) {
                return Ok(CacheOutcome { value, hit: true });
            }
            cache.generation()
        };

        let value = fetch().await?;

        let mut cache = self.cache.lock().await;
        if cache.generation() == generation {
            cache.set(key, &value, self.ttl);
        } else {
            tracing::debug!("Statistics for {} changed during fetch; not caching", key);
        }
        Ok(CacheOutcome { value, hit: false })
    }

    /// Drop every cached statistic. Called after any verification mutation,
    /// since every snapshot depends on verification state.
    pub async fn invalidate_all(&self) {
        self.cache.lock().await.invalidate(None);
        tracing::debug!("Statistics cache cleared");
    }

    pub async fn cached_entries(&self) -> usize {
        self.cache.lock().await.len()
    }
}

//! ConfigCache - lazily refreshed routing snapshot
//!
//! The snapshot pointer sits behind a short synchronous mutex; refreshes are
//! serialized by a separate async lock. A caller that finds the snapshot absent
//! or stale takes the refresh lock, re-checks, and only then fetches. Callers
//! that queued behind a completed refresh reuse its result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use contracts::{Clock, ConfigFetchError, ConfigProvider, ConfigSnapshot, SystemClock};
use tracing::{debug, error, info, instrument, warn};

use crate::error::CacheError;

/// Result of the most recent refresh
#[derive(Debug, Clone)]
enum LastRefresh {
    Never,
    Published,
    /// Provider answered 4xx/5xx
    Unavailable,
    /// Provider unreachable or body unreadable
    Unreachable(String),
}

/// Shared routing configuration cache
pub struct ConfigCache<P> {
    provider: P,
    clock: Arc<dyn Clock>,
    snapshot: Mutex<Option<Arc<ConfigSnapshot>>>,
    refresh_lock: tokio::sync::Mutex<LastRefresh>,
    refreshes: AtomicU64,
}

impl<P: ConfigProvider + Sync> ConfigCache<P> {
    /// Cache using the local system date
    pub fn new(provider: P) -> Self {
        Self::with_clock(provider, Arc::new(SystemClock))
    }

    pub fn with_clock(provider: P, clock: Arc<dyn Clock>) -> Self {
        Self {
            provider,
            clock,
            snapshot: Mutex::new(None),
            refresh_lock: tokio::sync::Mutex::new(LastRefresh::Never),
            refreshes: AtomicU64::new(0),
        }
    }

    /// Current snapshot, refreshing first when absent or stale
    ///
    /// A 4xx/5xx provider answer yields an empty snapshot (every organization
    /// unresolved) and leaves the cache absent.
    ///
    /// # Errors
    /// `CacheError::Unreachable` when the provider could not be reached or its
    /// body could not be read.
    pub async fn get(&self) -> Result<Arc<ConfigSnapshot>, CacheError> {
        let today = self.clock.today();
        if let Some(snapshot) = self.fresh(today) {
            return Ok(snapshot);
        }

        let observed = self.refreshes.load(Ordering::Acquire);
        let mut last = self.refresh_lock.lock().await;

        if let Some(snapshot) = self.fresh(today) {
            debug!("Snapshot refreshed by a concurrent caller");
            return Ok(snapshot);
        }

        if self.refreshes.load(Ordering::Acquire) != observed {
            match &*last {
                LastRefresh::Unavailable => {
                    debug!("Reusing unavailable result of a concurrent refresh");
                    return Ok(Arc::new(ConfigSnapshot::empty(today)));
                }
                LastRefresh::Unreachable(message) => {
                    debug!("Reusing failed result of a concurrent refresh");
                    return Err(CacheError::unreachable(message.clone()));
                }
                LastRefresh::Published | LastRefresh::Never => {}
            }
        }

        let (result, outcome) = self.refresh(today).await;
        *last = outcome;
        self.refreshes.fetch_add(1, Ordering::Release);
        result
    }

    /// Held snapshot, without refreshing
    pub fn current(&self) -> Option<Arc<ConfigSnapshot>> {
        self.slot().clone()
    }

    /// Drop the held snapshot; the next `get()` fetches again
    pub fn invalidate(&self) {
        *self.slot() = None;
    }

    /// Number of completed refreshes
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::Acquire)
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    fn fresh(&self, today: NaiveDate) -> Option<Arc<ConfigSnapshot>> {
        self.slot()
            .as_ref()
            .filter(|snapshot| !snapshot.is_stale(today))
            .cloned()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Arc<ConfigSnapshot>>> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[instrument(name = "config_cache_refresh", skip(self), fields(provider = self.provider.name()))]
    async fn refresh(
        &self,
        today: NaiveDate,
    ) -> (Result<Arc<ConfigSnapshot>, CacheError>, LastRefresh) {
        match self.provider.fetch().await {
            Ok(payload) => {
                let snapshot = Arc::new(ConfigSnapshot::from_payload(payload, today));
                *self.slot() = Some(Arc::clone(&snapshot));
                observability::record_config_refresh("published");
                info!(
                    links = snapshot.links().len(),
                    stations = snapshot.stations().len(),
                    retrieved_on = %today,
                    "Configuration snapshot refreshed"
                );
                (Ok(snapshot), LastRefresh::Published)
            }
            Err(err) if err.is_fatal() => {
                self.invalidate();
                observability::record_config_refresh("unreachable");
                error!(error = %err, "Configuration provider unreachable");
                let message = err.to_string();
                (
                    Err(CacheError::unreachable(message.clone())),
                    LastRefresh::Unreachable(message),
                )
            }
            Err(err) => {
                self.invalidate();
                observability::record_config_refresh("unavailable");
                warn!(
                    error = %err,
                    status = status_of(&err),
                    "Configuration unavailable, proceeding without routing data"
                );
                (
                    Ok(Arc::new(ConfigSnapshot::empty(today))),
                    LastRefresh::Unavailable,
                )
            }
        }
    }
}

fn status_of(err: &ConfigFetchError) -> u16 {
    match err {
        ConfigFetchError::Client { status, .. } | ConfigFetchError::Server { status, .. } => {
            *status
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use contracts::{CachePayload, CreditorInstitutionStation, FixedClock, Station};

    fn payload(organization: &str, station: &str) -> CachePayload {
        let mut payload = CachePayload::default();
        payload.creditor_institution_stations.insert(
            format!("{organization}-{station}"),
            CreditorInstitutionStation {
                organization_id: organization.to_string(),
                station_code: station.to_string(),
            },
        );
        payload.stations.insert(
            station.to_string(),
            Station {
                station_code: station.to_string(),
                broker_code: "BROKER".to_string(),
                enabled: true,
            },
        );
        payload
    }

    #[derive(Clone, Copy)]
    enum Script {
        Ok,
        Status(u16),
        Refused,
    }

    struct CountingProvider {
        calls: AtomicUsize,
        script: Mutex<Script>,
        delay: Duration,
    }

    impl CountingProvider {
        fn new(script: Script) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                script: Mutex::new(script),
                delay: Duration::ZERO,
            }
        }

        fn slow(script: Script, delay: Duration) -> Self {
            Self {
                delay,
                ..Self::new(script)
            }
        }

        fn set(&self, script: Script) {
            *self.script.lock().unwrap() = script;
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ConfigProvider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        async fn fetch(&self) -> Result<CachePayload, ConfigFetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let script = *self.script.lock().unwrap();
            match script {
                Script::Ok => Ok(payload("77777777777", "77777777777_01")),
                Script::Status(status) => Err(ConfigFetchError::from_status(status, "mock").unwrap()),
                Script::Refused => Err(ConfigFetchError::transport("mock", "connection refused")),
            }
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn cache(provider: CountingProvider, clock: &Arc<FixedClock>) -> ConfigCache<CountingProvider> {
        ConfigCache::with_clock(provider, Arc::clone(clock) as Arc<dyn Clock>)
    }

    #[tokio::test]
    async fn test_first_get_fetches_once_then_serves_cached() {
        let clock = Arc::new(FixedClock::new(day(10)));
        let cache = cache(CountingProvider::new(Script::Ok), &clock);
        assert!(cache.current().is_none());

        let first = cache.get().await.unwrap();
        let second = cache.get().await.unwrap();

        assert_eq!(cache.provider().calls(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.retrieved_on(), day(10));
        assert_eq!(cache.refresh_count(), 1);
    }

    #[tokio::test]
    async fn test_stale_snapshot_refreshed_exactly_once() {
        let clock = Arc::new(FixedClock::new(day(10)));
        let cache = cache(CountingProvider::new(Script::Ok), &clock);
        cache.get().await.unwrap();

        clock.advance_days(1);
        let refreshed = cache.get().await.unwrap();
        cache.get().await.unwrap();

        assert_eq!(cache.provider().calls(), 2);
        assert_eq!(refreshed.retrieved_on(), day(11));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_touch_fetches_once() {
        let clock = Arc::new(FixedClock::new(day(10)));
        let cache = Arc::new(cache(
            CountingProvider::slow(Script::Ok, Duration::from_millis(50)),
            &clock,
        ));

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..16 {
            let cache = Arc::clone(&cache);
            tasks.spawn(async move { cache.get().await });
        }
        while let Some(result) = tasks.join_next().await {
            let snapshot = result.unwrap().unwrap();
            assert_eq!(snapshot.links().len(), 1);
        }

        assert_eq!(cache.provider().calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_waiters_reuse_failed_refresh() {
        let clock = Arc::new(FixedClock::new(day(10)));
        let cache = Arc::new(cache(
            CountingProvider::slow(Script::Refused, Duration::from_millis(50)),
            &clock,
        ));

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            tasks.spawn(async move { cache.get().await });
        }
        while let Some(result) = tasks.join_next().await {
            assert!(matches!(
                result.unwrap(),
                Err(CacheError::Unreachable { .. })
            ));
        }

        assert_eq!(cache.provider().calls(), 1);
    }

    #[tokio::test]
    async fn test_status_failure_yields_empty_snapshot_and_absent_cache() {
        let clock = Arc::new(FixedClock::new(day(10)));
        let cache = cache(CountingProvider::new(Script::Ok), &clock);
        cache.get().await.unwrap();

        clock.advance_days(1);
        cache.provider().set(Script::Status(500));
        let snapshot = cache.get().await.unwrap();

        assert!(snapshot.is_empty());
        assert!(cache.current().is_none());

        // absent again, so the next call retries the provider
        cache.provider().set(Script::Status(404));
        cache.get().await.unwrap();
        assert_eq!(cache.provider().calls(), 3);
    }

    #[tokio::test]
    async fn test_transport_failure_is_fatal_and_clears_cache() {
        let clock = Arc::new(FixedClock::new(day(10)));
        let cache = cache(CountingProvider::new(Script::Ok), &clock);
        cache.get().await.unwrap();

        clock.advance_days(1);
        cache.provider().set(Script::Refused);
        let err = cache.get().await.unwrap_err();

        assert!(matches!(err, CacheError::Unreachable { .. }));
        assert!(cache.current().is_none());

        cache.provider().set(Script::Ok);
        assert!(!cache.get().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let clock = Arc::new(FixedClock::new(day(10)));
        let cache = cache(CountingProvider::new(Script::Ok), &clock);
        cache.get().await.unwrap();

        cache.invalidate();
        assert!(cache.current().is_none());
        cache.get().await.unwrap();

        assert_eq!(cache.provider().calls(), 2);
    }
}

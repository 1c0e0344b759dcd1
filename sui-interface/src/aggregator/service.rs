use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{info, warn};
use tokio::task::JoinHandle;

use common::{MarketSnapshot, Protocol};

use crate::adapters::{MarketAdapter, UserAdapter};
use crate::aggregator::store::SnapshotStore;
use crate::claim::SnapshotSource;
use crate::config::Config;

/// Owns the snapshot store and the per-protocol poll timers.
///
/// Fetches run outside the store lock; results are applied under it. Each
/// protocol's market timer ticks on its own cadence while wallet-scoped
/// fetches share one slower timer.
pub struct MarketService {
    inner: Arc<Inner>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

struct Inner {
    store: RwLock<SnapshotStore>,
    market_adapters: Vec<Arc<dyn MarketAdapter>>,
    user_adapters: Vec<Arc<dyn UserAdapter>>,
    address: RwLock<Option<String>>,
    refreshing: AtomicBool,
    config: Config,
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Inner {
    async fn refresh_market(&self, adapter: &Arc<dyn MarketAdapter>) {
        let protocol = adapter.protocol();
        match adapter.fetch_market().await {
            Ok(rows) => {
                info!("{} market refresh: {} rows", protocol, rows.len());
                write(&self.store).apply_market(protocol, rows);
            }
            // Keep the previous rows; the next tick retries.
            Err(e) => warn!("{} market refresh failed: {}", protocol, e),
        }
    }

    async fn refresh_user(&self, adapter: &Arc<dyn UserAdapter>) {
        let protocol = adapter.protocol();
        let address = read(&self.address).clone();
        match adapter.fetch_user(address.as_deref()).await {
            Ok(fetch) => write(&self.store).apply_user(protocol, fetch),
            Err(e) => warn!("{} user refresh failed: {}", protocol, e),
        }
    }

    /// One full fetch cycle across every adapter. Coalesced: a cycle already
    /// in flight absorbs concurrent requests.
    async fn refresh_all(&self) {
        if self.refreshing.swap(true, Ordering::SeqCst) {
            return;
        }
        let markets = self.market_adapters.iter().map(|adapter| self.refresh_market(adapter));
        futures::future::join_all(markets).await;
        let users = self.user_adapters.iter().map(|adapter| self.refresh_user(adapter));
        futures::future::join_all(users).await;
        self.refreshing.store(false, Ordering::SeqCst);
    }
}

impl MarketService {
    pub fn new(
        config: Config,
        market_adapters: Vec<Arc<dyn MarketAdapter>>,
        user_adapters: Vec<Arc<dyn UserAdapter>>,
    ) -> Self {
        let inner = Arc::new(Inner {
            store: RwLock::new(SnapshotStore::new()),
            market_adapters,
            user_adapters,
            address: RwLock::new(None),
            refreshing: AtomicBool::new(false),
            config,
        });
        Self { inner, handles: Mutex::new(Vec::new()) }
    }

    /// Spawns the poll timers: one per market adapter at that protocol's
    /// cadence, one shared timer for wallet-scoped fetches.
    pub fn start(&self) {
        let mut handles =
            self.handles.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !handles.is_empty() {
            return;
        }
        for adapter in &self.inner.market_adapters {
            let inner = Arc::clone(&self.inner);
            let adapter = Arc::clone(adapter);
            let period = self.inner.config.market_poll_interval(adapter.protocol());
            handles.push(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(period);
                loop {
                    ticker.tick().await;
                    inner.refresh_market(&adapter).await;
                }
            }));
        }
        let inner = Arc::clone(&self.inner);
        let period = self.inner.config.user_poll_interval;
        handles.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                for adapter in &inner.user_adapters {
                    inner.refresh_user(adapter).await;
                }
            }
        }));
    }

    /// Sets (or clears) the watched wallet. Stale wallet data is dropped
    /// immediately; the caller decides when to refetch.
    pub fn set_address(&self, address: Option<String>) {
        let changed = {
            let mut current = write(&self.inner.address);
            let changed = *current != address;
            *current = address;
            changed
        };
        if changed {
            write(&self.inner.store).clear_user();
        }
    }

    pub fn address(&self) -> Option<String> {
        read(&self.inner.address).clone()
    }

    pub fn snapshot(&self) -> MarketSnapshot {
        read(&self.inner.store).snapshot()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        read(&self.inner.store).last_updated()
    }

    pub async fn refresh(&self) {
        self.inner.refresh_all().await;
    }

    pub fn protocols(&self) -> Vec<Protocol> {
        self.inner.market_adapters.iter().map(|adapter| adapter.protocol()).collect()
    }
}

impl Drop for MarketService {
    fn drop(&mut self) {
        let handles = self.handles.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        for handle in handles.iter() {
            handle.abort();
        }
    }
}

#[async_trait]
impl SnapshotSource for MarketService {
    fn get_snapshot(&self) -> MarketSnapshot {
        self.snapshot()
    }

    async fn refresh(&self) {
        self.inner.refresh_all().await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use common::{Asset, FetchError, MarketRow, RewardSummaryItem, WalletPositions};

    use crate::adapters::UserFetch;

    use super::*;

    struct StubMarket {
        protocol: Protocol,
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MarketAdapter for StubMarket {
        fn protocol(&self) -> Protocol {
            self.protocol
        }

        async fn fetch_market(&self) -> Result<Vec<MarketRow>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(FetchError::Http("down".to_string()));
            }
            Ok(vec![MarketRow::new(self.protocol, Asset::Sui, 3.0, 5.0, 50.0, vec![], vec![])])
        }
    }

    struct StubUser {
        protocol: Protocol,
    }

    #[async_trait]
    impl UserAdapter for StubUser {
        fn protocol(&self) -> Protocol {
            self.protocol
        }

        async fn fetch_user(&self, address: Option<&str>) -> Result<UserFetch, FetchError> {
            let Some(_) = address else { return Ok(UserFetch::default()) };
            let mut positions = WalletPositions::new();
            positions.add(self.protocol, Asset::Sui, 2.0);
            let summary = RewardSummaryItem {
                protocol: self.protocol,
                supplies: positions.supply_list(self.protocol),
                rewards: vec![],
                claim_meta: None,
            };
            Ok(UserFetch { positions, reward_summary: Some(summary) })
        }
    }

    fn service(adapters: Vec<Arc<dyn MarketAdapter>>, users: Vec<Arc<dyn UserAdapter>>) -> MarketService {
        MarketService::new(Config::default(), adapters, users)
    }

    #[tokio::test]
    async fn refresh_applies_successes_and_absorbs_failures() {
        let good = Arc::new(StubMarket {
            protocol: Protocol::Scallop,
            fail: false,
            calls: AtomicUsize::new(0),
        });
        let bad = Arc::new(StubMarket {
            protocol: Protocol::Navi,
            fail: true,
            calls: AtomicUsize::new(0),
        });
        let service = service(vec![good.clone(), bad.clone()], vec![]);

        service.refresh().await;
        let snapshot = service.snapshot();
        assert_eq!(snapshot.rows.len(), 1);
        assert_eq!(snapshot.rows[0].protocol, Protocol::Scallop);
        assert_eq!(good.calls.load(Ordering::SeqCst), 1);
        assert_eq!(bad.calls.load(Ordering::SeqCst), 1);
        assert!(snapshot.updated_at.is_some());
    }

    #[tokio::test]
    async fn user_state_follows_the_address() {
        let user = Arc::new(StubUser { protocol: Protocol::Suilend });
        let service = service(vec![], vec![user]);

        service.refresh().await;
        assert!(service.snapshot().positions.is_empty());

        service.set_address(Some("0xme".to_string()));
        service.refresh().await;
        let snapshot = service.snapshot();
        assert_eq!(snapshot.positions.amount(Protocol::Suilend, Asset::Sui), 2.0);

        // Disconnecting drops wallet data without waiting for a fetch.
        service.set_address(None);
        assert!(service.snapshot().positions.is_empty());
    }

    #[tokio::test]
    async fn summary_shape_is_stable_without_data() {
        let service = service(vec![], vec![]);
        let snapshot = service.snapshot();
        assert_eq!(snapshot.reward_summary.len(), Protocol::ALL.len());
        assert!(snapshot.rows.is_empty());
    }
}

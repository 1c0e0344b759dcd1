use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use log::warn;

use crate::SuiRpcClient;

/// Shared per-coin decimal-precision cache.
///
/// Append-only for the session: on-chain coin decimals are immutable, so
/// entries are never invalidated and concurrent readers need no coordination
/// beyond the lock. A coin whose metadata cannot be fetched simply stays
/// unresolved; callers treat that conservatively.
#[derive(Debug, Clone)]
pub struct DecimalsCache {
    rpc: Arc<SuiRpcClient>,
    entries: Arc<RwLock<HashMap<String, u8>>>,
}

impl DecimalsCache {
    pub fn new(rpc: Arc<SuiRpcClient>) -> Self {
        Self { rpc, entries: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Cached decimals without touching the network.
    pub fn get_cached(&self, coin_type: &str) -> Option<u8> {
        self.entries.read().ok()?.get(coin_type).copied()
    }

    /// Decimals for a coin type, fetching metadata on a cache miss.
    pub async fn resolve(&self, coin_type: &str) -> Option<u8> {
        if let Some(decimals) = self.get_cached(coin_type) {
            return Some(decimals);
        }
        let metadata = match self.rpc.get_coin_metadata(coin_type).await {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("Failed to fetch coin metadata for {}: {}", coin_type, e);
                return None;
            }
        };
        let decimals = metadata?.decimals;
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(coin_type.to_string(), decimals);
        }
        Some(decimals)
    }

    /// Seed an entry directly, used by adapters that learn decimals from a
    /// protocol payload and by tests.
    pub fn insert(&self, coin_type: &str, decimals: u8) {
        if let Ok(mut entries) = self.entries.write() {
            entries.entry(coin_type.to_string()).or_insert(decimals);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_append_only() {
        let cache = DecimalsCache::new(Arc::new(SuiRpcClient::new("http://localhost:9000")));
        cache.insert("0x2::sui::SUI", 9);
        // A second insert for the same coin never overwrites the first.
        cache.insert("0x2::sui::SUI", 6);
        assert_eq!(cache.get_cached("0x2::sui::SUI"), Some(9));
        assert_eq!(cache.get_cached("0xabc::x::X"), None);
    }
}

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use common::{MarketRow, MarketSnapshot, Protocol, RewardSummaryItem, WalletPositions};

use crate::adapters::UserFetch;

/// Per-protocol staging area the fetch timers write into and snapshots are
/// assembled from.
///
/// Each protocol's slice is replaced atomically on a successful fetch and
/// left untouched otherwise, so one failing source never blanks the rows the
/// others produced, and the last good data for a protocol survives its own
/// failed refresh.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    market_rows: HashMap<Protocol, Vec<MarketRow>>,
    user: HashMap<Protocol, UserFetch>,
    updated_at: Option<DateTime<Utc>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces one protocol's market rows with the result of a fresh fetch.
    pub fn apply_market(&mut self, protocol: Protocol, rows: Vec<MarketRow>) {
        debug_assert!(rows.iter().all(|row| row.protocol == protocol));
        self.market_rows.insert(protocol, rows);
        self.updated_at = Some(Utc::now());
    }

    /// Replaces one protocol's wallet-scoped contribution.
    pub fn apply_user(&mut self, protocol: Protocol, fetch: UserFetch) {
        self.user.insert(protocol, fetch);
        self.updated_at = Some(Utc::now());
    }

    /// Drops all wallet-scoped state, keeping market rows. Used when the
    /// watched address changes or disconnects.
    pub fn clear_user(&mut self) {
        self.user.clear();
        self.updated_at = Some(Utc::now());
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Assembles the externally-visible snapshot: the union of per-protocol
    /// rows in registry order, positions merged additively across protocols,
    /// and exactly one reward summary per registered protocol.
    pub fn snapshot(&self) -> MarketSnapshot {
        let mut rows = Vec::new();
        let mut positions = WalletPositions::new();
        let mut reward_summary = Vec::with_capacity(Protocol::ALL.len());

        for protocol in Protocol::ALL {
            if let Some(protocol_rows) = self.market_rows.get(&protocol) {
                rows.extend(protocol_rows.iter().cloned());
            }
            if let Some(fetch) = self.user.get(&protocol) {
                positions.merge(&fetch.positions);
            }
        }

        for protocol in Protocol::ALL {
            let mut item = self
                .user
                .get(&protocol)
                .and_then(|fetch| fetch.reward_summary.clone())
                .unwrap_or_else(|| RewardSummaryItem::empty(protocol));
            // Sources that report rewards without supply lines still get
            // their supplies filled from the merged positions.
            if item.supplies.is_empty() {
                item.supplies = positions.supply_list(protocol);
            }
            reward_summary.push(item);
        }

        MarketSnapshot { rows, positions, reward_summary, updated_at: self.updated_at }
    }
}

#[cfg(test)]
mod tests {
    use common::{Asset, MarketRow};

    use super::*;

    fn row(protocol: Protocol, asset: Asset, supply_apr: f64) -> MarketRow {
        MarketRow::new(protocol, asset, supply_apr, supply_apr + 1.0, 50.0, vec![], vec![])
    }

    fn user(protocol: Protocol, asset: Asset, amount: f64) -> UserFetch {
        let mut positions = WalletPositions::new();
        positions.add(protocol, asset, amount);
        let summary = RewardSummaryItem {
            protocol,
            supplies: positions.supply_list(protocol),
            rewards: Vec::new(),
            claim_meta: None,
        };
        UserFetch { positions, reward_summary: Some(summary) }
    }

    #[test]
    fn failed_refresh_keeps_previous_rows() {
        let mut store = SnapshotStore::new();
        store.apply_market(Protocol::Scallop, vec![row(Protocol::Scallop, Asset::Sui, 3.0)]);
        store.apply_market(Protocol::Navi, vec![row(Protocol::Navi, Asset::Usdc, 2.0)]);

        // Navi's next cycle fails; nothing is applied for it.
        store.apply_market(Protocol::Scallop, vec![row(Protocol::Scallop, Asset::Sui, 3.5)]);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.rows.len(), 2);
        let scallop = snapshot.rows.iter().find(|r| r.protocol == Protocol::Scallop).unwrap();
        assert_eq!(scallop.supply_apr, 3.5);
        assert!(snapshot.rows.iter().any(|r| r.protocol == Protocol::Navi));
    }

    #[test]
    fn positions_merge_additively_across_protocols() {
        let mut store = SnapshotStore::new();
        store.apply_user(Protocol::Scallop, user(Protocol::Scallop, Asset::Sui, 5.0));

        let mut second = WalletPositions::new();
        second.add(Protocol::Scallop, Asset::Sui, 3.0);
        second.add(Protocol::Navi, Asset::Usdc, 10.0);
        store.apply_user(Protocol::Navi, UserFetch { positions: second, reward_summary: None });

        let snapshot = store.snapshot();
        assert_eq!(snapshot.positions.amount(Protocol::Scallop, Asset::Sui), 8.0);
        assert_eq!(snapshot.positions.amount(Protocol::Navi, Asset::Usdc), 10.0);
    }

    #[test]
    fn summary_emitted_for_every_protocol() {
        let mut store = SnapshotStore::new();
        store.apply_user(Protocol::Suilend, user(Protocol::Suilend, Asset::Usdt, 4.0));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.reward_summary.len(), Protocol::ALL.len());
        for protocol in Protocol::ALL {
            assert!(snapshot.reward_summary.iter().any(|item| item.protocol == protocol));
        }
        let suilend = snapshot.summary_for(Protocol::Suilend).unwrap();
        assert_eq!(suilend.supplies.len(), 1);
    }

    #[test]
    fn empty_summary_backfills_supplies_from_positions() {
        let mut store = SnapshotStore::new();
        let mut positions = WalletPositions::new();
        positions.add(Protocol::Navi, Asset::Usdc, 12.0);
        store.apply_user(Protocol::Navi, UserFetch { positions, reward_summary: None });

        let snapshot = store.snapshot();
        let navi = snapshot.summary_for(Protocol::Navi).unwrap();
        assert_eq!(navi.supplies.len(), 1);
        assert_eq!(navi.supplies[0].amount, 12.0);
    }

    #[test]
    fn clear_user_keeps_markets() {
        let mut store = SnapshotStore::new();
        store.apply_market(Protocol::Scallop, vec![row(Protocol::Scallop, Asset::Sui, 3.0)]);
        store.apply_user(Protocol::Scallop, user(Protocol::Scallop, Asset::Sui, 5.0));

        store.clear_user();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.rows.len(), 1);
        assert!(snapshot.positions.is_empty());
    }
}

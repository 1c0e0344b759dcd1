//! Scallop indexer payloads. The indexer reports rates as fractions
//! (0.031 = 3.1%) and amounts in display units.

use std::collections::HashMap;

use serde::Deserialize;

use crate::serde_util::flexible_f64;

#[derive(Debug, Clone, Deserialize)]
pub struct MarketResponse {
    #[serde(default)]
    pub pools: HashMap<String, MarketPool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketPool {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub coin_name: String,
    #[serde(default)]
    pub coin_type: Option<String>,
    #[serde(default)]
    pub market_coin_type: Option<String>,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub supply_apr: f64,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub borrow_apr: f64,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub utilization_rate: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spool {
    #[serde(default, deserialize_with = "flexible_f64")]
    pub reward_apr: f64,
    #[serde(default)]
    pub reward_coin_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BorrowIncentiveEntry {
    #[serde(default)]
    pub pool: Option<BorrowIncentivePool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowIncentivePool {
    #[serde(default)]
    pub coin_name: Option<String>,
    #[serde(default)]
    pub rewards: Vec<BorrowIncentiveReward>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowIncentiveReward {
    #[serde(default, deserialize_with = "flexible_f64")]
    pub reward_apr: f64,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub coin_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    #[serde(default)]
    pub lendings: Vec<Lending>,
    #[serde(default)]
    pub pending_rewards: Option<PendingRewards>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lending {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub coin_type: Option<String>,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub supplied_coin: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRewards {
    #[serde(default)]
    pub lendings: Vec<PendingLendingReward>,
    #[serde(default)]
    pub borrow_incentives: Vec<PendingBorrowIncentive>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingLendingReward {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub coin_type: Option<String>,
    #[serde(default)]
    pub spool_name: Option<String>,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub pending_reward_in_coin: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingBorrowIncentive {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub coin_type: Option<String>,
    #[serde(default)]
    pub coin_name: Option<String>,
    #[serde(default)]
    pub obligation_id: Option<String>,
    #[serde(default)]
    pub obligation_key_id: Option<String>,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub pending_reward_in_coin: f64,
}

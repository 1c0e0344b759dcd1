//! Navi open-api payloads. APR figures arrive pre-scaled to percent inside
//! `IncentiveApyInfo`; the raw per-second rates need the 1e25 divisor.

use serde::Deserialize;

use crate::serde_util::{flexible_f64, flexible_u64};

#[derive(Debug, Clone, Deserialize)]
pub struct PoolsResponse {
    #[serde(default)]
    pub data: Vec<Pool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    #[serde(default, deserialize_with = "flexible_u64")]
    pub id: u64,
    #[serde(default)]
    pub token: Option<PoolToken>,
    #[serde(default)]
    pub supply_incentive_apy_info: Option<IncentiveApyInfo>,
    #[serde(default)]
    pub borrow_incentive_apy_info: Option<IncentiveApyInfo>,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub current_supply_rate: f64,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub current_borrow_rate: f64,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub total_supply_amount: f64,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub borrowed_amount: f64,
    #[serde(default)]
    pub is_sui_bridge: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolToken {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub coin_type: Option<String>,
    #[serde(default)]
    pub decimals: Option<u8>,
}

impl PoolToken {
    pub fn identifier(&self) -> Option<&str> {
        self.address.as_deref().or(self.coin_type.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncentiveApyInfo {
    #[serde(default, deserialize_with = "flexible_f64")]
    pub vault_apr: f64,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub boosted_apr: f64,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub apy: f64,
    #[serde(default)]
    pub reward_coin: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LendingState {
    #[serde(default)]
    pub pool: Option<Pool>,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub supply_balance: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableReward {
    #[serde(default, deserialize_with = "flexible_u64")]
    pub asset_id: u64,
    #[serde(default)]
    pub reward_coin_type: String,
    /// 1 = supply incentives, 3 = borrow incentives.
    #[serde(default)]
    pub reward_type: u8,
    #[serde(default)]
    pub rule_ids: Vec<String>,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub user_claimable_reward: f64,
    #[serde(default)]
    pub coin_decimals: Option<u8>,
}

//! AlphaLend API payloads. APR figures arrive in percent; the utilization
//! rate is a fraction.

use std::collections::HashMap;

use serde::Deserialize;

use crate::serde_util::{flexible_f64, flexible_u64};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    #[serde(default, deserialize_with = "flexible_u64")]
    pub market_id: u64,
    #[serde(default)]
    pub coin_type: Option<String>,
    #[serde(default)]
    pub supply_apr: Option<AprInfo>,
    #[serde(default)]
    pub borrow_apr: Option<AprInfo>,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub utilization_rate: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AprInfo {
    #[serde(default, deserialize_with = "flexible_f64")]
    pub interest_apr: f64,
    #[serde(default)]
    pub rewards: Vec<AprReward>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AprReward {
    #[serde(default)]
    pub coin_type: Option<String>,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub reward_apr: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioEntry {
    /// Display amounts keyed by market id, number-or-string valued.
    #[serde(default)]
    pub supplied_amounts: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub rewards_to_claim: Vec<ClaimableReward>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimableReward {
    #[serde(default)]
    pub coin_type: String,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub reward_amount: f64,
}

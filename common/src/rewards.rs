use serde::{Deserialize, Serialize};

use crate::{Asset, Protocol};

/// One supplied-asset line in the reward summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardSupply {
    pub asset: Asset,
    pub amount: f64,
}

/// One claimable reward token, display units. `coin_type` is absent when the
/// source only reported a symbol; such rewards can be shown but never swapped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardAmount {
    pub token: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coin_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RewardSide {
    Deposit,
    Borrow,
}

/// A coin-type amount already resolved to atomic units during discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapInput {
    pub coin_type: String,
    pub amount_atomic: u128,
}

/// One Suilend reward-distributor slot to claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuilendRewardClaim {
    pub reserve_array_index: u64,
    pub reward_index: u64,
    pub reward_coin_type: String,
    pub side: RewardSide,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SuilendClaimMeta {
    pub rewards: Vec<SuilendRewardClaim>,
    pub swap_inputs: Vec<SwapInput>,
}

/// One Navi incentive rule with a nonzero precomputed claimable amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NaviRewardClaim {
    pub asset_id: u64,
    pub reward_coin_type: String,
    /// 1 = supply incentives, 3 = borrow incentives (protocol option codes).
    pub reward_type: u8,
    pub rule_ids: Vec<String>,
    /// `None` when decimals never resolved; the claim still transfers the
    /// coin but it is excluded from any swap batch.
    pub amount_atomic: Option<u128>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NaviClaimMeta {
    pub rewards: Vec<NaviRewardClaim>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScallopBorrowIncentiveClaim {
    pub obligation_id: String,
    pub obligation_key_id: String,
    pub coin_name: String,
    pub reward_coin_type: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScallopClaimMeta {
    /// Spools the wallet has stake in, claimed via `redeem_rewards`.
    pub staked_spools: Vec<String>,
    pub borrow_incentives: Vec<ScallopBorrowIncentiveClaim>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AlphaLendClaimMeta {
    /// Claimable amounts from the portfolio read, keyed by coin type.
    pub claimables: Vec<SwapInput>,
}

/// Protocol-specific data captured during reward discovery and required,
/// unmodified, by that protocol's claim builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClaimMeta {
    Suilend(SuilendClaimMeta),
    Navi(NaviClaimMeta),
    Scallop(ScallopClaimMeta),
    AlphaLend(AlphaLendClaimMeta),
}

/// Per-protocol reward summary shown to the UI. Always emitted for every
/// registered protocol so consumers never null-check per protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardSummaryItem {
    pub protocol: Protocol,
    pub supplies: Vec<RewardSupply>,
    pub rewards: Vec<RewardAmount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_meta: Option<ClaimMeta>,
}

impl RewardSummaryItem {
    pub fn empty(protocol: Protocol) -> Self {
        Self { protocol, supplies: Vec::new(), rewards: Vec::new(), claim_meta: None }
    }
}

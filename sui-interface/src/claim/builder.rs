use std::collections::HashMap;

use async_trait::async_trait;

use common::{to_atomic, ClaimError, Protocol, RewardAmount, RewardSummaryItem};
use sui_rpc::DecimalsCache;

use crate::tx::{CoinHandle, TransactionDraft};

/// One reward coin produced while building a claim: the transaction-local
/// coin handle, its coin type and the atomic amount expected at execution.
/// `amount_atomic` is `None` when decimals never resolved; such an input is
/// excluded from swap routing but still transferred to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimInput {
    pub coin_type: String,
    pub coin: CoinHandle,
    pub amount_atomic: Option<u128>,
}

impl ClaimInput {
    /// Whether this input may enter a swap batch. Zero and unknown amounts
    /// never do; swapping a zero coin is a no-op at best and an abort at
    /// worst.
    pub fn swap_eligible(&self) -> bool {
        matches!(self.amount_atomic, Some(amount) if amount > 0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClaimOutcome {
    pub inputs: Vec<ClaimInput>,
    pub has_claim: bool,
}

/// Appends one protocol's claim instructions to a shared transaction draft.
///
/// Must be invoked at most once per built transaction; building twice would
/// double-claim. Builders resolve their own capability lookups and fail with
/// `ClaimError::MissingCapability` when the wallet has no position object,
/// which is fatal for that attempt only.
#[async_trait]
pub trait ClaimBuilder: Send + Sync {
    fn protocol(&self) -> Protocol;

    async fn append_claim(
        &self,
        tx: &mut TransactionDraft,
        address: &str,
        summary: &RewardSummaryItem,
    ) -> Result<ClaimOutcome, ClaimError>;
}

/// Display amounts per coin type from a reward summary. Rewards without a
/// coin type cannot be addressed by claim instructions and are skipped.
pub fn reward_amount_map(rewards: &[RewardAmount]) -> HashMap<String, f64> {
    let mut map: HashMap<String, f64> = HashMap::new();
    for reward in rewards {
        if let Some(coin_type) = &reward.coin_type {
            *map.entry(coin_type.clone()).or_default() += reward.amount;
        }
    }
    map
}

/// Convert a display amount to atomic units via the decimals cache, `None`
/// when the coin's precision is still unresolved.
pub async fn resolve_atomic(
    decimals: &DecimalsCache,
    coin_type: &str,
    amount: f64,
) -> Option<u128> {
    let precision = decimals.resolve(coin_type).await?;
    to_atomic(amount, precision)
}

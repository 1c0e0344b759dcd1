use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use common::{
    ClaimError, ClaimMeta, Protocol, RewardSide, RewardSummaryItem, SuilendClaimMeta,
};
use sui_rpc::SuiRpcClient;

use crate::claim::builder::{ClaimBuilder, ClaimInput, ClaimOutcome};
use crate::tx::{pure_bool, pure_u64, CallArg, CoinHandle, TransactionDraft};
use crate::suilend::{LENDING_MARKET_ID, LENDING_MARKET_TYPE, PACKAGE_ID};

/// Claims Suilend rewards through `lending_market::claim_rewards`, one call
/// per (reserve, reward slot, side), merging the coins per reward coin type.
pub struct SuilendClaimBuilder {
    rpc: Arc<SuiRpcClient>,
}

impl SuilendClaimBuilder {
    pub fn new(rpc: Arc<SuiRpcClient>) -> Self {
        Self { rpc }
    }

    async fn find_owner_cap(&self, address: &str) -> Result<String, ClaimError> {
        let cap_type =
            format!("{PACKAGE_ID}::lending_market::ObligationOwnerCap<{LENDING_MARKET_TYPE}>");
        let caps = self
            .rpc
            .get_owned_objects(address, &cap_type)
            .await
            .map_err(|e| ClaimError::Rpc(e.to_string()))?;
        caps.first()
            .map(|cap| cap.object_id.clone())
            .ok_or_else(|| ClaimError::MissingCapability("obligation owner cap".to_string()))
    }
}

/// Pure instruction-append step, separated from the owner-cap lookup so the
/// command sequence can be exercised without a node.
pub fn append_claim_calls(
    tx: &mut TransactionDraft,
    owner_cap_id: &str,
    meta: &SuilendClaimMeta,
) -> Vec<ClaimInput> {
    let amounts: BTreeMap<&str, u128> = meta
        .swap_inputs
        .iter()
        .map(|input| (input.coin_type.as_str(), input.amount_atomic))
        .collect();

    let mut coins_by_type: BTreeMap<String, Vec<CoinHandle>> = BTreeMap::new();
    for claim in &meta.rewards {
        // A slot whose atomic total floored to zero was dropped from the
        // swap inputs during discovery; claiming it would be a no-op.
        let amount = amounts.get(claim.reward_coin_type.as_str()).copied();
        if amount == Some(0) || amount.is_none() {
            continue;
        }
        let coin = tx.move_call(
            &format!("{PACKAGE_ID}::lending_market::claim_rewards"),
            vec![LENDING_MARKET_TYPE.to_string(), claim.reward_coin_type.clone()],
            vec![
                CallArg::Object(LENDING_MARKET_ID.to_string()),
                CallArg::Object(owner_cap_id.to_string()),
                CallArg::Clock,
                pure_u64(claim.reserve_array_index),
                pure_u64(claim.reward_index),
                pure_bool(claim.side == RewardSide::Deposit),
            ],
        );
        coins_by_type.entry(claim.reward_coin_type.clone()).or_default().push(coin);
    }

    let mut inputs = Vec::new();
    for (coin_type, coins) in coins_by_type {
        let Some(coin) = tx.merge_into_first(coins) else { continue };
        let amount_atomic = amounts.get(coin_type.as_str()).copied();
        inputs.push(ClaimInput { coin_type, coin, amount_atomic });
    }
    inputs
}

#[async_trait]
impl ClaimBuilder for SuilendClaimBuilder {
    fn protocol(&self) -> Protocol {
        Protocol::Suilend
    }

    async fn append_claim(
        &self,
        tx: &mut TransactionDraft,
        address: &str,
        summary: &RewardSummaryItem,
    ) -> Result<ClaimOutcome, ClaimError> {
        let Some(ClaimMeta::Suilend(meta)) = &summary.claim_meta else {
            return Ok(ClaimOutcome::default());
        };
        if meta.rewards.is_empty() {
            return Ok(ClaimOutcome::default());
        }
        let owner_cap_id = self.find_owner_cap(address).await?;
        let inputs = append_claim_calls(tx, &owner_cap_id, meta);
        let has_claim = !inputs.is_empty();
        Ok(ClaimOutcome { inputs, has_claim })
    }
}

#[cfg(test)]
mod tests {
    use common::{SuilendRewardClaim, SwapInput};

    use crate::tx::Command;

    use super::*;

    fn claim(index: u64, reward: u64, coin: &str, side: RewardSide) -> SuilendRewardClaim {
        SuilendRewardClaim {
            reserve_array_index: index,
            reward_index: reward,
            reward_coin_type: coin.to_string(),
            side,
        }
    }

    #[test]
    fn claims_merge_per_coin_type() {
        let meta = SuilendClaimMeta {
            rewards: vec![
                claim(0, 0, "0xa::a::A", RewardSide::Deposit),
                claim(2, 1, "0xa::a::A", RewardSide::Borrow),
                claim(1, 0, "0xb::b::B", RewardSide::Deposit),
            ],
            swap_inputs: vec![
                SwapInput { coin_type: "0xa::a::A".to_string(), amount_atomic: 500 },
                SwapInput { coin_type: "0xb::b::B".to_string(), amount_atomic: 70 },
            ],
        };
        let mut tx = TransactionDraft::new();
        let inputs = append_claim_calls(&mut tx, "0xcap", &meta);
        assert_eq!(inputs.len(), 2);
        // Three claim calls plus one merge for the duplicated coin type.
        assert_eq!(tx.commands().len(), 4);
        assert!(matches!(tx.commands()[3], Command::MergeCoins { .. }));
        let a = inputs.iter().find(|input| input.coin_type == "0xa::a::A").unwrap();
        assert_eq!(a.amount_atomic, Some(500));
    }

    #[test]
    fn zero_amount_slots_append_nothing() {
        let meta = SuilendClaimMeta {
            rewards: vec![claim(0, 0, "0xa::a::A", RewardSide::Deposit)],
            swap_inputs: Vec::new(),
        };
        let mut tx = TransactionDraft::new();
        let inputs = append_claim_calls(&mut tx, "0xcap", &meta);
        assert!(inputs.is_empty());
        assert!(tx.is_empty());
    }
}

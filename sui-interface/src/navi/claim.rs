use std::collections::BTreeMap;

use async_trait::async_trait;

use common::{ClaimError, ClaimMeta, NaviClaimMeta, Protocol, RewardSummaryItem};

use crate::claim::builder::{ClaimBuilder, ClaimInput, ClaimOutcome};
use crate::tx::{CallArg, TransactionDraft};

const NAVI_PACKAGE_ID: &str =
    "0x81c408448d0d57b3e371ea94de1d40bf852784d3e225de1e74acab3e8395c18f";
const INCENTIVE_V3_ID: &str =
    "0xf87b3ae6d2c1e0e368e2fe1cd18f9d5c1f8f52e5b71e6f4e0c3b57b682ae45ab";
const STORAGE_ID: &str =
    "0xbb4e2f4b6205c2e2a2db47aeb4f830796ec7c005f88537ee775986639bc442fe";

/// One claim call per reward coin type, batching every rule for that coin
/// into a single `incentive_v3::claim_reward` invocation.
#[derive(Debug, Default)]
struct CoinClaim {
    asset_ids: Vec<u64>,
    rule_ids: Vec<String>,
    /// `None` once any rule's amount is unknown for this coin.
    amount_atomic: Option<u128>,
}

pub struct NaviClaimBuilder;

impl NaviClaimBuilder {
    pub fn new() -> Self {
        Self
    }

    fn group_by_coin(meta: &NaviClaimMeta) -> BTreeMap<String, CoinClaim> {
        let mut grouped: BTreeMap<String, CoinClaim> = BTreeMap::new();
        for reward in &meta.rewards {
            let entry = grouped.entry(reward.reward_coin_type.clone()).or_insert(CoinClaim {
                asset_ids: Vec::new(),
                rule_ids: Vec::new(),
                amount_atomic: Some(0),
            });
            entry.asset_ids.push(reward.asset_id);
            entry.rule_ids.extend(reward.rule_ids.iter().cloned());
            entry.amount_atomic = match (entry.amount_atomic, reward.amount_atomic) {
                (Some(total), Some(amount)) => Some(total + amount),
                _ => None,
            };
        }
        grouped
    }
}

impl Default for NaviClaimBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClaimBuilder for NaviClaimBuilder {
    fn protocol(&self) -> Protocol {
        Protocol::Navi
    }

    async fn append_claim(
        &self,
        tx: &mut TransactionDraft,
        _address: &str,
        summary: &RewardSummaryItem,
    ) -> Result<ClaimOutcome, ClaimError> {
        let Some(ClaimMeta::Navi(meta)) = &summary.claim_meta else {
            return Ok(ClaimOutcome::default());
        };

        let mut inputs = Vec::new();
        for (coin_type, claim) in Self::group_by_coin(meta) {
            // A total that floors to zero would be a no-op claim.
            if claim.amount_atomic == Some(0) {
                continue;
            }
            let coin = tx.move_call(
                &format!("{NAVI_PACKAGE_ID}::incentive_v3::claim_reward"),
                vec![coin_type.clone()],
                vec![
                    CallArg::Clock,
                    CallArg::Object(INCENTIVE_V3_ID.to_string()),
                    CallArg::Object(STORAGE_ID.to_string()),
                    CallArg::Pure(serde_json::json!(claim.asset_ids)),
                    CallArg::Pure(serde_json::json!(claim.rule_ids)),
                ],
            );
            inputs.push(ClaimInput { coin_type, coin, amount_atomic: claim.amount_atomic });
        }
        let has_claim = !inputs.is_empty();
        Ok(ClaimOutcome { inputs, has_claim })
    }
}

#[cfg(test)]
mod tests {
    use common::NaviRewardClaim;

    use super::*;

    fn reward(coin: &str, asset_id: u64, amount: Option<u128>) -> NaviRewardClaim {
        NaviRewardClaim {
            asset_id,
            reward_coin_type: coin.to_string(),
            reward_type: 1,
            rule_ids: vec![format!("rule-{asset_id}")],
            amount_atomic: amount,
        }
    }

    #[tokio::test]
    async fn rules_batch_per_coin_type() {
        let meta = NaviClaimMeta {
            rewards: vec![
                reward("0xa::a::A", 0, Some(100)),
                reward("0xa::a::A", 5, Some(50)),
                reward("0xb::b::B", 1, Some(7)),
            ],
        };
        let summary = RewardSummaryItem {
            protocol: Protocol::Navi,
            supplies: Vec::new(),
            rewards: Vec::new(),
            claim_meta: Some(ClaimMeta::Navi(meta)),
        };
        let mut tx = TransactionDraft::new();
        let outcome =
            NaviClaimBuilder::new().append_claim(&mut tx, "0xabc", &summary).await.unwrap();
        assert!(outcome.has_claim);
        assert_eq!(outcome.inputs.len(), 2);
        assert_eq!(tx.commands().len(), 2);
        let a = outcome.inputs.iter().find(|i| i.coin_type == "0xa::a::A").unwrap();
        assert_eq!(a.amount_atomic, Some(150));
    }

    #[tokio::test]
    async fn zero_total_is_excluded_and_unknown_is_kept() {
        let meta = NaviClaimMeta {
            rewards: vec![reward("0xa::a::A", 0, Some(0)), reward("0xb::b::B", 1, None)],
        };
        let summary = RewardSummaryItem {
            protocol: Protocol::Navi,
            supplies: Vec::new(),
            rewards: Vec::new(),
            claim_meta: Some(ClaimMeta::Navi(meta)),
        };
        let mut tx = TransactionDraft::new();
        let outcome =
            NaviClaimBuilder::new().append_claim(&mut tx, "0xabc", &summary).await.unwrap();
        assert_eq!(outcome.inputs.len(), 1);
        assert_eq!(outcome.inputs[0].coin_type, "0xb::b::B");
        assert_eq!(outcome.inputs[0].amount_atomic, None);
        assert!(!outcome.inputs[0].swap_eligible());
    }

    #[tokio::test]
    async fn no_meta_means_no_claim() {
        let summary = RewardSummaryItem::empty(Protocol::Navi);
        let mut tx = TransactionDraft::new();
        let outcome =
            NaviClaimBuilder::new().append_claim(&mut tx, "0xabc", &summary).await.unwrap();
        assert!(!outcome.has_claim);
        assert!(tx.is_empty());
    }
}

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::warn;
use serde_json::{json, Value};

use common::{
    canonical_coin_type, AlphaLendClaimMeta, Asset, ClaimError, ClaimMeta, Protocol,
    RewardSummaryItem,
};
use sui_rpc::{field, field_str, field_u128, field_u64, SuiRpcClient};

use crate::alphalend::{
    ALPHALEND_PACKAGE_ID, LENDING_PROTOCOL_ID, MARKETS_TABLE_ID, POSITION_CAP_TYPE,
    POSITION_TABLE_ID,
};
use crate::claim::builder::{ClaimBuilder, ClaimInput, ClaimOutcome};
use crate::tx::{pure_u64, CallArg, CoinHandle, TransactionDraft};

/// One reward-distributor slot attached to the user's position.
#[derive(Debug, Clone)]
struct PositionDistributor {
    market_id: u64,
    is_deposit: bool,
    last_updated: u64,
    share: u128,
    rewards: Vec<Option<UserCheckpoint>>,
}

#[derive(Debug, Clone, Copy)]
struct UserCheckpoint {
    earned: u128,
    cumulative_per_share: u128,
}

/// One reward program in a market-side distributor.
#[derive(Debug, Clone)]
struct MarketReward {
    coin_type: String,
    start_time: u64,
    end_time: u64,
    cumulative_per_share: u128,
}

fn parse_position_distributors(fields: &Value) -> Vec<PositionDistributor> {
    let Some(entries) = fields.get("reward_distributors").and_then(Value::as_array) else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| {
            let fields = field(entry, &["fields"])?;
            let rewards = fields
                .get("rewards")?
                .as_array()?
                .iter()
                .map(|slot| {
                    let fields = field(slot, &["fields"])?;
                    Some(UserCheckpoint {
                        earned: field_u128(fields, &["earned_rewards", "fields", "value"])
                            .unwrap_or(0),
                        cumulative_per_share: field_u128(
                            fields,
                            &["cummulative_rewards_per_share", "fields", "value"],
                        )
                        .unwrap_or(0),
                    })
                })
                .collect();
            Some(PositionDistributor {
                market_id: field_u64(fields, &["market_id"])?,
                is_deposit: fields.get("is_deposit").and_then(Value::as_bool).unwrap_or(false),
                last_updated: field_u64(fields, &["last_updated"]).unwrap_or(0),
                share: field_u128(fields, &["share"]).unwrap_or(0),
                rewards,
            })
        })
        .collect()
}

fn parse_market_rewards(distributor: &Value) -> Vec<MarketReward> {
    let Some(rewards) = distributor.get("rewards").and_then(Value::as_array) else {
        return Vec::new();
    };
    rewards
        .iter()
        .filter_map(|reward| {
            let fields = field(reward, &["fields"])?;
            let name = field_str(fields, &["coin_type", "fields", "name"])?;
            let coin_type =
                if name.starts_with("0x") { name.to_string() } else { format!("0x{name}") };
            Some(MarketReward {
                coin_type,
                start_time: field_u64(fields, &["start_time"]).unwrap_or(0),
                end_time: field_u64(fields, &["end_time"]).unwrap_or(0),
                cumulative_per_share: field_u128(
                    fields,
                    &["cummulative_rewards_per_share", "fields", "value"],
                )
                .unwrap_or(0),
            })
        })
        .collect()
}

/// Whether a reward program possibly owes this position anything. The precise
/// amounts come from the portfolio read during discovery; this gate only
/// decides which collect calls are worth appending.
fn possibly_claimable(
    distributor: &PositionDistributor,
    reward: &MarketReward,
    slot: Option<&UserCheckpoint>,
    now_ms: u64,
) -> bool {
    let accrual_window = reward.end_time.min(now_ms) as i128
        - reward.start_time.max(distributor.last_updated) as i128;
    if accrual_window > 0 && distributor.share > 0 {
        return true;
    }
    match slot {
        Some(checkpoint) => {
            checkpoint.earned != 0
                || (reward.cumulative_per_share > checkpoint.cumulative_per_share
                    && distributor.share > 0)
        }
        None => distributor.share > 0 && reward.cumulative_per_share > 0,
    }
}

/// Builds AlphaLend claims: `collect_reward` per (market, coin type), with
/// the returned promise settled through `fulfill_promise` (or the SUI
/// variant, which needs the system state object).
pub struct AlphaLendClaimBuilder {
    rpc: Arc<SuiRpcClient>,
}

impl AlphaLendClaimBuilder {
    pub fn new(rpc: Arc<SuiRpcClient>) -> Self {
        Self { rpc }
    }

    /// Returns (cap object id, position id the cap points at).
    async fn find_position_cap(&self, address: &str) -> Result<(String, String), ClaimError> {
        let caps = self
            .rpc
            .get_owned_objects(address, POSITION_CAP_TYPE)
            .await
            .map_err(|e| ClaimError::Rpc(e.to_string()))?;
        caps.first()
            .and_then(|cap| {
                let position_id = field_str(cap.fields()?, &["position_id"])?;
                Some((cap.object_id.clone(), position_id.to_string()))
            })
            .ok_or_else(|| ClaimError::MissingCapability("AlphaLend position cap".to_string()))
    }

    /// The reward coin types per market worth collecting, from the position's
    /// distributor checkpoints against each market's distributor state.
    async fn scan_claimable_coin_types(
        &self,
        position_id: &str,
    ) -> Result<BTreeMap<u64, BTreeSet<String>>, ClaimError> {
        let position = self
            .rpc
            .get_dynamic_field_object(POSITION_TABLE_ID, "0x2::object::ID", json!(position_id))
            .await
            .map_err(|e| ClaimError::Rpc(e.to_string()))?;
        let distributors = position
            .fields()
            .and_then(|fields| field(fields, &["value", "fields"]))
            .map(parse_position_distributors)
            .unwrap_or_default();

        let now_ms = Utc::now().timestamp_millis() as u64;
        let mut by_market: BTreeMap<u64, BTreeSet<String>> = BTreeMap::new();
        for distributor in &distributors {
            let market = match self
                .rpc
                .get_dynamic_field_object(
                    MARKETS_TABLE_ID,
                    "u64",
                    json!(distributor.market_id.to_string()),
                )
                .await
            {
                Ok(market) => market,
                Err(e) => {
                    warn!("AlphaLend market {} read failed: {}", distributor.market_id, e);
                    continue;
                }
            };
            let side_key = if distributor.is_deposit {
                "deposit_reward_distributor"
            } else {
                "borrow_reward_distributor"
            };
            let rewards = market
                .fields()
                .and_then(|fields| field(fields, &["value", "fields", side_key, "fields"]))
                .map(parse_market_rewards)
                .unwrap_or_default();
            let coin_types = by_market.entry(distributor.market_id).or_default();
            for (index, reward) in rewards.iter().enumerate() {
                let slot = distributor.rewards.get(index).and_then(Option::as_ref);
                if possibly_claimable(distributor, reward, slot, now_ms) {
                    coin_types.insert(reward.coin_type.clone());
                }
            }
        }
        by_market.retain(|_, coin_types| !coin_types.is_empty());
        Ok(by_market)
    }
}

fn is_sui(coin_type: &str) -> bool {
    coin_type == "0x2::sui::SUI" || coin_type == canonical_coin_type(Asset::Sui)
}

#[async_trait]
impl ClaimBuilder for AlphaLendClaimBuilder {
    fn protocol(&self) -> Protocol {
        Protocol::AlphaLend
    }

    async fn append_claim(
        &self,
        tx: &mut TransactionDraft,
        address: &str,
        summary: &RewardSummaryItem,
    ) -> Result<ClaimOutcome, ClaimError> {
        let Some(ClaimMeta::AlphaLend(meta)) = &summary.claim_meta else {
            return Ok(ClaimOutcome::default());
        };
        let AlphaLendClaimMeta { claimables } = meta;
        let amounts: BTreeMap<&str, u128> = claimables
            .iter()
            .map(|input| (input.coin_type.as_str(), input.amount_atomic))
            .collect();

        let (cap_id, position_id) = self.find_position_cap(address).await?;

        let mut coins_by_type: BTreeMap<String, Vec<CoinHandle>> = BTreeMap::new();
        for (market_id, coin_types) in self.scan_claimable_coin_types(&position_id).await? {
            for coin_type in coin_types {
                // Known-zero totals never get a collect call.
                if amounts.get(coin_type.as_str()).copied() == Some(0) {
                    continue;
                }
                let results = tx.move_call_multi(
                    &format!("{ALPHALEND_PACKAGE_ID}::alpha_lending::collect_reward"),
                    vec![coin_type.clone()],
                    vec![
                        CallArg::Object(LENDING_PROTOCOL_ID.to_string()),
                        pure_u64(market_id),
                        CallArg::Object(cap_id.clone()),
                        CallArg::Clock,
                    ],
                    2,
                );
                let (coin, promise) = (results[0], results[1]);
                let fulfilled = if is_sui(&coin_type) {
                    tx.move_call(
                        &format!("{ALPHALEND_PACKAGE_ID}::alpha_lending::fulfill_promise_SUI"),
                        vec![],
                        vec![
                            CallArg::Object(LENDING_PROTOCOL_ID.to_string()),
                            CallArg::Result(promise),
                            CallArg::SystemState,
                            CallArg::Clock,
                        ],
                    )
                } else {
                    tx.move_call(
                        &format!("{ALPHALEND_PACKAGE_ID}::alpha_lending::fulfill_promise"),
                        vec![coin_type.clone()],
                        vec![
                            CallArg::Object(LENDING_PROTOCOL_ID.to_string()),
                            CallArg::Result(promise),
                            CallArg::Clock,
                        ],
                    )
                };
                coins_by_type.entry(coin_type).or_default().extend([coin, fulfilled]);
            }
        }

        let mut inputs = Vec::new();
        for (coin_type, coins) in coins_by_type {
            let Some(coin) = tx.merge_into_first(coins) else { continue };
            let amount_atomic = amounts.get(coin_type.as_str()).copied();
            inputs.push(ClaimInput { coin_type, coin, amount_atomic });
        }
        let has_claim = !inputs.is_empty();
        Ok(ClaimOutcome { inputs, has_claim })
    }
}

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use log::warn;

use common::{ClaimError, ClaimMeta, Protocol, RewardSummaryItem, ScallopClaimMeta};
use sui_rpc::{DecimalsCache, SuiRpcClient};

use crate::claim::builder::{resolve_atomic, reward_amount_map, ClaimBuilder, ClaimInput, ClaimOutcome};
use crate::tx::{CallArg, CoinHandle, TransactionDraft};

const SPOOL_PACKAGE_ID: &str =
    "0xe87f1b2d498106a2c61421cec75b7b5c5e348512b0dc263949a0e7a3c256571a";
const SPOOL_OBJECT_ID: &str =
    "0x6e641f0dca8aedab3101d047e96439178f16301bf0b57fe8745086ff14839eb6";
const BORROW_INCENTIVE_PACKAGE_ID: &str =
    "0xc63072e7f5f4983a2efaf5bdba1480d5e7d74d57948e1c7cc436f8e22cbeb410";
const INCENTIVE_CONFIG_ID: &str =
    "0x3d8e2dbb6e2b7a9b6a3fcf45b32e2c61f7f1f4e5ec7bbf67a0b4b5f2cafe70a1";
const INCENTIVE_POOLS_ID: &str =
    "0x0c2f9f70ad6c9a4ba41d17a2d4e4a39b9a11e3b61c0ab9b92a5f4a2e67a6b5c3";
const SCA_COIN_TYPE: &str =
    "0x7016aae72cfc67f2fadf55769c0a7dd54291a583b63051a5ed71081cce836ac6::sca::SCA";

/// Spool registry: spool name, staking pool object and the spool account's
/// stake coin type (matched against owned SpoolAccount type arguments).
const SPOOL_REGISTRY: &[(&str, &str, &str)] = &[
    (
        "ssui",
        "0x4f0ba970d3c11db05c8f40c64a15b6a33322db3702d634ced6536960ab6f3ee4",
        "0x2::sui::SUI",
    ),
    (
        "susdc",
        "0x4ace6648ddc44e646945b78a2d1a6a2b5e2b8a5e0ba65b6c7d743bb4c5a8a47c",
        "0xdba34672e30cb065b1f93e3ab55318768fd6fef66c15942c9f7cb846e2f900e7::usdc::USDC",
    ),
    (
        "susdt",
        "0xcb328f7ffa7f9342ed85af3fdb2f22919e1a06dfb2f713c04c73543870d7548f",
        "0xc060006111016b8a020ad5b33834984a437aaa7d3c74c18e09a95d48aceab08c::coin::COIN",
    ),
];

/// Builds Scallop claims: spool staking rewards via `redeem_rewards` and
/// borrow incentives via `redeem_rewards_v2`, one call per discovered claim.
pub struct ScallopClaimBuilder {
    rpc: Arc<SuiRpcClient>,
    decimals: DecimalsCache,
}

impl ScallopClaimBuilder {
    pub fn new(rpc: Arc<SuiRpcClient>, decimals: DecimalsCache) -> Self {
        Self { rpc, decimals }
    }

    /// Owned spool accounts for the staked spools named in the claim meta.
    /// A staked spool without a matching account is skipped with a warning;
    /// there is nothing to redeem through.
    async fn find_spool_accounts(
        &self,
        address: &str,
        staked_spools: &[String],
    ) -> Result<Vec<(&'static str, String)>, ClaimError> {
        let account_type = format!("{SPOOL_PACKAGE_ID}::spool_account::SpoolAccount");
        let owned = self
            .rpc
            .get_owned_objects(address, &account_type)
            .await
            .map_err(|e| ClaimError::Rpc(e.to_string()))?;
        let mut accounts = Vec::new();
        for spool_name in staked_spools {
            let Some(&(_, pool_id, stake_type)) =
                SPOOL_REGISTRY.iter().find(|entry| entry.0 == spool_name.as_str())
            else {
                warn!("Unknown Scallop spool {}", spool_name);
                continue;
            };
            let account = owned.iter().find(|object| {
                object.object_type.as_deref().is_some_and(|t| t.contains(stake_type))
            });
            match account {
                Some(account) => accounts.push((pool_id, account.object_id.clone())),
                None => warn!("No spool account found for {}", spool_name),
            }
        }
        Ok(accounts)
    }

    /// Atomic claimable amount per reward coin type. `Some(None)` entries
    /// mean decimals are unresolved; missing entries mean no reported amount.
    async fn resolve_amounts(
        &self,
        summary: &RewardSummaryItem,
    ) -> BTreeMap<String, Option<u128>> {
        let mut amounts = BTreeMap::new();
        for (coin_type, amount) in reward_amount_map(&summary.rewards) {
            let atomic = resolve_atomic(&self.decimals, &coin_type, amount).await;
            amounts.insert(coin_type, atomic);
        }
        amounts
    }
}

#[async_trait]
impl ClaimBuilder for ScallopClaimBuilder {
    fn protocol(&self) -> Protocol {
        Protocol::Scallop
    }

    async fn append_claim(
        &self,
        tx: &mut TransactionDraft,
        address: &str,
        summary: &RewardSummaryItem,
    ) -> Result<ClaimOutcome, ClaimError> {
        let Some(ClaimMeta::Scallop(meta)) = &summary.claim_meta else {
            return Ok(ClaimOutcome::default());
        };
        let ScallopClaimMeta { staked_spools, borrow_incentives } = meta;

        // Amounts are resolved before any instruction is appended so a
        // floored-to-zero reward produces no claim call at all.
        let amounts = self.resolve_amounts(summary).await;
        let claimable = |coin_type: &str| amounts.get(coin_type).copied() != Some(Some(0));

        let mut coins_by_type: BTreeMap<String, Vec<CoinHandle>> = BTreeMap::new();

        if claimable(SCA_COIN_TYPE) {
            for (pool_id, account_id) in self.find_spool_accounts(address, staked_spools).await? {
                let coin = tx.move_call(
                    &format!("{SPOOL_PACKAGE_ID}::user::redeem_rewards"),
                    vec![SCA_COIN_TYPE.to_string()],
                    vec![
                        CallArg::Object(SPOOL_OBJECT_ID.to_string()),
                        CallArg::Object(pool_id.to_string()),
                        CallArg::Object(account_id),
                        CallArg::Clock,
                    ],
                );
                coins_by_type.entry(SCA_COIN_TYPE.to_string()).or_default().push(coin);
            }
        }

        for incentive in borrow_incentives {
            if !claimable(&incentive.reward_coin_type) {
                continue;
            }
            let coin = tx.move_call(
                &format!("{BORROW_INCENTIVE_PACKAGE_ID}::user::redeem_rewards_v2"),
                vec![incentive.reward_coin_type.clone()],
                vec![
                    CallArg::Object(INCENTIVE_CONFIG_ID.to_string()),
                    CallArg::Object(INCENTIVE_POOLS_ID.to_string()),
                    CallArg::Object(incentive.obligation_id.clone()),
                    CallArg::Object(incentive.obligation_key_id.clone()),
                    CallArg::Clock,
                ],
            );
            coins_by_type.entry(incentive.reward_coin_type.clone()).or_default().push(coin);
        }

        let mut inputs = Vec::new();
        for (coin_type, coins) in coins_by_type {
            let Some(coin) = tx.merge_into_first(coins) else { continue };
            let amount_atomic = amounts.get(&coin_type).copied().flatten();
            inputs.push(ClaimInput { coin_type, coin, amount_atomic });
        }
        let has_claim = !inputs.is_empty();
        Ok(ClaimOutcome { inputs, has_claim })
    }
}

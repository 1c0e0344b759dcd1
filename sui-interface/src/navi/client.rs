use std::collections::BTreeMap;

use async_trait::async_trait;
use log::{info, warn};

use common::{
    asset_from_source, canonical_coin_type, format_token_symbol, pad_address, to_atomic, Asset,
    ClaimMeta,
    FetchError, IncentiveBreakdown, MarketRow, NaviClaimMeta, NaviRewardClaim, Protocol,
    RewardAmount, RewardSummaryItem, WalletPositions,
};
use sui_rpc::DecimalsCache;

use crate::adapters::{variant_outranks, MarketAdapter, UserAdapter, UserFetch, VariantRank};
use crate::navi::models::{AvailableReward, LendingState, Pool, PoolsResponse};

/// Raw Navi rates are per-second ray values; dividing by 1e25 yields percent.
const RAW_RATE_DIVISOR: f64 = 1e25;

#[derive(Debug, Clone)]
pub struct NaviClient {
    http: reqwest::Client,
    api_url: String,
    decimals: DecimalsCache,
}

impl NaviClient {
    pub fn new(api_url: &str, decimals: DecimalsCache) -> Self {
        Self { http: reqwest::Client::new(), api_url: api_url.to_string(), decimals }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = format!("{}{}", self.api_url, path);
        let response =
            self.http.get(&url).send().await.map_err(|e| FetchError::Http(e.to_string()))?;
        response.json().await.map_err(|e| FetchError::Parse(e.to_string()))
    }

    fn pool_asset(pool: &Pool) -> Option<Asset> {
        let token = pool.token.as_ref()?;
        asset_from_source(token.symbol.as_deref(), token.identifier())
    }
}

/// The boosted APR is one figure across all reward coins; split evenly so the
/// breakdown still names each token.
fn split_incentives(reward_coins: &[String], apr: f64) -> Vec<IncentiveBreakdown> {
    if reward_coins.is_empty() || apr <= 0.0 {
        return Vec::new();
    }
    let per_token = apr / reward_coins.len() as f64;
    reward_coins
        .iter()
        .map(|coin_type| IncentiveBreakdown {
            token: format_token_symbol(coin_type),
            apr: per_token,
        })
        .collect()
}

#[async_trait]
impl MarketAdapter for NaviClient {
    fn protocol(&self) -> Protocol {
        Protocol::Navi
    }

    async fn fetch_market(&self) -> Result<Vec<MarketRow>, FetchError> {
        let mut pools = self.get_json::<PoolsResponse>("/api/navi/pools").await?.data;
        pools.sort_by_key(|pool| pool.id);

        let mut selected: BTreeMap<Asset, (Pool, VariantRank)> = BTreeMap::new();
        for pool in pools {
            let Some(asset) = Self::pool_asset(&pool) else { continue };
            let preferred = canonical_coin_type(asset);
            let is_preferred = pool
                .token
                .as_ref()
                .and_then(|token| token.identifier())
                .is_some_and(|id| {
                    let address = id.split("::").next().unwrap_or(id);
                    preferred.starts_with(&pad_address(address))
                });
            // Sui-bridge variants outrank other non-canonical forms.
            let rank = VariantRank {
                is_preferred,
                has_incentive: pool.is_sui_bridge,
                apr_score: pool.current_supply_rate + pool.current_borrow_rate,
            };
            match selected.get(&asset) {
                Some((_, existing)) if !variant_outranks(&rank, existing) => {}
                _ => {
                    selected.insert(asset, (pool, rank));
                }
            }
        }

        let rows = selected
            .into_iter()
            .map(|(asset, (pool, _))| {
                let supply_info = pool.supply_incentive_apy_info.clone().unwrap_or_default();
                let borrow_info = pool.borrow_incentive_apy_info.clone().unwrap_or_default();
                let supply_base = if supply_info.vault_apr > 0.0 {
                    supply_info.vault_apr
                } else {
                    pool.current_supply_rate / RAW_RATE_DIVISOR
                };
                let borrow_base = if borrow_info.vault_apr > 0.0 {
                    borrow_info.vault_apr
                } else {
                    pool.current_borrow_rate / RAW_RATE_DIVISOR
                };
                let utilization = if pool.total_supply_amount > 0.0 {
                    pool.borrowed_amount / pool.total_supply_amount * 100.0
                } else {
                    0.0
                };
                MarketRow::new(
                    Protocol::Navi,
                    asset,
                    supply_base,
                    borrow_base,
                    utilization,
                    split_incentives(&supply_info.reward_coin, supply_info.boosted_apr),
                    split_incentives(&borrow_info.reward_coin, borrow_info.boosted_apr),
                )
            })
            .collect();
        Ok(rows)
    }
}

#[async_trait]
impl UserAdapter for NaviClient {
    fn protocol(&self) -> Protocol {
        Protocol::Navi
    }

    async fn fetch_user(&self, address: Option<&str>) -> Result<UserFetch, FetchError> {
        let Some(address) = address else { return Ok(UserFetch::default()) };
        let states: Vec<LendingState> =
            self.get_json(&format!("/api/navi/user/{address}/lending-state")).await?;

        let mut positions = WalletPositions::new();
        for state in &states {
            let Some(asset) = state.pool.as_ref().and_then(Self::pool_asset) else { continue };
            positions.add(Protocol::Navi, asset, state.supply_balance);
        }

        let mut summary = RewardSummaryItem {
            protocol: Protocol::Navi,
            supplies: positions.supply_list(Protocol::Navi),
            rewards: Vec::new(),
            claim_meta: None,
        };

        // Reward read is separable: a failure keeps the positions usable.
        match self.get_json::<Vec<AvailableReward>>(
            &format!("/api/navi/user/{address}/available-rewards"),
        )
        .await
        {
            Ok(rewards) => {
                let (amounts, meta) = self.collect_rewards(rewards).await;
                summary.rewards = amounts;
                if !meta.rewards.is_empty() {
                    summary.claim_meta = Some(ClaimMeta::Navi(meta));
                }
            }
            Err(e) => warn!("Navi reward fetch failed: {}", e),
        }

        info!("Navi state for {}: {} positions", address, positions.len());
        Ok(UserFetch { positions, reward_summary: Some(summary) })
    }
}

impl NaviClient {
    async fn collect_rewards(
        &self,
        rewards: Vec<AvailableReward>,
    ) -> (Vec<RewardAmount>, NaviClaimMeta) {
        let mut totals: BTreeMap<String, f64> = BTreeMap::new();
        let mut meta = NaviClaimMeta::default();
        for reward in rewards {
            if reward.user_claimable_reward <= 0.0 || reward.reward_coin_type.is_empty() {
                continue;
            }
            *totals.entry(reward.reward_coin_type.clone()).or_default() +=
                reward.user_claimable_reward;

            // The payload sometimes carries decimals; seed the shared cache
            // so atomic conversion needs no extra metadata read.
            if let Some(decimals) = reward.coin_decimals {
                self.decimals.insert(&reward.reward_coin_type, decimals);
            }
            let amount_atomic = match self.decimals.resolve(&reward.reward_coin_type).await {
                Some(decimals) => to_atomic(reward.user_claimable_reward, decimals),
                None => None,
            };
            meta.rewards.push(NaviRewardClaim {
                asset_id: reward.asset_id,
                reward_coin_type: reward.reward_coin_type,
                reward_type: reward.reward_type,
                rule_ids: reward.rule_ids,
                amount_atomic,
            });
        }
        let amounts = totals
            .into_iter()
            .map(|(coin_type, amount)| RewardAmount {
                token: format_token_symbol(&coin_type),
                amount,
                coin_type: Some(coin_type),
            })
            .collect();
        (amounts, meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incentive_apr_splits_evenly_per_reward_coin() {
        let coins = vec!["0xa::a::A".to_string(), "0xb::b::B".to_string()];
        let breakdown = split_incentives(&coins, 4.0);
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].apr, 2.0);
        assert_eq!(breakdown[0].token, "A");
    }

    #[test]
    fn zero_apr_has_no_breakdown() {
        let coins = vec!["0xa::a::A".to_string()];
        assert!(split_incentives(&coins, 0.0).is_empty());
        assert!(split_incentives(&[], 5.0).is_empty());
    }
}

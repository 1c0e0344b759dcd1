use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use log::{info, warn};

use common::{
    asset_from_source, canonical_coin_type, format_token_symbol, Asset, ClaimMeta, FetchError,
    IncentiveBreakdown, MarketRow, Protocol, RewardAmount, RewardSummaryItem,
    ScallopBorrowIncentiveClaim, ScallopClaimMeta, WalletPositions,
};

use crate::adapters::{variant_outranks, MarketAdapter, UserAdapter, UserFetch, VariantRank};
use crate::scallop::models::{
    BorrowIncentiveEntry, MarketPool, MarketResponse, Portfolio, Spool,
};

/// Scallop indexer client: market-wide pools, spool incentives and the user
/// portfolio all come from the indexer REST API.
#[derive(Debug, Clone)]
pub struct ScallopClient {
    http: reqwest::Client,
    api_url: String,
}

impl ScallopClient {
    pub fn new(api_url: &str) -> Self {
        Self { http: reqwest::Client::new(), api_url: api_url.to_string() }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = format!("{}{}", self.api_url, path);
        let response =
            self.http.get(&url).send().await.map_err(|e| FetchError::Http(e.to_string()))?;
        response.json().await.map_err(|e| FetchError::Parse(e.to_string()))
    }

    /// Borrow-side incentive APRs keyed by pool coin name. Absorbed on
    /// failure; the market still renders without incentive columns.
    async fn fetch_borrow_incentives(&self) -> HashMap<String, Vec<IncentiveBreakdown>> {
        let entries: Vec<BorrowIncentiveEntry> =
            match self.get_json("/api/borrowIncentivePools/migrate").await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Scallop borrow incentive fetch failed: {}", e);
                    return HashMap::new();
                }
            };
        let mut incentives = HashMap::new();
        for entry in entries {
            let Some(pool) = entry.pool else { continue };
            let Some(coin_name) = pool.coin_name else { continue };
            let rewards: Vec<IncentiveBreakdown> = pool
                .rewards
                .into_iter()
                .filter(|reward| reward.reward_apr > 0.0)
                .filter_map(|reward| {
                    let token = reward
                        .symbol
                        .or_else(|| reward.coin_type.as_deref().map(format_token_symbol))?;
                    Some(IncentiveBreakdown { token, apr: reward.reward_apr * 100.0 })
                })
                .collect();
            if !rewards.is_empty() {
                incentives.insert(coin_name, rewards);
            }
        }
        incentives
    }

    fn pool_asset(pool: &MarketPool) -> Option<Asset> {
        let coin_type = pool.coin_type.as_deref().or(pool.market_coin_type.as_deref());
        asset_from_source(pool.symbol.as_deref(), coin_type)
    }
}

#[async_trait]
impl MarketAdapter for ScallopClient {
    fn protocol(&self) -> Protocol {
        Protocol::Scallop
    }

    async fn fetch_market(&self) -> Result<Vec<MarketRow>, FetchError> {
        let market: MarketResponse = self.get_json("/api/market/migrate").await?;
        let spools: HashMap<String, Spool> = match self.get_json("/api/spools").await {
            Ok(spools) => spools,
            Err(e) => {
                warn!("Scallop spool fetch failed: {}", e);
                HashMap::new()
            }
        };
        let borrow_incentives = self.fetch_borrow_incentives().await;

        // Sorted fold keeps variant selection independent of map order.
        let mut pools: Vec<MarketPool> = market.pools.into_values().collect();
        pools.sort_by(|a, b| a.coin_name.cmp(&b.coin_name));

        let mut selected: BTreeMap<Asset, (MarketPool, VariantRank)> = BTreeMap::new();
        for pool in pools {
            let Some(asset) = Self::pool_asset(&pool) else { continue };
            let rank = VariantRank {
                is_preferred: pool.coin_type.as_deref()
                    == Some(canonical_coin_type(asset).as_str()),
                has_incentive: borrow_incentives.contains_key(&pool.coin_name),
                apr_score: pool.supply_apr + pool.borrow_apr,
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
                let spool = pool
                    .market_coin_type
                    .as_deref()
                    .and_then(|key| spools.get(key))
                    .or_else(|| spools.get(&pool.coin_name));
                let supply_breakdown = spool
                    .filter(|spool| spool.reward_apr > 0.0)
                    .and_then(|spool| {
                        let token = format_token_symbol(spool.reward_coin_type.as_deref()?);
                        Some(vec![IncentiveBreakdown { token, apr: spool.reward_apr * 100.0 }])
                    })
                    .unwrap_or_default();
                let borrow_breakdown =
                    borrow_incentives.get(&pool.coin_name).cloned().unwrap_or_default();
                MarketRow::new(
                    Protocol::Scallop,
                    asset,
                    pool.supply_apr * 100.0,
                    pool.borrow_apr * 100.0,
                    pool.utilization_rate * 100.0,
                    supply_breakdown,
                    borrow_breakdown,
                )
            })
            .collect();
        Ok(rows)
    }
}

#[async_trait]
impl UserAdapter for ScallopClient {
    fn protocol(&self) -> Protocol {
        Protocol::Scallop
    }

    async fn fetch_user(&self, address: Option<&str>) -> Result<UserFetch, FetchError> {
        let Some(address) = address else { return Ok(UserFetch::default()) };
        let portfolio: Portfolio =
            self.get_json(&format!("/api/users/portfolio?address={address}")).await?;

        let mut positions = WalletPositions::new();
        for lending in &portfolio.lendings {
            let Some(asset) = asset_from_source(lending.symbol.as_deref(), lending.coin_type.as_deref())
            else {
                continue;
            };
            positions.add(Protocol::Scallop, asset, lending.supplied_coin);
        }

        // Rewards are keyed by coin type so spool SCA and borrow-incentive
        // SCA collapse into one display line.
        let mut reward_totals: BTreeMap<String, RewardAmount> = BTreeMap::new();
        let mut claim_meta = ScallopClaimMeta::default();
        if let Some(pending) = &portfolio.pending_rewards {
            for reward in &pending.lendings {
                if reward.pending_reward_in_coin <= 0.0 {
                    continue;
                }
                accumulate_reward(
                    &mut reward_totals,
                    reward.symbol.as_deref(),
                    reward.coin_type.as_deref(),
                    reward.pending_reward_in_coin,
                );
                if let Some(spool) = &reward.spool_name {
                    if !claim_meta.staked_spools.contains(spool) {
                        claim_meta.staked_spools.push(spool.clone());
                    }
                }
            }
            for reward in &pending.borrow_incentives {
                if reward.pending_reward_in_coin <= 0.0 {
                    continue;
                }
                accumulate_reward(
                    &mut reward_totals,
                    reward.symbol.as_deref(),
                    reward.coin_type.as_deref(),
                    reward.pending_reward_in_coin,
                );
                if let (Some(obligation_id), Some(obligation_key_id), Some(coin_name), Some(coin_type)) = (
                    reward.obligation_id.clone(),
                    reward.obligation_key_id.clone(),
                    reward.coin_name.clone(),
                    reward.coin_type.clone(),
                ) {
                    claim_meta.borrow_incentives.push(ScallopBorrowIncentiveClaim {
                        obligation_id,
                        obligation_key_id,
                        coin_name,
                        reward_coin_type: coin_type,
                    });
                }
            }
        }

        let rewards: Vec<RewardAmount> = reward_totals.into_values().collect();
        info!("Scallop portfolio for {}: {} rewards", address, rewards.len());
        let has_meta =
            !claim_meta.staked_spools.is_empty() || !claim_meta.borrow_incentives.is_empty();
        let reward_summary = RewardSummaryItem {
            protocol: Protocol::Scallop,
            supplies: positions.supply_list(Protocol::Scallop),
            rewards,
            claim_meta: has_meta.then_some(ClaimMeta::Scallop(claim_meta)),
        };
        Ok(UserFetch { positions, reward_summary: Some(reward_summary) })
    }
}

fn accumulate_reward(
    totals: &mut BTreeMap<String, RewardAmount>,
    symbol: Option<&str>,
    coin_type: Option<&str>,
    amount: f64,
) {
    let token = symbol
        .map(str::to_string)
        .or_else(|| coin_type.map(format_token_symbol))
        .unwrap_or_default();
    if token.is_empty() {
        return;
    }
    let key = coin_type.unwrap_or(&token).to_string();
    totals
        .entry(key)
        .and_modify(|existing| existing.amount += amount)
        .or_insert_with(|| RewardAmount {
            token,
            amount,
            coin_type: coin_type.map(str::to_string),
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewards_accumulate_per_coin_type() {
        let mut totals = BTreeMap::new();
        accumulate_reward(&mut totals, Some("SCA"), Some("0xsca::sca::SCA"), 1.5);
        accumulate_reward(&mut totals, Some("SCA"), Some("0xsca::sca::SCA"), 0.5);
        accumulate_reward(&mut totals, None, Some("0xdeep::deep::DEEP"), 3.0);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals.get("0xsca::sca::SCA").map(|r| r.amount), Some(2.0));
        assert_eq!(totals.get("0xdeep::deep::DEEP").map(|r| r.token.as_str()), Some("DEEP"));
    }

    #[test]
    fn symbolless_rewards_are_dropped() {
        let mut totals = BTreeMap::new();
        accumulate_reward(&mut totals, None, None, 5.0);
        assert!(totals.is_empty());
    }
}

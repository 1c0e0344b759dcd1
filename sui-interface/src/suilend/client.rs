use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::{info, warn};
use serde::Deserialize;

use common::{
    asset_from_source, canonical_coin_type, format_token_symbol, to_display, Asset, ClaimMeta,
    FetchError, IncentiveBreakdown, MarketRow, Protocol, RewardAmount, RewardSide,
    RewardSummaryItem, SuilendClaimMeta, SuilendRewardClaim, SwapInput, WalletPositions,
};
use sui_rpc::{field_str, DecimalsCache, SuiRpcClient};

use crate::adapters::{variant_outranks, MarketAdapter, UserAdapter, UserFetch, VariantRank};
use crate::serde_util::flexible_f64;
use crate::suilend::models::{claimable_atomic, parse_obligation, parse_reserve, Reserve};
use crate::suilend::{LENDING_MARKET_ID, LENDING_MARKET_TYPE, PACKAGE_ID};

const MS_PER_YEAR: f64 = 365.25 * 24.0 * 3600.0 * 1000.0;

#[derive(Debug, Deserialize)]
struct PricesResponse {
    #[serde(default)]
    prices: Vec<PriceEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceEntry {
    coin_type: String,
    #[serde(default, deserialize_with = "flexible_f64")]
    price: f64,
}

/// Suilend reads come straight from the chain: the lending market object
/// holds every reserve, obligations hang off owner caps. Only reward pricing
/// uses the HTTP API.
#[derive(Debug, Clone)]
pub struct SuilendClient {
    rpc: Arc<SuiRpcClient>,
    http: reqwest::Client,
    api_url: String,
    decimals: DecimalsCache,
}

impl SuilendClient {
    pub fn new(rpc: Arc<SuiRpcClient>, api_url: &str, decimals: DecimalsCache) -> Self {
        Self { rpc, http: reqwest::Client::new(), api_url: api_url.to_string(), decimals }
    }

    async fn load_reserves(&self) -> Result<Vec<Reserve>, FetchError> {
        let market = self.rpc.get_object(LENDING_MARKET_ID).await.map_err(FetchError::from)?;
        let reserves = market
            .fields()
            .and_then(|fields| fields.get("reserves"))
            .and_then(|reserves| reserves.as_array())
            .ok_or_else(|| FetchError::Parse("lending market has no reserves".to_string()))?;
        let parsed: Vec<Reserve> = reserves
            .iter()
            .enumerate()
            .filter_map(|(index, value)| parse_reserve(index as u64, value))
            .collect();
        for reserve in &parsed {
            self.decimals.insert(&reserve.coin_type, reserve.mint_decimals);
        }
        Ok(parsed)
    }

    /// USD prices for a set of coin types; missing entries price at zero,
    /// which suppresses the affected incentive line rather than the row.
    async fn fetch_prices(&self, coin_types: &HashSet<String>) -> HashMap<String, f64> {
        if coin_types.is_empty() {
            return HashMap::new();
        }
        let mut sorted: Vec<&str> = coin_types.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        let url = format!("{}/prices?coinTypes={}", self.api_url, sorted.join(","));
        let response: PricesResponse = match self.http.get(&url).send().await {
            Ok(response) => match response.json().await {
                Ok(body) => body,
                Err(e) => {
                    warn!("Suilend price parse failed: {}", e);
                    return HashMap::new();
                }
            },
            Err(e) => {
                warn!("Suilend price fetch failed: {}", e);
                return HashMap::new();
            }
        };
        response.prices.into_iter().map(|entry| (entry.coin_type, entry.price)).collect()
    }

    /// Annualized incentive APR lines for one reward side of a reserve.
    async fn incentive_breakdown(
        &self,
        reserve: &Reserve,
        side: RewardSide,
        prices: &HashMap<String, f64>,
        now_ms: u64,
    ) -> Vec<IncentiveBreakdown> {
        let rewards = match side {
            RewardSide::Deposit => &reserve.deposit_rewards,
            RewardSide::Borrow => &reserve.borrow_rewards,
        };
        let side_atomic = match side {
            RewardSide::Deposit => reserve.available_amount + reserve.borrowed_amount,
            RewardSide::Borrow => reserve.borrowed_amount,
        };
        let asset_price = prices.get(&reserve.coin_type).copied().unwrap_or(0.0);
        let side_value =
            to_display(side_atomic, reserve.mint_decimals) * asset_price;
        if side_value <= 0.0 {
            return Vec::new();
        }
        let mut breakdown = Vec::new();
        for reward in rewards {
            if now_ms < reward.start_time_ms || now_ms > reward.end_time_ms {
                continue;
            }
            let duration_ms = reward.end_time_ms.saturating_sub(reward.start_time_ms);
            if duration_ms == 0 {
                continue;
            }
            let Some(reward_decimals) = self.decimals.resolve(&reward.coin_type).await else {
                warn!("No decimals for reward coin {}", reward.coin_type);
                continue;
            };
            let reward_price = prices.get(&reward.coin_type).copied().unwrap_or(0.0);
            let annual_value = to_display(reward.total_rewards, reward_decimals)
                * (MS_PER_YEAR / duration_ms as f64)
                * reward_price;
            let apr = annual_value / side_value * 100.0;
            if apr.is_finite() && apr > 0.0 {
                breakdown.push(IncentiveBreakdown {
                    token: format_token_symbol(&reward.coin_type),
                    apr,
                });
            }
        }
        breakdown
    }

    /// Obligation ids owned by an address, via the owner-cap scan.
    pub async fn find_obligation_ids(&self, address: &str) -> Result<Vec<String>, FetchError> {
        let cap_type =
            format!("{PACKAGE_ID}::lending_market::ObligationOwnerCap<{LENDING_MARKET_TYPE}>");
        let caps =
            self.rpc.get_owned_objects(address, &cap_type).await.map_err(FetchError::from)?;
        Ok(caps
            .iter()
            .filter_map(|cap| {
                cap.fields().and_then(|fields| field_str(fields, &["obligation_id"]))
            })
            .map(str::to_string)
            .collect())
    }
}

#[async_trait]
impl MarketAdapter for SuilendClient {
    fn protocol(&self) -> Protocol {
        Protocol::Suilend
    }

    async fn fetch_market(&self) -> Result<Vec<MarketRow>, FetchError> {
        let reserves = self.load_reserves().await?;
        let now_ms = Utc::now().timestamp_millis() as u64;

        let mut coin_types: HashSet<String> = HashSet::new();
        for reserve in &reserves {
            coin_types.insert(reserve.coin_type.clone());
            for reward in reserve.deposit_rewards.iter().chain(&reserve.borrow_rewards) {
                coin_types.insert(reward.coin_type.clone());
            }
        }
        let prices = self.fetch_prices(&coin_types).await;

        let mut selected: BTreeMap<Asset, (Reserve, VariantRank)> = BTreeMap::new();
        for reserve in reserves {
            let Some(asset) = asset_from_source(None, Some(&reserve.coin_type)) else {
                continue;
            };
            let rank = VariantRank {
                is_preferred: reserve.coin_type == canonical_coin_type(asset),
                has_incentive: !reserve.deposit_rewards.is_empty()
                    || !reserve.borrow_rewards.is_empty(),
                apr_score: reserve.supply_apr_percent() + reserve.borrow_apr_percent(),
            };
            match selected.get(&asset) {
                Some((_, existing)) if !variant_outranks(&rank, existing) => {}
                _ => {
                    selected.insert(asset, (reserve, rank));
                }
            }
        }

        let mut rows = Vec::new();
        for (asset, (reserve, _)) in selected {
            let supply_breakdown =
                self.incentive_breakdown(&reserve, RewardSide::Deposit, &prices, now_ms).await;
            let borrow_breakdown =
                self.incentive_breakdown(&reserve, RewardSide::Borrow, &prices, now_ms).await;
            rows.push(MarketRow::new(
                Protocol::Suilend,
                asset,
                reserve.supply_apr_percent(),
                reserve.borrow_apr_percent(),
                reserve.utilization_percent(),
                supply_breakdown,
                borrow_breakdown,
            ));
        }
        Ok(rows)
    }
}

#[async_trait]
impl UserAdapter for SuilendClient {
    fn protocol(&self) -> Protocol {
        Protocol::Suilend
    }

    async fn fetch_user(&self, address: Option<&str>) -> Result<UserFetch, FetchError> {
        let Some(address) = address else { return Ok(UserFetch::default()) };
        let reserves = self.load_reserves().await?;
        let by_coin_type: HashMap<&str, &Reserve> =
            reserves.iter().map(|reserve| (reserve.coin_type.as_str(), reserve)).collect();
        // Manager id -> (reserve, side) lets user bookkeeping find its pool.
        let mut by_manager: HashMap<&str, (&Reserve, RewardSide)> = HashMap::new();
        for reserve in &reserves {
            by_manager.insert(reserve.deposit_manager_id.as_str(), (reserve, RewardSide::Deposit));
            by_manager.insert(reserve.borrow_manager_id.as_str(), (reserve, RewardSide::Borrow));
        }

        let mut positions = WalletPositions::new();
        let mut atomic_totals: BTreeMap<String, u128> = BTreeMap::new();
        let mut claims: Vec<SuilendRewardClaim> = Vec::new();
        let mut claim_keys: HashSet<(u64, u64, String, RewardSide)> = HashSet::new();

        for obligation_id in self.find_obligation_ids(address).await? {
            let object =
                self.rpc.get_object(&obligation_id).await.map_err(FetchError::from)?;
            let Some(obligation) = object
                .fields()
                .and_then(|fields| parse_obligation(&obligation_id, fields))
            else {
                warn!("Malformed obligation {}", obligation_id);
                continue;
            };

            for deposit in &obligation.deposits {
                let Some(reserve) = by_coin_type.get(deposit.coin_type.as_str()) else {
                    continue;
                };
                let Some(asset) = asset_from_source(None, Some(&deposit.coin_type)) else {
                    continue;
                };
                let amount = to_display(deposit.ctoken_amount, reserve.mint_decimals)
                    * reserve.ctoken_ratio();
                positions.add(Protocol::Suilend, asset, amount);
            }

            for manager in &obligation.user_reward_managers {
                let Some(&(reserve, side)) =
                    by_manager.get(manager.pool_reward_manager_id.as_str())
                else {
                    continue;
                };
                let pool_rewards = match side {
                    RewardSide::Deposit => &reserve.deposit_rewards,
                    RewardSide::Borrow => &reserve.borrow_rewards,
                };
                for pool_reward in pool_rewards {
                    let user_reward = manager
                        .rewards
                        .get(pool_reward.reward_index as usize)
                        .and_then(|slot| slot.as_ref());
                    let Some(user_reward) = user_reward else { continue };
                    let claimable = claimable_atomic(
                        user_reward,
                        manager.share,
                        pool_reward.cumulative_rewards_per_share,
                    );
                    if claimable == 0 {
                        continue;
                    }
                    *atomic_totals.entry(pool_reward.coin_type.clone()).or_default() +=
                        claimable;
                    let key = (
                        reserve.array_index,
                        pool_reward.reward_index,
                        pool_reward.coin_type.clone(),
                        side,
                    );
                    if claim_keys.insert(key) {
                        claims.push(SuilendRewardClaim {
                            reserve_array_index: reserve.array_index,
                            reward_index: pool_reward.reward_index,
                            reward_coin_type: pool_reward.coin_type.clone(),
                            side,
                        });
                    }
                }
            }
        }

        let mut rewards = Vec::new();
        for (coin_type, atomic) in &atomic_totals {
            // Display amounts only at true precision; unresolved decimals
            // keep the atomic truth in the claim meta and defer display.
            let Some(decimals) = self.decimals.resolve(coin_type).await else { continue };
            rewards.push(RewardAmount {
                token: format_token_symbol(coin_type),
                amount: to_display(*atomic, decimals),
                coin_type: Some(coin_type.clone()),
            });
        }

        let swap_inputs: Vec<SwapInput> = atomic_totals
            .into_iter()
            .filter(|(_, amount)| *amount > 0)
            .map(|(coin_type, amount_atomic)| SwapInput { coin_type, amount_atomic })
            .collect();

        info!("Suilend obligations for {}: {} claims", address, claims.len());
        let summary = RewardSummaryItem {
            protocol: Protocol::Suilend,
            supplies: positions.supply_list(Protocol::Suilend),
            rewards,
            claim_meta: (!claims.is_empty()).then_some(ClaimMeta::Suilend(SuilendClaimMeta {
                rewards: claims,
                swap_inputs,
            })),
        };
        Ok(UserFetch { positions, reward_summary: Some(summary) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obligation_id_is_read_from_cap_fields() {
        let cap = sui_rpc::SuiObjectData {
            object_id: "0xcap".to_string(),
            object_type: None,
            content: Some(serde_json::json!({
                "fields": { "obligation_id": "0xobl" }
            })),
        };
        let id = cap.fields().and_then(|fields| field_str(fields, &["obligation_id"]));
        assert_eq!(id, Some("0xobl"));
    }
}

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use log::{info, warn};
use serde_json::Value;

use common::{
    asset_from_source, format_token_symbol, to_atomic, AlphaLendClaimMeta, ClaimMeta, FetchError,
    IncentiveBreakdown, MarketRow, Protocol, RewardAmount, RewardSummaryItem, SwapInput,
    WalletPositions,
};
use sui_rpc::DecimalsCache;

use crate::adapters::{MarketAdapter, UserAdapter, UserFetch};
use crate::alphalend::models::{AprInfo, Market, PortfolioEntry};

#[derive(Debug, Clone)]
pub struct AlphaLendClient {
    http: reqwest::Client,
    api_url: String,
    decimals: DecimalsCache,
}

impl AlphaLendClient {
    pub fn new(api_url: &str, decimals: DecimalsCache) -> Self {
        Self { http: reqwest::Client::new(), api_url: api_url.to_string(), decimals }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = format!("{}{}", self.api_url, path);
        let response =
            self.http.get(&url).send().await.map_err(|e| FetchError::Http(e.to_string()))?;
        response.json().await.map_err(|e| FetchError::Parse(e.to_string()))
    }

    async fn load_markets(&self) -> Result<Vec<Market>, FetchError> {
        self.get_json("/api/public/markets").await
    }
}

fn breakdown_from(info: &AprInfo) -> Vec<IncentiveBreakdown> {
    info.rewards
        .iter()
        .filter(|reward| reward.reward_apr > 0.0)
        .filter_map(|reward| {
            Some(IncentiveBreakdown {
                token: format_token_symbol(reward.coin_type.as_deref()?),
                apr: reward.reward_apr,
            })
        })
        .collect()
}

fn value_to_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

#[async_trait]
impl MarketAdapter for AlphaLendClient {
    fn protocol(&self) -> Protocol {
        Protocol::AlphaLend
    }

    async fn fetch_market(&self) -> Result<Vec<MarketRow>, FetchError> {
        let markets = self.load_markets().await?;
        let rows = markets
            .iter()
            .filter_map(|market| {
                let asset = asset_from_source(None, market.coin_type.as_deref())?;
                let supply = market.supply_apr.clone().unwrap_or_default();
                let borrow = market.borrow_apr.clone().unwrap_or_default();
                Some(MarketRow::new(
                    Protocol::AlphaLend,
                    asset,
                    supply.interest_apr,
                    borrow.interest_apr,
                    market.utilization_rate * 100.0,
                    breakdown_from(&supply),
                    breakdown_from(&borrow),
                ))
            })
            .collect();
        Ok(rows)
    }
}

#[async_trait]
impl UserAdapter for AlphaLendClient {
    fn protocol(&self) -> Protocol {
        Protocol::AlphaLend
    }

    async fn fetch_user(&self, address: Option<&str>) -> Result<UserFetch, FetchError> {
        let Some(address) = address else { return Ok(UserFetch::default()) };
        let markets = self.load_markets().await?;
        let coin_type_by_market: HashMap<String, &str> = markets
            .iter()
            .filter_map(|market| {
                Some((market.market_id.to_string(), market.coin_type.as_deref()?))
            })
            .collect();

        let portfolios: Vec<PortfolioEntry> =
            self.get_json(&format!("/api/public/portfolio/{address}")).await?;

        let mut positions = WalletPositions::new();
        let mut totals: BTreeMap<String, f64> = BTreeMap::new();
        for portfolio in &portfolios {
            for (market_id, amount) in &portfolio.supplied_amounts {
                let Some(coin_type) = coin_type_by_market.get(market_id) else { continue };
                let Some(asset) = asset_from_source(None, Some(coin_type)) else { continue };
                positions.add(Protocol::AlphaLend, asset, value_to_f64(amount));
            }
            for reward in &portfolio.rewards_to_claim {
                if reward.reward_amount > 0.0 && !reward.coin_type.is_empty() {
                    *totals.entry(reward.coin_type.clone()).or_default() += reward.reward_amount;
                }
            }
        }

        // Atomic totals for the claim meta; coins with unresolved decimals
        // stay out of the swap set but are still claimed by the builder.
        let mut claimables = Vec::new();
        for (coin_type, amount) in &totals {
            match self.decimals.resolve(coin_type).await {
                Some(decimals) => {
                    if let Some(amount_atomic) = to_atomic(*amount, decimals) {
                        if amount_atomic > 0 {
                            claimables
                                .push(SwapInput { coin_type: coin_type.clone(), amount_atomic });
                        }
                    }
                }
                None => warn!("No decimals for AlphaLend reward {}", coin_type),
            }
        }

        let rewards: Vec<RewardAmount> = totals
            .into_iter()
            .map(|(coin_type, amount)| RewardAmount {
                token: format_token_symbol(&coin_type),
                amount,
                coin_type: Some(coin_type),
            })
            .collect();

        info!("AlphaLend portfolio for {}: {} rewards", address, rewards.len());
        let has_claims = !rewards.is_empty();
        let summary = RewardSummaryItem {
            protocol: Protocol::AlphaLend,
            supplies: positions.supply_list(Protocol::AlphaLend),
            rewards,
            claim_meta: has_claims
                .then_some(ClaimMeta::AlphaLend(AlphaLendClaimMeta { claimables })),
        };
        Ok(UserFetch { positions, reward_summary: Some(summary) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breakdown_skips_zero_and_untyped_rewards() {
        let info: AprInfo = serde_json::from_value(serde_json::json!({
            "interestApr": 2.0,
            "rewards": [
                { "coinType": "0xa::alpha::ALPHA", "rewardApr": 3.5 },
                { "coinType": "0xb::b::B", "rewardApr": 0.0 },
                { "rewardApr": 1.0 },
            ],
        }))
        .unwrap();
        let breakdown = breakdown_from(&info);
        assert_eq!(breakdown.len(), 1);
        assert_eq!(breakdown[0].token, "ALPHA");
        assert_eq!(breakdown[0].apr, 3.5);
    }

    #[test]
    fn supplied_amounts_accept_strings() {
        assert_eq!(value_to_f64(&serde_json::json!("12.5")), 12.5);
        assert_eq!(value_to_f64(&serde_json::json!(3)), 3.0);
        assert_eq!(value_to_f64(&serde_json::json!(null)), 0.0);
    }
}

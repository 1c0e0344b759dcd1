//! Cetus-style HTTP router client.
//!
//! The router service computes routes off-chain; the resulting swap is
//! expressed as move calls against the aggregator package. Route shapes
//! follow the router_v3 API: amounts travel as decimal strings.

use async_trait::async_trait;
use log::warn;
use serde::Deserialize;
use serde_json::json;

use common::SwapInput;

use crate::swap::{MergedRoute, Route, RouteStep, SwapAggregator, SwapError};
use crate::tx::{pure_str, pure_u64, CallArg, CoinHandle, TransactionDraft};

const AGGREGATOR_PACKAGE_ID: &str =
    "0x11451575c775a3e633437b827ecbc1eb51a5964b0302210b28f5b89880be21a2";
const AGGREGATOR_CONFIG_ID: &str =
    "0x1b3b1d58bbd5f635fd398ad493d1f74e44b6a3dbff2b7c80594bb8af819cf4a5";

#[derive(Debug, Deserialize)]
struct RouterStepBody {
    #[serde(default)]
    from: String,
    #[serde(default)]
    target: String,
    #[serde(default)]
    provider: String,
}

#[derive(Debug, Deserialize)]
struct RouterRouteBody {
    from: String,
    target: String,
    #[serde(default)]
    amount_in: String,
    #[serde(default)]
    amount_out: String,
    #[serde(default)]
    steps: Vec<RouterStepBody>,
}

#[derive(Debug, Deserialize)]
struct RouterResponse {
    #[serde(default)]
    routes: Vec<RouterRouteBody>,
    #[serde(default)]
    total_amount_out: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn parse_route(body: RouterRouteBody) -> Route {
    Route {
        from: body.from,
        target: body.target,
        amount_in: body.amount_in.parse().unwrap_or(0),
        amount_out: body.amount_out.parse().unwrap_or(0),
        steps: body
            .steps
            .into_iter()
            .map(|step| RouteStep { from: step.from, target: step.target, provider: step.provider })
            .collect(),
    }
}

#[derive(Debug, Clone)]
pub struct CetusRouterClient {
    http: reqwest::Client,
    endpoint: String,
}

impl CetusRouterClient {
    pub fn new(endpoint: &str) -> Self {
        Self { http: reqwest::Client::new(), endpoint: endpoint.to_string() }
    }

    async fn request_routes(&self, body: serde_json::Value) -> Result<RouterResponse, SwapError> {
        let response = self
            .http
            .post(format!("{}/find_routes", self.endpoint))
            .json(&body)
            .send()
            .await
            .map_err(|e| SwapError::Http(e.to_string()))?;
        response.json().await.map_err(|e| SwapError::Http(e.to_string()))
    }
}

#[async_trait]
impl SwapAggregator for CetusRouterClient {
    async fn find_route(
        &self,
        from: &str,
        target: &str,
        amount_atomic: u128,
    ) -> Result<Option<Route>, SwapError> {
        let response = self
            .request_routes(json!({
                "target": target,
                "by_amount_in": true,
                "depth": 3,
                "froms": [{ "coin_type": from, "amount": amount_atomic.to_string() }],
            }))
            .await?;
        if let Some(error) = response.error {
            warn!("Router declined {} -> {}: {}", from, target, error);
            return Ok(None);
        }
        Ok(response.routes.into_iter().next().map(parse_route))
    }

    async fn find_merged_route(
        &self,
        target: &str,
        inputs: &[SwapInput],
    ) -> Result<Option<MergedRoute>, SwapError> {
        if inputs.is_empty() {
            return Ok(None);
        }
        let froms: Vec<_> = inputs
            .iter()
            .map(|input| {
                json!({ "coin_type": input.coin_type, "amount": input.amount_atomic.to_string() })
            })
            .collect();
        let response = self
            .request_routes(json!({
                "target": target,
                "by_amount_in": true,
                "depth": 3,
                "froms": froms,
            }))
            .await?;
        if let Some(error) = response.error {
            warn!("Merged route to {} declined: {}", target, error);
            return Ok(None);
        }
        if response.routes.is_empty() {
            return Ok(None);
        }
        let total_amount_out = response
            .total_amount_out
            .and_then(|value| value.parse().ok())
            .unwrap_or_else(|| {
                response.routes.iter().map(|r| r.amount_out.parse().unwrap_or(0u128)).sum()
            });
        Ok(Some(MergedRoute {
            target: target.to_string(),
            total_amount_out,
            routes: response.routes.into_iter().map(parse_route).collect(),
        }))
    }

    fn build_merged_swap(
        &self,
        tx: &mut TransactionDraft,
        route: &MergedRoute,
        input_coins: &[(String, CoinHandle)],
        slippage: f64,
    ) -> Result<CoinHandle, SwapError> {
        // Minimum-out guard computed off the quoted total; the router package
        // aborts the whole transaction if it cannot be met.
        let min_out = (route.total_amount_out as f64 * (1.0 - slippage)).floor() as u64;
        let mut outputs = Vec::new();
        for leg in &route.routes {
            let (_, coin) = input_coins
                .iter()
                .find(|(coin_type, _)| *coin_type == leg.from)
                .ok_or_else(|| SwapError::Unavailable(format!("no input coin for {}", leg.from)))?;
            let output = tx.move_call(
                &format!("{}::router::swap_exact_in", AGGREGATOR_PACKAGE_ID),
                vec![leg.from.clone(), leg.target.clone()],
                vec![
                    CallArg::Object(AGGREGATOR_CONFIG_ID.to_string()),
                    CallArg::Result(*coin),
                    pure_str(&leg.amount_in.to_string()),
                    CallArg::Clock,
                ],
            );
            outputs.push(output);
        }
        let merged = tx
            .merge_into_first(outputs)
            .ok_or_else(|| SwapError::Unavailable("empty route".to_string()))?;
        tx.move_call(
            &format!("{}::router::check_amount_out", AGGREGATOR_PACKAGE_ID),
            vec![route.target.clone()],
            vec![CallArg::Result(merged), pure_u64(min_out)],
        );
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merged_route_coverage() {
        let route = MergedRoute {
            target: "0xc".to_string(),
            total_amount_out: 300,
            routes: vec![
                Route {
                    from: "0xa".to_string(),
                    target: "0xc".to_string(),
                    amount_in: 100,
                    amount_out: 100,
                    steps: Vec::new(),
                },
                Route {
                    from: "0xb".to_string(),
                    target: "0xc".to_string(),
                    amount_in: 200,
                    amount_out: 200,
                    steps: Vec::new(),
                },
            ],
        };
        let covered = vec![
            SwapInput { coin_type: "0xa".to_string(), amount_atomic: 100 },
            SwapInput { coin_type: "0xb".to_string(), amount_atomic: 200 },
        ];
        assert!(route.covers(&covered));

        let uncovered = vec![SwapInput { coin_type: "0xd".to_string(), amount_atomic: 1 }];
        assert!(!route.covers(&uncovered));
    }

    #[test]
    fn build_merged_swap_consumes_every_leg() {
        let client = CetusRouterClient::new("http://localhost:1");
        let mut tx = TransactionDraft::new();
        let coin_a = tx.move_call("0x1::m::claim", vec![], vec![]);
        let coin_b = tx.move_call("0x1::m::claim", vec![], vec![]);
        let route = MergedRoute {
            target: "0xc".to_string(),
            total_amount_out: 300,
            routes: vec![
                Route {
                    from: "0xa".to_string(),
                    target: "0xc".to_string(),
                    amount_in: 100,
                    amount_out: 100,
                    steps: Vec::new(),
                },
                Route {
                    from: "0xb".to_string(),
                    target: "0xc".to_string(),
                    amount_in: 200,
                    amount_out: 200,
                    steps: Vec::new(),
                },
            ],
        };
        let inputs = vec![("0xa".to_string(), coin_a), ("0xb".to_string(), coin_b)];
        let output = client.build_merged_swap(&mut tx, &route, &inputs, 0.001).unwrap();
        assert!(output.command >= 2);
        // Two swap legs, one merge, one min-out check appended after the claims.
        assert_eq!(tx.commands().len(), 6);
    }

    #[test]
    fn build_merged_swap_requires_matching_coins() {
        let client = CetusRouterClient::new("http://localhost:1");
        let mut tx = TransactionDraft::new();
        let route = MergedRoute {
            target: "0xc".to_string(),
            total_amount_out: 100,
            routes: vec![Route {
                from: "0xa".to_string(),
                target: "0xc".to_string(),
                amount_in: 100,
                amount_out: 100,
                steps: Vec::new(),
            }],
        };
        let result = client.build_merged_swap(&mut tx, &route, &[], 0.001);
        assert!(matches!(result, Err(SwapError::Unavailable(_))));
    }
}

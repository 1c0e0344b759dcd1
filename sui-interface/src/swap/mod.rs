pub mod cetus;

pub use cetus::CetusRouterClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use common::SwapInput;

use crate::tx::{CoinHandle, TransactionDraft};

#[derive(Debug, Error)]
pub enum SwapError {
    #[error("Router request failed: {0}")]
    Http(String),

    #[error("Swap route unavailable: {0}")]
    Unavailable(String),
}

/// One hop of a route, for display in the preview dialog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    pub from: String,
    pub target: String,
    pub provider: String,
}

/// A single-input route quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub from: String,
    pub target: String,
    pub amount_in: u128,
    pub amount_out: u128,
    #[serde(default)]
    pub steps: Vec<RouteStep>,
}

/// A batched multi-input-to-one-output route: one routing computation
/// covering every input coin type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRoute {
    pub target: String,
    pub total_amount_out: u128,
    pub routes: Vec<Route>,
}

impl MergedRoute {
    /// Whether the route covers every requested input coin type.
    pub fn covers(&self, inputs: &[SwapInput]) -> bool {
        inputs.iter().all(|input| self.routes.iter().any(|route| route.from == input.coin_type))
    }
}

/// Swap-routing collaborator. Potentially unavailable: callers degrade to
/// "swap unavailable" on `Err`/`None`, never crash the claim flow.
#[async_trait]
pub trait SwapAggregator: Send + Sync {
    /// Quote a single-input route, `None` when the pair cannot be routed.
    async fn find_route(
        &self,
        from: &str,
        target: &str,
        amount_atomic: u128,
    ) -> Result<Option<Route>, SwapError>;

    /// Quote one merged route for a batch of inputs in a single request.
    async fn find_merged_route(
        &self,
        target: &str,
        inputs: &[SwapInput],
    ) -> Result<Option<MergedRoute>, SwapError>;

    /// Append the swap instructions for a previously-quoted merged route,
    /// consuming the given input coin handles and returning the output coin.
    fn build_merged_swap(
        &self,
        tx: &mut TransactionDraft,
        route: &MergedRoute,
        input_coins: &[(String, CoinHandle)],
        slippage: f64,
    ) -> Result<CoinHandle, SwapError>;
}

use std::time::Duration;

use common::{canonical_coin_type, Asset, Protocol};

pub const DEFAULT_RPC_URL: &str = "https://fullnode.mainnet.sui.io:443";
pub const DEFAULT_SCALLOP_API_URL: &str = "https://sdk.api.scallop.io";
pub const DEFAULT_NAVI_API_URL: &str = "https://open-api.naviprotocol.io";
pub const DEFAULT_SUILEND_API_URL: &str = "https://api.suilend.fi";
pub const DEFAULT_ALPHALEND_API_URL: &str = "https://api.alphalend.xyz";
pub const DEFAULT_CETUS_ROUTER_URL: &str = "https://api-sui-cloudfront.cetus.zone/router_v3";

pub const DEFAULT_SLIPPAGE: f64 = 0.001;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Session-wide configuration: endpoints and poll cadences. Built once and
/// passed into services; never read from ambient globals after construction.
#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: String,
    pub scallop_api_url: String,
    pub navi_api_url: String,
    pub suilend_api_url: String,
    pub alphalend_api_url: String,
    pub cetus_router_url: String,
    /// Shared, slower cadence for wallet-scoped fetches.
    pub user_poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            scallop_api_url: DEFAULT_SCALLOP_API_URL.to_string(),
            navi_api_url: DEFAULT_NAVI_API_URL.to_string(),
            suilend_api_url: DEFAULT_SUILEND_API_URL.to_string(),
            alphalend_api_url: DEFAULT_ALPHALEND_API_URL.to_string(),
            cetus_router_url: DEFAULT_CETUS_ROUTER_URL.to_string(),
            user_poll_interval: Duration::from_secs(60),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            rpc_url: env_or("RPC_URL", &defaults.rpc_url),
            scallop_api_url: env_or("SCALLOP_API_URL", &defaults.scallop_api_url),
            navi_api_url: env_or("NAVI_API_URL", &defaults.navi_api_url),
            suilend_api_url: env_or("SUILEND_API_URL", &defaults.suilend_api_url),
            alphalend_api_url: env_or("ALPHALEND_API_URL", &defaults.alphalend_api_url),
            cetus_router_url: env_or("CETUS_ROUTER_URL", &defaults.cetus_router_url),
            user_poll_interval: defaults.user_poll_interval,
        }
    }

    /// Market poll cadence per protocol. API-backed protocols refresh faster
    /// than the chain-read-heavy ones; intervals need not be identical and
    /// the merge engine handles arbitrary interleaving.
    pub fn market_poll_interval(&self, protocol: Protocol) -> Duration {
        match protocol {
            Protocol::Scallop => Duration::from_secs(15),
            Protocol::Navi => Duration::from_secs(15),
            Protocol::Suilend => Duration::from_secs(30),
            Protocol::AlphaLend => Duration::from_secs(20),
        }
    }
}

/// Claim-flow configuration. Swap-on-claim is a product toggle, kept
/// configurable rather than hard-coded.
#[derive(Debug, Clone)]
pub struct ClaimConfig {
    pub swap_enabled: bool,
    pub swap_target_coin_type: String,
    pub swap_target_symbol: String,
    pub slippage: f64,
}

impl Default for ClaimConfig {
    fn default() -> Self {
        Self {
            swap_enabled: false,
            swap_target_coin_type: canonical_coin_type(Asset::Usdc),
            swap_target_symbol: Asset::Usdc.to_string(),
            slippage: DEFAULT_SLIPPAGE,
        }
    }
}

use std::sync::Arc;

use sui_interface::adapters::{MarketAdapter, UserAdapter};
use sui_interface::aggregator::print::{print_markets, print_positions, print_rewards};
use sui_interface::aggregator::MarketService;
use sui_interface::alphalend::AlphaLendClient;
use sui_interface::config::Config;
use sui_interface::navi::NaviClient;
use sui_interface::scallop::ScallopClient;
use sui_interface::suilend::SuilendClient;
use sui_rpc::{DecimalsCache, SuiRpcClient};

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = Config::from_env();
    let rpc = Arc::new(SuiRpcClient::new(&config.rpc_url));
    let decimals = DecimalsCache::new(Arc::clone(&rpc));

    let scallop = Arc::new(ScallopClient::new(&config.scallop_api_url));
    let navi = Arc::new(NaviClient::new(&config.navi_api_url, decimals.clone()));
    let suilend = Arc::new(SuilendClient::new(
        Arc::clone(&rpc),
        &config.suilend_api_url,
        decimals.clone(),
    ));
    let alphalend = Arc::new(AlphaLendClient::new(&config.alphalend_api_url, decimals));

    let market_adapters: Vec<Arc<dyn MarketAdapter>> =
        vec![scallop.clone(), navi.clone(), suilend.clone(), alphalend.clone()];
    let user_adapters: Vec<Arc<dyn UserAdapter>> = vec![scallop, navi, suilend, alphalend];
    let service = MarketService::new(config, market_adapters, user_adapters);

    // Optional wallet address argument enables position and reward output.
    if let Some(address) = std::env::args().nth(1) {
        service.set_address(Some(address));
    }

    service.refresh().await;
    let snapshot = service.snapshot();
    print_markets(&snapshot);
    if service.address().is_some() {
        print_positions(&snapshot);
        print_rewards(&snapshot);
    }
}

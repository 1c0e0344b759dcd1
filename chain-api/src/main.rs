use std::sync::Arc;

use anyhow::Result;
use axum::{extract::State, http::StatusCode, response::Json, routing::get, routing::post, Router};
use log::{error, info};

use common::MarketSnapshot;
use sui_interface::adapters::{MarketAdapter, UserAdapter};
use sui_interface::aggregator::MarketService;
use sui_interface::alphalend::AlphaLendClient;
use sui_interface::config::Config;
use sui_interface::navi::NaviClient;
use sui_interface::scallop::ScallopClient;
use sui_interface::suilend::SuilendClient;
use sui_rpc::{DecimalsCache, SuiRpcClient};

#[derive(Clone)]
struct LendingService {
    service: Arc<MarketService>,
}

impl LendingService {
    fn new(config: Config) -> Self {
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
        Self { service: Arc::new(MarketService::new(config, market_adapters, user_adapters)) }
    }
}

async fn get_snapshot(State(service): State<LendingService>) -> (StatusCode, Json<MarketSnapshot>) {
    (StatusCode::OK, Json(service.service.snapshot()))
}

async fn refresh(State(service): State<LendingService>) -> StatusCode {
    service.service.refresh().await;
    StatusCode::OK
}

async fn health() -> &'static str {
    "ok"
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let service = LendingService::new(Config::from_env());
    service.service.start();
    service.service.refresh().await;

    let app = Router::new()
        .route("/health", get(health))
        .route("/snapshot", get(get_snapshot))
        .route("/refresh", post(refresh))
        .with_state(service);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
    info!("Server listening on http://0.0.0.0:3000");
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {e}");
    }
    Ok(())
}

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use log::{info, warn};

use common::{ClaimError, ClaimMeta, MarketSnapshot, Protocol, RewardSummaryItem, SwapInput};

use crate::claim::builder::{ClaimBuilder, ClaimInput};
use crate::config::ClaimConfig;
use crate::swap::SwapAggregator;
use crate::tx::{CoinHandle, TransactionDraft};
use crate::wallet::{TxReceipt, WalletProvider};

/// What a claim run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimTarget {
    Protocol(Protocol),
    All,
}

impl ClaimTarget {
    fn includes(&self, protocol: Protocol) -> bool {
        match self {
            ClaimTarget::Protocol(p) => *p == protocol,
            ClaimTarget::All => true,
        }
    }
}

/// Claim-flow phase, surfaced to the UI. Only one claim runs at a time;
/// a request arriving while non-idle is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClaimState {
    #[default]
    Idle,
    Building(ClaimTarget),
    Signing,
    Refreshing,
}

/// Where the orchestrator reads summaries from and what it pokes after a
/// successful submit.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    fn get_snapshot(&self) -> MarketSnapshot;

    async fn refresh(&self);
}

/// One reward token's routability in a swap preview.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapPreviewLine {
    pub coin_type: String,
    pub amount_atomic: u128,
    /// Quoted output in the target coin's atomic units, `None` when the pair
    /// cannot be routed.
    pub amount_out: Option<u128>,
}

/// Read-only estimate of converting claimable rewards to the target coin.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapPreview {
    pub target_coin_type: String,
    pub lines: Vec<SwapPreviewLine>,
    /// Whether every previewed token routed. The claim itself is
    /// all-or-nothing, so a single unroutable token means claim-with-swap
    /// would fail.
    pub can_swap_all: bool,
}

/// Swap inputs a summary's claim meta precomputed during discovery.
fn swap_inputs_of(summary: &RewardSummaryItem) -> Vec<SwapInput> {
    match &summary.claim_meta {
        Some(ClaimMeta::Suilend(meta)) => meta.swap_inputs.clone(),
        Some(ClaimMeta::AlphaLend(meta)) => meta.claimables.clone(),
        Some(ClaimMeta::Navi(meta)) => {
            let mut by_coin: std::collections::BTreeMap<String, u128> = Default::default();
            for reward in &meta.rewards {
                if let Some(amount) = reward.amount_atomic {
                    if amount > 0 {
                        *by_coin.entry(reward.reward_coin_type.clone()).or_default() += amount;
                    }
                }
            }
            by_coin
                .into_iter()
                .map(|(coin_type, amount_atomic)| SwapInput { coin_type, amount_atomic })
                .collect()
        }
        // Scallop amounts are resolved at claim time, from the claimed coins
        // themselves; nothing to preview ahead of that.
        Some(ClaimMeta::Scallop(_)) | None => Vec::new(),
    }
}

/// Whether a summary carries anything actually claimable. Gates on the atomic
/// amounts in the claim meta, not the display figures: a reward whose display
/// amount floors to zero atomic units is not claimable. Unknown-decimals Navi
/// rules still count; their claims transfer the coin untouched.
fn summary_has_claim(summary: &RewardSummaryItem) -> bool {
    match &summary.claim_meta {
        Some(ClaimMeta::Suilend(meta)) => {
            meta.swap_inputs.iter().any(|input| input.amount_atomic > 0)
        }
        Some(ClaimMeta::Navi(meta)) => {
            meta.rewards.iter().any(|r| r.amount_atomic.is_none_or(|amount| amount > 0))
        }
        Some(ClaimMeta::AlphaLend(meta)) => {
            meta.claimables.iter().any(|input| input.amount_atomic > 0)
        }
        // Scallop amounts resolve at claim time; discovered claims in the
        // meta are the signal.
        Some(ClaimMeta::Scallop(meta)) => {
            !meta.staked_spools.is_empty() || !meta.borrow_incentives.is_empty()
        }
        None => false,
    }
}

/// Drives the claim flow: builds one transaction from the per-protocol claim
/// builders, optionally routes the proceeds through the swap aggregator, and
/// hands the draft to the wallet.
pub struct RewardClaimer {
    builders: Vec<Arc<dyn ClaimBuilder>>,
    swap: Arc<dyn SwapAggregator>,
    wallet: Arc<dyn WalletProvider>,
    source: Arc<dyn SnapshotSource>,
    config: ClaimConfig,
    state: Mutex<ClaimState>,
    last_error: Mutex<Option<String>>,
}

/// Resets the claim state to idle when the run ends, on any path out.
struct StateGuard<'a> {
    state: &'a Mutex<ClaimState>,
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        *lock(self.state) = ClaimState::Idle;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl RewardClaimer {
    pub fn new(
        builders: Vec<Arc<dyn ClaimBuilder>>,
        swap: Arc<dyn SwapAggregator>,
        wallet: Arc<dyn WalletProvider>,
        source: Arc<dyn SnapshotSource>,
        config: ClaimConfig,
    ) -> Self {
        Self {
            builders,
            swap,
            wallet,
            source,
            config,
            state: Mutex::new(ClaimState::Idle),
            last_error: Mutex::new(None),
        }
    }

    pub fn claiming_state(&self) -> ClaimState {
        *lock(&self.state)
    }

    pub fn last_error(&self) -> Option<String> {
        lock(&self.last_error).clone()
    }

    pub fn is_claim_supported(&self, protocol: Protocol) -> bool {
        protocol.claim_supported()
            && self.builders.iter().any(|builder| builder.protocol() == protocol)
    }

    /// Whether the current snapshot has anything claimable under the target.
    pub fn has_any_claim(&self, target: ClaimTarget) -> bool {
        let snapshot = self.source.get_snapshot();
        snapshot
            .reward_summary
            .iter()
            .any(|summary| target.includes(summary.protocol) && summary_has_claim(summary))
    }

    pub async fn claim_protocol(
        &self,
        protocol: Protocol,
    ) -> Result<Option<TxReceipt>, ClaimError> {
        self.claim(ClaimTarget::Protocol(protocol)).await
    }

    pub async fn claim_all(&self) -> Result<Option<TxReceipt>, ClaimError> {
        self.claim(ClaimTarget::All).await
    }

    async fn claim(&self, target: ClaimTarget) -> Result<Option<TxReceipt>, ClaimError> {
        {
            let mut state = lock(&self.state);
            if *state != ClaimState::Idle {
                info!("Claim request dropped, another claim is in flight");
                return Ok(None);
            }
            *state = ClaimState::Building(target);
        }
        let _guard = StateGuard { state: &self.state };
        *lock(&self.last_error) = None;

        match self.run_claim(target).await {
            Ok(receipt) => Ok(receipt),
            Err(e) => {
                warn!("Claim failed: {e}");
                *lock(&self.last_error) = Some(e.to_string());
                Err(e)
            }
        }
    }

    async fn run_claim(&self, target: ClaimTarget) -> Result<Option<TxReceipt>, ClaimError> {
        let address = self
            .wallet
            .current_address()
            .ok_or_else(|| ClaimError::Wallet("no wallet connected".to_string()))?;
        let snapshot = self.source.get_snapshot();

        let mut tx = TransactionDraft::with_sender(&address);
        let mut inputs: Vec<ClaimInput> = Vec::new();
        let mut any_claim = false;
        for builder in &self.builders {
            let protocol = builder.protocol();
            if !target.includes(protocol) || !protocol.claim_supported() {
                continue;
            }
            let Some(summary) = snapshot.summary_for(protocol) else { continue };
            let outcome = builder.append_claim(&mut tx, &address, summary).await?;
            any_claim |= outcome.has_claim;
            inputs.extend(outcome.inputs);
        }
        if !any_claim || tx.is_empty() {
            info!("Nothing to claim for {target:?}");
            return Ok(None);
        }

        let mut payout: Vec<CoinHandle> = Vec::new();
        let mut convertible: Vec<ClaimInput> = Vec::new();
        for input in inputs {
            if self.config.swap_enabled
                && input.coin_type != self.config.swap_target_coin_type
                && input.swap_eligible()
            {
                convertible.push(input);
            } else {
                payout.push(input.coin);
            }
        }

        if !convertible.is_empty() {
            let swap_inputs: Vec<SwapInput> = convertible
                .iter()
                .filter_map(|input| {
                    Some(SwapInput {
                        coin_type: input.coin_type.clone(),
                        amount_atomic: input.amount_atomic?,
                    })
                })
                .collect();
            // One routing request for the whole batch; a route that misses
            // any input fails the claim rather than swapping a subset.
            let route = self
                .swap
                .find_merged_route(&self.config.swap_target_coin_type, &swap_inputs)
                .await
                .map_err(|e| {
                    warn!("Merged route lookup failed: {e}");
                    ClaimError::SwapRouteUnavailable
                })?
                .ok_or(ClaimError::SwapRouteUnavailable)?;
            if !route.covers(&swap_inputs) {
                return Err(ClaimError::SwapRouteUnavailable);
            }
            let coins: Vec<(String, CoinHandle)> = convertible
                .iter()
                .map(|input| (input.coin_type.clone(), input.coin))
                .collect();
            let output = self
                .swap
                .build_merged_swap(&mut tx, &route, &coins, self.config.slippage)
                .map_err(|e| match e {
                    crate::swap::SwapError::Unavailable(coin) => ClaimError::SwapCoinMissing(coin),
                    crate::swap::SwapError::Http(_) => ClaimError::SwapRouteUnavailable,
                })?;
            payout.push(output);
        }

        tx.transfer_objects(payout, &address);

        *lock(&self.state) = ClaimState::Signing;
        let receipt = self
            .wallet
            .sign_and_execute(&tx)
            .await
            .map_err(|e| ClaimError::Wallet(e.to_string()))?;
        info!("Claim submitted: {}", receipt.digest);

        *lock(&self.state) = ClaimState::Refreshing;
        self.source.refresh().await;
        Ok(Some(receipt))
    }

    /// Quote each precomputed reward amount against the target coin without
    /// touching any state. Purely informational; the claim path quotes its
    /// own merged route when it runs.
    pub async fn preview_swap(&self, target: ClaimTarget) -> SwapPreview {
        let snapshot = self.source.get_snapshot();
        let mut lines = Vec::new();
        for summary in &snapshot.reward_summary {
            if !target.includes(summary.protocol) {
                continue;
            }
            for input in swap_inputs_of(summary) {
                if input.coin_type == self.config.swap_target_coin_type {
                    continue;
                }
                let amount_out = match self
                    .swap
                    .find_route(
                        &input.coin_type,
                        &self.config.swap_target_coin_type,
                        input.amount_atomic,
                    )
                    .await
                {
                    Ok(route) => route.map(|r| r.amount_out),
                    Err(e) => {
                        warn!("Preview quote failed for {}: {e}", input.coin_type);
                        None
                    }
                };
                lines.push(SwapPreviewLine {
                    coin_type: input.coin_type,
                    amount_atomic: input.amount_atomic,
                    amount_out,
                });
            }
        }
        let can_swap_all = !lines.is_empty() && lines.iter().all(|line| line.amount_out.is_some());
        SwapPreview {
            target_coin_type: self.config.swap_target_coin_type.clone(),
            lines,
            can_swap_all,
        }
    }
}

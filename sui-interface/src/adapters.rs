use async_trait::async_trait;
use common::{FetchError, MarketRow, Protocol, RewardSummaryItem, WalletPositions};

/// Result of one user-adapter fetch: the wallet's supplied positions for this
/// protocol plus an optional reward summary (absent when no wallet is
/// connected).
#[derive(Debug, Clone, Default)]
pub struct UserFetch {
    pub positions: WalletPositions,
    pub reward_summary: Option<RewardSummaryItem>,
}

/// Protocol-wide pool state fetch. No wallet dependency, independently
/// refreshable; a failed fetch is absorbed by the merge engine's
/// stale-retention rule, so implementations return `Err` only for total
/// failure and degrade partial failures internally.
#[async_trait]
pub trait MarketAdapter: Send + Sync {
    fn protocol(&self) -> Protocol;

    async fn fetch_market(&self) -> Result<Vec<MarketRow>, FetchError>;
}

/// Wallet-scoped fetch: supplied positions and claimable rewards. A `None`
/// address yields an empty fetch without any network call.
#[async_trait]
pub trait UserAdapter: Send + Sync {
    fn protocol(&self) -> Protocol;

    async fn fetch_user(&self, address: Option<&str>) -> Result<UserFetch, FetchError>;
}

/// Ranking key for choosing one pool variant when a protocol lists the same
/// economic asset under several coin types (e.g. two wrapped forms).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariantRank {
    pub is_preferred: bool,
    pub has_incentive: bool,
    pub apr_score: f64,
}

/// Whether a candidate variant displaces the already-selected one. Canonical
/// coin type wins, then incentive-carrying pools, then combined APR.
/// Deterministic for identical upstream data as long as callers iterate
/// candidates in a stable order.
pub fn variant_outranks(candidate: &VariantRank, existing: &VariantRank) -> bool {
    if candidate.is_preferred != existing.is_preferred {
        return candidate.is_preferred;
    }
    if candidate.has_incentive != existing.has_incentive {
        return candidate.has_incentive;
    }
    candidate.apr_score > existing.apr_score
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rank(is_preferred: bool, has_incentive: bool, apr_score: f64) -> VariantRank {
        VariantRank { is_preferred, has_incentive, apr_score }
    }

    #[test]
    fn preferred_coin_type_beats_everything() {
        assert!(variant_outranks(&rank(true, false, 0.0), &rank(false, true, 99.0)));
        assert!(!variant_outranks(&rank(false, true, 99.0), &rank(true, false, 0.0)));
    }

    #[test]
    fn incentives_beat_apr() {
        assert!(variant_outranks(&rank(false, true, 1.0), &rank(false, false, 50.0)));
    }

    #[test]
    fn apr_breaks_remaining_ties_and_equal_keeps_existing() {
        assert!(variant_outranks(&rank(false, false, 2.0), &rank(false, false, 1.0)));
        assert!(!variant_outranks(&rank(false, false, 1.0), &rank(false, false, 1.0)));
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod amount;
pub mod error;
pub mod market;
pub mod positions;
pub mod registry;
pub mod rewards;

pub use amount::*;
pub use error::*;
pub use market::*;
pub use positions::*;
pub use registry::*;
pub use rewards::*;

/// The externally-visible aggregate the UI consumes: deduplicated market
/// rows, merged wallet positions and one reward summary per protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub rows: Vec<MarketRow>,
    pub positions: WalletPositions,
    pub reward_summary: Vec<RewardSummaryItem>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl MarketSnapshot {
    /// A snapshot with no data but a stable shape: one empty summary per
    /// registered protocol.
    pub fn empty() -> Self {
        Self {
            rows: Vec::new(),
            positions: WalletPositions::new(),
            reward_summary: Protocol::ALL.iter().map(|&p| RewardSummaryItem::empty(p)).collect(),
            updated_at: None,
        }
    }

    pub fn summary_for(&self, protocol: Protocol) -> Option<&RewardSummaryItem> {
        self.reward_summary.iter().find(|item| item.protocol == protocol)
    }
}

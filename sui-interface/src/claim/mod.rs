pub mod builder;
pub mod orchestrator;

pub use builder::{ClaimBuilder, ClaimInput, ClaimOutcome};
pub use orchestrator::{ClaimState, ClaimTarget, RewardClaimer, SnapshotSource, SwapPreview};

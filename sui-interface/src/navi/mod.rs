pub mod claim;
pub mod client;
pub mod models;

pub use claim::NaviClaimBuilder;
pub use client::NaviClient;

pub mod claim;
pub mod client;
pub mod models;

pub use claim::ScallopClaimBuilder;
pub use client::ScallopClient;

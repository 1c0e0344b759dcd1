pub mod adapters;
pub mod aggregator;
pub mod alphalend;
pub mod claim;
pub mod config;
pub mod navi;
pub mod scallop;
pub mod serde_util;
pub mod suilend;
pub mod swap;
pub mod tx;
pub mod wallet;

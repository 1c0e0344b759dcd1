pub mod print;
pub mod service;
pub mod store;

pub use service::MarketService;
pub use store::SnapshotStore;

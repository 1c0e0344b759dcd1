pub mod decimals;
pub mod rpc;

pub use decimals::*;
pub use rpc::*;

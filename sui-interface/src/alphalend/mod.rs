pub mod claim;
pub mod client;
pub mod models;

pub use claim::AlphaLendClaimBuilder;
pub use client::AlphaLendClient;

pub const ALPHALEND_PACKAGE_ID: &str =
    "0xb2c7f7ba0a1c754c0dbd6a3f3c52d417bad3f8a0bd4a35d31bf1bf7e17b8a27c";
pub const LENDING_PROTOCOL_ID: &str =
    "0xa30e67cb54a9efc1ca8c16d2b4f5cfebccba2e45f9c4b022a4b71bba5a12c5ec";
pub const POSITION_CAP_TYPE: &str =
    "0xb2c7f7ba0a1c754c0dbd6a3f3c52d417bad3f8a0bd4a35d31bf1bf7e17b8a27c::position::PositionCap";
pub const POSITION_TABLE_ID: &str =
    "0x29f0e6b1e25cf0fd0accbb28e9f4b44db23f85e7cdd06b1cd6f1bb4c9e0e56b7";
pub const MARKETS_TABLE_ID: &str =
    "0x4b0a3b00b3d1f7e7a64c8deb8e9e1b8232f9dbb2d5e4dcae7d86c051e377eb79";

pub mod claim;
pub mod client;
pub mod models;

pub use claim::SuilendClaimBuilder;
pub use client::SuilendClient;

pub const LENDING_MARKET_ID: &str =
    "0x84030d26d85eaa7035084a057f2f11f701b7e2e4eda87551becbc7c97505ece1";
pub const LENDING_MARKET_TYPE: &str =
    "0xf95b06141ed4a174f239417323bde3f209b972f5930d8521ea38a52aff3a6ddf::suilend::MAIN_POOL";
pub const PACKAGE_ID: &str =
    "0xf95b06141ed4a174f239417323bde3f209b972f5930d8521ea38a52aff3a6ddf";

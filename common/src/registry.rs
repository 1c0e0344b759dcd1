use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Canonical token symbols supported by the aggregator.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumIter, EnumString,
)]
pub enum Asset {
    #[strum(serialize = "SUI")]
    #[serde(rename = "SUI")]
    Sui,
    #[strum(serialize = "USDC")]
    #[serde(rename = "USDC")]
    Usdc,
    #[strum(serialize = "USDT")]
    #[serde(rename = "USDT")]
    Usdt,
    #[strum(serialize = "XBTC")]
    #[serde(rename = "XBTC")]
    Xbtc,
    #[strum(serialize = "DEEP")]
    #[serde(rename = "DEEP")]
    Deep,
    #[strum(serialize = "WAL")]
    #[serde(rename = "WAL")]
    Wal,
}

/// Supported lending venues. Adding a protocol means adding one market
/// adapter, one user adapter and (if claims are supported) one claim builder;
/// everything downstream iterates `Protocol::ALL`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumIter, EnumString,
)]
pub enum Protocol {
    Scallop,
    Navi,
    Suilend,
    AlphaLend,
}

impl Protocol {
    pub const ALL: [Protocol; 4] =
        [Protocol::Scallop, Protocol::Navi, Protocol::Suilend, Protocol::AlphaLend];

    pub fn claim_supported(&self) -> bool {
        matches!(
            self,
            Protocol::Scallop | Protocol::Navi | Protocol::Suilend | Protocol::AlphaLend
        )
    }
}

// Canonical coin-type addresses, one per asset. Addresses are stored left-padded
// to 64 hex nibbles so lookups never depend on how a source abbreviates them.
const ASSET_ADDRESSES: [(Asset, &str); 6] = [
    (Asset::Sui, "0x0000000000000000000000000000000000000000000000000000000000000002"),
    (Asset::Usdc, "0xdba34672e30cb065b1f93e3ab55318768fd6fef66c15942c9f7cb846e2f900e7"),
    (Asset::Usdt, "0xc060006111016b8a020ad5b33834984a437aaa7d3c74c18e09a95d48aceab08c"),
    (Asset::Xbtc, "0x876a4b7bce8aeaef60464c11f4026903e9afacab79b9b142686158aa86560b50"),
    (Asset::Deep, "0xdeeb7a4662eec9f2f3def03fb937a663dddaa2e215b8078a284d026b7946c270"),
    (Asset::Wal, "0x356a26eb9e012a68958082340d4c4116e7f55615cf27affcff209cf0ae544f59"),
];

const ASSET_MODULES: [(Asset, &str); 6] = [
    (Asset::Sui, "sui::SUI"),
    (Asset::Usdc, "usdc::USDC"),
    (Asset::Usdt, "coin::COIN"),
    (Asset::Xbtc, "xbtc::XBTC"),
    (Asset::Deep, "deep::DEEP"),
    (Asset::Wal, "wal::WAL"),
];

static ADDRESS_MAP: OnceLock<HashMap<String, Asset>> = OnceLock::new();

fn address_map() -> &'static HashMap<String, Asset> {
    ADDRESS_MAP.get_or_init(|| {
        ASSET_ADDRESSES
            .iter()
            .map(|(asset, address)| (pad_address(address), *asset))
            .collect()
    })
}

/// Normalize a hex address to its canonical `0x` + 64-nibble lowercase form.
/// Inputs that are not hex addresses are returned lowercased unchanged.
pub fn pad_address(address: &str) -> String {
    let stripped = address.strip_prefix("0x").unwrap_or(address);
    if stripped.is_empty() || !stripped.chars().all(|c| c.is_ascii_hexdigit()) {
        return address.to_ascii_lowercase();
    }
    format!("0x{:0>64}", stripped.to_ascii_lowercase())
}

/// The canonical full coin type for an asset (`0x..::module::TYPE`).
pub fn canonical_coin_type(asset: Asset) -> String {
    let address = ASSET_ADDRESSES
        .iter()
        .find(|(candidate, _)| *candidate == asset)
        .map(|(_, address)| *address)
        .unwrap_or_default();
    let module = ASSET_MODULES
        .iter()
        .find(|(candidate, _)| *candidate == asset)
        .map(|(_, module)| *module)
        .unwrap_or_default();
    format!("{}::{}", pad_address(address), module)
}

/// Map any protocol-reported coin identifier to a canonical asset.
///
/// Accepts a bare address or an `address::module::TYPE` composite, strips to
/// the address portion, pads it and looks it up; falls back to a substring
/// heuristic on known symbol names for legacy/alias coin types. Pure and
/// total: unknown input yields `None`, never a panic.
pub fn normalize_asset(identifier: Option<&str>) -> Option<Asset> {
    let identifier = identifier?.trim();
    if identifier.is_empty() {
        return None;
    }
    let address_part = identifier.split("::").next().unwrap_or(identifier);
    if address_part.strip_prefix("0x").is_some_and(|s| s.chars().all(|c| c.is_ascii_hexdigit())) {
        if let Some(asset) = address_map().get(&pad_address(address_part)) {
            return Some(*asset);
        }
    }
    // Alias coin types (e.g. bridged variants) miss the address table; match
    // on symbol names, most specific first so USDC never resolves as SUI.
    let upper = identifier.to_ascii_uppercase();
    if upper.contains("XBTC") {
        return Some(Asset::Xbtc);
    }
    if upper.contains("USDC") {
        return Some(Asset::Usdc);
    }
    if upper.contains("USDT") {
        return Some(Asset::Usdt);
    }
    if upper.contains("DEEP") {
        return Some(Asset::Deep);
    }
    if upper.contains("WAL") {
        return Some(Asset::Wal);
    }
    if upper.contains("SUI") {
        return Some(Asset::Sui);
    }
    None
}

/// Resolve an asset from a reported symbol and/or coin type, preferring the
/// coin type since symbols are protocol-local.
pub fn asset_from_source(symbol: Option<&str>, coin_type: Option<&str>) -> Option<Asset> {
    normalize_asset(coin_type).or_else(|| normalize_asset(symbol))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_short_addresses() {
        assert_eq!(
            pad_address("0x2"),
            "0x0000000000000000000000000000000000000000000000000000000000000002"
        );
    }

    #[test]
    fn normalizes_composite_coin_types() {
        assert_eq!(normalize_asset(Some("0x2::sui::SUI")), Some(Asset::Sui));
        assert_eq!(
            normalize_asset(Some(
                "0xdba34672e30cb065b1f93e3ab55318768fd6fef66c15942c9f7cb846e2f900e7::usdc::USDC"
            )),
            Some(Asset::Usdc)
        );
    }

    #[test]
    fn falls_back_to_symbol_heuristic() {
        // Alias address unknown to the table, module name still identifies it.
        assert_eq!(normalize_asset(Some("0xabc123::usdc::USDC")), Some(Asset::Usdc));
        assert_eq!(normalize_asset(Some("wUSDT")), Some(Asset::Usdt));
        assert_eq!(normalize_asset(Some("SUI")), Some(Asset::Sui));
    }

    #[test]
    fn usdc_never_resolves_as_sui() {
        assert_eq!(normalize_asset(Some("0x1::usdc_sui::USDC")), Some(Asset::Usdc));
    }

    #[test]
    fn unknown_input_is_none() {
        assert_eq!(normalize_asset(None), None);
        assert_eq!(normalize_asset(Some("")), None);
        assert_eq!(normalize_asset(Some("0x999::weth::WETH")), None);
    }

    #[test]
    fn normalization_is_idempotent() {
        // Applying the canonical coin type of the result maps back to itself.
        for (asset, _) in ASSET_ADDRESSES {
            let canonical = canonical_coin_type(asset);
            assert_eq!(normalize_asset(Some(&canonical)), Some(asset));
        }
    }

    #[test]
    fn canonical_coin_type_round_trips() {
        assert_eq!(
            canonical_coin_type(Asset::Sui),
            "0x0000000000000000000000000000000000000000000000000000000000000002::sui::SUI"
        );
    }
}

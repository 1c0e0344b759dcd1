use std::collections::BTreeMap;
use std::str::FromStr;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Asset, Protocol, RewardSupply};

pub type PositionKey = (Protocol, Asset);

/// Supplied amounts in display units, keyed by (protocol, asset).
///
/// Accumulative: a pair arising from several underlying obligations sums.
/// Serialized as a `"Protocol-ASSET" -> amount` map for API consumers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalletPositions {
    entries: BTreeMap<PositionKey, f64>,
}

impl WalletPositions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, protocol: Protocol, asset: Asset, amount: f64) {
        *self.entries.entry((protocol, asset)).or_insert(0.0) += amount;
    }

    pub fn amount(&self, protocol: Protocol, asset: Asset) -> f64 {
        self.entries.get(&(protocol, asset)).copied().unwrap_or(0.0)
    }

    /// Additive union with another position map.
    pub fn merge(&mut self, other: &WalletPositions) {
        for (&key, &amount) in &other.entries {
            *self.entries.entry(key).or_insert(0.0) += amount;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PositionKey, f64)> + '_ {
        self.entries.iter().map(|(&key, &amount)| (key, amount))
    }

    /// Positive supplied amounts for one protocol, in asset order.
    pub fn supply_list(&self, protocol: Protocol) -> Vec<RewardSupply> {
        self.entries
            .iter()
            .filter(|((candidate, _), &amount)| *candidate == protocol && amount > 0.0)
            .map(|(&(_, asset), &amount)| RewardSupply { asset, amount })
            .collect()
    }
}

impl Serialize for WalletPositions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (&(protocol, asset), amount) in &self.entries {
            map.serialize_entry(&format!("{}-{}", protocol, asset), amount)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for WalletPositions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PositionsVisitor;

        impl<'de> Visitor<'de> for PositionsVisitor {
            type Value = WalletPositions;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a map of \"Protocol-ASSET\" keys to amounts")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut positions = WalletPositions::new();
                while let Some((key, amount)) = access.next_entry::<String, f64>()? {
                    let (protocol, asset) = key.split_once('-').ok_or_else(|| {
                        serde::de::Error::custom(format!("invalid position key: {key}"))
                    })?;
                    let protocol = Protocol::from_str(protocol)
                        .map_err(|_| serde::de::Error::custom(format!("unknown protocol: {protocol}")))?;
                    let asset = Asset::from_str(asset)
                        .map_err(|_| serde::de::Error::custom(format!("unknown asset: {asset}")))?;
                    positions.add(protocol, asset, amount);
                }
                Ok(positions)
            }
        }

        deserializer.deserialize_map(PositionsVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_is_additive() {
        let mut first = WalletPositions::new();
        first.add(Protocol::Scallop, Asset::Sui, 5.0);

        let mut second = WalletPositions::new();
        second.add(Protocol::Scallop, Asset::Sui, 3.0);
        second.add(Protocol::Navi, Asset::Usdc, 10.0);

        first.merge(&second);
        assert_eq!(first.amount(Protocol::Scallop, Asset::Sui), 8.0);
        assert_eq!(first.amount(Protocol::Navi, Asset::Usdc), 10.0);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn add_accumulates_per_key() {
        let mut positions = WalletPositions::new();
        positions.add(Protocol::Suilend, Asset::Usdt, 1.25);
        positions.add(Protocol::Suilend, Asset::Usdt, 0.75);
        assert_eq!(positions.amount(Protocol::Suilend, Asset::Usdt), 2.0);
    }

    #[test]
    fn supply_list_filters_protocol_and_zero() {
        let mut positions = WalletPositions::new();
        positions.add(Protocol::Scallop, Asset::Sui, 4.0);
        positions.add(Protocol::Scallop, Asset::Usdc, 0.0);
        positions.add(Protocol::Navi, Asset::Usdc, 2.0);

        let supplies = positions.supply_list(Protocol::Scallop);
        assert_eq!(supplies.len(), 1);
        assert_eq!(supplies[0].asset, Asset::Sui);
        assert_eq!(supplies[0].amount, 4.0);
    }

    #[test]
    fn serde_round_trip() {
        let mut positions = WalletPositions::new();
        positions.add(Protocol::AlphaLend, Asset::Wal, 7.5);
        let json = serde_json::to_string(&positions).unwrap();
        assert_eq!(json, r#"{"AlphaLend-WAL":7.5}"#);
        let parsed: WalletPositions = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, positions);
    }
}

use serde::{Deserialize, Serialize};

use crate::{sum_aprs, Asset, Protocol};

/// One incentive-program contribution to a pool's APR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncentiveBreakdown {
    pub token: String,
    pub apr: f64,
}

/// One (protocol, asset) pool snapshot. Net APRs are derived, never stored
/// independently: supply adds incentives, borrow subtracts them floored at
/// zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRow {
    pub asset: Asset,
    pub protocol: Protocol,
    pub supply_apr: f64,
    pub borrow_apr: f64,
    pub utilization: f64,
    pub supply_base_apr: f64,
    pub borrow_base_apr: f64,
    pub supply_incentive_apr: f64,
    pub borrow_incentive_apr: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supply_incentive_breakdown: Vec<IncentiveBreakdown>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub borrow_incentive_breakdown: Vec<IncentiveBreakdown>,
}

impl MarketRow {
    pub fn new(
        protocol: Protocol,
        asset: Asset,
        supply_base_apr: f64,
        borrow_base_apr: f64,
        utilization: f64,
        supply_incentive_breakdown: Vec<IncentiveBreakdown>,
        borrow_incentive_breakdown: Vec<IncentiveBreakdown>,
    ) -> Self {
        let supply_incentive_apr = sum_aprs(&supply_incentive_breakdown);
        let borrow_incentive_apr = sum_aprs(&borrow_incentive_breakdown);
        Self {
            asset,
            protocol,
            supply_apr: supply_base_apr + supply_incentive_apr,
            borrow_apr: (borrow_base_apr - borrow_incentive_apr).max(0.0),
            utilization,
            supply_base_apr,
            borrow_base_apr,
            supply_incentive_apr,
            borrow_incentive_apr,
            supply_incentive_breakdown,
            borrow_incentive_breakdown,
        }
    }

    pub fn has_incentives(&self) -> bool {
        self.supply_incentive_apr > 0.0 || self.borrow_incentive_apr > 0.0
    }

    /// Tie-break score when one protocol exposes several variants of the same
    /// economic asset and neither is canonical or incentivized.
    pub fn apr_score(&self) -> f64 {
        self.supply_base_apr + self.borrow_base_apr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breakdown(apr: f64) -> Vec<IncentiveBreakdown> {
        vec![IncentiveBreakdown { token: "SUI".to_string(), apr }]
    }

    #[test]
    fn supply_apr_adds_incentives() {
        let row = MarketRow::new(
            Protocol::Scallop,
            Asset::Sui,
            3.0,
            5.0,
            60.0,
            breakdown(1.5),
            Vec::new(),
        );
        assert_eq!(row.supply_apr, 4.5);
        assert_eq!(row.supply_apr, row.supply_base_apr + row.supply_incentive_apr);
    }

    #[test]
    fn borrow_apr_floors_at_zero() {
        let row = MarketRow::new(
            Protocol::Navi,
            Asset::Usdc,
            2.0,
            1.0,
            40.0,
            Vec::new(),
            breakdown(4.0),
        );
        assert_eq!(row.borrow_apr, 0.0);
        assert_eq!(
            row.borrow_apr,
            (row.borrow_base_apr - row.borrow_incentive_apr).max(0.0)
        );
    }
}

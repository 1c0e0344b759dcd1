//! Parsed intermediate schema for Suilend on-chain objects.
//!
//! The fullnode returns reserves and obligations as nested field bags; these
//! parsers extract only what the adapter needs and fail closed, so a
//! malformed reserve becomes "no data" instead of a crash. All fixed-point
//! `Decimal` fields are wads (value scaled by 1e18).

use serde_json::Value;

use sui_rpc::{field, field_str, field_u128, field_u64};

pub const WAD: u128 = 1_000_000_000_000_000_000;

/// One reserve's rate-relevant state.
#[derive(Debug, Clone, PartialEq)]
pub struct Reserve {
    pub array_index: u64,
    pub coin_type: String,
    pub mint_decimals: u8,
    pub available_amount: u128,
    /// Borrowed amount in atomic units (wad floor).
    pub borrowed_amount: u128,
    pub ctoken_supply: u128,
    /// Interest curve knots: utilization percent paired with APR percent.
    pub interest_curve: Vec<(f64, f64)>,
    pub spread_fee_bps: u64,
    pub deposit_rewards: Vec<PoolReward>,
    pub borrow_rewards: Vec<PoolReward>,
    pub deposit_manager_id: String,
    pub borrow_manager_id: String,
}

/// One active reward program slot in a pool reward manager. The slot index
/// is the on-chain `reward_index` used when claiming.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolReward {
    pub reward_index: u64,
    pub coin_type: String,
    pub start_time_ms: u64,
    pub end_time_ms: u64,
    pub total_rewards: u128,
    pub cumulative_rewards_per_share: u128,
}

/// A user's per-manager reward bookkeeping inside an obligation.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRewardManager {
    pub pool_reward_manager_id: String,
    pub share: u128,
    pub rewards: Vec<Option<UserReward>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserReward {
    pub earned_rewards: u128,
    pub cumulative_rewards_per_share: u128,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObligationDeposit {
    pub coin_type: String,
    pub ctoken_amount: u128,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Obligation {
    pub id: String,
    pub deposits: Vec<ObligationDeposit>,
    pub user_reward_managers: Vec<UserRewardManager>,
}

fn coin_type_name(value: &Value) -> Option<String> {
    let name = field_str(value, &["fields", "name"])?;
    Some(if name.starts_with("0x") { name.to_string() } else { format!("0x{name}") })
}

fn decimal_wad(value: &Value, path: &[&str]) -> Option<u128> {
    let holder = field(value, path)?;
    field_u128(holder, &["fields", "value"])
}

fn parse_pool_reward(index: u64, value: &Value) -> Option<PoolReward> {
    let fields = field(value, &["fields"])?;
    Some(PoolReward {
        reward_index: index,
        coin_type: coin_type_name(fields.get("coin_type")?)?,
        start_time_ms: field_u64(fields, &["start_time_ms"])?,
        end_time_ms: field_u64(fields, &["end_time_ms"])?,
        total_rewards: field_u128(fields, &["total_rewards"]).unwrap_or(0),
        cumulative_rewards_per_share: decimal_wad(fields, &["cumulative_rewards_per_share"])
            .unwrap_or(0),
    })
}

fn parse_reward_manager(value: &Value) -> Option<(String, Vec<PoolReward>)> {
    let fields = field(value, &["fields"])?;
    let id = field_str(fields, &["id", "id"])?.to_string();
    let rewards = fields
        .get("pool_rewards")?
        .as_array()?
        .iter()
        .enumerate()
        .filter_map(|(index, slot)| {
            if slot.is_null() {
                None
            } else {
                parse_pool_reward(index as u64, slot)
            }
        })
        .collect();
    Some((id, rewards))
}

/// Parse a reserve entry from the lending market's `reserves` vector.
pub fn parse_reserve(array_index: u64, value: &Value) -> Option<Reserve> {
    let fields = field(value, &["fields"])?;
    let config = field(fields, &["config", "fields", "element", "fields"])?;
    let utils = config.get("interest_rate_utils")?.as_array()?;
    let aprs = config.get("interest_rate_aprs")?.as_array()?;
    let interest_curve = utils
        .iter()
        .zip(aprs.iter())
        .filter_map(|(util, apr)| {
            let util = util.as_u64().or_else(|| util.as_str()?.parse().ok())?;
            let apr_bps: u64 = apr.as_u64().or_else(|| apr.as_str()?.parse().ok())?;
            Some((util as f64, apr_bps as f64 / 100.0))
        })
        .collect::<Vec<_>>();
    if interest_curve.is_empty() {
        return None;
    }
    let (deposit_manager_id, deposit_rewards) =
        parse_reward_manager(field(fields, &["deposits_pool_reward_manager"])?)?;
    let (borrow_manager_id, borrow_rewards) =
        parse_reward_manager(field(fields, &["borrows_pool_reward_manager"])?)?;
    Some(Reserve {
        array_index,
        coin_type: coin_type_name(fields.get("coin_type")?)?,
        mint_decimals: field_u64(fields, &["mint_decimals"])? as u8,
        available_amount: field_u128(fields, &["available_amount"])?,
        borrowed_amount: decimal_wad(fields, &["borrowed_amount"]).unwrap_or(0) / WAD,
        ctoken_supply: field_u128(fields, &["ctoken_supply"]).unwrap_or(0),
        interest_curve,
        spread_fee_bps: field_u64(config, &["spread_fee_bps"]).unwrap_or(0),
        deposit_rewards,
        borrow_rewards,
        deposit_manager_id,
        borrow_manager_id,
    })
}

pub fn parse_obligation(id: &str, fields: &Value) -> Option<Obligation> {
    let deposits = fields
        .get("deposits")?
        .as_array()?
        .iter()
        .filter_map(|deposit| {
            let fields = field(deposit, &["fields"])?;
            Some(ObligationDeposit {
                coin_type: coin_type_name(fields.get("coin_type")?)?,
                ctoken_amount: field_u128(fields, &["deposited_ctoken_amount"])?,
            })
        })
        .collect();
    let user_reward_managers = fields
        .get("user_reward_managers")
        .and_then(Value::as_array)
        .map(|managers| {
            managers
                .iter()
                .filter_map(|manager| {
                    let fields = field(manager, &["fields"])?;
                    let rewards = fields
                        .get("rewards")?
                        .as_array()?
                        .iter()
                        .map(|slot| {
                            let fields = field(slot, &["fields"])?;
                            Some(UserReward {
                                earned_rewards: decimal_wad(fields, &["earned_rewards"])
                                    .unwrap_or(0),
                                cumulative_rewards_per_share: decimal_wad(
                                    fields,
                                    &["cumulative_rewards_per_share"],
                                )
                                .unwrap_or(0),
                            })
                        })
                        .collect();
                    Some(UserRewardManager {
                        pool_reward_manager_id: field_str(
                            fields,
                            &["pool_reward_manager_id"],
                        )?
                        .to_string(),
                        share: field_u128(fields, &["share"])?,
                        rewards,
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    Some(Obligation { id: id.to_string(), deposits, user_reward_managers })
}

impl Reserve {
    /// Current utilization in percent.
    pub fn utilization_percent(&self) -> f64 {
        let total = self.available_amount + self.borrowed_amount;
        if total == 0 {
            return 0.0;
        }
        self.borrowed_amount as f64 / total as f64 * 100.0
    }

    /// Borrow APR in percent from the piecewise-linear interest curve.
    pub fn borrow_apr_percent(&self) -> f64 {
        let utilization = self.utilization_percent();
        let curve = &self.interest_curve;
        if utilization <= curve[0].0 {
            return curve[0].1;
        }
        for window in curve.windows(2) {
            let (u0, a0) = window[0];
            let (u1, a1) = window[1];
            if utilization <= u1 {
                if u1 == u0 {
                    return a1;
                }
                return a0 + (a1 - a0) * (utilization - u0) / (u1 - u0);
            }
        }
        curve.last().map(|&(_, apr)| apr).unwrap_or(0.0)
    }

    /// Supply APR in percent: borrowers' interest flows to suppliers scaled
    /// by utilization, minus the protocol spread.
    pub fn supply_apr_percent(&self) -> f64 {
        let spread = self.spread_fee_bps as f64 / 10_000.0;
        self.borrow_apr_percent() * self.utilization_percent() / 100.0 * (1.0 - spread)
    }

    /// Display amount backing one ctoken unit.
    pub fn ctoken_ratio(&self) -> f64 {
        if self.ctoken_supply == 0 {
            return 1.0;
        }
        (self.available_amount + self.borrowed_amount) as f64 / self.ctoken_supply as f64
    }
}

/// Claimable atomic amount for one reward slot: rewards already settled into
/// `earned_rewards` plus the share-weighted cumulative delta since the user's
/// checkpoint, floored out of wad space.
pub fn claimable_atomic(
    user: &UserReward,
    share: u128,
    pool_cumulative_per_share: u128,
) -> u128 {
    let delta =
        pool_cumulative_per_share.saturating_sub(user.cumulative_rewards_per_share);
    (user.earned_rewards + share * delta) / WAD
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample_reserve() -> Value {
        json!({
            "fields": {
                "coin_type": { "fields": { "name": "0x2::sui::SUI" } },
                "mint_decimals": 9,
                "available_amount": "600",
                "borrowed_amount": { "fields": { "value": "400000000000000000000" } },
                "ctoken_supply": "1000",
                "config": { "fields": { "element": { "fields": {
                    "interest_rate_utils": [0, 80, 100],
                    "interest_rate_aprs": ["0", "800", "5000"],
                    "spread_fee_bps": 2000,
                } } } },
                "deposits_pool_reward_manager": { "fields": {
                    "id": { "id": "0xdep" },
                    "pool_rewards": [
                        { "fields": {
                            "coin_type": { "fields": { "name": "deeb::deep::DEEP" } },
                            "start_time_ms": 0,
                            "end_time_ms": 1000,
                            "total_rewards": "500",
                            "cumulative_rewards_per_share": { "fields": { "value": "7" } },
                        } },
                        null,
                    ],
                } },
                "borrows_pool_reward_manager": { "fields": {
                    "id": { "id": "0xbor" },
                    "pool_rewards": [],
                } },
            }
        })
    }

    #[test]
    fn reserve_parses_curve_and_rewards() {
        let reserve = parse_reserve(3, &sample_reserve()).unwrap();
        assert_eq!(reserve.array_index, 3);
        assert_eq!(reserve.coin_type, "0x2::sui::SUI");
        assert_eq!(reserve.borrowed_amount, 400);
        assert_eq!(reserve.interest_curve, vec![(0.0, 0.0), (80.0, 8.0), (100.0, 50.0)]);
        assert_eq!(reserve.deposit_rewards.len(), 1);
        // Null slots are skipped but indices still reflect the slot position.
        assert_eq!(reserve.deposit_rewards[0].reward_index, 0);
        assert_eq!(reserve.deposit_rewards[0].coin_type, "0xdeeb::deep::DEEP");
        assert_eq!(reserve.deposit_manager_id, "0xdep");
    }

    #[test]
    fn utilization_and_rates_follow_the_curve() {
        let reserve = parse_reserve(0, &sample_reserve()).unwrap();
        assert_eq!(reserve.utilization_percent(), 40.0);
        // 40% sits midway to the 80% knot: half of 8%.
        assert_eq!(reserve.borrow_apr_percent(), 4.0);
        // supply = 4% * 0.4 utilization * 0.8 after spread
        assert!((reserve.supply_apr_percent() - 1.28).abs() < 1e-9);
    }

    #[test]
    fn malformed_reserve_fails_closed() {
        assert_eq!(parse_reserve(0, &json!({ "fields": {} })), None);
    }

    #[test]
    fn claimable_combines_earned_and_share_delta() {
        let user = UserReward {
            earned_rewards: 2 * WAD,
            cumulative_rewards_per_share: 5 * WAD / 10,
        };
        // share 10, delta 0.5 wad per share -> 5 more, 7 total.
        assert_eq!(claimable_atomic(&user, 10, WAD), 7);
        // Stale pool checkpoint never underflows.
        assert_eq!(claimable_atomic(&user, 10, 0), 2);
    }

    #[test]
    fn obligation_parses_deposits_and_managers() {
        let fields = json!({
            "deposits": [
                { "fields": {
                    "coin_type": { "fields": { "name": "0x2::sui::SUI" } },
                    "deposited_ctoken_amount": "150",
                } }
            ],
            "user_reward_managers": [
                { "fields": {
                    "pool_reward_manager_id": "0xdep",
                    "share": "150",
                    "rewards": [
                        { "fields": {
                            "earned_rewards": { "fields": { "value": "1000000000000000000" } },
                            "cumulative_rewards_per_share": { "fields": { "value": "0" } },
                        } },
                        null,
                    ],
                } }
            ],
        });
        let obligation = parse_obligation("0xobl", &fields).unwrap();
        assert_eq!(obligation.deposits.len(), 1);
        assert_eq!(obligation.user_reward_managers.len(), 1);
        let manager = &obligation.user_reward_managers[0];
        assert_eq!(manager.rewards.len(), 2);
        assert!(manager.rewards[0].is_some());
        assert!(manager.rewards[1].is_none());
    }
}

//! Console rendering of a snapshot.

use log::info;
use prettytable::{row, Table};

use common::MarketSnapshot;

pub fn print_markets(snapshot: &MarketSnapshot) {
    if snapshot.rows.is_empty() {
        info!("No markets loaded");
        return;
    }

    let mut table = Table::new();
    table.add_row(row![
        "Protocol",
        "Asset",
        "Supply APR",
        "Borrow APR",
        "Utilization",
        "Supply Incentives",
        "Borrow Incentives"
    ]);

    for market in &snapshot.rows {
        let format_breakdown = |breakdown: &[common::IncentiveBreakdown]| {
            breakdown
                .iter()
                .map(|entry| format!("{} {:.2}%", entry.token, entry.apr))
                .collect::<Vec<_>>()
                .join(", ")
        };
        table.add_row(row![
            market.protocol,
            market.asset,
            format!("{:.2}%", market.supply_apr),
            format!("{:.2}%", market.borrow_apr),
            format!("{:.2}%", market.utilization),
            format_breakdown(&market.supply_incentive_breakdown),
            format_breakdown(&market.borrow_incentive_breakdown)
        ]);
    }

    table.printstd();
}

pub fn print_positions(snapshot: &MarketSnapshot) {
    if snapshot.positions.is_empty() {
        info!("No wallet positions");
        return;
    }

    let mut table = Table::new();
    table.add_row(row!["Protocol", "Asset", "Supplied"]);
    for ((protocol, asset), amount) in snapshot.positions.iter() {
        table.add_row(row![protocol, asset, format!("{:.6}", amount)]);
    }
    table.printstd();
}

pub fn print_rewards(snapshot: &MarketSnapshot) {
    let mut table = Table::new();
    table.add_row(row!["Protocol", "Claimable Rewards"]);
    for summary in &snapshot.reward_summary {
        let rewards = if summary.rewards.is_empty() {
            "-".to_string()
        } else {
            summary
                .rewards
                .iter()
                .map(|reward| format!("{:.6} {}", reward.amount, reward.token))
                .collect::<Vec<_>>()
                .join(", ")
        };
        table.add_row(row![summary.protocol, rewards]);
    }
    table.printstd();
}

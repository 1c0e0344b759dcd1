use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// Maximum fractional digits rendered for atomic amounts; beyond this the
/// display value carries no information a human reads.
const MAX_DISPLAY_FRACTION: usize = 12;

fn pow10(decimals: u8) -> Decimal {
    Decimal::from_i128_with_scale(10i128.pow(u32::from(decimals)), 0)
}

/// Convert a display-unit amount to atomic units, floor-rounded.
/// Returns `None` for negative or non-finite inputs.
pub fn to_atomic(amount: f64, decimals: u8) -> Option<u128> {
    if !amount.is_finite() || amount < 0.0 {
        return None;
    }
    let value = Decimal::from_f64(amount)?;
    (value * pow10(decimals)).floor().to_u128()
}

/// Convert an atomic amount to display units.
pub fn to_display(amount: u128, decimals: u8) -> f64 {
    match Decimal::from_u128(amount) {
        Some(value) => (value / pow10(decimals)).to_f64().unwrap_or(0.0),
        None => amount as f64 / 10f64.powi(i32::from(decimals)),
    }
}

/// Floor a display amount to the coin's true decimal precision. Reward amounts
/// shown to the user must never fabricate precision the chain does not have.
pub fn floor_to_decimals(amount: f64, decimals: u8) -> f64 {
    match to_atomic(amount, decimals) {
        Some(atomic) => to_display(atomic, decimals),
        None => amount,
    }
}

/// Format an atomic amount as a decimal string, trailing zeros trimmed and
/// the fraction capped at twelve digits.
pub fn format_atomic(amount: u128, decimals: u8) -> String {
    let raw = amount.to_string();
    if decimals == 0 {
        return raw;
    }
    let decimals = usize::from(decimals);
    let padded = format!("{:0>width$}", raw, width = decimals + 1);
    let split = padded.len() - decimals;
    let whole = &padded[..split];
    let fraction = padded[split..].trim_end_matches('0');
    if fraction.is_empty() {
        return whole.to_string();
    }
    let fraction = &fraction[..fraction.len().min(MAX_DISPLAY_FRACTION)];
    format!("{}.{}", whole, fraction)
}

/// Last path segment of a coin type, used as a token symbol when none is
/// reported (`0x..::cert::CERT` -> `CERT`).
pub fn format_token_symbol(coin_type: &str) -> String {
    coin_type.rsplit("::").next().unwrap_or(coin_type).to_string()
}

/// Total APR contribution of a breakdown list.
pub fn sum_aprs(items: &[crate::IncentiveBreakdown]) -> f64 {
    items.iter().map(|item| item.apr).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_conversion_floors() {
        assert_eq!(to_atomic(1.5, 6), Some(1_500_000));
        assert_eq!(to_atomic(0.1234567, 6), Some(123_456));
        // Too small to represent at six decimals.
        assert_eq!(to_atomic(0.0000000001, 6), Some(0));
        assert_eq!(to_atomic(-1.0, 6), None);
        assert_eq!(to_atomic(f64::NAN, 6), None);
    }

    #[test]
    fn display_round_trip() {
        assert_eq!(to_display(1_500_000, 6), 1.5);
        assert_eq!(to_display(0, 9), 0.0);
    }

    #[test]
    fn floors_display_precision() {
        assert_eq!(floor_to_decimals(2.5000009, 6), 2.5);
        assert_eq!(floor_to_decimals(0.0000000001, 6), 0.0);
    }

    #[test]
    fn formats_atomic_amounts() {
        assert_eq!(format_atomic(1_500_000, 6), "1.5");
        assert_eq!(format_atomic(42, 0), "42");
        assert_eq!(format_atomic(1, 9), "0.000000001");
        assert_eq!(format_atomic(1_000_000_000, 9), "1");
    }

    #[test]
    fn token_symbol_from_coin_type() {
        assert_eq!(format_token_symbol("0x2::sui::SUI"), "SUI");
        assert_eq!(format_token_symbol("SCA"), "SCA");
    }
}

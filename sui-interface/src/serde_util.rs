//! Deserialization helpers for protocol API payloads, which report numbers
//! inconsistently as JSON numbers or decimal strings.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub fn flexible_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => Ok(n.as_f64().unwrap_or(0.0)),
        Value::String(s) => Ok(s.parse().unwrap_or(0.0)),
        _ => Ok(0.0),
    }
}

pub fn flexible_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => Ok(n.as_u64().unwrap_or(0)),
        Value::String(s) => Ok(s.parse().unwrap_or(0)),
        _ => Ok(0),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(deserialize_with = "super::flexible_f64")]
        rate: f64,
        #[serde(deserialize_with = "super::flexible_u64")]
        amount: u64,
    }

    #[test]
    fn accepts_numbers_and_strings() {
        let parsed: Sample = serde_json::from_str(r#"{"rate": "1.5", "amount": 10}"#).unwrap();
        assert_eq!(parsed.rate, 1.5);
        assert_eq!(parsed.amount, 10);

        let parsed: Sample =
            serde_json::from_str(r#"{"rate": 0.25, "amount": "18446744073709551615"}"#).unwrap();
        assert_eq!(parsed.rate, 0.25);
        assert_eq!(parsed.amount, 18446744073709551615);
    }

    #[test]
    fn malformed_values_fail_closed() {
        let parsed: Sample = serde_json::from_str(r#"{"rate": [], "amount": null}"#).unwrap();
        assert_eq!(parsed.rate, 0.0);
        assert_eq!(parsed.amount, 0);
    }
}

//! Serde helpers for upstream payloads that encode numbers as strings
//! (Meta's insights values, Google's int64 fields, Shopify prices).

use serde::de::{self, Deserializer};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum Numeric {
    Int(u64),
    Float(f64),
    Text(String),
}

/// Accepts `12`, `"12"`, `null` or a missing field (→ 0).
pub fn u64_lenient<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Numeric>::deserialize(deserializer)? {
        None => Ok(0),
        Some(Numeric::Int(n)) => Ok(n),
        Some(Numeric::Float(f)) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 => Ok(f as u64),
        Some(Numeric::Float(f)) => Err(de::Error::custom(format!(
            "expected a non-negative integer, got {f}"
        ))),
        Some(Numeric::Text(s)) if s.trim().is_empty() => Ok(0),
        Some(Numeric::Text(s)) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("expected a non-negative integer, got '{s}'"))),
    }
}

/// Accepts `12.5`, `"12.50"`, `null` or a missing field (→ 0.0). Negative or
/// non-finite amounts are rejected.
pub fn amount_lenient<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Option::<Numeric>::deserialize(deserializer)? {
        None => 0.0,
        Some(Numeric::Int(n)) => n as f64,
        Some(Numeric::Float(f)) => f,
        Some(Numeric::Text(s)) if s.trim().is_empty() => 0.0,
        Some(Numeric::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("expected an amount, got '{s}'")))?,
    };
    if !value.is_finite() || value < 0.0 {
        return Err(de::Error::custom(format!(
            "amount must be finite and non-negative, got {value}"
        )));
    }
    Ok(value)
}

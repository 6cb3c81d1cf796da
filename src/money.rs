//! Rounding helpers for monetary output.
//!
//! The engine works on unrounded `f64` values end to end and rounds
//! exactly once, when a result is serialised.  The `serialize_*`
//! functions are meant for `#[serde(serialize_with = "...")]`.

use serde::Serializer;

/// Round half away from zero to two decimal places.
pub fn round_cents(value: f64) -> f64 {
    round_to(value, 2)
}

/// Round half away from zero to `digits` decimal places.
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    let rounded = (value * factor).round() / factor;
    // Avoid emitting "-0.0" for tiny negative values.
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

pub fn serialize_cents<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(round_cents(*value))
}

pub fn serialize_opt_cents<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(v) => serializer.serialize_some(&round_cents(*v)),
        None => serializer.serialize_none(),
    }
}

/// Ratios keep four decimal places (basis points).
pub fn serialize_ratio<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(round_to(*value, 4))
}

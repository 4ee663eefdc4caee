//! Precision Handling for Token Amounts
//!
//! Core arithmetic never leaves raw smallest-unit integers. This module is
//! the explicit boundary where raw amounts meet human-readable decimals
//! (CLI input and output).
//!
//! ## Critical Rules
//!
//! 1. **NO FLOATING POINT**: conversions go through `rust_decimal`
//! 2. **Preserve Native Precision**: raw amounts are never normalized
//! 3. **Explicit Conversions**: parsing rejects values with more fractional
//!    digits than the token supports
//!
//! ```rust
//! use types::precision::{format_amount, parse_amount};
//!
//! // 1.5 WETH (18 decimals)
//! let raw = parse_amount("1.5", 18).unwrap();
//! assert_eq!(raw, 1_500_000_000_000_000_000);
//! assert_eq!(format_amount(raw, 18).to_string(), "1.5");
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrecisionError {
    #[error("invalid decimal string: '{0}'")]
    InvalidDecimal(String),

    #[error("'{input}' has more than {decimals} fractional digits")]
    PrecisionLoss { input: String, decimals: u8 },

    #[error("negative amount: '{0}'")]
    Negative(String),

    #[error("value overflow: {0}")]
    Overflow(String),
}

pub type Result<T> = std::result::Result<T, PrecisionError>;

/// Largest scale `rust_decimal` can represent
pub const MAX_DECIMALS: u8 = 28;

/// Render a raw amount with the token's decimals, trailing zeros removed
///
/// Amounts beyond `Decimal`'s 96-bit mantissa are clamped to `Decimal::MAX`;
/// this is a display helper only.
pub fn format_amount(raw: u128, decimals: u8) -> Decimal {
    let scale = u32::from(decimals.min(MAX_DECIMALS));
    match i128::try_from(raw)
        .ok()
        .and_then(|value| Decimal::try_from_i128_with_scale(value, scale).ok())
    {
        Some(value) => value.normalize(),
        None => Decimal::MAX,
    }
}

/// Parse a human-readable decimal into raw smallest units
pub fn parse_amount(input: &str, decimals: u8) -> Result<u128> {
    let value =
        Decimal::from_str(input.trim()).map_err(|_| PrecisionError::InvalidDecimal(input.to_string()))?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(PrecisionError::Negative(input.to_string()));
    }
    if value.normalize().scale() > u32::from(decimals) {
        return Err(PrecisionError::PrecisionLoss {
            input: input.to_string(),
            decimals,
        });
    }

    // Split into integer and fractional parts so large token scales
    // (18 decimals) never overflow Decimal's mantissa
    let integer = value.trunc();
    let fraction = (value - integer).normalize();

    let multiplier = 10u128
        .checked_pow(u32::from(decimals))
        .ok_or_else(|| PrecisionError::Overflow(input.to_string()))?;
    let integer_raw = integer
        .to_u128()
        .and_then(|i| i.checked_mul(multiplier))
        .ok_or_else(|| PrecisionError::Overflow(input.to_string()))?;

    let fraction_scale = fraction.scale();
    let fraction_digits = fraction.mantissa().unsigned_abs();
    let fraction_raw = 10u128
        .checked_pow(u32::from(decimals) - fraction_scale)
        .and_then(|m| fraction_digits.checked_mul(m))
        .ok_or_else(|| PrecisionError::Overflow(input.to_string()))?;

    integer_raw
        .checked_add(fraction_raw)
        .ok_or_else(|| PrecisionError::Overflow(input.to_string()))
}

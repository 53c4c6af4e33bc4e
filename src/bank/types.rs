//! Types used throughout the ledger, plus fixed-point money parsing and formatting.
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Decimal precision for monetary values.
/// This is used to convert floating-point values to fixed-point representation.
pub const DECIMAL_PRECISION: f64 = 10000.0;

/// Number of fixed-point ticks in one hundredth of a currency unit.
const TICKS_PER_CENT: i64 = (DECIMAL_PRECISION as i64) / 100;

/// Money type, representing a fixed-point monetary value.
pub type Money = i64;

/// 1-based position of a transaction inside its batch.
pub type EntryId = usize;

/// A scalar input value as the caller supplied it.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum RawValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Coerces the raw value into a finite number.
    /// `null`, `false` and blank strings count as zero, `true` as one.
    pub fn to_number(&self) -> Result<f64, ParseMoneyError> {
        let value = match self {
            RawValue::Null => 0.0,
            RawValue::Bool(flag) => f64::from(u8::from(*flag)),
            RawValue::Number(value) => *value,
            RawValue::Text(text) => return parse_number(text),
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(ParseMoneyError::NotFinite)
        }
    }

    /// Converts the raw value into fixed-point money.
    pub fn to_money(&self) -> Result<Money, ParseMoneyError> {
        self.to_number().and_then(money_from_f64)
    }

    /// Whether the value counts as absent, e.g. `null`, `""`, `0` or `false`.
    pub fn is_blank(&self) -> bool {
        match self {
            RawValue::Null => true,
            RawValue::Bool(flag) => !flag,
            RawValue::Number(value) => *value == 0.0 || value.is_nan(),
            RawValue::Text(text) => text.is_empty(),
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Null => f.write_str("null"),
            RawValue::Bool(flag) => write!(f, "{flag}"),
            RawValue::Number(value) => write!(f, "{value}"),
            RawValue::Text(text) => f.write_str(text),
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(text: &str) -> Self {
        RawValue::Text(text.to_string())
    }
}

/// Deserializes a field that is present, keeping an explicit `null` as [`RawValue::Null`].
/// Pair with `#[serde(default)]` so an absent field stays `None`.
pub fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<RawValue>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    RawValue::deserialize(deserializer).map(Some)
}

/// Describes an optional raw value for messages, naming absent values explicitly.
pub fn describe(raw: Option<&RawValue>) -> String {
    raw.map_or_else(|| "<missing>".to_string(), RawValue::to_string)
}

/// Formats a parsed number for messages, e.g. -100.0 -> "-100".
pub fn describe_number(value: f64) -> String {
    // -0 prints as 0
    format!("{}", value + 0.0)
}

/// Errors that can occur while turning input into money.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseMoneyError {
    #[error("not a number")]
    InvalidFormat,
    #[error("not a finite number")]
    NotFinite,
    #[error("out of range")]
    OutOfRange,
    #[error("smaller than the smallest unit 0.0001")]
    BelowPrecision,
}

/// Converts a floating-point amount into fixed-point money, rounding half away from zero.
/// A non-zero amount that would round to zero is an error rather than silently lost.
pub fn money_from_f64(value: f64) -> Result<Money, ParseMoneyError> {
    if !value.is_finite() {
        return Err(ParseMoneyError::NotFinite);
    }
    let scaled = (value * DECIMAL_PRECISION).round();
    if scaled.abs() >= i64::MAX as f64 {
        return Err(ParseMoneyError::OutOfRange);
    }
    if scaled == 0.0 && value != 0.0 {
        return Err(ParseMoneyError::BelowPrecision);
    }
    Ok(scaled as Money)
}

/// Parses a decimal string into a finite number.
/// Surrounding whitespace is ignored and a blank string counts as zero.
pub fn parse_number(input: &str) -> Result<f64, ParseMoneyError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(0.0);
    }
    let value: f64 = input.parse().map_err(|_| ParseMoneyError::InvalidFormat)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ParseMoneyError::NotFinite)
    }
}

/// Parses a decimal string into money.
pub fn parse_money(input: &str) -> Result<Money, ParseMoneyError> {
    parse_number(input).and_then(money_from_f64)
}

/// Formats money with two decimal places, e.g. 15005000 -> "1500.50".
pub fn format_money(money: Money) -> String {
    let sign = if money < 0 { "-" } else { "" };
    let ticks = money.unsigned_abs();
    let per_cent = TICKS_PER_CENT as u64;
    let cents = (ticks + per_cent / 2) / per_cent;
    format!("{}{}.{:02}", sign, cents / 100, cents % 100)
}

/// Serializes optional money as a plain number of currency units, or `null`.
pub fn serialize_optional_money<S>(money: &Option<Money>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    money
        .map(|money| money as f64 / DECIMAL_PRECISION)
        .serialize(serializer)
}

//! Transaction requests and the per-transaction validation rules.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bank::types::{
    Money, ParseMoneyError, RawValue, describe, describe_number, deserialize_present,
    format_money, money_from_f64,
};

/// Enum representing the kind of a normalized transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Deposit,
    Withdraw,
}

impl TransactionKind {
    /// Normalizes a raw type name, ignoring case and surrounding whitespace.
    pub fn normalize(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "deposit" => Some(TransactionKind::Deposit),
            "withdraw" => Some(TransactionKind::Withdraw),
            _ => None,
        }
    }
}

/// Reasons a single transaction is rejected. Exactly one applies to any rejected entry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("transaction type is missing")]
    MissingType,
    #[error("transaction type is unknown: {0}")]
    UnknownType(String),
    #[error("amount is not a valid number: {raw} ({cause})")]
    InvalidAmount { raw: String, cause: ParseMoneyError },
    #[error("amount is zero or negative: {0}")]
    NonPositiveAmount(String),
    #[error(
        "withdrawal amount {} is greater than available balance {}",
        money_text(.requested),
        money_text(.available)
    )]
    InsufficientFunds { requested: Money, available: Money },
}

fn money_text(money: &Money) -> String {
    format_money(*money)
}

/// A transaction request as supplied by the caller, before validation.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct TransactionRequest {
    /// The requested transaction type, e.g. "Deposit". Any scalar is accepted.
    #[serde(
        rename = "type",
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    tx_type: Option<RawValue>,

    /// The requested amount, as a number or a string.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    amount: Option<RawValue>,
}

/// A request that passed the type and amount rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedTransaction {
    pub kind: TransactionKind,
    pub amount: Money,
}

impl TransactionRequest {
    pub fn new(tx_type: Option<&str>, amount: Option<RawValue>) -> Self {
        TransactionRequest {
            tx_type: tx_type.map(RawValue::from),
            amount,
        }
    }

    /// Gets the raw transaction type, if any.
    pub fn get_type(&self) -> Option<&RawValue> {
        self.tx_type.as_ref()
    }

    /// Gets the raw amount, if any.
    pub fn get_amount(&self) -> Option<&RawValue> {
        self.amount.as_ref()
    }

    /// Applies the type and amount rules in order; the first failing rule wins.
    /// Funds are checked by the ledger, which owns the running balance.
    pub fn validate(&self) -> Result<ValidatedTransaction, Rejection> {
        let raw_type = match &self.tx_type {
            Some(raw) if !raw.is_blank() => raw.to_string(),
            _ => return Err(Rejection::MissingType),
        };
        let kind = TransactionKind::normalize(&raw_type)
            .ok_or(Rejection::UnknownType(raw_type))?;

        let raw_amount = self.amount.as_ref();
        let invalid = |cause| Rejection::InvalidAmount {
            raw: describe(raw_amount),
            cause,
        };
        let value = raw_amount
            .ok_or(ParseMoneyError::InvalidFormat)
            .and_then(RawValue::to_number)
            .map_err(invalid)?;
        // Sign is checked on the parsed number, before quantizing.
        if value <= 0.0 {
            return Err(Rejection::NonPositiveAmount(describe_number(value)));
        }
        let amount = money_from_f64(value).map_err(invalid)?;

        Ok(ValidatedTransaction { kind, amount })
    }
}

//! Decoding of account batches from JSON documents and CSV transaction lists.
use std::io::Read;

use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::bank::{Account, AccountBatch, RawValue, TransactionRequest};

/// Errors that can occur while reading input.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Reads either a single account object or an array of them.
pub fn read_json<R: Read>(reader: R) -> Result<Vec<AccountBatch>, InputError> {
    let value: Value = serde_json::from_reader(reader)?;
    let batches = match value {
        Value::Array(_) => serde_json::from_value(value)?,
        _ => vec![serde_json::from_value(value)?],
    };
    Ok(batches)
}

/// One `type,amount` row. Empty cells are missing values.
#[derive(Deserialize, Debug)]
struct CsvRow {
    #[serde(rename = "type")]
    tx_type: Option<String>,
    amount: Option<String>,
}

impl CsvRow {
    fn into_request(self) -> TransactionRequest {
        TransactionRequest::new(self.tx_type.as_deref(), self.amount.map(RawValue::Text))
    }
}

/// Reads a `type,amount` CSV into a batch for the given account.
pub fn read_csv<R: Read>(
    reader: R,
    account: Account,
    initial_balance: RawValue,
) -> Result<AccountBatch, InputError> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let transactions = reader
        .deserialize::<CsvRow>()
        .map(|row| row.map(CsvRow::into_request))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(AccountBatch::new(account, initial_balance, transactions))
}

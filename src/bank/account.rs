//! Account details and the batch of requests submitted against them.
use serde::Deserialize;

use crate::bank::{
    LedgerOutcome, RawValue, TransactionRequest, deserialize_present, ledger,
};

/// Identifying details of a bank account, echoed into every summary.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// The account number.
    pub account_number: String,

    /// The name of the account holder.
    pub account_holder_name: String,

    /// ISO currency code, e.g. "USD".
    pub currency: String,
}

impl Account {
    pub fn new(account_number: &str, account_holder_name: &str, currency: &str) -> Self {
        Account {
            account_number: account_number.to_string(),
            account_holder_name: account_holder_name.to_string(),
            currency: currency.to_string(),
        }
    }
}

/// An account together with its raw opening balance and ordered transaction requests.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountBatch {
    #[serde(flatten)]
    pub account: Account,

    /// The opening balance as supplied, before parsing. An explicit `null` counts as zero.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub initial_balance: Option<RawValue>,

    #[serde(default)]
    pub transactions: Vec<TransactionRequest>,
}

impl AccountBatch {
    pub fn new(
        account: Account,
        initial_balance: impl Into<RawValue>,
        transactions: Vec<TransactionRequest>,
    ) -> Self {
        AccountBatch {
            account,
            initial_balance: Some(initial_balance.into()),
            transactions,
        }
    }

    /// Folds the batch through the ledger.
    pub fn process(&self) -> LedgerOutcome {
        ledger::process(
            &self.account,
            self.initial_balance.as_ref(),
            &self.transactions,
        )
    }
}

//! The transaction ledger: folds an ordered batch of requests over a running balance.
use serde::Serialize;
use thiserror::Error;

use crate::bank::{
    Account, ParseMoneyError, Rejection, TransactionKind, TransactionRequest,
    types::{EntryId, Money, RawValue, describe, serialize_optional_money},
};

fn serialize_reason<S>(reason: &Rejection, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(reason)
}

/// Outcome of a single entry.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "status")]
pub enum EntryStatus {
    Applied,
    Rejected {
        #[serde(serialize_with = "serialize_reason")]
        reason: Rejection,
    },
}

/// A request as recorded by the ledger.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// 1-based position of the request in its batch.
    pub id: EntryId,

    #[serde(flatten)]
    pub request: TransactionRequest,

    /// Balance right after the entry was applied. Absent for rejected entries.
    #[serde(
        serialize_with = "serialize_optional_money",
        skip_serializing_if = "Option::is_none"
    )]
    pub balance_after: Option<Money>,

    #[serde(flatten)]
    pub status: EntryStatus,
}

impl LedgerEntry {
    fn applied(id: EntryId, request: &TransactionRequest, balance_after: Money) -> Self {
        LedgerEntry {
            id,
            request: request.clone(),
            balance_after: Some(balance_after),
            status: EntryStatus::Applied,
        }
    }

    fn rejected(id: EntryId, request: &TransactionRequest, reason: Rejection) -> Self {
        LedgerEntry {
            id,
            request: request.clone(),
            balance_after: None,
            status: EntryStatus::Rejected { reason },
        }
    }

    /// Gets the rejection reason, if the entry was rejected.
    pub fn rejection(&self) -> Option<&Rejection> {
        match &self.status {
            EntryStatus::Applied => None,
            EntryStatus::Rejected { reason } => Some(reason),
        }
    }
}

/// Faults that abort a whole batch, as opposed to rejecting a single entry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerFault {
    #[error("initial balance is invalid: {raw} ({source})")]
    InvalidInitialBalance {
        raw: String,
        source: ParseMoneyError,
    },
    #[error("initial balance is negative: {0}")]
    NegativeInitialBalance(String),
    #[error("balance overflow while applying transaction #{0}")]
    BalanceOverflow(EntryId),
}

/// Result of processing one batch.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSummary {
    pub account_number: String,
    pub account_holder_name: String,
    pub currency: String,

    /// Opening balance after parsing. Absent when it could not be parsed.
    #[serde(serialize_with = "serialize_optional_money")]
    pub initial_balance: Option<Money>,

    /// Balance after the last processed entry. Absent when processing never started.
    #[serde(serialize_with = "serialize_optional_money")]
    pub final_balance: Option<Money>,

    pub applied_transactions: Vec<LedgerEntry>,
    pub rejected_transactions: Vec<LedgerEntry>,

    /// Describes how processing ended.
    pub audit_log: String,
}

impl LedgerSummary {
    fn new(account: &Account) -> Self {
        LedgerSummary {
            account_number: account.account_number.clone(),
            account_holder_name: account.account_holder_name.clone(),
            currency: account.currency.clone(),
            initial_balance: None,
            final_balance: None,
            applied_transactions: Vec::new(),
            rejected_transactions: Vec::new(),
            audit_log: String::new(),
        }
    }
}

/// Either a completed batch or one aborted by a system-level fault.
/// Both carry a well-formed summary.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerOutcome {
    Completed(LedgerSummary),
    Failed {
        summary: LedgerSummary,
        fault: LedgerFault,
    },
}

impl LedgerOutcome {
    pub fn summary(&self) -> &LedgerSummary {
        match self {
            LedgerOutcome::Completed(summary) => summary,
            LedgerOutcome::Failed { summary, .. } => summary,
        }
    }

    pub fn into_summary(self) -> LedgerSummary {
        match self {
            LedgerOutcome::Completed(summary) => summary,
            LedgerOutcome::Failed { summary, .. } => summary,
        }
    }

    pub fn fault(&self) -> Option<&LedgerFault> {
        match self {
            LedgerOutcome::Completed(_) => None,
            LedgerOutcome::Failed { fault, .. } => Some(fault),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, LedgerOutcome::Completed(_))
    }
}

/// Effect of one request on the running balance.
enum Step {
    Applied(Money),
    Rejected(Rejection),
}

/// Validates one request against the running balance.
fn step(balance: Money, id: EntryId, request: &TransactionRequest) -> Result<Step, LedgerFault> {
    let tx = match request.validate() {
        Ok(tx) => tx,
        Err(reason) => return Ok(Step::Rejected(reason)),
    };
    match tx.kind {
        TransactionKind::Deposit => balance
            .checked_add(tx.amount)
            .map(Step::Applied)
            .ok_or(LedgerFault::BalanceOverflow(id)),
        TransactionKind::Withdraw if tx.amount > balance => {
            Ok(Step::Rejected(Rejection::InsufficientFunds {
                requested: tx.amount,
                available: balance,
            }))
        }
        TransactionKind::Withdraw => Ok(Step::Applied(balance - tx.amount)),
    }
}

fn parse_initial_balance(raw: Option<&RawValue>) -> Result<Money, LedgerFault> {
    let balance = raw
        .ok_or(ParseMoneyError::InvalidFormat)
        .and_then(RawValue::to_money)
        .map_err(|source| LedgerFault::InvalidInitialBalance {
            raw: describe(raw),
            source,
        })?;
    if balance < 0 {
        return Err(LedgerFault::NegativeInitialBalance(describe(raw)));
    }
    Ok(balance)
}

fn failed(mut summary: LedgerSummary, fault: LedgerFault) -> LedgerOutcome {
    summary.audit_log = format!("Processing failed due to a system error: {fault}.");
    LedgerOutcome::Failed { summary, fault }
}

/// Processes a batch of transaction requests for an account.
///
/// Requests are applied strictly in order. A rejected request is recorded and
/// skipped without touching the balance; a fault aborts the rest of the batch
/// and keeps the balance reached so far.
pub fn process(
    account: &Account,
    initial_balance: Option<&RawValue>,
    transactions: &[TransactionRequest],
) -> LedgerOutcome {
    let summary = LedgerSummary::new(account);
    let opening = match parse_initial_balance(initial_balance) {
        Ok(opening) => opening,
        Err(fault) => return failed(summary, fault),
    };

    let start = LedgerSummary {
        initial_balance: Some(opening),
        ..summary
    };
    let folded = transactions.iter().enumerate().try_fold(
        (opening, start),
        |(balance, mut summary), (index, request)| {
            let id = index + 1;
            match step(balance, id, request) {
                Ok(Step::Applied(next)) => {
                    summary
                        .applied_transactions
                        .push(LedgerEntry::applied(id, request, next));
                    Ok((next, summary))
                }
                Ok(Step::Rejected(reason)) => {
                    summary
                        .rejected_transactions
                        .push(LedgerEntry::rejected(id, request, reason));
                    Ok((balance, summary))
                }
                Err(fault) => Err((balance, summary, fault)),
            }
        },
    );

    match folded {
        Ok((balance, mut summary)) => {
            summary.final_balance = Some(balance);
            summary.audit_log = format!(
                "Processing completed successfully: {} applied, {} rejected.",
                summary.applied_transactions.len(),
                summary.rejected_transactions.len()
            );
            LedgerOutcome::Completed(summary)
        }
        Err((balance, mut summary, fault)) => {
            summary.final_balance = Some(balance);
            failed(summary, fault)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        Account::new("123456789", "Jane Doe", "USD")
    }

    fn tx(tx_type: &str, amount: impl Into<RawValue>) -> TransactionRequest {
        TransactionRequest::new(Some(tx_type), Some(amount.into()))
    }

    fn run(initial: impl Into<RawValue>, transactions: &[TransactionRequest]) -> LedgerOutcome {
        process(&account(), Some(&initial.into()), transactions)
    }

    fn balances(entries: &[LedgerEntry]) -> Vec<Option<Money>> {
        entries.iter().map(|entry| entry.balance_after).collect()
    }

    #[test]
    fn test_empty_batch() {
        let outcome = run(42.0, &[]);
        assert!(outcome.is_completed());
        let summary = outcome.summary();
        assert_eq!(summary.initial_balance, Some(420_000));
        assert_eq!(summary.final_balance, Some(420_000));
        assert!(summary.applied_transactions.is_empty());
        assert!(summary.rejected_transactions.is_empty());
    }

    #[test]
    fn test_only_deposits() {
        let outcome = run("10", &[tx("Deposit", 5.0), tx("deposit", "2.5"), tx("DEPOSIT", 0.25)]);
        let summary = outcome.summary();
        assert_eq!(summary.final_balance, Some(177_500));
        assert_eq!(
            balances(&summary.applied_transactions),
            vec![Some(150_000), Some(175_000), Some(177_500)]
        );
        assert!(summary.rejected_transactions.is_empty());
    }

    #[test]
    fn test_withdraw_after_deposit_exceeding_balance() {
        let outcome = run(0.0, &[tx("Deposit", 100.0), tx("Withdraw", 150.0)]);
        let summary = outcome.summary();
        assert_eq!(summary.final_balance, Some(1_000_000));
        assert_eq!(summary.rejected_transactions.len(), 1);
        let rejected = &summary.rejected_transactions[0];
        assert_eq!(rejected.id, 2);
        assert_eq!(
            rejected.rejection(),
            Some(&Rejection::InsufficientFunds {
                requested: 1_500_000,
                available: 1_000_000,
            })
        );
    }

    #[test]
    fn test_order_changes_rejections() {
        let outcome = run(0.0, &[tx("Withdraw", 150.0), tx("Deposit", 100.0)]);
        let summary = outcome.summary();
        assert_eq!(summary.final_balance, Some(1_000_000));
        let rejected = &summary.rejected_transactions[0];
        assert_eq!(rejected.id, 1);
        assert_eq!(
            rejected.rejection(),
            Some(&Rejection::InsufficientFunds {
                requested: 1_500_000,
                available: 0,
            })
        );
    }

    #[test]
    fn test_withdraw_entire_balance() {
        let outcome = run(100.0, &[tx("Withdraw", 100.0)]);
        assert_eq!(outcome.summary().final_balance, Some(0));
        assert_eq!(outcome.summary().applied_transactions.len(), 1);
    }

    #[test]
    fn test_rejections_leave_balance_untouched() {
        let requests = [
            tx("Deposit", 100.0),
            TransactionRequest::new(None, Some(10.0.into())),
            tx("Transfer", 10.0),
            tx("Deposit", "ten"),
            tx("Withdraw", 0.0),
            tx("Withdraw", 1000.0),
            tx("Withdraw", 25.0),
        ];
        let outcome = run(0.0, &requests);
        let summary = outcome.summary();
        assert_eq!(
            balances(&summary.applied_transactions),
            vec![Some(1_000_000), Some(750_000)]
        );
        assert_eq!(summary.rejected_transactions.len(), 5);
        assert!(
            summary
                .rejected_transactions
                .iter()
                .all(|entry| entry.balance_after.is_none())
        );
    }

    #[test]
    fn test_demonstration_batch() {
        let requests = [
            tx("Deposit", 500.0),
            tx("Withdraw", 250.50),
            tx("Deposit", 0.0),
            tx("Withdraw", -100.0),
            tx("Deposit", "abc"),
            tx("Transfer", 100.0),
            tx("Deposit", 200.0),
            tx("Withdraw", 5000.0),
            TransactionRequest::new(None, Some(50.0.into())),
            tx("Withdraw", 300.0),
        ];
        let outcome = run("1000.50", &requests);
        assert!(outcome.is_completed());
        let summary = outcome.summary();

        assert_eq!(summary.initial_balance, Some(10_005_000));
        assert_eq!(summary.final_balance, Some(11_500_000));

        let applied_ids: Vec<_> = summary.applied_transactions.iter().map(|e| e.id).collect();
        assert_eq!(applied_ids, vec![1, 2, 7, 10]);
        assert_eq!(
            balances(&summary.applied_transactions),
            vec![
                Some(15_005_000),
                Some(12_500_000),
                Some(14_500_000),
                Some(11_500_000)
            ]
        );

        let reasons: Vec<_> = summary
            .rejected_transactions
            .iter()
            .map(|entry| (entry.id, entry.rejection().cloned()))
            .collect();
        assert_eq!(
            reasons,
            vec![
                (3, Some(Rejection::NonPositiveAmount("0".into()))),
                (4, Some(Rejection::NonPositiveAmount("-100".into()))),
                (
                    5,
                    Some(Rejection::InvalidAmount {
                        raw: "abc".into(),
                        cause: ParseMoneyError::InvalidFormat,
                    })
                ),
                (6, Some(Rejection::UnknownType("Transfer".into()))),
                (
                    8,
                    Some(Rejection::InsufficientFunds {
                        requested: 50_000_000,
                        available: 14_500_000,
                    })
                ),
                (9, Some(Rejection::MissingType)),
            ]
        );
        assert_eq!(
            summary.audit_log,
            "Processing completed successfully: 4 applied, 6 rejected."
        );
    }

    #[test]
    fn test_invalid_initial_balance() {
        let outcome = run("NOT A NUMBER", &[tx("Deposit", 100.0)]);
        assert_eq!(
            outcome.fault(),
            Some(&LedgerFault::InvalidInitialBalance {
                raw: "NOT A NUMBER".into(),
                source: ParseMoneyError::InvalidFormat,
            })
        );
        let summary = outcome.summary();
        assert_eq!(summary.initial_balance, None);
        assert_eq!(summary.final_balance, None);
        assert!(summary.applied_transactions.is_empty());
        assert!(summary.rejected_transactions.is_empty());
        assert!(summary.audit_log.contains("initial balance is invalid: NOT A NUMBER"));
    }

    #[test]
    fn test_negative_initial_balance() {
        let outcome = run(-5.0, &[]);
        assert_eq!(
            outcome.fault(),
            Some(&LedgerFault::NegativeInitialBalance("-5".into()))
        );
        assert_eq!(outcome.summary().final_balance, None);
    }

    #[test]
    fn test_missing_initial_balance() {
        let outcome = process(&account(), None, &[]);
        assert!(matches!(
            outcome.fault(),
            Some(LedgerFault::InvalidInitialBalance { raw, .. }) if raw == "<missing>"
        ));
    }

    #[test]
    fn test_sub_unit_deposit_leaves_balance() {
        let outcome = run(0.0, &[tx("Deposit", 0.00004), tx("Deposit", "-100.00")]);
        let summary = outcome.summary();
        assert_eq!(summary.final_balance, Some(0));
        let reasons: Vec<_> = summary
            .rejected_transactions
            .iter()
            .map(|entry| entry.rejection().map(ToString::to_string))
            .collect();
        assert_eq!(
            reasons,
            vec![
                Some(
                    "amount is not a valid number: 0.00004 (smaller than the smallest unit 0.0001)"
                        .to_string()
                ),
                Some("amount is zero or negative: -100".to_string()),
            ]
        );
    }

    #[test]
    fn test_null_initial_balance() {
        let outcome = process(&account(), Some(&RawValue::Null), &[tx("Deposit", 1.0)]);
        assert!(outcome.is_completed());
        assert_eq!(outcome.summary().initial_balance, Some(0));
        assert_eq!(outcome.summary().final_balance, Some(10_000));
    }

    #[test]
    fn test_overflow_aborts_batch() {
        let requests = [
            tx("Deposit", 5e14),
            tx("Deposit", 5e14),
            tx("Deposit", 1.0),
        ];
        let outcome = run(0.0, &requests);
        assert_eq!(outcome.fault(), Some(&LedgerFault::BalanceOverflow(2)));
        let summary = outcome.summary();
        assert_eq!(summary.applied_transactions.len(), 1);
        assert!(summary.rejected_transactions.is_empty());
        assert_eq!(
            summary.final_balance,
            summary.applied_transactions[0].balance_after
        );
        assert!(summary.audit_log.starts_with("Processing failed"));
    }

    #[test]
    fn test_serialize_summary() {
        let outcome = run(10.0, &[tx("Deposit", 5.0), tx("Transfer", 1.0)]);
        let json = serde_json::to_value(outcome.summary()).unwrap();
        assert_eq!(json["accountNumber"], "123456789");
        assert_eq!(json["initialBalance"], 10.0);
        assert_eq!(json["finalBalance"], 15.0);
        assert_eq!(json["appliedTransactions"][0]["status"], "Applied");
        assert_eq!(json["appliedTransactions"][0]["balanceAfter"], 15.0);
        assert_eq!(json["rejectedTransactions"][0]["id"], 2);
        assert_eq!(json["rejectedTransactions"][0]["type"], "Transfer");
        assert_eq!(json["rejectedTransactions"][0]["status"], "Rejected");
        assert_eq!(
            json["rejectedTransactions"][0]["reason"],
            "transaction type is unknown: Transfer"
        );
    }
}

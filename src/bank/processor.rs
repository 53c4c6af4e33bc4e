//! The `Processor` receives account batches over a channel and folds each through the ledger.
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::bank::{AccountBatch, LedgerOutcome, describe, format_money};

/// Runs submitted batches through the ledger and keeps their outcomes in arrival order.
pub struct Processor {
    /// Outcomes of the batches processed so far.
    outcomes: Vec<LedgerOutcome>,
    /// A channel receiver for incoming batches.
    receiver: mpsc::Receiver<AccountBatch>,
}

impl Processor {
    /// Creates a new instance of `Processor` with no outcomes.
    pub fn new(receiver: mpsc::Receiver<AccountBatch>) -> Self {
        Processor {
            outcomes: Vec::new(),
            receiver,
        }
    }

    /// Consumes the processor, returning its outcomes.
    pub fn into_outcomes(self) -> Vec<LedgerOutcome> {
        self.outcomes
    }

    /// Processes one batch and logs how it ended.
    fn process_batch(&mut self, batch: AccountBatch) {
        let outcome = batch.process();
        let summary = outcome.summary();

        for entry in &summary.rejected_transactions {
            if let Some(reason) = entry.rejection() {
                debug!(
                    account = %summary.account_number,
                    id = entry.id,
                    tx_type = %describe(entry.request.get_type()),
                    amount = %describe(entry.request.get_amount()),
                    %reason,
                    "transaction rejected"
                );
            }
        }

        match outcome.fault() {
            None => info!(
                account = %summary.account_number,
                applied = summary.applied_transactions.len(),
                rejected = summary.rejected_transactions.len(),
                final_balance = %summary.final_balance.map(format_money).unwrap_or_default(),
                "batch completed"
            ),
            Some(fault) => error!(
                account = %summary.account_number,
                %fault,
                "batch aborted by system error"
            ),
        }

        self.outcomes.push(outcome);
    }

    /// Runs the processing loop until every sender is dropped.
    pub async fn run(&mut self) {
        while let Some(batch) = self.receiver.recv().await {
            self.process_batch(batch);
        }
    }
}

//! Command-line driver: reads batches, runs them through the processor and prints summaries.
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::bank::{
    Account, AccountBatch, LedgerSummary, Processor, RawValue, TransactionRequest, interest,
};
use crate::input;

/// The size of the channel for submitting batches.
const CHANNEL_SIZE: usize = 100;

/// Validates bank transactions against an account balance
#[derive(Parser, Debug)]
#[command(name = "bank-ledger", version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum InputFormat {
    Json,
    Csv,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process account batches from a file or stdin
    Process {
        /// Input file (defaults to stdin)
        input: Option<PathBuf>,

        /// Input format
        #[arg(short, long, value_enum, default_value = "json")]
        format: InputFormat,

        /// Account number (CSV input only)
        #[arg(long, default_value = "")]
        account_number: String,

        /// Account holder name (CSV input only)
        #[arg(long, default_value = "")]
        holder: String,

        /// Currency code (CSV input only)
        #[arg(long, default_value = "USD")]
        currency: String,

        /// Opening balance (CSV input only)
        #[arg(long, default_value = "0")]
        initial_balance: String,
    },

    /// Run the built-in demonstration accounts
    Demo,

    /// Quote simple and annually compounded interest
    Interest {
        /// Principal amount
        #[arg(long)]
        principal: f64,

        /// Annual rate in percent
        #[arg(long)]
        rate: f64,

        /// Time in years
        #[arg(long)]
        years: f64,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Process {
                input: source,
                format,
                account_number,
                holder,
                currency,
                initial_balance,
            } => {
                let reader: Box<dyn Read> = match &source {
                    Some(path) => Box::new(
                        File::open(path)
                            .with_context(|| format!("failed to open {}", path.display()))?,
                    ),
                    None => Box::new(io::stdin()),
                };
                let reader = BufReader::new(reader);
                let batches = match format {
                    InputFormat::Json => input::read_json(reader)?,
                    InputFormat::Csv => {
                        let account = Account::new(&account_number, &holder, &currency);
                        vec![input::read_csv(
                            reader,
                            account,
                            RawValue::Text(initial_balance),
                        )?]
                    }
                };
                let summaries = process_batches(batches).await?;
                print_json(&summaries)
            }
            Commands::Demo => {
                let summaries = process_batches(demo_batches()).await?;
                print_json(&summaries)
            }
            Commands::Interest {
                principal,
                rate,
                years,
            } => {
                let quote = interest::quote(principal, rate, years)?;
                println!("--- Calculation Results ---");
                println!("Principal: {:.2}", quote.principal);
                println!("Rate: {:.2}%", quote.rate_percent);
                println!("Time: {:.2} years", quote.years);
                println!("Simple Interest: {:.2}", quote.simple);
                println!("Compound Interest: {:.2}", quote.compound);
                Ok(())
            }
        }
    }
}

/// Sends every batch to a processor task and collects the summaries in order.
pub async fn process_batches(batches: Vec<AccountBatch>) -> Result<Vec<LedgerSummary>> {
    let (sender, receiver) = mpsc::channel(CHANNEL_SIZE);
    let mut processor = Processor::new(receiver);

    let handle = tokio::spawn(async move {
        processor.run().await;
        processor
    });

    info!(batches = batches.len(), "submitting batches");
    for batch in batches {
        if let Err(err) = sender.send(batch).await {
            warn!("error sending batch: {err}");
        }
    }

    drop(sender); // Close the sender to signal no more batches will be sent
    let processor = handle
        .await
        .context("failed to join the processing task")?;

    let outcomes = processor.into_outcomes();
    let failed = outcomes.iter().filter(|outcome| !outcome.is_completed()).count();
    if failed > 0 {
        warn!(failed, "some batches were aborted by a system error");
    }

    Ok(outcomes
        .into_iter()
        .map(|outcome| outcome.into_summary())
        .collect())
}

fn print_json(summaries: &[LedgerSummary]) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, summaries)?;
    writeln!(stdout)?;
    Ok(())
}

fn request(tx_type: Option<&str>, amount: impl Into<RawValue>) -> TransactionRequest {
    TransactionRequest::new(tx_type, Some(amount.into()))
}

/// A well-formed account with a mix of valid and invalid requests, and one
/// whose opening balance is corrupt.
pub fn demo_batches() -> Vec<AccountBatch> {
    let valid = AccountBatch::new(
        Account::new("123456789", "Jane Doe", "USD"),
        "1000.50",
        vec![
            request(Some("Deposit"), 500.0),
            request(Some("Withdraw"), 250.50),
            request(Some("Deposit"), 0.0),
            request(Some("Withdraw"), -100.0),
            request(Some("Deposit"), "abc"),
            request(Some("Transfer"), 100.0),
            request(Some("Deposit"), 200.0),
            request(Some("Withdraw"), 5000.0),
            request(None, 50.0),
            request(Some("Withdraw"), 300.0),
        ],
    );
    let corrupt = AccountBatch::new(
        Account::new("999", "Corrupt User", "USD"),
        "NOT A NUMBER",
        vec![request(Some("Deposit"), 100.0)],
    );
    vec![valid, corrupt]
}

//! Banking module for validating transaction batches against an account balance.
mod account;
pub mod interest;
mod ledger;
mod processor;
mod transaction;
mod types;

pub use account::*;
pub use ledger::*;
pub use processor::*;
pub use transaction::*;
pub use types::*;

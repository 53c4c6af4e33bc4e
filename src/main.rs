use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod bank;
mod cli;
mod input;

use cli::Cli;

/// Installs a stderr subscriber so stdout stays machine-readable.
/// `RUST_LOG` takes precedence over the `--verbose` default.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    cli.run().await
}

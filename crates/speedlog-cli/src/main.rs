use clap::Parser;
use speedlog_core::logging;

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging as early as possible.
    let destination = logging::init(cli.log_stderr);
    tracing::debug!(?destination, "logging ready");

    if let Err(err) = cli.run().await {
        eprintln!("speedlog error: {:#}", err);
        std::process::exit(1);
    }
}

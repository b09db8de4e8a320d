//! yd - Yandex.Disk command-line client
//!
//! Resolves transfer links, moves file bytes (with resume by offset) and
//! follows asynchronous server-side operations.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod exit_code;
mod output;
mod poll;

use commands::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // --debug wins over RUST_LOG; logs go to stderr so JSON output stays clean
    let filter = if cli.debug {
        EnvFilter::new("yd=debug,yd_core=debug,yd_http=trace")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let exit_code = commands::execute(cli).await;

    std::process::exit(exit_code.as_i32());
}

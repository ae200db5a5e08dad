//! relaybot - Telegram relay that journals chats to SQLite.

use clap::Parser;
use std::process::ExitCode;

use relaybot::cli::Commands;
use relaybot::logging;

#[tokio::main]
async fn main() -> ExitCode {
    // Keep the guard alive so the file writer flushes on exit.
    let _log_guard = match logging::init() {
        Ok((guard, _)) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let args = Commands::parse();

    match args.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

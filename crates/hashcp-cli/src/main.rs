use std::process::ExitCode;

use hashcp_core::logging;

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() -> ExitCode {
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
        tracing::warn!("state dir unavailable, logging to stderr");
    }

    match CliCommand::run_from_args().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("hashcp: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

mod cli;
mod infra;
mod routes;
mod server;
mod validate;

use grimoveis::error::AppError;
use std::process::ExitCode;

pub async fn run() -> Result<ExitCode, AppError> {
    cli::run().await
}

//! Hearth Cart CLI

use std::process::ExitCode;

use clap::Parser;

use crate::cli::Cli;

mod cli;
mod shutdown;

#[tokio::main]
pub async fn main() -> ExitCode {
    let _env = dotenvy::dotenv();

    let cli = Cli::parse();

    match cli.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            #[expect(
                clippy::print_stderr,
                reason = "command errors are reported to the user, not only logged"
            )]
            {
                eprintln!("{error}");
            }

            ExitCode::FAILURE
        }
    }
}

use clap::{Args, Subcommand};
use hearth_app::{config::AppConfig, database};
use tracing::info;

use super::CliError;

#[derive(Debug, Args)]
pub(crate) struct DbCommand {
    #[command(subcommand)]
    command: DbSubcommand,
}

#[derive(Debug, Subcommand)]
enum DbSubcommand {
    /// Create the carts table and its change trigger
    Init,
}

pub(crate) async fn run(command: DbCommand, config: &AppConfig) -> Result<(), CliError> {
    match command.command {
        DbSubcommand::Init => init(config).await,
    }
}

async fn init(config: &AppConfig) -> Result<(), CliError> {
    let url = config
        .remote
        .database_url
        .as_deref()
        .ok_or(CliError::MissingDatabaseUrl)?;

    let pool = database::connect(url).await.map_err(CliError::Database)?;

    database::ensure_schema(&pool)
        .await
        .map_err(CliError::Database)?;

    info!("cart schema ready");

    Ok(())
}

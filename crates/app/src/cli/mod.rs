use std::io;

use clap::{Parser, Subcommand};
use hearth_app::{
    checkout::CheckoutError,
    config::{AppConfig, ConfigError},
    context::AppInitError,
    observability::{self, ObservabilityError},
    reconciler::ReconcilerError,
    summary::SummaryError,
};
use thiserror::Error;

use crate::shutdown::ShutdownSignalError;

mod cart;
mod db;

#[derive(Debug, Error)]
pub(crate) enum CliError {
    #[error(transparent)]
    Observability(#[from] ObservabilityError),

    #[error(transparent)]
    Init(#[from] AppInitError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Reconciler(#[from] ReconcilerError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Summary(#[from] SummaryError),

    #[error(transparent)]
    Shutdown(#[from] ShutdownSignalError),

    #[error("no database configured; set DATABASE_URL")]
    MissingDatabaseUrl,

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("persistence worker failed: {0}")]
    Persistence(#[from] tokio::task::JoinError),

    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Parser)]
#[command(name = "hearth-app", about = "Hearth cart CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    config: AppConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(flatten)]
    Cart(cart::CartCommand),

    /// Database maintenance
    Db(db::DbCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), CliError> {
        observability::init(&self.config.logging)?;

        match self.command {
            Commands::Cart(command) => cart::run(command, &self.config).await,
            Commands::Db(command) => db::run(command, &self.config).await,
        }
    }
}

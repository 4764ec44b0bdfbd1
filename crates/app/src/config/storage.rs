//! Storage Config

use std::path::PathBuf;

use clap::Args;

/// Local cart slot settings.
#[derive(Debug, Args)]
pub struct StorageConfig {
    /// Path of the local cart file
    #[arg(long, env = "HEARTH_CART_PATH", default_value = ".hearth/cart.json")]
    pub cart_path: PathBuf,
}

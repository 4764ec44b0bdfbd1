//! Application configuration

use clap::Args;

pub mod checkout;
pub mod logging;
pub mod realtime;
pub mod remote;
pub mod storage;

pub use checkout::{CheckoutConfig, ConfigError};
pub use logging::{LogFormat, LoggingConfig};
pub use realtime::RealtimeConfig;
pub use remote::RemoteConfig;
pub use storage::StorageConfig;

/// Hearth configuration, from CLI arguments with environment fallbacks.
#[derive(Debug, Args)]
pub struct AppConfig {
    /// Local cart slot settings.
    #[command(flatten)]
    pub storage: StorageConfig,

    /// Remote replica settings.
    #[command(flatten)]
    pub remote: RemoteConfig,

    /// Change subscription retry settings.
    #[command(flatten)]
    pub realtime: RealtimeConfig,

    /// Checkout handoff settings.
    #[command(flatten)]
    pub checkout: CheckoutConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,
}

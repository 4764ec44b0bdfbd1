//! Remote Config

use clap::Args;
use uuid::Uuid;

/// Remote replica settings. Both values are needed for cross-device sync.
#[derive(Debug, Args)]
pub struct RemoteConfig {
    /// `PostgreSQL` connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Signed-in user; carts are only replicated for a known user
    #[arg(long, env = "HEARTH_USER_UUID")]
    pub user_uuid: Option<Uuid>,

    /// Seconds to wait for a database connection
    #[arg(long, env = "DATABASE_ACQUIRE_TIMEOUT_SECONDS", default_value_t = 5_u64)]
    pub acquire_timeout_seconds: u64,
}

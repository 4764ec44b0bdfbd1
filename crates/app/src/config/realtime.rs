//! Realtime Config

use std::time::Duration;

use clap::Args;

use crate::realtime::Backoff;

/// Change subscription retry settings.
#[derive(Debug, Args)]
pub struct RealtimeConfig {
    /// Delay before the first resubscribe attempt
    #[arg(long, env = "REALTIME_BACKOFF_INITIAL_MS", default_value_t = 500_u64)]
    pub backoff_initial_ms: u64,

    /// Upper bound on the resubscribe delay
    #[arg(long, env = "REALTIME_BACKOFF_MAX_MS", default_value_t = 30_000_u64)]
    pub backoff_max_ms: u64,

    /// Consecutive failures before the subscription gives up
    #[arg(long, env = "REALTIME_MAX_ATTEMPTS", default_value_t = 10_u32)]
    pub max_attempts: u32,
}

impl RealtimeConfig {
    /// The retry schedule. The cap is never below the initial delay and at
    /// least one attempt is made.
    #[must_use]
    pub fn backoff(&self) -> Backoff {
        Backoff {
            initial: Duration::from_millis(self.backoff_initial_ms),
            max: Duration::from_millis(self.backoff_max_ms.max(self.backoff_initial_ms)),
            max_attempts: self.max_attempts.max(1),
        }
    }
}

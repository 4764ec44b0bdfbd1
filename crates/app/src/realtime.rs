//! Realtime cart sync
//!
//! Keeps a change subscription open for the session's user and feeds every
//! notification into [`CartReconciler::merge_remote`]. Each time a
//! subscription opens, the replicated row is read once so writes made while
//! disconnected are not missed. Lost or failed subscriptions are retried with
//! exponential backoff.

use std::{sync::Arc, time::Duration};

use rand::Rng;
use tokio::{task::JoinHandle, time::sleep};
use tracing::{debug, error, info, warn};

use crate::{
    identity::UserUuid, notifications::CartChangeFeed, reconciler::CartReconciler,
    storage::RemoteCartStore,
};

/// Retry schedule for the change subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    /// Delay before the first retry.
    pub initial: Duration,

    /// Upper bound for any single delay.
    pub max: Duration,

    /// Consecutive failures tolerated before giving up.
    pub max_attempts: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(500),
            max: Duration::from_secs(30),
            max_attempts: 10,
        }
    }
}

impl Backoff {
    /// Delay after `attempt` consecutive failures (zero-based), without jitter.
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2_u32.checked_pow(attempt).unwrap_or(u32::MAX);

        self.initial.saturating_mul(factor).min(self.max)
    }

    /// [`Backoff::delay`] plus up to a quarter of it again, so clients that
    /// dropped together don't reconnect together.
    fn jittered(&self, attempt: u32) -> Duration {
        let delay = self.delay(attempt);
        let spread = u64::try_from(delay.as_millis() / 4).unwrap_or(u64::MAX);

        delay.saturating_add(Duration::from_millis(rand::thread_rng().gen_range(0..=spread)))
    }
}

/// A running change subscription.
///
/// Dropping the handle, or calling [`Subscription::unsubscribe`], stops it.
/// Queued cart writes are unaffected.
#[derive(Debug)]
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    /// Stops listening for changes.
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Returns `true` once the subscription has stopped on its own, after
    /// exhausting its retries.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Where remote cart changes come from.
#[derive(Clone)]
pub struct RemoteSource {
    /// Push notifications for the user's row.
    pub feed: Arc<dyn CartChangeFeed>,

    /// The row itself, read after every (re)subscribe.
    pub carts: Arc<dyn RemoteCartStore>,
}

impl std::fmt::Debug for RemoteSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSource").finish_non_exhaustive()
    }
}

/// Starts syncing remote changes for `user` into `reconciler`.
///
/// Must be called from within a Tokio runtime.
pub fn subscribe(
    source: RemoteSource,
    reconciler: Arc<CartReconciler>,
    user: UserUuid,
    backoff: Backoff,
) -> Subscription {
    Subscription {
        task: tokio::spawn(supervise(source, reconciler, user, backoff)),
    }
}

async fn supervise(
    source: RemoteSource,
    reconciler: Arc<CartReconciler>,
    user: UserUuid,
    backoff: Backoff,
) {
    let mut failures = 0_u32;

    loop {
        match source.feed.subscribe(user).await {
            Ok(mut changes) => {
                info!(%user, "subscribed to cart changes");
                failures = 0;

                // Listening before reading leaves no gap for a write to slip through.
                catch_up(source.carts.as_ref(), &reconciler, user).await;

                while let Some(remote) = changes.recv().await {
                    let outcome = reconciler.merge_remote(remote);
                    debug!(%user, ?outcome, "cart change received");
                }

                warn!(%user, "cart change subscription closed");
            }
            Err(error) => {
                warn!(%user, %error, attempt = failures + 1, "failed to subscribe to cart changes");
            }
        }

        failures = failures.saturating_add(1);

        if failures >= backoff.max_attempts {
            error!(%user, failures, "giving up on cart change subscription");
            return;
        }

        let delay = backoff.jittered(failures - 1);
        debug!(%user, ?delay, "retrying cart change subscription");
        sleep(delay).await;
    }
}

async fn catch_up(carts: &dyn RemoteCartStore, reconciler: &CartReconciler, user: UserUuid) {
    match carts.fetch(user).await {
        Ok(Some(current)) => {
            let outcome = reconciler.merge_remote(current);
            debug!(%user, ?outcome, "caught up with replicated cart");
        }
        Ok(None) => debug!(%user, "no replicated cart to catch up with"),
        Err(error) => warn!(%user, %error, "failed to read replicated cart after subscribing"),
    }
}

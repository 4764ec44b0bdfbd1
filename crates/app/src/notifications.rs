//! Cart change notifications
//!
//! A trigger on `carts` publishes the owning user's UUID on
//! [`CART_CHANGES_CHANNEL`] whenever a row is written. Subscribers get the full
//! row for their own user only.

use async_trait::async_trait;
use mockall::automock;
use sqlx::{PgPool, postgres::PgListener};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::{
    identity::UserUuid,
    storage::{PgRemoteCartStore, RemoteCart, RemoteCartStore},
};

/// `LISTEN` channel carrying cart row changes.
pub const CART_CHANGES_CHANNEL: &str = "cart_changes";

const SUBSCRIPTION_BUFFER: usize = 16;

/// Errors raised while opening a change subscription.
#[derive(Debug, Error)]
pub enum ChangeFeedError {
    /// The listener connection could not be opened.
    #[error("failed to listen for cart changes")]
    Listen(#[source] sqlx::Error),
}

#[automock]
#[async_trait]
/// Push notifications for a user's replicated cart.
pub trait CartChangeFeed: Send + Sync {
    /// Opens a subscription to the user's cart row.
    ///
    /// The receiver yields the full row after every write and closes when the
    /// underlying connection is lost.
    async fn subscribe(
        &self,
        user: UserUuid,
    ) -> Result<mpsc::Receiver<RemoteCart>, ChangeFeedError>;
}

/// Change feed backed by `LISTEN` on the carts database.
#[derive(Debug, Clone)]
pub struct PgCartChangeFeed {
    pool: PgPool,
    carts: PgRemoteCartStore,
}

impl PgCartChangeFeed {
    /// Creates a feed that opens a dedicated listener connection per subscription.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            carts: PgRemoteCartStore::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl CartChangeFeed for PgCartChangeFeed {
    async fn subscribe(
        &self,
        user: UserUuid,
    ) -> Result<mpsc::Receiver<RemoteCart>, ChangeFeedError> {
        let mut listener = PgListener::connect_with(&self.pool)
            .await
            .map_err(ChangeFeedError::Listen)?;

        listener
            .listen(CART_CHANGES_CHANNEL)
            .await
            .map_err(ChangeFeedError::Listen)?;

        let (changes, receiver) = mpsc::channel(SUBSCRIPTION_BUFFER);

        tokio::spawn(forward_changes(listener, self.carts.clone(), user, changes));

        Ok(receiver)
    }
}

async fn forward_changes(
    mut listener: PgListener,
    carts: PgRemoteCartStore,
    user: UserUuid,
    changes: mpsc::Sender<RemoteCart>,
) {
    loop {
        let notification = tokio::select! {
            () = changes.closed() => {
                debug!(%user, "cart change subscriber went away");
                return;
            }
            received = listener.try_recv() => received,
        };

        let notification = match notification {
            Ok(Some(notification)) => notification,
            Ok(None) => {
                warn!(%user, "cart change listener lost its connection");
                return;
            }
            Err(error) => {
                warn!(%user, %error, "cart change listener failed");
                return;
            }
        };

        if !is_for_user(notification.payload(), user) {
            continue;
        }

        match carts.fetch(user).await {
            Ok(Some(cart)) => {
                if changes.send(cart).await.is_err() {
                    return;
                }
            }
            Ok(None) => debug!(%user, "changed cart row no longer exists"),
            Err(error) => warn!(%user, %error, "failed to read changed cart"),
        }
    }
}

fn is_for_user(payload: &str, user: UserUuid) -> bool {
    payload.trim().parse::<UserUuid>().is_ok_and(|changed| changed == user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_must_name_the_subscribed_user() {
        let user = UserUuid::new();

        assert!(is_for_user(&user.to_string(), user), "own user matches");
        assert!(
            !is_for_user(&UserUuid::new().to_string(), user),
            "other users are filtered"
        );
        assert!(!is_for_user("not-a-uuid", user), "garbage is filtered");
    }
}

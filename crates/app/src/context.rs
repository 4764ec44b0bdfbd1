//! App Context

use std::{sync::Arc, time::Duration};

use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    config::AppConfig,
    database,
    identity::{StaticIdentity, UserUuid},
    notifications::PgCartChangeFeed,
    realtime::{self, Backoff, RemoteSource, Subscription},
    reconciler::{CartReconciler, PersistenceWorker},
    storage::{FileCartStore, PgRemoteCartStore, RemoteCartStore},
};

/// Errors raised while wiring the application.
#[derive(Debug, Error)]
pub enum AppInitError {
    /// The database URL could not be parsed.
    #[error("invalid database configuration")]
    Database(#[source] sqlx::Error),
}

/// Everything a cart session needs, wired from configuration.
#[derive(Clone, Debug)]
pub struct AppContext {
    /// The session cart.
    pub reconciler: Arc<CartReconciler>,

    /// Remote change source, when a database is configured.
    pub remote: Option<RemoteSource>,

    /// Database pool, when configured.
    pub pool: Option<PgPool>,

    /// Retry schedule for the change subscription.
    pub backoff: Backoff,
}

impl AppContext {
    /// Build application context from configuration.
    ///
    /// The returned worker must be spawned for cart writes to be persisted.
    /// Without a database URL the cart lives on this device only.
    ///
    /// # Errors
    ///
    /// Returns an error when the database URL can't be parsed.
    pub fn from_config(config: &AppConfig) -> Result<(Self, PersistenceWorker), AppInitError> {
        let user = config.remote.user_uuid.map(UserUuid::from_uuid);

        let mut builder = CartReconciler::builder(Arc::new(FileCartStore::new(
            config.storage.cart_path.clone(),
        )))
        .identity(Arc::new(StaticIdentity::new(user)));

        let pool = match &config.remote.database_url {
            Some(url) => Some(
                database::connect_lazy(
                    url,
                    Duration::from_secs(config.remote.acquire_timeout_seconds),
                )
                .map_err(AppInitError::Database)?,
            ),
            None => {
                debug!("no database configured, cart stays on this device");
                None
            }
        };

        let mut remote = None;

        if let Some(pool) = &pool {
            let carts: Arc<dyn RemoteCartStore> = Arc::new(PgRemoteCartStore::new(pool.clone()));

            builder = builder.remote(Arc::clone(&carts));
            remote = Some(RemoteSource {
                feed: Arc::new(PgCartChangeFeed::new(pool.clone())),
                carts,
            });
        }

        let (reconciler, worker) = builder.build();

        Ok((
            Self {
                reconciler: Arc::new(reconciler),
                remote,
                pool,
                backoff: config.realtime.backoff(),
            },
            worker,
        ))
    }

    /// Starts merging remote changes, when signed in with a database.
    ///
    /// Call after the cart has been loaded.
    pub fn subscribe(&self) -> Option<Subscription> {
        let (Some(source), Some(user)) = (&self.remote, self.reconciler.user()) else {
            debug!("realtime sync disabled");
            return None;
        };

        info!(%user, "starting realtime cart sync");

        Some(realtime::subscribe(
            source.clone(),
            Arc::clone(&self.reconciler),
            user,
            self.backoff,
        ))
    }
}

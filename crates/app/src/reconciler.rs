//! Cart reconciler
//!
//! Owns the session's cart. Local mutations apply synchronously and are then
//! queued for persistence; remote copies observed on the change feed are merged
//! last-writer-wins. Persistence is best-effort: a failed write is logged and
//! the in-memory cart stands.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use hearth::{
    cart::{CartAction, CartState, CartUuid, MergeOutcome, NewCartItem, ProductId},
    clock::{Clock, SystemClock},
};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::{
    identity::{IdentityProvider, StaticIdentity, UserUuid},
    storage::{LocalCartStore, RemoteCart, RemoteCartStore},
};

/// Errors returned to callers of the reconciler.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReconcilerError {
    /// The cart hasn't been loaded yet.
    #[error("cart has not been loaded yet")]
    NotReady,
}

#[derive(Debug)]
enum Phase {
    Uninitialized,
    Ready(Session),
}

#[derive(Debug)]
struct Session {
    cart: CartState,
    user: Option<UserUuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PersistTarget {
    LocalOnly,
    LocalAndRemote,
}

#[derive(Debug)]
struct PersistJob {
    cart: CartState,
    user: Option<UserUuid>,
    target: PersistTarget,
}

/// Session cart owner.
pub struct CartReconciler {
    phase: Mutex<Phase>,
    published: watch::Sender<Option<CartState>>,
    jobs: mpsc::UnboundedSender<PersistJob>,
    local: Arc<dyn LocalCartStore>,
    remote: Option<Arc<dyn RemoteCartStore>>,
    identity: Arc<dyn IdentityProvider>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for CartReconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartReconciler")
            .field("phase", &self.phase)
            .field("remote", &self.remote.is_some())
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl CartReconciler {
    /// Starts building a reconciler around the device's local cart slot.
    pub fn builder(local: Arc<dyn LocalCartStore>) -> CartReconcilerBuilder {
        CartReconcilerBuilder {
            local,
            remote: None,
            identity: Arc::new(StaticIdentity::anonymous()),
            clock: Arc::new(SystemClock),
        }
    }

    /// Loads the cart and moves the reconciler to the ready state.
    ///
    /// Reads the local slot, resolves the current user and, when signed in with
    /// a remote store configured, merges the replicated copy. Every step falls
    /// back rather than failing: an unreadable slot starts a fresh cart and a
    /// failed remote read keeps the local one. Calling this on a ready
    /// reconciler returns the current cart.
    pub async fn load(&self) -> CartState {
        if let Some(cart) = self.cart() {
            return cart;
        }

        let mut store_locally = false;

        let mut cart = match self.local.load().await {
            Ok(Some(cart)) => cart,
            Ok(None) => {
                debug!("no stored cart, starting a new one");
                store_locally = true;
                CartState::new(CartUuid::new())
            }
            Err(error) => {
                warn!(%error, "stored cart unreadable, starting a new one");
                store_locally = true;
                CartState::new(CartUuid::new())
            }
        };

        let user = match self.identity.current_user().await {
            Ok(user) => user,
            Err(error) => {
                warn!(%error, "failed to resolve current user, continuing anonymously");
                None
            }
        };

        if let (Some(user), Some(remote)) = (user, &self.remote) {
            match remote.fetch(user).await {
                Ok(Some(replica)) => {
                    let outcome = cart.merge(replica.state);
                    store_locally |= outcome.is_replaced();
                    debug!(%user, ?outcome, "merged replicated cart");
                }
                Ok(None) => debug!(%user, "no replicated cart"),
                Err(error) => warn!(%user, %error, "failed to fetch replicated cart"),
            }
        }

        let cart = {
            let mut phase = self.lock();

            match &*phase {
                // Another caller finished loading first; theirs stands.
                Phase::Ready(session) => return session.cart.clone(),
                Phase::Uninitialized => {
                    if store_locally {
                        self.enqueue(PersistJob {
                            cart: cart.clone(),
                            user,
                            target: PersistTarget::LocalOnly,
                        });
                    }

                    *phase = Phase::Ready(Session {
                        cart: cart.clone(),
                        user,
                    });
                    cart
                }
            }
        };

        info!(cart = %cart.id(), items = cart.items().len(), "cart loaded");

        self.published.send_replace(Some(cart.clone()));

        cart
    }

    /// Returns `true` once [`CartReconciler::load`] has completed.
    pub fn is_ready(&self) -> bool {
        matches!(&*self.lock(), Phase::Ready(_))
    }

    /// The current cart, or `None` before loading.
    pub fn cart(&self) -> Option<CartState> {
        match &*self.lock() {
            Phase::Ready(session) => Some(session.cart.clone()),
            Phase::Uninitialized => None,
        }
    }

    /// The user the cart is replicated for.
    pub fn user(&self) -> Option<UserUuid> {
        match &*self.lock() {
            Phase::Ready(session) => session.user,
            Phase::Uninitialized => None,
        }
    }

    /// Subscribes to cart updates, local and merged.
    pub fn watch(&self) -> watch::Receiver<Option<CartState>> {
        self.published.subscribe()
    }

    /// Applies a local mutation and queues it for persistence.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcilerError::NotReady`] before the cart has been loaded.
    pub fn dispatch(&self, action: CartAction) -> Result<CartState, ReconcilerError> {
        let cart = {
            let mut phase = self.lock();

            let Phase::Ready(session) = &mut *phase else {
                return Err(ReconcilerError::NotReady);
            };

            self.commit(session, action)
        };

        self.published.send_replace(Some(cart.clone()));

        Ok(cart)
    }

    /// Renders the current cart and empties it in one step.
    ///
    /// Nothing can be merged or mutated between `render` seeing the cart and
    /// the cart being cleared. If `render` fails the cart is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcilerError::NotReady`] before the cart has been loaded, or
    /// whatever `render` returns.
    pub fn clear_with<T, E>(&self, render: impl FnOnce(&CartState) -> Result<T, E>) -> Result<T, E>
    where
        E: From<ReconcilerError>,
    {
        let (rendered, cart) = {
            let mut phase = self.lock();

            let Phase::Ready(session) = &mut *phase else {
                return Err(ReconcilerError::NotReady.into());
            };

            let rendered = render(&session.cart)?;

            (rendered, self.commit(session, CartAction::Clear))
        };

        self.published.send_replace(Some(cart));

        Ok(rendered)
    }

    /// Adds one unit of a product.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcilerError::NotReady`] before the cart has been loaded.
    pub fn add_item(&self, item: NewCartItem) -> Result<CartState, ReconcilerError> {
        self.dispatch(CartAction::AddItem(item))
    }

    /// Removes a product's line.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcilerError::NotReady`] before the cart has been loaded.
    pub fn remove_item(&self, id: ProductId) -> Result<CartState, ReconcilerError> {
        self.dispatch(CartAction::RemoveItem(id))
    }

    /// Sets a product's quantity; zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcilerError::NotReady`] before the cart has been loaded.
    pub fn update_quantity(
        &self,
        id: ProductId,
        quantity: i64,
    ) -> Result<CartState, ReconcilerError> {
        self.dispatch(CartAction::UpdateQuantity { id, quantity })
    }

    /// Empties the cart.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcilerError::NotReady`] before the cart has been loaded.
    pub fn clear(&self) -> Result<CartState, ReconcilerError> {
        self.dispatch(CartAction::Clear)
    }

    /// Folds a remote copy into the session cart.
    ///
    /// Copies for another user, or arriving before the cart is loaded, are
    /// discarded. A winning copy is written to the local slot only; it already
    /// exists remotely.
    pub fn merge_remote(&self, remote: RemoteCart) -> MergeOutcome {
        let cart = {
            let mut phase = self.lock();

            let Phase::Ready(session) = &mut *phase else {
                debug!("cart not loaded yet, ignoring remote copy");
                return MergeOutcome::Discarded;
            };

            if session.user != Some(remote.user_uuid) {
                debug!(user = %remote.user_uuid, "remote copy belongs to another user");
                return MergeOutcome::Discarded;
            }

            let local_updated = session.cart.last_updated();
            let remote_updated = remote.state.last_updated();

            let outcome = session.cart.merge(remote.state);

            debug!(local_updated, remote_updated, ?outcome, "remote cart merged");

            if !outcome.is_replaced() {
                return outcome;
            }

            self.enqueue(PersistJob {
                cart: session.cart.clone(),
                user: session.user,
                target: PersistTarget::LocalOnly,
            });

            session.cart.clone()
        };

        self.published.send_replace(Some(cart));

        MergeOutcome::Replaced
    }

    fn commit(&self, session: &mut Session, action: CartAction) -> CartState {
        session.cart.apply(action, self.clock.now_millis());

        // Queue under the lock so writes land in mutation order.
        self.enqueue(PersistJob {
            cart: session.cart.clone(),
            user: session.user,
            target: PersistTarget::LocalAndRemote,
        });

        session.cart.clone()
    }

    fn enqueue(&self, job: PersistJob) {
        if self.jobs.send(job).is_err() {
            warn!("persistence worker stopped, change kept in memory only");
        }
    }

    fn lock(&self) -> MutexGuard<'_, Phase> {
        // Every critical section leaves the phase consistent, so a poisoned
        // lock still guards valid state.
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Wires a [`CartReconciler`] to its collaborators.
pub struct CartReconcilerBuilder {
    local: Arc<dyn LocalCartStore>,
    remote: Option<Arc<dyn RemoteCartStore>>,
    identity: Arc<dyn IdentityProvider>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for CartReconcilerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartReconcilerBuilder")
            .field("remote", &self.remote.is_some())
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl CartReconcilerBuilder {
    /// Replicates the cart to a remote store for signed-in users.
    #[must_use]
    pub fn remote(mut self, remote: Arc<dyn RemoteCartStore>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Resolves the signed-in user at load time. Defaults to anonymous.
    #[must_use]
    pub fn identity(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = identity;
        self
    }

    /// Time source for mutation timestamps. Defaults to the system clock.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Builds the reconciler and the worker that persists its changes.
    ///
    /// The worker must be driven (usually spawned) for writes to happen.
    pub fn build(self) -> (CartReconciler, PersistenceWorker) {
        let (jobs, queue) = mpsc::unbounded_channel();
        let (published, _) = watch::channel(None);

        let worker = PersistenceWorker {
            queue,
            local: Arc::clone(&self.local),
            remote: self.remote.clone(),
        };

        let reconciler = CartReconciler {
            phase: Mutex::new(Phase::Uninitialized),
            published,
            jobs,
            local: self.local,
            remote: self.remote,
            identity: self.identity,
            clock: self.clock,
        };

        (reconciler, worker)
    }
}

/// Drains queued cart writes in order.
pub struct PersistenceWorker {
    queue: mpsc::UnboundedReceiver<PersistJob>,
    local: Arc<dyn LocalCartStore>,
    remote: Option<Arc<dyn RemoteCartStore>>,
}

impl fmt::Debug for PersistenceWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistenceWorker")
            .field("remote", &self.remote.is_some())
            .finish_non_exhaustive()
    }
}

impl PersistenceWorker {
    /// Runs until the reconciler is dropped and the queue is empty.
    pub async fn run(mut self) {
        while let Some(job) = self.queue.recv().await {
            self.persist(job).await;
        }

        debug!("persistence queue drained");
    }

    async fn persist(&self, job: PersistJob) {
        if let Err(error) = self.local.save(&job.cart).await {
            warn!(cart = %job.cart.id(), %error, "failed to store cart locally");
        }

        if job.target == PersistTarget::LocalOnly {
            return;
        }

        let (Some(user), Some(remote)) = (job.user, &self.remote) else {
            return;
        };

        let replica = RemoteCart::new(user, job.cart);

        match remote.upsert(&replica).await {
            Ok(true) => debug!(%user, cart = %replica.cart_uuid, "cart replicated"),
            Ok(false) => debug!(%user, "replicated cart is newer, upsert skipped"),
            Err(error) => warn!(%user, %error, "failed to replicate cart"),
        }
    }
}

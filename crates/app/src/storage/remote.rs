//! Remote cart replica

use async_trait::async_trait;
use hearth::cart::{CartState, CartUuid};
use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use mockall::automock;
use sqlx::{FromRow, PgPool, Postgres, Row, postgres::PgRow, query, query_as, types::Json};
use thiserror::Error;

use crate::identity::UserUuid;

const GET_CART_SQL: &str = include_str!("sql/get_cart.sql");
const UPSERT_CART_SQL: &str = include_str!("sql/upsert_cart.sql");

/// Errors raised by the remote cart store.
#[derive(Debug, Error)]
pub enum RemoteStoreError {
    /// The database could not be reached.
    #[error("remote store unavailable")]
    Unavailable(#[source] sqlx::Error),

    /// A stored payload is not a valid cart.
    #[error("remote cart payload is invalid")]
    InvalidPayload(#[source] sqlx::Error),

    /// Any other storage failure.
    #[error("storage error")]
    Sql(#[source] sqlx::Error),
}

impl From<sqlx::Error> for RemoteStoreError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => Self::Unavailable(error),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                Self::InvalidPayload(error)
            }
            _ => Self::Sql(error),
        }
    }
}

/// A user's cart as replicated to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCart {
    /// Owner of the row.
    pub user_uuid: UserUuid,

    /// Id of the replicated cart.
    pub cart_uuid: CartUuid,

    /// The replicated cart.
    pub state: CartState,

    /// When the row was last written, if it came from the store.
    pub updated_at: Option<Timestamp>,
}

impl RemoteCart {
    /// Wraps a local cart for replication.
    #[must_use]
    pub fn new(user_uuid: UserUuid, state: CartState) -> Self {
        Self {
            user_uuid,
            cart_uuid: state.id(),
            state,
            updated_at: None,
        }
    }
}

#[automock]
#[async_trait]
/// One cart row per user, used for continuity across devices.
pub trait RemoteCartStore: Send + Sync {
    /// Reads the user's replicated cart.
    async fn fetch(&self, user: UserUuid) -> Result<Option<RemoteCart>, RemoteStoreError>;

    /// Writes the cart unless the stored copy is newer.
    ///
    /// Returns `false` when the stored copy won and nothing was written.
    async fn upsert(&self, cart: &RemoteCart) -> Result<bool, RemoteStoreError>;
}

/// Remote store backed by the `carts` table.
#[derive(Debug, Clone)]
pub struct PgRemoteCartStore {
    pool: PgPool,
}

impl PgRemoteCartStore {
    /// Creates a store over an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RemoteCartStore for PgRemoteCartStore {
    async fn fetch(&self, user: UserUuid) -> Result<Option<RemoteCart>, RemoteStoreError> {
        let cart = query_as::<Postgres, RemoteCart>(GET_CART_SQL)
            .bind(user.into_uuid())
            .fetch_optional(&self.pool)
            .await?;

        Ok(cart)
    }

    async fn upsert(&self, cart: &RemoteCart) -> Result<bool, RemoteStoreError> {
        let rows_affected = query(UPSERT_CART_SQL)
            .bind(cart.user_uuid.into_uuid())
            .bind(cart.cart_uuid.into_uuid())
            .bind(Json(&cart.state))
            .bind(cart.state.last_updated())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }
}

impl<'r> FromRow<'r, PgRow> for RemoteCart {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let Json(state) = row.try_get::<Json<CartState>, _>("payload")?;

        Ok(Self {
            user_uuid: UserUuid::from_uuid(row.try_get("user_uuid")?),
            cart_uuid: CartUuid::from_uuid(row.try_get("cart_uuid")?),
            state,
            updated_at: Some(row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff()),
        })
    }
}

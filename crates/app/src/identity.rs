//! User identity

use async_trait::async_trait;
use hearth::uuids::TypedUuid;
use mockall::automock;
use thiserror::Error;

/// Authenticated storefront user.
#[derive(Debug)]
pub enum User {}

/// User UUID
pub type UserUuid = TypedUuid<User>;

/// Errors raised while resolving the current user.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The identity backend could not be reached.
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

#[automock]
#[async_trait]
/// Resolves who is using the storefront.
pub trait IdentityProvider: Send + Sync {
    /// Returns the signed-in user, or `None` for an anonymous session.
    async fn current_user(&self) -> Result<Option<UserUuid>, IdentityError>;
}

/// Identity fixed at start-up.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticIdentity {
    user: Option<UserUuid>,
}

impl StaticIdentity {
    /// An identity for `user`, or anonymous for `None`.
    #[must_use]
    pub fn new(user: Option<UserUuid>) -> Self {
        Self { user }
    }

    /// An identity with no signed-in user.
    #[must_use]
    pub fn anonymous() -> Self {
        Self { user: None }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_user(&self) -> Result<Option<UserUuid>, IdentityError> {
        Ok(self.user)
    }
}

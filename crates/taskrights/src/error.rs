//! Error types for the rights facade.

use taskrights_core::{CoreError, UserId};
use taskrights_perms::PermsError;
use taskrights_store::StoreError;
use thiserror::Error;

/// Errors that can occur during rights operations.
#[derive(Debug, Error)]
pub enum RightsError {
    /// A right value outside the enumerated set was supplied.
    #[error("invalid right: {0}")]
    InvalidRight(i64),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// The decision could not be made.
    #[error("permission error: {0}")]
    Permission(#[from] PermsError),

    /// The actor lacks the right the operation requires.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// No registered user with this id.
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// No link share with this hash.
    #[error("link share not found")]
    LinkShareNotFound,

    /// The operation does not apply to this actor or resource.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

impl RightsError {
    /// Revoking a grant that does not exist: "nothing to revoke", not a
    /// failure.
    pub fn is_benign(&self) -> bool {
        matches!(self, RightsError::Store(StoreError::GrantNotFound { .. }))
    }

    /// A referenced entity does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RightsError::Store(
                StoreError::ResourceNotFound(_)
                    | StoreError::GranteeNotFound(_)
                    | StoreError::OwnerNotFound(_)
            ) | RightsError::Permission(PermsError::ResourceNotFound(_))
                | RightsError::UserNotFound(_)
                | RightsError::LinkShareNotFound
        )
    }

    /// The store failed; the outcome is unknown.
    pub fn is_backing_store(&self) -> bool {
        match self {
            RightsError::Store(e) => e.is_backing_store(),
            RightsError::Permission(e) => e.is_backing_store(),
            _ => false,
        }
    }
}

impl From<CoreError> for RightsError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidRight(raw) => RightsError::InvalidRight(raw),
            other => RightsError::InvalidOperation(other.to_string()),
        }
    }
}

/// Result type for rights operations.
pub type Result<T> = std::result::Result<T, RightsError>;

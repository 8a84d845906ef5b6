//! Error types for the store module.

use taskrights_core::{CoreError, Grantee, ResourceRef, UserId};
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced resource does not exist.
    #[error("resource not found: {0}")]
    ResourceNotFound(ResourceRef),

    /// The user or team a grant targets does not exist.
    #[error("grantee not found: {0}")]
    GranteeNotFound(Grantee),

    /// A resource names an owner that is not a registered user.
    #[error("owner not found: {0}")]
    OwnerNotFound(UserId),

    /// Revoke targeted a grant that does not exist.
    #[error("{grantee} has no grant on {resource}")]
    GrantNotFound {
        resource: ResourceRef,
        grantee: Grantee,
    },

    /// A resource with this kind and id is already registered.
    #[error("resource already exists: {0}")]
    ResourceExists(ResourceRef),

    /// A link share with this hash already exists.
    #[error("link share hash already in use")]
    HashInUse,

    /// A right value outside the enumerated set was read or supplied.
    #[error("invalid right: {0}")]
    InvalidRight(i64),

    /// Invalid data supplied or found in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// The backend could not be reached (poisoned lock, failed worker task).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether this is a failure of the backing store itself rather than a
    /// statement about the data.
    pub fn is_backing_store(&self) -> bool {
        matches!(
            self,
            StoreError::Database(_)
                | StoreError::Migration(_)
                | StoreError::Unavailable(_)
        )
    }
}

impl From<CoreError> for StoreError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidRight(raw) => StoreError::InvalidRight(raw),
            other => StoreError::InvalidData(other.to_string()),
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backing_store_classification() {
        assert!(StoreError::Unavailable("poisoned".into()).is_backing_store());
        assert!(StoreError::Migration("v2".into()).is_backing_store());
        assert!(StoreError::Database(rusqlite::Error::InvalidQuery).is_backing_store());

        assert!(!StoreError::InvalidData("bad kind".into()).is_backing_store());
        assert!(!StoreError::ResourceNotFound(ResourceRef::task(1)).is_backing_store());
        assert!(!StoreError::HashInUse.is_backing_store());
    }

    #[test]
    fn test_core_errors_lift() {
        assert!(matches!(
            StoreError::from(CoreError::InvalidRight(7)),
            StoreError::InvalidRight(7)
        ));
        assert!(matches!(
            StoreError::from(CoreError::InvalidKind("folder".into())),
            StoreError::InvalidData(_)
        ));
    }
}

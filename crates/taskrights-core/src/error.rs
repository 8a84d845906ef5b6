//! Error types for taskrights core.

use thiserror::Error;

/// Core errors raised while validating boundary values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A right value outside `{0, 1, 2}` was supplied.
    #[error("invalid right: {0}")]
    InvalidRight(i64),

    /// A resource kind discriminator outside the known set.
    #[error("invalid resource kind: {0}")]
    InvalidKind(String),

    /// A grantee kind discriminator outside the known set.
    #[error("invalid grantee kind: {0}")]
    InvalidGranteeKind(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

//! Error types for the permissions module.

use taskrights_core::{ResourceKind, ResourceRef};
use taskrights_store::StoreError;
use thiserror::Error;

/// Errors that can occur while evaluating a capability.
///
/// Any error means "could not determine". Gates never turn one into an
/// allow; callers decide how to surface it.
#[derive(Debug, Error)]
pub enum PermsError {
    /// The resource (or an ancestor on the delegation path) does not exist.
    #[error("resource not found: {0}")]
    ResourceNotFound(ResourceRef),

    /// The parent chain loops back on itself.
    #[error("hierarchy cycle at {0}")]
    HierarchyCycle(ResourceRef),

    /// The parent chain is longer than the configured bound.
    #[error("hierarchy below {resource} exceeds {max} levels")]
    HierarchyTooDeep { resource: ResourceRef, max: usize },

    /// A stored parent has a kind the child may not nest under.
    #[error("{child} cannot nest under {parent}")]
    ParentKindMismatch {
        child: ResourceRef,
        parent: ResourceRef,
    },

    /// A new resource of kind `child` was asked for under a parent it
    /// cannot nest under.
    #[error("a {child} cannot be created under {parent}")]
    InvalidParentKind {
        child: ResourceKind,
        parent: ResourceRef,
    },

    /// The grant store or resource loader failed.
    #[error("backing store error: {0}")]
    BackingStore(StoreError),
}

impl PermsError {
    /// Whether the failure came from the store rather than from the data.
    pub fn is_backing_store(&self) -> bool {
        matches!(self, PermsError::BackingStore(e) if e.is_backing_store())
    }
}

impl From<StoreError> for PermsError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::ResourceNotFound(resource) => PermsError::ResourceNotFound(resource),
            other => PermsError::BackingStore(other),
        }
    }
}

/// Result type for permission operations.
pub type Result<T> = std::result::Result<T, PermsError>;

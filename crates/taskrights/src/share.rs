//! Boundary objects for sharing administration.

use serde::{Deserialize, Serialize};
use taskrights_core::{GrantId, Grantee, Right};

/// A request to share a resource, as received from a caller.
///
/// The right is kept raw until [`ShareRequest::right`] validates it, so a
/// malformed value is rejected before anything is looked up or written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareRequest {
    pub grantee: Grantee,
    pub right: i64,
}

impl ShareRequest {
    pub fn new(grantee: impl Into<Grantee>, right: impl Into<i64>) -> Self {
        Self {
            grantee: grantee.into(),
            right: right.into(),
        }
    }

    /// The validated right.
    pub fn right(&self) -> crate::Result<Right> {
        Ok(Right::validate(self.right)?)
    }
}

/// One entry of a share listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedWith {
    /// The grant; also the id of the share relation.
    pub grant: GrantId,
    pub grantee: Grantee,
    /// Display name of the user or team.
    pub name: String,
    pub right: Right,
    pub created_at: i64,
    pub updated_at: i64,
}

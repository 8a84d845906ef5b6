//! Grants: who holds which right on which resource.
//!
//! There is at most one active grant per (grantee, resource) pair. Granting
//! again to the same grantee replaces the right; it never adds a second row.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::right::Right;
use crate::types::{GrantId, ResourceKind, ResourceRef, TeamId, UserId};

/// Whether a grant applies to a single user or to every member of a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GranteeKind {
    User,
    Team,
}

impl GranteeKind {
    /// Stable storage name.
    pub fn as_str(self) -> &'static str {
        match self {
            GranteeKind::User => "user",
            GranteeKind::Team => "team",
        }
    }

    /// The relation kind a grant of this grantee kind is addressed as.
    pub fn relation_kind(self) -> ResourceKind {
        match self {
            GranteeKind::User => ResourceKind::UserShare,
            GranteeKind::Team => ResourceKind::TeamShare,
        }
    }
}

impl FromStr for GranteeKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(GranteeKind::User),
            "team" => Ok(GranteeKind::Team),
            other => Err(CoreError::InvalidGranteeKind(other.to_string())),
        }
    }
}

/// The receiving side of a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Grantee {
    User(UserId),
    Team(TeamId),
}

impl Grantee {
    pub fn kind(self) -> GranteeKind {
        match self {
            Grantee::User(_) => GranteeKind::User,
            Grantee::Team(_) => GranteeKind::Team,
        }
    }

    /// The raw numeric id, without its kind.
    pub fn raw_id(self) -> i64 {
        match self {
            Grantee::User(id) => id.0,
            Grantee::Team(id) => id.0,
        }
    }

    /// Rebuild a grantee from its stored parts.
    pub fn from_parts(kind: GranteeKind, id: i64) -> Self {
        match kind {
            GranteeKind::User => Grantee::User(UserId(id)),
            GranteeKind::Team => Grantee::Team(TeamId(id)),
        }
    }
}

impl From<UserId> for Grantee {
    fn from(id: UserId) -> Self {
        Grantee::User(id)
    }
}

impl From<TeamId> for Grantee {
    fn from(id: TeamId) -> Self {
        Grantee::Team(id)
    }
}

impl fmt::Display for Grantee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grantee::User(id) => write!(f, "{id}"),
            Grantee::Team(id) => write!(f, "{id}"),
        }
    }
}

/// A stored grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    /// Stable row id; survives right updates.
    pub id: GrantId,

    /// Who receives the right.
    pub grantee: Grantee,

    /// What the right applies to.
    pub resource: ResourceRef,

    /// The right held.
    pub right: Right,

    /// When the grant was first created (Unix ms).
    pub created_at: i64,

    /// When the right was last changed (Unix ms).
    pub updated_at: i64,
}

impl Grant {
    /// The relation resource this grant is addressed as.
    pub fn relation(&self) -> ResourceRef {
        ResourceRef::new(self.grantee.kind().relation_kind(), self.id.0)
    }
}

/// Result of an upsert into the grant store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantOutcome {
    /// No grant existed for the grantee; one was created.
    Created(GrantId),
    /// A grant existed; its right was replaced.
    Updated {
        /// The existing row.
        id: GrantId,
        /// The right before the update.
        previous: Right,
    },
}

impl GrantOutcome {
    pub fn id(&self) -> GrantId {
        match self {
            GrantOutcome::Created(id) => *id,
            GrantOutcome::Updated { id, .. } => *id,
        }
    }
}

//! Actors: the identities on whose behalf operations are attempted.
//!
//! A user actor carries a snapshot of its team memberships, taken once when
//! the actor is resolved. Membership changes made afterwards are not seen by
//! evaluations that use this snapshot.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::right::Right;
use crate::types::{LinkShareId, ResourceRef, TeamId, UserId};

/// A link-share token: one resource, one fixed right.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkShare {
    /// Record id.
    pub id: LinkShareId,

    /// Opaque token handed out in the share link.
    pub hash: String,

    /// The only resource this token can ever act on.
    pub resource: ResourceRef,

    /// The right the token carries on `resource`.
    pub right: Right,

    /// Who created the link.
    pub shared_by: UserId,
}

/// A registered user together with its team-membership snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserActor {
    pub id: UserId,
    pub teams: BTreeSet<TeamId>,
}

/// Who is asking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Actor {
    /// A registered user.
    User(UserActor),
    /// An anonymous holder of a link-share token.
    LinkShare(LinkShare),
}

/// Discriminator for [`Actor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorKind {
    User,
    LinkShare,
}

impl Actor {
    /// A user actor with the given team snapshot.
    pub fn user(id: UserId, teams: impl IntoIterator<Item = TeamId>) -> Self {
        Actor::User(UserActor {
            id,
            teams: teams.into_iter().collect(),
        })
    }

    /// A user actor that belongs to no team.
    pub fn lone_user(id: UserId) -> Self {
        Self::user(id, [])
    }

    /// A link-share actor.
    pub fn link_share(share: LinkShare) -> Self {
        Actor::LinkShare(share)
    }

    pub fn kind(&self) -> ActorKind {
        match self {
            Actor::User(_) => ActorKind::User,
            Actor::LinkShare(_) => ActorKind::LinkShare,
        }
    }

    /// The user id, if this is a user actor.
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Actor::User(user) => Some(user.id),
            Actor::LinkShare(_) => None,
        }
    }

    /// Team memberships. Always empty for link shares.
    pub fn teams(&self) -> impl Iterator<Item = TeamId> + '_ {
        let teams = match self {
            Actor::User(user) => Some(user.teams.iter().copied()),
            Actor::LinkShare(_) => None,
        };
        teams.into_iter().flatten()
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::User(user) => write!(f, "{}", user.id),
            Actor::LinkShare(share) => write!(f, "{} on {}", share.id, share.resource),
        }
    }
}

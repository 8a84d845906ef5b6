//! Strong type definitions for taskrights.
//!
//! All identifiers are newtypes to prevent misuse at compile time: a
//! `TeamId` can never be passed where a `UserId` is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Get the raw numeric id.
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

id_newtype!(
    /// A registered user.
    UserId,
    "user"
);

id_newtype!(
    /// A team of users.
    TeamId,
    "team"
);

id_newtype!(
    /// A stored grant row. Also the id of the share relation it represents.
    GrantId,
    "grant"
);

id_newtype!(
    /// A link-share token record.
    LinkShareId,
    "link-share"
);

/// The kinds of resource a capability check can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Project,
    Bucket,
    Task,
    SavedFilter,
    /// A user-to-resource sharing relation, addressed by its [`GrantId`].
    UserShare,
    /// A team-to-resource sharing relation, addressed by its [`GrantId`].
    TeamShare,
}

const SHAREABLE: &[ResourceKind] = &[
    ResourceKind::Project,
    ResourceKind::Bucket,
    ResourceKind::Task,
    ResourceKind::SavedFilter,
];

impl ResourceKind {
    /// Every kind, in declaration order.
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Project,
        ResourceKind::Bucket,
        ResourceKind::Task,
        ResourceKind::SavedFilter,
        ResourceKind::UserShare,
        ResourceKind::TeamShare,
    ];

    /// Kinds a resource of this kind may nest under.
    ///
    /// An empty slice means the kind is always top-level.
    pub fn parent_kinds(self) -> &'static [ResourceKind] {
        match self {
            ResourceKind::Project | ResourceKind::Bucket | ResourceKind::Task => {
                &[ResourceKind::Project]
            }
            ResourceKind::SavedFilter => &[],
            ResourceKind::UserShare | ResourceKind::TeamShare => SHAREABLE,
        }
    }

    /// Whether the kind can never have a parent.
    pub fn is_top_level(self) -> bool {
        self.parent_kinds().is_empty()
    }

    /// Whether every resource of this kind must nest under another.
    ///
    /// Projects may nest but need not.
    pub fn requires_parent(self) -> bool {
        !self.is_top_level() && self != ResourceKind::Project
    }

    /// Whether the kind is a sharing relation rather than content.
    pub fn is_relation(self) -> bool {
        matches!(self, ResourceKind::UserShare | ResourceKind::TeamShare)
    }

    /// Whether grants may target resources of this kind.
    pub fn is_shareable(self) -> bool {
        !self.is_relation()
    }

    /// Stable storage name.
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Project => "project",
            ResourceKind::Bucket => "bucket",
            ResourceKind::Task => "task",
            ResourceKind::SavedFilter => "saved_filter",
            ResourceKind::UserShare => "user_share",
            ResourceKind::TeamShare => "team_share",
        }
    }
}

impl FromStr for ResourceKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| CoreError::InvalidKind(s.to_string()))
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference to one resource instance: its kind plus its numeric id.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub id: i64,
}

impl ResourceRef {
    /// Create a new resource reference.
    pub const fn new(kind: ResourceKind, id: i64) -> Self {
        Self { kind, id }
    }

    pub const fn project(id: i64) -> Self {
        Self::new(ResourceKind::Project, id)
    }

    pub const fn bucket(id: i64) -> Self {
        Self::new(ResourceKind::Bucket, id)
    }

    pub const fn task(id: i64) -> Self {
        Self::new(ResourceKind::Task, id)
    }

    pub const fn saved_filter(id: i64) -> Self {
        Self::new(ResourceKind::SavedFilter, id)
    }

    pub const fn user_share(grant: GrantId) -> Self {
        Self::new(ResourceKind::UserShare, grant.0)
    }

    pub const fn team_share(grant: GrantId) -> Self {
        Self::new(ResourceKind::TeamShare, grant.0)
    }
}

impl fmt::Debug for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceRef({}#{})", self.kind, self.id)
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

/// The persisted facts about a resource that the rights engine needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Which resource this is.
    pub resource: ResourceRef,

    /// The user who created it. Never changes.
    pub owner: UserId,

    /// The resource it delegates to, if it nests.
    pub parent: Option<ResourceRef>,
}

impl ResourceRecord {
    /// A record with no parent.
    pub fn top_level(resource: ResourceRef, owner: UserId) -> Self {
        Self {
            resource,
            owner,
            parent: None,
        }
    }

    /// A record nested under `parent`.
    pub fn nested(resource: ResourceRef, owner: UserId, parent: ResourceRef) -> Self {
        Self {
            resource,
            owner,
            parent: Some(parent),
        }
    }

    /// Whether the parent (or its absence) fits this record's kind.
    pub fn has_valid_parent_kind(&self) -> bool {
        match self.parent {
            None => !self.resource.kind.requires_parent(),
            Some(parent) => self.resource.kind.parent_kinds().contains(&parent.kind),
        }
    }
}

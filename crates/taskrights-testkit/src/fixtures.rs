//! Test fixtures and helpers.
//!
//! [`World`] seeds one small, fixed set of users, teams, resources and
//! shares into any backend, so the same scenario can be checked against
//! every store.

use taskrights::{Rights, RightsConfig, ShareRequest};
use taskrights_core::{Actor, ResourceKind, ResourceRef, Right, TeamId, UserId};
use taskrights_store::{MemoryStore, SqliteStore, Store};

/// Owns everything in the world except [`OTHER_PROJECT`].
pub const OWNER: UserId = UserId(1);
/// Member of [`TEAM`]; no direct grants, owns nothing.
pub const MEMBER: UserId = UserId(2);
/// No teams, no grants. Owns [`OTHER_PROJECT`].
pub const STRANGER: UserId = UserId(3);

/// Holds ReadWrite on [`PROJECT`].
pub const TEAM: TeamId = TeamId(1);

pub const PROJECT: ResourceRef = ResourceRef::project(1);
pub const BUCKET: ResourceRef = ResourceRef::bucket(1);
pub const TASK: ResourceRef = ResourceRef::task(1);
pub const OTHER_PROJECT: ResourceRef = ResourceRef::project(2);

/// A Read link share on [`PROJECT`].
pub const LINK_HASH: &str = "read-only-link";

/// The seeded world:
///
/// - [`OWNER`] created [`PROJECT`] with [`BUCKET`] and [`TASK`] inside it
/// - [`TEAM`] (containing [`MEMBER`]) has ReadWrite on [`PROJECT`]
/// - [`STRANGER`] created [`OTHER_PROJECT`]
/// - [`LINK_HASH`] reads [`PROJECT`]
pub struct World<S: Store> {
    pub rights: Rights<S>,
}

impl<S: Store> World<S> {
    /// Seed the world into an empty store.
    pub async fn seed(store: S) -> taskrights::Result<Self> {
        store.insert_user(OWNER, "Olivia Owner").await?;
        store.insert_user(MEMBER, "Max Member").await?;
        store.insert_user(STRANGER, "Sam Stranger").await?;
        store.insert_team(TEAM, "Editors").await?;
        store.add_team_member(TEAM, MEMBER).await?;

        let rights = Rights::new(store, RightsConfig::default());
        let owner = rights.actor_for_user(OWNER).await?;
        let stranger = rights.actor_for_user(STRANGER).await?;

        rights
            .create_resource(&owner, ResourceKind::Project, PROJECT.id, None)
            .await?;
        rights
            .create_resource(&owner, ResourceKind::Bucket, BUCKET.id, Some(PROJECT))
            .await?;
        rights
            .create_resource(&owner, ResourceKind::Task, TASK.id, Some(PROJECT))
            .await?;
        rights
            .create_resource(&stranger, ResourceKind::Project, OTHER_PROJECT.id, None)
            .await?;

        rights
            .share(&owner, &PROJECT, &ShareRequest::new(TEAM, Right::ReadWrite))
            .await?;
        rights
            .create_link_share(&owner, &PROJECT, Right::Read, LINK_HASH)
            .await?;

        Ok(Self { rights })
    }

    /// A user actor with its current team snapshot.
    pub async fn actor(&self, user: UserId) -> taskrights::Result<Actor> {
        self.rights.actor_for_user(user).await
    }

    /// The actor behind [`LINK_HASH`].
    pub async fn link_actor(&self) -> taskrights::Result<Actor> {
        self.rights.actor_for_link_share(LINK_HASH).await
    }
}

impl World<MemoryStore> {
    pub async fn memory() -> taskrights::Result<Self> {
        Self::seed(MemoryStore::new()).await
    }
}

impl World<SqliteStore> {
    pub async fn sqlite() -> taskrights::Result<Self> {
        Self::seed(SqliteStore::open_memory()?).await
    }
}

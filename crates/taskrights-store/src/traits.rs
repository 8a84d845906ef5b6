//! Store traits: the abstract interfaces the rights engine consumes.
//!
//! Three concerns, one backend:
//!
//! - [`ResourceLoader`] resolves a resource to its owner and parent.
//! - [`Directory`] knows users, teams, memberships, and link shares.
//! - [`GrantStore`] holds user and team grants.
//!
//! [`Store`] is implemented for anything that provides all three.

use async_trait::async_trait;
use taskrights_core::{
    Grant, GrantId, GrantOutcome, Grantee, LinkShare, ResourceRecord, ResourceRef, Right, TeamId,
    UserId,
};

use crate::error::{Result, StoreError};

/// Resolves resources to the facts the evaluator needs.
#[async_trait]
pub trait ResourceLoader: Send + Sync {
    /// Load a resource's owner and parent.
    ///
    /// Returns `None` if the resource does not exist. Relation kinds
    /// (`UserShare`, `TeamShare`) resolve through their grant row.
    async fn load_resource(&self, resource: &ResourceRef) -> Result<Option<ResourceRecord>>;

    /// Register a new resource.
    ///
    /// # Errors
    /// - `ResourceExists` if the kind and id are taken (ownership never
    ///   transfers by re-registering).
    /// - `OwnerNotFound` if the owner is not a registered user.
    /// - `ResourceNotFound` if the parent does not exist.
    /// - `InvalidData` for relation kinds or a parent of the wrong kind.
    async fn insert_resource(&self, record: &ResourceRecord) -> Result<()>;

    /// Remove a resource, all of its descendants, and every grant and link
    /// share on any of them.
    ///
    /// Returns the removed resources, the requested one first.
    async fn remove_resource(&self, resource: &ResourceRef) -> Result<Vec<ResourceRef>>;

    /// Whether `user` owns `resource`.
    async fn is_owner(&self, resource: &ResourceRef, user: UserId) -> Result<bool> {
        let record = self
            .load_resource(resource)
            .await?
            .ok_or(StoreError::ResourceNotFound(*resource))?;
        Ok(record.owner == user)
    }
}

/// Users, teams, memberships, and link-share tokens.
#[async_trait]
pub trait Directory: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Users and Teams
    // ─────────────────────────────────────────────────────────────────────────

    /// Register a user. Re-registering renames.
    async fn insert_user(&self, id: UserId, name: &str) -> Result<()>;

    /// Register a team. Re-registering renames.
    async fn insert_team(&self, id: TeamId, name: &str) -> Result<()>;

    /// Add a user to a team. Adding an existing member is a no-op.
    async fn add_team_member(&self, team: TeamId, user: UserId) -> Result<()>;

    /// Remove a user from a team. Removing a non-member is a no-op.
    async fn remove_team_member(&self, team: TeamId, user: UserId) -> Result<()>;

    /// The user's display name, or `None` if the user does not exist.
    async fn user_name(&self, id: UserId) -> Result<Option<String>>;

    /// The team's display name, or `None` if the team does not exist.
    async fn team_name(&self, id: TeamId) -> Result<Option<String>>;

    /// Teams the user belongs to, ascending.
    async fn teams_of(&self, user: UserId) -> Result<Vec<TeamId>>;

    /// Display name of either kind of grantee.
    async fn grantee_name(&self, grantee: Grantee) -> Result<Option<String>> {
        match grantee {
            Grantee::User(id) => self.user_name(id).await,
            Grantee::Team(id) => self.team_name(id).await,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Link Shares
    // ─────────────────────────────────────────────────────────────────────────

    /// Store a new link share and assign it an id.
    ///
    /// # Errors
    /// - `ResourceNotFound` if the resource does not exist.
    /// - `OwnerNotFound` if `shared_by` is not a registered user.
    /// - `HashInUse` if the hash is taken.
    async fn insert_link_share(
        &self,
        resource: &ResourceRef,
        right: Right,
        hash: &str,
        shared_by: UserId,
    ) -> Result<LinkShare>;

    /// Look up a link share by its token hash.
    async fn link_share_by_hash(&self, hash: &str) -> Result<Option<LinkShare>>;
}

/// Grants of rights to users and teams.
///
/// Mutations are serialized per backend; an upsert and a revoke on the same
/// (grantee, resource) key never interleave.
#[async_trait]
pub trait GrantStore: Send + Sync {
    /// Insert or replace the grant for `grantee` on `resource`.
    ///
    /// # Errors
    /// - `GranteeNotFound` if the user or team does not exist.
    /// - `ResourceNotFound` if the resource does not exist.
    /// - `InvalidData` if the resource kind is not shareable.
    ///
    /// Nothing is written when an error is returned.
    async fn grant(
        &self,
        resource: &ResourceRef,
        grantee: Grantee,
        right: Right,
    ) -> Result<GrantOutcome>;

    /// Remove the grant for `grantee` on `resource`.
    ///
    /// # Errors
    /// - `GrantNotFound` if there is no such grant. Callers usually treat
    ///   this as "nothing to revoke".
    async fn revoke(&self, resource: &ResourceRef, grantee: Grantee) -> Result<()>;

    /// The right `grantee` holds directly on `resource`, if any.
    async fn grant_for(&self, resource: &ResourceRef, grantee: Grantee) -> Result<Option<Right>>;

    /// All grants on `resource`, in insertion order.
    async fn grants_for_resource(&self, resource: &ResourceRef) -> Result<Vec<Grant>>;

    /// A grant by its row id.
    async fn grant_by_id(&self, id: GrantId) -> Result<Option<Grant>>;
}

/// A complete backend.
pub trait Store: GrantStore + ResourceLoader + Directory {}

impl<T: GrantStore + ResourceLoader + Directory + ?Sized> Store for T {}

/// Per-grantee-kind conveniences over [`GrantStore`].
#[async_trait]
pub trait GrantStoreExt: GrantStore {
    async fn grant_to_user(
        &self,
        resource: &ResourceRef,
        user: UserId,
        right: Right,
    ) -> Result<GrantOutcome> {
        self.grant(resource, Grantee::User(user), right).await
    }

    async fn grant_to_team(
        &self,
        resource: &ResourceRef,
        team: TeamId,
        right: Right,
    ) -> Result<GrantOutcome> {
        self.grant(resource, Grantee::Team(team), right).await
    }

    async fn revoke_from_user(&self, resource: &ResourceRef, user: UserId) -> Result<()> {
        self.revoke(resource, Grantee::User(user)).await
    }

    async fn revoke_from_team(&self, resource: &ResourceRef, team: TeamId) -> Result<()> {
        self.revoke(resource, Grantee::Team(team)).await
    }

    async fn grant_for_user(&self, resource: &ResourceRef, user: UserId) -> Result<Option<Right>> {
        self.grant_for(resource, Grantee::User(user)).await
    }

    async fn grant_for_team(&self, resource: &ResourceRef, team: TeamId) -> Result<Option<Right>> {
        self.grant_for(resource, Grantee::Team(team)).await
    }
}

impl<S: GrantStore + ?Sized> GrantStoreExt for S {}

/// Build the record of a share relation from its grant and the shared
/// resource.
///
/// The relation nests under the shared resource and inherits its owner.
/// Returns `None` if the relation kind does not match the grantee kind.
pub(crate) fn relation_record(
    relation: &ResourceRef,
    grant: &Grant,
    shared: &ResourceRecord,
) -> Option<ResourceRecord> {
    if grant.grantee.kind().relation_kind() != relation.kind {
        return None;
    }
    Some(ResourceRecord::nested(*relation, shared.owner, grant.resource))
}

/// Checks every backend runs before registering a resource, once the
/// parent (if any) has been looked up.
pub(crate) fn check_new_resource(
    record: &ResourceRecord,
    parent_exists: bool,
) -> Result<()> {
    if record.resource.kind.is_relation() {
        return Err(StoreError::InvalidData(format!(
            "{} resources are created by granting, not registered",
            record.resource.kind
        )));
    }
    if !record.has_valid_parent_kind() {
        return Err(StoreError::InvalidData(format!(
            "{} cannot nest under {:?}",
            record.resource.kind, record.parent
        )));
    }
    if let Some(parent) = record.parent {
        if !parent_exists {
            return Err(StoreError::ResourceNotFound(parent));
        }
    }
    Ok(())
}

/// Reject grants on relation kinds.
pub(crate) fn check_shareable(resource: &ResourceRef) -> Result<()> {
    if resource.kind.is_shareable() {
        Ok(())
    } else {
        Err(StoreError::InvalidData(format!(
            "{} cannot be shared",
            resource.kind
        )))
    }
}

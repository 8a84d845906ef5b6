//! The rights facade: one entry point for checks, resource lifecycle,
//! and sharing administration.

use std::sync::Arc;

use taskrights_core::{
    Actor, GrantId, GrantOutcome, Grantee, LinkShare, ResourceKind, ResourceRecord, ResourceRef,
    Right, UserId,
};
use taskrights_perms::{Capability, CapabilityGate, GateConfig};
use taskrights_store::{Store, StoreError};

use crate::config::RightsConfig;
use crate::error::{Result, RightsError};
use crate::share::{ShareRequest, SharedWith};

/// Rights resolution over a store.
///
/// Provides:
/// - Actor resolution for users and link-share tokens
/// - Create/read/update/delete checks per resource kind
/// - Resource registration and cascading removal
/// - Sharing with users and teams, and link shares
///
/// Every check evaluates afresh; nothing is cached between calls.
pub struct Rights<S: Store> {
    /// The storage backend.
    store: Arc<S>,
    /// Configuration.
    config: RightsConfig,
    /// Gate view of the configuration.
    gate: GateConfig,
}

impl<S: Store> Rights<S> {
    /// Create a new rights instance.
    pub fn new(store: S, config: RightsConfig) -> Self {
        Self::with_shared_store(Arc::new(store), config)
    }

    /// Create a rights instance over a store shared with other components.
    pub fn with_shared_store(store: Arc<S>, config: RightsConfig) -> Self {
        let gate = config.gate();
        Self {
            store,
            config,
            gate,
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &RightsConfig {
        &self.config
    }

    /// A gate over this instance's store and policy.
    pub fn gate(&self) -> CapabilityGate<'_, S> {
        CapabilityGate::new(&*self.store, &self.gate)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Actors
    // ─────────────────────────────────────────────────────────────────────────

    /// Resolve a user into an actor, snapshotting its team membership.
    pub async fn actor_for_user(&self, user: UserId) -> Result<Actor> {
        if self.store.user_name(user).await?.is_none() {
            return Err(RightsError::UserNotFound(user));
        }
        let teams = self.store.teams_of(user).await?;
        Ok(Actor::user(user, teams))
    }

    /// Resolve a link-share token into an actor.
    pub async fn actor_for_link_share(&self, hash: &str) -> Result<Actor> {
        let share = self
            .store
            .link_share_by_hash(hash)
            .await?
            .ok_or(RightsError::LinkShareNotFound)?;
        Ok(Actor::link_share(share))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Checks
    // ─────────────────────────────────────────────────────────────────────────

    /// Whether `actor` may create a resource of `kind` under `parent`, or
    /// at the top level when `parent` is `None`.
    pub async fn can_create(
        &self,
        actor: &Actor,
        parent: Option<&ResourceRef>,
        kind: ResourceKind,
    ) -> Result<bool> {
        Ok(self.gate().can_create(actor, parent, kind).await?)
    }

    pub async fn can_read(&self, actor: &Actor, resource: &ResourceRef) -> Result<bool> {
        Ok(self.gate().can_read(actor, resource).await?)
    }

    pub async fn can_update(&self, actor: &Actor, resource: &ResourceRef) -> Result<bool> {
        Ok(self.gate().can_update(actor, resource).await?)
    }

    pub async fn can_delete(&self, actor: &Actor, resource: &ResourceRef) -> Result<bool> {
        Ok(self.gate().can_delete(actor, resource).await?)
    }

    /// Whether `actor` holds Admin on `resource`.
    pub async fn can_admin(&self, actor: &Actor, resource: &ResourceRef) -> Result<bool> {
        Ok(self.gate().can_admin(actor, resource).await?)
    }

    /// Fail with `Forbidden` unless `actor` may perform `capability` on
    /// `resource`.
    ///
    /// For [`Capability::Create`] `resource` is the parent the new resource
    /// would nest under.
    pub async fn authorize(
        &self,
        actor: &Actor,
        resource: &ResourceRef,
        capability: Capability,
    ) -> Result<()> {
        if self.gate().check(actor, resource, capability).await? {
            return Ok(());
        }
        tracing::debug!(actor = ?actor.kind(), %resource, %capability, "denied");
        Err(RightsError::Forbidden(format!("{capability} on {resource}")))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Resource Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a resource owned by `actor`.
    ///
    /// The creator becomes the permanent owner. Link shares cannot create
    /// resources, and share relations are created by [`Rights::share`].
    pub async fn create_resource(
        &self,
        actor: &Actor,
        kind: ResourceKind,
        id: i64,
        parent: Option<ResourceRef>,
    ) -> Result<ResourceRecord> {
        let owner = actor.user_id().ok_or_else(|| {
            RightsError::InvalidOperation("link shares cannot create resources".into())
        })?;
        if kind.is_relation() {
            return Err(RightsError::InvalidOperation(format!(
                "{kind} is created by sharing"
            )));
        }

        if !self.can_create(actor, parent.as_ref(), kind).await? {
            return Err(RightsError::Forbidden(match parent {
                Some(parent) => format!("create {kind} under {parent}"),
                None => format!("create top-level {kind}"),
            }));
        }

        let resource = ResourceRef::new(kind, id);
        let record = match parent {
            Some(parent) => ResourceRecord::nested(resource, owner, parent),
            None => ResourceRecord::top_level(resource, owner),
        };
        self.store.insert_resource(&record).await?;

        tracing::debug!(%resource, %owner, "created resource");
        Ok(record)
    }

    /// Delete a resource with everything nested under it.
    ///
    /// Deleting a share relation revokes the grant behind it. Returns the
    /// removed resources, the requested one first.
    pub async fn delete_resource(
        &self,
        actor: &Actor,
        resource: &ResourceRef,
    ) -> Result<Vec<ResourceRef>> {
        self.authorize(actor, resource, Capability::Delete).await?;

        if resource.kind.is_relation() {
            let grant = self
                .store
                .grant_by_id(GrantId(resource.id))
                .await?
                .ok_or(StoreError::ResourceNotFound(*resource))?;
            self.store.revoke(&grant.resource, grant.grantee).await?;
            tracing::debug!(%resource, "deleted share relation");
            return Ok(vec![*resource]);
        }

        let removed = self.store.remove_resource(resource).await?;
        tracing::debug!(%resource, count = removed.len(), "deleted resource");
        Ok(removed)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sharing
    // ─────────────────────────────────────────────────────────────────────────

    /// Share `resource` with a user or team, or change the right of an
    /// existing share.
    ///
    /// The right is validated before anything else. Only a user may share,
    /// and it must hold Admin on the resource.
    pub async fn share(
        &self,
        actor: &Actor,
        resource: &ResourceRef,
        request: &ShareRequest,
    ) -> Result<GrantOutcome> {
        let right = request.right()?;
        if actor.user_id().is_none() {
            return Err(RightsError::InvalidOperation(
                "link shares cannot share resources".into(),
            ));
        }
        let relation = request.grantee.kind().relation_kind();

        if !self.can_create(actor, Some(resource), relation).await? {
            tracing::debug!(actor = ?actor.kind(), %resource, "share denied");
            return Err(RightsError::Forbidden(format!("share {resource}")));
        }

        let outcome = self.store.grant(resource, request.grantee, right).await?;
        tracing::debug!(%resource, grantee = %request.grantee, %right, "shared");
        Ok(outcome)
    }

    /// Stop sharing `resource` with `grantee`.
    ///
    /// A missing grant surfaces as a benign error
    /// (see [`RightsError::is_benign`]).
    pub async fn unshare(
        &self,
        actor: &Actor,
        resource: &ResourceRef,
        grantee: Grantee,
    ) -> Result<()> {
        if actor.user_id().is_none() {
            return Err(RightsError::InvalidOperation(
                "link shares cannot unshare resources".into(),
            ));
        }
        let wanted = self.gate.policy(grantee.kind().relation_kind()).delete;
        let gate = self.gate();
        if !gate.evaluator().evaluate(actor, resource, wanted).await? {
            tracing::debug!(actor = ?actor.kind(), %resource, "unshare denied");
            return Err(RightsError::Forbidden(format!("unshare {resource}")));
        }

        self.store.revoke(resource, grantee).await?;
        tracing::debug!(%resource, %grantee, "unshared");
        Ok(())
    }

    /// Who `resource` is shared with.
    ///
    /// Filters by a case-insensitive substring of the grantee's name and
    /// returns one page; pages start at 1 and page 0 is read as 1.
    pub async fn list_shares(
        &self,
        actor: &Actor,
        resource: &ResourceRef,
        search: &str,
        page: usize,
    ) -> Result<Vec<SharedWith>> {
        self.authorize(actor, resource, Capability::Read).await?;

        let needle = search.to_lowercase();
        let mut matching = Vec::new();
        for grant in self.store.grants_for_resource(resource).await? {
            let Some(name) = self.store.grantee_name(grant.grantee).await? else {
                continue;
            };
            if !name.to_lowercase().contains(&needle) {
                continue;
            }
            matching.push(SharedWith {
                grant: grant.id,
                grantee: grant.grantee,
                name,
                right: grant.right,
                created_at: grant.created_at,
                updated_at: grant.updated_at,
            });
        }

        let page_size = self.config.page_size;
        let skip = page.max(1).saturating_sub(1).saturating_mul(page_size);
        Ok(matching.into_iter().skip(skip).take(page_size).collect())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Link Shares
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a link share on a project.
    ///
    /// Requires ReadWrite on the project, and Admin to hand out Admin.
    pub async fn create_link_share(
        &self,
        actor: &Actor,
        project: &ResourceRef,
        right: Right,
        hash: &str,
    ) -> Result<LinkShare> {
        if project.kind != ResourceKind::Project {
            return Err(RightsError::InvalidOperation(format!(
                "link shares apply to projects, not {}",
                project.kind
            )));
        }
        let shared_by = actor.user_id().ok_or_else(|| {
            RightsError::InvalidOperation("link shares cannot create link shares".into())
        })?;

        let wanted = right.max(Right::ReadWrite);
        let gate = self.gate();
        if !gate.evaluator().evaluate(actor, project, wanted).await? {
            tracing::debug!(user = %shared_by, %project, %right, "link share denied");
            return Err(RightsError::Forbidden(format!("link share {right} on {project}")));
        }

        let share = self
            .store
            .insert_link_share(project, right, hash, shared_by)
            .await?;
        tracing::debug!(%project, %right, id = %share.id, "created link share");
        Ok(share)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskrights_core::TeamId;
    use taskrights_perms::PermsError;
    use taskrights_store::{Directory, GrantStore, MemoryStore, ResourceLoader};

    const OWNER: UserId = UserId(1);
    const GUEST: UserId = UserId(2);

    async fn rights() -> Rights<MemoryStore> {
        let store = MemoryStore::new();
        store.insert_user(OWNER, "Olivia").await.unwrap();
        store.insert_user(GUEST, "Gus").await.unwrap();
        store.insert_team(TeamId(1), "Gardeners").await.unwrap();
        store.add_team_member(TeamId(1), GUEST).await.unwrap();
        Rights::new(store, RightsConfig::default())
    }

    #[tokio::test]
    async fn test_actor_for_user_snapshots_teams() {
        let rights = rights().await;
        let actor = rights.actor_for_user(GUEST).await.unwrap();
        assert_eq!(actor.teams().collect::<Vec<_>>(), vec![TeamId(1)]);

        let err = rights.actor_for_user(UserId(9)).await.unwrap_err();
        assert!(matches!(err, RightsError::UserNotFound(UserId(9))));
    }

    #[tokio::test]
    async fn test_create_sets_owner() {
        let rights = rights().await;
        let owner = rights.actor_for_user(OWNER).await.unwrap();

        let record = rights
            .create_resource(&owner, ResourceKind::Project, 1, None)
            .await
            .unwrap();
        assert_eq!(record.owner, OWNER);

        let err = rights
            .create_resource(&owner, ResourceKind::Project, 1, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RightsError::Store(StoreError::ResourceExists(_))));
    }

    #[tokio::test]
    async fn test_create_under_unshared_parent_forbidden() {
        let rights = rights().await;
        let owner = rights.actor_for_user(OWNER).await.unwrap();
        let guest = rights.actor_for_user(GUEST).await.unwrap();
        rights
            .create_resource(&owner, ResourceKind::Project, 1, None)
            .await
            .unwrap();

        let err = rights
            .create_resource(&guest, ResourceKind::Task, 1, Some(ResourceRef::project(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, RightsError::Forbidden(_)));
        assert!(rights
            .store()
            .load_resource(&ResourceRef::task(1))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_share_rejects_invalid_right_first() {
        let rights = rights().await;
        let guest = rights.actor_for_user(GUEST).await.unwrap();

        // Nothing exists yet; the right is still checked first.
        let err = rights
            .share(&guest, &ResourceRef::project(5), &ShareRequest::new(GUEST, 99))
            .await
            .unwrap_err();
        assert!(matches!(err, RightsError::InvalidRight(99)));
    }

    #[tokio::test]
    async fn test_authorize_maps_denial_to_forbidden() {
        let rights = rights().await;
        let owner = rights.actor_for_user(OWNER).await.unwrap();
        let guest = rights.actor_for_user(GUEST).await.unwrap();
        let project = ResourceRef::project(1);
        rights
            .create_resource(&owner, ResourceKind::Project, 1, None)
            .await
            .unwrap();
        rights
            .share(&owner, &project, &ShareRequest::new(TeamId(1), Right::ReadWrite))
            .await
            .unwrap();

        rights
            .authorize(&guest, &project, Capability::Update)
            .await
            .unwrap();
        let err = rights
            .authorize(&guest, &project, Capability::Delete)
            .await
            .unwrap_err();
        assert!(matches!(err, RightsError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_authorize_create_names_the_new_kind() {
        let rights = rights().await;
        let owner = rights.actor_for_user(OWNER).await.unwrap();
        let guest = rights.actor_for_user(GUEST).await.unwrap();
        let project = ResourceRef::project(1);
        rights
            .create_resource(&owner, ResourceKind::Project, 1, None)
            .await
            .unwrap();
        rights
            .create_resource(&owner, ResourceKind::Bucket, 1, Some(project))
            .await
            .unwrap();
        rights
            .create_resource(&owner, ResourceKind::SavedFilter, 1, None)
            .await
            .unwrap();

        for kind in [ResourceKind::Bucket, ResourceKind::Task] {
            rights
                .authorize(&owner, &project, Capability::Create(kind))
                .await
                .unwrap();
            let err = rights
                .authorize(&guest, &project, Capability::Create(kind))
                .await
                .unwrap_err();
            assert!(matches!(err, RightsError::Forbidden(_)));
        }
        rights
            .authorize(
                &owner,
                &ResourceRef::saved_filter(1),
                Capability::Create(ResourceKind::UserShare),
            )
            .await
            .unwrap();

        let err = rights
            .authorize(
                &owner,
                &ResourceRef::bucket(1),
                Capability::Create(ResourceKind::Task),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RightsError::Permission(PermsError::InvalidParentKind {
                child: ResourceKind::Task,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_delete_share_relation_revokes() {
        let rights = rights().await;
        let owner = rights.actor_for_user(OWNER).await.unwrap();
        rights
            .create_resource(&owner, ResourceKind::Project, 1, None)
            .await
            .unwrap();
        let outcome = rights
            .share(&owner, &ResourceRef::project(1), &ShareRequest::new(GUEST, Right::Read))
            .await
            .unwrap();

        let relation = ResourceRef::user_share(outcome.id());
        let removed = rights.delete_resource(&owner, &relation).await.unwrap();
        assert_eq!(removed, vec![relation]);
        assert!(rights
            .store()
            .grant_by_id(outcome.id())
            .await
            .unwrap()
            .is_none());
    }
}

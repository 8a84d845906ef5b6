//! Capability gates.
//!
//! Each resource kind maps its four operations to a required right through
//! a [`CapabilityPolicy`]. The gate turns that into one [`Evaluator`] call;
//! it never mutates anything while checking.

use std::collections::HashMap;
use std::fmt;

use taskrights_core::{Actor, ResourceKind, ResourceRef, Right};
use taskrights_store::{GrantStore, ResourceLoader};

use crate::error::{PermsError, Result};
use crate::evaluator::{Evaluator, EvaluatorConfig};

/// An operation on a resource.
///
/// `Create` names the kind of the new resource; the resource it is checked
/// against is the parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Create(ResourceKind),
    Read,
    Update,
    Delete,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Create(kind) => write!(f, "create {kind}"),
            Capability::Read => write!(f, "read"),
            Capability::Update => write!(f, "update"),
            Capability::Delete => write!(f, "delete"),
        }
    }
}

/// The right each operation requires on one resource kind.
///
/// `create` is checked against the parent the new resource will nest under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityPolicy {
    pub create: Right,
    pub read: Right,
    pub update: Right,
    pub delete: Right,
}

impl CapabilityPolicy {
    /// The built-in policy for `kind`.
    ///
    /// Deleting a project or a saved filter removes everyone's access, so it
    /// takes Admin. Share relations are administered with Admin throughout.
    pub const fn builtin(kind: ResourceKind) -> Self {
        use Right::*;
        match kind {
            ResourceKind::Project | ResourceKind::SavedFilter => Self {
                create: ReadWrite,
                read: Read,
                update: ReadWrite,
                delete: Admin,
            },
            ResourceKind::Bucket | ResourceKind::Task => Self {
                create: ReadWrite,
                read: Read,
                update: ReadWrite,
                delete: ReadWrite,
            },
            ResourceKind::UserShare | ResourceKind::TeamShare => Self {
                create: Admin,
                read: Read,
                update: Admin,
                delete: Admin,
            },
        }
    }

    /// The right `capability` requires.
    pub fn required(&self, capability: Capability) -> Right {
        match capability {
            Capability::Create(_) => self.create,
            Capability::Read => self.read,
            Capability::Update => self.update,
            Capability::Delete => self.delete,
        }
    }
}

/// Gate configuration.
#[derive(Debug, Clone, Default)]
pub struct GateConfig {
    pub evaluator: EvaluatorConfig,

    /// Replacements for the built-in policy, per kind.
    pub policy_overrides: HashMap<ResourceKind, CapabilityPolicy>,
}

impl GateConfig {
    /// The policy in force for `kind`.
    pub fn policy(&self, kind: ResourceKind) -> CapabilityPolicy {
        self.policy_overrides
            .get(&kind)
            .copied()
            .unwrap_or_else(|| CapabilityPolicy::builtin(kind))
    }
}

/// Create/read/update/delete checks for every resource kind.
pub struct CapabilityGate<'a, S: ?Sized> {
    evaluator: Evaluator<'a, S>,
    config: &'a GateConfig,
}

impl<'a, S> CapabilityGate<'a, S>
where
    S: ResourceLoader + GrantStore + ?Sized,
{
    pub fn new(store: &'a S, config: &'a GateConfig) -> Self {
        Self {
            evaluator: Evaluator::new(store, config.evaluator),
            config,
        }
    }

    pub fn evaluator(&self) -> &Evaluator<'a, S> {
        &self.evaluator
    }

    /// Whether `actor` may create a resource of `kind` under `parent`.
    ///
    /// Without a parent, any user may create a kind that can stand alone;
    /// link shares never create top-level resources.
    pub async fn can_create(
        &self,
        actor: &Actor,
        parent: Option<&ResourceRef>,
        kind: ResourceKind,
    ) -> Result<bool> {
        let Some(parent) = parent else {
            return Ok(matches!(actor, Actor::User(_)) && !kind.requires_parent());
        };
        if !kind.parent_kinds().contains(&parent.kind) {
            return Err(PermsError::InvalidParentKind {
                child: kind,
                parent: *parent,
            });
        }
        let wanted = self.config.policy(kind).create;
        self.evaluator.evaluate(actor, parent, wanted).await
    }

    pub async fn can_read(&self, actor: &Actor, resource: &ResourceRef) -> Result<bool> {
        self.check(actor, resource, Capability::Read).await
    }

    pub async fn can_update(&self, actor: &Actor, resource: &ResourceRef) -> Result<bool> {
        self.check(actor, resource, Capability::Update).await
    }

    pub async fn can_delete(&self, actor: &Actor, resource: &ResourceRef) -> Result<bool> {
        self.check(actor, resource, Capability::Delete).await
    }

    /// Whether `actor` holds Admin on `resource`, as required to change who
    /// it is shared with.
    pub async fn can_admin(&self, actor: &Actor, resource: &ResourceRef) -> Result<bool> {
        self.evaluator.evaluate(actor, resource, Right::Admin).await
    }

    /// Check `capability` on `resource`, per the policy of its kind.
    ///
    /// For [`Capability::Create`] `resource` is the parent of the new
    /// resource and the policy of the new kind applies.
    pub async fn check(
        &self,
        actor: &Actor,
        resource: &ResourceRef,
        capability: Capability,
    ) -> Result<bool> {
        if let Capability::Create(kind) = capability {
            return self.can_create(actor, Some(resource), kind).await;
        }
        let wanted = self.config.policy(resource.kind).required(capability);
        let allowed = self.evaluator.evaluate(actor, resource, wanted).await?;
        tracing::trace!(%resource, %capability, %wanted, allowed, "gate");
        Ok(allowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskrights_core::{LinkShare, LinkShareId, ResourceRecord, TeamId, UserId};
    use taskrights_store::{Directory, GrantStoreExt, MemoryStore};

    const U1: UserId = UserId(1);
    const U2: UserId = UserId(2);
    const TM1: TeamId = TeamId(1);

    async fn scenario() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_user(U1, "u1").await.unwrap();
        store.insert_user(U2, "u2").await.unwrap();
        store.insert_team(TM1, "tm1").await.unwrap();
        store.add_team_member(TM1, U2).await.unwrap();
        store
            .insert_resource(&ResourceRecord::top_level(ResourceRef::project(1), U1))
            .await
            .unwrap();
        store
            .insert_resource(&ResourceRecord::nested(
                ResourceRef::bucket(1),
                U1,
                ResourceRef::project(1),
            ))
            .await
            .unwrap();
        store
            .grant_to_team(&ResourceRef::project(1), TM1, Right::ReadWrite)
            .await
            .unwrap();
        store
    }

    fn u2() -> Actor {
        Actor::user(U2, [TM1])
    }

    #[test]
    fn test_builtin_policy() {
        let project = CapabilityPolicy::builtin(ResourceKind::Project);
        assert_eq!(project.required(Capability::Delete), Right::Admin);
        assert_eq!(project.required(Capability::Update), Right::ReadWrite);

        let task = CapabilityPolicy::builtin(ResourceKind::Task);
        assert_eq!(task.required(Capability::Delete), Right::ReadWrite);

        let share = CapabilityPolicy::builtin(ResourceKind::TeamShare);
        assert_eq!(share.required(Capability::Create(ResourceKind::TeamShare)), Right::Admin);
        assert_eq!(share.required(Capability::Read), Right::Read);
    }

    #[tokio::test]
    async fn test_team_read_write_on_project() {
        let store = scenario().await;
        let config = GateConfig::default();
        let gate = CapabilityGate::new(&store, &config);
        let project = ResourceRef::project(1);

        assert!(gate.can_read(&u2(), &project).await.unwrap());
        assert!(gate.can_update(&u2(), &project).await.unwrap());
        assert!(!gate.can_delete(&u2(), &project).await.unwrap());
        assert!(!gate.can_admin(&u2(), &project).await.unwrap());
    }

    #[tokio::test]
    async fn test_bucket_through_project() {
        let store = scenario().await;
        let config = GateConfig::default();
        let gate = CapabilityGate::new(&store, &config);
        let bucket = ResourceRef::bucket(1);

        assert!(gate.can_update(&u2(), &bucket).await.unwrap());
        assert!(gate.can_delete(&u2(), &bucket).await.unwrap());
    }

    #[tokio::test]
    async fn test_owner_bypasses_policy() {
        let store = scenario().await;
        let config = GateConfig::default();
        let gate = CapabilityGate::new(&store, &config);
        let owner = Actor::lone_user(U1);

        for resource in [ResourceRef::project(1), ResourceRef::bucket(1)] {
            assert!(gate.can_read(&owner, &resource).await.unwrap());
            assert!(gate.can_update(&owner, &resource).await.unwrap());
            assert!(gate.can_delete(&owner, &resource).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_create_checks_parent() {
        let store = scenario().await;
        let config = GateConfig::default();
        let gate = CapabilityGate::new(&store, &config);
        let project = ResourceRef::project(1);

        assert!(gate
            .can_create(&u2(), Some(&project), ResourceKind::Task)
            .await
            .unwrap());
        // Sharing the project requires Admin on it.
        assert!(!gate
            .can_create(&u2(), Some(&project), ResourceKind::UserShare)
            .await
            .unwrap());
        assert!(gate
            .can_create(&Actor::lone_user(U1), Some(&project), ResourceKind::UserShare)
            .await
            .unwrap());

        let err = gate
            .can_create(&u2(), Some(&ResourceRef::bucket(1)), ResourceKind::Task)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PermsError::InvalidParentKind { child: ResourceKind::Task, .. }
        ));
        assert_eq!(err.to_string(), "a task cannot be created under bucket#1");
    }

    #[tokio::test]
    async fn test_check_create_uses_the_new_kind() {
        let store = scenario().await;
        let config = GateConfig::default();
        let gate = CapabilityGate::new(&store, &config);
        let owner = Actor::lone_user(U1);
        let project = ResourceRef::project(1);

        for kind in [ResourceKind::Project, ResourceKind::Bucket, ResourceKind::Task] {
            assert!(gate.check(&owner, &project, Capability::Create(kind)).await.unwrap());
            assert!(gate.check(&u2(), &project, Capability::Create(kind)).await.unwrap());
        }
        assert!(gate
            .check(&owner, &ResourceRef::bucket(1), Capability::Create(ResourceKind::UserShare))
            .await
            .unwrap());
        assert!(!gate
            .check(&u2(), &ResourceRef::bucket(1), Capability::Create(ResourceKind::TeamShare))
            .await
            .unwrap());

        let err = gate
            .check(&owner, &ResourceRef::bucket(1), Capability::Create(ResourceKind::Bucket))
            .await
            .unwrap_err();
        assert!(matches!(err, PermsError::InvalidParentKind { .. }));
    }

    #[tokio::test]
    async fn test_create_top_level() {
        let store = scenario().await;
        let config = GateConfig::default();
        let gate = CapabilityGate::new(&store, &config);
        let link = Actor::link_share(LinkShare {
            id: LinkShareId(1),
            hash: "tok".into(),
            resource: ResourceRef::project(1),
            right: Right::Admin,
            shared_by: U1,
        });

        assert!(gate.can_create(&u2(), None, ResourceKind::Project).await.unwrap());
        assert!(gate.can_create(&u2(), None, ResourceKind::SavedFilter).await.unwrap());
        assert!(!gate.can_create(&u2(), None, ResourceKind::Bucket).await.unwrap());
        assert!(!gate.can_create(&link, None, ResourceKind::Project).await.unwrap());
    }

    #[tokio::test]
    async fn test_policy_override() {
        let store = scenario().await;
        let mut config = GateConfig::default();
        config.policy_overrides.insert(
            ResourceKind::Project,
            CapabilityPolicy {
                delete: Right::ReadWrite,
                ..CapabilityPolicy::builtin(ResourceKind::Project)
            },
        );
        let gate = CapabilityGate::new(&store, &config);

        assert!(gate.can_delete(&u2(), &ResourceRef::project(1)).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_resource_is_an_error_not_a_denial() {
        let store = scenario().await;
        let config = GateConfig::default();
        let gate = CapabilityGate::new(&store, &config);

        let err = gate.can_read(&u2(), &ResourceRef::task(42)).await.unwrap_err();
        assert!(matches!(err, PermsError::ResourceNotFound(_)));
    }
}

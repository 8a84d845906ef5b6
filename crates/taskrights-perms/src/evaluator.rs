//! Permission evaluation.
//!
//! A single decision procedure for every resource kind. For an actor, a
//! resource and a wanted right:
//!
//! 1. The resource must exist.
//! 2. A link-share actor is checked against its fixed resource and right
//!    only. It never walks the hierarchy and never receives owner or team
//!    rights.
//! 3. The owner is allowed unconditionally.
//! 4. The user's direct grant and every team grant are folded by maximum.
//! 5. If that satisfies the wanted right, allow.
//! 6. Otherwise repeat at the parent. With no parent left, deny.
//!
//! Evaluation is read-only. Store failures abort it and propagate; they are
//! never turned into a decision.

use taskrights_core::{Actor, Grantee, ResourceRef, Right, UserActor};
use taskrights_store::{GrantStore, ResourceLoader};

use crate::error::Result;
use crate::hierarchy::HierarchyResolver;

/// Default bound on delegation steps.
pub const DEFAULT_MAX_HIERARCHY_DEPTH: usize = 32;

/// Evaluator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluatorConfig {
    /// How many parent hops one evaluation may take before failing with
    /// `HierarchyTooDeep`.
    pub max_hierarchy_depth: usize,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            max_hierarchy_depth: DEFAULT_MAX_HIERARCHY_DEPTH,
        }
    }
}

/// Decides whether an actor holds a right on a resource.
pub struct Evaluator<'a, S: ?Sized> {
    store: &'a S,
    config: EvaluatorConfig,
}

impl<'a, S> Evaluator<'a, S>
where
    S: ResourceLoader + GrantStore + ?Sized,
{
    pub fn new(store: &'a S, config: EvaluatorConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Evaluate `actor` against `resource` for `wanted`.
    pub async fn evaluate(
        &self,
        actor: &Actor,
        resource: &ResourceRef,
        wanted: Right,
    ) -> Result<bool> {
        let mut walk = HierarchyResolver::new(self.store)
            .walk(resource, self.config.max_hierarchy_depth)
            .await?;

        let user = match actor {
            Actor::LinkShare(share) => {
                let allowed = share.resource == *resource && share.right.satisfies(wanted);
                tracing::trace!(
                    share = %share.id,
                    %resource,
                    %wanted,
                    allowed,
                    "link share decision"
                );
                return Ok(allowed);
            }
            Actor::User(user) => user,
        };

        loop {
            let at = walk.current().resource;
            if walk.current().owner == user.id {
                tracing::trace!(user = %user.id, %at, "owner");
                return Ok(true);
            }

            let best = self.held_at(user, &at).await?;
            if Right::held_satisfies(best, wanted) {
                tracing::trace!(user = %user.id, %at, held = ?best, %wanted, "grant satisfies");
                return Ok(true);
            }

            if !walk.climb().await? {
                tracing::trace!(user = %user.id, %resource, %wanted, "no grant up to the root");
                return Ok(false);
            }
            tracing::trace!(
                user = %user.id,
                from = %at,
                to = %walk.current().resource,
                held = ?best,
                "delegating to parent"
            );
        }
    }

    /// The strongest right `user` holds directly or through a team on
    /// `resource`, not counting ownership or ancestors.
    pub async fn held_at(&self, user: &UserActor, resource: &ResourceRef) -> Result<Option<Right>> {
        let mut best = self.store.grant_for(resource, Grantee::User(user.id)).await?;
        for team in &user.teams {
            let team_right = self.store.grant_for(resource, Grantee::Team(*team)).await?;
            best = Right::strongest(best, team_right);
        }
        Ok(best)
    }
}

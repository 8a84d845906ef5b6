//! Decision vectors: named checks against the seeded [`World`] with their
//! expected outcome.
//!
//! Every backend must reach the same decisions.

use taskrights_core::{ResourceKind, ResourceRef, UserId};
use taskrights_perms::Capability;
use taskrights_store::Store;

use crate::fixtures::{World, BUCKET, MEMBER, OTHER_PROJECT, OWNER, PROJECT, STRANGER, TASK};

/// Who performs the check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Who {
    User(UserId),
    /// The world's link share.
    Link,
}

/// A decision vector.
#[derive(Debug, Clone)]
pub struct DecisionVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub who: Who,
    pub resource: ResourceRef,
    pub capability: Capability,
    pub expected: bool,
}

const fn vector(
    name: &'static str,
    who: Who,
    resource: ResourceRef,
    capability: Capability,
    expected: bool,
) -> DecisionVector {
    DecisionVector {
        name,
        who,
        resource,
        capability,
        expected,
    }
}

/// Get all decision vectors.
pub fn all_vectors() -> Vec<DecisionVector> {
    use Capability::*;
    use Who::*;

    vec![
        vector("owner reads project", User(OWNER), PROJECT, Read, true),
        vector("owner deletes project", User(OWNER), PROJECT, Delete, true),
        vector("owner deletes bucket", User(OWNER), BUCKET, Delete, true),
        vector("owner updates task", User(OWNER), TASK, Update, true),
        vector("team member reads project", User(MEMBER), PROJECT, Read, true),
        vector("team member updates project", User(MEMBER), PROJECT, Update, true),
        vector("team member cannot delete project", User(MEMBER), PROJECT, Delete, false),
        vector("team member updates bucket via project", User(MEMBER), BUCKET, Update, true),
        vector("team member deletes bucket via project", User(MEMBER), BUCKET, Delete, true),
        vector("team member updates task via project", User(MEMBER), TASK, Update, true),
        vector("team member creates sub-project", User(MEMBER), PROJECT, Create(ResourceKind::Project), true),
        vector("team member creates bucket", User(MEMBER), PROJECT, Create(ResourceKind::Bucket), true),
        vector("team member creates task", User(MEMBER), PROJECT, Create(ResourceKind::Task), true),
        vector("team member cannot share project", User(MEMBER), PROJECT, Create(ResourceKind::UserShare), false),
        vector("owner shares bucket with a team", User(OWNER), BUCKET, Create(ResourceKind::TeamShare), true),
        vector("stranger cannot create task", User(STRANGER), PROJECT, Create(ResourceKind::Task), false),
        vector("team member cannot read other project", User(MEMBER), OTHER_PROJECT, Read, false),
        vector("stranger cannot read project", User(STRANGER), PROJECT, Read, false),
        vector("stranger cannot read bucket", User(STRANGER), BUCKET, Read, false),
        vector("stranger owns other project", User(STRANGER), OTHER_PROJECT, Delete, true),
        vector("owner cannot read other project", User(OWNER), OTHER_PROJECT, Read, false),
        vector("link reads its project", Link, PROJECT, Read, true),
        vector("link cannot update its project", Link, PROJECT, Update, false),
        vector("link cannot read child bucket", Link, BUCKET, Read, false),
        vector("link cannot read other project", Link, OTHER_PROJECT, Read, false),
        vector("link cannot create bucket", Link, PROJECT, Create(ResourceKind::Bucket), false),
    ]
}

/// The decision `world` reaches for `vector`.
pub async fn decide<S: Store>(world: &World<S>, vector: &DecisionVector) -> taskrights::Result<bool> {
    let actor = match vector.who {
        Who::User(user) => world.actor(user).await?,
        Who::Link => world.link_actor().await?,
    };
    let allowed = world
        .rights
        .gate()
        .check(&actor, &vector.resource, vector.capability)
        .await?;
    Ok(allowed)
}

/// Check every vector against `world`.
///
/// Returns the names of the vectors whose decision differs from the
/// expected one.
pub async fn verify_all_vectors<S: Store>(world: &World<S>) -> taskrights::Result<Vec<&'static str>> {
    let mut failures = Vec::new();
    for vector in all_vectors() {
        if decide(world, &vector).await? != vector.expected {
            failures.push(vector.name);
        }
    }
    Ok(failures)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_vectors_memory() {
        let world = World::memory().await.unwrap();
        let failures = verify_all_vectors(&world).await.unwrap();
        assert!(failures.is_empty(), "failed vectors: {failures:?}");
    }

    #[tokio::test]
    async fn test_vectors_sqlite() {
        let world = World::sqlite().await.unwrap();
        let failures = verify_all_vectors(&world).await.unwrap();
        assert!(failures.is_empty(), "failed vectors: {failures:?}");
    }

    #[test]
    fn test_vector_names_unique() {
        let vectors = all_vectors();
        let mut names: Vec<_> = vectors.iter().map(|v| v.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), vectors.len());
    }
}

//! Resource hierarchy resolution.
//!
//! Pure lookup over a [`ResourceLoader`]: which resource a resource
//! delegates to. No authorization logic lives here.

use std::collections::HashSet;

use taskrights_core::{ResourceRecord, ResourceRef};
use taskrights_store::ResourceLoader;

use crate::error::{PermsError, Result};

/// Walks parent links through a resource loader.
pub struct HierarchyResolver<'a, L: ?Sized> {
    loader: &'a L,
}

impl<'a, L: ResourceLoader + ?Sized> HierarchyResolver<'a, L> {
    pub fn new(loader: &'a L) -> Self {
        Self { loader }
    }

    /// Load a resource, failing with `ResourceNotFound` if it is missing.
    pub async fn record(&self, resource: &ResourceRef) -> Result<ResourceRecord> {
        self.loader
            .load_resource(resource)
            .await?
            .ok_or(PermsError::ResourceNotFound(*resource))
    }

    /// The resource `resource` delegates to, if it nests.
    pub async fn parent_of(&self, resource: &ResourceRef) -> Result<Option<ResourceRef>> {
        let record = self.record(resource).await?;
        checked_parent(&record)
    }

    /// Start a walk up from `resource`, loading it first.
    ///
    /// The walk fails with `HierarchyCycle` if a resource repeats and with
    /// `HierarchyTooDeep` when asked to climb past `max_depth` parents.
    pub async fn walk(&self, resource: &ResourceRef, max_depth: usize) -> Result<Ancestry<'a, L>> {
        let current = self.record(resource).await?;
        Ok(Ancestry {
            resolver: HierarchyResolver::new(self.loader),
            start: *resource,
            max_depth,
            depth: 0,
            seen: HashSet::from([*resource]),
            current,
        })
    }

    /// Every ancestor of `resource`, nearest first.
    pub async fn ancestors(
        &self,
        resource: &ResourceRef,
        max_depth: usize,
    ) -> Result<Vec<ResourceRef>> {
        let mut walk = self.walk(resource, max_depth).await?;
        let mut chain = Vec::new();
        while walk.climb().await? {
            chain.push(walk.current().resource);
        }
        Ok(chain)
    }
}

/// A bounded walk from a resource towards the root, one parent at a time.
pub struct Ancestry<'a, L: ?Sized> {
    resolver: HierarchyResolver<'a, L>,
    start: ResourceRef,
    max_depth: usize,
    depth: usize,
    seen: HashSet<ResourceRef>,
    current: ResourceRecord,
}

impl<'a, L: ResourceLoader + ?Sized> Ancestry<'a, L> {
    /// The resource the walk stands on.
    pub fn current(&self) -> &ResourceRecord {
        &self.current
    }

    /// Parent hops taken so far.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Move to the parent. Returns `false` at the root.
    pub async fn climb(&mut self) -> Result<bool> {
        let Some(parent) = checked_parent(&self.current)? else {
            return Ok(false);
        };
        if !self.seen.insert(parent) {
            return Err(PermsError::HierarchyCycle(parent));
        }
        if self.depth == self.max_depth {
            return Err(PermsError::HierarchyTooDeep {
                resource: self.start,
                max: self.max_depth,
            });
        }
        self.current = self.resolver.record(&parent).await?;
        self.depth += 1;
        Ok(true)
    }
}

/// The parent of a loaded record, after checking its kind against the
/// kinds the child may nest under.
pub fn checked_parent(record: &ResourceRecord) -> Result<Option<ResourceRef>> {
    match record.parent {
        Some(parent) if !record.has_valid_parent_kind() => Err(PermsError::ParentKindMismatch {
            child: record.resource,
            parent,
        }),
        parent => Ok(parent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskrights_core::{GrantId, Right, UserId};
    use taskrights_store::{Directory, GrantStoreExt, MemoryStore};

    async fn tree() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_user(UserId(1), "owner").await.unwrap();
        for record in [
            ResourceRecord::top_level(ResourceRef::project(1), UserId(1)),
            ResourceRecord::nested(ResourceRef::project(2), UserId(1), ResourceRef::project(1)),
            ResourceRecord::nested(ResourceRef::bucket(3), UserId(1), ResourceRef::project(2)),
        ] {
            store.insert_resource(&record).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_parent_of() {
        let store = tree().await;
        let resolver = HierarchyResolver::new(&store);

        assert_eq!(
            resolver.parent_of(&ResourceRef::bucket(3)).await.unwrap(),
            Some(ResourceRef::project(2))
        );
        assert_eq!(resolver.parent_of(&ResourceRef::project(1)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_parent_of_missing() {
        let store = tree().await;
        let resolver = HierarchyResolver::new(&store);

        let err = resolver.parent_of(&ResourceRef::task(9)).await.unwrap_err();
        assert!(matches!(err, PermsError::ResourceNotFound(r) if r == ResourceRef::task(9)));
    }

    #[tokio::test]
    async fn test_ancestors_walks_to_the_top() {
        let store = tree().await;
        let resolver = HierarchyResolver::new(&store);

        let chain = resolver.ancestors(&ResourceRef::bucket(3), 32).await.unwrap();
        assert_eq!(chain, vec![ResourceRef::project(2), ResourceRef::project(1)]);
    }

    #[tokio::test]
    async fn test_ancestors_depth_bound() {
        let store = tree().await;
        let resolver = HierarchyResolver::new(&store);

        let err = resolver.ancestors(&ResourceRef::bucket(3), 1).await.unwrap_err();
        assert!(matches!(err, PermsError::HierarchyTooDeep { max: 1, .. }));
        assert!(resolver.ancestors(&ResourceRef::bucket(3), 2).await.is_ok());
    }

    #[tokio::test]
    async fn test_share_relation_nests_under_shared_resource() {
        let store = tree().await;
        store.insert_user(UserId(2), "guest").await.unwrap();
        let outcome = store
            .grant_to_user(&ResourceRef::bucket(3), UserId(2), Right::Read)
            .await
            .unwrap();
        let resolver = HierarchyResolver::new(&store);

        let relation = ResourceRef::user_share(outcome.id());
        assert_eq!(
            resolver.parent_of(&relation).await.unwrap(),
            Some(ResourceRef::bucket(3))
        );
        // A team-share id that points at a user grant does not resolve.
        assert!(resolver
            .parent_of(&ResourceRef::team_share(GrantId(outcome.id().0)))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_walk_climbs_one_parent_at_a_time() {
        let store = tree().await;
        let resolver = HierarchyResolver::new(&store);

        let mut walk = resolver.walk(&ResourceRef::bucket(3), 32).await.unwrap();
        assert_eq!(walk.current().resource, ResourceRef::bucket(3));
        assert!(walk.climb().await.unwrap());
        assert_eq!(walk.current().resource, ResourceRef::project(2));
        assert!(walk.climb().await.unwrap());
        assert_eq!(walk.current().resource, ResourceRef::project(1));
        assert_eq!(walk.depth(), 2);

        // The root stays put.
        assert!(!walk.climb().await.unwrap());
        assert!(!walk.climb().await.unwrap());
        assert_eq!(walk.current().resource, ResourceRef::project(1));
    }

    #[tokio::test]
    async fn test_walk_of_missing_resource() {
        let store = tree().await;
        let resolver = HierarchyResolver::new(&store);

        let err = resolver.walk(&ResourceRef::task(9), 32).await.err().unwrap();
        assert!(matches!(err, PermsError::ResourceNotFound(_)));
    }

    #[test]
    fn test_checked_parent_rejects_wrong_kind() {
        let record = ResourceRecord::nested(
            ResourceRef::task(1),
            UserId(1),
            ResourceRef::saved_filter(1),
        );
        assert!(matches!(
            checked_parent(&record),
            Err(PermsError::ParentKindMismatch { .. })
        ));
    }
}

//! In-memory implementation of the store traits.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use taskrights_core::{
    Grant, GrantId, GrantOutcome, Grantee, LinkShare, LinkShareId, ResourceRecord, ResourceRef,
    Right, TeamId, UserId,
};

use crate::error::{Result, StoreError};
use crate::traits::{check_new_resource, check_shareable, relation_record};
use crate::traits::{Directory, GrantStore, ResourceLoader};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Registered resources.
    resources: HashMap<ResourceRef, ResourceRecord>,

    /// Users and their display names.
    users: HashMap<UserId, String>,

    /// Teams and their display names.
    teams: HashMap<TeamId, String>,

    /// Membership: team -> users.
    members: HashMap<TeamId, BTreeSet<UserId>>,

    /// Grants by id. Ids are assigned ascending, so iteration is insertion order.
    grants: BTreeMap<GrantId, Grant>,

    /// Index: (resource, grantee) -> grant id.
    grant_keys: HashMap<(ResourceRef, Grantee), GrantId>,

    /// Link shares by hash.
    link_shares: HashMap<String, LinkShare>,

    next_grant_id: i64,
    next_link_share_id: i64,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {e}")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {e}")))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStoreInner {
    fn load(&self, resource: &ResourceRef) -> Option<ResourceRecord> {
        if resource.kind.is_relation() {
            let grant = self.grants.get(&GrantId(resource.id))?;
            let shared = self.resources.get(&grant.resource)?;
            return relation_record(resource, grant, shared);
        }
        self.resources.get(resource).cloned()
    }

    fn grantee_exists(&self, grantee: Grantee) -> bool {
        match grantee {
            Grantee::User(id) => self.users.contains_key(&id),
            Grantee::Team(id) => self.teams.contains_key(&id),
        }
    }
}

#[async_trait]
impl ResourceLoader for MemoryStore {
    async fn load_resource(&self, resource: &ResourceRef) -> Result<Option<ResourceRecord>> {
        Ok(self.read()?.load(resource))
    }

    async fn insert_resource(&self, record: &ResourceRecord) -> Result<()> {
        let mut inner = self.write()?;

        if inner.resources.contains_key(&record.resource) {
            return Err(StoreError::ResourceExists(record.resource));
        }
        if !inner.users.contains_key(&record.owner) {
            return Err(StoreError::OwnerNotFound(record.owner));
        }
        let parent_exists = record
            .parent
            .is_some_and(|p| inner.resources.contains_key(&p));
        check_new_resource(record, parent_exists)?;

        inner.resources.insert(record.resource, record.clone());
        Ok(())
    }

    async fn remove_resource(&self, resource: &ResourceRef) -> Result<Vec<ResourceRef>> {
        let mut inner = self.write()?;

        if !inner.resources.contains_key(resource) {
            return Err(StoreError::ResourceNotFound(*resource));
        }

        // Breadth-first over the parent links, so the requested one comes first.
        let mut removed = Vec::new();
        let mut queue = VecDeque::from([*resource]);
        while let Some(current) = queue.pop_front() {
            if inner.resources.remove(&current).is_none() {
                continue;
            }
            removed.push(current);
            let mut children: Vec<ResourceRef> = inner
                .resources
                .values()
                .filter(|r| r.parent == Some(current))
                .map(|r| r.resource)
                .collect();
            children.sort();
            queue.extend(children);
        }

        let gone: BTreeSet<ResourceRef> = removed.iter().copied().collect();
        inner.grants.retain(|_, g| !gone.contains(&g.resource));
        inner.grant_keys.retain(|(r, _), _| !gone.contains(r));
        inner.link_shares.retain(|_, s| !gone.contains(&s.resource));

        tracing::debug!(resource = %resource, count = removed.len(), "removed resources");
        Ok(removed)
    }
}

#[async_trait]
impl Directory for MemoryStore {
    async fn insert_user(&self, id: UserId, name: &str) -> Result<()> {
        self.write()?.users.insert(id, name.to_string());
        Ok(())
    }

    async fn insert_team(&self, id: TeamId, name: &str) -> Result<()> {
        self.write()?.teams.insert(id, name.to_string());
        Ok(())
    }

    async fn add_team_member(&self, team: TeamId, user: UserId) -> Result<()> {
        let mut inner = self.write()?;
        if !inner.teams.contains_key(&team) {
            return Err(StoreError::GranteeNotFound(Grantee::Team(team)));
        }
        if !inner.users.contains_key(&user) {
            return Err(StoreError::GranteeNotFound(Grantee::User(user)));
        }
        inner.members.entry(team).or_default().insert(user);
        Ok(())
    }

    async fn remove_team_member(&self, team: TeamId, user: UserId) -> Result<()> {
        let mut inner = self.write()?;
        if let Some(members) = inner.members.get_mut(&team) {
            members.remove(&user);
        }
        Ok(())
    }

    async fn user_name(&self, id: UserId) -> Result<Option<String>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn team_name(&self, id: TeamId) -> Result<Option<String>> {
        Ok(self.read()?.teams.get(&id).cloned())
    }

    async fn teams_of(&self, user: UserId) -> Result<Vec<TeamId>> {
        let inner = self.read()?;
        let mut teams: Vec<TeamId> = inner
            .members
            .iter()
            .filter(|(_, members)| members.contains(&user))
            .map(|(team, _)| *team)
            .collect();
        teams.sort();
        Ok(teams)
    }

    async fn insert_link_share(
        &self,
        resource: &ResourceRef,
        right: Right,
        hash: &str,
        shared_by: UserId,
    ) -> Result<LinkShare> {
        let mut inner = self.write()?;

        if !inner.resources.contains_key(resource) {
            return Err(StoreError::ResourceNotFound(*resource));
        }
        if !inner.users.contains_key(&shared_by) {
            return Err(StoreError::OwnerNotFound(shared_by));
        }
        if inner.link_shares.contains_key(hash) {
            return Err(StoreError::HashInUse);
        }

        inner.next_link_share_id += 1;
        let share = LinkShare {
            id: LinkShareId(inner.next_link_share_id),
            hash: hash.to_string(),
            resource: *resource,
            right,
            shared_by,
        };
        inner.link_shares.insert(share.hash.clone(), share.clone());
        Ok(share)
    }

    async fn link_share_by_hash(&self, hash: &str) -> Result<Option<LinkShare>> {
        Ok(self.read()?.link_shares.get(hash).cloned())
    }
}

#[async_trait]
impl GrantStore for MemoryStore {
    async fn grant(
        &self,
        resource: &ResourceRef,
        grantee: Grantee,
        right: Right,
    ) -> Result<GrantOutcome> {
        let mut inner = self.write()?;

        check_shareable(resource)?;
        if !inner.grantee_exists(grantee) {
            return Err(StoreError::GranteeNotFound(grantee));
        }
        if !inner.resources.contains_key(resource) {
            return Err(StoreError::ResourceNotFound(*resource));
        }

        let now = now_millis();
        if let Some(&id) = inner.grant_keys.get(&(*resource, grantee)) {
            let grant = inner
                .grants
                .get_mut(&id)
                .ok_or_else(|| StoreError::InvalidData(format!("dangling grant index {id}")))?;
            let previous = grant.right;
            grant.right = right;
            grant.updated_at = now;
            tracing::debug!(%resource, %grantee, %previous, %right, "updated grant");
            return Ok(GrantOutcome::Updated { id, previous });
        }

        inner.next_grant_id += 1;
        let id = GrantId(inner.next_grant_id);
        inner.grants.insert(
            id,
            Grant {
                id,
                grantee,
                resource: *resource,
                right,
                created_at: now,
                updated_at: now,
            },
        );
        inner.grant_keys.insert((*resource, grantee), id);
        tracing::debug!(%resource, %grantee, %right, "created grant");
        Ok(GrantOutcome::Created(id))
    }

    async fn revoke(&self, resource: &ResourceRef, grantee: Grantee) -> Result<()> {
        let mut inner = self.write()?;

        let id = inner
            .grant_keys
            .remove(&(*resource, grantee))
            .ok_or(StoreError::GrantNotFound {
                resource: *resource,
                grantee,
            })?;
        inner.grants.remove(&id);
        tracing::debug!(%resource, %grantee, "revoked grant");
        Ok(())
    }

    async fn grant_for(&self, resource: &ResourceRef, grantee: Grantee) -> Result<Option<Right>> {
        let inner = self.read()?;
        Ok(inner
            .grant_keys
            .get(&(*resource, grantee))
            .and_then(|id| inner.grants.get(id))
            .map(|g| g.right))
    }

    async fn grants_for_resource(&self, resource: &ResourceRef) -> Result<Vec<Grant>> {
        let inner = self.read()?;
        Ok(inner
            .grants
            .values()
            .filter(|g| g.resource == *resource)
            .cloned()
            .collect())
    }

    async fn grant_by_id(&self, id: GrantId) -> Result<Option<Grant>> {
        Ok(self.read()?.grants.get(&id).cloned())
    }
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

//! SQLite implementation of the store traits.
//!
//! This is the primary storage backend. It uses rusqlite with bundled
//! SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use taskrights_core::{
    Grant, GrantId, GrantOutcome, Grantee, GranteeKind, LinkShare, LinkShareId, ResourceRecord,
    ResourceRef, Right, TeamId, UserId,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{check_new_resource, check_shareable, relation_record};
use crate::traits::{Directory, GrantStore, ResourceLoader};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime. Grant mutations run in immediate
/// transactions, so concurrent upserts and revokes are serialized.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking operation on the connection from a worker thread.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Unavailable(format!("mutex poisoned: {e}")))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("spawn_blocking failed: {e}")))?
    }
}

const GRANT_COLUMNS: &str =
    "id, resource_kind, resource_id, grantee_kind, grantee_id, access_right, created_at, updated_at";

/// A grant row as stored, before validation.
struct RawGrant {
    id: i64,
    resource_kind: String,
    resource_id: i64,
    grantee_kind: String,
    grantee_id: i64,
    right: i64,
    created_at: i64,
    updated_at: i64,
}

impl RawGrant {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            resource_kind: row.get("resource_kind")?,
            resource_id: row.get("resource_id")?,
            grantee_kind: row.get("grantee_kind")?,
            grantee_id: row.get("grantee_id")?,
            right: row.get("access_right")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn into_grant(self) -> Result<Grant> {
        let kind: GranteeKind = self.grantee_kind.parse()?;
        Ok(Grant {
            id: GrantId(self.id),
            grantee: Grantee::from_parts(kind, self.grantee_id),
            resource: ResourceRef::new(self.resource_kind.parse()?, self.resource_id),
            right: Right::validate(self.right)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn load_grant(conn: &Connection, id: GrantId) -> Result<Option<Grant>> {
    let raw = conn
        .query_row(
            &format!("SELECT {GRANT_COLUMNS} FROM grants WHERE id = ?1"),
            params![id.0],
            RawGrant::from_row,
        )
        .optional()?;
    raw.map(RawGrant::into_grant).transpose()
}

/// Load a registered (non-relation) resource.
fn load_plain(conn: &Connection, resource: &ResourceRef) -> Result<Option<ResourceRecord>> {
    let row: Option<(i64, Option<String>, Option<i64>)> = conn
        .query_row(
            "SELECT owner_id, parent_kind, parent_id FROM resources WHERE kind = ?1 AND id = ?2",
            params![resource.kind.as_str(), resource.id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;

    let Some((owner, parent_kind, parent_id)) = row else {
        return Ok(None);
    };
    let parent = match (parent_kind, parent_id) {
        (Some(kind), Some(id)) => Some(ResourceRef::new(kind.parse()?, id)),
        (None, None) => None,
        _ => {
            return Err(StoreError::InvalidData(format!(
                "{resource} has a partial parent reference"
            )))
        }
    };

    Ok(Some(ResourceRecord {
        resource: *resource,
        owner: UserId(owner),
        parent,
    }))
}

fn load_record(conn: &Connection, resource: &ResourceRef) -> Result<Option<ResourceRecord>> {
    if !resource.kind.is_relation() {
        return load_plain(conn, resource);
    }
    let Some(grant) = load_grant(conn, GrantId(resource.id))? else {
        return Ok(None);
    };
    let Some(shared) = load_plain(conn, &grant.resource)? else {
        return Ok(None);
    };
    Ok(relation_record(resource, &grant, &shared))
}

fn user_exists(conn: &Connection, id: UserId) -> Result<bool> {
    Ok(conn
        .query_row("SELECT 1 FROM users WHERE id = ?1", params![id.0], |_| Ok(()))
        .optional()?
        .is_some())
}

fn team_exists(conn: &Connection, id: TeamId) -> Result<bool> {
    Ok(conn
        .query_row("SELECT 1 FROM teams WHERE id = ?1", params![id.0], |_| Ok(()))
        .optional()?
        .is_some())
}

fn grantee_exists(conn: &Connection, grantee: Grantee) -> Result<bool> {
    match grantee {
        Grantee::User(id) => user_exists(conn, id),
        Grantee::Team(id) => team_exists(conn, id),
    }
}

fn children_of(conn: &Connection, parent: &ResourceRef) -> Result<Vec<ResourceRef>> {
    let mut stmt =
        conn.prepare("SELECT kind, id FROM resources WHERE parent_kind = ?1 AND parent_id = ?2")?;
    let rows = stmt
        .query_map(params![parent.kind.as_str(), parent.id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut children = rows
        .into_iter()
        .map(|(kind, id)| Ok(ResourceRef::new(kind.parse()?, id)))
        .collect::<Result<Vec<_>>>()?;
    children.sort();
    Ok(children)
}

fn link_share_from_row(
    row: (i64, String, String, i64, i64, i64),
) -> Result<LinkShare> {
    let (id, hash, kind, resource_id, right, shared_by) = row;
    Ok(LinkShare {
        id: LinkShareId(id),
        hash,
        resource: ResourceRef::new(kind.parse()?, resource_id),
        right: Right::validate(right)?,
        shared_by: UserId(shared_by),
    })
}

#[async_trait]
impl ResourceLoader for SqliteStore {
    async fn load_resource(&self, resource: &ResourceRef) -> Result<Option<ResourceRecord>> {
        let resource = *resource;
        self.blocking(move |conn| load_record(conn, &resource)).await
    }

    async fn insert_resource(&self, record: &ResourceRecord) -> Result<()> {
        let record = record.clone();
        self.blocking(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            if load_plain(&tx, &record.resource)?.is_some() {
                return Err(StoreError::ResourceExists(record.resource));
            }
            if !user_exists(&tx, record.owner)? {
                return Err(StoreError::OwnerNotFound(record.owner));
            }
            let parent_exists = match record.parent {
                Some(parent) => load_plain(&tx, &parent)?.is_some(),
                None => false,
            };
            check_new_resource(&record, parent_exists)?;

            tx.execute(
                "INSERT INTO resources (kind, id, owner_id, parent_kind, parent_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.resource.kind.as_str(),
                    record.resource.id,
                    record.owner.0,
                    record.parent.map(|p| p.kind.as_str()),
                    record.parent.map(|p| p.id),
                    now_millis(),
                ],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn remove_resource(&self, resource: &ResourceRef) -> Result<Vec<ResourceRef>> {
        let resource = *resource;
        let removed = self
            .blocking(move |conn| {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

                if load_plain(&tx, &resource)?.is_none() {
                    return Err(StoreError::ResourceNotFound(resource));
                }

                let mut removed = vec![resource];
                let mut next = 0;
                while next < removed.len() {
                    let children = children_of(&tx, &removed[next])?;
                    removed.extend(children);
                    next += 1;
                }

                for r in &removed {
                    let (kind, id) = (r.kind.as_str(), r.id);
                    tx.execute(
                        "DELETE FROM grants WHERE resource_kind = ?1 AND resource_id = ?2",
                        params![kind, id],
                    )?;
                    tx.execute(
                        "DELETE FROM link_shares WHERE resource_kind = ?1 AND resource_id = ?2",
                        params![kind, id],
                    )?;
                    tx.execute(
                        "DELETE FROM resources WHERE kind = ?1 AND id = ?2",
                        params![kind, id],
                    )?;
                }

                tx.commit()?;
                Ok(removed)
            })
            .await?;

        tracing::debug!(resource = %resource, count = removed.len(), "removed resources");
        Ok(removed)
    }
}

#[async_trait]
impl Directory for SqliteStore {
    async fn insert_user(&self, id: UserId, name: &str) -> Result<()> {
        let name = name.to_string();
        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO users (id, name) VALUES (?1, ?2)
                 ON CONFLICT (id) DO UPDATE SET name = excluded.name",
                params![id.0, name],
            )?;
            Ok(())
        })
        .await
    }

    async fn insert_team(&self, id: TeamId, name: &str) -> Result<()> {
        let name = name.to_string();
        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO teams (id, name) VALUES (?1, ?2)
                 ON CONFLICT (id) DO UPDATE SET name = excluded.name",
                params![id.0, name],
            )?;
            Ok(())
        })
        .await
    }

    async fn add_team_member(&self, team: TeamId, user: UserId) -> Result<()> {
        self.blocking(move |conn| {
            if !team_exists(conn, team)? {
                return Err(StoreError::GranteeNotFound(Grantee::Team(team)));
            }
            if !user_exists(conn, user)? {
                return Err(StoreError::GranteeNotFound(Grantee::User(user)));
            }
            conn.execute(
                "INSERT OR IGNORE INTO team_members (team_id, user_id) VALUES (?1, ?2)",
                params![team.0, user.0],
            )?;
            Ok(())
        })
        .await
    }

    async fn remove_team_member(&self, team: TeamId, user: UserId) -> Result<()> {
        self.blocking(move |conn| {
            conn.execute(
                "DELETE FROM team_members WHERE team_id = ?1 AND user_id = ?2",
                params![team.0, user.0],
            )?;
            Ok(())
        })
        .await
    }

    async fn user_name(&self, id: UserId) -> Result<Option<String>> {
        self.blocking(move |conn| {
            Ok(conn
                .query_row("SELECT name FROM users WHERE id = ?1", params![id.0], |row| {
                    row.get(0)
                })
                .optional()?)
        })
        .await
    }

    async fn team_name(&self, id: TeamId) -> Result<Option<String>> {
        self.blocking(move |conn| {
            Ok(conn
                .query_row("SELECT name FROM teams WHERE id = ?1", params![id.0], |row| {
                    row.get(0)
                })
                .optional()?)
        })
        .await
    }

    async fn teams_of(&self, user: UserId) -> Result<Vec<TeamId>> {
        self.blocking(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT team_id FROM team_members WHERE user_id = ?1 ORDER BY team_id",
            )?;
            let teams = stmt
                .query_map(params![user.0], |row| row.get::<_, i64>(0).map(TeamId))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(teams)
        })
        .await
    }

    async fn insert_link_share(
        &self,
        resource: &ResourceRef,
        right: Right,
        hash: &str,
        shared_by: UserId,
    ) -> Result<LinkShare> {
        let resource = *resource;
        let hash = hash.to_string();
        self.blocking(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            if load_plain(&tx, &resource)?.is_none() {
                return Err(StoreError::ResourceNotFound(resource));
            }
            if !user_exists(&tx, shared_by)? {
                return Err(StoreError::OwnerNotFound(shared_by));
            }
            let taken = tx
                .query_row(
                    "SELECT 1 FROM link_shares WHERE hash = ?1",
                    params![hash],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            if taken {
                return Err(StoreError::HashInUse);
            }

            tx.execute(
                "INSERT INTO link_shares
                    (hash, resource_kind, resource_id, access_right, shared_by, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    hash,
                    resource.kind.as_str(),
                    resource.id,
                    right.as_i64(),
                    shared_by.0,
                    now_millis(),
                ],
            )?;
            let id = LinkShareId(tx.last_insert_rowid());
            tx.commit()?;

            Ok(LinkShare {
                id,
                hash,
                resource,
                right,
                shared_by,
            })
        })
        .await
    }

    async fn link_share_by_hash(&self, hash: &str) -> Result<Option<LinkShare>> {
        let hash = hash.to_string();
        self.blocking(move |conn| {
            let row = conn
                .query_row(
                    "SELECT id, hash, resource_kind, resource_id, access_right, shared_by
                     FROM link_shares WHERE hash = ?1",
                    params![hash],
                    |row| {
                        Ok((
                            row.get(0)?,
                            row.get(1)?,
                            row.get(2)?,
                            row.get(3)?,
                            row.get(4)?,
                            row.get(5)?,
                        ))
                    },
                )
                .optional()?;
            row.map(link_share_from_row).transpose()
        })
        .await
    }
}

#[async_trait]
impl GrantStore for SqliteStore {
    async fn grant(
        &self,
        resource: &ResourceRef,
        grantee: Grantee,
        right: Right,
    ) -> Result<GrantOutcome> {
        let resource = *resource;
        let outcome = self
            .blocking(move |conn| {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

                check_shareable(&resource)?;
                if !grantee_exists(&tx, grantee)? {
                    return Err(StoreError::GranteeNotFound(grantee));
                }
                if load_plain(&tx, &resource)?.is_none() {
                    return Err(StoreError::ResourceNotFound(resource));
                }

                let existing: Option<(i64, i64)> = tx
                    .query_row(
                        "SELECT id, access_right FROM grants
                         WHERE resource_kind = ?1 AND resource_id = ?2
                           AND grantee_kind = ?3 AND grantee_id = ?4",
                        params![
                            resource.kind.as_str(),
                            resource.id,
                            grantee.kind().as_str(),
                            grantee.raw_id(),
                        ],
                        |row| Ok((row.get(0)?, row.get(1)?)),
                    )
                    .optional()?;

                tx.execute(
                    "INSERT INTO grants
                        (resource_kind, resource_id, grantee_kind, grantee_id,
                         access_right, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                     ON CONFLICT (resource_kind, resource_id, grantee_kind, grantee_id)
                     DO UPDATE SET access_right = excluded.access_right,
                                   updated_at = excluded.updated_at",
                    params![
                        resource.kind.as_str(),
                        resource.id,
                        grantee.kind().as_str(),
                        grantee.raw_id(),
                        right.as_i64(),
                        now_millis(),
                    ],
                )?;

                let outcome = match existing {
                    Some((id, previous)) => GrantOutcome::Updated {
                        id: GrantId(id),
                        previous: Right::validate(previous)?,
                    },
                    None => GrantOutcome::Created(GrantId(tx.last_insert_rowid())),
                };
                tx.commit()?;
                Ok(outcome)
            })
            .await?;

        tracing::debug!(%resource, %grantee, %right, ?outcome, "upserted grant");
        Ok(outcome)
    }

    async fn revoke(&self, resource: &ResourceRef, grantee: Grantee) -> Result<()> {
        let resource = *resource;
        self.blocking(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM grants
                 WHERE resource_kind = ?1 AND resource_id = ?2
                   AND grantee_kind = ?3 AND grantee_id = ?4",
                params![
                    resource.kind.as_str(),
                    resource.id,
                    grantee.kind().as_str(),
                    grantee.raw_id(),
                ],
            )?;
            if deleted == 0 {
                return Err(StoreError::GrantNotFound { resource, grantee });
            }
            Ok(())
        })
        .await?;

        tracing::debug!(%resource, %grantee, "revoked grant");
        Ok(())
    }

    async fn grant_for(&self, resource: &ResourceRef, grantee: Grantee) -> Result<Option<Right>> {
        let resource = *resource;
        self.blocking(move |conn| {
            let raw: Option<i64> = conn
                .query_row(
                    "SELECT access_right FROM grants
                     WHERE resource_kind = ?1 AND resource_id = ?2
                       AND grantee_kind = ?3 AND grantee_id = ?4",
                    params![
                        resource.kind.as_str(),
                        resource.id,
                        grantee.kind().as_str(),
                        grantee.raw_id(),
                    ],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(raw.map(Right::validate).transpose()?)
        })
        .await
    }

    async fn grants_for_resource(&self, resource: &ResourceRef) -> Result<Vec<Grant>> {
        let resource = *resource;
        self.blocking(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {GRANT_COLUMNS} FROM grants
                 WHERE resource_kind = ?1 AND resource_id = ?2
                 ORDER BY id"
            ))?;
            let raws = stmt
                .query_map(params![resource.kind.as_str(), resource.id], RawGrant::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            raws.into_iter().map(RawGrant::into_grant).collect()
        })
        .await
    }

    async fn grant_by_id(&self, id: GrantId) -> Result<Option<Grant>> {
        self.blocking(move |conn| load_grant(conn, id)).await
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::GrantStoreExt;

    async fn seeded(store: &SqliteStore) {
        store.insert_user(UserId(1), "owner").await.unwrap();
        store.insert_user(UserId(2), "guest").await.unwrap();
        store.insert_team(TeamId(1), "editors").await.unwrap();
        store.add_team_member(TeamId(1), UserId(2)).await.unwrap();
        store
            .insert_resource(&ResourceRecord::top_level(ResourceRef::project(1), UserId(1)))
            .await
            .unwrap();
        store
            .insert_resource(&ResourceRecord::nested(
                ResourceRef::bucket(1),
                UserId(1),
                ResourceRef::project(1),
            ))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_load_resource() {
        let store = SqliteStore::open_memory().unwrap();
        seeded(&store).await;

        let bucket = store.load_resource(&ResourceRef::bucket(1)).await.unwrap().unwrap();
        assert_eq!(bucket.owner, UserId(1));
        assert_eq!(bucket.parent, Some(ResourceRef::project(1)));

        let project = store.load_resource(&ResourceRef::project(1)).await.unwrap().unwrap();
        assert_eq!(project.parent, None);

        assert!(store.load_resource(&ResourceRef::task(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_keeps_one_row() {
        let store = SqliteStore::open_memory().unwrap();
        seeded(&store).await;
        let project = ResourceRef::project(1);

        let first = store.grant_to_user(&project, UserId(2), Right::Read).await.unwrap();
        let second = store.grant_to_user(&project, UserId(2), Right::Admin).await.unwrap();

        assert!(matches!(first, GrantOutcome::Created(_)));
        assert_eq!(
            second,
            GrantOutcome::Updated {
                id: first.id(),
                previous: Right::Read
            }
        );

        let grants = store.grants_for_resource(&project).await.unwrap();
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].right, Right::Admin);
        assert_eq!(grants[0].id, first.id());
    }

    #[tokio::test]
    async fn test_grants_listed_in_insertion_order() {
        let store = SqliteStore::open_memory().unwrap();
        seeded(&store).await;
        let project = ResourceRef::project(1);

        store.grant_to_team(&project, TeamId(1), Right::Read).await.unwrap();
        store.grant_to_user(&project, UserId(2), Right::Read).await.unwrap();
        // Updating the first grant must not move it.
        store.grant_to_team(&project, TeamId(1), Right::Admin).await.unwrap();

        let grantees: Vec<Grantee> = store
            .grants_for_resource(&project)
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.grantee)
            .collect();
        assert_eq!(grantees, vec![Grantee::Team(TeamId(1)), Grantee::User(UserId(2))]);
    }

    #[tokio::test]
    async fn test_revoke_twice() {
        let store = SqliteStore::open_memory().unwrap();
        seeded(&store).await;
        let project = ResourceRef::project(1);

        store.grant_to_user(&project, UserId(2), Right::ReadWrite).await.unwrap();
        store.revoke_from_user(&project, UserId(2)).await.unwrap();

        let err = store.revoke_from_user(&project, UserId(2)).await.unwrap_err();
        assert!(matches!(err, StoreError::GrantNotFound { .. }));
        assert_eq!(store.grant_for_user(&project, UserId(2)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_grant_validation_writes_nothing() {
        let store = SqliteStore::open_memory().unwrap();
        seeded(&store).await;

        let err = store
            .grant_to_team(&ResourceRef::project(1), TeamId(9), Right::Read)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::GranteeNotFound(_)));

        let err = store
            .grant_to_user(&ResourceRef::task(5), UserId(2), Right::Read)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ResourceNotFound(_)));

        let err = store
            .grant_to_user(&ResourceRef::user_share(GrantId(1)), UserId(2), Right::Read)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));

        assert!(store
            .grants_for_resource(&ResourceRef::project(1))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_stored_right_is_rejected() {
        let store = SqliteStore::open_memory().unwrap();
        seeded(&store).await;
        let project = ResourceRef::project(1);
        store.grant_to_user(&project, UserId(2), Right::Read).await.unwrap();

        store
            .blocking(|conn| {
                conn.execute("UPDATE grants SET access_right = 99", [])?;
                Ok(())
            })
            .await
            .unwrap();

        let err = store.grant_for_user(&project, UserId(2)).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidRight(99)));
        let err = store.grants_for_resource(&project).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidRight(99)));
    }

    #[tokio::test]
    async fn test_team_membership_and_names() {
        let store = SqliteStore::open_memory().unwrap();
        seeded(&store).await;

        assert_eq!(store.teams_of(UserId(2)).await.unwrap(), vec![TeamId(1)]);
        assert!(store.teams_of(UserId(1)).await.unwrap().is_empty());
        assert_eq!(
            store.grantee_name(Grantee::Team(TeamId(1))).await.unwrap(),
            Some("editors".to_string())
        );

        store.insert_user(UserId(2), "renamed").await.unwrap();
        assert_eq!(store.user_name(UserId(2)).await.unwrap(), Some("renamed".to_string()));

        let err = store.add_team_member(TeamId(1), UserId(77)).await.unwrap_err();
        assert!(matches!(err, StoreError::GranteeNotFound(Grantee::User(UserId(77)))));
    }

    #[tokio::test]
    async fn test_remove_cascades_to_children_and_grants() {
        let store = SqliteStore::open_memory().unwrap();
        seeded(&store).await;
        store
            .insert_resource(&ResourceRecord::nested(
                ResourceRef::task(3),
                UserId(1),
                ResourceRef::project(1),
            ))
            .await
            .unwrap();
        store
            .grant_to_user(&ResourceRef::bucket(1), UserId(2), Right::Read)
            .await
            .unwrap();
        store
            .insert_link_share(&ResourceRef::project(1), Right::Read, "tok", UserId(1))
            .await
            .unwrap();

        let removed = store.remove_resource(&ResourceRef::project(1)).await.unwrap();
        assert_eq!(
            removed,
            vec![ResourceRef::project(1), ResourceRef::bucket(1), ResourceRef::task(3)]
        );
        assert!(store
            .grants_for_resource(&ResourceRef::bucket(1))
            .await
            .unwrap()
            .is_empty());
        assert!(store.link_share_by_hash("tok").await.unwrap().is_none());

        let err = store.remove_resource(&ResourceRef::project(1)).await.unwrap_err();
        assert!(matches!(err, StoreError::ResourceNotFound(_)));
    }

    #[tokio::test]
    async fn test_link_shares() {
        let store = SqliteStore::open_memory().unwrap();
        seeded(&store).await;

        let share = store
            .insert_link_share(&ResourceRef::project(1), Right::ReadWrite, "tok", UserId(1))
            .await
            .unwrap();
        assert_eq!(share.right, Right::ReadWrite);

        let found = store.link_share_by_hash("tok").await.unwrap().unwrap();
        assert_eq!(found, share);

        let err = store
            .insert_link_share(&ResourceRef::project(1), Right::Read, "tok", UserId(1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::HashInUse));
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rights.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            seeded(&store).await;
            store
                .grant_to_team(&ResourceRef::project(1), TeamId(1), Right::ReadWrite)
                .await
                .unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(
            store
                .grant_for_team(&ResourceRef::project(1), TeamId(1))
                .await
                .unwrap(),
            Some(Right::ReadWrite)
        );
        assert!(store.is_owner(&ResourceRef::bucket(1), UserId(1)).await.unwrap());
    }
}

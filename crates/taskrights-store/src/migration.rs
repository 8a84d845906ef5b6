//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema version {current} is newer than supported version {CURRENT_VERSION}"
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
        }

        tx.commit()?;
        tracing::debug!(from = current, to = CURRENT_VERSION, "migrated schema");
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE users (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE teams (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE team_members (
            team_id INTEGER NOT NULL REFERENCES teams(id),
            user_id INTEGER NOT NULL REFERENCES users(id),
            PRIMARY KEY (team_id, user_id)
        );

        -- Owner is fixed at insert; there is no UPDATE path for it.
        CREATE TABLE resources (
            kind TEXT NOT NULL,
            id INTEGER NOT NULL,
            owner_id INTEGER NOT NULL REFERENCES users(id),
            parent_kind TEXT,
            parent_id INTEGER,
            created_at INTEGER NOT NULL,
            PRIMARY KEY (kind, id)
        );

        -- One row per (resource, grantee). Upserts keep the row id.
        CREATE TABLE grants (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            resource_kind TEXT NOT NULL,
            resource_id INTEGER NOT NULL,
            grantee_kind TEXT NOT NULL,     -- 'user' | 'team'
            grantee_id INTEGER NOT NULL,
            access_right INTEGER NOT NULL,  -- 0=read, 1=read-write, 2=admin
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,

            UNIQUE (resource_kind, resource_id, grantee_kind, grantee_id)
        );

        CREATE TABLE link_shares (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            hash TEXT NOT NULL UNIQUE,
            resource_kind TEXT NOT NULL,
            resource_id INTEGER NOT NULL,
            access_right INTEGER NOT NULL,
            shared_by INTEGER NOT NULL REFERENCES users(id),
            created_at INTEGER NOT NULL
        );

        CREATE INDEX idx_resources_parent ON resources(parent_kind, parent_id);
        CREATE INDEX idx_team_members_user ON team_members(user_id);
        CREATE INDEX idx_grants_resource ON grants(resource_kind, resource_id);
        CREATE INDEX idx_link_shares_resource ON link_shares(resource_kind, resource_id);
        "#,
    )?;

    Ok(())
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

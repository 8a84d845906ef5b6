//! # taskrights
//!
//! Rights resolution for a to-do server: decides, for an actor and a
//! resource, whether a requested capability is permitted.
//!
//! ## Overview
//!
//! - **Ownership**: the creator of a resource holds Admin on it, forever
//! - **Sharing**: users and teams get Read, ReadWrite or Admin on a resource
//! - **Delegation**: a bucket or task with no sufficient grant defers to
//!   its project
//! - **Link shares**: a token holding one fixed right on one project
//!
//! ## Usage
//!
//! ```rust,no_run
//! use taskrights::{Rights, RightsConfig, ShareRequest};
//! use taskrights::core::{ResourceKind, ResourceRef, Right, UserId};
//! use taskrights::store::{Directory, SqliteStore};
//!
//! async fn example() -> taskrights::Result<()> {
//!     let store = SqliteStore::open("rights.db")?;
//!     store.insert_user(UserId(1), "alice").await?;
//!     store.insert_user(UserId(2), "bob").await?;
//!
//!     let rights = Rights::new(store, RightsConfig::default());
//!     let alice = rights.actor_for_user(UserId(1)).await?;
//!     let bob = rights.actor_for_user(UserId(2)).await?;
//!
//!     rights.create_resource(&alice, ResourceKind::Project, 1, None).await?;
//!     rights
//!         .share(&alice, &ResourceRef::project(1), &ShareRequest::new(UserId(2), Right::ReadWrite))
//!         .await?;
//!
//!     assert!(rights.can_update(&bob, &ResourceRef::project(1)).await?);
//!     assert!(!rights.can_delete(&bob, &ResourceRef::project(1)).await?);
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `taskrights::core` - Rights, actors, resources, grants
//! - `taskrights::store` - Store traits, SQLite and in-memory backends
//! - `taskrights::perms` - Hierarchy resolver, evaluator, capability gate

pub mod config;
pub mod error;
pub mod rights;
pub mod share;

// Re-export component crates
pub use taskrights_core as core;
pub use taskrights_perms as perms;
pub use taskrights_store as store;

// Re-export main types for convenience
pub use config::RightsConfig;
pub use error::{Result, RightsError};
pub use rights::Rights;
pub use share::{ShareRequest, SharedWith};

// Re-export commonly used types
pub use taskrights_core::{
    Actor, Grant, GrantId, GrantOutcome, Grantee, LinkShare, ResourceKind, ResourceRecord,
    ResourceRef, Right, TeamId, UserId,
};
pub use taskrights_perms::{Capability, CapabilityPolicy};

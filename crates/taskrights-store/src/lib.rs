//! # taskrights Store
//!
//! Storage abstraction for taskrights. Provides trait-based interfaces for
//! resources, the user/team directory, and grants, with SQLite and
//! in-memory implementations.
//!
//! ## Key Types
//!
//! - [`ResourceLoader`] - Owner and parent of a resource, registration, cascade removal
//! - [`Directory`] - Users, teams, memberships, link shares
//! - [`GrantStore`] - Upsert, revoke, and look up grants
//! - [`Store`] - Everything above, in one backend
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use taskrights_core::{ResourceRecord, ResourceRef, Right, UserId};
//! use taskrights_store::{Directory, GrantStoreExt, ResourceLoader, SqliteStore};
//!
//! async fn example() -> taskrights_store::Result<()> {
//!     let store = SqliteStore::open("rights.db")?;
//!
//!     store.insert_user(UserId(1), "alice").await?;
//!     store.insert_user(UserId(2), "bob").await?;
//!     store
//!         .insert_resource(&ResourceRecord::top_level(ResourceRef::project(1), UserId(1)))
//!         .await?;
//!     store
//!         .grant_to_user(&ResourceRef::project(1), UserId(2), Right::ReadWrite)
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **One grant per key**: granting again to the same (resource, grantee)
//!   replaces the right and keeps the grant id
//! - **Fixed ownership**: a resource's owner is set at registration and
//!   re-registering is refused
//! - **Validated reads**: stored rights and kinds are re-validated on load

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{Directory, GrantStore, GrantStoreExt, ResourceLoader, Store};

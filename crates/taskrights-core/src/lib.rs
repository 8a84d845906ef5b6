//! # taskrights Core
//!
//! Pure types for the taskrights authorization engine: rights, actors,
//! resources, and grants.
//!
//! This crate contains no I/O, no storage, no async. Everything here is a
//! value that the store and the evaluator pass around.
//!
//! ## Key Types
//!
//! - [`Right`] - Totally ordered capability level (`Read < ReadWrite < Admin`)
//! - [`Actor`] - A registered user (with team snapshot) or a link-share token
//! - [`ResourceRef`] - Kind plus id of anything a capability check targets
//! - [`ResourceRecord`] - Owner and parent of a stored resource
//! - [`Grant`] - A (grantee, resource, right) row
//!
//! ## Validation
//!
//! Raw right values are validated at the boundary by [`Right::validate`];
//! out-of-range values are rejected with [`CoreError::InvalidRight`].

pub mod actor;
pub mod error;
pub mod grant;
pub mod right;
pub mod types;

pub use actor::{Actor, ActorKind, LinkShare, UserActor};
pub use error::{CoreError, Result};
pub use grant::{Grant, GrantOutcome, Grantee, GranteeKind};
pub use right::Right;
pub use types::{
    GrantId, LinkShareId, ResourceKind, ResourceRecord, ResourceRef, TeamId, UserId,
};

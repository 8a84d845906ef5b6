//! # taskrights Permissions
//!
//! The decision engine: given an actor, a resource and a wanted right,
//! decide whether the actor may proceed.
//!
//! ## Overview
//!
//! Rights come from three places, checked in order at each level of the
//! resource hierarchy:
//!
//! 1. **Ownership**: the creator of a resource always holds Admin on it
//! 2. **User grants**: a right given directly to the user
//! 3. **Team grants**: rights given to any team in the actor's membership
//!    snapshot, combined by maximum
//!
//! When nothing at a level is strong enough, the check moves to the parent
//! (a bucket delegates to its project). Link-share actors skip all of this
//! and hold exactly one right on exactly one resource.
//!
//! ## Key Types
//!
//! - [`HierarchyResolver`] - Parent lookup and bounded [`Ancestry`] walks over a resource loader
//! - [`Evaluator`] - The decision procedure
//! - [`CapabilityGate`] - Create/read/update/delete checks per resource kind
//! - [`CapabilityPolicy`] - The right each operation requires
//!
//! ## Usage
//!
//! ```rust,no_run
//! use taskrights_core::{Actor, ResourceRef, TeamId, UserId};
//! use taskrights_perms::{CapabilityGate, GateConfig};
//! use taskrights_store::MemoryStore;
//!
//! async fn example(store: &MemoryStore) -> taskrights_perms::Result<bool> {
//!     let config = GateConfig::default();
//!     let gate = CapabilityGate::new(store, &config);
//!     let actor = Actor::user(UserId(2), [TeamId(1)]);
//!     gate.can_update(&actor, &ResourceRef::bucket(1)).await
//! }
//! ```

pub mod error;
pub mod evaluator;
pub mod gate;
pub mod hierarchy;

pub use error::{PermsError, Result};
pub use evaluator::{Evaluator, EvaluatorConfig, DEFAULT_MAX_HIERARCHY_DEPTH};
pub use gate::{Capability, CapabilityGate, CapabilityPolicy, GateConfig};
pub use hierarchy::{checked_parent, Ancestry, HierarchyResolver};

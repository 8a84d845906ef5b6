//! # taskrights Testkit
//!
//! Testing utilities for taskrights.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Decision vectors**: Named checks with expected outcomes, run against every backend
//! - **Generators**: Proptest strategies for rights, grantees, and whole grant scenarios
//! - **Fixtures**: A seeded [`World`] of users, teams, resources and shares
//!
//! ## Decision Vectors
//!
//! ```rust,no_run
//! use taskrights_testkit::{verify_all_vectors, World};
//!
//! async fn check() {
//!     let world = World::sqlite().await.unwrap();
//!     let failures = verify_all_vectors(&world).await.unwrap();
//!     assert!(failures.is_empty());
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use taskrights_testkit::generators::Scenario;
//!
//! proptest! {
//!     #[test]
//!     fn oracle_is_total(s: Scenario) {
//!         let _ = s.expected();
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::World;
pub use generators::Scenario;
pub use vectors::{all_vectors, verify_all_vectors, DecisionVector, Who};

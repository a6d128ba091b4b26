//! # textsync Testkit
//!
//! Testing utilities for textsync.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known splices every splice differ must reproduce
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Endpoint pairs and scripted recovery handlers
//!
//! ## Golden Vectors
//!
//! ```rust
//! use textsync_testkit::vectors::verify_all_vectors;
//!
//! assert!(verify_all_vectors().is_empty());
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use textsync_testkit::generators::EditParams;
//!
//! proptest! {
//!     #[test]
//!     fn patch_roundtrips(params: EditParams) {
//!         // ...
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use textsync_testkit::fixtures::EndpointPair;
//!
//! let pair = EndpointPair::new("draft");
//! pair.sender.set_local("draft, revised");
//! pair.sync().unwrap();
//! assert!(pair.converged());
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{failing_recovery, init_tracing, resync_from, DeferredRecovery, EndpointPair};
pub use generators::EditParams;
pub use vectors::{all_vectors, verify_all_vectors, SpliceVector};

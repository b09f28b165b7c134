//! Shared test utilities for the trust token workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`tree`]: [`TestTree`], a temporary trust directory that tests build up
//!   and mutate between loads

pub mod tree;

pub use tree::TestTree;

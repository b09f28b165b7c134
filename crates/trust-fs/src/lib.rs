//! Filesystem layer for trust tokens
//!
//! Provides normalized paths (the origin of every file-derived trust object),
//! stat capture for staleness checks, write-access probing, and
//! format-agnostic configuration loading.

pub mod access;
pub mod config;
pub mod error;
pub mod path;
pub mod stat;

pub use access::is_writable_directory;
pub use config::ConfigStore;
pub use error::{Error, Result};
pub use path::NormalizedPath;
pub use stat::{FileStat, stat};

//! Trust token synchronization engine
//!
//! Mirrors trust files on disk into an in-memory object index, one token per
//! trust directory. Every object carries the path of the file it came from,
//! and a stat cache keeps rescans cheap: unchanged files are never parsed
//! again, and files that vanished have their objects retracted.
//!
//! # Architecture
//!
//! ```text
//!                  TrustConfig
//!                       |
//!                     Token ---------------+
//!                       |                  |
//!                    Loader            ObjectIndex -- Builder
//!                   /      \
//!           StatCache      Parser
//!                       |
//!                    trust-fs
//! ```
//!
//! # Example
//!
//! ```no_run
//! use trust_token::{Result, Token};
//!
//! fn example() -> Result<()> {
//!     let mut token = Token::new(18, "/etc/trust", "System Trust")?;
//!     let loaded = token.load()?;
//!     println!("{} files loaded, {} objects", loaded, token.index().len());
//!     Ok(())
//! }
//! ```

pub mod attrs;
pub mod builder;
pub mod cache;
pub mod config;
pub mod error;
pub mod index;
pub mod loader;
pub mod logging;
pub mod object;
pub mod parser;
pub mod token;

pub use attrs::{AttributeType, AttributeValue, Attributes, ObjectClass};
pub use builder::{Builder, BuilderFlags, TrustBuilder};
pub use cache::StatCache;
pub use config::{BASE_SLOT_ID, LabelRule, TokenSpec, TrustConfig};
pub use error::{Error, IndexError, Result};
pub use index::{MemoryIndex, ObjectHandle, ObjectIndex};
pub use loader::{FileLoad, LoadContext, Loader, TokenPaths};
pub use object::{Classification, TRUST_ANCHOR_ROOTS_LABEL, TrustObject, origin_template};
pub use parser::{ParseOutcome, Parser, PemParser};
pub use token::{SlotId, Token};

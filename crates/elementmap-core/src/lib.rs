//! elementmap-core library.
//!
//! Answers two questions about a node of a content graph: what it references
//! (outgoing) and what references it (incoming). Fragments nested inside an
//! element count as the element itself, drafts and revisions report against
//! their published original, and every result is sorted by a stable key.
//!
//! # Conventions
//!
//! - **Errors**: `anyhow::Result` with context in the storage layer,
//!   [`MapError`] at the public API.
//! - **Logging**: `tracing` macros with structured fields. The library never
//!   installs a subscriber.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod graph;
pub mod map;
pub mod model;

pub use auth::{AllowAll, Authorization, DraftOwnership, Principal};
pub use config::MapSettings;
pub use error::{ErrorCode, MapError};
pub use map::{MapDataHandler, MapDataRequest, MapResolver, TypeLoader, TypeRegistry};
pub use model::{ElementKind, ElementRef, MapEntry, MapResult, ReferenceCounts};

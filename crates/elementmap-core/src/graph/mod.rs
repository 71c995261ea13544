//! Graph-level walks over the content store.
//!
//! - [`containment`]: fragment ownership, root owners and owner chains.

pub mod containment;

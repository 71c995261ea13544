//! Reference-map pipeline.
//!
//! - [`resolver`]: [`MapResolver`], the entry point for both directions.
//! - [`registry`]: kind → loader dispatch and plugin handlers.
//! - [`loaders`]: the built-in per-kind loaders.
//! - [`group`]: partitioning by kind, sorting, optional dedup.
//! - [`text`]: titles, state suffixes and editor URLs.

pub mod group;
pub mod loaders;
pub mod registry;
pub mod resolver;
pub mod text;

pub use registry::{LoadContext, MapDataHandler, MapDataRequest, TypeLoader, TypeRegistry};
pub use resolver::MapResolver;

//! Data model: graph elements on the storage side, map entries on the
//! display side.

pub mod element;
pub mod entry;

pub use element::{
    Container, ContainerCategory, ElementKind, ElementRecord, ElementRef, LocalizedElement, Site,
    UserAccount,
};
pub use entry::{MapEntry, MapResult, ReferenceCounts, SortKey};

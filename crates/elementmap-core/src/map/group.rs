//! Partitioning related ids by kind and ordering the resulting entries.

use std::collections::HashSet;

use crate::db::query::RelatedRef;
use crate::model::{ElementKind, MapEntry};

/// Group related ids by kind, keeping the order in which kinds and ids were
/// first seen. An id reached by several edges is listed once per kind.
pub fn partition_by_kind(refs: &[RelatedRef]) -> Vec<(ElementKind, Vec<i64>)> {
    let mut seen: HashSet<(&ElementKind, i64)> = HashSet::with_capacity(refs.len());
    let mut partitions: Vec<(ElementKind, Vec<i64>)> = Vec::new();
    for related in refs {
        if !seen.insert((&related.kind, related.id)) {
            continue;
        }
        match partitions.iter_mut().find(|(kind, _)| *kind == related.kind) {
            Some((_, ids)) => ids.push(related.id),
            None => partitions.push((related.kind.clone(), vec![related.id])),
        }
    }
    partitions
}

/// Stable sort by sort key, then kind, id and url.
///
/// The tie-breakers make the order a function of the entries alone, so two
/// runs over the same graph agree even when storage returns rows in a
/// different order.
pub fn sort_entries(entries: &mut [MapEntry]) {
    entries.sort_by(|a, b| {
        a.sort_key
            .cmp(&b.sort_key)
            .then_with(|| a.kind.as_str().cmp(b.kind.as_str()))
            .then_with(|| a.id.cmp(&b.id))
            .then_with(|| a.url.cmp(&b.url))
    });
}

/// Drop entries repeating an earlier entry's kind, id and title.
pub fn dedupe_entries(entries: Vec<MapEntry>) -> Vec<MapEntry> {
    let mut seen: HashSet<(ElementKind, i64, String)> = HashSet::with_capacity(entries.len());
    entries
        .into_iter()
        .filter(|entry| seen.insert((entry.kind.clone(), entry.id, entry.title.clone())))
        .collect()
}

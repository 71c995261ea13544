//! Structural containment: fragments owned by other elements.
//!
//! Containment is separate from relation edges. An element owns its nested
//! entries, addresses and content blocks through `elements.owner_id`; a
//! product additionally owns its variants. This module answers:
//!
//! - Which fragments live (transitively) inside a given element?
//! - Which independently addressable element does a fragment belong to?
//! - What is the owner chain above a fragment?
//!
//! # Termination
//!
//! Every walk carries a visited set and a depth bound, so corrupt data with
//! ownership cycles or runaway nesting cannot loop forever. A walk that
//! hits either guard stops at the last element it reached.

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::collections::HashSet;

use crate::db::query;
use crate::model::{ElementKind, ElementRecord};

/// Default bound on nesting levels followed by containment walks.
pub const MAX_CONTAINMENT_DEPTH: usize = 32;

/// All fragment ids transitively owned by `root_id`, breadth-first,
/// excluding the root.
///
/// Each level is fetched with one query. Ids already seen are skipped, and
/// fragments more than `max_depth` levels below the root are not returned.
///
/// # Errors
///
/// Returns an error if a containment query fails.
pub fn contained_ids(conn: &Connection, root_id: i64, max_depth: usize) -> Result<Vec<i64>> {
    contained_ids_from(conn, &[root_id], max_depth)
}

/// [`contained_ids`] for several roots at once. Roots are never part of the
/// result, even when one root owns another.
///
/// # Errors
///
/// Returns an error if a containment query fails.
pub fn contained_ids_from(
    conn: &Connection,
    root_ids: &[i64],
    max_depth: usize,
) -> Result<Vec<i64>> {
    let mut visited: HashSet<i64> = root_ids.iter().copied().collect();
    let mut frontier: Vec<i64> = root_ids.to_vec();
    let mut result: Vec<i64> = Vec::new();
    let mut depth = 0_usize;

    while !frontier.is_empty() {
        let children = query::owned_element_ids(conn, &frontier, &ElementKind::FRAGMENTS)
            .with_context(|| format!("fragments owned at depth {depth}"))?;

        if depth >= max_depth {
            if children.iter().any(|id| !visited.contains(id)) {
                tracing::warn!(
                    roots = ?root_ids,
                    max_depth,
                    "containment depth limit reached, deeper fragments ignored"
                );
            }
            break;
        }

        let mut next = Vec::new();
        for child in children {
            if visited.insert(child) {
                result.push(child);
                next.push(child);
            }
        }

        frontier = next;
        depth += 1;
    }

    Ok(result)
}

/// The independently addressable element that `element_id` belongs to.
///
/// Independent elements are returned as-is. Returns `None` when the id does
/// not exist. Ownership cycles, dangling owners and chains longer than
/// `max_depth` stop at the last element reached.
///
/// # Errors
///
/// Returns an error if an element lookup fails.
pub fn root_owner(
    conn: &Connection,
    element_id: i64,
    max_depth: usize,
) -> Result<Option<ElementRecord>> {
    let Some(mut current) = query::get_element(conn, element_id)? else {
        return Ok(None);
    };

    let mut visited: HashSet<i64> = HashSet::from([current.id]);
    for _ in 0..max_depth {
        if current.is_independent() {
            return Ok(Some(current));
        }
        let Some(owner_id) = current.owner_id else {
            break;
        };
        if !visited.insert(owner_id) {
            tracing::warn!(element_id, owner_id, "ownership cycle detected");
            break;
        }
        match query::get_element(conn, owner_id)
            .with_context(|| format!("owner {owner_id} of element {}", current.id))?
        {
            Some(owner) => current = owner,
            None => {
                tracing::debug!(element_id, owner_id, "dangling owner reference");
                break;
            }
        }
    }

    Ok(Some(current))
}

/// Owner chain of `element_id`, from the immediate owner up to the top.
///
/// Returns an empty vec for elements without an owner or unknown ids.
///
/// # Errors
///
/// Returns an error if an element lookup fails.
pub fn ancestors(
    conn: &Connection,
    element_id: i64,
    max_depth: usize,
) -> Result<Vec<ElementRecord>> {
    let Some(start) = query::get_element(conn, element_id)? else {
        return Ok(Vec::new());
    };

    let mut chain: Vec<ElementRecord> = Vec::new();
    let mut visited: HashSet<i64> = HashSet::from([start.id]);
    let mut next_owner = start.owner_id;

    while let Some(owner_id) = next_owner {
        if chain.len() >= max_depth || !visited.insert(owner_id) {
            break;
        }
        let Some(owner) = query::get_element(conn, owner_id)? else {
            break;
        };
        next_owner = owner.owner_id;
        chain.push(owner);
    }

    Ok(chain)
}

/// Variants owned by any of the given products.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn owned_variant_ids(conn: &Connection, product_ids: &[i64]) -> Result<Vec<i64>> {
    query::owned_element_ids(conn, product_ids, &[ElementKind::Variant])
        .context("variants owned by products")
}

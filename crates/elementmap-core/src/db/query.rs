//! Read-only query helpers over the content-graph store.
//!
//! All functions take a shared `&Connection` and return `anyhow::Result`
//! with typed records. Batch lookups take id slices and return an empty
//! result for an empty slice without touching the database.

use anyhow::{Context, Result};
use rusqlite::{Connection, params, params_from_iter, types::ToSql};
use std::collections::HashMap;

use crate::model::{
    Container, ContainerCategory, ElementKind, ElementRecord, ElementRef, LocalizedElement, Site,
    UserAccount,
};

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

/// Which side of a relation edge the lookup ids are on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationDirection {
    /// Ids are sources; return targets.
    Outgoing,
    /// Ids are targets; return sources.
    Incoming,
}

/// Restriction on the `source_site_id` of relation edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteFilter {
    AnySite,
    /// Edges whose source site is unset or equals the given site.
    CurrentSite(i64),
}

/// How localized rows are picked for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteScope {
    /// Only the given site; elements absent there are skipped.
    Only(i64),
    /// Any site, preferring the given one, then the lowest site id.
    Prefer(i64),
    /// Every localized row, one result per element and site.
    All,
}

impl SiteScope {
    pub const fn site_id(self) -> Option<i64> {
        match self {
            Self::Only(site_id) | Self::Prefer(site_id) => Some(site_id),
            Self::All => None,
        }
    }
}

/// The far endpoint of a relation edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedRef {
    pub id: i64,
    pub kind: ElementKind,
}

// ---------------------------------------------------------------------------
// Elements
// ---------------------------------------------------------------------------

const ELEMENT_COLUMNS: &str = "e.element_id, e.kind, e.canonical_id, e.owner_id, e.field_name, \
     e.container_id, e.subtype_id, e.is_draft, e.is_provisional_draft, e.is_revision, \
     e.draft_creator_id, e.draft_name, e.revision_num, e.asset_kind";

/// Fetch one element row by id.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_element(conn: &Connection, element_id: i64) -> Result<Option<ElementRecord>> {
    let sql = format!("SELECT {ELEMENT_COLUMNS} FROM elements e WHERE e.element_id = ?1");
    let mut stmt = conn.prepare(&sql).context("prepare get_element query")?;

    match stmt.query_row(params![element_id], row_to_element_record) {
        Ok(record) => Ok(Some(record)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e).context(format!("get_element for {element_id}")),
    }
}

/// Fetch element rows for a batch of ids, keyed by id. Missing ids are
/// absent from the map.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_elements(conn: &Connection, ids: &[i64]) -> Result<HashMap<i64, ElementRecord>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let sql = format!(
        "SELECT {ELEMENT_COLUMNS} FROM elements e WHERE e.element_id IN ({})",
        placeholders(1, ids.len())
    );
    let mut stmt = conn.prepare(&sql).context("prepare get_elements query")?;
    let rows = stmt
        .query_map(params_from_iter(ids), row_to_element_record)
        .context("execute get_elements query")?;

    let mut records = HashMap::with_capacity(ids.len());
    for row in rows {
        let record = row.context("read get_elements row")?;
        records.insert(record.id, record);
    }
    Ok(records)
}

/// Resolve a caller-supplied id into the [`ElementRef`] a map is requested
/// for.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_element_ref(
    conn: &Connection,
    element_id: i64,
    site_id: i64,
) -> Result<Option<ElementRef>> {
    Ok(get_element(conn, element_id)?.map(|record| record.to_ref(site_id)))
}

/// Ids of elements owned by any of `owner_ids` whose kind is in `kinds`,
/// ordered by id.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn owned_element_ids(
    conn: &Connection,
    owner_ids: &[i64],
    kinds: &[ElementKind],
) -> Result<Vec<i64>> {
    if owner_ids.is_empty() || kinds.is_empty() {
        return Ok(Vec::new());
    }

    let kind_tags: Vec<&str> = kinds.iter().map(ElementKind::as_str).collect();
    let sql = format!(
        "SELECT element_id FROM elements \
         WHERE owner_id IN ({}) AND kind IN ({}) \
         ORDER BY element_id",
        placeholders(1, owner_ids.len()),
        placeholders(owner_ids.len() + 1, kind_tags.len())
    );

    let mut values: Vec<&dyn ToSql> = Vec::with_capacity(owner_ids.len() + kind_tags.len());
    values.extend(owner_ids.iter().map(|id| id as &dyn ToSql));
    values.extend(kind_tags.iter().map(|tag| tag as &dyn ToSql));

    let mut stmt = conn
        .prepare(&sql)
        .context("prepare owned_element_ids query")?;
    let rows = stmt
        .query_map(params_from_iter(values), |row| row.get::<_, i64>(0))
        .context("execute owned_element_ids query")?;

    let mut ids = Vec::new();
    for row in rows {
        ids.push(row.context("read owned_element_ids row")?);
    }
    Ok(ids)
}

/// Pick localized rows according to `scope`: one per element for
/// [`SiteScope::Only`] and [`SiteScope::Prefer`], every row for
/// [`SiteScope::All`].
///
/// Revisions are skipped unless `include_revisions` is set; drafts are
/// always returned. Output is ordered by element id.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_localized_elements(
    conn: &Connection,
    ids: &[i64],
    scope: SiteScope,
    include_revisions: bool,
) -> Result<Vec<LocalizedElement>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let site_id = scope.site_id();
    let site_param = ids.len() + 1;
    let site_clause = match scope {
        SiteScope::Only(_) => format!(" AND s.site_id = ?{site_param}"),
        SiteScope::Prefer(_) | SiteScope::All => String::new(),
    };
    let site_order = if site_id.is_some() {
        format!("CASE WHEN s.site_id = ?{site_param} THEN 0 ELSE 1 END, ")
    } else {
        String::new()
    };
    let revision_clause = if include_revisions {
        ""
    } else {
        " AND e.is_revision = 0"
    };

    // Rows come back grouped by element with the preferred site first.
    let sql = format!(
        "SELECT {ELEMENT_COLUMNS}, s.site_id, s.title, s.url \
         FROM elements e \
         INNER JOIN element_sites s ON s.element_id = e.element_id \
         WHERE e.element_id IN ({}){site_clause}{revision_clause} \
         ORDER BY e.element_id, {site_order}s.site_id",
        placeholders(1, ids.len())
    );

    let mut values: Vec<&dyn ToSql> = ids.iter().map(|id| id as &dyn ToSql).collect();
    if let Some(site_id) = &site_id {
        values.push(site_id);
    }

    let mut stmt = conn
        .prepare(&sql)
        .with_context(|| format!("prepare get_localized_elements query: {sql}"))?;
    let rows = stmt
        .query_map(params_from_iter(values), |row| {
            Ok(LocalizedElement {
                record: row_to_element_record(row)?,
                site_id: row.get(14)?,
                title: row.get(15)?,
                url: row.get(16)?,
            })
        })
        .context("execute get_localized_elements query")?;

    let keep_all = matches!(scope, SiteScope::All);
    let mut chosen: Vec<LocalizedElement> = Vec::new();
    for row in rows {
        let localized = row.context("read get_localized_elements row")?;
        if !keep_all && chosen.last().is_some_and(|prev| prev.id() == localized.id()) {
            continue;
        }
        chosen.push(localized);
    }
    Ok(chosen)
}

// ---------------------------------------------------------------------------
// Relations
// ---------------------------------------------------------------------------

/// Follow relation edges from `ids` in `direction`, returning the far
/// endpoint of every matching edge in edge order.
///
/// An endpoint reached by several edges appears once per edge. Edges whose
/// far endpoint has no `elements` row are skipped.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn related_refs(
    conn: &Connection,
    ids: &[i64],
    direction: RelationDirection,
    site_filter: SiteFilter,
) -> Result<Vec<RelatedRef>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let (near, far) = match direction {
        RelationDirection::Outgoing => ("source_id", "target_id"),
        RelationDirection::Incoming => ("target_id", "source_id"),
    };

    let mut values: Vec<&dyn ToSql> = ids.iter().map(|id| id as &dyn ToSql).collect();
    let site_clause = match &site_filter {
        SiteFilter::AnySite => String::new(),
        SiteFilter::CurrentSite(site_id) => {
            values.push(site_id);
            format!(
                " AND (r.source_site_id IS NULL OR r.source_site_id = ?{})",
                values.len()
            )
        }
    };

    let sql = format!(
        "SELECT r.{far}, e.kind \
         FROM relations r \
         INNER JOIN elements e ON e.element_id = r.{far} \
         WHERE r.{near} IN ({}){site_clause} \
         ORDER BY r.relation_id",
        placeholders(1, ids.len())
    );

    let mut stmt = conn
        .prepare(&sql)
        .with_context(|| format!("prepare related_refs query: {sql}"))?;
    let rows = stmt
        .query_map(params_from_iter(values), |row| {
            Ok(RelatedRef {
                id: row.get(0)?,
                kind: ElementKind::from(row.get::<_, String>(1)?),
            })
        })
        .context("execute related_refs query")?;

    let mut refs = Vec::new();
    for row in rows {
        refs.push(row.context("read related_refs row")?);
    }
    Ok(refs)
}

// ---------------------------------------------------------------------------
// Display metadata
// ---------------------------------------------------------------------------

/// Fetch containers by id.
///
/// # Errors
///
/// Returns an error if the database query fails or a row carries an unknown
/// category.
pub fn get_containers(conn: &Connection, ids: &[i64]) -> Result<HashMap<i64, Container>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let sql = format!(
        "SELECT container_id, category, handle, name, icon, color \
         FROM containers WHERE container_id IN ({})",
        placeholders(1, ids.len())
    );
    let mut stmt = conn.prepare(&sql).context("prepare get_containers query")?;
    let rows = stmt
        .query_map(params_from_iter(ids), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })
        .context("execute get_containers query")?;

    let mut containers = HashMap::new();
    for row in rows {
        let (id, category, handle, name, icon, color) =
            row.context("read get_containers row")?;
        let category: ContainerCategory = category
            .parse()
            .with_context(|| format!("container {id}"))?;
        containers.insert(
            id,
            Container {
                id,
                category,
                handle,
                name,
                icon,
                color,
            },
        );
    }
    Ok(containers)
}

/// All sites keyed by id.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_sites(conn: &Connection) -> Result<HashMap<i64, Site>> {
    let mut stmt = conn
        .prepare("SELECT site_id, handle, name FROM sites")
        .context("prepare get_sites query")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Site {
                id: row.get(0)?,
                handle: row.get(1)?,
                name: row.get(2)?,
            })
        })
        .context("execute get_sites query")?;

    let mut sites = HashMap::new();
    for row in rows {
        let site = row.context("read get_sites row")?;
        sites.insert(site.id, site);
    }
    Ok(sites)
}

/// Account rows for user elements, keyed by element id.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_users(conn: &Connection, ids: &[i64]) -> Result<HashMap<i64, UserAccount>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let sql = format!(
        "SELECT element_id, username, full_name FROM users WHERE element_id IN ({})",
        placeholders(1, ids.len())
    );
    let mut stmt = conn.prepare(&sql).context("prepare get_users query")?;
    let rows = stmt
        .query_map(params_from_iter(ids), |row| {
            Ok(UserAccount {
                id: row.get(0)?,
                username: row.get(1)?,
                full_name: row.get(2)?,
            })
        })
        .context("execute get_users query")?;

    let mut users = HashMap::new();
    for row in rows {
        let user = row.context("read get_users row")?;
        users.insert(user.id, user);
    }
    Ok(users)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `?start, ?start+1, ...` for `count` parameters.
fn placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|idx| format!("?{idx}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn row_to_element_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<ElementRecord> {
    Ok(ElementRecord {
        id: row.get(0)?,
        kind: ElementKind::from(row.get::<_, String>(1)?),
        canonical_id: row.get(2)?,
        owner_id: row.get(3)?,
        field_name: row.get(4)?,
        container_id: row.get(5)?,
        subtype_id: row.get(6)?,
        is_draft: row.get(7)?,
        is_provisional_draft: row.get(8)?,
        is_revision: row.get(9)?,
        draft_creator_id: row.get(10)?,
        draft_name: row.get(11)?,
        revision_num: row.get(12)?,
        asset_kind: row.get(13)?,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

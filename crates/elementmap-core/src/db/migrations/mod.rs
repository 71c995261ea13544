//! Schema upgrades for the content-graph store.
//!
//! The store version lives in `PRAGMA user_version` and is mirrored into
//! `store_meta.schema_version`. Each upgrade runs in its own transaction, so
//! an interrupted open leaves the store at the last finished version.

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OptionalExtension};

use super::schema;
use crate::error::ErrorCode;

/// One schema upgrade step.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: u32,
    pub description: &'static str,
    sql: &'static str,
}

/// Every upgrade step, in version order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "content graph tables",
        sql: schema::MIGRATION_V1_SQL,
    },
    Migration {
        version: 2,
        description: "relation and containment indexes",
        sql: schema::MIGRATION_V2_SQL,
    },
];

/// Latest schema version understood by this crate.
pub const LATEST_SCHEMA_VERSION: u32 = MIGRATIONS[MIGRATIONS.len() - 1].version;

/// Version recorded in `PRAGMA user_version`; 0 for a fresh file.
///
/// # Errors
///
/// Returns an error if the pragma cannot be read or holds a value outside
/// `u32`.
pub fn current_schema_version(conn: &Connection) -> Result<u32> {
    let version: i64 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("read user_version")?;
    u32::try_from(version).with_context(|| format!("user_version {version} out of range"))
}

/// Steps above the store's current version.
///
/// # Errors
///
/// Returns an error if the current version cannot be read.
pub fn pending(conn: &Connection) -> Result<Vec<Migration>> {
    let current = current_schema_version(conn)?;
    Ok(MIGRATIONS
        .iter()
        .filter(|step| step.version > current)
        .copied()
        .collect())
}

/// Bring the store up to [`LATEST_SCHEMA_VERSION`] and return the version it
/// ends at. A store already at the latest version is left untouched.
///
/// # Errors
///
/// Returns an error if a step fails or the store was written by a newer
/// schema than this crate knows.
pub fn migrate(conn: &mut Connection) -> Result<u32> {
    let found = current_schema_version(conn)?;
    if found > LATEST_SCHEMA_VERSION {
        bail!(
            "{} ({}): store is v{found}, newest known is v{LATEST_SCHEMA_VERSION}",
            ErrorCode::SchemaMismatch.message(),
            ErrorCode::SchemaMismatch,
        );
    }

    for step in pending(conn)? {
        apply(conn, step)
            .with_context(|| format!("migrate store to v{} ({})", step.version, step.description))?;
    }
    current_schema_version(conn)
}

fn apply(conn: &mut Connection, step: Migration) -> Result<()> {
    let version = i64::from(step.version);
    let tx = conn.transaction()?;
    tx.execute_batch(step.sql)?;
    tx.pragma_update(None, "user_version", version)?;
    tx.execute("UPDATE store_meta SET schema_version = ?1 WHERE id = 1", [version])?;
    tx.commit()?;
    tracing::info!(version = step.version, step = step.description, "store migrated");
    Ok(())
}

/// Fail unless the store is at [`LATEST_SCHEMA_VERSION`] and `store_meta`
/// agrees with `user_version`. Used where the store cannot be upgraded.
///
/// # Errors
///
/// Returns an error carrying [`ErrorCode::SchemaMismatch`] on any version
/// disagreement.
pub fn ensure_current(conn: &Connection) -> Result<()> {
    let found = current_schema_version(conn)?;
    if found != LATEST_SCHEMA_VERSION {
        bail!(
            "{} ({}): found v{found}, expected v{LATEST_SCHEMA_VERSION}",
            ErrorCode::SchemaMismatch.message(),
            ErrorCode::SchemaMismatch,
        );
    }

    let recorded: Option<i64> = conn
        .query_row("SELECT schema_version FROM store_meta WHERE id = 1", [], |row| row.get(0))
        .optional()
        .context("read store_meta")?;
    if recorded != Some(i64::from(found)) {
        bail!(
            "{} ({}): store_meta records {recorded:?}, user_version is v{found}",
            ErrorCode::SchemaMismatch.message(),
            ErrorCode::SchemaMismatch,
        );
    }
    Ok(())
}

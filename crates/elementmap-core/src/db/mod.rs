//! SQLite content-graph store.
//!
//! The map pipeline only reads. Writers (content import, tests) go through
//! plain SQL against the schema in [`schema`].

pub mod migrations;
pub mod query;
pub mod schema;

#[cfg(test)]
pub(crate) mod fixtures;

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OpenFlags};
use std::{path::Path, time::Duration};

use crate::error::ErrorCode;

/// Busy timeout used for store connections.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (or create) the store, apply runtime pragmas, and migrate the schema
/// to the latest version.
///
/// # Errors
///
/// Returns an error if opening, configuring or migrating the database fails.
pub fn open_store(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create store directory {}", parent.display()))?;
    }

    let mut conn =
        Connection::open(path).with_context(|| format!("open store {}", path.display()))?;

    configure_connection(&conn).context("configure sqlite pragmas")?;
    migrations::migrate(&mut conn).context("apply store migrations")?;

    Ok(conn)
}

/// Open an existing store for map queries without write access.
///
/// # Errors
///
/// Returns an error if the file is missing, cannot be opened, or was written
/// by a different schema version.
pub fn open_store_read_only(path: &Path) -> Result<Connection> {
    if !path.exists() {
        bail!(
            "{} ({}): {}",
            ErrorCode::StoreNotInitialized.message(),
            ErrorCode::StoreNotInitialized,
            path.display()
        );
    }

    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("open store read-only {}", path.display()))?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)
        .context("set busy timeout")?;

    migrations::ensure_current(&conn)?;

    Ok(conn)
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    Ok(())
}

//! Schema migrations for the SQLite document store.
//!
//! # Invariants
//! - Versions are strictly increasing and never reused.
//! - The applied version is mirrored to `PRAGMA user_version`.
//! - All pending steps apply in one transaction.

use super::{StoreError, StoreResult};
use log::info;
use rusqlite::Connection;

/// (version, script)
const MIGRATIONS: &[(u32, &str)] = &[(1, include_str!("0001_documents.sql"))];

/// Highest schema version this build understands.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |(version, _)| *version)
}

/// Brings the schema up to `latest_version()` and returns the version found
/// before migrating.
pub fn apply_migrations(conn: &mut Connection) -> StoreResult<u32> {
    let found: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let latest = latest_version();

    if found > latest {
        return Err(StoreError::UnsupportedSchemaVersion {
            db_version: found,
            latest_supported: latest,
        });
    }

    let pending: Vec<_> = MIGRATIONS
        .iter()
        .filter(|(version, _)| *version > found)
        .collect();
    if pending.is_empty() {
        return Ok(found);
    }

    let tx = conn.transaction()?;
    for (version, script) in pending {
        tx.execute_batch(script)?;
        tx.pragma_update(None, "user_version", version)?;
    }
    tx.commit()?;

    info!("event=store_migrate module=store status=ok from_version={found} to_version={latest}");
    Ok(found)
}

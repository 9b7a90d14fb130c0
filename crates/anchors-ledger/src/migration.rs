//! Database schema migrations for the SQLite ledger.
//!
//! Each migration transforms the schema from version N to N+1. Applied
//! versions are recorded in `schema_migrations`.

use rusqlite::Connection;

use anchors_core::now_millis;

use crate::error::{LedgerError, Result};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema. Idempotent.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;
        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;
            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
        }
        tx.commit()?;
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(LedgerError::Migration(format!(
            "unknown migration version: {version}"
        ))),
    }
}

/// Migration v1: branches and entries.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE branches (
            address BLOB PRIMARY KEY,         -- 32 bytes, derived from publisher + nonce
            root_id BLOB NOT NULL,            -- 32 bytes, id of the announce entry
            publisher BLOB NOT NULL,          -- 32 bytes, Ed25519 public key
            created_at INTEGER NOT NULL       -- local timestamp (Unix ms)
        );

        CREATE TABLE entries (
            entry_id BLOB PRIMARY KEY,        -- 32 bytes, Blake3 of canonical bytes
            address BLOB NOT NULL REFERENCES branches(address),
            position INTEGER NOT NULL,        -- branch-local, root = 1
            link BLOB,                        -- anchorage entry id, NULL for the root
            publisher BLOB NOT NULL,
            kind INTEGER NOT NULL,            -- EntryKind as u16
            timestamp INTEGER NOT NULL,       -- publisher-claimed (Unix ms)
            canonical_bytes BLOB NOT NULL,
            published_at INTEGER NOT NULL,    -- local timestamp of acceptance

            UNIQUE(address, position)
        );

        CREATE INDEX idx_entries_link ON entries(address, link);
        CREATE INDEX idx_entries_publisher ON entries(publisher);
        "#,
    )?;

    Ok(())
}

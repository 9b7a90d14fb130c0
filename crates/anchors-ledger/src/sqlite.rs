//! SQLite implementation of the LedgerLogClient trait.
//!
//! Uses rusqlite with bundled SQLite, wrapped in async via
//! tokio::spawn_blocking. Entries are stored in canonical form and decoded on
//! read, so what comes back is exactly what was signed.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Params};
use tracing::debug;

use anchors_core::{
    canonical_bytes, decode_entry, now_millis, ChannelAddress, Endpoint, Entry, EntryId,
    ValidationError,
};

use crate::error::{LedgerError, Result};
use crate::migration;
use crate::traits::{admit_entry, admit_root, LedgerLogClient, LogRecord, PublishResult};

/// SQLite-backed ledger.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteLedger {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLedger {
    /// Open a SQLite ledger at the given path, creating and migrating it if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite ledger.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| LedgerError::Task(format!("connection mutex poisoned: {e}")))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| LedgerError::Task(format!("spawn_blocking failed: {e}")))?
    }
}

fn query_record<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Option<LogRecord>> {
    let row: Option<(i64, Vec<u8>, Vec<u8>)> = conn
        .query_row(sql, params, |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
        .optional()?;

    row.map(|(position, id, canonical)| {
        let id = EntryId::try_from(id.as_slice())
            .map_err(|_| LedgerError::Corrupt("entry id is not 32 bytes".into()))?;
        let entry = decode_entry(&canonical).map_err(|e| LedgerError::Corrupt(e.to_string()))?;
        if entry.compute_id() != id {
            return Err(LedgerError::Corrupt(format!("entry {id} does not hash to its id")));
        }
        Ok(LogRecord {
            position: position as u64,
            id,
            entry,
        })
    })
    .transpose()
}

fn insert_entry(conn: &Connection, id: &EntryId, entry: &Entry, position: u64) -> Result<()> {
    conn.execute(
        "INSERT INTO entries (
            entry_id, address, position, link, publisher, kind, timestamp,
            canonical_bytes, published_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            id.as_bytes().as_slice(),
            entry.address().as_bytes().as_slice(),
            position as i64,
            entry.link().map(|l| l.as_bytes().to_vec()),
            entry.publisher().as_bytes().as_slice(),
            entry.kind().to_u16(),
            entry.header.timestamp,
            canonical_bytes(entry),
            now_millis(),
        ],
    )?;
    Ok(())
}

#[async_trait]
impl LedgerLogClient for SqliteLedger {
    async fn create_branch(&self, node: &Endpoint, root: &Entry) -> Result<LogRecord> {
        admit_root(root)?;
        let root = root.clone();

        let record = self
            .blocking(move |conn| {
                let tx = conn.transaction()?;
                let id = root.compute_id();
                let address = *root.address();

                let existing: Option<Vec<u8>> = tx
                    .query_row(
                        "SELECT root_id FROM branches WHERE address = ?1",
                        params![address.as_bytes().as_slice()],
                        |row| row.get(0),
                    )
                    .optional()?;

                if let Some(existing) = existing {
                    if existing.as_slice() != id.as_bytes().as_slice() {
                        return Err(LedgerError::BranchExists(address));
                    }
                } else {
                    tx.execute(
                        "INSERT INTO branches (address, root_id, publisher, created_at)
                         VALUES (?1, ?2, ?3, ?4)",
                        params![
                            address.as_bytes().as_slice(),
                            id.as_bytes().as_slice(),
                            root.publisher().as_bytes().as_slice(),
                            now_millis(),
                        ],
                    )?;
                    insert_entry(&tx, &id, &root, 1)?;
                }
                tx.commit()?;

                Ok(LogRecord {
                    position: 1,
                    id,
                    entry: root,
                })
            })
            .await?;

        debug!(node = %node, address = %record.entry.address(), root = %record.id, "branch created");
        Ok(record)
    }

    async fn publish(&self, node: &Endpoint, entry: &Entry) -> Result<PublishResult> {
        admit_entry(entry)?;
        let entry = entry.clone();

        let result = self
            .blocking(move |conn| {
                let tx = conn.transaction()?;
                let id = entry.compute_id();
                let address = *entry.address();
                let addr = address.as_bytes().as_slice();

                let head: Option<Option<i64>> = tx
                    .query_row(
                        "SELECT (SELECT MAX(position) FROM entries WHERE address = ?1)
                         FROM branches WHERE address = ?1",
                        params![addr],
                        |row| row.get(0),
                    )
                    .optional()?;
                let Some(head) = head else {
                    return Err(LedgerError::UnknownBranch(address));
                };

                let existing: Option<i64> = tx
                    .query_row(
                        "SELECT position FROM entries WHERE entry_id = ?1",
                        params![id.as_bytes().as_slice()],
                        |row| row.get(0),
                    )
                    .optional()?;
                if let Some(position) = existing {
                    return Ok(PublishResult::AlreadyExists {
                        id,
                        position: position as u64,
                    });
                }

                let Some(link) = entry.header.link else {
                    return Err(ValidationError::MissingLink(entry.kind()).into());
                };
                let linked_here: bool = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM entries WHERE entry_id = ?1 AND address = ?2)",
                    params![link.as_bytes().as_slice(), addr],
                    |row| row.get(0),
                )?;
                if !linked_here {
                    return Err(ValidationError::UnknownLink(link).into());
                }

                let position = head.unwrap_or(0) as u64 + 1;
                insert_entry(&tx, &id, &entry, position)?;
                tx.commit()?;

                Ok(PublishResult::Published { id, position })
            })
            .await?;

        if let PublishResult::Published { id, position } = result {
            debug!(node = %node, entry = %id, position, "entry published");
        }
        Ok(result)
    }

    async fn read_next(
        &self,
        _node: &Endpoint,
        address: &ChannelAddress,
        after: u64,
    ) -> Result<Option<LogRecord>> {
        let address = *address;
        self.blocking(move |conn| {
            query_record(
                conn,
                "SELECT position, entry_id, canonical_bytes FROM entries
                 WHERE address = ?1 AND position > ?2
                 ORDER BY position ASC LIMIT 1",
                params![address.as_bytes().as_slice(), after as i64],
            )
        })
        .await
    }

    async fn read_by_id(
        &self,
        _node: &Endpoint,
        address: &ChannelAddress,
        id: &EntryId,
    ) -> Result<Option<LogRecord>> {
        let (address, id) = (*address, *id);
        self.blocking(move |conn| {
            query_record(
                conn,
                "SELECT position, entry_id, canonical_bytes FROM entries
                 WHERE address = ?1 AND entry_id = ?2",
                params![address.as_bytes().as_slice(), id.as_bytes().as_slice()],
            )
        })
        .await
    }
}

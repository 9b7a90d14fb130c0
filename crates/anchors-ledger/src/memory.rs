//! In-memory implementation of the LedgerLogClient trait.
//!
//! Same semantics as the SQLite ledger, no persistence. Several sessions can
//! share one instance through an `Arc` to observe each other's entries.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tracing::debug;

use anchors_core::{ChannelAddress, Endpoint, Entry, EntryId, ValidationError};

use crate::error::{LedgerError, Result};
use crate::traits::{admit_entry, admit_root, LedgerLogClient, LogRecord, PublishResult};

/// In-memory ledger.
///
/// All data is lost when the ledger is dropped. Thread-safe via RwLock.
pub struct MemoryLedger {
    inner: RwLock<MemoryLedgerInner>,
}

#[derive(Default)]
struct MemoryLedgerInner {
    /// Entry ids per branch, in position order (index 0 = position 1).
    branches: HashMap<ChannelAddress, Vec<EntryId>>,

    /// Entries indexed by id.
    entries: HashMap<EntryId, StoredEntry>,
}

struct StoredEntry {
    position: u64,
    entry: Entry,
}

impl MemoryLedgerInner {
    fn record(&self, id: &EntryId) -> Option<LogRecord> {
        self.entries.get(id).map(|stored| LogRecord {
            position: stored.position,
            id: *id,
            entry: stored.entry.clone(),
        })
    }
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryLedgerInner::default()),
        }
    }

    /// Number of entries on a branch, root included.
    pub fn branch_len(&self, address: &ChannelAddress) -> Result<usize> {
        Ok(self.read()?.branches.get(address).map_or(0, Vec::len))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryLedgerInner>> {
        self.inner
            .read()
            .map_err(|e| LedgerError::Task(format!("lock poisoned: {e}")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryLedgerInner>> {
        self.inner
            .write()
            .map_err(|e| LedgerError::Task(format!("lock poisoned: {e}")))
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerLogClient for MemoryLedger {
    async fn create_branch(&self, node: &Endpoint, root: &Entry) -> Result<LogRecord> {
        admit_root(root)?;

        let mut inner = self.write()?;
        let id = root.compute_id();
        let address = *root.address();

        if let Some(existing) = inner.branches.get(&address) {
            if existing.first() == Some(&id) {
                return inner.record(&id).ok_or_else(|| {
                    LedgerError::Corrupt(format!("root {id} indexed but not stored"))
                });
            }
            return Err(LedgerError::BranchExists(address));
        }

        inner.branches.insert(address, vec![id]);
        inner.entries.insert(
            id,
            StoredEntry {
                position: 1,
                entry: root.clone(),
            },
        );
        debug!(node = %node, address = %address, root = %id, "branch created");

        Ok(LogRecord {
            position: 1,
            id,
            entry: root.clone(),
        })
    }

    async fn publish(&self, node: &Endpoint, entry: &Entry) -> Result<PublishResult> {
        admit_entry(entry)?;

        let mut inner = self.write()?;
        let id = entry.compute_id();
        let address = *entry.address();

        if !inner.branches.contains_key(&address) {
            return Err(LedgerError::UnknownBranch(address));
        }
        if let Some(stored) = inner.entries.get(&id) {
            return Ok(PublishResult::AlreadyExists {
                id,
                position: stored.position,
            });
        }

        let Some(link) = entry.header.link else {
            return Err(ValidationError::MissingLink(entry.kind()).into());
        };
        let linked_here = inner
            .entries
            .get(&link)
            .is_some_and(|stored| stored.entry.address() == &address);
        if !linked_here {
            return Err(ValidationError::UnknownLink(link).into());
        }

        let branch = inner
            .branches
            .get_mut(&address)
            .ok_or(LedgerError::UnknownBranch(address))?;
        branch.push(id);
        let position = branch.len() as u64;

        inner.entries.insert(
            id,
            StoredEntry {
                position,
                entry: entry.clone(),
            },
        );
        debug!(node = %node, address = %address, entry = %id, position, "entry published");

        Ok(PublishResult::Published { id, position })
    }

    async fn read_next(
        &self,
        _node: &Endpoint,
        address: &ChannelAddress,
        after: u64,
    ) -> Result<Option<LogRecord>> {
        let inner = self.read()?;
        let Some(branch) = inner.branches.get(address) else {
            return Ok(None);
        };
        // Position p lives at index p - 1, so the entry after `after` is at `after`.
        Ok(usize::try_from(after)
            .ok()
            .and_then(|idx| branch.get(idx))
            .and_then(|id| inner.record(id)))
    }

    async fn read_by_id(
        &self,
        _node: &Endpoint,
        address: &ChannelAddress,
        id: &EntryId,
    ) -> Result<Option<LogRecord>> {
        let inner = self.read()?;
        Ok(inner
            .record(id)
            .filter(|record| record.entry.address() == address))
    }
}

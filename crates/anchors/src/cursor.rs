//! The session cursor.
//!
//! A bound session reads its branch strictly forward. The cursor remembers the
//! last position it consumed and which entries the session has seen, since an
//! entry can only be read directly once the entry it links to is known.
//!
//! The cursor is owned by exactly one session and is not `Clone`; every read
//! goes through `&mut`, so two readers can never share one.

use std::collections::HashSet;

use tracing::warn;

use anchors_core::{validate_entry, ChannelAddress, Endpoint, EntryId};
use anchors_ledger::{LedgerError, LedgerLogClient, LogRecord};

#[derive(Debug)]
pub struct SessionCursor {
    address: ChannelAddress,
    position: u64,
    known: HashSet<EntryId>,
    verify: bool,
}

impl SessionCursor {
    /// Start a cursor just past the branch root.
    pub(crate) fn at_root(root: &LogRecord, verify: bool) -> Self {
        Self {
            address: *root.entry.address(),
            position: root.position,
            known: HashSet::from([root.id]),
            verify,
        }
    }

    /// Position of the last entry consumed.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Whether the session holds the link state of `id`.
    pub fn knows(&self, id: &EntryId) -> bool {
        self.known.contains(id)
    }

    pub(crate) fn learn(&mut self, id: EntryId) {
        self.known.insert(id);
    }

    fn is_valid(&self, record: &LogRecord) -> bool {
        if !self.verify {
            return true;
        }
        match validate_entry(&record.entry) {
            Ok(()) => true,
            Err(e) => {
                warn!(entry = %record.id, position = record.position, error = %e, "ignoring invalid entry");
                false
            }
        }
    }

    /// Accept a record obtained by direct read.
    ///
    /// A record is accepted if it is already known, or if it is valid and links
    /// to a known entry. Accepted records become known.
    pub(crate) fn admit(&mut self, record: &LogRecord) -> bool {
        if self.knows(&record.id) {
            return true;
        }
        let linked = record.entry.link().is_some_and(|link| self.knows(link));
        if linked && record.entry.address() == &self.address && self.is_valid(record) {
            self.learn(record.id);
            return true;
        }
        false
    }

    /// Consume the next message entry of the branch.
    ///
    /// Invalid entries are skipped, and so are keyload entries, which carry
    /// access slots rather than messages. Returns `Ok(None)` once the branch is
    /// exhausted; the cursor stays where it is so later entries are still seen.
    pub(crate) async fn next<L>(&mut self, client: &L, node: &Endpoint) -> Result<Option<LogRecord>, LedgerError>
    where
        L: LedgerLogClient + ?Sized,
    {
        loop {
            let Some(record) = client.read_next(node, &self.address, self.position).await? else {
                return Ok(None);
            };
            if record.position <= self.position {
                return Err(LedgerError::Corrupt(format!(
                    "read after position {} returned position {}",
                    self.position, record.position
                )));
            }
            self.position = record.position;
            if self.is_valid(&record) {
                self.learn(record.id);
                if !record.entry.is_keyload() {
                    return Ok(Some(record));
                }
            }
        }
    }

    /// Consume entries until the cursor has reached `position`.
    pub(crate) async fn advance_to<L>(&mut self, client: &L, node: &Endpoint, position: u64) -> Result<(), LedgerError>
    where
        L: LedgerLogClient + ?Sized,
    {
        while self.position < position {
            if self.next(client, node).await?.is_none() {
                break;
            }
        }
        Ok(())
    }
}

//! LedgerLogClient trait: the abstract interface to an append-only ledger.
//!
//! Channels never see a concrete ledger. They are generic over this trait, and
//! the implementation (in-process, SQLite, or a remote node client) is chosen
//! when the context is built.

use anchors_core::{validate_entry, ChannelAddress, Endpoint, Entry, EntryId, ValidationError};
use async_trait::async_trait;

use crate::error::Result;

/// Checks every ledger applies before accepting a branch root.
pub(crate) fn admit_root(root: &Entry) -> Result<()> {
    if !root.is_announce() {
        return Err(ValidationError::StructuralError("branch root must be an announce entry".into()).into());
    }
    validate_entry(root)?;
    Ok(())
}

/// Checks every ledger applies before appending to a branch.
///
/// Branch membership of the link is checked by the ledger itself.
pub(crate) fn admit_entry(entry: &Entry) -> Result<()> {
    if entry.is_announce() {
        return Err(ValidationError::StructuralError("announce entries only start branches".into()).into());
    }
    validate_entry(entry)?;
    Ok(())
}

/// An entry as stored on a branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Branch-local position assigned by the ledger (root = 1).
    pub position: u64,
    pub id: EntryId,
    pub entry: Entry,
}

/// Result of publishing an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishResult {
    /// The entry was appended.
    Published { id: EntryId, position: u64 },
    /// The exact same entry is already on the branch (idempotent, not an error).
    AlreadyExists { id: EntryId, position: u64 },
}

impl PublishResult {
    pub fn id(&self) -> EntryId {
        match self {
            Self::Published { id, .. } | Self::AlreadyExists { id, .. } => *id,
        }
    }

    pub fn position(&self) -> u64 {
        match self {
            Self::Published { position, .. } | Self::AlreadyExists { position, .. } => *position,
        }
    }
}

/// Async interface to an append-only, authenticated ledger log.
///
/// Implementations must be `Send + Sync`; sessions share one client through
/// an `Arc`.
///
/// # Contract
///
/// - Entries are validated (signature, payload hash, announce address) before
///   they are accepted.
/// - A non-announce entry is only accepted if its link is already on the branch.
/// - Positions are dense and strictly increasing per branch, starting at 1.
/// - Reads never return entries from another branch.
#[async_trait]
pub trait LedgerLogClient: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Branches
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a branch from its announce entry.
    ///
    /// Re-creating a branch with the same root returns the existing root record.
    async fn create_branch(&self, node: &Endpoint, root: &Entry) -> Result<LogRecord>;

    /// Subscribe to a branch, returning its root record if the branch exists.
    async fn subscribe(&self, node: &Endpoint, address: &ChannelAddress) -> Result<Option<LogRecord>> {
        self.read_next(node, address, 0).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Entries
    // ─────────────────────────────────────────────────────────────────────────

    /// Append an entry to the branch named in its header.
    async fn publish(&self, node: &Endpoint, entry: &Entry) -> Result<PublishResult>;

    /// Read the first entry after `after` on a branch.
    ///
    /// Returns `Ok(None)` when the branch has nothing past `after`.
    async fn read_next(
        &self,
        node: &Endpoint,
        address: &ChannelAddress,
        after: u64,
    ) -> Result<Option<LogRecord>>;

    /// Read an entry of a branch by id.
    async fn read_by_id(
        &self,
        node: &Endpoint,
        address: &ChannelAddress,
        id: &EntryId,
    ) -> Result<Option<LogRecord>>;
}

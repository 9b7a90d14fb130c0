//! Reading messages back from a channel.

use serde::{Deserialize, Serialize};
use tracing::debug;

use anchors_core::{Ed25519PublicKey, EntryId};
use anchors_ledger::{LedgerLogClient, LogRecord};

use crate::channel::{AnchoringChannel, Session};
use crate::error::{AnchoringError, Result};
use crate::resolver;

/// A message read from a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResult {
    /// The message, unmasked if it was published on an encrypted channel.
    pub content: Vec<u8>,
    #[serde(rename = "entryID")]
    pub entry_id: String,
    #[serde(rename = "publisherKey")]
    pub publisher_key: Ed25519PublicKey,
}

impl Session {
    fn open(&self, record: LogRecord) -> Result<FetchResult> {
        let content = if record.entry.is_masked() {
            self.key.open(&record.entry.payload)?
        } else {
            record.entry.payload.to_vec()
        };
        Ok(FetchResult {
            content,
            entry_id: record.id.to_hex(),
            publisher_key: *record.entry.publisher(),
        })
    }
}

impl<L: LedgerLogClient> AnchoringChannel<L> {
    /// Fetch a message attached to `anchorage_id`.
    ///
    /// With `expected_entry_id` the entry is read directly and must be
    /// anchored at `anchorage_id`. Without it, the next entry after the
    /// anchorage in log order is returned. That needs the session cursor to
    /// still be at or before the anchorage: once it has read past it, the
    /// entries in between are gone for this session and the fetch fails with
    /// `MSG_NOT_FOUND`.
    pub async fn fetch(&mut self, anchorage_id: &str, expected_entry_id: Option<&str>) -> Result<FetchResult> {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let session = self.bound()?;

        let anchorage = resolver::resolve(client.as_ref(), &endpoint, session, anchorage_id)
            .await?
            .ok_or_else(|| AnchoringError::AnchorageNotFound(anchorage_id.to_string()))?;

        let Some(expected) = expected_entry_id else {
            if session.cursor.position() > anchorage.position {
                debug!(
                    anchorage = %anchorage.id,
                    cursor = session.cursor.position(),
                    "cursor already past the anchorage"
                );
                return Err(AnchoringError::MessageNotFound(format!("next after {anchorage_id}")));
            }
            session.cursor.advance_to(client.as_ref(), &endpoint, anchorage.position).await?;
            let record = session
                .cursor
                .next(client.as_ref(), &endpoint)
                .await?
                .ok_or_else(|| AnchoringError::MessageNotFound(format!("next after {anchorage_id}")))?;
            return session.open(record);
        };

        let not_found = || AnchoringError::MessageNotFound(expected.to_string());
        let expected_id: EntryId = expected.parse().map_err(|_| not_found())?;

        let record = client
            .read_by_id(&endpoint, session.channel_id.address(), &expected_id)
            .await?
            .filter(|record| !record.entry.is_keyload() && session.cursor.admit(record))
            .ok_or_else(not_found)?;

        if record.id != expected_id {
            return Err(AnchoringError::EntryMismatch {
                expected: expected_id,
                received: record.id,
            });
        }
        if record.entry.link() != Some(&anchorage.id) {
            return Err(AnchoringError::AnchorageMismatch {
                entry: record.id,
                expected: anchorage.id,
                actual: record.entry.link().copied(),
            });
        }

        debug!(anchorage = %anchorage.id, entry = %record.id, "fetched");
        session.open(record)
    }

    /// Read an entry by id without checking its anchorage.
    ///
    /// Only entries whose anchorage this session has already seen can be read.
    pub async fn receive(&mut self, entry_id: &str) -> Result<FetchResult> {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let session = self.bound()?;

        let not_found = || AnchoringError::MessageNotFound(entry_id.to_string());
        let id: EntryId = entry_id.parse().map_err(|_| not_found())?;

        let record = client
            .read_by_id(&endpoint, session.channel_id.address(), &id)
            .await?
            .filter(|record| !record.entry.is_keyload() && session.cursor.admit(record))
            .ok_or_else(not_found)?;
        session.open(record)
    }

    /// Read the next unread entry, or `None` when the branch is exhausted.
    pub async fn fetch_next(&mut self) -> Result<Option<FetchResult>> {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let session = self.bound()?;

        match session.cursor.next(client.as_ref(), &endpoint).await? {
            Some(record) => session.open(record).map(Some),
            None => Ok(None),
        }
    }
}

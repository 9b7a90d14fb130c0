//! Publishing messages at an anchorage.

use serde::{Deserialize, Serialize};
use tracing::info;

use anchors_core::{now_millis, EntryBuilder, EntryKind};
use anchors_ledger::LedgerLogClient;

use crate::channel::AnchoringChannel;
use crate::error::{AnchoringError, Result};
use crate::resolver;

/// Where a message was anchored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchoringResult {
    /// The anchorage exactly as it was passed to [`AnchoringChannel::anchor`].
    #[serde(rename = "anchorageID")]
    pub anchorage_id: String,
    /// Id of the new entry; usable as an anchorage right away.
    #[serde(rename = "entryID")]
    pub entry_id: String,
}

impl<L: LedgerLogClient> AnchoringChannel<L> {
    /// Publish `message` as a new entry attached to `anchorage_id`.
    ///
    /// Two anchors at the same anchorage are not serialized against each
    /// other and both succeed as sibling entries.
    pub async fn anchor(&mut self, message: &[u8], anchorage_id: &str) -> Result<AnchoringResult> {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let encrypted = self.config.encrypted;
        let session = self.bound()?;

        let anchorage = resolver::resolve(client.as_ref(), &endpoint, session, anchorage_id)
            .await?
            .ok_or_else(|| AnchoringError::AnchorageNotFound(anchorage_id.to_string()))?;

        let (kind, payload) = if encrypted {
            (EntryKind::Masked, session.key.seal(message)?)
        } else {
            (EntryKind::Signed, message.to_vec())
        };

        let entry = EntryBuilder::new(session.keypair.public_key(), *session.channel_id.address())
            .timestamp(now_millis())
            .kind(kind)
            .link(anchorage.id)
            .payload(payload)
            .sign(&session.keypair);

        let published = client.publish(&endpoint, &entry).await?;
        session.cursor.learn(published.id());

        info!(
            channel = %session.channel_id,
            anchorage = %anchorage.id,
            entry = %published.id(),
            position = published.position(),
            "message anchored"
        );

        Ok(AnchoringResult {
            anchorage_id: anchorage_id.to_string(),
            entry_id: published.id().to_hex(),
        })
    }
}

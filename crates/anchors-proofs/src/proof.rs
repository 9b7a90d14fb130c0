//! The anchored proof record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Proof type of every [`LinkedProof`].
pub const ANCHORED_LINKED_DATA_PROOF_2021: &str = "AnchoredLinkedDataProof2021";

/// Proof that a document was signed and the signature anchored on a channel.
///
/// The signature itself lives on the channel; the proof records where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedProof {
    #[serde(rename = "type")]
    pub proof_type: String,
    /// Controller of the signing key.
    pub verification_method: String,
    pub proof_purpose: String,
    pub proof_value: ProofValue,
    pub created: DateTime<Utc>,
}

/// Location of an anchored signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofValue {
    #[serde(rename = "channelID")]
    pub channel_id: String,
    #[serde(rename = "anchorageID")]
    pub anchorage_id: String,
    #[serde(rename = "entryID")]
    pub entry_id: String,
}

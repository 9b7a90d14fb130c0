//! Proof generation.

use serde_json::Value;
use tracing::{debug, info};

use anchors::ledger::LedgerLogClient;
use anchors::{AnchoringChannel, AnchoringError};

use crate::error::{ChainError, Result};
use crate::proof::{LinkedProof, ProofValue, ANCHORED_LINKED_DATA_PROOF_2021};
use crate::signer::{SecretKey, Signer, DATA_VERIFICATION};

/// Signs documents and anchors the signatures on a bound channel.
pub struct ProofGenerator<L, S> {
    channel: AnchoringChannel<L>,
    signer: S,
}

impl<L: LedgerLogClient, S: Signer> ProofGenerator<L, S> {
    /// Wrap a channel. It must be bound before proofs can be generated.
    pub fn new(channel: AnchoringChannel<L>, signer: S) -> Self {
        Self { channel, signer }
    }

    pub fn channel(&self) -> &AnchoringChannel<L> {
        &self.channel
    }

    pub fn signer(&self) -> &S {
        &self.signer
    }

    pub fn into_channel(self) -> AnchoringChannel<L> {
        self.channel
    }

    /// Sign `document` and anchor the signature at `anchorage_id`.
    pub async fn generate(
        &mut self,
        document: &Value,
        verification_method: &str,
        secret: &SecretKey,
        anchorage_id: &str,
    ) -> Result<LinkedProof> {
        let channel_id = self.channel.channel_id().ok_or(AnchoringError::NotBound)?;

        let signature = self.signer.sign_json(document, verification_method, secret).await?;
        let payload = serde_json::to_vec(&signature)?;
        let anchored = self.channel.anchor(&payload, anchorage_id).await?;

        debug!(channel = %channel_id, entry = %anchored.entry_id, "anchored proof");
        Ok(LinkedProof {
            proof_type: ANCHORED_LINKED_DATA_PROOF_2021.to_string(),
            verification_method: self.signer.controller().to_string(),
            proof_purpose: DATA_VERIFICATION.to_string(),
            proof_value: ProofValue {
                channel_id: channel_id.to_string(),
                anchorage_id: anchored.anchorage_id,
                entry_id: anchored.entry_id,
            },
            created: chrono::Utc::now(),
        })
    }

    /// Prove `documents` in order, each anchored at the previous proof's entry.
    ///
    /// The first proof is anchored at `anchorage_id`.
    pub async fn generate_chain(
        &mut self,
        documents: &[Value],
        verification_method: &str,
        secret: &SecretKey,
        anchorage_id: &str,
    ) -> std::result::Result<Vec<LinkedProof>, ChainError> {
        let mut completed: Vec<LinkedProof> = Vec::with_capacity(documents.len());
        let mut anchorage = anchorage_id.to_string();

        for (index, document) in documents.iter().enumerate() {
            match self.generate(document, verification_method, secret, &anchorage).await {
                Ok(proof) => {
                    anchorage.clone_from(&proof.proof_value.entry_id);
                    completed.push(proof);
                }
                Err(source) => {
                    return Err(ChainError {
                        index,
                        completed,
                        source,
                    })
                }
            }
        }

        info!(proofs = completed.len(), "generated proof chain");
        Ok(completed)
    }
}

impl<L, S: std::fmt::Debug> std::fmt::Debug for ProofGenerator<L, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProofGenerator")
            .field("channel", &self.channel.channel_id())
            .field("signer", &self.signer)
            .finish()
    }
}

//! Proof verification.
//!
//! Verification opens its own session on the proof's channel, reads the
//! anchored signature back and checks it against the document. A proof whose
//! channel cannot be bound, or whose signature cannot be found where it claims
//! to be, is invalid, not an error. Ledger failures still surface as errors.

use serde_json::Value;
use tracing::{debug, warn};

use anchors::core::PresharedKey;
use anchors::ledger::LedgerLogClient;
use anchors::{
    AnchoringChannel, AnchoringError, ChannelConfig, Ed25519PublicKey, Endpoint, ErrorKind, FetchResult,
    LedgerContext,
};

use crate::error::{ProofError, Result};
use crate::proof::{LinkedProof, ProofValue, ANCHORED_LINKED_DATA_PROOF_2021};
use crate::signer::{verify_json, LinkedDataSignature};

/// Checks [`LinkedProof`]s against the ledger.
pub struct ProofVerifier<L> {
    context: LedgerContext<L>,
    endpoint: Endpoint,
    strict: bool,
    preshared_keys: Vec<PresharedKey>,
}

impl<L: LedgerLogClient> ProofVerifier<L> {
    pub fn new(context: LedgerContext<L>, endpoint: &str) -> Result<Self> {
        let endpoint = Endpoint::parse(endpoint).map_err(AnchoringError::InvalidNode)?;
        Ok(Self {
            context,
            endpoint,
            strict: false,
            preshared_keys: Vec::new(),
        })
    }

    /// In strict mode, [`verify_chain`](Self::verify_chain) requires every
    /// proof after the first to be the entry that directly follows the
    /// previous one on the channel. Otherwise each proof is looked up on its
    /// own, skipping whatever else was published in between.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Keys used to bind to private channels.
    pub fn with_preshared_keys(mut self, keys: impl IntoIterator<Item = PresharedKey>) -> Self {
        self.preshared_keys.extend(keys);
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Verify a single proof.
    pub async fn verify(&self, document: &Value, proof: &LinkedProof, public_key: &Ed25519PublicKey) -> Result<bool> {
        if proof.proof_type != ANCHORED_LINKED_DATA_PROOF_2021 {
            return Ok(false);
        }
        let value = &proof.proof_value;
        let Some(mut session) = self.open(&value.channel_id).await? else {
            return Ok(false);
        };

        match locate(&mut session, &value.anchorage_id, Some(&value.entry_id)).await? {
            Some(fetched) => matches(document, proof, &fetched, public_key),
            None => Ok(false),
        }
    }

    /// Verify proofs produced by a chained generation.
    ///
    /// All proofs must be on one channel and each must be anchored at the
    /// previous proof's entry. An empty chain does not verify.
    pub async fn verify_chain(
        &self,
        documents: &[Value],
        proofs: &[LinkedProof],
        public_key: &Ed25519PublicKey,
    ) -> Result<bool> {
        let Some(first) = proofs.first() else {
            return Ok(false);
        };
        if documents.len() != proofs.len() {
            return Ok(false);
        }
        if proofs.iter().any(|p| p.proof_type != ANCHORED_LINKED_DATA_PROOF_2021) {
            return Ok(false);
        }

        let channel_id = &first.proof_value.channel_id;
        if proofs.iter().any(|p| &p.proof_value.channel_id != channel_id) {
            debug!("proof chain spans channels");
            return Ok(false);
        }
        let linked = proofs
            .windows(2)
            .all(|pair| pair[1].proof_value.anchorage_id == pair[0].proof_value.entry_id);
        if !linked {
            debug!("proof chain is not linked in order");
            return Ok(false);
        }

        let Some(mut session) = self.open(channel_id).await? else {
            return Ok(false);
        };

        let mut previous: Option<&ProofValue> = None;
        for (document, proof) in documents.iter().zip(proofs) {
            let value = &proof.proof_value;
            // The first proof is always looked up directly, to position the session.
            let fetched = match previous {
                Some(prev) if self.strict => match locate(&mut session, &prev.entry_id, None).await? {
                    Some(next) if next.entry_id == value.entry_id => Some(next),
                    Some(next) => {
                        debug!(expected = %value.entry_id, found = %next.entry_id, "proof is not the next entry");
                        None
                    }
                    None => None,
                },
                _ => locate(&mut session, &value.anchorage_id, Some(&value.entry_id)).await?,
            };

            let Some(fetched) = fetched else {
                return Ok(false);
            };
            if !matches(document, proof, &fetched, public_key)? {
                return Ok(false);
            }
            previous = Some(value);
        }
        Ok(true)
    }

    /// Verify a sequence of documents from one proof.
    ///
    /// `proof` locates the first document's signature. Each following
    /// document's signature must be the entry that comes next on the channel
    /// after the previous signature. No documents means nothing was proven.
    pub async fn verify_chain_single_proof(
        &self,
        documents: &[Value],
        proof: &LinkedProof,
        public_key: &Ed25519PublicKey,
    ) -> Result<bool> {
        if documents.is_empty() || proof.proof_type != ANCHORED_LINKED_DATA_PROOF_2021 {
            return Ok(false);
        }
        let value = &proof.proof_value;
        let Some(mut session) = self.open(&value.channel_id).await? else {
            return Ok(false);
        };

        let mut fetched = locate(&mut session, &value.anchorage_id, Some(&value.entry_id)).await?;
        for (index, document) in documents.iter().enumerate() {
            let Some(current) = fetched.take() else {
                debug!(index, "no signature for document");
                return Ok(false);
            };
            if !matches(document, proof, &current, public_key)? {
                return Ok(false);
            }
            if index + 1 < documents.len() {
                fetched = locate(&mut session, &current.entry_id, None).await?;
            }
        }
        Ok(true)
    }

    /// A fresh session bound to `channel_id`, or `None` if it cannot be bound.
    async fn open(&self, channel_id: &str) -> Result<Option<AnchoringChannel<L>>> {
        let private = channel_id.split(':').count() == 3;
        let context = self.context.clone().with_config(ChannelConfig {
            private,
            ..self.context.config().clone()
        });

        let mut session = AnchoringChannel::create(&context, self.endpoint.as_str(), None)?;
        if private {
            session = session.with_preshared_keys(self.preshared_keys.iter().cloned());
        }

        match session.bind(Some(channel_id)).await {
            Ok(_) => Ok(Some(session)),
            Err(e) if e.kind() == ErrorKind::ChannelBindingError => {
                debug!(channel = channel_id, error = %e, "proof channel cannot be bound");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Fetch from the session, mapping "not there" outcomes to `None`.
async fn locate<L: LedgerLogClient>(
    session: &mut AnchoringChannel<L>,
    anchorage_id: &str,
    entry_id: Option<&str>,
) -> Result<Option<FetchResult>> {
    match session.fetch(anchorage_id, entry_id).await {
        Ok(fetched) => Ok(Some(fetched)),
        Err(e) if is_missing(&e) => {
            debug!(anchorage = anchorage_id, entry = ?entry_id, error = %e, "anchored signature not found");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Check an anchored signature against `document`.
fn matches(
    document: &Value,
    proof: &LinkedProof,
    fetched: &FetchResult,
    public_key: &Ed25519PublicKey,
) -> Result<bool> {
    let signature: LinkedDataSignature = match serde_json::from_slice(&fetched.content) {
        Ok(signature) => signature,
        Err(e) => {
            warn!(entry = %fetched.entry_id, error = %e, "anchored payload is not a signature");
            return Ok(false);
        }
    };
    if signature.verification_method.split('#').next() != Some(proof.verification_method.as_str()) {
        return Ok(false);
    }

    match verify_json(document, &signature, public_key) {
        Ok(valid) => Ok(valid),
        Err(ProofError::MalformedSignature(reason)) => {
            warn!(entry = %fetched.entry_id, %reason, "anchored signature is malformed");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

fn is_missing(error: &AnchoringError) -> bool {
    matches!(
        error.kind(),
        ErrorKind::AnchorageNotFound | ErrorKind::MsgNotFound | ErrorKind::ConsistencyMismatch
    )
}

impl<L> std::fmt::Debug for ProofVerifier<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProofVerifier")
            .field("endpoint", &self.endpoint)
            .field("strict", &self.strict)
            .finish_non_exhaustive()
    }
}

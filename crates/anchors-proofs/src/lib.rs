//! # Anchors Proofs
//!
//! Linked data proofs whose signatures live on an anchoring channel.
//!
//! [`ProofGenerator`] signs a JSON document with a [`Signer`], anchors the
//! signature on a bound channel and returns a [`LinkedProof`] recording where
//! it went. [`ProofVerifier`] reads the signature back from the ledger and
//! checks it against the document.
//!
//! Proofs can be chained: with [`ProofGenerator::generate_chain`] each
//! signature is anchored at the previous one's entry, and
//! [`ProofVerifier::verify_chain`] checks the whole sequence in order.
//! [`ProofVerifier::verify_chain_single_proof`] needs only the first proof and
//! walks the channel entry by entry for the rest.

pub mod error;
pub mod generator;
pub mod proof;
pub mod signer;
pub mod verifier;

pub use error::{ChainError, ProofError, Result};
pub use generator::ProofGenerator;
pub use proof::{LinkedProof, ProofValue, ANCHORED_LINKED_DATA_PROOF_2021};
pub use signer::{
    verify_json, Ed25519JcsSigner, LinkedDataSignature, SecretKey, Signer, DATA_VERIFICATION,
    JCS_ED25519_SIGNATURE_2020,
};
pub use verifier::ProofVerifier;

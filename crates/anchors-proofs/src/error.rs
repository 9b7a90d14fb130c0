//! Error types for proof generation and verification.

use anchors::AnchoringError;
use thiserror::Error;

use crate::proof::LinkedProof;

/// Errors that can occur while signing, anchoring or checking proofs.
#[derive(Debug, Error)]
pub enum ProofError {
    /// Only JSON objects can carry an embedded proof.
    #[error("invalid data type: only JSON objects can be signed")]
    InvalidDataType,

    #[error("canonicalization failed: {0}")]
    Canonicalization(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    #[error(transparent)]
    Anchoring(#[from] AnchoringError),
}

/// A proof chain stopped part way through.
///
/// Proofs generated before the failure are already anchored; they are handed
/// back so the caller can resume from the last one.
#[derive(Debug, Error)]
#[error("proof chain failed at document {index}: {source}")]
pub struct ChainError {
    /// Index of the document that could not be proven.
    pub index: usize,
    pub completed: Vec<LinkedProof>,
    #[source]
    pub source: ProofError,
}

/// Result type for proof operations.
pub type Result<T> = std::result::Result<T, ProofError>;

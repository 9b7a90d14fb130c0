//! Error types for the anchors core.

use thiserror::Error;

use crate::types::EntryId;

/// Core errors that can occur while building, decoding or unmasking entries.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("unsupported entry version: {0}")]
    UnsupportedVersion(u8),

    #[error("malformed entry: {0}")]
    MalformedEntry(String),

    #[error("decoding error: {0}")]
    DecodingError(String),

    #[error("invalid identifier {input:?}: {reason}")]
    InvalidIdentifier { input: String, reason: String },

    #[error("invalid endpoint {input:?}: {reason}")]
    InvalidEndpoint { input: String, reason: String },

    #[error("payload masking failed: {0}")]
    Masking(String),
}

impl CoreError {
    pub(crate) fn identifier(input: &str, reason: impl Into<String>) -> Self {
        CoreError::InvalidIdentifier {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// Validation errors for entry structure and signatures.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("signature verification failed")]
    SignatureFailed,

    #[error("payload hash does not match header")]
    PayloadHashMismatch,

    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),

    #[error("announce entry must not link to an anchorage")]
    AnnounceWithLink,

    #[error("entry of kind {0:?} must link to an anchorage")]
    MissingLink(crate::entry::EntryKind),

    #[error("channel address is not derived from the announce entry")]
    AddressMismatch,

    #[error("anchorage {0} is not part of the branch")]
    UnknownLink(EntryId),

    #[error("structural error: {0}")]
    StructuralError(String),
}

impl From<CoreError> for ValidationError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidSignature | CoreError::InvalidPublicKey => {
                ValidationError::SignatureFailed
            }
            CoreError::UnsupportedVersion(v) => ValidationError::UnsupportedVersion(v),
            other => ValidationError::StructuralError(other.to_string()),
        }
    }
}

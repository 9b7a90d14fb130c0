//! Error types for anchoring channels.

use std::fmt;

use anchors_core::{ChannelId, CoreError, EntryId};
use anchors_ledger::LedgerError;
use thiserror::Error;

/// The kind of failure, independent of the details carried by the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidNode,
    ChannelNotBound,
    ChannelAlreadyBound,
    ChannelBindingError,
    AnchorageNotFound,
    MsgNotFound,
    /// The entry received is not the one that was asked for.
    ConsistencyMismatch,
    OtherError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidNode => "INVALID_NODE",
            ErrorKind::ChannelNotBound => "CHANNEL_NOT_BOUND",
            ErrorKind::ChannelAlreadyBound => "CHANNEL_ALREADY_BOUND",
            ErrorKind::ChannelBindingError => "CHANNEL_BINDING_ERROR",
            ErrorKind::AnchorageNotFound => "ANCHORAGE_NOT_FOUND",
            ErrorKind::MsgNotFound => "MSG_NOT_FOUND",
            ErrorKind::ConsistencyMismatch => "CONSISTENCY_MISMATCH",
            ErrorKind::OtherError => "OTHER_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during channel operations.
#[derive(Debug, Error)]
pub enum AnchoringError {
    /// The node address is not a well-formed endpoint.
    #[error("invalid node: {0}")]
    InvalidNode(#[source] CoreError),

    #[error("channel is not bound, call bind first")]
    NotBound,

    #[error("channel is already bound to {0}")]
    AlreadyBound(ChannelId),

    #[error("cannot bind to channel {channel}: {reason}")]
    Binding { channel: String, reason: String },

    #[error("anchorage {0} not found on the channel")]
    AnchorageNotFound(String),

    #[error("message {0} not found on the channel")]
    MessageNotFound(String),

    /// The ledger returned a different entry than the one requested.
    #[error("requested entry {expected} but received {received}")]
    EntryMismatch { expected: EntryId, received: EntryId },

    /// The requested entry exists but hangs off another anchorage.
    #[error("entry {entry} is anchored at {actual:?}, not at {expected}")]
    AnchorageMismatch {
        entry: EntryId,
        expected: EntryId,
        actual: Option<EntryId>,
    },

    /// Ledger or transport failure.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Payload masking or decoding failure.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl AnchoringError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnchoringError::InvalidNode(_) => ErrorKind::InvalidNode,
            AnchoringError::NotBound => ErrorKind::ChannelNotBound,
            AnchoringError::AlreadyBound(_) => ErrorKind::ChannelAlreadyBound,
            AnchoringError::Binding { .. } => ErrorKind::ChannelBindingError,
            AnchoringError::AnchorageNotFound(_) => ErrorKind::AnchorageNotFound,
            AnchoringError::MessageNotFound(_) => ErrorKind::MsgNotFound,
            AnchoringError::EntryMismatch { .. } | AnchoringError::AnchorageMismatch { .. } => {
                ErrorKind::ConsistencyMismatch
            }
            AnchoringError::Ledger(_) | AnchoringError::Core(_) => ErrorKind::OtherError,
        }
    }

    pub(crate) fn binding(channel: &str, reason: impl fmt::Display) -> Self {
        AnchoringError::Binding {
            channel: channel.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for channel operations.
pub type Result<T> = std::result::Result<T, AnchoringError>;

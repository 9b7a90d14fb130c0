//! # Anchors Core
//!
//! Pure primitives for anchoring channels: ledger entries, channel identity,
//! session seeds, and canonicalization.
//!
//! This crate contains no I/O, no storage, no networking. Everything a ledger
//! or a channel session needs to build, identify and check an entry lives here.
//!
//! ## Key Types
//!
//! - [`Entry`] - A signed record on a channel branch
//! - [`EntryId`] - Content-addressed identifier (Blake3 hash)
//! - [`ChannelAddress`] - The address of a channel branch
//! - [`ChannelId`] - Public channel identity, `"<address>:<root entry id>"`,
//!   with a third `:<keyload entry id>` component on private channels
//! - [`PresharedKey`] - Out-of-band access to a private channel
//! - [`Seed`] - Secret session material a publishing key is derived from
//! - [`Endpoint`] - A validated ledger node address
//!
//! ## Canonicalization
//!
//! Entry headers are encoded using deterministic CBOR. See [`canonical`] module.

pub mod canonical;
pub mod crypto;
pub mod endpoint;
pub mod entry;
pub mod error;
pub mod mask;
pub mod seed;
pub mod types;
pub mod validation;

pub use canonical::{canonical_bytes, canonical_header_bytes, decode_entry};
pub use crypto::{Blake3Hash, Ed25519PublicKey, Ed25519Signature, Keypair};
pub use endpoint::Endpoint;
pub use entry::{Entry, EntryBuilder, EntryHeader, EntryKind};
pub use error::{CoreError, ValidationError};
pub use mask::{ChannelKey, PresharedKey};
pub use seed::Seed;
pub use types::{ChannelAddress, ChannelId, EntryId};
pub use validation::{validate_entry, validate_entry_structure};

/// Get current time in milliseconds since Unix epoch.
pub fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

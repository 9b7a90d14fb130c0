//! Entries: signed records on a channel branch.
//!
//! Every branch starts with one `Announce` entry (the root). A private branch
//! follows it with a `Keyload` entry linked to the root. All later entries
//! link to an entry already on the branch, their anchorage. Log positions are
//! assigned by the ledger and are not part of the signed entry, so several
//! entries may share an anchorage.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::canonical::{canonical_bytes, signed_message_from_parts};
use crate::crypto::{Blake3Hash, Ed25519PublicKey, Ed25519Signature, Keypair};
use crate::types::{ChannelAddress, EntryId};

/// The current entry schema version.
pub const ENTRY_VERSION: u8 = 0;

/// How an entry's payload is to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum EntryKind {
    /// Branch root. The payload is the nonce the address was derived from.
    Announce = 0x0001,
    /// Cleartext payload.
    Signed = 0x0002,
    /// Payload sealed under the channel key.
    Masked = 0x0003,
    /// Access slots of a private branch; see [`ChannelKey::seal_keyload`](crate::mask::ChannelKey::seal_keyload).
    Keyload = 0x0004,
}

impl EntryKind {
    pub fn to_u16(self) -> u16 {
        self as u16
    }

    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0001 => Some(Self::Announce),
            0x0002 => Some(Self::Signed),
            0x0003 => Some(Self::Masked),
            0x0004 => Some(Self::Keyload),
            _ => None,
        }
    }
}

/// The header of an entry, containing all metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryHeader {
    /// Schema version (currently 0).
    pub version: u8,

    /// The publisher's public key.
    pub publisher: Ed25519PublicKey,

    /// The branch this entry is published on.
    pub address: ChannelAddress,

    /// Publisher-claimed timestamp (Unix milliseconds). Untrusted.
    pub timestamp: i64,

    pub kind: EntryKind,

    /// The anchorage this entry is attached to. `None` only for the root.
    pub link: Option<EntryId>,

    /// Blake3 hash of the payload bytes.
    pub payload_hash: Blake3Hash,
}

/// A complete entry: header + payload + signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub header: EntryHeader,

    /// The payload bytes (sealed if the kind is `Masked`).
    pub payload: Bytes,

    /// Ed25519 signature over (canonical_header || payload).
    pub signature: Ed25519Signature,
}

impl Entry {
    /// Compute the entry ID (Blake3 hash of canonical bytes).
    pub fn compute_id(&self) -> EntryId {
        EntryId(Blake3Hash::hash(&canonical_bytes(self)).0)
    }

    pub fn publisher(&self) -> &Ed25519PublicKey {
        &self.header.publisher
    }

    pub fn address(&self) -> &ChannelAddress {
        &self.header.address
    }

    pub fn kind(&self) -> EntryKind {
        self.header.kind
    }

    /// The anchorage this entry is attached to.
    pub fn link(&self) -> Option<&EntryId> {
        self.header.link.as_ref()
    }

    pub fn is_announce(&self) -> bool {
        self.header.kind == EntryKind::Announce
    }

    pub fn is_masked(&self) -> bool {
        self.header.kind == EntryKind::Masked
    }

    pub fn is_keyload(&self) -> bool {
        self.header.kind == EntryKind::Keyload
    }
}

/// Builder for creating entries.
pub struct EntryBuilder {
    publisher: Ed25519PublicKey,
    address: ChannelAddress,
    timestamp: i64,
    kind: EntryKind,
    link: Option<EntryId>,
    payload: Bytes,
}

impl EntryBuilder {
    /// Start building a cleartext entry on `address`.
    pub fn new(publisher: Ed25519PublicKey, address: ChannelAddress) -> Self {
        Self {
            publisher,
            address,
            timestamp: 0,
            kind: EntryKind::Signed,
            link: None,
            payload: Bytes::new(),
        }
    }

    /// Start building the announce entry of a new branch.
    ///
    /// The branch address is derived from the publisher key and `nonce`,
    /// which becomes the announce payload.
    pub fn announce(publisher: Ed25519PublicKey, nonce: impl Into<Bytes>) -> Self {
        let nonce = nonce.into();
        let address = ChannelAddress::derive(&publisher, &nonce);
        Self {
            publisher,
            address,
            timestamp: 0,
            kind: EntryKind::Announce,
            link: None,
            payload: nonce,
        }
    }

    pub fn timestamp(mut self, ts: i64) -> Self {
        self.timestamp = ts;
        self
    }

    pub fn kind(mut self, kind: EntryKind) -> Self {
        self.kind = kind;
        self
    }

    /// Attach the entry to an anchorage.
    pub fn link(mut self, anchorage: EntryId) -> Self {
        self.link = Some(anchorage);
        self
    }

    pub fn payload(mut self, p: impl Into<Bytes>) -> Self {
        self.payload = p.into();
        self
    }

    /// Build and sign the entry.
    pub fn sign(self, keypair: &Keypair) -> Entry {
        let header = EntryHeader {
            version: ENTRY_VERSION,
            publisher: self.publisher,
            address: self.address,
            timestamp: self.timestamp,
            kind: self.kind,
            link: self.link,
            payload_hash: Blake3Hash::hash(&self.payload),
        };

        let signature = keypair.sign(&signed_message_from_parts(&header, &self.payload));

        Entry {
            header,
            payload: self.payload,
            signature,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_kind_roundtrip() {
        for kind in [EntryKind::Announce, EntryKind::Signed, EntryKind::Masked, EntryKind::Keyload] {
            assert_eq!(EntryKind::from_u16(kind.to_u16()), Some(kind));
        }
        assert_eq!(EntryKind::from_u16(0x0200), None);
    }

    #[test]
    fn test_announce_builder_derives_address() {
        let keypair = Keypair::from_seed(&[0x42; 32]);
        let root = EntryBuilder::announce(keypair.public_key(), b"nonce".to_vec())
            .timestamp(1736870400000)
            .sign(&keypair);

        assert!(root.is_announce());
        assert!(root.link().is_none());
        assert_eq!(
            *root.address(),
            ChannelAddress::derive(&keypair.public_key(), b"nonce")
        );
    }

    #[test]
    fn test_linked_entry() {
        let keypair = Keypair::generate();
        let root = EntryBuilder::announce(keypair.public_key(), b"nonce".to_vec()).sign(&keypair);
        let root_id = root.compute_id();

        let entry = EntryBuilder::new(keypair.public_key(), *root.address())
            .timestamp(1736870400001)
            .link(root_id)
            .payload(b"Hello".to_vec())
            .sign(&keypair);

        assert_eq!(entry.kind(), EntryKind::Signed);
        assert_eq!(entry.link(), Some(&root_id));
        assert_eq!(entry.payload.as_ref(), b"Hello");
    }

    #[test]
    fn test_entry_id_deterministic() {
        let keypair = Keypair::from_seed(&[0x42; 32]);
        let entry = EntryBuilder::announce(keypair.public_key(), b"n".to_vec())
            .timestamp(1234567890000)
            .sign(&keypair);
        assert_eq!(entry.compute_id(), entry.compute_id());
    }

    #[test]
    fn test_siblings_at_same_anchorage_differ() {
        let keypair = Keypair::from_seed(&[0x42; 32]);
        let root = EntryBuilder::announce(keypair.public_key(), b"n".to_vec()).sign(&keypair);
        let anchorage = root.compute_id();

        let a = EntryBuilder::new(keypair.public_key(), *root.address())
            .link(anchorage)
            .payload(b"a".to_vec())
            .sign(&keypair);
        let b = EntryBuilder::new(keypair.public_key(), *root.address())
            .link(anchorage)
            .payload(b"b".to_vec())
            .sign(&keypair);

        assert_ne!(a.compute_id(), b.compute_id());
    }
}

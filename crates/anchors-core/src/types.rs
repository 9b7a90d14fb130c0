//! Identifier types for channels and entries.
//!
//! All identifiers are newtypes to prevent misuse at compile time. On the wire
//! they are lowercase hex strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::crypto::Ed25519PublicKey;
use crate::error::CoreError;

fn decode_hex32(s: &str) -> Result<[u8; 32], hex::FromHexError> {
    let bytes = hex::decode(s)?;
    if bytes.len() != 32 {
        return Err(hex::FromHexError::InvalidStringLength);
    }
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&bytes);
    Ok(arr)
}

/// A 32-byte entry identifier, computed as Blake3(canonical_bytes(entry)).
///
/// Entry identifiers double as anchorages: any entry already on a branch can
/// be the attachment point of a new one.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub [u8; 32]);

impl EntryId {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        decode_hex32(s).map(Self)
    }
}

impl fmt::Debug for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryId({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for EntryId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s).map_err(|e| CoreError::identifier(s, e.to_string()))
    }
}

impl AsRef<[u8]> for EntryId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for EntryId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for EntryId {
    type Error = std::array::TryFromSliceError;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; 32] = slice.try_into()?;
        Ok(Self(arr))
    }
}

/// The address of a channel branch on the ledger.
///
/// Derived from the publisher's key and the random nonce carried by the
/// branch's announce entry, so ledgers can check that a branch was created by
/// whoever claims it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelAddress(pub [u8; 32]);

impl ChannelAddress {
    /// Derive a branch address from the publisher's key and an announce nonce.
    pub fn derive(publisher: &Ed25519PublicKey, nonce: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"anchors-channel-v0:");
        hasher.update(publisher.as_bytes());
        hasher.update(b":");
        hasher.update(nonce);
        Self(*hasher.finalize().as_bytes())
    }

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        decode_hex32(s).map(Self)
    }
}

impl fmt::Debug for ChannelAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChannelAddress({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for ChannelAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for ChannelAddress {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for ChannelAddress {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Public identity of a channel: its branch address plus the id of the root
/// (announce) entry, and on private channels the id of the keyload entry.
///
/// The string form is `"<address>:<root entry id>"`, or
/// `"<address>:<root entry id>:<keyload entry id>"` for a private channel.
/// The last component is the channel's first anchorage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId {
    address: ChannelAddress,
    root: EntryId,
    keyload: Option<EntryId>,
}

impl ChannelId {
    pub const fn new(address: ChannelAddress, root: EntryId) -> Self {
        Self {
            address,
            root,
            keyload: None,
        }
    }

    pub const fn private(address: ChannelAddress, root: EntryId, keyload: EntryId) -> Self {
        Self {
            address,
            root,
            keyload: Some(keyload),
        }
    }

    /// Parse the two-component public form or the three-component private form.
    ///
    /// Every component must be non-empty, 32 bytes of hex.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let parts: Vec<&str> = s.split(':').collect();
        if !(2..=3).contains(&parts.len()) || parts.iter().any(|p| p.is_empty()) {
            return Err(CoreError::identifier(
                s,
                "expected <address>:<root entry id>[:<keyload entry id>]",
            ));
        }
        let address = ChannelAddress::from_hex(parts[0])
            .map_err(|e| CoreError::identifier(s, format!("address: {e}")))?;
        let root = EntryId::from_hex(parts[1])
            .map_err(|e| CoreError::identifier(s, format!("root entry id: {e}")))?;
        let keyload = parts
            .get(2)
            .map(|k| EntryId::from_hex(k))
            .transpose()
            .map_err(|e| CoreError::identifier(s, format!("keyload entry id: {e}")))?;
        Ok(Self {
            address,
            root,
            keyload,
        })
    }

    pub const fn address(&self) -> &ChannelAddress {
        &self.address
    }

    /// The root (announce) entry id.
    pub const fn root(&self) -> &EntryId {
        &self.root
    }

    /// The keyload entry id of a private channel.
    pub const fn keyload(&self) -> Option<&EntryId> {
        self.keyload.as_ref()
    }

    pub const fn is_private(&self) -> bool {
        self.keyload.is_some()
    }

    /// The default anchorage: the keyload entry if private, else the root.
    pub fn first_anchorage(&self) -> &EntryId {
        self.keyload.as_ref().unwrap_or(&self.root)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.root)?;
        match &self.keyload {
            Some(keyload) => write!(f, ":{keyload}"),
            None => Ok(()),
        }
    }
}

impl FromStr for ChannelId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ChannelId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ChannelId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

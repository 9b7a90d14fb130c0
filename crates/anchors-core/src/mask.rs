//! Payload masking for encrypted channels.
//!
//! Masked payloads are sealed with ChaCha20-Poly1305 under a key derived from
//! the channel identity. Anyone who knows the channel ID can unmask; what
//! masking buys is that the ledger itself only stores ciphertext.
//!
//! Sealed layout: `nonce (12 bytes) || ciphertext+tag`.
//!
//! Private channels use a random channel key instead, distributed through the
//! branch's keyload entry: one sealed copy of the key per authorized party,
//! each under a wrapping key only that party can derive (from the author's
//! seed, or from a preshared key).

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;
use std::fmt;
use std::str::FromStr;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CoreError;
use crate::seed::Seed;
use crate::types::{ChannelAddress, ChannelId};

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// Size of one access slot in a keyload payload.
pub const KEYLOAD_SLOT_LEN: usize = NONCE_LEN + KEY_LEN + TAG_LEN;

/// Length of a preshared key in bytes.
pub const PRESHARED_KEY_LEN: usize = 16;

/// Symmetric key used to mask and unmask payloads on one channel.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ChannelKey([u8; 32]);

impl ChannelKey {
    /// Derive the masking key for a channel.
    pub fn derive(channel: &ChannelId) -> Self {
        let mut hasher = blake3::Hasher::new_derive_key("anchors-v0 channel payload mask");
        hasher.update(channel.address().as_bytes());
        hasher.update(channel.root().as_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    /// A fresh random key for a private channel.
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut key);
        Self(key)
    }

    /// Wrapping key the channel author derives from their seed.
    pub fn for_author(seed: &Seed, address: &ChannelAddress) -> Self {
        let mut hasher = blake3::Hasher::new_derive_key("anchors-v0 keyload author slot");
        hasher.update(address.as_bytes());
        hasher.update(seed.expose().as_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    /// Wrapping key derived from a preshared key.
    pub fn for_preshared(psk: &PresharedKey, address: &ChannelAddress) -> Self {
        let mut hasher = blake3::Hasher::new_derive_key("anchors-v0 keyload preshared slot");
        hasher.update(address.as_bytes());
        hasher.update(&psk.0);
        Self(*hasher.finalize().as_bytes())
    }

    /// Seal a payload under a fresh random nonce.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CoreError> {
        let cipher = ChaCha20Poly1305::new_from_slice(&self.0)
            .map_err(|e| CoreError::Masking(e.to_string()))?;

        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|e| CoreError::Masking(e.to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Open a payload produced by [`seal`](Self::seal).
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, CoreError> {
        if sealed.len() < NONCE_LEN {
            return Err(CoreError::Masking("sealed payload shorter than nonce".into()));
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);

        let cipher = ChaCha20Poly1305::new_from_slice(&self.0)
            .map_err(|e| CoreError::Masking(e.to_string()))?;
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| CoreError::Masking(e.to_string()))
    }

    /// Build a keyload payload granting this key to every holder of `grants`.
    pub fn seal_keyload(&self, grants: &[ChannelKey]) -> Result<Vec<u8>, CoreError> {
        if grants.is_empty() {
            return Err(CoreError::Masking("keyload without access slots".into()));
        }
        let mut payload = Vec::with_capacity(grants.len() * KEYLOAD_SLOT_LEN);
        for wrap in grants {
            payload.extend_from_slice(&wrap.seal(&self.0)?);
        }
        Ok(payload)
    }

    /// Recover the channel key from a keyload payload.
    ///
    /// Returns `None` when none of `candidates` opens any slot.
    pub fn open_keyload(payload: &[u8], candidates: &[ChannelKey]) -> Option<Self> {
        if payload.is_empty() || payload.len() % KEYLOAD_SLOT_LEN != 0 {
            return None;
        }
        payload.chunks_exact(KEYLOAD_SLOT_LEN).find_map(|slot| {
            candidates.iter().find_map(|wrap| {
                let mut key = wrap.open(slot).ok()?;
                let opened = <[u8; KEY_LEN]>::try_from(key.as_slice()).ok().map(Self);
                key.zeroize();
                opened
            })
        })
    }
}

impl fmt::Debug for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ChannelKey([redacted])")
    }
}

/// A key handed to subscribers out of band, granting access to a private channel.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct PresharedKey([u8; PRESHARED_KEY_LEN]);

impl PresharedKey {
    pub const fn from_bytes(bytes: [u8; PRESHARED_KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn generate() -> Self {
        let mut key = [0u8; PRESHARED_KEY_LEN];
        rand::thread_rng().fill_bytes(&mut key);
        Self(key)
    }

    /// Parse 32 hex characters.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let mut key = [0u8; PRESHARED_KEY_LEN];
        hex::decode_to_slice(s, &mut key)
            .map_err(|e| CoreError::identifier("<preshared key>", e.to_string()))?;
        Ok(Self(key))
    }
}

impl FromStr for PresharedKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for PresharedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PresharedKey([redacted])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChannelAddress, EntryId};

    fn channel(byte: u8) -> ChannelId {
        ChannelId::new(
            ChannelAddress::from_bytes([byte; 32]),
            EntryId::from_bytes([byte.wrapping_add(1); 32]),
        )
    }

    #[test]
    fn test_seal_open() {
        let key = ChannelKey::derive(&channel(1));
        let sealed = key.seal(b"secret message").unwrap();
        assert_ne!(&sealed[NONCE_LEN..], b"secret message");
        assert_eq!(key.open(&sealed).unwrap(), b"secret message");
    }

    #[test]
    fn test_other_channel_cannot_open() {
        let sealed = ChannelKey::derive(&channel(1)).seal(b"secret").unwrap();
        assert!(ChannelKey::derive(&channel(7)).open(&sealed).is_err());
    }

    #[test]
    fn test_tampered_ciphertext_rejected() {
        let key = ChannelKey::derive(&channel(1));
        let mut sealed = key.seal(b"secret").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0xff;
        assert!(key.open(&sealed).is_err());
        assert!(key.open(&[0u8; 4]).is_err());
    }

    #[test]
    fn test_keyload_opens_for_each_grant() {
        let address = ChannelAddress::from_bytes([5; 32]);
        let seed = Seed::new("author seed");
        let psk = PresharedKey::from_hex("11aa11aa11aa11aa11aa11aa11aa11aa").unwrap();
        let channel_key = ChannelKey::generate();

        let payload = channel_key
            .seal_keyload(&[
                ChannelKey::for_author(&seed, &address),
                ChannelKey::for_preshared(&psk, &address),
            ])
            .unwrap();
        assert_eq!(payload.len(), 2 * KEYLOAD_SLOT_LEN);

        let sealed = channel_key.seal(b"private").unwrap();
        for wrap in [
            ChannelKey::for_author(&seed, &address),
            ChannelKey::for_preshared(&psk, &address),
        ] {
            let opened = ChannelKey::open_keyload(&payload, &[wrap]).unwrap();
            assert_eq!(opened.open(&sealed).unwrap(), b"private");
        }
    }

    #[test]
    fn test_keyload_rejects_outsiders() {
        let address = ChannelAddress::from_bytes([5; 32]);
        let psk = PresharedKey::from_hex("11aa11aa11aa11aa11aa11aa11aa11aa").unwrap();
        let payload = ChannelKey::generate()
            .seal_keyload(&[ChannelKey::for_preshared(&psk, &address)])
            .unwrap();

        let other_psk = PresharedKey::from_hex("21aa11aa11aa11aa11aa11aa11aa11aa").unwrap();
        let outsiders = [
            ChannelKey::for_author(&Seed::new("someone else"), &address),
            ChannelKey::for_preshared(&other_psk, &address),
            // Right key, wrong branch.
            ChannelKey::for_preshared(&psk, &ChannelAddress::from_bytes([6; 32])),
        ];
        assert!(ChannelKey::open_keyload(&payload, &outsiders).is_none());
        assert!(ChannelKey::open_keyload(&payload[1..], &outsiders[..0]).is_none());
        assert!(ChannelKey::seal_keyload(&ChannelKey::generate(), &[]).is_err());
    }

    #[test]
    fn test_preshared_key_parsing() {
        assert!(PresharedKey::from_hex("11aa").is_err());
        assert!(PresharedKey::from_hex("zz".repeat(16).as_str()).is_err());
        let psk: PresharedKey = "00".repeat(16).parse().unwrap();
        assert_eq!(psk, PresharedKey::from_bytes([0; 16]));
        assert!(!format!("{psk:?}").contains("00"));
    }
}

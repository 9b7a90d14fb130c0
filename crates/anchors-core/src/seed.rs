//! Session seeds.
//!
//! A seed is the secret a channel session derives its publishing key from.
//! Whoever holds the seed can publish as that session, so it is redacted from
//! debug output and wiped on drop.

use rand::distributions::{Distribution, Uniform};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::Keypair;

/// Default number of characters in a generated seed.
pub const DEFAULT_SEED_LENGTH: usize = 80;

const KEY_CONTEXT: &str = "anchors-seed-v0 ed25519 publishing key";

/// Secret session material.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Seed(String);

impl Seed {
    /// Wrap caller-provided seed material.
    pub fn new(material: impl Into<String>) -> Self {
        Self(material.into())
    }

    /// Generate a random seed of [`DEFAULT_SEED_LENGTH`] lowercase letters.
    pub fn generate() -> Self {
        Self::generate_with_length(DEFAULT_SEED_LENGTH)
    }

    /// Generate a random seed of `len` characters drawn uniformly from `a..=z`.
    pub fn generate_with_length(len: usize) -> Self {
        let letters = Uniform::new_inclusive(b'a', b'z');
        let mut rng = rand::thread_rng();
        let seed: String = (0..len)
            .map(|_| char::from(letters.sample(&mut rng)))
            .collect();
        Self(seed)
    }

    /// The raw seed string.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Deterministically derive the session's publishing keypair.
    pub fn keypair(&self) -> Keypair {
        let secret = blake3::derive_key(KEY_CONTEXT, self.0.as_bytes());
        Keypair::from_seed(&secret)
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seed(<{} chars redacted>)", self.0.len())
    }
}

//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use anchors::ledger::{LedgerLogClient, MemoryLedger};
use anchors::{AnchoringChannel, ChannelConfig, ChannelId, LedgerContext, Result, Seed};
use anchors_core::{ChannelAddress, Entry, EntryBuilder, EntryId, EntryKind, Keypair, PresharedKey};

use crate::faults::{FaultyLedger, Faults};

/// Endpoint used by every fixture.
pub const TEST_NODE: &str = "http://localhost:14265";

/// Install a test-friendly tracing subscriber. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Preshared key every session of a [`TestFixture::private`] fixture holds.
pub const TEST_PSK: &str = "11aa11aa11aa11aa11aa11aa11aa11aa";

/// A shared ledger plus a context for opening sessions on it.
pub struct TestFixture<L = MemoryLedger> {
    pub context: LedgerContext<L>,
    /// Handed to every session opened by the fixture.
    pub preshared_keys: Vec<PresharedKey>,
}

impl TestFixture<MemoryLedger> {
    /// An in-memory ledger with the default channel configuration.
    pub fn new() -> Self {
        Self::with_config(ChannelConfig::default())
    }

    pub fn with_config(config: ChannelConfig) -> Self {
        init_tracing();
        Self {
            context: LedgerContext::initialize(MemoryLedger::new()).with_config(config),
            preshared_keys: Vec::new(),
        }
    }

    /// A fixture whose channels mask their payloads.
    pub fn encrypted() -> Self {
        Self::with_config(ChannelConfig {
            encrypted: true,
            ..ChannelConfig::default()
        })
    }

    /// A fixture whose channels are private and masked. Every session holds
    /// [`TEST_PSK`], so sessions from this fixture can bind to each other's
    /// channels.
    pub fn private() -> Self {
        let mut fixture = Self::with_config(ChannelConfig {
            encrypted: true,
            private: true,
            ..ChannelConfig::default()
        });
        fixture.preshared_keys = TEST_PSK.parse::<PresharedKey>().into_iter().collect();
        fixture
    }
}

impl TestFixture<FaultyLedger<MemoryLedger>> {
    /// An in-memory ledger behind a fault switchboard.
    pub fn faulty() -> (Self, Arc<Faults>) {
        init_tracing();
        let ledger = FaultyLedger::new(MemoryLedger::new());
        let faults = ledger.faults();
        let fixture = Self {
            context: LedgerContext::initialize(ledger),
            preshared_keys: Vec::new(),
        };
        (fixture, faults)
    }
}

impl<L: LedgerLogClient> TestFixture<L> {
    pub fn ledger(&self) -> &Arc<L> {
        self.context.client()
    }

    /// An unbound session with a fresh seed.
    pub fn session(&self) -> Result<AnchoringChannel<L>> {
        self.open(None)
    }

    /// An unbound session with the given seed.
    pub fn session_with_seed(&self, seed: Seed) -> Result<AnchoringChannel<L>> {
        self.open(Some(seed))
    }

    fn open(&self, seed: Option<Seed>) -> Result<AnchoringChannel<L>> {
        let channel = AnchoringChannel::create(&self.context, TEST_NODE, seed)?;
        Ok(channel.with_preshared_keys(self.preshared_keys.iter().cloned()))
    }

    /// A session bound to a new channel.
    pub async fn new_channel(&self) -> Result<AnchoringChannel<L>> {
        let mut channel = self.session()?;
        channel.bind(None).await?;
        Ok(channel)
    }

    /// A session attached to an existing channel.
    pub async fn attach(&self, channel_id: &ChannelId) -> Result<AnchoringChannel<L>> {
        let mut session = self.session()?;
        session.bind(Some(&channel_id.to_string())).await?;
        Ok(session)
    }

    /// `count` independent sessions attached to one channel.
    pub async fn readers(&self, channel_id: &ChannelId, count: usize) -> Result<Vec<AnchoringChannel<L>>> {
        let mut readers = Vec::with_capacity(count);
        for _ in 0..count {
            readers.push(self.attach(channel_id).await?);
        }
        Ok(readers)
    }

    /// Anchor `messages` on `channel`, each at the previous one's entry.
    ///
    /// Returns the entry ids in order, starting after the first anchorage.
    pub async fn anchor_chain(&self, channel: &mut AnchoringChannel<L>, messages: &[&[u8]]) -> Result<Vec<String>> {
        let mut anchorage = channel
            .first_anchorage_id()
            .ok_or(anchors::AnchoringError::NotBound)?
            .to_hex();
        let mut ids = Vec::with_capacity(messages.len());
        for message in messages {
            anchorage = channel.anchor(message, &anchorage).await?.entry_id;
            ids.push(anchorage.clone());
        }
        Ok(ids)
    }
}

impl Default for TestFixture<MemoryLedger> {
    fn default() -> Self {
        Self::new()
    }
}

/// Deterministic seeds for multi-party tests.
pub fn party_seeds(count: usize) -> Vec<Seed> {
    (0..count)
        .map(|i| Seed::new(format!("{:a<80}", format!("party{i}"))))
        .collect()
}

/// A signed entry on `address` linking to `link`, for crafting ledger state
/// by hand.
pub fn signed_entry(keypair: &Keypair, address: ChannelAddress, link: EntryId, payload: &[u8]) -> Entry {
    EntryBuilder::new(keypair.public_key(), address)
        .timestamp(anchors_core::now_millis())
        .kind(EntryKind::Signed)
        .link(link)
        .payload(payload.to_vec())
        .sign(keypair)
}

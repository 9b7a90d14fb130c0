//! The anchoring channel: creation and binding.
//!
//! A channel starts unbound. Binding either creates a new branch on the ledger
//! (publishing its announce entry) or attaches to an existing branch by
//! channel id. Binding happens at most once per channel value; a second
//! session on the same branch is a second `AnchoringChannel`.
//!
//! Private channels also publish a keyload entry right after the announce.
//! Only sessions that can open one of its access slots, with the author's
//! seed or a preshared key, can bind to them.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use anchors_core::{
    now_millis, validate_entry, ChannelAddress, ChannelId, ChannelKey, Ed25519PublicKey, Endpoint,
    EntryBuilder, EntryId, EntryKind, Keypair, PresharedKey, Seed,
};
use anchors_ledger::{LedgerLogClient, LogRecord};

use crate::config::{ChannelConfig, LedgerContext};
use crate::cursor::SessionCursor;
use crate::error::{AnchoringError, Result};
use crate::resolver::Anchorage;

/// State of a bound channel.
pub(crate) struct Session {
    pub(crate) channel_id: ChannelId,
    pub(crate) first_anchorage: Anchorage,
    pub(crate) keypair: Keypair,
    pub(crate) key: ChannelKey,
    pub(crate) cursor: SessionCursor,
}

impl Session {
    /// Start a session at the branch root, or at the keyload of a private branch.
    fn new(root: &LogRecord, keyload: Option<(LogRecord, ChannelKey)>, keypair: Keypair, verify: bool) -> Self {
        let address = *root.entry.address();
        let mut cursor = SessionCursor::at_root(root, verify);

        let (channel_id, first_anchorage, key) = match keyload {
            Some((record, key)) => {
                cursor.learn(record.id);
                (
                    ChannelId::private(address, root.id, record.id),
                    Anchorage {
                        id: record.id,
                        position: record.position,
                    },
                    key,
                )
            }
            None => {
                let channel_id = ChannelId::new(address, root.id);
                (
                    channel_id,
                    Anchorage {
                        id: root.id,
                        position: root.position,
                    },
                    ChannelKey::derive(&channel_id),
                )
            }
        };

        Self {
            channel_id,
            first_anchorage,
            keypair,
            key,
            cursor,
        }
    }
}

/// Snapshot of a bound channel's public details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelDetails {
    pub channel_id: ChannelId,
    pub channel_address: ChannelAddress,
    pub first_anchorage_id: EntryId,
    pub publisher_key: Ed25519PublicKey,
    pub endpoint: Endpoint,
    pub encrypted: bool,
    pub private: bool,
}

/// A session on one channel branch.
///
/// All operations take `&mut self`: a session has a single forward-only read
/// cursor, so calls on one channel are strictly sequential. Independent
/// channels (even on the same branch) can run concurrently.
pub struct AnchoringChannel<L> {
    pub(crate) client: Arc<L>,
    pub(crate) config: ChannelConfig,
    pub(crate) endpoint: Endpoint,
    seed: Seed,
    preshared_keys: Vec<PresharedKey>,
    pub(crate) session: Option<Session>,
}

impl<L: LedgerLogClient> AnchoringChannel<L> {
    /// Create an unbound channel talking to `endpoint`.
    ///
    /// Only validates the endpoint; nothing is sent to the ledger. A fresh
    /// seed is generated when none is given.
    pub fn create(context: &LedgerContext<L>, endpoint: &str, seed: Option<Seed>) -> Result<Self> {
        let endpoint = Endpoint::parse(endpoint).map_err(AnchoringError::InvalidNode)?;
        Ok(Self {
            client: Arc::clone(context.client()),
            config: context.config().clone(),
            endpoint,
            seed: seed.unwrap_or_else(Seed::generate),
            preshared_keys: Vec::new(),
            session: None,
        })
    }

    /// Preshared keys used when binding a private channel.
    ///
    /// A new private channel grants access to each of them; binding to an
    /// existing one tries each of them after the session's own seed.
    pub fn with_preshared_keys(mut self, keys: impl IntoIterator<Item = PresharedKey>) -> Self {
        self.preshared_keys.extend(keys);
        self
    }

    /// Create a channel with a fresh seed and bind it to a new branch.
    pub async fn bind_new(context: &LedgerContext<L>, endpoint: &str) -> Result<Self> {
        let mut channel = Self::create(context, endpoint, None)?;
        channel.bind(None).await?;
        Ok(channel)
    }

    /// Bind to an existing channel, or to a new branch when `channel_id` is `None`.
    ///
    /// Returns the bound channel id. Fails with `AlreadyBound` on a second call.
    pub async fn bind(&mut self, channel_id: Option<&str>) -> Result<ChannelId> {
        if let Some(session) = &self.session {
            return Err(AnchoringError::AlreadyBound(session.channel_id));
        }
        if !self.config.private && !self.preshared_keys.is_empty() {
            return Err(AnchoringError::binding(
                channel_id.unwrap_or("<new channel>"),
                "preshared keys require a private channel",
            ));
        }

        let session = match channel_id {
            None => self.open_branch().await?,
            Some(id) => self.attach(id).await?,
        };
        let id = session.channel_id;
        self.session = Some(session);
        Ok(id)
    }

    async fn open_branch(&self) -> Result<Session> {
        let keypair = self.seed.keypair();
        let nonce: [u8; 32] = rand::random();
        let root = EntryBuilder::announce(keypair.public_key(), nonce.to_vec())
            .timestamp(now_millis())
            .sign(&keypair);

        let record = self.client.create_branch(&self.endpoint, &root).await?;
        let keyload = if self.config.private {
            Some(self.publish_keyload(&record, &keypair).await?)
        } else {
            None
        };

        let session = Session::new(&record, keyload, keypair, self.config.verify_entries);
        info!(
            channel = %session.channel_id,
            node = %self.endpoint,
            private = self.config.private,
            "bound to new channel"
        );
        Ok(session)
    }

    /// Wrapping keys this session can open keyload slots with.
    fn access_keys(&self, address: &ChannelAddress) -> Vec<ChannelKey> {
        std::iter::once(ChannelKey::for_author(&self.seed, address))
            .chain(self.preshared_keys.iter().map(|psk| ChannelKey::for_preshared(psk, address)))
            .collect()
    }

    async fn publish_keyload(&self, root: &LogRecord, keypair: &Keypair) -> Result<(LogRecord, ChannelKey)> {
        let address = *root.entry.address();
        let key = ChannelKey::generate();
        let entry = EntryBuilder::new(keypair.public_key(), address)
            .timestamp(now_millis())
            .kind(EntryKind::Keyload)
            .link(root.id)
            .payload(key.seal_keyload(&self.access_keys(&address))?)
            .sign(keypair);

        let published = self.client.publish(&self.endpoint, &entry).await?;
        debug!(keyload = %published.id(), grants = self.preshared_keys.len() + 1, "published keyload");
        let record = LogRecord {
            position: published.position(),
            id: published.id(),
            entry,
        };
        Ok((record, key))
    }

    async fn attach(&self, raw: &str) -> Result<Session> {
        let channel_id = ChannelId::parse(raw).map_err(|e| AnchoringError::binding(raw, e))?;
        match (channel_id.is_private(), self.config.private) {
            (true, false) => return Err(AnchoringError::binding(raw, "channel is private")),
            (false, true) => return Err(AnchoringError::binding(raw, "channel is not private")),
            _ => {}
        }

        let root = self
            .client
            .subscribe(&self.endpoint, channel_id.address())
            .await
            .map_err(|e| AnchoringError::binding(raw, e))?
            .ok_or_else(|| AnchoringError::binding(raw, "channel not found on the ledger"))?;

        if root.id != *channel_id.root() || !root.entry.is_announce() {
            return Err(AnchoringError::binding(raw, format!("branch root is {}", root.id)));
        }
        if self.config.verify_entries {
            validate_entry(&root.entry).map_err(|e| AnchoringError::binding(raw, e))?;
        }

        let keyload = match channel_id.keyload() {
            Some(keyload_id) => Some(self.open_keyload(raw, &root, keyload_id).await?),
            None => None,
        };

        let session = Session::new(&root, keyload, self.seed.keypair(), self.config.verify_entries);
        debug!(channel = %channel_id, node = %self.endpoint, "bound to existing channel");
        Ok(session)
    }

    async fn open_keyload(&self, raw: &str, root: &LogRecord, keyload_id: &EntryId) -> Result<(LogRecord, ChannelKey)> {
        let address = *root.entry.address();
        let record = self
            .client
            .read_by_id(&self.endpoint, &address, keyload_id)
            .await
            .map_err(|e| AnchoringError::binding(raw, e))?
            .ok_or_else(|| AnchoringError::binding(raw, "keyload not found on the ledger"))?;

        let issued_by_author = record.entry.publisher() == root.entry.publisher();
        if record.id != *keyload_id
            || !record.entry.is_keyload()
            || record.entry.link() != Some(&root.id)
            || !issued_by_author
        {
            return Err(AnchoringError::binding(raw, format!("{} is not the channel keyload", record.id)));
        }
        if self.config.verify_entries {
            validate_entry(&record.entry).map_err(|e| AnchoringError::binding(raw, e))?;
        }

        let key = ChannelKey::open_keyload(&record.entry.payload, &self.access_keys(&address))
            .ok_or_else(|| AnchoringError::binding(raw, "session holds no access to the channel"))?;
        Ok((record, key))
    }
}

impl<L> AnchoringChannel<L> {
    pub(crate) fn bound(&mut self) -> Result<&mut Session> {
        self.session.as_mut().ok_or(AnchoringError::NotBound)
    }

    pub fn is_bound(&self) -> bool {
        self.session.is_some()
    }

    pub fn channel_id(&self) -> Option<ChannelId> {
        self.session.as_ref().map(|s| s.channel_id)
    }

    pub fn channel_address(&self) -> Option<ChannelAddress> {
        self.session.as_ref().map(|s| *s.channel_id.address())
    }

    /// The default anchorage: the branch root, or the keyload entry of a
    /// private channel. `None` until bound.
    pub fn first_anchorage_id(&self) -> Option<EntryId> {
        self.session.as_ref().map(|s| s.first_anchorage.id)
    }

    /// Key entries are published under. Derived from the seed, so known before binding.
    pub fn publisher_key(&self) -> Ed25519PublicKey {
        self.seed.keypair().public_key()
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn seed(&self) -> &Seed {
        &self.seed
    }

    pub fn is_encrypted(&self) -> bool {
        self.config.encrypted
    }

    pub fn is_private(&self) -> bool {
        self.config.private
    }

    /// Position of the last entry consumed by this session's cursor.
    pub fn cursor_position(&self) -> Option<u64> {
        self.session.as_ref().map(|s| s.cursor.position())
    }

    pub fn details(&self) -> Option<ChannelDetails> {
        let session = self.session.as_ref()?;
        Some(ChannelDetails {
            channel_id: session.channel_id,
            channel_address: *session.channel_id.address(),
            first_anchorage_id: session.first_anchorage.id,
            publisher_key: session.keypair.public_key(),
            endpoint: self.endpoint.clone(),
            encrypted: self.config.encrypted,
            private: self.config.private,
        })
    }
}

impl<L> fmt::Debug for AnchoringChannel<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnchoringChannel")
            .field("endpoint", &self.endpoint)
            .field("channel_id", &self.channel_id())
            .field("encrypted", &self.config.encrypted)
            .field("private", &self.config.private)
            .finish_non_exhaustive()
    }
}

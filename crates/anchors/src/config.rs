//! Ledger context and channel configuration.

use std::sync::Arc;

use anchors_ledger::LedgerLogClient;

/// Configuration applied to every channel created from a context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Publish payloads sealed under the channel key instead of in the clear.
    ///
    /// Only affects publishing; masked entries are always unmasked on read.
    pub encrypted: bool,
    /// Restrict the channel to sessions granted access by its keyload entry.
    ///
    /// New private channels grant the author's seed and every preshared key
    /// given to the session. Binding to an existing channel requires the
    /// channel id form to match this flag.
    pub private: bool,
    /// Check signature and structure of every entry read from the ledger.
    pub verify_entries: bool,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            encrypted: false,
            private: false,
            verify_entries: true,
        }
    }
}

/// Handle to an initialized ledger client plus the configuration channels use.
///
/// Cheap to clone: all clones share one client. Channels created from the same
/// context see each other's entries but keep independent cursors.
pub struct LedgerContext<L> {
    client: Arc<L>,
    config: ChannelConfig,
}

impl<L: LedgerLogClient> LedgerContext<L> {
    /// Initialize a context around a ledger client.
    pub fn initialize(client: L) -> Self {
        Self::from_shared(Arc::new(client))
    }

    /// Initialize a context around an already shared client.
    ///
    /// Initializing twice from the same `Arc` yields equivalent contexts.
    pub fn from_shared(client: Arc<L>) -> Self {
        Self {
            client,
            config: ChannelConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ChannelConfig) -> Self {
        self.config = config;
        self
    }

    pub fn client(&self) -> &Arc<L> {
        &self.client
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }
}

impl<L> Clone for LedgerContext<L> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            config: self.config.clone(),
        }
    }
}

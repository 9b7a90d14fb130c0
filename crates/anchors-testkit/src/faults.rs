//! Fault injection for ledger clients.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use anchors_core::{ChannelAddress, Endpoint, Entry, EntryId};
use anchors_ledger::{LedgerError, LedgerLogClient, LogRecord, PublishResult, Result};

/// Switches for the operations a [`FaultyLedger`] should fail.
#[derive(Debug, Default)]
pub struct Faults {
    create_branch: AtomicBool,
    subscribe: AtomicBool,
    publish: AtomicBool,
    reads: AtomicBool,
}

impl Faults {
    pub fn fail_create_branch(&self, on: bool) {
        self.create_branch.store(on, Ordering::SeqCst);
    }

    pub fn fail_subscribe(&self, on: bool) {
        self.subscribe.store(on, Ordering::SeqCst);
    }

    pub fn fail_publish(&self, on: bool) {
        self.publish.store(on, Ordering::SeqCst);
    }

    /// Fail both `read_next` and `read_by_id`.
    pub fn fail_reads(&self, on: bool) {
        self.reads.store(on, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        for flag in [&self.create_branch, &self.subscribe, &self.publish, &self.reads] {
            flag.store(false, Ordering::SeqCst);
        }
    }
}

fn check(flag: &AtomicBool, node: &Endpoint, operation: &str) -> Result<()> {
    if flag.load(Ordering::SeqCst) {
        debug!(%node, operation, "injected fault");
        return Err(LedgerError::Unavailable {
            node: node.to_string(),
            reason: format!("injected {operation} fault"),
        });
    }
    Ok(())
}

/// Wraps a ledger and fails selected operations as if the node were down.
pub struct FaultyLedger<L> {
    inner: L,
    faults: Arc<Faults>,
}

impl<L: LedgerLogClient> FaultyLedger<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            faults: Arc::new(Faults::default()),
        }
    }

    /// Handle for flipping faults after the ledger has been shared.
    pub fn faults(&self) -> Arc<Faults> {
        self.faults.clone()
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }
}

#[async_trait]
impl<L: LedgerLogClient> LedgerLogClient for FaultyLedger<L> {
    async fn create_branch(&self, node: &Endpoint, root: &Entry) -> Result<LogRecord> {
        check(&self.faults.create_branch, node, "create_branch")?;
        self.inner.create_branch(node, root).await
    }

    async fn subscribe(&self, node: &Endpoint, address: &ChannelAddress) -> Result<Option<LogRecord>> {
        check(&self.faults.subscribe, node, "subscribe")?;
        self.inner.subscribe(node, address).await
    }

    async fn publish(&self, node: &Endpoint, entry: &Entry) -> Result<PublishResult> {
        check(&self.faults.publish, node, "publish")?;
        self.inner.publish(node, entry).await
    }

    async fn read_next(&self, node: &Endpoint, address: &ChannelAddress, after: u64) -> Result<Option<LogRecord>> {
        check(&self.faults.reads, node, "read_next")?;
        self.inner.read_next(node, address, after).await
    }

    async fn read_by_id(&self, node: &Endpoint, address: &ChannelAddress, id: &EntryId) -> Result<Option<LogRecord>> {
        check(&self.faults.reads, node, "read_by_id")?;
        self.inner.read_by_id(node, address, id).await
    }
}

//! # Anchors
//!
//! Anchoring channels: attach messages to positions inside an append-only,
//! authenticated ledger log, and read them back.
//!
//! ## Overview
//!
//! A channel is one branch of the ledger. Its identity is
//! `"<address>:<root entry id>"`, and its root entry is the first anchorage.
//! Every message anchored on the channel becomes an entry that links to an
//! earlier entry, and its id can in turn be used as an anchorage. Chaining
//! anchors this way produces a replayable sequence of references.
//!
//! The ledger offers no random access, so each session keeps a forward-only
//! cursor and locates anchorages by direct read when it can, and by scanning
//! otherwise.
//!
//! ## Key Types
//!
//! - [`LedgerContext`] - An initialized ledger client plus [`ChannelConfig`]
//! - [`AnchoringChannel`] - One session on one channel
//! - [`AnchoringResult`] / [`FetchResult`] - Results of anchoring and reading
//! - [`AnchoringError`] / [`ErrorKind`] - Failures, by kind
//!
//! ## Usage
//!
//! ```rust,no_run
//! use anchors::{AnchoringChannel, LedgerContext};
//! use anchors::ledger::MemoryLedger;
//!
//! async fn example() -> anchors::Result<()> {
//!     let context = LedgerContext::initialize(MemoryLedger::new());
//!
//!     let mut channel = AnchoringChannel::create(&context, "http://localhost:14265", None)?;
//!     let channel_id = channel.bind(None).await?;
//!     let first = channel_id.root().to_hex();
//!
//!     let r1 = channel.anchor(b"Hello", &first).await?;
//!     let r2 = channel.anchor(b"World", &r1.entry_id).await?;
//!     assert_eq!(r2.anchorage_id, r1.entry_id);
//!
//!     // Another session on the same channel.
//!     let mut reader = AnchoringChannel::create(&context, "http://localhost:14265", None)?;
//!     reader.bind(Some(&channel_id.to_string())).await?;
//!     let msg = reader.fetch(&first, Some(&r1.entry_id)).await?;
//!     assert_eq!(msg.content, b"Hello");
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `anchors::core` - Entries, identifiers, seeds
//! - `anchors::ledger` - The ledger trait and its implementations

mod anchor;
pub mod channel;
pub mod config;
pub mod cursor;
pub mod error;
mod fetch;
pub mod resolver;

pub use anchors_core as core;
pub use anchors_ledger as ledger;

pub use anchor::AnchoringResult;
pub use channel::{AnchoringChannel, ChannelDetails};
pub use config::{ChannelConfig, LedgerContext};
pub use cursor::SessionCursor;
pub use error::{AnchoringError, ErrorKind, Result};
pub use fetch::FetchResult;
pub use resolver::Anchorage;

pub use anchors_core::{ChannelAddress, ChannelId, Ed25519PublicKey, Endpoint, EntryId, Seed};

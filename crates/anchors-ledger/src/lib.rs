//! # Anchors Ledger
//!
//! The ledger log interface consumed by anchoring channels, plus two
//! implementations of it.
//!
//! ## Overview
//!
//! A ledger holds branches. Each branch starts with an announce entry and grows
//! by appending entries that link to something already on it. The ledger
//! assigns every accepted entry a branch-local position (root = 1) and offers
//! exactly two ways to read: "the entry after position N" and "the entry with
//! this id". There is no index from anchorage to children.
//!
//! ## Key Types
//!
//! - [`LedgerLogClient`] - The async trait every ledger implements
//! - [`MemoryLedger`] - In-process ledger, shared between sessions via `Arc`
//! - [`SqliteLedger`] - Persistent ledger on SQLite
//! - [`LogRecord`] - An entry together with its id and position
//! - [`PublishResult`] - Result of publishing an entry
//!
//! ## Usage
//!
//! ```rust,no_run
//! use anchors_core::{Endpoint, EntryBuilder, Keypair};
//! use anchors_ledger::{LedgerLogClient, SqliteLedger};
//!
//! async fn example() -> anchors_ledger::Result<()> {
//!     let ledger = SqliteLedger::open("ledger.db")?;
//!     let node = Endpoint::parse("http://localhost:14265").unwrap();
//!
//!     let keypair = Keypair::generate();
//!     let root = EntryBuilder::announce(keypair.public_key(), b"nonce".to_vec()).sign(&keypair);
//!     let record = ledger.create_branch(&node, &root).await?;
//!     assert_eq!(record.position, 1);
//!     Ok(())
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Idempotent publish**: publishing the same entry twice returns `AlreadyExists`
//! - **Linked publish only**: an entry whose anchorage is not on the branch is rejected
//! - **Siblings allowed**: any number of entries may link to the same anchorage
//! - **Node argument**: every call names the node it is addressed to; local
//!   ledgers only use it for tracing

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{LedgerError, Result};
pub use memory::MemoryLedger;
pub use sqlite::SqliteLedger;
pub use traits::{LedgerLogClient, LogRecord, PublishResult};

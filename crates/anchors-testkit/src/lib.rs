//! # Anchors Testkit
//!
//! Testing utilities for anchoring channels.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: A shared in-memory ledger and helpers for opening sessions on it
//! - **Faults**: A ledger wrapper that fails selected operations on demand
//! - **Generators**: Proptest strategies for messages, documents, seeds and endpoints
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use anchors_testkit::TestFixture;
//!
//! async fn example() -> anchors::Result<()> {
//!     let fixture = TestFixture::new();
//!     let mut channel = fixture.new_channel().await?;
//!     let ids = fixture.anchor_chain(&mut channel, &[b"Hello", b"World"]).await?;
//!
//!     let mut reader = fixture.attach(&channel.channel_id().unwrap()).await?;
//!     let msg = reader.fetch(&ids[0], Some(&ids[1])).await?;
//!     assert_eq!(msg.content, b"World");
//!     Ok(())
//! }
//! ```
//!
//! ## Fault Injection
//!
//! ```rust,no_run
//! use anchors_testkit::TestFixture;
//!
//! async fn example() {
//!     let (fixture, faults) = TestFixture::faulty();
//!     faults.fail_subscribe(true);
//!     let mut session = fixture.session().unwrap();
//!     assert!(session.bind(Some("00:00")).await.is_err());
//! }
//! ```

pub mod faults;
pub mod fixtures;
pub mod generators;

pub use faults::{FaultyLedger, Faults};
pub use fixtures::{init_tracing, party_seeds, signed_entry, TestFixture, TEST_NODE, TEST_PSK};

//! Entries written to a channel by publishers other than the session.

use anchors::ledger::LedgerLogClient;
use anchors::ErrorKind;
use anchors_core::{Endpoint, Keypair};
use anchors_testkit::{party_seeds, signed_entry, TestFixture, TEST_NODE};

#[tokio::test]
async fn foreign_entries_report_their_publisher() -> anyhow::Result<()> {
    let fixture = TestFixture::new();
    let channel = fixture.new_channel().await?;
    let channel_id = channel.channel_id().unwrap();

    let outsider = Keypair::generate();
    let entry = signed_entry(&outsider, *channel_id.address(), *channel_id.root(), b"from outside");
    let node = Endpoint::parse(TEST_NODE)?;
    let published = fixture.ledger().publish(&node, &entry).await?;

    let mut reader = fixture.attach(&channel_id).await?;
    let msg = reader
        .fetch(&channel_id.root().to_hex(), Some(&published.id().to_hex()))
        .await?;
    assert_eq!(msg.content, b"from outside");
    assert_eq!(msg.publisher_key, outsider.public_key());
    assert_ne!(msg.publisher_key, channel.publisher_key());
    Ok(())
}

#[tokio::test]
async fn sessions_with_party_seeds_share_one_channel() -> anyhow::Result<()> {
    let fixture = TestFixture::new();
    let mut seeds = party_seeds(2).into_iter();
    let (alice_seed, bob_seed) = (seeds.next().unwrap(), seeds.next().unwrap());

    let mut alice = fixture.session_with_seed(alice_seed)?;
    let channel_id = alice.bind(None).await?;
    let mut bob = fixture.session_with_seed(bob_seed)?;
    bob.bind(Some(&channel_id.to_string())).await?;

    let first = channel_id.root().to_hex();
    let a1 = alice.anchor(b"from alice", &first).await?;
    let b1 = bob.anchor(b"from bob", &a1.entry_id).await?;

    let mut reader = fixture.attach(&channel_id).await?;
    let read_a = reader.fetch(&first, Some(&a1.entry_id)).await?;
    let read_b = reader.fetch(&a1.entry_id, Some(&b1.entry_id)).await?;
    assert_eq!(read_a.publisher_key, alice.publisher_key());
    assert_eq!(read_b.publisher_key, bob.publisher_key());
    Ok(())
}

#[tokio::test]
async fn entries_for_other_branches_are_rejected() -> anyhow::Result<()> {
    let fixture = TestFixture::new();
    let a = fixture.new_channel().await?;
    let b = fixture.new_channel().await?;
    let (a_id, b_id) = (a.channel_id().unwrap(), b.channel_id().unwrap());

    // Linked to channel B's root but addressed to channel A.
    let keypair = Keypair::generate();
    let entry = signed_entry(&keypair, *a_id.address(), *b_id.root(), b"crossed");
    let node = Endpoint::parse(TEST_NODE)?;
    assert!(fixture.ledger().publish(&node, &entry).await.is_err());

    let mut reader = fixture.attach(&a_id).await?;
    let err = reader.receive(&entry.compute_id().to_hex()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MsgNotFound);
    Ok(())
}

//! Channel behaviour when the ledger node fails.

use anchors::ErrorKind;
use anchors_proofs::{Ed25519JcsSigner, ProofError, ProofGenerator, ProofVerifier, SecretKey};
use anchors_testkit::{TestFixture, TEST_NODE};
use serde_json::json;

#[tokio::test]
async fn publish_failure_is_other_error() -> anyhow::Result<()> {
    let (fixture, faults) = TestFixture::faulty();
    let mut channel = fixture.new_channel().await?;
    let first = channel.first_anchorage_id().unwrap().to_hex();

    faults.fail_publish(true);
    let err = channel.anchor(b"Hello", &first).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OtherError);

    faults.clear();
    channel.anchor(b"Hello", &first).await?;
    Ok(())
}

#[tokio::test]
async fn subscribe_failure_is_binding_error() -> anyhow::Result<()> {
    let (fixture, faults) = TestFixture::faulty();
    let owner = fixture.new_channel().await?;
    let channel_id = owner.channel_id().unwrap().to_string();

    faults.fail_subscribe(true);
    let mut reader = fixture.session()?;
    let err = reader.bind(Some(&channel_id)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ChannelBindingError);
    assert!(!reader.is_bound());

    faults.clear();
    reader.bind(Some(&channel_id)).await?;
    Ok(())
}

#[tokio::test]
async fn branch_creation_failure_is_other_error() -> anyhow::Result<()> {
    let (fixture, faults) = TestFixture::faulty();
    faults.fail_create_branch(true);

    let mut channel = fixture.session()?;
    let err = channel.bind(None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OtherError);
    assert!(channel.first_anchorage_id().is_none());
    Ok(())
}

#[tokio::test]
async fn root_anchorage_needs_no_reads() -> anyhow::Result<()> {
    let (fixture, faults) = TestFixture::faulty();
    let mut channel = fixture.new_channel().await?;
    let first = channel.first_anchorage_id().unwrap().to_hex();

    faults.fail_reads(true);
    let r1 = channel.anchor(b"Hello", &first).await?;

    // Resolving past the root has to read.
    let err = channel.anchor(b"World", "ab".repeat(32).as_str()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OtherError);

    faults.clear();
    channel.anchor(b"World", &r1.entry_id).await?;
    Ok(())
}

#[tokio::test]
async fn read_failure_during_fetch_is_other_error() -> anyhow::Result<()> {
    let (fixture, faults) = TestFixture::faulty();
    let mut channel = fixture.new_channel().await?;
    let ids = fixture.anchor_chain(&mut channel, &[b"Hello"]).await?;
    let first = channel.first_anchorage_id().unwrap().to_hex();

    let mut reader = fixture.attach(&channel.channel_id().unwrap()).await?;
    faults.fail_reads(true);
    let err = reader.fetch(&first, Some(&ids[0])).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OtherError);

    faults.clear();
    assert_eq!(reader.fetch(&first, Some(&ids[0])).await?.content, b"Hello");
    Ok(())
}

#[tokio::test]
async fn verifier_treats_unbindable_channel_as_invalid() -> anyhow::Result<()> {
    let (fixture, faults) = TestFixture::faulty();
    let channel = fixture.new_channel().await?;
    let mut generator = ProofGenerator::new(channel, Ed25519JcsSigner::new("did:example:issuer"));
    let secret = SecretKey::generate();
    let doc = json!({"amount": 10});
    let first = generator.channel().first_anchorage_id().unwrap().to_hex();
    let proof = generator.generate(&doc, "key-1", &secret, &first).await?;

    let verifier = ProofVerifier::new(fixture.context.clone(), TEST_NODE)?;

    // Binding fails, so the proof cannot be confirmed.
    faults.fail_subscribe(true);
    assert!(!verifier.verify(&doc, &proof, &secret.public_key()).await?);

    // Reads that fail after binding are still errors.

    faults.clear();
    faults.fail_reads(true);
    match verifier.verify(&doc, &proof, &secret.public_key()).await {
        Err(ProofError::Anchoring(e)) => assert_eq!(e.kind(), ErrorKind::OtherError),
        other => panic!("unexpected result: {other:?}"),
    }

    faults.clear();
    assert!(verifier.verify(&doc, &proof, &secret.public_key()).await?);
    Ok(())
}

#[tokio::test]
async fn chain_stops_at_publish_failure() -> anyhow::Result<()> {
    let (fixture, faults) = TestFixture::faulty();
    let channel = fixture.new_channel().await?;
    let mut generator = ProofGenerator::new(channel, Ed25519JcsSigner::new("did:example:issuer"));
    let first = generator.channel().first_anchorage_id().unwrap().to_hex();

    faults.fail_publish(true);
    let docs = vec![json!({"step": 1}), json!({"step": 2})];
    let err = generator
        .generate_chain(&docs, "key-1", &SecretKey::generate(), &first)
        .await
        .unwrap_err();

    assert_eq!(err.index, 0);
    assert!(err.completed.is_empty());
    match err.source {
        ProofError::Anchoring(e) => assert_eq!(e.kind(), ErrorKind::OtherError),
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

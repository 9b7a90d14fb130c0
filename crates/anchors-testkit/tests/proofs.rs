//! Proof generation and verification against a shared in-memory ledger.

use serde_json::{json, Value};

use anchors::ErrorKind;
use anchors_proofs::{
    Ed25519JcsSigner, LinkedProof, ProofError, ProofGenerator, ProofVerifier, SecretKey, ANCHORED_LINKED_DATA_PROOF_2021,
    DATA_VERIFICATION,
};
use anchors_testkit::{TestFixture, TEST_NODE};

const ISSUER: &str = "did:example:issuer";

async fn generator(fixture: &TestFixture) -> ProofGenerator<anchors::ledger::MemoryLedger, Ed25519JcsSigner> {
    let channel = fixture.new_channel().await.unwrap();
    ProofGenerator::new(channel, Ed25519JcsSigner::new(ISSUER))
}

fn verifier(fixture: &TestFixture) -> ProofVerifier<anchors::ledger::MemoryLedger> {
    ProofVerifier::new(fixture.context.clone(), TEST_NODE).unwrap()
}

fn root(generator: &ProofGenerator<anchors::ledger::MemoryLedger, Ed25519JcsSigner>) -> String {
    generator.channel().first_anchorage_id().unwrap().to_hex()
}

#[tokio::test]
async fn generated_proof_verifies() {
    let fixture = TestFixture::new();
    let mut generator = generator(&fixture).await;
    let secret = SecretKey::generate();
    let doc = json!({"credentialSubject": {"name": "Alice"}, "issuer": ISSUER});

    let first = root(&generator);
    let proof = generator.generate(&doc, "key-1", &secret, &first).await.unwrap();

    assert_eq!(proof.proof_type, ANCHORED_LINKED_DATA_PROOF_2021);
    assert_eq!(proof.proof_purpose, DATA_VERIFICATION);
    assert_eq!(proof.verification_method, ISSUER);
    assert_eq!(proof.proof_value.anchorage_id, first);
    assert_eq!(
        proof.proof_value.channel_id,
        generator.channel().channel_id().unwrap().to_string()
    );

    assert!(verifier(&fixture).verify(&doc, &proof, &secret.public_key()).await.unwrap());
}

#[tokio::test]
async fn tampered_document_does_not_verify() {
    let fixture = TestFixture::new();
    let mut generator = generator(&fixture).await;
    let secret = SecretKey::generate();
    let first = root(&generator);

    let proof = generator.generate(&json!({"amount": 10}), "key-1", &secret, &first).await.unwrap();
    let valid = verifier(&fixture)
        .verify(&json!({"amount": 1000}), &proof, &secret.public_key())
        .await
        .unwrap();
    assert!(!valid);
}

#[tokio::test]
async fn wrong_key_does_not_verify() {
    let fixture = TestFixture::new();
    let mut generator = generator(&fixture).await;
    let doc = json!({"amount": 10});
    let first = root(&generator);

    let proof = generator.generate(&doc, "key-1", &SecretKey::generate(), &first).await.unwrap();
    let valid = verifier(&fixture)
        .verify(&doc, &proof, &SecretKey::generate().public_key())
        .await
        .unwrap();
    assert!(!valid);
}

#[tokio::test]
async fn proof_pointing_elsewhere_does_not_verify() {
    let fixture = TestFixture::new();
    let mut generator = generator(&fixture).await;
    let secret = SecretKey::generate();
    let doc = json!({"amount": 10});
    let first = root(&generator);

    let proof = generator.generate(&doc, "key-1", &secret, &first).await.unwrap();
    let other = generator.generate(&json!({"other": true}), "key-1", &secret, &first).await.unwrap();
    let verifier = verifier(&fixture);

    // A sibling entry anchored at the same place holds a different signature.
    let mut swapped = proof.clone();
    swapped.proof_value.entry_id = other.proof_value.entry_id.clone();
    assert!(!verifier.verify(&doc, &swapped, &secret.public_key()).await.unwrap());

    // The entry exists but is not anchored where the proof says.
    let mut moved = proof.clone();
    moved.proof_value.anchorage_id = other.proof_value.entry_id.clone();
    assert!(!verifier.verify(&doc, &moved, &secret.public_key()).await.unwrap());

    // No such entry.
    let mut missing = proof.clone();
    missing.proof_value.entry_id = "ab".repeat(32);
    assert!(!verifier.verify(&doc, &missing, &secret.public_key()).await.unwrap());

    let mut retyped = proof;
    retyped.proof_type = "SomethingElse".into();
    assert!(!verifier.verify(&doc, &retyped, &secret.public_key()).await.unwrap());
}

#[tokio::test]
async fn plain_message_is_not_a_signature() {
    let fixture = TestFixture::new();
    let mut generator = generator(&fixture).await;
    let secret = SecretKey::generate();
    let doc = json!({"amount": 10});
    let first = root(&generator);

    let proof = generator.generate(&doc, "key-1", &secret, &first).await.unwrap();

    let mut channel = generator.into_channel();
    let plain = channel.anchor(b"not json", &first).await.unwrap();

    let mut forged = proof;
    forged.proof_value.entry_id = plain.entry_id;
    assert!(!verifier(&fixture).verify(&doc, &forged, &secret.public_key()).await.unwrap());
}

#[tokio::test]
async fn unknown_channel_does_not_verify() {
    let fixture = TestFixture::new();
    let mut generator = generator(&fixture).await;
    let secret = SecretKey::generate();
    let doc = json!({"amount": 10});
    let first = root(&generator);

    let proof = generator.generate(&doc, "key-1", &secret, &first).await.unwrap();
    let verifier = verifier(&fixture);

    let mut unknown = proof.clone();
    unknown.proof_value.channel_id = format!("{}:{}", "cd".repeat(32), "ef".repeat(32));
    assert!(!verifier.verify(&doc, &unknown, &secret.public_key()).await.unwrap());

    let mut garbled = proof.clone();
    garbled.proof_value.channel_id = "garbage".into();
    assert!(!verifier.verify(&doc, &garbled, &secret.public_key()).await.unwrap());

    let chain = [unknown.clone()];
    assert!(!verifier
        .verify_chain(&[doc.clone()], &chain, &secret.public_key())
        .await
        .unwrap());
    assert!(!verifier
        .verify_chain_single_proof(&[doc], &unknown, &secret.public_key())
        .await
        .unwrap());
}

#[tokio::test]
async fn non_object_document_is_rejected() {
    let fixture = TestFixture::new();
    let mut generator = generator(&fixture).await;
    let first = root(&generator);

    let err = generator
        .generate(&json!(["not", "an", "object"]), "key-1", &SecretKey::generate(), &first)
        .await
        .unwrap_err();
    assert!(matches!(err, ProofError::InvalidDataType));
}

#[tokio::test]
async fn unbound_generator_fails() {
    let fixture = TestFixture::new();
    let mut generator = ProofGenerator::new(fixture.session().unwrap(), Ed25519JcsSigner::new(ISSUER));

    let err = generator
        .generate(&json!({}), "key-1", &SecretKey::generate(), &"00".repeat(32))
        .await
        .unwrap_err();
    match err {
        ProofError::Anchoring(e) => assert_eq!(e.kind(), ErrorKind::ChannelNotBound),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn proof_survives_json_round_trip() {
    let fixture = TestFixture::new();
    let mut generator = generator(&fixture).await;
    let secret = SecretKey::generate();
    let doc = json!({"id": 7});
    let first = root(&generator);

    let proof = generator.generate(&doc, "key-1", &secret, &first).await.unwrap();
    let wire = serde_json::to_string(&proof).unwrap();
    let back: LinkedProof = serde_json::from_str(&wire).unwrap();

    assert!(verifier(&fixture).verify(&doc, &back, &secret.public_key()).await.unwrap());
}

// ─────────────────────────────────────────────────────────────────────────────
// Chains
// ─────────────────────────────────────────────────────────────────────────────

fn documents() -> Vec<Value> {
    vec![
        json!({"step": 1, "action": "created"}),
        json!({"step": 2, "action": "reviewed"}),
        json!({"step": 3, "action": "approved"}),
    ]
}

#[tokio::test]
async fn chain_links_each_proof_to_the_previous() {
    let fixture = TestFixture::new();
    let mut generator = generator(&fixture).await;
    let secret = SecretKey::generate();
    let docs = documents();
    let first = root(&generator);

    let proofs = generator.generate_chain(&docs, "key-1", &secret, &first).await.unwrap();

    assert_eq!(proofs.len(), 3);
    assert_eq!(proofs[0].proof_value.anchorage_id, first);
    assert_eq!(proofs[1].proof_value.anchorage_id, proofs[0].proof_value.entry_id);
    assert_eq!(proofs[2].proof_value.anchorage_id, proofs[1].proof_value.entry_id);

    let verifier = verifier(&fixture);
    assert!(verifier.verify_chain(&docs, &proofs, &secret.public_key()).await.unwrap());

    // Each proof also verifies on its own, with a fresh session.
    for (doc, proof) in docs.iter().zip(&proofs) {
        assert!(verifier.verify(doc, proof, &secret.public_key()).await.unwrap());
    }
}

#[tokio::test]
async fn reordered_chain_does_not_verify() {
    let fixture = TestFixture::new();
    let mut generator = generator(&fixture).await;
    let secret = SecretKey::generate();
    let docs = documents();
    let first = root(&generator);

    let proofs = generator.generate_chain(&docs, "key-1", &secret, &first).await.unwrap();
    let verifier = verifier(&fixture);

    let mut swapped_proofs = proofs.clone();
    swapped_proofs.swap(0, 1);
    let mut swapped_docs = docs.clone();
    swapped_docs.swap(0, 1);
    assert!(!verifier
        .verify_chain(&swapped_docs, &swapped_proofs, &secret.public_key())
        .await
        .unwrap());

    let mut mismatched = docs.clone();
    mismatched.swap(1, 2);
    assert!(!verifier.verify_chain(&mismatched, &proofs, &secret.public_key()).await.unwrap());

    assert!(!verifier.verify_chain(&docs[..2], &proofs, &secret.public_key()).await.unwrap());
    assert!(!verifier.verify_chain(&[], &[], &secret.public_key()).await.unwrap());
}

#[tokio::test]
async fn chain_across_channels_does_not_verify() {
    let fixture = TestFixture::new();
    let secret = SecretKey::generate();
    let docs = documents();

    let mut a = generator(&fixture).await;
    let first_a = root(&a);
    let chain_a = a.generate_chain(&docs[..1], "key-1", &secret, &first_a).await.unwrap();

    let mut b = generator(&fixture).await;
    let first_b = root(&b);
    let chain_b = b.generate_chain(&docs[1..2], "key-1", &secret, &first_b).await.unwrap();

    let mixed = vec![chain_a[0].clone(), chain_b[0].clone()];
    assert!(!verifier(&fixture)
        .verify_chain(&docs[..2], &mixed, &secret.public_key())
        .await
        .unwrap());
}

#[tokio::test]
async fn chain_failure_returns_completed_proofs() {
    let fixture = TestFixture::new();
    let mut generator = generator(&fixture).await;
    let secret = SecretKey::generate();
    let first = root(&generator);
    let docs = vec![json!({"step": 1}), json!("not an object"), json!({"step": 3})];

    let err = generator.generate_chain(&docs, "key-1", &secret, &first).await.unwrap_err();

    assert_eq!(err.index, 1);
    assert_eq!(err.completed.len(), 1);
    assert!(matches!(err.source, ProofError::InvalidDataType));

    // The completed prefix is anchored and usable.
    let verifier = verifier(&fixture);
    assert!(verifier
        .verify_chain(&docs[..1], &err.completed, &secret.public_key())
        .await
        .unwrap());

    // Resume from the last completed proof.
    let tip = err.completed[0].proof_value.entry_id.clone();
    let rest = generator.generate_chain(&docs[2..], "key-1", &secret, &tip).await.unwrap();
    assert_eq!(rest[0].proof_value.anchorage_id, tip);
}

#[tokio::test]
async fn strict_chain_needs_consecutive_entries() {
    let fixture = TestFixture::new();
    let mut generator = generator(&fixture).await;
    let secret = SecretKey::generate();
    let docs = documents();
    let first = root(&generator);
    let channel_id = generator.channel().channel_id().unwrap();

    let p0 = generator.generate(&docs[0], "key-1", &secret, &first).await.unwrap();

    // Another publisher gets an entry in between the two proofs.
    let mut other = fixture.attach(&channel_id).await.unwrap();
    other.anchor(b"in between", &first).await.unwrap();

    let p1 = generator
        .generate(&docs[1], "key-1", &secret, &p0.proof_value.entry_id)
        .await
        .unwrap();
    let proofs = vec![p0, p1];

    let lenient = verifier(&fixture);
    assert!(!lenient.is_strict());
    assert!(lenient.verify_chain(&docs[..2], &proofs, &secret.public_key()).await.unwrap());

    let strict = verifier(&fixture).with_strict(true);
    assert!(!strict.verify_chain(&docs[..2], &proofs, &secret.public_key()).await.unwrap());
}

#[tokio::test]
async fn strict_chain_verifies_uninterrupted_chain() {
    let fixture = TestFixture::new();
    let mut generator = generator(&fixture).await;
    let secret = SecretKey::generate();
    let docs = documents();
    let first = root(&generator);

    let proofs = generator.generate_chain(&docs, "key-1", &secret, &first).await.unwrap();
    let strict = verifier(&fixture).with_strict(true);
    assert!(strict.verify_chain(&docs, &proofs, &secret.public_key()).await.unwrap());

    let mut mismatched = docs.clone();
    mismatched.swap(0, 2);
    assert!(!strict.verify_chain(&mismatched, &proofs, &secret.public_key()).await.unwrap());
}

#[tokio::test]
async fn single_proof_covers_the_following_entries() {
    let fixture = TestFixture::new();
    let mut generator = generator(&fixture).await;
    let secret = SecretKey::generate();
    let docs = documents();
    let first = root(&generator);

    let proofs = generator.generate_chain(&docs, "key-1", &secret, &first).await.unwrap();
    let verifier = verifier(&fixture);
    let key = secret.public_key();

    assert!(verifier.verify_chain_single_proof(&docs, &proofs[0], &key).await.unwrap());
    assert!(verifier.verify_chain_single_proof(&docs[..1], &proofs[0], &key).await.unwrap());
    // Starting from the middle of the chain.
    assert!(verifier.verify_chain_single_proof(&docs[1..], &proofs[1], &key).await.unwrap());
}

#[tokio::test]
async fn single_proof_rejects_altered_sequences() {
    let fixture = TestFixture::new();
    let mut generator = generator(&fixture).await;
    let secret = SecretKey::generate();
    let docs = documents();
    let first = root(&generator);

    let proofs = generator.generate_chain(&docs, "key-1", &secret, &first).await.unwrap();
    let verifier = verifier(&fixture);
    let key = secret.public_key();

    let mut reordered = docs.clone();
    reordered.swap(1, 2);
    assert!(!verifier.verify_chain_single_proof(&reordered, &proofs[0], &key).await.unwrap());

    let mut tampered = docs.clone();
    tampered[2] = json!({"step": 3, "action": "rejected"});
    assert!(!verifier.verify_chain_single_proof(&tampered, &proofs[0], &key).await.unwrap());

    // More documents than entries on the channel.
    let mut longer = docs.clone();
    longer.push(json!({"step": 4, "action": "archived"}));
    assert!(!verifier.verify_chain_single_proof(&longer, &proofs[0], &key).await.unwrap());

    assert!(!verifier.verify_chain_single_proof(&[], &proofs[0], &key).await.unwrap());
    assert!(!verifier
        .verify_chain_single_proof(&docs, &proofs[0], &SecretKey::generate().public_key())
        .await
        .unwrap());
}

// ─────────────────────────────────────────────────────────────────────────────
// Private channels
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn private_channel_proofs_need_access() {
    let fixture = TestFixture::private();
    let mut generator = generator(&fixture).await;
    let secret = SecretKey::generate();
    let doc = json!({"amount": 10});
    let first = root(&generator);
    assert!(generator.channel().is_private());

    let proof = generator.generate(&doc, "key-1", &secret, &first).await.unwrap();
    assert_eq!(proof.proof_value.channel_id.split(':').count(), 3);

    let holder = verifier(&fixture).with_preshared_keys(fixture.preshared_keys.clone());
    assert!(holder.verify(&doc, &proof, &secret.public_key()).await.unwrap());

    let outsider = verifier(&fixture);
    assert!(!outsider.verify(&doc, &proof, &secret.public_key()).await.unwrap());
}

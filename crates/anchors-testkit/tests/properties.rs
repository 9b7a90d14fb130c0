//! Property tests over generated messages and documents.

use proptest::prelude::*;
use tokio::runtime::Runtime;

use anchors_proofs::{Ed25519JcsSigner, ProofGenerator, ProofVerifier, SecretKey};
use anchors_testkit::generators::{json_document, message, seed};
use anchors_testkit::{TestFixture, TEST_NODE};

fn runtime() -> Runtime {
    Runtime::new().unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn anchored_messages_read_back(messages in prop::collection::vec(message(256), 1..6)) {
        runtime().block_on(async {
            let fixture = TestFixture::new();
            let mut channel = fixture.new_channel().await.unwrap();
            let refs: Vec<&[u8]> = messages.iter().map(Vec::as_slice).collect();
            let ids = fixture.anchor_chain(&mut channel, &refs).await.unwrap();

            let mut reader = fixture.attach(&channel.channel_id().unwrap()).await.unwrap();
            let mut anchorage = channel.first_anchorage_id().unwrap().to_hex();
            for (msg, id) in messages.iter().zip(&ids) {
                let fetched = reader.fetch(&anchorage, Some(id)).await.unwrap();
                assert_eq!(&fetched.content, msg);
                anchorage = id.clone();
            }
        });
    }

    #[test]
    fn encrypted_messages_read_back(msg in message(512)) {
        runtime().block_on(async {
            let fixture = TestFixture::encrypted();
            let mut channel = fixture.new_channel().await.unwrap();
            let ids = fixture.anchor_chain(&mut channel, &[msg.as_slice()]).await.unwrap();

            let mut reader = fixture.attach(&channel.channel_id().unwrap()).await.unwrap();
            let first = channel.first_anchorage_id().unwrap().to_hex();
            assert_eq!(reader.fetch(&first, Some(&ids[0])).await.unwrap().content, msg);
        });
    }

    #[test]
    fn same_seed_same_publisher(seed in seed()) {
        let fixture = TestFixture::new();
        let a = fixture.session_with_seed(seed.clone()).unwrap();
        let b = fixture.session_with_seed(seed).unwrap();
        prop_assert_eq!(a.publisher_key(), b.publisher_key());
    }

    #[test]
    fn generated_documents_verify(doc in json_document()) {
        runtime().block_on(async {
            let fixture = TestFixture::new();
            let channel = fixture.new_channel().await.unwrap();
            let mut generator = ProofGenerator::new(channel, Ed25519JcsSigner::new("did:example:issuer"));
            let secret = SecretKey::generate();
            let first = generator.channel().first_anchorage_id().unwrap().to_hex();

            let proof = generator.generate(&doc, "key-1", &secret, &first).await.unwrap();
            let verifier = ProofVerifier::new(fixture.context.clone(), TEST_NODE).unwrap();
            assert!(verifier.verify(&doc, &proof, &secret.public_key()).await.unwrap());
        });
    }
}

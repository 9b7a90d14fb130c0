//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::{Map, Value};

use anchors_core::{ChannelAddress, ChannelId, EntryId, Keypair, Seed};

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

pub fn entry_id() -> impl Strategy<Value = EntryId> {
    any::<[u8; 32]>().prop_map(EntryId::from_bytes)
}

pub fn channel_id() -> impl Strategy<Value = ChannelId> {
    (any::<[u8; 32]>(), entry_id()).prop_map(|(address, root)| ChannelId::new(ChannelAddress::from_bytes(address), root))
}

/// Generate an 80-character lowercase seed.
pub fn seed() -> impl Strategy<Value = Seed> {
    "[a-z]{80}".prop_map(Seed::new)
}

/// Generate message bytes of at most `max_len` bytes.
pub fn message(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate endpoints the channel layer accepts.
pub fn endpoint() -> impl Strategy<Value = String> {
    (
        prop_oneof![Just("http"), Just("https"), Just("ws"), Just("wss"), Just("tcp")],
        "[a-z]([a-z0-9-]{0,14}[a-z0-9])?(\\.[a-z][a-z0-9]{0,7}){0,2}",
        prop::option::of(1u16..=u16::MAX),
    )
        .prop_map(|(scheme, host, port)| match port {
            Some(port) => format!("{scheme}://{host}:{port}"),
            None => format!("{scheme}://{host}"),
        })
}

fn json_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[ -~]{0,24}".prop_map(Value::String),
    ]
}

/// Generate a JSON object, nested up to three levels.
pub fn json_document() -> impl Strategy<Value = Value> {
    let value = json_leaf().prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,8}", inner, 0..4)
                .prop_map(|fields| Value::Object(fields.into_iter().collect())),
        ]
    });
    prop::collection::btree_map("[a-z]{1,8}", value, 0..6)
        .prop_map(|fields| Value::Object(fields.into_iter().collect::<Map<String, Value>>()))
}

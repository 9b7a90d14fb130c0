//! Canonical CBOR encoding for entry headers.
//!
//! Headers are encoded with RFC 8949 Core Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats (timestamps are i64 milliseconds)
//!
//! The full entry wire form is `canonical_header || payload || signature`.
//! Entry ids are the Blake3 hash of that form, so every ledger and every
//! session must agree on it byte for byte.

use ciborium::value::{Integer, Value};

use crate::crypto::{Blake3Hash, Ed25519PublicKey, Ed25519Signature};
use crate::entry::{Entry, EntryHeader, EntryKind};
use crate::error::CoreError;
use crate::types::{ChannelAddress, EntryId};

/// Header field keys. Keys 0-23 encode as single bytes.
mod keys {
    pub const VERSION: u64 = 0;
    pub const PUBLISHER: u64 = 1;
    pub const ADDRESS: u64 = 2;
    pub const TIMESTAMP: u64 = 3;
    pub const KIND: u64 = 4;
    pub const LINK: u64 = 5;
    pub const PAYLOAD_HASH: u64 = 6;
}

const SIGNATURE_LEN: usize = 64;

/// Encode an entry header to canonical CBOR bytes.
pub fn canonical_header_bytes(header: &EntryHeader) -> Vec<u8> {
    let mut writer = CanonicalWriter::default();
    writer.value(&header_to_value(header));
    writer.into_bytes()
}

/// Encode an entire entry to its canonical wire form.
pub fn canonical_bytes(entry: &Entry) -> Vec<u8> {
    let mut buf = signed_message_from_parts(&entry.header, &entry.payload);
    buf.extend_from_slice(entry.signature.as_bytes());
    buf
}

/// The message an entry's signature covers (header || payload).
pub fn signed_message(entry: &Entry) -> Vec<u8> {
    signed_message_from_parts(&entry.header, &entry.payload)
}

pub fn signed_message_from_parts(header: &EntryHeader, payload: &[u8]) -> Vec<u8> {
    let mut buf = canonical_header_bytes(header);
    buf.extend_from_slice(payload);
    buf
}

fn header_to_value(header: &EntryHeader) -> Value {
    let int = |n: u64| Value::Integer(n.into());
    let link = match &header.link {
        Some(id) => Value::Bytes(id.0.to_vec()),
        None => Value::Null,
    };
    Value::Map(vec![
        (int(keys::VERSION), int(header.version.into())),
        (int(keys::PUBLISHER), Value::Bytes(header.publisher.0.to_vec())),
        (int(keys::ADDRESS), Value::Bytes(header.address.0.to_vec())),
        (int(keys::TIMESTAMP), Value::Integer(header.timestamp.into())),
        (int(keys::KIND), int(header.kind.to_u16().into())),
        (int(keys::LINK), link),
        (int(keys::PAYLOAD_HASH), Value::Bytes(header.payload_hash.0.to_vec())),
    ])
}

/// Deterministic CBOR writer for the subset of values headers use.
#[derive(Default)]
struct CanonicalWriter {
    buf: Vec<u8>,
}

impl CanonicalWriter {
    fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn head(&mut self, major: u8, n: u64) {
        let mt = major << 5;
        match n {
            0..=23 => self.buf.push(mt | n as u8),
            24..=0xff => {
                self.buf.push(mt | 24);
                self.buf.push(n as u8);
            }
            0x100..=0xffff => {
                self.buf.push(mt | 25);
                self.buf.extend_from_slice(&(n as u16).to_be_bytes());
            }
            0x1_0000..=0xffff_ffff => {
                self.buf.push(mt | 26);
                self.buf.extend_from_slice(&(n as u32).to_be_bytes());
            }
            _ => {
                self.buf.push(mt | 27);
                self.buf.extend_from_slice(&n.to_be_bytes());
            }
        }
    }

    fn integer(&mut self, i: Integer) {
        let n = i128::from(i);
        if n >= 0 {
            self.head(0, n as u64);
        } else {
            // -1 encodes as 0, -2 as 1, ...
            self.head(1, (-1 - n) as u64);
        }
    }

    fn value(&mut self, value: &Value) {
        match value {
            Value::Integer(i) => self.integer(*i),
            Value::Bytes(b) => {
                self.head(2, b.len() as u64);
                self.buf.extend_from_slice(b);
            }
            Value::Text(s) => {
                self.head(3, s.len() as u64);
                self.buf.extend_from_slice(s.as_bytes());
            }
            Value::Array(items) => {
                self.head(4, items.len() as u64);
                for item in items {
                    self.value(item);
                }
            }
            Value::Map(entries) => self.map(entries),
            Value::Bool(b) => self.buf.push(if *b { 0xf5 } else { 0xf4 }),
            Value::Null => self.buf.push(0xf6),
            // Headers are built from integers, byte strings and null only.
            _ => unreachable!("unsupported CBOR value in entry header"),
        }
    }

    fn map(&mut self, entries: &[(Value, Value)]) {
        let mut encoded: Vec<(Vec<u8>, &Value)> = entries
            .iter()
            .map(|(k, v)| {
                let mut key = CanonicalWriter::default();
                key.value(k);
                (key.into_bytes(), v)
            })
            .collect();
        encoded.sort_by(|a, b| a.0.cmp(&b.0));

        self.head(5, encoded.len() as u64);
        for (key, value) in encoded {
            self.buf.extend_from_slice(&key);
            self.value(value);
        }
    }
}

/// Decode an entry from its canonical wire form.
pub fn decode_entry(bytes: &[u8]) -> Result<Entry, CoreError> {
    if bytes.len() < SIGNATURE_LEN {
        return Err(CoreError::MalformedEntry("too short".into()));
    }

    let value: Value = ciborium::from_reader(bytes)
        .map_err(|e| CoreError::DecodingError(e.to_string()))?;
    let header = value_to_header(&value)?;

    // The header is canonical, so re-encoding yields its exact length.
    let header_len = canonical_header_bytes(&header).len();
    let rest = bytes
        .get(header_len..)
        .filter(|rest| rest.len() >= SIGNATURE_LEN)
        .ok_or_else(|| CoreError::MalformedEntry("insufficient bytes for signature".into()))?;

    let (payload, sig) = rest.split_at(rest.len() - SIGNATURE_LEN);
    let sig: [u8; SIGNATURE_LEN] = sig
        .try_into()
        .map_err(|_| CoreError::MalformedEntry("invalid signature length".into()))?;

    Ok(Entry {
        header,
        payload: payload.to_vec().into(),
        signature: Ed25519Signature(sig),
    })
}

fn value_to_header(value: &Value) -> Result<EntryHeader, CoreError> {
    let Value::Map(map) = value else {
        return Err(CoreError::MalformedEntry("expected map".into()));
    };

    let get = |key: u64| -> Option<&Value> {
        map.iter()
            .find(|(k, _)| matches!(k, Value::Integer(i) if i128::from(*i) == key as i128))
            .map(|(_, v)| v)
    };
    let int = |key: u64, name: &str| -> Result<i128, CoreError> {
        match get(key) {
            Some(Value::Integer(i)) => Ok(i128::from(*i)),
            _ => Err(CoreError::MalformedEntry(format!("missing {name}"))),
        }
    };
    let bytes32 = |key: u64, name: &str| -> Result<[u8; 32], CoreError> {
        match get(key) {
            Some(Value::Bytes(b)) => b
                .as_slice()
                .try_into()
                .map_err(|_| CoreError::MalformedEntry(format!("invalid {name}"))),
            _ => Err(CoreError::MalformedEntry(format!("invalid {name}"))),
        }
    };

    let version = u8::try_from(int(keys::VERSION, "version")?)
        .map_err(|_| CoreError::MalformedEntry("invalid version".into()))?;
    let timestamp = i64::try_from(int(keys::TIMESTAMP, "timestamp")?)
        .map_err(|_| CoreError::MalformedEntry("invalid timestamp".into()))?;
    let raw_kind = int(keys::KIND, "kind")?;
    let kind = u16::try_from(raw_kind)
        .ok()
        .and_then(EntryKind::from_u16)
        .ok_or_else(|| CoreError::MalformedEntry(format!("invalid kind: {raw_kind}")))?;

    let link = match get(keys::LINK) {
        Some(Value::Null) | None => None,
        Some(_) => Some(EntryId(bytes32(keys::LINK, "link")?)),
    };

    Ok(EntryHeader {
        version,
        publisher: Ed25519PublicKey(bytes32(keys::PUBLISHER, "publisher")?),
        address: ChannelAddress(bytes32(keys::ADDRESS, "address")?),
        timestamp,
        kind,
        link,
        payload_hash: Blake3Hash(bytes32(keys::PAYLOAD_HASH, "payload_hash")?),
    })
}

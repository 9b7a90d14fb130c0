//! Entry validation: signature verification and structural checks.
//!
//! Branch context (does the anchorage exist, is the branch known) is the
//! ledger's business; everything that can be checked from the entry alone is
//! checked here.

use crate::canonical::signed_message;
use crate::crypto::Blake3Hash;
use crate::entry::{Entry, EntryKind, ENTRY_VERSION};
use crate::error::ValidationError;
use crate::mask::KEYLOAD_SLOT_LEN;
use crate::types::ChannelAddress;

/// Validate an entry's structure and signature.
pub fn validate_entry(entry: &Entry) -> Result<(), ValidationError> {
    validate_entry_structure(entry)?;

    entry
        .header
        .publisher
        .verify(&signed_message(entry), &entry.signature)
        .map_err(|_| ValidationError::SignatureFailed)
}

/// Validate entry structure without signature verification.
///
/// Checks:
/// - version
/// - payload hash
/// - announce entries carry no link and their address derives from the nonce
/// - every other entry links to an anchorage
/// - keyload payloads are whole access slots
pub fn validate_entry_structure(entry: &Entry) -> Result<(), ValidationError> {
    if entry.header.version != ENTRY_VERSION {
        return Err(ValidationError::UnsupportedVersion(entry.header.version));
    }

    if Blake3Hash::hash(&entry.payload) != entry.header.payload_hash {
        return Err(ValidationError::PayloadHashMismatch);
    }

    match (entry.header.kind, entry.header.link) {
        (EntryKind::Announce, Some(_)) => Err(ValidationError::AnnounceWithLink),
        (EntryKind::Announce, None) => {
            let derived = ChannelAddress::derive(&entry.header.publisher, &entry.payload);
            if derived != entry.header.address {
                return Err(ValidationError::AddressMismatch);
            }
            Ok(())
        }
        (kind, None) => Err(ValidationError::MissingLink(kind)),
        (EntryKind::Keyload, Some(_))
            if entry.payload.is_empty() || entry.payload.len() % KEYLOAD_SLOT_LEN != 0 =>
        {
            Err(ValidationError::StructuralError(format!(
                "keyload payload of {} bytes",
                entry.payload.len()
            )))
        }
        (_, Some(_)) => Ok(()),
    }
}

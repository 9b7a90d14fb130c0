//! Anchorage resolution.
//!
//! The ledger has no index from an entry id to "where it sits relative to what
//! this session has read", so resolving an anchorage is a search:
//!
//! 1. The first anchorage (root, or keyload of a private channel) resolves
//!    immediately.
//! 2. A direct read by id, accepted only if the session already knows what the
//!    entry links to. Any failure here just means "not yet".
//! 3. A forward scan with the session cursor, comparing ids, until a match or
//!    the end of the branch.
//!
//! Step 3 moves the cursor for good. Entries scanned past while looking for
//! one anchorage are not revisited by a later `fetch_next`.

use tracing::{debug, trace};

use anchors_core::{Endpoint, EntryId};
use anchors_ledger::{LedgerError, LedgerLogClient};

use crate::channel::Session;

/// A resolved anchorage: an entry on the branch and its log position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchorage {
    pub id: EntryId,
    pub position: u64,
}

/// Locate `target` on the session's branch.
///
/// `Ok(None)` is the normal "not found" outcome; errors are ledger failures
/// hit while scanning.
pub(crate) async fn resolve<L>(
    client: &L,
    node: &Endpoint,
    session: &mut Session,
    target: &str,
) -> Result<Option<Anchorage>, LedgerError>
where
    L: LedgerLogClient + ?Sized,
{
    // An id that does not parse skips the direct read but still scans: it
    // can never match, so the cursor runs to the end of the branch.
    let target_id = target.parse::<EntryId>().ok();

    if target_id == Some(session.first_anchorage.id) {
        return Ok(Some(session.first_anchorage));
    }

    if let Some(id) = &target_id {
        let address = *session.channel_id.address();
        match client.read_by_id(node, &address, id).await {
            Ok(Some(record)) if session.cursor.admit(&record) => {
                trace!(anchorage = %id, position = record.position, "resolved by direct read");
                return Ok(Some(Anchorage {
                    id: record.id,
                    position: record.position,
                }));
            }
            Ok(_) => {}
            Err(e) => debug!(anchorage = %id, error = %e, "direct read failed, scanning"),
        }
    }

    while let Some(record) = session.cursor.next(client, node).await? {
        if Some(record.id) == target_id {
            trace!(anchorage = target, position = record.position, "resolved by scan");
            return Ok(Some(Anchorage {
                id: record.id,
                position: record.position,
            }));
        }
    }

    debug!(anchorage = target, position = session.cursor.position(), "anchorage not found");
    Ok(None)
}

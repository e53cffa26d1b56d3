//! Cached values stamped with the ledger position they reflect.

use std::future::Future;

use ledgerview_shared::types::SequenceId;
use tracing::debug;

use crate::ledger::{LedgerStore, StoreError};

/// Attempts at pinning a load to a quiet ledger head before giving up.
const SNAPSHOT_ATTEMPTS: u32 = 3;

/// A derived value and the highest sequence id already folded into it.
///
/// Observers skip entries at or below `as_of`, so an entry that both landed
/// in an authoritative load and was later dispatched by the reader is
/// applied once, and redelivered entries are no-ops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot<V> {
    /// The derived value.
    pub value: V,
    /// Ledger position the value reflects.
    pub as_of: SequenceId,
}

impl<V> Snapshot<V> {
    /// True if `sequence_id` is already reflected in this value.
    #[must_use]
    pub fn covers(&self, sequence_id: SequenceId) -> bool {
        sequence_id <= self.as_of
    }
}

/// Runs `query` between two head reads and stamps the result.
///
/// If the head moved while the query ran, the query is repeated up to
/// [`SNAPSHOT_ATTEMPTS`] times. The result cannot be pinned to a ledger
/// position when the head never goes quiet, so that case fails with
/// [`StoreError::HeadMoving`] and nothing is cached.
pub(crate) async fn load_snapshot<V, F, Fut>(
    store: &dyn LedgerStore,
    mut query: F,
) -> Result<Snapshot<V>, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<V, StoreError>>,
{
    let mut before = store.max_sequence_id().await?;
    for attempt in 1..=SNAPSHOT_ATTEMPTS {
        let value = query().await?;
        let after = store.max_sequence_id().await?;
        if after == before {
            return Ok(Snapshot {
                value,
                as_of: before,
            });
        }
        debug!(%before, %after, attempt, "ledger moved during load, retrying");
        before = after;
    }
    Err(StoreError::HeadMoving(SNAPSHOT_ATTEMPTS))
}

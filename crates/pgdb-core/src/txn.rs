//! Helpers shared by the deploy, destroy and status transactions.

use pgdb_state::RegistryLock;
use tracing::warn;

/// Give the lock back at the end of a transaction. Any registry write has
/// already landed, so a failing unlock is logged, not returned.
pub(crate) fn release(lock: RegistryLock) {
    if let Err(e) = lock.release() {
        warn!(error = %e, "failed to release registry lock");
    }
}

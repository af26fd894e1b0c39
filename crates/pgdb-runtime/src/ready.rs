//! Fixed-interval readiness polling.

use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{RuntimeError, RuntimeResult};

/// Poll interval used by the Docker adapter.
pub const READY_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Call `probe` every `interval` until it reports ready or `timeout`
/// elapses. The deadline is checked before each probe, so a probe that
/// succeeds on its first call always wins, even with a zero timeout.
pub fn poll_until_ready<F>(timeout: Duration, interval: Duration, mut probe: F) -> RuntimeResult<()>
where
    F: FnMut() -> bool,
{
    let started = Instant::now();
    let deadline = started + timeout;
    let mut probes = 0u32;

    loop {
        if probes > 0 && Instant::now() >= deadline {
            return Err(RuntimeError::NotReady(timeout));
        }

        probes += 1;
        if probe() {
            debug!(probes, elapsed = ?started.elapsed(), "database ready");
            return Ok(());
        }

        thread::sleep(interval);
    }
}

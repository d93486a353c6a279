use std::time::{Duration, Instant};

use crate::error::{Result, RuntimeError};

/// Poll `settled` until it holds, returning how long that took.
///
/// Gives up with [`RuntimeError::ModeTimeout`] once `timeout` has passed.
pub fn poll_until_settled(
    mut settled: impl FnMut() -> bool,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<Duration> {
    let started = Instant::now();
    loop {
        if settled() {
            return Ok(started.elapsed());
        }
        if started.elapsed() >= timeout {
            return Err(RuntimeError::ModeTimeout);
        }
        std::thread::sleep(poll_interval);
    }
}

//! Bounded waits for blocking calls that depend on something outside the
//! process: a hardware device or a human operator.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// Why [`run_with_timeout`] produced no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitError {
    /// The limit passed first. The call keeps running on its helper thread
    /// and its result is discarded.
    Elapsed,
    /// The helper thread could not be started or panicked.
    Aborted,
}

/// Run `f` on a helper thread and wait at most `limit` for its result.
pub fn run_with_timeout<T, F>(limit: Duration, f: F) -> Result<T, WaitError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel(1);
    thread::Builder::new()
        .name("keyring-wait".into())
        .spawn(move || {
            // receiver may be gone after a timeout
            let _ = tx.send(f());
        })
        .map_err(|_| WaitError::Aborted)?;

    match rx.recv_timeout(limit) {
        Ok(value) => Ok(value),
        Err(RecvTimeoutError::Timeout) => Err(WaitError::Elapsed),
        Err(RecvTimeoutError::Disconnected) => Err(WaitError::Aborted),
    }
}

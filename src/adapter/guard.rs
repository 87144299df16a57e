//! Re-entrancy guard for handshakes.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::adapter::types::{WalletError, WalletResult};

/// A RAII guard that holds an adapter's "connecting" flag.
///
/// Dropping the guard (success, error or a cancelled future) clears the flag.
#[derive(Debug)]
pub struct ConnectGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> ConnectGuard<'a> {
    /// Claim the flag, or fail with `AlreadyConnecting` if it is held.
    pub fn acquire(flag: &'a AtomicBool) -> WalletResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| WalletError::AlreadyConnecting)?;
        Ok(Self { flag })
    }
}

impl Drop for ConnectGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

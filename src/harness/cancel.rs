//! Operator cancellation signaling
//!
//! Ctrl+C is delivered asynchronously; every polling loop observes it by
//! checking the token each tick and surfacing [`Error::Interrupted`]
//! through `?`. The error then unwinds to the nearest test boundary,
//! where the shutdown sequence runs exactly once and the token is armed
//! again for the next test.

use crate::error::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Shared cancellation flag set from the Ctrl+C handler
#[derive(Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create an un-cancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a Ctrl+C handler that cancels this token
    pub fn install_ctrlc(&self) -> Result<()> {
        let flag = Arc::clone(&self.flag);
        ctrlc::set_handler(move || {
            flag.store(true, Ordering::SeqCst);
        })
        .map_err(|e| Error::Other(format!("cannot install Ctrl+C handler: {}", e)))
    }

    /// Mark the token cancelled
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Re-arm the token after a cancellation has been handled
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Fail with [`Error::Interrupted`] if cancellation has been requested
    pub fn checkpoint(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Interrupted)
        } else {
            Ok(())
        }
    }

    /// Sleep one polling period, observing cancellation on both edges
    pub fn sleep(&self, period: Duration) -> Result<()> {
        self.checkpoint()?;
        thread::sleep(period);
        self.checkpoint()
    }
}

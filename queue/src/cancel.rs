//! A one-shot cancellation signal. Every [`Queue`][crate::queue::Queue] checks one of these
//! before touching its lock, and once it fires the queue refuses all further work.
//!
//! Tokens are cheap to clone and all clones share the same flag, so one token can be handed to
//! any number of queues (and to whatever process-level shutdown hook wants to pull the plug).

use crate::error::{Error, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    canceled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that hasn't fired.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the token. Calling this more than once does nothing extra.
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::Release);
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::Acquire)
    }

    /// Returns [`Error::Canceled`] if the token has fired.
    pub fn check(&self) -> Result<()> {
        if self.is_canceled() {
            Err(Error::Canceled)
        } else {
            Ok(())
        }
    }
}

//! Cooperative cancellation for long tree walks.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::application::ApplicationError;
use crate::error::IgnResult;

/// Shared flag checked before fetches and at every file visit.
///
/// Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once [`cancel`](Self::cancel) has been called.
    pub fn check(&self) -> IgnResult<()> {
        if self.is_cancelled() {
            Err(ApplicationError::Cancelled.into())
        } else {
            Ok(())
        }
    }
}

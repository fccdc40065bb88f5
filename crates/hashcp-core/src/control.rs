//! Run control for cancellation: a shared one-shot abort token.
//!
//! The caller hands a `CancelToken` into a run; the supervisor checks it
//! before each dispatch and workers check it between chunks. Once tripped the
//! token is never unset: no new tasks start and in-flight streams stop at the
//! next chunk boundary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Error returned when a streaming task is stopped by cancellation.
#[derive(Debug)]
pub struct CopyAborted;

impl std::fmt::Display for CopyAborted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "run cancelled by caller")
    }
}

impl std::error::Error for CopyAborted {}

/// One-shot cancellation flag shared between the caller, the supervisor and
/// all workers of a run.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Safe to call from any thread, any number of times.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

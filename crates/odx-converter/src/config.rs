// crates/odx-converter/src/config.rs

//! Run configuration and the cancellation/timeout guard.

use crate::error::ConvertError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared flag used to stop a running conversion from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Options for one conversion run.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Size of the document loader pool. Always at least 1.
    pub workers: usize,
    /// Wall-clock limit for the whole run.
    pub timeout: Option<Duration>,
    pub cancellation: CancellationToken,
    /// Merge structurally identical shared structures.
    pub deduplicate: bool,
    /// Reject a document whose `SHORT-NAME`s do not all match `[A-Za-z0-9_]+`.
    /// When unset, each mismatch is only a diagnostic.
    pub strict_short_names: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            timeout: None,
            cancellation: CancellationToken::new(),
            deduplicate: true,
            strict_short_names: false,
        }
    }
}

impl ConvertOptions {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn with_deduplicate(mut self, deduplicate: bool) -> Self {
        self.deduplicate = deduplicate;
        self
    }

    pub fn with_strict_short_names(mut self, strict: bool) -> Self {
        self.strict_short_names = strict;
        self
    }
}

/// Checked between document loads and at every stage boundary.
#[derive(Debug, Clone)]
pub struct RunGuard {
    started: Instant,
    timeout: Option<Duration>,
    cancellation: CancellationToken,
}

impl RunGuard {
    pub fn new(options: &ConvertOptions) -> Self {
        Self {
            started: Instant::now(),
            timeout: options.timeout,
            cancellation: options.cancellation.clone(),
        }
    }

    pub fn check(&self) -> Result<(), ConvertError> {
        if self.cancellation.is_cancelled() {
            return Err(ConvertError::Cancelled);
        }
        match self.timeout {
            Some(limit) if self.started.elapsed() >= limit => Err(ConvertError::TimedOut),
            _ => Ok(()),
        }
    }
}

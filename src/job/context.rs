// src/job/context.rs
//! Job context: the narrow interface between the core and its host.
//!
//! The core never holds a handle to any presentation object. Everything
//! the host learns about a running job flows through `JobEvents`, and the
//! only control the host has over a running job is the cancel flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag shared between controller and worker.
///
/// The worker polls it once per item boundary; an in-flight network call
/// always completes before cancellation takes effect.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. The current item still finishes.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Progress callbacks delivered to the host after each unit of work.
///
/// Log lines are not part of this trait; they go through the `log`
/// facade and the host installs whatever appender it wants.
pub trait JobEvents: Send + Sync {
    /// Called after each item completes, with `(done, total)`.
    fn progress(&self, done: usize, total: usize);
}

/// A host that doesn't care about progress.
pub struct NullEvents;

impl JobEvents for NullEvents {
    fn progress(&self, _done: usize, _total: usize) {}
}

/// Everything a core call needs to cooperate with its host, passed by
/// reference into every loop that does per-item work.
#[derive(Clone)]
pub struct JobContext {
    pub cancel: CancelToken,
    events: Arc<dyn JobEvents>,
}

impl JobContext {
    pub fn new(cancel: CancelToken, events: Arc<dyn JobEvents>) -> Self {
        Self { cancel, events }
    }

    /// A context with no host attached, for library use and tests.
    pub fn detached() -> Self {
        Self::new(CancelToken::new(), Arc::new(NullEvents))
    }

    pub fn report_progress(&self, done: usize, total: usize) {
        self.events.progress(done, total);
    }
}

// ============================================
// File: crates/display-agent/src/scheduler.rs
// ============================================
//! # Deferred Action Scheduler
//!
//! ## Creation Reason
//! Request handlers must acknowledge a privileged command *before* the
//! host action runs, and the listener must stay responsive while the
//! action is pending. Deferral therefore lives in its own timer-driven
//! facility rather than inside the handler path.
//!
//! ## ⚠️ Important Note for Next Developer
//! - Pending actions are never cancelled on agent shutdown; once a
//!   caller has been acknowledged the restart must follow through.
//!   `detach_all` drops the handles without aborting the tasks.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

/// Schedules host actions to run after a fixed delay, off the
/// request-handling path.
#[derive(Clone, Default)]
pub struct ActionScheduler {
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl ActionScheduler {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `action` after `delay` on a detached timer task.
    pub fn defer<F>(&self, delay: Duration, action: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action.await;
        });

        let mut handles = self.handles.lock().expect("scheduler lock poisoned");
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Number of actions still pending.
    #[must_use]
    pub fn pending(&self) -> usize {
        let mut handles = self.handles.lock().expect("scheduler lock poisoned");
        handles.retain(|h| !h.is_finished());
        handles.len()
    }

    /// Releases all handles without aborting the underlying tasks.
    /// Called during agent shutdown; acknowledged actions still run.
    pub fn detach_all(&self) {
        let mut handles = self.handles.lock().expect("scheduler lock poisoned");
        let n = handles.len();
        handles.clear();
        if n > 0 {
            debug!(pending = n, "Detached pending deferred actions");
        }
    }
}

impl std::fmt::Debug for ActionScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}

// Single-slot deferred actions
//
// Every timer the engine owns lives in one of these slots. Scheduling into a
// slot always cancels whatever it held, so at most one task per slot exists.

use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// A cancellable, single-occupancy timer slot backed by a tokio task.
///
/// Dropping the slot aborts the pending task.
#[derive(Debug)]
pub struct DeferredSlot {
    name: &'static str,
    pending: Option<JoinHandle<()>>,
}

impl DeferredSlot {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            pending: None,
        }
    }

    /// Run `action` once after `delay`, replacing any previously scheduled action.
    ///
    /// The deadline is computed now, not when the task is first polled.
    pub fn schedule<F>(&mut self, runtime: &Handle, delay: Duration, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        let deadline = Instant::now() + delay;
        tracing::trace!(slot = self.name, ?delay, "Scheduling deferred action");
        self.pending = Some(runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            action();
        }));
    }

    /// Run `action` every `period`, first after one full period, until it
    /// returns `false` or the slot is cancelled.
    pub fn schedule_repeating<F>(&mut self, runtime: &Handle, period: Duration, mut action: F)
    where
        F: FnMut() -> bool + Send + 'static,
    {
        self.cancel();
        let start = Instant::now() + period;
        tracing::trace!(slot = self.name, ?period, "Scheduling repeating action");
        self.pending = Some(runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !action() {
                    break;
                }
            }
        }));
    }

    /// Abort the pending action. Returns whether one was still outstanding.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) => {
                let was_pending = !handle.is_finished();
                handle.abort();
                if was_pending {
                    tracing::trace!(slot = self.name, "Cancelled deferred action");
                }
                was_pending
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for DeferredSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}

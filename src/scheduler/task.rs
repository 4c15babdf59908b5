//! Cancellable delayed tasks.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Identifier of a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    /// Raw numeric value of the id.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Handle to a task created by [`TaskTimer::schedule`].
///
/// Dropping the handle does not cancel the task.
#[derive(Debug)]
pub struct TaskHandle {
    id: TaskId,
    cancelled: Arc<AtomicBool>,
    join: JoinHandle<()>,
}

impl TaskHandle {
    /// Task identifier.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Check whether the task ran to completion or was aborted.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

/// Spawns futures that start after a delay and can be cancelled.
///
/// A cancelled task never starts its body; a body already running is aborted
/// at its next await point.
#[derive(Debug)]
pub struct TaskTimer {
    runtime: Handle,
    next_id: u64,
}

impl TaskTimer {
    /// Create a timer that spawns onto `runtime`.
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            next_id: 0,
        }
    }

    /// Run `task` after `delay`.
    pub fn schedule<F>(&mut self, delay: Duration, task: F) -> TaskHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.next_id += 1;
        let id = TaskId(self.next_id);
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let join = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if flag.load(Ordering::Acquire) {
                return;
            }
            task.await;
        });
        TaskHandle {
            id,
            cancelled,
            join,
        }
    }

    /// Cancel a task. Returns false if it had already finished.
    pub fn cancel(&self, handle: TaskHandle) -> bool {
        handle.cancelled.store(true, Ordering::Release);
        let pending = !handle.join.is_finished();
        handle.join.abort();
        pending
    }
}

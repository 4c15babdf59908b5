//! Background worker computing fine passes off the control task.
//!
//! The worker talks to the scheduler only through messages: one request per
//! pass carrying every series, one reply with the finished result.

use std::sync::Arc;

use log::{debug, warn};
use tokio::runtime::Handle;
use tokio::sync::{Notify, mpsc, oneshot};

use crate::error::{PipelineError, Result};
use crate::render::{PassJob, RenderResult};

const QUEUE_DEPTH: usize = 8;

#[derive(Debug)]
struct WorkerRequest {
    job: PassJob,
    reply: oneshot::Sender<RenderResult>,
}

/// Handle to the render worker. Clones talk to the same worker.
#[derive(Debug, Clone)]
pub struct RenderWorker {
    requests: mpsc::Sender<WorkerRequest>,
    shutdown: Arc<Notify>,
}

impl RenderWorker {
    /// Start a worker on `runtime`.
    ///
    /// Passes run on the blocking pool so they never stall timers.
    pub fn spawn(runtime: &Handle) -> Self {
        let (requests, mut inbox) = mpsc::channel::<WorkerRequest>(QUEUE_DEPTH);
        let shutdown = Arc::new(Notify::new());
        let stop = Arc::clone(&shutdown);

        runtime.spawn(async move {
            loop {
                let request = tokio::select! {
                    biased;
                    _ = stop.notified() => break,
                    request = inbox.recv() => match request {
                        Some(request) => request,
                        None => break,
                    },
                };
                let WorkerRequest { job, reply } = request;
                let sequence = job.sequence();
                match tokio::task::spawn_blocking(move || job.run()).await {
                    Ok(result) => {
                        if reply.send(result).is_err() {
                            debug!("pass #{sequence} finished after its requester left");
                        }
                    }
                    Err(err) => warn!("pass #{sequence} failed on render worker: {err}"),
                }
            }
            debug!("render worker stopped");
        });

        Self { requests, shutdown }
    }

    /// Compute a pass on the worker.
    pub async fn submit(&self, job: PassJob) -> Result<RenderResult> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(WorkerRequest { job, reply })
            .await
            .map_err(|_| PipelineError::WorkerUnavailable)?;
        response
            .await
            .map_err(|err| PipelineError::WorkerFailed(err.to_string()))
    }

    /// Stop the worker. Later submissions fail.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    /// Check whether the worker has stopped accepting requests.
    pub fn is_closed(&self) -> bool {
        self.requests.is_closed()
    }
}

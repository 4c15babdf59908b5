//! Two-pass render scheduling.
//!
//! The coarse pass runs synchronously on the caller. The fine pass is
//! debounced: every view change cancels the pending timer and starts a new
//! one, so only the last request of a gesture is computed. Each fine request
//! carries a monotonic sequence number and results that are no longer the
//! latest are dropped before delivery.

mod task;
mod worker;

pub use task::{TaskHandle, TaskId, TaskTimer};
pub use worker::RenderWorker;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use log::{debug, trace, warn};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::config::WorkerMode;
use crate::metrics::RenderMetrics;
use crate::render::{PassJob, RenderResult};

/// State shared with a scheduled fine pass.
#[derive(Debug, Clone)]
struct FineContext {
    latest: Arc<AtomicU64>,
    worker: Option<RenderWorker>,
    results: mpsc::UnboundedSender<RenderResult>,
    metrics: RenderMetrics,
}

impl FineContext {
    async fn execute(self, job: PassJob) {
        let sequence = job.sequence();
        let result = match &self.worker {
            Some(worker) => match worker.submit(job.clone()).await {
                Ok(result) => result,
                Err(err) => {
                    warn!("{err}; computing pass #{sequence} inline");
                    self.metrics.record_fallback();
                    job.run()
                }
            },
            None => job.run(),
        };

        if self.latest.load(Ordering::Acquire) != sequence {
            debug!("discarding stale pass #{sequence}");
            self.metrics.record_stale();
            return;
        }
        self.metrics.reset_points();
        self.metrics.add_points(result.point_count);
        self.metrics.record_fine_pass();
        if self.results.send(result).is_err() {
            debug!("fine pass #{sequence} has no receiver");
        }
    }
}

/// Owns the debounce timer, the worker and in-flight request state.
#[derive(Debug)]
pub struct RenderScheduler {
    timer: TaskTimer,
    debounce: Duration,
    latest: Arc<AtomicU64>,
    coarse_sequence: u64,
    pending: Option<TaskHandle>,
    worker: Option<RenderWorker>,
    results: mpsc::UnboundedSender<RenderResult>,
    metrics: RenderMetrics,
}

impl RenderScheduler {
    /// Create a scheduler bound to `runtime`.
    ///
    /// Fine results are delivered on the returned receiver.
    pub fn new(
        runtime: Handle,
        debounce: Duration,
        mode: WorkerMode,
        metrics: RenderMetrics,
    ) -> (Self, mpsc::UnboundedReceiver<RenderResult>) {
        let (results, receiver) = mpsc::unbounded_channel();
        let worker = match mode {
            WorkerMode::Inline => None,
            WorkerMode::Background => Some(RenderWorker::spawn(&runtime)),
        };
        let scheduler = Self {
            timer: TaskTimer::new(runtime),
            debounce,
            latest: Arc::new(AtomicU64::new(0)),
            coarse_sequence: 0,
            pending: None,
            worker,
            results,
            metrics,
        };
        (scheduler, receiver)
    }

    /// Issue the next fine sequence number. Older ones become stale.
    pub fn next_sequence(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Latest fine sequence number issued.
    pub fn latest_sequence(&self) -> u64 {
        self.latest.load(Ordering::Acquire)
    }

    /// Issue the next coarse sequence number.
    pub fn next_coarse_sequence(&mut self) -> u64 {
        self.coarse_sequence += 1;
        self.coarse_sequence
    }

    /// Compute a coarse pass on the caller.
    pub fn run_coarse(&self, job: &PassJob) -> RenderResult {
        job.run()
    }

    /// Debounce a fine pass, replacing any pending one.
    pub fn schedule_fine(&mut self, job: PassJob) -> TaskId {
        self.cancel_pending();
        let context = FineContext {
            latest: Arc::clone(&self.latest),
            worker: self.worker.clone(),
            results: self.results.clone(),
            metrics: self.metrics.clone(),
        };
        trace!(
            "scheduling fine pass #{} in {:?}",
            job.sequence(),
            self.debounce
        );
        let handle = self
            .timer
            .schedule(self.debounce, async move { context.execute(job).await });
        let id = handle.id();
        self.pending = Some(handle);
        id
    }

    /// Cancel the pending fine pass. Returns true if one was still pending.
    pub fn cancel_pending(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) => {
                let id = handle.id();
                let cancelled = self.timer.cancel(handle);
                if cancelled {
                    trace!("cancelled fine task {}", id.get());
                }
                cancelled
            }
            None => false,
        }
    }

    /// Check whether a fine pass is waiting or running.
    pub fn has_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Clear the point count for a new settle cycle.
    pub fn reset_metrics(&self) {
        self.metrics.reset_points();
    }

    /// Shared counters.
    pub fn metrics(&self) -> &RenderMetrics {
        &self.metrics
    }

    /// Debounce interval.
    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Stop the background worker. Later fine passes run inline.
    pub fn shutdown_worker(&self) {
        if let Some(worker) = &self.worker {
            worker.shutdown();
        }
    }
}

impl Drop for RenderScheduler {
    fn drop(&mut self) {
        self.cancel_pending();
        self.shutdown_worker();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::datasource::{Aggregation, Series, SeriesStore};
    use crate::geom::ChannelBand;
    use crate::lod::LodCache;
    use crate::render::{PassKind, PassSettings, plan_pass};
    use crate::simplify::Simplifier;
    use crate::transform::Transform;
    use crate::view::Range;

    pub(crate) fn sample_job(sequence: u64) -> PassJob {
        let mut store = SeriesStore::new();
        let id = store.insert(Series::from_values(
            "wave",
            (0..4000).map(|i| (i as f64 * 0.05).sin()).collect::<Vec<_>>(),
        ));
        let world = Range::new(0.0, 400.0);
        let mut cache = LodCache::new(world.span());
        let view = Range::new(100.0, 200.0);
        let settings = PassSettings {
            world,
            buffer_frac: 0.2,
            aggregation: Aggregation::Max,
            simplifier: Simplifier::default(),
            debug: false,
        };
        plan_pass(
            PassKind::Fine,
            sequence,
            view,
            Transform::for_valid(view, 200.0),
            200,
            &settings,
            &[(id, ChannelBand::new(0.0, 100.0))],
            &store,
            &mut cache,
        )
        .expect("series is in the store")
    }

    fn scheduler(mode: WorkerMode, debounce: Duration) -> (RenderScheduler, mpsc::UnboundedReceiver<RenderResult>) {
        RenderScheduler::new(Handle::current(), debounce, mode, RenderMetrics::new())
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_keeps_only_latest_pass() {
        let (mut scheduler, mut results) = scheduler(WorkerMode::Inline, Duration::from_millis(100));
        let first = scheduler.next_sequence();
        scheduler.schedule_fine(sample_job(first));
        tokio::time::sleep(Duration::from_millis(40)).await;
        let second = scheduler.next_sequence();
        scheduler.schedule_fine(sample_job(second));
        assert!(scheduler.has_pending());

        tokio::time::sleep(Duration::from_millis(200)).await;
        let result = results.try_recv().expect("fine pass delivered");
        assert_eq!(result.sequence, second);
        assert!(results.try_recv().is_err());
        assert_eq!(scheduler.metrics().fine_passes(), 1);
        assert_eq!(scheduler.metrics().points(), result.point_count);
        assert!(!scheduler.has_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_result_is_discarded() {
        let (mut scheduler, mut results) = scheduler(WorkerMode::Inline, Duration::from_millis(100));
        let sequence = scheduler.next_sequence();
        scheduler.schedule_fine(sample_job(sequence));
        scheduler.next_sequence();

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(results.try_recv().is_err());
        assert_eq!(scheduler.metrics().stale_discards(), 1);
        assert_eq!(scheduler.metrics().fine_passes(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_pending_stops_delivery() {
        let (mut scheduler, mut results) = scheduler(WorkerMode::Inline, Duration::from_millis(100));
        let sequence = scheduler.next_sequence();
        scheduler.schedule_fine(sample_job(sequence));
        assert!(scheduler.cancel_pending());
        assert!(!scheduler.cancel_pending());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(results.try_recv().is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn background_pass_is_delivered() {
        let (mut scheduler, mut results) = scheduler(WorkerMode::Background, Duration::from_millis(5));
        let sequence = scheduler.next_sequence();
        let job = sample_job(sequence);
        let expected = job.run();
        scheduler.schedule_fine(job);

        let result = tokio::time::timeout(Duration::from_secs(5), results.recv())
            .await
            .expect("fine pass in time")
            .expect("channel open");
        assert_eq!(result, expected);
        assert_eq!(scheduler.metrics().fallbacks(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stopped_worker_falls_back_inline() {
        let (mut scheduler, mut results) = scheduler(WorkerMode::Background, Duration::from_millis(5));
        scheduler.shutdown_worker();
        let sequence = scheduler.next_sequence();
        scheduler.schedule_fine(sample_job(sequence));

        let result = tokio::time::timeout(Duration::from_secs(5), results.recv())
            .await
            .expect("fine pass in time")
            .expect("channel open");
        assert_eq!(result.sequence, sequence);
        assert_eq!(scheduler.metrics().fallbacks(), 1);
    }
}

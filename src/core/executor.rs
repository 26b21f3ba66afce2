// executor.rs - Bounded worker pool driving the rate estimator over pair tasks

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::Serialize;

use crate::core::aggregate::ResultAggregator;
use crate::core::pairs::{PairEnumerator, PairTask};
use crate::data::GroupIndex;
use crate::error::{DndsError, RateError};
use crate::estimators::{RateEstimator, SubstitutionRates};

/// Default worker count: all cores but one, at least one.
pub fn default_threads() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}

#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub threads: usize,
    /// Bounded queue capacity; submission blocks when full
    pub queue_capacity: usize,
    /// Extra attempts for transient estimator failures
    pub max_retries: u32,
    pub show_progress: bool,
}

impl ExecutorConfig {
    pub fn new(threads: usize) -> Self {
        let threads = threads.max(1);
        Self {
            threads,
            queue_capacity: 4 * threads,
            max_retries: 1,
            show_progress: true,
        }
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self::new(default_threads())
    }
}

/// Cooperative stop signal shared by the submitter and the workers. A child
/// token also reports cancellation of its parent, but cancelling the child
/// leaves the parent untouched.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
    parent: Option<Arc<CancellationToken>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn child(&self) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            parent: Some(Arc::new(self.clone())),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
            || self.parent.as_ref().is_some_and(|p| p.is_cancelled())
    }

    /// Cancel from a background thread once `limit` has elapsed. Dropping the
    /// returned [`Deadline`] disarms the watcher.
    pub fn cancel_after(&self, limit: Duration) -> Deadline {
        let (disarm, rx) = bounded::<()>(0);
        let token = self.clone();
        thread::spawn(move || {
            if let Err(RecvTimeoutError::Timeout) = rx.recv_timeout(limit) {
                if !token.is_cancelled() {
                    warn!("Run time limit of {:?} reached, cancelling remaining comparisons", limit);
                    token.cancel();
                }
            }
        });
        Deadline { _disarm: disarm }
    }
}

/// Armed run-time limit; see [`CancellationToken::cancel_after`].
#[must_use = "dropping a Deadline disarms it"]
#[derive(Debug)]
pub struct Deadline {
    _disarm: Sender<()>,
}

/// Outcome of one comparison
#[derive(Debug, Clone)]
pub struct PairResult {
    pub task: PairTask,
    pub outcome: Result<SubstitutionRates, RateError>,
    pub attempts: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionStats {
    pub total_tasks: u64,
    pub succeeded: u64,
    pub failed: u64,
    /// Tasks never evaluated because of cancellation
    pub skipped: u64,
    /// Extra attempts spent on transient failures
    pub retries: u64,
    pub cancelled: bool,
    pub threads: usize,
    pub elapsed_secs: f64,
}

impl ExecutionStats {
    pub fn completed(&self) -> u64 {
        self.succeeded + self.failed
    }
}

pub struct ComparisonExecutor {
    config: ExecutorConfig,
}

impl ComparisonExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Evaluate one task, retrying transient failures up to `max_retries`.
    pub fn evaluate(&self, index: &GroupIndex, task: PairTask, estimator: &dyn RateEstimator) -> PairResult {
        let seq1 = &index.record(task.first).sequence;
        let seq2 = &index.record(task.second).sequence;

        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match estimator.estimate(seq1, seq2) {
                Err(e) if e.is_transient() && attempts <= self.config.max_retries => {
                    debug!(
                        "Retrying {} vs {} after transient failure: {}",
                        index.record(task.first).id,
                        index.record(task.second).id,
                        e
                    );
                }
                outcome => {
                    return PairResult {
                        task,
                        outcome,
                        attempts,
                    }
                }
            }
        }
    }

    /// Run every task of the enumerator on a dedicated pool. The calling
    /// thread feeds the bounded queue; workers evaluate and record into a
    /// shared aggregator.
    pub fn run(
        &self,
        enumerator: &PairEnumerator<'_>,
        estimator: &dyn RateEstimator,
        cancel: &CancellationToken,
    ) -> Result<(ResultAggregator, ExecutionStats), DndsError> {
        let index = enumerator.index();
        let total = enumerator.count();
        let threads = self.config.threads.max(1);
        let start = Instant::now();

        info!(
            "Evaluating {} comparisons with {} on {} threads",
            total,
            estimator.name(),
            threads
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("dnds-worker-{}", i))
            .build()?;

        let pb = self.progress_bar(total);
        let aggregator = Mutex::new(ResultAggregator::new());
        let succeeded = AtomicU64::new(0);
        let failed = AtomicU64::new(0);
        let retries = AtomicU64::new(0);

        let (tx, rx) = bounded::<PairTask>(self.config.queue_capacity.max(1));

        pool.in_place_scope(|scope| {
            for _ in 0..threads {
                let rx = rx.clone();
                let worker = Worker {
                    executor: self,
                    index,
                    estimator,
                    cancel,
                    aggregator: &aggregator,
                    succeeded: &succeeded,
                    failed: &failed,
                    retries: &retries,
                    pb: &pb,
                };
                scope.spawn(move |_| worker.drain(rx));
            }
            drop(rx);

            for task in enumerator.tasks() {
                if cancel.is_cancelled() {
                    break;
                }
                if tx.send(task).is_err() {
                    break;
                }
            }
            drop(tx);
        });

        let stats = ExecutionStats {
            total_tasks: total,
            succeeded: succeeded.into_inner(),
            failed: failed.into_inner(),
            skipped: 0,
            retries: retries.into_inner(),
            cancelled: cancel.is_cancelled(),
            threads,
            elapsed_secs: start.elapsed().as_secs_f64(),
        };
        let stats = ExecutionStats {
            skipped: total.saturating_sub(stats.completed()),
            ..stats
        };

        if stats.cancelled {
            pb.abandon_with_message("cancelled");
            warn!(
                "Cancelled: {} of {} comparisons skipped",
                stats.skipped, stats.total_tasks
            );
        } else {
            pb.finish_with_message("✅ Comparisons completed!");
        }
        info!(
            "Comparisons: {} succeeded, {} failed, {} skipped in {:.2}s",
            stats.succeeded, stats.failed, stats.skipped, stats.elapsed_secs
        );

        Ok((aggregator.into_inner(), stats))
    }

    fn progress_bar(&self, total: u64) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {per_sec} ETA: {eta}",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}

/// Per-thread view of the shared run state.
struct Worker<'a> {
    executor: &'a ComparisonExecutor,
    index: &'a GroupIndex,
    estimator: &'a dyn RateEstimator,
    cancel: &'a CancellationToken,
    aggregator: &'a Mutex<ResultAggregator>,
    succeeded: &'a AtomicU64,
    failed: &'a AtomicU64,
    retries: &'a AtomicU64,
    pb: &'a ProgressBar,
}

impl Worker<'_> {
    fn drain(&self, rx: Receiver<PairTask>) {
        for task in rx.iter() {
            if self.cancel.is_cancelled() {
                // Discard queued work; counted as skipped by the caller
                continue;
            }

            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                self.executor.evaluate(self.index, task, self.estimator)
            }))
            .unwrap_or_else(|payload| PairResult {
                task,
                outcome: Err(RateError::Panicked(panic_message(payload.as_ref()))),
                attempts: 1,
            });
            self.retries
                .fetch_add(u64::from(result.attempts.saturating_sub(1)), Ordering::Relaxed);
            match &result.outcome {
                Ok(_) => {
                    self.succeeded.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    debug!(
                        "Comparison {} vs {} failed after {} attempt(s): {}",
                        self.index.record(task.first).id,
                        self.index.record(task.second).id,
                        result.attempts,
                        e
                    );
                    self.failed.fetch_add(1, Ordering::Relaxed);
                }
            }

            self.aggregator.lock().record(&result);
            self.pb.inc(1);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

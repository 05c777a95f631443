//! Fixed-size worker pool for blocking jobs.
//!
//! Jobs sit in a shared queue. A fixed number of blocking workers pop jobs
//! until the queue is empty or the cancel flag is raised. The first failing
//! job raises the flag; so does the deadline. Workers check the flag between
//! jobs, so at most one in-flight job per worker finishes after cancellation.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt::{Debug, Display};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// A unit of blocking work.
pub type Job<E> = Box<dyn FnOnce() -> Result<(), E> + Send + 'static>;

/// Why a pool run stopped early.
#[derive(Debug, Error)]
pub enum PoolError<E: Debug + Display> {
    /// A job returned an error; remaining jobs were cancelled.
    #[error("Job failed: {0}")]
    Job(E),

    /// The deadline passed before every job finished.
    #[error("Deadline of {0:?} exceeded")]
    Timeout(Duration),

    /// A worker thread panicked.
    #[error("Worker panicked: {0}")]
    WorkerPanicked(String),
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSummary {
    /// Jobs that completed.
    pub completed: usize,
    /// Workers spawned for the run.
    pub workers: usize,
}

/// Bounded pool of blocking workers.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    workers: usize,
    deadline: Duration,
}

impl WorkerPool {
    /// Pool with `workers` workers (at least one) and a global deadline.
    pub fn new(workers: usize, deadline: Duration) -> Self {
        Self {
            workers: workers.max(1),
            deadline,
        }
    }

    /// Number of blocking workers per run.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Time allowed for one run.
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Run every job, returning once all succeed, one fails, or the deadline
    /// passes.
    pub async fn run_all<E>(&self, jobs: Vec<Job<E>>) -> Result<PoolSummary, PoolError<E>>
    where
        E: Debug + Display + Send + 'static,
    {
        let total = jobs.len();
        let workers = self.workers.min(total);
        if total == 0 {
            return Ok(PoolSummary {
                completed: 0,
                workers: 0,
            });
        }

        let started = Instant::now();
        let queue = Arc::new(Mutex::new(VecDeque::from(jobs)));
        let cancelled = Arc::new(AtomicBool::new(false));
        let mut set = JoinSet::new();

        for _ in 0..workers {
            let queue = Arc::clone(&queue);
            let cancelled = Arc::clone(&cancelled);
            set.spawn_blocking(move || -> Result<usize, E> {
                let mut done = 0;
                loop {
                    if cancelled.load(Ordering::Acquire) {
                        return Ok(done);
                    }
                    let Some(job) = queue.lock().pop_front() else {
                        return Ok(done);
                    };
                    if let Err(e) = job() {
                        cancelled.store(true, Ordering::Release);
                        return Err(e);
                    }
                    done += 1;
                }
            });
        }

        let drain = async {
            let mut completed = 0;
            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok(Ok(done)) => completed += done,
                    Ok(Err(e)) => return Err(PoolError::Job(e)),
                    Err(join_err) => return Err(PoolError::WorkerPanicked(join_err.to_string())),
                }
            }
            Ok(completed)
        };

        let result = match tokio::time::timeout(self.deadline, drain).await {
            Ok(result) => result,
            Err(_) => Err(PoolError::Timeout(self.deadline)),
        };

        match result {
            Ok(completed) => {
                debug!(
                    jobs = total,
                    workers,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Worker pool run complete"
                );
                Ok(PoolSummary { completed, workers })
            }
            Err(e) => {
                cancelled.store(true, Ordering::Release);
                let abandoned = {
                    let mut queue = queue.lock();
                    let n = queue.len();
                    queue.clear();
                    n
                };
                warn!(jobs = total, abandoned, error = %e, "Worker pool run cancelled");
                Err(e)
            }
        }
    }
}

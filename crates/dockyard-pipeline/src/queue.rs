use std::sync::Arc;

use async_trait::async_trait;
use dockyard_core::BuildJob;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;

use crate::orchestrator::Orchestrator;

/// Executes a dequeued job to completion.
#[async_trait]
pub trait JobRunner: Send + Sync {
    async fn run_job(&self, job: BuildJob);
}

#[async_trait]
impl JobRunner for Orchestrator {
    async fn run_job(&self, job: BuildJob) {
        let build_id = job.build_id.clone();
        match self.run(job).await {
            Ok(outcome) => {
                tracing::info!(build_id = %build_id, status = %outcome.status, "build finished")
            }
            Err(e) => tracing::error!(build_id = %build_id, error = %e, "build could not start"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("build queue is closed; job {build_id} was not accepted")]
pub struct QueueClosed {
    pub build_id: String,
}

/// Producer side of the job queue. Cloning yields another producer.
#[derive(Debug, Clone)]
pub struct BuildQueue {
    sender: mpsc::Sender<BuildJob>,
}

impl BuildQueue {
    /// A queue buffering up to `capacity` jobs, and the receiver a
    /// [`WorkerPool`] drains.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<BuildJob>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Hand a job to the workers, waiting while the queue is full.
    pub async fn enqueue(&self, job: BuildJob) -> Result<(), QueueClosed> {
        tracing::debug!(build_id = %job.build_id, "job queued");
        self.sender.send(job).await.map_err(|e| QueueClosed {
            build_id: e.0.build_id,
        })
    }
}

/// Runs queued jobs, each on its own task, at most `concurrency` at a time.
///
/// Every job is handed to exactly one worker. A slow build never holds up
/// the jobs behind it beyond the concurrency limit.
pub struct WorkerPool {
    runner: Arc<dyn JobRunner>,
    concurrency: usize,
}

impl WorkerPool {
    pub fn new(runner: Arc<dyn JobRunner>, concurrency: usize) -> Self {
        Self {
            runner,
            concurrency: concurrency.max(1),
        }
    }

    /// Drain `receiver` until every producer is gone and all started jobs
    /// have finished. Returns the number of jobs run.
    pub async fn run(&self, mut receiver: mpsc::Receiver<BuildJob>) -> usize {
        let slots = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        let mut started = 0;

        loop {
            let Ok(permit) = Arc::clone(&slots).acquire_owned().await else {
                break;
            };
            let Some(job) = receiver.recv().await else {
                break;
            };

            started += 1;
            let runner = Arc::clone(&self.runner);
            tasks.spawn(async move {
                let _permit = permit;
                runner.run_job(job).await;
            });

            while let Some(joined) = tasks.try_join_next() {
                log_join(joined);
            }
        }

        while let Some(joined) = tasks.join_next().await {
            log_join(joined);
        }
        tracing::info!(jobs = started, "worker pool drained");
        started
    }
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        tracing::error!(error = %e, "build task panicked");
    }
}

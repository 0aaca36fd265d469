use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use dockyard_core::{BuildJob, DockyardConfig};
use dockyard_pipeline::{
    BuildQueue, BuildStore, JobRunner, MemoryStore, WorkerPool, reap_stale_builds,
};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Bounds of the pause between two stale-build sweeps.
const MIN_REAP_INTERVAL: Duration = Duration::from_secs(1);
const MAX_REAP_INTERVAL: Duration = Duration::from_secs(60);

/// Feed jobs from stdin (one JSON object per line) to a worker pool until
/// stdin closes or Ctrl-C, then wait for the started builds.
pub async fn worker(config_dir: &Path) -> anyhow::Result<()> {
    let config = DockyardConfig::load(config_dir)?;
    let store: Arc<dyn BuildStore> = Arc::new(MemoryStore::new());
    let orchestrator = super::orchestrator(&config, Arc::clone(&store));
    let in_flight = orchestrator.in_flight().clone();
    let runner: Arc<dyn JobRunner> = Arc::new(orchestrator);

    let (queue, receiver) = BuildQueue::new(config.worker.queue_capacity);
    let pool = WorkerPool::new(runner, config.worker.concurrency);
    let workers = tokio::spawn(async move { pool.run(receiver).await });

    let max_age = config.worker.stale_build_after();
    let reaper = {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(max_age.clamp(MIN_REAP_INTERVAL, MAX_REAP_INTERVAL));
            loop {
                tick.tick().await;
                match reap_stale_builds(store.as_ref(), &in_flight, max_age, chrono::Utc::now()).await {
                    Ok(reaped) if !reaped.is_empty() => {
                        tracing::warn!(count = reaped.len(), "failed stale builds")
                    }
                    Ok(_) => {}
                    Err(e) => tracing::error!(error = %e, "stale build sweep failed"),
                }
            }
        })
    };

    tracing::info!(
        concurrency = config.worker.concurrency,
        queue_capacity = config.worker.queue_capacity,
        "worker started; reading jobs from stdin"
    );
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted; finishing started builds");
                None
            }
        };
        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        match BuildJob::from_json(&line) {
            Ok(job) => queue.enqueue(job).await?,
            Err(e) => tracing::warn!(error = %e, "skipping malformed job"),
        }
    }
    drop(queue);

    let processed = workers.await?;
    reaper.abort();
    println!("Processed {processed} job(s).");
    Ok(())
}

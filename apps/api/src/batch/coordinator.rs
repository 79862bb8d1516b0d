//! Batch fan-out. One pipeline task per job, all rendering through a single
//! engine instance that the coordinator launches and closes.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::batch::{BatchConfig, BatchJob, BatchResult, JobOutcome};
use crate::pipeline::{run_job, PipelineDeps, RenderTarget};
use crate::render::{EngineLauncher, RenderPool};

pub struct BatchCoordinator {
    deps: Arc<PipelineDeps>,
    launcher: Arc<dyn EngineLauncher>,
    render_timeout: Duration,
    /// Ceiling on jobs in flight per batch. 0 means unbounded.
    max_concurrent_jobs: usize,
}

impl BatchCoordinator {
    pub fn new(
        deps: PipelineDeps,
        launcher: Arc<dyn EngineLauncher>,
        render_timeout: Duration,
        max_concurrent_jobs: usize,
    ) -> Self {
        Self {
            deps: Arc::new(deps),
            launcher,
            render_timeout,
            max_concurrent_jobs,
        }
    }

    /// Runs every job to a terminal outcome. Results keep the input order.
    /// One job's failure, including a panic, never affects its siblings.
    ///
    /// The batch body runs on its own task, so dropping this future (a
    /// client disconnect) leaves the jobs running and the shared engine is
    /// still closed once they finish.
    pub async fn run_batch(&self, jobs: Vec<BatchJob>, config: BatchConfig) -> BatchResult {
        if jobs.is_empty() {
            return BatchResult::from_outcomes(Vec::new());
        }

        let job_ids: Vec<Uuid> = jobs.iter().map(|job| job.job.id).collect();
        let batch = tokio::spawn(drive_batch(
            Arc::clone(&self.deps),
            Arc::clone(&self.launcher),
            self.render_timeout,
            self.max_concurrent_jobs,
            jobs,
            config,
        ));

        batch.await.unwrap_or_else(|e| {
            error!("Batch task aborted: {e}");
            BatchResult::from_outcomes(
                job_ids
                    .into_iter()
                    .map(|job_id| JobOutcome::failed(job_id, format!("job task aborted: {e}")))
                    .collect(),
            )
        })
    }

    /// Runs a single job on its own engine instance.
    pub async fn run_single(&self, job: BatchJob, config: BatchConfig) -> JobOutcome {
        let job_id = job.job.id;
        let deps = Arc::clone(&self.deps);
        let launcher = Arc::clone(&self.launcher);
        let render_timeout = self.render_timeout;

        tokio::spawn(async move {
            let target = RenderTarget::Owned {
                launcher: launcher.as_ref(),
                render_timeout,
            };
            run_job(&deps, target, &config, job).await
        })
        .await
        .unwrap_or_else(|e| {
            error!(job_id = %job_id, "Job task aborted: {e}");
            JobOutcome::failed(job_id, format!("job task aborted: {e}"))
        })
    }
}

async fn drive_batch(
    deps: Arc<PipelineDeps>,
    launcher: Arc<dyn EngineLauncher>,
    render_timeout: Duration,
    max_concurrent_jobs: usize,
    jobs: Vec<BatchJob>,
    config: BatchConfig,
) -> BatchResult {
    let engine = match launcher.launch().await {
        Ok(engine) => Some(engine),
        Err(e) => {
            // Jobs still run, each on a private engine, so the launch
            // failure is reported per job.
            error!("Failed to launch shared rendering engine: {e}");
            None
        }
    };
    let pool = engine
        .clone()
        .map(|engine| Arc::new(RenderPool::shared(engine, render_timeout)));

    let permits = (max_concurrent_jobs > 0).then(|| Arc::new(Semaphore::new(max_concurrent_jobs)));
    let config = Arc::new(config);

    info!(
        "Starting batch of {} jobs (max concurrent: {})",
        jobs.len(),
        if max_concurrent_jobs == 0 {
            "unbounded".to_string()
        } else {
            max_concurrent_jobs.to_string()
        }
    );

    let (job_ids, handles): (Vec<Uuid>, Vec<JoinHandle<JobOutcome>>) = jobs
        .into_iter()
        .map(|job| {
            let job_id = job.job.id;
            let deps = Arc::clone(&deps);
            let launcher = Arc::clone(&launcher);
            let pool = pool.clone();
            let permits = permits.clone();
            let config = Arc::clone(&config);

            let handle = tokio::spawn(async move {
                let _permit = match permits {
                    Some(permits) => permits.acquire_owned().await.ok(),
                    None => None,
                };
                let target = match pool.as_deref() {
                    Some(pool) => RenderTarget::Shared(pool),
                    None => RenderTarget::Owned {
                        launcher: launcher.as_ref(),
                        render_timeout,
                    },
                };
                run_job(&deps, target, &config, job).await
            });
            (job_id, handle)
        })
        .unzip();

    let outcomes: Vec<JobOutcome> = job_ids
        .into_iter()
        .zip(join_all(handles).await)
        .map(|(job_id, joined)| {
            joined.unwrap_or_else(|e| {
                error!(job_id = %job_id, "Job task aborted: {e}");
                JobOutcome::failed(job_id, format!("job task aborted: {e}"))
            })
        })
        .collect();

    if let Some(pool) = pool {
        let stats = pool.stats();
        if stats.opened != stats.released {
            warn!(
                "Render contexts still open after batch: opened={}, released={}",
                stats.opened, stats.released
            );
        } else {
            info!("Render contexts used: {}", stats.opened);
        }
    }
    if let Some(engine) = engine {
        if let Err(e) = engine.close().await {
            error!("Failed to close shared rendering engine: {e}");
        }
    }

    let result = BatchResult::from_outcomes(outcomes);
    info!(
        "Batch finished: total={}, succeeded={}, failed={}",
        result.total, result.succeeded, result.failed
    );
    result
}

use std::time::Duration;

use chrono::{Datelike, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::artifact::{artifact_filename, persist, validate, JobStore, PersistFieldError};
use crate::document::{assemble, DocumentModel};
use crate::models::batch::{BatchConfig, BatchJob, JobOutcome, RecordSkip};
use crate::models::job::{sort_most_recent_first, JobField};
use crate::pipeline::analyze::JobAnalysis;
use crate::pipeline::optimize::{optimize_records, partition};
use crate::pipeline::{JobStage, PipelineDeps, PipelineError};
use crate::render::{EngineLauncher, PageConfig, RenderError, RenderPool, RenderedArtifact};

/// Where a job's document gets rendered.
pub enum RenderTarget<'a> {
    /// A context borrowed from a batch-wide engine.
    Shared(&'a RenderPool),
    /// A private engine launched for this job and closed when it finishes.
    Owned {
        launcher: &'a dyn EngineLauncher,
        render_timeout: Duration,
    },
}

impl RenderTarget<'_> {
    async fn render(
        &self,
        doc: &DocumentModel,
        page: &PageConfig,
    ) -> Result<RenderedArtifact, RenderError> {
        match self {
            RenderTarget::Shared(pool) => pool.render(doc, page).await,
            RenderTarget::Owned {
                launcher,
                render_timeout,
            } => RenderPool::render_owned(*launcher, *render_timeout, doc, page).await,
        }
    }
}

struct Delivered {
    url: String,
    filename: String,
    size_mib: f64,
}

/// Mutable progress of one job run: current stage plus the non-fatal
/// findings that are reported whatever the outcome.
struct JobRun {
    job_id: Uuid,
    stage: JobStage,
    skipped: Vec<RecordSkip>,
    warnings: Vec<String>,
}

impl JobRun {
    fn new(job_id: Uuid) -> Self {
        Self {
            job_id,
            stage: JobStage::Pending,
            skipped: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn advance(&mut self, next: JobStage) {
        info!(job_id = %self.job_id, "job stage {} -> {}", self.stage, next);
        self.stage = next;
    }

    fn warn_fields(&mut self, errors: Vec<PersistFieldError>) {
        self.warnings.extend(errors.iter().map(ToString::to_string));
    }
}

/// Runs one job to a terminal outcome. Never returns an error: every
/// job-fatal failure becomes a failed `JobOutcome` carrying its reason.
pub async fn run_job(
    deps: &PipelineDeps,
    target: RenderTarget<'_>,
    config: &BatchConfig,
    batch_job: BatchJob,
) -> JobOutcome {
    let mut run = JobRun::new(batch_job.job.id);

    match execute(deps, &target, config, batch_job, &mut run).await {
        Ok(delivered) => {
            run.advance(JobStage::Succeeded);
            JobOutcome {
                job_id: run.job_id,
                success: true,
                artifact_url: Some(delivered.url),
                filename: Some(delivered.filename),
                file_size: Some(format!("{:.2}MB", delivered.size_mib)),
                error: None,
                skipped_records: run.skipped,
                warnings: run.warnings,
            }
        }
        Err(e) => {
            error!(job_id = %run.job_id, stage = %run.stage, "job failed: {e}");
            run.advance(JobStage::Failed);
            JobOutcome {
                skipped_records: run.skipped,
                warnings: run.warnings,
                ..JobOutcome::failed(run.job_id, e.to_string())
            }
        }
    }
}

async fn execute(
    deps: &PipelineDeps,
    target: &RenderTarget<'_>,
    config: &BatchConfig,
    batch_job: BatchJob,
    run: &mut JobRun,
) -> Result<Delivered, PipelineError> {
    let BatchJob {
        job,
        source_records: mut records,
    } = batch_job;

    run.advance(JobStage::Analyzing);
    let analysis = deps.analyzer.analyze(&job).await?;
    let errors = store_analysis(deps.jobs.as_ref(), job.id, &analysis).await;
    run.warn_fields(errors);

    run.advance(JobStage::Optimizing);
    sort_most_recent_first(&mut records, Utc::now().year());
    let results = optimize_records(deps.rewriter.as_ref(), job.id, &records, &analysis.keywords).await;
    let (optimized, skipped) = partition(results);
    run.skipped = skipped;

    run.advance(JobStage::Assembling);
    let doc = assemble(config, &records, &optimized)?;

    run.advance(JobStage::Rendering);
    let page = config.page();
    let artifact = target.render(&doc, &page).await?;

    run.advance(JobStage::Validating);
    let size_mib = validate(&artifact)?;

    run.advance(JobStage::Persisting);
    let filename = artifact_filename(&config.personal_info.full_name, job.id, Utc::now());
    let persisted = persist(
        deps.objects.as_ref(),
        deps.jobs.as_ref(),
        job.id,
        &filename,
        artifact.bytes,
    )
    .await?;
    run.warn_fields(persisted.field_errors);

    Ok(Delivered {
        url: persisted.url,
        filename,
        size_mib,
    })
}

/// Writes the derived analysis fields back to the job. Independent and
/// non-fatal, like the artifact pointer.
async fn store_analysis(
    jobs: &dyn JobStore,
    job_id: Uuid,
    analysis: &JobAnalysis,
) -> Vec<PersistFieldError> {
    let sentences = JobField::KeySentences(analysis.key_sentences.clone());
    let keywords = JobField::Keywords(analysis.keywords.clone());
    let columns = [sentences.column(), keywords.column()];

    let (a, b) = tokio::join!(
        jobs.update_field(job_id, sentences),
        jobs.update_field(job_id, keywords),
    );

    columns
        .into_iter()
        .zip([a, b])
        .filter_map(|(column, result)| {
            result.err().map(|e| PersistFieldError {
                column,
                message: e.to_string(),
            })
        })
        .inspect(|e| warn!(job_id = %job_id, "{e}"))
        .collect()
}

//! Long operations run on tokio's blocking pool.
//!
//! Each `schedule_*` function registers a `Pending` job, spawns the work with
//! `spawn_blocking` and returns immediately with a [`JobHandle`]. Workers take
//! the engine lock with `blocking_read`/`blocking_write`, report progress as
//! a percentage and check the cancellation flag right before their first
//! file write. The final status is one of `Completed`, `Failed` or
//! `Cancelled`.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use common::jobs::JobStatus;
use common::model::template::TemplateCategory;
use log::{info, warn};
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use super::state::{JobHandle, JobUpdate, JobsState};
use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};
use crate::export::{self, ExportFormat, PageRenderer};
use crate::sources::TextExtractor;

/// The engine as shared with background jobs.
pub type SharedEngine = Arc<RwLock<Engine>>;

struct JobContext {
    job_id: String,
    tx: mpsc::Sender<JobUpdate>,
    cancel: Arc<AtomicBool>,
}

impl JobContext {
    fn progress(&self, percent: u32) {
        let _ = self.tx.blocking_send(JobUpdate {
            job_id: self.job_id.clone(),
            status: JobStatus::InProgress(percent),
        });
    }

    /// Last point at which a job can still be abandoned.
    fn checkpoint(&self) -> EngineResult<()> {
        if self.cancel.load(Ordering::SeqCst) {
            return Err(EngineError::Cancelled);
        }
        Ok(())
    }
}

async fn schedule<F>(jobs: &JobsState, label: &'static str, work: F) -> JobHandle
where
    F: FnOnce(&JobContext) -> EngineResult<String> + Send + 'static,
{
    let handle = JobHandle::new(Uuid::new_v4().to_string());
    jobs.set(&handle.job_id, JobStatus::Pending).await;
    info!("Job {} scheduled: {}", handle.job_id, label);

    let ctx = JobContext {
        job_id: handle.job_id.clone(),
        tx: jobs.tx.clone(),
        cancel: handle.flag(),
    };
    let js = jobs.clone();
    let job_id = handle.job_id.clone();

    tokio::spawn(async move {
        let result = tokio::task::spawn_blocking(move || work(&ctx)).await;
        let status = match result {
            Ok(Ok(message)) => JobStatus::Completed(message),
            Ok(Err(EngineError::Cancelled)) => JobStatus::Cancelled,
            Ok(Err(e)) => JobStatus::Failed(e.to_string()),
            Err(join_err) => JobStatus::Failed(format!("join error: {}", join_err)),
        };
        match &status {
            JobStatus::Failed(reason) => warn!("Job {} ({}) failed: {}", job_id, label, reason),
            other => info!("Job {} ({}) finished: {:?}", job_id, label, other),
        }
        js.set(&job_id, status).await;
    });

    handle
}

/// Writes a manual backup. Completes with the backup path.
pub async fn schedule_backup_job(jobs: &JobsState, engine: SharedEngine) -> JobHandle {
    schedule(jobs, "backup", move |ctx| {
        ctx.progress(10);
        let engine = engine.blocking_read();
        ctx.checkpoint()?;
        let backup = engine.create_backup()?;
        ctx.progress(100);
        Ok(backup.path.display().to_string())
    })
    .await
}

/// Restores the snapshot at `path`. Completes with a summary of what was
/// restored.
pub async fn schedule_restore_job(jobs: &JobsState, engine: SharedEngine, path: PathBuf) -> JobHandle {
    schedule(jobs, "restore", move |ctx| {
        ctx.progress(10);
        let mut engine = engine.blocking_write();
        ctx.checkpoint()?;
        let report = engine.restore_backup(&path)?;
        ctx.progress(100);
        let mut summary = format!(
            "Restored {} template(s) and {} document(s)",
            report.templates, report.documents
        );
        if !report.is_clean() {
            summary.push_str(&format!(", {} not saved", report.failures.len()));
        }
        Ok(summary)
    })
    .await
}

/// Renders a document and writes it under `exports/`. Completes with the
/// written path.
pub async fn schedule_export_job(
    jobs: &JobsState,
    engine: SharedEngine,
    document_id: String,
    format: ExportFormat,
    renderer: Arc<dyn PageRenderer>,
) -> JobHandle {
    schedule(jobs, "export", move |ctx| {
        ctx.progress(10);
        let engine = engine.blocking_read();
        let bytes = engine.export_document(&document_id, format, renderer.as_ref())?;
        ctx.progress(80);
        ctx.checkpoint()?;
        let document = engine.documents().get_required(&document_id)?;
        let path = engine
            .store()
            .write_export(&export::file_name(document, format), &bytes)?;
        ctx.progress(100);
        Ok(path.display().to_string())
    })
    .await
}

/// Extracts text from a scanned file and stores it as a new template.
/// Completes with the new template id.
pub async fn schedule_ocr_import_job(
    jobs: &JobsState,
    engine: SharedEngine,
    name: String,
    category: TemplateCategory,
    path: PathBuf,
    extractor: Arc<dyn TextExtractor>,
) -> JobHandle {
    schedule(jobs, "ocr import", move |ctx| {
        ctx.progress(10);
        let text = extractor
            .extract_text(&path)
            .map_err(|message| EngineError::io(&path, std::io::Error::other(message)))?;
        ctx.progress(70);
        ctx.checkpoint()?;
        let template = engine
            .blocking_write()
            .add_extracted_template(&name, category, &text)?;
        ctx.progress(100);
        Ok(template.id)
    })
    .await
}

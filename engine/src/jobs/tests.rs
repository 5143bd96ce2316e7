use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use common::jobs::JobStatus;
use common::model::case_record::CaseRecord;
use common::model::template::TemplateCategory;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio::sync::RwLock;

use super::*;
use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::export::{ExportFormat, PageLayout, PageRenderer, RenderError};
use crate::sources::TextExtractor;

struct StaticExtractor(Result<String, String>);

impl TextExtractor for StaticExtractor {
    fn extract_text(&self, _path: &Path) -> Result<String, String> {
        self.0.clone()
    }
}

struct FakePdf;

impl PageRenderer for FakePdf {
    fn render(&self, layout: &PageLayout) -> Result<Vec<u8>, RenderError> {
        Ok(format!("%PDF pages={}", layout.pages.len()).into_bytes())
    }
}

fn open_engine() -> (TempDir, SharedEngine) {
    let dir = TempDir::new().unwrap();
    let engine = Engine::open(EngineConfig::with_data_root(dir.path())).unwrap();
    (dir, Arc::new(RwLock::new(engine)))
}

async fn wait_for(jobs: &JobsState, job_id: &str) -> JobStatus {
    for _ in 0..500 {
        if let Some(status) = jobs.status(job_id).await {
            if status.is_finished() {
                return status;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {} did not finish", job_id);
}

async fn compiled_document(engine: &SharedEngine) -> String {
    let record = CaseRecord::new("c-1")
        .with_full_name("Maria Rossi")
        .with_case_number("2024/017");
    engine
        .write()
        .await
        .compile_document("builtin-parish-communication", &record)
        .unwrap()
        .id
}

#[tokio::test]
async fn backup_job_completes_with_backup_path() {
    let (_dir, engine) = open_engine();
    let jobs = JobsState::spawn(16);

    let handle = schedule_backup_job(&jobs, engine.clone()).await;
    let status = wait_for(&jobs, &handle.job_id).await;

    let JobStatus::Completed(path) = status else {
        panic!("unexpected status {:?}", status);
    };
    assert!(PathBuf::from(&path).is_file());
    assert_eq!(engine.read().await.list_backups().unwrap().len(), 1);
}

#[tokio::test]
async fn export_job_writes_into_exports_folder() {
    let (_dir, engine) = open_engine();
    let document_id = compiled_document(&engine).await;
    let jobs = JobsState::spawn(16);

    let handle = schedule_export_job(
        &jobs,
        engine.clone(),
        document_id,
        ExportFormat::Paginated,
        Arc::new(FakePdf),
    )
    .await;

    let JobStatus::Completed(path) = wait_for(&jobs, &handle.job_id).await else {
        panic!("export did not complete");
    };
    assert!(path.ends_with(".pdf"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "%PDF pages=1");
}

#[tokio::test]
async fn cancelled_export_writes_nothing() {
    let (_dir, engine) = open_engine();
    let document_id = compiled_document(&engine).await;
    let jobs = JobsState::spawn(16);

    let handle = schedule_export_job(
        &jobs,
        engine.clone(),
        document_id,
        ExportFormat::PlainText,
        Arc::new(FakePdf),
    )
    .await;
    handle.cancel();

    assert_eq!(wait_for(&jobs, &handle.job_id).await, JobStatus::Cancelled);
    let exports = engine.read().await.store().exports_dir();
    assert_eq!(fs::read_dir(exports).unwrap().count(), 0);
}

#[tokio::test]
async fn export_of_unknown_document_fails() {
    let (_dir, engine) = open_engine();
    let jobs = JobsState::spawn(16);

    let handle = schedule_export_job(
        &jobs,
        engine,
        "missing".to_string(),
        ExportFormat::RichText,
        Arc::new(FakePdf),
    )
    .await;

    assert!(matches!(
        wait_for(&jobs, &handle.job_id).await,
        JobStatus::Failed(reason) if reason.contains("missing")
    ));
}

#[tokio::test]
async fn ocr_import_job_creates_template_with_discovered_fields() {
    let (dir, engine) = open_engine();
    let jobs = JobsState::spawn(16);
    let extractor = StaticExtractor(Ok("Receipt for {{FULL_NAME}} on {{DATE}}".to_string()));

    let handle = schedule_ocr_import_job(
        &jobs,
        engine.clone(),
        "Scanned receipt".to_string(),
        TemplateCategory::Receipt,
        dir.path().join("scan.png"),
        Arc::new(extractor),
    )
    .await;

    let JobStatus::Completed(template_id) = wait_for(&jobs, &handle.job_id).await else {
        panic!("import did not complete");
    };
    let engine = engine.read().await;
    let template = engine.templates().get(&template_id).unwrap();
    assert_eq!(template.name, "Scanned receipt");
    assert!(!template.is_built_in);
    let keys: Vec<&str> = template.fields.iter().map(|f| f.key.as_str()).collect();
    assert_eq!(keys, vec!["FULL_NAME", "DATE"]);
    assert!(engine.store().template_path(&template_id).is_file());
}

#[tokio::test]
async fn ocr_failure_is_reported() {
    let (dir, engine) = open_engine();
    let jobs = JobsState::spawn(16);
    let before = engine.read().await.templates().len();

    let handle = schedule_ocr_import_job(
        &jobs,
        engine.clone(),
        "Unreadable".to_string(),
        TemplateCategory::Other,
        dir.path().join("blurry.png"),
        Arc::new(StaticExtractor(Err("no text found".to_string()))),
    )
    .await;

    assert!(matches!(
        wait_for(&jobs, &handle.job_id).await,
        JobStatus::Failed(reason) if reason.contains("no text found")
    ));
    assert_eq!(engine.read().await.templates().len(), before);
}

#[tokio::test]
async fn restore_job_brings_back_deleted_document() {
    let (_dir, engine) = open_engine();
    let document_id = compiled_document(&engine).await;
    let backup = engine.read().await.create_backup().unwrap();
    engine.write().await.delete_document(&document_id).unwrap();
    let jobs = JobsState::spawn(16);

    let handle = schedule_restore_job(&jobs, engine.clone(), backup.path).await;

    assert!(matches!(
        wait_for(&jobs, &handle.job_id).await,
        JobStatus::Completed(summary) if summary.contains("1 document(s)")
    ));
    assert!(engine.read().await.documents().get(&document_id).is_some());
}

#[tokio::test]
async fn updater_ignores_progress_after_finish() {
    let (jobs, rx) = JobsState::new(4);
    tokio::spawn(start_job_updater(jobs.clone(), rx));
    jobs.set("j-1", JobStatus::Completed("done".to_string())).await;

    jobs.tx
        .send(JobUpdate {
            job_id: "j-1".to_string(),
            status: JobStatus::InProgress(50),
        })
        .await
        .unwrap();
    jobs.tx
        .send(JobUpdate {
            job_id: "j-2".to_string(),
            status: JobStatus::InProgress(50),
        })
        .await
        .unwrap();
    for _ in 0..100 {
        if jobs.status("j-2").await.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert_eq!(jobs.status("j-1").await, Some(JobStatus::Completed("done".to_string())));
    assert_eq!(jobs.status("j-2").await, Some(JobStatus::InProgress(50)));
}

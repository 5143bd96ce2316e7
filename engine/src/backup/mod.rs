//! # Backup/Restore Manager
//!
//! A backup is one JSON file under `backups/` holding a [`BackupSnapshot`] of
//! both catalogs. File names start with a UTC timestamp so that name order is
//! chronological.
//!
//! Restoring is destructive for the current catalogs, so it always writes an
//! automatic backup of the current state first. The snapshot is then decoded
//! (rejecting formats newer than [`FORMAT_VERSION`]), swapped in wholesale and
//! re-persisted entity by entity; files of entities that are not part of the
//! snapshot are removed so the next load sees exactly the restored state.
//!
//! The safety backup is written without pruning. Retention runs only after a
//! successful restore and never removes the snapshot that was restored.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use common::model::document::CompiledDocument;
use common::model::snapshot::{BackupSnapshot, SnapshotHeader};
use common::model::template::DocumentTemplate;
use common::FORMAT_VERSION;
use log::{info, warn};

use crate::documents::DocumentCatalog;
use crate::error::{EngineError, EngineResult};
use crate::storage::atomic::write_json_atomic;
use crate::storage::{DataStore, PendingWrite};
use crate::templates::TemplateStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupKind {
    Manual,
    Automatic,
}

impl BackupKind {
    fn as_str(&self) -> &'static str {
        match self {
            BackupKind::Manual => "manual",
            BackupKind::Automatic => "automatic",
        }
    }
}

/// A snapshot together with the file it was written to.
#[derive(Debug, Clone)]
pub struct BackupFile {
    pub path: PathBuf,
    pub snapshot: BackupSnapshot,
}

/// A file write or removal that failed during a restore. The in-memory
/// catalogs are restored regardless.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistFailure {
    pub write: PendingWrite,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct RestoreReport {
    /// Automatic backup of the state that was replaced.
    pub safety_backup: PathBuf,
    pub templates: usize,
    pub documents: usize,
    pub failures: Vec<PersistFailure>,
}

impl RestoreReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct BackupManager {
    store: DataStore,
    max_backups: usize,
}

impl BackupManager {
    pub fn new(store: DataStore, max_backups: usize) -> Self {
        Self { store, max_backups }
    }

    /// Serializes both catalogs into a new file under `backups/`, then prunes
    /// old backups beyond the retention limit.
    pub fn create_backup(
        &self,
        templates: &[DocumentTemplate],
        documents: &[CompiledDocument],
        kind: BackupKind,
        reason: &str,
    ) -> EngineResult<BackupFile> {
        let file = self.write_backup(templates, documents, kind, reason)?;
        self.prune(None);
        Ok(file)
    }

    fn write_backup(
        &self,
        templates: &[DocumentTemplate],
        documents: &[CompiledDocument],
        kind: BackupKind,
        reason: &str,
    ) -> EngineResult<BackupFile> {
        let mut metadata = BTreeMap::new();
        metadata.insert("kind".to_string(), kind.as_str().to_string());
        metadata.insert("reason".to_string(), reason.to_string());
        metadata.insert("templateCount".to_string(), templates.len().to_string());
        metadata.insert("documentCount".to_string(), documents.len().to_string());
        metadata.insert("operator".to_string(), self.store.operator_label().to_string());
        metadata.insert("engineVersion".to_string(), env!("CARGO_PKG_VERSION").to_string());

        let snapshot = BackupSnapshot::new(templates.to_vec(), documents.to_vec(), metadata);
        let path = self.next_path(kind);
        write_json_atomic(&path, &snapshot)?;
        info!(
            "Backup written to {} ({} templates, {} documents)",
            path.display(),
            templates.len(),
            documents.len()
        );
        Ok(BackupFile { path, snapshot })
    }

    /// Reads and version-checks a snapshot file without touching any state.
    pub fn read_snapshot(&self, path: impl AsRef<Path>) -> EngineResult<BackupSnapshot> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| EngineError::io(path, e))?;
        let header: SnapshotHeader =
            serde_json::from_str(&raw).map_err(|e| EngineError::decode(path, e))?;
        if header.format_version > FORMAT_VERSION {
            return Err(EngineError::UnsupportedSnapshotVersion {
                found: header.format_version,
                supported: FORMAT_VERSION,
            });
        }
        serde_json::from_str(&raw).map_err(|e| EngineError::decode(path, e))
    }

    /// Replaces both catalogs with the snapshot at `path` and rewrites the
    /// file store to match.
    pub fn restore(
        &self,
        path: impl AsRef<Path>,
        templates: &mut TemplateStore,
        documents: &mut DocumentCatalog,
    ) -> EngineResult<RestoreReport> {
        let path = path.as_ref();
        let safety = self.write_backup(
            templates.list(),
            documents.list(),
            BackupKind::Automatic,
            "before restore",
        )?;
        let snapshot = self.read_snapshot(path)?;

        let previous_templates: Vec<DocumentTemplate> = templates.list().to_vec();
        let previous_documents: Vec<CompiledDocument> = documents.list().to_vec();
        templates.replace_all(snapshot.templates);
        documents.replace_all(snapshot.documents);

        let mut failures = Vec::new();
        for template in templates.list() {
            if let Err(e) = self.store.save_template(template) {
                failures.push(failure(PendingWrite::Template(template.id.clone()), &e));
            }
        }
        for document in documents.list() {
            if let Err(e) = self.store.save_document(document) {
                failures.push(failure(PendingWrite::Document(document.id.clone()), &e));
            }
        }

        let kept_templates: HashSet<&str> = templates.list().iter().map(|t| t.id.as_str()).collect();
        for stale in previous_templates.iter().filter(|t| !kept_templates.contains(t.id.as_str())) {
            if let Err(e) = self.store.delete_template(&stale.id) {
                failures.push(failure(PendingWrite::TemplateDeletion(stale.id.clone()), &e));
            }
        }
        let kept_documents: HashSet<PathBuf> = documents
            .list()
            .iter()
            .map(|d| self.store.document_path(d))
            .collect();
        for stale in previous_documents
            .iter()
            .filter(|d| !kept_documents.contains(&self.store.document_path(d)))
        {
            if let Err(e) = self.store.delete_document(stale) {
                failures.push(failure(
                    PendingWrite::DocumentDeletion(Box::new(stale.clone())),
                    &e,
                ));
            }
        }

        for f in &failures {
            warn!("Restore could not complete {}: {}", f.write, f.message);
        }
        info!(
            "Restored {} from {} ({} templates, {} documents)",
            path.display(),
            safety.path.display(),
            templates.len(),
            documents.len()
        );
        self.prune(Some(path));
        Ok(RestoreReport {
            safety_backup: safety.path,
            templates: templates.len(),
            documents: documents.len(),
            failures,
        })
    }

    /// Backup files, newest first.
    pub fn list_backups(&self) -> EngineResult<Vec<PathBuf>> {
        let dir = self.store.backups_dir();
        let mut files: Vec<PathBuf> = fs::read_dir(&dir)
            .map_err(|e| EngineError::io(&dir, e))?
            .flatten()
            .map(|entry| entry.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort_by(|a, b| b.file_name().cmp(&a.file_name()));
        Ok(files)
    }

    /// `<utc stamp>-<seq>-<kind>.json`; the sequence keeps same-millisecond
    /// backups apart and in order.
    fn next_path(&self, kind: BackupKind) -> PathBuf {
        let stamp = Utc::now().format("%Y%m%d-%H%M%S-%3f").to_string();
        let dir = self.store.backups_dir();
        let taken = |seq: u32| {
            [BackupKind::Manual, BackupKind::Automatic]
                .iter()
                .any(|k| dir.join(format!("{}-{:02}-{}.json", stamp, seq, k.as_str())).exists())
        };
        let mut seq = 0;
        while taken(seq) {
            seq += 1;
        }
        dir.join(format!("{}-{:02}-{}.json", stamp, seq, kind.as_str()))
    }

    /// Removes backups beyond `max_backups`, newest kept. `keep` is never
    /// removed.
    fn prune(&self, keep: Option<&Path>) {
        if self.max_backups == 0 {
            return;
        }
        let files = match self.list_backups() {
            Ok(files) => files,
            Err(e) => {
                warn!("Backup pruning skipped: {}", e);
                return;
            }
        };
        let keep = keep.map(canonical);
        for old in files
            .iter()
            .skip(self.max_backups)
            .filter(|f| keep.as_ref() != Some(&canonical(f)))
        {
            match fs::remove_file(old) {
                Ok(()) => info!("Pruned old backup {}", old.display()),
                Err(e) => warn!("Could not prune {}: {}", old.display(), e),
            }
        }
    }
}

fn failure(write: PendingWrite, error: &EngineError) -> PersistFailure {
    PersistFailure {
        write,
        message: error.to_string(),
    }
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::compile;
    use common::model::case_record::CaseRecord;
    use pretty_assertions::assert_eq;

    fn setup(max_backups: usize) -> (tempfile::TempDir, DataStore, BackupManager) {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::open(dir.path(), "front desk").unwrap();
        let manager = BackupManager::new(store.clone(), max_backups);
        (dir, store, manager)
    }

    #[test]
    fn backup_records_metadata() {
        let (_dir, _store, manager) = setup(0);
        let templates = TemplateStore::with_builtins();
        let file = manager
            .create_backup(templates.list(), &[], BackupKind::Manual, "end of day")
            .unwrap();

        assert!(file.path.is_file());
        assert_eq!(file.snapshot.metadata["kind"], "manual");
        assert_eq!(file.snapshot.metadata["reason"], "end of day");
        assert_eq!(
            file.snapshot.metadata["templateCount"],
            templates.len().to_string()
        );
        assert_eq!(manager.read_snapshot(&file.path).unwrap(), file.snapshot);
    }

    #[test]
    fn newer_snapshot_version_is_rejected() {
        let (dir, _store, manager) = setup(0);
        let path = dir.path().join("future.json");
        fs::write(&path, r#"{ "formatVersion": 99, "somethingNew": [] }"#).unwrap();
        assert!(matches!(
            manager.read_snapshot(&path),
            Err(EngineError::UnsupportedSnapshotVersion { found: 99, supported: 1 })
        ));
    }

    #[test]
    fn unsupported_restore_leaves_catalogs_alone() {
        let (dir, _store, manager) = setup(0);
        let path = dir.path().join("future.json");
        fs::write(&path, r#"{ "formatVersion": 2 }"#).unwrap();

        let mut templates = TemplateStore::with_builtins();
        let mut documents = DocumentCatalog::new();
        let before = templates.list().to_vec();
        assert!(manager.restore(&path, &mut templates, &mut documents).is_err());
        assert_eq!(templates.list(), before.as_slice());
        // The safety backup is still taken.
        assert_eq!(manager.list_backups().unwrap().len(), 1);
    }

    #[test]
    fn restore_swaps_catalogs_and_rewrites_files() {
        let (_dir, store, manager) = setup(0);
        let mut templates = TemplateStore::with_builtins();
        let record = CaseRecord::new("c-1").with_full_name("Maria Rossi");
        let kept = compile::compile(&templates.list()[0], &record);
        let mut documents = DocumentCatalog::from_documents(vec![kept.clone()]);
        let backup = manager
            .create_backup(templates.list(), documents.list(), BackupKind::Manual, "test")
            .unwrap();

        let extra = compile::compile(&templates.list()[1], &record);
        store.save_document(&extra).unwrap();
        documents.insert(extra.clone());
        let user = templates
            .create(DocumentTemplate::new(
                "Scratch",
                common::model::template::TemplateCategory::Other,
                "x",
            ))
            .unwrap()
            .clone();
        store.save_template(&user).unwrap();

        let report = manager.restore(&backup.path, &mut templates, &mut documents).unwrap();
        assert!(report.is_clean());
        assert_eq!(documents.list().to_vec(), vec![kept.clone()]);
        assert!(templates.get(&user.id).is_none());

        let loaded = store.load_all();
        assert_eq!(loaded.documents, vec![kept]);
        assert_eq!(loaded.templates.len(), templates.len());
        assert!(!store.document_path(&extra).exists());
        assert!(!store.template_path(&user.id).exists());
    }

    #[test]
    fn retention_keeps_newest_backups() {
        let (_dir, _store, manager) = setup(2);
        for _ in 0..4 {
            manager
                .create_backup(&[], &[], BackupKind::Manual, "test")
                .unwrap();
        }
        assert_eq!(manager.list_backups().unwrap().len(), 2);
    }

    #[test]
    fn restoring_the_oldest_retained_backup_keeps_it() {
        let (_dir, _store, manager) = setup(2);
        let mut templates = TemplateStore::with_builtins();
        let mut documents = DocumentCatalog::new();
        let oldest = manager
            .create_backup(templates.list(), &[], BackupKind::Manual, "first")
            .unwrap();
        manager
            .create_backup(templates.list(), &[], BackupKind::Manual, "second")
            .unwrap();

        let report = manager
            .restore(&oldest.path, &mut templates, &mut documents)
            .unwrap();
        assert!(report.is_clean());
        assert!(oldest.path.is_file());
        assert!(report.safety_backup.is_file());

        // Retention applies again on the next ordinary backup.
        manager
            .create_backup(templates.list(), &[], BackupKind::Manual, "third")
            .unwrap();
        assert_eq!(manager.list_backups().unwrap().len(), 2);
        assert!(!oldest.path.exists());
    }

    #[test]
    fn failed_stale_removal_is_reported_as_a_deletion() {
        let (_dir, store, manager) = setup(0);
        let mut templates = TemplateStore::with_builtins();
        let mut documents = DocumentCatalog::new();
        let backup = manager
            .create_backup(templates.list(), &[], BackupKind::Manual, "clean")
            .unwrap();

        let user = templates
            .create(DocumentTemplate::new(
                "Scratch",
                common::model::template::TemplateCategory::Other,
                "x",
            ))
            .unwrap()
            .clone();
        // A directory in place of the file makes the removal fail.
        fs::create_dir_all(store.template_path(&user.id)).unwrap();

        let report = manager.restore(&backup.path, &mut templates, &mut documents).unwrap();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(
            report.failures[0].write,
            PendingWrite::TemplateDeletion(user.id.clone())
        );
        assert!(templates.get(&user.id).is_none());
    }
}

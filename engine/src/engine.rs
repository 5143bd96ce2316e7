//! The engine service object.
//!
//! [`Engine`] owns the catalogs, the file store and the backup manager. The
//! host application constructs one with [`Engine::open`] and passes it (or an
//! `Arc<RwLock<Engine>>` for background jobs) to whoever needs it.
//!
//! Every mutating method changes the in-memory catalog first and then writes
//! the affected entity. If the write fails the change is kept in memory, the
//! entity is queued in [`Engine::unsaved`] and the I/O error is returned;
//! [`Engine::retry_unsaved`] replays the queue.

use std::path::{Path, PathBuf};

use common::model::case_record::CaseRecord;
use common::model::document::CompiledDocument;
use common::model::template::{DocumentTemplate, TemplateCategory};
use log::{info, warn};

use crate::backup::{BackupFile, BackupKind, BackupManager, RestoreReport};
use crate::config::EngineConfig;
use crate::documents::{compile, DocumentCatalog, DocumentStats};
use crate::error::{EngineError, EngineResult, ValidationIssue};
use crate::export::{self, ExportFormat, GenpdfRenderer, PageRenderer};
use crate::sources::{CaseRecordProvider, TextExtractor};
use crate::storage::{DataStore, LoadIssue};
pub use crate::storage::PendingWrite;
use crate::templates::TemplateStore;

pub struct Engine {
    config: EngineConfig,
    store: DataStore,
    templates: TemplateStore,
    documents: DocumentCatalog,
    backups: BackupManager,
    unsaved: Vec<PendingWrite>,
    load_issues: Vec<LoadIssue>,
}

impl Engine {
    /// Opens the file store at `config.data_root`, loads both catalogs and
    /// seeds any missing built-in template.
    pub fn open(config: EngineConfig) -> EngineResult<Self> {
        let store = DataStore::open(&config.data_root, config.operator_label.clone())?;
        let report = store.load_all();
        let backups = BackupManager::new(store.clone(), config.max_backups);

        let mut engine = Self {
            config,
            store,
            templates: TemplateStore::from_templates(report.templates),
            documents: DocumentCatalog::from_documents(report.documents),
            backups,
            unsaved: Vec::new(),
            load_issues: report.issues,
        };

        for seed in engine.templates.ensure_builtins() {
            info!("Seeding built-in template {}", seed.name);
            if let Err(e) = engine.persist(PendingWrite::Template(seed.id.clone())) {
                warn!("Built-in template {} not written: {}", seed.id, e);
            }
        }
        Ok(engine)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &DataStore {
        &self.store
    }

    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    pub fn documents(&self) -> &DocumentCatalog {
        &self.documents
    }

    /// Files skipped by the initial load.
    pub fn load_issues(&self) -> &[LoadIssue] {
        &self.load_issues
    }

    pub fn unsaved(&self) -> &[PendingWrite] {
        &self.unsaved
    }

    // Templates

    pub fn create_template(&mut self, template: DocumentTemplate) -> EngineResult<DocumentTemplate> {
        let created = self.templates.create(template)?.clone();
        self.persist(PendingWrite::Template(created.id.clone()))?;
        Ok(created)
    }

    pub fn update_template(&mut self, template: DocumentTemplate) -> EngineResult<DocumentTemplate> {
        let updated = self.templates.update(template)?.clone();
        self.persist(PendingWrite::Template(updated.id.clone()))?;
        Ok(updated)
    }

    pub fn delete_template(&mut self, id: &str) -> EngineResult<DocumentTemplate> {
        let removed = self.templates.delete(id)?;
        self.persist(PendingWrite::TemplateDeletion(removed.id.clone()))?;
        Ok(removed)
    }

    pub fn duplicate_template(&mut self, id: &str) -> EngineResult<DocumentTemplate> {
        let copy = self.templates.duplicate(id)?;
        self.persist(PendingWrite::Template(copy.id.clone()))?;
        Ok(copy)
    }

    pub fn validate_template(&self, template: &DocumentTemplate) -> Vec<ValidationIssue> {
        self.templates.validate(template)
    }

    pub fn search_templates(&self, query: &str) -> Vec<&DocumentTemplate> {
        self.templates.search(query)
    }

    pub fn import_template(&mut self, path: impl AsRef<Path>) -> EngineResult<DocumentTemplate> {
        let imported = self.templates.import_from_file(path)?;
        self.persist(PendingWrite::Template(imported.id.clone()))?;
        Ok(imported)
    }

    pub fn export_template(&self, id: &str, path: impl AsRef<Path>) -> EngineResult<()> {
        self.templates.export_to_file(id, path)
    }

    /// Runs `extractor` over a scanned file and stores the text as a new
    /// user template.
    pub fn import_scanned_template(
        &mut self,
        name: &str,
        category: TemplateCategory,
        path: &Path,
        extractor: &dyn TextExtractor,
    ) -> EngineResult<DocumentTemplate> {
        let text = extractor
            .extract_text(path)
            .map_err(|message| EngineError::io(path, std::io::Error::other(message)))?;
        self.add_extracted_template(name, category, &text)
    }

    /// Stores already-extracted text as a new user template.
    pub fn add_extracted_template(
        &mut self,
        name: &str,
        category: TemplateCategory,
        text: &str,
    ) -> EngineResult<DocumentTemplate> {
        let template = self.templates.create_from_extracted_text(name, category, text)?;
        self.persist(PendingWrite::Template(template.id.clone()))?;
        Ok(template)
    }

    // Documents

    pub fn compile_document(
        &mut self,
        template_id: &str,
        record: &CaseRecord,
    ) -> EngineResult<CompiledDocument> {
        let template = self.templates.get_required(template_id)?;
        let document = compile::compile(template, record);
        info!(
            "Document {} compiled from '{}' for record {}",
            document.id, template.name, record.id
        );
        self.documents.insert(document.clone());
        self.persist(PendingWrite::Document(document.id.clone()))?;
        Ok(document)
    }

    pub fn compile_for_case(
        &mut self,
        template_id: &str,
        case_id: &str,
        provider: &dyn CaseRecordProvider,
    ) -> EngineResult<CompiledDocument> {
        let record = provider.case_record(case_id).ok_or_else(|| EngineError::NotFound {
            kind: "case record",
            id: case_id.to_string(),
        })?;
        self.compile_document(template_id, &record)
    }

    pub fn update_document_field(
        &mut self,
        document_id: &str,
        key: &str,
        value: &str,
    ) -> EngineResult<CompiledDocument> {
        let document = self.documents.get_mut_required(document_id)?;
        compile::update_field(document, key, value)?;
        self.after_document_edit(document_id)
    }

    pub fn set_document_content(&mut self, document_id: &str, text: &str) -> EngineResult<CompiledDocument> {
        compile::set_raw_content(self.documents.get_mut_required(document_id)?, text);
        self.after_document_edit(document_id)
    }

    pub fn set_document_notes(&mut self, document_id: &str, notes: &str) -> EngineResult<CompiledDocument> {
        let document = self.documents.get_mut_required(document_id)?;
        document.notes = notes.to_string();
        document.touch();
        self.after_document_edit(document_id)
    }

    /// Fills still-missing values from the template's declared defaults.
    pub fn apply_document_defaults(&mut self, document_id: &str) -> EngineResult<CompiledDocument> {
        compile::apply_defaults(self.documents.get_mut_required(document_id)?);
        self.after_document_edit(document_id)
    }

    pub fn mark_document_completed(&mut self, document_id: &str) -> EngineResult<CompiledDocument> {
        compile::mark_completed(self.documents.get_mut_required(document_id)?);
        self.after_document_edit(document_id)
    }

    pub fn clear_document_override(&mut self, document_id: &str) -> EngineResult<CompiledDocument> {
        compile::clear_completed_override(self.documents.get_mut_required(document_id)?);
        self.after_document_edit(document_id)
    }

    pub fn delete_document(&mut self, document_id: &str) -> EngineResult<CompiledDocument> {
        let removed = self.documents.remove(document_id)?;
        info!("Document deleted: {}", removed.id);
        self.persist(PendingWrite::DocumentDeletion(Box::new(removed.clone())))?;
        Ok(removed)
    }

    pub fn search_documents(&self, query: &str) -> Vec<&CompiledDocument> {
        self.documents.search(query)
    }

    pub fn document_stats(&self) -> DocumentStats {
        self.documents.stats()
    }

    // Backups

    pub fn create_backup(&self) -> EngineResult<BackupFile> {
        self.backups.create_backup(
            self.templates.list(),
            self.documents.list(),
            BackupKind::Manual,
            "requested",
        )
    }

    /// Restores a snapshot. Entities that could not be rewritten are queued
    /// as unsaved and listed in the report.
    pub fn restore_backup(&mut self, path: impl AsRef<Path>) -> EngineResult<RestoreReport> {
        let report = self
            .backups
            .restore(path, &mut self.templates, &mut self.documents)?;

        // Saves are superseded by the restored state. Deletions of entities
        // the snapshot does not bring back still have to reach the disk.
        let templates = &self.templates;
        let documents = &self.documents;
        self.unsaved.retain(|write| match write {
            PendingWrite::TemplateDeletion(id) => templates.get(id).is_none(),
            PendingWrite::DocumentDeletion(doc) => documents.get(&doc.id).is_none(),
            PendingWrite::Template(_) | PendingWrite::Document(_) => false,
        });
        for failure in &report.failures {
            self.queue(failure.write.clone());
        }
        Ok(report)
    }

    pub fn list_backups(&self) -> EngineResult<Vec<PathBuf>> {
        self.backups.list_backups()
    }

    // Export

    /// Renderer configured from the engine's font settings.
    pub fn pdf_renderer(&self) -> GenpdfRenderer {
        GenpdfRenderer::from_config(&self.config)
    }

    pub fn export_document(
        &self,
        document_id: &str,
        format: ExportFormat,
        renderer: &dyn PageRenderer,
    ) -> EngineResult<Vec<u8>> {
        let document = self.documents.get_required(document_id)?;
        export::export(document, format, &self.config.page, renderer)
    }

    /// Exports into `exports/` and returns the written path.
    pub fn export_document_to_file(
        &self,
        document_id: &str,
        format: ExportFormat,
        renderer: &dyn PageRenderer,
    ) -> EngineResult<PathBuf> {
        let bytes = self.export_document(document_id, format, renderer)?;
        let document = self.documents.get_required(document_id)?;
        let path = self.store.write_export(&export::file_name(document, format), &bytes)?;
        info!("Document {} exported to {}", document_id, path.display());
        Ok(path)
    }

    // Persistence

    /// Replays every queued write. Entries that fail again stay queued and
    /// the first error is returned.
    pub fn retry_unsaved(&mut self) -> EngineResult<()> {
        let pending = std::mem::take(&mut self.unsaved);
        let mut first_error = None;
        for write in pending {
            if let Err(e) = self.persist(write) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn after_document_edit(&mut self, document_id: &str) -> EngineResult<CompiledDocument> {
        self.persist(PendingWrite::Document(document_id.to_string()))?;
        self.documents.get_required(document_id).cloned()
    }

    fn persist(&mut self, write: PendingWrite) -> EngineResult<()> {
        let result = match &write {
            PendingWrite::Template(id) => match self.templates.get(id) {
                Some(template) => self.store.save_template(template),
                None => Ok(()),
            },
            PendingWrite::Document(id) => match self.documents.get(id) {
                Some(document) => self.store.save_document(document),
                None => Ok(()),
            },
            PendingWrite::TemplateDeletion(id) => self.store.delete_template(id),
            PendingWrite::DocumentDeletion(document) => self.store.delete_document(document),
        };
        match result {
            Ok(()) => {
                self.unsaved.retain(|w| w != &write);
                Ok(())
            }
            Err(e) => {
                warn!("Write failed for {}, kept in memory: {}", write, e);
                self.queue(write);
                Err(e)
            }
        }
    }

    fn queue(&mut self, write: PendingWrite) {
        if !self.unsaved.contains(&write) {
            self.unsaved.push(write);
        }
    }
}

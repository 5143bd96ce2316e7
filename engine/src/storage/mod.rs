//! # Persistence Layer
//!
//! Maps the in-memory catalogs onto a directory tree under one data root:
//!
//! ```text
//! root/templates/<id>.json
//! root/documents/<category folder>/<id>.json   (+ <id>.txt companion)
//! root/backups/*.json
//! root/exports/*
//! ```
//!
//! Every write goes through [`atomic`]. Loading tolerates damage: a file that
//! cannot be read or decoded is reported in the [`LoadReport`] and skipped.

pub(crate) mod atomic;
mod companion;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use common::model::document::CompiledDocument;
use common::model::template::{DocumentTemplate, TemplateCategory};
use log::{info, warn};
use rayon::prelude::*;
use serde::de::DeserializeOwned;

use crate::error::{EngineError, EngineResult};

pub use companion::status as completion_status;

const TEMPLATES_DIR: &str = "templates";
const DOCUMENTS_DIR: &str = "documents";
const BACKUPS_DIR: &str = "backups";
const EXPORTS_DIR: &str = "exports";

/// Document subfolder for each category.
pub fn category_folder(category: TemplateCategory) -> &'static str {
    match category {
        TemplateCategory::TransportAuthorization => "Transport Authorizations",
        TemplateCategory::ParishCommunication => "Parish Communications",
        TemplateCategory::Invoice => "Invoices",
        TemplateCategory::Contract => "Contracts",
        TemplateCategory::DeathCertificate => "Death Certificates",
        TemplateCategory::Checklist => "Checklists",
        TemplateCategory::Receipt => "Receipts",
        TemplateCategory::Other => "Other",
    }
}

/// A file skipped during [`DataStore::load_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadIssue {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct LoadReport {
    pub templates: Vec<DocumentTemplate>,
    pub documents: Vec<CompiledDocument>,
    pub issues: Vec<LoadIssue>,
}

/// A write that has not reached the file store yet.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingWrite {
    Template(String),
    Document(String),
    TemplateDeletion(String),
    DocumentDeletion(Box<CompiledDocument>),
}

impl PendingWrite {
    pub fn is_deletion(&self) -> bool {
        matches!(
            self,
            PendingWrite::TemplateDeletion(_) | PendingWrite::DocumentDeletion(_)
        )
    }
}

impl fmt::Display for PendingWrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PendingWrite::Template(id) => write!(f, "template {}", id),
            PendingWrite::Document(id) => write!(f, "document {}", id),
            PendingWrite::TemplateDeletion(id) => write!(f, "deletion of template {}", id),
            PendingWrite::DocumentDeletion(doc) => write!(f, "deletion of document {}", doc.id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DataStore {
    root: PathBuf,
    operator_label: String,
}

impl DataStore {
    /// Opens (and creates if needed) the directory layout under `root`.
    pub fn open(root: impl Into<PathBuf>, operator_label: impl Into<String>) -> EngineResult<Self> {
        let store = Self {
            root: root.into(),
            operator_label: operator_label.into(),
        };
        for dir in [
            store.templates_dir(),
            store.documents_dir(),
            store.backups_dir(),
            store.exports_dir(),
        ] {
            fs::create_dir_all(&dir).map_err(|e| EngineError::io(&dir, e))?;
        }
        info!("File store opened at {}", store.root.display());
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn operator_label(&self) -> &str {
        &self.operator_label
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.root.join(TEMPLATES_DIR)
    }

    pub fn documents_dir(&self) -> PathBuf {
        self.root.join(DOCUMENTS_DIR)
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.root.join(BACKUPS_DIR)
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.root.join(EXPORTS_DIR)
    }

    pub fn template_path(&self, id: &str) -> PathBuf {
        self.templates_dir().join(format!("{}.json", file_stem(id)))
    }

    pub fn document_path(&self, document: &CompiledDocument) -> PathBuf {
        self.document_dir(document.category())
            .join(format!("{}.json", file_stem(&document.id)))
    }

    pub fn companion_path(&self, document: &CompiledDocument) -> PathBuf {
        self.document_path(document).with_extension("txt")
    }

    fn document_dir(&self, category: TemplateCategory) -> PathBuf {
        self.documents_dir().join(category_folder(category))
    }

    pub fn save_template(&self, template: &DocumentTemplate) -> EngineResult<()> {
        atomic::write_json_atomic(&self.template_path(&template.id), template)
    }

    /// Writes the document JSON, then regenerates its `.txt` companion.
    pub fn save_document(&self, document: &CompiledDocument) -> EngineResult<()> {
        atomic::write_json_atomic(&self.document_path(document), document)?;
        let text = companion::render(document, &self.operator_label);
        atomic::write_atomic(&self.companion_path(document), text.as_bytes())
    }

    pub fn delete_template(&self, id: &str) -> EngineResult<()> {
        remove_if_exists(&self.template_path(id))
    }

    pub fn delete_document(&self, document: &CompiledDocument) -> EngineResult<()> {
        remove_if_exists(&self.document_path(document))?;
        remove_if_exists(&self.companion_path(document))
    }

    /// Writes a file under `exports/` and returns its path.
    pub fn write_export(&self, file_name: &str, bytes: &[u8]) -> EngineResult<PathBuf> {
        let path = self.exports_dir().join(file_name);
        atomic::write_atomic(&path, bytes)?;
        Ok(path)
    }

    /// Reads every template and document JSON. Damaged files end up in
    /// `issues` and are otherwise ignored.
    pub fn load_all(&self) -> LoadReport {
        let mut report = LoadReport::default();

        let mut template_files = Vec::new();
        collect_json(&self.templates_dir(), &mut template_files, &mut report.issues);
        let (mut templates, issues) = decode_all::<DocumentTemplate>(&template_files);
        report.issues.extend(issues);

        let mut document_files = Vec::new();
        let documents_dir = self.documents_dir();
        collect_json(&documents_dir, &mut document_files, &mut report.issues);
        match fs::read_dir(&documents_dir) {
            Ok(entries) => {
                for entry in entries.flatten() {
                    let path = entry.path();
                    if path.is_dir() {
                        collect_json(&path, &mut document_files, &mut report.issues);
                    }
                }
            }
            Err(e) => report.issues.push(LoadIssue {
                path: documents_dir.clone(),
                message: e.to_string(),
            }),
        }
        let (mut documents, issues) = decode_all::<CompiledDocument>(&document_files);
        report.issues.extend(issues);

        templates.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.name.cmp(&b.name)));
        documents.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        report.templates = templates;
        report.documents = documents;

        for issue in &report.issues {
            warn!("Skipped {}: {}", issue.path.display(), issue.message);
        }
        info!(
            "Loaded {} template(s) and {} document(s) from {} ({} skipped)",
            report.templates.len(),
            report.documents.len(),
            self.root.display(),
            report.issues.len()
        );
        report
    }
}

/// Ids become file names; anything outside `[A-Za-z0-9_-]` is replaced.
fn file_stem(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

fn remove_if_exists(path: &Path) -> EngineResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(EngineError::io(path, e)),
    }
}

fn collect_json(dir: &Path, out: &mut Vec<PathBuf>, issues: &mut Vec<LoadIssue>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
        Err(e) => {
            issues.push(LoadIssue {
                path: dir.to_path_buf(),
                message: e.to_string(),
            });
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            out.push(path);
        }
    }
}

fn decode_all<T: DeserializeOwned + Send>(paths: &[PathBuf]) -> (Vec<T>, Vec<LoadIssue>) {
    let results: Vec<Result<T, LoadIssue>> = paths
        .par_iter()
        .map(|path| {
            let raw = fs::read_to_string(path).map_err(|e| LoadIssue {
                path: path.clone(),
                message: e.to_string(),
            })?;
            serde_json::from_str(&raw).map_err(|e| LoadIssue {
                path: path.clone(),
                message: e.to_string(),
            })
        })
        .collect();

    let mut values = Vec::with_capacity(results.len());
    let mut issues = Vec::new();
    for result in results {
        match result {
            Ok(value) => values.push(value),
            Err(issue) => issues.push(issue),
        }
    }
    (values, issues)
}

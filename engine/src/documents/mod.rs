//! In-memory catalog of compiled documents plus the compiler that produces them.

pub mod compile;

use common::model::document::CompiledDocument;
use common::model::template::TemplateCategory;
use serde::Serialize;

use crate::error::{EngineError, EngineResult};

/// Completion counts over the document catalog. Forced completions are kept
/// apart from documents that completed by having every placeholder filled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStats {
    pub total: usize,
    pub completed: usize,
    pub force_completed: usize,
    pub pending: usize,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentCatalog {
    documents: Vec<CompiledDocument>,
}

impl DocumentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_documents(documents: Vec<CompiledDocument>) -> Self {
        Self { documents }
    }

    pub fn list(&self) -> &[CompiledDocument] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&CompiledDocument> {
        self.documents.iter().find(|d| d.id == id)
    }

    pub fn get_required(&self, id: &str) -> EngineResult<&CompiledDocument> {
        self.get(id).ok_or_else(|| EngineError::document_not_found(id))
    }

    pub fn get_mut_required(&mut self, id: &str) -> EngineResult<&mut CompiledDocument> {
        self.documents
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| EngineError::document_not_found(id))
    }

    /// Inserts or replaces by id.
    pub fn insert(&mut self, document: CompiledDocument) {
        match self.documents.iter_mut().find(|d| d.id == document.id) {
            Some(existing) => *existing = document,
            None => self.documents.push(document),
        }
    }

    pub fn remove(&mut self, id: &str) -> EngineResult<CompiledDocument> {
        let index = self
            .documents
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| EngineError::document_not_found(id))?;
        Ok(self.documents.remove(index))
    }

    pub fn replace_all(&mut self, documents: Vec<CompiledDocument>) {
        self.documents = documents;
    }

    pub fn by_category(&self, category: TemplateCategory) -> Vec<&CompiledDocument> {
        self.documents
            .iter()
            .filter(|d| d.category() == category)
            .collect()
    }

    /// Documents compiled for one case record.
    pub fn for_record(&self, record_id: &str) -> Vec<&CompiledDocument> {
        self.documents
            .iter()
            .filter(|d| d.subject.record_id == record_id)
            .collect()
    }

    /// Case-insensitive match over template name, subject name, case number
    /// and notes.
    pub fn search(&self, query: &str) -> Vec<&CompiledDocument> {
        let needle = query.trim().to_lowercase();
        let hit = |value: &str| value.to_lowercase().contains(&needle);
        self.documents
            .iter()
            .filter(|d| {
                needle.is_empty()
                    || hit(&d.template().name)
                    || d.subject.name.as_deref().is_some_and(hit)
                    || d.subject.case_number.as_deref().is_some_and(hit)
                    || hit(&d.notes)
            })
            .collect()
    }

    pub fn stats(&self) -> DocumentStats {
        self.documents
            .iter()
            .fold(DocumentStats::default(), |mut stats, d| {
                stats.total += 1;
                if d.completed {
                    stats.completed += 1;
                } else if d.completed_override {
                    stats.force_completed += 1;
                } else {
                    stats.pending += 1;
                }
                stats
            })
    }
}

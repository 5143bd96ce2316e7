//! Collaborators the engine consumes but does not implement.

use std::path::Path;

use common::model::case_record::CaseRecord;

/// Read-only access to case records (the deceased-case module).
pub trait CaseRecordProvider: Send + Sync {
    fn case_record(&self, id: &str) -> Option<CaseRecord>;
}

/// Text extraction from scanned files (OCR).
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, path: &Path) -> Result<String, String>;
}

/// Fixed set of records; lets hosts and tests wire the engine without the
/// case module.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCaseRecords {
    records: Vec<CaseRecord>,
}

impl InMemoryCaseRecords {
    pub fn new(records: Vec<CaseRecord>) -> Self {
        Self { records }
    }
}

impl CaseRecordProvider for InMemoryCaseRecords {
    fn case_record(&self, id: &str) -> Option<CaseRecord> {
        self.records.iter().find(|r| r.id == id).cloned()
    }
}

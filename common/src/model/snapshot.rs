use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::FORMAT_VERSION;
use crate::model::document::CompiledDocument;
use crate::model::template::DocumentTemplate;

/// Whole-catalog backup. Written once and never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSnapshot {
    pub created_at: DateTime<Utc>,
    pub format_version: u32,
    pub templates: Vec<DocumentTemplate>,
    pub documents: Vec<CompiledDocument>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl BackupSnapshot {
    pub fn new(
        templates: Vec<DocumentTemplate>,
        documents: Vec<CompiledDocument>,
        metadata: BTreeMap<String, String>,
    ) -> Self {
        Self {
            created_at: Utc::now(),
            format_version: FORMAT_VERSION,
            templates,
            documents,
            metadata,
        }
    }
}

/// Just the version header of a snapshot file, read before the full decode so
/// newer formats are rejected without attempting a lossy read.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotHeader {
    pub format_version: u32,
}

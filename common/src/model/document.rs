use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::FORMAT_VERSION;
use crate::model::case_record::CaseRecord;
use crate::model::template::{DocumentTemplate, TemplateCategory};

/// Denormalized summary of the case record a document was compiled against.
/// Kept so documents stay readable after the case leaves the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRef {
    pub record_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub case_number: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub death_date: Option<NaiveDate>,
}

impl SubjectRef {
    pub fn summary(&self) -> String {
        let name = self.name.as_deref().unwrap_or("(unnamed)");
        match &self.case_number {
            Some(number) => format!("{} (case {})", name, number),
            None => name.to_string(),
        }
    }
}

impl From<&CaseRecord> for SubjectRef {
    fn from(record: &CaseRecord) -> Self {
        Self {
            record_id: record.id.clone(),
            name: record.full_name.clone(),
            case_number: record.case_number.clone(),
            birth_date: record.birth_date,
            death_date: record.death_date,
        }
    }
}

/// A template instantiated for one case.
///
/// The document owns a copy of the template as it was at compile time; edits
/// to the catalog template never reach documents already produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledDocument {
    pub id: String,
    template_snapshot: DocumentTemplate,
    #[serde(rename = "subjectRecordRef")]
    pub subject: SubjectRef,
    #[serde(default)]
    pub field_values: BTreeMap<String, String>,
    pub final_content: String,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    /// True when `final_content` holds no placeholder token.
    pub completed: bool,
    /// Set when a user marks the document complete regardless of tokens left.
    #[serde(default)]
    pub completed_override: bool,
    pub format_version: u32,
}

impl CompiledDocument {
    /// Empty document over a copy of `template`; `final_content` starts as the
    /// raw template content.
    pub fn from_snapshot(template: DocumentTemplate, subject: SubjectRef) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            final_content: template.content.clone(),
            template_snapshot: template,
            subject,
            field_values: BTreeMap::new(),
            notes: String::new(),
            created_at: now,
            modified_at: now,
            completed: false,
            completed_override: false,
            format_version: FORMAT_VERSION,
        }
    }

    pub fn template(&self) -> &DocumentTemplate {
        &self.template_snapshot
    }

    pub fn category(&self) -> TemplateCategory {
        self.template_snapshot.category
    }

    /// Completion as seen by callers: forced or organic.
    pub fn is_completed(&self) -> bool {
        self.completed_override || self.completed
    }

    /// Marked complete while placeholders are still visible.
    pub fn is_force_completed(&self) -> bool {
        self.completed_override && !self.completed
    }

    pub fn touch(&mut self) {
        let now = Utc::now();
        if now > self.modified_at {
            self.modified_at = now;
        }
    }
}

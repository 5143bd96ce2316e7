use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::FORMAT_VERSION;

/// Fixed set of template categories. Each category maps to one subfolder of
/// the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TemplateCategory {
    TransportAuthorization,
    ParishCommunication,
    Invoice,
    Contract,
    DeathCertificate,
    Checklist,
    Receipt,
    /// Also absorbs category names written by newer versions.
    #[serde(other)]
    Other,
}

impl TemplateCategory {
    pub const ALL: [TemplateCategory; 8] = [
        TemplateCategory::TransportAuthorization,
        TemplateCategory::ParishCommunication,
        TemplateCategory::Invoice,
        TemplateCategory::Contract,
        TemplateCategory::DeathCertificate,
        TemplateCategory::Checklist,
        TemplateCategory::Receipt,
        TemplateCategory::Other,
    ];

    /// Display label used in search, document headers and exports.
    pub fn label(&self) -> &'static str {
        match self {
            TemplateCategory::TransportAuthorization => "Transport authorization",
            TemplateCategory::ParishCommunication => "Parish communication",
            TemplateCategory::Invoice => "Invoice",
            TemplateCategory::Contract => "Contract",
            TemplateCategory::DeathCertificate => "Death certificate",
            TemplateCategory::Checklist => "Checklist",
            TemplateCategory::Receipt => "Receipt",
            TemplateCategory::Other => "Other",
        }
    }
}

/// Kind of value a field expects. Informational for the editor; the engine
/// stores every value as a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    #[default]
    Text,
    LongText,
    Date,
    Time,
    Email,
    Phone,
}

/// Declared input field of a template.
///
/// `key` is the placeholder key (`NAME` for `{{NAME}}`). A field does not have
/// to appear in the template content, and content keys do not need a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    pub name: String,
    pub key: String,
    #[serde(default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default_value: String,
    #[serde(default)]
    pub description: String,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, key: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            field_type,
            required: false,
            default_value: String::new(),
            description: String::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = value.into();
        self
    }
}

/// A reusable document skeleton: content with `{{KEY}}` placeholders plus the
/// field specification the editor shows for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTemplate {
    pub id: String,
    pub name: String,
    pub category: TemplateCategory,
    pub content: String,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    #[serde(default)]
    pub is_built_in: bool,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub creator_label: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub format_version: u32,
}

impl DocumentTemplate {
    /// New user template with a fresh id and both timestamps set to now.
    pub fn new(
        name: impl Into<String>,
        category: TemplateCategory,
        content: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            category,
            content: content.into(),
            fields: Vec::new(),
            is_built_in: false,
            notes: String::new(),
            creator_label: String::new(),
            created_at: now,
            modified_at: now,
            format_version: FORMAT_VERSION,
        }
    }

    pub fn with_fields(mut self, fields: Vec<FieldSpec>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Bumps `modified_at`, never moving it backwards.
    pub fn touch(&mut self) {
        let now = Utc::now();
        if now > self.modified_at {
            self.modified_at = now;
        }
    }
}

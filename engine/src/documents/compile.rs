//! # Document Compiler
//!
//! Turns a template plus a case record into a [`CompiledDocument`] and keeps
//! the document's content and completion flag consistent through edits.
//!
//! ## Auto-mapping
//!
//! Initial field values come from a fixed table of well-known keys (see
//! [`AUTO_MAP`]). Only exact key matches are filled; a key the record has no
//! value for falls back to the field's declared default, and otherwise stays
//! as a visible `{{KEY}}` token. Nothing is inferred from free text.
//!
//! ## Re-substitution
//!
//! Every field edit substitutes against the content of the document's own
//! template snapshot, never against the previous `final_content`, so a value
//! that contains token-like text cannot be substituted twice.

use chrono::{Local, NaiveDate};
use common::model::case_record::CaseRecord;
use common::model::document::{CompiledDocument, SubjectRef};
use common::model::template::DocumentTemplate;
use log::debug;

use crate::error::{EngineError, EngineResult, ValidationIssue};
use crate::placeholder;

pub const DATE_FORMAT: &str = "%d/%m/%Y";
pub const TIME_FORMAT: &str = "%H:%M";

/// Case-record attribute a placeholder key can be filled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    FullName,
    BirthDate,
    BirthPlace,
    DeathDate,
    DeathTime,
    DeathPlace,
    RequesterName,
    RequesterPhone,
    RequesterEmail,
    CaseNumber,
    CurrentDate,
}

/// Placeholder keys recognised by auto-mapping.
pub const AUTO_MAP: &[(&str, Attribute)] = &[
    ("NAME", Attribute::FullName),
    ("FULL_NAME", Attribute::FullName),
    ("DECEASED_NAME", Attribute::FullName),
    ("BIRTH", Attribute::BirthDate),
    ("BIRTH_DATE", Attribute::BirthDate),
    ("DATE_OF_BIRTH", Attribute::BirthDate),
    ("BIRTH_PLACE", Attribute::BirthPlace),
    ("PLACE_OF_BIRTH", Attribute::BirthPlace),
    ("DEATH", Attribute::DeathDate),
    ("DEATH_DATE", Attribute::DeathDate),
    ("DATE_OF_DEATH", Attribute::DeathDate),
    ("DEATH_TIME", Attribute::DeathTime),
    ("TIME_OF_DEATH", Attribute::DeathTime),
    ("DEATH_PLACE", Attribute::DeathPlace),
    ("PLACE_OF_DEATH", Attribute::DeathPlace),
    ("REQUESTER", Attribute::RequesterName),
    ("REQUESTER_NAME", Attribute::RequesterName),
    ("REQUESTER_PHONE", Attribute::RequesterPhone),
    ("REQUESTER_EMAIL", Attribute::RequesterEmail),
    ("CASE_NUMBER", Attribute::CaseNumber),
    ("CASE_NO", Attribute::CaseNumber),
    ("DATE", Attribute::CurrentDate),
    ("CURRENT_DATE", Attribute::CurrentDate),
    ("TODAY", Attribute::CurrentDate),
];

pub fn attribute_for(key: &str) -> Option<Attribute> {
    AUTO_MAP
        .iter()
        .find(|(candidate, _)| *candidate == key)
        .map(|(_, attribute)| *attribute)
}

/// Value of `attribute` in `record`, formatted for a document. Blank strings
/// count as missing.
pub fn attribute_value(attribute: Attribute, record: &CaseRecord, today: NaiveDate) -> Option<String> {
    let text = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };
    match attribute {
        Attribute::FullName => text(&record.full_name),
        Attribute::BirthDate => record.birth_date.map(|d| d.format(DATE_FORMAT).to_string()),
        Attribute::BirthPlace => text(&record.birth_place),
        Attribute::DeathDate => record.death_date.map(|d| d.format(DATE_FORMAT).to_string()),
        Attribute::DeathTime => record.death_time.map(|t| t.format(TIME_FORMAT).to_string()),
        Attribute::DeathPlace => text(&record.death_place),
        Attribute::RequesterName => text(&record.requester_name),
        Attribute::RequesterPhone => text(&record.requester_phone),
        Attribute::RequesterEmail => text(&record.requester_email),
        Attribute::CaseNumber => text(&record.case_number),
        Attribute::CurrentDate => Some(today.format(DATE_FORMAT).to_string()),
    }
}

/// Compiles `template` for `record`, dating the document with today's local date.
pub fn compile(template: &DocumentTemplate, record: &CaseRecord) -> CompiledDocument {
    compile_at(template, record, Local::now().date_naive())
}

/// Compiles with an explicit value for the current-date placeholders.
pub fn compile_at(template: &DocumentTemplate, record: &CaseRecord, today: NaiveDate) -> CompiledDocument {
    let mut document = CompiledDocument::from_snapshot(template.clone(), SubjectRef::from(record));

    let mut keys: Vec<String> = template.fields.iter().map(|f| f.key.clone()).collect();
    for key in placeholder::extract_keys(&template.content) {
        if !keys.contains(&key) {
            keys.push(key);
        }
    }

    for key in keys {
        let value = attribute_for(&key).and_then(|attribute| attribute_value(attribute, record, today));
        if let Some(value) = value {
            document.field_values.insert(key, value);
        }
    }

    refresh(&mut document);
    debug!(
        "Compiled '{}' for record {}: {} value(s), completed={}",
        template.name,
        record.id,
        document.field_values.len(),
        document.completed
    );
    document
}

/// Sets one field value and re-substitutes from the template snapshot.
pub fn update_field(document: &mut CompiledDocument, key: &str, value: &str) -> EngineResult<()> {
    if !placeholder::is_valid_key(key) {
        return Err(EngineError::Validation(vec![ValidationIssue::InvalidFieldKey(
            key.to_string(),
        )]));
    }
    document.field_values.insert(key.to_string(), value.to_string());
    refresh(document);
    document.touch();
    Ok(())
}

/// Fills every key that has no value yet with its declared non-empty default
/// and re-substitutes. Returns the number of values added. Never called by
/// [`compile`]; the caller decides when defaults apply.
pub fn apply_defaults(document: &mut CompiledDocument) -> usize {
    let defaults: Vec<(String, String)> = document
        .template()
        .fields
        .iter()
        .filter(|f| !f.default_value.is_empty() && !document.field_values.contains_key(&f.key))
        .map(|f| (f.key.clone(), f.default_value.clone()))
        .collect();
    if defaults.is_empty() {
        return 0;
    }
    let added = defaults.len();
    document.field_values.extend(defaults);
    refresh(document);
    document.touch();
    added
}

/// Replaces the final content wholesale. Field values are left as they are;
/// a later field edit re-derives the content from the snapshot again.
pub fn set_raw_content(document: &mut CompiledDocument, text: &str) {
    document.final_content = text.to_string();
    document.completed = placeholder::is_complete(&document.final_content);
    document.touch();
}

/// Forces completion even with tokens still visible.
pub fn mark_completed(document: &mut CompiledDocument) {
    document.completed_override = true;
    document.touch();
}

pub fn clear_completed_override(document: &mut CompiledDocument) {
    document.completed_override = false;
    document.touch();
}

fn refresh(document: &mut CompiledDocument) {
    document.final_content = placeholder::substitute(&document.template().content, &document.field_values);
    document.completed = placeholder::is_complete(&document.final_content);
}

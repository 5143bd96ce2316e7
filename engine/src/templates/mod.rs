//! # Template Store
//!
//! In-memory catalog of [`DocumentTemplate`]s. The catalog is the source of
//! truth for listing and search; persistence is driven by the owning
//! [`Engine`](crate::Engine) after each successful mutation.
//!
//! ## Sub-modules:
//! - `builtin`: the seeded, non-deletable templates (one per category).
//! - `transfer`: single-template import/export to JSON files.
//! - `validate`: shape checks shared by create, update and import.

mod builtin;
mod transfer;
mod validate;

pub use builtin::builtin_templates;

use common::model::template::{DocumentTemplate, FieldSpec, FieldType, TemplateCategory};
use log::info;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult, ValidationIssue};
use crate::placeholder;

const COPY_SUFFIX: &str = "(Copy)";

#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    templates: Vec<DocumentTemplate>,
}

impl TemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding only the seeded built-in templates.
    pub fn with_builtins() -> Self {
        Self {
            templates: builtin_templates(),
        }
    }

    pub fn from_templates(templates: Vec<DocumentTemplate>) -> Self {
        Self { templates }
    }

    pub fn list(&self) -> &[DocumentTemplate] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&DocumentTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn get_required(&self, id: &str) -> EngineResult<&DocumentTemplate> {
        self.get(id).ok_or_else(|| EngineError::template_not_found(id))
    }

    pub fn by_category(&self, category: TemplateCategory) -> Vec<&DocumentTemplate> {
        self.templates
            .iter()
            .filter(|t| t.category == category)
            .collect()
    }

    /// Adds a user template. The built-in flag is always cleared.
    pub fn create(&mut self, mut template: DocumentTemplate) -> EngineResult<&DocumentTemplate> {
        template.is_built_in = false;
        if self.get(&template.id).is_some() {
            return Err(EngineError::Validation(vec![ValidationIssue::IdTaken(
                template.id,
            )]));
        }
        self.check(&template)?;

        info!("Template created: {} ({})", template.name, template.id);
        self.templates.push(template);
        Ok(&self.templates[self.templates.len() - 1])
    }

    /// Replaces the template with the same id and bumps its `modified_at`.
    /// The built-in flag and creation time of the stored template are kept.
    pub fn update(&mut self, mut template: DocumentTemplate) -> EngineResult<&DocumentTemplate> {
        let index = self.index_of(&template.id)?;
        let current = &self.templates[index];
        template.is_built_in = current.is_built_in;
        template.created_at = current.created_at;
        template.modified_at = current.modified_at;
        self.check(&template)?;

        template.touch();
        info!("Template updated: {} ({})", template.name, template.id);
        self.templates[index] = template;
        Ok(&self.templates[index])
    }

    /// Removes a user template. Built-in templates are protected.
    pub fn delete(&mut self, id: &str) -> EngineResult<DocumentTemplate> {
        let index = self.index_of(id)?;
        if self.templates[index].is_built_in {
            return Err(EngineError::ProtectedTemplate(
                self.templates[index].name.clone(),
            ));
        }
        let removed = self.templates.remove(index);
        info!("Template deleted: {} ({})", removed.name, removed.id);
        Ok(removed)
    }

    /// Editable copy of a template: new id, `(Copy)` suffix, never built in.
    pub fn duplicate(&mut self, id: &str) -> EngineResult<DocumentTemplate> {
        let source = self.get_required(id)?;
        let base = if source.name.trim_end().ends_with(COPY_SUFFIX) {
            source.name.trim().to_string()
        } else {
            format!("{} {}", source.name.trim(), COPY_SUFFIX)
        };

        let mut copy = source.clone();
        copy.id = Uuid::new_v4().to_string();
        copy.name = self.available_name(&base);
        copy.is_built_in = false;
        copy.created_at = chrono::Utc::now();
        copy.modified_at = copy.created_at;

        info!("Template duplicated: {} -> {} ({})", id, copy.name, copy.id);
        self.templates.push(copy.clone());
        Ok(copy)
    }

    /// All problems with `template` as it would stand in this catalog.
    pub fn validate(&self, template: &DocumentTemplate) -> Vec<ValidationIssue> {
        validate::issues(template, &self.templates)
    }

    /// Case-insensitive substring match over name, category label and notes.
    pub fn search(&self, query: &str) -> Vec<&DocumentTemplate> {
        let needle = query.trim().to_lowercase();
        self.templates
            .iter()
            .filter(|t| {
                needle.is_empty()
                    || t.name.to_lowercase().contains(&needle)
                    || t.category.label().to_lowercase().contains(&needle)
                    || t.notes.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Template made from OCR output. Fields are discovered from whatever
    /// placeholders the text happens to contain.
    pub fn create_from_extracted_text(
        &mut self,
        name: &str,
        category: TemplateCategory,
        text: &str,
    ) -> EngineResult<DocumentTemplate> {
        let mut template = DocumentTemplate::new(self.available_name(name), category, text);
        template.notes = "Imported from scanned document".to_string();
        discover_fields(&mut template);
        self.create(template).cloned()
    }

    /// Swaps the whole catalog, as done on load and restore.
    pub fn replace_all(&mut self, templates: Vec<DocumentTemplate>) {
        self.templates = templates;
    }

    /// Adds every seeded template missing from the catalog and returns them.
    pub fn ensure_builtins(&mut self) -> Vec<DocumentTemplate> {
        let missing: Vec<DocumentTemplate> = builtin_templates()
            .into_iter()
            .filter(|seed| self.get(&seed.id).is_none())
            .collect();
        self.templates.extend(missing.iter().cloned());
        missing
    }

    fn index_of(&self, id: &str) -> EngineResult<usize> {
        self.templates
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| EngineError::template_not_found(id))
    }

    /// Runs validation, reporting a name clash as `DuplicateName`.
    fn check(&self, template: &DocumentTemplate) -> EngineResult<()> {
        let issues = self.validate(template);
        if let Some(ValidationIssue::NameTaken(name)) = issues
            .iter()
            .find(|i| matches!(i, ValidationIssue::NameTaken(_)))
        {
            return Err(EngineError::DuplicateName(name.clone()));
        }
        if issues.is_empty() {
            Ok(())
        } else {
            Err(EngineError::Validation(issues))
        }
    }

    /// `base` if no user template carries it, otherwise `base 2`, `base 3`, ...
    fn user_name_taken(&self, name: &str) -> bool {
        self.templates
            .iter()
            .any(|t| !t.is_built_in && validate::same_name(&t.name, name))
    }

    fn available_name(&self, base: &str) -> String {
        let base = base.trim();
        if !self.user_name_taken(base) {
            return base.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{} {}", base, n);
            if !self.user_name_taken(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Appends a field for every content key that has none. Returns how many
/// fields were added.
pub fn discover_fields(template: &mut DocumentTemplate) -> usize {
    let missing: Vec<String> = placeholder::extract_keys(&template.content)
        .into_iter()
        .filter(|key| template.field(key).is_none())
        .collect();
    for key in &missing {
        template
            .fields
            .push(FieldSpec::new(humanize(key), key.clone(), guess_type(key)));
    }
    missing.len()
}

/// `DEATH_DATE` -> `Death date`.
fn humanize(key: &str) -> String {
    let words = key.split('_').filter(|w| !w.is_empty()).map(str::to_lowercase);
    let mut out = words.collect::<Vec<_>>().join(" ");
    if !out.is_empty() {
        let first = out[..1].to_uppercase();
        out.replace_range(..1, &first);
    }
    out
}

fn guess_type(key: &str) -> FieldType {
    if key.contains("DATE") {
        FieldType::Date
    } else if key.contains("TIME") {
        FieldType::Time
    } else if key.contains("EMAIL") {
        FieldType::Email
    } else if key.contains("PHONE") {
        FieldType::Phone
    } else {
        FieldType::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn user_template(name: &str) -> DocumentTemplate {
        DocumentTemplate::new(name, TemplateCategory::Other, "Dear {{NAME}}")
    }

    #[test]
    fn create_rejects_duplicate_user_name() {
        let mut store = TemplateStore::new();
        store.create(user_template("Letter")).unwrap();
        let err = store.create(user_template("Letter")).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateName(name) if name == "Letter"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn user_template_may_share_a_builtin_name() {
        let mut store = TemplateStore::with_builtins();
        let builtin_name = store.list()[0].name.clone();
        assert!(store.create(user_template(&builtin_name)).is_ok());
    }

    #[test]
    fn create_reports_shape_problems() {
        let mut store = TemplateStore::new();
        let template = DocumentTemplate::new("  ", TemplateCategory::Other, "")
            .with_fields(vec![FieldSpec::new("Name", "name", FieldType::Text)]);
        match store.create(template) {
            Err(EngineError::Validation(issues)) => {
                assert!(issues.contains(&ValidationIssue::EmptyName));
                assert!(issues.contains(&ValidationIssue::EmptyContent));
                assert!(issues.contains(&ValidationIssue::InvalidFieldKey("name".into())));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(store.is_empty());
    }

    #[test]
    fn update_bumps_modified_and_keeps_identity() {
        let mut store = TemplateStore::new();
        let created = store.create(user_template("Letter")).unwrap().clone();

        let mut edited = created.clone();
        edited.content = "Dear {{NAME}}, thank you".into();
        edited.is_built_in = true;
        let updated = store.update(edited).unwrap();

        assert_eq!(updated.id, created.id);
        assert!(!updated.is_built_in);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.modified_at >= created.modified_at);
        assert_eq!(updated.content, "Dear {{NAME}}, thank you");
    }

    #[test]
    fn update_unknown_id_is_not_found() {
        let mut store = TemplateStore::new();
        let err = store.update(user_template("Ghost")).unwrap_err();
        assert!(matches!(err, EngineError::NotFound { kind: "template", .. }));
    }

    #[test]
    fn builtin_cannot_be_renamed_onto_another_builtin() {
        let mut store = TemplateStore::with_builtins();
        let first = store.list()[0].clone();
        let second_name = store.list()[1].name.clone();
        let mut renamed = first.clone();
        renamed.name = second_name.clone();
        assert!(matches!(
            store.update(renamed),
            Err(EngineError::DuplicateName(name)) if name == second_name
        ));
    }

    #[test]
    fn delete_builtin_is_protected() {
        let mut store = TemplateStore::with_builtins();
        let before = store.list().to_vec();
        let id = before[0].id.clone();
        assert!(matches!(
            store.delete(&id),
            Err(EngineError::ProtectedTemplate(_))
        ));
        assert_eq!(store.list(), before.as_slice());
    }

    #[test]
    fn duplicate_builtin_gives_editable_copy() {
        let mut store = TemplateStore::with_builtins();
        let source = store.list()[0].clone();
        let copy = store.duplicate(&source.id).unwrap();

        assert_ne!(copy.id, source.id);
        assert_eq!(copy.name, format!("{} (Copy)", source.name));
        assert_eq!(copy.content, source.content);
        assert_eq!(copy.fields, source.fields);
        assert!(!copy.is_built_in);
        assert!(store.delete(&copy.id).is_ok());
    }

    #[test]
    fn duplicating_a_copy_does_not_stack_suffixes() {
        let mut store = TemplateStore::new();
        let original = store.create(user_template("Letter")).unwrap().id.clone();
        let first = store.duplicate(&original).unwrap();
        let second = store.duplicate(&first.id).unwrap();
        assert_eq!(first.name, "Letter (Copy)");
        assert_eq!(second.name, "Letter (Copy) 2");
    }

    #[test]
    fn search_is_case_insensitive_over_name_category_and_notes() {
        let mut store = TemplateStore::new();
        store
            .create(user_template("Condolence letter").with_notes("for the parish office"))
            .unwrap();
        let mut invoice = user_template("Final bill");
        invoice.category = TemplateCategory::Invoice;
        store.create(invoice).unwrap();

        assert_eq!(store.search("LETTER").len(), 1);
        assert_eq!(store.search("Parish")[0].name, "Condolence letter");
        assert_eq!(store.search("invoice")[0].name, "Final bill");
        assert_eq!(store.search("").len(), 2);
        assert!(store.search("cremation").is_empty());
    }

    #[test]
    fn discover_fields_adds_missing_keys_only() {
        let mut template = DocumentTemplate::new(
            "Permit",
            TemplateCategory::TransportAuthorization,
            "{{FULL_NAME}} died on {{DEATH_DATE}} at {{DEATH_TIME}}; call {{REQUESTER_PHONE}}",
        )
        .with_fields(vec![FieldSpec::new("Deceased", "FULL_NAME", FieldType::Text)]);

        assert_eq!(discover_fields(&mut template), 3);
        let added: Vec<(&str, &str, FieldType)> = template.fields[1..]
            .iter()
            .map(|f| (f.name.as_str(), f.key.as_str(), f.field_type))
            .collect();
        assert_eq!(
            added,
            vec![
                ("Death date", "DEATH_DATE", FieldType::Date),
                ("Death time", "DEATH_TIME", FieldType::Time),
                ("Requester phone", "REQUESTER_PHONE", FieldType::Phone),
            ]
        );
        assert_eq!(discover_fields(&mut template), 0);
    }

    #[test]
    fn extracted_text_becomes_plain_user_template() {
        let mut store = TemplateStore::new();
        let template = store
            .create_from_extracted_text(
                "Scanned permit",
                TemplateCategory::TransportAuthorization,
                "Permit for {{FULL_NAME}}",
            )
            .unwrap();
        assert!(!template.is_built_in);
        assert_eq!(template.fields.len(), 1);
        assert_eq!(store.len(), 1);
    }
}

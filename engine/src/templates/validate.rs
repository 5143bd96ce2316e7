use std::collections::HashSet;

use common::model::template::DocumentTemplate;

use crate::error::ValidationIssue;
use crate::placeholder;

/// Checks `template` against the rest of `catalog`. The template's own entry
/// (same id) is ignored, so this works for both create and update.
///
/// Names are unique within each group: user templates among user templates,
/// built-ins among built-ins.
pub(super) fn issues(template: &DocumentTemplate, catalog: &[DocumentTemplate]) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let name = template.name.trim();
    if name.is_empty() {
        issues.push(ValidationIssue::EmptyName);
    }
    if template.content.trim().is_empty() {
        issues.push(ValidationIssue::EmptyContent);
    }
    if !name.is_empty()
        && catalog.iter().any(|other| {
            other.id != template.id
                && other.is_built_in == template.is_built_in
                && same_name(&other.name, name)
        })
    {
        issues.push(ValidationIssue::NameTaken(template.name.clone()));
    }

    let mut seen = HashSet::new();
    for field in &template.fields {
        if !placeholder::is_valid_key(&field.key) {
            issues.push(ValidationIssue::InvalidFieldKey(field.key.clone()));
        } else if !seen.insert(field.key.as_str()) {
            issues.push(ValidationIssue::DuplicateFieldKey(field.key.clone()));
        }
    }

    issues
}

/// Template names compare with surrounding whitespace ignored.
pub(super) fn same_name(a: &str, b: &str) -> bool {
    a.trim() == b.trim()
}

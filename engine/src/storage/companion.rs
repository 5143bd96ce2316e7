//! Human-readable `.txt` companion written next to every document JSON.
//! The file is regenerated on each save and never read back.

use chrono::{DateTime, Utc};
use common::model::document::CompiledDocument;

use crate::placeholder;

const RULE: &str = "========================================";

pub(crate) fn render(document: &CompiledDocument, operator_label: &str) -> String {
    let template = document.template();
    let operator = if operator_label.is_empty() {
        "-"
    } else {
        operator_label
    };
    let notes = if document.notes.is_empty() {
        "-"
    } else {
        document.notes.as_str()
    };

    let mut out = String::new();
    out.push_str(&format!("Template:  {}\n", template.name));
    out.push_str(&format!("Category:  {}\n", template.category.label()));
    out.push_str(&format!("Subject:   {}\n", document.subject.summary()));
    out.push_str(&format!("Created:   {}\n", timestamp(&document.created_at)));
    out.push_str(&format!("Modified:  {}\n", timestamp(&document.modified_at)));
    out.push_str(&format!("Operator:  {}\n", operator));
    out.push_str(&format!("Status:    {}\n", status(document)));
    out.push_str(&format!("Notes:     {}\n", notes));
    out.push_str(RULE);
    out.push_str("\n\n");
    out.push_str(&document.final_content);
    out.push('\n');
    out
}

pub fn status(document: &CompiledDocument) -> String {
    if document.completed {
        "Completed".to_string()
    } else if document.completed_override {
        "Completed (marked manually)".to_string()
    } else {
        let open = placeholder::unresolved(&document.final_content).len();
        format!("In progress ({} placeholder(s) open)", open)
    }
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::compile;
    use common::model::case_record::CaseRecord;
    use common::model::template::{DocumentTemplate, TemplateCategory};

    #[test]
    fn header_lists_metadata_then_content() {
        let template = DocumentTemplate::new(
            "Parish notice",
            TemplateCategory::ParishCommunication,
            "Funeral of {{NAME}} at {{PARISH}}",
        );
        let record = CaseRecord::new("c-1")
            .with_full_name("Maria Rossi")
            .with_case_number("2024/017");
        let document = compile::compile(&template, &record);

        let text = render(&document, "front desk");
        assert!(text.starts_with("Template:  Parish notice\nCategory:  Parish communication\n"));
        assert!(text.contains("Subject:   Maria Rossi (case 2024/017)\n"));
        assert!(text.contains("Operator:  front desk\n"));
        assert!(text.contains("Status:    In progress (1 placeholder(s) open)\n"));
        assert!(text.ends_with("Funeral of Maria Rossi at {{PARISH}}\n"));
    }
}

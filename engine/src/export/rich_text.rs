//! RTF envelope around a document's final content.

use common::model::document::CompiledDocument;

use crate::documents::compile::DATE_FORMAT;

pub(super) fn render(document: &CompiledDocument) -> String {
    let template = document.template();
    let mut out = String::new();

    out.push_str("{\\rtf1\\ansi\\ansicpg1252\\deff0\n");
    out.push_str("{\\fonttbl{\\f0\\fswiss Helvetica;}}\n");
    out.push_str(&format!("{{\\info{{\\title {}}}}}\n", escape(&template.name)));
    out.push_str("\\f0\\fs20\n");

    // Header
    out.push_str(&format!("{{\\b Template:}} {}\\line\n", escape(&template.name)));
    out.push_str(&format!(
        "{{\\b Category:}} {}\\line\n",
        escape(template.category.label())
    ));
    out.push_str(&format!(
        "{{\\b Subject:}} {}\\line\n",
        escape(&document.subject.summary())
    ));
    out.push_str(&format!(
        "{{\\b Date:}} {}\\par\n",
        document.modified_at.format(DATE_FORMAT)
    ));
    out.push_str("\\par\n");

    for line in document.final_content.lines() {
        out.push_str(&escape(line));
        out.push_str("\\par\n");
    }

    out.push_str("\\par\n");
    out.push_str(&format!(
        "{{\\i\\fs16 {} | {}}}\\par\n",
        escape(&template.name),
        escape(&document.subject.summary())
    ));
    out.push('}');
    out
}

/// Escapes RTF control characters; non-ASCII text becomes `\uN?` escapes
/// (UTF-16 code units, signed as RTF expects).
pub(super) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '\t' => out.push_str("\\tab "),
            c if c.is_ascii() => out.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{}?", *unit as i16));
                }
            }
        }
    }
    out
}

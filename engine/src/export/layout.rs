//! Page layout for paginated export.
//!
//! Content lines are wrapped to the page's text width at word boundaries and
//! then distributed over pages. A page break only ever falls between two
//! laid-out lines. Glyph metrics are approximated from the font size; the
//! renderer receives the finished line list and does no reflow of its own.
//!
//! The approximation holds for fonts whose ascent, descent and line gap sum
//! to at most 1.2 em (Liberation Sans and DejaVu Sans both do). The
//! header and footer each take a line plus a blank line in the rendered flow,
//! so their bands never reserve less than two lines, and one body line per
//! page is left unused to absorb rounding in the renderer.

use common::model::document::CompiledDocument;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

const PT_TO_MM: f64 = 25.4 / 72.0;
/// Average glyph advance as a fraction of the font size.
const CHAR_WIDTH_EM: f64 = 0.5;
/// Baseline-to-baseline distance as a multiple of the font size.
const LEADING: f64 = 1.2;
/// Minimum header or footer band, in lines.
const BAND_LINES: f64 = 2.0;

/// Physical page description. Defaults to A4 portrait with the 10 mm margin
/// used for on-screen previews.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageGeometry {
    pub width_mm: f64,
    pub height_mm: f64,
    pub margin_mm: f64,
    pub header_band_mm: f64,
    pub footer_band_mm: f64,
    pub font_size_pt: u8,
    pub line_spacing: f64,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            width_mm: 210.0,
            height_mm: 297.0,
            margin_mm: 10.0,
            header_band_mm: 12.0,
            footer_band_mm: 10.0,
            font_size_pt: 10,
            line_spacing: 1.0,
        }
    }
}

impl PageGeometry {
    pub fn line_height_mm(&self) -> f64 {
        f64::from(self.font_size_pt) * PT_TO_MM * LEADING * self.line_spacing
    }

    pub fn text_width_mm(&self) -> f64 {
        self.width_mm - 2.0 * self.margin_mm
    }

    pub fn text_height_mm(&self) -> f64 {
        let min_band = BAND_LINES * self.line_height_mm();
        self.height_mm
            - 2.0 * self.margin_mm
            - self.header_band_mm.max(min_band)
            - self.footer_band_mm.max(min_band)
    }

    /// Characters that fit on one line of body text.
    pub fn chars_per_line(&self) -> usize {
        let char_width = f64::from(self.font_size_pt) * PT_TO_MM * CHAR_WIDTH_EM;
        (self.text_width_mm() / char_width).floor() as usize
    }

    /// Body lines that fit between the header and footer bands, less one.
    pub fn lines_per_page(&self) -> usize {
        let fit = (self.text_height_mm() / self.line_height_mm()).floor() as usize;
        fit.saturating_sub(1)
    }

    fn check(&self) -> EngineResult<()> {
        if self.font_size_pt == 0 || self.line_spacing <= 0.0 {
            return Err(EngineError::Export(
                "font size and line spacing must be positive".to_string(),
            ));
        }
        if self.chars_per_line() == 0 || self.lines_per_page() == 0 {
            return Err(EngineError::Export(format!(
                "page {}x{} mm leaves no room for text",
                self.width_mm, self.height_mm
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub number: usize,
    pub header: String,
    pub lines: Vec<String>,
    pub footer: String,
}

/// Laid-out document handed to a [`PageRenderer`](super::PageRenderer).
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub title: String,
    pub geometry: PageGeometry,
    pub pages: Vec<Page>,
}

pub fn layout(document: &CompiledDocument, geometry: &PageGeometry) -> EngineResult<PageLayout> {
    geometry.check()?;
    let width = geometry.chars_per_line();
    let per_page = geometry.lines_per_page();

    let lines: Vec<String> = document
        .final_content
        .lines()
        .flat_map(|line| wrap_line(line, width))
        .collect();

    let chunks: Vec<Vec<String>> = if lines.is_empty() {
        vec![Vec::new()]
    } else {
        lines.chunks(per_page).map(<[String]>::to_vec).collect()
    };
    let total = chunks.len();
    let header = format!(
        "{} | {}",
        document.template().name,
        document.subject.summary()
    );

    let pages = chunks
        .into_iter()
        .enumerate()
        .map(|(i, lines)| Page {
            number: i + 1,
            header: header.clone(),
            lines,
            footer: format!("Page {} of {}", i + 1, total),
        })
        .collect();

    Ok(PageLayout {
        title: document.template().name.clone(),
        geometry: *geometry,
        pages,
    })
}

/// Greedy word wrap that keeps the line's own spacing. Leading indentation
/// is repeated on continuation lines unless it takes half the width or more;
/// runs of spaces between words survive, except at a break. Words longer
/// than the available room are split hard. An empty line stays one empty
/// line.
pub fn wrap_line(line: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let line = line.trim_end();
    if line.chars().count() <= width {
        return vec![line.to_string()];
    }

    let body = line.trim_start();
    let indent = &line[..line.len() - body.len()];
    let indent = if indent.chars().count() * 2 < width { indent } else { "" };
    let indent_len = indent.chars().count();
    let room = width - indent_len;

    let mut out = Vec::new();
    let mut current = indent.to_string();
    let mut current_len = indent_len;
    let mut has_word = false;
    for (gap, word) in segments(body) {
        let mut word: Vec<char> = word.chars().collect();
        let gap_len = gap.chars().count();
        if has_word {
            if current_len + gap_len + word.len() <= width {
                current.push_str(gap);
                current.extend(word.iter());
                current_len += gap_len + word.len();
                continue;
            }
            out.push(std::mem::replace(&mut current, indent.to_string()));
            current_len = indent_len;
            has_word = false;
        }
        while word.len() > room {
            let piece: String = word.drain(..room).collect();
            out.push(format!("{}{}", indent, piece));
        }
        if !word.is_empty() {
            current.extend(word.iter());
            current_len += word.len();
            has_word = true;
        }
    }
    if has_word {
        out.push(current);
    }
    out
}

/// Splits trimmed text into `(whitespace before, word)` pairs.
fn segments(text: &str) -> Vec<(&str, &str)> {
    let mut out = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let word_start = rest.find(|c: char| !c.is_whitespace()).unwrap_or(rest.len());
        let tail = &rest[word_start..];
        let word_end = tail.find(char::is_whitespace).unwrap_or(tail.len());
        out.push((&rest[..word_start], &tail[..word_end]));
        rest = &tail[word_end..];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::compile;
    use common::model::case_record::CaseRecord;
    use common::model::template::{DocumentTemplate, TemplateCategory};
    use pretty_assertions::assert_eq;

    fn document_with(content: &str) -> CompiledDocument {
        let template = DocumentTemplate::new("Notice", TemplateCategory::Other, content);
        compile::compile(&template, &CaseRecord::new("c-1").with_full_name("Maria Rossi"))
    }

    #[test]
    fn default_a4_capacity() {
        let g = PageGeometry::default();
        assert_eq!(g.chars_per_line(), 107);
        assert_eq!(g.lines_per_page(), 59);
    }

    #[test]
    fn bands_reserve_room_for_header_and_footer_lines() {
        let bare = PageGeometry {
            header_band_mm: 0.0,
            footer_band_mm: 0.0,
            ..PageGeometry::default()
        };
        let two_lines = 2.0 * bare.line_height_mm();
        let expected = bare.height_mm - 2.0 * bare.margin_mm - 2.0 * two_lines;
        assert!((bare.text_height_mm() - expected).abs() < 1e-9);
        assert_eq!(bare.lines_per_page(), 60);

        let large = PageGeometry {
            font_size_pt: 14,
            ..bare
        };
        let body = large.lines_per_page() as f64 * large.line_height_mm();
        assert!(body + 4.0 * large.line_height_mm() <= large.height_mm - 2.0 * large.margin_mm);
    }

    #[test]
    fn wrap_respects_word_boundaries() {
        assert_eq!(
            wrap_line("the quick brown fox jumps", 10),
            vec!["the quick", "brown fox", "jumps"]
        );
        assert_eq!(wrap_line("", 10), vec![""]);
        assert_eq!(wrap_line("abcdefghijkl xy", 5), vec!["abcde", "fghij", "kl xy"]);
    }

    #[test]
    fn wrap_keeps_indentation_on_continuation_lines() {
        assert_eq!(
            wrap_line("    alpha beta gamma delta", 14),
            vec!["    alpha beta", "    gamma", "    delta"]
        );
        // Indentation of half the width or more is not repeated.
        assert_eq!(
            wrap_line("          alpha beta", 12),
            vec!["alpha beta"]
        );
    }

    #[test]
    fn wrap_keeps_spacing_between_words() {
        assert_eq!(
            wrap_line("Name:     Maria   Rossi  born 1950", 20),
            vec!["Name:     Maria", "Rossi  born 1950"]
        );
        assert_eq!(wrap_line("Total:   12.00", 20), vec!["Total:   12.00"]);
    }

    #[test]
    fn wrapped_lines_never_exceed_width() {
        let text = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod";
        for width in [3, 7, 12, 40] {
            assert!(wrap_line(text, width).iter().all(|l| l.chars().count() <= width));
        }
    }

    #[test]
    fn overflow_moves_whole_lines_to_next_page() {
        let geometry = PageGeometry::default();
        let per_page = geometry.lines_per_page();
        let content: Vec<String> = (0..per_page + 5).map(|i| format!("line {}", i)).collect();
        let doc = document_with(&content.join("\n"));

        let layout = layout(&doc, &geometry).unwrap();
        assert_eq!(layout.pages.len(), 2);
        assert_eq!(layout.pages[0].lines.len(), per_page);
        assert_eq!(layout.pages[1].lines[0], format!("line {}", per_page));
        assert_eq!(layout.pages[1].footer, "Page 2 of 2");
        assert_eq!(layout.pages[0].header, "Notice | Maria Rossi");
    }

    #[test]
    fn empty_content_still_has_one_page() {
        let mut doc = document_with("x");
        compile::set_raw_content(&mut doc, "");
        let layout = layout(&doc, &PageGeometry::default()).unwrap();
        assert_eq!(layout.pages.len(), 1);
        assert!(layout.pages[0].lines.is_empty());
    }

    #[test]
    fn degenerate_geometry_is_an_export_error() {
        let geometry = PageGeometry {
            height_mm: 30.0,
            ..PageGeometry::default()
        };
        assert!(matches!(
            layout(&document_with("x"), &geometry),
            Err(EngineError::Export(_))
        ));
    }
}

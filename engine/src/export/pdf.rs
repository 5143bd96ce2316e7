//! PDF rendering backed by `genpdf`.

use std::path::PathBuf;

use genpdf::elements::{Break, PageBreak, Paragraph};
use genpdf::style::{Style, StyledString};
use genpdf::{Document, SimplePageDecorator, Size};

use super::layout::PageLayout;
use super::{PageRenderer, RenderError};
use crate::config::EngineConfig;

/// Renders laid-out pages with a TrueType family loaded from disk
/// (`<font_dir>/<family>-Regular.ttf`, `-Bold`, `-Italic`, `-BoldItalic`).
/// Page capacity is computed for a line height of 1.2 em; families with
/// taller metrics can push the footer onto an extra page.
#[derive(Debug, Clone)]
pub struct GenpdfRenderer {
    font_dir: PathBuf,
    font_family: String,
}

impl GenpdfRenderer {
    pub fn new(font_dir: impl Into<PathBuf>, font_family: impl Into<String>) -> Self {
        Self {
            font_dir: font_dir.into(),
            font_family: font_family.into(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.font_dir.clone(), config.font_family.clone())
    }

    fn configure_document(&self, layout: &PageLayout) -> Result<Document, RenderError> {
        let font_family = genpdf::fonts::from_files(&self.font_dir, &self.font_family, None)
            .map_err(|e| {
                RenderError(format!(
                    "cannot load font family {} from {}: {}",
                    self.font_family,
                    self.font_dir.display(),
                    e
                ))
            })?;

        let geometry = &layout.geometry;
        let mut doc = Document::new(font_family);
        doc.set_title(layout.title.clone());
        doc.set_paper_size(Size::new(geometry.width_mm, geometry.height_mm));
        doc.set_font_size(geometry.font_size_pt);
        doc.set_line_spacing(geometry.line_spacing);

        let mut decorator = SimplePageDecorator::new();
        decorator.set_margins(geometry.margin_mm);
        doc.set_page_decorator(decorator);
        Ok(doc)
    }
}

impl PageRenderer for GenpdfRenderer {
    fn render(&self, layout: &PageLayout) -> Result<Vec<u8>, RenderError> {
        let mut doc = self.configure_document(layout)?;

        for (i, page) in layout.pages.iter().enumerate() {
            if i > 0 {
                doc.push(PageBreak::new());
            }
            doc.push(Paragraph::new(StyledString::new(
                page.header.clone(),
                Style::new().bold(),
            )));
            doc.push(Break::new(1));
            for line in &page.lines {
                if line.is_empty() {
                    doc.push(Break::new(1));
                } else {
                    doc.push(Paragraph::new(line.clone()));
                }
            }
            doc.push(Break::new(1));
            doc.push(Paragraph::new(StyledString::new(
                page.footer.clone(),
                Style::new().italic(),
            )));
        }

        let mut bytes = Vec::new();
        doc.render(&mut bytes)
            .map_err(|e| RenderError(format!("PDF rendering failed: {}", e)))?;
        Ok(bytes)
    }
}

//! # Multi-format Exporter
//!
//! Pure functions from a [`CompiledDocument`] to a deliverable:
//!
//! - plain text: the final content unchanged;
//! - rich text: an RTF envelope with a metadata header and footer;
//! - paginated: a [`layout`] handed to a [`PageRenderer`] (PDF through
//!   [`GenpdfRenderer`] in production).
//!
//! A renderer failure is reported as [`EngineError::Export`]; there is no
//! fallback to another format. Forced and organic completion are exported
//! the same way.

pub mod layout;
mod pdf;
mod rich_text;

pub use layout::{Page, PageGeometry, PageLayout};
pub use pdf::GenpdfRenderer;

use common::model::document::CompiledDocument;
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{EngineError, EngineResult};

/// Failure inside a rendering backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct RenderError(pub String);

/// Rendering backend for paginated output: receives finished pages and
/// returns the encoded file.
pub trait PageRenderer: Send + Sync {
    fn render(&self, layout: &PageLayout) -> Result<Vec<u8>, RenderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExportFormat {
    PlainText,
    RichText,
    Paginated,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::PlainText => "txt",
            ExportFormat::RichText => "rtf",
            ExportFormat::Paginated => "pdf",
        }
    }
}

/// `<template name slug>-<first 8 of id>.<ext>`, portable on any file system.
pub fn file_name(document: &CompiledDocument, format: ExportFormat) -> String {
    let slug: String = document
        .template()
        .name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    let slug = slug
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    let short_id: String = document.id.chars().take(8).collect();
    format!("{}-{}.{}", slug, short_id, format.extension())
}

pub fn to_plain_text(document: &CompiledDocument) -> String {
    document.final_content.clone()
}

pub fn to_rich_text(document: &CompiledDocument) -> String {
    rich_text::render(document)
}

pub fn to_paginated_document(
    document: &CompiledDocument,
    geometry: &PageGeometry,
    renderer: &dyn PageRenderer,
) -> EngineResult<Vec<u8>> {
    let layout = layout::layout(document, geometry)?;
    debug!(
        "Rendering document {} on {} page(s)",
        document.id,
        layout.pages.len()
    );
    let bytes = renderer
        .render(&layout)
        .map_err(|e| EngineError::Export(e.to_string()))?;
    if bytes.is_empty() {
        return Err(EngineError::Export("renderer produced no output".to_string()));
    }
    Ok(bytes)
}

/// Dispatches on `format`.
pub fn export(
    document: &CompiledDocument,
    format: ExportFormat,
    geometry: &PageGeometry,
    renderer: &dyn PageRenderer,
) -> EngineResult<Vec<u8>> {
    match format {
        ExportFormat::PlainText => Ok(to_plain_text(document).into_bytes()),
        ExportFormat::RichText => Ok(to_rich_text(document).into_bytes()),
        ExportFormat::Paginated => to_paginated_document(document, geometry, renderer),
    }
}

//! Data model shared between the document engine and the host application.
//!
//! Everything in this crate is plain data: templates, compiled documents,
//! backup snapshots, the case record consumed from the case provider and the
//! status of background jobs. All types serialize to camelCase JSON, which is
//! the on-disk format of the engine's file store.

pub mod jobs;
pub mod model;

/// Persisted-format version written into every template, document and
/// snapshot. Readers refuse snapshots newer than this.
pub const FORMAT_VERSION: u32 = 1;

//! Document template engine for a funeral-services office.
//!
//! Templates with `{{KEY}}` placeholders are compiled against a case record
//! into standalone documents, persisted as JSON files under a data root,
//! backed up as whole-catalog snapshots and exported as plain text, RTF or
//! PDF. [`Engine`] ties the pieces together; [`jobs`] runs the slow
//! operations in the background.

pub mod backup;
pub mod config;
pub mod documents;
pub mod engine;
pub mod error;
pub mod export;
pub mod jobs;
pub mod placeholder;
pub mod sources;
pub mod storage;
pub mod templates;

pub use config::EngineConfig;
pub use engine::{Engine, PendingWrite};
pub use error::{EngineError, EngineResult, ValidationIssue};
pub use export::{ExportFormat, GenpdfRenderer, PageRenderer};
pub use sources::{CaseRecordProvider, InMemoryCaseRecords, TextExtractor};

use env_logger::Env;

/// Installs the `env_logger` backend, defaulting to `info`. Calling it again
/// is harmless.
pub fn init_logging() {
    let _ = env_logger::try_init_from_env(Env::default().default_filter_or("info"));
}

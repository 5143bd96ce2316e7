//! Error taxonomy of the engine.
//!
//! Every fallible operation returns [`EngineResult`]. Catalog invariant
//! violations leave the catalog untouched; I/O failures after an in-memory
//! mutation leave the mutation in place and the entity is tracked as unsaved.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// One problem found while validating a template or a field edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyName,
    EmptyContent,
    IdTaken(String),
    NameTaken(String),
    InvalidFieldKey(String),
    DuplicateFieldKey(String),
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyName => write!(f, "name must not be empty"),
            ValidationIssue::EmptyContent => write!(f, "content must not be empty"),
            ValidationIssue::IdTaken(id) => write!(f, "id '{}' is already in use", id),
            ValidationIssue::NameTaken(name) => write!(f, "name '{}' is already in use", name),
            ValidationIssue::InvalidFieldKey(key) => {
                write!(f, "field key '{}' must match [A-Z_]+", key)
            }
            ValidationIssue::DuplicateFieldKey(key) => {
                write!(f, "field key '{}' is declared more than once", key)
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("validation failed: {}", join_issues(.0))]
    Validation(Vec<ValidationIssue>),

    #[error("a template named '{0}' already exists")]
    DuplicateName(String),

    #[error("template '{0}' is built in and cannot be deleted")]
    ProtectedTemplate(String),

    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("cannot decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot format version {found} is newer than supported version {supported}")]
    UnsupportedSnapshotVersion { found: u32, supported: u32 },

    #[error("export failed: {0}")]
    Export(String),

    #[error("operation cancelled")]
    Cancelled,
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EngineError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn decode(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        EngineError::Decode {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn template_not_found(id: &str) -> Self {
        EngineError::NotFound {
            kind: "template",
            id: id.to_string(),
        }
    }

    pub(crate) fn document_not_found(id: &str) -> Self {
        EngineError::NotFound {
            kind: "document",
            id: id.to_string(),
        }
    }
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

//! Engine configuration.
//!
//! Defaults match a single-desk installation: data under `./requiem-data`,
//! fonts under `./fonts`, A4 pages. The host application either builds an
//! [`EngineConfig`] directly, loads one from a JSON file, or lets
//! `REQUIEM_*` environment variables override the defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::export::layout::PageGeometry;

const DEFAULT_DATA_ROOT: &str = "./requiem-data";
const DEFAULT_FONT_DIR: &str = "./fonts";
const DEFAULT_FONT_FAMILY: &str = "LiberationSans";
const DEFAULT_MAX_BACKUPS: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Root of the file store (`templates/`, `documents/`, `backups/`, `exports/`).
    pub data_root: PathBuf,
    /// Written into document companions and backup metadata.
    pub operator_label: String,
    pub page: PageGeometry,
    /// Directory holding the TTF files of `font_family` for paginated export.
    pub font_dir: PathBuf,
    pub font_family: String,
    /// Backups kept after pruning; 0 keeps every backup.
    pub max_backups: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from(DEFAULT_DATA_ROOT),
            operator_label: String::new(),
            page: PageGeometry::default(),
            font_dir: PathBuf::from(DEFAULT_FONT_DIR),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            max_backups: DEFAULT_MAX_BACKUPS,
        }
    }
}

impl EngineConfig {
    /// Config rooted at `data_root`, everything else default.
    pub fn with_data_root(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            ..Self::default()
        }
    }

    /// Reads a JSON config file. Missing keys take their default value.
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| EngineError::io(path, e))?;
        serde_json::from_str(&raw).map_err(|e| EngineError::decode(path, e))
    }

    /// Defaults overridden by `REQUIEM_DATA_ROOT`, `REQUIEM_OPERATOR`,
    /// `REQUIEM_FONT_DIR`, `REQUIEM_FONT_FAMILY` and `REQUIEM_MAX_BACKUPS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(root) = env::var("REQUIEM_DATA_ROOT") {
            config.data_root = PathBuf::from(root);
        }
        if let Ok(operator) = env::var("REQUIEM_OPERATOR") {
            config.operator_label = operator;
        }
        if let Ok(dir) = env::var("REQUIEM_FONT_DIR") {
            config.font_dir = PathBuf::from(dir);
        }
        if let Ok(family) = env::var("REQUIEM_FONT_FAMILY") {
            config.font_family = family;
        }
        if let Ok(raw) = env::var("REQUIEM_MAX_BACKUPS") {
            match raw.parse() {
                Ok(n) => config.max_backups = n,
                Err(_) => warn!("Ignoring REQUIEM_MAX_BACKUPS={:?}: not a number", raw),
            }
        }
        config
    }
}

//! Temp-then-rename writes. A reader never observes a half-written file: the
//! bytes go to a temporary file in the target directory, which is then
//! renamed over the destination.

use std::fs;
use std::io::Write;
use std::path::Path;

use log::debug;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::{EngineError, EngineResult};

pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> EngineResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| EngineError::io(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| EngineError::io(dir, e))?;
    tmp.write_all(bytes).map_err(|e| EngineError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| EngineError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| EngineError::io(path, e.error))?;

    debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

pub(crate) fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> EngineResult<()> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|e| EngineError::io(path, e.into()))?;
    write_atomic(path, &bytes)
}

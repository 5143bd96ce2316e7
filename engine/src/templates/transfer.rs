//! Single-template exchange files.
//!
//! An exported template is the same camelCase JSON the store writes under
//! `templates/`. Importing never overwrites: a clashing name becomes
//! `"<name> (Imported)"`, a clashing id is replaced by a fresh one, and the
//! built-in flag is always dropped.

use std::fs;
use std::path::Path;

use common::model::template::DocumentTemplate;
use log::info;
use uuid::Uuid;

use super::TemplateStore;
use crate::error::{EngineError, EngineResult};
use crate::storage::atomic::write_json_atomic;

const IMPORTED_SUFFIX: &str = "(Imported)";

impl TemplateStore {
    /// Reads a template file and adds it to the catalog under a free name.
    pub fn import_from_file(&mut self, path: impl AsRef<Path>) -> EngineResult<DocumentTemplate> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| EngineError::io(path, e))?;
        let mut template: DocumentTemplate =
            serde_json::from_str(&raw).map_err(|e| EngineError::decode(path, e))?;

        template.is_built_in = false;
        if self.get(&template.id).is_some() {
            template.id = Uuid::new_v4().to_string();
        }
        if self.user_name_taken(&template.name) {
            let base = format!("{} {}", template.name.trim(), IMPORTED_SUFFIX);
            template.name = self.available_name(&base);
        }
        template.touch();

        let created = self.create(template)?.clone();
        info!("Template imported from {}: {}", path.display(), created.name);
        Ok(created)
    }

    /// Writes one template to `path` as pretty JSON.
    pub fn export_to_file(&self, id: &str, path: impl AsRef<Path>) -> EngineResult<()> {
        let template = self.get_required(id)?;
        write_json_atomic(path.as_ref(), template)?;
        info!("Template exported to {}: {}", path.as_ref().display(), template.name);
        Ok(())
    }
}

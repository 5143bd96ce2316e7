pub mod case_record;
pub mod document;
pub mod snapshot;
pub mod template;

//! Background execution of long operations with progress and cancellation.

mod schedule;
mod state;

pub use schedule::{
    schedule_backup_job, schedule_export_job, schedule_ocr_import_job, schedule_restore_job,
    SharedEngine,
};
pub use state::{start_job_updater, JobHandle, JobUpdate, JobsState};

#[cfg(test)]
mod tests;

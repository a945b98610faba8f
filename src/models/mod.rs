pub mod job_status;
pub mod sync_run;
pub mod sync_settings;

pub use job_status::{JobStatus, StatusResponse};
pub use sync_run::{FailedEntry, RunOutcome, SyncReport, SyncRun};
pub use sync_settings::{MergePolicy, SyncSettings};

pub mod analysis_job;
pub mod presenter;

pub use analysis_job::{AnalysisJob, JobError, JobState};

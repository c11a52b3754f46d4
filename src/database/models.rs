pub mod job_status;
pub mod scheduled_job;

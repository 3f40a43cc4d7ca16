pub mod activity_statuses;
pub mod job_statuses;
pub mod job_types;
pub mod platforms;

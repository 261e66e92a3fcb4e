pub mod files;
pub mod jobs;
pub mod workflows;

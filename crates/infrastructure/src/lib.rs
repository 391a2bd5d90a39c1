//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod console_config;
mod file_download_target;
mod in_memory_download_target;
mod in_memory_submission_repository;
mod telemetry;

pub use console_config::ConsoleConfig;
pub use file_download_target::FileDownloadTarget;
pub use in_memory_download_target::InMemoryDownloadTarget;
pub use in_memory_submission_repository::InMemorySubmissionRepository;
pub use telemetry::init_tracing;

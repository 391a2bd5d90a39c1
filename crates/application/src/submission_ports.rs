use async_trait::async_trait;
use chrono::{DateTime, Utc};
use formvault_core::AppResult;
use formvault_domain::{SubmissionNote, SubmissionRecord, SubmissionStatus};

use crate::export_formatter::ExportArtifact;

/// Repository port for the external submission store.
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Lists submissions, optionally scoped to one form.
    async fn list_submissions(&self, form_id: Option<&str>) -> AppResult<Vec<SubmissionRecord>>;

    /// Looks up a single submission.
    async fn find_submission(&self, submission_id: &str) -> AppResult<Option<SubmissionRecord>>;

    /// Inserts or replaces a submission.
    async fn save_submission(&self, record: SubmissionRecord) -> AppResult<()>;

    /// Deletes a submission; fails with `NotFound` for unknown ids.
    async fn delete_submission(&self, submission_id: &str) -> AppResult<()>;

    /// Appends a reviewer note to a submission.
    async fn append_note(&self, submission_id: &str, note: SubmissionNote) -> AppResult<()>;

    /// Updates the review status of a submission.
    async fn set_status(&self, submission_id: &str, status: SubmissionStatus) -> AppResult<()>;
}

/// Port for the browser or OS mechanism that persists exported files.
#[async_trait]
pub trait DownloadTarget: Send + Sync {
    /// Hands a finished export over for saving.
    async fn deliver(&self, artifact: &ExportArtifact) -> AppResult<()>;
}

/// Source of "now" for relative date windows and export file names.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock implementation of [`Clock`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at one instant, for replays and tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

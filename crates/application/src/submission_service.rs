use std::sync::Arc;

use formvault_core::{AppError, AppResult};
use formvault_domain::{SubmissionNote, SubmissionRecord, SubmissionStatus};
use serde::Serialize;
use tracing::{info, warn};

use crate::query_pipeline::SubmissionQueryPipeline;
use crate::submission_ports::{Clock, SubmissionRepository};


/// Outcome of a bulk delete, listing every id that could not be removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteReport {
    /// Ids removed from the store.
    pub deleted: Vec<String>,
    /// Ids that failed, with the reason.
    pub failed: Vec<(String, String)>,
}

impl BulkDeleteReport {
    /// Returns whether every requested delete succeeded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Application service tying the submission store to a query pipeline.
#[derive(Clone)]
pub struct SubmissionService {
    repository: Arc<dyn SubmissionRepository>,
    clock: Arc<dyn Clock>,
}

impl SubmissionService {
    /// Creates a new submission service.
    #[must_use]
    pub fn new(repository: Arc<dyn SubmissionRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Loads a fresh snapshot into `pipeline`.
    ///
    /// On failure the pipeline keeps its last records and is marked with a
    /// retryable data-source error, which is also returned.
    pub async fn refresh(
        &self,
        pipeline: &mut SubmissionQueryPipeline,
        form_id: Option<&str>,
    ) -> AppResult<usize> {
        match self.repository.list_submissions(form_id).await {
            Ok(records) => {
                let count = records.len();
                pipeline.replace_records(records);
                info!(form_id, count, "submissions refreshed");
                Ok(count)
            }
            Err(error) => {
                let error = match error {
                    AppError::DataSource(_) => error,
                    other => AppError::DataSource(other.to_string()),
                };
                pipeline.record_source_failure(error.clone());
                Err(error)
            }
        }
    }

    /// Returns one submission from the store.
    pub async fn get_submission(&self, submission_id: &str) -> AppResult<SubmissionRecord> {
        self.repository
            .find_submission(submission_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("submission '{submission_id}' not found")))
    }

    /// Deletes each id independently and reports per-id failures.
    pub async fn delete_submissions(
        &self,
        pipeline: &mut SubmissionQueryPipeline,
        submission_ids: &[String],
    ) -> BulkDeleteReport {
        let mut report = BulkDeleteReport::default();

        for submission_id in submission_ids {
            match self.repository.delete_submission(submission_id).await {
                Ok(()) => {
                    pipeline.remove_record(submission_id);
                    report.deleted.push(submission_id.clone());
                }
                Err(error) => {
                    warn!(submission_id = submission_id.as_str(), error = %error, "delete failed");
                    report.failed.push((submission_id.clone(), error.to_string()));
                }
            }
        }

        info!(
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "bulk delete finished"
        );
        report
    }

    /// Appends a reviewer note and mirrors it into the pipeline.
    pub async fn add_note(
        &self,
        pipeline: &mut SubmissionQueryPipeline,
        submission_id: &str,
        text: &str,
        added_by: &str,
    ) -> AppResult<SubmissionNote> {
        let note = SubmissionNote::new(text, added_by, self.clock.now())?;
        self.repository
            .append_note(submission_id, note.clone())
            .await?;

        if let Some(mut record) = pipeline.find(submission_id).cloned() {
            record.append_note(note.clone());
            pipeline.insert_record(record);
        }

        Ok(note)
    }

    /// Updates the review status and mirrors it into the pipeline.
    pub async fn set_status(
        &self,
        pipeline: &mut SubmissionQueryPipeline,
        submission_id: &str,
        status: SubmissionStatus,
    ) -> AppResult<()> {
        self.repository.set_status(submission_id, status).await?;

        if let Some(mut record) = pipeline.find(submission_id).cloned() {
            record.set_status(status);
            pipeline.insert_record(record);
        }

        Ok(())
    }

    /// Stars or unstars a submission.
    pub async fn set_starred(
        &self,
        pipeline: &mut SubmissionQueryPipeline,
        submission_id: &str,
        starred: bool,
    ) -> AppResult<()> {
        let mut record = self.get_submission(submission_id).await?;
        record.set_starred(starred);
        self.repository.save_submission(record.clone()).await?;
        pipeline.insert_record(record);
        Ok(())
    }
}

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use formvault_core::{AppError, AppResult};
use formvault_domain::{FieldSchema, SubmissionRecord};
use serde::Serialize;
use tracing::{info, warn};

use crate::export_formatter::{
    ExportLimits, ExportOptions, ExportValidation, render_export, restrict_to_selection,
    validate_export,
};
use crate::submission_ports::{Clock, DownloadTarget};

/// Default number of history entries an [`ExportSession`] keeps.
pub const DEFAULT_EXPORT_HISTORY: usize = 20;

/// Result of one export attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "reason")]
pub enum ExportOutcome {
    /// The download target accepted the file.
    Delivered,
    /// Rendering or delivery failed.
    Failed(String),
}

/// Entry in an export history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReceipt {
    /// Suggested file name.
    pub filename: String,
    /// Format name as requested.
    pub format: String,
    /// Records written.
    pub record_count: usize,
    /// Completion time.
    pub finished_at: DateTime<Utc>,
    /// Delivery outcome.
    pub outcome: ExportOutcome,
}

/// Caller-owned export history, newest entry first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSession {
    history: VecDeque<ExportReceipt>,
    capacity: usize,
}

impl ExportSession {
    /// Creates an empty session keeping at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Returns the history, newest first.
    pub fn history(&self) -> impl Iterator<Item = &ExportReceipt> {
        self.history.iter()
    }

    /// Returns the most recent entry.
    #[must_use]
    pub fn last(&self) -> Option<&ExportReceipt> {
        self.history.front()
    }

    /// Forgets every entry.
    pub fn clear(&mut self) {
        self.history.clear();
    }

    fn record(&mut self, receipt: ExportReceipt) {
        if self.capacity == 0 {
            return;
        }
        self.history.push_front(receipt);
        self.history.truncate(self.capacity);
    }
}

impl Default for ExportSession {
    fn default() -> Self {
        Self::new(DEFAULT_EXPORT_HISTORY)
    }
}

/// Runs exports end to end: validate, render, deliver, remember.
#[derive(Clone)]
pub struct SubmissionExporter {
    target: Arc<dyn DownloadTarget>,
    limits: ExportLimits,
    clock: Arc<dyn Clock>,
}

impl SubmissionExporter {
    /// Creates an exporter writing to `target`.
    #[must_use]
    pub fn new(target: Arc<dyn DownloadTarget>, limits: ExportLimits, clock: Arc<dyn Clock>) -> Self {
        Self {
            target,
            limits,
            clock,
        }
    }

    /// Returns the configured limits.
    #[must_use]
    pub fn limits(&self) -> ExportLimits {
        self.limits
    }

    /// Checks an export request without rendering or delivering anything.
    #[must_use]
    pub fn validate(
        &self,
        records: &[&SubmissionRecord],
        format: &str,
        options: &ExportOptions,
    ) -> ExportValidation {
        let selected = restrict_to_selection(records, options.selected_ids.as_ref());
        validate_export(selected.len(), format, self.limits)
    }

    /// Exports `records` and delivers the file.
    ///
    /// Invalid requests return `AppError::Validation` and leave both the
    /// download target and the session untouched. Render and delivery
    /// failures are recorded in the session before being returned.
    pub async fn export(
        &self,
        session: &mut ExportSession,
        records: &[&SubmissionRecord],
        fallback: Option<&[FieldSchema]>,
        format: &str,
        options: &ExportOptions,
    ) -> AppResult<ExportReceipt> {
        let report = self.validate(records, format, options);
        for warning in &report.warnings {
            warn!(format, warning = warning.as_str(), "export warning");
        }
        if !report.is_valid() {
            warn!(format, errors = ?report.errors, "export rejected");
        }
        report.into_result()?;

        let now = self.clock.now();
        let artifact = match render_export(
            records,
            fallback,
            format,
            options,
            self.limits,
            now.date_naive(),
        ) {
            Ok(artifact) => artifact,
            Err(error) => {
                self.remember_failure(session, format, now, &error);
                return Err(error);
            }
        };

        if let Err(error) = self.target.deliver(&artifact).await {
            self.remember_failure(session, format, now, &error);
            return Err(error);
        }

        info!(
            filename = artifact.filename.as_str(),
            record_count = artifact.record_count,
            bytes = artifact.bytes.len(),
            "export delivered"
        );

        let receipt = ExportReceipt {
            filename: artifact.filename,
            format: format.to_owned(),
            record_count: artifact.record_count,
            finished_at: now,
            outcome: ExportOutcome::Delivered,
        };
        session.record(receipt.clone());
        Ok(receipt)
    }

    fn remember_failure(
        &self,
        session: &mut ExportSession,
        format: &str,
        now: DateTime<Utc>,
        error: &AppError,
    ) {
        warn!(format, error = %error, "export failed");
        session.record(ExportReceipt {
            filename: String::new(),
            format: format.to_owned(),
            record_count: 0,
            finished_at: now,
            outcome: ExportOutcome::Failed(error.to_string()),
        });
    }
}

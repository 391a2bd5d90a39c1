use std::collections::HashMap;

use async_trait::async_trait;
use formvault_application::SubmissionRepository;
use formvault_core::{AppError, AppResult};
use formvault_domain::{SubmissionNote, SubmissionRecord, SubmissionStatus};
use serde_json::Value;
use tokio::sync::{RwLock, watch};
use tracing::{debug, warn};

/// In-memory submission store publishing full snapshots on every change.
#[derive(Debug)]
pub struct InMemorySubmissionRepository {
    records: RwLock<HashMap<String, SubmissionRecord>>,
    snapshots: watch::Sender<Vec<SubmissionRecord>>,
}

impl InMemorySubmissionRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    /// Creates a repository seeded with `records`.
    #[must_use]
    pub fn with_records(records: Vec<SubmissionRecord>) -> Self {
        let records: HashMap<String, SubmissionRecord> = records
            .into_iter()
            .map(|record| (record.id().to_owned(), record))
            .collect();
        let (snapshots, _) = watch::channel(snapshot_of(&records));

        Self {
            records: RwLock::new(records),
            snapshots,
        }
    }

    /// Creates a repository from a JSON array of stored submissions.
    ///
    /// Entries that do not decode are logged and skipped; only input that is
    /// not a JSON array is rejected.
    pub fn from_json(json: &str) -> AppResult<Self> {
        let entries: Vec<Value> = serde_json::from_str(json).map_err(|error| {
            AppError::Validation(format!("invalid submission seed data: {error}"))
        })?;

        let mut records = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            let submission_id = entry
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned();
            match serde_json::from_value::<SubmissionRecord>(entry) {
                Ok(record) => records.push(record),
                Err(error) => warn!(
                    index,
                    submission_id = submission_id.as_str(),
                    error = %error,
                    "skipping unreadable submission"
                ),
            }
        }

        Ok(Self::with_records(records))
    }

    /// Subscribes to full-record-set snapshots.
    ///
    /// The receiver starts with the current snapshot; each change replaces
    /// it with a new complete set rather than a diff.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<SubmissionRecord>> {
        self.snapshots.subscribe()
    }

    fn publish(&self, records: &HashMap<String, SubmissionRecord>) {
        let snapshot = snapshot_of(records);
        debug!(count = snapshot.len(), "publishing submission snapshot");
        self.snapshots.send_replace(snapshot);
    }
}

impl Default for InMemorySubmissionRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn snapshot_of(records: &HashMap<String, SubmissionRecord>) -> Vec<SubmissionRecord> {
    let mut snapshot: Vec<SubmissionRecord> = records.values().cloned().collect();
    snapshot.sort_by(|left, right| left.id().cmp(right.id()));
    snapshot
}

fn not_found(submission_id: &str) -> AppError {
    AppError::NotFound(format!("submission '{submission_id}' does not exist"))
}

#[async_trait]
impl SubmissionRepository for InMemorySubmissionRepository {
    async fn list_submissions(&self, form_id: Option<&str>) -> AppResult<Vec<SubmissionRecord>> {
        let records = self.records.read().await;

        let mut values: Vec<SubmissionRecord> = records
            .values()
            .filter(|record| form_id.is_none_or(|form_id| record.form_id() == form_id))
            .cloned()
            .collect();
        values.sort_by(|left, right| left.id().cmp(right.id()));

        Ok(values)
    }

    async fn find_submission(&self, submission_id: &str) -> AppResult<Option<SubmissionRecord>> {
        Ok(self.records.read().await.get(submission_id).cloned())
    }

    async fn save_submission(&self, record: SubmissionRecord) -> AppResult<()> {
        let mut records = self.records.write().await;
        records.insert(record.id().to_owned(), record);
        self.publish(&records);
        Ok(())
    }

    async fn delete_submission(&self, submission_id: &str) -> AppResult<()> {
        let mut records = self.records.write().await;
        if records.remove(submission_id).is_none() {
            return Err(not_found(submission_id));
        }
        self.publish(&records);
        Ok(())
    }

    async fn append_note(&self, submission_id: &str, note: SubmissionNote) -> AppResult<()> {
        let mut records = self.records.write().await;
        records
            .get_mut(submission_id)
            .ok_or_else(|| not_found(submission_id))?
            .append_note(note);
        self.publish(&records);
        Ok(())
    }

    async fn set_status(&self, submission_id: &str, status: SubmissionStatus) -> AppResult<()> {
        let mut records = self.records.write().await;
        records
            .get_mut(submission_id)
            .ok_or_else(|| not_found(submission_id))?
            .set_status(status);
        self.publish(&records);
        Ok(())
    }
}

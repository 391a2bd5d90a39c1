//! Download target for development and tests. Logs exports and keeps them in memory.

use async_trait::async_trait;
use formvault_application::{DownloadTarget, ExportArtifact};
use formvault_core::AppResult;
use tokio::sync::RwLock;
use tracing::info;

/// Development download target that logs exports and retains them.
#[derive(Debug, Default)]
pub struct InMemoryDownloadTarget {
    delivered: RwLock<Vec<ExportArtifact>>,
}

impl InMemoryDownloadTarget {
    /// Creates an empty target.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every artifact delivered so far, oldest first.
    pub async fn delivered(&self) -> Vec<ExportArtifact> {
        self.delivered.read().await.clone()
    }
}

#[async_trait]
impl DownloadTarget for InMemoryDownloadTarget {
    async fn deliver(&self, artifact: &ExportArtifact) -> AppResult<()> {
        info!(
            filename = artifact.filename.as_str(),
            mime_type = artifact.mime_type,
            records = artifact.record_count,
            "--- EXPORT (memory) ---\n{}\n--- END EXPORT ---",
            String::from_utf8_lossy(&artifact.bytes)
        );

        self.delivered.write().await.push(artifact.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use formvault_application::{ExportOptions, ExportSession, FixedClock, SubmissionExporter};
    use formvault_domain::{SubmissionMetadata, SubmissionRecord};

    use super::InMemoryDownloadTarget;
    use crate::ConsoleConfig;

    #[tokio::test]
    async fn exporter_delivers_configured_csv() {
        let config = ConsoleConfig::from_lookup(|name| {
            (name == "FORMVAULT_CSV_BOM").then(|| "true".to_owned())
        })
        .unwrap_or_else(|_| unreachable!());
        let target = Arc::new(InMemoryDownloadTarget::new());
        let clock = Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2026, 7, 4, 9, 0, 0)
                .single()
                .unwrap_or_else(|| unreachable!()),
        ));
        let exporter = SubmissionExporter::new(target.clone(), config.export_limits(), clock);
        let record = SubmissionRecord::new("s1", "form-1", "RSVP", SubmissionMetadata::default())
            .unwrap_or_else(|_| unreachable!())
            .with_value("guests", 2_i64);
        let options = ExportOptions {
            filename_base: "rsvp".to_owned(),
            ..config.export_options()
        };

        let mut session = ExportSession::default();
        exporter
            .export(&mut session, &[&record], None, "csv", &options)
            .await
            .unwrap_or_else(|_| unreachable!());

        let delivered = target.delivered().await;
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].filename, "rsvp_2026-07-04.csv");
        assert!(delivered[0].bytes.starts_with("\u{FEFF}".as_bytes()));
        assert_eq!(session.history().count(), 1);
    }
}

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use formvault_application::{DownloadTarget, ExportArtifact};
use formvault_core::{AppError, AppResult};
use tracing::info;

/// Download target that writes exports into a local directory.
#[derive(Debug, Clone)]
pub struct FileDownloadTarget {
    directory: PathBuf,
}

impl FileDownloadTarget {
    /// Creates a target writing into `directory`, created on first use.
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Returns the output directory.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn output_path(&self, filename: &str) -> AppResult<PathBuf> {
        let mut components = Path::new(filename).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => Ok(self.directory.join(name)),
            _ => Err(AppError::Validation(format!(
                "export file name '{filename}' must not contain path segments"
            ))),
        }
    }
}

#[async_trait]
impl DownloadTarget for FileDownloadTarget {
    async fn deliver(&self, artifact: &ExportArtifact) -> AppResult<()> {
        let path = self.output_path(&artifact.filename)?;

        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|error| {
                AppError::Export(format!(
                    "failed to create export directory '{}': {error}",
                    self.directory.display()
                ))
            })?;
        tokio::fs::write(&path, &artifact.bytes)
            .await
            .map_err(|error| {
                AppError::Export(format!(
                    "failed to write export '{}': {error}",
                    path.display()
                ))
            })?;

        info!(
            path = %path.display(),
            mime_type = artifact.mime_type,
            bytes = artifact.bytes.len(),
            "export written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use formvault_application::{DownloadTarget, ExportArtifact};
    use formvault_core::AppError;

    use super::FileDownloadTarget;

    fn artifact(filename: &str) -> ExportArtifact {
        ExportArtifact {
            bytes: b"id,name\n1,Ann\n".to_vec(),
            filename: filename.to_owned(),
            mime_type: "text/csv",
            record_count: 1,
        }
    }

    #[tokio::test]
    async fn writes_into_directory() {
        let directory = std::env::temp_dir().join(format!("formvault-{}", uuid::Uuid::new_v4()));
        let target = FileDownloadTarget::new(&directory);

        target
            .deliver(&artifact("submissions_2026-01-01.csv"))
            .await
            .unwrap_or_else(|_| unreachable!());

        let written = tokio::fs::read(directory.join("submissions_2026-01-01.csv"))
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(written, b"id,name\n1,Ann\n".to_vec());

        tokio::fs::remove_dir_all(&directory)
            .await
            .unwrap_or_else(|_| unreachable!());
    }

    #[tokio::test]
    async fn rejects_path_segments() {
        let target = FileDownloadTarget::new(std::env::temp_dir());
        for filename in ["../escape.csv", "nested/file.csv", ""] {
            let result = target.deliver(&artifact(filename)).await;
            assert!(matches!(result, Err(AppError::Validation(_))));
        }
    }
}

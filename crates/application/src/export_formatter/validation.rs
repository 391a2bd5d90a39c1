use formvault_core::{AppError, AppResult};
use serde::Serialize;

use super::{ExportFormat, ExportLimits};

/// Outcome of checking an export request without running it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportValidation {
    /// Reasons the export cannot run.
    pub errors: Vec<String>,
    /// Non-blocking notices.
    pub warnings: Vec<String>,
    /// Parsed format, when supported.
    pub format: Option<ExportFormat>,
}

impl ExportValidation {
    /// Returns whether the export may run.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.format.is_some()
    }

    /// Converts the report into the format to render or a validation error.
    pub fn into_result(self) -> AppResult<ExportFormat> {
        match self.format {
            Some(format) if self.errors.is_empty() => Ok(format),
            _ => Err(AppError::Validation(self.errors.join("; "))),
        }
    }
}

/// Checks record count and format against `limits`.
#[must_use]
pub fn validate_export(record_count: usize, format: &str, limits: ExportLimits) -> ExportValidation {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if record_count == 0 {
        errors.push("No submissions to export".to_owned());
    } else if record_count > limits.max_records {
        errors.push(format!(
            "Too many submissions to export ({record_count}); reduce the selection to {} records or fewer",
            limits.max_records
        ));
    } else if record_count > limits.warn_records {
        warnings.push(format!(
            "Large export of {record_count} submissions may take a while"
        ));
    }

    let format = match format.parse::<ExportFormat>() {
        Ok(format) => Some(format),
        Err(error) => {
            errors.push(match error {
                AppError::Validation(message) => message,
                other => other.to_string(),
            });
            None
        }
    };

    ExportValidation {
        errors,
        warnings,
        format,
    }
}

use formvault_core::{AppError, AppResult};
use formvault_domain::{FieldSchema, SubmissionRecord};
use serde::Serialize;
use serde_json::Value;

use super::csv_writer::{data_row, header_row};
use super::json_writer::json_record;
use super::{ExportFormat, ExportOptions, export_columns};

/// Representative sample of an export for on-screen review.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "format")]
pub enum ExportPreview {
    /// Header list and leading rows.
    #[serde(rename_all = "camelCase")]
    Csv {
        /// Column headers.
        headers: Vec<String>,
        /// Cell values of the sampled rows.
        rows: Vec<Vec<String>>,
        /// Records in the full export.
        total_records: usize,
        /// Whether rows were cut off.
        truncated: bool,
    },
    /// First record as it will appear in the file.
    #[serde(rename_all = "camelCase")]
    Json {
        /// Sample object; `None` when there are no records.
        sample: Option<Value>,
        /// Records in the full export.
        total_records: usize,
        /// Whether records were cut off.
        truncated: bool,
    },
}

impl ExportPreview {
    /// Returns whether the preview shows fewer records than the export holds.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        match self {
            Self::Csv { truncated, .. } | Self::Json { truncated, .. } => *truncated,
        }
    }
}

/// Builds a preview from at most `max_rows` records.
///
/// Columns are derived from the whole set so the sample matches the real
/// file's header.
pub fn preview(
    records: &[&SubmissionRecord],
    fallback: Option<&[FieldSchema]>,
    format: ExportFormat,
    max_rows: usize,
    options: &ExportOptions,
) -> AppResult<ExportPreview> {
    let total_records = records.len();
    let sample = &records[..max_rows.min(total_records)];

    match format {
        ExportFormat::Csv => {
            let columns = export_columns(records, fallback);
            Ok(ExportPreview::Csv {
                headers: header_row(&columns, options.include_metadata),
                rows: sample
                    .iter()
                    .map(|record| data_row(record, fallback, &columns, options.include_metadata))
                    .collect(),
                total_records,
                truncated: total_records > max_rows,
            })
        }
        ExportFormat::Json => {
            let sample = sample
                .first()
                .map(|record| {
                    serde_json::to_value(json_record(record, fallback, options.include_metadata))
                })
                .transpose()
                .map_err(|error| {
                    AppError::Export(format!("failed to build JSON preview: {error}"))
                })?;
            Ok(ExportPreview::Json {
                sample,
                total_records,
                truncated: total_records > max_rows,
            })
        }
    }
}

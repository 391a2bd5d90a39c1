//! CSV and JSON rendering of submission sets.
//!
//! Rendering is split from validation: [`validate_export`] can be called on
//! its own to show the user what would happen, and [`render_export`] refuses
//! to produce anything for an invalid request.

use std::collections::{BTreeSet, HashSet};
use std::str::FromStr;

use chrono::NaiveDate;
use formvault_core::{AppError, AppResult};
use formvault_domain::{FieldKind, FieldSchema, FieldSchemaSource, SubmissionRecord};
use serde::{Deserialize, Serialize};

mod csv_writer;
mod json_writer;
mod preview;
mod validation;


pub use csv_writer::to_csv;
pub use json_writer::to_json;
pub use preview::{ExportPreview, preview};
pub use validation::{ExportValidation, validate_export};

/// Labels of the metadata columns, in output order.
pub const METADATA_COLUMNS: [&str; 7] = [
    "Submission ID",
    "Form",
    "Submitted At",
    "Source",
    "IP Address",
    "Submitted By",
    "Status",
];

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// Comma-separated values.
    Csv,
    /// JSON array of self-describing records.
    Json,
}

impl ExportFormat {
    /// Returns stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    /// Returns the file extension without a dot.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    /// Returns the MIME type handed to the download target.
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Json => "application/json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(AppError::Validation(format!(
                "Unsupported export format '{value}'"
            ))),
        }
    }
}

/// Caller-chosen export settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportOptions {
    /// Emit a CSV header row.
    pub include_headers: bool,
    /// Emit metadata columns (CSV) or a `metadata` block (JSON).
    pub include_metadata: bool,
    /// Prefix CSV output with a UTF-8 byte-order mark.
    pub include_bom: bool,
    /// Indent JSON output.
    pub pretty_print: bool,
    /// CSV field delimiter.
    pub delimiter: u8,
    /// File name stem; the date and extension are appended.
    pub filename_base: String,
    /// Restricts the export to these record ids when set.
    pub selected_ids: Option<BTreeSet<String>>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_headers: true,
            include_metadata: true,
            include_bom: false,
            pretty_print: true,
            delimiter: b',',
            filename_base: "submissions".to_owned(),
            selected_ids: None,
        }
    }
}

/// Size limits enforced before an export starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportLimits {
    /// Hard maximum record count.
    pub max_records: usize,
    /// Record count above which a warning is reported.
    pub warn_records: usize,
}

impl Default for ExportLimits {
    fn default() -> Self {
        Self {
            max_records: 10_000,
            warn_records: 1_000,
        }
    }
}

/// Finished export ready for a download target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    /// Encoded file contents.
    pub bytes: Vec<u8>,
    /// Suggested file name.
    pub filename: String,
    /// MIME type of `bytes`.
    pub mime_type: &'static str,
    /// Number of records written.
    pub record_count: usize,
}

/// One output column for a field.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportColumn<'a> {
    /// Field id the column reads from.
    pub field_id: &'a str,
    /// Header label.
    pub label: &'a str,
    /// Field kind when any schema describes the field.
    pub kind: Option<&'a FieldKind>,
}

/// Collects the field columns for a record set.
///
/// Fallback fields come first in schema order, then fields only present in
/// record snapshots, then raw keys of legacy records with no schema at all.
#[must_use]
pub fn export_columns<'a>(
    records: &[&'a SubmissionRecord],
    fallback: Option<&'a [FieldSchema]>,
) -> Vec<ExportColumn<'a>> {
    let mut seen: HashSet<&'a str> = HashSet::new();
    let mut columns = Vec::new();
    let mut push_field = |columns: &mut Vec<ExportColumn<'a>>, field: &'a FieldSchema| {
        if seen.insert(field.id()) {
            columns.push(ExportColumn {
                field_id: field.id(),
                label: field.label(),
                kind: Some(field.kind()),
            });
        }
    };

    for field in fallback.unwrap_or_default() {
        push_field(&mut columns, field);
    }
    for record in records.iter().copied() {
        for field in record.form_fields().unwrap_or_default() {
            push_field(&mut columns, field);
        }
    }

    let mut legacy_keys: BTreeSet<&'a str> = BTreeSet::new();
    for record in records.iter().copied() {
        if FieldSchemaSource::resolve(record, fallback).fields().is_empty() {
            legacy_keys.extend(record.data().keys().map(String::as_str));
        }
    }
    for key in legacy_keys {
        if seen.insert(key) {
            columns.push(ExportColumn {
                field_id: key,
                label: key,
                kind: None,
            });
        }
    }

    columns
}

/// Keeps only the records named in `selected_ids`, when a selection is set.
#[must_use]
pub fn restrict_to_selection<'r>(
    records: &[&'r SubmissionRecord],
    selected_ids: Option<&BTreeSet<String>>,
) -> Vec<&'r SubmissionRecord> {
    match selected_ids {
        Some(selected) => records
            .iter()
            .copied()
            .filter(|record| selected.contains(record.id()))
            .collect(),
        None => records.to_vec(),
    }
}

/// Builds `{base}_{YYYY-MM-DD}.{ext}`.
///
/// The base is reduced to ASCII letters, digits, `-` and `_`; a blank base
/// becomes `submissions`.
#[must_use]
pub fn export_filename(base: &str, format: ExportFormat, date: NaiveDate) -> String {
    let mut stem = String::with_capacity(base.len());
    for character in base.trim().chars() {
        if character.is_ascii_alphanumeric() || character == '-' || character == '_' {
            stem.push(character);
        } else if !stem.ends_with('_') {
            stem.push('_');
        }
    }
    let stem = stem.trim_matches('_');
    let stem = if stem.is_empty() { "submissions" } else { stem };

    format!(
        "{stem}_{}.{}",
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

/// Validates and renders an export.
///
/// `format` is the caller's raw format name so that an unsupported value is
/// reported alongside any other validation failure.
pub fn render_export(
    records: &[&SubmissionRecord],
    fallback: Option<&[FieldSchema]>,
    format: &str,
    options: &ExportOptions,
    limits: ExportLimits,
    today: NaiveDate,
) -> AppResult<ExportArtifact> {
    let records = restrict_to_selection(records, options.selected_ids.as_ref());
    let report = validate_export(records.len(), format, limits);
    let format = report.into_result()?;

    let body = match format {
        ExportFormat::Csv => to_csv(&records, fallback, options)?,
        ExportFormat::Json => to_json(&records, fallback, options)?,
    };

    Ok(ExportArtifact {
        bytes: body.into_bytes(),
        filename: export_filename(&options.filename_base, format, today),
        mime_type: format.mime_type(),
        record_count: records.len(),
    })
}

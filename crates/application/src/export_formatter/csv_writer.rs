use chrono::SecondsFormat;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use formvault_core::{AppError, AppResult};
use formvault_domain::{FieldSchema, FieldSchemaSource, SubmissionRecord};

use crate::field_format::format_for_export;

use super::{ExportColumn, ExportOptions, METADATA_COLUMNS, export_columns};

const BYTE_ORDER_MARK: &str = "\u{FEFF}";

/// Renders records as CSV.
///
/// Cells are quoted only when they contain the delimiter, a quote or a line
/// break; embedded quotes are doubled. Missing values become empty cells.
pub fn to_csv(
    records: &[&SubmissionRecord],
    fallback: Option<&[FieldSchema]>,
    options: &ExportOptions,
) -> AppResult<String> {
    let columns = export_columns(records, fallback);
    let mut writer = WriterBuilder::new()
        .delimiter(options.delimiter)
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    if options.include_headers {
        writer
            .write_record(header_row(&columns, options.include_metadata))
            .map_err(csv_error)?;
    }

    for record in records {
        writer
            .write_record(data_row(record, fallback, &columns, options.include_metadata))
            .map_err(csv_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| {
            AppError::Export(format!("failed to flush CSV output: {}", error.error()))
        })?;
    let body = String::from_utf8(bytes)
        .map_err(|error| AppError::Export(format!("CSV output is not valid UTF-8: {error}")))?;

    if options.include_bom {
        Ok(format!("{BYTE_ORDER_MARK}{body}"))
    } else {
        Ok(body)
    }
}

pub(super) fn header_row(columns: &[ExportColumn<'_>], include_metadata: bool) -> Vec<String> {
    let metadata = METADATA_COLUMNS
        .iter()
        .filter(|_| include_metadata)
        .map(|label| (*label).to_owned());
    let fields = columns.iter().map(|column| column.label.to_owned());
    metadata.chain(fields).collect()
}

pub(super) fn data_row(
    record: &SubmissionRecord,
    fallback: Option<&[FieldSchema]>,
    columns: &[ExportColumn<'_>],
    include_metadata: bool,
) -> Vec<String> {
    let mut row = Vec::with_capacity(columns.len() + METADATA_COLUMNS.len());

    if include_metadata {
        let metadata = record.metadata();
        row.push(record.id().to_owned());
        row.push(record.form_title().to_owned());
        row.push(
            metadata
                .submitted_at
                .map(|timestamp| timestamp.to_rfc3339_opts(SecondsFormat::Secs, true))
                .unwrap_or_default(),
        );
        row.push(metadata.source.clone());
        row.push(metadata.ip_address.clone().unwrap_or_default());
        row.push(metadata.submitted_by.clone().unwrap_or_default());
        row.push(record.status().as_str().to_owned());
    }

    let source = FieldSchemaSource::resolve(record, fallback);
    for column in columns {
        let cell = record
            .lookup(column.field_id)
            .present()
            .map(|value| {
                let kind = source
                    .find(column.field_id)
                    .map(FieldSchema::kind)
                    .or(column.kind);
                format_for_export(kind, value)
            })
            .unwrap_or_default();
        row.push(cell);
    }

    row
}

fn csv_error(error: csv::Error) -> AppError {
    AppError::Export(format!("failed to write CSV row: {error}"))
}

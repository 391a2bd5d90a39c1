use std::collections::BTreeMap;

use formvault_core::{AppError, AppResult};
use formvault_domain::{
    FieldSchema, FieldSchemaSource, FieldValue, SubmissionMetadata, SubmissionRecord,
};
use serde::Serialize;

use super::ExportOptions;

/// One exported submission.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct JsonExportRecord<'a> {
    id: &'a str,
    form_id: &'a str,
    form_title: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a SubmissionMetadata>,
    form_data: BTreeMap<&'a str, JsonExportField<'a>>,
}

/// Self-describing field entry; `type` is null for legacy keys.
#[derive(Debug, Serialize)]
pub(super) struct JsonExportField<'a> {
    label: &'a str,
    value: &'a FieldValue,
    #[serde(rename = "type")]
    kind: Option<&'static str>,
}

pub(super) fn json_record<'a>(
    record: &'a SubmissionRecord,
    fallback: Option<&'a [FieldSchema]>,
    include_metadata: bool,
) -> JsonExportRecord<'a> {
    let source = FieldSchemaSource::resolve(record, fallback);
    let form_data = record
        .data()
        .iter()
        .map(|(field_id, value)| {
            let schema = source.find(field_id);
            (
                field_id.as_str(),
                JsonExportField {
                    label: schema.map_or(field_id.as_str(), |field| field.label()),
                    value,
                    kind: schema.map(|field| field.kind().as_str()),
                },
            )
        })
        .collect();

    JsonExportRecord {
        id: record.id(),
        form_id: record.form_id(),
        form_title: record.form_title(),
        status: record.status().as_str(),
        metadata: include_metadata.then(|| record.metadata()),
        form_data,
    }
}

/// Renders records as a JSON array.
///
/// Values are written exactly as stored, so numbers keep their precision and
/// lists keep their order.
pub fn to_json(
    records: &[&SubmissionRecord],
    fallback: Option<&[FieldSchema]>,
    options: &ExportOptions,
) -> AppResult<String> {
    let documents: Vec<JsonExportRecord<'_>> = records
        .iter()
        .map(|record| json_record(record, fallback, options.include_metadata))
        .collect();

    let rendered = if options.pretty_print {
        serde_json::to_string_pretty(&documents)
    } else {
        serde_json::to_string(&documents)
    };

    rendered.map_err(|error| AppError::Export(format!("failed to serialize JSON export: {error}")))
}

//! Per-kind rendering of submitted values.
//!
//! Every function matches exhaustively on [`FieldKind`] so a new kind cannot
//! be added without deciding how it is shown and exported.

use formvault_domain::{
    FieldKind, FieldSchema, FieldSchemaSource, FieldValue, SubmissionRecord, parse_calendar_date,
};

/// Formats a value for on-screen display.
///
/// `kind` is `None` for legacy records without any schema.
#[must_use]
pub fn format_for_display(kind: Option<&FieldKind>, value: &FieldValue) -> String {
    if let FieldValue::Boolean(flag) = value {
        return if *flag { "Yes" } else { "No" }.to_owned();
    }

    let Some(kind) = kind else {
        return value.plain_text();
    };

    match kind {
        FieldKind::Text(_)
        | FieldKind::Textarea(_)
        | FieldKind::Email
        | FieldKind::Number(_)
        | FieldKind::Select(_)
        | FieldKind::Radio(_) => value.plain_text(),
        FieldKind::Date(_) => value
            .as_text()
            .and_then(parse_calendar_date)
            .map(|date| date.format("%b %-d, %Y").to_string())
            .unwrap_or_else(|| value.plain_text()),
        FieldKind::Checkbox(_) => value
            .selections()
            .map(|selections| selections.join(", "))
            .unwrap_or_else(|| value.plain_text()),
        FieldKind::File(_) => match value.files() {
            Some(files) if files.len() == 1 => files[0].name.clone(),
            Some(files) => format!("{} files", files.len()),
            None => value.plain_text(),
        },
        FieldKind::Rating(rating) => value
            .as_f64()
            .map(|score| format!("{score}/{}", rating.max_rating))
            .unwrap_or_else(|| value.plain_text()),
    }
}

/// Formats a value for a CSV cell.
///
/// Dates are normalised to `YYYY-MM-DD`, lists are joined with `"; "` and
/// files are written as their names.
#[must_use]
pub fn format_for_export(kind: Option<&FieldKind>, value: &FieldValue) -> String {
    if value.is_empty() {
        return String::new();
    }

    let Some(kind) = kind else {
        return value.plain_text();
    };

    match kind {
        FieldKind::Text(_)
        | FieldKind::Textarea(_)
        | FieldKind::Email
        | FieldKind::Number(_)
        | FieldKind::Select(_)
        | FieldKind::Radio(_)
        | FieldKind::Rating(_) => value.plain_text(),
        FieldKind::Date(_) => value
            .as_text()
            .and_then(parse_calendar_date)
            .map(|date| date.to_string())
            .unwrap_or_else(|| value.plain_text()),
        FieldKind::Checkbox(_) => value
            .selections()
            .map(|selections| selections.join("; "))
            .unwrap_or_else(|| value.plain_text()),
        FieldKind::File(_) => value
            .files()
            .map(|files| {
                files
                    .iter()
                    .map(|file| file.name.as_str())
                    .collect::<Vec<_>>()
                    .join("; ")
            })
            .unwrap_or_else(|| value.plain_text()),
    }
}

/// Builds `"Label: value"` lines describing a submission.
///
/// Fields follow schema order when a schema is available; legacy records
/// without one list their raw keys. Empty answers are skipped.
#[must_use]
pub fn summarize_record(
    record: &SubmissionRecord,
    fallback: Option<&[FieldSchema]>,
    max_fields: Option<usize>,
) -> Vec<String> {
    let source = FieldSchemaSource::resolve(record, fallback);
    let limit = max_fields.unwrap_or(usize::MAX);

    if source.fields().is_empty() {
        return record
            .data()
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(field_id, value)| format!("{field_id}: {}", format_for_display(None, value)))
            .take(limit)
            .collect();
    }

    source
        .fields()
        .iter()
        .filter_map(|field| {
            record.lookup(field.id()).present().map(|value| {
                format!(
                    "{}: {}",
                    field.label(),
                    format_for_display(Some(field.kind()), value)
                )
            })
        })
        .take(limit)
        .collect()
}

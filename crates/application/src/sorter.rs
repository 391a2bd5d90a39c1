use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use formvault_domain::{
    FieldKind, FieldSchema, FieldSchemaSource, SortDirection, SortKey, SortState, SubmissionRecord,
    SubmissionStatus,
};

use crate::field_format::format_for_display;

/// Comparable projection of one record under one sort key.
///
/// Missing values compare smallest, like an empty string.
#[derive(Debug, Clone, PartialEq)]
enum SortValue {
    Timestamp(Option<DateTime<Utc>>),
    Number(Option<f64>),
    Text(String),
}

impl SortValue {
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Timestamp(left), Self::Timestamp(right)) => left.cmp(right),
            (Self::Number(left), Self::Number(right)) => match (left, right) {
                (Some(left), Some(right)) => left.total_cmp(right),
                (left, right) => left.is_some().cmp(&right.is_some()),
            },
            (Self::Text(left), Self::Text(right)) => left.cmp(right),
            (left, right) => left.rank().cmp(&right.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Timestamp(_) => 0,
            Self::Number(_) => 1,
            Self::Text(_) => 2,
        }
    }
}

fn status_rank(status: SubmissionStatus) -> f64 {
    match status {
        SubmissionStatus::New => 0.0,
        SubmissionStatus::Read => 1.0,
        SubmissionStatus::Archived => 2.0,
    }
}

fn sort_value(
    record: &SubmissionRecord,
    key: &SortKey,
    fallback: Option<&[FieldSchema]>,
) -> SortValue {
    match key {
        SortKey::SubmittedAt => SortValue::Timestamp(record.submitted_at()),
        SortKey::FormTitle => SortValue::Text(record.form_title().to_lowercase()),
        SortKey::Status => SortValue::Number(Some(status_rank(record.status()))),
        SortKey::Field(field_id) => {
            let source = FieldSchemaSource::resolve(record, fallback);
            let kind = source.find(field_id).map(FieldSchema::kind);
            let numeric = matches!(kind, Some(FieldKind::Number(_) | FieldKind::Rating(_)));
            let Some(value) = record.lookup(field_id).present() else {
                return if numeric {
                    SortValue::Number(None)
                } else {
                    SortValue::Text(String::new())
                };
            };

            match value.as_f64() {
                Some(number) if numeric => SortValue::Number(Some(number)),
                _ => SortValue::Text(format_for_display(kind, value).to_lowercase()),
            }
        }
    }
}

/// Stable-sorts items that project to a submission record.
///
/// Keys are computed once per item. Descending order reverses the
/// comparison only, so equal keys keep their original relative order in
/// both directions.
pub fn sort_with<'r, T>(
    items: &mut Vec<T>,
    record_of: impl Fn(&T) -> &'r SubmissionRecord,
    sort: &SortState,
    fallback: Option<&[FieldSchema]>,
) {
    let mut keyed: Vec<(SortValue, T)> = items
        .drain(..)
        .map(|item| (sort_value(record_of(&item), &sort.key, fallback), item))
        .collect();

    keyed.sort_by(|(left, _), (right, _)| {
        let ordering = left.compare(right);
        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });

    items.extend(keyed.into_iter().map(|(_, item)| item));
}

/// Returns `records` stable-sorted by `sort`.
#[must_use]
pub fn sort_records<'r>(
    mut records: Vec<&'r SubmissionRecord>,
    sort: &SortState,
    fallback: Option<&[FieldSchema]>,
) -> Vec<&'r SubmissionRecord> {
    sort_with(&mut records, |record| *record, sort, fallback);
    records
}

//! Aggregate statistics over a full submission set.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use formvault_domain::{FieldKind, FieldSchema, FieldSchemaSource, SubmissionRecord};
use serde::Serialize;

/// Count of one value with its share of the relevant total.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueCount {
    /// Counted value.
    pub value: String,
    /// Occurrences.
    pub count: usize,
    /// Share of the total, in percent.
    pub percentage: f64,
}

/// Response statistics for one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldAnalytics {
    /// Field id.
    pub field_id: String,
    /// Field label.
    pub label: String,
    /// Field kind transport value.
    pub kind: &'static str,
    /// Records whose schema includes the field.
    pub eligible: usize,
    /// Eligible records with a non-empty answer.
    pub responses: usize,
    /// `responses / eligible`, in percent.
    pub response_rate: f64,
    /// Answer distribution for choice and rating fields, most common first.
    pub distribution: Vec<ValueCount>,
}

/// Summary of a submission set relative to one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionAnalytics {
    /// All records.
    pub total: usize,
    /// Records submitted on the current UTC day.
    pub today: usize,
    /// Records submitted in the current ISO week (Monday start).
    pub this_week: usize,
    /// Records submitted in the current calendar month.
    pub this_month: usize,
    /// Most recent submission time.
    pub latest_submission: Option<DateTime<Utc>>,
    /// Records per capture source, most common first.
    pub by_source: Vec<ValueCount>,
    /// Per-field statistics in schema order.
    pub fields: Vec<FieldAnalytics>,
}

#[derive(Default)]
struct FieldTally<'a> {
    label: &'a str,
    kind: Option<&'a FieldKind>,
    eligible: usize,
    responses: usize,
    values: HashMap<String, usize>,
}

/// Aggregates `records` from scratch relative to `now`.
///
/// Per-field numbers only count records whose schema (snapshot, or the
/// fallback for legacy records) includes the field.
#[must_use]
pub fn summarize(
    records: &[SubmissionRecord],
    fallback: Option<&[FieldSchema]>,
    now: DateTime<Utc>,
) -> SubmissionAnalytics {
    let today = now.date_naive();
    let week_start = today
        .checked_sub_days(Days::new(u64::from(
            today.weekday().num_days_from_monday(),
        )))
        .unwrap_or(NaiveDate::MIN);

    let mut counts = (0, 0, 0);
    let mut latest_submission: Option<DateTime<Utc>> = None;
    let mut sources: HashMap<String, usize> = HashMap::new();
    let mut field_order: Vec<&str> = Vec::new();
    let mut tallies: BTreeMap<&str, FieldTally<'_>> = BTreeMap::new();

    for record in records {
        if let Some(submitted_at) = record.submitted_at() {
            let day = submitted_at.date_naive();
            if day == today {
                counts.0 += 1;
            }
            if week_start <= day && day <= today {
                counts.1 += 1;
            }
            if day.year() == today.year() && day.month() == today.month() {
                counts.2 += 1;
            }
            latest_submission = latest_submission.max(Some(submitted_at));
        }

        let source = record.metadata().source.trim();
        let source = if source.is_empty() { "unknown" } else { source };
        *sources.entry(source.to_owned()).or_default() += 1;

        for field in FieldSchemaSource::resolve(record, fallback).fields() {
            let tally = tallies.entry(field.id()).or_insert_with(|| {
                field_order.push(field.id());
                FieldTally {
                    label: field.label(),
                    kind: Some(field.kind()),
                    ..FieldTally::default()
                }
            });
            tally.eligible += 1;

            let Some(value) = record.lookup(field.id()).present() else {
                continue;
            };
            tally.responses += 1;

            match field.kind() {
                FieldKind::Checkbox(_) => {
                    for choice in value.selections().unwrap_or_default() {
                        *tally.values.entry(choice.to_owned()).or_default() += 1;
                    }
                }
                FieldKind::Select(_) | FieldKind::Radio(_) | FieldKind::Rating(_) => {
                    *tally.values.entry(value.plain_text()).or_default() += 1;
                }
                FieldKind::Text(_)
                | FieldKind::Textarea(_)
                | FieldKind::Email
                | FieldKind::Number(_)
                | FieldKind::Date(_)
                | FieldKind::File(_) => {}
            }
        }
    }

    let fields = field_order
        .into_iter()
        .filter_map(|field_id| {
            let tally = tallies.remove(field_id)?;
            Some(FieldAnalytics {
                field_id: field_id.to_owned(),
                label: tally.label.to_owned(),
                kind: tally.kind.map_or("text", FieldKind::as_str),
                eligible: tally.eligible,
                responses: tally.responses,
                response_rate: percentage(tally.responses, tally.eligible),
                distribution: ranked(tally.values, tally.responses),
            })
        })
        .collect();

    SubmissionAnalytics {
        total: records.len(),
        today: counts.0,
        this_week: counts.1,
        this_month: counts.2,
        latest_submission,
        by_source: ranked(sources, records.len()),
        fields,
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

fn ranked(values: HashMap<String, usize>, whole: usize) -> Vec<ValueCount> {
    let mut ranked: Vec<ValueCount> = values
        .into_iter()
        .map(|(value, count)| ValueCount {
            percentage: percentage(count, whole),
            value,
            count,
        })
        .collect();
    ranked.sort_by(|left, right| {
        right
            .count
            .cmp(&left.count)
            .then_with(|| left.value.cmp(&right.value))
    });
    ranked
}

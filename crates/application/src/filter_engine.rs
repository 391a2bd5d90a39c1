use chrono::{DateTime, Utc};
use formvault_domain::{
    FieldKind, FieldSchema, FieldSchemaSource, FieldValue, FilterState, ResolvedDateRange,
    SubmissionRecord, parse_calendar_date,
};

/// Filter state resolved for one evaluation pass.
///
/// The date window is resolved once at compile time so every record in the
/// pass is compared against the same "now".
#[derive(Debug, Clone)]
pub struct CompiledFilter<'f> {
    search_term: Option<String>,
    date_range: Option<ResolvedDateRange>,
    field_filters: Vec<(&'f str, &'f str)>,
    fallback: Option<&'f [FieldSchema]>,
}

impl<'f> CompiledFilter<'f> {
    /// Resolves a filter state against `now`.
    #[must_use]
    pub fn compile(
        filter: &'f FilterState,
        fallback: Option<&'f [FieldSchema]>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            search_term: filter.active_search_term().map(str::to_lowercase),
            date_range: filter.date_range.map(|range| range.resolve(now)),
            field_filters: filter.active_field_filters().collect(),
            fallback,
        }
    }

    /// Returns the resolved date window, if a date filter is active.
    #[must_use]
    pub fn date_range(&self) -> Option<ResolvedDateRange> {
        self.date_range
    }

    /// Returns whether a record passes search, date and every field filter.
    #[must_use]
    pub fn matches(&self, record: &SubmissionRecord) -> bool {
        let source = FieldSchemaSource::resolve(record, self.fallback);

        self.matches_date(record)
            && self.matches_fields(record, &source)
            && self.matches_search(record, &source)
    }

    fn matches_date(&self, record: &SubmissionRecord) -> bool {
        match self.date_range {
            None => true,
            Some(range) => record
                .submitted_at()
                .is_some_and(|submitted_at| range.contains(submitted_at)),
        }
    }

    fn matches_search(&self, record: &SubmissionRecord, source: &FieldSchemaSource<'_>) -> bool {
        let Some(term) = self.search_term.as_deref() else {
            return true;
        };
        let contains = |text: &str| text.to_lowercase().contains(term);

        contains(record.form_title())
            || source.fields().iter().any(|field| contains(field.label()))
            || record
                .data()
                .values()
                .any(|value| contains(&value.plain_text()))
    }

    fn matches_fields(&self, record: &SubmissionRecord, source: &FieldSchemaSource<'_>) -> bool {
        self.field_filters.iter().all(|(field_id, expected)| {
            record.lookup(field_id).present().is_some_and(|value| {
                field_value_matches(source.find(field_id).map(FieldSchema::kind), value, expected)
            })
        })
    }
}

/// Returns the records passing `filter`, in their original order.
#[must_use]
pub fn apply_filters<'r>(
    records: &'r [SubmissionRecord],
    filter: &FilterState,
    fallback: Option<&[FieldSchema]>,
    now: DateTime<Utc>,
) -> Vec<&'r SubmissionRecord> {
    let compiled = CompiledFilter::compile(filter, fallback, now);
    records
        .iter()
        .filter(|record| compiled.matches(record))
        .collect()
}

/// Compares one submitted value with a field filter's expected value.
///
/// Single-choice kinds need an exact match, checkboxes need membership,
/// numeric kinds compare numerically, dates compare by calendar day, and
/// everything else is a case-insensitive substring match.
fn field_value_matches(kind: Option<&FieldKind>, value: &FieldValue, expected: &str) -> bool {
    let substring = || {
        value
            .plain_text()
            .to_lowercase()
            .contains(&expected.to_lowercase())
    };

    let Some(kind) = kind else {
        return match value {
            FieldValue::Choices(choices) => choices
                .iter()
                .any(|choice| choice.eq_ignore_ascii_case(expected)),
            _ => substring(),
        };
    };

    match kind {
        FieldKind::Select(_) | FieldKind::Radio(_) => value.as_text() == Some(expected),
        FieldKind::Checkbox(_) => value
            .selections()
            .is_some_and(|selections| selections.contains(&expected)),
        FieldKind::Number(_) | FieldKind::Rating(_) => {
            match (value.as_f64(), expected.parse::<f64>()) {
                (Some(actual), Ok(wanted)) => (actual - wanted).abs() < f64::EPSILON,
                _ => substring(),
            }
        }
        FieldKind::Date(_) => {
            let actual = value.as_text().and_then(parse_calendar_date);
            match (actual, parse_calendar_date(expected)) {
                (Some(actual), Some(wanted)) => actual == wanted,
                _ => substring(),
            }
        }
        FieldKind::Text(_) | FieldKind::Textarea(_) | FieldKind::Email | FieldKind::File(_) => {
            substring()
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use formvault_domain::{
        CheckboxConstraints, ChoiceConstraints, DateRange, FieldKind, FieldSchema, FilterState,
        NumberConstraints, SubmissionMetadata, SubmissionRecord, TextConstraints,
    };
    use proptest::prelude::*;

    use super::apply_filters;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0)
            .single()
            .unwrap_or_else(|| unreachable!())
    }

    fn schema() -> Vec<FieldSchema> {
        vec![
            FieldSchema::new("name", "Full Name", true, FieldKind::Text(TextConstraints::default()))
                .unwrap_or_else(|_| unreachable!()),
            FieldSchema::new(
                "size",
                "Shirt Size",
                false,
                FieldKind::Select(ChoiceConstraints {
                    options: vec!["S".to_owned(), "M".to_owned(), "L".to_owned()],
                }),
            )
            .unwrap_or_else(|_| unreachable!()),
            FieldSchema::new(
                "toppings",
                "Toppings",
                false,
                FieldKind::Checkbox(CheckboxConstraints {
                    options: vec!["ham".to_owned(), "olive".to_owned(), "egg".to_owned()],
                    ..CheckboxConstraints::default()
                }),
            )
            .unwrap_or_else(|_| unreachable!()),
            FieldSchema::new(
                "age",
                "Age",
                false,
                FieldKind::Number(NumberConstraints::default()),
            )
            .unwrap_or_else(|_| unreachable!()),
        ]
    }

    fn submission(id: &str, minutes_ago: i64) -> SubmissionRecord {
        SubmissionRecord::new(
            id,
            "form-1",
            "Event Signup",
            SubmissionMetadata::new(now() - Duration::minutes(minutes_ago), "web"),
        )
        .unwrap_or_else(|_| unreachable!())
        .with_form_fields(schema())
    }

    fn ids(records: &[&SubmissionRecord]) -> Vec<String> {
        records.iter().map(|record| record.id().to_owned()).collect()
    }

    fn fixtures() -> Vec<SubmissionRecord> {
        vec![
            submission("a", 10)
                .with_value("name", "Bob Smith")
                .with_value("size", "M")
                .with_value("toppings", vec!["ham".to_owned(), "egg".to_owned()])
                .with_value("age", 31_i64),
            submission("b", 60 * 24 * 3)
                .with_value("name", "Alice Jones")
                .with_value("size", "MM")
                .with_value("toppings", vec!["olive".to_owned()]),
            submission("c", 60 * 24 * 40).with_value("name", "Carol"),
        ]
    }

    #[test]
    fn search_is_case_insensitive_across_values() {
        let records = fixtures();
        let filter = FilterState::default().with_search("bob");

        let matched = apply_filters(&records, &filter, None, now());
        assert_eq!(ids(&matched), vec!["a"]);
    }

    #[test]
    fn search_matches_title_and_labels() {
        let records = fixtures();

        let by_title = FilterState::default().with_search("  SIGNUP ");
        assert_eq!(apply_filters(&records, &by_title, None, now()).len(), 3);

        let by_label = FilterState::default().with_search("shirt size");
        assert_eq!(apply_filters(&records, &by_label, None, now()).len(), 3);
    }

    #[test]
    fn whitespace_search_is_a_no_op() {
        let records = fixtures();
        let filter = FilterState::default().with_search("   ");
        assert_eq!(apply_filters(&records, &filter, None, now()).len(), 3);
    }

    #[test]
    fn preset_date_range_excludes_old_records() {
        let records = fixtures();
        let filter = FilterState::default().with_date_range(DateRange::Preset(
            formvault_domain::DatePreset::Last7Days,
        ));

        assert_eq!(ids(&apply_filters(&records, &filter, None, now())), vec!["a", "b"]);
    }

    #[test]
    fn record_at_upper_bound_is_included() {
        let records = fixtures();
        let submitted_at = records[0].submitted_at().unwrap_or_else(|| unreachable!());
        let range = DateRange::explicit(submitted_at - Duration::hours(1), submitted_at)
            .unwrap_or_else(|_| unreachable!());
        let filter = FilterState::default().with_date_range(range);

        assert_eq!(ids(&apply_filters(&records, &filter, None, now())), vec!["a"]);
    }

    #[test]
    fn missing_timestamps_only_drop_out_under_date_filters() {
        let undated = SubmissionRecord::new(
            "undated",
            "form-1",
            "Event Signup",
            SubmissionMetadata::default(),
        )
        .unwrap_or_else(|_| unreachable!());
        let records = vec![undated];

        assert_eq!(apply_filters(&records, &FilterState::default(), None, now()).len(), 1);

        let filter = FilterState::default()
            .with_date_range(DateRange::Preset(formvault_domain::DatePreset::Last90Days));
        assert!(apply_filters(&records, &filter, None, now()).is_empty());
    }

    #[test]
    fn select_filters_match_exactly() {
        let records = fixtures();
        let filter = FilterState::default().with_field_filter("size", "M");
        assert_eq!(ids(&apply_filters(&records, &filter, None, now())), vec!["a"]);
    }

    #[test]
    fn checkbox_filters_test_membership() {
        let records = fixtures();
        let filter = FilterState::default().with_field_filter("toppings", "olive");
        assert_eq!(ids(&apply_filters(&records, &filter, None, now())), vec!["b"]);
    }

    #[test]
    fn text_filters_match_substrings_and_combine_with_and() {
        let records = fixtures();
        let filter = FilterState::default()
            .with_field_filter("name", "o")
            .with_field_filter("size", "MM");
        assert_eq!(ids(&apply_filters(&records, &filter, None, now())), vec!["b"]);
    }

    #[test]
    fn number_filters_compare_numerically() {
        let records = fixtures();
        let filter = FilterState::default().with_field_filter("age", "31.0");
        assert_eq!(ids(&apply_filters(&records, &filter, None, now())), vec!["a"]);
    }

    #[test]
    fn blank_field_filter_is_inactive() {
        let records = fixtures();
        let filter = FilterState::default().with_field_filter("size", "  ");
        assert_eq!(apply_filters(&records, &filter, None, now()).len(), 3);
    }

    #[test]
    fn legacy_records_resolve_field_kinds_from_fallback() {
        let legacy = SubmissionRecord::new(
            "legacy",
            "form-1",
            "Event Signup",
            SubmissionMetadata::new(now(), "web"),
        )
        .unwrap_or_else(|_| unreachable!())
        .with_value("size", "MM");
        let records = vec![legacy];
        let fallback = schema();
        let filter = FilterState::default().with_field_filter("size", "M");

        assert_eq!(apply_filters(&records, &filter, None, now()).len(), 1);
        assert!(apply_filters(&records, &filter, Some(fallback.as_slice()), now()).is_empty());
    }

    fn arbitrary_records() -> impl Strategy<Value = Vec<SubmissionRecord>> {
        prop::collection::vec(
            ("[a-z]{1,6}", "[A-Za-z ]{0,12}", 0_i64..(60 * 24 * 120), prop::bool::ANY),
            0..20,
        )
        .prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(index, (title, name, minutes_ago, enhanced))| {
                    let record = SubmissionRecord::new(
                        format!("sub-{index}"),
                        "form-1",
                        title,
                        SubmissionMetadata::new(now() - Duration::minutes(minutes_ago), "web"),
                    )
                    .unwrap_or_else(|_| unreachable!())
                    .with_value("name", name);
                    if enhanced {
                        record.with_form_fields(schema())
                    } else {
                        record
                    }
                })
                .collect()
        })
    }

    fn arbitrary_filter() -> impl Strategy<Value = FilterState> {
        ("[a-z ]{0,3}", prop::option::of(0_usize..5), "[A-Za-z]{0,2}").prop_map(
            |(search, preset, name)| {
                let presets = [
                    formvault_domain::DatePreset::Today,
                    formvault_domain::DatePreset::Yesterday,
                    formvault_domain::DatePreset::Last7Days,
                    formvault_domain::DatePreset::Last30Days,
                    formvault_domain::DatePreset::Last90Days,
                ];
                let mut filter = FilterState::default()
                    .with_search(search)
                    .with_field_filter("name", name);
                filter.date_range = preset.map(|index| DateRange::Preset(presets[index]));
                filter
            },
        )
    }

    proptest! {
        #[test]
        fn filtering_is_repeatable_and_a_subset(records in arbitrary_records(), filter in arbitrary_filter()) {
            let first = ids(&apply_filters(&records, &filter, None, now()));
            let second = ids(&apply_filters(&records, &filter, None, now()));
            prop_assert_eq!(&first, &second);

            let all: Vec<String> = records.iter().map(|record| record.id().to_owned()).collect();
            let mut cursor = all.iter();
            for id in &first {
                prop_assert!(cursor.any(|candidate| candidate == id));
            }
        }

        #[test]
        fn empty_filter_is_identity(records in arbitrary_records()) {
            let matched = apply_filters(&records, &FilterState::default(), None, now());
            let expected: Vec<&SubmissionRecord> = records.iter().collect();
            prop_assert_eq!(matched, expected);
        }
    }
}

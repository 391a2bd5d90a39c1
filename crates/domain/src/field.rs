use std::collections::HashSet;
use std::str::FromStr;

use chrono::NaiveDate;
use formvault_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::value::{FieldValue, FileDescriptor};

/// Length bounds for single-line and multi-line text fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextConstraints {
    /// Minimum character count.
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_number::option")]
    pub min_length: Option<usize>,
    /// Maximum character count.
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_number::option")]
    pub max_length: Option<usize>,
}

/// Numeric bounds for number fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NumberConstraints {
    /// Inclusive lower bound.
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_number::option")]
    pub min: Option<f64>,
    /// Inclusive upper bound.
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_number::option")]
    pub max: Option<f64>,
    /// Increment that accepted values must land on, counted from `min`.
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_number::option")]
    pub step: Option<f64>,
    /// Whether non-integer values are accepted.
    pub allow_decimals: bool,
}

impl Default for NumberConstraints {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
            step: None,
            allow_decimals: true,
        }
    }
}

/// Calendar bounds for date fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DateConstraints {
    /// Earliest accepted date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_date: Option<NaiveDate>,
    /// Latest accepted date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_date: Option<NaiveDate>,
    /// Rejects dates before today.
    pub future_only: bool,
    /// Rejects dates after today.
    pub past_only: bool,
}

/// Option list for single-choice fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChoiceConstraints {
    /// Ordered selectable options.
    pub options: Vec<String>,
}

/// Option list and selection-count bounds for checkbox fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckboxConstraints {
    /// Ordered selectable options.
    pub options: Vec<String>,
    /// Minimum number of checked options.
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_number::option")]
    pub min_selections: Option<usize>,
    /// Maximum number of checked options.
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_number::option")]
    pub max_selections: Option<usize>,
}

/// Upload limits for file fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileConstraints {
    /// Maximum size of one file in bytes.
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_number::option")]
    pub max_file_size: Option<u64>,
    /// Maximum number of files.
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_number::option")]
    pub max_files: Option<usize>,
    /// Accepted extensions (`.pdf`) or MIME patterns (`image/*`).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub accepted_types: Vec<String>,
}

/// Scale settings for rating fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RatingConstraints {
    /// Highest selectable rating.
    pub max_rating: u8,
    /// Whether half steps are accepted.
    pub allow_half: bool,
}

impl Default for RatingConstraints {
    fn default() -> Self {
        Self {
            max_rating: 5,
            allow_half: false,
        }
    }
}

/// Closed set of supported form field kinds with their constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    /// Single-line text.
    Text(TextConstraints),
    /// Multi-line text.
    Textarea(TextConstraints),
    /// Numeric input.
    Number(NumberConstraints),
    /// Calendar date.
    Date(DateConstraints),
    /// Drop-down single choice.
    Select(ChoiceConstraints),
    /// Radio-button single choice.
    Radio(ChoiceConstraints),
    /// Multi-choice checkbox group.
    Checkbox(CheckboxConstraints),
    /// File upload.
    File(FileConstraints),
    /// Star rating.
    Rating(RatingConstraints),
    /// Email address.
    Email,
}

impl FieldKind {
    /// Returns a stable storage value for the field kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Textarea(_) => "textarea",
            Self::Number(_) => "number",
            Self::Date(_) => "date",
            Self::Select(_) => "select",
            Self::Radio(_) => "radio",
            Self::Checkbox(_) => "checkbox",
            Self::File(_) => "file",
            Self::Rating(_) => "rating",
            Self::Email => "email",
        }
    }

    /// Returns the option list for choice kinds.
    #[must_use]
    pub fn options(&self) -> Option<&[String]> {
        match self {
            Self::Select(choice) | Self::Radio(choice) => Some(choice.options.as_slice()),
            Self::Checkbox(checkbox) => Some(checkbox.options.as_slice()),
            Self::Text(_)
            | Self::Textarea(_)
            | Self::Number(_)
            | Self::Date(_)
            | Self::File(_)
            | Self::Rating(_)
            | Self::Email => None,
        }
    }

    fn check_definition(&self) -> AppResult<()> {
        match self {
            Self::Text(text) | Self::Textarea(text) => {
                check_bounds("minLength", "maxLength", text.min_length, text.max_length)
            }
            Self::Number(number) => {
                check_bounds("min", "max", number.min, number.max)?;
                if let Some(step) = number.step
                    && (!step.is_finite() || step <= 0.0)
                {
                    return Err(AppError::Validation(
                        "number field step must be a positive number".to_owned(),
                    ));
                }

                Ok(())
            }
            Self::Date(date) => {
                check_bounds("minDate", "maxDate", date.min_date, date.max_date)?;
                if date.future_only && date.past_only {
                    return Err(AppError::Validation(
                        "date field cannot be both futureOnly and pastOnly".to_owned(),
                    ));
                }

                Ok(())
            }
            Self::Select(choice) | Self::Radio(choice) => check_options(&choice.options),
            Self::Checkbox(checkbox) => {
                check_options(&checkbox.options)?;
                check_bounds(
                    "minSelections",
                    "maxSelections",
                    checkbox.min_selections,
                    checkbox.max_selections,
                )?;

                let option_count = checkbox.options.len();
                for (name, bound) in [
                    ("minSelections", checkbox.min_selections),
                    ("maxSelections", checkbox.max_selections),
                ] {
                    if let Some(bound) = bound
                        && bound > option_count
                    {
                        return Err(AppError::Validation(format!(
                            "checkbox {name} ({bound}) exceeds the number of options ({option_count})"
                        )));
                    }
                }

                Ok(())
            }
            Self::File(file) => {
                if file.max_files == Some(0) {
                    return Err(AppError::Validation(
                        "file field maxFiles must be at least 1".to_owned(),
                    ));
                }
                if file.max_file_size == Some(0) {
                    return Err(AppError::Validation(
                        "file field maxFileSize must be positive".to_owned(),
                    ));
                }

                Ok(())
            }
            Self::Rating(rating) => {
                if rating.max_rating == 0 {
                    return Err(AppError::Validation(
                        "rating field maxRating must be at least 1".to_owned(),
                    ));
                }

                Ok(())
            }
            Self::Email => Ok(()),
        }
    }
}

impl FromStr for FieldKind {
    type Err = AppError;

    /// Parses a bare kind name into a kind with default constraints.
    ///
    /// Choice kinds parse with an empty option list and must be given options
    /// before a [`FieldSchema`] accepts them.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "text" => Ok(Self::Text(TextConstraints::default())),
            "textarea" => Ok(Self::Textarea(TextConstraints::default())),
            "number" => Ok(Self::Number(NumberConstraints::default())),
            "date" => Ok(Self::Date(DateConstraints::default())),
            "select" => Ok(Self::Select(ChoiceConstraints::default())),
            "radio" => Ok(Self::Radio(ChoiceConstraints::default())),
            "checkbox" => Ok(Self::Checkbox(CheckboxConstraints::default())),
            "file" => Ok(Self::File(FileConstraints::default())),
            "rating" => Ok(Self::Rating(RatingConstraints::default())),
            "email" => Ok(Self::Email),
            _ => Err(AppError::Validation(format!(
                "unknown field type '{value}'"
            ))),
        }
    }
}

/// Typed description of one form field.
///
/// Decoding goes through [`FieldSchema::validate_definition`], so a stored
/// schema with inconsistent constraints is rejected like a constructed one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "StoredFieldSchema")]
pub struct FieldSchema {
    id: NonEmptyString,
    label: String,
    required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    placeholder: Option<String>,
    #[serde(flatten)]
    kind: FieldKind,
}

/// Wire shape of a field schema before its constraints are checked.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredFieldSchema {
    id: NonEmptyString,
    #[serde(default)]
    label: String,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    placeholder: Option<String>,
    #[serde(flatten)]
    kind: FieldKind,
}

impl TryFrom<StoredFieldSchema> for FieldSchema {
    type Error = AppError;

    fn try_from(stored: StoredFieldSchema) -> Result<Self, Self::Error> {
        let schema = Self {
            id: stored.id,
            label: stored.label,
            required: stored.required,
            placeholder: stored.placeholder,
            kind: stored.kind,
        };
        schema.validate_definition()?;

        Ok(schema)
    }
}

impl FieldSchema {
    /// Creates a field schema, rejecting inconsistent constraints.
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        required: bool,
        kind: FieldKind,
    ) -> AppResult<Self> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(AppError::Validation(
                "field label must not be empty".to_owned(),
            ));
        }

        let schema = Self {
            id: NonEmptyString::new(id)?,
            label: label.trim().to_owned(),
            required,
            placeholder: None,
            kind,
        };
        schema.validate_definition()?;

        Ok(schema)
    }

    /// Returns a copy with placeholder text.
    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        let placeholder = placeholder.into();
        self.placeholder = (!placeholder.trim().is_empty()).then_some(placeholder);
        self
    }

    /// Re-checks constraints, e.g. for schemas decoded from storage.
    pub fn validate_definition(&self) -> AppResult<()> {
        self.kind.check_definition().map_err(|error| match error {
            AppError::Validation(message) => {
                AppError::Validation(format!("field '{}': {message}", self.id))
            }
            other => other,
        })
    }

    /// Returns the stable field identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Returns the display label, falling back to the id when blank.
    #[must_use]
    pub fn label(&self) -> &str {
        if self.label.trim().is_empty() {
            self.id.as_str()
        } else {
            self.label.as_str()
        }
    }

    /// Returns whether an answer is required.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Returns the placeholder text.
    #[must_use]
    pub fn placeholder(&self) -> Option<&str> {
        self.placeholder.as_deref()
    }

    /// Returns the field kind and its constraints.
    #[must_use]
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Validates a candidate answer against the field's static constraints.
    ///
    /// `today` anchors `futureOnly`/`pastOnly` date checks.
    pub fn validate_value(&self, value: Option<&FieldValue>, today: NaiveDate) -> AppResult<()> {
        let Some(value) = value.filter(|value| !value.is_empty()) else {
            if self.required {
                return Err(self.invalid("is required"));
            }

            return Ok(());
        };

        match &self.kind {
            FieldKind::Text(text) | FieldKind::Textarea(text) => {
                let answer = value.as_text().ok_or_else(|| self.invalid("must be text"))?;
                let length = answer.chars().count();
                if let Some(min) = text.min_length
                    && length < min
                {
                    return Err(self.invalid(&format!("must be at least {min} characters")));
                }
                if let Some(max) = text.max_length
                    && length > max
                {
                    return Err(self.invalid(&format!("must be at most {max} characters")));
                }

                Ok(())
            }
            FieldKind::Email => {
                let text = value.as_text().ok_or_else(|| self.invalid("must be text"))?;
                if !is_email_shaped(text.trim()) {
                    return Err(self.invalid("must be a valid email address"));
                }

                Ok(())
            }
            FieldKind::Number(number) => self.check_number(value, number),
            FieldKind::Date(date) => self.check_date(value, date, today),
            FieldKind::Select(choice) | FieldKind::Radio(choice) => {
                let text = value
                    .as_text()
                    .ok_or_else(|| self.invalid("must be a single option"))?;
                if !choice.options.iter().any(|option| option == text) {
                    return Err(self.invalid(&format!("has unknown option '{text}'")));
                }

                Ok(())
            }
            FieldKind::Checkbox(checkbox) => self.check_selections(value, checkbox),
            FieldKind::File(file) => self.check_files(value, file),
            FieldKind::Rating(rating) => self.check_rating(value, rating),
        }
    }

    fn invalid(&self, reason: &str) -> AppError {
        AppError::Validation(format!("'{}' {reason}", self.label()))
    }

    fn check_number(&self, value: &FieldValue, number: &NumberConstraints) -> AppResult<()> {
        let answer = value
            .as_f64()
            .ok_or_else(|| self.invalid("must be a number"))?;

        if !number.allow_decimals && answer.fract() != 0.0 {
            return Err(self.invalid("must be a whole number"));
        }
        if let Some(min) = number.min
            && answer < min
        {
            return Err(self.invalid(&format!("must be at least {min}")));
        }
        if let Some(max) = number.max
            && answer > max
        {
            return Err(self.invalid(&format!("must be at most {max}")));
        }
        if let Some(step) = number.step {
            let steps = (answer - number.min.unwrap_or(0.0)) / step;
            if (steps - steps.round()).abs() > 1e-9 {
                return Err(self.invalid(&format!("must be a multiple of {step}")));
            }
        }

        Ok(())
    }

    fn check_date(
        &self,
        value: &FieldValue,
        date: &DateConstraints,
        today: NaiveDate,
    ) -> AppResult<()> {
        let answer = value
            .as_text()
            .and_then(parse_calendar_date)
            .ok_or_else(|| self.invalid("must be a date (YYYY-MM-DD)"))?;

        if let Some(min_date) = date.min_date
            && answer < min_date
        {
            return Err(self.invalid(&format!("must be on or after {min_date}")));
        }
        if let Some(max_date) = date.max_date
            && answer > max_date
        {
            return Err(self.invalid(&format!("must be on or before {max_date}")));
        }
        if date.future_only && answer < today {
            return Err(self.invalid("must not be in the past"));
        }
        if date.past_only && answer > today {
            return Err(self.invalid("must not be in the future"));
        }

        Ok(())
    }

    fn check_selections(&self, value: &FieldValue, checkbox: &CheckboxConstraints) -> AppResult<()> {
        let selections = value
            .selections()
            .ok_or_else(|| self.invalid("must be a list of options"))?;

        if let Some(unknown) = selections
            .iter()
            .find(|selection| !checkbox.options.iter().any(|option| option == *selection))
        {
            return Err(self.invalid(&format!("has unknown option '{unknown}'")));
        }

        let count = selections.len();
        if let Some(min) = checkbox.min_selections
            && count < min
        {
            return Err(self.invalid(&format!("needs at least {min} selections")));
        }
        if let Some(max) = checkbox.max_selections
            && count > max
        {
            return Err(self.invalid(&format!("allows at most {max} selections")));
        }

        Ok(())
    }

    fn check_files(&self, value: &FieldValue, file: &FileConstraints) -> AppResult<()> {
        let files = value.files().ok_or_else(|| self.invalid("must be a file upload"))?;

        if let Some(max_files) = file.max_files
            && files.len() > max_files
        {
            return Err(self.invalid(&format!("allows at most {max_files} files")));
        }

        for upload in files {
            if let (Some(max_size), Some(size)) = (file.max_file_size, upload.size)
                && size > max_size
            {
                return Err(self.invalid(&format!(
                    "file '{}' exceeds {max_size} bytes",
                    upload.name
                )));
            }
            if !file.accepted_types.is_empty()
                && !file
                    .accepted_types
                    .iter()
                    .any(|accepted| file_matches_type(upload, accepted))
            {
                return Err(self.invalid(&format!(
                    "file '{}' has an unsupported type",
                    upload.name
                )));
            }
        }

        Ok(())
    }

    fn check_rating(&self, value: &FieldValue, rating: &RatingConstraints) -> AppResult<()> {
        let answer = value
            .as_f64()
            .ok_or_else(|| self.invalid("must be a rating"))?;

        if answer <= 0.0 || answer > f64::from(rating.max_rating) {
            return Err(self.invalid(&format!(
                "must be between 1 and {}",
                rating.max_rating
            )));
        }

        let scaled = if rating.allow_half { answer * 2.0 } else { answer };
        if scaled.fract() != 0.0 {
            return Err(self.invalid(if rating.allow_half {
                "must be a whole or half step"
            } else {
                "must be a whole number"
            }));
        }

        Ok(())
    }
}

/// Parses `YYYY-MM-DD`, also accepting a full timestamp with that prefix.
#[must_use]
pub fn parse_calendar_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let date_part = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

fn check_bounds<T: PartialOrd + std::fmt::Display>(
    lower_name: &str,
    upper_name: &str,
    lower: Option<T>,
    upper: Option<T>,
) -> AppResult<()> {
    if let (Some(lower), Some(upper)) = (lower, upper)
        && lower > upper
    {
        return Err(AppError::Validation(format!(
            "{lower_name} ({lower}) must not exceed {upper_name} ({upper})"
        )));
    }

    Ok(())
}

fn check_options(options: &[String]) -> AppResult<()> {
    if options.is_empty() {
        return Err(AppError::Validation(
            "choice fields must define at least one option".to_owned(),
        ));
    }

    let mut seen = HashSet::new();
    for option in options {
        if option.trim().is_empty() {
            return Err(AppError::Validation(
                "choice options must not be empty".to_owned(),
            ));
        }
        if !seen.insert(option.as_str()) {
            return Err(AppError::Validation(format!(
                "duplicate choice option '{option}'"
            )));
        }
    }

    Ok(())
}

fn is_email_shaped(text: &str) -> bool {
    if text.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = text.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

fn file_matches_type(file: &FileDescriptor, accepted: &str) -> bool {
    let accepted = accepted.trim().to_ascii_lowercase();
    if accepted.starts_with('.') {
        return file.extension().as_deref() == Some(accepted.as_str());
    }

    let Some(content_type) = file.content_type.as_deref() else {
        return false;
    };
    let content_type = content_type.to_ascii_lowercase();

    match accepted.strip_suffix("/*") {
        Some(family) => content_type
            .split_once('/')
            .is_some_and(|(candidate, _)| candidate == family),
        None => content_type == accepted,
    }
}

/// Decodes optional numeric constraints stored either as JSON numbers or as
/// numeric strings. Blank strings decode to `None`.
mod lenient_number {
    use std::fmt::Display;
    use std::str::FromStr;

    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText<T> {
        Number(T),
        Text(String),
    }

    pub(super) fn option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + FromStr,
        T::Err: Display,
    {
        match Option::<NumberOrText<T>>::deserialize(deserializer)? {
            None => Ok(None),
            Some(NumberOrText::Number(number)) => Ok(Some(number)),
            Some(NumberOrText::Text(text)) if text.trim().is_empty() => Ok(None),
            Some(NumberOrText::Text(text)) => text
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|error| D::Error::custom(format!("invalid number '{text}': {error}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::{
        CheckboxConstraints, ChoiceConstraints, DateConstraints, FieldKind, FieldSchema,
        FileConstraints, NumberConstraints, RatingConstraints, TextConstraints,
    };
    use crate::value::{FieldValue, FileDescriptor};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 15).unwrap_or_else(|| unreachable!())
    }

    fn field(kind: FieldKind, required: bool) -> FieldSchema {
        FieldSchema::new("q1", "Question", required, kind).unwrap_or_else(|_| unreachable!())
    }

    fn choices(options: &[&str]) -> Vec<String> {
        options.iter().map(|option| (*option).to_owned()).collect()
    }

    #[test]
    fn choice_fields_require_options() {
        let result = FieldSchema::new(
            "color",
            "Color",
            false,
            FieldKind::Select(ChoiceConstraints::default()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn inverted_bounds_fail_at_construction() {
        let number = FieldKind::Number(NumberConstraints {
            min: Some(10.0),
            max: Some(1.0),
            ..NumberConstraints::default()
        });
        assert!(FieldSchema::new("age", "Age", false, number).is_err());

        let text = FieldKind::Text(TextConstraints {
            min_length: Some(5),
            max_length: Some(2),
        });
        assert!(FieldSchema::new("name", "Name", false, text).is_err());
    }

    #[test]
    fn checkbox_selection_bounds_must_fit_options() {
        let too_many = FieldKind::Checkbox(CheckboxConstraints {
            options: choices(&["a", "b"]),
            min_selections: Some(1),
            max_selections: Some(3),
        });
        assert!(FieldSchema::new("tags", "Tags", false, too_many).is_err());

        let inverted = FieldKind::Checkbox(CheckboxConstraints {
            options: choices(&["a", "b", "c"]),
            min_selections: Some(2),
            max_selections: Some(1),
        });
        assert!(FieldSchema::new("tags", "Tags", false, inverted).is_err());
    }

    #[test]
    fn required_fields_reject_empty_answers() {
        let text = field(FieldKind::Text(TextConstraints::default()), true);
        assert!(text.validate_value(None, today()).is_err());
        assert!(
            text.validate_value(Some(&FieldValue::from("  ")), today())
                .is_err()
        );

        let checkbox = field(
            FieldKind::Checkbox(CheckboxConstraints {
                options: choices(&["a", "b"]),
                ..CheckboxConstraints::default()
            }),
            true,
        );
        assert!(
            checkbox
                .validate_value(Some(&FieldValue::Choices(Vec::new())), today())
                .is_err()
        );
    }

    #[test]
    fn optional_fields_accept_missing_answers() {
        let number = field(FieldKind::Number(NumberConstraints::default()), false);
        assert!(number.validate_value(None, today()).is_ok());
    }

    #[test]
    fn whole_number_fields_reject_decimals() {
        let number = field(
            FieldKind::Number(NumberConstraints {
                allow_decimals: false,
                ..NumberConstraints::default()
            }),
            false,
        );
        let decimal: FieldValue =
            serde_json::from_value(json!(2.5)).unwrap_or_else(|_| unreachable!());

        assert!(number.validate_value(Some(&decimal), today()).is_err());
        assert!(
            number
                .validate_value(Some(&FieldValue::from(3_i64)), today())
                .is_ok()
        );
    }

    #[test]
    fn number_bounds_and_step_are_enforced() {
        let number = field(
            FieldKind::Number(NumberConstraints {
                min: Some(0.0),
                max: Some(100.0),
                step: Some(5.0),
                allow_decimals: true,
            }),
            false,
        );

        assert!(
            number
                .validate_value(Some(&FieldValue::from(15_i64)), today())
                .is_ok()
        );
        assert!(
            number
                .validate_value(Some(&FieldValue::from(17_i64)), today())
                .is_err()
        );
        assert!(
            number
                .validate_value(Some(&FieldValue::from(105_i64)), today())
                .is_err()
        );
        assert!(
            number
                .validate_value(Some(&FieldValue::from("20")), today())
                .is_ok()
        );
    }

    #[test]
    fn date_bounds_use_the_supplied_today() {
        let future = field(
            FieldKind::Date(DateConstraints {
                future_only: true,
                ..DateConstraints::default()
            }),
            false,
        );

        assert!(
            future
                .validate_value(Some(&FieldValue::from("2026-03-14")), today())
                .is_err()
        );
        assert!(
            future
                .validate_value(Some(&FieldValue::from("2026-03-15")), today())
                .is_ok()
        );
        assert!(
            future
                .validate_value(Some(&FieldValue::from("not a date")), today())
                .is_err()
        );
    }

    #[test]
    fn select_rejects_unknown_options() {
        let select = field(
            FieldKind::Select(ChoiceConstraints {
                options: choices(&["Red", "Blue"]),
            }),
            false,
        );
        assert!(
            select
                .validate_value(Some(&FieldValue::from("Blue")), today())
                .is_ok()
        );
        assert!(
            select
                .validate_value(Some(&FieldValue::from("Green")), today())
                .is_err()
        );
    }

    #[test]
    fn checkbox_counts_selections() {
        let checkbox = field(
            FieldKind::Checkbox(CheckboxConstraints {
                options: choices(&["a", "b", "c"]),
                min_selections: Some(2),
                max_selections: Some(2),
            }),
            false,
        );

        let one = FieldValue::Choices(choices(&["a"]));
        let two = FieldValue::Choices(choices(&["a", "c"]));
        assert!(checkbox.validate_value(Some(&one), today()).is_err());
        assert!(checkbox.validate_value(Some(&two), today()).is_ok());
    }

    #[test]
    fn file_limits_are_checked() {
        let upload = field(
            FieldKind::File(FileConstraints {
                max_file_size: Some(1_000),
                max_files: Some(1),
                accepted_types: vec![".pdf".to_owned(), "image/*".to_owned()],
            }),
            false,
        );

        let pdf = FileDescriptor {
            size: Some(500),
            ..FileDescriptor::named("cv.PDF")
        };
        let png = FileDescriptor {
            size: Some(500),
            content_type: Some("image/png".to_owned()),
            ..FileDescriptor::named("photo")
        };
        let exe = FileDescriptor::named("tool.exe");
        let large = FileDescriptor {
            size: Some(5_000),
            ..FileDescriptor::named("big.pdf")
        };

        assert!(upload.validate_value(Some(&FieldValue::from(pdf.clone())), today()).is_ok());
        assert!(upload.validate_value(Some(&FieldValue::from(png)), today()).is_ok());
        assert!(upload.validate_value(Some(&FieldValue::from(exe)), today()).is_err());
        assert!(upload.validate_value(Some(&FieldValue::from(large)), today()).is_err());
        assert!(
            upload
                .validate_value(Some(&FieldValue::Files(vec![pdf.clone(), pdf])), today())
                .is_err()
        );
    }

    #[test]
    fn rating_half_steps_follow_allow_half() {
        let half: FieldValue = serde_json::from_value(json!(3.5)).unwrap_or_else(|_| unreachable!());
        let strict = field(FieldKind::Rating(RatingConstraints::default()), false);
        let lenient = field(
            FieldKind::Rating(RatingConstraints {
                max_rating: 5,
                allow_half: true,
            }),
            false,
        );

        assert!(strict.validate_value(Some(&half), today()).is_err());
        assert!(lenient.validate_value(Some(&half), today()).is_ok());
        assert!(
            lenient
                .validate_value(Some(&FieldValue::from(6_i64)), today())
                .is_err()
        );
    }

    #[test]
    fn email_shape_is_checked() {
        let email = field(FieldKind::Email, false);
        assert!(
            email
                .validate_value(Some(&FieldValue::from("bob@example.com")), today())
                .is_ok()
        );
        assert!(
            email
                .validate_value(Some(&FieldValue::from("bob@example")), today())
                .is_err()
        );
    }

    #[test]
    fn schema_round_trips_through_the_wire_format() {
        let wire = json!({
            "id": "size",
            "label": "Size",
            "type": "select",
            "required": true,
            "options": ["S", "M", "L"]
        });
        let schema: FieldSchema =
            serde_json::from_value(wire.clone()).unwrap_or_else(|_| unreachable!());

        assert_eq!(schema.kind().as_str(), "select");
        assert_eq!(schema.kind().options().map(<[String]>::len), Some(3));
        assert!(schema.is_required());

        let encoded = serde_json::to_value(&schema).unwrap_or_else(|_| unreachable!());
        assert_eq!(encoded["type"], json!("select"));
        assert_eq!(encoded["options"], wire["options"]);
    }

    #[test]
    fn stored_numeric_constraints_may_be_strings() {
        let schema: FieldSchema = serde_json::from_value(json!({
            "id": "age",
            "label": "Age",
            "type": "number",
            "min": "18",
            "max": 120,
            "step": ""
        }))
        .unwrap_or_else(|_| unreachable!());

        let FieldKind::Number(number) = schema.kind() else {
            unreachable!("expected a number field");
        };
        assert_eq!(number.min, Some(18.0));
        assert_eq!(number.max, Some(120.0));
        assert_eq!(number.step, None);

        let text: FieldSchema = serde_json::from_value(json!({
            "id": "bio",
            "type": "textarea",
            "maxLength": "500"
        }))
        .unwrap_or_else(|_| unreachable!());
        assert_eq!(text.label(), "bio");
        assert_eq!(
            text.kind(),
            &FieldKind::Textarea(TextConstraints {
                min_length: None,
                max_length: Some(500),
            })
        );
    }

    #[test]
    fn stored_schemas_are_validated_on_decode() {
        for wire in [
            json!({ "id": "age", "type": "number", "min": 10, "max": 5 }),
            json!({ "id": "size", "type": "select", "options": [] }),
            json!({ "id": "qty", "type": "number", "min": "lots" }),
            json!({ "id": "x", "type": "slider" }),
        ] {
            assert!(serde_json::from_value::<FieldSchema>(wire).is_err());
        }
    }

    #[test]
    fn unknown_kind_name_is_rejected() {
        assert!("slider".parse::<FieldKind>().is_err());
        assert!(matches!("email".parse::<FieldKind>(), Ok(FieldKind::Email)));
    }
}

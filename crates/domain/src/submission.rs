use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use formvault_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::field::FieldSchema;
use crate::field_source::FieldSchemaSource;
use crate::value::{FieldLookup, FieldValue};

/// Review status of a submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Not yet opened by a reviewer.
    #[default]
    New,
    /// Opened by a reviewer.
    Read,
    /// Hidden from the default inbox.
    Archived,
}

impl SubmissionStatus {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Read => "read",
            Self::Archived => "archived",
        }
    }
}

impl FromStr for SubmissionStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "new" => Ok(Self::New),
            "read" => Ok(Self::Read),
            "archived" => Ok(Self::Archived),
            _ => Err(AppError::Validation(format!(
                "unknown submission status '{value}'"
            ))),
        }
    }
}

/// Capture context recorded alongside a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionMetadata {
    /// Submission time; absent when the stored value was missing or unreadable.
    #[serde(default, with = "lenient_timestamp")]
    pub submitted_at: Option<DateTime<Utc>>,
    /// Channel the submission arrived through (e.g. `web`, `embed`).
    #[serde(default)]
    pub source: String,
    /// Submitter IP address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Authenticated submitter, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_by: Option<String>,
    /// Submitter user agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl SubmissionMetadata {
    /// Creates metadata with a known submission time.
    #[must_use]
    pub fn new(submitted_at: DateTime<Utc>, source: impl Into<String>) -> Self {
        Self {
            submitted_at: Some(submitted_at),
            source: source.into(),
            ip_address: None,
            submitted_by: None,
            user_agent: None,
        }
    }
}

/// Reviewer note attached to a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionNote {
    id: String,
    text: NonEmptyString,
    added_by: String,
    added_at: DateTime<Utc>,
}

impl SubmissionNote {
    /// Creates a note with a fresh identifier.
    pub fn new(
        text: impl Into<String>,
        added_by: impl Into<String>,
        added_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        let text: String = text.into();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            text: NonEmptyString::new(text.trim())?,
            added_by: added_by.into(),
            added_at,
        })
    }

    /// Returns note identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Returns note text.
    #[must_use]
    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    /// Returns the note author.
    #[must_use]
    pub fn added_by(&self) -> &str {
        self.added_by.as_str()
    }

    /// Returns when the note was added.
    #[must_use]
    pub fn added_at(&self) -> DateTime<Utc> {
        self.added_at
    }
}

/// One stored response to a form.
///
/// Records created after field snapshots were introduced carry the form's
/// field list as it was at submission time ("enhanced"); older records do not
/// ("legacy") and rely on a caller-supplied fallback schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    id: NonEmptyString,
    form_id: NonEmptyString,
    #[serde(default)]
    form_title: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_snapshot::deserialize"
    )]
    form_fields: Option<Vec<FieldSchema>>,
    #[serde(default)]
    data: BTreeMap<String, FieldValue>,
    #[serde(default)]
    metadata: SubmissionMetadata,
    #[serde(default)]
    notes: Vec<SubmissionNote>,
    #[serde(default)]
    status: SubmissionStatus,
    #[serde(default)]
    starred: bool,
}

impl SubmissionRecord {
    /// Creates a legacy-shaped record without a field snapshot.
    pub fn new(
        id: impl Into<String>,
        form_id: impl Into<String>,
        form_title: impl Into<String>,
        metadata: SubmissionMetadata,
    ) -> AppResult<Self> {
        Ok(Self {
            id: NonEmptyString::new(id)?,
            form_id: NonEmptyString::new(form_id)?,
            form_title: form_title.into(),
            form_fields: None,
            data: BTreeMap::new(),
            metadata,
            notes: Vec::new(),
            status: SubmissionStatus::default(),
            starred: false,
        })
    }

    /// Returns a copy carrying a field snapshot.
    #[must_use]
    pub fn with_form_fields(mut self, fields: Vec<FieldSchema>) -> Self {
        self.form_fields = Some(fields);
        self
    }

    /// Returns a copy with one submitted value set.
    #[must_use]
    pub fn with_value(mut self, field_id: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.data.insert(field_id.into(), value.into());
        self
    }

    /// Returns the record identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Returns the owning form identifier.
    #[must_use]
    pub fn form_id(&self) -> &str {
        self.form_id.as_str()
    }

    /// Returns the form title captured at submission time.
    #[must_use]
    pub fn form_title(&self) -> &str {
        self.form_title.as_str()
    }

    /// Returns the field snapshot, if the record carries a non-empty one.
    #[must_use]
    pub fn form_fields(&self) -> Option<&[FieldSchema]> {
        self.form_fields
            .as_deref()
            .filter(|fields| !fields.is_empty())
    }

    /// Returns whether the record carries its own field snapshot.
    #[must_use]
    pub fn is_enhanced(&self) -> bool {
        self.form_fields().is_some()
    }

    /// Resolves which field list describes this record.
    #[must_use]
    pub fn field_source<'a>(&'a self, fallback: Option<&'a [FieldSchema]>) -> FieldSchemaSource<'a> {
        FieldSchemaSource::resolve(self, fallback)
    }

    /// Returns submitted values keyed by field id.
    #[must_use]
    pub fn data(&self) -> &BTreeMap<String, FieldValue> {
        &self.data
    }

    /// Looks up one submitted value.
    #[must_use]
    pub fn lookup(&self, field_id: &str) -> FieldLookup<'_> {
        FieldLookup::from_option(self.data.get(field_id))
    }

    /// Returns capture metadata.
    #[must_use]
    pub fn metadata(&self) -> &SubmissionMetadata {
        &self.metadata
    }

    /// Returns the submission time when known.
    #[must_use]
    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.metadata.submitted_at
    }

    /// Returns reviewer notes in insertion order.
    #[must_use]
    pub fn notes(&self) -> &[SubmissionNote] {
        &self.notes
    }

    /// Appends a reviewer note. Notes are never edited or removed.
    pub fn append_note(&mut self, note: SubmissionNote) {
        self.notes.push(note);
    }

    /// Returns review status.
    #[must_use]
    pub fn status(&self) -> SubmissionStatus {
        self.status
    }

    /// Updates review status.
    pub fn set_status(&mut self, status: SubmissionStatus) {
        self.status = status;
    }

    /// Returns whether the record is starred.
    #[must_use]
    pub fn is_starred(&self) -> bool {
        self.starred
    }

    /// Updates the starred flag.
    pub fn set_starred(&mut self, starred: bool) {
        self.starred = starred;
    }
}

/// Decodes a field snapshot one entry at a time.
///
/// Entries that do not decode into a valid [`FieldSchema`] are dropped, so a
/// single odd field only loses its own label and type.
mod lenient_snapshot {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use crate::field::FieldSchema;

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<FieldSchema>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(Value::Array(entries)) = Option::<Value>::deserialize(deserializer)? else {
            return Ok(None);
        };

        Ok(Some(
            entries
                .into_iter()
                .filter_map(|entry| serde_json::from_value(entry).ok())
                .collect(),
        ))
    }
}

/// Decodes submission timestamps written by different client generations.
///
/// Accepts RFC 3339 strings, naive `YYYY-MM-DDTHH:MM:SS` strings (read as
/// UTC), epoch milliseconds and `{ "seconds", "nanoseconds" }` objects.
/// Anything else decodes to `None` instead of failing the whole record.
mod lenient_timestamp {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub(super) fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(timestamp) => {
                serializer.serialize_some(&timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            None => serializer.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(parse))
    }

    pub(super) fn parse(value: &Value) -> Option<DateTime<Utc>> {
        match value {
            Value::String(text) => {
                let text = text.trim();
                DateTime::parse_from_rfc3339(text)
                    .map(|timestamp| timestamp.with_timezone(&Utc))
                    .ok()
                    .or_else(|| {
                        NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                            .ok()
                            .map(|naive| naive.and_utc())
                    })
            }
            Value::Number(number) => number.as_i64().and_then(DateTime::from_timestamp_millis),
            Value::Object(object) => {
                let seconds = object
                    .get("seconds")
                    .or_else(|| object.get("_seconds"))
                    .and_then(Value::as_i64)?;
                let nanoseconds = object
                    .get("nanoseconds")
                    .or_else(|| object.get("_nanoseconds"))
                    .and_then(Value::as_u64)
                    .and_then(|nanos| u32::try_from(nanos).ok())
                    .unwrap_or(0);
                DateTime::from_timestamp(seconds, nanoseconds)
            }
            Value::Null | Value::Bool(_) | Value::Array(_) => None,
        }
    }
}

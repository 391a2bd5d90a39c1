use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Descriptor for an uploaded file referenced by a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    /// Original file name.
    pub name: String,
    /// File size in bytes, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// MIME type reported by the uploader.
    #[serde(
        default,
        rename = "type",
        skip_serializing_if = "Option::is_none"
    )]
    pub content_type: Option<String>,
    /// Download location in external storage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Any other keys the uploader stored, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FileDescriptor {
    /// Creates a descriptor with only a file name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: None,
            content_type: None,
            url: None,
            extra: Map::new(),
        }
    }

    /// Returns the lowercase extension including the leading dot.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        self.name
            .rsplit_once('.')
            .filter(|(stem, extension)| !stem.is_empty() && !extension.is_empty())
            .map(|(_, extension)| format!(".{}", extension.to_ascii_lowercase()))
    }
}

/// One submitted value keyed by field id in a submission.
///
/// Variants are tried in declaration order when decoding, so a JSON array
/// of strings becomes [`FieldValue::Choices`] and an array of file objects
/// becomes [`FieldValue::Files`]. Anything else is kept verbatim in
/// [`FieldValue::Other`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Boolean answer.
    Boolean(bool),
    /// Numeric answer with its original precision.
    Number(Number),
    /// Text answer.
    Text(String),
    /// Ordered multi-selection.
    Choices(Vec<String>),
    /// Several uploaded files.
    Files(Vec<FileDescriptor>),
    /// One uploaded file.
    File(FileDescriptor),
    /// Any other JSON shape, including `null`.
    Other(Value),
}

impl FieldValue {
    /// Returns whether the value counts as "no answer".
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Boolean(_) | Self::Number(_) | Self::File(_) => false,
            Self::Text(text) => text.trim().is_empty(),
            Self::Choices(choices) => choices.is_empty(),
            Self::Files(files) => files.is_empty(),
            Self::Other(value) => match value {
                Value::Null => true,
                Value::String(text) => text.trim().is_empty(),
                Value::Array(items) => items.is_empty(),
                Value::Object(entries) => entries.is_empty(),
                Value::Bool(_) | Value::Number(_) => false,
            },
        }
    }

    /// Returns the text when the value is a plain string.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Returns a numeric reading of the value, parsing numeric text.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(number) => number.as_f64(),
            Self::Text(text) => text.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    /// Returns the selected options for multi-choice answers.
    ///
    /// A single text answer is read as a one-element selection.
    #[must_use]
    pub fn selections(&self) -> Option<Vec<&str>> {
        match self {
            Self::Choices(choices) => Some(choices.iter().map(String::as_str).collect()),
            Self::Text(text) => Some(vec![text.as_str()]),
            _ => None,
        }
    }

    /// Returns the uploaded files carried by the value.
    #[must_use]
    pub fn files(&self) -> Option<Vec<&FileDescriptor>> {
        match self {
            Self::File(file) => Some(vec![file]),
            Self::Files(files) => Some(files.iter().collect()),
            _ => None,
        }
    }

    /// Flattens the value into plain text.
    ///
    /// Lists are joined with `", "`; unknown shapes fall back to compact JSON.
    #[must_use]
    pub fn plain_text(&self) -> String {
        match self {
            Self::Boolean(flag) => flag.to_string(),
            Self::Number(number) => number.to_string(),
            Self::Text(text) => text.clone(),
            Self::Choices(choices) => choices.join(", "),
            Self::Files(files) => files
                .iter()
                .map(|file| file.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            Self::File(file) => file.name.clone(),
            Self::Other(value) => match value {
                Value::Null => String::new(),
                Value::String(text) => text.clone(),
                other => other.to_string(),
            },
        }
    }

    /// Returns the value as a JSON value without loss of precision.
    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Number(Number::from(value))
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        Self::Choices(value)
    }
}

impl From<FileDescriptor> for FieldValue {
    fn from(value: FileDescriptor) -> Self {
        Self::File(value)
    }
}

/// Result of looking up one field in a submission's data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldLookup<'a> {
    /// The submission has no entry for the field.
    Missing,
    /// The entry exists but carries no answer.
    Empty(&'a FieldValue),
    /// The entry carries an answer.
    Present(&'a FieldValue),
}

impl<'a> FieldLookup<'a> {
    /// Classifies an optional stored value.
    #[must_use]
    pub fn from_option(value: Option<&'a FieldValue>) -> Self {
        match value {
            None => Self::Missing,
            Some(value) if value.is_empty() => Self::Empty(value),
            Some(value) => Self::Present(value),
        }
    }

    /// Returns the answer only when one is present.
    #[must_use]
    pub fn present(self) -> Option<&'a FieldValue> {
        match self {
            Self::Present(value) => Some(value),
            Self::Missing | Self::Empty(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{FieldLookup, FieldValue, FileDescriptor};

    fn decode(value: serde_json::Value) -> FieldValue {
        serde_json::from_value(value).unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn decodes_each_submitted_shape() {
        assert_eq!(decode(json!("Blue")), FieldValue::from("Blue"));
        assert_eq!(decode(json!(true)), FieldValue::Boolean(true));
        assert!(matches!(decode(json!(4.5)), FieldValue::Number(_)));
        assert_eq!(
            decode(json!(["a", "b"])),
            FieldValue::Choices(vec!["a".to_owned(), "b".to_owned()])
        );
        assert!(matches!(
            decode(json!([{ "name": "cv.pdf", "size": 10 }])),
            FieldValue::Files(_)
        ));
        assert!(matches!(
            decode(json!({ "name": "cv.pdf", "type": "application/pdf" })),
            FieldValue::File(_)
        ));
        assert!(matches!(decode(json!({ "x": 1 })), FieldValue::Other(_)));
        assert!(matches!(decode(json!(null)), FieldValue::Other(_)));
    }

    #[test]
    fn file_objects_keep_unrecognized_keys() {
        let stored = json!({
            "name": "cv.pdf",
            "size": 10,
            "path": "uploads/cv.pdf",
            "uploadedAt": "2026-01-02T03:04:05Z"
        });
        let value = decode(stored.clone());

        let FieldValue::File(file) = &value else {
            unreachable!("expected a file descriptor");
        };
        assert_eq!(file.extra.get("path"), Some(&json!("uploads/cv.pdf")));
        assert_eq!(value.to_json(), stored);
    }

    #[test]
    fn numbers_keep_their_precision() {
        let value = decode(json!(12345678901234_i64));
        assert_eq!(value.to_json(), json!(12345678901234_i64));

        let value = decode(json!(0.1));
        assert_eq!(value.to_json(), json!(0.1));
    }

    #[test]
    fn empty_answers_are_detected() {
        assert!(FieldValue::from("   ").is_empty());
        assert!(FieldValue::Choices(Vec::new()).is_empty());
        assert!(decode(json!(null)).is_empty());
        assert!(!FieldValue::Boolean(false).is_empty());
        assert!(!FieldValue::from(0_i64).is_empty());
    }

    #[test]
    fn lookup_distinguishes_missing_from_empty() {
        let empty = FieldValue::from("");
        let filled = FieldValue::from("x");

        assert_eq!(FieldLookup::from_option(None), FieldLookup::Missing);
        assert_eq!(
            FieldLookup::from_option(Some(&empty)),
            FieldLookup::Empty(&empty)
        );
        assert_eq!(FieldLookup::from_option(Some(&filled)).present(), Some(&filled));
    }

    #[test]
    fn plain_text_joins_lists() {
        let files = FieldValue::Files(vec![
            FileDescriptor::named("a.png"),
            FileDescriptor::named("b.png"),
        ]);
        assert_eq!(files.plain_text(), "a.png, b.png");
        assert_eq!(
            FieldValue::Choices(vec!["red".to_owned(), "green".to_owned()]).plain_text(),
            "red, green"
        );
    }

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(
            FileDescriptor::named("Scan.PDF").extension().as_deref(),
            Some(".pdf")
        );
        assert_eq!(FileDescriptor::named(".bashrc").extension(), None);
    }
}

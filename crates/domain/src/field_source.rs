use crate::field::FieldSchema;
use crate::submission::SubmissionRecord;

/// Field list that describes one submission, resolved once per record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldSchemaSource<'a> {
    /// The record's own snapshot taken at submission time.
    Snapshot(&'a [FieldSchema]),
    /// The caller's current field list, used for legacy records.
    Fallback(&'a [FieldSchema]),
    /// No schema is available; raw keys are shown.
    None,
}

impl<'a> FieldSchemaSource<'a> {
    /// Picks the snapshot first, then a non-empty fallback.
    #[must_use]
    pub fn resolve(record: &'a SubmissionRecord, fallback: Option<&'a [FieldSchema]>) -> Self {
        if let Some(snapshot) = record.form_fields() {
            return Self::Snapshot(snapshot);
        }

        match fallback.filter(|fields| !fields.is_empty()) {
            Some(fields) => Self::Fallback(fields),
            None => Self::None,
        }
    }

    /// Returns the resolved field list; empty for [`FieldSchemaSource::None`].
    #[must_use]
    pub fn fields(&self) -> &'a [FieldSchema] {
        match self {
            Self::Snapshot(fields) | Self::Fallback(fields) => fields,
            Self::None => &[],
        }
    }

    /// Finds the schema for a field id.
    #[must_use]
    pub fn find(&self, field_id: &str) -> Option<&'a FieldSchema> {
        self.fields().iter().find(|field| field.id() == field_id)
    }

    /// Returns the label for a field id, or the id itself when unknown.
    #[must_use]
    pub fn label_for<'b>(&self, field_id: &'b str) -> &'b str
    where
        'a: 'b,
    {
        self.find(field_id).map_or(field_id, |field| field.label())
    }

    /// Returns whether the schema came from the record itself.
    #[must_use]
    pub fn is_snapshot(&self) -> bool {
        matches!(self, Self::Snapshot(_))
    }
}
